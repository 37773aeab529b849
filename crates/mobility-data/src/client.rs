//! Async client for the mobility backend
//!
//! All endpoints return JSON. Errors surface in two ways: non-2xx statuses and
//! 2xx bodies carrying an `error` key; both become [`DataError::Backend`] so the
//! caller handles one failure shape.

use crate::dataset::{DEFAULT_PER_PAGE, DatasetId, DatasetPage};
use crate::heatmap::{AccidentFilter, HeatmapCategory, HeatmapResponse};
use crate::route::{RouteRequest, RouteResponse};
use crate::{DataError, Result};

/// HTTP client over the backend serving datasets, heatmaps, and routes.
#[derive(Clone, Debug)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    /// Build a client for the given base URL. A trailing slash is tolerated.
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch one page of a dataset, with its analytics block.
    pub async fn get_dataset_page(&self, dataset: &DatasetId, page: u64) -> Result<DatasetPage> {
        profiling::scope!("get_dataset_page");
        let url = format!("{}/get_dataset/{}", self.base_url, dataset.slug());
        tracing::debug!(dataset = dataset.slug(), page, "Requesting dataset page");
        let response = self
            .http
            .get(&url)
            .query(&[("page", page), ("per_page", DEFAULT_PER_PAGE)])
            .send()
            .await?;
        parse_response(response).await
    }

    /// Fetch the heat points for a category. The year and fatality filters only
    /// apply to the accident layer; the backend ignores them elsewhere.
    pub async fn get_heatmap_data(
        &self,
        category: HeatmapCategory,
        filter: &AccidentFilter,
    ) -> Result<HeatmapResponse> {
        profiling::scope!("get_heatmap_data");
        let url = format!("{}/get_heatmap_data", self.base_url);
        tracing::debug!(category = category.slug(), "Requesting heatmap data");
        let mut query: Vec<(&str, &str)> = vec![("type", category.slug())];
        if let Some(year) = &filter.year {
            query.push(("year", year.as_str()));
        }
        if let Some(fatality) = &filter.fatality {
            query.push(("fatality", fatality.as_str()));
        }
        let response = self.http.get(&url).query(&query).send().await?;
        parse_response(response).await
    }

    /// Ask the backend to plan a route through the given addresses.
    pub async fn calculate_route(&self, request: &RouteRequest) -> Result<RouteResponse> {
        profiling::scope!("calculate_route");
        let url = format!("{}/calculate_route", self.base_url);
        tracing::debug!(
            addresses = request.addresses.len(),
            mode = request.mode.as_str(),
            "Requesting route"
        );
        let response = self.http.post(&url).json(request).send().await?;
        parse_response(response).await
    }
}

/// Decode a backend response, mapping both transport-level failures and
/// in-body `error` payloads to [`DataError::Backend`].
async fn parse_response<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    let body: serde_json::Value = response.json().await?;
    if let Some(message) = body.get("error").and_then(|v| v.as_str()) {
        return Err(DataError::Backend(message.to_string()));
    }
    if !status.is_success() {
        return Err(DataError::Backend(format!("HTTP {status}")));
    }
    Ok(serde_json::from_value(body)?)
}
