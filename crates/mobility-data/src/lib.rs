//! Mobility Data Library - Domain Model for Municipal Traffic Datasets
//!
//! This library provides the payload types, validation, and rendering-support logic
//! for a dashboard over Brazilian municipal traffic/mobility datasets, plus the HTTP
//! client for the backend that serves them. It contains no UI code.
//!
//! # Architecture
//!
//! - **[`DatasetId`] / [`DatasetPage`]**: paginated dataset payloads and page math
//! - **[`Analytics`] / [`chart_specs`]**: dataset-to-chart dispatch registry
//! - **[`WktGeometry`] / [`GeoPoint`]**: WKT parsing and coordinate validation
//! - **[`HeatmapResponse`] / [`RadiusControl`]**: heatmap payloads and controls
//! - **[`AddressList`] / [`RouteResponse`]**: route planning model and polyline decoding
//! - **[`ApiClient`]**: async backend client

mod analytics;
mod cluster;
mod dataset;
mod geometry;
mod heatmap;
mod route;

pub mod client;

// Public API exports
pub use analytics::{Analytics, ChartKind, ChartSpec, VagasComparison, chart_specs};
pub use client::ApiClient;
pub use cluster::{GridCluster, cluster_points};
pub use dataset::{
    DEFAULT_PER_PAGE, DatasetId, DatasetPage, PageCursor, Record, cell_text, record_point,
};
pub use geometry::{
    GEOMETRY_FIELD, GeoPoint, MarkerColor, WktGeometry, marker_color, parse_wkt, popup_lines,
};
pub use heatmap::{
    AccidentDetail, AccidentFilter, DEFAULT_HEATMAP_OPACITY, HeatPoint, HeatmapCategory,
    HeatmapResponse, RADIUS_DEFAULT, RADIUS_MAX, RADIUS_MIN, RADIUS_STEP, RadiusControl,
    distinct_years, filter_valid_points, heat_color, point_bounds,
};
pub use route::{
    DEFAULT_ROUTE_COLOR, MIN_ADDRESSES, AddressList, RouteRequest, RouteResponse, RouteSegment,
    RouteSummary, TravelMode, decode_polyline, mode_color,
};

/// Error types for the data module
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("invalid polyline encoding")]
    InvalidPolyline,

    #[error("at least two addresses are required")]
    NotEnoughAddresses,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DataError>;
