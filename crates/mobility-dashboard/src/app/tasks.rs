//! Background network tasks
//!
//! Every fetch runs on the tokio runtime and reports back over an unbounded
//! channel, tagged with the generation that requested it. The UI thread drains
//! the channel each frame; staleness is decided by the state transitions, not
//! here.

use mobility_data::{AccidentFilter, ApiClient, DatasetId, DatasetPage, HeatmapCategory,
    HeatmapResponse, RouteRequest, RouteResponse};
use std::sync::Arc;
use tokio::sync::mpsc;

/// A finished background task, tagged with its request generation.
pub enum TaskResult {
    Dataset {
        generation: u64,
        result: Result<DatasetPage, String>,
    },
    Heatmap {
        generation: u64,
        result: Result<HeatmapResponse, String>,
    },
    Route {
        generation: u64,
        result: Result<RouteResponse, String>,
    },
}

pub type TaskSender = mpsc::UnboundedSender<TaskResult>;
pub type TaskReceiver = mpsc::UnboundedReceiver<TaskResult>;

pub fn channel() -> (TaskSender, TaskReceiver) {
    mpsc::unbounded_channel()
}

fn deliver(tx: &TaskSender, ctx: &egui::Context, result: TaskResult) {
    // The receiver only disappears on shutdown; a send failure is not an error
    // worth surfacing.
    if tx.send(result).is_ok() {
        ctx.request_repaint();
    }
}

pub fn fetch_dataset_page(
    client: Arc<ApiClient>,
    tx: TaskSender,
    ctx: egui::Context,
    dataset: DatasetId,
    page: u64,
    generation: u64,
) {
    tokio::spawn(async move {
        let result = client
            .get_dataset_page(&dataset, page)
            .await
            .map_err(|e| e.to_string());
        deliver(&tx, &ctx, TaskResult::Dataset { generation, result });
    });
}

pub fn fetch_heatmap(
    client: Arc<ApiClient>,
    tx: TaskSender,
    ctx: egui::Context,
    category: HeatmapCategory,
    filter: AccidentFilter,
    generation: u64,
) {
    tokio::spawn(async move {
        let result = client
            .get_heatmap_data(category, &filter)
            .await
            .map_err(|e| e.to_string());
        deliver(&tx, &ctx, TaskResult::Heatmap { generation, result });
    });
}

pub fn calculate_route(
    client: Arc<ApiClient>,
    tx: TaskSender,
    ctx: egui::Context,
    request: RouteRequest,
    generation: u64,
) {
    tokio::spawn(async move {
        let result = client
            .calculate_route(&request)
            .await
            .map_err(|e| e.to_string());
        deliver(&tx, &ctx, TaskResult::Route { generation, result });
    });
}
