//! Application module
//!
//! Three views over one shared backend client:
//! - Dataset explorer: clustered markers, analytics charts, record table
//! - Heatmap viewer: density layer with radius and accident filters
//! - Route planner: address list, travel mode, decoded polyline on the map
//!
//! Each view keeps its own map camera so switching tabs never loses the place
//! the user was looking at.

mod charts;
mod plugin;
pub(crate) mod settings;
mod state;
mod table;
mod tasks;
mod ui_panels;

use crate::app::plugin::{HeatmapPlugin, MarkerPlugin, RoutePlugin};
use crate::app::settings::{DEFAULT_CENTER, Settings};
use crate::app::state::{ActivePage, AppState};
use crate::app::tasks::{TaskReceiver, TaskResult, TaskSender};
use crate::app::ui_panels::UiAction;
use eframe::egui;
use mobility_data::{DatasetId, GeoPoint, HeatmapCategory, point_bounds, popup_lines};
use std::sync::Arc;
use walkers::{HttpTiles, Map, MapMemory, sources::OpenStreetMap};

const ATTRIBUTION: &str = "© OpenStreetMap contributors";

/// Main application structure
pub struct MobilityDashboardApp {
    /// Application state (view states, notices, backend client)
    state: AppState,

    /// Map tiles provider (OpenStreetMap)
    tiles: HttpTiles,

    /// Per-view map cameras
    explorer_map: MapMemory,
    heatmap_map: MapMemory,
    route_map: MapMemory,

    /// Background task channel
    tx: TaskSender,
    rx: TaskReceiver,

    /// Whether the startup fetches have been dispatched
    started_initial_load: bool,
}

impl MobilityDashboardApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let settings = Settings::from_cli();
        let state = AppState::new(&settings);
        let tiles = HttpTiles::new(OpenStreetMap, cc.egui_ctx.clone());
        let (tx, rx) = tasks::channel();

        tracing::info!(
            api_url = state.client.base_url(),
            dataset = state.explorer.dataset.slug(),
            "Initialized dashboard"
        );

        let mut explorer_map = MapMemory::default();
        let mut heatmap_map = MapMemory::default();
        let mut route_map = MapMemory::default();
        for map in [&mut explorer_map, &mut heatmap_map, &mut route_map] {
            let _ = map.set_zoom(settings.zoom);
        }

        Self {
            state,
            tiles,
            explorer_map,
            heatmap_map,
            route_map,
            tx,
            rx,
            started_initial_load: false,
        }
    }

    fn default_position() -> walkers::Position {
        walkers::lat_lon(DEFAULT_CENTER.0, DEFAULT_CENTER.1)
    }

    /// Drain finished background tasks and fold them into the view states.
    fn process_task_results(&mut self) {
        while let Ok(result) = self.rx.try_recv() {
            match result {
                TaskResult::Dataset { generation, result } => {
                    if let Some(notice) = self.state.explorer.apply_result(generation, result) {
                        self.state.push_notice(notice);
                    }
                }
                TaskResult::Heatmap { generation, result } => {
                    if let Some(notice) = self.state.heatmap.apply_result(generation, result) {
                        self.state.push_notice(notice);
                    }
                }
                TaskResult::Route { generation, result } => {
                    self.state.route.apply_result(generation, result);
                }
            }
        }
    }

    /// Kick off the startup fetches for the explorer and the heatmap.
    fn start_initial_load(&mut self, ctx: &egui::Context) {
        let dataset = self.state.explorer.dataset.clone();
        self.load_dataset(ctx, dataset, 1);
        let category = self.state.heatmap.category;
        self.load_heatmap(ctx, category);
    }

    fn load_dataset(&mut self, ctx: &egui::Context, dataset: DatasetId, page: u64) {
        let generation = self.state.explorer.begin_load(dataset.clone(), page);
        tasks::fetch_dataset_page(
            self.state.client.clone(),
            self.tx.clone(),
            ctx.clone(),
            dataset,
            page,
            generation,
        );
    }

    fn load_heatmap(&mut self, ctx: &egui::Context, category: HeatmapCategory) {
        let generation = self.state.heatmap.begin_load(category);
        tasks::fetch_heatmap(
            self.state.client.clone(),
            self.tx.clone(),
            ctx.clone(),
            category,
            self.state.heatmap.filter.clone(),
            generation,
        );
    }

    fn run_action(&mut self, ctx: &egui::Context, action: UiAction) {
        match action {
            UiAction::LoadDataset { dataset, page } => self.load_dataset(ctx, dataset, page),
            UiAction::LoadHeatmap { category } => self.load_heatmap(ctx, category),
            UiAction::CalculateRoute => {
                if let Some((request, generation)) = self.state.route.begin_calculation() {
                    tasks::calculate_route(
                        self.state.client.clone(),
                        self.tx.clone(),
                        ctx.clone(),
                        request,
                        generation,
                    );
                }
            }
            UiAction::ExportCsv => ui_panels::export_table_csv(&mut self.state),
            UiAction::CopyTable => {
                if let Some(loaded) = &self.state.explorer.loaded {
                    let rows = self.state.explorer.table.visible_rows(&loaded.page);
                    ctx.copy_text(table::rows_as_clipboard_text(&loaded.page, &rows));
                }
            }
        }
    }

    /// Center and zoom a camera onto a point set.
    fn fit_to_bounds(map_memory: &mut MapMemory, points: &[GeoPoint]) {
        let Some(bounds) = point_bounds(points) else {
            return;
        };
        let (west, south) = (bounds.min().x, bounds.min().y);
        let (east, north) = (bounds.max().x, bounds.max().y);
        let center_lat = (south + north) / 2.0;
        let center_lon = (west + east) / 2.0;

        let max_span = (north - south).abs().max((east - west).abs());
        let zoom = if max_span > 0.0 {
            let zoom_estimate = (4.0 * 360.0 / max_span).log2() as f32;
            (zoom_estimate - 0.5).clamp(1.0, 18.0)
        } else {
            14.0
        };

        map_memory.center_at(walkers::lat_lon(center_lat, center_lon));
        let _ = map_memory.set_zoom(f64::from(zoom));

        tracing::trace!(
            "Auto-zoomed to bounds: ({:.4}, {:.4}) - ({:.4}, {:.4}), zoom: {:.1}",
            south,
            west,
            north,
            east,
            zoom
        );
    }

    fn paint_attribution(ui: &egui::Ui) {
        let painter = ui.painter();
        let screen_rect = ui.max_rect();
        painter.text(
            screen_rect.center_bottom() + egui::vec2(0.0, -5.0),
            egui::Align2::CENTER_BOTTOM,
            ATTRIBUTION,
            egui::FontId::proportional(10.0),
            egui::Color32::from_black_alpha(180),
        );
    }

    fn explorer_view(&mut self, ctx: &egui::Context, actions: &mut Vec<UiAction>) {
        ui_panels::explorer_sidebar(ctx, &mut self.state, actions);

        if self.state.explorer.pending_fit_bounds {
            self.state.explorer.pending_fit_bounds = false;
            if let Some(loaded) = &self.state.explorer.loaded {
                let points: Vec<GeoPoint> = loaded.markers.iter().map(|m| m.position).collect();
                Self::fit_to_bounds(&mut self.explorer_map, &points);
            }
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            profiling::scope!("explorer_panel");
            let map_height = (ui.available_height() * 0.55).max(240.0);
            ui.allocate_ui(egui::vec2(ui.available_width(), map_height), |ui| {
                ui.set_min_height(map_height);

                let (markers, popup) = match &self.state.explorer.loaded {
                    Some(loaded) => {
                        let selected = self
                            .state
                            .explorer
                            .selected_marker
                            .read()
                            .ok()
                            .and_then(|s| *s);
                        let popup = selected.and_then(|index| {
                            loaded.page.records.get(index).map(|record| {
                                (index, popup_lines(record, &loaded.page.fields))
                            })
                        });
                        (loaded.markers.clone(), popup)
                    }
                    None => (Arc::new(Vec::new()), None),
                };
                let marker_plugin = MarkerPlugin::new(
                    markers,
                    self.state.explorer.selected_marker.clone(),
                    popup,
                );

                let map = Map::new(
                    Some(&mut self.tiles),
                    &mut self.explorer_map,
                    Self::default_position(),
                )
                .with_plugin(marker_plugin);
                ui.add(map);
                Self::paint_attribution(ui);
            });

            ui.separator();
            egui::ScrollArea::vertical()
                .id_salt("explorer_details")
                .show(ui, |ui| {
                    if let Some(loaded) = &self.state.explorer.loaded {
                        for chart in &loaded.charts {
                            charts::show_chart(ui, chart);
                        }
                    }
                    ui_panels::record_table(ui, &mut self.state);
                });
        });
    }

    fn heatmap_view(&mut self, ctx: &egui::Context, actions: &mut Vec<UiAction>) {
        ui_panels::heatmap_sidebar(ctx, &mut self.state, actions);

        // Shift+scroll anywhere over the view steps the radius
        ctx.input(|i| {
            if i.modifiers.shift && i.raw_scroll_delta.y != 0.0 {
                let steps = if i.raw_scroll_delta.y > 0.0 { 1 } else { -1 };
                self.state.heatmap.scroll_radius(steps);
            }
        });

        if self.state.heatmap.pending_fit_bounds {
            self.state.heatmap.pending_fit_bounds = false;
            let points = self.state.heatmap.points.clone();
            Self::fit_to_bounds(&mut self.heatmap_map, &points);
        }

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                profiling::scope!("heatmap_panel");
                let heat_plugin = HeatmapPlugin::new(
                    self.state.heatmap.points.clone(),
                    self.state.heatmap.radius.radius,
                );
                let map = Map::new(
                    Some(&mut self.tiles),
                    &mut self.heatmap_map,
                    Self::default_position(),
                )
                .with_plugin(heat_plugin);
                ui.add(map);
                Self::paint_attribution(ui);

                if self.state.heatmap.radius_feedback_visible() {
                    let painter = ui.painter();
                    painter.text(
                        ui.max_rect().center_top() + egui::vec2(0.0, 24.0),
                        egui::Align2::CENTER_TOP,
                        format!("Radius: {} px", self.state.heatmap.radius.radius),
                        egui::FontId::proportional(16.0),
                        egui::Color32::WHITE,
                    );
                    ctx.request_repaint_after(std::time::Duration::from_millis(100));
                }
            });
    }

    fn route_view(&mut self, ctx: &egui::Context, actions: &mut Vec<UiAction>) {
        ui_panels::route_sidebar(ctx, &mut self.state, actions);
        ui_panels::route_modal(ctx, &mut self.state);

        if self.state.route.pending_fit_bounds {
            self.state.route.pending_fit_bounds = false;
            if let Some(planned) = &self.state.route.planned {
                let path = planned.path.clone();
                Self::fit_to_bounds(&mut self.route_map, &path);
            }
        }

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                profiling::scope!("route_panel");
                let (path, mode) = match &self.state.route.planned {
                    Some(planned) => {
                        let mode = planned
                            .summary
                            .segments
                            .first()
                            .map(|s| s.mode.clone())
                            .unwrap_or_else(|| self.state.route.mode.as_str().to_string());
                        (Arc::new(planned.path.clone()), mode)
                    }
                    None => (
                        Arc::new(Vec::new()),
                        self.state.route.mode.as_str().to_string(),
                    ),
                };
                let route_plugin = RoutePlugin::new(path, mode, self.state.route_line_width);
                let map = Map::new(
                    Some(&mut self.tiles),
                    &mut self.route_map,
                    Self::default_position(),
                )
                .with_plugin(route_plugin);
                ui.add(map);
                Self::paint_attribution(ui);
            });
    }
}

#[profiling::all_functions]
impl eframe::App for MobilityDashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_task_results();

        if !self.started_initial_load {
            self.started_initial_load = true;
            self.start_initial_load(ctx);
        }

        ui_panels::nav_bar(ctx, &mut self.state);

        let mut actions: Vec<UiAction> = Vec::new();
        match self.state.active_page {
            ActivePage::Explorer => self.explorer_view(ctx, &mut actions),
            ActivePage::Heatmap => self.heatmap_view(ctx, &mut actions),
            ActivePage::Route => self.route_view(ctx, &mut actions),
        }
        for action in actions {
            self.run_action(ctx, action);
        }

        ui_panels::notices_overlay(ctx, &mut self.state);
    }
}
