//! Application state and the pure view-state transitions
//!
//! Each view owns an explicit state object and mutates it only through the
//! transition methods below. Network results arrive tagged with the generation
//! that requested them; a result whose generation no longer matches the
//! controller's is stale and gets discarded, so a slow response can never
//! overwrite the outcome of a newer request.

use crate::app::settings::Settings;
use crate::app::table::TableState;
use mobility_data::{
    AccidentFilter, AddressList, ApiClient, ChartSpec, DatasetId, DatasetPage, GeoPoint,
    HeatmapCategory, HeatmapResponse, MarkerColor, PageCursor, RadiusControl, RouteResponse,
    TravelMode, chart_specs, decode_polyline, distinct_years, filter_valid_points, marker_color,
    record_point,
};
use std::sync::Arc;

/// How long a transient notice stays on screen.
pub const NOTICE_TTL_SECS: f64 = 5.0;

/// Which of the three dashboard views is active.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ActivePage {
    #[default]
    Explorer,
    Heatmap,
    Route,
}

impl ActivePage {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Explorer => "Dataset Explorer",
            Self::Heatmap => "Heatmap Viewer",
            Self::Route => "Route Planner",
        }
    }

    pub fn all() -> &'static [Self] {
        const ALL: [ActivePage; 3] = [ActivePage::Explorer, ActivePage::Heatmap, ActivePage::Route];
        &ALL
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// A transient toast shown in the corner of the screen.
#[derive(Clone, Debug)]
pub struct Notice {
    pub text: String,
    pub level: NoticeLevel,
    pub shown_at: instant::Instant,
}

impl Notice {
    fn new(text: String, level: NoticeLevel) -> Self {
        Self {
            text,
            level,
            shown_at: instant::Instant::now(),
        }
    }

    pub fn expired(&self) -> bool {
        self.shown_at.elapsed().as_secs_f64() > NOTICE_TTL_SECS
    }
}

/// One map marker derived from a dataset record.
#[derive(Clone, Debug)]
pub struct Marker {
    pub position: GeoPoint,
    pub color: MarkerColor,
    /// Index into the page's record list, for popup lookup.
    pub record_index: usize,
}

/// A fully loaded explorer page: records plus everything derived from them.
#[derive(Clone, Debug)]
pub struct LoadedPage {
    pub dataset: DatasetId,
    pub page: DatasetPage,
    pub cursor: PageCursor,
    pub charts: Vec<ChartSpec>,
    pub markers: Arc<Vec<Marker>>,
}

impl LoadedPage {
    /// Derive charts, markers, and the cursor from a raw page response.
    pub fn from_response(dataset: DatasetId, page: DatasetPage) -> Self {
        let charts = chart_specs(&dataset, &page.analytics);
        let markers: Vec<Marker> = page
            .records
            .iter()
            .enumerate()
            .filter_map(|(i, record)| {
                record_point(record).map(|position| Marker {
                    position,
                    color: marker_color(&dataset, record),
                    record_index: i,
                })
            })
            .collect();
        let cursor = page.cursor();
        Self {
            dataset,
            page,
            cursor,
            charts,
            markers: Arc::new(markers),
        }
    }
}

/// Dataset explorer view state.
pub struct ExplorerState {
    pub dataset: DatasetId,
    pub loaded: Option<LoadedPage>,
    pub table: TableState,
    pub loading: bool,
    pub generation: u64,
    pub pending_fit_bounds: bool,
    /// Record index of the marker whose popup is open.
    pub selected_marker: Arc<std::sync::RwLock<Option<usize>>>,
}

impl ExplorerState {
    fn new(dataset: DatasetId) -> Self {
        Self {
            dataset,
            loaded: None,
            table: TableState::default(),
            loading: false,
            generation: 0,
            pending_fit_bounds: false,
            selected_marker: Arc::new(std::sync::RwLock::new(None)),
        }
    }

    /// Start loading `page` of `dataset`. Returns the generation tag for the
    /// request so the task can echo it back.
    pub fn begin_load(&mut self, dataset: DatasetId, page: u64) -> u64 {
        self.generation += 1;
        self.loading = true;
        self.dataset = dataset;
        if let Ok(mut selected) = self.selected_marker.write() {
            *selected = None;
        }
        tracing::debug!(
            dataset = self.dataset.slug(),
            page,
            generation = self.generation,
            "Loading dataset page"
        );
        self.generation
    }

    /// Apply a finished load. Stale generations are discarded without touching
    /// state; errors clear the loading flag and surface via the returned notice.
    pub fn apply_result(
        &mut self,
        generation: u64,
        result: Result<DatasetPage, String>,
    ) -> Option<Notice> {
        if generation != self.generation {
            tracing::debug!(generation, current = self.generation, "Discarding stale dataset result");
            return None;
        }
        self.loading = false;
        match result {
            Ok(page) => {
                let loaded = LoadedPage::from_response(self.dataset.clone(), page);
                self.pending_fit_bounds = !loaded.markers.is_empty();
                self.table.reset();
                self.loaded = Some(loaded);
                None
            }
            Err(message) => Some(Notice::new(
                format!("Failed to load dataset: {message}"),
                NoticeLevel::Error,
            )),
        }
    }

    /// Page number to request for backward navigation, or `None` when already
    /// on the first page.
    pub fn prev_page_request(&self) -> Option<u64> {
        let cursor = self.loaded.as_ref()?.cursor;
        cursor.has_prev().then(|| cursor.prev_page())
    }

    /// Page number to request for forward navigation, or `None` on the last page.
    pub fn next_page_request(&self) -> Option<u64> {
        let cursor = self.loaded.as_ref()?.cursor;
        cursor.has_next().then(|| cursor.next_page())
    }
}

/// Heatmap viewer state. One controller drives category, radius, and filters.
pub struct HeatmapState {
    pub category: HeatmapCategory,
    pub radius: RadiusControl,
    pub filter: AccidentFilter,
    pub points: Arc<Vec<GeoPoint>>,
    pub years: Vec<String>,
    pub loading: bool,
    pub generation: u64,
    pub pending_fit_bounds: bool,
    /// Set whenever the radius changes via scroll, for transient feedback.
    pub radius_changed_at: Option<instant::Instant>,
}

impl HeatmapState {
    fn new(category: HeatmapCategory) -> Self {
        Self {
            category,
            radius: RadiusControl::default(),
            filter: AccidentFilter::default(),
            points: Arc::new(Vec::new()),
            years: Vec::new(),
            loading: false,
            generation: 0,
            pending_fit_bounds: false,
            radius_changed_at: None,
        }
    }

    /// Start loading `category`. Switching categories resets the filters, since
    /// they only apply to the accident layer.
    pub fn begin_load(&mut self, category: HeatmapCategory) -> u64 {
        self.generation += 1;
        self.loading = true;
        if category != self.category {
            self.filter = AccidentFilter::default();
        }
        self.category = category;
        tracing::debug!(
            category = category.slug(),
            generation = self.generation,
            "Loading heatmap"
        );
        self.generation
    }

    /// Apply a finished load. A response with no valid points keeps the
    /// previous layer on screen and reports it via the returned notice.
    pub fn apply_result(
        &mut self,
        generation: u64,
        result: Result<HeatmapResponse, String>,
    ) -> Option<Notice> {
        if generation != self.generation {
            tracing::debug!(generation, current = self.generation, "Discarding stale heatmap result");
            return None;
        }
        self.loading = false;
        match result {
            Ok(response) => {
                let points = filter_valid_points(&response, &self.filter);
                if points.is_empty() {
                    return Some(Notice::new(
                        format!("No data available for {}", self.category.label()),
                        NoticeLevel::Info,
                    ));
                }
                // Only repopulate the year dropdown from an unfiltered fetch, so
                // narrowing to one year does not collapse the choices.
                if self.filter == AccidentFilter::default() {
                    self.years = distinct_years(&response.details);
                }
                self.points = Arc::new(points);
                self.pending_fit_bounds = true;
                None
            }
            Err(message) => Some(Notice::new(
                format!("Failed to load heatmap: {message}"),
                NoticeLevel::Error,
            )),
        }
    }

    /// Step the radius and remember when, for the transient on-map feedback.
    pub fn scroll_radius(&mut self, steps: i32) {
        if self.radius.adjust(steps) {
            self.radius_changed_at = Some(instant::Instant::now());
        }
    }

    /// Whether the radius feedback overlay should still be visible.
    pub fn radius_feedback_visible(&self) -> bool {
        self.radius_changed_at
            .is_some_and(|at| at.elapsed().as_secs_f64() < 1.2)
    }
}

/// The planned route currently drawn on the map.
#[derive(Clone, Debug)]
pub struct PlannedRoute {
    pub summary: mobility_data::RouteSummary,
    pub path: Vec<GeoPoint>,
}

/// Route planner state.
pub struct RouteState {
    pub addresses: AddressList,
    pub mode: TravelMode,
    pub planned: Option<PlannedRoute>,
    /// Blocking alert text; rendered as a modal until dismissed.
    pub modal: Option<String>,
    pub loading: bool,
    pub generation: u64,
    pub pending_fit_bounds: bool,
}

impl RouteState {
    fn new() -> Self {
        Self {
            addresses: AddressList::new(),
            mode: TravelMode::default(),
            planned: None,
            modal: None,
            loading: false,
            generation: 0,
            pending_fit_bounds: false,
        }
    }

    /// Validate the form and start a calculation. Returns the request payload
    /// and generation, or fills the modal when fewer than two addresses are set.
    pub fn begin_calculation(&mut self) -> Option<(mobility_data::RouteRequest, u64)> {
        let addresses = self.addresses.collected();
        if addresses.len() < mobility_data::MIN_ADDRESSES {
            self.modal = Some("Please enter at least two addresses.".to_string());
            return None;
        }
        self.generation += 1;
        self.loading = true;
        tracing::debug!(
            addresses = addresses.len(),
            generation = self.generation,
            "Calculating route"
        );
        Some((
            mobility_data::RouteRequest {
                addresses,
                mode: self.mode,
            },
            self.generation,
        ))
    }

    /// Apply a finished calculation. Backend errors and undecodable polylines
    /// become a modal; the previous route stays on the map in both cases.
    pub fn apply_result(&mut self, generation: u64, result: Result<RouteResponse, String>) {
        if generation != self.generation {
            tracing::debug!(generation, current = self.generation, "Discarding stale route result");
            return;
        }
        self.loading = false;
        match result {
            Ok(response) => match decode_polyline(&response.polyline) {
                Ok(path) => {
                    self.planned = Some(PlannedRoute {
                        summary: response.route,
                        path,
                    });
                    self.pending_fit_bounds = true;
                }
                Err(err) => {
                    self.modal = Some(format!("Could not draw the route: {err}"));
                }
            },
            Err(message) => {
                self.modal = Some(format!("Route calculation failed: {message}"));
            }
        }
    }
}

/// Top-level application state shared by all views.
pub struct AppState {
    pub client: Arc<ApiClient>,
    pub active_page: ActivePage,
    pub explorer: ExplorerState,
    pub heatmap: HeatmapState,
    pub route: RouteState,
    pub notices: Vec<Notice>,
    pub route_line_width: f32,
}

impl AppState {
    pub fn new(settings: &Settings) -> Self {
        let dataset = DatasetId::from_slug(&settings.dataset);
        let category =
            HeatmapCategory::from_slug(&settings.heatmap).unwrap_or_default();
        Self {
            client: Arc::new(ApiClient::new(&settings.api_url)),
            active_page: ActivePage::default(),
            explorer: ExplorerState::new(dataset),
            heatmap: HeatmapState::new(category),
            route: RouteState::new(),
            notices: Vec::new(),
            route_line_width: settings.route_line_width,
        }
    }

    pub fn push_notice(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    pub fn push_error(&mut self, text: impl Into<String>) {
        self.notices.push(Notice::new(text.into(), NoticeLevel::Error));
    }

    pub fn prune_notices(&mut self) {
        self.notices.retain(|n| !n.expired());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_json(page: u64, total: u64) -> DatasetPage {
        serde_json::from_value(serde_json::json!({
            "fields": ["BAIRRO", "GEOMETRIA"],
            "records": [
                {"BAIRRO": "Centro", "GEOMETRIA": "POINT (-43.9451 -19.9227)"}
            ],
            "total_records": total,
            "page": page,
            "per_page": 100,
            "analytics": {"bairro_counts": {"Centro": 5, "Norte": 3}}
        }))
        .unwrap()
    }

    fn settings() -> Settings {
        use clap::Parser;
        Settings::parse_from(["mobility-dashboard"])
    }

    #[test]
    fn test_loaded_page_derives_charts_and_markers() {
        let loaded = LoadedPage::from_response(DatasetId::SpeedHumps, page_json(1, 1));
        assert_eq!(loaded.charts.len(), 2);
        assert_eq!(loaded.charts[0].labels, vec!["Centro", "Norte"]);
        assert_eq!(loaded.charts[0].values, vec![5.0, 3.0]);
        assert_eq!(loaded.markers.len(), 1);
        assert_eq!(loaded.markers[0].record_index, 0);
    }

    #[test]
    fn test_explorer_pagination_disabled_at_bounds() {
        let mut explorer = ExplorerState::new(DatasetId::SpeedHumps);
        // Nothing loaded yet: neither direction is available
        assert_eq!(explorer.prev_page_request(), None);
        assert_eq!(explorer.next_page_request(), None);

        let generation = explorer.begin_load(DatasetId::SpeedHumps, 1);
        assert!(explorer.apply_result(generation, Ok(page_json(1, 250))).is_none());

        // Page 1 of 3: back is a no-op, forward requests page 2
        assert_eq!(explorer.prev_page_request(), None);
        assert_eq!(explorer.next_page_request(), Some(2));

        let generation = explorer.begin_load(DatasetId::SpeedHumps, 3);
        explorer.apply_result(generation, Ok(page_json(3, 250)));
        assert_eq!(explorer.prev_page_request(), Some(2));
        assert_eq!(explorer.next_page_request(), None);
    }

    #[test]
    fn test_explorer_discards_stale_result() {
        let mut explorer = ExplorerState::new(DatasetId::SpeedHumps);
        let old = explorer.begin_load(DatasetId::SpeedHumps, 1);
        let new = explorer.begin_load(DatasetId::TrafficSignals, 1);
        assert_ne!(old, new);

        // The superseded response arrives late and must not land
        explorer.apply_result(old, Ok(page_json(1, 100)));
        assert!(explorer.loading);
        assert!(explorer.loaded.is_none());

        explorer.apply_result(new, Ok(page_json(1, 100)));
        assert!(!explorer.loading);
        assert!(explorer.loaded.is_some());
    }

    #[test]
    fn test_explorer_error_produces_notice() {
        let mut explorer = ExplorerState::new(DatasetId::SpeedHumps);
        let generation = explorer.begin_load(DatasetId::SpeedHumps, 1);
        let notice = explorer
            .apply_result(generation, Err("boom".to_string()))
            .unwrap();
        assert_eq!(notice.level, NoticeLevel::Error);
        assert!(!explorer.loading);
        assert!(explorer.loaded.is_none());
    }

    fn heat_response(n: usize) -> HeatmapResponse {
        serde_json::from_value(serde_json::json!({
            "points": (0..n)
                .map(|i| serde_json::json!({"lat": -19.9 - i as f64 * 0.01, "lng": -43.9}))
                .collect::<Vec<_>>(),
            "details": []
        }))
        .unwrap()
    }

    #[test]
    fn test_heatmap_empty_result_keeps_previous_layer() {
        let mut heatmap = HeatmapState::new(HeatmapCategory::SpeedReducer);
        let generation = heatmap.begin_load(HeatmapCategory::SpeedReducer);
        assert!(heatmap.apply_result(generation, Ok(heat_response(3))).is_none());
        assert_eq!(heatmap.points.len(), 3);

        let generation = heatmap.begin_load(HeatmapCategory::BusPriority);
        let notice = heatmap.apply_result(generation, Ok(heat_response(0))).unwrap();
        assert_eq!(notice.level, NoticeLevel::Info);
        // Previous points remain visible
        assert_eq!(heatmap.points.len(), 3);
    }

    #[test]
    fn test_heatmap_category_switch_resets_filters() {
        let mut heatmap = HeatmapState::new(HeatmapCategory::TrafficAccidents);
        heatmap.filter.year = Some("2020".to_string());
        heatmap.begin_load(HeatmapCategory::SpeedReducer);
        assert_eq!(heatmap.filter, AccidentFilter::default());
    }

    #[test]
    fn test_route_requires_two_addresses() {
        let mut route = RouteState::new();
        // Both rows blank
        assert!(route.begin_calculation().is_none());
        assert!(route.modal.is_some());
        assert!(!route.loading);

        route.modal = None;
        route.addresses.entries_mut()[0] = "Praça Sete".to_string();
        assert!(route.begin_calculation().is_none());

        route.modal = None;
        route.addresses.entries_mut()[1] = "Savassi".to_string();
        let (request, _) = route.begin_calculation().unwrap();
        assert_eq!(request.addresses.len(), 2);
        assert!(route.modal.is_none());
    }

    #[test]
    fn test_route_error_opens_modal_and_keeps_route() {
        let mut route = RouteState::new();
        route.addresses.entries_mut()[0] = "A".to_string();
        route.addresses.entries_mut()[1] = "B".to_string();
        let (_, generation) = route.begin_calculation().unwrap();

        let response: RouteResponse = serde_json::from_value(serde_json::json!({
            "route": {
                "segments": [
                    {"start": "A", "end": "B", "mode": "driving",
                     "distance": "2.0 km", "duration": "5 mins"}
                ],
                "total_distance_km": 2.0,
                "total_duration_mins": 5.0
            },
            "polyline": "_p~iF~ps|U_ulLnnqC"
        }))
        .unwrap();
        route.apply_result(generation, Ok(response));
        let planned_len = route.planned.as_ref().map(|p| p.path.len());
        assert_eq!(planned_len, Some(2));

        let (_, generation) = route.begin_calculation().unwrap();
        route.apply_result(generation, Err("no route found".to_string()));
        assert!(route.modal.is_some());
        // The last successful route is still drawn
        assert_eq!(route.planned.as_ref().map(|p| p.path.len()), planned_len);
    }

    #[test]
    fn test_route_three_addresses_two_segments() {
        let response: RouteResponse = serde_json::from_value(serde_json::json!({
            "route": {
                "segments": [
                    {"start": "A", "end": "B", "mode": "driving",
                     "distance": "2.0 km", "duration": "5 mins"},
                    {"start": "B", "end": "C", "mode": "driving",
                     "distance": "3.0 km", "duration": "7 mins"}
                ],
                "total_distance_km": 5.0,
                "total_duration_mins": 12.0
            },
            "polyline": "_p~iF~ps|U_ulLnnqC_mqNvxq`@"
        }))
        .unwrap();
        let mut route = RouteState::new();
        route.addresses.entries_mut()[0] = "A".to_string();
        route.addresses.entries_mut()[1] = "B".to_string();
        route.addresses.add();
        route.addresses.entries_mut()[2] = "C".to_string();
        let (request, generation) = route.begin_calculation().unwrap();
        assert_eq!(request.addresses.len(), 3);
        route.apply_result(generation, Ok(response));
        let planned = route.planned.unwrap();
        assert_eq!(planned.summary.segments.len(), 2);
    }

    #[test]
    fn test_app_state_from_settings() {
        let state = AppState::new(&settings());
        assert_eq!(state.active_page, ActivePage::Explorer);
        assert_eq!(state.explorer.dataset, DatasetId::OlderAdultParking);
        assert_eq!(state.heatmap.category, HeatmapCategory::SpeedReducer);
        assert_eq!(state.client.base_url(), "http://localhost:5000");
    }

    #[test]
    fn test_notices_dismiss_before_expiry() {
        let mut state = AppState::new(&settings());
        state.push_error("first");
        state.push_error("second");
        assert_eq!(state.notices.len(), 2);

        // Manual dismissal drops exactly the chosen notice
        state.notices.remove(0);
        assert_eq!(state.notices.len(), 1);
        assert_eq!(state.notices[0].text, "second");

        // Pruning leaves notices younger than the TTL alone
        state.prune_notices();
        assert_eq!(state.notices.len(), 1);
    }
}
