//! Walkers plugins for the three map layers
//!
//! Each view builds its plugin fresh every frame from shared `Arc` data, the
//! same way the map itself is rebuilt. Clustering happens in screen space
//! after projection, so zooming in naturally splits clusters apart.

use crate::app::state::Marker;
use egui::{Align2, Color32, FontId, Pos2, Stroke, vec2};
use mobility_data::{
    DEFAULT_HEATMAP_OPACITY, GeoPoint, cluster_points, heat_color, mode_color,
};
use std::sync::{Arc, RwLock};
use walkers::{Plugin, Projector};

/// Grid cell size for marker clustering, in screen points.
const MARKER_CLUSTER_CELL: f32 = 48.0;
/// Screen-space hit radius for marker clicks.
const MARKER_HIT_RADIUS: f32 = 12.0;
const MARKER_RADIUS: f32 = 7.0;

fn project(projector: &Projector, point: GeoPoint) -> Pos2 {
    let screen = projector.project(walkers::lat_lon(point.lat, point.lng));
    Pos2::new(screen.x, screen.y)
}

/// Clustered record markers with click-to-popup selection.
pub struct MarkerPlugin {
    markers: Arc<Vec<Marker>>,
    selected: Arc<RwLock<Option<usize>>>,
    /// Popup body for the currently selected record, resolved by the app.
    popup: Option<(usize, Vec<String>)>,
}

impl MarkerPlugin {
    pub fn new(
        markers: Arc<Vec<Marker>>,
        selected: Arc<RwLock<Option<usize>>>,
        popup: Option<(usize, Vec<String>)>,
    ) -> Self {
        Self {
            markers,
            selected,
            popup,
        }
    }
}

impl Plugin for MarkerPlugin {
    fn run(
        self: Box<Self>,
        ui: &mut egui::Ui,
        response: &egui::Response,
        projector: &Projector,
        _map_memory: &walkers::MapMemory,
    ) {
        profiling::scope!("MarkerPlugin::run");
        let painter = ui.painter();
        let rect = response.rect;

        let screen_points: Vec<(f32, f32)> = self
            .markers
            .iter()
            .map(|m| {
                let p = project(projector, m.position);
                (p.x, p.y)
            })
            .collect();
        let clusters = cluster_points(&screen_points, MARKER_CLUSTER_CELL);

        let click = response
            .clicked()
            .then(|| response.interact_pointer_pos())
            .flatten();
        let mut clicked_record: Option<Option<usize>> = click.map(|_| None);

        for cluster in &clusters {
            let center = Pos2::new(cluster.x, cluster.y);
            if !rect.expand(MARKER_CLUSTER_CELL).contains(center) {
                continue;
            }
            if cluster.count > 1 {
                let radius = 12.0 + (cluster.count as f32).log10() * 6.0;
                painter.circle(
                    center,
                    radius,
                    Color32::from_rgba_unmultiplied(52, 152, 219, 200),
                    Stroke::new(2.0, Color32::WHITE),
                );
                painter.text(
                    center,
                    Align2::CENTER_CENTER,
                    cluster.count.to_string(),
                    FontId::proportional(12.0),
                    Color32::WHITE,
                );
            } else {
                let marker = &self.markers[cluster.members[0]];
                let [r, g, b] = marker.color.rgb();
                painter.circle(
                    center,
                    MARKER_RADIUS,
                    Color32::from_rgb(r, g, b),
                    Stroke::new(1.5, Color32::WHITE),
                );
                if let Some(pos) = click
                    && (pos - center).length() <= MARKER_HIT_RADIUS
                {
                    clicked_record = Some(Some(marker.record_index));
                }
            }
        }

        // A click selects the hit marker, or clears the selection when it
        // lands on empty map.
        if let Some(selection) = clicked_record
            && let Ok(mut selected) = self.selected.write()
        {
            *selected = selection;
        }

        if let Some((record_index, lines)) = &self.popup
            && let Some(marker) = self
                .markers
                .iter()
                .find(|m| m.record_index == *record_index)
        {
            let anchor = project(projector, marker.position);
            egui::Area::new(egui::Id::new("marker_popup"))
                .fixed_pos(anchor + vec2(10.0, -10.0))
                .show(ui.ctx(), |ui| {
                    egui::Frame::popup(ui.style()).show(ui, |ui| {
                        ui.set_max_width(280.0);
                        for line in lines {
                            ui.label(line);
                        }
                    });
                });
        }
    }
}

/// Density layer: clustered heat blobs colored by relative intensity.
pub struct HeatmapPlugin {
    points: Arc<Vec<GeoPoint>>,
    radius: u32,
}

impl HeatmapPlugin {
    pub fn new(points: Arc<Vec<GeoPoint>>, radius: u32) -> Self {
        Self { points, radius }
    }
}

impl Plugin for HeatmapPlugin {
    fn run(
        self: Box<Self>,
        ui: &mut egui::Ui,
        response: &egui::Response,
        projector: &Projector,
        _map_memory: &walkers::MapMemory,
    ) {
        profiling::scope!("HeatmapPlugin::run");
        let painter = ui.painter();
        let rect = response.rect;
        let radius = self.radius as f32;

        let screen_points: Vec<(f32, f32)> = self
            .points
            .iter()
            .map(|p| {
                let pos = project(projector, *p);
                (pos.x, pos.y)
            })
            .collect();
        let clusters = cluster_points(&screen_points, radius);
        let max_count = clusters.iter().map(|c| c.count).max().unwrap_or(1) as f32;

        for cluster in &clusters {
            let center = Pos2::new(cluster.x, cluster.y);
            if !rect.expand(radius).contains(center) {
                continue;
            }
            let t = cluster.count as f32 / max_count;
            let [r, g, b] = heat_color(t);
            // Low-intensity cells fade out, like the gradient's transparent base
            let alpha = (DEFAULT_HEATMAP_OPACITY * 255.0 * (0.3 + 0.7 * t)) as u8;
            // Soft edge: a wider faint disc under the core one
            painter.circle_filled(
                center,
                radius,
                Color32::from_rgba_unmultiplied(r, g, b, alpha / 3),
            );
            painter.circle_filled(
                center,
                radius * 0.6,
                Color32::from_rgba_unmultiplied(r, g, b, alpha),
            );
        }
    }
}

/// Planned route polyline with endpoint markers.
pub struct RoutePlugin {
    path: Arc<Vec<GeoPoint>>,
    mode: String,
    width: f32,
}

impl RoutePlugin {
    pub fn new(path: Arc<Vec<GeoPoint>>, mode: String, width: f32) -> Self {
        Self { path, mode, width }
    }
}

impl Plugin for RoutePlugin {
    fn run(
        self: Box<Self>,
        ui: &mut egui::Ui,
        _response: &egui::Response,
        projector: &Projector,
        _map_memory: &walkers::MapMemory,
    ) {
        profiling::scope!("RoutePlugin::run");
        let painter = ui.painter();

        let screen_points: Vec<Pos2> = self
            .path
            .iter()
            .map(|p| project(projector, *p))
            .collect();
        if screen_points.len() < 2 {
            return;
        }

        let [r, g, b] = mode_color(&self.mode);
        let color = Color32::from_rgb(r, g, b);
        painter.add(egui::Shape::line(
            screen_points.clone(),
            Stroke::new(self.width, color),
        ));

        if let (Some(&start), Some(&end)) = (screen_points.first(), screen_points.last()) {
            painter.circle(start, 6.0, Color32::from_rgb(46, 204, 113), Stroke::new(2.0, Color32::WHITE));
            painter.circle(end, 6.0, Color32::from_rgb(231, 76, 60), Stroke::new(2.0, Color32::WHITE));
        }
    }
}
