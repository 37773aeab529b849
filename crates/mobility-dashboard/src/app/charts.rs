//! Painter-drawn charts for dataset analytics
//!
//! Bar, pie, and line renderers over [`ChartSpec`] series. These draw straight
//! onto the egui painter; there is no retained chart state.

use egui::{Align2, Color32, FontId, Pos2, Rect, Stroke, vec2};
use mobility_data::{ChartKind, ChartSpec};

/// Chart height in points, excluding the title row.
const CHART_HEIGHT: f32 = 200.0;

/// Series palette, cycled per label.
const PALETTE: [Color32; 8] = [
    Color32::from_rgb(52, 152, 219),
    Color32::from_rgb(231, 76, 60),
    Color32::from_rgb(46, 204, 113),
    Color32::from_rgb(241, 196, 15),
    Color32::from_rgb(155, 89, 182),
    Color32::from_rgb(230, 126, 34),
    Color32::from_rgb(26, 188, 156),
    Color32::from_rgb(149, 165, 166),
];

fn series_color(index: usize) -> Color32 {
    PALETTE[index % PALETTE.len()]
}

/// Render one chart with its title. Empty series render a placeholder label
/// instead of an empty plot area.
pub fn show_chart(ui: &mut egui::Ui, spec: &ChartSpec) {
    profiling::scope!("show_chart");
    ui.label(egui::RichText::new(&spec.title).strong());
    if spec.is_empty() {
        ui.weak("No data for this chart.");
        return;
    }
    let width = ui.available_width();
    let (response, painter) = ui.allocate_painter(vec2(width, CHART_HEIGHT), egui::Sense::hover());
    let rect = response.rect.shrink(8.0);
    match spec.kind {
        ChartKind::Bar => draw_bars(&painter, rect, spec, response.hover_pos()),
        ChartKind::Pie => draw_pie(&painter, rect, spec),
        ChartKind::Line => draw_line(&painter, rect, spec, response.hover_pos()),
    }
    ui.add_space(8.0);
}

fn draw_bars(painter: &egui::Painter, rect: Rect, spec: &ChartSpec, hover: Option<Pos2>) {
    let max = spec.values.iter().cloned().fold(f64::EPSILON, f64::max);
    let n = spec.values.len();
    let slot = rect.width() / n as f32;
    let bar_width = (slot * 0.8).max(1.0);

    for (i, &value) in spec.values.iter().enumerate() {
        let height = (value / max) as f32 * rect.height();
        let x = rect.left() + slot * i as f32 + (slot - bar_width) / 2.0;
        let bar = Rect::from_min_max(
            Pos2::new(x, rect.bottom() - height),
            Pos2::new(x + bar_width, rect.bottom()),
        );
        painter.rect_filled(bar, 2.0, series_color(i));

        if let Some(pos) = hover
            && pos.x >= x
            && pos.x <= x + bar_width
        {
            painter.text(
                bar.center_top() + vec2(0.0, -4.0),
                Align2::CENTER_BOTTOM,
                format!("{}: {}", spec.labels[i], value),
                FontId::proportional(11.0),
                Color32::WHITE,
            );
        }
    }
    painter.line_segment(
        [rect.left_bottom(), rect.right_bottom()],
        Stroke::new(1.0, Color32::GRAY),
    );
    // Label the bars only when they have room to breathe
    if slot >= 40.0 {
        for (i, label) in spec.labels.iter().enumerate() {
            let x = rect.left() + slot * (i as f32 + 0.5);
            painter.text(
                Pos2::new(x, rect.bottom() + 2.0),
                Align2::CENTER_TOP,
                truncate(label, 8),
                FontId::proportional(9.0),
                Color32::GRAY,
            );
        }
    }
}

fn draw_pie(painter: &egui::Painter, rect: Rect, spec: &ChartSpec) {
    let total: f64 = spec.values.iter().sum();
    if total <= 0.0 {
        return;
    }
    let radius = (rect.height() / 2.0 - 4.0).min(rect.width() / 3.0);
    let center = Pos2::new(rect.left() + radius + 4.0, rect.center().y);

    let mut angle = -std::f32::consts::FRAC_PI_2;
    for (i, &value) in spec.values.iter().enumerate() {
        let sweep = (value / total) as f32 * std::f32::consts::TAU;
        painter.add(egui::Shape::convex_polygon(
            wedge_points(center, radius, angle, sweep),
            series_color(i),
            Stroke::NONE,
        ));
        angle += sweep;
    }

    // Legend to the right of the pie
    let mut y = rect.top() + 4.0;
    for (i, label) in spec.labels.iter().enumerate() {
        let x = center.x + radius + 12.0;
        painter.rect_filled(
            Rect::from_min_size(Pos2::new(x, y), vec2(10.0, 10.0)),
            1.0,
            series_color(i),
        );
        let share = spec.values[i] / total * 100.0;
        painter.text(
            Pos2::new(x + 14.0, y + 5.0),
            Align2::LEFT_CENTER,
            format!("{} ({:.1}%)", truncate(label, 24), share),
            FontId::proportional(11.0),
            Color32::GRAY,
        );
        y += 14.0;
        if y > rect.bottom() {
            break;
        }
    }
}

/// Points of a pie wedge. Arcs are subdivided so the polygon stays convex
/// enough for the tessellator even on wide slices.
fn wedge_points(center: Pos2, radius: f32, start: f32, sweep: f32) -> Vec<Pos2> {
    let steps = ((sweep / 0.2).ceil() as usize).max(2);
    let mut points = vec![center];
    for s in 0..=steps {
        let a = start + sweep * s as f32 / steps as f32;
        points.push(center + vec2(a.cos(), a.sin()) * radius);
    }
    points
}

fn draw_line(painter: &egui::Painter, rect: Rect, spec: &ChartSpec, hover: Option<Pos2>) {
    let max = spec.values.iter().cloned().fold(f64::EPSILON, f64::max);
    let n = spec.values.len();
    let step = if n > 1 {
        rect.width() / (n - 1) as f32
    } else {
        0.0
    };

    let points: Vec<Pos2> = spec
        .values
        .iter()
        .enumerate()
        .map(|(i, &value)| {
            Pos2::new(
                rect.left() + step * i as f32,
                rect.bottom() - (value / max) as f32 * rect.height(),
            )
        })
        .collect();

    painter.line_segment(
        [rect.left_bottom(), rect.right_bottom()],
        Stroke::new(1.0, Color32::GRAY),
    );
    if points.len() >= 2 {
        painter.add(egui::Shape::line(
            points.clone(),
            Stroke::new(2.0, series_color(0)),
        ));
    }
    for (i, &point) in points.iter().enumerate() {
        painter.circle_filled(point, 3.0, series_color(0));
        if let Some(pos) = hover
            && (pos - point).length() < 10.0
        {
            painter.text(
                point + vec2(0.0, -6.0),
                Align2::CENTER_BOTTOM,
                format!("{}: {}", spec.labels[i], spec.values[i]),
                FontId::proportional(11.0),
                Color32::WHITE,
            );
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_chars).collect();
        format!("{truncated}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wedge_is_anchored_at_center() {
        let points = wedge_points(Pos2::new(0.0, 0.0), 10.0, 0.0, std::f32::consts::PI);
        assert_eq!(points[0], Pos2::new(0.0, 0.0));
        // Half circle subdivides into many small arc steps
        assert!(points.len() > 10);
        let first = points[1];
        assert!((first.x - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Centro", 8), "Centro");
        assert_eq!(truncate("Venda Nova", 8), "Venda No…");
    }

    #[test]
    fn test_palette_cycles() {
        assert_eq!(series_color(0), series_color(PALETTE.len()));
    }
}
