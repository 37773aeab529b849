//! Heatmap categories, payloads, radius control, and the density color ramp

use crate::geometry::GeoPoint;
use std::collections::BTreeSet;

/// Smallest selectable heat radius, in pixels.
pub const RADIUS_MIN: u32 = 5;
/// Largest selectable heat radius, in pixels.
pub const RADIUS_MAX: u32 = 100;
/// Step applied per scroll notch or button press.
pub const RADIUS_STEP: u32 = 5;
/// Radius used until the user adjusts it.
pub const RADIUS_DEFAULT: u32 = 25;

/// Alpha applied to the heat layer as a whole.
pub const DEFAULT_HEATMAP_OPACITY: f32 = 0.7;

/// One selectable heat layer, keyed by the slug sent as the `type` query
/// parameter of `/get_heatmap_data`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeatmapCategory {
    SpeedReducer,
    TrafficAccidents,
    ElectronicEnforcement,
    BusPriority,
    TrafficSignals,
}

impl HeatmapCategory {
    pub fn slug(&self) -> &'static str {
        match self {
            Self::SpeedReducer => "speed-reducer",
            Self::TrafficAccidents => "traffic-accident-with-victims",
            Self::ElectronicEnforcement => "electronic-enforcement",
            Self::BusPriority => "bus-priority-network",
            Self::TrafficSignals => "traffic-signals",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::SpeedReducer => "Speed Reducers",
            Self::TrafficAccidents => "Traffic Accidents with Victims",
            Self::ElectronicEnforcement => "Electronic Enforcement",
            Self::BusPriority => "Bus Priority Network",
            Self::TrafficSignals => "Traffic Signals",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::all().iter().copied().find(|c| c.slug() == slug)
    }

    /// Only the accident layer exposes year and fatality filters.
    pub fn has_filters(&self) -> bool {
        matches!(self, Self::TrafficAccidents)
    }

    pub fn all() -> &'static [Self] {
        const ALL: [HeatmapCategory; 5] = [
            HeatmapCategory::SpeedReducer,
            HeatmapCategory::TrafficAccidents,
            HeatmapCategory::ElectronicEnforcement,
            HeatmapCategory::BusPriority,
            HeatmapCategory::TrafficSignals,
        ];
        &ALL
    }
}

impl Default for HeatmapCategory {
    fn default() -> Self {
        Self::SpeedReducer
    }
}

/// One raw heat sample as served by the backend. Coordinates are unvalidated.
#[derive(Clone, Copy, Debug, PartialEq, serde::Deserialize)]
pub struct HeatPoint {
    pub lat: f64,
    pub lng: f64,
}

/// Per-point metadata for the accident layer, aligned with `points` by index.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(default)]
pub struct AccidentDetail {
    pub year: String,
    pub fatality: String,
}

/// Response of `GET /get_heatmap_data?type={slug}`.
#[derive(Clone, Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct HeatmapResponse {
    pub points: Vec<HeatPoint>,
    pub details: Vec<AccidentDetail>,
}

/// Client-side filters for the accident layer. `None` means "all".
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AccidentFilter {
    pub year: Option<String>,
    pub fatality: Option<String>,
}

impl AccidentFilter {
    fn matches(&self, detail: &AccidentDetail) -> bool {
        self.year.as_ref().is_none_or(|y| &detail.year == y)
            && self.fatality.as_ref().is_none_or(|f| &detail.fatality == f)
    }
}

/// Drop out-of-range points and apply the accident filter where details exist.
///
/// Points without a matching detail entry pass the filter; the backend only
/// guarantees details for the accident layer.
pub fn filter_valid_points(response: &HeatmapResponse, filter: &AccidentFilter) -> Vec<GeoPoint> {
    response
        .points
        .iter()
        .enumerate()
        .filter(|(i, _)| {
            response
                .details
                .get(*i)
                .is_none_or(|detail| filter.matches(detail))
        })
        .map(|(_, p)| GeoPoint::new(p.lat, p.lng))
        .filter(GeoPoint::is_valid)
        .collect()
}

/// Distinct non-empty years across the details, sorted ascending.
pub fn distinct_years(details: &[AccidentDetail]) -> Vec<String> {
    details
        .iter()
        .filter(|d| !d.year.is_empty())
        .map(|d| d.year.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Bounding box of a point set, with longitude on `x` and latitude on `y`.
pub fn point_bounds(points: &[GeoPoint]) -> Option<geo::Rect<f64>> {
    let mut projected = points.iter().map(|&p| geo::Point::from(p));
    let (mut west, mut south) = projected.next()?.x_y();
    let (mut east, mut north) = (west, south);
    for point in projected {
        let (x, y) = point.x_y();
        west = west.min(x);
        east = east.max(x);
        south = south.min(y);
        north = north.max(y);
    }
    Some(geo::Rect::new(
        geo::coord! { x: west, y: south },
        geo::coord! { x: east, y: north },
    ))
}

/// Heat radius with clamped stepping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RadiusControl {
    pub radius: u32,
}

impl Default for RadiusControl {
    fn default() -> Self {
        Self {
            radius: RADIUS_DEFAULT,
        }
    }
}

impl RadiusControl {
    /// Step the radius by `steps` notches, clamping to the allowed range.
    /// Returns true when the radius actually changed.
    pub fn adjust(&mut self, steps: i32) -> bool {
        let delta = i64::from(steps) * i64::from(RADIUS_STEP);
        let next = (i64::from(self.radius) + delta).clamp(i64::from(RADIUS_MIN), i64::from(RADIUS_MAX)) as u32;
        let changed = next != self.radius;
        self.radius = next;
        changed
    }
}

/// Density color ramp, six stops from green through red. `t` is clamped to
/// `[0, 1]`; opacity handling is left to the renderer.
pub fn heat_color(t: f32) -> [u8; 3] {
    const STOPS: [(f32, [u8; 3]); 6] = [
        (0.0, [0, 255, 0]),
        (0.2, [100, 100, 255]),
        (0.4, [0, 255, 255]),
        (0.6, [255, 255, 0]),
        (0.8, [255, 128, 0]),
        (1.0, [255, 0, 0]),
    ];
    let t = t.clamp(0.0, 1.0);
    for window in STOPS.windows(2) {
        let (t0, c0) = window[0];
        let (t1, c1) = window[1];
        if t <= t1 {
            let f = if t1 > t0 { (t - t0) / (t1 - t0) } else { 0.0 };
            return [
                lerp_u8(c0[0], c1[0], f),
                lerp_u8(c0[1], c1[1], f),
                lerp_u8(c0[2], c1[2], f),
            ];
        }
    }
    STOPS[STOPS.len() - 1].1
}

fn lerp_u8(a: u8, b: u8, f: f32) -> u8 {
    (f32::from(a) + (f32::from(b) - f32::from(a)) * f).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_slug_roundtrip() {
        for category in HeatmapCategory::all() {
            assert_eq!(HeatmapCategory::from_slug(category.slug()), Some(*category));
        }
        assert_eq!(HeatmapCategory::from_slug("nope"), None);
    }

    #[test]
    fn test_only_accidents_have_filters() {
        for category in HeatmapCategory::all() {
            assert_eq!(
                category.has_filters(),
                *category == HeatmapCategory::TrafficAccidents
            );
        }
    }

    #[test]
    fn test_radius_clamps() {
        let mut control = RadiusControl::default();
        assert_eq!(control.radius, 25);

        assert!(control.adjust(-100));
        assert_eq!(control.radius, RADIUS_MIN);
        // Already at minimum; further decrease is a no-op
        assert!(!control.adjust(-1));
        assert_eq!(control.radius, RADIUS_MIN);

        assert!(control.adjust(1000));
        assert_eq!(control.radius, RADIUS_MAX);
        assert!(!control.adjust(1));
    }

    #[test]
    fn test_radius_steps_by_five() {
        let mut control = RadiusControl::default();
        control.adjust(1);
        assert_eq!(control.radius, 30);
        control.adjust(-2);
        assert_eq!(control.radius, 20);
    }

    #[test]
    fn test_filter_valid_points_drops_out_of_range() {
        let response = HeatmapResponse {
            points: vec![
                HeatPoint { lat: -19.9, lng: -43.9 },
                HeatPoint { lat: 120.0, lng: -43.9 },
                HeatPoint { lat: -19.8, lng: -200.0 },
            ],
            details: Vec::new(),
        };
        let points = filter_valid_points(&response, &AccidentFilter::default());
        assert_eq!(points.len(), 1);
        assert_eq!(points[0], GeoPoint::new(-19.9, -43.9));
    }

    #[test]
    fn test_accident_filter() {
        let response = HeatmapResponse {
            points: vec![
                HeatPoint { lat: -19.9, lng: -43.9 },
                HeatPoint { lat: -19.8, lng: -43.8 },
                HeatPoint { lat: -19.7, lng: -43.7 },
            ],
            details: vec![
                AccidentDetail { year: "2020".into(), fatality: "Sim".into() },
                AccidentDetail { year: "2021".into(), fatality: "Não".into() },
                AccidentDetail { year: "2020".into(), fatality: "Não".into() },
            ],
        };

        let by_year = AccidentFilter {
            year: Some("2020".into()),
            fatality: None,
        };
        assert_eq!(filter_valid_points(&response, &by_year).len(), 2);

        let both = AccidentFilter {
            year: Some("2020".into()),
            fatality: Some("Sim".into()),
        };
        assert_eq!(filter_valid_points(&response, &both).len(), 1);
    }

    #[test]
    fn test_distinct_years_sorted_unique() {
        let details = vec![
            AccidentDetail { year: "2021".into(), fatality: String::new() },
            AccidentDetail { year: "2019".into(), fatality: String::new() },
            AccidentDetail { year: "2021".into(), fatality: String::new() },
            AccidentDetail { year: String::new(), fatality: String::new() },
        ];
        assert_eq!(distinct_years(&details), vec!["2019", "2021"]);
    }

    #[test]
    fn test_point_bounds() {
        assert!(point_bounds(&[]).is_none());
        let points = vec![
            GeoPoint::new(-19.9, -43.9),
            GeoPoint::new(-19.8, -44.0),
            GeoPoint::new(-20.0, -43.8),
        ];
        let bounds = point_bounds(&points).unwrap();
        assert_eq!(bounds.min().y, -20.0);
        assert_eq!(bounds.max().y, -19.8);
        assert_eq!(bounds.min().x, -44.0);
        assert_eq!(bounds.max().x, -43.8);
    }

    #[test]
    fn test_heat_color_endpoints() {
        assert_eq!(heat_color(0.0), [0, 255, 0]);
        assert_eq!(heat_color(1.0), [255, 0, 0]);
        assert_eq!(heat_color(2.0), [255, 0, 0]);
        assert_eq!(heat_color(-1.0), [0, 255, 0]);
        // Midpoint of the cyan-to-yellow segment
        assert_eq!(heat_color(0.5), [128, 255, 128]);
    }
}
