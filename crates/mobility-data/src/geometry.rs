//! WKT geometry parsing, coordinate validation, and marker styling
//!
//! Backend records carry their location in a `GEOMETRIA` column as WKT text,
//! longitude first. Only in-range point geometries become map markers.

use crate::dataset::{DatasetId, Record, cell_text};
use crate::{DataError, Result};

/// Name of the geometry column present in every dataset.
pub const GEOMETRY_FIELD: &str = "GEOMETRIA";

/// A WGS84 coordinate pair.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Whether the coordinates are within WGS84 range.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

impl From<GeoPoint> for geo::Point<f64> {
    fn from(p: GeoPoint) -> Self {
        geo::Point::new(p.lng, p.lat)
    }
}

/// The geometry kinds the backend actually serves.
#[derive(Clone, Debug, PartialEq)]
pub enum WktGeometry {
    Point(GeoPoint),
    LineString(Vec<GeoPoint>),
}

/// Parse a `POINT (lng lat)` or `LINESTRING (lng lat, ...)` WKT string.
///
/// Coordinates are longitude first, as WKT mandates. Range validation is left
/// to the caller; this only checks syntax.
pub fn parse_wkt(wkt: &str) -> Result<WktGeometry> {
    let trimmed = wkt.trim();
    let upper = trimmed.to_ascii_uppercase();
    if let Some(body) = upper
        .strip_prefix("POINT")
        .map(|rest| &trimmed[trimmed.len() - rest.len()..])
    {
        let coords = strip_parens(body, wkt)?;
        return Ok(WktGeometry::Point(parse_pair(coords, wkt)?));
    }
    if let Some(body) = upper
        .strip_prefix("LINESTRING")
        .map(|rest| &trimmed[trimmed.len() - rest.len()..])
    {
        let coords = strip_parens(body, wkt)?;
        let points = coords
            .split(',')
            .map(|pair| parse_pair(pair, wkt))
            .collect::<Result<Vec<_>>>()?;
        if points.is_empty() {
            return Err(DataError::InvalidGeometry(wkt.to_string()));
        }
        return Ok(WktGeometry::LineString(points));
    }
    Err(DataError::InvalidGeometry(wkt.to_string()))
}

fn strip_parens<'a>(body: &'a str, original: &str) -> Result<&'a str> {
    body.trim()
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .ok_or_else(|| DataError::InvalidGeometry(original.to_string()))
}

fn parse_pair(pair: &str, original: &str) -> Result<GeoPoint> {
    let mut parts = pair.split_whitespace();
    let lng = parts
        .next()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| DataError::InvalidGeometry(original.to_string()))?;
    let lat = parts
        .next()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| DataError::InvalidGeometry(original.to_string()))?;
    if parts.next().is_some() {
        return Err(DataError::InvalidGeometry(original.to_string()));
    }
    Ok(GeoPoint::new(lat, lng))
}

/// Marker tint, resolved per record by [`marker_color`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MarkerColor {
    Blue,
    Green,
    Red,
    Orange,
    Purple,
}

impl MarkerColor {
    pub fn rgb(&self) -> [u8; 3] {
        match self {
            Self::Blue => [42, 110, 187],
            Self::Green => [46, 160, 67],
            Self::Red => [203, 36, 49],
            Self::Orange => [219, 109, 40],
            Self::Purple => [130, 80, 223],
        }
    }
}

/// Resolve the marker color for a record of the given dataset.
///
/// Older-adult parking turns green when the stay limit is free, traffic
/// accidents turn red on fatality, enforcement devices are purple, everything
/// else gets the default blue.
pub fn marker_color(dataset: &DatasetId, record: &Record) -> MarkerColor {
    match dataset {
        DatasetId::OlderAdultParking => {
            if cell_text(record, "TEMPO_PERMANENCIA").contains("LIVRE") {
                MarkerColor::Green
            } else {
                MarkerColor::Red
            }
        }
        DatasetId::TrafficAccidents => {
            if cell_text(record, "INDICADOR_FATALIDADE") == "Sim" {
                MarkerColor::Red
            } else {
                MarkerColor::Orange
            }
        }
        DatasetId::ElectronicEnforcement => MarkerColor::Purple,
        _ => MarkerColor::Blue,
    }
}

/// Popup body for a marker: one `FIELD: value` line per non-geometry field, in
/// the dataset's field order. Missing and null values render as empty, the
/// same as table cells.
pub fn popup_lines(record: &Record, fields: &[String]) -> Vec<String> {
    fields
        .iter()
        .filter(|f| f.as_str() != GEOMETRY_FIELD)
        .map(|f| format!("{}: {}", f, cell_text(record, f)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_point() {
        let geom = parse_wkt("POINT (-43.9451 -19.9227)").unwrap();
        assert_eq!(
            geom,
            WktGeometry::Point(GeoPoint::new(-19.9227, -43.9451))
        );
    }

    #[test]
    fn test_parse_point_lowercase_and_padding() {
        let geom = parse_wkt("  point (-43.9 -19.9)  ").unwrap();
        assert!(matches!(geom, WktGeometry::Point(_)));
    }

    #[test]
    fn test_parse_linestring() {
        let geom = parse_wkt("LINESTRING (-43.9 -19.9, -43.8 -19.8, -43.7 -19.7)").unwrap();
        match geom {
            WktGeometry::LineString(points) => {
                assert_eq!(points.len(), 3);
                assert_eq!(points[0], GeoPoint::new(-19.9, -43.9));
            }
            other => panic!("expected linestring, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_wkt("").is_err());
        assert!(parse_wkt("POLYGON ((0 0, 1 1, 0 1, 0 0))").is_err());
        assert!(parse_wkt("POINT (-43.9)").is_err());
        assert!(parse_wkt("POINT (-43.9 -19.9 12.0)").is_err());
        assert!(parse_wkt("POINT -43.9 -19.9").is_err());
    }

    #[test]
    fn test_point_validity() {
        assert!(GeoPoint::new(-19.9227, -43.9451).is_valid());
        assert!(!GeoPoint::new(-99.0, -43.9).is_valid());
        assert!(!GeoPoint::new(-19.9, 199.0).is_valid());
        assert!(!GeoPoint::new(f64::NAN, 0.0).is_valid());
    }

    fn record(pairs: &[(&str, &str)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
            .collect()
    }

    #[test]
    fn test_marker_color_older_adult_parking() {
        let free = record(&[("TEMPO_PERMANENCIA", "LIVRE")]);
        let limited = record(&[("TEMPO_PERMANENCIA", "2 HORAS")]);
        assert_eq!(
            marker_color(&DatasetId::OlderAdultParking, &free),
            MarkerColor::Green
        );
        assert_eq!(
            marker_color(&DatasetId::OlderAdultParking, &limited),
            MarkerColor::Red
        );
    }

    #[test]
    fn test_marker_color_accidents() {
        let fatal = record(&[("INDICADOR_FATALIDADE", "Sim")]);
        let non_fatal = record(&[("INDICADOR_FATALIDADE", "Não")]);
        assert_eq!(
            marker_color(&DatasetId::TrafficAccidents, &fatal),
            MarkerColor::Red
        );
        assert_eq!(
            marker_color(&DatasetId::TrafficAccidents, &non_fatal),
            MarkerColor::Orange
        );
    }

    #[test]
    fn test_marker_color_defaults() {
        let rec = record(&[]);
        assert_eq!(
            marker_color(&DatasetId::ElectronicEnforcement, &rec),
            MarkerColor::Purple
        );
        assert_eq!(marker_color(&DatasetId::SpeedHumps, &rec), MarkerColor::Blue);
    }

    #[test]
    fn test_popup_lines_list_every_non_geometry_field() {
        let mut rec = record(&[
            ("BAIRRO", "Centro"),
            ("GEOMETRIA", "POINT (-43.9 -19.9)"),
        ]);
        rec.insert("OBS".to_string(), serde_json::Value::Null);
        let fields = vec![
            "BAIRRO".to_string(),
            "GEOMETRIA".to_string(),
            "OBS".to_string(),
        ];
        // Null and empty fields still get a line, only geometry is skipped
        assert_eq!(popup_lines(&rec, &fields), vec!["BAIRRO: Centro", "OBS: "]);
    }

    #[test]
    fn test_geo_point_interop() {
        let point = geo::Point::from(GeoPoint::new(-19.9227, -43.9451));
        // geo puts longitude on x
        assert_eq!(point.x_y(), (-43.9451, -19.9227));
    }
}
