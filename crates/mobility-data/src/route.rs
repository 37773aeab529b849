//! Route planning model: address list, travel modes, and polyline decoding

use crate::geometry::GeoPoint;
use crate::{DataError, Result};

/// Minimum number of address rows; the form never shrinks below this.
pub const MIN_ADDRESSES: usize = 2;

/// Line color used when a segment's mode is unrecognized.
pub const DEFAULT_ROUTE_COLOR: [u8; 3] = [52, 152, 219];

/// Supported travel modes for route calculation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    #[default]
    Driving,
    Walking,
    Transit,
}

impl TravelMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Driving => "driving",
            Self::Walking => "walking",
            Self::Transit => "transit",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Driving => "Driving",
            Self::Walking => "Walking",
            Self::Transit => "Public Transport",
        }
    }

    pub fn all() -> &'static [Self] {
        const ALL: [TravelMode; 3] = [TravelMode::Driving, TravelMode::Walking, TravelMode::Transit];
        &ALL
    }
}

/// Line color for a segment's mode string, as reported by the backend.
pub fn mode_color(mode: &str) -> [u8; 3] {
    match mode {
        "driving" => [41, 128, 185],
        "walking" => [39, 174, 96],
        "transit" => [142, 68, 173],
        _ => DEFAULT_ROUTE_COLOR,
    }
}

/// Body of `POST /calculate_route`.
#[derive(Clone, Debug, serde::Serialize)]
pub struct RouteRequest {
    pub addresses: Vec<String>,
    pub mode: TravelMode,
}

/// One leg between consecutive addresses.
#[derive(Clone, Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RouteSegment {
    pub start: String,
    pub end: String,
    pub mode: String,
    pub distance: String,
    pub duration: String,
}

/// Aggregate route description returned by the backend.
#[derive(Clone, Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RouteSummary {
    pub segments: Vec<RouteSegment>,
    pub total_distance_km: f64,
    pub total_duration_mins: f64,
}

/// Response of `POST /calculate_route`.
#[derive(Clone, Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RouteResponse {
    pub route: RouteSummary,
    pub polyline: String,
}

/// The route form's editable address rows.
///
/// Always holds at least [`MIN_ADDRESSES`] rows; removal below that is refused
/// without changing state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddressList {
    entries: Vec<String>,
}

impl Default for AddressList {
    fn default() -> Self {
        Self::new()
    }
}

impl AddressList {
    pub fn new() -> Self {
        Self {
            entries: vec![String::new(); MIN_ADDRESSES],
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries_mut(&mut self) -> &mut [String] {
        &mut self.entries
    }

    pub fn add(&mut self) {
        self.entries.push(String::new());
    }

    /// Remove the row at `index`. Fails without mutating when the list is at
    /// the minimum size or the index is out of bounds.
    pub fn remove(&mut self, index: usize) -> Result<()> {
        if self.entries.len() <= MIN_ADDRESSES {
            return Err(DataError::NotEnoughAddresses);
        }
        if index >= self.entries.len() {
            return Err(DataError::NotEnoughAddresses);
        }
        self.entries.remove(index);
        Ok(())
    }

    /// Trimmed, non-empty addresses in row order, ready for a request.
    pub fn collected(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Decode a Google encoded polyline into coordinate pairs.
///
/// 1e-5 precision, as produced by the directions backend.
pub fn decode_polyline(encoded: &str) -> Result<Vec<GeoPoint>> {
    let bytes = encoded.as_bytes();
    let mut points = Vec::new();
    let mut index = 0;
    let mut lat: i64 = 0;
    let mut lng: i64 = 0;

    while index < bytes.len() {
        lat += decode_varint(bytes, &mut index)?;
        lng += decode_varint(bytes, &mut index)?;
        points.push(GeoPoint::new(lat as f64 * 1e-5, lng as f64 * 1e-5));
    }
    Ok(points)
}

fn decode_varint(bytes: &[u8], index: &mut usize) -> Result<i64> {
    let mut result: i64 = 0;
    let mut shift = 0;
    loop {
        let byte = *bytes.get(*index).ok_or(DataError::InvalidPolyline)?;
        *index += 1;
        if !(63..=126).contains(&byte) {
            return Err(DataError::InvalidPolyline);
        }
        let chunk = i64::from(byte - 63);
        result |= (chunk & 0x1f) << shift;
        shift += 5;
        if chunk < 0x20 {
            break;
        }
        if shift > 60 {
            return Err(DataError::InvalidPolyline);
        }
    }
    if result & 1 == 1 {
        Ok(!(result >> 1))
    } else {
        Ok(result >> 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_labels() {
        assert_eq!(TravelMode::Driving.label(), "Driving");
        assert_eq!(TravelMode::Transit.label(), "Public Transport");
        assert_eq!(TravelMode::default(), TravelMode::Driving);
    }

    #[test]
    fn test_mode_serializes_lowercase() {
        let request = RouteRequest {
            addresses: vec!["A".into(), "B".into()],
            mode: TravelMode::Transit,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["mode"], "transit");
    }

    #[test]
    fn test_mode_color_fallback() {
        assert_eq!(mode_color("walking"), [39, 174, 96]);
        assert_eq!(mode_color("hoverboard"), DEFAULT_ROUTE_COLOR);
    }

    #[test]
    fn test_address_list_starts_at_minimum() {
        let list = AddressList::new();
        assert_eq!(list.len(), MIN_ADDRESSES);
    }

    #[test]
    fn test_address_list_remove_refused_at_minimum() {
        let mut list = AddressList::new();
        let before = list.clone();
        assert!(matches!(
            list.remove(0),
            Err(DataError::NotEnoughAddresses)
        ));
        // State unchanged after a refused removal
        assert_eq!(list, before);
    }

    #[test]
    fn test_address_list_add_then_remove() {
        let mut list = AddressList::new();
        list.add();
        assert_eq!(list.len(), 3);
        list.remove(1).unwrap();
        assert_eq!(list.len(), 2);
        assert!(list.remove(0).is_err());
    }

    #[test]
    fn test_collected_trims_and_skips_blank() {
        let mut list = AddressList::new();
        list.add();
        let entries = list.entries_mut();
        entries[0] = "  Praça Sete  ".into();
        entries[1] = "   ".into();
        entries[2] = "Savassi".into();
        assert_eq!(list.collected(), vec!["Praça Sete", "Savassi"]);
    }

    #[test]
    fn test_decode_polyline_reference_vector() {
        // Canonical example from the encoded polyline format documentation
        let points = decode_polyline("_p~iF~ps|U_ulLnnqC_mqNvxq`@").unwrap();
        assert_eq!(points.len(), 3);
        assert!((points[0].lat - 38.5).abs() < 1e-5);
        assert!((points[0].lng - -120.2).abs() < 1e-5);
        assert!((points[1].lat - 40.7).abs() < 1e-5);
        assert!((points[1].lng - -120.95).abs() < 1e-5);
        assert!((points[2].lat - 43.252).abs() < 1e-5);
        assert!((points[2].lng - -126.453).abs() < 1e-5);
    }

    #[test]
    fn test_decode_empty_polyline() {
        assert!(decode_polyline("").unwrap().is_empty());
    }

    #[test]
    fn test_decode_rejects_truncated_input() {
        // A continuation byte with no follow-up
        assert!(decode_polyline("_").is_err());
    }

    #[test]
    fn test_decode_rejects_out_of_alphabet_bytes() {
        assert!(decode_polyline("abc\u{1}").is_err());
    }
}
