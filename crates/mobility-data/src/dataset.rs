//! Dataset identifiers, paginated payloads, and page math
//!
//! The backend serves nine known municipal datasets, each as a paginated JSON payload
//! with a flat record list and a dataset-specific analytics block.

use crate::analytics::Analytics;
use crate::geometry::{self, GeoPoint};

/// Page size used by the dashboard for every dataset request.
pub const DEFAULT_PER_PAGE: u64 = 100;

/// One backend dataset, keyed by its slug in the `/get_dataset/{slug}` URL.
///
/// Identifiers outside the known set are carried as [`DatasetId::Other`] so an
/// unsupported dataset is an explicit variant rather than a silent fall-through.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum DatasetId {
    OlderAdultParking,
    RotativeParking,
    ElectronicEnforcement,
    TicketBooths,
    BusPriorityNetwork,
    SpeedHumps,
    TrafficSignals,
    TrafficAccidents,
    NonCirculating,
    Other(String),
}

impl DatasetId {
    /// The URL slug used by the backend.
    pub fn slug(&self) -> &str {
        match self {
            Self::OlderAdultParking => "estacionamento_publico_pessoa_idosa",
            Self::RotativeParking => "estacionamento_rotativo",
            Self::ElectronicEnforcement => "fiscalizacao_eletronica",
            Self::TicketBooths => "posto_venda_rotativo",
            Self::BusPriorityNetwork => "rede_prioritaria_onibus",
            Self::SpeedHumps => "redutor_velocidade",
            Self::TrafficSignals => "sinalizacao_semaforica",
            Self::TrafficAccidents => "sinistro_transito_vitima",
            Self::NonCirculating => "trecho_no_circulacao",
            Self::Other(slug) => slug,
        }
    }

    /// Human-readable name for selection UIs.
    pub fn display_name(&self) -> &str {
        match self {
            Self::OlderAdultParking => "Older-Adult Parking",
            Self::RotativeParking => "Paid/Rotative Parking",
            Self::ElectronicEnforcement => "Electronic Enforcement",
            Self::TicketBooths => "Rotative Ticket Booths",
            Self::BusPriorityNetwork => "Bus Priority Network",
            Self::SpeedHumps => "Speed Humps",
            Self::TrafficSignals => "Traffic Signals",
            Self::TrafficAccidents => "Traffic Accidents",
            Self::NonCirculating => "Non-Circulating Road Segments",
            Self::Other(slug) => slug,
        }
    }

    /// Parse a slug, falling back to [`DatasetId::Other`] for unknown values.
    pub fn from_slug(slug: &str) -> Self {
        match slug {
            "estacionamento_publico_pessoa_idosa" => Self::OlderAdultParking,
            "estacionamento_rotativo" => Self::RotativeParking,
            "fiscalizacao_eletronica" => Self::ElectronicEnforcement,
            "posto_venda_rotativo" => Self::TicketBooths,
            "rede_prioritaria_onibus" => Self::BusPriorityNetwork,
            "redutor_velocidade" => Self::SpeedHumps,
            "sinalizacao_semaforica" => Self::TrafficSignals,
            "sinistro_transito_vitima" => Self::TrafficAccidents,
            "trecho_no_circulacao" => Self::NonCirculating,
            other => Self::Other(other.to_string()),
        }
    }

    /// All known datasets, in selection-UI order.
    pub fn all() -> &'static [Self] {
        const ALL: [DatasetId; 9] = [
            DatasetId::OlderAdultParking,
            DatasetId::RotativeParking,
            DatasetId::ElectronicEnforcement,
            DatasetId::TicketBooths,
            DatasetId::BusPriorityNetwork,
            DatasetId::SpeedHumps,
            DatasetId::TrafficSignals,
            DatasetId::TrafficAccidents,
            DatasetId::NonCirculating,
        ];
        &ALL
    }
}

/// A single record: field name to JSON value, as served by the backend.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Render a cell for display. Missing and null values become the empty string,
/// never `"null"`.
pub fn cell_text(record: &Record, field: &str) -> String {
    match record.get(field) {
        None | Some(serde_json::Value::Null) => String::new(),
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Parse the record's geometry column into a valid point, if it has one.
///
/// Line geometries and out-of-range coordinates yield `None`; only valid points
/// become markers.
pub fn record_point(record: &Record) -> Option<GeoPoint> {
    let wkt = match record.get(geometry::GEOMETRY_FIELD) {
        Some(serde_json::Value::String(s)) => s,
        _ => return None,
    };
    match geometry::parse_wkt(wkt) {
        Ok(geometry::WktGeometry::Point(point)) if point.is_valid() => Some(point),
        Ok(_) => None,
        Err(err) => {
            tracing::debug!("Skipping unparseable geometry: {err}");
            None
        }
    }
}

/// One page of a dataset as returned by `GET /get_dataset/{slug}`.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct DatasetPage {
    pub fields: Vec<String>,
    pub records: Vec<Record>,
    pub total_records: u64,
    pub page: u64,
    #[serde(default)]
    pub per_page: u64,
    #[serde(default)]
    pub analytics: Analytics,
}

impl DatasetPage {
    /// Pagination cursor for this page. Falls back to the dashboard page size when
    /// the backend omits `per_page`.
    pub fn cursor(&self) -> PageCursor {
        PageCursor {
            page: self.page,
            per_page: if self.per_page == 0 {
                DEFAULT_PER_PAGE
            } else {
                self.per_page
            },
            total_records: self.total_records,
        }
    }
}

/// Pagination state. Pages are 1-based; backward navigation never goes below 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageCursor {
    pub page: u64,
    pub per_page: u64,
    pub total_records: u64,
}

impl PageCursor {
    pub fn total_pages(&self) -> u64 {
        if self.per_page == 0 {
            return 0;
        }
        self.total_records.div_ceil(self.per_page)
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    /// Page number for backward navigation, saturating at 1.
    pub fn prev_page(&self) -> u64 {
        self.page.saturating_sub(1).max(1)
    }

    /// Page number for forward navigation. Not clamped against the upper bound;
    /// the UI disables the control instead, and the backend tolerates a stale
    /// request as a no-op.
    pub fn next_page(&self) -> u64 {
        self.page + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, serde_json::Value)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_slug_roundtrip() {
        for dataset in DatasetId::all() {
            assert_eq!(&DatasetId::from_slug(dataset.slug()), dataset);
        }
    }

    #[test]
    fn test_unknown_slug_is_other() {
        let dataset = DatasetId::from_slug("ciclovias");
        assert_eq!(dataset, DatasetId::Other("ciclovias".to_string()));
        assert_eq!(dataset.slug(), "ciclovias");
    }

    #[test]
    fn test_cell_text_missing_and_null() {
        let rec = record(&[
            ("BAIRRO", serde_json::Value::String("Centro".into())),
            ("OBS", serde_json::Value::Null),
            ("VAGAS", serde_json::json!(12)),
        ]);
        assert_eq!(cell_text(&rec, "BAIRRO"), "Centro");
        assert_eq!(cell_text(&rec, "OBS"), "");
        assert_eq!(cell_text(&rec, "NOPE"), "");
        assert_eq!(cell_text(&rec, "VAGAS"), "12");
    }

    #[test]
    fn test_record_point_valid() {
        let rec = record(&[(
            "GEOMETRIA",
            serde_json::Value::String("POINT (-43.9451 -19.9227)".into()),
        )]);
        let point = record_point(&rec).unwrap();
        assert!((point.lat - -19.9227).abs() < 1e-9);
        assert!((point.lng - -43.9451).abs() < 1e-9);
    }

    #[test]
    fn test_record_point_ignores_linestrings() {
        let rec = record(&[(
            "GEOMETRIA",
            serde_json::Value::String("LINESTRING (-43.9 -19.9, -43.8 -19.8)".into()),
        )]);
        assert!(record_point(&rec).is_none());
    }

    #[test]
    fn test_record_point_rejects_out_of_range() {
        let rec = record(&[(
            "GEOMETRIA",
            serde_json::Value::String("POINT (-43.9451 -99.0)".into()),
        )]);
        assert!(record_point(&rec).is_none());
    }

    #[test]
    fn test_cursor_bounds() {
        let cursor = PageCursor {
            page: 1,
            per_page: 100,
            total_records: 250,
        };
        assert_eq!(cursor.total_pages(), 3);
        assert!(!cursor.has_prev());
        assert!(cursor.has_next());
        // Prev from page 1 stays at page 1
        assert_eq!(cursor.prev_page(), 1);

        let last = PageCursor { page: 3, ..cursor };
        assert!(last.has_prev());
        assert!(!last.has_next());
    }

    #[test]
    fn test_cursor_prev_next_roundtrip() {
        let cursor = PageCursor {
            page: 2,
            per_page: 100,
            total_records: 500,
        };
        let forward = PageCursor {
            page: cursor.next_page(),
            ..cursor
        };
        assert_eq!(forward.prev_page(), cursor.page);
    }

    #[test]
    fn test_page_deserialization() {
        let payload = serde_json::json!({
            "fields": ["BAIRRO", "GEOMETRIA"],
            "records": [
                {"BAIRRO": "Centro", "GEOMETRIA": "POINT (-43.9451 -19.9227)"},
                {"BAIRRO": null, "GEOMETRIA": null}
            ],
            "total_records": 2,
            "page": 1,
            "per_page": 100,
            "analytics": {"bairro_counts": {"Centro": 1}}
        });
        let page: DatasetPage = serde_json::from_value(payload).unwrap();
        assert_eq!(page.fields.len(), 2);
        assert_eq!(page.records.len(), 2);
        assert!(page.records.len() as u64 <= page.cursor().per_page);
        assert_eq!(page.analytics.bairro_counts.get("Centro"), Some(&1));
    }
}
