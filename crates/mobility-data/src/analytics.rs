//! Dataset analytics payloads and the chart dispatch registry
//!
//! Every dataset page carries an `analytics` block whose shape depends on the
//! dataset. [`chart_specs`] is the single dispatch point that turns a dataset
//! identifier plus its analytics block into a concrete list of charts; datasets
//! without chart support yield an empty list rather than an error.

use crate::dataset::DatasetId;
use std::collections::BTreeMap;

type CountMap = BTreeMap<String, u64>;

/// Physical vs rotative parking spot totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(default)]
pub struct VagasComparison {
    pub fisicas: u64,
    pub rotativas: u64,
}

/// Union of all per-dataset analytics sub-maps. The backend only populates the
/// keys relevant to the requested dataset; everything else deserializes empty.
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(default)]
pub struct Analytics {
    // Parking (older-adult and rotative)
    pub bairro_counts: CountMap,
    pub tempo_permanencia_counts: CountMap,
    pub dia_operacao_counts: CountMap,
    pub vagas_comparison: Option<VagasComparison>,

    // Electronic enforcement
    pub tipo_controlador_counts: CountMap,
    pub sentido_counts: CountMap,

    // Ticket booths
    pub endereco_counts: CountMap,

    // Bus priority network
    pub infraestrutura_counts: CountMap,
    pub ano_implantacao_counts: CountMap,
    pub total_extensao: Option<f64>,

    // Speed humps
    pub implantacao_years: CountMap,
    pub manutencao_years: CountMap,

    // Traffic signals
    pub tipo_travessia_counts: CountMap,
    pub botoeira_counts: CountMap,
    pub botoeira_sonora_counts: CountMap,
    pub media_faixas_veiculo: Option<f64>,
    pub media_faixas_pedestre: Option<f64>,

    // Traffic accidents
    pub tipo_acidente_counts: CountMap,
    pub regional_counts: CountMap,
    pub fatalidade_counts: CountMap,
    pub acidentes_por_ano: CountMap,
}

/// How a chart is drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChartKind {
    Bar,
    Pie,
    Line,
}

/// One renderable chart: parallel label/value series plus a title.
#[derive(Clone, Debug, PartialEq)]
pub struct ChartSpec {
    pub title: String,
    pub kind: ChartKind,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl ChartSpec {
    fn from_counts(title: &str, kind: ChartKind, counts: &CountMap) -> Self {
        let labels = counts.keys().cloned().collect();
        let values = counts.values().map(|&v| v as f64).collect();
        Self {
            title: title.to_string(),
            kind,
            labels,
            values,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// The dataset-to-chart dispatch table.
///
/// Returns the chart set for a supported dataset, or an empty list for
/// [`DatasetId::NonCirculating`] (map only) and [`DatasetId::Other`].
pub fn chart_specs(dataset: &DatasetId, analytics: &Analytics) -> Vec<ChartSpec> {
    match dataset {
        DatasetId::OlderAdultParking => {
            let mut specs = vec![ChartSpec::from_counts(
                "Parking Spots by Neighborhood (BAIRRO)",
                ChartKind::Bar,
                &analytics.bairro_counts,
            )];
            if let Some(vagas) = analytics.vagas_comparison {
                specs.push(ChartSpec {
                    title: "Physical vs Rotative Parking Spots".to_string(),
                    kind: ChartKind::Pie,
                    labels: vec!["Physical Spots".to_string(), "Rotative Spots".to_string()],
                    values: vec![vagas.fisicas as f64, vagas.rotativas as f64],
                });
            }
            specs.push(ChartSpec::from_counts(
                "Parking Time Limits (TEMPO_PERMANENCIA)",
                ChartKind::Pie,
                &analytics.tempo_permanencia_counts,
            ));
            specs
        }
        DatasetId::RotativeParking => vec![
            ChartSpec::from_counts(
                "Parking Spots by Neighborhood (BAIRRO)",
                ChartKind::Bar,
                &analytics.bairro_counts,
            ),
            ChartSpec::from_counts(
                "Operation Days (DIA_REGRA_OPERACAO)",
                ChartKind::Pie,
                &analytics.dia_operacao_counts,
            ),
            ChartSpec::from_counts(
                "Parking Time Limits (TEMPO_PERMANENCIA)",
                ChartKind::Bar,
                &analytics.tempo_permanencia_counts,
            ),
        ],
        DatasetId::ElectronicEnforcement => vec![
            ChartSpec::from_counts(
                "Electronic Enforcement Types (DESC_TIPO_CONTROLADOR_TRANSITO)",
                ChartKind::Bar,
                &analytics.tipo_controlador_counts,
            ),
            ChartSpec::from_counts(
                "Enforcement Directions (SENTIDO)",
                ChartKind::Pie,
                &analytics.sentido_counts,
            ),
        ],
        DatasetId::TicketBooths => vec![ChartSpec::from_counts(
            "Ticket Booths by Address (ENDERECO)",
            ChartKind::Bar,
            &analytics.endereco_counts,
        )],
        DatasetId::BusPriorityNetwork => vec![
            ChartSpec::from_counts(
                "Bus Priority Infrastructure Types (INFRAESTRUTURA_PREDOMINANTE)",
                ChartKind::Pie,
                &analytics.infraestrutura_counts,
            ),
            ChartSpec::from_counts(
                "Implementation Years (ANO_IMPLANT_INFRA_ATUAL)",
                ChartKind::Bar,
                &analytics.ano_implantacao_counts,
            ),
        ],
        DatasetId::SpeedHumps => vec![
            ChartSpec::from_counts(
                "Speed Humps by Neighborhood (BAIRRO)",
                ChartKind::Bar,
                &analytics.bairro_counts,
            ),
            ChartSpec::from_counts(
                "Speed Hump Installations by Year (DATA_IMPLANTACAO)",
                ChartKind::Line,
                &analytics.implantacao_years,
            ),
        ],
        DatasetId::TrafficSignals => vec![
            ChartSpec::from_counts(
                "Traffic Signal Crossing Types (TP_TRAVESSIA_PEDESTRE)",
                ChartKind::Bar,
                &analytics.tipo_travessia_counts,
            ),
            ChartSpec::from_counts(
                "Traffic Signals with Pedestrian Buttons (BOTOEIRA)",
                ChartKind::Pie,
                &analytics.botoeira_counts,
            ),
        ],
        DatasetId::TrafficAccidents => vec![
            ChartSpec::from_counts(
                "Traffic Accident Types (DESCRICAO_TIPO_ACIDENTE)",
                ChartKind::Bar,
                &analytics.tipo_acidente_counts,
            ),
            ChartSpec::from_counts(
                "Traffic Accidents by Region (DESCRICAO_REGIONAL)",
                ChartKind::Bar,
                &analytics.regional_counts,
            ),
            ChartSpec::from_counts(
                "Traffic Accidents by Year (DATA_HORA_BOLETIM)",
                ChartKind::Line,
                &analytics.acidentes_por_ano,
            ),
        ],
        // Map only; the explorer shows an informational message instead of charts.
        DatasetId::NonCirculating => Vec::new(),
        DatasetId::Other(_) => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(pairs: &[(&str, u64)]) -> CountMap {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_speed_humps_dispatch() {
        let analytics = Analytics {
            bairro_counts: counts(&[("Centro", 5), ("Norte", 3)]),
            implantacao_years: counts(&[("2019", 2), ("2021", 6)]),
            ..Default::default()
        };

        let specs = chart_specs(&DatasetId::SpeedHumps, &analytics);
        assert_eq!(specs.len(), 2);

        let bar = &specs[0];
        assert_eq!(bar.kind, ChartKind::Bar);
        assert_eq!(bar.labels, vec!["Centro", "Norte"]);
        assert_eq!(bar.values, vec![5.0, 3.0]);

        let line = &specs[1];
        assert_eq!(line.kind, ChartKind::Line);
        assert_eq!(line.labels, vec!["2019", "2021"]);
        assert_eq!(line.values, vec![2.0, 6.0]);
    }

    #[test]
    fn test_accidents_dispatch() {
        let analytics = Analytics {
            tipo_acidente_counts: counts(&[("Atropelamento", 4)]),
            regional_counts: counts(&[("Leste", 2), ("Oeste", 2)]),
            acidentes_por_ano: counts(&[("2020", 1), ("2021", 3)]),
            ..Default::default()
        };

        let specs = chart_specs(&DatasetId::TrafficAccidents, &analytics);
        let kinds: Vec<ChartKind> = specs.iter().map(|s| s.kind).collect();
        assert_eq!(kinds, vec![ChartKind::Bar, ChartKind::Bar, ChartKind::Line]);
    }

    #[test]
    fn test_older_adult_parking_includes_vagas_pie() {
        let analytics = Analytics {
            bairro_counts: counts(&[("Savassi", 10)]),
            tempo_permanencia_counts: counts(&[("2 HORAS", 7), ("LIVRE", 3)]),
            vagas_comparison: Some(VagasComparison {
                fisicas: 120,
                rotativas: 40,
            }),
            ..Default::default()
        };

        let specs = chart_specs(&DatasetId::OlderAdultParking, &analytics);
        assert_eq!(specs.len(), 3);
        assert_eq!(specs[1].kind, ChartKind::Pie);
        assert_eq!(specs[1].values, vec![120.0, 40.0]);
    }

    #[test]
    fn test_unsupported_datasets_render_no_charts() {
        let analytics = Analytics {
            bairro_counts: counts(&[("Centro", 5)]),
            ..Default::default()
        };
        assert!(chart_specs(&DatasetId::NonCirculating, &analytics).is_empty());
        assert!(chart_specs(&DatasetId::Other("ciclovias".into()), &analytics).is_empty());
    }

    #[test]
    fn test_year_series_sorted() {
        // BTreeMap keys come out sorted, so year series are chronological even if
        // the backend emits them out of order.
        let payload = serde_json::json!({
            "implantacao_years": {"2021": 1, "2019": 2, "2020": 4}
        });
        let analytics: Analytics = serde_json::from_value(payload).unwrap();
        let specs = chart_specs(&DatasetId::SpeedHumps, &analytics);
        assert_eq!(specs[1].labels, vec!["2019", "2020", "2021"]);
    }
}
