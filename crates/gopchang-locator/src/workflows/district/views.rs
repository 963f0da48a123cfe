//! Dashboard view models rendered from a [`FilterOutcome`].

use serde::Serialize;

use super::domain::{Archetype, Dimension, InvestmentTier};
use super::filter::FilterOutcome;
use super::table::DistrictTable;

pub const RANKING_TOP_N: usize = 10;
pub const NO_DATA: &str = "데이터 없음";

const MAN: f64 = 10_000.0;
const EOK: f64 = 100_000_000.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpis {
    pub district_count: usize,
    pub average_score: String,
    pub night_population: String,
    pub monthly_sales: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingBar {
    pub district_name: String,
    pub composite: f64,
    pub archetype: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RadarAxis {
    pub label: &'static str,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RadarChart {
    pub axes: Vec<RadarAxis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub district_name: String,
    pub night_population: f64,
    pub composite: f64,
    pub archetype: &'static str,
    pub tier: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvestmentGroup {
    pub tier: &'static str,
    pub count: usize,
    pub mean_composite: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub rank: usize,
    pub district_id: String,
    pub district_name: String,
    pub composite: f64,
    pub archetype: &'static str,
    pub tier: &'static str,
    pub night_population: Option<f64>,
    /// Monthly Korean-restaurant sales in 억원, one decimal.
    pub monthly_sales_eok: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectOption {
    pub value: &'static str,
    pub label: &'static str,
}

/// Choices offered by the dashboard controls, taken from the full table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterOptions {
    pub archetypes: Vec<SelectOption>,
    pub tiers: Vec<SelectOption>,
    pub score_min: f64,
    pub score_max: f64,
}

impl FilterOptions {
    pub fn from_table(table: &DistrictTable) -> Self {
        let rows = table.rows();
        let archetypes = Archetype::ordered()
            .into_iter()
            .filter(|archetype| rows.iter().any(|row| row.archetype == *archetype))
            .map(|archetype| SelectOption {
                value: archetype.key(),
                label: archetype.label(),
            })
            .collect();
        let tiers = InvestmentTier::ordered()
            .into_iter()
            .filter(|tier| rows.iter().any(|row| row.tier == *tier))
            .map(|tier| SelectOption {
                value: tier.key(),
                label: tier.label(),
            })
            .collect();
        let scores = rows.iter().map(|row| row.composite).filter(|s| s.is_finite());
        let score_min = scores.clone().fold(f64::INFINITY, f64::min);
        let score_max = scores.fold(f64::NEG_INFINITY, f64::max);
        Self {
            archetypes,
            tiers,
            score_min: if score_min.is_finite() { score_min } else { 0.0 },
            score_max: if score_max.is_finite() { score_max } else { 0.0 },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub kpis: Kpis,
    pub ranking: Vec<RankingBar>,
    pub radar: RadarChart,
    pub scatter: Vec<ScatterPoint>,
    pub investment: Vec<InvestmentGroup>,
    pub table: Vec<TableRow>,
    pub filters: FilterOptions,
}

impl DashboardView {
    /// `base` is the unfiltered table the filter options are drawn from.
    pub fn render(outcome: &FilterOutcome, base: &DistrictTable) -> Self {
        let rows = outcome.rows.rows();
        let summary = &outcome.summary;

        let kpis = if outcome.is_empty() {
            Kpis {
                district_count: 0,
                average_score: "0점".to_string(),
                night_population: "0명".to_string(),
                monthly_sales: "0억원".to_string(),
            }
        } else {
            Kpis {
                district_count: summary.count,
                average_score: format!("{:.1}점", summary.mean_composite),
                night_population: format!("{:.0}만명", summary.mean_night_population / MAN),
                monthly_sales: format!("{:.0}억원", summary.mean_monthly_sales / EOK),
            }
        };

        let ranking = outcome
            .rows
            .top(RANKING_TOP_N)
            .iter()
            .map(|row| RankingBar {
                district_name: row.district_name.clone(),
                composite: row.composite,
                archetype: row.archetype.label(),
            })
            .collect();

        let radar = match &summary.radar {
            Some(means) => RadarChart {
                axes: Dimension::ordered()
                    .into_iter()
                    .map(|dimension| RadarAxis {
                        label: dimension.label(),
                        value: means.get(dimension),
                    })
                    .collect(),
                message: None,
            },
            None => RadarChart {
                axes: Vec::new(),
                message: Some(NO_DATA),
            },
        };

        let scatter = rows
            .iter()
            .filter_map(|row| {
                Some(ScatterPoint {
                    district_name: row.district_name.clone(),
                    night_population: row.metrics.night_population?,
                    composite: row.composite,
                    archetype: row.archetype.label(),
                    tier: row.tier.label(),
                })
            })
            .collect();

        let investment = summary
            .tiers
            .iter()
            .map(|group| InvestmentGroup {
                tier: group.tier.label(),
                count: group.count,
                mean_composite: group.mean_composite,
            })
            .collect();

        let table = rows
            .iter()
            .enumerate()
            .map(|(idx, row)| TableRow {
                rank: idx + 1,
                district_id: row.district_id.to_string(),
                district_name: row.district_name.clone(),
                composite: row.composite,
                archetype: row.archetype.label(),
                tier: row.tier.label(),
                night_population: row.metrics.night_population,
                monthly_sales_eok: row
                    .metrics
                    .korean_food_sales
                    .map(|sales| (sales / EOK * 10.0).round() / 10.0),
            })
            .collect();

        Self {
            kpis,
            ranking,
            radar,
            scatter,
            investment,
            table,
            filters: FilterOptions::from_table(base),
        }
    }
}
