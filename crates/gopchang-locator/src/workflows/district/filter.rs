//! Per-request filtering over the immutable district table.
//!
//! A [`FilterSpec`] is three independent predicates joined with AND, so
//! applying them in any order, or more than once, yields the same rows.
//! Unrecognised selector values and unusable score ranges never fail; they
//! behave as the identity filter.

use serde::{Deserialize, Serialize};

use super::domain::{Archetype, Dimension, InvestmentTier, ScoredDistrict, SubScores};
use super::table::DistrictTable;

/// Number of leading rows averaged for the radar chart.
pub const RADAR_TOP_N: usize = 5;

const ALL: &str = "all";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum Selector<T> {
    All,
    Only(T),
}

impl<T> Default for Selector<T> {
    fn default() -> Self {
        Self::All
    }
}

impl<T: Copy + PartialEq> Selector<T> {
    pub fn matches(&self, value: T) -> bool {
        match self {
            Self::All => true,
            Self::Only(expected) => *expected == value,
        }
    }

    /// `None`, `"all"` and anything `parse` rejects select everything.
    pub fn parse_with(raw: Option<&str>, parse: impl Fn(&str) -> Option<T>) -> Self {
        match raw.map(str::trim) {
            None | Some("") => Self::All,
            Some(value) if value.eq_ignore_ascii_case(ALL) => Self::All,
            Some(value) => parse(value).map(Self::Only).unwrap_or(Self::All),
        }
    }
}

impl Selector<Archetype> {
    pub fn archetype(raw: Option<&str>) -> Self {
        Self::parse_with(raw, Archetype::parse)
    }
}

impl Selector<InvestmentTier> {
    pub fn tier(raw: Option<&str>) -> Self {
        Self::parse_with(raw, InvestmentTier::parse)
    }
}

/// Inclusive on both ends. A NaN bound or `min > max` matches every score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreRange {
    pub min: f64,
    pub max: f64,
}

impl Default for ScoreRange {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl ScoreRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn unbounded() -> Self {
        Self::new(f64::NEG_INFINITY, f64::INFINITY)
    }

    pub fn from_bounds(min: Option<f64>, max: Option<f64>) -> Self {
        Self::new(
            min.unwrap_or(f64::NEG_INFINITY),
            max.unwrap_or(f64::INFINITY),
        )
    }

    pub fn is_valid(&self) -> bool {
        !self.min.is_nan() && !self.max.is_nan() && self.min <= self.max
    }

    pub fn contains(&self, score: f64) -> bool {
        !self.is_valid() || (self.min <= score && score <= self.max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FilterSpec {
    #[serde(default)]
    pub archetype: Selector<Archetype>,
    #[serde(default)]
    pub tier: Selector<InvestmentTier>,
    #[serde(default)]
    pub score_range: ScoreRange,
}

impl FilterSpec {
    pub fn matches(&self, row: &ScoredDistrict) -> bool {
        self.archetype.matches(row.archetype)
            && self.tier.matches(row.tier)
            && self.score_range.contains(row.composite)
    }

    /// Matching rows in their existing rank order.
    pub fn apply(&self, table: &DistrictTable) -> DistrictTable {
        DistrictTable::from_ranked(
            table
                .rows()
                .iter()
                .filter(|row| self.matches(row))
                .cloned()
                .collect(),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TierGroup {
    pub tier: InvestmentTier,
    pub count: usize,
    pub mean_composite: f64,
}

/// Aggregates over a filtered subset. Every mean is 0 when nothing is left
/// to average; `radar` is `None` for an empty subset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterSummary {
    pub count: usize,
    pub mean_composite: f64,
    pub mean_night_population: f64,
    pub mean_monthly_sales: f64,
    pub radar: Option<SubScores>,
    pub tiers: Vec<TierGroup>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterOutcome {
    pub spec: FilterSpec,
    pub rows: DistrictTable,
    pub summary: FilterSummary,
}

impl FilterOutcome {
    pub fn evaluate(table: &DistrictTable, spec: FilterSpec) -> Self {
        let rows = spec.apply(table);
        let summary = summarize(rows.rows());
        Self {
            spec,
            rows,
            summary,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub fn summarize(rows: &[ScoredDistrict]) -> FilterSummary {
    let radar = (!rows.is_empty()).then(|| {
        let top = &rows[..RADAR_TOP_N.min(rows.len())];
        let mut means = SubScores::default();
        for dimension in Dimension::ordered() {
            means.set(dimension, mean(top.iter().map(|row| row.sub_scores.get(dimension))));
        }
        means
    });

    let tiers = InvestmentTier::ordered()
        .into_iter()
        .filter_map(|tier| {
            let members: Vec<&ScoredDistrict> = rows.iter().filter(|row| row.tier == tier).collect();
            (!members.is_empty()).then(|| TierGroup {
                tier,
                count: members.len(),
                mean_composite: mean(members.iter().map(|row| row.composite)),
            })
        })
        .collect();

    FilterSummary {
        count: rows.len(),
        mean_composite: mean(rows.iter().map(|row| row.composite)),
        mean_night_population: mean(rows.iter().filter_map(|row| row.metrics.night_population)),
        mean_monthly_sales: mean(rows.iter().filter_map(|row| row.metrics.korean_food_sales)),
        radar,
        tiers,
    }
}

/// Mean of the finite values, or 0 when there are none.
fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values
        .filter(|value| value.is_finite())
        .fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::district::sample::sample_table;

    #[test]
    fn selectors_fall_back_to_all() {
        assert_eq!(Selector::archetype(None), Selector::All);
        assert_eq!(Selector::archetype(Some("ALL")), Selector::All);
        assert_eq!(Selector::archetype(Some("nonsense")), Selector::All);
        assert_eq!(
            Selector::archetype(Some("대학가")),
            Selector::Only(Archetype::UniversityArea)
        );
        assert_eq!(Selector::tier(Some("high")), Selector::Only(InvestmentTier::High));
    }

    #[test]
    fn inverted_or_nan_ranges_are_identity() {
        assert!(ScoreRange::new(40.0, 38.0).contains(0.0));
        assert!(ScoreRange::new(f64::NAN, 38.0).contains(99.0));
        assert!(ScoreRange::new(38.0, 40.0).contains(38.0));
        assert!(ScoreRange::new(38.0, 40.0).contains(40.0));
        assert!(!ScoreRange::new(38.0, 40.0).contains(40.01));
    }

    #[test]
    fn empty_outcome_has_neutral_aggregates() {
        let table = sample_table();
        let spec = FilterSpec {
            score_range: ScoreRange::new(90.0, 100.0),
            ..Default::default()
        };
        let outcome = FilterOutcome::evaluate(&table, spec);
        assert!(outcome.is_empty());
        assert_eq!(outcome.summary.count, 0);
        assert_eq!(outcome.summary.mean_composite, 0.0);
        assert_eq!(outcome.summary.mean_night_population, 0.0);
        assert_eq!(outcome.summary.mean_monthly_sales, 0.0);
        assert!(outcome.summary.radar.is_none());
        assert!(outcome.summary.tiers.is_empty());
    }

    #[test]
    fn tier_groups_follow_tier_order() {
        let outcome = FilterOutcome::evaluate(&sample_table(), FilterSpec::default());
        let tiers: Vec<(InvestmentTier, usize)> = outcome
            .summary
            .tiers
            .iter()
            .map(|group| (group.tier, group.count))
            .collect();
        assert_eq!(
            tiers,
            vec![(InvestmentTier::High, 2), (InvestmentTier::Mid, 3)]
        );
        let high = outcome.summary.tiers[0].mean_composite;
        assert!((high - (46.8 + 38.8) / 2.0).abs() < 1e-9);
    }

    #[test]
    fn radar_averages_the_top_five() {
        let outcome = FilterOutcome::evaluate(&sample_table(), FilterSpec::default());
        let radar = outcome.summary.radar.expect("radar");
        assert!((radar.night_traffic - 76.8).abs() < 1e-9);
        assert!((radar.competition - 27.0).abs() < 1e-9);
    }
}
