//! Sub-score normalisation, weighted composite and total-order ranking.

mod config;
mod normalize;

pub use config::{
    DimensionSpec, Normalization, ScoringConfig, ScoringConfigError, ALCOHOL_AFFINITY_WEIGHT,
    COMPETITION_WEIGHT, NIGHT_TRAFFIC_WEIGHT, SALES_DENSITY_WEIGHT, VIBRANCY_WEIGHT,
};

use std::cmp::Ordering;
use tracing::debug;

use super::classify::{classify_archetype, classify_tier};
use super::domain::{DistrictRecord, ScoredDistrict, SubScores};

#[derive(Debug, Clone, Default)]
pub struct ScoringEngine {
    config: ScoringConfig,
}

impl ScoringEngine {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Scores every record against the full candidate set, labels it and
    /// returns the rows in rank order.
    pub fn score(&self, records: Vec<DistrictRecord>) -> Vec<ScoredDistrict> {
        let mut sub_scores = vec![SubScores::default(); records.len()];
        for spec in &self.config.dimensions {
            let raw: Vec<Option<f64>> = records
                .iter()
                .map(|record| spec.dimension.raw_value(&record.metrics))
                .collect();
            let normalized = normalize::normalize(&raw, spec.normalization);
            for (scores, value) in sub_scores.iter_mut().zip(normalized) {
                scores.set(spec.dimension, value);
            }
        }

        let mut rows: Vec<ScoredDistrict> = records
            .into_iter()
            .zip(sub_scores)
            .map(|(record, sub_scores)| ScoredDistrict {
                composite: self.composite(&sub_scores),
                archetype: classify_archetype(&record.district_name),
                tier: classify_tier(record.metrics.korean_food_sales),
                district_id: record.district_id,
                district_name: record.district_name,
                metrics: record.metrics,
                coordinates: record.coordinates,
                sub_scores,
            })
            .collect();

        rank(&mut rows);
        debug!(districts = rows.len(), "scored districts");
        rows
    }

    /// Weighted sum of the configured dimensions.
    pub fn composite(&self, sub_scores: &SubScores) -> f64 {
        self.config
            .dimensions
            .iter()
            .map(|spec| spec.weight * sub_scores.get(spec.dimension))
            .sum()
    }
}

/// Composite descending, then `district_id` ascending.
pub fn rank_order(a: &ScoredDistrict, b: &ScoredDistrict) -> Ordering {
    b.composite
        .total_cmp(&a.composite)
        .then_with(|| a.district_id.cmp(&b.district_id))
}

pub fn rank(rows: &mut [ScoredDistrict]) {
    rows.sort_by(rank_order);
}
