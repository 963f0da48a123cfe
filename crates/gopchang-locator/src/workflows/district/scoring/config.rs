use serde::{Deserialize, Serialize};
use std::path::Path;

use super::super::domain::Dimension;

pub const NIGHT_TRAFFIC_WEIGHT: f64 = 0.30;
pub const SALES_DENSITY_WEIGHT: f64 = 0.25;
pub const COMPETITION_WEIGHT: f64 = 0.15;
pub const VIBRANCY_WEIGHT: f64 = 0.15;
pub const ALCOHOL_AFFINITY_WEIGHT: f64 = 0.15;

/// How raw values are mapped onto the 0–100 scale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Normalization {
    #[default]
    MinMax,
    Percentile,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DimensionSpec {
    pub dimension: Dimension,
    pub weight: f64,
    #[serde(default)]
    pub normalization: Normalization,
}

/// Weights and normalisation per dimension. Dimensions left out contribute
/// nothing to the composite and score 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub dimensions: Vec<DimensionSpec>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        let spec = |dimension, weight| DimensionSpec {
            dimension,
            weight,
            normalization: Normalization::MinMax,
        };
        Self {
            dimensions: vec![
                spec(Dimension::NightTraffic, NIGHT_TRAFFIC_WEIGHT),
                spec(Dimension::SalesDensity, SALES_DENSITY_WEIGHT),
                spec(Dimension::Competition, COMPETITION_WEIGHT),
                spec(Dimension::Vibrancy, VIBRANCY_WEIGHT),
                spec(Dimension::AlcoholAffinity, ALCOHOL_AFFINITY_WEIGHT),
            ],
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ScoringConfigError {
    #[error("failed to read scoring config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid scoring config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("dimension {0:?} is configured more than once")]
    DuplicateDimension(Dimension),
    #[error("weight for {0:?} must be finite and non-negative")]
    InvalidWeight(Dimension),
}

impl ScoringConfig {
    pub fn from_path(path: &Path) -> Result<Self, ScoringConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ScoringConfigError> {
        let mut seen = Vec::with_capacity(self.dimensions.len());
        for spec in &self.dimensions {
            if seen.contains(&spec.dimension) {
                return Err(ScoringConfigError::DuplicateDimension(spec.dimension));
            }
            if !spec.weight.is_finite() || spec.weight < 0.0 {
                return Err(ScoringConfigError::InvalidWeight(spec.dimension));
            }
            seen.push(spec.dimension);
        }
        Ok(())
    }

    pub fn spec(&self, dimension: Dimension) -> Option<&DimensionSpec> {
        self.dimensions
            .iter()
            .find(|spec| spec.dimension == dimension)
    }

    pub fn total_weight(&self) -> f64 {
        self.dimensions.iter().map(|spec| spec.weight).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weights_sum_to_one() {
        let config = ScoringConfig::default();
        assert!((config.total_weight() - 1.0).abs() < 1e-12);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parses_json_with_default_normalization() {
        let raw = r#"{"dimensions":[
            {"dimension":"night_traffic","weight":2.0,"normalization":"percentile"},
            {"dimension":"sales_density","weight":1.0}
        ]}"#;
        let config: ScoringConfig = serde_json::from_str(raw).expect("parses");
        assert_eq!(config.dimensions[1].normalization, Normalization::MinMax);
        assert_eq!(
            config.spec(Dimension::NightTraffic).map(|s| s.normalization),
            Some(Normalization::Percentile)
        );
        assert!(config.spec(Dimension::Vibrancy).is_none());
    }

    #[test]
    fn rejects_duplicate_and_negative_weights() {
        let mut config = ScoringConfig::default();
        config.dimensions.push(config.dimensions[0]);
        assert!(matches!(
            config.validate(),
            Err(ScoringConfigError::DuplicateDimension(Dimension::NightTraffic))
        ));

        let mut config = ScoringConfig::default();
        config.dimensions[2].weight = -1.0;
        assert!(matches!(
            config.validate(),
            Err(ScoringConfigError::InvalidWeight(Dimension::Competition))
        ));
    }
}
