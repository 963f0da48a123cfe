use super::config::Normalization;

pub(crate) const SCORE_MIN: f64 = 0.0;
pub(crate) const SCORE_MAX: f64 = 100.0;
/// Score given to every district when the candidate set has no spread.
pub(crate) const ZERO_VARIANCE_SCORE: f64 = 50.0;

/// Maps raw values onto [0, 100]. Monotonic in the raw value; missing or
/// non-finite entries score 0.
pub(crate) fn normalize(values: &[Option<f64>], method: Normalization) -> Vec<f64> {
    let present: Vec<f64> = values
        .iter()
        .filter_map(|value| value.filter(|raw| raw.is_finite()))
        .collect();

    if present.is_empty() {
        return vec![SCORE_MIN; values.len()];
    }

    values
        .iter()
        .map(|value| match value.filter(|raw| raw.is_finite()) {
            None => SCORE_MIN,
            Some(raw) => match method {
                Normalization::MinMax => min_max(raw, &present),
                Normalization::Percentile => percentile(raw, &present),
            },
        })
        .map(|score| {
            if score.is_finite() {
                score.clamp(SCORE_MIN, SCORE_MAX)
            } else {
                SCORE_MIN
            }
        })
        .collect()
}

fn min_max(raw: f64, present: &[f64]) -> f64 {
    let min = present.iter().copied().fold(f64::INFINITY, f64::min);
    let max = present.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    // Halved so `max - min` cannot overflow for values near f64::MAX.
    let span = max / 2.0 - min / 2.0;
    if span <= 0.0 {
        return ZERO_VARIANCE_SCORE;
    }
    (raw / 2.0 - min / 2.0) / span * SCORE_MAX
}

/// Share of other candidates strictly below `raw`, with ties counted half.
fn percentile(raw: f64, present: &[f64]) -> f64 {
    if present.len() < 2 || present.iter().all(|value| *value == present[0]) {
        return ZERO_VARIANCE_SCORE;
    }
    let below = present.iter().filter(|value| **value < raw).count() as f64;
    let ties = present.iter().filter(|value| **value == raw).count() as f64 - 1.0;
    (below + ties / 2.0) / (present.len() as f64 - 1.0) * SCORE_MAX
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn min_max_spans_the_full_scale() {
        let scores = normalize(&[Some(10.0), Some(20.0), Some(30.0)], Normalization::MinMax);
        assert_eq!(scores, vec![0.0, 50.0, 100.0]);
    }

    #[test]
    fn extreme_magnitudes_stay_on_the_scale() {
        let scores = normalize(
            &[Some(-1e308), Some(0.0), Some(f64::MAX)],
            Normalization::MinMax,
        );
        assert!(scores.iter().all(|score| score.is_finite()));
        assert!(scores.iter().all(|score| (SCORE_MIN..=SCORE_MAX).contains(score)));
        assert_eq!(scores[0], SCORE_MIN);
        assert_eq!(scores[2], SCORE_MAX);
        assert!(scores[0] < scores[1] && scores[1] < scores[2]);
    }

    #[test]
    fn zero_variance_maps_to_midpoint() {
        for method in [Normalization::MinMax, Normalization::Percentile] {
            let scores = normalize(&[Some(7.0), Some(7.0), None], method);
            assert_eq!(scores, vec![50.0, 50.0, 0.0]);
        }
    }

    #[test]
    fn missing_everywhere_scores_zero() {
        let scores = normalize(&[None, Some(f64::NAN)], Normalization::MinMax);
        assert_eq!(scores, vec![0.0, 0.0]);
    }

    #[test]
    fn percentile_counts_ties_half() {
        let scores = normalize(
            &[Some(1.0), Some(2.0), Some(2.0), Some(3.0), Some(4.0)],
            Normalization::Percentile,
        );
        assert_eq!(scores, vec![0.0, 37.5, 37.5, 75.0, 100.0]);
    }
}
