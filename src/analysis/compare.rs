//! Comparison of a well's metric vector against the negative-control
//! baseline.
//!
//! Pairing is by replicate ID, not by position: a replicate present on only
//! one side contributes nothing to the fold-change or the test. Undefined
//! entries (NaN, e.g. an unresolved SGR) are excluded from the test input
//! rather than treated as zero.

use crate::math::{nan_mean, paired_t_greater, round_to};

/// One metric's comparison result for a single well.
#[derive(Debug, Clone)]
pub struct MetricComparison {
    /// Per-replicate metric values (aligned with the well's replicate list).
    pub values: Vec<f64>,
    /// Mean of the defined per-replicate values.
    pub mean: f64,
    /// Mean fold-change vs the control (NaN when no pair is defined).
    pub mean_fold_change: f64,
    /// One-sided paired t-test p-value; `None` for the control well or when
    /// the test cannot be computed.
    pub p_value: Option<f64>,
}

/// Baseline comparison for the negative-control well itself: fold-change of
/// 1.0 by definition, no p-value.
pub fn control_baseline(values: &[f64]) -> MetricComparison {
    MetricComparison {
        values: values.to_vec(),
        mean: nan_mean(values),
        mean_fold_change: 1.0,
        p_value: None,
    }
}

/// Compare a treatment well's metric vector against the control's.
pub fn against_control(
    values: &[f64],
    replicates: &[String],
    control_values: &[f64],
    control_replicates: &[String],
) -> MetricComparison {
    debug_assert_eq!(values.len(), replicates.len());
    debug_assert_eq!(control_values.len(), control_replicates.len());

    let mut sample = Vec::with_capacity(values.len());
    let mut control = Vec::with_capacity(values.len());
    for (i, rep) in replicates.iter().enumerate() {
        if let Some(j) = control_replicates.iter().position(|r| r == rep) {
            sample.push(values[i]);
            control.push(control_values[j]);
        }
    }

    let folds: Vec<f64> = sample
        .iter()
        .zip(control.iter())
        .map(|(&v, &c)| v / c)
        .collect();

    MetricComparison {
        values: values.to_vec(),
        mean: nan_mean(values),
        mean_fold_change: nan_mean(&folds),
        p_value: paired_t_greater(&sample, &control).map(|p| round_to(p, 6)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reps(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn fold_change_is_elementwise_by_replicate() {
        let c = against_control(
            &[2.0, 4.0, 6.0],
            &reps(&["r1", "r2", "r3"]),
            &[1.0, 2.0, 2.0],
            &reps(&["r1", "r2", "r3"]),
        );
        assert!((c.mean_fold_change - (2.0 + 2.0 + 3.0) / 3.0).abs() < 1e-12);
        assert!(c.p_value.is_some());
    }

    #[test]
    fn pairing_follows_replicate_identity_not_position() {
        // Control vector is in a different replicate order; pairing must
        // match r2 with r2 regardless.
        let c = against_control(
            &[2.0, 4.0],
            &reps(&["r1", "r2"]),
            &[2.0, 1.0],
            &reps(&["r2", "r1"]),
        );
        // r1: 2/1, r2: 4/2 -> both 2.0.
        assert!((c.mean_fold_change - 2.0).abs() < 1e-12);
    }

    #[test]
    fn undefined_entries_are_excluded_from_the_test() {
        let c = against_control(
            &[2.0, f64::NAN, 6.0],
            &reps(&["r1", "r2", "r3"]),
            &[1.0, 2.0, 2.0],
            &reps(&["r1", "r2", "r3"]),
        );
        // Two usable pairs remain: test is defined.
        assert!(c.p_value.is_some());
        // NaN fold-change entry is ignored by the mean.
        assert!((c.mean_fold_change - 2.5).abs() < 1e-12);
    }

    #[test]
    fn too_few_pairs_yield_undefined_p_value() {
        let c = against_control(
            &[2.0, f64::NAN],
            &reps(&["r1", "r2"]),
            &[1.0, 2.0],
            &reps(&["r1", "r2"]),
        );
        assert!(c.p_value.is_none());
        // Fold change still computed from the single defined pair.
        assert!((c.mean_fold_change - 2.0).abs() < 1e-12);
    }

    #[test]
    fn control_baseline_has_unit_fold_change_and_no_p_value() {
        let c = control_baseline(&[0.5, 0.6, 0.7]);
        assert_eq!(c.mean_fold_change, 1.0);
        assert!(c.p_value.is_none());
        assert!((c.mean - 0.6).abs() < 1e-12);
    }
}
