//! Growth-call derivation from per-metric comparisons.

use crate::analysis::compare::MetricComparison;
use crate::domain::GrowthCall;

/// Derive the 3-character growth call (FinalOD, AUC, SGR in fixed order).
///
/// A metric is positive iff its mean fold-change reaches `fc_cutoff` AND its
/// p-value is below `pvalue_cutoff`. Comparisons against undefined values
/// (NaN fold-change, missing p-value) are false, never an error.
pub fn growth_call(
    final_od: &MetricComparison,
    auc: &MetricComparison,
    sgr: &MetricComparison,
    fc_cutoff: f64,
    pvalue_cutoff: f64,
) -> GrowthCall {
    GrowthCall {
        final_od: metric_positive(final_od, fc_cutoff, pvalue_cutoff),
        auc: metric_positive(auc, fc_cutoff, pvalue_cutoff),
        sgr: metric_positive(sgr, fc_cutoff, pvalue_cutoff),
    }
}

fn metric_positive(c: &MetricComparison, fc_cutoff: f64, pvalue_cutoff: f64) -> bool {
    match c.p_value {
        // NaN fold-change fails the >= comparison, as required.
        Some(p) => c.mean_fold_change >= fc_cutoff && p < pvalue_cutoff,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comparison(fc: f64, p: Option<f64>) -> MetricComparison {
        MetricComparison {
            values: vec![],
            mean: f64::NAN,
            mean_fold_change: fc,
            p_value: p,
        }
    }

    #[test]
    fn call_matches_cutoff_logic_exhaustively() {
        let cases = [
            (1.5, Some(0.01), true),   // both pass
            (1.5, Some(0.5), false),   // p too large
            (1.0, Some(0.01), false),  // fc too small
            (1.2, Some(0.05), false),  // p not strictly below cutoff
            (1.2, Some(0.049), true),  // fc inclusive, p exclusive
            (f64::NAN, Some(0.01), false),
            (1.5, None, false),
        ];
        for (fc, p, expected) in cases {
            let c = comparison(fc, p);
            assert_eq!(
                metric_positive(&c, 1.2, 0.05),
                expected,
                "fc={fc}, p={p:?}"
            );
        }
    }

    #[test]
    fn call_orders_metrics_final_od_auc_sgr() {
        let pos = comparison(2.0, Some(0.001));
        let neg = comparison(1.0, Some(0.9));
        let call = growth_call(&pos, &neg, &pos, 1.2, 0.05);
        assert_eq!(call.to_string(), "+-+");
    }
}
