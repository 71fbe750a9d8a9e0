//! Closed-form sigmoid growth models.
//!
//! Both functions describe cumulative growth on the **log-relative** scale:
//! the observed series handed to the fitter is `ln(od / od[0])`, not raw OD.
//!
//! They are pure and must tolerate any finite real inputs (including
//! `t < lag`); callers guarantee `od[0] != 0` before taking the log-ratio.

use crate::domain::{GrowthModelKind, GrowthParams};

/// Predict log-relative growth at time `t` for the given model kind.
pub fn predict(model: GrowthModelKind, t: f64, p: &GrowthParams) -> f64 {
    match model {
        // A / (1 + exp(4*mu/A*(lag - t) + 2))
        GrowthModelKind::Logistic => p.a / (1.0 + (4.0 * p.mu / p.a * (p.lag - t) + 2.0).exp()),
        // A * exp(-exp(mu*e/A*(lag - t) + 1))
        GrowthModelKind::Gompertz => {
            p.a * (-(p.mu * std::f64::consts::E / p.a * (p.lag - t) + 1.0).exp()).exp()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARAMS: GrowthParams = GrowthParams {
        a: 2.0,
        lag: 3.0,
        mu: 0.5,
    };

    #[test]
    fn logistic_approaches_asymptote() {
        let early = predict(GrowthModelKind::Logistic, 0.0, &PARAMS);
        let late = predict(GrowthModelKind::Logistic, 100.0, &PARAMS);
        assert!(early < 0.5);
        assert!((late - PARAMS.a).abs() < 1e-9);
    }

    #[test]
    fn gompertz_approaches_asymptote() {
        let early = predict(GrowthModelKind::Gompertz, 0.0, &PARAMS);
        let late = predict(GrowthModelKind::Gompertz, 100.0, &PARAMS);
        assert!(early < 0.5);
        assert!((late - PARAMS.a).abs() < 1e-9);
    }

    #[test]
    fn models_are_monotone_increasing_in_time() {
        for model in [GrowthModelKind::Logistic, GrowthModelKind::Gompertz] {
            let mut prev = f64::NEG_INFINITY;
            for i in 0..100 {
                let t = i as f64 * 0.5;
                let y = predict(model, t, &PARAMS);
                assert!(y.is_finite());
                assert!(y >= prev, "{model:?} decreased at t={t}");
                prev = y;
            }
        }
    }

    #[test]
    fn tolerates_negative_time_minus_lag() {
        // t - lag can be strongly negative; predictions stay finite.
        for model in [GrowthModelKind::Logistic, GrowthModelKind::Gompertz] {
            let y = predict(model, -50.0, &PARAMS);
            assert!(y.is_finite());
            assert!(y >= 0.0);
        }
    }
}
