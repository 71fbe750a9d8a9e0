//! Single-attempt growth model calibration.
//!
//! Given:
//! - times `x_i` (hours, ascending)
//! - log-relative growth `y_i = ln(od_i / od_0)`
//! - a model kind
//!
//! we draw one random initial guess and run the box-constrained
//! Levenberg-Marquardt solver with the parameter bounds:
//!
//! ```text
//! A   ∈ [0, ∞)
//! lag ∈ [0, max(x)]
//! mu  ∈ [0, 10]
//! ```
//!
//! Any failure (non-convergence, non-finite data, degenerate series) yields
//! `FitOutcome::failed()`; the retry policy upstream decides what to do next.

use nalgebra::DVector;
use rand::Rng;

use crate::domain::{FitOutcome, GrowthModelKind, GrowthParams};
use crate::math::{minimize, r_squared, LmOptions};
use crate::models::predict;

/// Solver iteration budget per attempt.
pub const MAX_SOLVER_ITERS: usize = 10_000;

/// Upper bound on the specific growth rate parameter.
pub const MU_UPPER_BOUND: f64 = 10.0;

/// Fit growth model parameters to one replicate's series.
///
/// The initial guess is three independent uniform draws from `[0, 1)`,
/// consumed from `rng` in (A, lag, mu) order.
pub fn fit_growth_curve(
    xdata: &[f64],
    ydata: &[f64],
    model: GrowthModelKind,
    rng: &mut impl Rng,
) -> FitOutcome {
    // Draw the guess unconditionally so the random stream advances the same
    // way regardless of data quality.
    let guess = [rng.r#gen::<f64>(), rng.r#gen::<f64>(), rng.r#gen::<f64>()];

    if xdata.len() != ydata.len() || xdata.len() < 3 {
        return FitOutcome::failed();
    }
    let Some(&t_max) = xdata.last() else {
        return FitOutcome::failed();
    };
    if ydata.iter().any(|y| !y.is_finite()) {
        return FitOutcome::failed();
    }

    let lower = [0.0, 0.0, 0.0];
    let upper = [f64::INFINITY, t_max, MU_UPPER_BOUND];

    let residuals = |p: &[f64]| -> Option<DVector<f64>> {
        let params = GrowthParams {
            a: p[0],
            lag: p[1],
            mu: p[2],
        };
        let mut r = DVector::zeros(xdata.len());
        for (i, (&x, &y)) in xdata.iter().zip(ydata.iter()).enumerate() {
            let pred = predict(model, x, &params);
            if !pred.is_finite() {
                return None;
            }
            r[i] = y - pred;
        }
        Some(r)
    };

    let opts = LmOptions {
        max_iters: MAX_SOLVER_ITERS,
        ..LmOptions::default()
    };

    let Some(p) = minimize(residuals, &guess, &lower, &upper, &opts) else {
        return FitOutcome::failed();
    };

    let params = GrowthParams {
        a: p[0],
        lag: p[1],
        mu: p[2],
    };
    let predicted: Vec<f64> = xdata.iter().map(|&x| predict(model, x, &params)).collect();
    let r2 = r_squared(ydata, &predicted);
    if !r2.is_finite() {
        return FitOutcome::failed();
    }

    FitOutcome {
        converged: true,
        params,
        r2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn synthetic_series(model: GrowthModelKind) -> (Vec<f64>, Vec<f64>) {
        let truth = GrowthParams {
            a: 2.5,
            lag: 4.0,
            mu: 0.8,
        };
        let xs: Vec<f64> = (0..=24).map(|h| h as f64).collect();
        let ys: Vec<f64> = xs.iter().map(|&x| predict(model, x, &truth)).collect();
        (xs, ys)
    }

    #[test]
    fn fit_recovers_noise_free_logistic_eventually() {
        let (xs, ys) = synthetic_series(GrowthModelKind::Logistic);
        let mut rng = StdRng::seed_from_u64(7);

        // A single random start may land in a poor basin; a handful of
        // attempts must find an excellent fit on noise-free data.
        let best = (0..20)
            .map(|_| fit_growth_curve(&xs, &ys, GrowthModelKind::Logistic, &mut rng))
            .filter(|f| f.converged)
            .map(|f| f.r2)
            .fold(f64::NEG_INFINITY, f64::max);
        assert!(best >= 0.999, "best r2 = {best}");
    }

    #[test]
    fn fit_respects_bounds() {
        let (xs, ys) = synthetic_series(GrowthModelKind::Gompertz);
        let mut rng = StdRng::seed_from_u64(3);
        let fit = fit_growth_curve(&xs, &ys, GrowthModelKind::Gompertz, &mut rng);
        if fit.converged {
            assert!(fit.params.a >= 0.0);
            assert!(fit.params.lag >= 0.0 && fit.params.lag <= 24.0);
            assert!(fit.params.mu >= 0.0 && fit.params.mu <= MU_UPPER_BOUND);
        }
    }

    #[test]
    fn fit_fails_cleanly_on_nan_data() {
        let xs = [0.0, 1.0, 2.0, 3.0];
        let ys = [0.0, f64::NAN, 0.5, 0.6];
        let mut rng = StdRng::seed_from_u64(1);
        let fit = fit_growth_curve(&xs, &ys, GrowthModelKind::Logistic, &mut rng);
        assert!(!fit.converged);
        assert!(fit.params.mu.is_nan());
        assert!(fit.r2.is_nan());
    }

    #[test]
    fn fit_fails_cleanly_on_short_series() {
        let mut rng = StdRng::seed_from_u64(1);
        let fit = fit_growth_curve(&[0.0, 1.0], &[0.0, 0.1], GrowthModelKind::Logistic, &mut rng);
        assert!(!fit.converged);
    }
}
