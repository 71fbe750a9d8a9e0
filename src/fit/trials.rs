//! Retry-until-threshold fitting policy.
//!
//! Each replicate gets up to `max_trials` attempts with fresh random initial
//! guesses. The loop is a fold over attempts with an explicit best-so-far
//! accumulator; it terminates early once the R² threshold is reached. The
//! parameters tracked are those of the **best-R² attempt**, not merely the
//! last one that converged.

use rand::Rng;

use crate::domain::{GrowthModelKind, GrowthParams};
use crate::fit::fitter::fit_growth_curve;

/// Best fit seen across attempts.
#[derive(Debug, Clone, Copy)]
pub struct BestFit {
    /// Highest R² achieved so far (floored at 0.0, the starting value).
    pub r2: f64,
    /// Parameters of the attempt that achieved `r2`, when any converged.
    pub params: Option<GrowthParams>,
}

impl BestFit {
    fn new() -> Self {
        Self {
            r2: 0.0,
            params: None,
        }
    }

    fn absorb(self, r2: f64, params: GrowthParams) -> Self {
        if r2 > self.r2 {
            Self {
                r2,
                params: Some(params),
            }
        } else {
            self
        }
    }
}

/// Result of the full retry loop for one replicate.
#[derive(Debug, Clone, Copy)]
pub struct TrialResult {
    /// Specific growth rate (`mu`) of the best fit, or NaN when the trial
    /// budget ran out before reaching the threshold.
    pub sgr: f64,
    /// Best R² achieved, recorded even when below threshold.
    pub best_r2: f64,
    /// Number of attempts consumed.
    pub trials: usize,
}

/// Run the randomized retry loop for one replicate's series.
pub fn fit_with_retries(
    xdata: &[f64],
    ydata: &[f64],
    model: GrowthModelKind,
    min_r2: f64,
    max_trials: usize,
    rng: &mut impl Rng,
) -> TrialResult {
    let mut best = BestFit::new();
    let mut trials = 0usize;

    while best.r2 < min_r2 && trials < max_trials {
        let attempt = fit_growth_curve(xdata, ydata, model, rng);
        if attempt.converged {
            best = best.absorb(attempt.r2, attempt.params);
        }
        trials += 1;
    }

    let sgr = match best.params {
        Some(p) if best.r2 >= min_r2 => p.mu,
        _ => f64::NAN,
    };

    TrialResult {
        sgr,
        best_r2: best.r2,
        trials,
    }
}
