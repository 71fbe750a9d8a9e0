//! Box-constrained Levenberg-Marquardt minimizer.
//!
//! In this project we repeatedly solve small nonlinear least-squares problems
//! of the form:
//!
//! ```text
//! minimize Σ r_i(p)²   subject to   lower ≤ p ≤ upper
//! ```
//!
//! with only three parameters, so a dense implementation on top of nalgebra
//! is plenty. The Jacobian is estimated by forward differences (with a
//! backward fallback near the upper bound) and each candidate step is clamped
//! onto the box before evaluation.
//!
//! The residual closure returns `None` when the model cannot be evaluated at
//! a point (non-finite prediction); the solver treats that as a rejected step
//! or, at the starting point, as an unrecoverable failure.

use nalgebra::{DMatrix, DVector};

/// Solver options.
#[derive(Debug, Clone)]
pub struct LmOptions {
    /// Iteration budget before declaring non-convergence.
    pub max_iters: usize,
    /// Relative SSE-reduction threshold for convergence.
    pub ftol: f64,
    /// Gradient infinity-norm threshold for convergence.
    pub gtol: f64,
}

impl Default for LmOptions {
    fn default() -> Self {
        Self {
            max_iters: 10_000,
            ftol: 1e-12,
            gtol: 1e-12,
        }
    }
}

/// Minimize the sum of squared residuals over a parameter box.
///
/// Returns the parameter vector at convergence, or `None` when the problem
/// cannot be evaluated at the starting point or the iteration budget is
/// exhausted without convergence.
pub fn minimize<R>(
    residuals: R,
    p0: &[f64],
    lower: &[f64],
    upper: &[f64],
    opts: &LmOptions,
) -> Option<Vec<f64>>
where
    R: Fn(&[f64]) -> Option<DVector<f64>>,
{
    let n = p0.len();
    debug_assert_eq!(lower.len(), n);
    debug_assert_eq!(upper.len(), n);

    let mut p = clamp(p0, lower, upper);
    let mut r = residuals(&p)?;
    let mut sse = r.norm_squared();
    if !sse.is_finite() {
        return None;
    }

    let mut lambda = 1e-3;

    for _ in 0..opts.max_iters {
        let j = jacobian(&residuals, &p, &r, lower, upper)?;
        let jt = j.transpose();
        let a = &jt * &j;
        let g = &jt * &r;

        if g.amax() < opts.gtol {
            return Some(p);
        }

        // Escalate damping until a step improves the objective.
        let mut improved = false;
        for _ in 0..64 {
            let mut a_damped = a.clone();
            for i in 0..n {
                a_damped[(i, i)] += lambda * a[(i, i)].max(1e-12);
            }

            let Some(delta) = solve_spd(&a_damped, &g) else {
                lambda *= 10.0;
                continue;
            };

            let mut cand: Vec<f64> = p.iter().zip(delta.iter()).map(|(pi, di)| pi + di).collect();
            cand = clamp(&cand, lower, upper);

            let Some(rc) = residuals(&cand) else {
                lambda *= 10.0;
                continue;
            };
            let sse_c = rc.norm_squared();

            if sse_c.is_finite() && sse_c < sse {
                let rel = (sse - sse_c) / sse.max(f64::MIN_POSITIVE);
                p = cand;
                r = rc;
                sse = sse_c;
                lambda = (lambda * 0.1).max(1e-12);
                improved = true;
                if rel < opts.ftol {
                    return Some(p);
                }
                break;
            }

            lambda *= 10.0;
            if lambda > 1e14 {
                // No descent direction left: we are at a (possibly boundary)
                // local minimum.
                return Some(p);
            }
        }

        if !improved {
            return Some(p);
        }
    }

    None
}

fn clamp(p: &[f64], lower: &[f64], upper: &[f64]) -> Vec<f64> {
    p.iter()
        .zip(lower.iter().zip(upper.iter()))
        .map(|(&v, (&lo, &hi))| v.max(lo).min(hi))
        .collect()
}

/// Forward-difference Jacobian of the residual vector.
///
/// Steps that would cross the upper bound flip to backward differences so the
/// residuals are only ever evaluated on the feasible side of the box.
fn jacobian<R>(
    residuals: &R,
    p: &[f64],
    r0: &DVector<f64>,
    lower: &[f64],
    upper: &[f64],
) -> Option<DMatrix<f64>>
where
    R: Fn(&[f64]) -> Option<DVector<f64>>,
{
    let m = r0.len();
    let n = p.len();
    let mut j = DMatrix::<f64>::zeros(m, n);

    for i in 0..n {
        let mut h = 1.49e-8 * p[i].abs().max(1e-3);
        if p[i] + h > upper[i] && p[i] - h >= lower[i] {
            h = -h;
        }

        let mut ph = p.to_vec();
        ph[i] += h;
        let rh = residuals(&ph)?;

        for k in 0..m {
            j[(k, i)] = (rh[k] - r0[k]) / h;
        }
    }

    Some(j)
}

/// Solve the damped normal equations `A x = -g`.
fn solve_spd(a: &DMatrix<f64>, g: &DVector<f64>) -> Option<DVector<f64>> {
    // Cholesky is the cheap path for these tiny SPD systems; fall back to SVD
    // with a relaxed tolerance when damping has not cured ill-conditioning.
    if let Some(chol) = a.clone().cholesky() {
        let x = chol.solve(&(-g));
        if x.iter().all(|v| v.is_finite()) {
            return Some(x);
        }
    }

    let svd = a.clone().svd(true, true);
    for &tol in &[1e-12, 1e-9, 1e-6] {
        if let Ok(x) = svd.solve(&(-g), tol) {
            if x.iter().all(|v| v.is_finite()) {
                return Some(x);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_exponential_decay_parameters() {
        // y = a * exp(-b x) with a=2, b=0.5.
        let xs: Vec<f64> = (0..20).map(|i| i as f64 * 0.25).collect();
        let ys: Vec<f64> = xs.iter().map(|&x| 2.0 * (-0.5 * x).exp()).collect();

        let residuals = |p: &[f64]| -> Option<DVector<f64>> {
            let mut r = DVector::zeros(xs.len());
            for (i, (&x, &y)) in xs.iter().zip(ys.iter()).enumerate() {
                let pred = p[0] * (-p[1] * x).exp();
                if !pred.is_finite() {
                    return None;
                }
                r[i] = y - pred;
            }
            Some(r)
        };

        let p = minimize(
            residuals,
            &[1.0, 1.0],
            &[0.0, 0.0],
            &[f64::INFINITY, 10.0],
            &LmOptions::default(),
        )
        .unwrap();

        assert!((p[0] - 2.0).abs() < 1e-6, "a={}", p[0]);
        assert!((p[1] - 0.5).abs() < 1e-6, "b={}", p[1]);
    }

    #[test]
    fn respects_parameter_bounds() {
        // Unconstrained optimum is a=-1; the box forces a >= 0.
        let residuals = |p: &[f64]| -> Option<DVector<f64>> {
            Some(DVector::from_row_slice(&[p[0] + 1.0]))
        };

        let p = minimize(residuals, &[0.5], &[0.0], &[10.0], &LmOptions::default()).unwrap();
        assert!(p[0] >= 0.0);
        assert!(p[0] < 1e-6, "expected boundary minimum, got {}", p[0]);
    }

    #[test]
    fn fails_cleanly_on_unevaluable_start() {
        let residuals = |_: &[f64]| -> Option<DVector<f64>> { None };
        assert!(minimize(residuals, &[0.5], &[0.0], &[1.0], &LmOptions::default()).is_none());
    }
}
