//! Statistical helpers: coefficient of determination, NaN-aware means, and
//! the one-sided paired t-test used by the comparator.
//!
//! The Student-t tail probability is computed through the regularized
//! incomplete beta function (Lanczos log-gamma + Lentz continued fraction),
//! which keeps the crate free of a heavyweight stats dependency while staying
//! accurate to ~1e-10 over the degrees of freedom seen here.

/// Coefficient of determination, `1 - SS_res / SS_tot`.
///
/// Returns NaN when `y_true` has zero variance (R² is undefined there).
pub fn r_squared(y_true: &[f64], y_pred: &[f64]) -> f64 {
    debug_assert_eq!(y_true.len(), y_pred.len());
    if y_true.is_empty() {
        return f64::NAN;
    }

    let mean = y_true.iter().sum::<f64>() / y_true.len() as f64;
    let mut ss_res = 0.0;
    let mut ss_tot = 0.0;
    for (&obs, &pred) in y_true.iter().zip(y_pred.iter()) {
        ss_res += (obs - pred) * (obs - pred);
        ss_tot += (obs - mean) * (obs - mean);
    }

    if ss_tot == 0.0 {
        return f64::NAN;
    }
    1.0 - ss_res / ss_tot
}

/// Arithmetic mean ignoring non-finite entries; NaN when none remain.
pub fn nan_mean(values: &[f64]) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for &v in values {
        if v.is_finite() {
            sum += v;
            count += 1;
        }
    }
    if count == 0 {
        return f64::NAN;
    }
    sum / count as f64
}

/// Round to `dp` decimal places (NaN-preserving).
pub fn round_to(value: f64, dp: u32) -> f64 {
    let scale = 10f64.powi(dp as i32);
    (value * scale).round() / scale
}

/// One-sided paired t-test, alternative: first sample greater.
///
/// Pairs with a non-finite value on either side are excluded. Returns `None`
/// when fewer than two usable pairs remain or the differences have zero
/// variance (the statistic is undefined there, never an error).
pub fn paired_t_greater(sample: &[f64], control: &[f64]) -> Option<f64> {
    debug_assert_eq!(sample.len(), control.len());

    let diffs: Vec<f64> = sample
        .iter()
        .zip(control.iter())
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .map(|(a, b)| a - b)
        .collect();

    let n = diffs.len();
    if n < 2 {
        return None;
    }

    let n_f = n as f64;
    let mean = diffs.iter().sum::<f64>() / n_f;
    let var = diffs.iter().map(|d| (d - mean) * (d - mean)).sum::<f64>() / (n_f - 1.0);
    if !(var.is_finite() && var > 0.0) {
        return None;
    }

    let t = mean / (var / n_f).sqrt();
    Some(t_sf(t, n_f - 1.0))
}

/// Survival function of the Student-t distribution, `P(T > t)`.
pub fn t_sf(t: f64, df: f64) -> f64 {
    if !t.is_finite() {
        return if t > 0.0 { 0.0 } else { 1.0 };
    }
    let x = df / (df + t * t);
    let tail = 0.5 * incomplete_beta(0.5 * df, 0.5, x);
    if t >= 0.0 { tail } else { 1.0 - tail }
}

/// Regularized incomplete beta function `I_x(a, b)`.
fn incomplete_beta(a: f64, b: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }

    let ln_front = ln_gamma(a + b) - ln_gamma(a) - ln_gamma(b) + a * x.ln() + b * (1.0 - x).ln();
    let front = ln_front.exp();

    // The continued fraction converges fastest on one side of the mean;
    // use the symmetry relation on the other.
    if x < (a + 1.0) / (a + b + 2.0) {
        front * beta_cf(a, b, x) / a
    } else {
        1.0 - front * beta_cf(b, a, 1.0 - x) / b
    }
}

/// Lentz continued fraction for the incomplete beta function.
fn beta_cf(a: f64, b: f64, x: f64) -> f64 {
    const MAX_ITER: usize = 200;
    const EPS: f64 = 1e-14;
    const TINY: f64 = 1e-30;

    let mut c = 1.0;
    let mut d = 1.0 - (a + b) * x / (a + 1.0);
    if d.abs() < TINY {
        d = TINY;
    }
    d = 1.0 / d;
    let mut h = d;

    for m in 1..=MAX_ITER {
        let m = m as f64;
        let m2 = 2.0 * m;

        let aa = m * (b - m) * x / ((a + m2 - 1.0) * (a + m2));
        d = 1.0 + aa * d;
        if d.abs() < TINY {
            d = TINY;
        }
        c = 1.0 + aa / c;
        if c.abs() < TINY {
            c = TINY;
        }
        d = 1.0 / d;
        h *= d * c;

        let aa = -(a + m) * (a + b + m) * x / ((a + m2) * (a + m2 + 1.0));
        d = 1.0 + aa * d;
        if d.abs() < TINY {
            d = TINY;
        }
        c = 1.0 + aa / c;
        if c.abs() < TINY {
            c = TINY;
        }
        d = 1.0 / d;
        let del = d * c;
        h *= del;

        if (del - 1.0).abs() < EPS {
            break;
        }
    }

    h
}

/// Log-gamma via the Lanczos approximation.
fn ln_gamma(x: f64) -> f64 {
    const G: usize = 7;
    const C: [f64; 9] = [
        0.999_999_999_999_809_93,
        676.520_368_121_885_1,
        -1_259.139_216_722_402_8,
        771.323_428_777_653_13,
        -176.615_029_162_140_59,
        12.507_343_278_686_905,
        -0.138_571_095_265_720_12,
        9.984_369_578_019_571_6e-6,
        1.505_632_735_149_311_6e-7,
    ];

    if x < 0.5 {
        // Reflection formula.
        std::f64::consts::PI.ln() - (std::f64::consts::PI * x).sin().ln() - ln_gamma(1.0 - x)
    } else {
        let x = x - 1.0;
        let mut a = C[0];
        for (i, &c) in C.iter().enumerate().skip(1) {
            a += c / (x + i as f64);
        }
        let t = x + G as f64 + 0.5;
        0.5 * (2.0 * std::f64::consts::PI).ln() + (t - 0.5) * t.ln() - t + a.ln()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ln_gamma_known_values() {
        assert!(ln_gamma(1.0).abs() < 1e-10);
        assert!((ln_gamma(5.0) - 24.0f64.ln()).abs() < 1e-10);
        assert!((ln_gamma(0.5) - std::f64::consts::PI.sqrt().ln()).abs() < 1e-10);
    }

    #[test]
    fn t_sf_closed_forms() {
        // df=1 is Cauchy: P(T > 1) = 1/4.
        assert!((t_sf(1.0, 1.0) - 0.25).abs() < 1e-9);
        // df=2 has the closed form 1/2 - t / (2 sqrt(2 + t^2)).
        let expected = 0.5 - 1.0 / (2.0 * 3.0f64.sqrt());
        assert!((t_sf(1.0, 2.0) - expected).abs() < 1e-9);
        // Symmetry around zero.
        assert!((t_sf(0.0, 5.0) - 0.5).abs() < 1e-12);
        assert!((t_sf(-1.0, 1.0) - 0.75).abs() < 1e-9);
    }

    #[test]
    fn paired_test_detects_consistent_increase() {
        let control = [1.0, 2.0, 3.0, 4.0, 5.0];
        let sample = [1.5, 2.4, 3.6, 4.5, 5.5];
        let p = paired_t_greater(&sample, &control).unwrap();
        assert!(p < 0.01, "p={p}");

        // Reversed direction: far from significant.
        let p_rev = paired_t_greater(&control, &sample).unwrap();
        assert!(p_rev > 0.95, "p_rev={p_rev}");
    }

    #[test]
    fn paired_test_excludes_nan_pairs() {
        let sample = [2.0, f64::NAN, 4.0, 6.0];
        let control = [1.0, 2.0, 3.2, 5.0];
        // One pair dropped; three remain, so the test still runs.
        assert!(paired_t_greater(&sample, &control).is_some());

        // Only one usable pair: undefined.
        let sparse = [2.0, f64::NAN, f64::NAN, f64::NAN];
        assert!(paired_t_greater(&sparse, &control).is_none());
    }

    #[test]
    fn paired_test_undefined_on_zero_variance() {
        let sample = [2.0, 3.0, 4.0];
        let control = [1.0, 2.0, 3.0];
        assert!(paired_t_greater(&sample, &control).is_none());
    }

    #[test]
    fn r_squared_basics() {
        let y = [1.0, 2.0, 3.0];
        assert!((r_squared(&y, &y) - 1.0).abs() < 1e-12);
        let mean_pred = [2.0, 2.0, 2.0];
        assert!(r_squared(&y, &mean_pred).abs() < 1e-12);
        assert!(r_squared(&[5.0, 5.0], &[5.0, 5.0]).is_nan());
    }

    #[test]
    fn nan_mean_ignores_undefined_entries() {
        assert!((nan_mean(&[1.0, f64::NAN, 3.0]) - 2.0).abs() < 1e-12);
        assert!(nan_mean(&[f64::NAN, f64::NAN]).is_nan());
    }

    #[test]
    fn round_to_places() {
        assert_eq!(round_to(1.23456, 3), 1.235);
        assert_eq!(round_to(-0.0005, 3), -0.001);
        assert!(round_to(f64::NAN, 3).is_nan());
    }
}
