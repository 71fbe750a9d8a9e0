//! Composite Simpson integration over irregularly spaced samples.

/// Integrate `y` over `x` using composite Simpson's rule.
///
/// `x` must be strictly increasing. Handles non-uniform spacing; an odd
/// number of intervals is finished with the standard quadratic correction
/// for the trailing interval. Fewer than three points degrade gracefully
/// (trapezoid for two, zero otherwise).
pub fn simpson(x: &[f64], y: &[f64]) -> f64 {
    debug_assert_eq!(x.len(), y.len());
    let n = x.len();
    if n < 2 {
        return 0.0;
    }
    if n == 2 {
        return 0.5 * (x[1] - x[0]) * (y[0] + y[1]);
    }

    let intervals = n - 1;
    let mut total = 0.0;

    // Each pair of adjacent intervals is integrated by the quadratic through
    // its three points.
    for k in 0..intervals / 2 {
        let i = 2 * k;
        let h0 = x[i + 1] - x[i];
        let h1 = x[i + 2] - x[i + 1];
        let hsum = h0 + h1;
        total += hsum / 6.0
            * ((2.0 - h1 / h0) * y[i] + hsum * hsum / (h0 * h1) * y[i + 1]
                + (2.0 - h0 / h1) * y[i + 2]);
    }

    if intervals % 2 == 1 {
        // Trailing interval: fit a quadratic through the last three points and
        // integrate it over the final interval only.
        let h0 = x[n - 2] - x[n - 3];
        let h1 = x[n - 1] - x[n - 2];
        let alpha = (2.0 * h1 * h1 + 3.0 * h0 * h1) / (6.0 * (h0 + h1));
        let beta = (h1 * h1 + 3.0 * h0 * h1) / (6.0 * h0);
        let eta = h1 * h1 * h1 / (6.0 * h0 * (h0 + h1));
        total += alpha * y[n - 1] + beta * y[n - 2] - eta * y[n - 3];
    }

    total
}
