//! Sample quantiles of sorted data.

use crate::config::Interpolation;

/// Returns the `p`-th percentile (0 < p < 100) of ascending `sorted` data.
///
/// Returns `None` for an empty slice.
///
/// # Example
///
/// ```
/// use boreas_percentile::{Interpolation, percentile_of_sorted};
///
/// let data = [1.0, 2.0, 3.0, 4.0];
/// assert_eq!(percentile_of_sorted(&data, 50.0, Interpolation::Linear), Some(2.5));
/// ```
pub fn percentile_of_sorted(sorted: &[f64], p: f64, method: Interpolation) -> Option<f64> {
    let n = sorted.len();
    let (&first, &last) = (sorted.first()?, sorted.last()?);
    if n == 1 {
        return Some(first);
    }
    let q = p / 100.0;
    // 1-based fractional rank.
    let h = match method {
        Interpolation::Linear => (n - 1) as f64 * q + 1.0,
        Interpolation::HyndmanFan => (n as f64 + 1.0 / 3.0) * q + 1.0 / 3.0,
    };
    if h <= 1.0 {
        return Some(first);
    }
    if h >= n as f64 {
        return Some(last);
    }
    let lo = h.floor() as usize;
    let frac = h - lo as f64;
    let a = sorted[lo - 1];
    let b = sorted[lo];
    Some(a + frac * (b - a))
}

/// Sorts `values` in place and returns their percentile.
pub(crate) fn percentile_of(values: &mut [f64], p: f64, method: Interpolation) -> Option<f64> {
    values.sort_unstable_by(f64::total_cmp);
    percentile_of_sorted(values, p, method)
}
