// =============================================================================
// Rolling Mean (SMA) & Rolling Standard Deviation
// =============================================================================
//
// Simple trailing-window statistics over the adjusted close. Entries before
// the window is full are undefined (`None`), never zero-padded.
//
// The standard deviation is the *population* variant (divide by w, not w-1).
// This matches the Bollinger width used elsewhere in the codebase and is
// asserted by the tests below.

/// Compute the trailing `window`-bar simple moving average, aligned to
/// `values`.
///
/// `result[i]` is `Some(mean of values[i-window+1 ..= i])` for
/// `i >= window - 1` and `None` before that. A `window` of zero or longer
/// than the input yields an all-`None` vector.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut result = vec![None; values.len()];
    if window == 0 || values.len() < window {
        return result;
    }

    // Running sum; one add and one subtract per step.
    let mut sum: f64 = values[..window].iter().sum();
    result[window - 1] = Some(sum / window as f64);
    for i in window..values.len() {
        sum += values[i] - values[i - window];
        result[i] = Some(sum / window as f64);
    }
    result
}

/// Compute the trailing `window`-bar population standard deviation, aligned
/// to `values`. Same undefined-prefix rule as [`rolling_mean`].
pub fn rolling_std(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut result = vec![None; values.len()];
    if window == 0 || values.len() < window {
        return result;
    }

    for i in (window - 1)..values.len() {
        let slice = &values[i + 1 - window..=i];
        let mean = slice.iter().sum::<f64>() / window as f64;
        let variance = slice.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / window as f64;
        let std = variance.sqrt();
        if std.is_finite() {
            result[i] = Some(std);
        }
    }
    result
}
