// =============================================================================
// Daily Returns & Drawdown
// =============================================================================
//
// Daily return:  r[i] = close[i] / close[i-1] - 1
// The first entry has no prior close and is undefined.
//
// Drawdown tracks how far the cumulative return has fallen from its running
// peak:
//   c[i] = Π_{j<=i} (1 + r[j])          (cumulative growth factor)
//   d[i] = c[i] / max(c[1..=i]) - 1     (always <= 0, 0 at a new peak)

/// Compute the daily fractional return series, aligned to `closes`.
///
/// `result[0]` is always `None`; for `i >= 1`,
/// `result[i] = Some(closes[i] / closes[i-1] - 1)`. A zero prior close would
/// divide by zero, so that entry is also `None`.
pub fn daily_returns(closes: &[f64]) -> Vec<Option<f64>> {
    let mut result = vec![None; closes.len()];
    for i in 1..closes.len() {
        let prev = closes[i - 1];
        if prev != 0.0 {
            let r = closes[i] / prev - 1.0;
            if r.is_finite() {
                result[i] = Some(r);
            }
        }
    }
    result
}

/// Compute the drawdown series from closes, aligned to `closes`.
///
/// Undefined at index 0 (no return yet). From index 1 on, the value is the
/// fractional distance below the running peak of the cumulative return —
/// zero whenever the series sets a new high, negative otherwise.
pub fn drawdown(closes: &[f64]) -> Vec<Option<f64>> {
    let returns = daily_returns(closes);
    let mut result = vec![None; closes.len()];

    let mut cumulative = 1.0_f64;
    let mut peak = f64::MIN;
    for (i, r) in returns.iter().enumerate() {
        let Some(r) = r else { continue };
        cumulative *= 1.0 + r;
        peak = peak.max(cumulative);
        if peak != 0.0 {
            let d = cumulative / peak - 1.0;
            if d.is_finite() {
                result[i] = Some(d);
            }
        }
    }
    result
}
