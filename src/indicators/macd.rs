// =============================================================================
// MACD — Moving Average Convergence / Divergence
// =============================================================================
//
// macd      = EMA_fast(values) - EMA_slow(values)
// signal    = EMA_signal(macd line)
// histogram = macd - signal
//
// All EMAs are SMA-seeded (see ema.rs), so with the default 12/26/9 setup the
// macd line is defined from index 25 and signal/histogram from index 33.

use super::ema;

/// Full-series MACD output, each sequence aligned to the input.
#[derive(Debug, Clone, PartialEq)]
pub struct MacdSeries {
    pub macd: Vec<Option<f64>>,
    pub signal: Vec<Option<f64>>,
    pub histogram: Vec<Option<f64>>,
}

/// Compute MACD line, signal line and histogram over `values`.
///
/// The macd line is defined where both the fast and slow EMA are defined;
/// the signal line is an EMA over the *defined* portion of the macd line,
/// re-aligned to the input; the histogram is defined where both are.
pub fn macd(values: &[f64], fast: usize, slow: usize, signal_period: usize) -> MacdSeries {
    let n = values.len();
    let fast_ema = ema::ema(values, fast);
    let slow_ema = ema::ema(values, slow);

    let mut macd_line = vec![None; n];
    for i in 0..n {
        if let (Some(f), Some(s)) = (fast_ema[i], slow_ema[i]) {
            macd_line[i] = Some(f - s);
        }
    }

    // Signal: EMA over the defined macd values, shifted back into place.
    let offset = macd_line.iter().position(Option::is_some).unwrap_or(n);
    let defined: Vec<f64> = macd_line[offset..].iter().flatten().copied().collect();
    let signal_core = ema::ema(&defined, signal_period);

    let mut signal = vec![None; n];
    for (j, v) in signal_core.into_iter().enumerate() {
        signal[offset + j] = v;
    }

    let mut histogram = vec![None; n];
    for i in 0..n {
        if let (Some(m), Some(s)) = (macd_line[i], signal[i]) {
            histogram[i] = Some(m - s);
        }
    }

    MacdSeries {
        macd: macd_line,
        signal,
        histogram,
    }
}
