// =============================================================================
// Relative Strength Index (RSI) — Wilder's Smoothing
// =============================================================================
//
// Step 1 — Per-bar deltas of the input; gain = max(Δ, 0), loss = max(-Δ, 0).
// Step 2 — Seed average gain / loss with the simple mean of the first
//          `window` deltas.
// Step 3 — Wilder smoothing afterwards:
//            avg_gain = (avg_gain * (window - 1) + gain) / window
//            avg_loss = (avg_loss * (window - 1) + loss) / window
// Step 4 — RS  = avg_gain / avg_loss
//          RSI = 100 - 100 / (1 + RS)
//
// avg_loss == 0 with gains present clamps RSI to 100; a completely flat
// window (both averages zero) reads as neutral 50.

/// Compute the Wilder RSI, aligned to `values`.
///
/// The first `window` entries are undefined: `window` deltas are consumed to
/// seed the averages, so the first defined value sits at index `window`.
/// Defined values always lie in [0, 100].
pub fn rsi(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut result = vec![None; values.len()];
    if window == 0 || values.len() < window + 1 {
        return result;
    }

    let deltas: Vec<f64> = values.windows(2).map(|w| w[1] - w[0]).collect();

    // Seed with the simple mean of the first `window` deltas.
    let (sum_gain, sum_loss) = deltas[..window]
        .iter()
        .fold((0.0_f64, 0.0_f64), |(g, l), &d| {
            if d > 0.0 {
                (g + d, l)
            } else {
                (g, l + d.abs())
            }
        });

    let window_f = window as f64;
    let mut avg_gain = sum_gain / window_f;
    let mut avg_loss = sum_loss / window_f;

    result[window] = rsi_from_averages(avg_gain, avg_loss);

    for (i, &delta) in deltas.iter().enumerate().skip(window) {
        let gain = if delta > 0.0 { delta } else { 0.0 };
        let loss = if delta < 0.0 { delta.abs() } else { 0.0 };

        avg_gain = (avg_gain * (window_f - 1.0) + gain) / window_f;
        avg_loss = (avg_loss * (window_f - 1.0) + loss) / window_f;

        // Delta i spans values[i] -> values[i + 1].
        result[i + 1] = rsi_from_averages(avg_gain, avg_loss);
    }

    result
}

/// Convert average gain / loss into an RSI value in [0, 100].
fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> Option<f64> {
    let rsi = if avg_loss == 0.0 && avg_gain == 0.0 {
        50.0 // No movement at all — neutral.
    } else if avg_loss == 0.0 {
        100.0 // All gains, no losses.
    } else {
        let rs = avg_gain / avg_loss;
        100.0 - 100.0 / (1.0 + rs)
    };

    rsi.is_finite().then_some(rsi)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rsi_undefined_prefix() {
        let values: Vec<f64> = (1..=30).map(|x| x as f64).collect();
        let out = rsi(&values, 14);
        for v in &out[..14] {
            assert_eq!(*v, None);
        }
        assert!(out[14].is_some());
    }

    #[test]
    fn rsi_insufficient_data() {
        // 14 values => 13 deltas, one short of the 14 needed to seed.
        let values: Vec<f64> = (1..=14).map(|x| x as f64).collect();
        assert!(rsi(&values, 14).iter().all(Option::is_none));
    }

    #[test]
    fn rsi_window_zero() {
        assert!(rsi(&[1.0, 2.0, 3.0], 0).iter().all(Option::is_none));
    }

    #[test]
    fn rsi_all_gains_is_100() {
        let values: Vec<f64> = (1..=40).map(|x| x as f64).collect();
        let out = rsi(&values, 14);
        for v in out.iter().flatten() {
            assert!((v - 100.0).abs() < 1e-10, "expected 100, got {v}");
        }
    }

    #[test]
    fn rsi_all_losses_is_0() {
        let values: Vec<f64> = (1..=40).rev().map(|x| x as f64).collect();
        let out = rsi(&values, 14);
        for v in out.iter().flatten() {
            assert!(v.abs() < 1e-10, "expected 0, got {v}");
        }
    }

    #[test]
    fn rsi_flat_market_is_50() {
        let values = vec![100.0; 30];
        let out = rsi(&values, 14);
        for v in out.iter().flatten() {
            assert!((v - 50.0).abs() < 1e-10);
        }
    }

    #[test]
    fn rsi_always_in_range() {
        let values = vec![
            44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.42, 45.84, 46.08, 45.89,
            46.03, 44.18, 44.22, 44.57, 43.42, 42.66, 43.13, 44.01, 43.50,
        ];
        let out = rsi(&values, 14);
        for v in out.iter().flatten() {
            assert!((0.0..=100.0).contains(v), "RSI {v} out of range");
        }
    }

    #[test]
    fn rsi_alignment() {
        let values: Vec<f64> = (1..=30).map(|x| x as f64).collect();
        assert_eq!(rsi(&values, 14).len(), values.len());
    }
}
