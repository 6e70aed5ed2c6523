// =============================================================================
// Exponential Moving Average (EMA)
// =============================================================================
//
// EMA weights recent values more heavily than the SMA:
//   alpha  = 2 / (period + 1)
//   EMA_t  = value_t * alpha + EMA_{t-1} * (1 - alpha)
//
// The first EMA value is seeded with the SMA of the first `period` inputs,
// so the leading `period - 1` entries are undefined.

/// Compute the `period`-bar EMA, aligned to `values`.
///
/// `result[period - 1]` holds the SMA seed; subsequent entries apply the
/// recursive smoothing. A `period` of zero or longer than the input yields
/// an all-`None` vector.
pub fn ema(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut result = vec![None; values.len()];
    if period == 0 || values.len() < period {
        return result;
    }

    let alpha = 2.0 / (period + 1) as f64;

    let seed: f64 = values[..period].iter().sum::<f64>() / period as f64;
    if !seed.is_finite() {
        return result;
    }
    result[period - 1] = Some(seed);

    let mut prev = seed;
    for i in period..values.len() {
        let next = values[i] * alpha + prev * (1.0 - alpha);
        if !next.is_finite() {
            // A broken input poisons everything after it; stop rather than
            // emit values downstream consumers cannot trust.
            break;
        }
        result[i] = Some(next);
        prev = next;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ema_undefined_prefix() {
        let values: Vec<f64> = (1..=10).map(|x| x as f64).collect();
        let out = ema(&values, 5);
        for v in &out[..4] {
            assert_eq!(*v, None);
        }
        assert!(out[4].is_some());
    }

    #[test]
    fn ema_seed_is_sma() {
        let values = vec![2.0, 4.0, 6.0];
        let out = ema(&values, 3);
        assert!((out[2].unwrap() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn ema_known_values() {
        // 5-period EMA of 1..=10: seed = 3.0, alpha = 1/3.
        let values: Vec<f64> = (1..=10).map(|x| x as f64).collect();
        let out = ema(&values, 5);

        let alpha = 2.0 / 6.0;
        let mut expected = 3.0;
        assert!((out[4].unwrap() - expected).abs() < 1e-10);
        for i in 5..10 {
            expected = values[i] * alpha + expected * (1.0 - alpha);
            assert!((out[i].unwrap() - expected).abs() < 1e-10);
        }
    }

    #[test]
    fn ema_flat_input_stays_flat() {
        let values = vec![42.0; 20];
        let out = ema(&values, 7);
        for v in out.iter().skip(6) {
            assert!((v.unwrap() - 42.0).abs() < 1e-12);
        }
    }

    #[test]
    fn ema_period_zero() {
        assert!(ema(&[1.0, 2.0, 3.0], 0).iter().all(Option::is_none));
    }

    #[test]
    fn ema_insufficient_data() {
        assert!(ema(&[1.0, 2.0], 5).iter().all(Option::is_none));
    }

    #[test]
    fn ema_stops_after_nan_input() {
        let values = vec![1.0, 2.0, 3.0, f64::NAN, 5.0];
        let out = ema(&values, 3);
        assert!(out[2].is_some());
        assert_eq!(out[3], None);
        assert_eq!(out[4], None);
    }
}
