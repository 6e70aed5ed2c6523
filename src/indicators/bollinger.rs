// =============================================================================
// Bollinger Bands
// =============================================================================
//
// Middle band = trailing SMA, upper/lower = middle ± k * σ where σ is the
// trailing *population* standard deviation over the same window (see sma.rs).
// All three sequences share the SMA's undefined prefix.

use super::sma;

/// Full-series Bollinger bands, each sequence aligned to the input.
#[derive(Debug, Clone, PartialEq)]
pub struct BollingerSeries {
    pub mean: Vec<Option<f64>>,
    pub upper: Vec<Option<f64>>,
    pub lower: Vec<Option<f64>>,
}

/// Compute Bollinger bands over `values` with the given `window` and band
/// width `k` (in standard deviations).
///
/// An entry is defined exactly when the underlying rolling mean is defined;
/// upper and lower are symmetric around the mean by construction.
pub fn bollinger_bands(values: &[f64], window: usize, k: f64) -> BollingerSeries {
    let mean = sma::rolling_mean(values, window);
    let std = sma::rolling_std(values, window);

    let mut upper = vec![None; values.len()];
    let mut lower = vec![None; values.len()];
    for i in 0..values.len() {
        if let (Some(m), Some(s)) = (mean[i], std[i]) {
            upper[i] = Some(m + k * s);
            lower[i] = Some(m - k * s);
        }
    }

    BollingerSeries { mean, upper, lower }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bands_symmetric_around_mean() {
        let values: Vec<f64> = (1..=40).map(|x| 50.0 + (x as f64).sin() * 5.0).collect();
        let bands = bollinger_bands(&values, 20, 2.0);
        for i in 0..values.len() {
            match (bands.mean[i], bands.upper[i], bands.lower[i]) {
                (Some(m), Some(u), Some(l)) => {
                    assert!(((u - m) - (m - l)).abs() < 1e-10, "asymmetry at {i}");
                }
                (None, None, None) => {}
                other => panic!("misaligned definedness at {i}: {other:?}"),
            }
        }
    }

    #[test]
    fn bands_undefined_prefix() {
        let values: Vec<f64> = (1..=25).map(|x| x as f64).collect();
        let bands = bollinger_bands(&values, 20, 2.0);
        for i in 0..19 {
            assert_eq!(bands.mean[i], None);
            assert_eq!(bands.upper[i], None);
            assert_eq!(bands.lower[i], None);
        }
        assert!(bands.mean[19].is_some());
    }

    #[test]
    fn bands_flat_series_collapse() {
        // Zero deviation: upper == mean == lower.
        let values = vec![100.0; 30];
        let bands = bollinger_bands(&values, 20, 2.0);
        let i = 25;
        assert!((bands.upper[i].unwrap() - 100.0).abs() < 1e-12);
        assert!((bands.lower[i].unwrap() - 100.0).abs() < 1e-12);
    }

    #[test]
    fn bands_k_scales_width() {
        let values: Vec<f64> = (1..=30).map(|x| x as f64).collect();
        let narrow = bollinger_bands(&values, 20, 1.0);
        let wide = bollinger_bands(&values, 20, 2.0);
        let i = 25;
        let narrow_width = narrow.upper[i].unwrap() - narrow.lower[i].unwrap();
        let wide_width = wide.upper[i].unwrap() - wide.lower[i].unwrap();
        assert!((wide_width - 2.0 * narrow_width).abs() < 1e-10);
    }

    #[test]
    fn bands_insufficient_data_all_none() {
        let bands = bollinger_bands(&[1.0, 2.0, 3.0], 20, 2.0);
        assert!(bands.mean.iter().all(Option::is_none));
        assert!(bands.upper.iter().all(Option::is_none));
        assert!(bands.lower.iter().all(Option::is_none));
    }
}
