// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free implementations of the indicators served by the
// chart backend. Every series-valued function returns a `Vec<Option<f64>>`
// aligned one-to-one with its input: `None` marks the undefined warm-up
// prefix of a windowed indicator, so renderers can never plot garbage in
// place of a half-filled window. No NaN sentinels leave this module.

pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod returns;
pub mod rsi;
pub mod sma;

use crate::types::{ChartError, GraphType, TimeSeries};

// =============================================================================
// Parameters
// =============================================================================

/// Tunable windows for every indicator, passed explicitly into [`compute`].
///
/// Defaults match the served chart routes; tests construct arbitrary windows
/// directly instead of relying on globals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorParams {
    /// Rolling-mean window (bars).
    pub rolling_window: usize,
    /// Bollinger band window (bars).
    pub bollinger_window: usize,
    /// Bollinger band width in standard deviations.
    pub bollinger_k: f64,
    /// RSI look-back (bars of delta consumed to seed Wilder smoothing).
    pub rsi_window: usize,
    /// MACD fast EMA period.
    pub macd_fast: usize,
    /// MACD slow EMA period.
    pub macd_slow: usize,
    /// MACD signal EMA period.
    pub macd_signal: usize,
    /// SMA window for the SMA/EMA overlay chart.
    pub sma_window: usize,
    /// EMA window for the SMA/EMA overlay chart.
    pub ema_window: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            rolling_window: 20,
            bollinger_window: 20,
            bollinger_k: 2.0,
            rsi_window: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            sma_window: 20,
            ema_window: 20,
        }
    }
}

// =============================================================================
// Results
// =============================================================================

/// Output of one indicator computation for one symbol.
///
/// Every sequence is aligned to the input series (same length, `None` for
/// the undefined prefix). Results are computed fresh per request and owned
/// by the caller — nothing here is cached or shared.
#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorResult {
    DailyReturns(Vec<Option<f64>>),
    RollingMean(Vec<Option<f64>>),
    BollingerBands {
        mean: Vec<Option<f64>>,
        upper: Vec<Option<f64>>,
        lower: Vec<Option<f64>>,
    },
    Rsi(Vec<Option<f64>>),
    Macd {
        macd: Vec<Option<f64>>,
        signal: Vec<Option<f64>>,
        histogram: Vec<Option<f64>>,
    },
    SmaEma {
        sma: Vec<Option<f64>>,
        ema: Vec<Option<f64>>,
    },
    Drawdown(Vec<Option<f64>>),
}

// =============================================================================
// Engine
// =============================================================================

/// Minimum number of bars required before `kind` produces a drawable result.
///
/// MACD needs the slow EMA plus a full signal window so that all three of its
/// sequences (line, signal, histogram) have at least one defined point.
pub fn required_bars(kind: GraphType, params: &IndicatorParams) -> usize {
    match kind {
        GraphType::DailyReturns | GraphType::Drawdown => 2,
        GraphType::RollingMean => params.rolling_window,
        GraphType::BollingerBands => params.bollinger_window,
        GraphType::Rsi => params.rsi_window + 1,
        GraphType::Macd => params.macd_slow + params.macd_signal - 1,
        GraphType::SmaEma => params.sma_window.max(params.ema_window),
        // Chart-only kinds read raw bars; one bar is enough to draw.
        GraphType::Candlestick | GraphType::Trading => 1,
    }
}

/// Compute the indicator behind `kind` over the adjusted closes of `series`.
///
/// Pure and deterministic; never mutates `series`. Candlestick and volume
/// charts are built from raw bars by the spec resolver and are rejected here
/// as non-indicators.
///
/// # Errors
/// - [`ChartError::InsufficientData`] when the series is shorter than the
///   window the indicator needs.
/// - [`ChartError::UnsupportedIndicator`] for `candlestick` / `trading`.
pub fn compute(
    series: &TimeSeries,
    kind: GraphType,
    params: &IndicatorParams,
) -> Result<IndicatorResult, ChartError> {
    let required = required_bars(kind, params);
    if series.len() < required {
        return Err(ChartError::InsufficientData {
            symbol: series.symbol.clone(),
            required,
            actual: series.len(),
        });
    }

    let closes = series.adj_closes();

    match kind {
        GraphType::DailyReturns => Ok(IndicatorResult::DailyReturns(returns::daily_returns(
            &closes,
        ))),
        GraphType::RollingMean => Ok(IndicatorResult::RollingMean(sma::rolling_mean(
            &closes,
            params.rolling_window,
        ))),
        GraphType::BollingerBands => {
            let bands = bollinger::bollinger_bands(
                &closes,
                params.bollinger_window,
                params.bollinger_k,
            );
            Ok(IndicatorResult::BollingerBands {
                mean: bands.mean,
                upper: bands.upper,
                lower: bands.lower,
            })
        }
        GraphType::Rsi => Ok(IndicatorResult::Rsi(rsi::rsi(&closes, params.rsi_window))),
        GraphType::Macd => {
            let out = macd::macd(
                &closes,
                params.macd_fast,
                params.macd_slow,
                params.macd_signal,
            );
            Ok(IndicatorResult::Macd {
                macd: out.macd,
                signal: out.signal,
                histogram: out.histogram,
            })
        }
        GraphType::SmaEma => Ok(IndicatorResult::SmaEma {
            sma: sma::rolling_mean(&closes, params.sma_window),
            ema: ema::ema(&closes, params.ema_window),
        }),
        GraphType::Drawdown => Ok(IndicatorResult::Drawdown(returns::drawdown(&closes))),
        GraphType::Candlestick | GraphType::Trading => {
            Err(ChartError::UnsupportedIndicator(kind.to_string()))
        }
    }
}

#[cfg(test)]
pub(crate) mod test_util {
    use crate::types::{Bar, TimeSeries};
    use chrono::NaiveDate;

    /// Build a synthetic series with the given closes, one bar per weekday
    /// starting 2024-01-02. OHLC values bracket the close so the Bar
    /// invariant holds.
    pub fn series_from_closes(symbol: &str, closes: &[f64]) -> TimeSeries {
        let mut date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let bars = closes
            .iter()
            .map(|&c| {
                let bar = Bar {
                    date,
                    open: c * 0.99,
                    high: c * 1.02,
                    low: c * 0.98,
                    close: c,
                    adj_close: c,
                    volume: 1_000_000,
                };
                date = next_weekday(date);
                bar
            })
            .collect();
        TimeSeries {
            symbol: symbol.to_string(),
            bars,
        }
    }

    fn next_weekday(d: NaiveDate) -> NaiveDate {
        use chrono::Datelike;
        let mut next = d.succ_opt().unwrap();
        while next.weekday().number_from_monday() > 5 {
            next = next.succ_opt().unwrap();
        }
        next
    }
}
