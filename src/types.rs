// =============================================================================
// Shared types used across the Chartwell chart backend
// =============================================================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// Market data
// =============================================================================

/// One trading day's OHLCV record for a single symbol.
///
/// Invariants (enforced at load time):
/// - `low <= min(open, close)` and `max(open, close) <= high`
/// - all price fields are finite
///
/// `adj_close` is the split/dividend-adjusted close from the source CSV; all
/// line indicators run on it, while candlestick and volume charts use the raw
/// OHLCV columns.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adj_close: f64,
    pub volume: u64,
}

impl Bar {
    /// Check the OHLC ordering invariant. Rows that fail are dropped by the
    /// loader instead of poisoning downstream computations.
    pub fn is_valid(&self) -> bool {
        self.low <= self.open.min(self.close)
            && self.open.max(self.close) <= self.high
            && [self.open, self.high, self.low, self.close, self.adj_close]
                .iter()
                .all(|v| v.is_finite())
    }
}

/// An ordered, immutable daily price history for one symbol.
///
/// Dates are strictly increasing; missing trading days are simply absent.
/// The store hands these out behind `Arc`, so nothing downstream may mutate
/// them — every indicator computation allocates its own output.
#[derive(Debug, Clone, Serialize)]
pub struct TimeSeries {
    pub symbol: String,
    pub bars: Vec<Bar>,
}

impl TimeSeries {
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Adjusted closes in date order — the input to every line indicator.
    pub fn adj_closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.adj_close).collect()
    }

    /// Bar dates in order, used as the shared x axis of a chart.
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.date).collect()
    }
}

// =============================================================================
// Graph types
// =============================================================================

/// The closed set of chart kinds the backend can produce.
///
/// Parsed from the `graph_type` query parameter; an unknown string fails with
/// [`ChartError::UnsupportedIndicator`] before any data is touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphType {
    DailyReturns,
    RollingMean,
    BollingerBands,
    Rsi,
    Macd,
    SmaEma,
    Drawdown,
    Candlestick,
    /// Trading-volume bars for a single symbol.
    Trading,
}

impl GraphType {
    /// Whether this chart overlays several symbols on one axis.
    ///
    /// Candlestick, SMA/EMA and volume charts are single-symbol by
    /// construction; Bollinger is single-symbol by policy (overlaid bands
    /// are unreadable).
    pub fn supports_multi_symbol(&self) -> bool {
        matches!(
            self,
            Self::DailyReturns | Self::RollingMean | Self::Rsi | Self::Macd | Self::Drawdown
        )
    }

    /// Human-readable name used in chart titles.
    pub fn title_name(&self) -> &'static str {
        match self {
            Self::DailyReturns => "Daily Returns",
            Self::RollingMean => "Rolling Mean",
            Self::BollingerBands => "Bollinger Bands",
            Self::Rsi => "Relative Strength Index (RSI)",
            Self::Macd => "MACD",
            Self::SmaEma => "SMA and EMA",
            Self::Drawdown => "Drawdown",
            Self::Candlestick => "Candlestick",
            Self::Trading => "Trading Volume",
        }
    }
}

impl std::str::FromStr for GraphType {
    type Err = ChartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily_returns" => Ok(Self::DailyReturns),
            "rolling_mean" => Ok(Self::RollingMean),
            "bollinger_bands" => Ok(Self::BollingerBands),
            "rsi" => Ok(Self::Rsi),
            "macd" => Ok(Self::Macd),
            "sma_ema" => Ok(Self::SmaEma),
            "drawdown" => Ok(Self::Drawdown),
            "candlestick" => Ok(Self::Candlestick),
            "trading" => Ok(Self::Trading),
            other => Err(ChartError::UnsupportedIndicator(other.to_string())),
        }
    }
}

impl std::fmt::Display for GraphType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::DailyReturns => "daily_returns",
            Self::RollingMean => "rolling_mean",
            Self::BollingerBands => "bollinger_bands",
            Self::Rsi => "rsi",
            Self::Macd => "macd",
            Self::SmaEma => "sma_ema",
            Self::Drawdown => "drawdown",
            Self::Candlestick => "candlestick",
            Self::Trading => "trading",
        };
        write!(f, "{s}")
    }
}

// =============================================================================
// Rendered output
// =============================================================================

/// An encoded chart image ready to be returned to the HTTP layer.
#[derive(Debug, Clone)]
pub struct RenderedImage {
    pub bytes: Vec<u8>,
    pub mime: &'static str,
    pub width: u32,
    pub height: u32,
}

// =============================================================================
// Error taxonomy
// =============================================================================

/// Every way the chart pipeline can fail.
///
/// All variants are deterministic functions of the request — the pipeline
/// never retries and never returns a partial chart. The REST layer owns the
/// mapping to HTTP status codes; nothing in here is transport-specific.
#[derive(Debug, Error)]
pub enum ChartError {
    #[error("symbol '{0}' not found")]
    SymbolNotFound(String),

    #[error("insufficient data: {symbol} has {actual} bars, {required} required")]
    InsufficientData {
        symbol: String,
        required: usize,
        actual: usize,
    },

    #[error("unsupported graph type '{0}'")]
    UnsupportedIndicator(String),

    #[error("graph type '{0}' supports exactly one symbol")]
    UnsupportedMultiSymbol(GraphType),

    #[error("chart has no drawable instructions")]
    EmptyChart,

    #[error("render failure: {0}")]
    RenderFailure(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(open: f64, high: f64, low: f64, close: f64) -> Bar {
        Bar {
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            open,
            high,
            low,
            close,
            adj_close: close,
            volume: 1_000,
        }
    }

    #[test]
    fn bar_valid_ordering() {
        assert!(bar(10.0, 12.0, 9.0, 11.0).is_valid());
    }

    #[test]
    fn bar_rejects_low_above_body() {
        assert!(!bar(10.0, 12.0, 10.5, 11.0).is_valid());
    }

    #[test]
    fn bar_rejects_high_below_body() {
        assert!(!bar(10.0, 10.5, 9.0, 11.0).is_valid());
    }

    #[test]
    fn bar_rejects_non_finite() {
        assert!(!bar(10.0, 12.0, 9.0, f64::NAN).is_valid());
    }

    #[test]
    fn graph_type_round_trip() {
        for s in [
            "daily_returns",
            "rolling_mean",
            "bollinger_bands",
            "rsi",
            "macd",
            "sma_ema",
            "drawdown",
            "candlestick",
            "trading",
        ] {
            let gt: GraphType = s.parse().unwrap();
            assert_eq!(gt.to_string(), s);
        }
    }

    #[test]
    fn graph_type_unknown_string() {
        let err = "sparkline".parse::<GraphType>().unwrap_err();
        assert!(matches!(err, ChartError::UnsupportedIndicator(s) if s == "sparkline"));
    }

    #[test]
    fn multi_symbol_policy() {
        assert!(GraphType::DailyReturns.supports_multi_symbol());
        assert!(GraphType::Rsi.supports_multi_symbol());
        assert!(!GraphType::BollingerBands.supports_multi_symbol());
        assert!(!GraphType::Candlestick.supports_multi_symbol());
        assert!(!GraphType::Trading.supports_multi_symbol());
        assert!(!GraphType::SmaEma.supports_multi_symbol());
    }
}
