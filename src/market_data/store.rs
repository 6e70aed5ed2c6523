// =============================================================================
// TimeSeriesStore — immutable per-symbol price histories
// =============================================================================
//
// Populated once at startup from the CSV data directory and never mutated
// afterwards. Series are handed out as `Arc<TimeSeries>` so request handlers
// share the loaded data without copying and without locks — concurrent reads
// of immutable data need neither.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::market_data::csv_loader;
use crate::types::{ChartError, TimeSeries};

/// Read-only map of symbol -> loaded history.
pub struct TimeSeriesStore {
    series: HashMap<String, Arc<TimeSeries>>,
}

impl TimeSeriesStore {
    /// Load every configured symbol from `<dir>/<SYMBOL>.csv`.
    ///
    /// A symbol whose file is missing or yields no usable rows is logged and
    /// skipped; the server still starts with whatever loaded. Requests for a
    /// skipped symbol fail with `SymbolNotFound` like any unknown ticker.
    pub fn load(dir: &Path, symbols: &[String]) -> Self {
        let mut series = HashMap::new();

        for symbol in symbols {
            match csv_loader::load_symbol(dir, symbol) {
                Ok(ts) if !ts.is_empty() => {
                    info!(symbol, bars = ts.len(), "loaded history");
                    series.insert(symbol.clone(), Arc::new(ts));
                }
                Ok(_) => {
                    warn!(symbol, "history file empty — symbol not served");
                }
                Err(e) => {
                    warn!(symbol, error = %e, "failed to load history — symbol not served");
                }
            }
        }

        Self { series }
    }

    /// Build a store directly from in-memory series (tests, fixtures).
    pub fn from_series(list: Vec<TimeSeries>) -> Self {
        let series = list
            .into_iter()
            .map(|ts| (ts.symbol.clone(), Arc::new(ts)))
            .collect();
        Self { series }
    }

    /// Fetch one symbol's history.
    pub fn get(&self, symbol: &str) -> Result<Arc<TimeSeries>, ChartError> {
        self.series
            .get(symbol)
            .cloned()
            .ok_or_else(|| ChartError::SymbolNotFound(symbol.to_string()))
    }

    /// All loaded symbols, sorted for stable listings and charts.
    pub fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self.series.keys().cloned().collect();
        symbols.sort();
        symbols
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::test_util::series_from_closes;

    #[test]
    fn get_known_symbol() {
        let store = TimeSeriesStore::from_series(vec![series_from_closes(
            "AAPL",
            &[1.0, 2.0, 3.0],
        )]);
        let ts = store.get("AAPL").unwrap();
        assert_eq!(ts.symbol, "AAPL");
        assert_eq!(ts.len(), 3);
    }

    #[test]
    fn get_unknown_symbol_fails() {
        let store = TimeSeriesStore::from_series(vec![]);
        let err = store.get("ZZZZ").unwrap_err();
        assert!(matches!(err, ChartError::SymbolNotFound(s) if s == "ZZZZ"));
    }

    #[test]
    fn symbols_sorted() {
        let store = TimeSeriesStore::from_series(vec![
            series_from_closes("MSFT", &[1.0]),
            series_from_closes("AAPL", &[1.0]),
        ]);
        assert_eq!(store.symbols(), vec!["AAPL", "MSFT"]);
    }

    #[test]
    fn load_missing_directory_is_not_fatal() {
        let store = TimeSeriesStore::load(
            Path::new("/nonexistent/history"),
            &["AAPL".to_string()],
        );
        assert!(store.is_empty());
    }
}
