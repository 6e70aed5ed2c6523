// =============================================================================
// Server Configuration — JSON file with per-field defaults
// =============================================================================
//
// Every tunable lives here: served symbols, data directory, canvas size and
// the default indicator windows. All fields carry `#[serde(default)]` so an
// older config file keeps loading after new fields are added; a missing file
// just means defaults.
//
// Environment overrides (applied after the file):
//   CHARTWELL_DATA_DIR  — history CSV directory
//   CHARTWELL_SYMBOLS   — comma-separated ticker list
//   CHARTWELL_BIND      — listen address, e.g. 0.0.0.0:8000

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::indicators::IndicatorParams;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_bind_addr() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_data_dir() -> String {
    "Financial Data".to_string()
}

fn default_symbols() -> Vec<String> {
    [
        "AAPL", "MSFT", "GOOG", "AMZN", "TSLA", "SPY", "NVDA", "META", "NFLX", "AMD",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_chart_width() -> u32 {
    1000
}

fn default_chart_height() -> u32 {
    500
}

fn default_rolling_window() -> usize {
    20
}

fn default_bollinger_window() -> usize {
    20
}

fn default_bollinger_k() -> f64 {
    2.0
}

fn default_rsi_window() -> usize {
    14
}

fn default_macd_fast() -> usize {
    12
}

fn default_macd_slow() -> usize {
    26
}

fn default_macd_signal() -> usize {
    9
}

fn default_overlay_window() -> usize {
    20
}

// =============================================================================
// ServerConfig
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Directory holding one `<SYMBOL>.csv` history file per ticker.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Tickers loaded at startup; requests outside this set are 404s.
    #[serde(default = "default_symbols")]
    pub symbols: Vec<String>,

    #[serde(default = "default_chart_width")]
    pub chart_width: u32,
    #[serde(default = "default_chart_height")]
    pub chart_height: u32,

    // ── Default indicator windows ───────────────────────────────────────
    #[serde(default = "default_rolling_window")]
    pub rolling_window: usize,
    #[serde(default = "default_bollinger_window")]
    pub bollinger_window: usize,
    #[serde(default = "default_bollinger_k")]
    pub bollinger_k: f64,
    #[serde(default = "default_rsi_window")]
    pub rsi_window: usize,
    #[serde(default = "default_macd_fast")]
    pub macd_fast: usize,
    #[serde(default = "default_macd_slow")]
    pub macd_slow: usize,
    #[serde(default = "default_macd_signal")]
    pub macd_signal: usize,
    /// Default window for both lines of the SMA/EMA overlay.
    #[serde(default = "default_overlay_window")]
    pub overlay_window: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        serde_json::from_str("{}").expect("empty config must deserialize via defaults")
    }
}

impl ServerConfig {
    /// Load from a JSON file; a missing file yields defaults, a present but
    /// malformed file is an error (silent fallback would hide typos).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!(path = %path.display(), "no config file — using defaults");
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    /// Fold in the environment overrides.
    pub fn apply_env(&mut self) {
        if let Ok(dir) = std::env::var("CHARTWELL_DATA_DIR") {
            self.data_dir = dir;
        }
        if let Ok(bind) = std::env::var("CHARTWELL_BIND") {
            self.bind_addr = bind;
        }
        if let Ok(syms) = std::env::var("CHARTWELL_SYMBOLS") {
            let parsed: Vec<String> = syms
                .split(',')
                .map(|s| s.trim().to_uppercase())
                .filter(|s| !s.is_empty())
                .collect();
            if !parsed.is_empty() {
                self.symbols = parsed;
            }
        }
    }

    /// The indicator parameter set used when a request does not override a
    /// window.
    pub fn indicator_params(&self) -> IndicatorParams {
        IndicatorParams {
            rolling_window: self.rolling_window,
            bollinger_window: self.bollinger_window,
            bollinger_k: self.bollinger_k,
            rsi_window: self.rsi_window,
            macd_fast: self.macd_fast,
            macd_slow: self.macd_slow,
            macd_signal: self.macd_signal,
            sma_window: self.overlay_window,
            ema_window: self.overlay_window,
        }
    }
}
