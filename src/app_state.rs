// =============================================================================
// Central Application State
// =============================================================================
//
// Everything a request handler needs, shared as `Arc<AppState>`. The store
// is loaded once at startup and never mutated, and the config is read-only
// after `main` finishes assembling it, so there is nothing to lock: every
// chart request works purely on its own derived data.

use crate::market_data::TimeSeriesStore;
use crate::server_config::ServerConfig;

pub struct AppState {
    pub config: ServerConfig,
    pub store: TimeSeriesStore,
}

impl AppState {
    pub fn new(config: ServerConfig, store: TimeSeriesStore) -> Self {
        Self { config, store }
    }
}
