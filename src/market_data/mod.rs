pub mod csv_loader;
pub mod store;

// Re-export the store for convenient access (e.g. `use crate::market_data::TimeSeriesStore`).
pub use store::TimeSeriesStore;
