// =============================================================================
// Chart pipeline — store lookup → indicators → spec → pixels
// =============================================================================

pub mod canvas;
pub mod font;
pub mod palette;
pub mod render;
pub mod spec;

pub use spec::{resolve_chart_spec, ChartSpec, DrawInstruction, DrawKind};

use crate::indicators::IndicatorParams;
use crate::market_data::TimeSeriesStore;
use crate::types::{ChartError, GraphType, RenderedImage};

/// Generate one chart end to end.
///
/// `symbols` keeps request order (it decides overlay colors); single-symbol
/// chart kinds use the first entry and ignore the rest. All failures are
/// typed [`ChartError`]s for the HTTP layer to translate — no partial images
/// are ever produced.
pub fn generate_chart(
    store: &TimeSeriesStore,
    symbols: &[String],
    graph_type: GraphType,
    params: &IndicatorParams,
    width: u32,
    height: u32,
) -> Result<RenderedImage, ChartError> {
    let spec = resolve_chart_spec(store, symbols, graph_type, params)?;
    render::render(&spec, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::test_util::series_from_closes;

    fn store() -> TimeSeriesStore {
        let closes: Vec<f64> = (1..=40).map(|i| 50.0 + i as f64).collect();
        TimeSeriesStore::from_series(vec![
            series_from_closes("AAPL", &closes),
            series_from_closes("MSFT", &closes),
        ])
    }

    #[test]
    fn end_to_end_png() {
        let img = generate_chart(
            &store(),
            &["AAPL".to_string(), "MSFT".to_string()],
            GraphType::DailyReturns,
            &IndicatorParams::default(),
            1000,
            500,
        )
        .unwrap();
        assert_eq!(img.mime, "image/png");
        assert_eq!(&img.bytes[..4], &[0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn end_to_end_unknown_symbol() {
        let err = generate_chart(
            &store(),
            &["ZZZZ".to_string()],
            GraphType::Rsi,
            &IndicatorParams::default(),
            1000,
            500,
        )
        .unwrap_err();
        assert!(matches!(err, ChartError::SymbolNotFound(_)));
    }
}
