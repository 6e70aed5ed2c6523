// =============================================================================
// REST API Endpoints — Axum 0.7
// =============================================================================
//
// The chart routes mirror the service's public surface:
//
//   GET /api/v1/health                     liveness + loaded symbol count
//   GET /symbols                           available ticker list (JSON)
//   GET /stock/graph                       multi-symbol indicator chart (PNG)
//   GET /stock/sma-ema                     SMA/EMA overlay for one symbol (PNG)
//   GET /api/stocks/drawdown               drawdown overlay of all symbols (PNG)
//   GET /api/stocks/:ticker                bar records as JSON
//   GET /api/stocks/:ticker/chart          candlestick chart (PNG)
//   GET /api/stocks/:ticker/volume         trading-volume chart (PNG)
//
// CORS is configured permissively for development; tighten allowed origins
// in production. This layer only decodes parameters and maps ChartError to
// HTTP statuses — all chart logic lives in the pipeline.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::app_state::AppState;
use crate::chart;
use crate::types::{ChartError, GraphType, RenderedImage};

// =============================================================================
// Router construction
// =============================================================================

/// Build the full REST router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/health", get(health))
        .route("/symbols", get(list_symbols))
        .route("/stock/graph", get(stock_graph))
        .route("/stock/sma-ema", get(sma_ema))
        .route("/api/stocks/drawdown", get(drawdown))
        .route("/api/stocks/:ticker", get(stock_data))
        .route("/api/stocks/:ticker/chart", get(candlestick_chart))
        .route("/api/stocks/:ticker/volume", get(volume_chart))
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Error mapping
// =============================================================================

/// Transport-level error wrapper. The pipeline's typed errors become JSON
/// bodies with the status chosen by [`status_for`]; parameter-shape problems
/// never enter the pipeline and carry their own message.
#[derive(Debug)]
enum ApiError {
    Chart(ChartError),
    BadRequest(String),
}

impl From<ChartError> for ApiError {
    fn from(e: ChartError) -> Self {
        Self::Chart(e)
    }
}

fn status_for(error: &ChartError) -> StatusCode {
    match error {
        ChartError::SymbolNotFound(_) => StatusCode::NOT_FOUND,
        ChartError::RenderFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        ChartError::InsufficientData { .. }
        | ChartError::UnsupportedIndicator(_)
        | ChartError::UnsupportedMultiSymbol(_)
        | ChartError::EmptyChart => StatusCode::BAD_REQUEST,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Chart(e) => (status_for(&e), e.to_string()),
            Self::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

fn bad_request(message: &str) -> ApiError {
    ApiError::BadRequest(message.to_string())
}

fn png_response(image: RenderedImage) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, image.mime)],
        image.bytes,
    )
        .into_response()
}

// =============================================================================
// Health (public)
// =============================================================================

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "symbols_loaded": state.store.len(),
    }))
}

// =============================================================================
// Symbol discovery
// =============================================================================

async fn list_symbols(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(symbols_payload(&state.store))
}

/// Ticker discovery body: the sorted list of symbols the server can chart.
fn symbols_payload(store: &crate::market_data::TimeSeriesStore) -> serde_json::Value {
    let available = store.symbols();
    serde_json::json!({
        "available_symbols": available,
        "total_count": available.len(),
    })
}

// =============================================================================
// Multi-symbol graph endpoint
// =============================================================================

#[derive(Deserialize)]
struct GraphQuery {
    symbols: Option<String>,
    graph_type: Option<String>,
}

async fn stock_graph(
    State(state): State<Arc<AppState>>,
    Query(query): Query<GraphQuery>,
) -> Result<Response, ApiError> {
    let symbols = parse_symbols(query.symbols.as_deref())?;
    let graph_type = parse_graph_type(query.graph_type.as_deref())?;

    let image = chart::generate_chart(
        &state.store,
        &symbols,
        graph_type,
        &state.config.indicator_params(),
        state.config.chart_width,
        state.config.chart_height,
    )?;

    info!(%graph_type, symbols = ?symbols, "served chart");
    Ok(png_response(image))
}

/// Split the `symbols` query parameter, preserving request order.
fn parse_symbols(raw: Option<&str>) -> Result<Vec<String>, ApiError> {
    let raw = raw.ok_or_else(|| bad_request("missing 'symbols' parameter"))?;
    let symbols: Vec<String> = raw
        .split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect();
    if symbols.is_empty() {
        return Err(ApiError::Chart(ChartError::EmptyChart));
    }
    Ok(symbols)
}

/// The `graph_type` parameter is mandatory; an absent value is a 400, an
/// unrecognized one fails through the [`GraphType`] parser.
fn parse_graph_type(raw: Option<&str>) -> Result<GraphType, ApiError> {
    let raw = raw.ok_or_else(|| bad_request("missing 'graph_type' parameter"))?;
    Ok(raw.parse()?)
}

// =============================================================================
// SMA/EMA overlay endpoint
// =============================================================================

#[derive(Deserialize)]
struct SmaEmaQuery {
    symbol: Option<String>,
    sma_window: Option<usize>,
    ema_window: Option<usize>,
}

async fn sma_ema(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SmaEmaQuery>,
) -> Result<Response, ApiError> {
    let symbol = query
        .symbol
        .ok_or_else(|| bad_request("missing 'symbol' parameter"))?
        .trim()
        .to_uppercase();

    let mut params = state.config.indicator_params();
    if let Some(w) = query.sma_window {
        params.sma_window = w;
    }
    if let Some(w) = query.ema_window {
        params.ema_window = w;
    }
    if params.sma_window == 0 || params.ema_window == 0 {
        return Err(bad_request("window sizes must be at least 1"));
    }

    let image = chart::generate_chart(
        &state.store,
        &[symbol.clone()],
        GraphType::SmaEma,
        &params,
        state.config.chart_width,
        state.config.chart_height,
    )?;

    info!(symbol, sma = params.sma_window, ema = params.ema_window, "served SMA/EMA chart");
    Ok(png_response(image))
}

// =============================================================================
// Per-ticker endpoints
// =============================================================================

async fn stock_data(
    State(state): State<Arc<AppState>>,
    Path(ticker): Path<String>,
) -> Result<Response, ApiError> {
    let series = state.store.get(&ticker.to_uppercase())?;
    Ok(Json(&series.bars).into_response())
}

async fn candlestick_chart(
    State(state): State<Arc<AppState>>,
    Path(ticker): Path<String>,
) -> Result<Response, ApiError> {
    single_symbol_chart(&state, ticker, GraphType::Candlestick)
}

async fn volume_chart(
    State(state): State<Arc<AppState>>,
    Path(ticker): Path<String>,
) -> Result<Response, ApiError> {
    single_symbol_chart(&state, ticker, GraphType::Trading)
}

fn single_symbol_chart(
    state: &AppState,
    ticker: String,
    graph_type: GraphType,
) -> Result<Response, ApiError> {
    let symbol = ticker.trim().to_uppercase();
    let image = chart::generate_chart(
        &state.store,
        &[symbol.clone()],
        graph_type,
        &state.config.indicator_params(),
        state.config.chart_width,
        state.config.chart_height,
    )?;
    info!(%graph_type, symbol, "served chart");
    Ok(png_response(image))
}

// =============================================================================
// Drawdown overlay (all loaded symbols)
// =============================================================================

async fn drawdown(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let symbols = state.store.symbols();
    let image = chart::generate_chart(
        &state.store,
        &symbols,
        GraphType::Drawdown,
        &state.config.indicator_params(),
        state.config.chart_width,
        state.config.chart_height,
    )?;
    info!(count = symbols.len(), "served drawdown overlay");
    Ok(png_response(image))
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(
            status_for(&ChartError::SymbolNotFound("ZZZZ".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&ChartError::InsufficientData {
                symbol: "AAPL".into(),
                required: 20,
                actual: 3,
            }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&ChartError::UnsupportedIndicator("sparkline".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&ChartError::UnsupportedMultiSymbol(GraphType::BollingerBands)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_for(&ChartError::EmptyChart), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_for(&ChartError::RenderFailure("oom".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn parse_symbols_orders_and_uppercases() {
        let symbols = parse_symbols(Some("aapl, msft ,GOOG")).unwrap();
        assert_eq!(symbols, vec!["AAPL", "MSFT", "GOOG"]);
    }

    #[test]
    fn parse_symbols_missing_is_error() {
        assert!(parse_symbols(None).is_err());
    }

    #[test]
    fn parse_symbols_all_blank_is_empty_chart() {
        let err = parse_symbols(Some(" , ,")).unwrap_err();
        assert!(matches!(err, ApiError::Chart(ChartError::EmptyChart)));
    }

    #[test]
    fn missing_parameter_message_is_verbatim() {
        // Parameter errors must not leak through the indicator error text.
        let err = parse_symbols(None).unwrap_err();
        let ApiError::BadRequest(message) = err else {
            panic!("expected BadRequest");
        };
        assert_eq!(message, "missing 'symbols' parameter");
    }

    #[test]
    fn graph_type_is_mandatory() {
        let err = parse_graph_type(None).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn graph_type_parses_when_present() {
        assert_eq!(parse_graph_type(Some("rsi")).unwrap(), GraphType::Rsi);
        assert!(matches!(
            parse_graph_type(Some("sparkline")).unwrap_err(),
            ApiError::Chart(ChartError::UnsupportedIndicator(_))
        ));
    }

    #[test]
    fn symbols_payload_lists_loaded_tickers() {
        use crate::indicators::test_util::series_from_closes;
        use crate::market_data::TimeSeriesStore;

        let store = TimeSeriesStore::from_series(vec![
            series_from_closes("MSFT", &[1.0, 2.0]),
            series_from_closes("AAPL", &[1.0, 2.0]),
        ]);
        let payload = symbols_payload(&store);
        assert_eq!(payload["total_count"], 2);
        assert_eq!(payload["available_symbols"][0], "AAPL");
        assert_eq!(payload["available_symbols"][1], "MSFT");
    }
}
