// =============================================================================
// ChartSpecResolver — graph type + symbols → draw instructions
// =============================================================================
//
// Turns a request into a renderer-independent ChartSpec: an ordered list of
// DrawInstructions plus the shared date axis, per-axis bounds and a title.
// Everything here is pure — the renderer never touches the store and tests
// inspect specs without producing a single pixel.
//
// Multi-symbol overlays share one x axis built from the union of all bar
// dates; a symbol simply has `None` at dates it never traded (same alignment
// a dataframe join would produce). Values are never rescaled across symbols.

use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;

use crate::indicators::{self, IndicatorParams, IndicatorResult};
use crate::market_data::TimeSeriesStore;
use crate::types::{ChartError, GraphType, TimeSeries};

/// Most bars a candlestick chart will draw; older bars are cut off so bodies
/// stay wider than a pixel.
pub const MAX_CANDLES: usize = 1000;

/// Values drawn as horizontal guide lines on the RSI chart.
pub const RSI_GUIDES: [f64; 2] = [70.0, 30.0];

// =============================================================================
// Spec data model
// =============================================================================

/// Which value axis an instruction is plotted against. Axes present in a
/// spec become stacked panels at render time, in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AxisKind {
    Price,
    Oscillator,
    Volume,
}

/// The shape an instruction draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawKind {
    Line,
    Band,
    Bars,
    Candles,
}

/// A single vertical bar with its up/down color flag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignedBar {
    pub value: f64,
    /// Up-day (or non-negative histogram) bars get the bullish hue.
    pub up: bool,
}

/// One candlestick's raw prices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandleBar {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

/// Payload of a draw instruction, aligned index-for-index to the spec's
/// `x_dates`. `None` marks undefined entries the renderer must skip.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawData {
    Line(Vec<Option<f64>>),
    Band {
        upper: Vec<Option<f64>>,
        lower: Vec<Option<f64>>,
    },
    Bars(Vec<Option<SignedBar>>),
    Candles(Vec<Option<CandleBar>>),
}

/// One renderable layer of the chart.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawInstruction {
    pub label: String,
    /// Index into the static palette; stable per symbol position so repeated
    /// requests look identical.
    pub color: usize,
    pub axis: AxisKind,
    pub data: DrawData,
}

impl DrawInstruction {
    pub fn kind(&self) -> DrawKind {
        match self.data {
            DrawData::Line(_) => DrawKind::Line,
            DrawData::Band { .. } => DrawKind::Band,
            DrawData::Bars(_) => DrawKind::Bars,
            DrawData::Candles(_) => DrawKind::Candles,
        }
    }

    /// Number of defined data points (candles count one per bar).
    pub fn defined_points(&self) -> usize {
        match &self.data {
            DrawData::Line(v) => v.iter().flatten().count(),
            DrawData::Band { upper, .. } => upper.iter().flatten().count(),
            DrawData::Bars(v) => v.iter().flatten().count(),
            DrawData::Candles(v) => v.iter().flatten().count(),
        }
    }
}

/// Inclusive value range of one axis, margin already applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisBounds {
    pub min: f64,
    pub max: f64,
}

/// A dashed horizontal reference line (RSI 70/30).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GuideLine {
    pub value: f64,
    pub axis: AxisKind,
}

/// Complete description of one chart, built per request and discarded after
/// rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub title: String,
    pub x_dates: Vec<NaiveDate>,
    pub instructions: Vec<DrawInstruction>,
    pub guides: Vec<GuideLine>,
    /// Bounds per axis, in panel order (Price, Oscillator, Volume).
    pub axes: Vec<(AxisKind, AxisBounds)>,
}

// =============================================================================
// Resolution
// =============================================================================

/// Build the ChartSpec for a request.
///
/// Single-symbol chart kinds (candlestick, volume, SMA/EMA) use the first
/// symbol and ignore the rest; Bollinger instead *rejects* more than one
/// symbol — overlaid bands from different symbols are visually ambiguous, so
/// the restriction is deliberate.
///
/// # Errors
/// Propagates `SymbolNotFound` / `InsufficientData` from the store and the
/// indicator engine; fails with `EmptyChart` when no symbols were given and
/// `UnsupportedMultiSymbol` per the Bollinger rule above.
pub fn resolve_chart_spec(
    store: &TimeSeriesStore,
    symbols: &[String],
    graph_type: GraphType,
    params: &IndicatorParams,
) -> Result<ChartSpec, ChartError> {
    if symbols.is_empty() {
        return Err(ChartError::EmptyChart);
    }
    if graph_type == GraphType::BollingerBands && symbols.len() > 1 {
        return Err(ChartError::UnsupportedMultiSymbol(graph_type));
    }

    let symbols: Vec<String> = if graph_type.supports_multi_symbol() {
        symbols.to_vec()
    } else {
        vec![symbols[0].clone()]
    };

    let mut series = Vec::with_capacity(symbols.len());
    for symbol in &symbols {
        series.push(store.get(symbol)?);
    }

    let mut spec = match graph_type {
        GraphType::Candlestick => candlestick_spec(&series[0]),
        GraphType::Trading => volume_spec(&series[0]),
        _ => indicator_spec(&series, graph_type, params)?,
    };

    if spec.instructions.is_empty() {
        return Err(ChartError::EmptyChart);
    }

    spec.axes = axis_bounds(&spec);
    Ok(spec)
}

// -----------------------------------------------------------------------------
// Indicator charts
// -----------------------------------------------------------------------------

fn indicator_spec(
    series: &[std::sync::Arc<TimeSeries>],
    graph_type: GraphType,
    params: &IndicatorParams,
) -> Result<ChartSpec, ChartError> {
    let x_dates = union_dates(series);
    let mut instructions = Vec::new();
    let mut guides = Vec::new();

    for (idx, ts) in series.iter().enumerate() {
        let result = indicators::compute(ts, graph_type, params)?;
        push_symbol_instructions(
            &mut instructions,
            &x_dates,
            ts,
            idx,
            result,
            params,
            series.len() > 1,
        );
    }

    match graph_type {
        GraphType::Rsi => {
            for value in RSI_GUIDES {
                guides.push(GuideLine {
                    value,
                    axis: AxisKind::Oscillator,
                });
            }
        }
        // Oscillators centered on zero get a zero reference line.
        GraphType::DailyReturns | GraphType::Macd => {
            guides.push(GuideLine {
                value: 0.0,
                axis: AxisKind::Oscillator,
            });
        }
        _ => {}
    }

    Ok(ChartSpec {
        title: title_for(graph_type, series, params),
        x_dates,
        instructions,
        guides,
        axes: Vec::new(),
    })
}

/// Translate one symbol's IndicatorResult into draw instructions.
#[allow(clippy::too_many_arguments)]
fn push_symbol_instructions(
    out: &mut Vec<DrawInstruction>,
    x_dates: &[NaiveDate],
    ts: &TimeSeries,
    color: usize,
    result: IndicatorResult,
    params: &IndicatorParams,
    multi: bool,
) {
    let align = |values: &[Option<f64>]| align_to(x_dates, ts, values);
    let symbol = ts.symbol.as_str();

    match result {
        IndicatorResult::DailyReturns(v) => out.push(line(symbol, color, AxisKind::Oscillator, align(&v))),
        IndicatorResult::RollingMean(v) => out.push(line(symbol, color, AxisKind::Price, align(&v))),
        IndicatorResult::Rsi(v) => out.push(line(symbol, color, AxisKind::Oscillator, align(&v))),
        IndicatorResult::Drawdown(v) => out.push(line(symbol, color, AxisKind::Oscillator, align(&v))),
        IndicatorResult::BollingerBands { mean, upper, lower } => {
            let closes: Vec<Option<f64>> = ts.bars.iter().map(|b| Some(b.adj_close)).collect();
            out.push(line(&format!("{symbol} Price"), color, AxisKind::Price, align(&closes)));
            out.push(line(&format!("{symbol} SMA"), color + 1, AxisKind::Price, align(&mean)));
            out.push(DrawInstruction {
                label: format!("{symbol} Band"),
                color: color + 1,
                axis: AxisKind::Price,
                data: DrawData::Band {
                    upper: align(&upper),
                    lower: align(&lower),
                },
            });
        }
        IndicatorResult::Macd {
            macd,
            signal,
            histogram,
        } => {
            out.push(line(&format!("{symbol} MACD"), color * 2, AxisKind::Oscillator, align(&macd)));
            out.push(line(&format!("{symbol} Signal"), color * 2 + 1, AxisKind::Oscillator, align(&signal)));
            // Overlaid histograms from several symbols are unreadable; keep
            // the bars for the single-symbol case only.
            if !multi {
                let bars = align(&histogram)
                    .into_iter()
                    .map(|v| v.map(|value| SignedBar { value, up: value >= 0.0 }))
                    .collect();
                out.push(DrawInstruction {
                    label: format!("{symbol} Histogram"),
                    color: 0,
                    axis: AxisKind::Oscillator,
                    data: DrawData::Bars(bars),
                });
            }
        }
        IndicatorResult::SmaEma { sma, ema } => {
            let closes: Vec<Option<f64>> = ts.bars.iter().map(|b| Some(b.adj_close)).collect();
            out.push(line("Adjusted Close", 0, AxisKind::Price, align(&closes)));
            out.push(line(&format!("{}-Day SMA", params.sma_window), 1, AxisKind::Price, align(&sma)));
            out.push(line(&format!("{}-Day EMA", params.ema_window), 2, AxisKind::Price, align(&ema)));
        }
    }
}

fn line(label: &str, color: usize, axis: AxisKind, values: Vec<Option<f64>>) -> DrawInstruction {
    DrawInstruction {
        label: label.to_string(),
        color,
        axis,
        data: DrawData::Line(values),
    }
}

// -----------------------------------------------------------------------------
// Raw-bar charts
// -----------------------------------------------------------------------------

fn candlestick_spec(ts: &TimeSeries) -> ChartSpec {
    let start = ts.bars.len().saturating_sub(MAX_CANDLES);
    let bars = &ts.bars[start..];

    let x_dates: Vec<NaiveDate> = bars.iter().map(|b| b.date).collect();
    let candles: Vec<Option<CandleBar>> = bars
        .iter()
        .map(|b| {
            Some(CandleBar {
                open: b.open,
                high: b.high,
                low: b.low,
                close: b.close,
            })
        })
        .collect();
    let volume = volume_bars(bars);

    ChartSpec {
        title: format!("{} Candlestick Chart", ts.symbol),
        x_dates,
        instructions: vec![
            DrawInstruction {
                label: ts.symbol.clone(),
                color: 0,
                axis: AxisKind::Price,
                data: DrawData::Candles(candles),
            },
            DrawInstruction {
                label: "Volume".to_string(),
                color: 0,
                axis: AxisKind::Volume,
                data: DrawData::Bars(volume),
            },
        ],
        guides: Vec::new(),
        axes: Vec::new(),
    }
}

fn volume_spec(ts: &TimeSeries) -> ChartSpec {
    ChartSpec {
        title: format!("{} Trading Volume Over Time", ts.symbol),
        x_dates: ts.dates(),
        instructions: vec![DrawInstruction {
            label: format!("{} Volume", ts.symbol),
            color: 0,
            axis: AxisKind::Volume,
            data: DrawData::Bars(volume_bars(&ts.bars)),
        }],
        guides: Vec::new(),
        axes: Vec::new(),
    }
}

/// Volume bars colored by close-versus-prior-close direction. The first bar
/// has no prior close and counts as an up-day.
fn volume_bars(bars: &[crate::types::Bar]) -> Vec<Option<SignedBar>> {
    bars.iter()
        .enumerate()
        .map(|(i, b)| {
            let up = i == 0 || b.close >= bars[i - 1].close;
            Some(SignedBar {
                value: b.volume as f64,
                up,
            })
        })
        .collect()
}

// -----------------------------------------------------------------------------
// Axis alignment & bounds
// -----------------------------------------------------------------------------

/// Union of all bar dates across the requested series, ascending.
fn union_dates(series: &[std::sync::Arc<TimeSeries>]) -> Vec<NaiveDate> {
    let mut dates = BTreeSet::new();
    for ts in series {
        dates.extend(ts.bars.iter().map(|b| b.date));
    }
    dates.into_iter().collect()
}

/// Re-index a per-series value vector onto the shared date axis.
fn align_to(
    x_dates: &[NaiveDate],
    ts: &TimeSeries,
    values: &[Option<f64>],
) -> Vec<Option<f64>> {
    let by_date: HashMap<NaiveDate, Option<f64>> = ts
        .bars
        .iter()
        .map(|b| b.date)
        .zip(values.iter().copied())
        .collect();
    x_dates
        .iter()
        .map(|d| by_date.get(d).copied().flatten())
        .collect()
}

fn title_for(
    graph_type: GraphType,
    series: &[std::sync::Arc<TimeSeries>],
    params: &IndicatorParams,
) -> String {
    let symbols: Vec<&str> = series.iter().map(|ts| ts.symbol.as_str()).collect();
    let symbols = symbols.join(", ");
    match graph_type {
        GraphType::RollingMean => {
            format!("Rolling Mean ({}-day) - {symbols}", params.rolling_window)
        }
        GraphType::SmaEma => format!("{symbols} SMA and EMA"),
        _ => format!("{} - {symbols}", graph_type.title_name()),
    }
}

/// Compute `[min, max]` per axis over every finite value of every
/// instruction on that axis, then widen by a symmetric 5% margin so nothing
/// clips. Volume axes always include zero (bars grow from the baseline); a
/// degenerate flat range is padded by 5% of its magnitude so the renderer
/// always receives a non-empty interval.
fn axis_bounds(spec: &ChartSpec) -> Vec<(AxisKind, AxisBounds)> {
    let mut ranges: HashMap<AxisKind, (f64, f64)> = HashMap::new();

    let mut feed = |axis: AxisKind, v: f64| {
        if v.is_finite() {
            let entry = ranges.entry(axis).or_insert((f64::MAX, f64::MIN));
            entry.0 = entry.0.min(v);
            entry.1 = entry.1.max(v);
        }
    };

    for inst in &spec.instructions {
        match &inst.data {
            DrawData::Line(values) => {
                for v in values.iter().flatten() {
                    feed(inst.axis, *v);
                }
            }
            DrawData::Band { upper, lower } => {
                for v in upper.iter().chain(lower.iter()).flatten() {
                    feed(inst.axis, *v);
                }
            }
            DrawData::Bars(bars) => {
                feed(inst.axis, 0.0);
                for b in bars.iter().flatten() {
                    feed(inst.axis, b.value);
                }
            }
            DrawData::Candles(candles) => {
                for c in candles.iter().flatten() {
                    feed(inst.axis, c.low);
                    feed(inst.axis, c.high);
                }
            }
        }
    }
    for guide in &spec.guides {
        feed(guide.axis, guide.value);
    }

    let mut axes: Vec<(AxisKind, AxisBounds)> = ranges
        .into_iter()
        .map(|(axis, (min, max))| {
            let margin = if max > min {
                (max - min) * 0.05
            } else {
                max.abs().max(1.0) * 0.05
            };
            (
                axis,
                AxisBounds {
                    min: min - margin,
                    max: max + margin,
                },
            )
        })
        .collect();
    axes.sort_by_key(|(axis, _)| *axis);
    axes
}
