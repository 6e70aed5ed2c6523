// =============================================================================
// ChartRenderer — ChartSpec → PNG
// =============================================================================
//
// Projects draw instructions onto stacked panels (price on top, then
// oscillator, then volume — whichever axes the spec carries) and rasterizes
// them onto a Canvas. Rendering is deterministic: identical spec and canvas
// size produce identical bytes, with no timestamps or randomness anywhere in
// the pixel data.
//
// Undefined entries are skipped, never interpolated: a line whose window is
// still warming up simply starts further right, and an interior gap breaks
// the line.

use crate::chart::canvas::Canvas;
use crate::chart::palette::{
    self, bar_color, series_color, AXIS_COLOR, BACKGROUND, GRID_COLOR, GUIDE_COLOR, TEXT_COLOR,
};
use crate::chart::spec::{AxisBounds, AxisKind, ChartSpec, DrawData, DrawInstruction};
use crate::types::{ChartError, RenderedImage};

const MARGIN_LEFT: u32 = 72;
const MARGIN_RIGHT: u32 = 16;
const MARGIN_TOP: u32 = 34;
const MARGIN_BOTTOM: u32 = 42;
const PANEL_GAP: u32 = 10;
const MIN_WIDTH: u32 = 160;
const MIN_HEIGHT: u32 = 120;

/// Opacity of shaded Bollinger bands.
const BAND_ALPHA: f64 = 0.2;

/// Render `spec` onto a `width` x `height` PNG.
///
/// # Errors
/// - [`ChartError::EmptyChart`] when the spec has nothing drawable.
/// - [`ChartError::RenderFailure`] for an unusable canvas size or an
///   encoding failure.
pub fn render(spec: &ChartSpec, width: u32, height: u32) -> Result<RenderedImage, ChartError> {
    if spec.instructions.is_empty() || spec.axes.is_empty() || spec.x_dates.is_empty() {
        return Err(ChartError::EmptyChart);
    }
    if width < MIN_WIDTH || height < MIN_HEIGHT {
        return Err(ChartError::RenderFailure(format!(
            "canvas {width}x{height} below minimum {MIN_WIDTH}x{MIN_HEIGHT}"
        )));
    }

    let mut canvas = Canvas::new(width, height, BACKGROUND);

    draw_title(&mut canvas, &spec.title, width);

    let panels = layout_panels(spec, width, height);
    for panel in &panels {
        draw_panel_frame(&mut canvas, panel);
        for inst in spec.instructions.iter().filter(|i| i.axis == panel.axis) {
            draw_instruction(&mut canvas, panel, inst, spec.x_dates.len());
        }
        for guide in spec.guides.iter().filter(|g| g.axis == panel.axis) {
            let y = panel.y_at(guide.value);
            canvas.dashed_hline(panel.x0 as f64, panel.x1 as f64, y, GUIDE_COLOR);
        }
    }

    // Date labels belong to the bottom panel only; legend sits in the top one.
    if let Some(bottom) = panels.last() {
        draw_date_labels(&mut canvas, bottom, spec);
    }
    if let Some(top) = panels.first() {
        draw_legend(&mut canvas, top, &spec.instructions);
    }

    Ok(RenderedImage {
        bytes: canvas.into_png()?,
        mime: "image/png",
        width,
        height,
    })
}

// =============================================================================
// Layout
// =============================================================================

/// One stacked plotting area with its value projection.
struct Panel {
    axis: AxisKind,
    bounds: AxisBounds,
    x0: u32,
    y0: u32,
    x1: u32,
    y1: u32,
}

impl Panel {
    /// Horizontal center of data slot `i` out of `n`.
    fn x_at(&self, i: usize, n: usize) -> f64 {
        let slot = (self.x1 - self.x0) as f64 / n as f64;
        self.x0 as f64 + slot * (i as f64 + 0.5)
    }

    /// Half the width a bar or candle body may occupy.
    fn half_slot(&self, n: usize) -> f64 {
        let slot = (self.x1 - self.x0) as f64 / n as f64;
        (slot * 0.4).max(0.5)
    }

    /// Vertical pixel for a data value; bounds guarantee a non-empty range.
    fn y_at(&self, value: f64) -> f64 {
        let span = self.bounds.max - self.bounds.min;
        let frac = (value - self.bounds.min) / span;
        self.y1 as f64 - frac * (self.y1 - self.y0) as f64
    }

    /// y of the zero baseline, clamped into the panel for bar charts.
    fn baseline(&self) -> f64 {
        self.y_at(0.0)
            .clamp(self.y0 as f64, self.y1 as f64)
    }
}

/// Split the plotting area into one panel per axis. The volume panel of a
/// candlestick chart gets a third of the height; equal split otherwise.
fn layout_panels(spec: &ChartSpec, width: u32, height: u32) -> Vec<Panel> {
    let weights: Vec<u32> = spec
        .axes
        .iter()
        .map(|(axis, _)| match axis {
            AxisKind::Volume if spec.axes.len() > 1 => 1,
            _ => 3,
        })
        .collect();
    let total: u32 = weights.iter().sum();

    let plot_h = height - MARGIN_TOP - MARGIN_BOTTOM - PANEL_GAP * (spec.axes.len() as u32 - 1);
    let x0 = MARGIN_LEFT;
    let x1 = width - MARGIN_RIGHT;

    let mut panels = Vec::with_capacity(spec.axes.len());
    let mut y = MARGIN_TOP;
    for ((axis, bounds), w) in spec.axes.iter().zip(weights) {
        let h = plot_h * w / total;
        panels.push(Panel {
            axis: *axis,
            bounds: *bounds,
            x0,
            y0: y,
            x1,
            y1: y + h,
        });
        y += h + PANEL_GAP;
    }
    panels
}

// =============================================================================
// Chrome
// =============================================================================

fn draw_title(canvas: &mut Canvas, title: &str, width: u32) {
    let scale = 2;
    let tw = Canvas::text_width(title, scale) as i64;
    let x = ((width as i64 - tw) / 2).max(2) as f64;
    canvas.text(x, 8.0, title, TEXT_COLOR, scale);
}

fn draw_panel_frame(canvas: &mut Canvas, panel: &Panel) {
    canvas.rect(
        panel.x0 as f64,
        panel.y0 as f64,
        panel.x1 as f64,
        panel.y1 as f64,
        AXIS_COLOR,
    );

    // Five horizontal gridlines with value labels in the left margin.
    let ticks = 5;
    for t in 0..=ticks {
        let frac = t as f64 / ticks as f64;
        let value = panel.bounds.min + (panel.bounds.max - panel.bounds.min) * frac;
        let y = panel.y_at(value);
        if t > 0 && t < ticks {
            canvas.hline(panel.x0 as f64 + 1.0, panel.x1 as f64 - 1.0, y, GRID_COLOR);
        }
        let label = format_value(value);
        let lw = Canvas::text_width(&label, 1) as f64;
        canvas.text(
            panel.x0 as f64 - lw - 6.0,
            y - 3.0,
            &label,
            TEXT_COLOR,
            1,
        );
    }
}

fn draw_date_labels(canvas: &mut Canvas, panel: &Panel, spec: &ChartSpec) {
    let n = spec.x_dates.len();
    let label_w = Canvas::text_width("2024-01-02", 1) as f64;
    let max_labels = (((panel.x1 - panel.x0) as f64 / (label_w + 14.0)) as usize).max(2);
    let count = max_labels.min(n);

    for t in 0..count {
        // Spread evenly, first and last date always present.
        let i = if count == 1 { 0 } else { t * (n - 1) / (count - 1) };
        let x = panel.x_at(i, n);
        let label = spec.x_dates[i].format("%Y-%m-%d").to_string();
        let lw = Canvas::text_width(&label, 1) as f64;
        canvas.vline(x, panel.y1 as f64, panel.y1 as f64 + 4.0, AXIS_COLOR);
        canvas.text(x - lw / 2.0, panel.y1 as f64 + 8.0, &label, TEXT_COLOR, 1);
    }
}

fn draw_legend(canvas: &mut Canvas, panel: &Panel, instructions: &[DrawInstruction]) {
    let x = panel.x0 as f64 + 8.0;
    let mut y = panel.y0 as f64 + 6.0;
    for inst in instructions {
        let color = match &inst.data {
            DrawData::Line(_) | DrawData::Band { .. } => series_color(inst.color),
            DrawData::Bars(_) | DrawData::Candles(_) => palette::UP_COLOR,
        };
        canvas.fill_rect(x, y + 2.0, x + 10.0, y + 4.0, color);
        canvas.text(x + 16.0, y, &inst.label, TEXT_COLOR, 1);
        y += 12.0;
    }
}

/// Compact value labels: thousands/millions/billions get a suffix, small
/// magnitudes keep three decimals.
fn format_value(v: f64) -> String {
    let a = v.abs();
    if a >= 1e9 {
        format!("{:.1}B", v / 1e9)
    } else if a >= 1e6 {
        format!("{:.1}M", v / 1e6)
    } else if a >= 1e3 {
        format!("{:.1}k", v / 1e3)
    } else if a >= 10.0 {
        format!("{v:.1}")
    } else {
        format!("{v:.3}")
    }
}

// =============================================================================
// Instructions
// =============================================================================

fn draw_instruction(canvas: &mut Canvas, panel: &Panel, inst: &DrawInstruction, n: usize) {
    match &inst.data {
        DrawData::Line(values) => draw_line(canvas, panel, values, n, series_color(inst.color)),
        DrawData::Band { upper, lower } => {
            draw_band(canvas, panel, upper, lower, n, series_color(inst.color))
        }
        DrawData::Bars(bars) => {
            let baseline = panel.baseline();
            let half = panel.half_slot(n);
            for (i, bar) in bars.iter().enumerate() {
                let Some(bar) = bar else { continue };
                let x = panel.x_at(i, n);
                let y = panel.y_at(bar.value);
                canvas.fill_rect(x - half, baseline, x + half, y, bar_color(bar.up));
            }
        }
        DrawData::Candles(candles) => {
            let half = panel.half_slot(n);
            for (i, candle) in candles.iter().enumerate() {
                let Some(c) = candle else { continue };
                let x = panel.x_at(i, n);
                let color = bar_color(c.close >= c.open);
                canvas.vline(x, panel.y_at(c.low), panel.y_at(c.high), color);
                let (top, bottom) = (panel.y_at(c.open.max(c.close)), panel.y_at(c.open.min(c.close)));
                canvas.fill_rect(x - half, top, x + half, bottom, color);
            }
        }
    }
}

/// Polyline over the defined entries. Only adjacent defined pairs get a
/// segment; an isolated point becomes a single dot.
fn draw_line(
    canvas: &mut Canvas,
    panel: &Panel,
    values: &[Option<f64>],
    n: usize,
    color: palette::Rgb,
) {
    for i in 0..values.len() {
        let Some(v) = values[i] else { continue };
        let x = panel.x_at(i, n);
        let y = panel.y_at(v);

        let prev_defined = i > 0 && values[i - 1].is_some();
        let next = values.get(i + 1).copied().flatten();
        if !prev_defined && next.is_none() {
            canvas.set(x.round() as i64, y.round() as i64, color);
        }
        if let Some(nv) = next {
            let nx = panel.x_at(i + 1, n);
            let ny = panel.y_at(nv);
            canvas.line(x, y, nx, ny, color);
        }
    }
}

/// Shaded region between the upper and lower sequences, blended over
/// whatever is already drawn. Gaps in either sequence break the shading.
fn draw_band(
    canvas: &mut Canvas,
    panel: &Panel,
    upper: &[Option<f64>],
    lower: &[Option<f64>],
    n: usize,
    color: palette::Rgb,
) {
    let len = upper.len().min(lower.len());
    for i in 0..len.saturating_sub(1) {
        let (Some(u0), Some(l0), Some(u1), Some(l1)) =
            (upper[i], lower[i], upper[i + 1], lower[i + 1])
        else {
            continue;
        };
        let x0 = panel.x_at(i, n);
        let x1 = panel.x_at(i + 1, n);
        let cols = (x1.round() as i64 - x0.round() as i64).max(1);
        for c in 0..cols {
            let frac = c as f64 / cols as f64;
            let x = x0 + (x1 - x0) * frac;
            let yu = panel.y_at(u0 + (u1 - u0) * frac);
            let yl = panel.y_at(l0 + (l1 - l0) * frac);
            canvas.blend_vspan(x, yu, yl, color, BAND_ALPHA);
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::spec::resolve_chart_spec;
    use crate::indicators::test_util::series_from_closes;
    use crate::indicators::IndicatorParams;
    use crate::market_data::TimeSeriesStore;
    use crate::types::GraphType;

    fn demo_store() -> TimeSeriesStore {
        let closes: Vec<f64> = (1..=60)
            .map(|i| 100.0 + (i as f64 * 0.3).sin() * 10.0 + i as f64 * 0.2)
            .collect();
        TimeSeriesStore::from_series(vec![
            series_from_closes("AAPL", &closes),
            series_from_closes("MSFT", &closes.iter().map(|c| c * 1.5).collect::<Vec<_>>()),
        ])
    }

    fn spec_for(kind: GraphType, symbols: &[&str]) -> ChartSpec {
        let store = demo_store();
        let symbols: Vec<String> = symbols.iter().map(|s| s.to_string()).collect();
        resolve_chart_spec(&store, &symbols, kind, &IndicatorParams::default()).unwrap()
    }

    #[test]
    fn render_produces_png() {
        for kind in [
            GraphType::DailyReturns,
            GraphType::RollingMean,
            GraphType::Rsi,
            GraphType::Macd,
            GraphType::SmaEma,
            GraphType::Drawdown,
        ] {
            let spec = spec_for(kind, &["AAPL"]);
            let img = render(&spec, 1000, 500).unwrap();
            assert_eq!(img.mime, "image/png");
            assert_eq!((img.width, img.height), (1000, 500));
            assert_eq!(&img.bytes[..4], &[0x89, b'P', b'N', b'G']);
        }
    }

    #[test]
    fn render_bollinger_and_raw_charts() {
        for kind in [GraphType::BollingerBands, GraphType::Candlestick, GraphType::Trading] {
            let spec = spec_for(kind, &["AAPL"]);
            let img = render(&spec, 1000, 500).unwrap();
            assert!(!img.bytes.is_empty());
        }
    }

    #[test]
    fn render_is_deterministic() {
        let spec = spec_for(GraphType::RollingMean, &["AAPL", "MSFT"]);
        let a = render(&spec, 800, 400).unwrap();
        let b = render(&spec, 800, 400).unwrap();
        assert_eq!(a.bytes, b.bytes);
    }

    #[test]
    fn render_rejects_tiny_canvas() {
        let spec = spec_for(GraphType::RollingMean, &["AAPL"]);
        let err = render(&spec, 10, 10).unwrap_err();
        assert!(matches!(err, ChartError::RenderFailure(_)));
    }

    #[test]
    fn render_rejects_empty_spec() {
        let mut spec = spec_for(GraphType::RollingMean, &["AAPL"]);
        spec.instructions.clear();
        let err = render(&spec, 800, 400).unwrap_err();
        assert!(matches!(err, ChartError::EmptyChart));
    }

    #[test]
    fn candlestick_renders_two_panels() {
        // Smoke test: the stacked price + volume layout must not underflow
        // panel arithmetic at the default canvas size.
        let spec = spec_for(GraphType::Candlestick, &["AAPL"]);
        assert_eq!(spec.axes.len(), 2);
        render(&spec, 1000, 500).unwrap();
    }

    #[test]
    fn format_value_ranges() {
        assert_eq!(format_value(2_500_000_000.0), "2.5B");
        assert_eq!(format_value(1_500_000.0), "1.5M");
        assert_eq!(format_value(12_000.0), "12.0k");
        assert_eq!(format_value(42.1234), "42.1");
        assert_eq!(format_value(0.1234), "0.123");
    }
}
