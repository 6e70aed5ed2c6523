// =============================================================================
// Canvas — in-memory RGB framebuffer with drawing primitives
// =============================================================================
//
// A plain width*height*3 byte buffer plus the handful of primitives the
// chart renderer needs: Bresenham lines, filled/blended rectangles, dashed
// horizontal rules and 5x7 bitmap text. Coordinates are f64 so callers can
// pass projected data positions directly; everything clips at the edges
// instead of panicking.

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};

use crate::chart::font;
use crate::chart::palette::Rgb;
use crate::types::ChartError;

pub struct Canvas {
    width: u32,
    height: u32,
    buf: Vec<u8>,
}

impl Canvas {
    /// Allocate a canvas cleared to `background`.
    pub fn new(width: u32, height: u32, background: Rgb) -> Self {
        let mut buf = vec![0u8; width as usize * height as usize * 3];
        for px in buf.chunks_exact_mut(3) {
            px.copy_from_slice(&[background.0, background.1, background.2]);
        }
        Self { width, height, buf }
    }

    pub fn set(&mut self, x: i64, y: i64, color: Rgb) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 3;
        self.buf[idx] = color.0;
        self.buf[idx + 1] = color.1;
        self.buf[idx + 2] = color.2;
    }

    /// Alpha-blend one pixel toward `color` (`alpha` in [0, 1]).
    pub fn blend(&mut self, x: i64, y: i64, color: Rgb, alpha: f64) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 3;
        let mix = |old: u8, new: u8| -> u8 {
            (old as f64 * (1.0 - alpha) + new as f64 * alpha).round() as u8
        };
        self.buf[idx] = mix(self.buf[idx], color.0);
        self.buf[idx + 1] = mix(self.buf[idx + 1], color.1);
        self.buf[idx + 2] = mix(self.buf[idx + 2], color.2);
    }

    /// Bresenham line between two points, inclusive.
    pub fn line(&mut self, x0: f64, y0: f64, x1: f64, y1: f64, color: Rgb) {
        let (mut x0, mut y0) = (x0.round() as i64, y0.round() as i64);
        let (x1, y1) = (x1.round() as i64, y1.round() as i64);

        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;

        loop {
            self.set(x0, y0, color);
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }

    pub fn hline(&mut self, x0: f64, x1: f64, y: f64, color: Rgb) {
        self.line(x0, y, x1, y, color);
    }

    pub fn vline(&mut self, x: f64, y0: f64, y1: f64, color: Rgb) {
        self.line(x, y0, x, y1, color);
    }

    /// Dashed horizontal rule (4 px on, 4 px off).
    pub fn dashed_hline(&mut self, x0: f64, x1: f64, y: f64, color: Rgb) {
        let (lo, hi) = if x0 <= x1 { (x0, x1) } else { (x1, x0) };
        let y = y.round() as i64;
        let mut x = lo.round() as i64;
        let end = hi.round() as i64;
        while x <= end {
            for i in 0..4 {
                if x + i <= end {
                    self.set(x + i, y, color);
                }
            }
            x += 8;
        }
    }

    /// Filled axis-aligned rectangle; corners may arrive in any order.
    pub fn fill_rect(&mut self, x0: f64, y0: f64, x1: f64, y1: f64, color: Rgb) {
        let (xa, xb) = order(x0, x1);
        let (ya, yb) = order(y0, y1);
        for y in ya..=yb {
            for x in xa..=xb {
                self.set(x, y, color);
            }
        }
    }

    /// Rectangle outline.
    pub fn rect(&mut self, x0: f64, y0: f64, x1: f64, y1: f64, color: Rgb) {
        self.hline(x0, x1, y0, color);
        self.hline(x0, x1, y1, color);
        self.vline(x0, y0, y1, color);
        self.vline(x1, y0, y1, color);
    }

    /// Blend a translucent vertical span — the building block for shaded
    /// bands.
    pub fn blend_vspan(&mut self, x: f64, y0: f64, y1: f64, color: Rgb, alpha: f64) {
        let x = x.round() as i64;
        let (ya, yb) = order(y0, y1);
        for y in ya..=yb {
            self.blend(x, y, color, alpha);
        }
    }

    /// Draw `text` with its top-left corner at (x, y) using the embedded
    /// 5x7 font at an integer `scale`.
    pub fn text(&mut self, x: f64, y: f64, text: &str, color: Rgb, scale: u32) {
        let scale = scale.max(1) as i64;
        let mut cx = x.round() as i64;
        let cy = y.round() as i64;
        for c in text.chars() {
            let rows = font::glyph(c);
            for (ry, row) in rows.iter().enumerate() {
                for gx in 0..font::GLYPH_WIDTH {
                    if row & (1 << (font::GLYPH_WIDTH - 1 - gx)) != 0 {
                        // One font dot becomes a scale x scale block.
                        for dy in 0..scale {
                            for dx in 0..scale {
                                self.set(
                                    cx + gx as i64 * scale + dx,
                                    cy + ry as i64 * scale + dy,
                                    color,
                                );
                            }
                        }
                    }
                }
            }
            cx += font::ADVANCE as i64 * scale;
        }
    }

    /// Pixel width of `text` at `scale`, matching [`Canvas::text`].
    pub fn text_width(text: &str, scale: u32) -> usize {
        font::text_width(text) * scale.max(1) as usize
    }

    /// Encode the framebuffer as a PNG.
    pub fn into_png(self) -> Result<Vec<u8>, ChartError> {
        let mut out = Vec::new();
        PngEncoder::new(&mut out)
            .write_image(&self.buf, self.width, self.height, ExtendedColorType::Rgb8)
            .map_err(|e| ChartError::RenderFailure(e.to_string()))?;
        Ok(out)
    }

    #[cfg(test)]
    fn pixel(&self, x: u32, y: u32) -> Rgb {
        let idx = (y as usize * self.width as usize + x as usize) * 3;
        Rgb(self.buf[idx], self.buf[idx + 1], self.buf[idx + 2])
    }
}

fn order(a: f64, b: f64) -> (i64, i64) {
    let (a, b) = (a.round() as i64, b.round() as i64);
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: Rgb = Rgb(255, 255, 255);
    const BLACK: Rgb = Rgb(0, 0, 0);

    #[test]
    fn new_canvas_is_background() {
        let c = Canvas::new(4, 4, WHITE);
        assert_eq!(c.pixel(0, 0), WHITE);
        assert_eq!(c.pixel(3, 3), WHITE);
    }

    #[test]
    fn set_and_clip() {
        let mut c = Canvas::new(4, 4, WHITE);
        c.set(1, 2, BLACK);
        assert_eq!(c.pixel(1, 2), BLACK);
        // Out-of-bounds writes are silently clipped.
        c.set(-1, 0, BLACK);
        c.set(10, 10, BLACK);
        assert_eq!(c.pixel(0, 0), WHITE);
    }

    #[test]
    fn horizontal_line_covers_span() {
        let mut c = Canvas::new(10, 3, WHITE);
        c.hline(2.0, 7.0, 1.0, BLACK);
        for x in 2..=7 {
            assert_eq!(c.pixel(x, 1), BLACK);
        }
        assert_eq!(c.pixel(1, 1), WHITE);
        assert_eq!(c.pixel(8, 1), WHITE);
    }

    #[test]
    fn diagonal_line_endpoints() {
        let mut c = Canvas::new(10, 10, WHITE);
        c.line(0.0, 0.0, 9.0, 9.0, BLACK);
        assert_eq!(c.pixel(0, 0), BLACK);
        assert_eq!(c.pixel(9, 9), BLACK);
        assert_eq!(c.pixel(5, 5), BLACK);
    }

    #[test]
    fn fill_rect_any_corner_order() {
        let mut c = Canvas::new(8, 8, WHITE);
        c.fill_rect(5.0, 6.0, 2.0, 3.0, BLACK);
        assert_eq!(c.pixel(2, 3), BLACK);
        assert_eq!(c.pixel(5, 6), BLACK);
        assert_eq!(c.pixel(1, 3), WHITE);
    }

    #[test]
    fn blend_moves_toward_color() {
        let mut c = Canvas::new(2, 2, WHITE);
        c.blend(0, 0, BLACK, 0.5);
        let Rgb(r, g, b) = c.pixel(0, 0);
        assert_eq!((r, g, b), (128, 128, 128));
    }

    #[test]
    fn text_marks_pixels() {
        let mut c = Canvas::new(20, 10, WHITE);
        c.text(0.0, 0.0, "A", BLACK, 1);
        let inked = (0..20)
            .flat_map(|x| (0..10).map(move |y| (x, y)))
            .filter(|&(x, y)| c.pixel(x, y) == BLACK)
            .count();
        assert!(inked > 0);
    }

    #[test]
    fn png_round_trip_header() {
        let c = Canvas::new(16, 8, WHITE);
        let png = c.into_png().unwrap();
        assert_eq!(&png[..8], &[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, 0x0a]);
    }
}
