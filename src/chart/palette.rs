// =============================================================================
// Color Palette
// =============================================================================
//
// Static mapping from instruction color index to RGB, cycled modulo the
// table length. The table is the matplotlib "tab10" cycle so the Rust
// renderer produces the same hues per symbol position as the charts it
// replaced, and repeated requests are visually identical.

/// 24-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

/// The tab10 cycle: blue, orange, green, red, purple, brown, pink, gray,
/// olive, cyan.
pub const SERIES_COLORS: [Rgb; 10] = [
    Rgb(0x1f, 0x77, 0xb4),
    Rgb(0xff, 0x7f, 0x0e),
    Rgb(0x2c, 0xa0, 0x2c),
    Rgb(0xd6, 0x27, 0x28),
    Rgb(0x94, 0x67, 0xbd),
    Rgb(0x8c, 0x56, 0x4b),
    Rgb(0xe3, 0x77, 0xc2),
    Rgb(0x7f, 0x7f, 0x7f),
    Rgb(0xbc, 0xbd, 0x22),
    Rgb(0x17, 0xbe, 0xcf),
];

/// Bullish candles / up-day volume / positive histogram bars.
pub const UP_COLOR: Rgb = Rgb(0x2c, 0xa0, 0x2c);
/// Bearish candles / down-day volume / negative histogram bars.
pub const DOWN_COLOR: Rgb = Rgb(0xd6, 0x27, 0x28);

pub const BACKGROUND: Rgb = Rgb(0xff, 0xff, 0xff);
pub const AXIS_COLOR: Rgb = Rgb(0x33, 0x33, 0x33);
pub const GRID_COLOR: Rgb = Rgb(0xdd, 0xdd, 0xdd);
pub const TEXT_COLOR: Rgb = Rgb(0x22, 0x22, 0x22);
pub const GUIDE_COLOR: Rgb = Rgb(0xd6, 0x27, 0x28);

/// Color for a series by its palette index, cycling past the table end.
pub fn series_color(index: usize) -> Rgb {
    SERIES_COLORS[index % SERIES_COLORS.len()]
}

/// Color for a signed bar.
pub fn bar_color(up: bool) -> Rgb {
    if up {
        UP_COLOR
    } else {
        DOWN_COLOR
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_cycles() {
        assert_eq!(series_color(0), series_color(10));
        assert_eq!(series_color(3), series_color(13));
    }

    #[test]
    fn first_color_is_tab_blue() {
        assert_eq!(series_color(0), Rgb(0x1f, 0x77, 0xb4));
    }

    #[test]
    fn up_down_colors_differ() {
        assert_ne!(bar_color(true), bar_color(false));
    }
}
