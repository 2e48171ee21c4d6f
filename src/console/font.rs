//! Console Glyph Rendering
//!
//! Renders terminal cells into the pixel buffer from the built-in 8x8
//! bitmap font, doubled to 16x16 pixel cells. Characters outside the
//! font's coverage render as a blank cell in the background color.

use crate::framebuffer::{PixelBuffer, Point, Rgb};
use font8x8::{
    UnicodeFonts, BASIC_FONTS, BLOCK_FONTS, BOX_FONTS, GREEK_FONTS, HIRAGANA_FONTS, LATIN_FONTS,
    MISC_FONTS,
};

/// Cell width in pixels
pub const GLYPH_WIDTH: u16 = 16;
/// Cell height in pixels
pub const GLYPH_HEIGHT: u16 = 16;

/// Look up the 8x8 bitmap for a character. Each byte is one row, least
/// significant bit leftmost. Uncovered characters get a blank bitmap.
pub fn glyph(ch: char) -> [u8; 8] {
    BASIC_FONTS
        .get(ch)
        .or_else(|| LATIN_FONTS.get(ch))
        .or_else(|| BOX_FONTS.get(ch))
        .or_else(|| BLOCK_FONTS.get(ch))
        .or_else(|| GREEK_FONTS.get(ch))
        .or_else(|| HIRAGANA_FONTS.get(ch))
        .or_else(|| MISC_FONTS.get(ch))
        .unwrap_or([0; 8])
}

/// Draw one cell at `origin`, `cells` columns wide (1 or 2).
///
/// The glyph is doubled to 16x16 and centered when the cell is wide; the
/// remainder is filled with the background color.
pub fn draw_cell(
    buffer: &mut PixelBuffer,
    origin: Point,
    ch: char,
    cells: u16,
    fg: Rgb,
    bg: Rgb,
) {
    let cell_width = GLYPH_WIDTH * cells.max(1);
    for dy in 0..GLYPH_HEIGHT {
        for dx in 0..cell_width {
            buffer.set_pixel(origin.x + dx, origin.y + dy, bg);
        }
    }

    let bitmap = glyph(ch);
    // Center a single-width glyph inside a wide cell
    let x_off = (cell_width - GLYPH_WIDTH) / 2;
    for (row, bits) in bitmap.iter().enumerate() {
        for col in 0..8u16 {
            if bits >> col & 1 == 0 {
                continue;
            }
            let x = origin.x + x_off + col * 2;
            let y = origin.y + row as u16 * 2;
            buffer.set_pixel(x, y, fg);
            buffer.set_pixel(x + 1, y, fg);
            buffer.set_pixel(x, y + 1, fg);
            buffer.set_pixel(x + 1, y + 1, fg);
        }
    }
}
