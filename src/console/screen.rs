//! Console Screen Cache
//!
//! Caches the rendered state of every terminal cell so each feed of
//! output bytes produces a minimal set of dirty row spans instead of a
//! full-screen repaint. The cache diffs against the terminal emulator's
//! screen snapshot; color resolution and cursor inversion happen here so
//! the renderer only ever draws [`Cell`] values.

use crate::framebuffer::Rgb;

/// The standard 16-color terminal palette (xterm defaults).
pub const PALETTE: [Rgb; 16] = [
    Rgb::new(0, 0, 0),
    Rgb::new(205, 0, 0),
    Rgb::new(0, 205, 0),
    Rgb::new(205, 205, 0),
    Rgb::new(0, 0, 238),
    Rgb::new(205, 0, 205),
    Rgb::new(0, 205, 205),
    Rgb::new(229, 229, 229),
    Rgb::new(127, 127, 127),
    Rgb::new(255, 0, 0),
    Rgb::new(0, 255, 0),
    Rgb::new(255, 255, 0),
    Rgb::new(92, 92, 255),
    Rgb::new(255, 0, 255),
    Rgb::new(0, 255, 255),
    Rgb::new(255, 255, 255),
];

/// Resolve an emulator color to a concrete RGB value.
pub fn resolve_color(color: vt100::Color, default: Rgb) -> Rgb {
    match color {
        vt100::Color::Default => default,
        vt100::Color::Idx(i) if i < 16 => PALETTE[i as usize],
        vt100::Color::Idx(i) if i < 232 => {
            // 6x6x6 color cube
            let i = i - 16;
            let scale = |v: u8| if v == 0 { 0 } else { v * 40 + 55 };
            Rgb::new(scale(i / 36), scale(i / 6 % 6), scale(i % 6))
        }
        vt100::Color::Idx(i) => {
            // grayscale ramp
            let gray = (i - 232) * 10 + 8;
            Rgb::new(gray, gray, gray)
        }
        vt100::Color::Rgb(r, g, b) => Rgb::new(r, g, b),
    }
}

/// One rendered cell. Wide characters occupy the cell that starts them
/// plus a continuation cell marked with NUL, which the renderer skips.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    /// Character to draw; NUL marks a wide-character continuation
    pub ch: char,
    /// True if the character spans this cell and the next
    pub wide: bool,
    /// Foreground color
    pub fg: Rgb,
    /// Background color
    pub bg: Rgb,
}

impl Cell {
    fn blank(fg: Rgb, bg: Rgb) -> Self {
        Self {
            ch: ' ',
            wide: false,
            fg,
            bg,
        }
    }
}

/// A contiguous run of changed cells within one row; columns half-open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowSpan {
    /// Row index
    pub row: u16,
    /// First changed column
    pub start: u16,
    /// One past the last changed column
    pub end: u16,
}

/// The cached cell grid.
#[derive(Debug)]
pub struct CellGrid {
    rows: u16,
    cols: u16,
    cells: Vec<Cell>,
}

impl CellGrid {
    /// Create a grid of blank cells.
    pub fn new(rows: u16, cols: u16, fg: Rgb, bg: Rgb) -> Self {
        Self {
            rows,
            cols,
            cells: vec![Cell::blank(fg, bg); rows as usize * cols as usize],
        }
    }

    /// Grid height in cells
    pub fn rows(&self) -> u16 {
        self.rows
    }

    /// Grid width in cells
    pub fn cols(&self) -> u16 {
        self.cols
    }

    /// The cached cell at a position.
    pub fn cell(&self, row: u16, col: u16) -> &Cell {
        &self.cells[row as usize * self.cols as usize + col as usize]
    }

    /// Diff the cache against an emulator screen snapshot, replacing
    /// changed cells and returning one dirty span per changed row.
    ///
    /// The cursor cell is rendered inverted while the cursor is visible,
    /// so cursor movement alone dirties the cells it leaves and enters.
    pub fn update(
        &mut self,
        screen: &vt100::Screen,
        default_fg: Rgb,
        default_bg: Rgb,
    ) -> Vec<RowSpan> {
        let cursor = if screen.hide_cursor() {
            None
        } else {
            Some(screen.cursor_position())
        };

        let mut spans = Vec::new();
        for row in 0..self.rows {
            let mut dirty: Option<(u16, u16)> = None;
            for col in 0..self.cols {
                let mut cell = match screen.cell(row, col) {
                    Some(c) => cell_from(c, default_fg, default_bg),
                    None => Cell::blank(default_fg, default_bg),
                };
                if cursor == Some((row, col)) {
                    std::mem::swap(&mut cell.fg, &mut cell.bg);
                }

                let idx = row as usize * self.cols as usize + col as usize;
                if self.cells[idx] != cell {
                    self.cells[idx] = cell;
                    dirty = Some(match dirty {
                        None => (col, col + 1),
                        Some((start, _)) => (start, col + 1),
                    });
                }
            }
            if let Some((start, end)) = dirty {
                spans.push(RowSpan { row, start, end });
            }
        }
        spans
    }
}

fn cell_from(cell: &vt100::Cell, default_fg: Rgb, default_bg: Rgb) -> Cell {
    if cell.is_wide_continuation() {
        return Cell {
            ch: '\0',
            wide: false,
            fg: resolve_color(cell.fgcolor(), default_fg),
            bg: resolve_color(cell.bgcolor(), default_bg),
        };
    }

    let ch = cell.contents().chars().next().unwrap_or(' ');
    let mut fg = cell.fgcolor();
    // Bold brightens the base palette, as xterm does
    if cell.bold() {
        if let vt100::Color::Idx(i) = fg {
            if i < 8 {
                fg = vt100::Color::Idx(i + 8);
            }
        }
    }

    let (mut fg, mut bg) = (
        resolve_color(fg, default_fg),
        resolve_color(cell.bgcolor(), default_bg),
    );
    if cell.inverse() {
        std::mem::swap(&mut fg, &mut bg);
    }

    Cell {
        ch,
        wide: cell.is_wide(),
        fg,
        bg,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FG: Rgb = Rgb::BLACK;
    const BG: Rgb = Rgb::WHITE;

    fn parser(rows: u16, cols: u16) -> vt100::Parser {
        vt100::Parser::new(rows, cols, 0)
    }

    #[test]
    fn test_resolve_palette_and_cube() {
        assert_eq!(resolve_color(vt100::Color::Default, BG), BG);
        assert_eq!(resolve_color(vt100::Color::Idx(1), BG), Rgb::new(205, 0, 0));
        // Cube corner 16 is black, 231 is white
        assert_eq!(resolve_color(vt100::Color::Idx(16), BG), Rgb::new(0, 0, 0));
        assert_eq!(resolve_color(vt100::Color::Idx(231), BG), Rgb::new(255, 255, 255));
        // Grayscale ramp
        assert_eq!(resolve_color(vt100::Color::Idx(232), BG), Rgb::new(8, 8, 8));
        assert_eq!(resolve_color(vt100::Color::Rgb(1, 2, 3), BG), Rgb::new(1, 2, 3));
    }

    #[test]
    fn test_update_reports_changed_cells_only() {
        let mut p = parser(4, 10);
        let mut grid = CellGrid::new(4, 10, FG, BG);

        // Hide the cursor so only the text dirties cells
        p.process(b"\x1b[?25lhi");
        let spans = grid.update(p.screen(), FG, BG);
        assert_eq!(spans, vec![RowSpan { row: 0, start: 0, end: 2 }]);
        assert_eq!(grid.cell(0, 0).ch, 'h');
        assert_eq!(grid.cell(0, 1).ch, 'i');

        // No further output: nothing is dirty
        assert!(grid.update(p.screen(), FG, BG).is_empty());
    }

    #[test]
    fn test_cursor_movement_dirties_cells() {
        let mut p = parser(4, 10);
        let mut grid = CellGrid::new(4, 10, FG, BG);
        grid.update(p.screen(), FG, BG);

        // Move the visible cursor: the old and new cells repaint
        p.process(b"\x1b[2;3H");
        let spans = grid.update(p.screen(), FG, BG);
        assert_eq!(spans.len(), 2);
        // Cursor cell is drawn inverted
        assert_eq!(grid.cell(1, 2).fg, BG);
        assert_eq!(grid.cell(1, 2).bg, FG);
    }

    #[test]
    fn test_colors_and_inverse() {
        let mut p = parser(2, 10);
        let mut grid = CellGrid::new(2, 10, FG, BG);

        p.process(b"\x1b[?25l\x1b[31mr\x1b[7mx\x1b[0m");
        grid.update(p.screen(), FG, BG);
        assert_eq!(grid.cell(0, 0).fg, Rgb::new(205, 0, 0));
        // Inverse swaps the pair
        assert_eq!(grid.cell(0, 1).fg, BG);
        assert_eq!(grid.cell(0, 1).bg, Rgb::new(205, 0, 0));
    }

    #[test]
    fn test_wide_character_marks_continuation() {
        let mut p = parser(2, 10);
        let mut grid = CellGrid::new(2, 10, FG, BG);

        p.process("\x1b[?25l中".as_bytes());
        grid.update(p.screen(), FG, BG);
        assert!(grid.cell(0, 0).wide);
        assert_eq!(grid.cell(0, 0).ch, '中');
        assert_eq!(grid.cell(0, 1).ch, '\0');
    }

    #[test]
    fn test_bold_brightens_palette() {
        let mut p = parser(2, 10);
        let mut grid = CellGrid::new(2, 10, FG, BG);

        p.process(b"\x1b[?25l\x1b[1;31mb");
        grid.update(p.screen(), FG, BG);
        assert_eq!(grid.cell(0, 0).fg, PALETTE[9]);
    }
}
