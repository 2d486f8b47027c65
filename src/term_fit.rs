use crate::pixel_grid::PixelGrid;

pub const DEFAULT_COLS: usize = 80;
pub const DEFAULT_ROWS: usize = 24;

/// Character grid of the terminal this process renders into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalDimensions {
    pub cols: usize,
    pub rows: usize,
}

impl TerminalDimensions {
    /// Queried once per still render and once per video session. A failed
    /// query (no tty, CI) falls back to 80x24 instead of failing the run.
    pub fn detect() -> Self {
        match crossterm::terminal::size() {
            Ok((cols, rows)) => Self {
                cols: cols as usize,
                rows: rows as usize,
            },
            Err(_) => Self {
                cols: DEFAULT_COLS,
                rows: DEFAULT_ROWS,
            },
        }
    }
}

/// Scales a grid to the terminal with nearest-neighbor sampling.
///
/// The picture is sized against the vertical axis first: one row stays
/// reserved for the prompt, and width follows from the source aspect
/// ratio. Each pixel prints as two columns, so the horizontal budget is
/// `cols / 2`; when that clamps the width, the height is rescaled with
/// integer math on top of the earlier truncation. The compounded rounding
/// is a known minor artifact and is left as is.
///
/// The caller guarantees a source height above zero.
pub fn fit(src: &PixelGrid, cols: usize, rows: usize) -> PixelGrid {
    debug_assert!(src.height() > 0, "fit() requires a decoded, non-degenerate image");

    let term_h = rows.saturating_sub(1);

    let mut h = term_h;
    let mut w = src.width() * term_h / src.height();

    let max_w = cols / 2;
    if w > max_w {
        h = h * max_w / w;
        w = max_w;
    }

    let mut out = PixelGrid::new(w, h);
    for y in 0..h {
        let sy = y * src.height() / h;
        for x in 0..w {
            let sx = x * src.width() / w;
            out.put_rgba(x, y, src.rgba(sx, sy));
        }
    }
    out
}
