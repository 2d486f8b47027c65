use std::io::Write;

use anyhow::Result;

use crate::pixel_grid::PixelGrid;

pub const CURSOR_HOME: &str = "\x1b[1;1H";
pub const RESET: &str = "\x1b[0m";
pub const HIDE_CURSOR: &str = "\x1b[?25l";
pub const SHOW_CURSOR: &str = "\x1b[?25h";

/// Paints a terminal-fit grid as truecolor cells: one background escape
/// plus two spaces per pixel, a newline per row, and a single reset after
/// the grid. Alpha is ignored. The whole frame is formatted into one
/// buffer so repeated video frames hit the stream as single writes; the
/// caller flushes and emits the cursor-home escape between frames.
pub fn render(grid: &PixelGrid, out: &mut impl Write) -> Result<()> {
    use std::fmt::Write as _;

    let mut buf = String::with_capacity(grid.width() * grid.height() * 20 + grid.height());
    for y in 0..grid.height() {
        for x in 0..grid.width() {
            let [r, g, b, _] = grid.rgba(x, y);
            let _ = write!(buf, "\x1b[48;2;{};{};{}m  ", r, g, b);
        }
        buf.push('\n');
    }
    buf.push_str(RESET);
    out.write_all(buf.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{render, RESET};
    use crate::pixel_grid::PixelGrid;

    fn rendered(grid: &PixelGrid) -> String {
        let mut out = Vec::new();
        render(grid, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn emits_one_line_per_row_and_one_cell_per_column() {
        let grid = PixelGrid::new(3, 2);
        let text = rendered(&grid);

        let lines: Vec<&str> = text.split('\n').collect();
        // Two pixel rows plus the trailing reset after the last newline.
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2], RESET);
        for line in &lines[..2] {
            assert_eq!(line.matches("\x1b[48;2;").count(), 3);
        }
        assert_eq!(text.matches(RESET).count(), 1);
    }

    #[test]
    fn single_pixel_reproduces_exact_rgb_triple() {
        let mut grid = PixelGrid::new(1, 1);
        grid.put_rgba(0, 0, [9, 8, 7, 255]);
        assert_eq!(rendered(&grid), "\x1b[48;2;9;8;7m  \n\x1b[0m");
    }

    #[test]
    fn alpha_is_ignored() {
        let mut grid = PixelGrid::new(1, 1);
        grid.put_rgba(0, 0, [1, 2, 3, 0]);
        assert_eq!(rendered(&grid), "\x1b[48;2;1;2;3m  \n\x1b[0m");
    }

    #[test]
    fn red_4x2_grid_renders_expected_byte_sequence() {
        let mut grid = PixelGrid::new(4, 2);
        for y in 0..2 {
            for x in 0..4 {
                grid.put_rgba(x, y, [255, 0, 0, 255]);
            }
        }

        let row = "\x1b[48;2;255;0;0m  ".repeat(4);
        let expected = format!("{row}\n{row}\n\x1b[0m");
        assert_eq!(rendered(&grid), expected);
    }
}
