use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::Path;

use anyhow::{ensure, Context, Result};
use image::{DynamicImage, ImageReader};

use crate::cell_render;
use crate::pixel_grid::{PixelGrid, BYTES_PER_PIXEL};
use crate::term_fit::{self, TerminalDimensions};

/// Probes the source as a static image. `Ok(None)` means the bytes are
/// not a recognized still format and the caller should try the video
/// path; an unreadable file is an error either way.
pub fn try_decode(path: &Path) -> Result<Option<DynamicImage>> {
    let file =
        File::open(path).with_context(|| format!("failed to open '{}'", path.display()))?;
    let reader = ImageReader::new(BufReader::new(file))
        .with_guessed_format()
        .context("failed to probe image format")?;
    Ok(reader.decode().ok())
}

/// Renders a decoded still once: flatten to straight-alpha RGBA8 (alpha
/// is ignored downstream anyway), fit to the terminal, paint.
pub fn render(image: DynamicImage) -> Result<()> {
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    ensure!(height > 0, "decoded image has zero height");

    let grid = PixelGrid::from_raw(
        width as usize,
        height as usize,
        width as usize * BYTES_PER_PIXEL,
        rgba.into_raw(),
    )?;

    let dims = TerminalDimensions::detect();
    let fitted = term_fit::fit(&grid, dims.cols, dims.rows);

    let mut out = io::stdout().lock();
    cell_render::render(&fitted, &mut out)?;
    out.flush()?;
    Ok(())
}
