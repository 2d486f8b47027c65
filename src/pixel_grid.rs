use anyhow::{ensure, Result};

pub const BYTES_PER_PIXEL: usize = 4;

/// Flat RGBA8 raster handed between pipeline stages. A grid is owned by
/// exactly one stage at a time and moves by value on every hand-off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGrid {
    width: usize,
    height: usize,
    stride: usize,
    data: Vec<u8>,
}

impl PixelGrid {
    /// Allocates a zeroed grid with a tight stride.
    pub fn new(width: usize, height: usize) -> Self {
        let stride = width * BYTES_PER_PIXEL;
        Self {
            width,
            height,
            stride,
            data: vec![0; stride * height],
        }
    }

    /// Wraps an existing RGBA buffer, e.g. one rawvideo output packet.
    /// Rejects buffers that cannot hold `stride * height` bytes or
    /// strides shorter than a pixel row.
    pub fn from_raw(width: usize, height: usize, stride: usize, data: Vec<u8>) -> Result<Self> {
        ensure!(
            stride >= width * BYTES_PER_PIXEL,
            "stride {} is too small for width {}",
            stride,
            width
        );
        ensure!(
            data.len() >= stride * height,
            "buffer holds {} bytes but a {}x{} grid with stride {} needs {}",
            data.len(),
            width,
            height,
            stride,
            stride * height
        );
        Ok(Self {
            width,
            height,
            stride,
            data,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn rgba(&self, x: usize, y: usize) -> [u8; 4] {
        debug_assert!(x < self.width && y < self.height);
        let at = y * self.stride + x * BYTES_PER_PIXEL;
        [
            self.data[at],
            self.data[at + 1],
            self.data[at + 2],
            self.data[at + 3],
        ]
    }

    pub fn put_rgba(&mut self, x: usize, y: usize, pixel: [u8; 4]) {
        debug_assert!(x < self.width && y < self.height);
        let at = y * self.stride + x * BYTES_PER_PIXEL;
        self.data[at..at + BYTES_PER_PIXEL].copy_from_slice(&pixel);
    }
}

#[cfg(test)]
mod tests {
    use super::{PixelGrid, BYTES_PER_PIXEL};

    #[test]
    fn from_raw_rejects_short_buffer() {
        let result = PixelGrid::from_raw(2, 2, 2 * BYTES_PER_PIXEL, vec![0; 15]);
        assert!(result.is_err());
    }

    #[test]
    fn from_raw_rejects_undersized_stride() {
        let result = PixelGrid::from_raw(3, 1, 2 * BYTES_PER_PIXEL, vec![0; 12]);
        assert!(result.is_err());
    }

    #[test]
    fn padded_stride_addresses_pixels_correctly() {
        // 2x2 grid with 4 bytes of row padding.
        let stride = 2 * BYTES_PER_PIXEL + 4;
        let mut grid = PixelGrid::from_raw(2, 2, stride, vec![0; stride * 2]).unwrap();
        grid.put_rgba(1, 1, [9, 8, 7, 6]);
        assert_eq!(grid.rgba(1, 1), [9, 8, 7, 6]);
        assert_eq!(grid.rgba(0, 0), [0, 0, 0, 0]);
    }

    #[test]
    fn new_allocates_tight_rows() {
        let grid = PixelGrid::new(3, 2);
        assert_eq!(grid.width(), 3);
        assert_eq!(grid.height(), 2);
        assert_eq!(grid.rgba(2, 1), [0, 0, 0, 0]);
    }
}
