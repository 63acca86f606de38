//! Fixed-size RGB image buffers.

use ndarray::{Array3, ArrayView3, Axis};

/// Width and height of every rendered image, in pixels.
pub const IMAGE_SIZE: usize = 128;
/// Color channels per pixel (RGB, alpha dropped).
pub const CHANNELS: usize = 3;
/// Number of bytes in one image.
pub const IMAGE_LEN: usize = IMAGE_SIZE * IMAGE_SIZE * CHANNELS;

/// A 128×128×3 `u8` image, row 0 at the top.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pixels: Array3<u8>,
}

impl Image {
    /// Creates an image filled with `background`.
    #[must_use]
    pub fn blank(background: [u8; 3]) -> Self {
        let pixels = Array3::from_shape_fn((IMAGE_SIZE, IMAGE_SIZE, CHANNELS), |(_, _, c)| {
            background[c]
        });
        Self { pixels }
    }

    /// Returns the RGB value at `(row, col)`, or `None` out of bounds.
    #[must_use]
    pub fn pixel(&self, row: usize, col: usize) -> Option<[u8; 3]> {
        if row >= IMAGE_SIZE || col >= IMAGE_SIZE {
            return None;
        }
        Some([
            self.pixels[[row, col, 0]],
            self.pixels[[row, col, 1]],
            self.pixels[[row, col, 2]],
        ])
    }

    /// Overwrites the pixel at `(row, col)`; out-of-bounds writes are ignored.
    pub fn set_pixel(&mut self, row: usize, col: usize, rgb: [u8; 3]) {
        if row >= IMAGE_SIZE || col >= IMAGE_SIZE {
            return;
        }
        for (c, value) in rgb.into_iter().enumerate() {
            self.pixels[[row, col, c]] = value;
        }
    }

    /// Number of pixels that differ from `background`.
    #[must_use]
    pub fn count_non_background(&self, background: [u8; 3]) -> usize {
        self.pixels
            .lanes(Axis(2))
            .into_iter()
            .filter(|px| px.iter().zip(background).any(|(&a, b)| a != b))
            .count()
    }

    /// Shape as `(height, width, channels)`.
    #[must_use]
    pub fn shape(&self) -> (usize, usize, usize) {
        self.pixels.dim()
    }

    #[must_use]
    pub fn view(&self) -> ArrayView3<'_, u8> {
        self.pixels.view()
    }

    #[must_use]
    pub fn into_array(self) -> Array3<u8> {
        self.pixels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_image() {
        let image = Image::blank([255, 255, 255]);
        assert_eq!(image.shape(), (IMAGE_SIZE, IMAGE_SIZE, CHANNELS));
        assert_eq!(image.view().len(), IMAGE_LEN);
        assert_eq!(image.count_non_background([255, 255, 255]), 0);
        assert_eq!(image.count_non_background([0, 0, 0]), IMAGE_SIZE * IMAGE_SIZE);
    }

    #[test]
    fn test_set_pixel_bounds() {
        let mut image = Image::blank([255, 255, 255]);
        image.set_pixel(3, 4, [1, 2, 3]);
        image.set_pixel(IMAGE_SIZE, 0, [0, 0, 0]);
        assert_eq!(image.pixel(3, 4), Some([1, 2, 3]));
        assert_eq!(image.pixel(IMAGE_SIZE, 0), None);
        assert_eq!(image.count_non_background([255, 255, 255]), 1);
    }
}
