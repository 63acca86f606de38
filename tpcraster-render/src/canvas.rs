//! Plot-area geometry: mapping physical coordinates onto canvas pixels.
//!
//! The canvas is a 1×1 inch figure at 128 dpi. Data is drawn inside a plot area
//! given as fractions of the figure, measured from the bottom-left corner like a
//! subplot box. Pixel rows grow downward, so the vertical axis is flipped.

use crate::image::IMAGE_SIZE;
use tpcraster_core::AxisRange;

/// Figure resolution in dots per inch; with a 1 inch figure this is the canvas size.
pub const FIGURE_DPI: f64 = 128.0;
/// Typographic points per inch.
pub const POINTS_PER_INCH: f64 = 72.0;

/// Plot-area placement inside the figure, as fractions in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotArea {
    pub left: f64,
    pub right: f64,
    pub bottom: f64,
    pub top: f64,
}

impl Default for PlotArea {
    /// Default subplot placement: left 0.125, right 0.9, bottom 0.11, top 0.88.
    fn default() -> Self {
        Self {
            left: 0.125,
            right: 0.9,
            bottom: 0.11,
            top: 0.88,
        }
    }
}

impl PlotArea {
    /// The whole canvas.
    #[must_use]
    pub fn full() -> Self {
        Self {
            left: 0.0,
            right: 1.0,
            bottom: 0.0,
            top: 1.0,
        }
    }

    /// Returns true if the fractions describe a non-empty box inside the figure.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        (0.0..=1.0).contains(&self.left)
            && (0.0..=1.0).contains(&self.right)
            && (0.0..=1.0).contains(&self.bottom)
            && (0.0..=1.0).contains(&self.top)
            && self.left < self.right
            && self.bottom < self.top
    }
}

/// Plot area resolved to canvas pixel coordinates for one pair of axis ranges.
#[derive(Debug, Clone, Copy)]
pub struct PixelMapping {
    horizontal: AxisRange,
    vertical: AxisRange,
    x0: f64,
    x1: f64,
    y_top: f64,
    y_bottom: f64,
}

impl PixelMapping {
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn new(area: PlotArea, horizontal: AxisRange, vertical: AxisRange) -> Self {
        let size = IMAGE_SIZE as f64;
        Self {
            horizontal,
            vertical,
            x0: area.left * size,
            x1: area.right * size,
            y_top: (1.0 - area.top) * size,
            y_bottom: (1.0 - area.bottom) * size,
        }
    }

    /// Maps a data point to continuous canvas coordinates `(col, row)`.
    ///
    /// Returns `None` if the point lies outside either axis range (or is NaN).
    #[must_use]
    pub fn to_canvas(&self, u: f64, v: f64) -> Option<(f64, f64)> {
        if !self.horizontal.contains(u) || !self.vertical.contains(v) {
            return None;
        }
        let col = self.x0 + (u - self.horizontal.min) / self.horizontal.span() * (self.x1 - self.x0);
        let row = self.y_top
            + (self.vertical.max - v) / self.vertical.span() * (self.y_bottom - self.y_top);
        Some((col, row))
    }

    /// Returns true if the center of pixel `(row, col)` lies inside the plot area.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn contains_pixel(&self, row: usize, col: usize) -> bool {
        let cx = col as f64 + 0.5;
        let cy = row as f64 + 0.5;
        cx >= self.x0 && cx <= self.x1 && cy >= self.y_top && cy <= self.y_bottom
    }
}

/// Marker radius in pixels for a marker of `area_pt2` square points.
#[must_use]
pub fn marker_radius_px(area_pt2: f64) -> f64 {
    (area_pt2.max(0.0) / std::f64::consts::PI).sqrt() * FIGURE_DPI / POINTS_PER_INCH
}

/// Converts a canvas coordinate to a pixel index, `None` outside `[0, max_exclusive)`.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub(crate) fn pixel_index(value: f64, max_exclusive: usize) -> Option<usize> {
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    let index = value.floor() as usize;
    (index < max_exclusive).then_some(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tpcraster_core::{DRIFT_RANGE, PAD_PLANE_RANGE};

    #[test]
    fn test_full_canvas_corners() {
        let map = PixelMapping::new(PlotArea::full(), PAD_PLANE_RANGE, PAD_PLANE_RANGE);
        let (c, r) = map.to_canvas(-275.0, 275.0).unwrap();
        assert_relative_eq!(c, 0.0);
        assert_relative_eq!(r, 0.0);
        let (c, r) = map.to_canvas(275.0, -275.0).unwrap();
        assert_relative_eq!(c, 128.0);
        assert_relative_eq!(r, 128.0);
        let (c, r) = map.to_canvas(0.0, 0.0).unwrap();
        assert_relative_eq!(c, 64.0);
        assert_relative_eq!(r, 64.0);
    }

    #[test]
    fn test_default_area_center() {
        let map = PixelMapping::new(PlotArea::default(), DRIFT_RANGE, PAD_PLANE_RANGE);
        let (c, r) = map.to_canvas(625.0, 0.0).unwrap();
        assert_relative_eq!(c, 65.6, epsilon = 1e-9);
        assert_relative_eq!(r, 64.64, epsilon = 1e-9);
        assert!(map.contains_pixel(64, 65));
        assert!(!map.contains_pixel(2, 65));
        assert!(!map.contains_pixel(64, 120));
    }

    #[test]
    fn test_out_of_range_is_rejected() {
        let map = PixelMapping::new(PlotArea::default(), DRIFT_RANGE, PAD_PLANE_RANGE);
        assert!(map.to_canvas(-1.0, 0.0).is_none());
        assert!(map.to_canvas(1250.1, 0.0).is_none());
        assert!(map.to_canvas(10.0, 300.0).is_none());
        assert!(map.to_canvas(f64::NAN, 0.0).is_none());
    }

    #[test]
    fn test_marker_radius() {
        assert_relative_eq!(marker_radius_px(0.6), 0.777, epsilon = 1e-3);
        assert_relative_eq!(marker_radius_px(-1.0), 0.0);
    }

    #[test]
    fn test_plot_area_validity() {
        assert!(PlotArea::default().is_valid());
        assert!(PlotArea::full().is_valid());
        let flipped = PlotArea {
            left: 0.9,
            right: 0.1,
            ..PlotArea::default()
        };
        assert!(!flipped.is_valid());
    }

    #[test]
    fn test_pixel_index() {
        assert_eq!(pixel_index(0.0, 128), Some(0));
        assert_eq!(pixel_index(127.99, 128), Some(127));
        assert_eq!(pixel_index(128.0, 128), None);
        assert_eq!(pixel_index(-0.1, 128), None);
    }
}
