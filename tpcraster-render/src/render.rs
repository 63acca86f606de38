//! Projection renderer: one event in, one 128×128×3 image out.

use crate::canvas::{marker_radius_px, pixel_index, PixelMapping, PlotArea};
use crate::colormap::Colormap;
use crate::image::{Image, IMAGE_SIZE};
use ndarray::{Array4, Axis};
use rayon::prelude::*;
use tpcraster_core::{Error, LabeledEvent, PointCloud, Projection, Result};

/// How charge values are mapped onto the colormap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorScale {
    /// Stretch each event's own charge range over the colormap. An event whose
    /// points all share one charge maps to the low end.
    #[default]
    Autoscale,
    /// Use the charge directly, clipped to [0, 1].
    Fixed,
}

/// Rendering configuration.
#[derive(Clone, Debug)]
pub struct RenderConfig {
    /// Where the data is drawn inside the canvas.
    pub plot_area: PlotArea,
    /// Marker area in square points (default: 0.6).
    pub marker_area: f64,
    pub colormap: Colormap,
    pub color_scale: ColorScale,
    /// Canvas color where nothing is drawn.
    pub background: [u8; 3],
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            plot_area: PlotArea::default(),
            marker_area: 0.6,
            colormap: Colormap::Greys,
            color_scale: ColorScale::Autoscale,
            background: [255, 255, 255],
        }
    }
}

impl RenderConfig {
    /// Default configuration drawing over the whole canvas.
    #[must_use]
    pub fn full_canvas() -> Self {
        Self::default().with_plot_area(PlotArea::full())
    }

    #[must_use]
    pub fn with_plot_area(mut self, area: PlotArea) -> Self {
        self.plot_area = area;
        self
    }

    #[must_use]
    pub fn with_marker_area(mut self, area: f64) -> Self {
        self.marker_area = area;
        self
    }

    #[must_use]
    pub fn with_colormap(mut self, colormap: Colormap) -> Self {
        self.colormap = colormap;
        self
    }

    #[must_use]
    pub fn with_color_scale(mut self, scale: ColorScale) -> Self {
        self.color_scale = scale;
        self
    }

    /// Checks the plot area and marker size.
    ///
    /// # Errors
    /// Returns [`Error::ConfigError`] for an empty or out-of-figure plot area or a
    /// negative marker area.
    pub fn validate(&self) -> Result<()> {
        if !self.plot_area.is_valid() {
            return Err(Error::ConfigError(format!(
                "invalid plot area: {:?}",
                self.plot_area
            )));
        }
        if self.marker_area.is_nan() || self.marker_area < 0.0 {
            return Err(Error::ConfigError(format!(
                "invalid marker area: {}",
                self.marker_area
            )));
        }
        Ok(())
    }
}

/// Renders point clouds for one projection.
#[derive(Clone, Debug)]
pub struct Renderer {
    projection: Projection,
    config: RenderConfig,
}

impl Renderer {
    /// Creates a renderer.
    ///
    /// # Errors
    /// Returns [`Error::ConfigError`] if `config` is invalid.
    pub fn new(projection: Projection, config: RenderConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { projection, config })
    }

    /// Creates a renderer from a textual selector (`"xy"` or `"zy"`).
    ///
    /// # Errors
    /// Returns [`Error::InvalidProjection`] for any other selector.
    pub fn from_selector(selector: &str, config: RenderConfig) -> Result<Self> {
        let projection = selector.parse()?;
        Self::new(projection, config)
    }

    /// Rasterizes one event. Points are drawn in order; later points overwrite
    /// earlier ones. Points outside the axis ranges, and points whose charge is
    /// NaN or infinite, are not drawn.
    #[must_use]
    pub fn render(&self, cloud: &PointCloud) -> Image {
        let mut image = Image::blank(self.config.background);
        if cloud.is_empty() {
            return image;
        }

        let mapping = PixelMapping::new(
            self.config.plot_area,
            self.projection.horizontal_range(),
            self.projection.vertical_range(),
        );
        let radius = marker_radius_px(self.config.marker_area);
        let intensity = ColorNorm::new(self.config.color_scale, &cloud.charge);
        let (horizontal, vertical) = self.projection.columns(cloud);

        for ((&u, &v), &charge) in horizontal.iter().zip(vertical).zip(&cloud.charge) {
            if !charge.is_finite() {
                continue;
            }
            let Some((col, row)) = mapping.to_canvas(u, v) else {
                continue;
            };
            let rgb = self.config.colormap.apply(intensity.normalize(charge));
            stamp_marker(&mut image, &mapping, col, row, radius, rgb);
        }
        image
    }

    /// Renders every event, in parallel, keeping input order.
    #[must_use]
    pub fn render_events(&self, events: &[LabeledEvent]) -> Vec<Image> {
        events
            .par_iter()
            .map(|event| self.render(&event.cloud))
            .collect()
    }

    /// Renders every event into an `(N, 128, 128, 3)` array, row `i` holding event `i`.
    #[must_use]
    pub fn render_stack(&self, events: &[LabeledEvent]) -> Array4<u8> {
        stack_images(self.render_events(events))
    }
}

/// Renders one event with a one-off renderer.
///
/// # Errors
/// Returns [`Error::ConfigError`] if `config` is invalid.
pub fn render(cloud: &PointCloud, projection: Projection, config: &RenderConfig) -> Result<Image> {
    Ok(Renderer::new(projection, config.clone())?.render(cloud))
}

/// Stacks images into an `(N, 128, 128, 3)` array.
#[must_use]
pub fn stack_images(images: Vec<Image>) -> Array4<u8> {
    let mut stack = Array4::zeros((images.len(), IMAGE_SIZE, IMAGE_SIZE, 3));
    for (mut slot, image) in stack.axis_iter_mut(Axis(0)).zip(images) {
        slot.assign(&image.view());
    }
    stack
}

struct ColorNorm {
    scale: ColorScale,
    vmin: f64,
    span: f64,
}

impl ColorNorm {
    fn new(scale: ColorScale, charge: &[f64]) -> Self {
        let finite = charge.iter().copied().filter(|c| c.is_finite());
        let vmin = finite.clone().fold(f64::INFINITY, f64::min);
        let vmax = finite.fold(f64::NEG_INFINITY, f64::max);
        let span = if vmin.is_finite() { vmax - vmin } else { 0.0 };
        Self { scale, vmin, span }
    }

    fn normalize(&self, charge: f64) -> f64 {
        match self.scale {
            ColorScale::Fixed => charge.clamp(0.0, 1.0),
            ColorScale::Autoscale if self.span > 0.0 => (charge - self.vmin) / self.span,
            ColorScale::Autoscale => 0.0,
        }
    }
}

/// Fills a disc of `radius` pixels centered at `(col, row)`, clipped to the plot
/// area. The pixel containing the center is always filled.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn stamp_marker(
    image: &mut Image,
    mapping: &PixelMapping,
    col: f64,
    row: f64,
    radius: f64,
    rgb: [u8; 3],
) {
    let clamp_edge = |v: f64| v.min(IMAGE_SIZE as f64 - 1.0);
    if let (Some(c), Some(r)) = (
        pixel_index(clamp_edge(col), IMAGE_SIZE),
        pixel_index(clamp_edge(row), IMAGE_SIZE),
    ) {
        image.set_pixel(r, c, rgb);
    }

    let r2 = radius * radius;
    let c_lo = (col - radius).floor().max(0.0) as usize;
    let c_hi = ((col + radius).floor().max(0.0) as usize).min(IMAGE_SIZE - 1);
    let r_lo = (row - radius).floor().max(0.0) as usize;
    let r_hi = ((row + radius).floor().max(0.0) as usize).min(IMAGE_SIZE - 1);

    for pr in r_lo..=r_hi {
        for pc in c_lo..=c_hi {
            let dx = pc as f64 + 0.5 - col;
            let dy = pr as f64 + 0.5 - row;
            if dx * dx + dy * dy <= r2 && mapping.contains_pixel(pr, pc) {
                image.set_pixel(pr, pc, rgb);
            }
        }
    }
}
