//! tpcraster-render: Direct rasterization of AT-TPC events into images.
//!
//! This crate turns one event's point cloud into a fixed 128×128×3 image:
//! - **Canvas** - plot-area placement and physical-to-pixel mapping
//! - **Colormap** - charge intensity to RGB (`Greys` by default)
//! - **Renderer** - per-event rasterization and ordered parallel batches
//!

pub mod canvas;
mod colormap;
mod image;
mod render;

pub use canvas::{marker_radius_px, PixelMapping, PlotArea, FIGURE_DPI};
pub use colormap::Colormap;
pub use image::{Image, CHANNELS, IMAGE_LEN, IMAGE_SIZE};
pub use render::{render, stack_images, ColorScale, RenderConfig, Renderer};

// Re-export the projection types the renderer is parameterized by
pub use tpcraster_core::{AxisRange, Projection};
