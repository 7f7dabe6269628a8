//! CPU-side PNG rendering of the particle array.
//!
//! This module is feature-gated behind `png` (default on) so that embedders
//! can depend on the `render` crate without pulling in the `image` encoders.
//! The pixel buffer conversion itself lives in [`crate::pixel`].

use std::path::Path;

use lumasort_core::{LumaError, Particle};

use crate::pixel::rasterize;
use crate::Viewport;

/// Rasterises `particles` into `viewport` and writes the result as a PNG.
///
/// Returns `LumaError::InvalidDimensions` for an empty viewport, or
/// `LumaError::Io` on write failure.
pub fn write_png(
    particles: &[Particle],
    viewport: Viewport,
    grid_width: usize,
    grid_height: usize,
    path: &Path,
) -> Result<(), LumaError> {
    if viewport.width == 0 || viewport.height == 0 {
        return Err(LumaError::InvalidDimensions);
    }
    let rgba = rasterize(particles, viewport, grid_width, grid_height);
    let img = image::RgbaImage::from_raw(viewport.width, viewport.height, rgba)
        .ok_or_else(|| LumaError::Io("RGBA buffer size mismatch".into()))?;
    img.save(path).map_err(|e| LumaError::Io(e.to_string()))
}
