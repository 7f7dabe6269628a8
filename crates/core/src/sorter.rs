//! Luminance-rank pixel sorter.
//!
//! Both images are resampled to the simulation grid, every cell is ranked by
//! perceptual luminance, and the k-th darkest source cell is paired with the
//! k-th darkest target cell. Dark source pixels travel to dark target regions
//! and bright ones to bright regions, whatever their spatial layout.

use std::time::Instant;

use glam::UVec2;
use image::RgbImage;
use log::{debug, warn};

use crate::frame;

/// Target grid coordinate for every source cell, indexed by the source
/// cell's flattened index `y * width + x`.
pub type Mapping = Vec<UVec2>;

/// Luminance and original grid position of one cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelInfo {
    pub luminance: f32,
    pub x: u32,
    pub y: u32,
}

/// Cells of `image`, resampled to `width × height`, ordered from darkest to
/// brightest.
///
/// The sort is stable: cells with equal luminance stay in row-major scan
/// order. Returns an empty list for an empty image or a zero dimension.
pub fn luminance_order(image: &RgbImage, width: usize, height: usize) -> Vec<PixelInfo> {
    if frame::is_empty(image) || width == 0 || height == 0 {
        return Vec::new();
    }
    let grid = frame::resample(image, width, height);
    let mut cells: Vec<PixelInfo> = grid
        .enumerate_pixels()
        .map(|(x, y, pixel)| PixelInfo {
            luminance: frame::luminance(pixel),
            x,
            y,
        })
        .collect();
    cells.sort_by(|a, b| a.luminance.total_cmp(&b.luminance));
    cells
}

/// Builds the luminance-rank mapping from `source` onto `target` over a
/// `width × height` grid.
///
/// Returns an empty mapping, and logs a warning, when either image is empty
/// or either grid dimension is zero. Otherwise the mapping has exactly
/// `width * height` entries and is a permutation of the grid coordinates.
pub fn sort_image(source: &RgbImage, target: &RgbImage, width: usize, height: usize) -> Mapping {
    if frame::is_empty(source) || frame::is_empty(target) {
        warn!("sort_image: empty source or target image");
        return Mapping::new();
    }
    if width == 0 || height == 0 {
        warn!("sort_image: grid dimensions {width}x{height} must be non-zero");
        return Mapping::new();
    }

    let started = Instant::now();
    let source_cells = luminance_order(source, width, height);
    let target_cells = luminance_order(target, width, height);

    let mut mapping = vec![UVec2::ZERO; width * height];
    for (src, tgt) in source_cells.iter().zip(&target_cells) {
        let index = src.y as usize * width + src.x as usize;
        mapping[index] = UVec2::new(tgt.x, tgt.y);
    }

    debug!(
        "sorted {} cells ({width}x{height}) in {:?}",
        mapping.len(),
        started.elapsed()
    );
    mapping
}
