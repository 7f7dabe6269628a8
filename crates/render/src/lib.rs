#![deny(unsafe_code)]
//! CPU rendering of the lumasort particle array.
//!
//! This crate sits between `lumasort-core` (which owns the particles) and the
//! frontends. It reads particles strictly read-only: [`pixel`] splats them into
//! an RGBA8 buffer and [`snapshot`] (feature `png`) writes that buffer to disk.

pub mod pixel;

#[cfg(feature = "png")]
pub mod snapshot;

pub use pixel::{point_size, rasterize};

/// Output surface size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Number of bytes in an RGBA8 buffer covering the viewport.
    pub fn rgba_len(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}
