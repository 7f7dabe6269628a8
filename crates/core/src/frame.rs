//! Helpers for the RGB frames flowing between image sources and the core.
//!
//! Frames are plain [`RgbImage`]s: row-major, three bytes per pixel, origin
//! at the top-left. A frame with zero width or height counts as absent.

use std::borrow::Cow;

use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};

/// Luma weight of the red channel.
const LUMA_R: f32 = 0.299;
/// Luma weight of the green channel.
const LUMA_G: f32 = 0.587;
/// Luma weight of the blue channel.
const LUMA_B: f32 = 0.114;

/// Returns true when the frame has no pixels.
pub fn is_empty(frame: &RgbImage) -> bool {
    frame.width() == 0 || frame.height() == 0
}

/// Perceptual luminance of one pixel, in [0, 255].
pub fn luminance(pixel: &Rgb<u8>) -> f32 {
    let [r, g, b] = pixel.0;
    LUMA_B * b as f32 + LUMA_G * g as f32 + LUMA_R * r as f32
}

/// Resamples `frame` to `width × height` with a bilinear filter.
///
/// A frame that already has the requested size is borrowed unchanged.
pub fn resample(frame: &RgbImage, width: usize, height: usize) -> Cow<'_, RgbImage> {
    let (w, h) = (width as u32, height as u32);
    if frame.dimensions() == (w, h) {
        Cow::Borrowed(frame)
    } else {
        Cow::Owned(imageops::resize(frame, w, h, FilterType::Triangle))
    }
}

/// Grid dimensions for a frame of the given native size.
///
/// The frame is scaled down uniformly until neither side exceeds `max_side`;
/// frames that already fit keep their size. Each side is at least 1. Returns
/// `None` for an empty frame or a zero `max_side`.
pub fn grid_dims(frame_width: u32, frame_height: u32, max_side: usize) -> Option<(usize, usize)> {
    if frame_width == 0 || frame_height == 0 || max_side == 0 {
        return None;
    }
    let (w, h) = (frame_width as usize, frame_height as usize);
    let longest = w.max(h);
    if longest <= max_side {
        return Some((w, h));
    }
    let scale = max_side as f64 / longest as f64;
    let gw = ((w as f64 * scale).round() as usize).clamp(1, max_side);
    let gh = ((h as f64 * scale).round() as usize).clamp(1, max_side);
    Some((gw, gh))
}
