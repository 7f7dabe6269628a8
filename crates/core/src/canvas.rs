//! Hand-drawn source surface.
//!
//! A [`Canvas`] is a black RGB drawing pad. Strokes are rasterised on the
//! CPU by stamping filled discs along each segment, so the surface can be
//! fed straight into the sorter as a source frame.

use std::collections::VecDeque;

use glam::Vec2;
use image::{Rgb, RgbImage};
use serde::{Deserialize, Serialize};

use crate::error::LumaError;

/// Smallest allowed brush diameter in pixels.
pub const MIN_BRUSH_SIZE: f32 = 1.0;
/// Largest allowed brush diameter in pixels.
pub const MAX_BRUSH_SIZE: f32 = 20.0;
/// Default brush diameter in pixels.
pub const DEFAULT_BRUSH_SIZE: f32 = 4.0;

/// Background color of a cleared canvas.
pub const BACKGROUND: Rgb<u8> = Rgb([0, 0, 0]);

/// Violet, indigo, blue, green, yellow, orange, red, then white and black.
pub const VIBGYOR: [Rgb<u8>; 9] = [
    Rgb([143, 0, 255]),
    Rgb([74, 0, 130]),
    Rgb([0, 0, 255]),
    Rgb([0, 255, 0]),
    Rgb([255, 255, 0]),
    Rgb([255, 128, 0]),
    Rgb([255, 0, 0]),
    Rgb([255, 255, 255]),
    Rgb([0, 0, 0]),
];

/// The tool applied by strokes and clicks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawTool {
    #[default]
    Pen,
    /// Paints the background color.
    Eraser,
    /// Flood-fills the clicked region.
    Fill,
}

/// Tool, color and size used for drawing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BrushSettings {
    pub tool: DrawTool,
    pub color: [u8; 3],
    size: f32,
}

impl Default for BrushSettings {
    fn default() -> Self {
        Self {
            tool: DrawTool::Pen,
            color: VIBGYOR[6].0,
            size: DEFAULT_BRUSH_SIZE,
        }
    }
}

impl BrushSettings {
    /// Brush diameter in pixels.
    pub fn size(&self) -> f32 {
        self.size
    }

    /// Sets the brush diameter, clamping to [1, 20].
    pub fn set_size(&mut self, size: f32) {
        self.size = if size.is_nan() {
            DEFAULT_BRUSH_SIZE
        } else {
            size.clamp(MIN_BRUSH_SIZE, MAX_BRUSH_SIZE)
        };
    }

    /// Returns these settings with the given tool.
    pub fn with_tool(mut self, tool: DrawTool) -> Self {
        self.tool = tool;
        self
    }

    /// Returns these settings with the given color.
    pub fn with_color(mut self, color: Rgb<u8>) -> Self {
        self.color = color.0;
        self
    }

    /// Returns these settings with the given size, clamped to [1, 20].
    pub fn with_size(mut self, size: f32) -> Self {
        self.set_size(size);
        self
    }

    /// Color actually painted: the background for the eraser.
    fn paint(&self) -> Rgb<u8> {
        match self.tool {
            DrawTool::Eraser => BACKGROUND,
            DrawTool::Pen | DrawTool::Fill => Rgb(self.color),
        }
    }
}

/// A drawing pad backed by an RGB buffer.
#[derive(Debug, Clone)]
pub struct Canvas {
    pixels: RgbImage,
    brush: BrushSettings,
}

impl Canvas {
    /// Creates a black canvas.
    ///
    /// Returns `LumaError::InvalidDimensions` if either dimension is zero.
    pub fn new(width: u32, height: u32) -> Result<Self, LumaError> {
        if width == 0 || height == 0 {
            return Err(LumaError::InvalidDimensions);
        }
        Ok(Self {
            pixels: RgbImage::from_pixel(width, height, BACKGROUND),
            brush: BrushSettings::default(),
        })
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Current brush settings.
    pub fn brush(&self) -> &BrushSettings {
        &self.brush
    }

    /// Mutable brush settings.
    pub fn brush_mut(&mut self) -> &mut BrushSettings {
        &mut self.brush
    }

    /// The drawing as an RGB frame.
    pub fn image(&self) -> &RgbImage {
        &self.pixels
    }

    /// Resets every pixel to black.
    pub fn clear(&mut self) {
        for pixel in self.pixels.pixels_mut() {
            *pixel = BACKGROUND;
        }
    }

    /// Applies the current tool at a single point.
    ///
    /// The fill tool flood-fills from `point`; the pen and eraser stamp one
    /// brush disc.
    pub fn apply(&mut self, point: Vec2) {
        match self.brush.tool {
            DrawTool::Fill => self.flood_fill(point),
            DrawTool::Pen | DrawTool::Eraser => self.stamp(point, self.brush.paint()),
        }
    }

    /// Draws a stroke from `start` to `end` with the current brush.
    ///
    /// With the fill tool a stroke behaves like a click at `end`.
    pub fn draw_line(&mut self, start: Vec2, end: Vec2) {
        if self.brush.tool == DrawTool::Fill {
            self.flood_fill(end);
            return;
        }
        let color = self.brush.paint();
        let spacing = (self.brush.size * 0.25).max(0.5);
        let length = start.distance(end);
        let steps = (length / spacing).ceil().max(1.0) as usize;
        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            self.stamp(start.lerp(end, t), color);
        }
    }

    /// Paints a filled disc of the brush diameter centred on `center`.
    fn stamp(&mut self, center: Vec2, color: Rgb<u8>) {
        let radius = self.brush.size * 0.5;
        let (w, h) = (self.pixels.width() as i64, self.pixels.height() as i64);
        let x0 = ((center.x - radius).floor() as i64).max(0);
        let x1 = ((center.x + radius).ceil() as i64).min(w - 1);
        let y0 = ((center.y - radius).floor() as i64).max(0);
        let y1 = ((center.y + radius).ceil() as i64).min(h - 1);
        let r2 = radius.max(0.5).powi(2);
        for y in y0..=y1 {
            for x in x0..=x1 {
                let d = Vec2::new(x as f32, y as f32) - center;
                if d.length_squared() <= r2 {
                    self.pixels.put_pixel(x as u32, y as u32, color);
                }
            }
        }
    }

    /// Replaces the 4-connected region sharing the color at `seed` with the
    /// brush color. Points outside the canvas are ignored.
    fn flood_fill(&mut self, seed: Vec2) {
        if seed.x < 0.0 || seed.y < 0.0 {
            return;
        }
        let (sx, sy) = (seed.x as u32, seed.y as u32);
        if sx >= self.pixels.width() || sy >= self.pixels.height() {
            return;
        }
        let replace = *self.pixels.get_pixel(sx, sy);
        let fill = self.brush.paint();
        if replace == fill {
            return;
        }

        let (w, h) = self.pixels.dimensions();
        let mut queue = VecDeque::from([(sx, sy)]);
        self.pixels.put_pixel(sx, sy, fill);
        while let Some((x, y)) = queue.pop_front() {
            let neighbours = [
                (x.wrapping_sub(1), y),
                (x + 1, y),
                (x, y.wrapping_sub(1)),
                (x, y + 1),
            ];
            for (nx, ny) in neighbours {
                if nx < w && ny < h && *self.pixels.get_pixel(nx, ny) == replace {
                    self.pixels.put_pixel(nx, ny, fill);
                    queue.push_back((nx, ny));
                }
            }
        }
    }
}
