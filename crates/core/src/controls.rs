//! The control surface exposed to UI frontends.
//!
//! Frontends never reach into particles or images directly. They read and
//! write the tunable values and trigger actions through [`MorphControls`].
//! The trait is **object-safe** so a frontend can hold `&mut dyn MorphControls`.

use glam::Vec2;
use image::RgbImage;

use crate::canvas::BrushSettings;
use crate::controller::{InputMode, TransformController};
use crate::error::LumaError;
use crate::params::MotionParams;

/// Accessors, mutators and actions available to a UI layer.
pub trait MorphControls {
    /// Current motion parameters.
    fn params(&self) -> MotionParams;

    /// Replaces the motion parameters. Out-of-range values are clamped.
    fn set_params(&mut self, params: MotionParams);

    fn input_mode(&self) -> InputMode;

    fn set_input_mode(&mut self, mode: InputMode);

    /// Current drawing tool, color and size.
    fn brush(&self) -> BrushSettings;

    fn set_brush(&mut self, brush: BrushSettings);

    /// Draws a stroke on the canvas, in canvas pixel coordinates.
    fn draw_stroke(&mut self, start: Vec2, end: Vec2);

    fn clear_canvas(&mut self);

    /// Loads the still image used as the source in image mode.
    fn load_source_image(&mut self, image: RgbImage) -> Result<(), LumaError>;

    /// Loads the image the source morphs into.
    fn load_target_image(&mut self, image: RgbImage) -> Result<(), LumaError>;

    /// Freezes the source and starts moving particles to their targets.
    ///
    /// Returns `MissingTarget` or `MissingSource` and stays idle when an
    /// input is unavailable.
    fn start_transform(&mut self) -> Result<(), LumaError>;

    /// Stops the transform; particles snap back on the next update.
    fn stop_transform(&mut self);

    fn is_transforming(&self) -> bool;

    /// Whether a target image has been loaded.
    fn has_target(&self) -> bool;

    /// Number of live particles (zero before the first frame).
    fn particle_count(&self) -> usize;
}

impl MorphControls for TransformController {
    fn params(&self) -> MotionParams {
        TransformController::params(self)
    }

    fn set_params(&mut self, params: MotionParams) {
        TransformController::set_params(self, params);
    }

    fn input_mode(&self) -> InputMode {
        TransformController::input_mode(self)
    }

    fn set_input_mode(&mut self, mode: InputMode) {
        TransformController::set_input_mode(self, mode);
    }

    fn brush(&self) -> BrushSettings {
        *self.canvas().brush()
    }

    fn set_brush(&mut self, brush: BrushSettings) {
        *self.canvas_mut().brush_mut() = brush;
    }

    fn draw_stroke(&mut self, start: Vec2, end: Vec2) {
        self.canvas_mut().draw_line(start, end);
    }

    fn clear_canvas(&mut self) {
        self.canvas_mut().clear();
    }

    fn load_source_image(&mut self, image: RgbImage) -> Result<(), LumaError> {
        TransformController::load_source_image(self, image)
    }

    fn load_target_image(&mut self, image: RgbImage) -> Result<(), LumaError> {
        TransformController::load_target_image(self, image)
    }

    fn start_transform(&mut self) -> Result<(), LumaError> {
        TransformController::start_transform(self)
    }

    fn stop_transform(&mut self) {
        TransformController::stop_transform(self);
    }

    fn is_transforming(&self) -> bool {
        TransformController::is_transforming(self)
    }

    fn has_target(&self) -> bool {
        self.target_image().is_some()
    }

    fn particle_count(&self) -> usize {
        self.particles().len()
    }
}
