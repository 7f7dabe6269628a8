//! Transform controller: input polling, grid lifecycle and the
//! idle/transforming state machine.
//!
//! ```text
//! AwaitingFrame --first non-empty frame--> Idle
//! Idle --start_transform--> Transforming --stop_transform--> Idle
//! ```
//!
//! The controller owns every image the core needs (live frame, static source,
//! canvas, frozen snapshot, target) and the [`ParticleStore`]. Frontends talk
//! to it through [`MorphControls`](crate::controls::MorphControls) and drive
//! it by calling [`TransformController::update`] once per frame.

use image::RgbImage;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::canvas::Canvas;
use crate::error::LumaError;
use crate::flow_field::{FlowSource, PerlinFlow};
use crate::frame;
use crate::params::{param_usize, MotionParams};
use crate::particle::{Particle, ParticleStore};
use crate::sorter::sort_image;

/// Default cap on either grid side; 600 × 600 is 360,000 particles.
pub const DEFAULT_MAX_GRID_SIDE: usize = 600;
/// Default canvas width in pixels.
pub const DEFAULT_CANVAS_WIDTH: u32 = 640;
/// Default canvas height in pixels.
pub const DEFAULT_CANVAS_HEIGHT: u32 = 480;

/// A live producer of source frames, such as a webcam.
pub trait FrameSource: Send {
    /// The next frame, or `None` if nothing is available right now.
    fn next_frame(&mut self) -> Option<RgbImage>;
}

/// Where source frames come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputMode {
    /// The attached [`FrameSource`].
    #[default]
    Webcam,
    /// The image loaded with `load_source_image`.
    Image,
    /// The drawing canvas.
    Canvas,
}

/// Lifecycle state of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No non-empty frame seen yet; the particle grid does not exist.
    AwaitingFrame,
    /// Particles rest on their grid origins.
    Idle,
    /// Particles travel toward their sorted targets.
    Transforming,
}

/// Construction-time settings for a [`TransformController`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Largest grid side; larger frames are scaled down to fit.
    pub max_grid_side: usize,
    /// Seed of the flow-field noise.
    pub seed: u32,
    pub canvas_width: u32,
    pub canvas_height: u32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            max_grid_side: DEFAULT_MAX_GRID_SIDE,
            seed: 0,
            canvas_width: DEFAULT_CANVAS_WIDTH,
            canvas_height: DEFAULT_CANVAS_HEIGHT,
        }
    }
}

impl ControllerConfig {
    /// Extracts settings from a JSON object, falling back to defaults.
    pub fn from_json(params: &Value) -> Self {
        let defaults = Self::default();
        Self {
            max_grid_side: param_usize(params, "max_grid_side", defaults.max_grid_side),
            seed: param_usize(params, "seed", defaults.seed as usize) as u32,
            canvas_width: param_usize(params, "canvas_width", defaults.canvas_width as usize)
                as u32,
            canvas_height: param_usize(params, "canvas_height", defaults.canvas_height as usize)
                as u32,
        }
    }
}

/// Orchestrates sorting, particle targets and per-frame simulation.
pub struct TransformController {
    config: ControllerConfig,
    params: MotionParams,
    flow: Box<dyn FlowSource>,
    phase: Phase,
    store: Option<ParticleStore>,
    input_mode: InputMode,
    camera: Option<Box<dyn FrameSource>>,
    camera_warned: bool,
    static_image: Option<RgbImage>,
    canvas: Canvas,
    current_frame: Option<RgbImage>,
    frozen_frame: Option<RgbImage>,
    target: Option<RgbImage>,
}

impl TransformController {
    /// Creates a controller with a Perlin flow field seeded from `config`.
    ///
    /// Returns `LumaError::InvalidDimensions` if the canvas size or
    /// `max_grid_side` is zero.
    pub fn new(config: ControllerConfig) -> Result<Self, LumaError> {
        Self::with_flow(config, Box::new(PerlinFlow::new(config.seed)))
    }

    /// Creates a controller driven by a custom flow field.
    pub fn with_flow(
        config: ControllerConfig,
        flow: Box<dyn FlowSource>,
    ) -> Result<Self, LumaError> {
        if config.max_grid_side == 0 {
            return Err(LumaError::InvalidDimensions);
        }
        let canvas = Canvas::new(config.canvas_width, config.canvas_height)?;
        Ok(Self {
            config,
            params: MotionParams::default(),
            flow,
            phase: Phase::AwaitingFrame,
            store: None,
            input_mode: InputMode::default(),
            camera: None,
            camera_warned: false,
            static_image: None,
            canvas,
            current_frame: None,
            frozen_frame: None,
            target: None,
        })
    }

    /// Settings this controller was built with.
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Current lifecycle state.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Attaches the live source polled in [`InputMode::Webcam`].
    pub fn attach_camera(&mut self, camera: Box<dyn FrameSource>) {
        self.camera = Some(camera);
        self.camera_warned = false;
    }

    /// Particles in row-major grid order; empty before the first frame.
    pub fn particles(&self) -> &[Particle] {
        self.store
            .as_ref()
            .map(ParticleStore::particles)
            .unwrap_or_default()
    }

    /// Grid dimensions, once the first frame has been observed.
    pub fn grid_dims(&self) -> Option<(usize, usize)> {
        self.store.as_ref().map(|s| (s.width(), s.height()))
    }

    /// Current simulation time.
    pub fn time(&self) -> f32 {
        self.store.as_ref().map_or(0.0, ParticleStore::time)
    }

    /// The drawing canvas.
    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    /// The drawing canvas, for frontends that draw with their own input.
    pub fn canvas_mut(&mut self) -> &mut Canvas {
        &mut self.canvas
    }

    /// The snapshot taken by the last `start_transform`.
    pub fn frozen_frame(&self) -> Option<&RgbImage> {
        self.frozen_frame.as_ref()
    }

    /// The loaded target image.
    pub fn target_image(&self) -> Option<&RgbImage> {
        self.target.as_ref()
    }

    /// The most recent non-empty source frame.
    pub fn current_frame(&self) -> Option<&RgbImage> {
        self.current_frame.as_ref()
    }

    /// Runs one frame: poll the input, track grid size, recolor, and step
    /// the motion model.
    pub fn update(&mut self) {
        if let Some(frame) = self.poll_input() {
            self.observe_frame(frame);
        }

        let Some(store) = self.store.as_mut() else {
            return;
        };
        let transforming = self.phase == Phase::Transforming;
        let active = if transforming {
            self.frozen_frame.as_ref()
        } else {
            self.current_frame.as_ref()
        };
        if let Some(image) = active {
            store.recolor(image);
        }
        store.step(&self.params, self.flow.as_ref(), transforming);
    }

    /// Frame from the active input, if any.
    fn poll_input(&mut self) -> Option<RgbImage> {
        match self.input_mode {
            InputMode::Webcam => match self.camera.as_mut() {
                Some(camera) => camera.next_frame(),
                None => {
                    if !self.camera_warned {
                        warn!("webcam input selected but no camera is attached");
                        self.camera_warned = true;
                    }
                    None
                }
            },
            InputMode::Image => self.static_image.clone(),
            InputMode::Canvas => Some(self.canvas.image().clone()),
        }
    }

    /// Records a new live frame, creating or resizing the grid as needed.
    fn observe_frame(&mut self, frame: RgbImage) {
        let Some((width, height)) =
            frame::grid_dims(frame.width(), frame.height(), self.config.max_grid_side)
        else {
            return;
        };

        match self.store.as_mut() {
            None => match ParticleStore::new(width, height) {
                Ok(store) => {
                    info!("first frame observed, grid {width}x{height}");
                    self.store = Some(store);
                    self.phase = Phase::Idle;
                }
                Err(e) => {
                    warn!("could not create particle grid: {e}");
                    return;
                }
            },
            Some(store) => match store.ensure_grid(width, height) {
                Ok(true) if self.phase == Phase::Transforming => {
                    warn!("grid resized to {width}x{height} mid-transform, targets reset");
                }
                Ok(true) => debug!("grid resized to {width}x{height}"),
                Ok(false) => {}
                Err(e) => {
                    warn!("could not resize particle grid: {e}");
                    return;
                }
            },
        }
        self.current_frame = Some(frame);
    }

    /// Freezes the current frame, sorts it against the target and sends the
    /// particles on their way.
    ///
    /// Fails with `MissingTarget` or `MissingSource`, leaving all state
    /// unchanged, when either image is unavailable. Calling it while already
    /// transforming re-freezes and re-sorts without resetting motion.
    pub fn start_transform(&mut self) -> Result<(), LumaError> {
        let Some(target) = self.target.as_ref() else {
            warn!("start_transform: no target image loaded");
            return Err(LumaError::MissingTarget);
        };
        let (Some(frame), Some(store)) = (self.current_frame.as_ref(), self.store.as_mut()) else {
            warn!("start_transform: no source frame available");
            return Err(LumaError::MissingSource);
        };

        let frozen = frame.clone();
        let mapping = sort_image(&frozen, target, store.width(), store.height());
        if !store.apply_mapping(&mapping) {
            warn!("start_transform: empty mapping, particle targets unchanged");
        }
        self.frozen_frame = Some(frozen);
        self.phase = Phase::Transforming;
        info!(
            "transform started on {}x{} grid",
            store.width(),
            store.height()
        );
        Ok(())
    }

    /// Returns to idle and rewinds the simulation clock.
    ///
    /// The frozen frame and particle targets are kept until the next start.
    pub fn stop_transform(&mut self) {
        if let Some(store) = self.store.as_mut() {
            store.reset_time();
        }
        if self.phase == Phase::Transforming {
            self.phase = Phase::Idle;
            info!("transform stopped");
        }
    }

    /// Whether particles are currently moving toward their targets.
    pub fn is_transforming(&self) -> bool {
        self.phase == Phase::Transforming
    }

    /// Current motion parameters.
    pub fn params(&self) -> MotionParams {
        self.params
    }

    /// Replaces the motion parameters, clamping them to their ranges.
    pub fn set_params(&mut self, params: MotionParams) {
        self.params = params.clamped();
    }

    pub fn input_mode(&self) -> InputMode {
        self.input_mode
    }

    pub fn set_input_mode(&mut self, mode: InputMode) {
        self.input_mode = mode;
    }

    /// Loads the image used in [`InputMode::Image`].
    pub fn load_source_image(&mut self, image: RgbImage) -> Result<(), LumaError> {
        if frame::is_empty(&image) {
            warn!("load_source_image: image is empty");
            return Err(LumaError::EmptyImage("source".into()));
        }
        info!("source image loaded ({}x{})", image.width(), image.height());
        self.static_image = Some(image);
        Ok(())
    }

    /// Loads the image the source morphs into.
    pub fn load_target_image(&mut self, image: RgbImage) -> Result<(), LumaError> {
        if frame::is_empty(&image) {
            warn!("load_target_image: image is empty");
            return Err(LumaError::EmptyImage("target".into()));
        }
        info!("target image loaded ({}x{})", image.width(), image.height());
        self.target = Some(image);
        Ok(())
    }
}
