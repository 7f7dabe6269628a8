#![deny(unsafe_code)]
//! Core of the lumasort image-morphing system.
//!
//! Provides the luminance-rank pixel sorter, the Perlin `FlowSource`, the
//! `ParticleStore` motion model, the `TransformController` state machine and
//! its `MorphControls` surface, plus the drawing `Canvas` and `MotionParams`.

pub mod canvas;
pub mod controller;
pub mod controls;
pub mod error;
pub mod flow_field;
pub mod frame;
pub mod params;
pub mod particle;
pub mod sorter;

pub use canvas::{BrushSettings, Canvas, DrawTool};
pub use controller::{ControllerConfig, FrameSource, InputMode, Phase, TransformController};
pub use controls::MorphControls;
pub use error::LumaError;
pub use flow_field::{FlowSource, PerlinFlow};
pub use params::MotionParams;
pub use particle::{Particle, ParticleStore};
pub use sorter::{sort_image, Mapping};
