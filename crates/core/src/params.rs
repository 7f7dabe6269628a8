//! Tunable motion parameters and the JSON helpers used to read them.
//!
//! [`MotionParams`] is the explicit configuration handed to the motion model
//! on every step. UI layers and the CLI own the canonical values and pass
//! them in; nothing here is global.
//!
//! The `param_*` helpers take a JSON value, a key name, and a default. If the
//! key is missing or the value is not the expected type, the default is
//! returned. They never fail.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Default steering magnitude per frame, in normalized units.
pub const DEFAULT_PARTICLE_SPEED: f32 = 0.005;
/// Default flow-field force magnitude per frame.
pub const DEFAULT_FLOW_STRENGTH: f32 = 0.0002;
/// Default spatial frequency of the flow field.
pub const DEFAULT_NOISE_SCALE: f32 = 5.0;

/// Slider range for `particle_speed`.
pub const PARTICLE_SPEED_RANGE: (f32, f32) = (0.001, 0.1);
/// Slider range for `flow_strength`.
pub const FLOW_STRENGTH_RANGE: (f32, f32) = (0.0, 0.001);
/// Slider range for `noise_scale`.
pub const NOISE_SCALE_RANGE: (f32, f32) = (1.0, 20.0);

/// Extracts an `f64` from `params[name]`, returning `default` if missing or wrong type.
///
/// Accepts both JSON numbers (including integers) and converts them to f64.
pub fn param_f64(params: &Value, name: &str, default: f64) -> f64 {
    params.get(name).and_then(Value::as_f64).unwrap_or(default)
}

/// Extracts a `usize` from `params[name]`, returning `default` if missing or wrong type.
///
/// Only succeeds if the JSON value is a non-negative integer that fits in `u64`,
/// then converts to `usize`.
pub fn param_usize(params: &Value, name: &str, default: usize) -> usize {
    params
        .get(name)
        .and_then(Value::as_u64)
        .map(|v| v as usize)
        .unwrap_or(default)
}

/// Physics parameters for the transforming phase of the motion model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionParams {
    /// Magnitude of the steering force toward each particle's target.
    pub particle_speed: f32,
    /// Magnitude the unit flow-field vector is scaled by.
    pub flow_strength: f32,
    /// Spatial frequency multiplier for flow-field sampling.
    pub noise_scale: f32,
}

impl Default for MotionParams {
    fn default() -> Self {
        Self {
            particle_speed: DEFAULT_PARTICLE_SPEED,
            flow_strength: DEFAULT_FLOW_STRENGTH,
            noise_scale: DEFAULT_NOISE_SCALE,
        }
    }
}

impl MotionParams {
    /// Extracts parameters from a JSON object, falling back to defaults and
    /// clamping each value to its slider range.
    pub fn from_json(params: &Value) -> Self {
        Self {
            particle_speed: param_f64(params, "particle_speed", DEFAULT_PARTICLE_SPEED as f64)
                as f32,
            flow_strength: param_f64(params, "flow_strength", DEFAULT_FLOW_STRENGTH as f64)
                as f32,
            noise_scale: param_f64(params, "noise_scale", DEFAULT_NOISE_SCALE as f64) as f32,
        }
        .clamped()
    }

    /// Returns a copy with every field clamped to its slider range.
    ///
    /// NaN inputs fall back to the default for that field.
    pub fn clamped(self) -> Self {
        fn clamp(value: f32, (lo, hi): (f32, f32), default: f32) -> f32 {
            if value.is_nan() {
                default
            } else {
                value.clamp(lo, hi)
            }
        }
        Self {
            particle_speed: clamp(
                self.particle_speed,
                PARTICLE_SPEED_RANGE,
                DEFAULT_PARTICLE_SPEED,
            ),
            flow_strength: clamp(
                self.flow_strength,
                FLOW_STRENGTH_RANGE,
                DEFAULT_FLOW_STRENGTH,
            ),
            noise_scale: clamp(self.noise_scale, NOISE_SCALE_RANGE, DEFAULT_NOISE_SCALE),
        }
    }

    /// Current values as a JSON object.
    pub fn to_json(&self) -> Value {
        json!({
            "particle_speed": self.particle_speed,
            "flow_strength": self.flow_strength,
            "noise_scale": self.noise_scale,
        })
    }

    /// Schema describing every parameter, its type, range, and default.
    pub fn schema() -> Value {
        json!({
            "particle_speed": {
                "type": "number",
                "min": PARTICLE_SPEED_RANGE.0,
                "max": PARTICLE_SPEED_RANGE.1,
                "default": DEFAULT_PARTICLE_SPEED,
                "description": "Steering force toward the assigned target per frame"
            },
            "flow_strength": {
                "type": "number",
                "min": FLOW_STRENGTH_RANGE.0,
                "max": FLOW_STRENGTH_RANGE.1,
                "default": DEFAULT_FLOW_STRENGTH,
                "description": "Scale of the noise-driven flow perturbation"
            },
            "noise_scale": {
                "type": "number",
                "min": NOISE_SCALE_RANGE.0,
                "max": NOISE_SCALE_RANGE.1,
                "default": DEFAULT_NOISE_SCALE,
                "description": "Spatial frequency of the flow field"
            }
        })
    }
}
