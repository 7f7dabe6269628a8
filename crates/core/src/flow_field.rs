//! Noise-driven flow field that perturbs particle motion.
//!
//! A [`FlowSource`] maps a normalized position, a simulation time and a
//! spatial scale to a unit direction. The motion model scales that direction
//! by its configured flow strength.
//!
//! All implementations are deterministic: same inputs produce the same output.

use std::f64::consts::PI;

use glam::Vec2;
use noise::{NoiseFn, Perlin};

/// Rate at which simulation time advances through the noise volume.
const TIME_FACTOR: f64 = 0.5;
/// Noise output in [-1, 1] spans two full turns.
const ANGLE_SPAN: f64 = 4.0 * PI;

/// A source of unit-length force directions.
///
/// Must be deterministic and safe to sample from many threads at once.
pub trait FlowSource: Send + Sync {
    /// Direction of the field at `position` at the given `time`, sampled
    /// with spatial frequency `scale`. The result has length 1.
    fn force(&self, position: Vec2, time: f32, scale: f32) -> Vec2;
}

/// Flow field built on 3D Perlin noise, with time as the third axis.
#[derive(Clone)]
pub struct PerlinFlow {
    noise: Perlin,
    seed: u32,
}

impl PerlinFlow {
    /// Creates a flow field over Perlin noise with the given seed.
    pub fn new(seed: u32) -> Self {
        Self {
            noise: Perlin::new(seed),
            seed,
        }
    }

    /// Seed of the underlying noise generator.
    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Raw scalar noise at the sample point, nominally in [-1, 1].
    fn sample(&self, position: Vec2, time: f32, scale: f32) -> f64 {
        let scale = scale as f64;
        self.noise.get([
            position.x as f64 * scale,
            position.y as f64 * scale,
            time as f64 * TIME_FACTOR,
        ])
    }
}

impl std::fmt::Debug for PerlinFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PerlinFlow").field("seed", &self.seed).finish()
    }
}

impl Default for PerlinFlow {
    fn default() -> Self {
        Self::new(Perlin::DEFAULT_SEED)
    }
}

impl FlowSource for PerlinFlow {
    fn force(&self, position: Vec2, time: f32, scale: f32) -> Vec2 {
        let angle = self.sample(position, time, scale) * ANGLE_SPAN;
        Vec2::new(angle.cos() as f32, angle.sin() as f32)
    }
}
