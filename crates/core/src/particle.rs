//! Particle store and motion model.
//!
//! One [`Particle`] lives on every cell of the simulation grid. While idle,
//! particles sit on their grid origins. While transforming, each particle is
//! steered toward the target the sorter assigned it, perturbed by a
//! [`FlowSource`], and integrated with a damped explicit step:
//!
//! ```text
//! acceleration += steer + flow
//! velocity     += acceleration
//! position     += velocity
//! acceleration  = 0
//! velocity     *= 0.90
//! ```
//!
//! Color always follows the grid cell, never the particle's position.

use glam::{Vec2, Vec4};
use image::RgbImage;
use log::debug;
use rayon::prelude::*;

use crate::error::LumaError;
use crate::flow_field::FlowSource;
use crate::frame;
use crate::params::MotionParams;
use crate::sorter::Mapping;

/// Velocity multiplier applied after every transforming step.
pub const DAMPING: f32 = 0.90;
/// Simulation time added per transforming step.
pub const TIME_STEP: f32 = 0.01;
/// Distances to the target at or below this produce no steering.
pub const ARRIVAL_EPSILON: f32 = 1e-4;

/// Normalized coordinate of cell `(x, y)` on a `width × height` grid.
fn grid_coord(x: u32, y: u32, width: usize, height: usize) -> Vec2 {
    Vec2::new(
        x as f32 / width.saturating_sub(1).max(1) as f32,
        y as f32 / height.saturating_sub(1).max(1) as f32,
    )
}

/// A single pixel rendered as a moving point.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    /// Current position in normalized [0, 1] space.
    pub position: Vec2,
    pub velocity: Vec2,
    pub acceleration: Vec2,
    /// Destination assigned by the last sort, normalized.
    pub target: Vec2,
    /// RGBA color in [0, 1].
    pub color: Vec4,
}

impl Particle {
    /// A resting particle at `origin` with its target on itself.
    pub fn at_rest(origin: Vec2) -> Self {
        Self {
            position: origin,
            velocity: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            target: origin,
            color: Vec4::new(0.0, 0.0, 0.0, 1.0),
        }
    }

    /// Advances this particle by one damped step toward its target.
    fn integrate(&mut self, params: &MotionParams, flow: &dyn FlowSource, time: f32) {
        let desired = self.target - self.position;
        let steer = if desired.length() > ARRIVAL_EPSILON {
            desired.normalize() * params.particle_speed
        } else {
            Vec2::ZERO
        };
        let drift = flow.force(self.position, time, params.noise_scale) * params.flow_strength;

        self.acceleration += steer + drift;
        self.velocity += self.acceleration;
        self.position += self.velocity;
        self.acceleration = Vec2::ZERO;
        self.velocity *= DAMPING;
    }
}

/// Owns every particle of the grid plus the global simulation clock.
#[derive(Debug, Clone)]
pub struct ParticleStore {
    width: usize,
    height: usize,
    particles: Vec<Particle>,
    time: f32,
}

impl ParticleStore {
    /// Creates a store with one resting particle per cell.
    ///
    /// Returns `LumaError::InvalidDimensions` if either dimension is zero
    /// or if `width * height` overflows `usize`.
    pub fn new(width: usize, height: usize) -> Result<Self, LumaError> {
        let mut store = Self {
            width: 0,
            height: 0,
            particles: Vec::new(),
            time: 0.0,
        };
        store.rebuild(width, height)?;
        Ok(store)
    }

    /// Grid width in cells.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Grid height in cells.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of particles, always `width * height`.
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    /// Always false: a store has at least one cell.
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Read-only access to the particles in row-major grid order.
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Current simulation time.
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Resets the simulation clock to zero.
    pub fn reset_time(&mut self) {
        self.time = 0.0;
    }

    /// Normalized coordinate of grid cell `(x, y)`.
    ///
    /// Each axis is divided by its own `dimension - 1`, so the grid spans the
    /// full unit square whatever its aspect ratio. A single-cell axis maps to 0.
    pub fn normalize(&self, x: u32, y: u32) -> Vec2 {
        grid_coord(x, y, self.width, self.height)
    }

    /// Normalized grid origin of the particle at flat index `index`.
    pub fn origin(&self, index: usize) -> Vec2 {
        self.normalize((index % self.width) as u32, (index / self.width) as u32)
    }

    /// Discards every particle and lays out a fresh resting grid.
    ///
    /// Any in-flight transform state is lost.
    pub fn rebuild(&mut self, width: usize, height: usize) -> Result<(), LumaError> {
        if width == 0 || height == 0 {
            return Err(LumaError::InvalidDimensions);
        }
        let count = width
            .checked_mul(height)
            .ok_or(LumaError::InvalidDimensions)?;
        self.width = width;
        self.height = height;
        self.particles = (0..count)
            .map(|i| Particle::at_rest(self.origin(i)))
            .collect();
        debug!("rebuilt particle grid {width}x{height} ({count} particles)");
        Ok(())
    }

    /// Rebuilds the grid only if its dimensions differ from the current ones.
    ///
    /// Returns whether a rebuild happened.
    pub fn ensure_grid(&mut self, width: usize, height: usize) -> Result<bool, LumaError> {
        if width == self.width && height == self.height {
            return Ok(false);
        }
        self.rebuild(width, height)?;
        Ok(true)
    }

    /// Writes a sorter mapping into the particle targets.
    ///
    /// An empty mapping, or one whose length does not match the grid, leaves
    /// every target untouched and returns false.
    pub fn apply_mapping(&mut self, mapping: &Mapping) -> bool {
        if mapping.is_empty() || mapping.len() != self.particles.len() {
            return false;
        }
        let (w, h) = (self.width, self.height);
        for (particle, &cell) in self.particles.iter_mut().zip(mapping) {
            particle.target = grid_coord(cell.x, cell.y, w, h);
        }
        true
    }

    /// Copies each grid cell's color from `image`, resampled to the grid.
    ///
    /// An empty image leaves colors unchanged.
    pub fn recolor(&mut self, image: &RgbImage) {
        if frame::is_empty(image) {
            return;
        }
        let grid = frame::resample(image, self.width, self.height);
        for (particle, pixel) in self.particles.iter_mut().zip(grid.pixels()) {
            let [r, g, b] = pixel.0;
            particle.color = Vec4::new(
                r as f32 / 255.0,
                g as f32 / 255.0,
                b as f32 / 255.0,
                1.0,
            );
        }
    }

    /// Pins every particle to its grid origin with zero velocity and
    /// acceleration.
    pub fn settle(&mut self) {
        let (w, h) = (self.width, self.height);
        self.particles
            .par_iter_mut()
            .enumerate()
            .for_each(|(i, particle)| {
                particle.position = grid_coord((i % w) as u32, (i / w) as u32, w, h);
                particle.velocity = Vec2::ZERO;
                particle.acceleration = Vec2::ZERO;
            });
    }

    /// Advances the motion model by one frame.
    ///
    /// While idle every particle is pinned to its origin and the clock does
    /// not move. While transforming every particle integrates one damped step
    /// and the clock advances by [`TIME_STEP`].
    pub fn step(&mut self, params: &MotionParams, flow: &dyn FlowSource, transforming: bool) {
        if !transforming {
            self.settle();
            return;
        }
        let time = self.time;
        self.particles
            .par_iter_mut()
            .for_each(|particle| particle.integrate(params, flow, time));
        self.time += TIME_STEP;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow_field::PerlinFlow;
    use glam::UVec2;
    use image::Rgb;

    /// Flow source that never pushes.
    struct Still;

    impl FlowSource for Still {
        fn force(&self, _position: Vec2, _time: f32, _scale: f32) -> Vec2 {
            Vec2::ZERO
        }
    }

    fn store(width: usize, height: usize) -> ParticleStore {
        ParticleStore::new(width, height).unwrap()
    }

    fn assert_at_origins(store: &ParticleStore) {
        for (i, p) in store.particles().iter().enumerate() {
            assert_eq!(p.position, store.origin(i), "particle {i} off its origin");
            assert_eq!(p.velocity, Vec2::ZERO);
            assert_eq!(p.acceleration, Vec2::ZERO);
        }
    }

    #[test]
    fn new_creates_one_particle_per_cell() {
        let s = store(4, 3);
        assert_eq!(s.len(), 12);
        assert_eq!(s.width(), 4);
        assert_eq!(s.height(), 3);
        assert!(!s.is_empty());
    }

    #[test]
    fn new_with_zero_dimensions_returns_error() {
        assert!(matches!(
            ParticleStore::new(0, 5),
            Err(LumaError::InvalidDimensions)
        ));
        assert!(matches!(
            ParticleStore::new(5, 0),
            Err(LumaError::InvalidDimensions)
        ));
    }

    #[test]
    fn origins_span_unit_square_per_axis() {
        let s = store(5, 3);
        assert_eq!(s.origin(0), Vec2::new(0.0, 0.0));
        assert_eq!(s.origin(4), Vec2::new(1.0, 0.0));
        assert_eq!(s.origin(14), Vec2::new(1.0, 1.0));
        assert_eq!(s.origin(7), Vec2::new(0.5, 0.5));
    }

    #[test]
    fn single_cell_axis_normalizes_to_zero() {
        let s = store(1, 3);
        assert_eq!(s.origin(2), Vec2::new(0.0, 1.0));
        assert!(s.particles().iter().all(|p| p.position.is_finite()));
    }

    #[test]
    fn fresh_particles_rest_on_their_targets() {
        let s = store(3, 3);
        for p in s.particles() {
            assert_eq!(p.position, p.target);
        }
        assert_at_origins(&s);
    }

    #[test]
    fn rebuild_same_dimensions_twice_is_idempotent() {
        let mut s = store(6, 4);
        s.rebuild(6, 4).unwrap();
        let first = s.particles().to_vec();
        s.rebuild(6, 4).unwrap();
        assert_eq!(s.len(), 24);
        assert_eq!(s.particles(), first.as_slice());
        assert_at_origins(&s);
    }

    #[test]
    fn ensure_grid_only_rebuilds_on_change() {
        let mut s = store(4, 4);
        assert!(!s.ensure_grid(4, 4).unwrap());
        assert!(s.ensure_grid(8, 2).unwrap());
        assert_eq!(s.len(), 16);
        assert_eq!(s.width(), 8);
    }

    #[test]
    fn rebuild_discards_motion_state() {
        let mut s = store(2, 2);
        s.apply_mapping(&vec![UVec2::new(1, 1); 4]);
        for _ in 0..5 {
            s.step(&MotionParams::default(), &Still, true);
        }
        s.rebuild(3, 1).unwrap();
        assert_eq!(s.len(), 3);
        assert_at_origins(&s);
        for p in s.particles() {
            assert_eq!(p.target, p.position);
        }
    }

    #[test]
    fn apply_mapping_normalizes_targets() {
        let mut s = store(3, 2);
        let mapping: Mapping = (0..6).rev().map(|i| UVec2::new(i % 3, i / 3)).collect();
        assert!(s.apply_mapping(&mapping));
        assert_eq!(s.particles()[0].target, Vec2::new(1.0, 1.0));
        assert_eq!(s.particles()[5].target, Vec2::new(0.0, 0.0));
    }

    #[test]
    fn empty_mapping_leaves_targets_unchanged() {
        let mut s = store(2, 2);
        let before = s.particles().to_vec();
        assert!(!s.apply_mapping(&Mapping::new()));
        assert_eq!(s.particles(), before.as_slice());
    }

    #[test]
    fn mismatched_mapping_is_ignored() {
        let mut s = store(2, 2);
        let before = s.particles().to_vec();
        assert!(!s.apply_mapping(&vec![UVec2::ZERO; 3]));
        assert_eq!(s.particles(), before.as_slice());
    }

    #[test]
    fn recolor_copies_cell_colors() {
        let mut s = store(2, 1);
        let img = RgbImage::from_fn(2, 1, |x, _| {
            if x == 0 {
                Rgb([255, 0, 0])
            } else {
                Rgb([0, 0, 255])
            }
        });
        s.recolor(&img);
        assert_eq!(s.particles()[0].color, Vec4::new(1.0, 0.0, 0.0, 1.0));
        assert_eq!(s.particles()[1].color, Vec4::new(0.0, 0.0, 1.0, 1.0));
    }

    #[test]
    fn recolor_ignores_position() {
        let mut s = store(2, 1);
        s.apply_mapping(&vec![UVec2::new(1, 0), UVec2::new(0, 0)]);
        for _ in 0..50 {
            s.step(&MotionParams::default(), &Still, true);
        }
        let img = RgbImage::from_fn(2, 1, |x, _| Rgb([x as u8 * 200, 0, 0]));
        s.recolor(&img);
        assert_eq!(s.particles()[0].color.x, 0.0);
        assert!((s.particles()[1].color.x - 200.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn recolor_resamples_larger_images() {
        let mut s = store(3, 3);
        s.recolor(&RgbImage::from_pixel(30, 17, Rgb([51, 102, 153])));
        for p in s.particles() {
            assert!((p.color.x - 0.2).abs() < 1e-6);
            assert!((p.color.y - 0.4).abs() < 1e-6);
            assert!((p.color.z - 0.6).abs() < 1e-6);
            assert_eq!(p.color.w, 1.0);
        }
    }

    #[test]
    fn recolor_with_empty_image_keeps_colors() {
        let mut s = store(2, 2);
        s.recolor(&RgbImage::from_pixel(2, 2, Rgb([255, 255, 255])));
        s.recolor(&RgbImage::new(0, 0));
        assert!(s.particles().iter().all(|p| p.color == Vec4::ONE));
    }

    #[test]
    fn idle_step_pins_particles_to_origins() {
        let mut s = store(4, 4);
        s.apply_mapping(&(0..16).rev().map(|i| UVec2::new(i % 4, i / 4)).collect());
        for _ in 0..20 {
            s.step(&MotionParams::default(), &PerlinFlow::default(), true);
        }
        assert!(s.time() > 0.0);
        s.step(&MotionParams::default(), &PerlinFlow::default(), false);
        assert_at_origins(&s);
    }

    #[test]
    fn idle_step_does_not_advance_time() {
        let mut s = store(2, 2);
        s.step(&MotionParams::default(), &Still, false);
        assert_eq!(s.time(), 0.0);
    }

    #[test]
    fn transforming_step_advances_time() {
        let mut s = store(2, 2);
        s.step(&MotionParams::default(), &Still, true);
        s.step(&MotionParams::default(), &Still, true);
        assert!((s.time() - 2.0 * TIME_STEP).abs() < 1e-7);
        s.reset_time();
        assert_eq!(s.time(), 0.0);
    }

    #[test]
    fn first_step_follows_damped_update_order() {
        let mut s = store(2, 1);
        s.apply_mapping(&vec![UVec2::new(1, 0), UVec2::new(1, 0)]);
        let params = MotionParams {
            particle_speed: 0.01,
            flow_strength: 0.0,
            noise_scale: 5.0,
        };
        s.step(&params, &Still, true);
        let p = s.particles()[0];
        // steer = (0.01, 0); velocity = steer; position += velocity; velocity *= 0.9
        assert!((p.position.x - 0.01).abs() < 1e-7, "position {}", p.position);
        assert!((p.velocity.x - 0.009).abs() < 1e-7, "velocity {}", p.velocity);
        assert_eq!(p.acceleration, Vec2::ZERO);

        let arrived = s.particles()[1];
        assert_eq!(arrived.position, Vec2::new(1.0, 0.0));
        assert_eq!(arrived.velocity, Vec2::ZERO);
    }

    #[test]
    fn transforming_particles_approach_targets() {
        let mut s = store(8, 8);
        s.apply_mapping(&(0..64).rev().map(|i| UVec2::new(i % 8, i / 8)).collect());
        let distance = |s: &ParticleStore| -> f32 {
            s.particles()
                .iter()
                .map(|p| (p.target - p.position).length())
                .sum()
        };
        let before = distance(&s);
        for _ in 0..30 {
            s.step(&MotionParams::default(), &Still, true);
        }
        assert!(distance(&s) < before, "particles did not move closer");
    }

    #[test]
    fn particle_at_target_without_flow_stays_put() {
        let mut s = store(3, 3);
        for _ in 0..10 {
            s.step(&MotionParams::default(), &Still, true);
        }
        assert_at_origins(&s);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn params() -> impl Strategy<Value = MotionParams> {
            (0.001_f32..=0.1, 0.0_f32..=0.001, 1.0_f32..=20.0).prop_map(
                |(particle_speed, flow_strength, noise_scale)| MotionParams {
                    particle_speed,
                    flow_strength,
                    noise_scale,
                },
            )
        }

        proptest! {
            #[test]
            fn no_nans_produced(
                w in 1usize..=6,
                h in 1usize..=6,
                steps in 1usize..60,
                params in params(),
                seed in any::<u32>(),
            ) {
                let mut s = ParticleStore::new(w, h).unwrap();
                let n = (w * h) as u32;
                let mapping: Mapping = (0..n).rev().map(|i| UVec2::new(i % w as u32, i / w as u32)).collect();
                s.apply_mapping(&mapping);
                let flow = PerlinFlow::new(seed);
                for _ in 0..steps {
                    s.step(&params, &flow, true);
                }
                for p in s.particles() {
                    prop_assert!(p.position.is_finite(), "position {}", p.position);
                    prop_assert!(p.velocity.is_finite(), "velocity {}", p.velocity);
                }
            }

            #[test]
            fn idle_positions_independent_of_history(
                w in 1usize..=6,
                h in 1usize..=6,
                steps in 0usize..40,
                params in params(),
            ) {
                let mut s = ParticleStore::new(w, h).unwrap();
                let n = (w * h) as u32;
                let mapping: Mapping = (0..n).map(|i| UVec2::new((i * 7) % w as u32, (i * 3) % h as u32)).collect();
                s.apply_mapping(&mapping);
                for _ in 0..steps {
                    s.step(&params, &PerlinFlow::default(), true);
                }
                s.step(&params, &PerlinFlow::default(), false);
                for (i, p) in s.particles().iter().enumerate() {
                    prop_assert_eq!(p.position, s.origin(i));
                    prop_assert_eq!(p.velocity, Vec2::ZERO);
                }
            }
        }
    }
}
