//! Pure-computation particle rasterisation.
//!
//! This module is always available (no feature gate) so that both the `png`
//! snapshot path and any windowed frontend can share the same splatting rule.

use lumasort_core::Particle;

use crate::Viewport;

/// Multiplier applied to the cell footprint so neighbouring points overlap.
const POINT_OVERLAP: f32 = 1.5;

/// Point size, in pixels, that leaves no gaps between grid particles.
///
/// `max(1, max(viewport_w / grid_w, viewport_h / grid_h) * 1.5)`. A zero grid
/// dimension yields the minimum size of 1.
pub fn point_size(viewport: Viewport, grid_width: usize, grid_height: usize) -> f32 {
    if grid_width == 0 || grid_height == 0 {
        return 1.0;
    }
    let sx = viewport.width as f32 / grid_width as f32;
    let sy = viewport.height as f32 / grid_height as f32;
    (sx.max(sy) * POINT_OVERLAP).max(1.0)
}

/// Splats every particle into an RGBA8 buffer over a black background.
///
/// Each particle becomes an opaque square of [`point_size`] pixels centred
/// on `position * (viewport - 1)`. Particles are drawn in slice order, so
/// later particles cover earlier ones; pixels outside the viewport are
/// clipped. The buffer length is `width * height * 4`.
pub fn rasterize(
    particles: &[Particle],
    viewport: Viewport,
    grid_width: usize,
    grid_height: usize,
) -> Vec<u8> {
    let mut rgba = [0u8, 0, 0, 255].repeat(viewport.width as usize * viewport.height as usize);
    if viewport.width == 0 || viewport.height == 0 {
        return rgba;
    }

    let side = point_size(viewport, grid_width, grid_height).round().max(1.0) as i64;
    let lead = (side - 1) / 2;
    let (w, h) = (viewport.width as i64, viewport.height as i64);
    let span_x = (w - 1) as f32;
    let span_y = (h - 1) as f32;

    for particle in particles {
        if !particle.position.is_finite() {
            continue;
        }
        let cx = (particle.position.x * span_x).round() as i64;
        let cy = (particle.position.y * span_y).round() as i64;
        let x0 = (cx - lead).max(0);
        let y0 = (cy - lead).max(0);
        let x1 = (cx - lead + side - 1).min(w - 1);
        let y1 = (cy - lead + side - 1).min(h - 1);
        if x0 > x1 || y0 > y1 {
            continue;
        }
        let color = to_rgba8(particle);
        for y in y0..=y1 {
            let row = (y * w) as usize;
            for x in x0..=x1 {
                let i = (row + x as usize) * 4;
                rgba[i..i + 4].copy_from_slice(&color);
            }
        }
    }
    rgba
}

/// Converts a particle color in [0, 1] to opaque RGBA8.
fn to_rgba8(particle: &Particle) -> [u8; 4] {
    let c = particle.color.clamp(glam::Vec4::ZERO, glam::Vec4::ONE) * 255.0;
    [
        c.x.round() as u8,
        c.y.round() as u8,
        c.z.round() as u8,
        255,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec2, Vec4};
    use lumasort_core::ParticleStore;

    fn colored_store(width: usize, height: usize) -> Vec<Particle> {
        let store = ParticleStore::new(width, height).unwrap();
        store
            .particles()
            .iter()
            .enumerate()
            .map(|(i, p)| Particle {
                color: Vec4::new(i as f32 / 10.0, 0.5, 1.0 - i as f32 / 10.0, 1.0),
                ..*p
            })
            .collect()
    }

    #[test]
    fn point_size_matches_grid_footprint() {
        let size = point_size(Viewport::new(800, 600), 400, 300);
        assert!((size - 3.0).abs() < 1e-6, "got {size}");
    }

    #[test]
    fn point_size_uses_larger_axis() {
        let size = point_size(Viewport::new(800, 200), 100, 100);
        assert!((size - 12.0).abs() < 1e-6, "got {size}");
    }

    #[test]
    fn point_size_never_below_one() {
        assert_eq!(point_size(Viewport::new(10, 10), 600, 600), 1.0);
        assert_eq!(point_size(Viewport::new(10, 10), 0, 5), 1.0);
    }

    #[test]
    fn rasterize_correct_length() {
        let buf = rasterize(&[], Viewport::new(8, 4), 2, 2);
        assert_eq!(buf.len(), 8 * 4 * 4);
    }

    #[test]
    fn empty_particles_give_opaque_black() {
        let buf = rasterize(&[], Viewport::new(3, 3), 3, 3);
        assert!(buf.chunks(4).all(|px| px == [0, 0, 0, 255]));
    }

    #[test]
    fn resting_grid_at_native_size_reproduces_colors() {
        let particles = colored_store(3, 2);
        let buf = rasterize(&particles, Viewport::new(3, 2), 3, 2);
        for (i, p) in particles.iter().enumerate() {
            assert_eq!(&buf[i * 4..i * 4 + 4], &to_rgba8(p), "pixel {i}");
        }
    }

    #[test]
    fn moved_particle_is_drawn_at_its_position() {
        let mut particles = colored_store(2, 2);
        particles.truncate(1);
        particles[0].position = Vec2::new(1.0, 1.0);
        particles[0].color = Vec4::new(1.0, 0.0, 0.0, 1.0);
        let buf = rasterize(&particles, Viewport::new(5, 5), 5, 5);
        let corner = (4 * 5 + 4) * 4;
        assert_eq!(&buf[corner..corner + 4], &[255, 0, 0, 255]);
        assert_eq!(&buf[0..4], &[0, 0, 0, 255]);
    }

    #[test]
    fn out_of_range_and_nan_particles_are_skipped() {
        let mut particles = colored_store(1, 2);
        particles[0].position = Vec2::new(5.0, 5.0);
        particles[1].position = Vec2::new(f32::NAN, 0.0);
        let buf = rasterize(&particles, Viewport::new(4, 4), 1, 2);
        assert!(buf.chunks(4).all(|px| px == [0, 0, 0, 255]));
    }

    #[test]
    fn zero_viewport_yields_empty_buffer() {
        let particles = colored_store(2, 2);
        assert!(rasterize(&particles, Viewport::new(0, 10), 2, 2).is_empty());
    }

    #[test]
    fn alpha_always_255() {
        let particles = colored_store(4, 4);
        let buf = rasterize(&particles, Viewport::new(16, 16), 4, 4);
        for (i, px) in buf.chunks(4).enumerate() {
            assert_eq!(px[3], 255, "alpha at pixel {i} should be 255");
        }
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn buffer_always_covers_viewport(
                vw in 0u32..40,
                vh in 0u32..40,
                gw in 1usize..10,
                gh in 1usize..10,
                px in -2.0f32..3.0,
                py in -2.0f32..3.0,
            ) {
                let mut particles = colored_store(gw, gh);
                particles[0].position = Vec2::new(px, py);
                let buf = rasterize(&particles, Viewport::new(vw, vh), gw, gh);
                prop_assert_eq!(buf.len(), Viewport::new(vw, vh).rgba_len());
            }

            #[test]
            fn point_size_at_least_one(
                vw in 0u32..4000,
                vh in 0u32..4000,
                gw in 0usize..700,
                gh in 0usize..700,
            ) {
                prop_assert!(point_size(Viewport::new(vw, vh), gw, gh) >= 1.0);
            }
        }
    }
}
