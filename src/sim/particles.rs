//! Explosion particles
//!
//! Purely visual: particles never collide. They fall under constant gravity
//! and are purged on the tick their life runs out.

use std::f32::consts::{FRAC_PI_2, TAU};

use glam::Vec3;
use rand::Rng;

use super::entity::{EntityId, Particle};
use crate::tuning::Tuning;

/// Spawn a spherical burst of `count` particles at `origin`.
///
/// Bursts are truncated once `particles` holds `tuning.max_particles`.
/// Returns how many particles were actually spawned.
pub fn spawn_explosion(
    particles: &mut Vec<Particle>,
    rng: &mut impl Rng,
    mut next_id: impl FnMut() -> EntityId,
    origin: Vec3,
    count: u32,
    color: [f32; 4],
    tuning: &Tuning,
) -> u32 {
    let room = tuning.max_particles.saturating_sub(particles.len());
    let count = (count as usize).min(room);
    let size = Vec3::splat(tuning.particle_size);

    for _ in 0..count {
        let azimuth = rng.random_range(0.0..TAU);
        let pitch = rng.random_range(-FRAC_PI_2..=FRAC_PI_2);
        let speed = rng.random_range(tuning.particle_speed_min..=tuning.particle_speed_max);
        let life = rng.random_range(tuning.particle_life_min..=tuning.particle_life_max);

        let direction = Vec3::new(
            pitch.cos() * azimuth.cos(),
            pitch.sin(),
            pitch.cos() * azimuth.sin(),
        );

        particles.push(Particle {
            id: next_id(),
            position: origin - size * 0.5,
            size,
            velocity: direction * speed,
            life,
            initial_life: life,
            color,
        });
    }

    count as u32
}

/// Apply gravity, integrate, age, and drop every particle whose life ran out
pub fn update_particles(particles: &mut Vec<Particle>, dt: f32, gravity: f32) {
    for p in particles.iter_mut() {
        p.velocity.y -= gravity * dt;
        p.position += p.velocity * dt;
        p.life -= dt;
    }
    particles.retain(|p| p.life > 0.0);
}
