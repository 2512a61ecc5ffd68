//! Data-driven game balance
//!
//! Every gameplay constant lives in [`Tuning`]. Defaults describe the
//! canonical round; a JSON document can override any subset of fields.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::WORLD_WIDTH;

/// Errors produced while loading or validating a tuning document
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("failed to parse tuning document: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invader grid must have at least one row and one column (got {rows}x{cols})")]
    EmptyGrid { rows: u32, cols: u32 },
    #[error("invader grid spans x {left}..{right}, outside the world")]
    GridTooWide { left: f32, right: f32 },
    #[error("{name} must be a probability in [0, 1] (got {value})")]
    Probability { name: &'static str, value: f32 },
    #[error("{name} range is inverted ({min} > {max})")]
    InvertedRange {
        name: &'static str,
        min: f32,
        max: f32,
    },
    #[error("{name} must be positive (got {value})")]
    NotPositive { name: &'static str, value: f32 },
    #[error("{name} must not be negative (got {value})")]
    Negative { name: &'static str, value: f32 },
}

/// Gameplay tuning values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Player ===
    pub player_width: f32,
    pub player_height: f32,
    pub player_depth: f32,
    /// Fixed baseline (bottom edge) of the ship
    pub player_y: f32,
    /// Horizontal speed (units/second)
    pub player_speed: f32,
    /// Minimum wall-clock gap between shots (milliseconds)
    pub fire_cooldown_ms: f64,
    pub initial_lives: u32,

    // === Lasers ===
    pub laser_width: f32,
    pub laser_height: f32,
    pub laser_depth: f32,
    /// Player laser speed along +y
    pub player_laser_speed: f32,
    /// Invader laser speed along -y
    pub invader_laser_speed: f32,

    // === Invader grid ===
    pub invader_rows: u32,
    pub invader_cols: u32,
    pub invader_width: f32,
    pub invader_height: f32,
    pub invader_depth: f32,
    pub invader_spacing_x: f32,
    pub invader_spacing_y: f32,
    /// Left edge of column 0
    pub grid_left: f32,
    /// Bottom edge of row 0 (the top row)
    pub grid_top: f32,

    // === Swarm ===
    pub swarm_speed: f32,
    pub swarm_speed_increment: f32,
    pub swarm_drop: f32,
    /// Per-invader, per-tick chance of firing
    pub invader_fire_chance: f32,

    // === Particles ===
    pub gravity: f32,
    pub invader_explosion_particles: u32,
    pub player_explosion_particles: u32,
    pub particle_speed_min: f32,
    pub particle_speed_max: f32,
    pub particle_life_min: f32,
    pub particle_life_max: f32,
    pub particle_size: f32,
    /// Upper bound on live particles
    pub max_particles: usize,

    // === Camera ===
    pub camera_offset_speed: f32,
    /// Offset is clamped to [-limit, limit]
    pub camera_offset_limit: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            player_width: 50.0,
            player_height: 30.0,
            player_depth: 30.0,
            player_y: 30.0,
            player_speed: 300.0,
            fire_cooldown_ms: 300.0,
            initial_lives: 3,

            laser_width: 4.0,
            laser_height: 15.0,
            laser_depth: 4.0,
            player_laser_speed: 500.0,
            invader_laser_speed: 250.0,

            invader_rows: 5,
            invader_cols: 11,
            invader_width: 40.0,
            invader_height: 30.0,
            invader_depth: 30.0,
            invader_spacing_x: 55.0,
            invader_spacing_y: 45.0,
            grid_left: 80.0,
            grid_top: 520.0,

            swarm_speed: 40.0,
            swarm_speed_increment: 5.0,
            swarm_drop: 20.0,
            invader_fire_chance: 0.0005,

            gravity: 300.0,
            invader_explosion_particles: 20,
            player_explosion_particles: 40,
            particle_speed_min: 50.0,
            particle_speed_max: 200.0,
            particle_life_min: 0.5,
            particle_life_max: 1.5,
            particle_size: 4.0,
            max_particles: 2048,

            camera_offset_speed: 200.0,
            camera_offset_limit: 150.0,
        }
    }
}

impl Tuning {
    /// Parse a (possibly partial) JSON document over the defaults and validate it
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Right edge of the last grid column at round start
    pub fn grid_right(&self) -> f32 {
        self.grid_left
            + self.invader_cols.saturating_sub(1) as f32 * self.invader_spacing_x
            + self.invader_width
    }

    pub fn laser_size(&self) -> Vec3 {
        Vec3::new(self.laser_width, self.laser_height, self.laser_depth)
    }

    /// Check every constraint the simulation relies on
    pub fn validate(&self) -> Result<(), TuningError> {
        if self.invader_rows == 0 || self.invader_cols == 0 {
            return Err(TuningError::EmptyGrid {
                rows: self.invader_rows,
                cols: self.invader_cols,
            });
        }
        if self.grid_left < 0.0 || self.grid_right() > WORLD_WIDTH {
            return Err(TuningError::GridTooWide {
                left: self.grid_left,
                right: self.grid_right(),
            });
        }
        if !(0.0..=1.0).contains(&self.invader_fire_chance) {
            return Err(TuningError::Probability {
                name: "invader_fire_chance",
                value: self.invader_fire_chance,
            });
        }

        let positive = [
            ("player_width", self.player_width),
            ("player_height", self.player_height),
            ("player_depth", self.player_depth),
            ("player_speed", self.player_speed),
            ("laser_width", self.laser_width),
            ("laser_height", self.laser_height),
            ("laser_depth", self.laser_depth),
            ("player_laser_speed", self.player_laser_speed),
            ("invader_laser_speed", self.invader_laser_speed),
            ("invader_width", self.invader_width),
            ("invader_height", self.invader_height),
            ("invader_depth", self.invader_depth),
            ("swarm_speed", self.swarm_speed),
            ("particle_size", self.particle_size),
            ("particle_life_min", self.particle_life_min),
            ("camera_offset_speed", self.camera_offset_speed),
        ];
        for (name, value) in positive {
            if value.is_nan() || value <= 0.0 {
                return Err(TuningError::NotPositive { name, value });
            }
        }

        // Zero is allowed; a zero camera limit locks the camera
        let non_negative = [
            ("swarm_speed_increment", self.swarm_speed_increment),
            ("swarm_drop", self.swarm_drop),
            ("gravity", self.gravity),
            ("particle_speed_min", self.particle_speed_min),
            ("camera_offset_limit", self.camera_offset_limit),
        ];
        for (name, value) in non_negative {
            if value.is_nan() || value < 0.0 {
                return Err(TuningError::Negative { name, value });
            }
        }

        let ranges = [
            ("particle_speed", self.particle_speed_min, self.particle_speed_max),
            ("particle_life", self.particle_life_min, self.particle_life_max),
        ];
        for (name, min, max) in ranges {
            if min > max {
                return Err(TuningError::InvertedRange { name, min, max });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let tuning = Tuning::default();
        assert!(tuning.validate().is_ok());
        assert_eq!(tuning.invader_rows, 5);
        assert_eq!(tuning.invader_cols, 11);
        assert!(tuning.grid_right() <= WORLD_WIDTH);
    }

    #[test]
    fn test_partial_document_keeps_defaults() {
        let tuning = Tuning::from_json(r#"{ "initial_lives": 5, "swarm_speed": 60.0 }"#)
            .expect("valid document");
        assert_eq!(tuning.initial_lives, 5);
        assert_eq!(tuning.swarm_speed, 60.0);
        assert_eq!(tuning.fire_cooldown_ms, Tuning::default().fire_cooldown_ms);
    }

    #[test]
    fn test_rejects_bad_json() {
        assert!(matches!(
            Tuning::from_json("{ not json"),
            Err(TuningError::Parse(_))
        ));
    }

    #[test]
    fn test_rejects_empty_grid() {
        let err = Tuning::from_json(r#"{ "invader_rows": 0 }"#).unwrap_err();
        assert!(matches!(err, TuningError::EmptyGrid { rows: 0, .. }));
    }

    #[test]
    fn test_rejects_grid_wider_than_world() {
        let err = Tuning::from_json(r#"{ "invader_cols": 20 }"#).unwrap_err();
        assert!(matches!(err, TuningError::GridTooWide { .. }));
    }

    #[test]
    fn test_rejects_probability_out_of_range() {
        let err = Tuning::from_json(r#"{ "invader_fire_chance": 1.5 }"#).unwrap_err();
        assert!(matches!(err, TuningError::Probability { .. }));
    }

    #[test]
    fn test_rejects_inverted_range() {
        let err =
            Tuning::from_json(r#"{ "particle_life_min": 2.0, "particle_life_max": 1.0 }"#)
                .unwrap_err();
        assert!(matches!(
            err,
            TuningError::InvertedRange {
                name: "particle_life",
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_negative_camera_limit() {
        let err = Tuning::from_json(r#"{ "camera_offset_limit": -10.0 }"#).unwrap_err();
        assert!(matches!(
            err,
            TuningError::Negative {
                name: "camera_offset_limit",
                ..
            }
        ));
    }

    #[test]
    fn test_zero_camera_limit_locks_camera() {
        let tuning = Tuning::from_json(r#"{ "camera_offset_limit": 0.0 }"#).expect("valid");
        assert_eq!(tuning.camera_offset_limit, 0.0);
    }

    #[test]
    fn test_rejects_stalled_swarm_and_reversed_camera_speed() {
        let err = Tuning::from_json(r#"{ "swarm_speed": 0.0 }"#).unwrap_err();
        assert!(matches!(
            err,
            TuningError::NotPositive {
                name: "swarm_speed",
                ..
            }
        ));

        let err = Tuning::from_json(r#"{ "camera_offset_speed": -5.0 }"#).unwrap_err();
        assert!(matches!(
            err,
            TuningError::NotPositive {
                name: "camera_offset_speed",
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_flat_depths_and_negative_gravity() {
        for field in ["player_depth", "laser_depth", "invader_depth"] {
            let json = format!(r#"{{ "{field}": 0.0 }}"#);
            assert!(matches!(
                Tuning::from_json(&json),
                Err(TuningError::NotPositive { name, .. }) if name == field
            ));
        }
        let err = Tuning::from_json(r#"{ "gravity": -1.0 }"#).unwrap_err();
        assert!(matches!(err, TuningError::Negative { name: "gravity", .. }));
    }
}
