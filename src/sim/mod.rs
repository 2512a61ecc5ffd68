//! Simulation module
//!
//! All gameplay logic lives here. Rules for this module:
//! - Seeded RNG only
//! - Stable iteration order (insertion order, removal by id)
//! - No rendering or platform dependencies

pub mod collision;
pub mod entity;
pub mod particles;
pub mod state;
pub mod swarm;
pub mod tick;

pub use collision::{InvaderKill, SwarmHits, resolve_invader_lasers, resolve_player_lasers};
pub use entity::{Aabb, Body, EntityId, EntityRef, Invader, Laser, ModelKind, Particle, Player};
pub use particles::{spawn_explosion, update_particles};
pub use state::{GamePhase, GameState, Hud, RoundOutcome, Snapshot};
pub use swarm::{Direction, Swarm, spawn_grid};
