//! Game state and round lifecycle
//!
//! All gameplay state is owned here. The renderer only ever sees a
//! read-only [`Snapshot`].

use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::entity::{EntityId, EntityRef, Invader, Laser, Particle, Player};
use super::swarm::{Swarm, spawn_grid};
use crate::consts::WORLD_WIDTH;
use crate::input::KeyBindings;
use crate::tuning::Tuning;

/// Current phase of play
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// Waiting for the player to start a round
    StartMenu,
    /// Active gameplay
    Playing,
    /// Round ended; only `restart` leaves this phase
    GameOver,
}

/// Why a round ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundOutcome {
    /// Every invader destroyed
    Cleared,
    /// An invader reached the player's baseline
    Overrun,
    /// Player ran out of lives
    Destroyed,
}

/// Monotonic id source shared by every entity category
#[derive(Debug, Clone)]
pub struct IdAllocator {
    next: EntityId,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl IdAllocator {
    pub fn next(&mut self) -> EntityId {
        let id = self.next;
        self.next += 1;
        id
    }
}

/// Values the UI layer needs each frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hud {
    pub phase: GamePhase,
    pub score: u64,
    pub lives: u32,
    pub camera_offset: f32,
    pub outcome: Option<RoundOutcome>,
}

/// Read-only view of every live entity for one frame
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    pub hud: Hud,
    pub player: &'a Player,
    pub invaders: &'a [Invader],
    pub player_lasers: &'a [Laser],
    pub invader_lasers: &'a [Laser],
    pub particles: &'a [Particle],
}

impl<'a> Snapshot<'a> {
    /// Every entity in insertion order: ship, invaders, player lasers,
    /// invader lasers, particles
    pub fn entities(&self) -> impl Iterator<Item = EntityRef<'a>> + use<'a> {
        std::iter::once(EntityRef::Player(self.player))
            .chain(self.invaders.iter().map(EntityRef::Invader))
            .chain(self.player_lasers.iter().map(EntityRef::Laser))
            .chain(self.invader_lasers.iter().map(EntityRef::Laser))
            .chain(self.particles.iter().map(EntityRef::Particle))
    }

    pub fn entity_count(&self) -> usize {
        1 + self.invaders.len()
            + self.player_lasers.len()
            + self.invader_lasers.len()
            + self.particles.len()
    }
}

/// Complete simulation state
#[derive(Debug, Clone)]
pub struct GameState {
    pub tuning: Tuning,
    pub keys: KeyBindings,
    pub phase: GamePhase,
    pub outcome: Option<RoundOutcome>,
    pub score: u64,
    pub lives: u32,
    /// User-controlled vertical camera offset
    pub camera_offset: f32,
    pub player: Player,
    /// Remaining swarm, row-major from the top row
    pub invaders: Vec<Invader>,
    pub swarm: Swarm,
    pub player_lasers: Vec<Laser>,
    pub invader_lasers: Vec<Laser>,
    pub particles: Vec<Particle>,
    /// Wall-clock time (ms) of the last player shot
    pub last_fire_ms: Option<f64>,
    pub(crate) ids: IdAllocator,
    pub(crate) rng: Pcg32,
}

impl GameState {
    /// Fresh state in the start menu with the canonical round laid out
    pub fn new(seed: u64, tuning: Tuning) -> Self {
        let mut ids = IdAllocator::default();
        let player = Player::new(ids.next(), &tuning, WORLD_WIDTH);
        let invaders = spawn_grid(&tuning, || ids.next());

        Self {
            keys: KeyBindings::default(),
            phase: GamePhase::StartMenu,
            outcome: None,
            score: 0,
            lives: tuning.initial_lives,
            camera_offset: 0.0,
            player,
            invaders,
            swarm: Swarm::new(&tuning),
            player_lasers: Vec::new(),
            invader_lasers: Vec::new(),
            particles: Vec::new(),
            last_fire_ms: None,
            ids,
            rng: Pcg32::seed_from_u64(seed),
            tuning,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> EntityId {
        self.ids.next()
    }

    /// Restore the canonical round layout. The phase is left untouched.
    pub fn reset(&mut self) {
        self.score = 0;
        self.lives = self.tuning.initial_lives;
        self.outcome = None;
        self.camera_offset = 0.0;
        self.player = Player::new(self.ids.next(), &self.tuning, WORLD_WIDTH);
        self.invaders = spawn_grid(&self.tuning, || self.ids.next());
        self.swarm = Swarm::new(&self.tuning);
        self.player_lasers.clear();
        self.invader_lasers.clear();
        self.particles.clear();
        self.last_fire_ms = None;
    }

    /// Begin play from the start menu. Returns false in any other phase.
    pub fn start(&mut self) -> bool {
        if self.phase != GamePhase::StartMenu {
            log::warn!("Ignoring start request in {:?}", self.phase);
            return false;
        }
        self.phase = GamePhase::Playing;
        log::info!("Round started");
        true
    }

    /// Reset the round and go back to the start menu
    pub fn restart(&mut self) {
        self.reset();
        self.phase = GamePhase::StartMenu;
        log::info!("Round reset, back to start menu");
    }

    /// End the round (no-op if already over)
    pub(crate) fn end_round(&mut self, outcome: RoundOutcome) {
        if self.phase == GamePhase::GameOver {
            return;
        }
        self.phase = GamePhase::GameOver;
        self.outcome = Some(outcome);
        log::info!("Game over ({:?}) with score {}", outcome, self.score);
    }

    pub fn hud(&self) -> Hud {
        Hud {
            phase: self.phase,
            score: self.score,
            lives: self.lives,
            camera_offset: self.camera_offset,
            outcome: self.outcome,
        }
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            hud: self.hud(),
            player: &self.player,
            invaders: &self.invaders,
            player_lasers: &self.player_lasers,
            invader_lasers: &self.invader_lasers,
            particles: &self.particles,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::ModelKind;

    #[test]
    fn test_new_state_waits_in_menu() {
        let state = GameState::new(1, Tuning::default());
        assert_eq!(state.phase, GamePhase::StartMenu);
        assert_eq!(state.invaders.len(), 55);
        assert_eq!(state.lives, 3);
        assert_eq!(state.score, 0);
    }

    #[test]
    fn test_phase_machine() {
        let mut state = GameState::new(1, Tuning::default());
        assert!(state.start());
        assert_eq!(state.phase, GamePhase::Playing);

        // Already playing
        assert!(!state.start());

        state.end_round(RoundOutcome::Overrun);
        assert_eq!(state.phase, GamePhase::GameOver);
        assert_eq!(state.outcome, Some(RoundOutcome::Overrun));

        // GameOver only leaves through restart
        assert!(!state.start());
        state.restart();
        assert_eq!(state.phase, GamePhase::StartMenu);
        assert_eq!(state.outcome, None);
        assert!(state.start());
    }

    #[test]
    fn test_first_outcome_wins() {
        let mut state = GameState::new(1, Tuning::default());
        state.start();
        state.end_round(RoundOutcome::Destroyed);
        state.end_round(RoundOutcome::Cleared);
        assert_eq!(state.outcome, Some(RoundOutcome::Destroyed));
    }

    #[test]
    fn test_ids_unique_across_reset() {
        let mut state = GameState::new(1, Tuning::default());
        let first: Vec<EntityId> = state.invaders.iter().map(|i| i.id).collect();
        state.reset();
        assert!(state.invaders.iter().all(|i| !first.contains(&i.id)));
        assert!(!first.contains(&state.player.id));
    }

    #[test]
    fn test_ids_continue_past_u32_range() {
        let start = EntityId::from(u32::MAX);
        let mut ids = IdAllocator { next: start };
        assert_eq!(ids.next(), start);
        assert_eq!(ids.next(), start + 1);
        assert_eq!(ids.next(), start + 2);
    }

    #[test]
    fn test_snapshot_lists_entities_in_order() {
        let state = GameState::new(1, Tuning::default());
        let snapshot = state.snapshot();
        let kinds: Vec<ModelKind> = snapshot.entities().map(|e| e.model_kind()).collect();

        assert_eq!(kinds.len(), snapshot.entity_count());
        assert_eq!(kinds[0], ModelKind::Ship);
        assert!(kinds[1..].iter().all(|k| *k == ModelKind::Invader));
        assert_eq!(snapshot.hud.phase, GamePhase::StartMenu);
    }
}
