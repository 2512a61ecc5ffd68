//! Per-frame simulation step
//!
//! Variable timestep driven by wall-clock `dt`. The step order below is
//! load-bearing: later steps may remove entities earlier steps just placed.

use std::collections::HashSet;

use rand::Rng;

use super::collision::{remove_ids, resolve_invader_lasers, resolve_player_lasers};
use super::entity::{Body, Laser};
use super::particles::{spawn_explosion, update_particles};
use super::state::{GamePhase, GameState, RoundOutcome};
use crate::audio::{AudioSink, SoundEffect};
use crate::consts::{MAX_FRAME_DT, WORLD_HEIGHT, WORLD_WIDTH};
use crate::input::{InputSource, Intent};
use crate::palette;

impl GameState {
    /// Advance the round by `dt` seconds. `now_ms` is the wall clock used
    /// for the fire cooldown. Does nothing outside `Playing`.
    pub fn update(
        &mut self,
        input: &(impl InputSource + ?Sized),
        audio: &mut (impl AudioSink + ?Sized),
        dt: f32,
        now_ms: f64,
    ) {
        if self.phase != GamePhase::Playing {
            return;
        }
        let dt = dt.clamp(0.0, MAX_FRAME_DT);
        let intent = Intent::poll(input, &self.keys);

        // 1. Ship and camera movement
        self.player
            .move_by(intent.horizontal() * self.tuning.player_speed * dt, WORLD_WIDTH);
        let limit = self.tuning.camera_offset_limit.max(0.0);
        self.camera_offset = (self.camera_offset
            + intent.vertical() * self.tuning.camera_offset_speed * dt)
            .clamp(-limit, limit);

        // 2. Player fire
        if intent.fire && self.fire_ready(now_ms) {
            self.fire_player_laser(now_ms);
            audio.play(SoundEffect::PlayerShoot);
        }

        // 3. Lasers
        for laser in self.player_lasers.iter_mut().chain(self.invader_lasers.iter_mut()) {
            laser.advance(dt);
        }
        self.player_lasers.retain(|l| l.in_bounds(WORLD_HEIGHT));
        self.invader_lasers.retain(|l| l.in_bounds(WORLD_HEIGHT));

        // 4. Particles
        update_particles(&mut self.particles, dt, self.tuning.gravity);

        // 5. Swarm
        self.swarm
            .advance(&mut self.invaders, dt, &self.tuning, WORLD_WIDTH);

        // 6. Invader fire
        let laser_size = self.tuning.laser_size();
        for invader in &self.invaders {
            if self.rng.random::<f32>() < self.tuning.invader_fire_chance {
                self.invader_lasers.push(Laser::new(
                    self.ids.next(),
                    invader.underside(laser_size),
                    laser_size,
                    -self.tuning.invader_laser_speed,
                ));
                audio.play(SoundEffect::InvaderShoot);
            }
        }

        // 7. Collisions
        self.resolve_collisions(audio);

        // 8. Terminal checks
        if self.phase == GamePhase::Playing {
            let baseline = self.player.position.y + self.player.size.y;
            if self.invaders.is_empty() {
                self.end_round(RoundOutcome::Cleared);
            } else if self.invaders.iter().any(|inv| inv.position.y <= baseline) {
                self.end_round(RoundOutcome::Overrun);
            }
        }
    }

    /// Cooldown is wall-clock, strictly greater than the configured gap
    fn fire_ready(&self, now_ms: f64) -> bool {
        self.last_fire_ms
            .is_none_or(|last| now_ms - last > self.tuning.fire_cooldown_ms)
    }

    fn fire_player_laser(&mut self, now_ms: f64) {
        let size = self.tuning.laser_size();
        let laser = Laser::new(
            self.ids.next(),
            self.player.muzzle(size),
            size,
            self.tuning.player_laser_speed,
        );
        self.player_lasers.push(laser);
        self.last_fire_ms = Some(now_ms);
    }

    fn resolve_collisions(&mut self, audio: &mut (impl AudioSink + ?Sized)) {
        let hits = resolve_player_lasers(&self.player_lasers, &self.invaders);
        for kill in &hits.kills {
            let rows = self.tuning.invader_rows;
            self.score += 10 * u64::from(rows.saturating_sub(kill.row));
            audio.play(SoundEffect::InvaderKilled);
            let spawned = spawn_explosion(
                &mut self.particles,
                &mut self.rng,
                || self.ids.next(),
                kill.center,
                self.tuning.invader_explosion_particles,
                palette::invader_row(kill.row),
                &self.tuning,
            );
            if spawned < self.tuning.invader_explosion_particles {
                log::debug!("Particle cap reached, burst truncated to {spawned}");
            }
        }
        remove_ids(&mut self.player_lasers, &hits.lasers_to_remove, |l| l.id);
        remove_ids(&mut self.invaders, &hits.invaders_to_remove, |i| i.id);

        let player_hits = resolve_invader_lasers(&self.invader_lasers, &self.player);
        for _ in &player_hits {
            audio.play(SoundEffect::PlayerDeath);
            spawn_explosion(
                &mut self.particles,
                &mut self.rng,
                || self.ids.next(),
                self.player.center(),
                self.tuning.player_explosion_particles,
                palette::PLAYER_EXPLOSION,
                &self.tuning,
            );
            self.lives = self.lives.saturating_sub(1);
            if self.lives == 0 {
                self.end_round(RoundOutcome::Destroyed);
            }
        }
        if !player_hits.is_empty() {
            let ids: HashSet<_> = player_hits.into_iter().collect();
            remove_ids(&mut self.invader_lasers, &ids, |l| l.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::KeyState;
    use crate::sim::entity::{EntityId, Invader};
    use crate::sim::swarm::Swarm;
    use crate::tuning::Tuning;
    use glam::Vec3;
    use proptest::prelude::*;

    const DT: f32 = 1.0 / 60.0;

    #[derive(Default)]
    struct RecordingAudio {
        played: Vec<SoundEffect>,
    }

    impl AudioSink for RecordingAudio {
        fn play(&mut self, effect: SoundEffect) {
            self.played.push(effect);
        }
    }

    /// Started round with no random invader fire
    fn quiet_state() -> GameState {
        let tuning = Tuning {
            invader_fire_chance: 0.0,
            ..Tuning::default()
        };
        let mut state = GameState::new(42, tuning);
        state.start();
        state
    }

    /// Player laser centred on `center`, returns its id
    fn push_player_laser(state: &mut GameState, center: Vec3) -> EntityId {
        let size = state.tuning.laser_size();
        let speed = state.tuning.player_laser_speed;
        let id = state.next_entity_id();
        state
            .player_lasers
            .push(Laser::new(id, center - size * 0.5, size, speed));
        id
    }

    fn push_invader_laser(state: &mut GameState, center: Vec3) -> EntityId {
        let size = state.tuning.laser_size();
        let speed = -state.tuning.invader_laser_speed;
        let id = state.next_entity_id();
        state
            .invader_lasers
            .push(Laser::new(id, center - size * 0.5, size, speed));
        id
    }

    #[test]
    fn test_update_is_noop_outside_playing() {
        let mut state = GameState::new(1, Tuning::default());
        let mut keys = KeyState::new();
        keys.press("ArrowLeft");
        keys.press("Space");
        let before = state.player.position;

        state.update(&keys, &mut RecordingAudio::default(), DT, 1000.0);
        assert_eq!(state.player.position, before);
        assert!(state.player_lasers.is_empty());
    }

    #[test]
    fn test_full_fire_chance_arms_every_invader() {
        let tuning = Tuning {
            invader_fire_chance: 1.0,
            ..Tuning::default()
        };
        let mut state = GameState::new(9, tuning);
        state.start();
        let mut audio = RecordingAudio::default();

        state.update(&KeyState::new(), &mut audio, DT, 1000.0);

        let laser_size = state.tuning.laser_size();
        assert_eq!(state.invader_lasers.len(), state.invaders.len());
        for (laser, invader) in state.invader_lasers.iter().zip(&state.invaders) {
            assert_eq!(laser.position, invader.underside(laser_size));
            assert_eq!(laser.velocity_y, -state.tuning.invader_laser_speed);
        }
        assert_eq!(audio.played.len(), 55);
        assert!(audio.played.iter().all(|e| *e == SoundEffect::InvaderShoot));
    }

    #[test]
    fn test_zero_fire_chance_never_fires() {
        let mut state = quiet_state();
        let mut audio = RecordingAudio::default();
        for tick in 0..120 {
            state.update(&KeyState::new(), &mut audio, DT, f64::from(tick) * 16.0);
        }
        assert!(state.invader_lasers.is_empty());
        assert!(audio.played.is_empty());
    }

    #[test]
    fn test_negative_camera_limit_does_not_panic() {
        let tuning = Tuning {
            invader_fire_chance: 0.0,
            camera_offset_limit: -10.0,
            ..Tuning::default()
        };
        let mut state = GameState::new(3, tuning);
        state.start();
        let mut keys = KeyState::new();
        keys.press("ArrowUp");

        state.update(&keys, &mut RecordingAudio::default(), DT, 1000.0);
        assert_eq!(state.camera_offset, 0.0);
    }

    #[test]
    fn test_top_row_kill_scores_fifty() {
        let mut state = quiet_state();
        let mut audio = RecordingAudio::default();

        // Top row, centre column
        let target = state.invaders[5].clone();
        assert_eq!(target.row, 0);
        let laser_id = push_player_laser(&mut state, target.center());

        state.update(&KeyState::new(), &mut audio, DT, 1000.0);

        assert_eq!(state.score, 50);
        assert_eq!(state.invaders.len(), 54);
        assert!(state.invaders.iter().all(|i| i.id != target.id));
        assert!(state.player_lasers.iter().all(|l| l.id != laser_id));
        assert_eq!(
            state.particles.len(),
            state.tuning.invader_explosion_particles as usize
        );
        assert_eq!(audio.played, vec![SoundEffect::InvaderKilled]);
        assert_eq!(state.phase, GamePhase::Playing);
    }

    #[test]
    fn test_bottom_row_scores_ten() {
        let mut state = quiet_state();
        let target = state.invaders[54].clone();
        assert_eq!(target.row, 4);
        push_player_laser(&mut state, target.center());

        state.update(&KeyState::new(), &mut RecordingAudio::default(), DT, 1000.0);
        assert_eq!(state.score, 10);
    }

    #[test]
    fn test_last_life_lost_ends_round() {
        let mut state = quiet_state();
        state.lives = 1;
        let mut audio = RecordingAudio::default();
        let center = state.player.center();
        push_invader_laser(&mut state, center);

        state.update(&KeyState::new(), &mut audio, DT, 1000.0);

        assert_eq!(state.lives, 0);
        assert_eq!(state.phase, GamePhase::GameOver);
        assert_eq!(state.outcome, Some(RoundOutcome::Destroyed));
        assert!(state.invader_lasers.is_empty());
        assert_eq!(
            state.particles.len(),
            state.tuning.player_explosion_particles as usize
        );
        assert_eq!(audio.played, vec![SoundEffect::PlayerDeath]);
    }

    #[test]
    fn test_simultaneous_hits_each_cost_a_life() {
        let mut state = quiet_state();
        let center = state.player.center();
        push_invader_laser(&mut state, center - Vec3::X * 10.0);
        push_invader_laser(&mut state, center + Vec3::X * 10.0);

        state.update(&KeyState::new(), &mut RecordingAudio::default(), DT, 1000.0);

        assert_eq!(state.lives, state.tuning.initial_lives - 2);
        assert_eq!(state.phase, GamePhase::Playing);
        assert!(state.invader_lasers.is_empty());
    }

    #[test]
    fn test_fire_respects_cooldown() {
        let mut state = quiet_state();
        let mut audio = RecordingAudio::default();
        let mut keys = KeyState::new();
        keys.press("Space");

        let cooldown = state.tuning.fire_cooldown_ms;

        state.update(&keys, &mut audio, DT, 1000.0);
        assert_eq!(state.player_lasers.len(), 1);

        // Exactly one cooldown later is still inside the window
        state.update(&keys, &mut audio, DT, 1000.0 + cooldown);
        assert_eq!(state.player_lasers.len(), 1);

        state.update(&keys, &mut audio, DT, 1001.0 + cooldown);
        assert_eq!(state.player_lasers.len(), 2);
        assert_eq!(
            audio.played,
            vec![SoundEffect::PlayerShoot, SoundEffect::PlayerShoot]
        );
    }

    #[test]
    fn test_lasers_leave_world() {
        let mut state = quiet_state();
        push_player_laser(&mut state, Vec3::new(10.0, 595.0, 0.0));

        state.update(&KeyState::new(), &mut RecordingAudio::default(), 0.05, 0.0);
        assert!(state.player_lasers.is_empty());
    }

    #[test]
    fn test_clearing_swarm_ends_round() {
        let mut state = quiet_state();
        state.invaders.truncate(1);
        let center = state.invaders[0].center();
        push_player_laser(&mut state, center);

        state.update(&KeyState::new(), &mut RecordingAudio::default(), DT, 0.0);

        assert!(state.invaders.is_empty());
        assert_eq!(state.phase, GamePhase::GameOver);
        assert_eq!(state.outcome, Some(RoundOutcome::Cleared));
    }

    #[test]
    fn test_swarm_reaching_baseline_ends_round() {
        let mut state = quiet_state();
        let id = state.next_entity_id();
        let size = state.invaders[0].size;
        state.invaders = vec![Invader {
            id,
            position: Vec3::new(300.0, state.player.position.y + 5.0, -size.z / 2.0),
            size,
            row: 4,
        }];

        state.update(&KeyState::new(), &mut RecordingAudio::default(), DT, 0.0);
        assert_eq!(state.outcome, Some(RoundOutcome::Overrun));
    }

    #[test]
    fn test_large_dt_is_clamped() {
        let mut state = quiet_state();
        let mut keys = KeyState::new();
        keys.press("ArrowRight");
        let x = state.player.position.x;

        state.update(&keys, &mut RecordingAudio::default(), 5.0, 0.0);
        let moved = state.player.position.x - x;
        assert!(moved <= state.tuning.player_speed * MAX_FRAME_DT + 1e-3);
    }

    #[test]
    fn test_camera_offset_is_clamped() {
        let mut state = quiet_state();
        let mut keys = KeyState::new();
        keys.press("ArrowUp");
        for _ in 0..200 {
            state.update(&keys, &mut RecordingAudio::default(), DT, 0.0);
        }
        assert_eq!(state.camera_offset, state.tuning.camera_offset_limit);
    }

    #[test]
    fn test_reset_restores_canonical_round() {
        let tuning = Tuning {
            invader_fire_chance: 0.05,
            ..Tuning::default()
        };
        let fresh = GameState::new(3, tuning.clone());
        let mut state = GameState::new(3, tuning);
        state.start();

        let mut keys = KeyState::new();
        keys.press("Space");
        keys.press("KeyD");
        let mut audio = RecordingAudio::default();
        for i in 0..120 {
            state.update(&keys, &mut audio, DT, i as f64 * 16.0);
        }

        state.reset();
        assert_eq!(state.score, 0);
        assert_eq!(state.lives, fresh.lives);
        assert_eq!(state.swarm, Swarm::new(&state.tuning));
        assert_eq!(state.player.position, fresh.player.position);
        assert_eq!(state.invaders.len(), fresh.invaders.len());
        for (a, b) in state.invaders.iter().zip(&fresh.invaders) {
            assert_eq!(a.position, b.position);
            assert_eq!(a.row, b.row);
        }
        assert!(state.player_lasers.is_empty());
        assert!(state.invader_lasers.is_empty());
        assert!(state.particles.is_empty());
    }

    #[test]
    fn test_determinism() {
        let tuning = Tuning {
            invader_fire_chance: 0.01,
            ..Tuning::default()
        };
        let mut a = GameState::new(99, tuning.clone());
        let mut b = GameState::new(99, tuning);
        a.start();
        b.start();

        let mut keys = KeyState::new();
        keys.press("Space");
        for i in 0..300 {
            if i % 50 == 0 {
                keys.press("KeyA");
            } else if i % 50 == 25 {
                keys.release("KeyA");
            }
            let now = i as f64 * 16.0;
            a.update(&keys, &mut RecordingAudio::default(), DT, now);
            b.update(&keys, &mut RecordingAudio::default(), DT, now);
        }

        assert_eq!(a.score, b.score);
        assert_eq!(a.lives, b.lives);
        assert_eq!(a.invader_lasers, b.invader_lasers);
        assert_eq!(a.particles, b.particles);
    }

    proptest! {
        #[test]
        fn prop_player_stays_in_world(
            steps in prop::collection::vec((any::<bool>(), any::<bool>(), 0.0f32..0.5), 1..200)
        ) {
            let mut state = quiet_state();
            let mut keys = KeyState::new();
            let max_x = WORLD_WIDTH - state.player.size.x;

            for (left, right, dt) in steps {
                keys.clear();
                if left {
                    keys.press("ArrowLeft");
                }
                if right {
                    keys.press("KeyD");
                }
                state.update(&keys, &mut RecordingAudio::default(), dt, 0.0);
                prop_assert!(state.player.position.x >= 0.0);
                prop_assert!(state.player.position.x <= max_x);
            }
        }
    }
}
