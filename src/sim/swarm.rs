//! Lockstep invader swarm
//!
//! All invaders share one direction and one speed. Wall contact is detected
//! on the *predicted* positions before anything is committed.

use glam::Vec3;

use super::entity::{EntityId, Invader};
use crate::tuning::Tuning;

/// Horizontal heading of the swarm
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    pub fn sign(self) -> f32 {
        match self {
            Direction::Left => -1.0,
            Direction::Right => 1.0,
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}

/// Gap kept between a wall and an invader clamped on a flip tick
pub const WALL_INSET: f32 = 1.0;

/// Shared swarm motion state
#[derive(Debug, Clone, PartialEq)]
pub struct Swarm {
    pub direction: Direction,
    pub speed: f32,
}

impl Swarm {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            direction: Direction::Right,
            speed: tuning.swarm_speed,
        }
    }

    /// Advance every invader by one tick. Returns true if the swarm flipped.
    ///
    /// On a flip tick nobody moves sideways: the heading reverses, speed
    /// rises by the increment, everyone drops once, and any invader whose
    /// prediction crossed a wall is pinned just inside it.
    pub fn advance(
        &mut self,
        invaders: &mut [Invader],
        dt: f32,
        tuning: &Tuning,
        world_width: f32,
    ) -> bool {
        let step = self.direction.sign() * self.speed * dt;

        let crosses_wall = invaders.iter().any(|inv| {
            let next_x = inv.position.x + step;
            next_x < 0.0 || next_x + inv.size.x > world_width
        });

        if !crosses_wall {
            for inv in invaders.iter_mut() {
                inv.position.x += step;
            }
            return false;
        }

        self.direction = self.direction.flipped();
        self.speed += tuning.swarm_speed_increment;

        for inv in invaders.iter_mut() {
            let next_x = inv.position.x + step;
            if next_x < 0.0 {
                inv.position.x = WALL_INSET;
            } else if next_x + inv.size.x > world_width {
                inv.position.x = world_width - inv.size.x - WALL_INSET;
            }
            inv.position.y -= tuning.swarm_drop;
        }

        log::debug!(
            "Swarm flipped to {:?}, speed {:.1}",
            self.direction,
            self.speed
        );
        true
    }
}

/// Build the canonical starting grid, row-major from the top row
pub fn spawn_grid(tuning: &Tuning, mut next_id: impl FnMut() -> EntityId) -> Vec<Invader> {
    let size = Vec3::new(
        tuning.invader_width,
        tuning.invader_height,
        tuning.invader_depth,
    );
    let mut invaders = Vec::with_capacity((tuning.invader_rows * tuning.invader_cols) as usize);

    for row in 0..tuning.invader_rows {
        for col in 0..tuning.invader_cols {
            invaders.push(Invader {
                id: next_id(),
                position: Vec3::new(
                    tuning.grid_left + col as f32 * tuning.invader_spacing_x,
                    tuning.grid_top - row as f32 * tuning.invader_spacing_y,
                    -size.z / 2.0,
                ),
                size,
                row,
            });
        }
    }

    invaders
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::WORLD_WIDTH;
    use proptest::prelude::*;

    fn grid(tuning: &Tuning) -> Vec<Invader> {
        let mut id = 0;
        spawn_grid(tuning, || {
            id += 1;
            id
        })
    }

    #[test]
    fn test_grid_layout() {
        let tuning = Tuning::default();
        let invaders = grid(&tuning);
        assert_eq!(invaders.len(), 55);

        // Row 0 is the top row
        assert_eq!(invaders[0].row, 0);
        assert_eq!(invaders[0].position.y, tuning.grid_top);
        assert_eq!(invaders[54].row, 4);
        assert!(invaders[54].position.y < invaders[0].position.y);

        // Ids are distinct
        let ids: std::collections::HashSet<_> = invaders.iter().map(|i| i.id).collect();
        assert_eq!(ids.len(), 55);
    }

    #[test]
    fn test_moves_without_flip() {
        let tuning = Tuning::default();
        let mut invaders = grid(&tuning);
        let mut swarm = Swarm::new(&tuning);
        let before = invaders[0].position;

        let flipped = swarm.advance(&mut invaders, 0.5, &tuning, WORLD_WIDTH);
        assert!(!flipped);
        assert_eq!(invaders[0].position.x, before.x + tuning.swarm_speed * 0.5);
        assert_eq!(invaders[0].position.y, before.y);
        assert_eq!(swarm.direction, Direction::Right);
    }

    #[test]
    fn test_flip_drops_speeds_up_and_insets() {
        let tuning = Tuning::default();
        let mut invaders = grid(&tuning);
        // Push the rightmost column to the brink of the wall
        let shift = WORLD_WIDTH - tuning.grid_right() - 0.1;
        for inv in &mut invaders {
            inv.position.x += shift;
        }
        let before: Vec<Vec3> = invaders.iter().map(|i| i.position).collect();
        let mut swarm = Swarm::new(&tuning);

        let flipped = swarm.advance(&mut invaders, 0.1, &tuning, WORLD_WIDTH);
        assert!(flipped);
        assert_eq!(swarm.direction, Direction::Left);
        assert_eq!(swarm.speed, tuning.swarm_speed + tuning.swarm_speed_increment);

        for (inv, old) in invaders.iter().zip(&before) {
            assert_eq!(inv.position.y, old.y - tuning.swarm_drop);
            let step = tuning.swarm_speed * 0.1;
            let crossed = old.x + step + inv.size.x > WORLD_WIDTH;
            if crossed {
                assert_eq!(inv.position.x, WORLD_WIDTH - inv.size.x - WALL_INSET);
            } else {
                assert_eq!(inv.position.x, old.x);
            }
        }
    }

    #[test]
    fn test_no_immediate_reflip_after_inset() {
        let tuning = Tuning::default();
        let mut invaders = grid(&tuning);
        let shift = WORLD_WIDTH - tuning.grid_right() - 0.1;
        for inv in &mut invaders {
            inv.position.x += shift;
        }
        let mut swarm = Swarm::new(&tuning);

        assert!(swarm.advance(&mut invaders, 1.0 / 60.0, &tuning, WORLD_WIDTH));
        assert!(!swarm.advance(&mut invaders, 1.0 / 60.0, &tuning, WORLD_WIDTH));
        assert_eq!(swarm.direction, Direction::Left);
    }

    proptest! {
        #[test]
        fn prop_direction_flips_at_most_once_per_tick(
            dts in prop::collection::vec(0.0f32..0.1, 1..400)
        ) {
            let tuning = Tuning::default();
            let mut invaders = grid(&tuning);
            let mut swarm = Swarm::new(&tuning);

            for dt in dts {
                let before = swarm.direction;
                let speed_before = swarm.speed;
                let flipped = swarm.advance(&mut invaders, dt, &tuning, WORLD_WIDTH);
                if flipped {
                    prop_assert_eq!(swarm.direction, before.flipped());
                    prop_assert_eq!(swarm.speed, speed_before + tuning.swarm_speed_increment);
                } else {
                    prop_assert_eq!(swarm.direction, before);
                }
                for inv in &invaders {
                    prop_assert!(inv.position.x >= 0.0);
                    prop_assert!(inv.position.x + inv.size.x <= WORLD_WIDTH);
                }
            }
        }
    }
}
