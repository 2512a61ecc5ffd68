//! Collision resolution between lasers and targets
//!
//! Resolution only *collects* what was hit. Callers apply the removals in a
//! single filter pass afterwards so no collection is mutated mid-iteration.

use std::collections::HashSet;

use glam::Vec3;

use super::entity::{Body, EntityId, Invader, Laser, Player};

/// A player laser destroying an invader
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvaderKill {
    pub laser_id: EntityId,
    pub invader_id: EntityId,
    pub row: u32,
    pub center: Vec3,
}

/// Everything consumed by player lasers in one tick
#[derive(Debug, Clone, Default)]
pub struct SwarmHits {
    pub lasers_to_remove: HashSet<EntityId>,
    pub invaders_to_remove: HashSet<EntityId>,
    /// Kills in detection order
    pub kills: Vec<InvaderKill>,
}

impl SwarmHits {
    pub fn is_empty(&self) -> bool {
        self.kills.is_empty()
    }
}

/// Test every player laser against every invader.
///
/// A pair is skipped once either side is marked, so each laser destroys at
/// most one invader and each invader absorbs at most one laser per tick.
/// When a laser overlaps several invaders, the first in `invaders` order wins.
pub fn resolve_player_lasers(lasers: &[Laser], invaders: &[Invader]) -> SwarmHits {
    let mut hits = SwarmHits::default();

    for laser in lasers {
        let laser_box = laser.aabb();
        for invader in invaders {
            if hits.lasers_to_remove.contains(&laser.id)
                || hits.invaders_to_remove.contains(&invader.id)
            {
                continue;
            }
            if laser_box.overlaps(&invader.aabb()) {
                hits.lasers_to_remove.insert(laser.id);
                hits.invaders_to_remove.insert(invader.id);
                hits.kills.push(InvaderKill {
                    laser_id: laser.id,
                    invader_id: invader.id,
                    row: invader.row,
                    center: invader.center(),
                });
            }
        }
    }

    hits
}

/// Every invader laser currently overlapping the player, in collection order.
///
/// There is no early exit: simultaneous hits are all reported.
pub fn resolve_invader_lasers(lasers: &[Laser], player: &Player) -> Vec<EntityId> {
    let player_box = player.aabb();
    lasers
        .iter()
        .filter(|laser| laser.aabb().overlaps(&player_box))
        .map(|laser| laser.id)
        .collect()
}

/// Drop every entity whose id is in `ids`, preserving order
pub fn remove_ids<T>(items: &mut Vec<T>, ids: &HashSet<EntityId>, id_of: impl Fn(&T) -> EntityId) {
    if ids.is_empty() {
        return;
    }
    items.retain(|item| !ids.contains(&id_of(item)));
}
