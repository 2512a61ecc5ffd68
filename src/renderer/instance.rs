//! Per-instance GPU records and snapshot batching
//!
//! One linear instance buffer per frame. Groups are contiguous ranges in
//! draw order, so a group's first instance is the running sum of the
//! counts before it.

use std::collections::HashSet;

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::palette;
use crate::sim::{Body, EntityId, EntityRef, Particle, Player, Snapshot};

/// Packed per-instance attributes (must match the shaders' instance inputs)
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct InstanceRaw {
    /// World-space centre
    pub position: [f32; 3],
    /// Seconds left; zero for entities without a lifetime
    pub life: f32,
    pub size: [f32; 3],
    pub initial_life: f32,
    pub color: [f32; 4],
}

impl InstanceRaw {
    const ATTRIBS: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
        3 => Float32x3,
        4 => Float32,
        5 => Float32x3,
        6 => Float32,
        7 => Float32x4,
    ];

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<InstanceRaw>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBS,
        }
    }

    fn new(center: Vec3, size: Vec3, color: [f32; 4]) -> Self {
        Self {
            position: center.to_array(),
            life: 0.0,
            size: size.to_array(),
            initial_life: 0.0,
            color,
        }
    }

    fn with_life(mut self, life: f32, initial_life: f32) -> Self {
        self.life = life;
        self.initial_life = initial_life;
        self
    }
}

/// What a group of instances is drawn as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstanceKind {
    Ship,
    Invader,
    Laser,
    Particle,
    /// Additive billboards: engine exhaust and particle glow
    Flame,
}

impl InstanceKind {
    /// Submission order. Flames go last so they are truncated first.
    pub const DRAW_ORDER: [InstanceKind; 5] = [
        InstanceKind::Ship,
        InstanceKind::Invader,
        InstanceKind::Laser,
        InstanceKind::Particle,
        InstanceKind::Flame,
    ];

    fn slot(self) -> usize {
        match self {
            InstanceKind::Ship => 0,
            InstanceKind::Invader => 1,
            InstanceKind::Laser => 2,
            InstanceKind::Particle => 3,
            InstanceKind::Flame => 4,
        }
    }
}

/// A contiguous run of instances drawn with one call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawGroup {
    pub kind: InstanceKind,
    pub first_instance: u32,
    pub count: u32,
}

/// One frame's packed instances
#[derive(Debug, Clone, Default)]
pub struct InstanceBatch {
    pub instances: Vec<InstanceRaw>,
    /// Non-empty groups in draw order
    pub groups: Vec<DrawGroup>,
    /// Instances skipped because the capacity was reached
    pub dropped: usize,
}

impl InstanceBatch {
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn group(&self, kind: InstanceKind) -> Option<&DrawGroup> {
        self.groups.iter().find(|g| g.kind == kind)
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.instances)
    }
}

/// Exhaust flame just below the ship's hull
fn engine_flame(player: &Player) -> InstanceRaw {
    let size = Vec3::new(player.size.x * 0.35, player.size.y * 0.9, 0.0);
    let center = Vec3::new(
        player.center().x,
        player.position.y - size.y * 0.35,
        player.center().z,
    );
    InstanceRaw::new(center, size, palette::ENGINE_FLAME).with_life(1.0, 1.0)
}

/// Glow billboard that fades with its particle
fn particle_glow(particle: &Particle) -> InstanceRaw {
    InstanceRaw::new(particle.center(), particle.size * 3.0, particle.color)
        .with_life(particle.life, particle.initial_life)
}

fn resolve(
    entity: EntityRef<'_>,
    player_lasers: &HashSet<EntityId>,
) -> (InstanceKind, InstanceRaw) {
    let body = entity.body();
    match entity {
        EntityRef::Player(_) => (
            InstanceKind::Ship,
            InstanceRaw::new(body.center(), body.size(), palette::SHIP),
        ),
        EntityRef::Invader(inv) => (
            InstanceKind::Invader,
            InstanceRaw::new(body.center(), body.size(), palette::invader_row(inv.row)),
        ),
        EntityRef::Laser(laser) => {
            let color = if player_lasers.contains(&laser.id) {
                palette::PLAYER_LASER
            } else {
                palette::INVADER_LASER
            };
            (
                InstanceKind::Laser,
                InstanceRaw::new(body.center(), body.size(), color),
            )
        }
        EntityRef::Particle(p) => (
            InstanceKind::Particle,
            InstanceRaw::new(body.center(), body.size(), p.color)
                .with_life(p.life, p.initial_life),
        ),
    }
}

/// Group a snapshot by kind and pack at most `capacity` instances.
///
/// Order within a kind is snapshot order. Once the capacity is reached the
/// remaining instances of the frame are skipped and counted in `dropped`.
pub fn pack(snapshot: &Snapshot<'_>, capacity: usize) -> InstanceBatch {
    let player_lasers: HashSet<EntityId> = snapshot.player_lasers.iter().map(|l| l.id).collect();

    let mut per_kind: [Vec<InstanceRaw>; 5] = Default::default();
    for entity in snapshot.entities() {
        let (kind, raw) = resolve(entity, &player_lasers);
        per_kind[kind.slot()].push(raw);
    }

    let flames = &mut per_kind[InstanceKind::Flame.slot()];
    flames.push(engine_flame(snapshot.player));
    flames.extend(snapshot.particles.iter().map(particle_glow));

    let total: usize = per_kind.iter().map(Vec::len).sum();
    let mut batch = InstanceBatch {
        instances: Vec::with_capacity(total.min(capacity)),
        groups: Vec::new(),
        dropped: 0,
    };

    for kind in InstanceKind::DRAW_ORDER {
        let room = capacity - batch.instances.len();
        let list = &per_kind[kind.slot()];
        let take = list.len().min(room);
        if take == 0 {
            continue;
        }
        batch.groups.push(DrawGroup {
            kind,
            first_instance: batch.instances.len() as u32,
            count: take as u32,
        });
        batch.instances.extend_from_slice(&list[..take]);
    }

    batch.dropped = total - batch.instances.len();
    batch
}
