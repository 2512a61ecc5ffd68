//! Gameplay entities
//!
//! The entity set is small and fixed. Each kind is its own struct; the
//! [`Body`] trait exposes the bounding box the collision routine needs, and
//! [`EntityRef`] is the tagged view the renderer dispatches on.

use glam::Vec3;

use crate::tuning::Tuning;

/// Unique identity of a spawned entity
pub type EntityId = u64;

/// Model used to draw an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelKind {
    Ship,
    Invader,
    Laser,
    Particle,
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(position: Vec3, size: Vec3) -> Self {
        Self {
            min: position,
            max: position + size,
        }
    }

    /// Strict overlap on all three axes; touching faces do not count
    #[inline]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
            && self.min.z < other.max.z
            && self.max.z > other.min.z
    }
}

/// Anything with a box in world space. `position` is the min corner.
pub trait Body {
    fn position(&self) -> Vec3;
    fn size(&self) -> Vec3;

    fn center(&self) -> Vec3 {
        self.position() + self.size() * 0.5
    }

    fn aabb(&self) -> Aabb {
        Aabb::new(self.position(), self.size())
    }
}

/// Min corner for a box of `size` centred on z = 0
#[inline]
fn on_plane(x: f32, y: f32, size: Vec3) -> Vec3 {
    Vec3::new(x, y, -size.z / 2.0)
}

/// The player's ship
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub id: EntityId,
    pub position: Vec3,
    pub size: Vec3,
}

impl Player {
    /// Ship centred horizontally on its baseline
    pub fn new(id: EntityId, tuning: &Tuning, world_width: f32) -> Self {
        let size = Vec3::new(
            tuning.player_width,
            tuning.player_height,
            tuning.player_depth,
        );
        Self {
            id,
            position: on_plane((world_width - size.x) / 2.0, tuning.player_y, size),
            size,
        }
    }

    /// Move horizontally, staying inside [0, world_width - width]
    pub fn move_by(&mut self, dx: f32, world_width: f32) {
        let max_x = (world_width - self.size.x).max(0.0);
        self.position.x = (self.position.x + dx).clamp(0.0, max_x);
    }

    /// Top-centre spawn point for a laser of `laser_size`
    pub fn muzzle(&self, laser_size: Vec3) -> Vec3 {
        on_plane(
            self.position.x + (self.size.x - laser_size.x) / 2.0,
            self.position.y + self.size.y,
            laser_size,
        )
    }
}

impl Body for Player {
    fn position(&self) -> Vec3 {
        self.position
    }
    fn size(&self) -> Vec3 {
        self.size
    }
}

/// One member of the swarm grid
#[derive(Debug, Clone, PartialEq)]
pub struct Invader {
    pub id: EntityId,
    pub position: Vec3,
    pub size: Vec3,
    /// Grid row (0 = top row); selects score and tint
    pub row: u32,
}

impl Invader {
    /// Underside-centre spawn point for a laser of `laser_size`
    pub fn underside(&self, laser_size: Vec3) -> Vec3 {
        on_plane(
            self.position.x + (self.size.x - laser_size.x) / 2.0,
            self.position.y - laser_size.y,
            laser_size,
        )
    }
}

impl Body for Invader {
    fn position(&self) -> Vec3 {
        self.position
    }
    fn size(&self) -> Vec3 {
        self.size
    }
}

/// A projectile travelling along y
#[derive(Debug, Clone, PartialEq)]
pub struct Laser {
    pub id: EntityId,
    pub position: Vec3,
    pub size: Vec3,
    /// Signed speed along y (units/second)
    pub velocity_y: f32,
}

impl Laser {
    pub fn new(id: EntityId, position: Vec3, size: Vec3, velocity_y: f32) -> Self {
        Self {
            id,
            position,
            size,
            velocity_y,
        }
    }

    pub fn advance(&mut self, dt: f32) {
        self.position.y += self.velocity_y * dt;
    }

    /// Still inside the vertical extent of the world
    pub fn in_bounds(&self, world_height: f32) -> bool {
        (0.0..=world_height).contains(&self.position.y)
    }
}

impl Body for Laser {
    fn position(&self) -> Vec3 {
        self.position
    }
    fn size(&self) -> Vec3 {
        self.size
    }
}

/// An explosion fragment
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub id: EntityId,
    pub position: Vec3,
    pub size: Vec3,
    pub velocity: Vec3,
    /// Seconds left to live
    pub life: f32,
    /// Lifetime at spawn, for normalized age
    pub initial_life: f32,
    pub color: [f32; 4],
}

impl Particle {
    /// Remaining life as a fraction of the initial life
    pub fn life_ratio(&self) -> f32 {
        if self.initial_life <= 0.0 {
            0.0
        } else {
            (self.life / self.initial_life).clamp(0.0, 1.0)
        }
    }
}

impl Body for Particle {
    fn position(&self) -> Vec3 {
        self.position
    }
    fn size(&self) -> Vec3 {
        self.size
    }
}

/// Borrowed, tagged view of any entity
#[derive(Debug, Clone, Copy)]
pub enum EntityRef<'a> {
    Player(&'a Player),
    Invader(&'a Invader),
    Laser(&'a Laser),
    Particle(&'a Particle),
}

impl<'a> EntityRef<'a> {
    pub fn id(&self) -> EntityId {
        match self {
            EntityRef::Player(p) => p.id,
            EntityRef::Invader(i) => i.id,
            EntityRef::Laser(l) => l.id,
            EntityRef::Particle(p) => p.id,
        }
    }

    pub fn model_kind(&self) -> ModelKind {
        match self {
            EntityRef::Player(_) => ModelKind::Ship,
            EntityRef::Invader(_) => ModelKind::Invader,
            EntityRef::Laser(_) => ModelKind::Laser,
            EntityRef::Particle(_) => ModelKind::Particle,
        }
    }

    pub fn body(&self) -> &'a dyn Body {
        match *self {
            EntityRef::Player(p) => p,
            EntityRef::Invader(i) => i,
            EntityRef::Laser(l) => l,
            EntityRef::Particle(p) => p,
        }
    }
}
