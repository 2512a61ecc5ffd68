//! Procedural meshes
//!
//! Every mesh fits the unit box [-0.5, 0.5]^3 so an instance's size vector
//! maps it straight onto the entity's bounding box.

use glam::Vec3;

use super::vertex::Vertex;

/// CPU-side indexed triangle list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u16>,
}

/// Face normal and its four corners (as signs), counter-clockwise from outside
const BOX_FACES: [([f32; 3], [[f32; 3]; 4]); 6] = [
    (
        [1.0, 0.0, 0.0],
        [
            [1.0, -1.0, -1.0],
            [1.0, 1.0, -1.0],
            [1.0, 1.0, 1.0],
            [1.0, -1.0, 1.0],
        ],
    ),
    (
        [-1.0, 0.0, 0.0],
        [
            [-1.0, -1.0, 1.0],
            [-1.0, 1.0, 1.0],
            [-1.0, 1.0, -1.0],
            [-1.0, -1.0, -1.0],
        ],
    ),
    (
        [0.0, 1.0, 0.0],
        [
            [-1.0, 1.0, 1.0],
            [1.0, 1.0, 1.0],
            [1.0, 1.0, -1.0],
            [-1.0, 1.0, -1.0],
        ],
    ),
    (
        [0.0, -1.0, 0.0],
        [
            [-1.0, -1.0, -1.0],
            [1.0, -1.0, -1.0],
            [1.0, -1.0, 1.0],
            [-1.0, -1.0, 1.0],
        ],
    ),
    (
        [0.0, 0.0, 1.0],
        [
            [-1.0, -1.0, 1.0],
            [1.0, -1.0, 1.0],
            [1.0, 1.0, 1.0],
            [-1.0, 1.0, 1.0],
        ],
    ),
    (
        [0.0, 0.0, -1.0],
        [
            [1.0, -1.0, -1.0],
            [-1.0, -1.0, -1.0],
            [-1.0, 1.0, -1.0],
            [1.0, 1.0, -1.0],
        ],
    ),
];

/// Classic 11x8 invader sprite, top row first
const INVADER_SPRITE: [&str; 8] = [
    "..#.....#..",
    "...#...#...",
    "..#######..",
    ".##.###.##.",
    "###########",
    "#.#######.#",
    "#.#.....#.#",
    "...##.##...",
];

/// Planar texture coordinates looking down -z
#[inline]
fn planar_uv(p: Vec3) -> [f32; 2] {
    [p.x + 0.5, 0.5 - p.y]
}

impl MeshData {
    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    /// Append an axis-aligned box spanning `min..max`
    pub fn push_box(&mut self, min: Vec3, max: Vec3) {
        let center = (min + max) * 0.5;
        let half = (max - min) * 0.5;

        for (normal, corners) in BOX_FACES {
            let base = self.vertices.len() as u16;
            for sign in corners {
                let p = center + Vec3::from_array(sign) * half;
                self.vertices.push(Vertex::new(p.to_array(), normal, planar_uv(p)));
            }
            self.indices
                .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
    }

    /// Smallest box containing every vertex
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let mut positions = self.vertices.iter().map(|v| Vec3::from_array(v.position));
        let first = positions.next()?;
        Some(positions.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p))))
    }
}

/// Unit cube (lasers)
pub fn cube() -> MeshData {
    let mut mesh = MeshData::default();
    mesh.push_box(Vec3::splat(-0.5), Vec3::splat(0.5));
    mesh
}

/// Flat-shaded octahedron (particles)
pub fn octahedron() -> MeshData {
    let mut mesh = MeshData::default();
    for sx in [1.0f32, -1.0] {
        for sy in [1.0f32, -1.0] {
            for sz in [1.0f32, -1.0] {
                let a = Vec3::X * sx * 0.5;
                let mut b = Vec3::Y * sy * 0.5;
                let mut c = Vec3::Z * sz * 0.5;
                // Keep the winding counter-clockwise from outside
                if sx * sy * sz < 0.0 {
                    std::mem::swap(&mut b, &mut c);
                }
                let normal = Vec3::new(sx, sy, sz).normalize().to_array();
                let base = mesh.vertices.len() as u16;
                for p in [a, b, c] {
                    mesh.vertices.push(Vertex::new(p.to_array(), normal, planar_uv(p)));
                }
                mesh.indices.extend_from_slice(&[base, base + 1, base + 2]);
            }
        }
    }
    mesh
}

/// Unit quad in the xy plane (flame billboards)
pub fn quad() -> MeshData {
    let normal = [0.0, 0.0, 1.0];
    MeshData {
        vertices: vec![
            Vertex::new([-0.5, -0.5, 0.0], normal, [0.0, 1.0]),
            Vertex::new([0.5, -0.5, 0.0], normal, [1.0, 1.0]),
            Vertex::new([0.5, 0.5, 0.0], normal, [1.0, 0.0]),
            Vertex::new([-0.5, 0.5, 0.0], normal, [0.0, 0.0]),
        ],
        indices: vec![0, 1, 2, 0, 2, 3],
    }
}

/// Extruded voxel invader, one box per lit sprite cell
pub fn voxel_invader() -> MeshData {
    let rows = INVADER_SPRITE.len() as f32;
    let cols = INVADER_SPRITE[0].len() as f32;
    let mut mesh = MeshData::default();

    for (r, line) in INVADER_SPRITE.iter().enumerate() {
        for (c, cell) in line.chars().enumerate() {
            if cell != '#' {
                continue;
            }
            let min = Vec3::new(
                -0.5 + c as f32 / cols,
                0.5 - (r + 1) as f32 / rows,
                -0.5,
            );
            let max = Vec3::new(
                -0.5 + (c + 1) as f32 / cols,
                0.5 - r as f32 / rows,
                0.5,
            );
            mesh.push_box(min, max);
        }
    }
    mesh
}

/// Blocky fighter hull, nose toward +y
pub fn ship_hull() -> MeshData {
    let parts = [
        // Fuselage
        (Vec3::new(-0.12, -0.5, -0.3), Vec3::new(0.12, 0.35, 0.3)),
        // Nose
        (Vec3::new(-0.06, 0.35, -0.15), Vec3::new(0.06, 0.5, 0.15)),
        // Wings
        (Vec3::new(-0.5, -0.35, -0.1), Vec3::new(0.5, -0.05, 0.1)),
        // Wingtip cannons
        (Vec3::new(-0.5, -0.35, -0.15), Vec3::new(-0.42, 0.15, 0.15)),
        (Vec3::new(0.42, -0.35, -0.15), Vec3::new(0.5, 0.15, 0.15)),
        // Cockpit
        (Vec3::new(-0.08, 0.0, 0.3), Vec3::new(0.08, 0.25, 0.42)),
    ];

    let mut mesh = MeshData::default();
    for (min, max) in parts {
        mesh.push_box(min, max);
    }
    mesh
}
