//! Invader Strike - a 3D arcade invader shooter
//!
//! Core modules:
//! - `sim`: Gameplay simulation (movement, swarm AI, collisions, particles)
//! - `renderer`: WebGPU instanced rendering (camera, batching, draw submission)
//! - `input` / `audio`: Seams to the keyboard and sound collaborators
//! - `tuning`: Data-driven game balance

pub mod audio;
pub mod input;
pub mod renderer;
pub mod sim;
pub mod tuning;

pub use tuning::{Tuning, TuningError};

/// World configuration constants
pub mod consts {
    /// Logical world width in game units
    pub const WORLD_WIDTH: f32 = 800.0;
    /// Logical world height in game units
    pub const WORLD_HEIGHT: f32 = 600.0;
    /// Native aspect ratio of the logical world
    pub const WORLD_ASPECT: f32 = WORLD_WIDTH / WORLD_HEIGHT;

    /// Largest frame delta fed into the simulation (seconds).
    /// Larger spikes (tab backgrounding) are clamped to avoid tunneling.
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Instance buffer capacity shared by every instanced pass
    pub const MAX_INSTANCES: usize = 4096;
}

/// RGBA tints shared by the simulation (explosion colors) and the renderer
pub mod palette {
    pub const SHIP: [f32; 4] = [0.85, 0.9, 1.0, 1.0];
    pub const PLAYER_LASER: [f32; 4] = [0.3, 1.0, 0.45, 1.0];
    pub const INVADER_LASER: [f32; 4] = [1.0, 0.3, 0.25, 1.0];
    pub const PLAYER_EXPLOSION: [f32; 4] = [1.0, 0.6, 0.1, 1.0];
    pub const ENGINE_FLAME: [f32; 4] = [1.0, 0.55, 0.15, 0.9];
    pub const BACKGROUND: [f32; 4] = [0.01, 0.01, 0.04, 1.0];

    /// Invader tint by grid row (row 0 is the top row)
    pub const INVADER_ROWS: [[f32; 4]; 5] = [
        [1.0, 0.25, 0.6, 1.0],  // Magenta
        [0.7, 0.35, 1.0, 1.0],  // Violet
        [0.3, 0.6, 1.0, 1.0],   // Blue
        [0.2, 0.9, 0.85, 1.0],  // Teal
        [0.45, 1.0, 0.35, 1.0], // Green
    ];

    /// Tint for an invader row, wrapping for grids taller than the palette
    #[inline]
    pub fn invader_row(row: u32) -> [f32; 4] {
        INVADER_ROWS[row as usize % INVADER_ROWS.len()]
    }
}
