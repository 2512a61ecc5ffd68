//! WebGPU rendering module
//!
//! Instanced rendering of the simulation snapshot: one draw call per
//! non-empty model kind, after a full-screen background pass.

pub mod assets;
pub mod camera;
pub mod catalog;
pub mod instance;
pub mod pipeline;
pub mod shapes;
pub mod vertex;

pub use assets::{AssetError, ProceduralShip, ShipAsset, ShipSource, TextureData};
pub use camera::{CameraController, CameraUniform};
pub use catalog::GeometryCatalog;
pub use instance::{DrawGroup, InstanceBatch, InstanceKind, InstanceRaw, pack};
pub use pipeline::{DrawStep, FrameStats, RenderError, RenderState, plan_draws};
