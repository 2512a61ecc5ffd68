//! Perspective camera framing the logical world
//!
//! The eye distance is fixed so the full world width is always in view. The
//! only free parameter is a vertical offset driven by the player.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use crate::consts::{WORLD_ASPECT, WORLD_HEIGHT, WORLD_WIDTH};

/// Vertical field of view at the native aspect ratio
pub const BASE_FOV_Y: f32 = std::f32::consts::FRAC_PI_4;
const Z_NEAR: f32 = 1.0;
const Z_FAR_SCALE: f32 = 4.0;

/// Camera data as laid out in the shaders' uniform block
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    pub eye: [f32; 4],
    /// World-space camera right, for billboards
    pub right: [f32; 4],
    /// World-space camera up, for billboards
    pub up: [f32; 4],
}

/// Horizontal FOV seen at the native aspect with the base vertical FOV
pub fn native_fov_x() -> f32 {
    2.0 * ((BASE_FOV_Y / 2.0).tan() * WORLD_ASPECT).atan()
}

/// Vertical FOV for a viewport of `aspect`.
///
/// Narrower than native keeps the native horizontal FOV so nothing is
/// clipped at the sides; wider keeps the base vertical FOV.
pub fn fov_y_for_aspect(aspect: f32) -> f32 {
    if aspect < WORLD_ASPECT {
        2.0 * ((native_fov_x() / 2.0).tan() / aspect).atan()
    } else {
        BASE_FOV_Y
    }
}

#[derive(Debug, Clone)]
pub struct CameraController {
    aspect: f32,
    fov_y: f32,
    distance: f32,
    offset: f32,
}

impl CameraController {
    pub fn new(width: u32, height: u32) -> Self {
        let mut camera = Self {
            aspect: WORLD_ASPECT,
            fov_y: BASE_FOV_Y,
            distance: (WORLD_WIDTH / 2.0) / (BASE_FOV_Y / 2.0).tan(),
            offset: 0.0,
        };
        camera.resize(width, height);
        camera
    }

    /// Adapt the projection to a new viewport. Zero-sized viewports are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.aspect = width as f32 / height as f32;
        self.fov_y = fov_y_for_aspect(self.aspect);
        log::debug!(
            "Camera resized to {}x{}, fov_y {:.3} rad{}",
            width,
            height,
            self.fov_y,
            if self.preserves_horizontal_fov() {
                " (horizontal fit)"
            } else {
                ""
            }
        );
    }

    /// True when the last resize took the horizontal-FOV-preserving branch
    pub fn preserves_horizontal_fov(&self) -> bool {
        self.aspect < WORLD_ASPECT
    }

    pub fn set_offset(&mut self, offset: f32) {
        self.offset = offset;
    }

    pub fn offset(&self) -> f32 {
        self.offset
    }

    pub fn fov_y(&self) -> f32 {
        self.fov_y
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn eye(&self) -> Vec3 {
        Vec3::new(
            WORLD_WIDTH / 2.0,
            WORLD_HEIGHT / 2.0 + self.offset,
            self.distance,
        )
    }

    pub fn target(&self) -> Vec3 {
        Vec3::new(WORLD_WIDTH / 2.0, WORLD_HEIGHT / 2.0, 0.0)
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye(), self.target(), Vec3::Y)
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.fov_y,
            self.aspect,
            Z_NEAR,
            self.distance * Z_FAR_SCALE,
        )
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection() * self.view()
    }

    pub fn uniform(&self) -> CameraUniform {
        let view = self.view();
        CameraUniform {
            view_proj: self.view_projection().to_cols_array_2d(),
            eye: self.eye().extend(1.0).to_array(),
            right: view.row(0).truncate().extend(0.0).to_array(),
            up: view.row(1).truncate().extend(0.0).to_array(),
        }
    }
}
