use glam::{Mat4, UVec4, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::host::{Camera, Resolution};

/// Renderer-wide settings consumed by the kernel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Multiplier applied to the estimate before tone mapping.
    pub exposure:      f32,
    /// Display gamma.
    pub gamma:         f32,
    /// Multiplier of the volume density.
    pub density_scale: f32,
    /// Ray marching step in world units.
    pub step_size:     f32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            exposure:      1.0,
            gamma:         2.2,
            density_scale: 1.0,
            step_size:     0.01,
        }
    }
}

/// A snapshot of the host camera, film and settings laid out for a GPU uniform.
/// - Every field is 16 byte aligned, this struct maps 1:1 to `RenderInfo` in WGSL.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct RenderInfo {
    /// World to camera.
    pub view:         Mat4,
    /// Camera to world.
    pub inverse_view: Mat4,
    /// xyz - camera position, w - 1
    pub eye:          Vec4,
    /// x - tan(fov / 2), y - aspect ratio, z - near, w - far
    pub projection:   Vec4,
    /// x - aperture, y - focal distance
    pub lens:         Vec4,
    /// x - width, y - height, z - 1 / width, w - 1 / height
    pub film:         Vec4,
    /// x - exposure, y - 1 / gamma, z - density scale, w - step size
    pub tone:         Vec4,
    /// rgb - background color
    pub background:   Vec4,
    /// x - accumulated iterations, y - frame buffer pitch, z - frame seed
    pub frame:        UVec4,
}

impl Default for RenderInfo {
    fn default() -> Self {
        bytemuck::Zeroable::zeroed()
    }
}

impl RenderInfo {

    /// Translates host state into the GPU layout.
    /// - Frame counters are left zeroed, they are filled in when the bridge binds.
    pub fn from_host(camera: &Camera, viewport: Resolution, settings: &RenderSettings, background: Vec3) -> Self {
        let width  = viewport.width.max(1) as f32;
        let height = viewport.height.max(1) as f32;
        let world  = camera.world_matrix();

        Self {
            view:         world.inverse(),
            inverse_view: world,
            eye:          camera.position.extend(1.0),
            projection:   Vec4::new(
                (camera.fov.to_radians() * 0.5).tan(),
                camera.aspect_ratio,
                camera.near,
                camera.far,
            ),
            lens:         Vec4::new(camera.aperture, camera.focal_distance, 0.0, 0.0),
            film:         Vec4::new(width, height, 1.0 / width, 1.0 / height),
            tone:         Vec4::new(
                settings.exposure,
                1.0 / settings.gamma.max(f32::EPSILON),
                settings.density_scale,
                settings.step_size,
            ),
            background:   background.extend(1.0),
            frame:        UVec4::ZERO,
        }
    }

    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.film.x as u32, self.film.y as u32)
    }

    pub fn eye(&self) -> Vec3 {
        self.eye.truncate()
    }

    pub fn iterations(&self) -> u32 {
        self.frame.x
    }

    /// Compares everything the kernel sees except frame counters.
    pub fn same_scene(&self, other: &Self) -> bool {
        Self { frame: UVec4::ZERO, ..*self } == Self { frame: UVec4::ZERO, ..*other }
    }

    /// Camera and film part only.
    pub fn same_view(&self, other: &Self) -> bool {
        self.view == other.view
            && self.projection == other.projection
            && self.lens == other.lens
            && self.film == other.film
    }
}
