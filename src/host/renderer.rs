use std::fmt;

use glam::Vec3;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::{Camera, Light};

/// Size of a viewport or a frame buffer in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Resolution {
    pub width:  u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Renderer of the host framework.
/// - The bridge holds only a weak reference to it and reads it during `update`.
/// - Every call should describe the current state of the scene.
pub trait HostRenderer {
    fn camera(&self) -> Camera;
    fn viewport(&self) -> Resolution;
    fn lights(&self) -> Vec<Light>;

    fn background(&self) -> Vec3 {
        Vec3::ZERO
    }
}

/// Plain scene description held by [`SceneRenderer`].
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub camera:     Camera,
    pub viewport:   Resolution,
    pub lights:     Vec<Light>,
    pub background: Vec3,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            camera:     Camera::default(),
            viewport:   Resolution::new(640, 480),
            lights:     vec![Light::headlight()],
            background: Vec3::ZERO,
        }
    }
}

/// A [`HostRenderer`] backed by a plain [`Scene`] which the host edits in place.
/// - Shared as `Arc<SceneRenderer>`, edits are visible to the bridge on its next `update`.
#[derive(Debug, Default)]
pub struct SceneRenderer {
    scene: RwLock<Scene>,
}

impl SceneRenderer {
    pub fn new(scene: Scene) -> Self {
        Self { scene: RwLock::new(scene) }
    }

    /// Edits the scene under a write lock.
    pub fn edit<R>(&self, edit: impl FnOnce(&mut Scene) -> R) -> R {
        edit(&mut self.scene.write())
    }

    pub fn snapshot(&self) -> Scene {
        self.scene.read().clone()
    }

    pub fn set_camera(&self, camera: Camera) {
        self.edit(|scene| scene.camera = camera);
    }

    pub fn set_viewport(&self, viewport: Resolution) {
        self.edit(|scene| scene.viewport = viewport);
    }

    pub fn set_lights(&self, lights: Vec<Light>) {
        self.edit(|scene| scene.lights = lights);
    }
}

impl HostRenderer for SceneRenderer {
    fn camera(&self) -> Camera {
        self.scene.read().camera.clone()
    }

    fn viewport(&self) -> Resolution {
        self.scene.read().viewport
    }

    fn lights(&self) -> Vec<Light> {
        self.scene.read().lights.clone()
    }

    fn background(&self) -> Vec3 {
        self.scene.read().background
    }
}
