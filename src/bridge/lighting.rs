use glam::{UVec4, Vec3, Vec4};

use crate::{
    warn,
    host::{Camera, Light, LightKind},
};

/// Maximal number of lights the kernel receives.
pub const MAX_LIGHTS: usize = 32;

/// One light in world space, laid out for a GPU uniform array (48 byte stride).
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuLight {
    /// xyz - world position, w - 1 for positional lights, 0 for directional
    pub position:  Vec4,
    /// xyz - normalized direction the light shines in, w - cosine of the cone half angle
    pub direction: Vec4,
    /// rgb - color multiplied by intensity, w - intensity
    pub color:     Vec4,
}

impl GpuLight {

    /// Resolves a host light against the camera into world space.
    pub fn from_host(light: &Light, camera: &Camera) -> Self {
        let (position, focal_point) = match light.kind {
            LightKind::Headlight => (camera.position, camera.focal_point()),
            LightKind::Camera    => {
                let world = camera.world_matrix();
                (world.transform_point3(light.position), world.transform_point3(light.focal_point))
            },
            LightKind::Scene     => (light.position, light.focal_point),
        };

        let direction = (focal_point - position)
            .try_normalize()
            .unwrap_or_else(|| camera.forward());

        // cone is meaningful only for positional lights
        let cone_cos = if light.positional && light.cone_angle < 90.0 {
            light.cone_angle.to_radians().cos()
        } else {
            -1.0
        };

        Self {
            position:  position.extend(if light.positional { 1.0 } else { 0.0 }),
            direction: direction.extend(cone_cos),
            color:     (light.color * light.intensity).extend(light.intensity),
        }
    }

    pub fn is_positional(&self) -> bool {
        self.position.w > 0.5
    }

    pub fn world_position(&self) -> Vec3 {
        self.position.truncate()
    }

    pub fn world_direction(&self) -> Vec3 {
        self.direction.truncate()
    }
}

/// Light table uploaded to the kernel.
/// - `count.x` lights at the beginning of `lights` are valid.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Lighting {
    pub count:  UVec4,
    pub lights: [GpuLight; MAX_LIGHTS],
}

impl Default for Lighting {
    fn default() -> Self {
        bytemuck::Zeroable::zeroed()
    }
}

impl Lighting {

    /// Translates enabled host lights, lights above [`MAX_LIGHTS`] are dropped.
    pub fn from_host(lights: &[Light], camera: &Camera) -> Self {
        let mut lighting = Self::default();

        let enabled = lights.iter().filter(|light| light.enabled);
        let enabled_count = enabled.clone().count();
        if enabled_count > MAX_LIGHTS {
            warn!("Host renderer has {} enabled lights, only first {} are used", enabled_count, MAX_LIGHTS);
        }

        for (slot, light) in lighting.lights.iter_mut().zip(enabled) {
            *slot = GpuLight::from_host(light, camera);
        }
        lighting.count.x = enabled_count.min(MAX_LIGHTS) as u32;
        lighting
    }

    pub fn len(&self) -> usize {
        self.count.x as usize
    }

    pub fn is_empty(&self) -> bool {
        self.count.x == 0
    }

    pub fn active(&self) -> &[GpuLight] {
        &self.lights[..self.len()]
    }
}
