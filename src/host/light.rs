use glam::Vec3;

/// Coordinate system a host light is specified in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum LightKind {
    /// Sits at the camera and shines at the camera focal point, position and focal point are ignored.
    Headlight,
    /// Position and focal point are in camera space (camera at origin looking down `-Z`).
    Camera,
    /// Position and focal point are in world space.
    Scene,
}

/// A light of the host renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    pub kind:        LightKind,
    pub position:    Vec3,
    pub focal_point: Vec3,
    pub color:       Vec3,
    pub intensity:   f32,
    /// Positional lights are point or spot lights, others are directional.
    pub positional:  bool,
    /// Half angle of the spot cone in degrees, 90 or more means no cone.
    pub cone_angle:  f32,
    pub enabled:     bool,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            kind:        LightKind::Scene,
            position:    Vec3::new(0.0, 0.0, 1.0),
            focal_point: Vec3::ZERO,
            color:       Vec3::ONE,
            intensity:   1.0,
            positional:  false,
            cone_angle:  30.0,
            enabled:     true,
        }
    }
}

// Factories
impl Light {
    pub fn headlight() -> Self {
        Self { kind: LightKind::Headlight, ..Default::default() }
    }

    pub fn camera(position: Vec3, focal_point: Vec3) -> Self {
        Self { kind: LightKind::Camera, position, focal_point, ..Default::default() }
    }

    pub fn scene(position: Vec3, focal_point: Vec3) -> Self {
        Self { kind: LightKind::Scene, position, focal_point, ..Default::default() }
    }
}

// Builders
impl Light {
    pub fn with_color(self, color: Vec3) -> Self {
        Self { color, ..self }
    }
    pub fn with_intensity(self, intensity: f32) -> Self {
        Self { intensity, ..self }
    }
    /// Turns the light into a positional spot light with given cone half angle.
    pub fn with_cone(self, cone_angle: f32) -> Self {
        Self { positional: true, cone_angle, ..self }
    }
    pub fn positional(self) -> Self {
        Self { positional: true, ..self }
    }
    pub fn disabled(self) -> Self {
        Self { enabled: false, ..self }
    }
}
