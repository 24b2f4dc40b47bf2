use glam::{Mat4, Quat, Vec3};

/// Camera of the host renderer as the bridge sees it.
/// - Right handed, looking down `-Z` in its local space.
/// - `fov` is vertical, in degrees.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub aspect_ratio:   f32,
    pub fov:            f32,
    pub near:           f32,
    pub far:            f32,
    pub position:       Vec3,
    pub rotation:       Quat,
    /// Distance from the camera to its focal point along the view direction.
    pub focal_distance: f32,
    /// Lens aperture for depth of field, zero means a pinhole camera.
    pub aperture:       f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            aspect_ratio:   1.0,
            fov:            30.0,
            near:           0.1,
            far:            100.0,
            position:       Vec3::new(0.0, 0.0, 1.0),
            rotation:       Quat::IDENTITY,
            focal_distance: 1.0,
            aperture:       0.0,
        }
    }
}

// Builders
impl Camera {

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Rotates the camera towards `target` keeping `+Y` up and focuses on it.
    pub fn look_at(self, target: Vec3) -> Self {
        self.look_at_with_up(target, Vec3::Y)
    }

    /// Rotates the camera towards `target` and focuses on it.
    /// - A target at the camera position leaves the camera unchanged.
    pub fn look_at_with_up(mut self, target: Vec3, view_up: Vec3) -> Self {
        let distance = self.position.distance(target);
        if distance <= f32::EPSILON {
            return self;
        }
        let look_at_matrix = Mat4::look_at_rh(self.position, target, view_up);
        // look_at_rh maps world into view space, the camera itself is the inverse of that
        self.rotation = Quat::from_mat4(&look_at_matrix).inverse().normalize();
        self.focal_distance = distance;
        self
    }
}

// Getters
impl Camera {

    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    pub fn focal_point(&self) -> Vec3 {
        self.position + self.forward() * self.focal_distance
    }

    /// Camera to world transformation.
    pub fn world_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.position)
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.world_matrix().inverse()
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.fov.to_radians(),
            self.aspect_ratio,
            self.near,
            self.far
        )
    }

    pub fn focal_length(&self) -> f32 {
        1.0 / (self.fov.to_radians() * 0.5).tan()
    }
}
