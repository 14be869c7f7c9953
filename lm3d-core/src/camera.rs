//! Perspective camera.

use glam::{Mat4, Vec2, Vec3};

/// World up axis used for the camera basis.
pub const WORLD_UP: Vec3 = Vec3::Y;

/// A perspective camera described by a position and pitch/yaw angles in degrees.
///
/// Position and rotation setters recompute the basis vectors and the view matrix right
/// away. Projection setters only touch the projection matrix. Pitch is not clamped.
#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    fov: f32,
    aspect_ratio: f32,
    near: f32,
    far: f32,
    position: Vec3,
    rotation: Vec2,
    forward: Vec3,
    right: Vec3,
    up: Vec3,
    view: Mat4,
    projection: Mat4,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(45.0, 16.0 / 9.0, 0.1, 100.0)
    }
}

impl Camera {
    /// Creates a camera at the origin looking down -Z. `fov` is the vertical field of view
    /// in degrees.
    pub fn new(fov: f32, aspect_ratio: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            fov,
            aspect_ratio,
            near,
            far,
            position: Vec3::ZERO,
            rotation: Vec2::new(0.0, -90.0),
            forward: Vec3::NEG_Z,
            right: Vec3::X,
            up: Vec3::Y,
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
        };
        camera.update_vectors();
        camera.update_projection();
        camera
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.update_vectors();
    }

    /// Sets pitch (`x`) and yaw (`y`) in degrees.
    pub fn set_rotation(&mut self, rotation: Vec2) {
        self.rotation = rotation;
        self.update_vectors();
    }

    pub fn set_projection(&mut self, fov: f32, aspect_ratio: f32, near: f32, far: f32) {
        self.fov = fov;
        self.aspect_ratio = aspect_ratio;
        self.near = near;
        self.far = far;
        self.update_projection();
    }

    pub fn set_aspect_ratio(&mut self, aspect_ratio: f32) {
        self.aspect_ratio = aspect_ratio;
        self.update_projection();
    }

    pub fn set_fov(&mut self, fov: f32) {
        self.fov = fov;
        self.update_projection();
    }

    /// Moves the camera by `offset` in world space.
    pub fn translate(&mut self, offset: Vec3) {
        self.set_position(self.position + offset);
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn rotation(&self) -> Vec2 {
        self.rotation
    }

    pub fn fov(&self) -> f32 {
        self.fov
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.aspect_ratio
    }

    pub fn near(&self) -> f32 {
        self.near
    }

    pub fn far(&self) -> f32 {
        self.far
    }

    pub fn forward(&self) -> Vec3 {
        self.forward
    }

    pub fn right(&self) -> Vec3 {
        self.right
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.view
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    /// `projection * view`.
    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }

    fn update_vectors(&mut self) {
        let pitch = self.rotation.x.to_radians();
        let yaw = self.rotation.y.to_radians();

        self.forward = Vec3::new(
            pitch.cos() * yaw.cos(),
            pitch.sin(),
            pitch.cos() * yaw.sin(),
        )
        .normalize();
        // Looking straight up or down leaves forward parallel to WORLD_UP.
        self.right = self
            .forward
            .cross(WORLD_UP)
            .try_normalize()
            .unwrap_or_else(|| Vec3::new(-yaw.sin(), 0.0, yaw.cos()));
        self.up = self.right.cross(self.forward).normalize();
        self.view = Mat4::look_at_rh(self.position, self.position + self.forward, self.up);
    }

    fn update_projection(&mut self) {
        self.projection =
            Mat4::perspective_rh_gl(self.fov.to_radians(), self.aspect_ratio, self.near, self.far);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn default_rotation_looks_down_negative_z() {
        let camera = Camera::new(90.0, 1.0, 0.1, 100.0);
        assert!(camera.forward().abs_diff_eq(Vec3::NEG_Z, EPSILON));
        assert!(camera.right().abs_diff_eq(Vec3::X, EPSILON));
        assert!(camera.up().abs_diff_eq(Vec3::Y, EPSILON));

        let expected = Mat4::look_at_rh(Vec3::ZERO, camera.forward(), camera.up());
        assert!(camera.view_matrix().abs_diff_eq(expected, EPSILON));

        let projection = Mat4::perspective_rh_gl(90f32.to_radians(), 1.0, 0.1, 100.0);
        assert!(camera.projection_matrix().abs_diff_eq(projection, EPSILON));
    }

    #[test]
    fn pitch_is_not_clamped() {
        let mut camera = Camera::default();
        for pitch in [90.0, -90.0, 135.0] {
            camera.set_rotation(Vec2::new(pitch, 30.0));
            assert_eq!(camera.rotation().x, pitch);
            assert!(camera.forward().is_finite());
            assert!(camera.right().is_finite());
            assert!(camera.up().is_finite());
            assert!(camera.view_matrix().is_finite());
            assert!((camera.forward().length() - 1.0).abs() < EPSILON);
        }

        camera.set_rotation(Vec2::new(90.0, 0.0));
        assert!(camera.forward().abs_diff_eq(Vec3::Y, 1e-4));
    }

    #[test]
    fn position_updates_view() {
        let mut camera = Camera::default();
        camera.set_position(Vec3::new(1.0, 2.0, 3.0));
        camera.translate(Vec3::new(0.0, 0.0, -1.0));
        assert_eq!(camera.position(), Vec3::new(1.0, 2.0, 2.0));

        let origin = camera.view_matrix().transform_point3(camera.position());
        assert!(origin.abs_diff_eq(Vec3::ZERO, EPSILON));
    }

    #[test]
    fn aspect_ratio_only_touches_projection() {
        let mut camera = Camera::default();
        let view = camera.view_matrix();
        camera.set_aspect_ratio(2.0);
        assert_eq!(camera.view_matrix(), view);
        assert_eq!(camera.aspect_ratio(), 2.0);
        let expected = Mat4::perspective_rh_gl(45f32.to_radians(), 2.0, 0.1, 100.0);
        assert!(camera.projection_matrix().abs_diff_eq(expected, EPSILON));
    }
}
