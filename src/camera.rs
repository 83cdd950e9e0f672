use glam::{Mat4, Vec3, Vec4};

/// Remaps OpenGL clip-space z (`[-w, w]`) onto wgpu's `[0, w]`.
///
/// Raw depth samples then satisfy `ndc = 2·raw − 1`, which is what the depth
/// pass linearizes against.
#[rustfmt::skip]
pub const OPENGL_TO_WGPU: Mat4 = Mat4::from_cols(
    Vec4::new(1.0, 0.0, 0.0, 0.0),
    Vec4::new(0.0, 1.0, 0.0, 0.0),
    Vec4::new(0.0, 0.0, 0.5, 0.0),
    Vec4::new(0.0, 0.0, 0.5, 1.0),
);

/// A simple perspective camera for 3D scenes.
///
/// Provides position, orientation, field of view and clip planes. The near
/// and far planes are also what the depth pass linearizes against.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub forward: Vec3,
    pub up: Vec3,
    pub fov: f32, // radians
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 5.0),
            forward: Vec3::NEG_Z,
            up: Vec3::Y,
            fov: std::f32::consts::FRAC_PI_2, // 90 degrees
            near: 0.1,
            far: 100.0,
        }
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(mut self, position: impl Into<Vec3>) -> Self {
        self.position = position.into();
        self
    }

    pub fn looking_at(mut self, target: impl Into<Vec3>) -> Self {
        self.forward = (target.into() - self.position).normalize_or(Vec3::NEG_Z);
        self
    }

    pub fn with_fov(mut self, fov_degrees: f32) -> Self {
        self.fov = fov_degrees.to_radians();
        self
    }

    pub fn with_clip(mut self, near: f32, far: f32) -> Self {
        self.near = near;
        self.far = far;
        self
    }

    /// Compute the right vector from forward and up.
    pub fn right(&self) -> Vec3 {
        self.forward.cross(self.up).normalize_or_zero()
    }

    /// Recompute up to be orthogonal to forward and right.
    pub fn orthogonal_up(&self) -> Vec3 {
        self.right().cross(self.forward).normalize_or_zero()
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_to_rh(self.position, self.forward, self.up)
    }

    /// GL-convention perspective with depth remapped to `[0, 1]`.
    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        OPENGL_TO_WGPU * Mat4::perspective_rh_gl(self.fov, aspect, self.near, self.far)
    }

    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        self.projection_matrix(aspect) * self.view_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::depth::{encode_depth, linearize_depth};

    fn raw_depth(camera: &Camera, world: Vec3) -> f32 {
        let clip = camera.view_projection(1.0) * world.extend(1.0);
        clip.z / clip.w
    }

    #[test]
    fn near_and_far_planes_map_to_unit_range() {
        let camera = Camera::new().at(Vec3::ZERO).with_clip(0.1, 5.0);
        assert!(raw_depth(&camera, Vec3::new(0.0, 0.0, -0.1)).abs() < 1e-5);
        assert!((raw_depth(&camera, Vec3::new(0.0, 0.0, -5.0)) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn projected_depth_linearizes_back_to_distance() {
        let camera = Camera::new().at(Vec3::ZERO).with_clip(0.5, 20.0);
        for d in [0.5, 1.0, 3.0, 7.5, 19.0] {
            let raw = raw_depth(&camera, Vec3::new(0.0, 0.0, -d));
            assert!((raw - encode_depth(d, 0.5, 20.0)).abs() < 1e-4);
            assert!((linearize_depth(raw, 0.5, 20.0) - d).abs() < 1e-2 * d);
        }
    }

    #[test]
    fn looking_at_points_forward_at_target() {
        let camera = Camera::new()
            .at(Vec3::new(4.0, 2.0, 6.0))
            .looking_at(Vec3::ZERO);
        let expected = Vec3::new(-4.0, -2.0, -6.0).normalize();
        assert!(camera.forward.abs_diff_eq(expected, 1e-6));
        assert!(camera.right().dot(camera.forward).abs() < 1e-6);
        assert!(camera.orthogonal_up().dot(camera.forward).abs() < 1e-6);
    }
}
