//! Raymarched signed-distance geometry.
//!
//! The scene pass marches [`SdfSphere`] per pixel on the GPU and writes the
//! hit's depth with [`hit_depth`], so procedural surfaces land in the depth
//! buffer the same way rasterized meshes do. [`SdfSphere::raymarch`] is the
//! CPU reference of the shader loop.

use glam::Vec3;

use crate::camera::Camera;
use crate::color::Color;
use crate::depth::encode_depth;

/// Sphere-tracing iteration limit.
pub const MAX_STEPS: u32 = 100;
/// Distance below which a ray counts as a hit.
pub const HIT_EPSILON: f32 = 0.001;

/// A sphere drawn by raymarching its distance field.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SdfSphere {
    pub center: Vec3,
    pub radius: f32,
    pub color: Color,
    /// Rays give up after travelling this far.
    pub max_distance: f32,
}

impl Default for SdfSphere {
    fn default() -> Self {
        Self {
            center: Vec3::ZERO,
            radius: 1.0,
            color: Color::WHITE,
            max_distance: 20.0,
        }
    }
}

impl SdfSphere {
    pub fn new(center: impl Into<Vec3>, radius: f32) -> Self {
        Self {
            center: center.into(),
            radius,
            ..Self::default()
        }
    }

    pub fn color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn max_distance(mut self, distance: f32) -> Self {
        self.max_distance = distance;
        self
    }

    /// Signed distance from `p` to the surface; negative inside.
    pub fn distance(&self, p: Vec3) -> f32 {
        (p - self.center).length() - self.radius
    }

    /// Distance along the unit ray `dir` to the first hit, if any.
    pub fn raymarch(&self, origin: Vec3, dir: Vec3) -> Option<f32> {
        let mut t = 0.0;
        for _ in 0..MAX_STEPS {
            let d = self.distance(origin + dir * t);
            if d < HIT_EPSILON {
                return Some(t);
            }
            if t > self.max_distance {
                break;
            }
            t += d;
        }
        None
    }
}

/// Raw depth stored for a hit `t` units along the unit ray `dir` cast from
/// `camera`.
///
/// The depth buffer holds distance along the view axis, so the ray length is
/// projected onto the camera's forward vector first. Hits closer than the
/// near plane clamp to it.
pub fn hit_depth(camera: &Camera, dir: Vec3, t: f32) -> f32 {
    let forward = camera.forward.normalize_or(Vec3::NEG_Z);
    let view_depth = (t * dir.dot(forward)).max(camera.near);
    encode_depth(view_depth, camera.near, camera.far).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::depth::linearize_depth;

    fn camera() -> Camera {
        Camera::new()
            .at(Vec3::new(4.0, 2.0, 6.0))
            .looking_at(Vec3::ZERO)
            .with_fov(45.0)
            .with_clip(0.1, 20.0)
    }

    #[test]
    fn ray_through_the_center_hits_the_front_surface() {
        let camera = camera();
        let sphere = SdfSphere::default();
        let t = sphere.raymarch(camera.position, camera.forward).unwrap();
        let expected = camera.position.length() - 1.0;
        assert!((t - expected).abs() < 2.0 * HIT_EPSILON, "{t} vs {expected}");
    }

    #[test]
    fn rays_that_miss_return_none() {
        let sphere = SdfSphere::default();
        assert!(sphere.raymarch(Vec3::new(0.0, 0.0, 5.0), Vec3::Z).is_none());
        // grazes the silhouette 0.01 outside the surface
        assert!(sphere.raymarch(Vec3::new(1.01, 0.0, 10.0), Vec3::NEG_Z).is_none());
    }

    #[test]
    fn hit_depth_linearizes_back_to_view_distance() {
        let camera = camera();
        let sphere = SdfSphere::new(Vec3::new(0.3, 0.2, 0.0), 0.8);
        let target = sphere.center + Vec3::new(0.1, 0.4, 0.2);
        let dir = (target - camera.position).normalize();
        let t = sphere.raymarch(camera.position, dir).unwrap();

        let raw = hit_depth(&camera, dir, t);
        let view_depth = t * dir.dot(camera.forward);
        let back = linearize_depth(raw, camera.near, camera.far);
        assert!((back - view_depth).abs() < 1e-3 * view_depth, "{back} vs {view_depth}");
    }

    #[test]
    fn hit_depth_matches_rasterized_depth_of_the_same_point() {
        let camera = camera();
        let sphere = SdfSphere::default();
        let dir = (Vec3::new(0.2, -0.1, 0.3) - camera.position).normalize();
        let t = sphere.raymarch(camera.position, dir).unwrap();

        let hit = camera.position + dir * t;
        let clip = camera.view_projection(4.0 / 3.0) * hit.extend(1.0);
        let rasterized = clip.z / clip.w;
        assert!((hit_depth(&camera, dir, t) - rasterized).abs() < 1e-4);
    }

    #[test]
    fn camera_inside_the_sphere_clamps_to_the_near_plane() {
        let camera = Camera::new().at(Vec3::ZERO).with_clip(0.1, 20.0);
        let sphere = SdfSphere::default();
        let t = sphere.raymarch(camera.position, camera.forward).unwrap();
        assert_eq!(t, 0.0);
        assert!(hit_depth(&camera, camera.forward, t).abs() < 1e-5);
    }
}
