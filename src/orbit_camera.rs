use std::f32::consts::FRAC_PI_2;

use glam::Vec3;
use winit::event::MouseButton;

use crate::camera::Camera;
use crate::input::Input;

const ELEVATION_LIMIT: f32 = FRAC_PI_2 - 0.01;

/// Controls how the orbit camera moves.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum OrbitMode {
    /// Left-drag rotates, scroll zooms.
    #[default]
    Interactive,
    /// Rotates around the target at `speed` radians per second, ignoring input.
    AutoRotate { speed: f32 },
}

/// A camera controller that orbits a target point.
///
/// ```ignore
/// let mut orbit = OrbitCamera::new().distance(7.5).mode(OrbitMode::Interactive);
///
/// // per frame
/// orbit.update(frame.input, frame.dt);
/// *frame.camera = orbit.camera();
/// ```
#[derive(Clone, Debug)]
pub struct OrbitCamera {
    pub target: Vec3,
    pub distance: f32,
    /// Horizontal angle in radians.
    pub azimuth: f32,
    /// Vertical angle in radians, kept short of the poles.
    pub elevation: f32,
    /// Field of view in radians.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub mode: OrbitMode,
    pub sensitivity: f32,
    pub zoom_sensitivity: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            distance: 5.0,
            azimuth: 0.0,
            elevation: 0.3,
            fov: 45f32.to_radians(),
            near: 0.1,
            far: 100.0,
            mode: OrbitMode::Interactive,
            sensitivity: 0.005,
            zoom_sensitivity: 0.5,
            min_distance: 0.5,
            max_distance: 50.0,
        }
    }
}

impl OrbitCamera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Orbit that starts at `camera`'s position around `target`.
    pub fn from_camera(camera: &Camera, target: Vec3) -> Self {
        let offset = camera.position - target;
        let distance = offset.length().max(f32::EPSILON);
        Self {
            target,
            distance,
            azimuth: offset.x.atan2(offset.z),
            elevation: (offset.y / distance).clamp(-1.0, 1.0).asin(),
            fov: camera.fov,
            near: camera.near,
            far: camera.far,
            ..Self::default()
        }
        .distance_limits(0.5, distance.max(50.0))
    }

    pub fn target(mut self, target: impl Into<Vec3>) -> Self {
        self.target = target.into();
        self
    }

    pub fn distance(mut self, distance: f32) -> Self {
        self.distance = distance.clamp(self.min_distance, self.max_distance);
        self
    }

    pub fn mode(mut self, mode: OrbitMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the field of view in degrees.
    pub fn fov(mut self, fov_degrees: f32) -> Self {
        self.fov = fov_degrees.to_radians();
        self
    }

    pub fn clip(mut self, near: f32, far: f32) -> Self {
        self.near = near;
        self.far = far;
        self
    }

    pub fn azimuth(mut self, azimuth: f32) -> Self {
        self.azimuth = azimuth;
        self
    }

    pub fn elevation(mut self, elevation: f32) -> Self {
        self.elevation = elevation.clamp(-ELEVATION_LIMIT, ELEVATION_LIMIT);
        self
    }

    pub fn distance_limits(mut self, min: f32, max: f32) -> Self {
        self.min_distance = min;
        self.max_distance = max;
        self.distance = self.distance.clamp(min, max);
        self
    }

    /// Advances the orbit from this frame's input.
    pub fn update(&mut self, input: &Input, dt: f32) {
        match self.mode {
            OrbitMode::Interactive => {
                if input.mouse_down(MouseButton::Left) {
                    let delta = input.mouse_delta();
                    self.azimuth -= delta.x * self.sensitivity;
                    self.elevation = (self.elevation + delta.y * self.sensitivity)
                        .clamp(-ELEVATION_LIMIT, ELEVATION_LIMIT);
                }

                let scroll = input.scroll_delta();
                if scroll.y != 0.0 {
                    self.distance = (self.distance - scroll.y * self.zoom_sensitivity)
                        .clamp(self.min_distance, self.max_distance);
                }
            }
            OrbitMode::AutoRotate { speed } => {
                self.azimuth += speed * dt;
            }
        }
    }

    pub fn camera(&self) -> Camera {
        let offset = Vec3::new(
            self.distance * self.elevation.cos() * self.azimuth.sin(),
            self.distance * self.elevation.sin(),
            self.distance * self.elevation.cos() * self.azimuth.cos(),
        );
        let position = self.target + offset;

        Camera {
            position,
            forward: (self.target - position).normalize_or(Vec3::NEG_Z),
            up: Vec3::Y,
            fov: self.fov,
            near: self.near,
            far: self.far,
        }
    }
}
