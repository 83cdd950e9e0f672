//! # depthfx
//!
//! **A fixed scene → depth → composite post-processing pipeline on wgpu.**
//!
//! The scene is rendered off-screen with a depth attachment, the depth
//! buffer is linearized and turned into a color effect, and the effect is
//! blended back over the scene. A debug overlay shows the captured color
//! and depth as thumbnails.
//!
//! ## Quick Start
//!
//! ```no_run
//! use depthfx::*;
//!
//! fn main() -> depthfx::Result<()> {
//!     init_logging(LoggingConfig::default());
//!     run(|ctx| {
//!         let torus = ctx.mesh_torus(1.0, 0.35, 64, 32);
//!         let id = ctx.add_object(SceneObject::new(torus).color(Color::rgb(0.9, 0.6, 0.3)));
//!         ctx.set_camera(Camera::new().at(Vec3::new(4.0, 2.0, 6.0)).looking_at(Vec3::ZERO));
//!
//!         move |frame| {
//!             if let Some(obj) = frame.scene.object_mut(id) {
//!                 obj.transform.rotation = Quat::from_rotation_y(frame.time);
//!             }
//!             frame.params.blend = 0.5;
//!         }
//!     })
//! }
//! ```
//!
//! Press `d` to toggle the debug overlay.

mod app;
mod camera;
mod color;
mod config;
mod depth;
mod error;
mod gpu;
mod gradient;
mod input;
mod logging;
mod mesh;
mod orbit_camera;
pub mod pipeline;
mod scene;
mod sdf;
pub mod shaders;
mod texture;
mod wave;

pub use app::{Frame, SetupContext, run, run_with_config};
pub use camera::{Camera, OPENGL_TO_WGPU};
pub use color::Color;
pub use config::{
    AppConfig, BLUR_MAX, EffectMode, GradientConfig, GradientStop, OverlayConfig,
    ParameterSource, PassConfig, PipelineConfig, WaveConfig,
};
pub use depth::{band, composite, encode_depth, linearize_depth, normalized_depth, shade_depth};
pub use error::{Error, Result};
pub use gpu::GpuContext;
pub use gradient::Gradient;
pub use input::{ControlBus, ControlEvent, Input, Subscription, is_toggle_key};
pub use logging::{LoggingConfig, init_logging};
pub use mesh::{Mesh, MeshData, Transform, Vertex3d};
pub use orbit_camera::{OrbitCamera, OrbitMode};
pub use pipeline::{FrameStatus, PipelineState, PostPipeline, Viewport};
pub use scene::{MeshId, ObjectId, Scene, SceneObject};
pub use sdf::{SdfSphere, hit_depth};
pub use texture::Texture;
pub use wave::WaveAnimator;

// Re-export math types for convenience
pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4};

// Re-export input types for convenience
pub use winit::event::MouseButton;
pub use winit::keyboard::KeyCode;
