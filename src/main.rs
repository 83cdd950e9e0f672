//! Demo: a translucent spinning torus, two spheres and a raymarched SDF
//! sphere over a ground plane, run through the depth pipeline.
//!
//! Usage: `depthfx [config.json]`
//!
//! Keys: `d` toggles the debug overlay, `e` toggles the effect stage,
//! `[` and `]` move the blend between scene and effect. Drag to orbit,
//! scroll to zoom.

use std::process::ExitCode;

use depthfx::{
    AppConfig, Camera, Color, KeyCode, LoggingConfig, MeshData, OrbitCamera, PassConfig,
    PipelineConfig, Quat, SceneObject, SdfSphere, Transform, Vec3, init_logging, run_with_config,
};

const BLEND_STEP: f32 = 0.1;
const NEAR: f32 = 0.1;
const FAR: f32 = 20.0;

/// Starting parameters: the blur band spans the scene's depth so the
/// falloff is visible, and the effect is shown fully.
fn demo_params() -> PassConfig {
    PassConfig::default().blur(2.0, 12.0).blend(1.0)
}

fn load_config() -> depthfx::Result<PipelineConfig> {
    match std::env::args().nth(1) {
        Some(path) => PipelineConfig::load(path),
        None => Ok(PipelineConfig::default().initial(demo_params())),
    }
}

fn main() -> ExitCode {
    init_logging(LoggingConfig::default());

    let pipeline_config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            log::error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let result = run_with_config(
        AppConfig::new().title("depthfx").size(800, 600),
        move |ctx| {
            ctx.set_pipeline_config(pipeline_config);

            let torus = ctx.add_mesh(&MeshData::torus(1.0, 0.35, 64, 32));
            let ground = ctx.mesh_plane(12.0);
            let sphere = ctx.mesh_sphere(32, 16);

            let ring = ctx.add_object(
                SceneObject::new(torus)
                    .color(Color::rgb(0.85, 0.55, 0.3))
                    .alpha(0.5)
                    .transform(Transform::from_position(Vec3::new(0.0, 0.6, 0.0))),
            );
            ctx.add_object(
                SceneObject::new(ground)
                    .color(Color::rgb(0.35, 0.38, 0.42))
                    .transform(Transform::from_position(Vec3::new(0.0, -0.5, 0.0))),
            );
            for (i, x) in [-2.5f32, 2.5].into_iter().enumerate() {
                ctx.add_object(
                    SceneObject::new(sphere)
                        .color(Color::rgb(0.3, 0.5 + 0.2 * i as f32, 0.8))
                        .transform(
                            Transform::from_position(Vec3::new(x, 0.0, -1.5 * i as f32))
                                .uniform_scale(1.2),
                        ),
                );
            }

            ctx.set_sdf_sphere(
                SdfSphere::new(Vec3::new(0.0, 0.3, -3.0), 0.8).color(Color::rgb(0.9, 0.9, 0.85)),
            );

            let camera = Camera::new()
                .at(Vec3::new(4.0, 2.0, 6.0))
                .looking_at(Vec3::ZERO)
                .with_fov(45.0)
                .with_clip(NEAR, FAR);
            ctx.set_camera(camera);
            let mut orbit = OrbitCamera::from_camera(&camera, Vec3::ZERO);

            move |frame| {
                orbit.update(frame.input, frame.dt);
                *frame.camera = orbit.camera();

                if let Some(obj) = frame.scene.object_mut(ring) {
                    obj.transform.rotation =
                        Quat::from_rotation_y(frame.time * 0.7) * Quat::from_rotation_x(1.1);
                }

                if frame.input.char_pressed('e') {
                    frame.params.effect_enabled = !frame.params.effect_enabled;
                    log::info!("effect enabled: {}", frame.params.effect_enabled);
                }
                if frame.input.key_pressed(KeyCode::BracketLeft) {
                    frame.params.blend = (frame.params.blend - BLEND_STEP).max(0.0);
                    log::info!("blend: {:.1}", frame.params.blend);
                }
                if frame.input.key_pressed(KeyCode::BracketRight) {
                    frame.params.blend = (frame.params.blend + BLEND_STEP).min(1.0);
                    log::info!("blend: {:.1}", frame.params.blend);
                }
            }
        },
    );

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
