//! Depth stage: reads the captured depth buffer, linearizes it with the
//! camera's clip planes and maps it to color.
//!
//! Band modes (pass-through and depth band) mix `color_near` into
//! `color_far`; gradient modes look the normalized depth up in a baked 1D
//! gradient and mask everything past `depth_threshold` down to
//! `depth_value`.

use crate::camera::Camera;
use crate::config::{EffectMode, PassConfig};
use crate::error::Result;
use crate::gpu::GpuContext;
use crate::gradient::Gradient;
use crate::pipeline::program::{ProgramPipeline, uniform_buffer};
use crate::pipeline::render_target::{RenderContext, RenderTarget};
use crate::shaders;
use crate::texture::Texture;

/// Uniforms of the depth program. Layout mirrors `DepthParams` in WGSL.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DepthUniforms {
    pub color_near: [f32; 4],
    pub color_far: [f32; 4],
    pub tint: [f32; 4],
    pub blur_near: f32,
    pub blur_far: f32,
    pub depth_min: f32,
    pub depth_max: f32,
    pub depth_threshold: f32,
    pub depth_value: f32,
    pub near: f32,
    pub far: f32,
    pub mode: u32,
    pub _pad: [u32; 3],
}

impl DepthUniforms {
    /// Packs a parameter snapshot. In [`EffectMode::AnimatedWave`] the
    /// threshold is the current wave phase instead of the static value.
    pub fn new(params: &PassConfig, mode: EffectMode, camera: &Camera) -> Self {
        let depth_threshold = match mode {
            EffectMode::AnimatedWave => params.wave_phase,
            _ => params.depth_threshold,
        };
        Self {
            color_near: params.color_near.to_array(),
            color_far: params.color_far.to_array(),
            tint: params.tint.to_array(),
            blur_near: params.blur_near,
            blur_far: params.blur_far,
            depth_min: params.depth_min,
            depth_max: params.depth_max,
            depth_threshold,
            depth_value: params.depth_value,
            near: camera.near,
            far: camera.far,
            mode: mode.shader_code(),
            _pad: [0; 3],
        }
    }
}

pub struct DepthPass {
    pipeline: ProgramPipeline,
    uniforms: wgpu::Buffer,
    gradient: Texture,
    mode: EffectMode,
}

impl DepthPass {
    pub fn new(gpu: &GpuContext, mode: EffectMode, gradient: &Gradient, resolution: u32) -> Self {
        Self {
            pipeline: ProgramPipeline::fullscreen(gpu, &shaders::DEPTH, gpu.color_format()),
            uniforms: uniform_buffer(
                gpu,
                "Depth Effect Uniforms",
                std::mem::size_of::<DepthUniforms>(),
            ),
            gradient: Texture::gradient(gpu, gradient, resolution),
            mode,
        }
    }

    /// Colors every pixel of `output` from the depth of `scene`.
    pub fn render(
        &self,
        ctx: &mut RenderContext,
        scene: &RenderTarget,
        output: &RenderTarget,
    ) -> Result<()> {
        let Some(scene_depth) = scene.depth_view() else {
            log::warn!("depth stage skipped: scene target has no depth attachment");
            return Ok(());
        };

        let uniforms = DepthUniforms::new(ctx.params, self.mode, ctx.camera);
        ctx.gpu
            .queue
            .write_buffer(&self.uniforms, 0, bytemuck::bytes_of(&uniforms));

        let bind_group = self.pipeline.bind_group(
            &ctx.gpu.device,
            0,
            self.pipeline
                .bindings()
                .bind("params", self.uniforms.as_entire_binding())
                .bind("scene_depth", wgpu::BindingResource::TextureView(scene_depth))
                .bind(
                    "gradient_tex",
                    wgpu::BindingResource::TextureView(&self.gradient.view),
                )
                .bind(
                    "gradient_sampler",
                    wgpu::BindingResource::Sampler(&self.gradient.sampler),
                ),
        )?;

        let mut render_pass = ctx.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Depth Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &output.color_view,
                resolve_target: None,
                depth_slice: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        render_pass.set_pipeline(&self.pipeline.pipeline);
        render_pass.set_bind_group(0, &bind_group, &[]);
        render_pass.draw(0..3, 0..1);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;

    #[test]
    fn layout_matches_wgsl() {
        assert_eq!(std::mem::size_of::<DepthUniforms>(), 96);
    }

    #[test]
    fn band_modes_use_the_static_threshold() {
        let mut params = PassConfig::new();
        params.depth_threshold = 0.4;
        params.wave_phase = 0.9;
        let camera = Camera::new().with_clip(0.5, 40.0);

        let u = DepthUniforms::new(&params, EffectMode::DepthBand, &camera);
        assert_eq!(u.depth_threshold, 0.4);
        assert_eq!(u.mode, 0);
        assert_eq!((u.near, u.far), (0.5, 40.0));

        let u = DepthUniforms::new(&params, EffectMode::GradientLookup, &camera);
        assert_eq!(u.depth_threshold, 0.4);
        assert_eq!(u.mode, 1);
    }

    #[test]
    fn wave_mode_uses_the_phase() {
        let mut params = PassConfig::new();
        params.wave_phase = 0.75;
        let u = DepthUniforms::new(&params, EffectMode::AnimatedWave, &Camera::new());
        assert_eq!(u.depth_threshold, 0.75);
        assert_eq!(u.mode, 1);
    }

    #[test]
    fn colors_are_packed_as_rgba() {
        let params = PassConfig::new().colors(Color::rgb(1.0, 0.5, 0.0), Color::BLACK);
        let u = DepthUniforms::new(&params, EffectMode::DepthBand, &Camera::new());
        assert_eq!(u.color_near, [1.0, 0.5, 0.0, 1.0]);
        assert_eq!(u.color_far, [0.0, 0.0, 0.0, 1.0]);
    }
}
