//! Final composite: `mix(scene, effect, blend)` written to the output view.

use crate::error::Result;
use crate::gpu::GpuContext;
use crate::pipeline::program::{ProgramPipeline, linear_sampler, uniform_buffer};
use crate::pipeline::render_target::RenderContext;
use crate::shaders;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CompositeUniforms {
    /// 0 shows the scene, 1 shows the effect.
    pub blend: f32,
    pub _pad: [f32; 3],
}

impl CompositeUniforms {
    pub fn new(blend: f32) -> Self {
        Self {
            blend: blend.clamp(0.0, 1.0),
            _pad: [0.0; 3],
        }
    }
}

pub struct CompositePass {
    pipeline: ProgramPipeline,
    uniforms: wgpu::Buffer,
    sampler: wgpu::Sampler,
}

impl CompositePass {
    /// `format` is the format of the views this pass writes to.
    pub fn new(gpu: &GpuContext, format: wgpu::TextureFormat) -> Self {
        Self {
            pipeline: ProgramPipeline::fullscreen(gpu, &shaders::COMPOSITE, format),
            uniforms: uniform_buffer(
                gpu,
                "Composite Uniforms",
                std::mem::size_of::<CompositeUniforms>(),
            ),
            sampler: linear_sampler(gpu, "Composite Sampler"),
        }
    }

    /// Blends `scene` and `effect` into `output`.
    ///
    /// With the effect stage disabled the caller passes the scene color as
    /// `effect` too, which makes the blend factor irrelevant.
    pub fn render(
        &self,
        ctx: &mut RenderContext,
        scene: &wgpu::TextureView,
        effect: &wgpu::TextureView,
        output: &wgpu::TextureView,
    ) -> Result<()> {
        let uniforms = CompositeUniforms::new(ctx.params.blend);
        ctx.gpu
            .queue
            .write_buffer(&self.uniforms, 0, bytemuck::bytes_of(&uniforms));

        let bind_group = self.pipeline.bind_group(
            &ctx.gpu.device,
            0,
            self.pipeline
                .bindings()
                .bind("composite", self.uniforms.as_entire_binding())
                .bind("scene_color", wgpu::BindingResource::TextureView(scene))
                .bind("effect_color", wgpu::BindingResource::TextureView(effect))
                .bind("color_sampler", wgpu::BindingResource::Sampler(&self.sampler)),
        )?;

        let mut render_pass = ctx.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Composite Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: output,
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
