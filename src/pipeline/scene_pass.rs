//! Scene capture: draws the scene's meshes into an off-screen color target
//! with a depth attachment the depth stage reads afterwards.
//!
//! Two bind groups:
//! - **Group 0**: camera uniforms, written once per frame
//! - **Group 1**: model uniforms, one 256-byte-aligned record per object,
//!   selected with a dynamic offset
//!
//! Draw order is opaque meshes, then the raymarched SDF sphere (a
//! fullscreen triangle that writes its own depth), then translucent meshes
//! blended double-sided on top.

use std::num::NonZeroU64;

use glam::Vec3;

use crate::camera::Camera;
use crate::color::Color;
use crate::error::Result;
use crate::gpu::GpuContext;
use crate::pipeline::program::{ProgramPipeline, uniform_buffer};
use crate::pipeline::render_target::{RenderContext, RenderTarget};
use crate::scene::Scene;
use crate::sdf::SdfSphere;
use crate::shaders;

/// Camera uniforms for the scene material.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub camera_pos: [f32; 3],
    /// Elapsed time in seconds.
    pub time: f32,
    /// Direction the light travels, world space.
    pub light_dir: [f32; 3],
    pub ambient: f32,
}

/// Per-object uniforms.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelUniforms {
    pub model: [[f32; 4]; 4],
    /// Inverse transpose of `model`.
    pub normal_matrix: [[f32; 4]; 4],
    pub color: [f32; 4],
}

/// Uniforms of the raymarch program. Layout mirrors `RaymarchParams` in WGSL.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct RaymarchUniforms {
    pub inv_view_proj: [[f32; 4]; 4],
    pub camera_pos: [f32; 3],
    pub near: f32,
    pub camera_forward: [f32; 3],
    pub far: f32,
    pub light_dir: [f32; 3],
    pub ambient: f32,
    /// Center in `xyz`, radius in `w`.
    pub sphere: [f32; 4],
    pub color: [f32; 4],
    pub max_distance: f32,
    pub _pad: [f32; 3],
}

impl RaymarchUniforms {
    pub fn new(sphere: &SdfSphere, camera: &Camera, aspect: f32) -> Self {
        Self {
            inv_view_proj: camera
                .view_projection(aspect)
                .inverse()
                .to_cols_array_2d(),
            camera_pos: camera.position.to_array(),
            near: camera.near,
            camera_forward: camera.forward.normalize_or(Vec3::NEG_Z).to_array(),
            far: camera.far,
            light_dir: LIGHT_DIR.normalize().to_array(),
            ambient: AMBIENT,
            sphere: sphere.center.extend(sphere.radius).to_array(),
            color: sphere.color.to_array(),
            max_distance: sphere.max_distance,
            _pad: [0.0; 3],
        }
    }
}

const LIGHT_DIR: Vec3 = Vec3::new(-0.4, -1.0, -0.3);
const AMBIENT: f32 = 0.25;
const INITIAL_CAPACITY: usize = 16;

/// Rounds `size` up to a multiple of `alignment`.
pub fn aligned_stride(size: usize, alignment: usize) -> usize {
    let alignment = alignment.max(1);
    size.div_ceil(alignment) * alignment
}

/// Renders every visible scene object into the scene target.
pub struct ScenePass {
    pipeline: ProgramPipeline,
    translucent: ProgramPipeline,
    raymarch: ProgramPipeline,
    raymarch_buffer: wgpu::Buffer,
    raymarch_bind_group: wgpu::BindGroup,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    model_buffer: wgpu::Buffer,
    model_bind_group: wgpu::BindGroup,
    model_stride: usize,
    capacity: usize,
    clear_color: Color,
}

impl ScenePass {
    pub fn new(gpu: &GpuContext, clear_color: Color) -> Result<Self> {
        let pipeline = ProgramPipeline::mesh(gpu, &shaders::SCENE, gpu.color_format());
        let translucent =
            ProgramPipeline::translucent_mesh(gpu, &shaders::SCENE, gpu.color_format());
        let raymarch =
            ProgramPipeline::fullscreen_depth(gpu, &shaders::RAYMARCH, gpu.color_format());

        let camera_buffer = uniform_buffer(
            gpu,
            "Scene Camera Uniforms",
            std::mem::size_of::<CameraUniforms>(),
        );
        let camera_bind_group = pipeline.bind_group(
            &gpu.device,
            0,
            pipeline
                .bindings()
                .bind("camera", camera_buffer.as_entire_binding()),
        )?;

        let raymarch_buffer = uniform_buffer(
            gpu,
            "Raymarch Uniforms",
            std::mem::size_of::<RaymarchUniforms>(),
        );
        let raymarch_bind_group = raymarch.bind_group(
            &gpu.device,
            0,
            raymarch
                .bindings()
                .bind("raymarch", raymarch_buffer.as_entire_binding()),
        )?;

        let model_stride = aligned_stride(
            std::mem::size_of::<ModelUniforms>(),
            gpu.device.limits().min_uniform_buffer_offset_alignment as usize,
        );
        let (model_buffer, model_bind_group) =
            Self::create_model_storage(gpu, &pipeline, model_stride, INITIAL_CAPACITY)?;

        Ok(Self {
            pipeline,
            translucent,
            raymarch,
            raymarch_buffer,
            raymarch_bind_group,
            camera_buffer,
            camera_bind_group,
            model_buffer,
            model_bind_group,
            model_stride,
            capacity: INITIAL_CAPACITY,
            clear_color,
        })
    }

    fn create_model_storage(
        gpu: &GpuContext,
        pipeline: &ProgramPipeline,
        stride: usize,
        capacity: usize,
    ) -> Result<(wgpu::Buffer, wgpu::BindGroup)> {
        let buffer = uniform_buffer(gpu, "Scene Model Uniforms", stride * capacity);
        let binding = wgpu::BindingResource::Buffer(wgpu::BufferBinding {
            buffer: &buffer,
            offset: 0,
            size: NonZeroU64::new(std::mem::size_of::<ModelUniforms>() as u64),
        });
        let bind_group =
            pipeline.bind_group(&gpu.device, 1, pipeline.bindings().bind("model", binding))?;
        Ok((buffer, bind_group))
    }

    /// Grows the model buffer to hold at least `count` records.
    fn ensure_capacity(&mut self, gpu: &GpuContext, count: usize) -> Result<()> {
        if count <= self.capacity {
            return Ok(());
        }
        let capacity = count.next_power_of_two();
        let (buffer, bind_group) =
            Self::create_model_storage(gpu, &self.pipeline, self.model_stride, capacity)?;
        log::debug!(
            "scene model buffer grown: {} -> {} objects",
            self.capacity,
            capacity
        );
        self.model_buffer = buffer;
        self.model_bind_group = bind_group;
        self.capacity = capacity;
        Ok(())
    }

    /// Clears `target` and draws the scene into it.
    ///
    /// `target` must carry a depth attachment; its depth is cleared to 1.0.
    pub fn render(
        &mut self,
        ctx: &mut RenderContext,
        scene: &Scene,
        target: &RenderTarget,
    ) -> Result<()> {
        let gpu = ctx.gpu;
        let count = scene.drawable_count();
        self.ensure_capacity(gpu, count)?;

        let aspect = ctx.viewport.aspect();
        let camera = CameraUniforms {
            view_proj: ctx.camera.view_projection(aspect).to_cols_array_2d(),
            camera_pos: ctx.camera.position.to_array(),
            time: ctx.time,
            light_dir: LIGHT_DIR.normalize().to_array(),
            ambient: AMBIENT,
        };
        gpu.queue
            .write_buffer(&self.camera_buffer, 0, bytemuck::bytes_of(&camera));

        let mut opaque = Vec::with_capacity(count);
        let mut translucent = Vec::new();
        if count > 0 {
            let mut records = vec![0u8; count * self.model_stride];
            for (i, (mesh, object)) in scene.drawables().enumerate() {
                let model = object.transform.matrix();
                let uniforms = ModelUniforms {
                    model: model.to_cols_array_2d(),
                    normal_matrix: model.inverse().transpose().to_cols_array_2d(),
                    color: object.color.to_array(),
                };
                let start = i * self.model_stride;
                records[start..start + std::mem::size_of::<ModelUniforms>()]
                    .copy_from_slice(bytemuck::bytes_of(&uniforms));

                let draw = (mesh, start as u32);
                if object.is_translucent() {
                    translucent.push(draw);
                } else {
                    opaque.push(draw);
                }
            }
            gpu.queue.write_buffer(&self.model_buffer, 0, &records);
        }

        if let Some(sphere) = scene.sdf() {
            let uniforms = RaymarchUniforms::new(sphere, ctx.camera, aspect);
            gpu.queue
                .write_buffer(&self.raymarch_buffer, 0, bytemuck::bytes_of(&uniforms));
        }

        let depth_view = target.depth_view();
        let mut render_pass = ctx.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Scene Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &target.color_view,
                resolve_target: None,
                depth_slice: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(self.clear_color.to_wgpu()),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: depth_view.map(|view| {
                wgpu::RenderPassDepthStencilAttachment {
                    view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        render_pass.set_pipeline(&self.pipeline.pipeline);
        render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
        for (mesh, offset) in opaque {
            render_pass.set_bind_group(1, &self.model_bind_group, &[offset]);
            render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            render_pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            render_pass.draw_indexed(0..mesh.index_count, 0, 0..1);
        }

        if scene.sdf().is_some() {
            render_pass.set_pipeline(&self.raymarch.pipeline);
            render_pass.set_bind_group(0, &self.raymarch_bind_group, &[]);
            render_pass.draw(0..3, 0..1);
        }

        if !translucent.is_empty() {
            render_pass.set_pipeline(&self.translucent.pipeline);
            render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
            for (mesh, offset) in translucent {
                render_pass.set_bind_group(1, &self.model_bind_group, &[offset]);
                render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                render_pass
                    .set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..mesh.index_count, 0, 0..1);
            }
        }

        Ok(())
    }
}
