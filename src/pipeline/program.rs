//! Pipeline creation and bind group wiring for [`ShaderProgram`]s.
//!
//! Resources are bound by slot name through [`SlotBindings`]. Naming a slot
//! the program does not declare, or leaving a declared slot unbound, is an
//! error at bind time instead of a wgpu validation panic at draw time.

use crate::error::{Error, Result};
use crate::gpu::GpuContext;
use crate::mesh::Vertex3d;
use crate::pipeline::render_target::RenderTarget;
use crate::shaders::{ShaderProgram, UniformSlot};

/// Resources for one bind group, collected by slot name.
///
/// Generic over the resource so the name checks run without a device.
pub struct SlotBindings<R> {
    program: &'static ShaderProgram,
    entries: Vec<(&'static UniformSlot, R)>,
    unknown: Option<String>,
}

impl<R> SlotBindings<R> {
    pub fn new(program: &'static ShaderProgram) -> Self {
        Self {
            program,
            entries: Vec::new(),
            unknown: None,
        }
    }

    /// Binds `resource` to the slot called `name`, replacing any earlier binding.
    pub fn bind(mut self, name: &str, resource: R) -> Self {
        match self.program.slot(name) {
            Some(slot) => {
                self.entries.retain(|(s, _)| s.name != slot.name);
                self.entries.push((slot, resource));
            }
            None => {
                if self.unknown.is_none() {
                    self.unknown = Some(name.to_string());
                }
            }
        }
        self
    }

    /// Checks the bindings of `group` and returns them as `(binding, resource)`
    /// pairs ordered by binding.
    ///
    /// Resources bound to slots of other groups are dropped.
    pub fn resolve(self, group: u32) -> Result<Vec<(u32, R)>> {
        if let Some(slot) = self.unknown {
            return Err(Error::UnknownSlot {
                program: self.program.label,
                slot,
            });
        }

        let mut entries = self.entries;
        if let Some(missing) = self
            .program
            .group_slots(group)
            .into_iter()
            .find(|slot| !entries.iter().any(|(s, _)| s.name == slot.name))
        {
            return Err(Error::UnboundSlot {
                program: self.program.label,
                slot: missing.name,
            });
        }

        entries.retain(|(s, _)| s.group == group);
        entries.sort_by_key(|(s, _)| s.binding);
        Ok(entries.into_iter().map(|(s, r)| (s.binding, r)).collect())
    }
}

/// A compiled render pipeline together with the layouts of its bind groups.
pub struct ProgramPipeline {
    pub program: &'static ShaderProgram,
    pub pipeline: wgpu::RenderPipeline,
    layouts: Vec<wgpu::BindGroupLayout>,
}

impl ProgramPipeline {
    /// A pipeline drawing vertex-index-generated geometry with no depth
    /// attachment. Used for the fullscreen passes and the overlay quads.
    pub fn fullscreen(
        gpu: &GpuContext,
        program: &'static ShaderProgram,
        format: wgpu::TextureFormat,
    ) -> Self {
        Self::build(gpu, program, format, &[], None, None, wgpu::BlendState::REPLACE)
    }

    /// A fullscreen pipeline that depth-tests against the target and writes
    /// the depth the fragment stage reports through `@builtin(frag_depth)`.
    pub fn fullscreen_depth(
        gpu: &GpuContext,
        program: &'static ShaderProgram,
        format: wgpu::TextureFormat,
    ) -> Self {
        Self::build(
            gpu,
            program,
            format,
            &[],
            Some(depth_test()),
            None,
            wgpu::BlendState::REPLACE,
        )
    }

    /// A pipeline for indexed [`Vertex3d`] meshes with back-face culling and
    /// a `Less` depth test.
    pub fn mesh(
        gpu: &GpuContext,
        program: &'static ShaderProgram,
        format: wgpu::TextureFormat,
    ) -> Self {
        Self::build(
            gpu,
            program,
            format,
            &[Vertex3d::LAYOUT],
            Some(depth_test()),
            Some(wgpu::Face::Back),
            wgpu::BlendState::REPLACE,
        )
    }

    /// Like [`mesh`](Self::mesh) but alpha blended and drawn double-sided.
    /// Depth is still written so the depth stage sees translucent surfaces.
    pub fn translucent_mesh(
        gpu: &GpuContext,
        program: &'static ShaderProgram,
        format: wgpu::TextureFormat,
    ) -> Self {
        Self::build(
            gpu,
            program,
            format,
            &[Vertex3d::LAYOUT],
            Some(depth_test()),
            None,
            wgpu::BlendState::ALPHA_BLENDING,
        )
    }

    fn build(
        gpu: &GpuContext,
        program: &'static ShaderProgram,
        format: wgpu::TextureFormat,
        buffers: &[wgpu::VertexBufferLayout<'_>],
        depth_stencil: Option<wgpu::DepthStencilState>,
        cull_mode: Option<wgpu::Face>,
        blend: wgpu::BlendState,
    ) -> Self {
        let device = &gpu.device;
        let module = program.create_module(device);
        let layouts = program.create_bind_group_layouts(device);
        let layout_refs: Vec<&wgpu::BindGroupLayout> = layouts.iter().collect();

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&format!("{} Pipeline Layout", program.label)),
            bind_group_layouts: &layout_refs,
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&format!("{} Pipeline", program.label)),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &module,
                entry_point: Some(ShaderProgram::VERTEX_ENTRY),
                buffers,
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &module,
                entry_point: Some(ShaderProgram::FRAGMENT_ENTRY),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(blend),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode,
                ..Default::default()
            },
            depth_stencil,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self {
            program,
            pipeline,
            layouts,
        }
    }

    /// Creates the bind group for `group` from named bindings.
    pub fn bind_group(
        &self,
        device: &wgpu::Device,
        group: u32,
        bindings: SlotBindings<wgpu::BindingResource<'_>>,
    ) -> Result<wgpu::BindGroup> {
        let layout = self
            .layouts
            .get(group as usize)
            .ok_or(Error::UnknownGroup {
                program: self.program.label,
                group,
            })?;
        let entries: Vec<wgpu::BindGroupEntry> = bindings
            .resolve(group)?
            .into_iter()
            .map(|(binding, resource)| wgpu::BindGroupEntry { binding, resource })
            .collect();

        Ok(device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{} Group {group}", self.program.label)),
            layout,
            entries: &entries,
        }))
    }

    pub fn bindings<'a>(&self) -> SlotBindings<wgpu::BindingResource<'a>> {
        SlotBindings::new(self.program)
    }
}

fn depth_test() -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: RenderTarget::DEPTH_FORMAT,
        depth_write_enabled: true,
        depth_compare: wgpu::CompareFunction::Less,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    }
}

/// Bilinear, edge-clamped sampler shared by the fullscreen passes.
pub fn linear_sampler(gpu: &GpuContext, label: &str) -> wgpu::Sampler {
    gpu.device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some(label),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    })
}

/// Uniform buffer sized for `size` bytes, written each frame.
pub fn uniform_buffer(gpu: &GpuContext, label: &str, size: usize) -> wgpu::Buffer {
    gpu.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: size as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}
