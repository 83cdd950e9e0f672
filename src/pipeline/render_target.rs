//! Offscreen targets and the per-frame execution context.

use crate::camera::Camera;
use crate::config::PassConfig;
use crate::gpu::GpuContext;

/// Drawable size in physical pixels. Empty when either side is zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Width over height, or 1 for an empty viewport.
    pub fn aspect(&self) -> f32 {
        if self.is_empty() {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }

    fn extent(&self) -> wgpu::Extent3d {
        wgpu::Extent3d {
            width: self.width,
            height: self.height,
            depth_or_array_layers: 1,
        }
    }
}

/// An off-screen color texture with an optional depth texture.
///
/// Both are created with `RENDER_ATTACHMENT | TEXTURE_BINDING` so a later
/// pass can sample what an earlier pass wrote. Targets are never resized in
/// place; a new viewport means a new target.
pub struct RenderTarget {
    pub color: wgpu::Texture,
    pub color_view: wgpu::TextureView,
    depth: Option<(wgpu::Texture, wgpu::TextureView)>,
    size: Viewport,
}

impl RenderTarget {
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    pub fn new(gpu: &GpuContext, label: &str, size: Viewport, with_depth: bool) -> Self {
        let color = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: size.extent(),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: gpu.color_format(),
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let color_view = color.create_view(&wgpu::TextureViewDescriptor::default());

        let depth = with_depth.then(|| {
            let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
                label: Some(&format!("{label} Depth")),
                size: size.extent(),
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: Self::DEPTH_FORMAT,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                    | wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats: &[],
            });
            let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
            (texture, view)
        });

        Self {
            color,
            color_view,
            depth,
            size,
        }
    }

    pub fn depth_view(&self) -> Option<&wgpu::TextureView> {
        self.depth.as_ref().map(|(_, view)| view)
    }

    pub fn size(&self) -> Viewport {
        self.size
    }
}

/// The pipeline's target set: scene capture (color + depth) and effect output.
pub struct FrameTargets {
    pub scene: RenderTarget,
    pub effect: RenderTarget,
}

impl FrameTargets {
    pub fn new(gpu: &GpuContext, size: Viewport) -> Self {
        Self {
            scene: RenderTarget::new(gpu, "Scene Target", size, true),
            effect: RenderTarget::new(gpu, "Effect Target", size, false),
        }
    }

    pub fn size(&self) -> Viewport {
        self.scene.size()
    }
}

/// Everything a pass needs to encode its work for one frame.
///
/// `params` is the frame's clamped parameter snapshot; passes read it and
/// never keep it.
pub struct RenderContext<'a> {
    pub gpu: &'a GpuContext,
    pub encoder: &'a mut wgpu::CommandEncoder,
    pub camera: &'a Camera,
    pub params: &'a PassConfig,
    /// Elapsed time in seconds since start.
    pub time: f32,
    /// Size of the targets this frame renders into.
    pub viewport: Viewport,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_when_either_side_is_zero() {
        assert!(Viewport::new(0, 600).is_empty());
        assert!(Viewport::new(800, 0).is_empty());
        assert!(Viewport::default().is_empty());
        assert!(!Viewport::new(1, 1).is_empty());
    }

    #[test]
    fn aspect_never_divides_by_zero() {
        assert_eq!(Viewport::new(800, 0).aspect(), 1.0);
        assert!((Viewport::new(800, 600).aspect() - 4.0 / 3.0).abs() < 1e-6);
    }
}
