//! Debug overlay: screen-space thumbnails of the scene color and of its
//! linearized depth, drawn on top of the composite output.
//!
//! [`DebugOverlay`] is pure layout state and can be driven without a GPU.
//! [`OverlayRenderer`] draws its quads.
//!
//! Quads are laid out in NDC. [`CameraQuad`] gives the same footprint as a
//! world-space quad in front of the camera, for hosts that draw the
//! thumbnails inside the 3D scene instead.

use glam::{Mat3, Quat, Vec2, Vec3};

use crate::camera::Camera;
use crate::config::OverlayConfig;
use crate::error::Result;
use crate::gpu::GpuContext;
use crate::input::{ControlBus, ControlEvent, Subscription};
use crate::pipeline::program::{ProgramPipeline, linear_sampler, uniform_buffer};
use crate::pipeline::render_target::{RenderContext, RenderTarget, Viewport};
use crate::shaders;

/// What a thumbnail shows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuadKind {
    SceneColor,
    LinearDepth,
}

/// Quad position in NDC: `center` plus half-extent `scale`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Placement {
    pub center: Vec2,
    pub scale: Vec2,
}

impl Placement {
    /// Placement of the `index`-th thumbnail, stacked down from the top-left
    /// corner of `viewport`.
    pub fn stacked(viewport: Viewport, index: usize, config: &OverlayConfig) -> Self {
        if viewport.is_empty() {
            return Self::default();
        }
        let (w, h) = (viewport.width as f32, viewport.height as f32);
        let ndc_w = config.size_px / w * 2.0;
        let ndc_h = config.size_px / h * 2.0;
        let border_x = config.border_px / w * 2.0;
        let border_y = config.border_px / h * 2.0;

        let left = -1.0 + border_x;
        let top = 1.0 - border_y - index as f32 * (ndc_h + border_y);
        Self {
            center: Vec2::new(left + ndc_w * 0.5, top - ndc_h * 0.5),
            scale: Vec2::new(ndc_w * 0.5, ndc_h * 0.5),
        }
    }
}

/// A thumbnail as a camera-facing quad in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraQuad {
    pub center: Vec3,
    /// Full width and height in world units.
    pub size: Vec2,
    /// Maps the quad's local XY plane onto the camera's image plane.
    pub rotation: Quat,
}

impl CameraQuad {
    /// The quad `distance` units in front of `camera` that covers the same
    /// pixels as [`Placement::stacked`].
    ///
    /// The visible slice at `distance` is `2·tan(fov/2)·distance` tall and
    /// `aspect` times as wide; NDC offsets scale onto it linearly.
    pub fn stacked(
        camera: &Camera,
        viewport: Viewport,
        index: usize,
        config: &OverlayConfig,
        distance: f32,
    ) -> Self {
        let placement = Placement::stacked(viewport, index, config);
        let height = 2.0 * (camera.fov * 0.5).tan() * distance;
        let width = height * viewport.aspect();

        let forward = camera.forward.normalize_or(Vec3::NEG_Z);
        let right = camera.right();
        let up = camera.orthogonal_up();
        let center = camera.position
            + forward * distance
            + right * (placement.center.x * width * 0.5)
            + up * (placement.center.y * height * 0.5);

        Self {
            center,
            size: Vec2::new(placement.scale.x * width, placement.scale.y * height),
            rotation: Quat::from_mat3(&Mat3::from_cols(right, up, -forward)),
        }
    }

    /// Corners in counter-clockwise order starting bottom-left.
    pub fn corners(&self) -> [Vec3; 4] {
        let half = self.size * 0.5;
        [
            Vec2::new(-half.x, -half.y),
            Vec2::new(half.x, -half.y),
            Vec2::new(half.x, half.y),
            Vec2::new(-half.x, half.y),
        ]
        .map(|c| self.center + self.rotation * c.extend(0.0))
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DebugQuad {
    pub kind: QuadKind,
    pub placement: Placement,
}

/// Visibility and layout of the debug thumbnails.
pub struct DebugOverlay {
    config: OverlayConfig,
    visible: bool,
    quads: Vec<DebugQuad>,
    subscription: Option<Subscription>,
}

impl DebugOverlay {
    pub fn new(config: OverlayConfig) -> Self {
        let mut overlay = Self {
            config,
            visible: false,
            quads: Vec::new(),
            subscription: None,
        };
        overlay.set_visible(config.visible_on_start);
        overlay
    }

    /// An overlay that follows `ToggleDebug` events published on `bus`.
    pub fn subscribed(config: OverlayConfig, bus: &ControlBus) -> Self {
        let mut overlay = Self::new(config);
        overlay.subscription = Some(bus.subscribe());
        overlay
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn quads(&self) -> &[DebugQuad] {
        &self.quads
    }

    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    pub fn toggle(&mut self) {
        self.set_visible(!self.visible);
    }

    /// Releases the current quads and builds replacements when visible.
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
        self.quads.clear();
        if !visible {
            return;
        }
        self.quads.push(DebugQuad {
            kind: QuadKind::SceneColor,
            placement: Placement::default(),
        });
        if self.config.show_depth {
            self.quads.push(DebugQuad {
                kind: QuadKind::LinearDepth,
                placement: Placement::default(),
            });
        }
    }

    pub fn handle(&mut self, event: &ControlEvent) {
        if let ControlEvent::ToggleDebug = event {
            self.toggle();
            log::info!(
                "debug overlay {}",
                if self.visible { "shown" } else { "hidden" }
            );
        }
    }

    /// Applies every event queued on the subscription since the last poll.
    pub fn poll(&mut self) {
        let Some(subscription) = self.subscription.take() else {
            return;
        };
        for event in subscription.drain() {
            self.handle(&event);
        }
        self.subscription = Some(subscription);
    }

    /// Current quads as world-space quads `distance` in front of `camera`.
    pub fn camera_quads(
        &self,
        camera: &Camera,
        viewport: Viewport,
        distance: f32,
    ) -> Vec<(QuadKind, CameraQuad)> {
        self.quads
            .iter()
            .enumerate()
            .map(|(index, quad)| {
                let world = CameraQuad::stacked(camera, viewport, index, &self.config, distance);
                (quad.kind, world)
            })
            .collect()
    }

    /// Recomputes quad placements for `viewport`.
    pub fn layout(&mut self, viewport: Viewport) {
        let config = self.config;
        for (index, quad) in self.quads.iter_mut().enumerate() {
            quad.placement = Placement::stacked(viewport, index, &config);
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct ThumbnailUniforms {
    center: [f32; 2],
    scale: [f32; 2],
    near: f32,
    far: f32,
    _pad: [f32; 2],
}

/// Draws [`DebugOverlay`] quads over an already composited view.
pub struct OverlayRenderer {
    color: ProgramPipeline,
    depth: ProgramPipeline,
    uniforms: [wgpu::Buffer; 2],
    sampler: wgpu::Sampler,
}

impl OverlayRenderer {
    pub fn new(gpu: &GpuContext, format: wgpu::TextureFormat) -> Self {
        let size = std::mem::size_of::<ThumbnailUniforms>();
        Self {
            color: ProgramPipeline::fullscreen(gpu, &shaders::THUMBNAIL_COLOR, format),
            depth: ProgramPipeline::fullscreen(gpu, &shaders::THUMBNAIL_DEPTH, format),
            uniforms: [
                uniform_buffer(gpu, "Thumbnail Uniforms 0", size),
                uniform_buffer(gpu, "Thumbnail Uniforms 1", size),
            ],
            sampler: linear_sampler(gpu, "Thumbnail Sampler"),
        }
    }

    /// Draws the quads of `overlay` into `output`, keeping its contents.
    pub fn render(
        &self,
        ctx: &mut RenderContext,
        overlay: &DebugOverlay,
        scene: &RenderTarget,
        output: &wgpu::TextureView,
    ) -> Result<()> {
        let mut draws = Vec::with_capacity(overlay.quads().len());
        for (quad, buffer) in overlay.quads().iter().zip(&self.uniforms) {
            let uniforms = ThumbnailUniforms {
                center: quad.placement.center.to_array(),
                scale: quad.placement.scale.to_array(),
                near: ctx.camera.near,
                far: ctx.camera.far,
                _pad: [0.0; 2],
            };
            ctx.gpu
                .queue
                .write_buffer(buffer, 0, bytemuck::bytes_of(&uniforms));

            let (pipeline, bindings) = match quad.kind {
                QuadKind::SceneColor => (
                    &self.color,
                    self.color
                        .bindings()
                        .bind("thumbnail", buffer.as_entire_binding())
                        .bind(
                            "source_color",
                            wgpu::BindingResource::TextureView(&scene.color_view),
                        )
                        .bind("source_sampler", wgpu::BindingResource::Sampler(&self.sampler)),
                ),
                QuadKind::LinearDepth => {
                    let Some(depth_view) = scene.depth_view() else {
                        continue;
                    };
                    (
                        &self.depth,
                        self.depth
                            .bindings()
                            .bind("thumbnail", buffer.as_entire_binding())
                            .bind("source_depth", wgpu::BindingResource::TextureView(depth_view)),
                    )
                }
            };
            let bind_group = pipeline.bind_group(&ctx.gpu.device, 0, bindings)?;
            draws.push((pipeline, bind_group));
        }

        let mut render_pass = ctx.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Debug Overlay Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: output,
                resolve_target: None,
                depth_slice: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        for (pipeline, bind_group) in &draws {
            render_pass.set_pipeline(&pipeline.pipeline);
            render_pass.set_bind_group(0, bind_group, &[]);
            render_pass.draw(0..6, 0..1);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Vec2, b: Vec2) {
        assert!((a - b).abs().max_element() < 1e-5, "{a} != {b}");
    }

    #[test]
    fn thumbnail_uniforms_match_wgsl() {
        assert_eq!(std::mem::size_of::<ThumbnailUniforms>(), 32);
    }

    #[test]
    fn first_quad_hugs_the_top_left_corner() {
        let p = Placement::stacked(Viewport::new(800, 600), 0, &OverlayConfig::default());
        // 180px wide on 800px is 0.45 NDC; the 10px border is 0.025 / 0.0333.
        assert_close(p.scale, Vec2::new(0.225, 0.3));
        assert_close(p.center, Vec2::new(-0.75, 1.0 - 10.0 / 300.0 - 0.3));
        // left and top edges sit exactly one border in
        assert!((p.center.x - p.scale.x - (-1.0 + 0.025)).abs() < 1e-5);
        assert!((p.center.y + p.scale.y - (1.0 - 10.0 / 300.0)).abs() < 1e-5);
    }

    #[test]
    fn second_quad_stacks_below_with_one_border_gap() {
        let config = OverlayConfig::default();
        let viewport = Viewport::new(800, 600);
        let first = Placement::stacked(viewport, 0, &config);
        let second = Placement::stacked(viewport, 1, &config);
        assert_eq!(first.center.x, second.center.x);
        let gap = (first.center.y - first.scale.y) - (second.center.y + second.scale.y);
        assert!((gap - 10.0 / 300.0).abs() < 1e-5);
    }

    #[test]
    fn empty_viewport_places_nothing() {
        let p = Placement::stacked(Viewport::new(0, 0), 1, &OverlayConfig::default());
        assert_eq!(p, Placement::default());
    }

    #[test]
    fn quads_follow_show_depth() {
        let overlay = DebugOverlay::new(OverlayConfig::default());
        let kinds: Vec<_> = overlay.quads().iter().map(|q| q.kind).collect();
        assert_eq!(kinds, vec![QuadKind::SceneColor, QuadKind::LinearDepth]);

        let overlay = DebugOverlay::new(OverlayConfig {
            show_depth: false,
            ..OverlayConfig::default()
        });
        assert_eq!(overlay.quads().len(), 1);
    }

    #[test]
    fn toggling_rebuilds_instead_of_accumulating() {
        let mut overlay = DebugOverlay::new(OverlayConfig::default());
        overlay.toggle();
        assert!(!overlay.is_visible());
        assert!(overlay.quads().is_empty());
        overlay.toggle();
        overlay.set_visible(true);
        assert_eq!(overlay.quads().len(), 2);
    }

    #[test]
    fn toggle_off_and_on_restores_identical_placement() {
        let viewport = Viewport::new(800, 600);
        let mut overlay = DebugOverlay::new(OverlayConfig::default());
        overlay.layout(viewport);
        let before = overlay.quads().to_vec();

        overlay.toggle();
        overlay.layout(viewport);
        assert!(overlay.quads().is_empty());
        overlay.toggle();
        overlay.layout(viewport);

        assert_eq!(overlay.quads(), before.as_slice());
    }

    fn demo_camera() -> Camera {
        Camera::new()
            .at(Vec3::new(4.0, 2.0, 6.0))
            .looking_at(Vec3::ZERO)
            .with_fov(45.0)
            .with_clip(0.1, 20.0)
    }

    #[test]
    fn camera_quad_projects_onto_the_stacked_placement() {
        let camera = demo_camera();
        let viewport = Viewport::new(800, 600);
        let config = OverlayConfig::default();
        let view_proj = camera.view_projection(viewport.aspect());

        for index in 0..2 {
            let placement = Placement::stacked(viewport, index, &config);
            let quad = CameraQuad::stacked(&camera, viewport, index, &config, 1.0);
            let [bottom_left, _, top_right, _] = quad.corners().map(|c| {
                let clip = view_proj * c.extend(1.0);
                Vec2::new(clip.x, clip.y) / clip.w
            });
            assert_close(bottom_left, placement.center - placement.scale);
            assert_close(top_right, placement.center + placement.scale);
        }
    }

    #[test]
    fn camera_quad_faces_the_camera_at_the_given_distance() {
        let camera = demo_camera();
        let quad =
            CameraQuad::stacked(&camera, Viewport::new(800, 600), 0, &OverlayConfig::default(), 2.0);
        let normal = quad.rotation * Vec3::Z;
        assert!(normal.abs_diff_eq(-camera.forward, 1e-5), "{normal}");
        let along = (quad.center - camera.position).dot(camera.forward);
        assert!((along - 2.0).abs() < 1e-4);
    }

    #[test]
    fn camera_quads_follow_the_visible_quads() {
        let camera = demo_camera();
        let mut overlay = DebugOverlay::new(OverlayConfig::default());
        let kinds: Vec<_> = overlay
            .camera_quads(&camera, Viewport::new(640, 480), 1.0)
            .into_iter()
            .map(|(kind, _)| kind)
            .collect();
        assert_eq!(kinds, vec![QuadKind::SceneColor, QuadKind::LinearDepth]);

        overlay.toggle();
        assert!(overlay.camera_quads(&camera, Viewport::new(640, 480), 1.0).is_empty());
    }

    #[test]
    fn hidden_on_start_when_configured() {
        let overlay = DebugOverlay::new(OverlayConfig {
            visible_on_start: false,
            ..OverlayConfig::default()
        });
        assert!(!overlay.is_visible());
        assert!(overlay.quads().is_empty());
    }

    #[test]
    fn bus_events_toggle_visibility() {
        let bus = ControlBus::new();
        let mut overlay = DebugOverlay::subscribed(OverlayConfig::default(), &bus);
        bus.publish(ControlEvent::Resized(Viewport::new(640, 480)));
        overlay.poll();
        assert!(overlay.is_visible());

        bus.publish(ControlEvent::ToggleDebug);
        overlay.poll();
        assert!(!overlay.is_visible());

        bus.publish(ControlEvent::ToggleDebug);
        bus.publish(ControlEvent::ToggleDebug);
        overlay.poll();
        assert!(!overlay.is_visible());
    }

    #[test]
    fn layout_places_every_quad() {
        let mut overlay = DebugOverlay::new(OverlayConfig::default());
        let viewport = Viewport::new(1280, 720);
        overlay.layout(viewport);
        let config = OverlayConfig::default();
        for (i, quad) in overlay.quads().iter().enumerate() {
            assert_eq!(quad.placement, Placement::stacked(viewport, i, &config));
        }
    }
}
