//! [`PostPipeline`] owns the three passes, their targets and the debug
//! overlay, and runs them once per frame in fixed order.
//!
//! Each frame is planned by the [`FrameScheduler`] and executed step by step
//! into a single command encoder, which is submitted once.

use crate::camera::Camera;
use crate::config::{EffectMode, ParameterSource, PassConfig, PipelineConfig};
use crate::error::Result;
use crate::gpu::GpuContext;
use crate::input::ControlBus;
use crate::gradient::Gradient;
use crate::pipeline::composite_pass::CompositePass;
use crate::pipeline::depth_pass::DepthPass;
use crate::pipeline::overlay::{DebugOverlay, OverlayRenderer};
use crate::pipeline::render_target::{FrameTargets, RenderContext, Viewport};
use crate::pipeline::scene_pass::ScenePass;
use crate::pipeline::schedule::{
    CompositeSource, FrameInputs, FramePlan, FrameScheduler, FrameStep, OutputTarget,
    PipelineState,
};
use crate::scene::Scene;
use crate::wave::WaveAnimator;

/// Outcome of a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameStatus {
    /// Every planned step ran and the work was submitted.
    Rendered,
    /// Nothing to draw into: the viewport is empty or targets are missing.
    Deferred,
    /// The surface could not provide a frame; try again next redraw.
    Skipped,
}

/// Takes the frame's parameter snapshot: clamped, with the wave phase
/// advanced by `dt` when `mode` animates it.
pub fn frame_snapshot(
    source: &impl ParameterSource,
    mode: EffectMode,
    wave: &mut WaveAnimator,
    dt: f32,
) -> PassConfig {
    let mut snapshot = source.snapshot().clamped();
    snapshot.wave_phase = match mode {
        EffectMode::AnimatedWave => wave.advance(dt),
        _ => wave.phase(),
    };
    snapshot
}

/// The fixed scene → depth → composite pipeline.
pub struct PostPipeline {
    config: PipelineConfig,
    scheduler: FrameScheduler,
    scene_pass: ScenePass,
    depth_pass: DepthPass,
    composite_pass: CompositePass,
    overlay: DebugOverlay,
    overlay_renderer: OverlayRenderer,
    targets: Option<FrameTargets>,
    wave: WaveAnimator,
    state: Option<PipelineState>,
    time: f32,
}

impl PostPipeline {
    /// Builds every pass for `config.mode`. Targets are allocated lazily on
    /// the first frame with a non-empty viewport.
    ///
    /// Fails when the configured gradient is unusable.
    pub fn new(gpu: &GpuContext, config: PipelineConfig, bus: &ControlBus) -> Result<Self> {
        let format = gpu.color_format();
        let gradient = Gradient::from_config(&config.gradient)?;

        let pipeline = Self {
            scheduler: FrameScheduler::new(),
            scene_pass: ScenePass::new(gpu, config.clear_color)?,
            depth_pass: DepthPass::new(gpu, config.mode, &gradient, config.gradient.resolution),
            composite_pass: CompositePass::new(gpu, format),
            overlay: DebugOverlay::subscribed(config.overlay, bus),
            overlay_renderer: OverlayRenderer::new(gpu, format),
            targets: None,
            wave: WaveAnimator::from_config(&config.wave),
            state: None,
            time: 0.0,
            config,
        };
        log::info!(
            "post pipeline ready: mode {:?}, format {:?}",
            pipeline.config.mode,
            format
        );
        Ok(pipeline)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// State used by the most recent frame, if any frame was planned.
    pub fn state(&self) -> Option<PipelineState> {
        self.state
    }

    pub fn overlay(&self) -> &DebugOverlay {
        &self.overlay
    }

    pub fn overlay_mut(&mut self) -> &mut DebugOverlay {
        &mut self.overlay
    }

    pub fn wave_phase(&self) -> f32 {
        self.wave.phase()
    }

    /// Size of the live targets, or `None` before the first frame and after
    /// [`teardown`](Self::teardown).
    pub fn target_size(&self) -> Option<Viewport> {
        self.targets.as_ref().map(FrameTargets::size)
    }

    /// Renders one frame to the window surface and presents it.
    ///
    /// `dt` is the time since the previous tick in seconds. A lost or
    /// outdated surface is reconfigured and the frame is skipped.
    pub fn tick(
        &mut self,
        gpu: &GpuContext,
        scene: &Scene,
        camera: &Camera,
        params: &impl ParameterSource,
        dt: f32,
    ) -> Result<FrameStatus> {
        self.overlay.poll();
        if dt.is_finite() && dt > 0.0 {
            self.time += dt;
        }

        let snapshot = frame_snapshot(params, self.config.mode, &mut self.wave, dt);
        let plan = self.plan(gpu.viewport(), &snapshot, OutputTarget::Screen);
        if plan.is_deferred() {
            log::trace!("frame deferred: empty viewport");
            return Ok(FrameStatus::Deferred);
        }
        self.allocate(gpu, &plan);

        let frame = match gpu.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("surface lost or outdated, reconfiguring and skipping frame");
                gpu.reconfigure();
                return Ok(FrameStatus::Skipped);
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("surface acquire timed out, skipping frame");
                return Ok(FrameStatus::Skipped);
            }
            Err(e) => return Err(e.into()),
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let status = self.execute(gpu, &plan, scene, camera, &snapshot, &view)?;
        frame.present();
        Ok(status)
    }

    /// Renders one frame into `view` instead of the surface, without the
    /// overlay and without advancing the wave.
    ///
    /// `view` must have the surface format ([`GpuContext::color_format`]).
    pub fn render_to_target(
        &mut self,
        gpu: &GpuContext,
        scene: &Scene,
        camera: &Camera,
        params: &impl ParameterSource,
        view: &wgpu::TextureView,
    ) -> Result<FrameStatus> {
        let snapshot = frame_snapshot(params, self.config.mode, &mut self.wave, 0.0);
        let plan = self.plan(gpu.viewport(), &snapshot, OutputTarget::Override);
        if plan.is_deferred() {
            return Ok(FrameStatus::Deferred);
        }
        self.allocate(gpu, &plan);
        self.execute(gpu, &plan, scene, camera, &snapshot, view)
    }

    /// Drops every target. The next frame reallocates.
    pub fn teardown(&mut self) {
        if self.targets.take().is_some() {
            log::debug!("render targets released");
        }
    }

    fn plan(&mut self, viewport: Viewport, snapshot: &PassConfig, output: OutputTarget) -> FramePlan {
        let state = PipelineState::resolve(snapshot, self.config.mode);
        if self.state != Some(state) {
            log::info!("pipeline state: {:?} -> {:?}", self.state, state);
            self.state = Some(state);
        }

        self.scheduler.plan(&FrameInputs {
            viewport,
            allocated: self.target_size(),
            state,
            overlay_visible: self.overlay.is_visible(),
            output,
        })
    }

    fn allocate(&mut self, gpu: &GpuContext, plan: &FramePlan) {
        let Some(size) = plan.allocation() else {
            return;
        };
        // release the old set before creating the new one
        self.targets = None;
        self.targets = Some(FrameTargets::new(gpu, size));
        log::info!("render targets allocated: {}x{}", size.width, size.height);
    }

    fn execute(
        &mut self,
        gpu: &GpuContext,
        plan: &FramePlan,
        scene: &Scene,
        camera: &Camera,
        params: &PassConfig,
        output: &wgpu::TextureView,
    ) -> Result<FrameStatus> {
        let Some(targets) = self.targets.as_ref() else {
            return Ok(FrameStatus::Deferred);
        };
        self.overlay.layout(targets.size());

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("depthfx Frame Encoder"),
            });
        let mut ctx = RenderContext {
            gpu,
            encoder: &mut encoder,
            camera,
            params,
            time: self.time,
            viewport: targets.size(),
        };

        for step in &plan.steps {
            match *step {
                FrameStep::AllocateTargets(_) => {}
                FrameStep::Scene => self.scene_pass.render(&mut ctx, scene, &targets.scene)?,
                FrameStep::Depth => {
                    self.depth_pass
                        .render(&mut ctx, &targets.scene, &targets.effect)?
                }
                FrameStep::Composite { source, .. } => {
                    let effect = match source {
                        CompositeSource::EffectTarget => &targets.effect.color_view,
                        CompositeSource::SceneColor => &targets.scene.color_view,
                    };
                    self.composite_pass
                        .render(&mut ctx, &targets.scene.color_view, effect, output)?
                }
                FrameStep::Overlay => {
                    self.overlay_renderer
                        .render(&mut ctx, &self.overlay, &targets.scene, output)?
                }
            }
        }

        gpu.queue.submit(std::iter::once(encoder.finish()));
        Ok(FrameStatus::Rendered)
    }
}
