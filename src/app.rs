//! Window and event loop shell around [`PostPipeline`].
//!
//! [`run`] opens a window, hands a [`SetupContext`] to the setup closure and
//! then calls the returned frame closure once per redraw, followed by one
//! pipeline tick.

use std::sync::Arc;
use std::time::Instant;

use winit::application::ApplicationHandler;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::Key;
use winit::window::{Window, WindowAttributes, WindowId};

use crate::camera::Camera;
use crate::config::{AppConfig, PassConfig, PipelineConfig};
use crate::error::{Error, Result};
use crate::gpu::GpuContext;
use crate::input::{ControlBus, ControlEvent, Input, is_toggle_key};
use crate::mesh::{Mesh, MeshData};
use crate::pipeline::{FrameStatus, PipelineState, PostPipeline};
use crate::scene::{MeshId, ObjectId, Scene, SceneObject};
use crate::sdf::SdfSphere;

/// Context provided during app setup.
pub struct SetupContext<'a> {
    pub gpu: &'a GpuContext,
    scene: &'a mut Scene,
    camera: &'a mut Camera,
    pipeline: &'a mut PipelineConfig,
    bus: &'a ControlBus,
}

impl SetupContext<'_> {
    /// Upload mesh data and register it with the scene.
    pub fn add_mesh(&mut self, data: &MeshData) -> MeshId {
        self.scene.add_mesh(Mesh::new(self.gpu, data))
    }

    /// Create a unit cube mesh.
    pub fn mesh_cube(&mut self) -> MeshId {
        self.add_mesh(&MeshData::cube())
    }

    /// Create a UV sphere mesh of radius 0.5.
    pub fn mesh_sphere(&mut self, segments: u32, rings: u32) -> MeshId {
        self.add_mesh(&MeshData::sphere(segments, rings))
    }

    /// Create a flat XZ plane facing +Y.
    pub fn mesh_plane(&mut self, size: f32) -> MeshId {
        self.add_mesh(&MeshData::plane(size))
    }

    /// Create a torus around the Y axis.
    pub fn mesh_torus(&mut self, radius: f32, tube: f32, radial: u32, tubular: u32) -> MeshId {
        self.add_mesh(&MeshData::torus(radius, tube, radial, tubular))
    }

    pub fn add_object(&mut self, object: SceneObject) -> ObjectId {
        self.scene.add_object(object)
    }

    /// Adds a raymarched sphere, replacing any earlier one.
    pub fn set_sdf_sphere(&mut self, sphere: SdfSphere) {
        self.scene.set_sdf(Some(sphere));
    }

    pub fn scene(&mut self) -> &mut Scene {
        self.scene
    }

    /// Set the camera the first frame starts from.
    pub fn set_camera(&mut self, camera: Camera) {
        *self.camera = camera;
    }

    /// Replace the pipeline configuration. Takes effect when the pipeline is
    /// built, right after setup returns.
    pub fn set_pipeline_config(&mut self, config: PipelineConfig) {
        *self.pipeline = config;
    }

    pub fn pipeline_config(&mut self) -> &mut PipelineConfig {
        self.pipeline
    }

    /// A handle to the control bus, for publishing from the frame closure.
    pub fn bus(&self) -> ControlBus {
        self.bus.clone()
    }
}

/// Per-frame context handed to the frame closure.
///
/// `params` is the parameter snapshot the pipeline renders this frame with.
/// Changes persist into the next frame.
pub struct Frame<'a> {
    pub gpu: &'a GpuContext,
    pub scene: &'a mut Scene,
    pub camera: &'a mut Camera,
    pub input: &'a Input,
    pub params: &'a mut PassConfig,
    /// Total elapsed time in seconds.
    pub time: f32,
    /// Delta time since last frame in seconds.
    pub dt: f32,
    state: Option<PipelineState>,
    overlay_visible: bool,
    bus: &'a ControlBus,
}

impl Frame<'_> {
    /// Frames per second, derived from `dt`.
    pub fn fps(&self) -> f32 {
        if self.dt > 0.0 { 1.0 / self.dt } else { 0.0 }
    }

    /// Pipeline state of the previous frame.
    pub fn pipeline_state(&self) -> Option<PipelineState> {
        self.state
    }

    pub fn overlay_visible(&self) -> bool {
        self.overlay_visible
    }

    pub fn publish(&self, event: ControlEvent) {
        self.bus.publish(event);
    }
}

/// Run a depthfx application with the default window configuration.
///
/// # Example
/// ```ignore
/// depthfx::run(|ctx| {
///     let torus = ctx.mesh_torus(1.0, 0.35, 48, 24);
///     ctx.add_object(SceneObject::new(torus));
///
///     move |frame| {
///         frame.params.blend = 0.5 + 0.5 * frame.time.sin();
///     }
/// })?;
/// ```
pub fn run<S, F>(setup: S) -> Result<()>
where
    S: FnOnce(&mut SetupContext) -> F,
    F: FnMut(&mut Frame),
{
    run_with_config(AppConfig::default(), setup)
}

/// Run a depthfx application with a custom window configuration.
///
/// Returns once the window closes, or with the first error that stopped
/// the event loop.
pub fn run_with_config<S, F>(config: AppConfig, setup: S) -> Result<()>
where
    S: FnOnce(&mut SetupContext) -> F,
    F: FnMut(&mut Frame),
{
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = DepthfxApp {
        config,
        setup: Some(setup),
        running: None,
        bus: ControlBus::new(),
        error: None,
    };
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

struct Running<F> {
    window: Arc<Window>,
    gpu: GpuContext,
    scene: Scene,
    camera: Camera,
    input: Input,
    params: PassConfig,
    pipeline: PostPipeline,
    frame_fn: F,
    start_time: Instant,
    last_frame: Instant,
}

struct DepthfxApp<S, F> {
    config: AppConfig,
    setup: Option<S>,
    running: Option<Running<F>>,
    bus: ControlBus,
    error: Option<Error>,
}

impl<S, F> DepthfxApp<S, F>
where
    S: FnOnce(&mut SetupContext) -> F,
    F: FnMut(&mut Frame),
{
    fn start(&self, event_loop: &ActiveEventLoop, setup: S) -> Result<Running<F>> {
        let window_attrs = WindowAttributes::default()
            .with_title(&self.config.title)
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.config.width,
                self.config.height,
            ));
        let window = Arc::new(event_loop.create_window(window_attrs)?);
        let gpu = GpuContext::new(window.clone())?;

        let mut scene = Scene::new();
        let mut camera = Camera::new();
        let mut pipeline_config = PipelineConfig::default();
        let frame_fn = setup(&mut SetupContext {
            gpu: &gpu,
            scene: &mut scene,
            camera: &mut camera,
            pipeline: &mut pipeline_config,
            bus: &self.bus,
        });

        let params = pipeline_config.initial;
        let pipeline = PostPipeline::new(&gpu, pipeline_config, &self.bus)?;
        log::info!(
            "started with {} objects at {}x{}",
            scene.objects().len(),
            gpu.width(),
            gpu.height()
        );

        Ok(Running {
            window,
            gpu,
            scene,
            camera,
            input: Input::new(),
            params,
            pipeline,
            frame_fn,
            start_time: Instant::now(),
            last_frame: Instant::now(),
        })
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: Error) {
        log::error!("{error}");
        self.error = Some(error);
        event_loop.exit();
    }
}

impl<S, F> ApplicationHandler for DepthfxApp<S, F>
where
    S: FnOnce(&mut SetupContext) -> F,
    F: FnMut(&mut Frame),
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let Some(setup) = self.setup.take() else {
            return;
        };
        match self.start(event_loop, setup) {
            Ok(running) => {
                running.window.request_redraw();
                self.running = Some(running);
            }
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(running) = self.running.as_mut() else {
            return;
        };

        running.input.handle_event(&event);

        match event {
            WindowEvent::CloseRequested => {
                running.pipeline.teardown();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                running.gpu.resize(size.width, size.height);
                log::debug!("resized to {}x{}", size.width, size.height);
                self.bus.publish(ControlEvent::Resized(running.gpu.viewport()));
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed && !event.repeat {
                    if let Key::Character(text) = &event.logical_key {
                        if is_toggle_key(text) {
                            self.bus.publish(ControlEvent::ToggleDebug);
                        }
                    }
                }
            }
            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                let time = running.start_time.elapsed().as_secs_f32();
                let dt = now.duration_since(running.last_frame).as_secs_f32();
                running.last_frame = now;

                let mut frame = Frame {
                    gpu: &running.gpu,
                    scene: &mut running.scene,
                    camera: &mut running.camera,
                    input: &running.input,
                    params: &mut running.params,
                    time,
                    dt,
                    state: running.pipeline.state(),
                    overlay_visible: running.pipeline.overlay().is_visible(),
                    bus: &self.bus,
                };
                (running.frame_fn)(&mut frame);

                let result = running.pipeline.tick(
                    &running.gpu,
                    &running.scene,
                    &running.camera,
                    &running.params,
                    dt,
                );
                match result {
                    Ok(FrameStatus::Rendered) => {}
                    Ok(status) => log::trace!("frame not rendered: {status:?}"),
                    Err(e) => {
                        self.fail(event_loop, e);
                        return;
                    }
                }

                running.input.begin_frame();
                running.window.request_redraw();
            }
            _ => {}
        }
    }
}
