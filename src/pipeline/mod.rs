//! The fixed post-processing pipeline.
//!
//! ```text
//! Scene ──► scene target (color + depth)
//!               │ depth
//!               ▼
//!           Depth ──► effect target
//!               │ color        │ color
//!               ▼              ▼
//!           Composite ──► screen / override view ──► Overlay (screen only)
//! ```

mod composite_pass;
mod depth_pass;
mod orchestrator;
mod overlay;
mod program;
mod render_target;
mod scene_pass;
mod schedule;

pub use composite_pass::{CompositePass, CompositeUniforms};
pub use depth_pass::{DepthPass, DepthUniforms};
pub use orchestrator::{FrameStatus, PostPipeline, frame_snapshot};
pub use overlay::{DebugOverlay, DebugQuad, OverlayRenderer, Placement, QuadKind};
pub use program::{ProgramPipeline, SlotBindings, linear_sampler, uniform_buffer};
pub use render_target::{FrameTargets, RenderContext, RenderTarget, Viewport};
pub use scene_pass::{CameraUniforms, ModelUniforms, ScenePass, aligned_stride};
pub use schedule::{
    CompositeSource, FrameInputs, FramePlan, FrameScheduler, FrameStep, OutputTarget,
    PipelineState,
};
