//! Per-frame planning, kept free of GPU state so the ordering rules are
//! testable on their own.
//!
//! The orchestrator describes the frame with [`FrameInputs`] and executes the
//! returned [`FramePlan`] step by step.

use crate::config::{EffectMode, PassConfig};
use crate::pipeline::render_target::Viewport;

/// Whether the depth stage contributes to this frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineState {
    /// Composite passes the scene color straight through.
    EffectDisabled,
    EffectEnabled,
}

impl PipelineState {
    pub fn resolve(params: &PassConfig, mode: EffectMode) -> Self {
        if params.effect_enabled && mode.has_depth_stage() {
            PipelineState::EffectEnabled
        } else {
            PipelineState::EffectDisabled
        }
    }
}

/// Texture fed to the composite pass as its effect input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompositeSource {
    EffectTarget,
    SceneColor,
}

/// Where the composite pass writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputTarget {
    /// The acquired swapchain frame, presented afterwards.
    Screen,
    /// A caller-provided view; nothing is presented.
    Override,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameStep {
    /// Drop the current targets and create new ones of this size.
    AllocateTargets(Viewport),
    Scene,
    Depth,
    Composite {
        source: CompositeSource,
        output: OutputTarget,
    },
    Overlay,
}

/// What the scheduler needs to know about one frame.
#[derive(Clone, Copy, Debug)]
pub struct FrameInputs {
    pub viewport: Viewport,
    /// Size of the live targets, if any.
    pub allocated: Option<Viewport>,
    pub state: PipelineState,
    pub overlay_visible: bool,
    pub output: OutputTarget,
}

/// Ordered steps for one frame. No steps means the frame is deferred.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FramePlan {
    pub steps: Vec<FrameStep>,
    pub state: PipelineState,
}

impl FramePlan {
    pub fn is_deferred(&self) -> bool {
        self.steps.is_empty()
    }

    /// The size targets are reallocated to, if this plan reallocates.
    pub fn allocation(&self) -> Option<Viewport> {
        self.steps.iter().find_map(|step| match step {
            FrameStep::AllocateTargets(viewport) => Some(*viewport),
            _ => None,
        })
    }
}

/// Turns frame inputs into a [`FramePlan`].
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameScheduler;

impl FrameScheduler {
    pub fn new() -> Self {
        Self
    }

    pub fn plan(&self, inputs: &FrameInputs) -> FramePlan {
        let mut steps = Vec::with_capacity(5);

        if inputs.viewport.is_empty() {
            return FramePlan {
                steps,
                state: inputs.state,
            };
        }

        if inputs.allocated != Some(inputs.viewport) {
            steps.push(FrameStep::AllocateTargets(inputs.viewport));
        }

        steps.push(FrameStep::Scene);

        let source = match inputs.state {
            PipelineState::EffectEnabled => {
                steps.push(FrameStep::Depth);
                CompositeSource::EffectTarget
            }
            PipelineState::EffectDisabled => CompositeSource::SceneColor,
        };
        steps.push(FrameStep::Composite {
            source,
            output: inputs.output,
        });

        if inputs.overlay_visible && inputs.output == OutputTarget::Screen {
            steps.push(FrameStep::Overlay);
        }

        FramePlan {
            steps,
            state: inputs.state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(viewport: Viewport) -> FrameInputs {
        FrameInputs {
            viewport,
            allocated: Some(viewport),
            state: PipelineState::EffectEnabled,
            overlay_visible: false,
            output: OutputTarget::Screen,
        }
    }

    #[test]
    fn empty_viewport_defers_the_frame() {
        let mut frame = inputs(Viewport::new(0, 600));
        frame.allocated = None;
        frame.overlay_visible = true;
        let plan = FrameScheduler::new().plan(&frame);
        assert!(plan.is_deferred());
        assert_eq!(plan.allocation(), None);
    }

    #[test]
    fn first_frame_allocates_before_the_scene() {
        let viewport = Viewport::new(800, 600);
        let mut frame = inputs(viewport);
        frame.allocated = None;
        let plan = FrameScheduler::new().plan(&frame);
        assert_eq!(plan.steps[0], FrameStep::AllocateTargets(viewport));
        assert_eq!(plan.steps[1], FrameStep::Scene);
        assert_eq!(plan.allocation(), Some(viewport));
    }

    #[test]
    fn unchanged_viewport_does_not_reallocate() {
        let plan = FrameScheduler::new().plan(&inputs(Viewport::new(800, 600)));
        assert_eq!(plan.allocation(), None);
        assert_eq!(
            plan.steps,
            vec![
                FrameStep::Scene,
                FrameStep::Depth,
                FrameStep::Composite {
                    source: CompositeSource::EffectTarget,
                    output: OutputTarget::Screen,
                },
            ]
        );
    }

    #[test]
    fn resize_reallocates_to_the_new_size() {
        let mut frame = inputs(Viewport::new(1024, 768));
        frame.allocated = Some(Viewport::new(800, 600));
        let plan = FrameScheduler::new().plan(&frame);
        assert_eq!(plan.allocation(), Some(Viewport::new(1024, 768)));
    }

    #[test]
    fn disabled_effect_composites_the_scene_color() {
        let mut frame = inputs(Viewport::new(800, 600));
        frame.state = PipelineState::EffectDisabled;
        let plan = FrameScheduler::new().plan(&frame);
        assert!(!plan.steps.contains(&FrameStep::Depth));
        assert!(plan.steps.contains(&FrameStep::Composite {
            source: CompositeSource::SceneColor,
            output: OutputTarget::Screen,
        }));
    }

    #[test]
    fn overlay_is_drawn_last_and_only_on_screen() {
        let mut frame = inputs(Viewport::new(800, 600));
        frame.overlay_visible = true;
        let plan = FrameScheduler::new().plan(&frame);
        assert_eq!(plan.steps.last(), Some(&FrameStep::Overlay));

        frame.output = OutputTarget::Override;
        let plan = FrameScheduler::new().plan(&frame);
        assert!(!plan.steps.contains(&FrameStep::Overlay));
        assert_eq!(
            plan.steps.last(),
            Some(&FrameStep::Composite {
                source: CompositeSource::EffectTarget,
                output: OutputTarget::Override,
            })
        );
    }

    #[test]
    fn state_follows_flag_and_mode() {
        let on = PassConfig::new();
        let off = PassConfig::new().effect_enabled(false);
        assert_eq!(
            PipelineState::resolve(&on, EffectMode::DepthBand),
            PipelineState::EffectEnabled
        );
        assert_eq!(
            PipelineState::resolve(&on, EffectMode::PassThrough),
            PipelineState::EffectDisabled
        );
        assert_eq!(
            PipelineState::resolve(&off, EffectMode::AnimatedWave),
            PipelineState::EffectDisabled
        );
    }
}
