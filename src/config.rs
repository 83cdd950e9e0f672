//! Pipeline configuration and the per-frame parameter snapshot.
//!
//! [`PipelineConfig`] is fixed at construction: it selects the effect mode,
//! the wave period, overlay geometry and the gradient. [`PassConfig`] is the
//! live-tunable part and is sampled once at the start of every frame.
//!
//! Both deserialize from JSON with every field optional:
//!
//! ```json
//! {
//!   "mode": "animated_wave",
//!   "wave": { "period_secs": 6.0 },
//!   "initial": { "blend": 1.0, "tint": "#ffe0c0" }
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::error::Result;

/// Upper bound of the blur band distances, in world units.
pub const BLUR_MAX: f32 = 50.0;

/// How the depth pass turns linear depth into color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectMode {
    /// No depth stage; composite blends scene color with itself.
    PassThrough,
    /// Blur band between `blur_near`/`blur_far` mixing two color stops.
    #[default]
    DepthBand,
    /// 1-D gradient lookup indexed by normalized depth.
    GradientLookup,
    /// Gradient lookup with an animated threshold sweeping back and forth.
    AnimatedWave,
}

impl EffectMode {
    /// Value of the `mode` uniform read by the depth shader.
    pub fn shader_code(self) -> u32 {
        match self {
            EffectMode::PassThrough | EffectMode::DepthBand => 0,
            EffectMode::GradientLookup | EffectMode::AnimatedWave => 1,
        }
    }

    /// Whether this mode ever runs the depth stage.
    pub fn has_depth_stage(self) -> bool {
        self != EffectMode::PassThrough
    }
}

/// Snapshot of the live-tunable parameters for one frame.
///
/// Produced by the parameter collaborator (the frame closure, a UI panel, a
/// config file) and consumed read-only by every pass. Call
/// [`clamped`](Self::clamped) before use; nothing else is validated.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PassConfig {
    /// Linear distance where the blur band starts, `[0, 50]`.
    pub blur_near: f32,
    /// Linear distance where the blur band ends, `[0, 50]`.
    pub blur_far: f32,
    /// Lower edge of the color ramp, `[0, 1]`.
    pub depth_min: f32,
    /// Upper edge of the color ramp, `[0, 1]`.
    pub depth_max: f32,
    /// Gradient threshold for [`EffectMode::GradientLookup`], `[0, 1]`.
    pub depth_threshold: f32,
    /// Brightness applied past the threshold, `[0, 1]`.
    pub depth_value: f32,
    pub tint: Color,
    pub color_near: Color,
    pub color_far: Color,
    /// Composite factor: 0 shows the scene, 1 shows the effect.
    pub blend: f32,
    /// Runs the depth stage when true (and the mode has one).
    pub effect_enabled: bool,
    /// Current wave phase; stamped by the pipeline each frame.
    #[serde(skip)]
    pub wave_phase: f32,
}

impl Default for PassConfig {
    fn default() -> Self {
        Self {
            blur_near: 0.001,
            blur_far: 0.01,
            depth_min: 0.2,
            depth_max: 0.8,
            depth_threshold: 0.5,
            depth_value: 0.2,
            tint: Color::WHITE,
            color_near: Color::WHITE,
            color_far: Color::BLACK,
            blend: 0.0,
            effect_enabled: true,
            wave_phase: 0.0,
        }
    }
}

fn clamp_range(v: f32, lo: f32, hi: f32) -> f32 {
    if v.is_nan() { lo } else { v.clamp(lo, hi) }
}

impl PassConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy with every scalar clamped to its documented range (NaN → lower bound).
    pub fn clamped(&self) -> Self {
        Self {
            blur_near: clamp_range(self.blur_near, 0.0, BLUR_MAX),
            blur_far: clamp_range(self.blur_far, 0.0, BLUR_MAX),
            depth_min: clamp_range(self.depth_min, 0.0, 1.0),
            depth_max: clamp_range(self.depth_max, 0.0, 1.0),
            depth_threshold: clamp_range(self.depth_threshold, 0.0, 1.0),
            depth_value: clamp_range(self.depth_value, 0.0, 1.0),
            tint: self.tint.clamped(),
            color_near: self.color_near.clamped(),
            color_far: self.color_far.clamped(),
            blend: clamp_range(self.blend, 0.0, 1.0),
            effect_enabled: self.effect_enabled,
            wave_phase: clamp_range(self.wave_phase, 0.0, 1.0),
        }
    }

    pub fn blend(mut self, blend: f32) -> Self {
        self.blend = blend;
        self
    }

    pub fn blur(mut self, near: f32, far: f32) -> Self {
        self.blur_near = near;
        self.blur_far = far;
        self
    }

    pub fn depth_range(mut self, min: f32, max: f32) -> Self {
        self.depth_min = min;
        self.depth_max = max;
        self
    }

    pub fn colors(mut self, near: Color, far: Color) -> Self {
        self.color_near = near;
        self.color_far = far;
        self
    }

    pub fn tint(mut self, tint: Color) -> Self {
        self.tint = tint;
        self
    }

    pub fn effect_enabled(mut self, enabled: bool) -> Self {
        self.effect_enabled = enabled;
        self
    }
}

/// Something that can hand the pipeline a parameter snapshot.
pub trait ParameterSource {
    fn snapshot(&self) -> PassConfig;
}

impl ParameterSource for PassConfig {
    fn snapshot(&self) -> PassConfig {
        *self
    }
}

impl<F> ParameterSource for F
where
    F: Fn() -> PassConfig,
{
    fn snapshot(&self) -> PassConfig {
        self()
    }
}

/// Wave animation settings for [`EffectMode::AnimatedWave`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveConfig {
    /// Seconds for one sweep from 0 to 1 (or back).
    pub period_secs: f32,
    /// Phase at startup, `[0, 1]`.
    pub start_phase: f32,
}

impl Default for WaveConfig {
    fn default() -> Self {
        Self {
            period_secs: 4.0,
            start_phase: 0.0,
        }
    }
}

/// Debug overlay geometry.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Thumbnail edge length in pixels.
    pub size_px: f32,
    /// Gap to the window edge and between thumbnails, in pixels.
    pub border_px: f32,
    /// Adds the linearized-depth thumbnail below the scene thumbnail.
    pub show_depth: bool,
    pub visible_on_start: bool,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            size_px: 180.0,
            border_px: 10.0,
            show_depth: true,
            visible_on_start: true,
        }
    }
}

/// A color stop of the lookup gradient.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    pub position: f32,
    pub color: Color,
}

/// Source of the 1-D lookup gradient.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradientConfig {
    pub stops: Vec<GradientStop>,
    /// Image whose first row replaces `stops` when set.
    pub image: Option<PathBuf>,
    /// Texels in the baked gradient row.
    pub resolution: u32,
}

impl Default for GradientConfig {
    fn default() -> Self {
        let stop = |position, r, g, b| GradientStop {
            position,
            color: Color::rgb(r, g, b),
        };
        Self {
            stops: vec![
                stop(0.0, 0.99, 0.91, 0.14),
                stop(0.35, 0.21, 0.72, 0.47),
                stop(0.7, 0.19, 0.41, 0.56),
                stop(1.0, 0.27, 0.0, 0.33),
            ],
            image: None,
            resolution: 256,
        }
    }
}

/// Construction-time configuration of the post-processing pipeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub mode: EffectMode,
    pub wave: WaveConfig,
    pub overlay: OverlayConfig,
    pub gradient: GradientConfig,
    /// Clear color of the scene pass.
    pub clear_color: Color,
    /// Parameters handed to the first frame.
    pub initial: PassConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            mode: EffectMode::default(),
            wave: WaveConfig::default(),
            overlay: OverlayConfig::default(),
            gradient: GradientConfig::default(),
            clear_color: Color::rgb(0.02, 0.02, 0.03),
            initial: PassConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a JSON document; absent fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&text)?;
        log::info!("loaded pipeline config from {}", path.display());
        Ok(config)
    }

    pub fn mode(mut self, mode: EffectMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn wave_period(mut self, secs: f32) -> Self {
        self.wave.period_secs = secs;
        self
    }

    pub fn overlay(mut self, overlay: OverlayConfig) -> Self {
        self.overlay = overlay;
        self
    }

    pub fn gradient(mut self, gradient: GradientConfig) -> Self {
        self.gradient = gradient;
        self
    }

    pub fn clear_color(mut self, color: Color) -> Self {
        self.clear_color = color;
        self
    }

    pub fn initial(mut self, params: PassConfig) -> Self {
        self.initial = params;
        self
    }
}

/// Configuration for the app window.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "depthfx".to_string(),
            width: 800,
            height: 600,
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamped_bounds_every_scalar() {
        let wild = PassConfig {
            blur_near: -3.0,
            blur_far: 120.0,
            depth_min: -0.5,
            depth_max: 1.5,
            depth_threshold: f32::NAN,
            depth_value: 7.0,
            blend: 2.0,
            wave_phase: -1.0,
            ..PassConfig::default()
        };
        let c = wild.clamped();
        assert_eq!(c.blur_near, 0.0);
        assert_eq!(c.blur_far, BLUR_MAX);
        assert_eq!(c.depth_min, 0.0);
        assert_eq!(c.depth_max, 1.0);
        assert_eq!(c.depth_threshold, 0.0);
        assert_eq!(c.depth_value, 1.0);
        assert_eq!(c.blend, 1.0);
        assert_eq!(c.wave_phase, 0.0);
    }

    #[test]
    fn clamped_keeps_in_range_values() {
        let p = PassConfig::default().blend(0.35).blur(1.0, 4.0);
        assert_eq!(p.clamped(), p);
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let cfg = PipelineConfig::from_json_str(
            r##"{ "mode": "gradient_lookup", "initial": { "blend": 1.0, "tint": "#ff0000" } }"##,
        )
        .unwrap();
        assert_eq!(cfg.mode, EffectMode::GradientLookup);
        assert_eq!(cfg.initial.blend, 1.0);
        assert_eq!(cfg.initial.tint, Color::rgb(1.0, 0.0, 0.0));
        assert_eq!(cfg.initial.blur_far, PassConfig::default().blur_far);
        assert_eq!(cfg.overlay, OverlayConfig::default());
        assert_eq!(cfg.wave, WaveConfig::default());
    }

    #[test]
    fn empty_json_is_default() {
        assert_eq!(PipelineConfig::from_json_str("{}").unwrap(), PipelineConfig::default());
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(PipelineConfig::from_json_str("{ mode: ").is_err());
        assert!(PipelineConfig::from_json_str(r#"{ "mode": "bloom" }"#).is_err());
    }

    #[test]
    fn wave_phase_is_not_serialized() {
        let p = PassConfig {
            wave_phase: 0.7,
            ..PassConfig::default()
        };
        let json = serde_json::to_string(&p).unwrap();
        assert!(!json.contains("wave_phase"));
        let back: PassConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.wave_phase, 0.0);
    }

    #[test]
    fn closures_are_parameter_sources() {
        let source = || PassConfig::default().blend(0.5);
        assert_eq!(source.snapshot().blend, 0.5);
        assert_eq!(PassConfig::default().snapshot(), PassConfig::default());
    }

    #[test]
    fn only_pass_through_skips_depth_stage() {
        assert!(!EffectMode::PassThrough.has_depth_stage());
        assert!(EffectMode::DepthBand.has_depth_stage());
        assert!(EffectMode::GradientLookup.has_depth_stage());
        assert!(EffectMode::AnimatedWave.has_depth_stage());
    }
}
