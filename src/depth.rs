//! Depth math shared by the depth pass shader and the CPU side.
//!
//! The camera stores OpenGL-convention depth remapped into wgpu's `[0, 1]`
//! range (see [`Camera::projection_matrix`](crate::Camera::projection_matrix)),
//! so a raw depth sample `raw` corresponds to `ndc = 2·raw − 1` and the
//! classic perspective inversion applies. The WGSL in
//! [`shaders`](crate::shaders) implements the same functions; the tests
//! here pin their behaviour.

use crate::color::Color;
use crate::config::{EffectMode, PassConfig};

/// Converts a raw `[0, 1]` depth-buffer value to linear view distance.
pub fn linearize_depth(raw: f32, near: f32, far: f32) -> f32 {
    let ndc = raw * 2.0 - 1.0;
    (2.0 * near * far) / (far + near - ndc * (far - near))
}

/// Inverse of [`linearize_depth`]: the raw depth stored for a fragment at
/// linear view distance `distance`.
pub fn encode_depth(distance: f32, near: f32, far: f32) -> f32 {
    let ndc = (far + near - (2.0 * near * far) / distance) / (far - near);
    ndc * 0.5 + 0.5
}

/// Linear distance mapped to `[0, 1]` across the camera's near/far range.
pub fn normalized_depth(linear: f32, near: f32, far: f32) -> f32 {
    if far <= near {
        return 0.0;
    }
    ((linear - near) / (far - near)).clamp(0.0, 1.0)
}

/// Clamped linear remap of `x` from `[lo, hi]` onto `[0, 1]`.
///
/// A zero-width band degrades to a step at `lo`: 1 when `x >= lo`, else 0.
/// The result is never NaN or infinite for finite inputs.
pub fn band(x: f32, lo: f32, hi: f32) -> f32 {
    let width = hi - lo;
    if width.abs() <= f32::EPSILON {
        return if x >= lo { 1.0 } else { 0.0 };
    }
    ((x - lo) / width).clamp(0.0, 1.0)
}

/// Per-pixel composite: `scene·(1 − blend) + effect·blend` with alpha 1.
///
/// Exact at both ends: `blend == 0` returns `scene`, `blend == 1` returns
/// `effect`.
pub fn composite(scene: Color, effect: Color, blend: f32) -> Color {
    let mixed = scene.lerp(effect, blend);
    Color::rgba(mixed.r, mixed.g, mixed.b, 1.0)
}

/// CPU reference of the depth pass for one pixel.
///
/// `gradient` is only consulted by the lookup modes.
pub fn shade_depth(
    raw: f32,
    near: f32,
    far: f32,
    mode: EffectMode,
    params: &PassConfig,
    gradient: impl Fn(f32) -> Color,
) -> Color {
    let linear = linearize_depth(raw, near, far);
    let tint = params.tint;
    let shaded = match mode {
        EffectMode::PassThrough | EffectMode::DepthBand => {
            let f = band(linear, params.blur_near, params.blur_far);
            let t = band(f, params.depth_min, params.depth_max);
            params.color_near.lerp(params.color_far, t)
        }
        EffectMode::GradientLookup | EffectMode::AnimatedWave => {
            let n = normalized_depth(linear, near, far);
            let t = band(n, params.depth_min, params.depth_max);
            let threshold = match mode {
                EffectMode::AnimatedWave => params.wave_phase,
                _ => params.depth_threshold,
            };
            let mask = if t <= threshold { 1.0 } else { params.depth_value };
            let c = gradient(t);
            Color::rgb(c.r * mask, c.g * mask, c.b * mask)
        }
    };
    Color::rgba(shaded.r * tint.r, shaded.g * tint.g, shaded.b * tint.b, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-3;

    #[test]
    fn linearize_recovers_distance() {
        let (near, far) = (0.1, 5.0);
        for d in [0.1, 0.25, 1.0, 2.5, 4.99, 5.0] {
            let raw = encode_depth(d, near, far);
            assert!(raw > -1e-5 && raw < 1.0 + 1e-5, "raw {raw} out of range for {d}");
            let back = linearize_depth(raw, near, far);
            assert!((back - d).abs() < EPS * d.max(1.0), "{d} -> {raw} -> {back}");
        }
    }

    #[test]
    fn depth_extremes_map_to_planes() {
        assert!((linearize_depth(0.0, 0.1, 200.0) - 0.1).abs() < 1e-5);
        assert!((linearize_depth(1.0, 0.1, 200.0) - 200.0).abs() < 0.1);
    }

    #[test]
    fn band_is_clamped() {
        assert_eq!(band(-1.0, 0.2, 0.8), 0.0);
        assert_eq!(band(2.0, 0.2, 0.8), 1.0);
        assert!((band(0.5, 0.2, 0.8) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn zero_width_band_is_a_finite_step() {
        for x in [0.0, 0.49, 0.5, 0.51, 1.0] {
            let f = band(x, 0.5, 0.5);
            assert!(f.is_finite());
            assert!(f == 0.0 || f == 1.0);
        }
        assert_eq!(band(0.49, 0.5, 0.5), 0.0);
        assert_eq!(band(0.5, 0.5, 0.5), 1.0);
    }

    #[test]
    fn composite_blend_zero_is_scene() {
        let scene = Color::rgb(0.13, 0.57, 0.91);
        let effect = Color::rgb(0.8, 0.2, 0.4);
        assert_eq!(composite(scene, effect, 0.0), scene);
    }

    #[test]
    fn composite_blend_one_is_effect() {
        let scene = Color::rgb(0.13, 0.57, 0.91);
        let effect = Color::rgb(0.8, 0.2, 0.4);
        assert_eq!(composite(scene, effect, 1.0), effect);
    }

    #[test]
    fn composite_forces_opaque_alpha() {
        let scene = Color::rgba(0.1, 0.2, 0.3, 0.0);
        let effect = Color::rgba(0.4, 0.5, 0.6, 0.25);
        assert_eq!(composite(scene, effect, 0.3).a, 1.0);
    }

    #[test]
    fn composite_interpolates_channelwise() {
        let scene = Color::rgb(0.1, 0.9, 0.5);
        let effect = Color::rgb(0.7, 0.3, 0.0);
        for blend in [0.1, 0.25, 0.5, 0.75, 0.9] {
            let out = composite(scene, effect, blend);
            let expect = |s: f32, e: f32| s * (1.0 - blend) + e * blend;
            assert!((out.r - expect(scene.r, effect.r)).abs() < 1e-6);
            assert!((out.g - expect(scene.g, effect.g)).abs() < 1e-6);
            assert!((out.b - expect(scene.b, effect.b)).abs() < 1e-6);
        }
    }

    #[test]
    fn degenerate_depth_range_yields_finite_color() {
        let params = PassConfig {
            depth_min: 0.4,
            depth_max: 0.4,
            blur_near: 1.0,
            blur_far: 1.0,
            ..PassConfig::default()
        };
        for raw in [0.0, 0.3, 0.9, 1.0] {
            for mode in [EffectMode::DepthBand, EffectMode::GradientLookup] {
                let c = shade_depth(raw, 0.1, 5.0, mode, &params, |t| Color::rgb(t, t, t));
                assert!(c.r.is_finite() && c.g.is_finite() && c.b.is_finite());
            }
        }
    }

    fn close(a: Color, b: Color, tolerance: f32) -> bool {
        (a.r - b.r).abs() < tolerance && (a.g - b.g).abs() < tolerance && (a.b - b.b).abs() < tolerance
    }

    #[test]
    fn pixels_either_side_of_a_band_edge_match_the_adjacent_color() {
        let (near, far) = (0.1, 5.0);
        let red = Color::rgb(1.0, 0.0, 0.0);
        let blue = Color::rgb(0.0, 0.0, 1.0);
        // f = band(d, 1, 3) crosses depth_min at d = 1.4 and depth_max at d = 2.6
        let params = PassConfig::default()
            .blur(1.0, 3.0)
            .depth_range(0.2, 0.8)
            .colors(red, blue);
        let shade = |d: f32| {
            let raw = encode_depth(d, near, far);
            shade_depth(raw, near, far, EffectMode::DepthBand, &params, |_| Color::WHITE)
        };

        for (edge, adjacent) in [(1.4, red), (2.6, blue)] {
            let inside = shade(edge - 1e-3);
            let outside = shade(edge + 1e-3);
            assert!(close(inside, adjacent, 2e-3), "{edge}: {inside:?}");
            assert!(close(outside, adjacent, 2e-3), "{edge}: {outside:?}");
            assert!(close(inside, outside, 2e-3));
        }

        let middle = shade(2.0);
        assert!(close(middle, Color::rgb(0.5, 0.0, 0.5), 1e-3), "{middle:?}");
    }

    #[test]
    fn sub_near_blur_band_paints_everything_far() {
        // 800x600 scenario: near 0.1, far 5, blur band [0.001, 0.01]
        let params = PassConfig {
            blur_near: 0.001,
            blur_far: 0.01,
            depth_min: 0.0,
            depth_max: 1.0,
            color_near: Color::rgb(1.0, 0.0, 0.0),
            color_far: Color::rgb(0.0, 0.0, 1.0),
            ..PassConfig::default()
        };
        for d in [0.1, 1.0, 4.9] {
            let raw = encode_depth(d, 0.1, 5.0);
            let c = shade_depth(raw, 0.1, 5.0, EffectMode::DepthBand, &params, |_| Color::WHITE);
            assert!(close(c, params.color_far, 1e-4), "{d}: {c:?}");
        }
    }

    #[test]
    fn wave_threshold_dims_pixels_beyond_the_front() {
        let params = PassConfig {
            wave_phase: 0.5,
            depth_value: 0.25,
            ..PassConfig::default()
        };
        let (near, far) = (1.0, 11.0);
        let white = |_: f32| Color::WHITE;
        let shade = |d: f32| {
            let raw = encode_depth(d, near, far);
            shade_depth(raw, near, far, EffectMode::AnimatedWave, &params, white)
        };
        let close = shade(2.0);
        let distant = shade(10.0);
        assert!((close.r - 1.0).abs() < 1e-4);
        assert!((distant.r - 0.25).abs() < 1e-4);
    }
}
