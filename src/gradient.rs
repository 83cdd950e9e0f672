//! 1-D color gradients for the depth lookup modes.
//!
//! A [`Gradient`] is a sorted list of color stops. It is baked once into an
//! RGBA8 row and uploaded as a `width x 1` texture that the depth shader
//! samples with the normalized depth as `u`.

use std::path::Path;

use crate::color::Color;
use crate::config::{GradientConfig, GradientStop};
use crate::error::{Error, Result};

/// Sorted color stops over `[0, 1]`.
#[derive(Clone, Debug, PartialEq)]
pub struct Gradient {
    stops: Vec<GradientStop>,
}

impl Gradient {
    /// Builds a gradient from at least two stops with finite positions.
    ///
    /// Stops are sorted by position; positions outside `[0, 1]` are clamped.
    pub fn new(stops: impl IntoIterator<Item = GradientStop>) -> Result<Self> {
        let mut stops: Vec<GradientStop> = stops.into_iter().collect();
        if stops.len() < 2 {
            return Err(Error::InvalidGradient(format!(
                "need at least two stops, got {}",
                stops.len()
            )));
        }
        if let Some(bad) = stops.iter().find(|s| !s.position.is_finite()) {
            return Err(Error::InvalidGradient(format!(
                "stop position {} is not finite",
                bad.position
            )));
        }
        for stop in &mut stops {
            stop.position = stop.position.clamp(0.0, 1.0);
            stop.color = stop.color.clamped();
        }
        stops.sort_by(|a, b| a.position.total_cmp(&b.position));
        Ok(Self { stops })
    }

    /// Two-stop gradient from `start` at 0 to `end` at 1.
    pub fn linear(start: Color, end: Color) -> Self {
        Self {
            stops: vec![
                GradientStop {
                    position: 0.0,
                    color: start,
                },
                GradientStop {
                    position: 1.0,
                    color: end,
                },
            ],
        }
    }

    /// Evenly spaced stops sampled from the first row of an image.
    pub fn from_image(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let img = image::open(path)?.to_rgba8();
        let (width, _) = img.dimensions();
        if width < 2 {
            return Err(Error::InvalidGradient(format!(
                "{} is narrower than two pixels",
                path.display()
            )));
        }
        let last = (width - 1) as f32;
        let stops = (0..width).map(|x| GradientStop {
            position: x as f32 / last,
            color: Color::from_rgba8(img.get_pixel(x, 0).0),
        });
        log::debug!("gradient loaded from {} ({width} texels)", path.display());
        Self::new(stops)
    }

    /// Builds the gradient described by a config section.
    pub fn from_config(config: &GradientConfig) -> Result<Self> {
        match &config.image {
            Some(path) => Self::from_image(path),
            None => Self::new(config.stops.iter().copied()),
        }
    }

    pub fn stops(&self) -> &[GradientStop] {
        &self.stops
    }

    /// Color at `t`, linearly interpolated between neighbouring stops.
    ///
    /// Values before the first stop or after the last take that stop's color.
    pub fn sample(&self, t: f32) -> Color {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let first = self.stops[0];
        if t <= first.position {
            return first.color;
        }
        for pair in self.stops.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if t <= b.position {
                let span = b.position - a.position;
                if span <= f32::EPSILON {
                    return b.color;
                }
                return a.color.lerp(b.color, (t - a.position) / span);
            }
        }
        self.stops[self.stops.len() - 1].color
    }

    /// Bakes `width` texels of tightly packed RGBA8, texel centers at
    /// `(i + 0.5) / width`.
    pub fn bake(&self, width: u32) -> Vec<u8> {
        let width = width.max(1);
        (0..width)
            .flat_map(|i| {
                let t = (i as f32 + 0.5) / width as f32;
                self.sample(t).to_rgba8()
            })
            .collect()
    }
}

impl Default for Gradient {
    fn default() -> Self {
        Self::linear(Color::WHITE, Color::BLACK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stop(position: f32, color: Color) -> GradientStop {
        GradientStop { position, color }
    }

    #[test]
    fn rejects_fewer_than_two_stops() {
        assert!(Gradient::new([]).is_err());
        assert!(Gradient::new([stop(0.5, Color::WHITE)]).is_err());
    }

    #[test]
    fn rejects_non_finite_positions() {
        let err = Gradient::new([stop(0.0, Color::WHITE), stop(f32::NAN, Color::BLACK)]);
        assert!(matches!(err, Err(Error::InvalidGradient(_))));
    }

    #[test]
    fn sorts_stops_by_position() {
        let g = Gradient::new([stop(1.0, Color::BLACK), stop(0.0, Color::WHITE)]).unwrap();
        assert_eq!(g.stops()[0].position, 0.0);
        assert_eq!(g.sample(0.0), Color::WHITE);
        assert_eq!(g.sample(1.0), Color::BLACK);
    }

    #[test]
    fn interpolates_between_stops() {
        let g = Gradient::linear(Color::BLACK, Color::WHITE);
        let mid = g.sample(0.5);
        assert!((mid.r - 0.5).abs() < 1e-6);
        assert!((mid.g - 0.5).abs() < 1e-6);
    }

    #[test]
    fn holds_end_colors_outside_the_stop_range() {
        let red = Color::rgb(1.0, 0.0, 0.0);
        let blue = Color::rgb(0.0, 0.0, 1.0);
        let g = Gradient::new([stop(0.25, red), stop(0.75, blue)]).unwrap();
        assert_eq!(g.sample(0.1), red);
        assert_eq!(g.sample(0.9), blue);
        assert_eq!(g.sample(-4.0), red);
        assert_eq!(g.sample(f32::NAN), red);
    }

    #[test]
    fn bake_produces_one_rgba_texel_per_column() {
        let g = Gradient::linear(Color::BLACK, Color::WHITE);
        let row = g.bake(256);
        assert_eq!(row.len(), 256 * 4);
        assert!(row[0] <= 1 && row[3] == 255);
        assert!(row[row.len() - 4] >= 254 && row[row.len() - 1] == 255);
        // monotonic for a black-to-white ramp
        let reds: Vec<u8> = row.chunks(4).map(|px| px[0]).collect();
        assert!(reds.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn default_config_builds() {
        let g = Gradient::from_config(&GradientConfig::default()).unwrap();
        assert_eq!(g.stops().len(), 4);
    }
}
