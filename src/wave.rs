//! Ping-pong phase driver for [`EffectMode::AnimatedWave`](crate::EffectMode::AnimatedWave).

use crate::config::WaveConfig;

/// A phase in `[0, 1]` that sweeps back and forth at a fixed speed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WaveAnimator {
    phase: f32,
    rising: bool,
    period: f32,
}

impl WaveAnimator {
    /// `period` is the time for one sweep, in seconds. A non-positive or
    /// non-finite period freezes the phase.
    pub fn new(period: f32) -> Self {
        Self {
            phase: 0.0,
            rising: true,
            period,
        }
    }

    pub fn from_config(config: &WaveConfig) -> Self {
        let mut wave = Self::new(config.period_secs);
        wave.phase = if config.start_phase.is_finite() {
            config.start_phase.clamp(0.0, 1.0)
        } else {
            0.0
        };
        wave
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    pub fn is_rising(&self) -> bool {
        self.rising
    }

    pub fn is_frozen(&self) -> bool {
        !(self.period.is_finite() && self.period > 0.0)
    }

    /// Moves the phase by `dt / period`, reflecting at either end.
    pub fn advance(&mut self, dt: f32) -> f32 {
        if self.is_frozen() || !dt.is_finite() || dt <= 0.0 {
            return self.phase;
        }
        // whole round trips are a no-op
        let mut step = (dt / self.period) % 2.0;
        while step > 0.0 {
            let room = if self.rising {
                1.0 - self.phase
            } else {
                self.phase
            };
            if step < room {
                self.phase += if self.rising { step } else { -step };
                break;
            }
            step -= room;
            self.phase = if self.rising { 1.0 } else { 0.0 };
            self.rising = !self.rising;
        }
        self.phase = self.phase.clamp(0.0, 1.0);
        self.phase
    }
}

impl Default for WaveAnimator {
    fn default() -> Self {
        Self::from_config(&WaveConfig::default())
    }
}
