//! Gain stage - the amplification step of the chain

use super::Effect;

/// Highest gain factor accepted
pub const MAX_GAIN: f32 = 8.0;

/// Scalar gain with click-free parameter changes
pub struct GainStage {
    channels: usize,
    /// Target gain
    gain: f32,
    /// Smoothed gain (interpolates toward gain to prevent clicks)
    smoothed_gain: f32,
}

impl GainStage {
    /// Smoothing coefficient for gain changes (~5ms at 48kHz)
    const GAIN_SMOOTH_COEFF: f32 = 0.995;
    const SNAP_EPSILON: f32 = 1e-4;

    /// Create a gain stage already settled at `gain`
    pub fn new(gain: f32, channels: usize) -> Self {
        let gain = Self::sanitize(gain);
        Self {
            channels: channels.max(1),
            gain,
            smoothed_gain: gain,
        }
    }

    fn sanitize(gain: f32) -> f32 {
        if gain.is_finite() {
            gain.clamp(0.0, MAX_GAIN)
        } else {
            0.0
        }
    }

    /// Set gain factor (0.0 - MAX_GAIN)
    pub fn set_gain(&mut self, gain: f32) {
        self.gain = Self::sanitize(gain);
    }

    /// Get target gain
    pub fn gain(&self) -> f32 {
        self.gain
    }

    /// Gain currently applied (lags the target while smoothing)
    pub fn current_gain(&self) -> f32 {
        self.smoothed_gain
    }
}

impl Effect for GainStage {
    fn process(&mut self, samples: &mut [f32]) {
        let channels = self.channels;
        for frame in samples.chunks_mut(channels) {
            if self.smoothed_gain != self.gain {
                self.smoothed_gain = Self::GAIN_SMOOTH_COEFF * self.smoothed_gain
                    + (1.0 - Self::GAIN_SMOOTH_COEFF) * self.gain;
                // f32 stalls short of the target; snap once close enough
                let snap = Self::SNAP_EPSILON * self.gain.max(1.0);
                if (self.smoothed_gain - self.gain).abs() < snap {
                    self.smoothed_gain = self.gain;
                }
            }

            for sample in frame.iter_mut() {
                *sample *= self.smoothed_gain;
            }
        }
    }

    fn reset(&mut self) {
        self.smoothed_gain = self.gain;
    }

    fn name(&self) -> &'static str {
        "Gain"
    }
}
