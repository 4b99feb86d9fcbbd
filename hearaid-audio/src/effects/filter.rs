//! Biquad high-pass filter

use super::Effect;
use std::f32::consts::PI;

/// Per-channel biquad history
#[derive(Debug, Default, Clone, Copy)]
struct BiquadState {
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

/// High-pass biquad applied to every channel of an interleaved stream
///
/// A cutoff of 0 Hz keeps the filter in the chain but leaves the signal
/// untouched. Moving the cutoff between zero and a tuned value crossfades
/// between dry and filtered signal so retuning never clicks.
pub struct HighPassFilter {
    sample_rate: f32,
    channels: usize,
    cutoff: f32,    // Hz, 0 = inert
    resonance: f32, // Q factor

    // Biquad coefficients
    a0: f32,
    a1: f32,
    a2: f32,
    b1: f32,
    b2: f32,

    state: Vec<BiquadState>,

    // Wet envelope for click-free enable/disable
    wet_target: f32,
    wet_current: f32,
}

impl HighPassFilter {
    /// Wet envelope smoothing coefficient (~10ms at 48kHz)
    const WET_SMOOTH_COEFF: f32 = 0.9995;
    /// The envelope stalls about 1e-4 short of 1.0 in f32
    const WET_SNAP: f32 = 1e-3;
    /// Lowest cutoff accepted for an active filter
    pub const MIN_CUTOFF: f32 = 20.0;
    /// Highest cutoff as a fraction of the sample rate
    const MAX_CUTOFF_RATIO: f32 = 0.45;
    /// Butterworth Q
    const DEFAULT_Q: f32 = 0.707;

    /// Create a filter for `channels` interleaved channels
    pub fn new(sample_rate: f32, channels: usize, cutoff: f32) -> Self {
        let mut filter = Self {
            sample_rate,
            channels: channels.max(1),
            cutoff: 0.0,
            resonance: Self::DEFAULT_Q,
            a0: 1.0,
            a1: 0.0,
            a2: 0.0,
            b1: 0.0,
            b2: 0.0,
            state: vec![BiquadState::default(); channels.max(1)],
            wet_target: 0.0,
            wet_current: 0.0,
        };
        filter.set_cutoff(cutoff);
        // Start settled: no fade-in when the chain is first wired
        filter.wet_current = filter.wet_target;
        filter
    }

    /// Set cutoff frequency (<= 0 disables, otherwise 20 Hz - 0.45 x sample rate)
    pub fn set_cutoff(&mut self, cutoff: f32) {
        if !cutoff.is_finite() || cutoff <= 0.0 {
            self.cutoff = 0.0;
            self.wet_target = 0.0;
            return;
        }
        let max = (self.sample_rate * Self::MAX_CUTOFF_RATIO).max(Self::MIN_CUTOFF);
        self.cutoff = cutoff.clamp(Self::MIN_CUTOFF, max);
        self.wet_target = 1.0;
        self.calculate_coefficients();
    }

    /// Get cutoff frequency
    pub fn cutoff(&self) -> f32 {
        self.cutoff
    }

    fn calculate_coefficients(&mut self) {
        let omega = 2.0 * PI * self.cutoff / self.sample_rate;
        let sin_omega = omega.sin();
        let cos_omega = omega.cos();
        let alpha = sin_omega / (2.0 * self.resonance);

        let b0 = (1.0 + cos_omega) / 2.0;
        let b1 = -(1.0 + cos_omega);
        let b2 = (1.0 + cos_omega) / 2.0;
        let a0 = 1.0 + alpha;
        let a1 = -2.0 * cos_omega;
        let a2 = 1.0 - alpha;

        self.a0 = b0 / a0;
        self.a1 = b1 / a0;
        self.a2 = b2 / a0;
        self.b1 = a1 / a0;
        self.b2 = a2 / a0;
    }

    #[inline]
    fn process_sample(&mut self, input: f32, channel: usize) -> f32 {
        let s = &mut self.state[channel];
        let output =
            self.a0 * input + self.a1 * s.x1 + self.a2 * s.x2 - self.b1 * s.y1 - self.b2 * s.y2;

        s.x2 = s.x1;
        s.x1 = input;
        s.y2 = s.y1;
        s.y1 = output;

        output
    }
}

impl Effect for HighPassFilter {
    fn process(&mut self, samples: &mut [f32]) {
        // Inert and settled: bit-exact passthrough
        if self.wet_target == 0.0 && self.wet_current < 0.0001 {
            self.wet_current = 0.0;
            return;
        }

        let channels = self.channels;
        for frame in samples.chunks_exact_mut(channels) {
            self.wet_current = Self::WET_SMOOTH_COEFF * self.wet_current
                + (1.0 - Self::WET_SMOOTH_COEFF) * self.wet_target;
            if (self.wet_current - self.wet_target).abs() < Self::WET_SNAP {
                self.wet_current = self.wet_target;
            }

            for (channel, sample) in frame.iter_mut().enumerate() {
                let wet = self.process_sample(*sample, channel);
                *sample = *sample * (1.0 - self.wet_current) + wet * self.wet_current;
            }
        }
    }

    fn reset(&mut self) {
        self.state.fill(BiquadState::default());
    }

    fn name(&self) -> &'static str {
        "HP Filter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_cutoff_is_passthrough() {
        let mut filter = HighPassFilter::new(48000.0, 2, 0.0);

        let input = vec![0.5, -0.25, 0.3, 0.1, -0.7, 0.9];
        let mut samples = input.clone();
        filter.process(&mut samples);
        assert_eq!(samples, input);
    }

    #[test]
    fn test_cutoff_clamping() {
        let mut filter = HighPassFilter::new(48000.0, 1, 0.0);

        filter.set_cutoff(5.0);
        assert_eq!(filter.cutoff(), HighPassFilter::MIN_CUTOFF);

        filter.set_cutoff(30000.0);
        assert_eq!(filter.cutoff(), 48000.0 * 0.45);

        filter.set_cutoff(-10.0);
        assert_eq!(filter.cutoff(), 0.0);

        filter.set_cutoff(f32::NAN);
        assert_eq!(filter.cutoff(), 0.0);
    }

    #[test]
    fn test_removes_dc_offset() {
        let mut filter = HighPassFilter::new(48000.0, 1, 200.0);

        let mut samples = vec![0.5f32; 48000];
        filter.process(&mut samples);

        let tail = samples[47000..].iter().map(|s| s.abs()).fold(0.0f32, f32::max);
        assert!(tail < 0.001, "DC should be removed, got {}", tail);
    }

    #[test]
    fn test_passes_high_frequencies() {
        let mut filter = HighPassFilter::new(48000.0, 1, 100.0);

        let mut samples: Vec<f32> = (0..48000)
            .map(|i| (i as f32 * 2.0 * PI * 5000.0 / 48000.0).sin() * 0.5)
            .collect();
        filter.process(&mut samples);

        let peak = samples[40000..].iter().map(|s| s.abs()).fold(0.0f32, f32::max);
        assert!(peak > 0.45, "5 kHz should pass a 100 Hz high-pass, got {}", peak);
    }

    #[test]
    fn test_channels_are_independent() {
        let mut filter = HighPassFilter::new(48000.0, 2, 500.0);

        // Left carries DC, right is silent
        let mut samples: Vec<f32> = (0..2000).flat_map(|_| [0.5, 0.0]).collect();
        filter.process(&mut samples);

        assert!(samples.iter().skip(1).step_by(2).all(|s| *s == 0.0));
    }

    #[test]
    fn test_reset_clears_history() {
        let mut filter = HighPassFilter::new(48000.0, 1, 1000.0);
        let mut samples = vec![0.5, -0.5, 0.5, -0.5];
        filter.process(&mut samples);

        filter.reset();

        let mut silence = vec![0.0; 4];
        filter.process(&mut silence);
        assert!(silence.iter().all(|s| *s == 0.0));
    }
}
