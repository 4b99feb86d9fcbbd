//! Signal chain stages for HearAid

mod filter;
mod gain;

pub use filter::HighPassFilter;
pub use gain::{GainStage, MAX_GAIN};

/// Trait for in-place processing stages
pub trait Effect: Send {
    /// Process audio samples in place (interleaved, stage channel count)
    fn process(&mut self, samples: &mut [f32]);

    /// Reset stage state
    fn reset(&mut self);

    /// Get stage name
    fn name(&self) -> &'static str;
}
