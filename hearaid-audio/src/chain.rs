//! Signal chain - high-pass filter followed by the gain stage

use crate::device::StreamFormat;
use crate::effects::{Effect, GainStage, HighPassFilter};
use crate::error::AudioError;

/// Largest channel count the chain will wire
pub const MAX_CHANNELS: u16 = 32;

/// Parameter updates forwarded to a live chain
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChainCommand {
    SetCutoff(f32),
    SetGain(f32),
    /// Drop filter history left over from before a pause
    Reset,
}

/// Capture -> high-pass -> gain, wired once per engine start
pub struct SignalChain {
    high_pass: HighPassFilter,
    gain: GainStage,
}

impl SignalChain {
    /// Wire a chain for the negotiated stream format
    pub fn wire(format: StreamFormat, cutoff_hz: f32, gain: f32) -> Result<Self, AudioError> {
        if format.channels == 0 || format.channels > MAX_CHANNELS {
            return Err(AudioError::chain_wire(format!(
                "unsupported channel count {}",
                format.channels
            )));
        }
        if format.sample_rate == 0 {
            return Err(AudioError::chain_wire("sample rate is zero"));
        }
        if !gain.is_finite() {
            return Err(AudioError::chain_wire(format!("invalid gain {}", gain)));
        }

        let channels = format.channels as usize;
        Ok(Self {
            high_pass: HighPassFilter::new(format.sample_rate as f32, channels, cutoff_hz),
            gain: GainStage::new(gain, channels),
        })
    }

    /// Apply a parameter update
    pub fn apply(&mut self, command: ChainCommand) {
        match command {
            ChainCommand::SetCutoff(hz) => self.high_pass.set_cutoff(hz),
            ChainCommand::SetGain(gain) => self.gain.set_gain(gain),
            ChainCommand::Reset => self.reset(),
        }
    }

    /// Run the chain over interleaved samples in place
    pub fn process(&mut self, samples: &mut [f32]) {
        self.high_pass.process(samples);
        self.gain.process(samples);
    }

    /// Clear filter history and settle the gain
    fn reset(&mut self) {
        self.high_pass.reset();
        self.gain.reset();
    }

    pub fn cutoff_hz(&self) -> f32 {
        self.high_pass.cutoff()
    }

    pub fn gain(&self) -> f32 {
        self.gain.gain()
    }

    /// Names of the stages in processing order
    pub fn stage_names(&self) -> [&'static str; 2] {
        [self.high_pass.name(), self.gain.name()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_CUTOFF_HZ, DEFAULT_GAIN};

    fn mono() -> StreamFormat {
        StreamFormat::new(48000, 1)
    }

    #[test]
    fn test_default_chain_triples_input() {
        let mut chain = SignalChain::wire(mono(), DEFAULT_CUTOFF_HZ, DEFAULT_GAIN).unwrap();
        let mut samples = vec![0.1, -0.2, 0.05, 0.3];
        chain.process(&mut samples);

        let expected = [0.3, -0.6, 0.15, 0.9];
        for (out, exp) in samples.iter().zip(expected) {
            assert!((out - exp).abs() < 1e-6, "{} != {}", out, exp);
        }
    }

    #[test]
    fn test_stage_order() {
        let chain = SignalChain::wire(mono(), 0.0, 1.0).unwrap();
        assert_eq!(chain.stage_names(), ["HP Filter", "Gain"]);
    }

    #[test]
    fn test_wire_rejects_bad_formats() {
        assert!(matches!(
            SignalChain::wire(StreamFormat::new(48000, 0), 0.0, 3.0),
            Err(AudioError::ChainWire(_))
        ));
        assert!(matches!(
            SignalChain::wire(StreamFormat::new(0, 2), 0.0, 3.0),
            Err(AudioError::ChainWire(_))
        ));
        assert!(matches!(
            SignalChain::wire(StreamFormat::new(48000, 64), 0.0, 3.0),
            Err(AudioError::ChainWire(_))
        ));
        assert!(matches!(
            SignalChain::wire(mono(), 0.0, f32::NAN),
            Err(AudioError::ChainWire(_))
        ));
    }

    #[test]
    fn test_apply_commands() {
        let mut chain = SignalChain::wire(StreamFormat::new(44100, 2), 0.0, 3.0).unwrap();

        chain.apply(ChainCommand::SetCutoff(120.0));
        assert_eq!(chain.cutoff_hz(), 120.0);

        chain.apply(ChainCommand::SetGain(1.5));
        assert_eq!(chain.gain(), 1.5);
    }

    #[test]
    fn test_reset_command_clears_history() {
        let mut chain = SignalChain::wire(mono(), 200.0, 3.0).unwrap();
        let mut samples = vec![0.5f32; 64];
        chain.process(&mut samples);

        let mut silence = vec![0.0f32; 8];
        chain.process(&mut silence);
        assert!(silence.iter().any(|s| *s != 0.0));

        chain.apply(ChainCommand::Reset);
        let mut silence = vec![0.0f32; 8];
        chain.process(&mut silence);
        assert!(silence.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_tuned_chain_removes_dc_before_gain() {
        let mut chain = SignalChain::wire(mono(), 200.0, 3.0).unwrap();
        let mut samples = vec![0.2f32; 48000];
        chain.process(&mut samples);

        assert!(samples[47999].abs() < 0.003);
    }
}
