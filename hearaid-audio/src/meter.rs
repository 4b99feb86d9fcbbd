//! Loudness metering - RMS over fixed batches taken from the output tap

use crate::config::{DEFAULT_REFERENCE_RMS, DEFAULT_TAP_FRAMES};
use crossbeam_channel::Sender;

/// Borrowed view of interleaved samples handed to the meter
#[derive(Debug, Clone, Copy)]
pub struct AudioFrameBatch<'a> {
    samples: &'a [f32],
    channels: usize,
    frames: usize,
}

impl<'a> AudioFrameBatch<'a> {
    /// Wrap interleaved samples. Trailing samples that do not fill a frame are ignored.
    pub fn new(samples: &'a [f32], channels: usize) -> Self {
        let frames = if channels == 0 { 0 } else { samples.len() / channels };
        Self {
            samples,
            channels,
            frames,
        }
    }

    pub fn empty() -> Self {
        Self {
            samples: &[],
            channels: 0,
            frames: 0,
        }
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn is_empty(&self) -> bool {
        self.frames == 0
    }

    /// Samples covered by whole frames
    pub fn samples(&self) -> &'a [f32] {
        &self.samples[..self.frames * self.channels]
    }
}

/// One loudness measurement
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoudnessReading {
    /// Root-mean-square over the batch
    pub rms: f32,
    /// Normalized level (0.0-1.0)
    pub progress: f32,
    /// Level as a percentage (0.0-100.0)
    pub percentage: f32,
}

/// Receives loudness updates on the control thread
pub trait LoudnessListener {
    fn on_loudness_update(&mut self, progress: f32, percentage: f32);
}

/// RMS loudness meter
///
/// Stateless between calls; safe to run from the audio callback.
#[derive(Debug, Clone, Copy)]
pub struct LoudnessMeter {
    reference_rms: f32,
}

impl Default for LoudnessMeter {
    fn default() -> Self {
        Self::new(DEFAULT_REFERENCE_RMS)
    }
}

impl LoudnessMeter {
    /// Create a meter that maps `reference_rms` to full scale
    pub fn new(reference_rms: f32) -> Self {
        let reference_rms = if reference_rms.is_finite() && reference_rms > 0.0 {
            reference_rms
        } else {
            DEFAULT_REFERENCE_RMS
        };
        Self { reference_rms }
    }

    pub fn reference_rms(&self) -> f32 {
        self.reference_rms
    }

    /// Measure a batch
    pub fn measure(&self, batch: AudioFrameBatch<'_>) -> LoudnessReading {
        let samples = batch.samples();
        if samples.is_empty() {
            return LoudnessReading::default();
        }

        let sum: f32 = samples.iter().map(|s| s * s).sum();
        let rms = (sum / samples.len() as f32).sqrt();

        let ratio = rms / self.reference_rms;
        LoudnessReading {
            rms,
            progress: ratio.min(1.0),
            percentage: (ratio * 100.0).min(100.0),
        }
    }
}

/// Metering tap on the output-adjacent node
///
/// Collects processed samples into a preallocated batch and posts one
/// reading per full batch. Posting never blocks: when the receiver still
/// holds an unread reading the new one is dropped.
pub struct MeterTap {
    meter: LoudnessMeter,
    channels: usize,
    buffer: Vec<f32>,
    filled: usize,
    readings: Sender<LoudnessReading>,
}

impl MeterTap {
    pub fn new(
        meter: LoudnessMeter,
        channels: usize,
        batch_frames: usize,
        readings: Sender<LoudnessReading>,
    ) -> Self {
        let channels = channels.max(1);
        let batch_frames = if batch_frames == 0 { DEFAULT_TAP_FRAMES } else { batch_frames };
        Self {
            meter,
            channels,
            buffer: vec![0.0; batch_frames * channels],
            filled: 0,
            readings,
        }
    }

    /// Frames per reading
    pub fn batch_frames(&self) -> usize {
        self.buffer.len() / self.channels
    }

    /// Observe a block of interleaved output samples
    pub fn observe(&mut self, samples: &[f32]) {
        let mut offset = 0;
        while offset < samples.len() {
            let take = (self.buffer.len() - self.filled).min(samples.len() - offset);
            self.buffer[self.filled..self.filled + take]
                .copy_from_slice(&samples[offset..offset + take]);
            self.filled += take;
            offset += take;

            if self.filled == self.buffer.len() {
                let reading = self
                    .meter
                    .measure(AudioFrameBatch::new(&self.buffer, self.channels));
                let _ = self.readings.try_send(reading);
                self.filled = 0;
            }
        }
    }
}
