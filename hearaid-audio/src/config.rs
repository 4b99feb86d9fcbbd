//! In-process configuration for the hearing aid pipeline

use crate::device::SessionOptions;

/// High-pass cutoff. Zero keeps the filter in the chain but inert.
pub const DEFAULT_CUTOFF_HZ: f32 = 0.0;
/// Post-filter gain (~+9.5 dB)
pub const DEFAULT_GAIN: f32 = 3.0;
/// Frames per metering batch
pub const DEFAULT_TAP_FRAMES: usize = 1024;
/// RMS value mapped to full scale on the loudness readout
pub const DEFAULT_REFERENCE_RMS: f32 = 0.5;
/// Capture to output ring buffer depth
pub const DEFAULT_RING_LATENCY_MS: u32 = 50;

/// Hearing aid configuration
#[derive(Debug, Clone, PartialEq)]
pub struct HearingAidConfig {
    /// High-pass cutoff frequency in Hz (<= 0 disables filtering)
    pub cutoff_hz: f32,
    /// Gain factor applied after the filter
    pub gain: f32,
    /// Number of frames the meter tap collects per reading
    pub tap_frames: usize,
    /// Reference ceiling for the loudness readout
    pub reference_rms: f32,
    /// Ring buffer depth between capture and output
    pub ring_latency_ms: u32,
    /// Options handed to the device when it is configured
    pub session: SessionOptions,
    /// Initial value of the user's on/off intent
    pub start_enabled: bool,
}

impl Default for HearingAidConfig {
    fn default() -> Self {
        Self {
            cutoff_hz: DEFAULT_CUTOFF_HZ,
            gain: DEFAULT_GAIN,
            tap_frames: DEFAULT_TAP_FRAMES,
            reference_rms: DEFAULT_REFERENCE_RMS,
            ring_latency_ms: DEFAULT_RING_LATENCY_MS,
            session: SessionOptions::default(),
            start_enabled: true,
        }
    }
}
