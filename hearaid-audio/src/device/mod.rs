//! Device capability - the audio session/device layer the engine drives
//!
//! The engine never talks to an audio API directly. It configures a device
//! through [`AudioDevice`], hands it a [`FrameProcessor`] to run in the
//! real-time callback, and listens for typed [`DeviceEvent`]s.

mod cpal_backend;
#[cfg(test)]
pub(crate) mod mock;

pub use cpal_backend::CpalDevice;

use crate::error::AudioError;
use crossbeam_channel::Receiver;

/// Session options requested when the device is configured
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// Route output to the speaker when no accessory is attached
    pub prefer_speaker_output: bool,
    /// Keep other applications' audio playing alongside ours
    pub mix_with_others: bool,
    /// Accept wireless headsets as capture devices
    pub allow_wireless_input: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            prefer_speaker_output: true,
            mix_with_others: true,
            allow_wireless_input: true,
        }
    }
}

/// Negotiated stream format (interleaved f32)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

impl StreamFormat {
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
        }
    }
}

/// Interruption phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptionPhase {
    Began,
    Ended,
}

impl InterruptionPhase {
    /// Decode a platform interruption type code
    pub fn from_raw(code: u32) -> Option<Self> {
        match code {
            1 => Some(Self::Began),
            0 => Some(Self::Ended),
            _ => None,
        }
    }
}

/// Why the active route changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteChangeReason {
    /// The device we were using went away (e.g. headset unplugged)
    OldDeviceUnavailable,
    Other,
}

impl RouteChangeReason {
    /// Decode a platform route change reason code
    pub fn from_raw(code: u32) -> Option<Self> {
        match code {
            2 => Some(Self::OldDeviceUnavailable),
            0 | 1 | 3 | 4 | 6 | 7 | 8 => Some(Self::Other),
            _ => None,
        }
    }
}

/// Bit in the raw interruption options marking "should resume"
const SHOULD_RESUME_FLAG: u32 = 1;

/// Events emitted by the device layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceEvent {
    /// `should_resume` is only meaningful for `Ended`; `None` means the
    /// platform did not say
    Interruption {
        phase: InterruptionPhase,
        should_resume: Option<bool>,
    },
    RouteChange { reason: RouteChangeReason },
}

impl DeviceEvent {
    /// Build an interruption event from raw notification fields
    ///
    /// Returns `None` when the type is missing or unknown.
    pub fn interruption_from_raw(kind: Option<u32>, options: Option<u32>) -> Option<Self> {
        let phase = InterruptionPhase::from_raw(kind?)?;
        Some(Self::Interruption {
            phase,
            should_resume: options.map(|o| o & SHOULD_RESUME_FLAG != 0),
        })
    }

    /// Build a route change event from a raw reason code
    pub fn route_change_from_raw(reason: Option<u32>) -> Option<Self> {
        let reason = RouteChangeReason::from_raw(reason?)?;
        Some(Self::RouteChange { reason })
    }
}

/// Processing run inside the device's real-time output callback
///
/// `input` holds captured samples (silence where capture underran) and has
/// the same length and layout as `output`. Implementations must not block.
pub trait FrameProcessor: Send + 'static {
    fn process(&mut self, input: &[f32], output: &mut [f32]);
}

/// Capture/output device capability
pub trait AudioDevice {
    /// Acquire the capability with the requested options
    fn configure(&mut self, options: &SessionOptions) -> Result<(), AudioError>;

    /// Activate the configured session
    fn activate(&mut self) -> Result<(), AudioError>;

    /// Release the session
    fn deactivate(&mut self);

    /// Register for device events; replaces any previous subscription
    fn subscribe(&mut self) -> Receiver<DeviceEvent>;

    /// Drop the event subscription
    fn unsubscribe(&mut self);

    /// Format the next `start` will run with
    fn stream_format(&self) -> Result<StreamFormat, AudioError>;

    /// Open capture and output and start running `processor`
    fn start(&mut self, processor: Box<dyn FrameProcessor>) -> Result<(), AudioError>;

    /// Suspend the running streams without closing them
    fn pause(&mut self) -> Result<(), AudioError>;

    /// Continue paused streams
    fn resume(&mut self) -> Result<(), AudioError>;

    /// Close the streams. No-op when nothing is running.
    fn stop(&mut self);

    /// Check for device-set changes on backends without native notifications
    fn refresh_route(&mut self) {}
}
