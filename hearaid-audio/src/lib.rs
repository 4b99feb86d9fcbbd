//! Audio core for HearAid - microphone to earphones with a loudness readout
//!
//! This crate provides the real-time hearing aid pipeline:
//! - SignalChain: high-pass filter followed by a gain stage
//! - LoudnessMeter / MeterTap: RMS loudness taken from the output
//! - AudioEngineController: device lifecycle, start/stop/pause/resume, toggle
//! - SessionEventHandler: recovery across interruptions and route changes
//! - Device: the capability trait and its cpal backend

mod chain;
mod config;
mod device;
mod effects;
mod engine;
mod error;
mod meter;
mod session;

pub use chain::{ChainCommand, SignalChain, MAX_CHANNELS};
pub use config::{
    HearingAidConfig, DEFAULT_CUTOFF_HZ, DEFAULT_GAIN, DEFAULT_REFERENCE_RMS,
    DEFAULT_RING_LATENCY_MS, DEFAULT_TAP_FRAMES,
};
pub use device::{
    AudioDevice, CpalDevice, DeviceEvent, FrameProcessor, InterruptionPhase, RouteChangeReason,
    SessionOptions, StreamFormat,
};
pub use effects::{Effect, GainStage, HighPassFilter, MAX_GAIN};
pub use engine::{AudioEngineController, EngineState};
pub use error::AudioError;
pub use meter::{AudioFrameBatch, LoudnessListener, LoudnessMeter, LoudnessReading, MeterTap};
pub use session::{SessionEventHandler, SessionState};
