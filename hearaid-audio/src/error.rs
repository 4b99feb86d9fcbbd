//! Error taxonomy for the audio core

use thiserror::Error;

/// Errors surfaced by the device layer, the engine and the signal chain
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AudioError {
    /// The device capability could not be acquired or activated
    #[error("device configuration failed: {0}")]
    DeviceConfig(String),
    /// The device graph could not be started or resumed
    #[error("audio engine failed to start: {0}")]
    EngineStart(String),
    /// The signal chain could not be connected to the negotiated stream format
    #[error("signal chain wiring failed: {0}")]
    ChainWire(String),
}

impl AudioError {
    pub fn device_config(msg: impl Into<String>) -> Self {
        Self::DeviceConfig(msg.into())
    }

    pub fn engine_start(msg: impl Into<String>) -> Self {
        Self::EngineStart(msg.into())
    }

    pub fn chain_wire(msg: impl Into<String>) -> Self {
        Self::ChainWire(msg.into())
    }
}
