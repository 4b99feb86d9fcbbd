//! Audio engine - owns the device, wires the chain and the metering tap

use crate::chain::{ChainCommand, SignalChain};
use crate::config::HearingAidConfig;
use crate::device::{AudioDevice, DeviceEvent, FrameProcessor, StreamFormat};
use crate::effects::MAX_GAIN;
use crate::error::AudioError;
use crate::meter::{LoudnessListener, LoudnessMeter, LoudnessReading, MeterTap};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Pending parameter updates per running graph
const CHAIN_COMMAND_CAPACITY: usize = 64;

/// Engine lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineState {
    #[default]
    Stopped,
    Running,
    Paused,
}

impl EngineState {
    pub fn display_name(&self) -> &'static str {
        match self {
            EngineState::Stopped => "STOPPED",
            EngineState::Running => "RUNNING",
            EngineState::Paused => "PAUSED",
        }
    }
}

/// Graph handed to the device: capture -> chain -> tap -> output
struct ProcessingGraph {
    chain: SignalChain,
    tap: MeterTap,
    /// Closed while the engine is paused or being torn down
    gate: Arc<AtomicBool>,
    commands: Receiver<ChainCommand>,
}

impl FrameProcessor for ProcessingGraph {
    fn process(&mut self, input: &[f32], output: &mut [f32]) {
        while let Ok(command) = self.commands.try_recv() {
            self.chain.apply(command);
        }

        if !self.gate.load(Ordering::Acquire) {
            output.fill(0.0);
            return;
        }

        let len = input.len().min(output.len());
        output[..len].copy_from_slice(&input[..len]);
        output[len..].fill(0.0);

        self.chain.process(output);
        self.tap.observe(output);
    }
}

/// Controls the hearing aid pipeline on the control thread
///
/// All transitions take `&mut self`, so start/stop/pause/resume are
/// serialized by whoever owns the controller.
pub struct AudioEngineController<D: AudioDevice> {
    device: D,
    config: HearingAidConfig,
    state: EngineState,
    /// User intent: the hearing aid is switched on
    enabled: bool,
    configured: bool,
    format: Option<StreamFormat>,
    gate: Arc<AtomicBool>,
    chain_tx: Option<Sender<ChainCommand>>,
    reading_tx: Sender<LoudnessReading>,
    reading_rx: Receiver<LoudnessReading>,
    events: Option<Receiver<DeviceEvent>>,
}

impl<D: AudioDevice> AudioEngineController<D> {
    pub fn new(device: D, config: HearingAidConfig) -> Self {
        // One-slot handoff: while a reading is unread, newer ones are dropped
        let (reading_tx, reading_rx) = bounded(1);
        Self {
            device,
            enabled: config.start_enabled,
            config,
            state: EngineState::Stopped,
            configured: false,
            format: None,
            gate: Arc::new(AtomicBool::new(false)),
            chain_tx: None,
            reading_tx,
            reading_rx,
            events: None,
        }
    }

    /// Acquire and activate the device session and subscribe to its events
    pub fn configure(&mut self) -> Result<(), AudioError> {
        if self.configured {
            return Ok(());
        }

        self.device.configure(&self.config.session)?;
        self.device.activate()?;
        self.events = Some(self.device.subscribe());
        self.configured = true;
        info!("Audio session configured");
        Ok(())
    }

    /// Build the graph and start it; rebuilds (and rebinds) if already running
    pub fn start(&mut self) -> Result<(), AudioError> {
        if !self.configured {
            return Err(AudioError::engine_start("audio session is not configured"));
        }
        if self.state != EngineState::Stopped {
            self.teardown();
        }

        match self.build_and_start() {
            Ok(format) => {
                self.format = Some(format);
                self.state = EngineState::Running;
                info!(
                    sample_rate = format.sample_rate,
                    channels = format.channels,
                    cutoff_hz = self.config.cutoff_hz,
                    gain = self.config.gain,
                    "Hearing aid running"
                );
                Ok(())
            }
            Err(e) => {
                warn!("Failed to start audio engine: {}", e);
                self.teardown();
                Err(e)
            }
        }
    }

    fn build_and_start(&mut self) -> Result<StreamFormat, AudioError> {
        let format = self.device.stream_format()?;
        let chain = SignalChain::wire(format, self.config.cutoff_hz, self.config.gain)?;
        debug!(stages = ?chain.stage_names(), "Signal chain wired");
        let tap = MeterTap::new(
            LoudnessMeter::new(self.config.reference_rms),
            format.channels as usize,
            self.config.tap_frames,
            self.reading_tx.clone(),
        );
        let (chain_tx, chain_rx) = bounded(CHAIN_COMMAND_CAPACITY);
        let gate = Arc::new(AtomicBool::new(true));

        self.device.start(Box::new(ProcessingGraph {
            chain,
            tap,
            gate: gate.clone(),
            commands: chain_rx,
        }))?;

        self.gate = gate;
        self.chain_tx = Some(chain_tx);
        Ok(format)
    }

    fn teardown(&mut self) {
        self.gate.store(false, Ordering::Release);
        self.device.stop();
        self.chain_tx = None;
        self.state = EngineState::Stopped;
        // Readings from the old graph are stale
        while self.reading_rx.try_recv().is_ok() {}
    }

    /// Tear down the running graph. No-op when already stopped.
    pub fn stop(&mut self) {
        if self.state == EngineState::Stopped {
            return;
        }
        self.teardown();
        info!("Hearing aid stopped");
    }

    /// Suspend output without destroying the graph
    pub fn pause(&mut self) {
        if self.state != EngineState::Running {
            return;
        }
        self.gate.store(false, Ordering::Release);
        if let Err(e) = self.device.pause() {
            // Output is already gated to silence
            warn!("Device pause failed: {}", e);
        }
        self.state = EngineState::Paused;
        info!("Hearing aid paused");
    }

    /// Continue a paused graph
    pub fn resume(&mut self) -> Result<(), AudioError> {
        match self.state {
            EngineState::Running => Ok(()),
            EngineState::Stopped => Err(AudioError::engine_start("no audio graph to resume")),
            EngineState::Paused => {
                if let Err(e) = self.device.resume() {
                    warn!("Failed to resume audio engine: {}", e);
                    return Err(e);
                }
                // Queued ahead of the gate so the first live callback starts clean
                self.send_chain_command(ChainCommand::Reset);
                self.gate.store(true, Ordering::Release);
                self.state = EngineState::Running;
                info!("Hearing aid resumed");
                Ok(())
            }
        }
    }

    /// Flip the user's on/off intent and start or stop accordingly
    pub fn toggle_hearing_aid(&mut self) -> Result<(), AudioError> {
        self.set_enabled(!self.enabled)
    }

    /// Set the user's on/off intent and start or stop accordingly
    ///
    /// No-op when the intent is unchanged. The flag is updated even when
    /// starting fails, so a later toggle or device event can retry.
    pub fn set_enabled(&mut self, enabled: bool) -> Result<(), AudioError> {
        if enabled == self.enabled {
            return Ok(());
        }
        self.enabled = enabled;
        if enabled {
            self.start()
        } else {
            self.stop();
            Ok(())
        }
    }

    /// Retune the high-pass cutoff (0 disables the filter)
    pub fn set_cutoff(&mut self, cutoff_hz: f32) {
        let cutoff_hz = if cutoff_hz.is_finite() { cutoff_hz.max(0.0) } else { 0.0 };
        self.config.cutoff_hz = cutoff_hz;
        self.send_chain_command(ChainCommand::SetCutoff(cutoff_hz));
    }

    /// Change the gain factor (0.0 - MAX_GAIN)
    pub fn set_gain(&mut self, gain: f32) {
        let gain = if gain.is_finite() { gain.clamp(0.0, MAX_GAIN) } else { 0.0 };
        self.config.gain = gain;
        self.send_chain_command(ChainCommand::SetGain(gain));
    }

    fn send_chain_command(&self, command: ChainCommand) {
        if let Some(tx) = &self.chain_tx {
            if tx.try_send(command).is_err() {
                // The next start rebuilds the chain from config anyway
                warn!(?command, "Chain command queue full, update deferred");
            }
        }
    }

    /// Forward pending loudness readings to the listener; returns how many
    pub fn dispatch_readings<L: LoudnessListener + ?Sized>(&self, listener: &mut L) -> usize {
        let mut count = 0;
        while let Ok(reading) = self.reading_rx.try_recv() {
            listener.on_loudness_update(reading.progress, reading.percentage);
            count += 1;
        }
        count
    }

    /// Next pending device event, if any
    pub fn poll_event(&self) -> Option<DeviceEvent> {
        self.events.as_ref()?.try_recv().ok()
    }

    /// Let the backend look for device changes
    pub fn refresh_route(&mut self) {
        if self.configured {
            self.device.refresh_route();
        }
    }

    /// Stop, drop the event subscription and release the session
    pub fn shutdown(&mut self) {
        self.stop();
        if self.configured {
            self.device.unsubscribe();
            self.device.deactivate();
            self.events = None;
            self.configured = false;
            debug!("Audio session released");
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_configured(&self) -> bool {
        self.configured
    }

    /// Format of the most recently started graph
    pub fn stream_format(&self) -> Option<StreamFormat> {
        self.format
    }

    pub fn cutoff_hz(&self) -> f32 {
        self.config.cutoff_hz
    }

    pub fn gain(&self) -> f32 {
        self.config.gain
    }

    pub fn config(&self) -> &HearingAidConfig {
        &self.config
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }
}

impl<D: AudioDevice> Drop for AudioEngineController<D> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
