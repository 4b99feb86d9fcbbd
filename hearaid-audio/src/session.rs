//! Session event handling - keeps the pipeline alive across interruptions
//! and route changes
//!
//! The handler only restores what was running before a device-level
//! disruption. It reads the user's on/off intent from the engine but never
//! changes it, and it makes at most one recovery attempt per event.

use crate::device::{AudioDevice, DeviceEvent, InterruptionPhase, RouteChangeReason};
use crate::engine::{AudioEngineController, EngineState};
use crate::error::AudioError;
use tracing::{debug, info, warn};

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Active,
    /// Another client holds the audio session, or a recovery failed
    Interrupted,
    /// A resume/restart attempt is in flight
    Recovering,
}

impl SessionState {
    pub fn display_name(&self) -> &'static str {
        match self {
            SessionState::Active => "ACTIVE",
            SessionState::Interrupted => "INTERRUPTED",
            SessionState::Recovering => "RECOVERING",
        }
    }
}

/// Interruption / route-change state machine
#[derive(Debug, Default)]
pub struct SessionEventHandler {
    state: SessionState,
    /// Another client holds the session (set by Began, cleared by Ended)
    interrupted_by_os: bool,
    /// The bound device vanished during an interruption; rebuild on recovery
    rebind_pending: bool,
}

impl SessionEventHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn rebind_pending(&self) -> bool {
        self.rebind_pending
    }

    /// Follow a manual on/off toggle
    ///
    /// A graph the user brought up is live on the current devices, so any
    /// interruption or failed recovery is over. Turning off clears a failed
    /// recovery but not an interruption still in progress.
    pub fn on_user_toggle<D: AudioDevice>(&mut self, engine: &AudioEngineController<D>) {
        if engine.state() == EngineState::Running {
            self.interrupted_by_os = false;
            self.rebind_pending = false;
            self.state = SessionState::Active;
        } else if !self.interrupted_by_os {
            self.state = SessionState::Active;
        }
    }

    /// React to one device event
    ///
    /// A failed recovery leaves the handler `Interrupted` and returns the
    /// error; the next event or a manual toggle may try again.
    pub fn handle_event<D: AudioDevice>(
        &mut self,
        event: DeviceEvent,
        engine: &mut AudioEngineController<D>,
    ) -> Result<(), AudioError> {
        match event {
            DeviceEvent::Interruption {
                phase: InterruptionPhase::Began,
                ..
            } => {
                self.interruption_began(engine);
                Ok(())
            }
            DeviceEvent::Interruption {
                phase: InterruptionPhase::Ended,
                should_resume: Some(should_resume),
            } => self.interruption_ended(should_resume, engine),
            DeviceEvent::Interruption {
                phase: InterruptionPhase::Ended,
                should_resume: None,
            } => {
                debug!("Ignoring interruption end without resume option");
                Ok(())
            }
            DeviceEvent::RouteChange {
                reason: RouteChangeReason::OldDeviceUnavailable,
            } => self.old_device_unavailable(engine),
            DeviceEvent::RouteChange {
                reason: RouteChangeReason::Other,
            } => {
                debug!("Ignoring route change");
                Ok(())
            }
        }
    }

    fn interruption_began<D: AudioDevice>(&mut self, engine: &mut AudioEngineController<D>) {
        info!("Audio session interrupted");
        self.state = SessionState::Interrupted;
        self.interrupted_by_os = true;
        if engine.is_enabled() {
            engine.pause();
        }
    }

    fn interruption_ended<D: AudioDevice>(
        &mut self,
        should_resume: bool,
        engine: &mut AudioEngineController<D>,
    ) -> Result<(), AudioError> {
        if self.state != SessionState::Interrupted {
            debug!(state = ?self.state, "Ignoring interruption end outside an interruption");
            return Ok(());
        }

        self.interrupted_by_os = false;
        let rebind = std::mem::take(&mut self.rebind_pending);
        if !should_resume || !engine.is_enabled() {
            info!(should_resume, "Interruption ended without resuming");
            self.state = SessionState::Active;
            return Ok(());
        }

        self.recover(engine, |engine| {
            if rebind || engine.state() == EngineState::Stopped {
                engine.start()
            } else {
                engine.resume()
            }
        })
    }

    fn old_device_unavailable<D: AudioDevice>(
        &mut self,
        engine: &mut AudioEngineController<D>,
    ) -> Result<(), AudioError> {
        if self.interrupted_by_os {
            // Restarting now would fight the interruption; rebind when it ends
            debug!("Route lost while interrupted, rebind deferred");
            self.rebind_pending = true;
            return Ok(());
        }
        if !engine.is_enabled() {
            debug!("Route lost while hearing aid is off");
            return Ok(());
        }

        info!("Audio route lost, rebinding to default devices");
        self.recover(engine, |engine| engine.start())
    }

    fn recover<D, F>(
        &mut self,
        engine: &mut AudioEngineController<D>,
        attempt: F,
    ) -> Result<(), AudioError>
    where
        D: AudioDevice,
        F: FnOnce(&mut AudioEngineController<D>) -> Result<(), AudioError>,
    {
        self.state = SessionState::Recovering;
        match attempt(engine) {
            Ok(()) => {
                self.state = SessionState::Active;
                info!("Audio session recovered");
                Ok(())
            }
            Err(e) => {
                warn!("Audio session recovery failed: {}", e);
                self.state = SessionState::Interrupted;
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HearingAidConfig;
    use crate::device::mock::MockDevice;

    const BEGAN: DeviceEvent = DeviceEvent::Interruption {
        phase: InterruptionPhase::Began,
        should_resume: None,
    };
    const ENDED_RESUME: DeviceEvent = DeviceEvent::Interruption {
        phase: InterruptionPhase::Ended,
        should_resume: Some(true),
    };
    const ENDED_NO_RESUME: DeviceEvent = DeviceEvent::Interruption {
        phase: InterruptionPhase::Ended,
        should_resume: Some(false),
    };
    const ENDED_MALFORMED: DeviceEvent = DeviceEvent::Interruption {
        phase: InterruptionPhase::Ended,
        should_resume: None,
    };
    const DEVICE_LOST: DeviceEvent = DeviceEvent::RouteChange {
        reason: RouteChangeReason::OldDeviceUnavailable,
    };
    const ROUTE_OTHER: DeviceEvent = DeviceEvent::RouteChange {
        reason: RouteChangeReason::Other,
    };

    fn running_engine() -> AudioEngineController<MockDevice> {
        let mut engine = AudioEngineController::new(MockDevice::new(), HearingAidConfig::default());
        engine.configure().unwrap();
        engine.start().unwrap();
        engine
    }

    fn disabled_running_engine() -> AudioEngineController<MockDevice> {
        // Intent off, but the graph is up (e.g. started before the toggle)
        let config = HearingAidConfig {
            start_enabled: false,
            ..HearingAidConfig::default()
        };
        let mut engine = AudioEngineController::new(MockDevice::new(), config);
        engine.configure().unwrap();
        engine.start().unwrap();
        engine
    }

    #[test]
    fn test_initial_state() {
        let handler = SessionEventHandler::new();
        assert_eq!(handler.state(), SessionState::Active);
        assert!(!handler.rebind_pending());
    }

    #[test]
    fn test_interruption_pauses_when_enabled() {
        let mut engine = running_engine();
        let mut handler = SessionEventHandler::new();

        handler.handle_event(BEGAN, &mut engine).unwrap();
        assert_eq!(handler.state(), SessionState::Interrupted);
        assert_eq!(engine.state(), EngineState::Paused);
        assert!(engine.is_enabled());
    }

    #[test]
    fn test_interruption_respects_disabled_intent() {
        let mut engine = disabled_running_engine();
        let mut handler = SessionEventHandler::new();

        handler.handle_event(BEGAN, &mut engine).unwrap();
        assert_eq!(handler.state(), SessionState::Interrupted);
        assert_eq!(engine.device().count("pause"), 0);
        assert_eq!(engine.state(), EngineState::Running);
        assert!(!engine.is_enabled());
    }

    #[test]
    fn test_resume_after_interruption() {
        let mut engine = running_engine();
        let mut handler = SessionEventHandler::new();

        handler.handle_event(BEGAN, &mut engine).unwrap();
        handler.handle_event(ENDED_RESUME, &mut engine).unwrap();

        assert_eq!(handler.state(), SessionState::Active);
        assert_eq!(engine.state(), EngineState::Running);
        assert_eq!(engine.device().count("resume"), 1);
        assert_eq!(engine.device().count("start"), 1);
    }

    #[test]
    fn test_failed_resume_stays_interrupted() {
        let mut engine = running_engine();
        let mut handler = SessionEventHandler::new();

        handler.handle_event(BEGAN, &mut engine).unwrap();
        engine.device_mut().fail_resume = true;

        let result = handler.handle_event(ENDED_RESUME, &mut engine);
        assert!(matches!(result, Err(AudioError::EngineStart(_))));
        assert_eq!(handler.state(), SessionState::Interrupted);
        assert_eq!(engine.state(), EngineState::Paused);
        // Exactly one attempt, no silent retry
        assert_eq!(engine.device().count("resume"), 1);

        // The next event can retry
        engine.device_mut().fail_resume = false;
        handler.handle_event(ENDED_RESUME, &mut engine).unwrap();
        assert_eq!(handler.state(), SessionState::Active);
        assert_eq!(engine.state(), EngineState::Running);
    }

    #[test]
    fn test_resume_restarts_torn_down_graph() {
        let mut engine = running_engine();
        let mut handler = SessionEventHandler::new();

        handler.handle_event(BEGAN, &mut engine).unwrap();
        // Graph lost while interrupted (e.g. the device reset it)
        engine.stop();
        handler.handle_event(ENDED_RESUME, &mut engine).unwrap();

        assert_eq!(engine.state(), EngineState::Running);
        assert_eq!(engine.device().count("resume"), 0);
        assert_eq!(engine.device().count("start"), 2);
    }

    #[test]
    fn test_ended_without_resume_takes_no_action() {
        let mut engine = running_engine();
        let mut handler = SessionEventHandler::new();

        handler.handle_event(BEGAN, &mut engine).unwrap();
        handler.handle_event(ENDED_NO_RESUME, &mut engine).unwrap();

        assert_eq!(handler.state(), SessionState::Active);
        assert_eq!(engine.state(), EngineState::Paused);
        assert_eq!(engine.device().count("resume"), 0);
    }

    #[test]
    fn test_ended_while_disabled_does_not_resume() {
        let mut engine = running_engine();
        let mut handler = SessionEventHandler::new();

        handler.handle_event(BEGAN, &mut engine).unwrap();
        engine.toggle_hearing_aid().unwrap();
        handler.handle_event(ENDED_RESUME, &mut engine).unwrap();

        assert_eq!(handler.state(), SessionState::Active);
        assert_eq!(engine.state(), EngineState::Stopped);
        assert!(!engine.is_enabled());
    }

    #[test]
    fn test_malformed_events_are_ignored() {
        let mut engine = running_engine();
        let mut handler = SessionEventHandler::new();
        handler.handle_event(BEGAN, &mut engine).unwrap();
        let calls_before = engine.device().calls.len();

        handler.handle_event(ENDED_MALFORMED, &mut engine).unwrap();
        handler.handle_event(ROUTE_OTHER, &mut engine).unwrap();

        assert_eq!(handler.state(), SessionState::Interrupted);
        assert_eq!(engine.state(), EngineState::Paused);
        assert_eq!(engine.device().calls.len(), calls_before);
    }

    #[test]
    fn test_ended_while_active_is_ignored() {
        let mut engine = running_engine();
        let mut handler = SessionEventHandler::new();

        handler.handle_event(ENDED_RESUME, &mut engine).unwrap();
        assert_eq!(handler.state(), SessionState::Active);
        assert_eq!(engine.device().count("resume"), 0);
        assert_eq!(engine.device().count("start"), 1);
    }

    #[test]
    fn test_route_loss_rebinds_when_enabled() {
        let mut engine = running_engine();
        let mut handler = SessionEventHandler::new();

        handler.handle_event(DEVICE_LOST, &mut engine).unwrap();
        assert_eq!(handler.state(), SessionState::Active);
        assert_eq!(engine.state(), EngineState::Running);
        assert_eq!(engine.device().count("start"), 2);
    }

    #[test]
    fn test_route_loss_ignored_when_disabled() {
        let mut engine = running_engine();
        let mut handler = SessionEventHandler::new();
        engine.toggle_hearing_aid().unwrap();

        handler.handle_event(DEVICE_LOST, &mut engine).unwrap();
        assert_eq!(handler.state(), SessionState::Active);
        assert_eq!(engine.state(), EngineState::Stopped);
        assert_eq!(engine.device().count("start"), 1);
    }

    #[test]
    fn test_failed_rebind_is_reported_once() {
        let mut engine = running_engine();
        let mut handler = SessionEventHandler::new();
        engine.device_mut().fail_start = true;

        let result = handler.handle_event(DEVICE_LOST, &mut engine);
        assert!(matches!(result, Err(AudioError::EngineStart(_))));
        assert_eq!(handler.state(), SessionState::Interrupted);
        assert_eq!(engine.state(), EngineState::Stopped);
        assert_eq!(engine.device().count("start"), 2);
        assert!(engine.is_enabled());
    }

    #[test]
    fn test_route_loss_during_interruption_defers_rebind() {
        let mut engine = running_engine();
        let mut handler = SessionEventHandler::new();

        handler.handle_event(BEGAN, &mut engine).unwrap();
        handler.handle_event(DEVICE_LOST, &mut engine).unwrap();
        assert!(handler.rebind_pending());
        assert_eq!(engine.state(), EngineState::Paused);
        assert_eq!(engine.device().count("start"), 1);

        handler.handle_event(ENDED_RESUME, &mut engine).unwrap();
        assert!(!handler.rebind_pending());
        assert_eq!(engine.state(), EngineState::Running);
        assert_eq!(engine.device().count("resume"), 0);
        assert_eq!(engine.device().count("start"), 2);
    }

    #[test]
    fn test_route_loss_retries_after_failed_rebind() {
        let mut engine = running_engine();
        let mut handler = SessionEventHandler::new();
        engine.device_mut().fail_start = true;
        assert!(handler.handle_event(DEVICE_LOST, &mut engine).is_err());
        assert_eq!(handler.state(), SessionState::Interrupted);

        engine.device_mut().fail_start = false;
        handler.handle_event(DEVICE_LOST, &mut engine).unwrap();
        assert!(!handler.rebind_pending());
        assert_eq!(handler.state(), SessionState::Active);
        assert_eq!(engine.state(), EngineState::Running);
        assert_eq!(engine.device().count("start"), 3);
    }

    #[test]
    fn test_manual_restart_after_failed_rebind() {
        let mut engine = running_engine();
        let mut handler = SessionEventHandler::new();
        engine.device_mut().fail_start = true;
        assert!(handler.handle_event(DEVICE_LOST, &mut engine).is_err());

        // Off, then on with a working device
        engine.toggle_hearing_aid().unwrap();
        handler.on_user_toggle(&engine);
        assert_eq!(handler.state(), SessionState::Active);

        engine.device_mut().fail_start = false;
        engine.toggle_hearing_aid().unwrap();
        handler.on_user_toggle(&engine);
        assert_eq!(handler.state(), SessionState::Active);
        assert_eq!(engine.state(), EngineState::Running);

        // A later loss is rebound right away
        let starts = engine.device().count("start");
        handler.handle_event(DEVICE_LOST, &mut engine).unwrap();
        assert_eq!(engine.device().count("start"), starts + 1);
        assert_eq!(handler.state(), SessionState::Active);
    }

    #[test]
    fn test_toggle_off_keeps_real_interruption() {
        let mut engine = running_engine();
        let mut handler = SessionEventHandler::new();
        handler.handle_event(BEGAN, &mut engine).unwrap();

        engine.toggle_hearing_aid().unwrap();
        handler.on_user_toggle(&engine);
        assert_eq!(handler.state(), SessionState::Interrupted);

        handler.handle_event(DEVICE_LOST, &mut engine).unwrap();
        assert!(handler.rebind_pending());
    }

    #[test]
    fn test_handler_never_changes_intent() {
        let mut engine = running_engine();
        let mut handler = SessionEventHandler::new();
        engine.device_mut().fail_start = true;

        for event in [BEGAN, DEVICE_LOST, ENDED_RESUME, ENDED_NO_RESUME, DEVICE_LOST] {
            let _ = handler.handle_event(event, &mut engine);
            assert!(engine.is_enabled());
        }
    }
}
