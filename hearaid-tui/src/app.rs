//! Application state - the UI side of the hearing aid

use crate::theme::Theme;
use hearaid_audio::{EngineState, LoudnessListener, SessionState};

/// Message type for colored status messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MessageType {
    #[default]
    Info,
    Warning,
    Error,
}

/// Everything the view renders
#[derive(Debug, Clone)]
pub struct AppState {
    /// Meter fill (0.0-1.0)
    pub progress: f32,
    /// Loudness label value (0.0-100.0)
    pub percentage: f32,

    // Mirrored from the engine every frame
    pub enabled: bool,
    pub engine_state: EngineState,
    pub session_state: SessionState,
    pub gain: f32,
    pub cutoff_hz: f32,

    pub message: Option<String>,
    pub message_type: MessageType,
    pub show_help: bool,
    pub theme: Theme,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            progress: 0.0,
            percentage: 0.0,
            enabled: true,
            engine_state: EngineState::Stopped,
            session_state: SessionState::Active,
            gain: hearaid_audio::DEFAULT_GAIN,
            cutoff_hz: hearaid_audio::DEFAULT_CUTOFF_HZ,
            message: None,
            message_type: MessageType::Info,
            show_help: false,
            theme: Theme::default(),
        }
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mirror the engine and session state
    ///
    /// The meter falls back to zero whenever no audio is flowing.
    pub fn sync_engine(
        &mut self,
        enabled: bool,
        engine_state: EngineState,
        session_state: SessionState,
        gain: f32,
        cutoff_hz: f32,
    ) {
        self.enabled = enabled;
        self.engine_state = engine_state;
        self.session_state = session_state;
        self.gain = gain;
        self.cutoff_hz = cutoff_hz;

        if engine_state != EngineState::Running {
            self.progress = 0.0;
            self.percentage = 0.0;
        }
    }

    /// Text of the loudness label
    pub fn loudness_label(&self) -> String {
        format!("Loudness: {:.2}", self.percentage)
    }

    /// Caption of the on/off button
    pub fn toggle_label(&self) -> &'static str {
        if self.enabled {
            "Turn Off"
        } else {
            "Turn On"
        }
    }

    pub fn set_message(&mut self, msg: impl Into<String>) {
        self.message = Some(msg.into());
        self.message_type = MessageType::Info;
    }

    pub fn set_warning(&mut self, msg: impl Into<String>) {
        self.message = Some(msg.into());
        self.message_type = MessageType::Warning;
    }

    pub fn set_error(&mut self, msg: impl Into<String>) {
        self.message = Some(msg.into());
        self.message_type = MessageType::Error;
    }

    pub fn clear_message(&mut self) {
        self.message = None;
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }
}

impl LoudnessListener for AppState {
    fn on_loudness_update(&mut self, progress: f32, percentage: f32) {
        self.progress = progress.clamp(0.0, 1.0);
        self.percentage = percentage.clamp(0.0, 100.0);
    }
}

/// Application wrapper
#[derive(Debug, Default)]
pub struct App {
    pub state: AppState,
    pub should_quit: bool,
}

impl App {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }
}
