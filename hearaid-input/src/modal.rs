//! Key handling

use crate::commands::{Command, Mode, CUTOFF_STEP_HZ, GAIN_STEP};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Maps key events to commands
#[derive(Debug, Default)]
pub struct InputHandler {
    mode: Mode,
}

impl InputHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get current mode
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Handle a key event and return a command if applicable
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Command> {
        // Windows reports both press and release
        if key.kind == KeyEventKind::Release {
            return None;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Some(Command::Quit);
        }

        match self.mode {
            Mode::Normal => self.handle_normal_mode(key),
            Mode::Help => self.handle_help_mode(key),
        }
    }

    fn handle_normal_mode(&mut self, key: KeyEvent) -> Option<Command> {
        match key.code {
            KeyCode::Char(' ') | KeyCode::Char('t') | KeyCode::Enter => {
                Some(Command::ToggleHearingAid)
            }
            KeyCode::Char('+') | KeyCode::Char('=') | KeyCode::Up => {
                Some(Command::AdjustGain(GAIN_STEP))
            }
            KeyCode::Char('-') | KeyCode::Down => Some(Command::AdjustGain(-GAIN_STEP)),
            KeyCode::Char(']') | KeyCode::Right => Some(Command::AdjustCutoff(CUTOFF_STEP_HZ)),
            KeyCode::Char('[') | KeyCode::Left => Some(Command::AdjustCutoff(-CUTOFF_STEP_HZ)),
            KeyCode::Char('0') => Some(Command::ResetCutoff),
            KeyCode::Char('?') => {
                self.mode = Mode::Help;
                Some(Command::ToggleHelp)
            }
            KeyCode::Char('q') | KeyCode::Esc => Some(Command::Quit),
            _ => None,
        }
    }

    fn handle_help_mode(&mut self, key: KeyEvent) -> Option<Command> {
        match key.code {
            KeyCode::Char('?') | KeyCode::Esc | KeyCode::Char('q') => {
                self.mode = Mode::Normal;
                Some(Command::ToggleHelp)
            }
            _ => None,
        }
    }
}
