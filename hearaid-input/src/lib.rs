//! Keyboard input handling for HearAid

mod commands;
mod modal;

pub use commands::{Command, Mode, CUTOFF_STEP_HZ, GAIN_STEP};
pub use modal::InputHandler;
