//! Terminal UI for HearAid - loudness panel, toggle and status line

mod app;
mod theme;
pub mod widgets;

pub use app::{App, AppState, MessageType};
pub use theme::{Theme, CRT_GREEN, HEARAID};
pub use widgets::{HelpWidget, LoudnessWidget, StatusBarWidget, ToggleWidget};
