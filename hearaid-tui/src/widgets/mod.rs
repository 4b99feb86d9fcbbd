//! UI Widgets for HearAid

mod loudness;
pub mod status_bar;
mod toggle;

pub use loudness::LoudnessWidget;
pub use status_bar::{HelpWidget, StatusBarWidget};
pub use toggle::ToggleWidget;

#[cfg(test)]
pub(crate) fn buffer_text(buf: &ratatui::buffer::Buffer) -> String {
    buf.content().iter().map(|cell| cell.symbol()).collect()
}
