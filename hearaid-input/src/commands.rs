//! Command definitions for HearAid

/// Gain change per key press
pub const GAIN_STEP: f32 = 0.5;
/// Cutoff change per key press (Hz)
pub const CUTOFF_STEP_HZ: f32 = 50.0;

/// Input modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Normal,
    Help,
}

/// Commands that can be dispatched from input
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Switch the hearing aid on or off
    ToggleHearingAid,
    /// Change the gain by a delta
    AdjustGain(f32),
    /// Change the high-pass cutoff by a delta in Hz
    AdjustCutoff(f32),
    /// Put the high-pass filter back to pass-everything
    ResetCutoff,
    ToggleHelp,
    Quit,
}
