//! HearAid - terminal hearing aid
//!
//! Plays the microphone through the earphones with a high-pass filter and
//! gain, and shows the output loudness.

use std::io::{self, stdout};
use std::thread;
use std::time::{Duration, Instant};

use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout, Rect},
    Terminal,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use hearaid_audio::{
    AudioEngineController, CpalDevice, HearingAidConfig, SessionEventHandler, SessionState,
    DEFAULT_CUTOFF_HZ,
};
use hearaid_input::{Command, InputHandler};
use hearaid_tui::{App, HelpWidget, LoudnessWidget, StatusBarWidget, Theme, ToggleWidget};

/// Frame rate for UI updates
const FPS: u64 = 30;

/// How often the backend is asked to look for device changes
const ROUTE_POLL_INTERVAL: Duration = Duration::from_millis(500);

type Controller = AudioEngineController<CpalDevice>;

fn main() -> anyhow::Result<()> {
    // Logs go to stderr; the alternate screen keeps them off the UI
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let config = HearingAidConfig::default();
    let device = CpalDevice::with_latency(config.ring_latency_ms);
    info!(host = device.host_name(), "Starting HearAid");
    let mut controller = AudioEngineController::new(device, config);

    // Without a configured session there is nothing to show
    controller.configure()?;

    // Initialize terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run_app(&mut terminal, &mut controller);

    // Cleanup
    controller.shutdown();
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    controller: &mut Controller,
) -> anyhow::Result<()> {
    let mut app = App::new();
    let mut input_handler = InputHandler::new();
    let mut session = SessionEventHandler::new();

    if let Some(theme) = std::env::var("HEARAID_THEME")
        .ok()
        .and_then(|name| Theme::by_name(&name))
    {
        app.state.theme = theme;
    }

    if controller.is_enabled() {
        match controller.start() {
            Ok(()) => app.state.set_message("Hearing aid on | Press ? for help"),
            Err(e) => app.state.set_error(format!("Could not start audio: {}", e)),
        }
    } else {
        app.state.set_message("Hearing aid off | Press space to turn on");
    }

    let frame_duration = Duration::from_millis(1000 / FPS);
    let mut last_frame = Instant::now();
    let mut last_route_poll = Instant::now();

    loop {
        if app.should_quit {
            break;
        }

        // Loudness readings from the audio thread
        controller.dispatch_readings(&mut app.state);

        if last_route_poll.elapsed() >= ROUTE_POLL_INTERVAL {
            controller.refresh_route();
            last_route_poll = Instant::now();
        }

        // Interruptions and route changes
        while let Some(device_event) = controller.poll_event() {
            let was_interrupted = session.state() == SessionState::Interrupted;
            match session.handle_event(device_event, controller) {
                Err(e) => {
                    warn!("Recovery failed: {}", e);
                    app.state.set_error(format!("Audio recovery failed: {}", e));
                }
                Ok(()) if !was_interrupted && session.state() == SessionState::Interrupted => {
                    app.state.set_warning("Audio interrupted by another application");
                }
                Ok(()) if was_interrupted && session.state() == SessionState::Active => {
                    app.state.set_message("Audio session restored");
                }
                Ok(()) => {}
            }
        }

        app.state.sync_engine(
            controller.is_enabled(),
            controller.state(),
            session.state(),
            controller.gain(),
            controller.cutoff_hz(),
        );

        // Render
        terminal.draw(|frame| {
            render_ui(frame, &app);
        })?;

        // Handle input
        let timeout = frame_duration.saturating_sub(last_frame.elapsed());
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if let Some(cmd) = input_handler.handle_key(key) {
                    handle_command(&mut app, controller, &mut session, cmd);
                }
            }
        }

        // Maintain frame rate
        let elapsed = last_frame.elapsed();
        if elapsed < frame_duration {
            thread::sleep(frame_duration - elapsed);
        }
        last_frame = Instant::now();
    }

    Ok(())
}

fn handle_command(
    app: &mut App,
    controller: &mut Controller,
    session: &mut SessionEventHandler,
    cmd: Command,
) {
    match cmd {
        Command::ToggleHearingAid => {
            let result = controller.toggle_hearing_aid();
            session.on_user_toggle(controller);
            match result {
                Ok(()) if controller.is_enabled() => app.state.set_message("Hearing aid on"),
                Ok(()) => app.state.set_message("Hearing aid off"),
                Err(e) => app.state.set_error(format!("Could not start audio: {}", e)),
            }
        }
        Command::AdjustGain(delta) => {
            controller.set_gain(controller.gain() + delta);
            app.state.set_message(format!("Gain x{:.1}", controller.gain()));
        }
        Command::AdjustCutoff(delta) => {
            controller.set_cutoff(controller.cutoff_hz() + delta);
            let cutoff = controller.cutoff_hz();
            if cutoff > 0.0 {
                app.state.set_message(format!("High-pass at {:.0} Hz", cutoff));
            } else {
                app.state.set_message("High-pass off");
            }
        }
        Command::ResetCutoff => {
            controller.set_cutoff(DEFAULT_CUTOFF_HZ);
            app.state.set_message("High-pass off");
        }
        Command::ToggleHelp => app.state.toggle_help(),
        Command::Quit => app.quit(),
    }
}

fn render_ui(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let state = &app.state;
    let theme = &state.theme;

    // Clear with background
    let block = ratatui::widgets::Block::default().style(theme.normal());
    frame.render_widget(block, area);

    let [meter_area, toggle_area, _, status_area] = Layout::vertical([
        Constraint::Length(6), // Loudness panel
        Constraint::Length(1), // Toggle
        Constraint::Min(0),
        Constraint::Length(1), // Status bar
    ])
    .areas(area);

    let loudness = LoudnessWidget::new(theme, state.progress, state.loudness_label());
    frame.render_widget(loudness, meter_area);

    let toggle = ToggleWidget::new(theme, state.toggle_label(), state.enabled);
    frame.render_widget(toggle, toggle_area);

    let status = StatusBarWidget::new(theme, state.engine_state, state.session_state)
        .params(state.gain, state.cutoff_hz)
        .message(state.message.as_deref(), state.message_type);
    frame.render_widget(status, status_area);

    if state.show_help {
        let help_area = centered_rect(50, 9, area);
        frame.render_widget(HelpWidget::new(theme), help_area);
    }
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}
