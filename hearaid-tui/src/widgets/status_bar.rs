//! Status bar and help overlay

use crate::app::MessageType;
use crate::theme::Theme;
use hearaid_audio::{EngineState, SessionState};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
};

/// Engine/session state, parameters and the last message
pub struct StatusBarWidget<'a> {
    theme: &'a Theme,
    engine_state: EngineState,
    session_state: SessionState,
    gain: f32,
    cutoff_hz: f32,
    message: Option<&'a str>,
    message_type: MessageType,
}

impl<'a> StatusBarWidget<'a> {
    pub fn new(theme: &'a Theme, engine_state: EngineState, session_state: SessionState) -> Self {
        Self {
            theme,
            engine_state,
            session_state,
            gain: 0.0,
            cutoff_hz: 0.0,
            message: None,
            message_type: MessageType::Info,
        }
    }

    pub fn params(mut self, gain: f32, cutoff_hz: f32) -> Self {
        self.gain = gain;
        self.cutoff_hz = cutoff_hz;
        self
    }

    pub fn message(mut self, msg: Option<&'a str>, msg_type: MessageType) -> Self {
        self.message = msg;
        self.message_type = msg_type;
        self
    }

    fn state_style(&self) -> Style {
        match (self.engine_state, self.session_state) {
            (_, SessionState::Interrupted) => Style::from(self.theme.warning),
            (EngineState::Running, _) => self.theme.highlight(),
            _ => self.theme.dim(),
        }
    }

    fn params_text(&self) -> String {
        let cutoff = if self.cutoff_hz > 0.0 {
            format!("{:.0} Hz", self.cutoff_hz)
        } else {
            "off".to_string()
        };
        format!(" gain x{:.1} | HP {} ", self.gain, cutoff)
    }
}

impl Widget for StatusBarWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height < 1 {
            return;
        }

        let [state_area, params_area, message_area, hint_area] = Layout::horizontal([
            Constraint::Length(22),
            Constraint::Length(24),
            Constraint::Min(10),
            Constraint::Length(9),
        ])
        .areas(area);

        let state = format!(
            " {} / {} ",
            self.engine_state.display_name(),
            self.session_state.display_name()
        );
        Paragraph::new(Span::styled(state, self.state_style())).render(state_area, buf);
        Paragraph::new(Span::styled(self.params_text(), self.theme.normal())).render(params_area, buf);

        if let Some(msg) = self.message {
            let style = match self.message_type {
                MessageType::Info => self.theme.normal(),
                MessageType::Warning => Style::from(self.theme.warning),
                MessageType::Error => Style::from(self.theme.danger),
            };
            Paragraph::new(Span::styled(msg, style)).render(message_area, buf);
        }

        Paragraph::new(Span::styled(" ? help ", self.theme.dim())).render(hint_area, buf);
    }
}

/// Key reference overlay
pub struct HelpWidget<'a> {
    theme: &'a Theme,
}

impl<'a> HelpWidget<'a> {
    pub fn new(theme: &'a Theme) -> Self {
        Self { theme }
    }
}

const HELP_LINES: [(&str, &str); 7] = [
    ("space / t", "turn the hearing aid on or off"),
    ("+ / -", "gain up / down"),
    ("] / [", "high-pass cutoff up / down"),
    ("0", "high-pass off"),
    ("?", "close this help"),
    ("q / Esc", "quit"),
    ("Ctrl-C", "quit"),
];

impl Widget for HelpWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.border())
            .style(self.theme.normal())
            .title(Span::styled(" KEYS ", self.theme.title()));

        let lines: Vec<Line> = HELP_LINES
            .iter()
            .map(|(keys, action)| {
                Line::from(vec![
                    Span::styled(format!(" {:<10}", keys), self.theme.title()),
                    Span::styled(*action, self.theme.normal()),
                ])
            })
            .collect();

        Paragraph::new(lines).block(block).render(area, buf);
    }
}
