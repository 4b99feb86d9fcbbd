//! On/off button

use crate::theme::Theme;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

/// Renders the hearing aid switch as a centered button
pub struct ToggleWidget<'a> {
    theme: &'a Theme,
    label: &'a str,
    enabled: bool,
}

impl<'a> ToggleWidget<'a> {
    pub fn new(theme: &'a Theme, label: &'a str, enabled: bool) -> Self {
        Self {
            theme,
            label,
            enabled,
        }
    }
}

impl Widget for ToggleWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let style = if self.enabled {
            self.theme.highlight()
        } else {
            self.theme.dim()
        };
        let line = Line::from(vec![
            Span::styled("[ ", self.theme.dim()),
            Span::styled(self.label, style),
            Span::styled(" ]", self.theme.dim()),
        ]);
        Paragraph::new(line)
            .alignment(Alignment::Center)
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widgets::buffer_text;

    #[test]
    fn test_renders_label() {
        let theme = Theme::default();
        let area = Rect::new(0, 0, 20, 1);
        let mut buf = Buffer::empty(area);

        ToggleWidget::new(&theme, "Turn On", false).render(area, &mut buf);
        assert!(buffer_text(&buf).contains("[ Turn On ]"));
    }
}
