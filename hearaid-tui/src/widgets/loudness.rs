//! Loudness panel - label above a horizontal meter

use crate::theme::Theme;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Rect},
    text::Span,
    widgets::{Block, Borders, Paragraph, Widget},
};

/// Shows the loudness label and a bar filled to `progress`
pub struct LoudnessWidget<'a> {
    theme: &'a Theme,
    progress: f32,
    label: String,
}

impl<'a> LoudnessWidget<'a> {
    pub fn new(theme: &'a Theme, progress: f32, label: String) -> Self {
        Self {
            theme,
            progress: progress.clamp(0.0, 1.0),
            label,
        }
    }
}

impl Widget for LoudnessWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.border())
            .style(self.theme.normal())
            .title(Span::styled(" HEARAID ", self.theme.title()));

        let inner = block.inner(area);
        block.render(area, buf);

        if inner.width < 4 || inner.height < 2 {
            return;
        }

        let [label_area, _, meter_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .areas(inner);

        Paragraph::new(self.label)
            .style(self.theme.normal())
            .alignment(Alignment::Center)
            .render(label_area, buf);

        let width = meter_area.width as usize;
        let filled = (self.progress * width as f32).round() as usize;
        let meter_style = self.theme.meter_style(self.progress);
        for i in 0..width {
            let x = meter_area.x + i as u16;
            if let Some(cell) = buf.cell_mut((x, meter_area.y)) {
                if i < filled {
                    cell.set_symbol("█").set_style(meter_style);
                } else {
                    cell.set_symbol("░").set_style(self.theme.dim());
                }
            }
        }
    }
}
