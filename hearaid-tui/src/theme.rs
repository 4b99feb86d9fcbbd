//! Color themes for HearAid

use ratatui::style::{Color, Modifier, Style};

/// Theme configuration for the UI
#[derive(Debug, Clone)]
pub struct Theme {
    pub name: &'static str,
    /// Primary foreground color (text, borders)
    pub fg: Color,
    /// Dimmed foreground (secondary text)
    pub fg_dim: Color,
    /// Background color
    pub bg: Color,
    /// Highlight color (active elements)
    pub highlight: Color,
    /// Meter fill color
    pub accent: Color,
    /// Warning color
    pub warning: Color,
    /// Error/danger color
    pub danger: Color,
}

impl Theme {
    /// Get style for normal text
    pub fn normal(&self) -> Style {
        Style::default().fg(self.fg).bg(self.bg)
    }

    /// Get style for dimmed text
    pub fn dim(&self) -> Style {
        Style::default().fg(self.fg_dim).bg(self.bg)
    }

    /// Get style for highlighted items
    pub fn highlight(&self) -> Style {
        Style::default()
            .fg(self.bg)
            .bg(self.highlight)
            .add_modifier(Modifier::BOLD)
    }

    /// Get style for borders
    pub fn border(&self) -> Style {
        Style::default().fg(self.fg_dim)
    }

    /// Get title style
    pub fn title(&self) -> Style {
        Style::default()
            .fg(self.highlight)
            .add_modifier(Modifier::BOLD)
    }

    /// Get style for the meter fill based on level (0.0 - 1.0)
    pub fn meter_style(&self, level: f32) -> Style {
        let color = if level >= 1.0 {
            self.danger
        } else if level > 0.8 {
            self.warning
        } else {
            self.accent
        };
        Style::default().fg(color).bg(self.bg)
    }
}

/// Default theme: blue meter on warm orange
pub const HEARAID: Theme = Theme {
    name: "hearaid",
    fg: Color::Rgb(255, 245, 230),
    fg_dim: Color::Rgb(200, 150, 100),
    bg: Color::Rgb(60, 25, 0),
    highlight: Color::Rgb(255, 165, 0),
    accent: Color::Rgb(60, 120, 255),
    warning: Color::Rgb(255, 220, 80),
    danger: Color::Rgb(255, 80, 80),
};

/// Classic phosphor green CRT theme
pub const CRT_GREEN: Theme = Theme {
    name: "phosphor-green",
    fg: Color::Rgb(51, 255, 51),
    fg_dim: Color::Rgb(25, 128, 25),
    bg: Color::Rgb(0, 10, 0),
    highlight: Color::Rgb(180, 255, 180),
    accent: Color::Rgb(100, 255, 100),
    warning: Color::Rgb(255, 255, 100),
    danger: Color::Rgb(255, 100, 100),
};

impl Default for Theme {
    fn default() -> Self {
        HEARAID
    }
}

impl Theme {
    /// Look up a theme by name
    pub fn by_name(name: &str) -> Option<Theme> {
        match name {
            "hearaid" | "orange" => Some(HEARAID),
            "green" | "phosphor-green" => Some(CRT_GREEN),
            _ => None,
        }
    }
}
