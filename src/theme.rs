//! Colours for the panel

use ratatui::style::Color;

/// Theme colors for the UI
#[derive(Debug, Clone)]
pub struct Theme {
    pub accent: Color,      // Focused borders and buttons
    pub danger: Color,      // Errors
    pub success: Color,     // Healthy status
    pub warning: Color,     // Anything the backend reports that isn't ok/error
    pub text: Color,
    pub text_dim: Color,    // Labels, placeholders, disabled buttons
    pub inactive: Color,    // Unfocused borders
    pub header: Color,      // Section headings
}

impl Default for Theme {
    fn default() -> Self {
        // Catppuccin-inspired
        Self {
            accent: Color::Rgb(250, 179, 135),
            danger: Color::Rgb(243, 139, 168),
            success: Color::Rgb(166, 218, 149),
            warning: Color::Rgb(249, 226, 175),
            text: Color::Rgb(205, 214, 244),
            text_dim: Color::Rgb(147, 153, 178),
            inactive: Color::Rgb(88, 91, 112),
            header: Color::Rgb(137, 180, 250),
        }
    }
}

impl Theme {
    /// Colour for a health status: green for `ok`, red for `error`,
    /// yellow for anything else the backend reports
    pub fn status_color(&self, status: &str) -> Color {
        match status {
            "ok" => self.success,
            "error" => self.danger,
            _ => self.warning,
        }
    }
}
