use ratatui::style::{Color, Modifier, Style};

#[derive(Debug, Clone)]
pub struct Theme {
    pub name: String,
    pub header_style: Style,
    pub footer_style: Style,
    pub input_style: Style,
    pub placeholder_style: Style,
    pub tab_style: Style,
    pub tab_selected_style: Style,
    pub row_style: Style,
    pub row_selected_style: Style,
    pub badge_style: Style,
    pub muted_style: Style,
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            name: "dark".to_string(),
            header_style: Style::default().fg(Color::Cyan),
            footer_style: Style::default().fg(Color::Cyan),
            input_style: Style::default().fg(Color::White),
            placeholder_style: Style::default().fg(Color::DarkGray),
            tab_style: Style::default().fg(Color::Gray),
            tab_selected_style: Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
            row_style: Style::default().fg(Color::Gray),
            row_selected_style: Style::default().bg(Color::DarkGray).fg(Color::White),
            badge_style: Style::default().fg(Color::LightCyan),
            muted_style: Style::default().fg(Color::DarkGray),
        }
    }

    pub fn light() -> Self {
        Self {
            name: "light".to_string(),
            header_style: Style::default().fg(Color::Blue),
            footer_style: Style::default().fg(Color::Blue),
            input_style: Style::default().fg(Color::Black),
            placeholder_style: Style::default().fg(Color::Gray),
            tab_style: Style::default().fg(Color::DarkGray),
            tab_selected_style: Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
            row_style: Style::default().fg(Color::DarkGray),
            row_selected_style: Style::default().bg(Color::Gray).fg(Color::Black),
            badge_style: Style::default().fg(Color::Magenta),
            muted_style: Style::default().fg(Color::Gray),
        }
    }

    /// Unknown names fall back to the dark theme.
    pub fn by_name(name: &str) -> Self {
        match name {
            "light" => Self::light(),
            _ => Self::dark(),
        }
    }
}
