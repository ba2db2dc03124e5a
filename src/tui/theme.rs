// Color palette for the TUI
//
// One fixed dark palette. Colors are grouped by the element they paint so
// components never pick raw colors themselves.

use crate::connection::ConnectionState;
use crate::logging::LogLevel;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::BorderType;

#[derive(Debug, Clone)]
pub struct Theme {
    // Base colors
    pub bg: Color,
    pub fg: Color,
    pub border: Color,
    pub border_focused: Color,
    pub border_type: BorderType,

    // Tabs
    pub tab_active: Color,
    pub tab_active_fg: Color,
    pub tab_inactive: Color,
    pub tab_unread: Color,

    // Log surface
    pub line_number: Color,
    pub timestamp: Color,
    pub match_fg: Color,
    pub match_bg: Color,

    // Status and overlays
    pub status_bar: Color,
    pub connected: Color,
    pub connecting: Color,
    pub disconnected: Color,
    pub log_warn: Color,
    pub log_error: Color,
    pub highlight: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            bg: Color::Reset,
            fg: Color::White,
            border: Color::Gray,
            border_focused: Color::Cyan,
            border_type: BorderType::Rounded,

            tab_active: Color::Cyan,
            tab_active_fg: Color::Black,
            tab_inactive: Color::Gray,
            tab_unread: Color::Yellow,

            line_number: Color::DarkGray,
            timestamp: Color::Blue,
            match_fg: Color::Black,
            match_bg: Color::Yellow,

            status_bar: Color::Gray,
            connected: Color::Green,
            connecting: Color::Yellow,
            disconnected: Color::Red,
            log_warn: Color::Yellow,
            log_error: Color::Red,
            highlight: Color::Cyan,
        }
    }
}

impl Theme {
    /// Style for the matched part of a search hit
    pub fn match_style(&self) -> Style {
        Style::default()
            .fg(self.match_fg)
            .bg(self.match_bg)
            .add_modifier(Modifier::BOLD)
    }

    pub fn connection_color(&self, state: ConnectionState) -> Color {
        match state {
            ConnectionState::Connected => self.connected,
            ConnectionState::Connecting => self.connecting,
            ConnectionState::Disconnected => self.disconnected,
        }
    }

    pub fn log_level_color(&self, level: LogLevel) -> Color {
        match level {
            LogLevel::Error => self.log_error,
            LogLevel::Warn => self.log_warn,
            _ => self.status_bar,
        }
    }
}
