// Search bar component
//
// Shown while search has keyboard focus. The term itself lives in the view
// state and is applied as it is typed.

use crate::connection::Transport;
use crate::tui::app::App;
use ratatui::{
    layout::{Position, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthStr;

pub fn render<T: Transport>(f: &mut Frame, area: Rect, app: &App<T>) {
    let theme = &app.theme;
    let term = &app.viewer.tabs().view().search_term;

    let line = Line::from(vec![
        Span::styled(" / ", Style::default().fg(theme.highlight)),
        Span::styled(term.as_str(), Style::default().fg(theme.fg)),
    ]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(theme.border_type)
        .border_style(Style::default().fg(theme.highlight))
        .title(" Search ")
        .title_bottom(Line::from(" Enter/Esc close · Ctrl+U clear ").right_aligned());

    f.render_widget(Paragraph::new(line).block(block), area);

    // Cursor after the typed text (inside the border)
    let x = area.x + 1 + 3 + term.width() as u16;
    if x < area.right().saturating_sub(1) {
        f.set_cursor_position(Position::new(x, area.y + 1));
    }
}
