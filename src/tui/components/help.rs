// Help overlay - keyboard and mouse reference

use crate::tui::theme::Theme;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

/// Center a fixed-size rect inside `area`, clamped to fit
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}

pub fn render(f: &mut Frame, theme: &Theme) {
    let key_style = Style::default().fg(theme.tab_active);
    let desc_style = Style::default().fg(theme.fg);
    let header_style = Style::default()
        .fg(theme.highlight)
        .add_modifier(Modifier::BOLD);

    let kb = |key: &str, desc: &str| -> Line {
        Line::from(vec![
            Span::raw("    "),
            Span::styled(format!("{:<14}", key), key_style),
            Span::styled(desc.to_string(), desc_style),
        ])
    };

    let content = Text::from(vec![
        Line::raw(""),
        Line::from(Span::styled("  Sources", header_style)),
        kb("1-9", "Focus source by position"),
        kb("Tab/Shift+Tab", "Next / previous source"),
        kb("Ctrl+K", "Clear focused source"),
        kb("Ctrl+E", "Export focused source"),
        Line::raw(""),
        Line::from(Span::styled("  View", header_style)),
        kb("Ctrl+F, /", "Search (all sources)"),
        kb("Ctrl+U", "Clear search term"),
        kb("Ctrl+B", "Toggle timestamps"),
        kb("Ctrl+A", "Toggle autoscroll"),
        Line::raw(""),
        Line::from(Span::styled("  Navigation", header_style)),
        kb("↑/↓, j/k", "Scroll one line"),
        kb("PgUp/PgDn", "Scroll one page"),
        kb("Home/End", "Jump to start / end"),
        kb("Wheel", "Scroll log view"),
        kb("Click", "Focus tab"),
        Line::raw(""),
        Line::from(Span::styled("  General", header_style)),
        kb("Ctrl+R", "Reconnect now"),
        kb("?", "Toggle this help"),
        kb("q, Ctrl+C", "Quit"),
    ]);

    let area = centered_rect(50, 28, f.area());
    f.render_widget(Clear, area);

    let paragraph = Paragraph::new(content)
        .style(Style::default().bg(theme.bg))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.highlight))
                .border_type(theme.border_type)
                .title(" Help ")
                .title_bottom(Line::from(" Press any key to close ").centered()),
        );

    f.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centered_rect_clamps_to_area() {
        let area = Rect::new(0, 0, 40, 20);
        assert_eq!(centered_rect(50, 28, area), Rect::new(0, 0, 40, 20));
        assert_eq!(centered_rect(10, 4, area), Rect::new(15, 8, 10, 4));
    }
}
