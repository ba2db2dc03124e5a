// Tab bar component
//
// One label per source in display order. The focused source is highlighted,
// sources with unseen lines carry a ● marker. Labels are laid out by a single
// function so painting and mouse hit testing always agree.

use crate::connection::Transport;
use crate::tui::app::App;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use unicode_width::UnicodeWidthStr;

const SEPARATOR: &str = "│";

/// A positioned tab label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabLabel {
    pub source: String,
    pub text: String,
    /// Column where the label starts
    pub x: u16,
    pub width: u16,
    pub focused: bool,
    pub unread: bool,
}

/// Lay out every tab label left to right, cutting off at the area's edge
pub fn labels<T: Transport>(app: &App<T>, area: Rect) -> Vec<TabLabel> {
    let tabs = app.viewer.tabs();
    let mut x = area.x;
    let mut out = Vec::with_capacity(tabs.sources().len());

    for (i, source) in tabs.sources().iter().enumerate() {
        let unread = tabs.is_unread(source);
        let text = match (i < 9, unread) {
            (true, true) => format!(" {} {} ● ", i + 1, source),
            (true, false) => format!(" {} {} ", i + 1, source),
            (false, true) => format!(" {} ● ", source),
            (false, false) => format!(" {} ", source),
        };
        let width = text.width() as u16;
        if x.saturating_add(width) > area.right() {
            break;
        }

        out.push(TabLabel {
            source: source.clone(),
            text,
            x,
            width,
            focused: i == tabs.focused_index(),
            unread,
        });
        x += width + SEPARATOR.width() as u16;
    }

    out
}

/// Source under `column`, if any
pub fn hit_test<T: Transport>(app: &App<T>, area: Rect, column: u16) -> Option<String> {
    labels(app, area)
        .into_iter()
        .find(|l| column >= l.x && column < l.x + l.width)
        .map(|l| l.source)
}

pub fn render<T: Transport>(f: &mut Frame, area: Rect, app: &App<T>) {
    let theme = &app.theme;
    let mut spans = Vec::new();

    for (i, label) in labels(app, area).into_iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(SEPARATOR, Style::default().fg(theme.border)));
        }
        let style = if label.focused {
            Style::default()
                .fg(theme.tab_active_fg)
                .bg(theme.tab_active)
                .add_modifier(Modifier::BOLD)
        } else if label.unread {
            Style::default().fg(theme.tab_unread)
        } else {
            Style::default().fg(theme.tab_inactive)
        };
        spans.push(Span::styled(label.text, style));
    }

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}
