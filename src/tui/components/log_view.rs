//! Log view component
//!
//! Paints the visible window of the focused source's surface. Rows already
//! carry their number, timestamp and highlight segments; this only maps them
//! to styled spans. Lines are never wrapped, so one row is one terminal line
//! and the scroll math stays exact.

use super::scrollbar::render_scrollbar;
use crate::connection::Transport;
use crate::render::Row;
use crate::tui::app::App;
use crate::tui::theme::Theme;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

pub fn render<T: Transport>(f: &mut Frame, area: Rect, app: &mut App<T>) {
    let viewport = area.height.saturating_sub(2) as usize;
    if let Some(surface) = app.focused_surface_mut() {
        let total = surface.rows().len();
        surface.scroll.update_dimensions(total, viewport);
    }

    let source = app.focused_source();
    let Some(surface) = app.surface(source) else {
        return;
    };
    let theme = &app.theme;
    let view = app.viewer.tabs().view();

    let (start, end) = surface.scroll.visible_range();
    let number_width = surface.rows().len().to_string().len().max(3);
    let mut lines: Vec<Line> = surface.rows()[start..end]
        .iter()
        .map(|row| row_line(row, number_width, theme))
        .collect();

    if lines.is_empty() {
        let placeholder = if app.viewer.tabs().is_initial_load_complete(source) {
            " Waiting for output..."
        } else {
            " Loading history..."
        };
        lines.push(Line::styled(
            placeholder,
            Style::default()
                .fg(theme.line_number)
                .add_modifier(Modifier::ITALIC),
        ));
    }

    let mode = if !surface.scroll.is_near_bottom(0) {
        " [scroll] "
    } else if view.autoscroll {
        ""
    } else {
        " [paused] "
    };
    let title = format!(" {} ({}){}", source, surface.rows().len(), mode);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(theme.border_type)
        .border_style(Style::default().fg(theme.border_focused))
        .title(title);

    f.render_widget(Paragraph::new(lines).block(block), area);
    render_scrollbar(f, area, &surface.scroll);
}

fn row_line<'a>(row: &'a Row, number_width: usize, theme: &Theme) -> Line<'a> {
    let mut spans = Vec::with_capacity(row.segments.len() + 2);
    spans.push(Span::styled(
        format!("{:>width$} ", row.number, width = number_width),
        Style::default().fg(theme.line_number),
    ));
    if let Some(ts) = &row.timestamp {
        spans.push(Span::styled(
            format!("{} ", ts),
            Style::default().fg(theme.timestamp),
        ));
    }
    for segment in &row.segments {
        let style = if segment.matched {
            theme.match_style()
        } else {
            Style::default().fg(theme.fg)
        };
        spans.push(Span::styled(segment.text.as_str(), style));
    }
    Line::from(spans)
}
