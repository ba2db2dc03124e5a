// Status bar component
//
// Renders connection state, the focused source's line count and the most
// recent warning from the viewer's own log at the bottom of the screen.

use crate::connection::Transport;
use crate::tui::app::App;
use crate::util::truncate_to_width;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Below this width only connection state and count are shown
const DETAIL_MIN_WIDTH: u16 = 60;

/// From this width the help hint fits as well
const HINT_MIN_WIDTH: u16 = 100;

/// Render the status bar
///
/// Adapts to terminal width: narrow terminals get connection state and count
/// only; wider ones add view flags, the latest problem and the help hint.
pub fn render<T: Transport>(f: &mut Frame, area: Rect, app: &App<T>) {
    let theme = &app.theme;
    let state = app.viewer.connection_state();
    let source = app.focused_source();
    let store = app.viewer.store();
    let view = app.viewer.tabs().view();

    let mut spans = vec![
        Span::styled(
            format!(" ● {}", state.label()),
            Style::default()
                .fg(theme.connection_color(state))
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(" │ {}/{} lines", store.len(source), store.max_lines()),
            Style::default().fg(theme.status_bar),
        ),
    ];

    if area.width >= DETAIL_MIN_WIDTH {
        let mut flags = Vec::new();
        if view.autoscroll {
            flags.push("auto");
        }
        if view.show_timestamps {
            flags.push("time");
        }
        if !flags.is_empty() {
            spans.push(Span::styled(
                format!(" │ {}", flags.join(" ")),
                Style::default().fg(theme.status_bar),
            ));
        }
        if !view.search_term.is_empty() {
            let matches = app.surface(source).map_or(0, |s| s.match_count());
            spans.push(Span::styled(
                format!(" │ /{} ({})", view.search_term, matches),
                Style::default().fg(theme.highlight),
            ));
        }

        if let Some(problem) = app.log_buffer.latest_problem() {
            let used: usize = spans.iter().map(|s| s.width()).sum();
            let room = (area.width as usize).saturating_sub(used + 18);
            if room > 10 {
                spans.push(Span::styled(
                    format!(
                        " │ {} {} {}",
                        problem.timestamp.with_timezone(&chrono::Local).format("%H:%M:%S"),
                        problem.level.as_str(),
                        truncate_to_width(&problem.message, room.saturating_sub(10))
                    ),
                    Style::default().fg(theme.log_level_color(problem.level)),
                ));
            }
        }

        if area.width >= HINT_MIN_WIDTH {
            spans.push(Span::styled(
                " │ ? help",
                Style::default().fg(theme.line_number),
            ));
        }
    }

    let status = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(Style::default().fg(theme.border)),
    );

    f.render_widget(status, area);
}
