// Views module - screen-level rendering logic
//
// There is one screen: tabs on top, the focused source's log in the middle,
// status at the bottom. The search bar slides in under the tabs while a term
// is being edited or is still active.

use super::app::{App, ScreenLayout};
use crate::connection::Transport;
use crate::tui::components::{help, log_view, search_bar, status_bar, tab_bar};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::Style;
use ratatui::widgets::Block;
use ratatui::Frame;

/// Main UI render function - called on every frame
pub fn draw<T: Transport>(f: &mut Frame, app: &mut App<T>) {
    // A hidden source may have been invalidated; bring it current before painting
    app.refresh_focused();

    let bg_block = Block::default().style(Style::default().bg(app.theme.bg));
    f.render_widget(bg_block, f.area());

    let show_search = app.search_open || !app.viewer.tabs().view().search_term.is_empty();
    let mut constraints = vec![Constraint::Length(1)];
    if show_search {
        constraints.push(Constraint::Length(3));
    }
    constraints.push(Constraint::Min(3));
    constraints.push(Constraint::Length(2));

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(f.area());

    let (tabs, search, logs, status) = if show_search {
        (chunks[0], Some(chunks[1]), chunks[2], chunks[3])
    } else {
        (chunks[0], None, chunks[1], chunks[2])
    };

    tab_bar::render(f, tabs, app);
    if let Some(area) = search {
        search_bar::render(f, area, app);
    }
    log_view::render(f, logs, app);
    status_bar::render(f, status, app);

    app.layout = ScreenLayout { tabs, search, logs };

    if app.show_help {
        help::render(f, &app.theme);
    }

    // Toast goes over everything, help included
    if let Some(ref toast) = app.toast {
        toast.render(f, f.area(), &app.theme);
    }

    app.clear_expired_toast();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::testing::RecordingTransport;
    use crate::connection::ConnectionManager;
    use crate::events::{AppEvent, ConnectionEvent};
    use crate::logging::LogBuffer;
    use crate::viewer::Viewer;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use std::path::PathBuf;
    use std::time::Duration;

    fn app() -> App<RecordingTransport> {
        let sources: Vec<String> = ["vigil", "api"].iter().map(|s| s.to_string()).collect();
        let connection =
            ConnectionManager::new(RecordingTransport::default(), Duration::from_millis(2000));
        let viewer = Viewer::with_sources(&sources, 100, true, false, connection).unwrap();
        App::new(viewer, LogBuffer::new(), PathBuf::from("."))
    }

    fn screen(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let mut text = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                text.push_str(buffer[(x, y)].symbol());
            }
            text.push('\n');
        }
        text
    }

    #[test]
    fn paints_tabs_status_and_placeholder() {
        let mut app = app();
        let mut terminal = Terminal::new(TestBackend::new(100, 20)).unwrap();
        terminal.draw(|f| draw(f, &mut app)).unwrap();

        let text = screen(&terminal);
        assert!(text.contains("1 vigil"));
        assert!(text.contains("2 api"));
        assert!(text.contains("Loading history..."));
        assert!(text.contains("Disconnected"));
        assert!(app.layout.search.is_none());
        assert_eq!(app.layout.tabs.height, 1);
    }

    #[test]
    fn search_bar_takes_a_row_band_when_open() {
        let mut app = app();
        app.search_open = true;
        let mut terminal = Terminal::new(TestBackend::new(100, 20)).unwrap();
        terminal.draw(|f| draw(f, &mut app)).unwrap();

        let search = app.layout.search.expect("search area");
        assert_eq!(search.height, 3);
        assert_eq!(app.layout.logs.y, search.bottom());
        assert!(screen(&terminal).contains("Search"));
    }

    #[test]
    fn help_overlay_is_painted() {
        let mut app = app();
        app.show_help = true;
        let mut terminal = Terminal::new(TestBackend::new(100, 40)).unwrap();
        terminal.draw(|f| draw(f, &mut app)).unwrap();

        assert!(screen(&terminal).contains("Toggle timestamps"));
    }

    #[test]
    fn colored_live_line_paints_without_escapes() {
        let mut app = app();
        app.viewer.start();
        app.handle_event(AppEvent::Snapshot {
            source: "vigil".into(),
            outcome: Ok(Vec::new()),
        });
        app.handle_event(AppEvent::Connection {
            generation: 1,
            event: ConnectionEvent::Message(
                r#"{"process":"vigil","data":"\u001b[31mERROR\u001b[0m boom\n"}"#.into(),
            ),
        });
        assert_eq!(app.viewer.store().len("vigil"), 1);

        let mut terminal = Terminal::new(TestBackend::new(80, 10)).unwrap();
        terminal.draw(|f| draw(f, &mut app)).unwrap();

        let text = screen(&terminal);
        assert!(!text.contains('\x1b'));
        assert!(text.contains("1 ERROR boom"));
    }
}
