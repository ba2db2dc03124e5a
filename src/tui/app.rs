// TUI application state
//
// `App` is the application root: it owns the viewer (store, tabs, connection)
// plus one painted `Surface` per source, and turns input and feed events into
// state changes. Painting itself lives in `views` and `components`.

use super::components::Toast;
use super::theme::Theme;
use crate::connection::Transport;
use crate::events::AppEvent;
use crate::logging::LogBuffer;
use crate::render::{self, Surface};
use crate::snapshot::SnapshotLoader;
use crate::store::ProcessBufferStore;
use crate::tabs::{key_action, Action, ScrollRestore};
use crate::viewer::{Ingested, Viewer};
use anyhow::{Context, Result};
use chrono::Local;
use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::layout::{Position, Rect};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

/// Rows moved per mouse wheel notch
const WHEEL_STEP: usize = 3;

/// Screen regions from the last paint, used for mouse hit testing
#[derive(Debug, Default, Clone, Copy)]
pub struct ScreenLayout {
    pub tabs: Rect,
    pub search: Option<Rect>,
    pub logs: Rect,
}

/// Main application state for the TUI
pub struct App<T: Transport> {
    pub viewer: Viewer<T>,

    /// Painted state per source
    surfaces: HashMap<String, Surface>,

    /// Whether the search bar has keyboard focus
    pub search_open: bool,

    pub show_help: bool,

    pub should_quit: bool,

    /// Active toast notification (auto-dismisses)
    pub toast: Option<Toast>,

    /// Captured tracing output, for the status bar
    pub log_buffer: LogBuffer,

    pub theme: Theme,

    pub layout: ScreenLayout,

    export_dir: PathBuf,
}

impl<T: Transport> App<T> {
    pub fn new(viewer: Viewer<T>, log_buffer: LogBuffer, export_dir: PathBuf) -> Self {
        let surfaces = viewer
            .tabs()
            .sources()
            .iter()
            .map(|s| (s.clone(), Surface::default()))
            .collect();

        Self {
            viewer,
            surfaces,
            search_open: false,
            show_help: false,
            should_quit: false,
            toast: None,
            log_buffer,
            theme: Theme::default(),
            layout: ScreenLayout::default(),
            export_dir,
        }
    }

    /// Open the live channel and kick off every backfill
    pub fn start(&mut self, loader: &SnapshotLoader, events: mpsc::Sender<AppEvent>) {
        self.viewer.start();
        loader.spawn_all(self.viewer.tabs().sources(), events);
    }

    pub fn focused_source(&self) -> &str {
        self.viewer.tabs().focused_source()
    }

    pub fn surface(&self, source: &str) -> Option<&Surface> {
        self.surfaces.get(source)
    }

    pub fn focused_surface_mut(&mut self) -> Option<&mut Surface> {
        let source = self.viewer.tabs().focused_source();
        self.surfaces.get_mut(source)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Event dispatch
    // ─────────────────────────────────────────────────────────────────────

    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Input(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                self.handle_key(key)
            }
            AppEvent::Input(Event::Mouse(mouse)) => self.handle_mouse(mouse),
            // Resize and focus changes only need the redraw that follows
            AppEvent::Input(_) => {}
            AppEvent::Connection { generation, event } => {
                let ingested = self.viewer.handle_connection(generation, event);
                self.apply_ingested(&ingested);
            }
            AppEvent::ReconnectDue { generation } => self.viewer.handle_reconnect_due(generation),
            AppEvent::Snapshot { source, outcome } => {
                let ingested = self.viewer.handle_snapshot(&source, outcome);
                self.apply_ingested(&ingested);
            }
        }
    }

    fn apply_ingested(&mut self, ingested: &[Ingested]) {
        let tabs = self.viewer.tabs();
        for change in ingested {
            let (Some(surface), Some(entries)) = (
                self.surfaces.get_mut(&change.source),
                self.viewer.store().snapshot(&change.source),
            ) else {
                continue;
            };
            let focused = change.source == tabs.focused_source();
            render::apply_ingest(
                surface,
                entries,
                tabs.view(),
                change.appended,
                change.evicted,
                focused,
            );
        }
    }

    /// Rebuild the focused surface if something invalidated it while hidden
    pub fn refresh_focused(&mut self) {
        let source = self.viewer.tabs().focused_source();
        let (Some(surface), Some(entries)) = (
            self.surfaces.get_mut(source),
            self.viewer.store().snapshot(source),
        ) else {
            return;
        };
        if surface.is_stale() {
            render::rebuild(surface, entries, self.viewer.tabs().view());
        }
    }

    /// View settings changed: redraw the focused source, defer the rest
    fn invalidate_all(&mut self) {
        let focused = self.viewer.tabs().focused_source().to_string();
        for (source, surface) in self.surfaces.iter_mut() {
            if *source != focused {
                surface.mark_stale();
            }
        }
        if let (Some(surface), Some(entries)) = (
            self.surfaces.get_mut(&focused),
            self.viewer.store().snapshot(&focused),
        ) {
            render::rebuild(surface, entries, self.viewer.tabs().view());
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Keyboard
    // ─────────────────────────────────────────────────────────────────────

    fn handle_key(&mut self, key: KeyEvent) {
        if self.show_help {
            // Any key closes help; only quit keys fall through
            self.show_help = false;
            if key_action(&key) != Some(Action::Quit) {
                return;
            }
        }

        if self.search_open && self.handle_search_key(&key) {
            return;
        }

        if let Some(action) = key_action(&key) {
            self.perform(action);
        }
    }

    /// Keys consumed by the open search bar
    fn handle_search_key(&mut self, key: &KeyEvent) -> bool {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc | KeyCode::Enter => {
                self.search_open = false;
                true
            }
            KeyCode::Char('u') if ctrl => {
                self.set_search_term(String::new());
                true
            }
            KeyCode::Backspace => {
                let mut term = self.viewer.tabs().view().search_term.clone();
                term.pop();
                self.set_search_term(term);
                true
            }
            KeyCode::Char(c) if !ctrl && !key.modifiers.contains(KeyModifiers::ALT) => {
                let mut term = self.viewer.tabs().view().search_term.clone();
                term.push(c);
                self.set_search_term(term);
                true
            }
            _ => false,
        }
    }

    fn set_search_term(&mut self, term: String) {
        if self.viewer.tabs_mut().set_search_term(&term) {
            self.invalidate_all();
        }
    }

    pub fn perform(&mut self, action: Action) {
        match action {
            Action::FocusIndex(position) => {
                if let Some(source) = self.viewer.tabs().source_at(position).map(str::to_string) {
                    self.focus(&source);
                }
            }
            Action::NextTab => {
                let source = self.viewer.tabs().next_source().to_string();
                self.focus(&source);
            }
            Action::PrevTab => {
                let source = self.viewer.tabs().prev_source().to_string();
                self.focus(&source);
            }
            Action::ClearFocused => self.clear_focused(),
            Action::OpenSearch => self.search_open = true,
            Action::ToggleTimestamps => {
                let on = self.viewer.tabs_mut().toggle_timestamps();
                tracing::debug!("Timestamps {}", if on { "on" } else { "off" });
                self.invalidate_all();
            }
            Action::ToggleAutoscroll => {
                let on = self.viewer.tabs_mut().toggle_autoscroll();
                if on {
                    if let Some(surface) = self.focused_surface_mut() {
                        surface.scroll.pin_to_bottom();
                    }
                }
                self.toast = Some(Toast::new(if on {
                    "Autoscroll on"
                } else {
                    "Autoscroll off"
                }));
            }
            Action::Export => self.export_focused(),
            Action::Reconnect => {
                self.viewer.reconnect_now();
                self.toast = Some(Toast::new("Reconnecting..."));
            }
            Action::ScrollUp => self.scroll_focused(|s| s.scroll_up(1)),
            Action::ScrollDown => self.scroll_focused(|s| s.scroll_down(1)),
            Action::PageUp => self.scroll_focused(|s| s.page_up()),
            Action::PageDown => self.scroll_focused(|s| s.page_down()),
            Action::ScrollTop => self.scroll_focused(|s| s.scroll_to_top()),
            Action::ScrollBottom => self.scroll_focused(|s| s.pin_to_bottom()),
            Action::Help => self.show_help = true,
            Action::Quit => self.should_quit = true,
        }
    }

    fn scroll_focused(&mut self, f: impl FnOnce(&mut render::ScrollState)) {
        if let Some(surface) = self.focused_surface_mut() {
            f(&mut surface.scroll);
        }
    }

    /// Switch tabs: save the outgoing offset, rebuild, then restore
    ///
    /// The restore is applied after the rebuild, so a remembered offset takes
    /// precedence over the bottom pin an active search would otherwise apply.
    pub fn focus(&mut self, source: &str) {
        let live_offset = self
            .surface(self.focused_source())
            .map_or(0, |s| s.scroll.offset());

        let Some(restore) = self.viewer.focus(source, live_offset) else {
            return;
        };

        let (Some(surface), Some(entries)) = (
            self.surfaces.get_mut(source),
            self.viewer.store().snapshot(source),
        ) else {
            return;
        };
        render::rebuild(surface, entries, self.viewer.tabs().view());
        match restore {
            ScrollRestore::Bottom => surface.scroll.pin_to_bottom(),
            ScrollRestore::Offset(offset) => surface.scroll.set_offset(offset),
        }
    }

    fn clear_focused(&mut self) {
        let source = self.focused_source().to_string();
        if let Err(e) = self.viewer.clear(&source) {
            tracing::debug!("Clear ignored: {}", e);
            return;
        }
        if let (Some(surface), Some(entries)) = (
            self.surfaces.get_mut(&source),
            self.viewer.store().snapshot(&source),
        ) {
            render::rebuild(surface, entries, self.viewer.tabs().view());
            surface.scroll.scroll_to_top();
        }
    }

    fn export_focused(&mut self) {
        let source = self.focused_source().to_string();
        match export_source(self.viewer.store(), &source, &self.export_dir) {
            Ok(path) => {
                tracing::info!("Exported {} to {}", source, path.display());
                self.toast = Some(Toast::new(format!("Saved {}", path.display())));
            }
            Err(e) => {
                tracing::warn!("Export failed: {:#}", e);
                self.toast = Some(Toast::new("Export failed"));
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Mouse
    // ─────────────────────────────────────────────────────────────────────

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        let position = Position::new(mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if self.search_open
                    && !self.layout.search.is_some_and(|area| area.contains(position))
                {
                    self.search_open = false;
                }
                if self.layout.tabs.contains(position) {
                    let clicked = super::components::tab_bar::hit_test(
                        self,
                        self.layout.tabs,
                        mouse.column,
                    );
                    if let Some(source) = clicked {
                        self.focus(&source);
                    }
                }
            }
            MouseEventKind::ScrollUp if self.layout.logs.contains(position) => {
                self.scroll_focused(|s| s.scroll_up(WHEEL_STEP))
            }
            MouseEventKind::ScrollDown if self.layout.logs.contains(position) => {
                self.scroll_focused(|s| s.scroll_down(WHEEL_STEP))
            }
            _ => {}
        }
    }

    /// Clear expired toast (call after render)
    pub fn clear_expired_toast(&mut self) {
        if self.toast.as_ref().is_some_and(|t| t.is_expired()) {
            self.toast = None;
        }
    }
}

/// Write a source's buffered lines to `{dir}/{source}-{YYYYMMDD-HHMMSS}.log`
pub fn export_source(store: &ProcessBufferStore, source: &str, dir: &Path) -> Result<PathBuf> {
    let text = store
        .export_text(source)
        .with_context(|| format!("Unknown source '{}'", source))?;

    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create export directory {}", dir.display()))?;

    let name = format!("{}-{}.log", source, Local::now().format("%Y%m%d-%H%M%S"));
    let path = dir.join(name);
    std::fs::write(&path, text).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::testing::RecordingTransport;
    use crate::connection::ConnectionManager;
    use crate::events::ConnectionEvent;
    use std::time::Duration;

    fn app() -> App<RecordingTransport> {
        let sources: Vec<String> = ["vigil", "api", "db"].iter().map(|s| s.to_string()).collect();
        let connection = ConnectionManager::new(
            RecordingTransport::default(),
            Duration::from_millis(2000),
        );
        let mut viewer = Viewer::with_sources(&sources, 100, true, false, connection).unwrap();
        viewer.start();
        let mut app = App::new(viewer, LogBuffer::new(), PathBuf::from("."));
        for source in sources {
            app.handle_event(AppEvent::Snapshot {
                source,
                outcome: Ok(Vec::new()),
            });
        }
        app.handle_event(AppEvent::Connection {
            generation: 1,
            event: ConnectionEvent::Opened,
        });
        app
    }

    fn line(app: &mut App<RecordingTransport>, source: &str, data: &str) {
        app.handle_event(AppEvent::Connection {
            generation: 1,
            event: ConnectionEvent::Message(
                serde_json::json!({ "process": source, "data": data }).to_string(),
            ),
        });
    }

    fn press(app: &mut App<RecordingTransport>, code: KeyCode, modifiers: KeyModifiers) {
        app.handle_event(AppEvent::Input(Event::Key(KeyEvent::new(code, modifiers))));
    }

    fn type_text(app: &mut App<RecordingTransport>, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c), KeyModifiers::NONE);
        }
    }

    #[test]
    fn test_focused_lines_append_incrementally() {
        let mut app = app();
        line(&mut app, "vigil", "started\n");
        line(&mut app, "vigil", "ready\n");

        let surface = app.surface("vigil").unwrap();
        assert_eq!(surface.rows().len(), 2);
        assert_eq!(surface.rows()[1].number, 2);
    }

    #[test]
    fn test_digit_focuses_and_clears_unread() {
        let mut app = app();
        line(&mut app, "db", "checkpoint\n");
        assert!(app.viewer.tabs().is_unread("db"));

        press(&mut app, KeyCode::Char('3'), KeyModifiers::NONE);
        assert_eq!(app.focused_source(), "db");
        assert!(!app.viewer.tabs().is_unread("db"));
        assert_eq!(app.surface("db").unwrap().rows().len(), 1);

        // Out of range digit is ignored
        press(&mut app, KeyCode::Char('9'), KeyModifiers::NONE);
        assert_eq!(app.focused_source(), "db");
    }

    #[test]
    fn test_search_typing_rebuilds_focused_and_defers_others() {
        let mut app = app();
        line(&mut app, "vigil", "Error: boom\n");
        line(&mut app, "api", "error again\n");

        press(&mut app, KeyCode::Char('f'), KeyModifiers::CONTROL);
        assert!(app.search_open);
        type_text(&mut app, "err");

        assert_eq!(app.viewer.tabs().view().search_term, "err");
        assert_eq!(app.surface("vigil").unwrap().match_count(), 1);
        assert!(app.surface("api").unwrap().is_stale());

        // Enter closes the bar but keeps the term
        press(&mut app, KeyCode::Enter, KeyModifiers::NONE);
        assert!(!app.search_open);
        assert_eq!(app.viewer.tabs().view().search_term, "err");

        // Switching tabs rebuilds the stale surface with highlighting
        press(&mut app, KeyCode::Tab, KeyModifiers::NONE);
        let api = app.surface("api").unwrap();
        assert!(!api.is_stale());
        assert_eq!(api.match_count(), 1);
    }

    #[test]
    fn test_saved_offset_wins_over_search_pin_on_tab_switch() {
        let mut app = app();
        for i in 1..=30 {
            line(&mut app, "vigil", &format!("line {}\n", i));
        }
        press(&mut app, KeyCode::Char('a'), KeyModifiers::CONTROL);
        assert!(!app.viewer.tabs().view().autoscroll);

        press(&mut app, KeyCode::Char('/'), KeyModifiers::NONE);
        type_text(&mut app, "line");
        press(&mut app, KeyCode::Enter, KeyModifiers::NONE);

        let surface = app.focused_surface_mut().unwrap();
        surface.scroll.update_dimensions(30, 5);
        surface.scroll.scroll_to_top();
        surface.scroll.scroll_down(3);

        press(&mut app, KeyCode::Tab, KeyModifiers::NONE);
        press(&mut app, KeyCode::BackTab, KeyModifiers::NONE);

        assert_eq!(app.focused_source(), "vigil");
        assert_eq!(app.surface("vigil").unwrap().scroll.offset(), 3);
    }

    #[test]
    fn test_ctrl_u_clears_search_term() {
        let mut app = app();
        press(&mut app, KeyCode::Char('/'), KeyModifiers::NONE);
        type_text(&mut app, "x");
        press(&mut app, KeyCode::Char('u'), KeyModifiers::CONTROL);
        assert!(app.viewer.tabs().view().search_term.is_empty());
        assert!(app.search_open);
    }

    #[test]
    fn test_typing_q_in_search_does_not_quit() {
        let mut app = app();
        press(&mut app, KeyCode::Char('f'), KeyModifiers::CONTROL);
        type_text(&mut app, "q");
        assert!(!app.should_quit);

        press(&mut app, KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert!(app.should_quit);
    }

    #[test]
    fn test_click_outside_search_closes_it() {
        let mut app = app();
        app.layout = ScreenLayout {
            tabs: Rect::new(0, 0, 80, 1),
            search: Some(Rect::new(0, 1, 80, 3)),
            logs: Rect::new(0, 4, 80, 20),
        };
        press(&mut app, KeyCode::Char('f'), KeyModifiers::CONTROL);

        let click = |row| {
            AppEvent::Input(Event::Mouse(MouseEvent {
                kind: MouseEventKind::Down(MouseButton::Left),
                column: 5,
                row,
                modifiers: KeyModifiers::NONE,
            }))
        };
        app.handle_event(click(2));
        assert!(app.search_open);
        app.handle_event(click(10));
        assert!(!app.search_open);
    }

    #[test]
    fn test_ctrl_k_clears_focused_source() {
        let mut app = app();
        line(&mut app, "vigil", "a\n");
        line(&mut app, "vigil", "b\n");
        press(&mut app, KeyCode::Char('k'), KeyModifiers::CONTROL);

        assert_eq!(app.viewer.store().len("vigil"), 0);
        assert!(app.surface("vigil").unwrap().rows().is_empty());

        // Numbering restarts after a clear
        line(&mut app, "vigil", "c\n");
        assert_eq!(app.surface("vigil").unwrap().rows()[0].number, 1);
    }

    #[test]
    fn test_timestamp_toggle_rebuilds() {
        let mut app = app();
        line(&mut app, "vigil", "a\n");
        press(&mut app, KeyCode::Char('b'), KeyModifiers::CONTROL);
        assert!(app.surface("vigil").unwrap().rows()[0].timestamp.is_some());
    }

    #[test]
    fn test_help_closes_on_any_key() {
        let mut app = app();
        press(&mut app, KeyCode::Char('?'), KeyModifiers::NONE);
        assert!(app.show_help);
        press(&mut app, KeyCode::Char('x'), KeyModifiers::NONE);
        assert!(!app.show_help);
        assert!(!app.should_quit);
    }

    #[test]
    fn test_export_writes_buffer() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ProcessBufferStore::new(&["api".to_string()], 10);
        store.append("api", "one\n").unwrap();
        store.append("api", "two\n").unwrap();

        let path = export_source(&store, "api", dir.path()).unwrap();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("api-"));
        assert!(name.ends_with(".log"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "one\ntwo\n");

        assert!(export_source(&store, "web", dir.path()).is_err());
    }
}
