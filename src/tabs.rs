// Tab session manager - focus, scroll memory and unread tracking
//
// Owns the per-source TabState and the single ViewState. It knows nothing
// about transport or painting: callers hand it the live scroll offset when
// focus moves, and it hands back where the newly focused source should land.

use crate::store::{ProcessBufferStore, StoreError};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TabError {
    #[error("at least one source is required")]
    NoSources,
}

/// Per-source UI state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabState {
    /// Offset saved when the source last lost focus
    pub scroll_offset: Option<usize>,
    pub unread: bool,
    pub initial_load_complete: bool,
}

/// Process-wide view settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    focused: usize,
    pub show_timestamps: bool,
    pub autoscroll: bool,
    pub search_term: String,
}

/// Where a newly focused source should scroll to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollRestore {
    Bottom,
    Offset(usize),
}

/// User intents produced by the keyboard map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Focus the source at this 0-based display position
    FocusIndex(usize),
    NextTab,
    PrevTab,
    ClearFocused,
    OpenSearch,
    ToggleTimestamps,
    ToggleAutoscroll,
    Export,
    Reconnect,
    ScrollUp,
    ScrollDown,
    PageUp,
    PageDown,
    ScrollTop,
    ScrollBottom,
    Help,
    Quit,
}

/// Map a key press to an action (search input is handled separately)
///
/// Digits 1-9 select by display order; Ctrl is the command modifier.
pub fn key_action(key: &KeyEvent) -> Option<Action> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let plain = key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT;

    match key.code {
        KeyCode::Char(c @ '1'..='9') if key.modifiers.is_empty() => {
            Some(Action::FocusIndex(c as usize - '1' as usize))
        }
        KeyCode::Char('k') if ctrl => Some(Action::ClearFocused),
        KeyCode::Char('f') if ctrl => Some(Action::OpenSearch),
        KeyCode::Char('b') if ctrl => Some(Action::ToggleTimestamps),
        KeyCode::Char('a') if ctrl => Some(Action::ToggleAutoscroll),
        KeyCode::Char('e') if ctrl => Some(Action::Export),
        KeyCode::Char('r') if ctrl => Some(Action::Reconnect),
        KeyCode::Char('c') if ctrl => Some(Action::Quit),
        KeyCode::Char('q') | KeyCode::Char('Q') if plain => Some(Action::Quit),
        KeyCode::Char('?') if plain => Some(Action::Help),
        KeyCode::Char('/') if plain => Some(Action::OpenSearch),
        KeyCode::Tab => Some(Action::NextTab),
        KeyCode::BackTab => Some(Action::PrevTab),
        KeyCode::Up | KeyCode::Char('k') if plain => Some(Action::ScrollUp),
        KeyCode::Down | KeyCode::Char('j') if plain => Some(Action::ScrollDown),
        KeyCode::PageUp => Some(Action::PageUp),
        KeyCode::PageDown => Some(Action::PageDown),
        KeyCode::Home | KeyCode::Char('g') if plain => Some(Action::ScrollTop),
        KeyCode::End | KeyCode::Char('G') if plain => Some(Action::ScrollBottom),
        _ => None,
    }
}

/// Focus, scroll memory and unread flags across all sources
#[derive(Debug)]
pub struct TabSessionManager {
    order: Vec<String>,
    index: HashMap<String, usize>,
    tabs: Vec<TabState>,
    view: ViewState,
}

impl TabSessionManager {
    /// First source in display order starts focused
    pub fn new(
        sources: &[String],
        autoscroll: bool,
        show_timestamps: bool,
    ) -> Result<Self, TabError> {
        let mut order = Vec::with_capacity(sources.len());
        let mut index = HashMap::with_capacity(sources.len());
        for source in sources {
            if !index.contains_key(source) {
                index.insert(source.clone(), order.len());
                order.push(source.clone());
            }
        }
        if order.is_empty() {
            return Err(TabError::NoSources);
        }

        Ok(Self {
            tabs: vec![TabState::default(); order.len()],
            order,
            index,
            view: ViewState {
                focused: 0,
                show_timestamps,
                autoscroll,
                search_term: String::new(),
            },
        })
    }

    pub fn sources(&self) -> &[String] {
        &self.order
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn focused_source(&self) -> &str {
        &self.order[self.view.focused]
    }

    pub fn focused_index(&self) -> usize {
        self.view.focused
    }

    fn tab(&self, source: &str) -> Option<&TabState> {
        self.index.get(source).map(|&i| &self.tabs[i])
    }

    pub fn is_unread(&self, source: &str) -> bool {
        self.tab(source).is_some_and(|t| t.unread)
    }

    pub fn is_initial_load_complete(&self, source: &str) -> bool {
        self.tab(source).is_some_and(|t| t.initial_load_complete)
    }

    /// Move focus to `source`
    ///
    /// `live_offset` is the outgoing source's current scroll position, read
    /// from its surface. Returns `None` for unknown or already focused sources.
    pub fn focus(&mut self, source: &str, live_offset: usize) -> Option<ScrollRestore> {
        let &next = self.index.get(source)?;
        if next == self.view.focused {
            return None;
        }

        self.tabs[self.view.focused].scroll_offset = Some(live_offset);
        self.tabs[next].unread = false;
        self.view.focused = next;

        Some(if self.view.autoscroll {
            ScrollRestore::Bottom
        } else {
            ScrollRestore::Offset(self.tabs[next].scroll_offset.unwrap_or(0))
        })
    }

    /// Source at a 0-based display position (out of range → `None`)
    pub fn source_at(&self, position: usize) -> Option<&str> {
        self.order.get(position).map(String::as_str)
    }

    pub fn next_source(&self) -> &str {
        &self.order[(self.view.focused + 1) % self.order.len()]
    }

    pub fn prev_source(&self) -> &str {
        let len = self.order.len();
        &self.order[(self.view.focused + len - 1) % len]
    }

    /// Call after every store append
    pub fn on_append(&mut self, source: &str) {
        let Some(&i) = self.index.get(source) else {
            return;
        };
        if i != self.view.focused && self.tabs[i].initial_load_complete {
            self.tabs[i].unread = true;
        }
    }

    /// Returns true only the first time it's called for a source
    pub fn mark_initial_load_complete(&mut self, source: &str) -> bool {
        let Some(&i) = self.index.get(source) else {
            return false;
        };
        let first = !self.tabs[i].initial_load_complete;
        self.tabs[i].initial_load_complete = true;
        first
    }

    pub fn toggle_timestamps(&mut self) -> bool {
        self.view.show_timestamps = !self.view.show_timestamps;
        self.view.show_timestamps
    }

    pub fn toggle_autoscroll(&mut self) -> bool {
        self.view.autoscroll = !self.view.autoscroll;
        self.view.autoscroll
    }

    /// Returns whether the term actually changed
    pub fn set_search_term(&mut self, term: &str) -> bool {
        if self.view.search_term == term {
            return false;
        }
        self.view.search_term = term.to_string();
        true
    }

    pub fn clear(&mut self, store: &mut ProcessBufferStore, source: &str) -> Result<(), StoreError> {
        store.clear(source)?;
        if let Some(&i) = self.index.get(source) {
            self.tabs[i].scroll_offset = Some(0);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sources() -> Vec<String> {
        ["vigil", "api", "db"].iter().map(|s| s.to_string()).collect()
    }

    fn manager() -> TabSessionManager {
        let mut tabs = TabSessionManager::new(&sources(), false, false).unwrap();
        for s in sources() {
            tabs.mark_initial_load_complete(&s);
        }
        tabs
    }

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn test_first_source_focused() {
        let tabs = manager();
        assert_eq!(tabs.focused_source(), "vigil");
    }

    #[test]
    fn test_empty_sources_rejected() {
        assert_eq!(
            TabSessionManager::new(&[], true, false).unwrap_err(),
            TabError::NoSources
        );
    }

    #[test]
    fn test_unread_requires_unfocused_and_loaded() {
        let mut tabs = TabSessionManager::new(&sources(), true, false).unwrap();

        // Backfill lines arrive before the load completes
        tabs.on_append("api");
        assert!(!tabs.is_unread("api"));

        tabs.mark_initial_load_complete("api");
        tabs.on_append("api");
        assert!(tabs.is_unread("api"));

        // The focused source never becomes unread
        tabs.mark_initial_load_complete("vigil");
        tabs.on_append("vigil");
        assert!(!tabs.is_unread("vigil"));
    }

    #[test]
    fn test_focus_clears_unread() {
        let mut tabs = manager();
        tabs.on_append("db");
        assert!(tabs.is_unread("db"));
        tabs.focus("db", 0);
        assert!(!tabs.is_unread("db"));
    }

    #[test]
    fn test_focus_restores_saved_offset_without_autoscroll() {
        let mut tabs = manager();
        assert_eq!(tabs.focus("api", 12), Some(ScrollRestore::Offset(0)));
        assert_eq!(tabs.focus("vigil", 40), Some(ScrollRestore::Offset(12)));
        assert_eq!(tabs.focus("api", 3), Some(ScrollRestore::Offset(40)));
    }

    #[test]
    fn test_focus_pins_bottom_with_autoscroll() {
        let mut tabs = manager();
        tabs.toggle_autoscroll();
        assert!(tabs.view().autoscroll);
        assert_eq!(tabs.focus("db", 5), Some(ScrollRestore::Bottom));
    }

    #[test]
    fn test_focus_same_or_unknown_is_noop() {
        let mut tabs = manager();
        assert_eq!(tabs.focus("vigil", 0), None);
        assert_eq!(tabs.focus("web", 0), None);
        assert_eq!(tabs.focused_source(), "vigil");
    }

    #[test]
    fn test_initial_load_marked_once() {
        let mut tabs = TabSessionManager::new(&sources(), true, false).unwrap();
        assert!(tabs.mark_initial_load_complete("db"));
        assert!(!tabs.mark_initial_load_complete("db"));
        assert!(tabs.is_initial_load_complete("db"));
    }

    #[test]
    fn test_search_term_change_detection() {
        let mut tabs = manager();
        assert!(tabs.set_search_term("error"));
        assert!(!tabs.set_search_term("error"));
        assert!(tabs.set_search_term(""));
    }

    #[test]
    fn test_clear_delegates_to_store() {
        let mut tabs = manager();
        let mut store = ProcessBufferStore::new(&sources(), 10);
        store.append("api", "x\n").unwrap();
        tabs.clear(&mut store, "api").unwrap();
        assert_eq!(store.len("api"), 0);
    }

    #[test]
    fn test_tab_cycling_wraps() {
        let mut tabs = manager();
        assert_eq!(tabs.prev_source(), "db");
        tabs.focus("db", 0);
        assert_eq!(tabs.next_source(), "vigil");
    }

    #[test]
    fn test_digit_keys_select_by_order() {
        assert_eq!(
            key_action(&key(KeyCode::Char('1'), KeyModifiers::NONE)),
            Some(Action::FocusIndex(0))
        );
        assert_eq!(
            key_action(&key(KeyCode::Char('9'), KeyModifiers::NONE)),
            Some(Action::FocusIndex(8))
        );
        // Out of range positions are resolved (and ignored) by source_at
        assert_eq!(manager().source_at(8), None);
        assert_eq!(key_action(&key(KeyCode::Char('0'), KeyModifiers::NONE)), None);
        // Digits with a modifier are not tab selection
        assert_eq!(key_action(&key(KeyCode::Char('2'), KeyModifiers::ALT)), None);
    }

    #[test]
    fn test_command_shortcuts() {
        let ctrl = KeyModifiers::CONTROL;
        assert_eq!(
            key_action(&key(KeyCode::Char('k'), ctrl)),
            Some(Action::ClearFocused)
        );
        assert_eq!(
            key_action(&key(KeyCode::Char('f'), ctrl)),
            Some(Action::OpenSearch)
        );
        assert_eq!(
            key_action(&key(KeyCode::Char('b'), ctrl)),
            Some(Action::ToggleTimestamps)
        );
        // Plain k scrolls instead of clearing
        assert_eq!(
            key_action(&key(KeyCode::Char('k'), KeyModifiers::NONE)),
            Some(Action::ScrollUp)
        );
    }
}
