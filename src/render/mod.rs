// Renderer - derives what each source's surface should show
//
// A `Surface` is the painted representation of one source: numbered rows with
// highlighting already applied, plus its scroll position. It is the terminal
// counterpart of a per-source DOM container. The functions here decide between
// appending one row and rebuilding the whole surface; painting the visible
// window is left to `tui::components::log_view`.

mod scroll;

pub use scroll::ScrollState;

use crate::highlight::{highlight, Segment};
use crate::snapshot::strip_ansi;
use crate::store::LogEntry;
use crate::tabs::ViewState;
use std::collections::VecDeque;

/// Rows from the bottom that still count as "at the bottom" before a rebuild
pub const BOTTOM_THRESHOLD_ROWS: usize = 2;

/// How a change is reflected on a surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// New rows appended after the existing ones
    Incremental,
    /// Surface cleared and every buffered entry redrawn
    FullRebuild,
    /// Surface is off-screen; rebuild postponed until it gains focus
    Deferred,
}

/// One visual row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// Buffer-relative, 1-based
    pub number: usize,
    pub timestamp: Option<String>,
    pub segments: Vec<Segment>,
}

impl Row {
    pub fn build(number: usize, entry: &LogEntry, view: &ViewState) -> Self {
        let content = display_text(&entry.text);
        Self {
            number,
            timestamp: view
                .show_timestamps
                .then(|| entry.arrival_time.format("%H:%M:%S").to_string()),
            segments: highlight(&content, &view.search_term),
        }
    }

    /// Plain content without emphasis markers
    #[cfg(test)]
    pub fn content(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }
}

/// What a stored line looks like on screen
///
/// Live text is stored exactly as received, so escapes and other control
/// characters are removed here. Tabs become spaces; a tab cell has no width.
fn display_text(text: &str) -> String {
    strip_ansi(text.trim_end_matches(['\n', '\r']))
        .chars()
        .filter_map(|c| match c {
            '\t' => Some(' '),
            c if c.is_control() => None,
            c => Some(c),
        })
        .collect()
}

/// Painted state of one source
#[derive(Debug, Default)]
pub struct Surface {
    rows: Vec<Row>,
    pub scroll: ScrollState,
    stale: bool,
}

impl Surface {
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Flag for a rebuild before this surface is painted again
    pub fn mark_stale(&mut self) {
        self.stale = true;
    }

    /// Count of rows whose content matches the current search term
    pub fn match_count(&self) -> usize {
        self.rows
            .iter()
            .filter(|r| r.segments.iter().any(|s| s.matched))
            .count()
    }
}

/// Pick a mode for `appended` new entries on a visible surface
pub fn plan(surface: &Surface, entries: &VecDeque<LogEntry>, appended: usize, evicted: usize) -> RenderMode {
    let consistent = surface.rows.len() + appended == entries.len();
    if evicted > 0 || surface.stale || !consistent {
        RenderMode::FullRebuild
    } else {
        RenderMode::Incremental
    }
}

/// Append rows for the last `count` entries without touching earlier rows
pub fn append_rows(
    surface: &mut Surface,
    entries: &VecDeque<LogEntry>,
    count: usize,
    view: &ViewState,
    pin: bool,
) {
    let skip = entries.len().saturating_sub(count);
    for entry in entries.iter().skip(skip) {
        let number = surface.rows.len() + 1;
        surface.rows.push(Row::build(number, entry, view));
    }
    surface.scroll.set_total(surface.rows.len());
    if pin {
        surface.scroll.pin_to_bottom();
    }
}

/// Redraw every buffered entry, numbering rows 1..=len
pub fn rebuild(surface: &mut Surface, entries: &VecDeque<LogEntry>, view: &ViewState) {
    let was_at_bottom = surface.scroll.is_near_bottom(BOTTOM_THRESHOLD_ROWS);
    let previous_offset = surface.scroll.offset();

    surface.rows = entries
        .iter()
        .enumerate()
        .map(|(i, entry)| Row::build(i + 1, entry, view))
        .collect();
    surface.stale = false;
    surface.scroll.set_total(surface.rows.len());

    if (was_at_bottom && view.autoscroll) || !view.search_term.is_empty() {
        surface.scroll.pin_to_bottom();
    } else {
        surface.scroll.set_offset(previous_offset);
    }
}

/// Reflect newly appended entries on a source's surface
///
/// Off-screen surfaces that can't take a plain append are only marked stale;
/// they get rebuilt when focus moves to them.
pub fn apply_ingest(
    surface: &mut Surface,
    entries: &VecDeque<LogEntry>,
    view: &ViewState,
    appended: usize,
    evicted: usize,
    focused: bool,
) -> RenderMode {
    match plan(surface, entries, appended, evicted) {
        RenderMode::Incremental => {
            append_rows(surface, entries, appended, view, focused && view.autoscroll);
            RenderMode::Incremental
        }
        _ if focused => {
            rebuild(surface, entries, view);
            RenderMode::FullRebuild
        }
        _ => {
            surface.mark_stale();
            RenderMode::Deferred
        }
    }
}
