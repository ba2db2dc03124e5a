// Process buffer store - bounded rolling window per source
//
// Every line that reaches the viewer, whether it came from the startup
// snapshot or the live feed, enters through `ProcessBufferStore::append`.
// That single entry point is what keeps the ordering and eviction invariants
// intact regardless of which producer the line came from.

use chrono::{DateTime, Local};
use std::collections::{HashMap, VecDeque};
use thiserror::Error;

/// A single captured line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Per-source sequence number, never reused (survives eviction and clear)
    pub sequence: u64,
    pub arrival_time: DateTime<Local>,
    /// Line content including its terminator
    pub text: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("unknown source '{0}'")]
    UnknownSource(String),
}

/// Result of a successful append
#[derive(Debug)]
pub struct Appended<'a> {
    pub entry: &'a LogEntry,
    /// Number of oldest entries dropped to get back under `max_lines`
    pub evicted: usize,
}

/// Bounded buffer for one source
#[derive(Debug, Default)]
struct SourceBuffer {
    entries: VecDeque<LogEntry>,
    next_sequence: u64,
}

/// Owns every source's buffer
///
/// Sources are fixed at construction; `sources()` always yields them in the
/// configured display order.
#[derive(Debug)]
pub struct ProcessBufferStore {
    order: Vec<String>,
    buffers: HashMap<String, SourceBuffer>,
    max_lines: usize,
}

impl ProcessBufferStore {
    pub fn new(sources: &[String], max_lines: usize) -> Self {
        let mut order = Vec::with_capacity(sources.len());
        let mut buffers = HashMap::with_capacity(sources.len());
        for source in sources {
            if buffers.contains_key(source) {
                continue;
            }
            order.push(source.clone());
            buffers.insert(source.clone(), SourceBuffer::default());
        }

        Self {
            order,
            buffers,
            // A zero bound would make every append evict itself
            max_lines: max_lines.max(1),
        }
    }

    pub fn sources(&self) -> &[String] {
        &self.order
    }

    pub fn max_lines(&self) -> usize {
        self.max_lines
    }

    pub fn contains(&self, source: &str) -> bool {
        self.buffers.contains_key(source)
    }

    /// Append one line, evicting the whole surplus from the front in one step
    pub fn append(&mut self, source: &str, text: &str) -> Result<Appended<'_>, StoreError> {
        let max_lines = self.max_lines;
        let buffer = self
            .buffers
            .get_mut(source)
            .ok_or_else(|| StoreError::UnknownSource(source.to_string()))?;

        let sequence = buffer.next_sequence;
        buffer.next_sequence += 1;
        buffer.entries.push_back(LogEntry {
            sequence,
            arrival_time: Local::now(),
            text: text.to_string(),
        });

        let evicted = buffer.entries.len().saturating_sub(max_lines);
        if evicted > 0 {
            buffer.entries.drain(..evicted);
        }

        // max_lines >= 1, so the entry just pushed always survives eviction
        let last = buffer.entries.len() - 1;
        Ok(Appended {
            entry: &buffer.entries[last],
            evicted,
        })
    }

    /// Drop every entry for `source`; the sequence counter keeps counting
    pub fn clear(&mut self, source: &str) -> Result<(), StoreError> {
        let buffer = self
            .buffers
            .get_mut(source)
            .ok_or_else(|| StoreError::UnknownSource(source.to_string()))?;
        buffer.entries.clear();
        Ok(())
    }

    /// Read-only ordered view of a source's buffer
    pub fn snapshot(&self, source: &str) -> Option<&VecDeque<LogEntry>> {
        self.buffers.get(source).map(|b| &b.entries)
    }

    pub fn len(&self, source: &str) -> usize {
        self.buffers.get(source).map_or(0, |b| b.entries.len())
    }

    /// Full buffered text of a source, terminators included
    pub fn export_text(&self, source: &str) -> Option<String> {
        self.snapshot(source)
            .map(|entries| entries.iter().map(|e| e.text.as_str()).collect())
    }
}
