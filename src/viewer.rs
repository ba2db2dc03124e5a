// Viewer - the single writer behind the run loop
//
// Bundles the buffer store, tab session and connection manager, and turns
// every `AppEvent` that carries data into store appends. Both the TUI and the
// headless printer drive one `Viewer`; neither touches the store directly.
//
// Live lines for a source whose backfill hasn't finished are parked in a
// pending queue and appended right after the backfill lines, so history always
// precedes live output in sequence order.

use crate::connection::{ConnectionManager, ConnectionState, Transport};
use crate::events::ConnectionEvent;
use crate::snapshot::BackfillError;
use crate::store::{ProcessBufferStore, StoreError};
use crate::tabs::{ScrollRestore, TabError, TabSessionManager};
use std::collections::{HashMap, VecDeque};

/// Net effect of one event on one source's buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ingested {
    pub source: String,
    pub appended: usize,
    pub evicted: usize,
}

pub struct Viewer<T: Transport> {
    store: ProcessBufferStore,
    tabs: TabSessionManager,
    connection: ConnectionManager<T>,
    pending_live: HashMap<String, VecDeque<String>>,
}

impl<T: Transport> Viewer<T> {
    pub fn new(
        store: ProcessBufferStore,
        tabs: TabSessionManager,
        connection: ConnectionManager<T>,
    ) -> Self {
        Self {
            store,
            tabs,
            connection,
            pending_live: HashMap::new(),
        }
    }

    /// Build store and tabs for `sources` in one go
    pub fn with_sources(
        sources: &[String],
        max_lines: usize,
        autoscroll: bool,
        show_timestamps: bool,
        connection: ConnectionManager<T>,
    ) -> Result<Self, TabError> {
        let tabs = TabSessionManager::new(sources, autoscroll, show_timestamps)?;
        let store = ProcessBufferStore::new(sources, max_lines);
        Ok(Self::new(store, tabs, connection))
    }

    pub fn store(&self) -> &ProcessBufferStore {
        &self.store
    }

    pub fn tabs(&self) -> &TabSessionManager {
        &self.tabs
    }

    pub fn tabs_mut(&mut self) -> &mut TabSessionManager {
        &mut self.tabs
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    #[cfg(test)]
    pub fn connection(&self) -> &ConnectionManager<T> {
        &self.connection
    }

    /// Open the first live channel
    pub fn start(&mut self) {
        self.connection.start();
    }

    pub fn reconnect_now(&mut self) {
        self.connection.reconnect_now();
    }

    pub fn shutdown(&mut self) {
        self.connection.shutdown();
    }

    pub fn focus(&mut self, source: &str, live_offset: usize) -> Option<ScrollRestore> {
        self.tabs.focus(source, live_offset)
    }

    pub fn clear(&mut self, source: &str) -> Result<(), StoreError> {
        self.tabs.clear(&mut self.store, source)
    }

    pub fn handle_connection(&mut self, generation: u64, event: ConnectionEvent) -> Vec<Ingested> {
        match event {
            ConnectionEvent::Opened => {
                self.connection.on_opened(generation);
                Vec::new()
            }
            ConnectionEvent::Message(text) => match self.connection.on_message(generation, &text) {
                Err(e) => {
                    tracing::warn!("Dropping message: {}", e);
                    Vec::new()
                }
                Ok(envelope) => self
                    .ingest_live(&envelope.source, envelope.data)
                    .into_iter()
                    .collect(),
            },
            ConnectionEvent::Closed(error) => {
                self.connection.on_closed(generation, error);
                Vec::new()
            }
        }
    }

    pub fn handle_reconnect_due(&mut self, generation: u64) {
        self.connection.on_reconnect_due(generation);
    }

    /// Apply a finished backfill, then release any live lines held for it
    pub fn handle_snapshot(
        &mut self,
        source: &str,
        outcome: Result<Vec<String>, BackfillError>,
    ) -> Vec<Ingested> {
        if !self.store.contains(source) {
            tracing::debug!("Snapshot for unknown source '{}' ignored", source);
            return Vec::new();
        }
        if self.tabs.is_initial_load_complete(source) {
            tracing::debug!("Duplicate snapshot for '{}' ignored", source);
            return Vec::new();
        }

        let mut total = Ingested {
            source: source.to_string(),
            appended: 0,
            evicted: 0,
        };

        match outcome {
            Ok(lines) => {
                tracing::debug!("Backfilled {} lines for {}", lines.len(), source);
                for line in &lines {
                    self.append(source, line, &mut total);
                }
            }
            Err(e) => tracing::warn!("Backfill for '{}' failed: {}", source, e),
        }

        self.tabs.mark_initial_load_complete(source);

        if let Some(pending) = self.pending_live.remove(source) {
            for line in &pending {
                self.append(source, line, &mut total);
            }
        }

        if total.appended == 0 {
            Vec::new()
        } else {
            vec![total]
        }
    }

    fn ingest_live(&mut self, source: &str, data: String) -> Option<Ingested> {
        if !self.store.contains(source) {
            tracing::debug!("Dropping line for unknown source '{}'", source);
            return None;
        }

        if !self.tabs.is_initial_load_complete(source) {
            let max_lines = self.store.max_lines();
            let queue = self.pending_live.entry(source.to_string()).or_default();
            queue.push_back(data);
            // Anything beyond max_lines would be evicted on flush anyway
            if queue.len() > max_lines {
                queue.pop_front();
            }
            return None;
        }

        let mut ingested = Ingested {
            source: source.to_string(),
            appended: 0,
            evicted: 0,
        };
        self.append(source, &data, &mut ingested);
        (ingested.appended > 0).then_some(ingested)
    }

    fn append(&mut self, source: &str, text: &str, total: &mut Ingested) {
        match self.store.append(source, text) {
            Ok(appended) => {
                total.appended += 1;
                total.evicted += appended.evicted;
                self.tabs.on_append(source);
            }
            Err(e) => tracing::debug!("Append dropped: {}", e),
        }
    }
}
