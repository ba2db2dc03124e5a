// Headless mode - stream every source to stdout without a terminal UI
//
// Runs the same viewer pipeline as the TUI (snapshots, live channel,
// reconnect) and prints each newly stored line as `[source] line`.
// Diagnostics go to stderr via tracing, so stdout stays pipeable.

use crate::config::Config;
use crate::connection::{ConnectionManager, Transport, WsTransport};
use crate::events::AppEvent;
use crate::snapshot::SnapshotLoader;
use crate::store::LogEntry;
use crate::viewer::{Ingested, Viewer};
use anyhow::Result;
use std::io::{self, Write};
use tokio::sync::mpsc;

pub async fn run(config: &Config, sources: Vec<String>) -> Result<()> {
    let (tx, mut rx) = mpsc::channel(1024);

    let transport = WsTransport::new(config.ws_url()?, tx.clone());
    let connection = ConnectionManager::new(transport, config.reconnect_delay());
    let mut viewer = Viewer::with_sources(&sources, config.max_lines, true, false, connection)?;
    let loader = SnapshotLoader::new(config.base_url()?);

    viewer.start();
    loader.spawn_all(viewer.tabs().sources(), tx);
    tracing::info!(
        "Streaming {} sources from {} (Ctrl+C to stop)",
        sources.len(),
        config.server
    );

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut out = io::stdout().lock();
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            maybe_event = rx.recv() => {
                let Some(event) = maybe_event else {
                    break;
                };
                let ingested = match event {
                    AppEvent::Connection { generation, event } => {
                        viewer.handle_connection(generation, event)
                    }
                    AppEvent::ReconnectDue { generation } => {
                        viewer.handle_reconnect_due(generation);
                        Vec::new()
                    }
                    AppEvent::Snapshot { source, outcome } => {
                        viewer.handle_snapshot(&source, outcome)
                    }
                    AppEvent::Input(_) => Vec::new(),
                };
                print_ingested(&mut out, &viewer, &ingested)?;
            }
        }
    }

    tracing::info!("Shutting down...");
    viewer.shutdown();
    Ok(())
}

/// Print the newly appended tail of each touched source
///
/// Lines evicted within the same batch are already gone and are not printed.
fn print_ingested<T: Transport>(
    out: &mut impl Write,
    viewer: &Viewer<T>,
    ingested: &[Ingested],
) -> io::Result<()> {
    for change in ingested {
        let Some(entries) = viewer.store().snapshot(&change.source) else {
            continue;
        };
        let skip = entries.len().saturating_sub(change.appended);
        for entry in entries.iter().skip(skip) {
            writeln!(out, "{}", format_line(&change.source, entry))?;
        }
    }
    out.flush()
}

fn format_line(source: &str, entry: &LogEntry) -> String {
    format!("[{}] {}", source, entry.text.trim_end_matches(['\n', '\r']))
}
