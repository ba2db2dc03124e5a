// TUI module - Terminal User Interface
//
// This module manages the terminal UI using ratatui. It handles:
// - Terminal initialization and cleanup
// - Wiring the live channel, snapshot fetches and input into one event queue
// - The run loop: drain events, redraw, repeat

pub mod app;
pub mod components;
pub mod theme;
pub mod views;

use crate::config::Config;
use crate::connection::{ConnectionManager, WsTransport};
use crate::events::AppEvent;
use crate::logging::LogBuffer;
use crate::snapshot::SnapshotLoader;
use crate::viewer::Viewer;
use anyhow::{Context, Result};
use app::App;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::time::Duration;
use tokio::sync::mpsc;

/// Capacity of the shared event queue
const EVENT_QUEUE: usize = 1024;

/// Most events handled between two redraws, so a flood cannot starve input
const MAX_EVENTS_PER_FRAME: usize = 512;

/// Run the TUI
///
/// Sets up the terminal, runs the event loop, and restores the terminal
/// whether or not the loop failed.
pub async fn run_tui(config: &Config, sources: Vec<String>, log_buffer: LogBuffer) -> Result<()> {
    let (tx, mut rx) = mpsc::channel(EVENT_QUEUE);

    let transport = WsTransport::new(config.ws_url()?, tx.clone());
    let connection = ConnectionManager::new(transport, config.reconnect_delay());
    let viewer = Viewer::with_sources(
        &sources,
        config.max_lines,
        config.autoscroll,
        config.show_timestamps,
        connection,
    )?;
    let loader = SnapshotLoader::new(config.base_url()?);

    // Set up terminal
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("Failed to setup terminal")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;

    spawn_input_reader(tx.clone());

    let mut app = App::new(viewer, log_buffer, config.export_dir.clone());
    app.start(&loader, tx);
    tracing::info!("Viewing {} sources from {}", sources.len(), config.server);

    let result = run_event_loop(&mut terminal, &mut app, &mut rx).await;
    app.viewer.shutdown();

    // Restore terminal
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .context("Failed to restore terminal")?;
    terminal.show_cursor().context("Failed to show cursor")?;

    result
}

/// Forward terminal input into the event queue
///
/// crossterm's reader blocks, so it gets its own thread. It exits once the
/// run loop has dropped the receiver.
fn spawn_input_reader(tx: mpsc::Sender<AppEvent>) {
    std::thread::spawn(move || loop {
        match event::poll(Duration::from_millis(100)) {
            Ok(true) => match event::read() {
                Ok(ev) => {
                    if tx.blocking_send(AppEvent::Input(ev)).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!("Terminal input failed: {}", e);
                    break;
                }
            },
            Ok(false) => {
                if tx.is_closed() {
                    break;
                }
            }
            Err(e) => {
                tracing::warn!("Terminal poll failed: {}", e);
                break;
            }
        }
    });
}

/// Main event loop
///
/// Each pass draws once, then waits for either the next event or the tick
/// (which keeps toasts expiring and the status bar fresh while idle). Events
/// already queued are drained before the next draw.
async fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App<WsTransport>,
    rx: &mut mpsc::Receiver<AppEvent>,
) -> Result<()> {
    let mut tick_interval = tokio::time::interval(Duration::from_millis(200));

    loop {
        terminal
            .draw(|f| views::draw(f, app))
            .context("Failed to draw terminal")?;

        tokio::select! {
            _ = tick_interval.tick() => {}

            maybe_event = rx.recv() => {
                let Some(event) = maybe_event else {
                    break;
                };
                app.handle_event(event);

                for _ in 0..MAX_EVENTS_PER_FRAME {
                    match rx.try_recv() {
                        Ok(event) => app.handle_event(event),
                        Err(_) => break,
                    }
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
