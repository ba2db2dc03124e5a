// vigil-tui - terminal viewer for Vigil process logs
//
// Connects to a running Vigil server and shows each supervised process's
// output in its own tab, live.
//
// Architecture:
// - Snapshot loader (reqwest): one-shot history fetch per source at startup
// - Connection (tokio-tungstenite): single push channel, fixed-delay reconnect
// - Viewer: bounded per-source buffers, tabs, unread flags, search
// - TUI (ratatui): tab bar, log view, search, status bar
// - Event system: one mpsc queue feeds a single run loop

mod cli;
mod config;
mod connection;
mod events;
mod headless;
mod highlight;
mod logging;
mod render;
mod snapshot;
mod store;
mod tabs;
mod tui;
mod util;
mod viewer;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use config::Config;
use logging::LogBuffer;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Subcommands (config --show, --path, --reset) exit early
    if cli::handle_command(&cli)? {
        return Ok(());
    }

    // Create config file with defaults on first run
    Config::ensure_config_exists();

    let mut config = Config::from_env()?;
    config.apply_cli(&cli.overrides());

    // Guard must live until exit so buffered file logs get flushed
    let log_buffer = LogBuffer::new();
    let _log_guard = logging::init_tracing(&config.logging, config.enable_tui, &log_buffer);

    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    let sources = config::load_sources(cli.config.as_deref(), &cwd)?;
    tracing::debug!("Sources: {}", sources.join(", "));

    if config.enable_tui {
        tracing::info!("Starting TUI");
        tui::run_tui(&config, sources, log_buffer).await?;
    } else {
        headless::run(&config, sources).await?;
    }

    Ok(())
}
