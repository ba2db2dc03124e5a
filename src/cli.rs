// CLI module - command-line argument parsing and handlers
//
// Top-level flags override the config file and environment. The `config`
// subcommand manages the viewer's own settings file:
// - config --show: Display effective configuration
// - config --path: Show config file path
// - config --reset: Regenerate config file with defaults

use crate::config::{CliOverrides, Config, VERSION};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;

/// vigil-tui - terminal viewer for Vigil process logs
#[derive(Parser, Debug)]
#[command(name = "vigil-tui")]
#[command(version = VERSION)]
#[command(about = "Terminal viewer for Vigil process logs", long_about = None)]
pub struct Cli {
    /// Path to vigil-config.json (default: ./ then ../)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Vigil server base URL, e.g. http://localhost:3333
    #[arg(long, value_name = "URL")]
    pub server: Option<String>,

    /// Lines kept per source
    #[arg(long, value_name = "N")]
    pub max_lines: Option<usize>,

    /// Print lines to stdout instead of starting the TUI
    #[arg(long)]
    pub no_tui: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage configuration
    Config {
        /// Show effective configuration
        #[arg(long)]
        show: bool,

        /// Reset config file to defaults
        #[arg(long)]
        reset: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },
}

impl Cli {
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            server: self.server.clone(),
            max_lines: self.max_lines,
            no_tui: self.no_tui,
        }
    }
}

/// Handle subcommands. Returns true if one was handled (exit after).
pub fn handle_command(cli: &Cli) -> Result<bool> {
    match cli.command {
        Some(Commands::Config { show, reset, path }) => {
            if path {
                handle_config_path()?;
            } else if show {
                handle_config_show(cli)?;
            } else if reset {
                handle_config_reset()?;
            } else {
                println!("Usage: vigil-tui config [--show|--reset|--path]");
                println!();
                println!("Options:");
                println!("  --show    Display effective configuration");
                println!("  --reset   Reset config file to defaults");
                println!("  --path    Show config file path");
            }
            Ok(true)
        }
        None => Ok(false),
    }
}

fn handle_config_path() -> Result<()> {
    let path = Config::config_path().context("Could not determine config path")?;
    println!("{}", path.display());
    Ok(())
}

fn handle_config_show(cli: &Cli) -> Result<()> {
    let mut config = Config::from_env()?;
    config.apply_cli(&cli.overrides());

    println!("# Effective configuration (flags > env > file > defaults)");
    println!();
    print!("{}", config.to_toml());

    println!();
    if let Some(path) = Config::config_path() {
        if path.exists() {
            println!("# Source: {}", path.display());
        } else {
            println!("# Source: defaults (no config file)");
        }
    }
    Ok(())
}

fn handle_config_reset() -> Result<()> {
    let path = Config::config_path().context("Could not determine config path")?;

    if path.exists() {
        eprint!(
            "Config file exists at {}. Overwrite? [y/N] ",
            path.display()
        );
        std::io::stderr().flush()?;

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;

        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Aborted.");
            return Ok(());
        }
    }

    Config::default()
        .save()
        .with_context(|| format!("Error writing config to {}", path.display()))?;

    println!("Config reset to defaults: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_become_overrides() {
        let cli = Cli::parse_from([
            "vigil-tui",
            "--server",
            "http://box:4000",
            "--max-lines",
            "50",
            "--no-tui",
        ]);
        let overrides = cli.overrides();
        assert_eq!(overrides.server.as_deref(), Some("http://box:4000"));
        assert_eq!(overrides.max_lines, Some(50));
        assert!(overrides.no_tui);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_config_subcommand_parses() {
        let cli = Cli::parse_from(["vigil-tui", "config", "--path"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Config { path: true, .. })
        ));
    }

    #[test]
    fn test_sources_file_flag() {
        let cli = Cli::parse_from(["vigil-tui", "--config", "/srv/vigil-config.json"]);
        assert_eq!(cli.config, Some(PathBuf::from("/srv/vigil-config.json")));
    }
}
