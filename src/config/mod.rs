//! Configuration for the log viewer
//!
//! Configuration is loaded in order of precedence:
//! 1. Command-line flags (highest priority)
//! 2. Environment variables
//! 3. Config file (~/.config/vigil-tui/config.toml)
//! 4. Built-in defaults (lowest priority)
//!
//! The list of sources is not part of this file: it comes from the server's
//! `vigil-config.json` (see `sources`).

use reqwest::Url;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

// ─────────────────────────────────────────────────────────────────────────────
// Submodules
// ─────────────────────────────────────────────────────────────────────────────

mod observability;
mod serialization;
mod sources;


pub use observability::{FileLogging, LogRotation, LoggingConfig};
pub use sources::{find_sources_file, load_sources, parse_sources, SERVER_SOURCE, SOURCES_FILE};

// ─────────────────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────────────────

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

const DEFAULT_SERVER: &str = "http://localhost:3333";
const DEFAULT_MAX_LINES: usize = 1000;
const DEFAULT_RECONNECT_DELAY_MS: u64 = 2000;

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("no vigil-config.json found (searched: {})", display_paths(.0))]
    SourcesNotFound(Vec<PathBuf>),

    #[error("invalid {path}: {source}")]
    SourcesParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid server url '{0}'")]
    InvalidServer(String),
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

// ─────────────────────────────────────────────────────────────────────────────
// Application Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Application configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Base URL of the Vigil server (snapshots and live feed)
    pub server: String,

    /// Per-source rolling window size
    pub max_lines: usize,

    /// Fixed delay between a lost channel and the next attempt
    pub reconnect_delay_ms: u64,

    /// Initial autoscroll setting
    pub autoscroll: bool,

    /// Initial timestamp column setting
    pub show_timestamps: bool,

    /// Where exported source logs are written
    pub export_dir: PathBuf,

    /// Whether to run the TUI (headless prints lines to stdout)
    pub enable_tui: bool,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: DEFAULT_SERVER.to_string(),
            max_lines: DEFAULT_MAX_LINES,
            reconnect_delay_ms: DEFAULT_RECONNECT_DELAY_MS,
            autoscroll: true,
            show_timestamps: false,
            export_dir: PathBuf::from("."),
            enable_tui: true,
            logging: LoggingConfig::default(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// File Configuration (deserialization layer)
// ─────────────────────────────────────────────────────────────────────────────

/// Config file structure
#[derive(Debug, Deserialize, Default)]
pub(crate) struct FileConfig {
    pub server: Option<String>,
    pub max_lines: Option<usize>,
    pub reconnect_delay_ms: Option<u64>,
    pub autoscroll: Option<bool>,
    pub show_timestamps: Option<bool>,
    pub export_dir: Option<String>,

    /// Optional [logging] section
    pub logging: Option<FileLogging>,
}

/// Flags that override everything else
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub server: Option<String>,
    pub max_lines: Option<usize>,
    pub no_tui: bool,
}

fn is_truthy(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

// ─────────────────────────────────────────────────────────────────────────────
// Configuration Loading
// ─────────────────────────────────────────────────────────────────────────────

impl Config {
    /// Get the config file path: ~/.config/vigil-tui/config.toml
    /// Uses Unix-style ~/.config on all platforms for consistency
    pub fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|p| p.join(".config").join("vigil-tui").join("config.toml"))
    }

    /// Create config file with defaults if it doesn't exist
    pub fn ensure_config_exists() {
        let Some(path) = Self::config_path() else {
            return;
        };
        if path.exists() {
            return;
        }
        if let Some(parent) = path.parent() {
            if std::fs::create_dir_all(parent).is_err() {
                return; // Config is optional
            }
        }
        let _ = std::fs::write(&path, Self::default().to_toml());
    }

    /// Read a config file; a missing file yields the defaults
    ///
    /// A file that exists but can't be read or parsed is an error rather than
    /// a silent fallback, so a typo doesn't leave the user debugging the
    /// wrong thing.
    pub(crate) fn load_file_config(path: &Path) -> Result<FileConfig, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(FileConfig::default()),
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Load configuration: env vars > file > defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        let file = match Self::config_path() {
            Some(path) => Self::load_file_config(&path)?,
            None => FileConfig::default(),
        };
        Ok(Self::resolve(file, |key| std::env::var(key).ok()))
    }

    /// Merge a parsed file with environment lookups
    pub(crate) fn resolve(file: FileConfig, env: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        // Server: env > file > default
        let server = env("VIGIL_SERVER")
            .or(file.server)
            .unwrap_or(defaults.server);

        // Max lines: env > file > default (unparseable env values are ignored)
        let max_lines = env("VIGIL_MAX_LINES")
            .and_then(|v| v.parse().ok())
            .or(file.max_lines)
            .unwrap_or(defaults.max_lines);

        // TUI toggle: env only (runtime flag)
        let enable_tui = !env("VIGIL_NO_TUI").is_some_and(|v| is_truthy(&v));

        Self {
            server,
            max_lines,
            reconnect_delay_ms: file
                .reconnect_delay_ms
                .unwrap_or(defaults.reconnect_delay_ms),
            autoscroll: file.autoscroll.unwrap_or(defaults.autoscroll),
            show_timestamps: file.show_timestamps.unwrap_or(defaults.show_timestamps),
            export_dir: file
                .export_dir
                .map(PathBuf::from)
                .unwrap_or(defaults.export_dir),
            enable_tui,
            logging: LoggingConfig::from_file(file.logging),
        }
    }

    /// Apply command-line flags on top of everything else
    pub fn apply_cli(&mut self, cli: &CliOverrides) {
        if let Some(server) = &cli.server {
            self.server = server.clone();
        }
        if let Some(max_lines) = cli.max_lines {
            self.max_lines = max_lines;
        }
        if cli.no_tui {
            self.enable_tui = false;
        }
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    /// Server base URL for snapshot requests
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        let url =
            Url::parse(&self.server).map_err(|_| ConfigError::InvalidServer(self.server.clone()))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            _ => Err(ConfigError::InvalidServer(self.server.clone())),
        }
    }

    /// Live feed endpoint: `ws`/`wss` scheme, `{base path}/ws`
    ///
    /// Resolved under the base path the same way snapshot URLs are, so a
    /// server mounted below `/` is reached on both endpoints.
    pub fn ws_url(&self) -> Result<String, ConfigError> {
        let invalid = || ConfigError::InvalidServer(self.server.clone());
        let mut url = self.base_url()?;
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        url.set_scheme(scheme).map_err(|_| invalid())?;
        url.set_query(None);
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .push("ws");
        Ok(url.to_string())
    }
}
