//! `[logging]` section: the viewer's own diagnostics, never the sources' output

use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing_appender::rolling::RollingFileAppender;

/// How often the JSON diagnostics file starts afresh
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    Hourly,
    #[default]
    Daily,
    Never,
}

impl LogRotation {
    /// Rolling appender writing `{dir}/{prefix}[.date]` for this cadence
    pub fn appender(self, dir: &Path, prefix: &str) -> RollingFileAppender {
        match self {
            LogRotation::Hourly => tracing_appender::rolling::hourly(dir, prefix),
            LogRotation::Daily => tracing_appender::rolling::daily(dir, prefix),
            LogRotation::Never => tracing_appender::rolling::never(dir, prefix),
        }
    }
}

impl fmt::Display for LogRotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogRotation::Hourly => "hourly",
            LogRotation::Daily => "daily",
            LogRotation::Never => "never",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Filter level for this crate's events (trace..error)
    pub level: String,
    pub file_enabled: bool,
    pub file_dir: PathBuf,
    pub file_rotation: LogRotation,
    pub file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_enabled: false,
            file_dir: PathBuf::from("./logs/viewer"),
            file_rotation: LogRotation::Daily,
            file_prefix: "vigil-tui".to_string(),
        }
    }
}

/// `[logging]` as written in the file; absent keys keep the defaults
#[derive(Debug, Deserialize, Default)]
pub struct FileLogging {
    pub level: Option<String>,
    pub file_enabled: Option<bool>,
    pub file_dir: Option<PathBuf>,
    pub file_rotation: Option<LogRotation>,
    pub file_prefix: Option<String>,
}

impl LoggingConfig {
    pub fn from_file(file: Option<FileLogging>) -> Self {
        let mut config = Self::default();
        let Some(file) = file else {
            return config;
        };

        if let Some(level) = file.level {
            config.level = level;
        }
        if let Some(enabled) = file.file_enabled {
            config.file_enabled = enabled;
        }
        if let Some(dir) = file.file_dir {
            config.file_dir = dir;
        }
        if let Some(rotation) = file.file_rotation {
            config.file_rotation = rotation;
        }
        if let Some(prefix) = file.file_prefix {
            config.file_prefix = prefix;
        }
        config
    }

    /// `EnvFilter` directive used when RUST_LOG is unset
    ///
    /// Scoped to this crate so reqwest/tungstenite internals stay quiet.
    pub fn filter_directive(&self) -> String {
        format!("vigil_tui={}", self.level.trim().to_lowercase())
    }
}
