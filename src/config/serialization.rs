//! Config serialization to TOML
//!
//! Single source of truth for config file format.

use super::Config;

impl Config {
    /// Render the full config file, comments included
    pub fn to_toml(&self) -> String {
        format!(
            r#"# vigil-tui configuration
# Sources come from the server's vigil-config.json, not from this file.

# Vigil server base URL (live feed is ws://<host>/ws)
server = "{server}"

# Lines kept per source; older lines are dropped
max_lines = {max_lines}

# Fixed delay before reconnecting after the live feed drops
reconnect_delay_ms = {reconnect}

# Initial view settings (toggle at runtime with Ctrl+A / Ctrl+B)
autoscroll = {autoscroll}
show_timestamps = {timestamps}

# Directory for Ctrl+E exports
export_dir = "{export_dir}"

# Logging configuration (RUST_LOG env var overrides)
[logging]
level = "{log_level}"
# JSON file logging (in addition to the status bar or stderr)
file_enabled = {log_file_enabled}
file_dir = "{log_file_dir}"
file_rotation = "{log_file_rotation}"  # hourly, daily, never
file_prefix = "{log_file_prefix}"
"#,
            server = self.server,
            max_lines = self.max_lines,
            reconnect = self.reconnect_delay_ms,
            autoscroll = self.autoscroll,
            timestamps = self.show_timestamps,
            export_dir = toml_path(&self.export_dir),
            log_level = self.logging.level,
            log_file_enabled = self.logging.file_enabled,
            log_file_dir = toml_path(&self.logging.file_dir),
            log_file_rotation = self.logging.file_rotation,
            log_file_prefix = self.logging.file_prefix,
        )
    }

    /// Write the current config to the config file
    pub fn save(&self) -> Result<(), std::io::Error> {
        let Some(path) = Self::config_path() else {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "Could not determine config path",
            ));
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_toml())
    }
}

/// Basic-string safe path (Windows separators would otherwise be escapes)
fn toml_path(path: &std::path::Path) -> String {
    path.display().to_string().replace('\\', "/")
}
