//! Source list discovery from the server's `vigil-config.json`
//!
//! The viewer shows the same processes the server supervises, in the same
//! order, with the server's own `vigil` log always first.

use super::ConfigError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// File name looked up in the working directory and its parent
pub const SOURCES_FILE: &str = "vigil-config.json";

/// The server's own log source
pub const SERVER_SOURCE: &str = "vigil";

#[derive(Debug, Deserialize)]
struct VigilConfig {
    #[serde(default)]
    processes: Vec<ProcessEntry>,
}

#[derive(Debug, Deserialize)]
struct ProcessEntry {
    name: String,
}

/// Resolve which `vigil-config.json` to read
///
/// An explicit path must exist; otherwise `dir` is searched, then its parent.
pub fn find_sources_file(explicit: Option<&Path>, dir: &Path) -> Result<PathBuf, ConfigError> {
    if let Some(path) = explicit {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        return Err(ConfigError::SourcesNotFound(vec![path.to_path_buf()]));
    }

    let mut searched = vec![dir.join(SOURCES_FILE)];
    if let Some(parent) = dir.parent() {
        searched.push(parent.join(SOURCES_FILE));
    }

    searched
        .iter()
        .find(|p| p.exists())
        .cloned()
        .ok_or(ConfigError::SourcesNotFound(searched))
}

/// Ordered source names from a `vigil-config.json` body
pub fn parse_sources(contents: &str) -> Result<Vec<String>, serde_json::Error> {
    let config: VigilConfig = serde_json::from_str(contents)?;

    let mut sources = vec![SERVER_SOURCE.to_string()];
    for process in config.processes {
        if !sources.contains(&process.name) {
            sources.push(process.name);
        }
    }
    Ok(sources)
}

/// Find and read the source list
pub fn load_sources(explicit: Option<&Path>, dir: &Path) -> Result<Vec<String>, ConfigError> {
    let path = find_sources_file(explicit, dir)?;
    let contents = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;
    let sources =
        parse_sources(&contents).map_err(|source| ConfigError::SourcesParse { path, source })?;

    tracing::debug!("Loaded {} sources", sources.len());
    Ok(sources)
}
