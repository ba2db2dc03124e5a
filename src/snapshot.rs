// Snapshot loader - one-shot historical backfill per source
//
// At startup each source's log file is fetched once from the server
// (GET /logs/{name}.log). Fetches run as independent tasks so a slow or
// failing source never holds up the others; each completion is posted to the
// run loop as an `AppEvent::Snapshot`, where the lines are appended.

use crate::events::AppEvent;
use regex::Regex;
use reqwest::Url;
use std::sync::LazyLock;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;

/// CSI sequences: ESC [ parameter bytes, intermediate bytes, final byte
static CSI_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b\[[0-?]*[ -/]*[@-~]").expect("CSI regex must compile"));

/// How long a single snapshot request may take before it counts as failed
const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Error)]
pub enum BackfillError {
    #[error("cannot build snapshot url from '{0}'")]
    InvalidUrl(String),
    #[error("snapshot request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("snapshot request returned HTTP {0}")]
    Status(u16),
}

/// Remove terminal color/cursor escapes from a line
pub fn strip_ansi(text: &str) -> String {
    CSI_RE.replace_all(text, "").into_owned()
}

/// Split a snapshot body into cleaned lines with their terminator restored
///
/// A trailing fragment after the final newline is only a line if it has
/// content; `"a\nb\n"` yields two lines, `"a\nb"` also yields two.
pub fn snapshot_lines(body: &str) -> Vec<String> {
    let mut pieces: Vec<&str> = body.split('\n').collect();
    if pieces.last().is_some_and(|last| last.is_empty()) {
        pieces.pop();
    }

    pieces
        .into_iter()
        .map(|line| {
            let mut cleaned = strip_ansi(line.strip_suffix('\r').unwrap_or(line));
            cleaned.push('\n');
            cleaned
        })
        .collect()
}

/// Fetches per-source history from the Vigil server
#[derive(Clone)]
pub struct SnapshotLoader {
    client: reqwest::Client,
    base_url: Url,
}

impl SnapshotLoader {
    pub fn new(base_url: Url) -> Self {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Falling back to default HTTP client: {}", e);
                reqwest::Client::new()
            });

        Self { client, base_url }
    }

    /// URL of a source's log file: `{base}/logs/{source}.log`
    pub fn log_url(&self, source: &str) -> Result<Url, BackfillError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| BackfillError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .push("logs")
            .push(&format!("{}.log", source));
        Ok(url)
    }

    /// Fetch and clean the full history of one source
    pub async fn load_initial(&self, source: &str) -> Result<Vec<String>, BackfillError> {
        let url = self.log_url(source)?;
        tracing::debug!("Fetching snapshot for {} from {}", source, url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(BackfillError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        Ok(snapshot_lines(&body))
    }

    /// Start one fetch per source; each completion becomes an `AppEvent`
    pub fn spawn_all(&self, sources: &[String], events: mpsc::Sender<AppEvent>) {
        for source in sources {
            let loader = self.clone();
            let source = source.clone();
            let events = events.clone();
            tokio::spawn(async move {
                let outcome = loader.load_initial(&source).await;
                // Receiver gone means the viewer is shutting down
                let _ = events.send(AppEvent::Snapshot { source, outcome }).await;
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_color_codes() {
        assert_eq!(strip_ansi("\x1b[31mERROR\x1b[0m"), "ERROR");
    }

    #[test]
    fn test_strip_cursor_and_private_sequences() {
        assert_eq!(strip_ansi("\x1b[2K\x1b[1Gready\x1b[?25h"), "ready");
        assert_eq!(strip_ansi("\x1b[1;32m✓\x1b[39m compiled"), "✓ compiled");
    }

    #[test]
    fn test_plain_text_untouched() {
        assert_eq!(strip_ansi("GET /api [200]"), "GET /api [200]");
    }

    #[test]
    fn test_snapshot_lines_restore_terminator() {
        let lines = snapshot_lines("\x1b[32mstarted\x1b[0m\nlistening on :3000\n");
        assert_eq!(lines, vec!["started\n", "listening on :3000\n"]);
    }

    #[test]
    fn test_snapshot_lines_without_trailing_newline() {
        assert_eq!(snapshot_lines("a\nb"), vec!["a\n", "b\n"]);
    }

    #[test]
    fn test_snapshot_lines_keep_blank_lines() {
        assert_eq!(snapshot_lines("a\n\nb\n"), vec!["a\n", "\n", "b\n"]);
    }

    #[test]
    fn test_snapshot_lines_empty_body() {
        assert!(snapshot_lines("").is_empty());
    }

    #[test]
    fn test_snapshot_lines_strip_carriage_return() {
        assert_eq!(snapshot_lines("win\r\n"), vec!["win\n"]);
    }

    #[test]
    fn test_log_url() {
        let loader = SnapshotLoader::new(Url::parse("http://localhost:3333").unwrap());
        assert_eq!(
            loader.log_url("next-dev").unwrap().as_str(),
            "http://localhost:3333/logs/next-dev.log"
        );

        let nested = SnapshotLoader::new(Url::parse("http://host:1/vigil/").unwrap());
        assert_eq!(
            nested.log_url("db").unwrap().as_str(),
            "http://host:1/vigil/logs/db.log"
        );
    }

    #[tokio::test]
    async fn test_unreachable_server_is_a_backfill_error() {
        // Port 9 (discard) on localhost is not expected to serve HTTP
        let loader = SnapshotLoader::new(Url::parse("http://127.0.0.1:9").unwrap());
        assert!(loader.load_initial("api").await.is_err());
    }
}
