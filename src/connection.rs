// Connection manager - live feed lifecycle and recovery
//
// State Diagram:
//
//   [Disconnected] ──start/reconnect──▶ [Connecting] ──Opened──▶ [Connected]
//         ▲                                  │                       │
//         │                                  │ Closed                │ Closed
//         │                                  ▼                       │
//         └───────── timer (fixed delay) ◀── [Disconnected] ◀────────┘
//
// The manager itself does no I/O. It drives a `Transport` (the WebSocket
// implementation lives below) and is fed back `AppEvent`s by the run loop.
// Every channel instance gets a fresh generation number; lifecycle events
// carrying an older generation are ignored, so at most one channel is ever
// live. Text frames are kept whatever their generation: each one was
// delivered exactly once and the server never replays it.

use crate::events::{AppEvent, ConnectionEvent, TransportError};
use futures::StreamExt;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;

/// One live-feed message
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Envelope {
    /// The Vigil server calls this field `process`
    #[serde(alias = "process")]
    pub source: String,
    pub data: String,
}

#[derive(Debug, Error)]
#[error("malformed envelope: {0}")]
pub struct EnvelopeError(#[from] serde_json::Error);

impl Envelope {
    pub fn parse(text: &str) -> Result<Self, EnvelopeError> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Connection status shown in the status bar
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionState {
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "Disconnected",
            ConnectionState::Connecting => "Connecting",
            ConnectionState::Connected => "Connected",
        }
    }
}

/// I/O side of the connection: opening channels and arming the retry timer
pub trait Transport {
    /// Open a channel; its events must be tagged with `generation`
    fn open(&mut self, generation: u64);

    /// Tear down the current channel, if any
    fn close(&mut self);

    /// Fire `AppEvent::ReconnectDue { generation }` once after `delay`
    fn schedule_reconnect(&mut self, delay: Duration, generation: u64);

    /// Cancel a pending reconnect timer, if any
    fn cancel_reconnect(&mut self);
}

/// Drives the live channel state machine
pub struct ConnectionManager<T: Transport> {
    transport: T,
    state: ConnectionState,
    generation: u64,
    reconnect_pending: bool,
    reconnect_delay: Duration,
}

impl<T: Transport> ConnectionManager<T> {
    pub fn new(transport: T, reconnect_delay: Duration) -> Self {
        Self {
            transport,
            state: ConnectionState::Disconnected,
            generation: 0,
            reconnect_pending: false,
            reconnect_delay,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    #[cfg(test)]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[cfg(test)]
    pub fn reconnect_pending(&self) -> bool {
        self.reconnect_pending
    }

    #[cfg(test)]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Enter `Connecting` with a brand new channel instance
    pub fn start(&mut self) {
        self.generation += 1;
        self.state = ConnectionState::Connecting;
        tracing::debug!("Opening live channel (generation {})", self.generation);
        self.transport.open(self.generation);
    }

    /// Manual reconnect: drop the timer and current channel, then open anew
    pub fn reconnect_now(&mut self) {
        self.cancel_timer();
        self.transport.close();
        tracing::info!("Manual reconnect requested");
        self.start();
    }

    pub fn on_opened(&mut self, generation: u64) {
        if generation != self.generation {
            return;
        }
        self.state = ConnectionState::Connected;
        self.cancel_timer();
        tracing::info!("Live channel connected");
    }

    /// Parse a text frame
    ///
    /// Frames still queued from a superseded channel are accepted too; the
    /// old task is aborted, so nothing new can follow them.
    pub fn on_message(&self, generation: u64, text: &str) -> Result<Envelope, EnvelopeError> {
        if generation != self.generation {
            tracing::trace!("Frame from earlier channel (generation {})", generation);
        }
        Envelope::parse(text)
    }

    pub fn on_closed(&mut self, generation: u64, error: Option<TransportError>) {
        if generation != self.generation || self.state == ConnectionState::Disconnected {
            return;
        }

        match error {
            Some(e) => tracing::warn!("Live channel lost: {}", e),
            None => tracing::warn!("Live channel closed by server"),
        }

        self.state = ConnectionState::Disconnected;
        self.transport.close();
        self.reconnect_pending = true;
        self.transport
            .schedule_reconnect(self.reconnect_delay, self.generation);
    }

    pub fn on_reconnect_due(&mut self, generation: u64) {
        if !self.reconnect_pending || generation != self.generation {
            return;
        }
        self.reconnect_pending = false;
        tracing::info!("Reconnecting to live feed");
        self.start();
    }

    /// Stop everything on shutdown
    pub fn shutdown(&mut self) {
        self.cancel_timer();
        self.transport.close();
        self.state = ConnectionState::Disconnected;
    }

    fn cancel_timer(&mut self) {
        self.reconnect_pending = false;
        self.transport.cancel_reconnect();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// WebSocket transport
// ─────────────────────────────────────────────────────────────────────────────

/// Transport backed by tokio-tungstenite; feeds the run loop's queue
pub struct WsTransport {
    url: String,
    events: mpsc::Sender<AppEvent>,
    channel: Option<JoinHandle<()>>,
    timer: Option<JoinHandle<()>>,
}

impl WsTransport {
    pub fn new(url: impl Into<String>, events: mpsc::Sender<AppEvent>) -> Self {
        Self {
            url: url.into(),
            events,
            channel: None,
            timer: None,
        }
    }
}

impl Transport for WsTransport {
    fn open(&mut self, generation: u64) {
        self.close();
        let url = self.url.clone();
        let events = self.events.clone();
        self.channel = Some(tokio::spawn(run_channel(url, generation, events)));
    }

    fn close(&mut self) {
        if let Some(handle) = self.channel.take() {
            handle.abort();
        }
    }

    fn schedule_reconnect(&mut self, delay: Duration, generation: u64) {
        self.cancel_reconnect();
        let events = self.events.clone();
        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = events.send(AppEvent::ReconnectDue { generation }).await;
        }));
    }

    fn cancel_reconnect(&mut self) {
        if let Some(handle) = self.timer.take() {
            handle.abort();
        }
    }
}

impl Drop for WsTransport {
    fn drop(&mut self) {
        self.close();
        self.cancel_reconnect();
    }
}

/// Own one WebSocket for its whole life, forwarding frames in arrival order
async fn run_channel(url: String, generation: u64, events: mpsc::Sender<AppEvent>) {
    let send = move |event: ConnectionEvent| {
        let events = events.clone();
        async move {
            events
                .send(AppEvent::Connection { generation, event })
                .await
                .is_ok()
        }
    };

    let mut ws = match tokio_tungstenite::connect_async(url.as_str()).await {
        Ok((ws, _)) => ws,
        Err(e) => {
            send(ConnectionEvent::Closed(Some(TransportError::Connect(
                e.to_string(),
            ))))
            .await;
            return;
        }
    };

    if !send(ConnectionEvent::Opened).await {
        return;
    }

    let reason = loop {
        match ws.next().await {
            Some(Ok(Message::Text(text))) => {
                if !send(ConnectionEvent::Message(text)).await {
                    return;
                }
            }
            Some(Ok(Message::Close(_))) | None => break None,
            // Pings are answered by tungstenite; binary frames aren't part of the feed
            Some(Ok(_)) => {}
            Some(Err(e)) => break Some(TransportError::Socket(e.to_string())),
        }
    };

    send(ConnectionEvent::Closed(reason)).await;
}

// ─────────────────────────────────────────────────────────────────────────────
// Test transport
// ─────────────────────────────────────────────────────────────────────────────


#[cfg(test)]
mod tests {
    use super::testing::{Call, RecordingTransport};
    use super::*;

    const DELAY: Duration = Duration::from_millis(2000);

    fn manager() -> ConnectionManager<RecordingTransport> {
        ConnectionManager::new(RecordingTransport::default(), DELAY)
    }

    #[test]
    fn test_envelope_accepts_process_and_source_keys() {
        let from_server = Envelope::parse(r#"{"process":"api","data":"hello\n"}"#).unwrap();
        let with_source_key = Envelope::parse(r#"{"source":"api","data":"hello\n"}"#).unwrap();
        assert_eq!(from_server, with_source_key);
        assert_eq!(from_server.data, "hello\n");
    }

    #[test]
    fn test_malformed_envelope_is_an_error() {
        assert!(Envelope::parse("not json").is_err());
        assert!(Envelope::parse(r#"{"process":"api"}"#).is_err());
        assert!(Envelope::parse(r#"{"process":1,"data":"x"}"#).is_err());
    }

    #[test]
    fn test_start_enters_connecting() {
        let mut cm = manager();
        assert_eq!(cm.state(), ConnectionState::Disconnected);
        cm.start();
        assert_eq!(cm.state(), ConnectionState::Connecting);
        assert_eq!(cm.transport().calls, vec![Call::Open(1)]);
    }

    #[test]
    fn test_opened_clears_pending_timer() {
        let mut cm = manager();
        cm.start();
        cm.on_opened(1);
        assert_eq!(cm.state(), ConnectionState::Connected);
        assert!(!cm.reconnect_pending());
        assert_eq!(cm.transport().calls.last(), Some(&Call::Cancel));
    }

    #[test]
    fn test_close_schedules_single_reconnect() {
        let mut cm = manager();
        cm.start();
        cm.on_opened(1);
        cm.on_closed(1, None);
        assert_eq!(cm.state(), ConnectionState::Disconnected);
        assert!(cm.reconnect_pending());

        // A duplicate close (e.g. error then close) must not schedule again
        cm.on_closed(1, Some(TransportError::Socket("reset".into())));
        let schedules = cm
            .transport()
            .calls
            .iter()
            .filter(|c| matches!(c, Call::Schedule(..)))
            .count();
        assert_eq!(schedules, 1);
        assert!(cm.transport().calls.contains(&Call::Schedule(DELAY, 1)));
    }

    #[test]
    fn test_reconnect_due_opens_new_generation() {
        let mut cm = manager();
        cm.start();
        cm.on_closed(1, Some(TransportError::Connect("refused".into())));
        cm.on_reconnect_due(1);
        assert_eq!(cm.state(), ConnectionState::Connecting);
        assert_eq!(cm.generation(), 2);
        assert_eq!(cm.transport().opens(), 2);
    }

    #[test]
    fn test_stale_timer_ignored() {
        let mut cm = manager();
        cm.start();
        cm.on_closed(1, None);
        // Manual reconnect supersedes the scheduled retry
        cm.reconnect_now();
        assert_eq!(cm.generation(), 2);
        cm.on_reconnect_due(1);
        assert_eq!(cm.generation(), 2);
        assert_eq!(cm.transport().opens(), 2);
    }

    #[test]
    fn test_manual_reconnect_cancels_before_opening() {
        let mut cm = manager();
        cm.start();
        cm.on_closed(1, None);
        cm.reconnect_now();

        let calls = &cm.transport().calls;
        let cancel = calls.iter().rposition(|c| *c == Call::Cancel).unwrap();
        let close = calls.iter().rposition(|c| *c == Call::Close).unwrap();
        let open = calls.iter().rposition(|c| *c == Call::Open(2)).unwrap();
        assert!(cancel < open);
        assert!(close < open);
        assert!(!cm.reconnect_pending());
    }

    #[test]
    fn test_frames_queued_from_old_channel_still_parse() {
        let mut cm = manager();
        cm.start();
        cm.reconnect_now();
        let old = cm.on_message(1, r#"{"process":"api","data":"x"}"#).unwrap();
        assert_eq!(old.source, "api");
        assert!(cm.on_message(2, r#"{"process":"api","data":"y"}"#).is_ok());
        assert_eq!(cm.generation(), 2);
    }

    #[test]
    fn test_close_from_old_channel_ignored() {
        let mut cm = manager();
        cm.start();
        cm.reconnect_now();
        cm.on_opened(2);
        cm.on_closed(1, None);
        assert_eq!(cm.state(), ConnectionState::Connected);
    }
}
