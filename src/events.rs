// Events that flow into the viewer's single run loop
//
// Every producer (terminal input thread, WebSocket task, reconnect timer,
// snapshot fetches) only sends `AppEvent`s; none of them touch viewer state.
// The run loop handles one event at a time to completion, which is what keeps
// buffer appends serialized without any locking.

use crate::snapshot::BackfillError;
use thiserror::Error;

/// Main event type that flows through the application
#[derive(Debug)]
pub enum AppEvent {
    /// Keyboard, mouse or resize event from the terminal
    Input(crossterm::event::Event),

    /// Something happened on a live channel
    ///
    /// `generation` identifies which channel instance produced the event;
    /// events from superseded channels are ignored.
    Connection {
        generation: u64,
        event: ConnectionEvent,
    },

    /// The fixed reconnect delay elapsed
    ReconnectDue { generation: u64 },

    /// A startup snapshot fetch finished (successfully or not)
    Snapshot {
        source: String,
        outcome: Result<Vec<String>, BackfillError>,
    },
}

/// Lifecycle and data events from one channel instance
#[derive(Debug)]
pub enum ConnectionEvent {
    /// Handshake completed
    Opened,
    /// A text frame arrived (raw, unparsed envelope)
    Message(String),
    /// The channel is gone; `None` means a clean close by the server
    Closed(Option<TransportError>),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("connect failed: {0}")]
    Connect(String),
    #[error("socket error: {0}")]
    Socket(String),
}
