use axum::extract::ws::Utf8Bytes;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Opaque ID type for connections
pub type ConnectionId = String;

/// Generate a fresh connection ID
pub fn new_connection_id() -> ConnectionId {
    ulid::Ulid::new().to_string()
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConnectionError {
    #[error("invalid connection state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: ConnectionState,
        to: ConnectionState,
    },
}

/// A single client's channel, as seen by the registry.
///
/// The outbound queue carries already-serialized text frames; the session task that
/// owns the socket drains it.
#[derive(Debug, Clone)]
pub struct Connection {
    pub id: ConnectionId,
    state: ConnectionState,
    outbound: mpsc::Sender<Utf8Bytes>,
}

impl Connection {
    /// Create a connection in the `Connecting` state
    pub fn new(id: ConnectionId, outbound: mpsc::Sender<Utf8Bytes>) -> Self {
        Self {
            id,
            state: ConnectionState::Connecting,
            outbound,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == ConnectionState::Open
    }

    fn is_valid_transition(from: ConnectionState, to: ConnectionState) -> bool {
        use ConnectionState::*;

        matches!(
            (from, to),
            (Connecting, Open) | (Connecting, Closed) | (Open, Closed)
        )
    }

    /// Move to `to`, rejecting anything outside Connecting -> Open -> Closed
    pub fn transition(&mut self, to: ConnectionState) -> Result<(), ConnectionError> {
        if !Self::is_valid_transition(self.state, to) {
            return Err(ConnectionError::InvalidTransition {
                from: self.state,
                to,
            });
        }
        self.state = to;
        Ok(())
    }

    /// Queue a frame without waiting. Only open connections accept frames.
    pub fn try_deliver(&self, frame: Utf8Bytes) -> Result<(), DeliveryError> {
        if !self.is_open() {
            return Err(DeliveryError::NotOpen);
        }
        self.outbound.try_send(frame).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => DeliveryError::Full,
            mpsc::error::TrySendError::Closed(_) => DeliveryError::Closed,
        })
    }
}

/// Why a single recipient did not get a frame
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("connection is not open")]
    NotOpen,
    #[error("outbound queue is full")]
    Full,
    #[error("outbound queue is closed")]
    Closed,
}

/// One inbound chat message on its way to the broadcast engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub sender: ConnectionId,
    pub payload: String,
}
