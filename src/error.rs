//! Error types for the chat client
//!
//! Defines session-level errors reported to the presentation layer,
//! transport errors raised by the WebSocket adapter, and configuration errors.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

use crate::types::Epoch;

/// Which piece of user input failed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputField {
    Nickname,
    RoomId,
    MessageBody,
}

impl std::fmt::Display for InputField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            InputField::Nickname => "nickname",
            InputField::RoomId => "room id",
            InputField::MessageBody => "message body",
        };
        f.write_str(name)
    }
}

/// Session-level errors
///
/// None of these are fatal: they are returned to the caller and recorded as
/// the view's last error. After `NotConnected` or `TransportClosed` the only
/// recovery path is a reset.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Operation needs a live connection but the session is disconnected
    #[error("Not connected to chat server")]
    NotConnected,

    /// Empty or whitespace-only input, rejected before any transport call
    #[error("Invalid input: {0} must not be empty")]
    InvalidInput(InputField),

    /// Remote rejected create/join (retryable)
    #[error("Room operation failed: {0}")]
    RoomOperationFailed(String),

    /// Transport reported closed or refused a transmission
    #[error("Transport closed")]
    TransportClosed,

    /// A create or join request is already in flight
    #[error("A room operation is already pending")]
    RoomOperationPending,

    /// Operation needs room membership
    #[error("Not in a room")]
    NotInRoom,

    /// Create/join attempted while already a member
    #[error("Already in a room")]
    AlreadyInRoom,

    /// A second handle was requested for an epoch that still has one
    #[error("Transport handle already live for epoch {0}")]
    HandleAlreadyLive(Epoch),

    /// The session actor has shut down
    #[error("Session closed")]
    SessionClosed,
}

/// Transport errors
///
/// Raised by transport collaborators; the session maps them onto
/// `SessionError` before anything reaches the user.
#[derive(Debug, Error)]
pub enum TransportError {
    /// WebSocket protocol error
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// JSON serialization/deserialization error
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Server answered a request with an error
    #[error("Rejected by server: {0}")]
    Rejected(String),

    /// Server answered a request with the wrong kind of reply
    #[error("Unexpected reply from server")]
    UnexpectedReply,

    /// The connection is gone
    #[error("Connection closed")]
    Closed,
}

/// Message send errors
///
/// Occurs when a transport tries to deliver an event to a session that has
/// already shut down.
#[derive(Debug, Error)]
pub enum SendError {
    /// The receiving end of the channel has been closed
    #[error("Channel closed")]
    ChannelClosed,
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable held a value that could not be parsed
    #[error("Invalid value for {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },
}
