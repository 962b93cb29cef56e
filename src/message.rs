//! Message protocol definitions
//!
//! Typed payloads exchanged with the transport, plus the JSON frames the
//! WebSocket adapter puts on the wire. Frames use Serde's internally tagged
//! enums with snake_case naming.

use chrono::{Local, TimeZone};
use serde::{Deserialize, Serialize};

use crate::error::TransportError;
use crate::types::{RequestId, RoomId};

/// Message-type tag shared by inbound and outbound messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    /// A chat line
    ChatMessage,
    /// A typing-presence signal or aggregate
    TypingPresence,
}

/// A chat message as delivered by the server
///
/// Immutable once received. `timestamp` is server-assigned, in milliseconds
/// since the Unix epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub user_nickname: String,
    pub body: String,
    pub timestamp: u64,
    #[serde(default)]
    pub is_system_message: bool,
}

impl ChatMessage {
    /// Local wall-clock time of the message as `HH:MM:SS`
    pub fn time_of_day(&self) -> String {
        let millis = i64::try_from(self.timestamp).unwrap_or(i64::MAX);
        match Local.timestamp_millis_opt(millis).single() {
            Some(at) => at.format("%H:%M:%S").to_string(),
            None => "--:--:--".to_string(),
        }
    }
}

/// Aggregated set of room members currently typing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypingPresenceUpdate {
    #[serde(default)]
    pub users_typing: Vec<String>,
}

/// Transport → core message, tagged by type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundMessage {
    ChatMessage(ChatMessage),
    TypingPresence(TypingPresenceUpdate),
}

impl InboundMessage {
    pub fn message_type(&self) -> MessageType {
        match self {
            InboundMessage::ChatMessage(_) => MessageType::ChatMessage,
            InboundMessage::TypingPresence(_) => MessageType::TypingPresence,
        }
    }
}

/// Core → transport message, tagged by type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundMessage {
    /// Post a chat line to the current room
    SendMessage { body: String },
    /// Report whether the local user is typing
    SetTypingPresence { typing: bool },
}

impl OutboundMessage {
    pub fn message_type(&self) -> MessageType {
        match self {
            OutboundMessage::SendMessage { .. } => MessageType::ChatMessage,
            OutboundMessage::SetTypingPresence { .. } => MessageType::TypingPresence,
        }
    }
}

/// Client → Server frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    /// Create a new room and join it
    CreateRoom {
        request_id: RequestId,
        nickname: String,
    },
    /// Join an existing room by id
    JoinRoom {
        request_id: RequestId,
        nickname: String,
        room_id: RoomId,
    },
    /// Send a chat message
    SendMessage { body: String },
    /// Typing indicator
    SetTypingPresence { typing: bool },
}

impl From<OutboundMessage> for ClientFrame {
    fn from(msg: OutboundMessage) -> Self {
        match msg {
            OutboundMessage::SendMessage { body } => ClientFrame::SendMessage { body },
            OutboundMessage::SetTypingPresence { typing } => {
                ClientFrame::SetTypingPresence { typing }
            }
        }
    }
}

/// Server → Client frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    /// Room created, id allocated by the server
    RoomCreated {
        request_id: RequestId,
        room_id: RoomId,
    },
    /// Room joined
    RoomJoined { request_id: RequestId },
    /// A create/join request was refused
    RequestFailed {
        request_id: RequestId,
        reason: String,
    },
    /// Chat message broadcast to the room
    ChatMessage(ChatMessage),
    /// Aggregated typing set for the room
    TypingPresence(TypingPresenceUpdate),
}

/// Successful answer to a create/join request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomReply {
    Created(RoomId),
    Joined,
}

/// A server frame sorted into request replies and pushed events
#[derive(Debug)]
pub enum Routed {
    Reply(RequestId, Result<RoomReply, TransportError>),
    Event(InboundMessage),
}

impl ServerFrame {
    /// Split into a request reply or a pushed inbound message
    pub fn route(self) -> Routed {
        match self {
            ServerFrame::RoomCreated {
                request_id,
                room_id,
            } => Routed::Reply(request_id, Ok(RoomReply::Created(room_id))),
            ServerFrame::RoomJoined { request_id } => {
                Routed::Reply(request_id, Ok(RoomReply::Joined))
            }
            ServerFrame::RequestFailed { request_id, reason } => {
                Routed::Reply(request_id, Err(TransportError::Rejected(reason)))
            }
            ServerFrame::ChatMessage(msg) => Routed::Event(InboundMessage::ChatMessage(msg)),
            ServerFrame::TypingPresence(update) => {
                Routed::Event(InboundMessage::TypingPresence(update))
            }
        }
    }
}
