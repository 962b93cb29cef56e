//! Message feed
//!
//! The ordered, append-only list of chat messages for the current room, the
//! auto-scroll policy used when presenting it, and the outgoing send path.

use tracing::debug;

use crate::connection::ConnectionManager;
use crate::error::{InputField, SessionError};
use crate::message::{ChatMessage, OutboundMessage};
use crate::transport::Connector;

/// How a message is presented relative to the local user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// Sent under the local nickname
    Own,
    /// Sent by someone else
    Other,
    /// Generated by the server
    System,
}

/// Classify by nickname equality; the only identity the protocol offers.
/// Two participants sharing a nickname both classify as `Own`.
pub fn classify(message: &ChatMessage, local_nickname: &str) -> MessageKind {
    if message.is_system_message {
        MessageKind::System
    } else if message.user_nickname == local_nickname {
        MessageKind::Own
    } else {
        MessageKind::Other
    }
}

/// A message together with its presentation class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    pub message: ChatMessage,
    pub kind: MessageKind,
}

/// What just changed in the presented chat area
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedChange {
    MessageAppended,
    TypingChanged,
}

/// Scroll to the bottom unless the only change is a typing update while
/// someone is typing.
pub fn should_auto_scroll(change: FeedChange, typing_set_empty: bool) -> bool {
    typing_set_empty || change == FeedChange::MessageAppended
}

/// Append-only sequence of received messages, in arrival order
#[derive(Debug, Default)]
pub struct MessageFeed {
    messages: Vec<ChatMessage>,
}

impl MessageFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append to the tail
    pub fn append_incoming(&mut self, message: ChatMessage) -> FeedChange {
        debug!(
            "Feed +1 from '{}' (ts {}), {} total",
            message.user_nickname,
            message.timestamp,
            self.messages.len() + 1
        );
        self.messages.push(message);
        FeedChange::MessageAppended
    }

    /// Transmit a chat message followed by typing=false
    ///
    /// The body goes out untrimmed. The message is not appended here; the
    /// server echoes it back as an inbound message.
    pub fn send_outgoing<C: Connector>(
        &self,
        connection: &mut ConnectionManager<C>,
        is_member: bool,
        body: &str,
    ) -> Result<(), SessionError> {
        if !connection.is_connected() {
            return Err(SessionError::NotConnected);
        }
        if !is_member {
            return Err(SessionError::NotInRoom);
        }
        if body.trim().is_empty() {
            return Err(SessionError::InvalidInput(InputField::MessageBody));
        }

        connection.send(OutboundMessage::SendMessage {
            body: body.to_string(),
        })?;
        connection.send(OutboundMessage::SetTypingPresence { typing: false })
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Messages paired with their presentation class
    pub fn entries(&self, local_nickname: &str) -> Vec<FeedEntry> {
        self.messages
            .iter()
            .map(|message| FeedEntry {
                kind: classify(message, local_nickname),
                message: message.clone(),
            })
            .collect()
    }
}
