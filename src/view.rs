//! View model handed to the presentation layer
//!
//! A full snapshot is published after every state change; the presentation
//! layer never reads session internals directly.

use crate::connection::ConnectionState;
use crate::error::SessionError;
use crate::feed::FeedEntry;
use crate::room::RoomState;
use crate::types::{Epoch, RoomId};

/// Which screen the presentation layer should show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    #[default]
    AwaitingConnection,
    RoomSelection,
    InRoomChat,
}

impl Screen {
    /// Derive from connection and room state
    ///
    /// Membership wins so a dropped connection keeps the chat visible (with
    /// a disconnected status) until the user resets.
    pub fn derive(connection: ConnectionState, room: &RoomState) -> Self {
        match (room, connection) {
            (RoomState::InRoom(_), _) => Screen::InRoomChat,
            (_, ConnectionState::Connected) => Screen::RoomSelection,
            (_, ConnectionState::Disconnected) => Screen::AwaitingConnection,
        }
    }
}

/// Snapshot of everything the presentation layer renders
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ViewModel {
    /// Session generation; changes on every reset
    pub epoch: Epoch,
    pub connection: ConnectionState,
    pub screen: Screen,
    /// Set once membership is established
    pub room_id: Option<RoomId>,
    /// A create/join request is in flight
    pub room_pending: bool,
    /// Local nickname (empty until a create/join is issued)
    pub nickname: String,
    /// Composer text
    pub draft: String,
    /// Feed in arrival order, classified against `nickname`
    pub messages: Vec<FeedEntry>,
    /// Latest remote typing set
    pub users_typing: Vec<String>,
    /// Scroll decision of the latest feed or typing change; kept across
    /// unrelated updates
    pub scroll_to_bottom: bool,
    /// Bumped each time a feed or typing change calls for scrolling
    pub scroll_seq: u64,
    pub last_error: Option<SessionError>,
}

impl ViewModel {
    /// Text of the typing indicator, if it should be shown
    pub fn typing_indicator(&self) -> Option<&'static str> {
        if self.users_typing.is_empty() {
            None
        } else {
            Some("Someone is typing...")
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connection == ConnectionState::Connected
    }

    /// Whether create is currently allowed
    pub fn can_create(&self, nickname: &str) -> bool {
        self.is_connected() && !self.room_pending && !nickname.trim().is_empty()
    }

    /// Whether join is currently allowed
    pub fn can_join(&self, nickname: &str, room_id: &str) -> bool {
        self.can_create(nickname) && !room_id.trim().is_empty()
    }

    /// Whether the current draft can be sent
    pub fn can_send(&self) -> bool {
        self.is_connected() && self.screen == Screen::InRoomChat && !self.draft.trim().is_empty()
    }
}
