//! Room create/join flow
//!
//! Tracks the client's single room: none, a create/join in flight, or
//! membership. Create and join share one pending slot.

use futures_util::FutureExt;
use tracing::{debug, info, warn};

use crate::error::{InputField, SessionError, TransportError};
use crate::transport::{RoomRequest, TransportHandle};
use crate::types::{Epoch, RoomId};

/// Which request is in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomOperation {
    Create,
    Join,
}

impl std::fmt::Display for RoomOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoomOperation::Create => f.write_str("create"),
            RoomOperation::Join => f.write_str("join"),
        }
    }
}

/// The room the client is a member of
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    /// Room identifier
    pub id: RoomId,
    /// How membership was obtained
    pub via: RoomOperation,
}

/// Room state machine: NoRoom → Pending → InRoom
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RoomState {
    #[default]
    NoRoom,
    Pending {
        operation: RoomOperation,
        /// Session epoch when the request was issued
        epoch: Epoch,
    },
    InRoom(Room),
}

/// Result of feeding a request outcome back in
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomCompletion {
    /// Membership established
    Joined(Room),
    /// Remote refused; still no room
    Failed(SessionError),
    /// Outcome belongs to a request this controller no longer waits for
    Stale,
}

/// An issued request, to be awaited off the session task
pub struct IssuedRequest {
    pub operation: RoomOperation,
    pub epoch: Epoch,
    pub request: RoomRequest<RoomId>,
}

/// Create/join flow and current membership
#[derive(Debug, Default)]
pub struct RoomController {
    state: RoomState,
}

impl RoomController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a create request
    pub fn create_room<H: TransportHandle>(
        &mut self,
        handle: &mut H,
        nickname: &str,
        epoch: Epoch,
    ) -> Result<IssuedRequest, SessionError> {
        require_non_empty(nickname, InputField::Nickname)?;
        self.claim(RoomOperation::Create, epoch)?;

        info!("Creating room as '{}' via {}", nickname, handle.id());
        Ok(IssuedRequest {
            operation: RoomOperation::Create,
            epoch,
            request: handle.create_room(nickname),
        })
    }

    /// Issue a join request for an existing room
    pub fn join_room<H: TransportHandle>(
        &mut self,
        handle: &mut H,
        nickname: &str,
        room_id: &str,
        epoch: Epoch,
    ) -> Result<IssuedRequest, SessionError> {
        require_non_empty(nickname, InputField::Nickname)?;
        require_non_empty(room_id, InputField::RoomId)?;
        self.claim(RoomOperation::Join, epoch)?;

        let room_id = RoomId::from_input(room_id);
        info!("Joining room {} as '{}' via {}", room_id, nickname, handle.id());
        let request = handle
            .join_room(nickname, &room_id)
            .map(move |result| result.map(|()| room_id))
            .boxed();
        Ok(IssuedRequest {
            operation: RoomOperation::Join,
            epoch,
            request,
        })
    }

    /// Take the pending slot, or explain why not
    fn claim(&mut self, operation: RoomOperation, epoch: Epoch) -> Result<(), SessionError> {
        match &self.state {
            RoomState::Pending { operation: held, .. } => {
                debug!("Rejecting {} while {} is pending", operation, held);
                Err(SessionError::RoomOperationPending)
            }
            RoomState::InRoom(_) => Err(SessionError::AlreadyInRoom),
            RoomState::NoRoom => {
                self.state = RoomState::Pending { operation, epoch };
                Ok(())
            }
        }
    }

    /// Apply the outcome of a request issued at `epoch`
    pub fn complete(
        &mut self,
        epoch: Epoch,
        outcome: Result<RoomId, TransportError>,
    ) -> RoomCompletion {
        let operation = match &self.state {
            RoomState::Pending {
                operation,
                epoch: issued,
            } if *issued == epoch => *operation,
            _ => {
                warn!("Discarding stale room result from epoch {}", epoch);
                return RoomCompletion::Stale;
            }
        };

        match outcome {
            Ok(id) => {
                info!("Room {} {} succeeded", id, operation);
                let room = Room { id, via: operation };
                self.state = RoomState::InRoom(room.clone());
                RoomCompletion::Joined(room)
            }
            Err(e) => {
                warn!("Room {} failed: {}", operation, e);
                self.state = RoomState::NoRoom;
                RoomCompletion::Failed(SessionError::RoomOperationFailed(e.to_string()))
            }
        }
    }

    /// Drop everything (reset)
    pub fn clear(&mut self) {
        self.state = RoomState::NoRoom;
    }

    pub fn state(&self) -> &RoomState {
        &self.state
    }

    pub fn room(&self) -> Option<&Room> {
        match &self.state {
            RoomState::InRoom(room) => Some(room),
            _ => None,
        }
    }

    pub fn is_member(&self) -> bool {
        self.room().is_some()
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, RoomState::Pending { .. })
    }
}

fn require_non_empty(value: &str, field: InputField) -> Result<(), SessionError> {
    if value.trim().is_empty() {
        Err(SessionError::InvalidInput(field))
    } else {
        Ok(())
    }
}
