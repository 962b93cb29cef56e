//! Transport collaborator interface
//!
//! The session never talks to a socket directly. It asks a [`Connector`] for
//! a [`TransportHandle`] and hands it an [`EventSink`]; the transport reports
//! back through the sink's three callback slots (ready, closed, message).
//!
//! Every sink is stamped with the epoch it was created for, so events from a
//! handle that has since been torn down are recognised and dropped.

use futures_util::future::BoxFuture;
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::{SendError, TransportError};
use crate::message::{InboundMessage, OutboundMessage};
use crate::session::SessionInput;
use crate::types::{Epoch, HandleId, RoomId};

/// Pending create/join request
pub type RoomRequest<T> = BoxFuture<'static, Result<T, TransportError>>;

/// Lifecycle and message events delivered by a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Connection established
    Ready,
    /// Connection lost or closed
    Closed,
    /// Inbound message, tagged by type
    Message(InboundMessage),
}

/// Callback slots handed to a transport on connect
#[derive(Debug, Clone)]
pub struct EventSink {
    epoch: Epoch,
    tx: mpsc::Sender<SessionInput>,
}

impl EventSink {
    pub(crate) fn new(epoch: Epoch, tx: mpsc::Sender<SessionInput>) -> Self {
        Self { epoch, tx }
    }

    /// Epoch this sink belongs to
    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    /// Report that the connection is up
    pub async fn on_ready(&self) -> Result<(), SendError> {
        self.deliver(TransportEvent::Ready).await
    }

    /// Report that the connection is gone
    pub async fn on_closed(&self) -> Result<(), SendError> {
        self.deliver(TransportEvent::Closed).await
    }

    /// Deliver an inbound message
    pub async fn on_message(&self, message: InboundMessage) -> Result<(), SendError> {
        self.deliver(TransportEvent::Message(message)).await
    }

    async fn deliver(&self, event: TransportEvent) -> Result<(), SendError> {
        self.tx
            .send(SessionInput::Transport {
                epoch: self.epoch,
                event,
            })
            .await
            .map_err(|_| {
                debug!("Session gone, dropping transport event for epoch {}", self.epoch);
                SendError::ChannelClosed
            })
    }
}

/// A live realtime-session handle
pub trait TransportHandle: Send + 'static {
    /// Identifier used in logs
    fn id(&self) -> HandleId;

    /// Ask the server to allocate a room and join it
    fn create_room(&mut self, nickname: &str) -> RoomRequest<RoomId>;

    /// Join an existing room
    fn join_room(&mut self, nickname: &str, room_id: &RoomId) -> RoomRequest<()>;

    /// Fire-and-forget transmission
    fn send_message(&mut self, message: OutboundMessage) -> Result<(), TransportError>;

    /// Detach callbacks and release the connection
    fn teardown(self);
}

/// Factory for transport handles
pub trait Connector: Send + 'static {
    type Handle: TransportHandle;

    /// Create a handle wired to `sink`. Must not block; connection progress
    /// is reported through the sink.
    fn connect(&mut self, sink: EventSink) -> Self::Handle;
}
