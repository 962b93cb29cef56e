//! Connection lifecycle
//!
//! `ConnectionManager` owns the one transport handle of a session and tracks
//! whether the transport has reported ready or closed.

use tracing::{debug, info, warn};

use crate::error::SessionError;
use crate::message::OutboundMessage;
use crate::transport::{Connector, EventSink, TransportHandle};
use crate::types::{Epoch, HandleId};

/// Connection state as reported by transport callbacks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connected,
}

/// Owner of the live transport handle
pub struct ConnectionManager<C: Connector> {
    connector: C,
    /// Live handle and the epoch its sink is stamped with
    live: Option<(Epoch, C::Handle)>,
    state: ConnectionState,
}

impl<C: Connector> ConnectionManager<C> {
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            live: None,
            state: ConnectionState::Disconnected,
        }
    }

    /// Create the handle for `sink`'s epoch
    ///
    /// Refuses if a handle is still live: the old one must be torn down
    /// first so two handlers never receive events at the same time.
    pub fn initialize(&mut self, sink: EventSink) -> Result<HandleId, SessionError> {
        if let Some((epoch, _)) = &self.live {
            warn!("initialize called while handle for epoch {} is live", epoch);
            return Err(SessionError::HandleAlreadyLive(*epoch));
        }

        let epoch = sink.epoch();
        let handle = self.connector.connect(sink);
        let id = handle.id();
        info!("Transport handle {} created for epoch {}", id, epoch);

        self.live = Some((epoch, handle));
        self.state = ConnectionState::Disconnected;
        Ok(id)
    }

    /// Release the live handle, if any
    pub fn teardown(&mut self) {
        if let Some((epoch, handle)) = self.live.take() {
            info!("Tearing down transport handle {} (epoch {})", handle.id(), epoch);
            handle.teardown();
        }
        self.state = ConnectionState::Disconnected;
    }

    /// Whether an event stamped with `epoch` comes from the live handle
    pub fn accepts(&self, epoch: Epoch) -> bool {
        matches!(&self.live, Some((live, _)) if *live == epoch)
    }

    /// Transport reported ready
    pub fn on_ready(&mut self) {
        info!("Connected to chat server");
        self.state = ConnectionState::Connected;
    }

    /// Transport reported closed
    pub fn on_closed(&mut self) {
        info!("Disconnected from chat server");
        self.state = ConnectionState::Disconnected;
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// The live handle, only while connected
    pub fn connected_handle(&mut self) -> Result<&mut C::Handle, SessionError> {
        match (&mut self.live, self.state) {
            (Some((_, handle)), ConnectionState::Connected) => Ok(handle),
            _ => Err(SessionError::NotConnected),
        }
    }

    /// Transmit a message over the live handle
    pub fn send(&mut self, message: OutboundMessage) -> Result<(), SessionError> {
        let handle = self.connected_handle()?;
        debug!("Sending {:?} via {}", message.message_type(), handle.id());
        handle.send_message(message).map_err(|e| {
            warn!("Transmission failed: {}", e);
            SessionError::TransportClosed
        })
    }
}
