//! Session handle
//!
//! The presentation layer's entry point. Each user intent becomes a
//! [`SessionCommand`] carrying a oneshot reply; the session actor answers
//! once the intent has been applied (for create/join: once the request has
//! been issued, not resolved).

use tokio::sync::{mpsc, oneshot, watch};

use crate::error::SessionError;
use crate::view::ViewModel;

pub(crate) type Reply<T> = oneshot::Sender<Result<T, SessionError>>;

/// Commands sent from handles to the session actor
#[derive(Debug)]
pub(crate) enum SessionCommand {
    CreateRoom {
        nickname: String,
        reply: Reply<()>,
    },
    JoinRoom {
        nickname: String,
        room_id: String,
        reply: Reply<()>,
    },
    LeaveRoom {
        reply: Reply<()>,
    },
    InputChanged {
        text: String,
        reply: Reply<()>,
    },
    SendMessage {
        body: String,
        reply: Reply<()>,
    },
    Shutdown,
}

/// Cloneable front door to a running [`crate::ChatSession`]
///
/// The session shuts down once every handle is dropped.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
    view: watch::Receiver<ViewModel>,
}

impl SessionHandle {
    pub(crate) fn new(
        commands: mpsc::Sender<SessionCommand>,
        view: watch::Receiver<ViewModel>,
    ) -> Self {
        Self { commands, view }
    }

    /// Create a new room under `nickname`
    pub async fn create_room(&self, nickname: impl Into<String>) -> Result<(), SessionError> {
        let nickname = nickname.into();
        self.request(|reply| SessionCommand::CreateRoom { nickname, reply })
            .await
    }

    /// Join room `room_id` under `nickname`
    pub async fn join_room(
        &self,
        nickname: impl Into<String>,
        room_id: impl Into<String>,
    ) -> Result<(), SessionError> {
        let (nickname, room_id) = (nickname.into(), room_id.into());
        self.request(|reply| SessionCommand::JoinRoom {
            nickname,
            room_id,
            reply,
        })
        .await
    }

    /// Leave the room; resets the whole session
    pub async fn leave_room(&self) -> Result<(), SessionError> {
        self.request(|reply| SessionCommand::LeaveRoom { reply }).await
    }

    /// Composer text changed
    pub async fn input_changed(&self, text: impl Into<String>) -> Result<(), SessionError> {
        let text = text.into();
        self.request(|reply| SessionCommand::InputChanged { text, reply })
            .await
    }

    /// Send a chat message
    pub async fn send_message(&self, body: impl Into<String>) -> Result<(), SessionError> {
        let body = body.into();
        self.request(|reply| SessionCommand::SendMessage { body, reply })
            .await
    }

    /// Stop the session and release its transport
    pub async fn shutdown(&self) {
        let _ = self.commands.send(SessionCommand::Shutdown).await;
    }

    /// Latest published view
    pub fn snapshot(&self) -> ViewModel {
        self.view.borrow().clone()
    }

    /// A receiver notified on every published view
    pub fn view(&self) -> watch::Receiver<ViewModel> {
        self.view.clone()
    }

    async fn request<F>(&self, make: F) -> Result<(), SessionError>
    where
        F: FnOnce(Reply<()>) -> SessionCommand,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(make(reply_tx))
            .await
            .map_err(|_| SessionError::SessionClosed)?;
        reply_rx.await.map_err(|_| SessionError::SessionClosed)?
    }
}
