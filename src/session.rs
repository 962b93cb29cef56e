//! ChatSession actor implementation
//!
//! The single owner of all client state: connection, room, feed and typing
//! presence. User commands, transport events, timer firings and async room
//! results all arrive over mpsc channels and are applied one at a time, so
//! no locks are needed.
//!
//! Leaving a room resets the whole session: state is cleared, the epoch is
//! bumped and the transport handle is replaced. Anything asynchronous that
//! was started before the reset carries the old epoch and is ignored when it
//! comes back.

use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use crate::config::SessionConfig;
use crate::connection::ConnectionManager;
use crate::error::{SessionError, TransportError};
use crate::feed::{should_auto_scroll, FeedChange, MessageFeed};
use crate::handle::{Reply, SessionCommand, SessionHandle};
use crate::message::InboundMessage;
use crate::room::{IssuedRequest, RoomCompletion, RoomController};
use crate::transport::{Connector, EventSink, TransportEvent};
use crate::types::{Epoch, RoomId};
use crate::typing::TypingPresenceController;
use crate::view::{Screen, ViewModel};

/// Internal inputs: transport callbacks and completions of work the session
/// spawned. All are stamped with the epoch they belong to.
#[derive(Debug)]
pub(crate) enum SessionInput {
    /// Event from the transport handle of `epoch`
    Transport { epoch: Epoch, event: TransportEvent },
    /// A create/join request issued in `epoch` finished
    RoomResolved {
        epoch: Epoch,
        outcome: Result<RoomId, TransportError>,
    },
    /// The typing quiet window armed as `generation` elapsed
    TypingQuiet { epoch: Epoch, generation: u64 },
}

/// The chat session actor
pub struct ChatSession<C: Connector> {
    config: SessionConfig,
    /// Generation counter, bumped on every reset
    epoch: Epoch,
    connection: ConnectionManager<C>,
    rooms: RoomController,
    feed: MessageFeed,
    typing: TypingPresenceController,
    /// Local identity; empty until a create/join is issued
    nickname: String,
    draft: String,
    last_error: Option<SessionError>,
    /// Scroll decision of the latest feed/typing change
    scroll_to_bottom: bool,
    scroll_seq: u64,
    /// Handle → session commands
    commands: mpsc::Receiver<SessionCommand>,
    /// Transport/timer/request → session inputs
    inputs: mpsc::Receiver<SessionInput>,
    /// Cloned into sinks, timers and request tasks
    inputs_tx: mpsc::Sender<SessionInput>,
    view_tx: watch::Sender<ViewModel>,
}

impl<C: Connector> ChatSession<C> {
    /// Create the first transport handle and spawn the session task
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(connector: C, config: SessionConfig) -> SessionHandle {
        let (cmd_tx, cmd_rx) = mpsc::channel(config.channel_buffer);
        let (inputs_tx, inputs_rx) = mpsc::channel(config.channel_buffer);
        let (view_tx, view_rx) = watch::channel(ViewModel::default());

        let mut session = Self {
            typing: TypingPresenceController::new(config.typing_quiet_window),
            config,
            epoch: Epoch::default(),
            connection: ConnectionManager::new(connector),
            rooms: RoomController::new(),
            feed: MessageFeed::new(),
            nickname: String::new(),
            draft: String::new(),
            last_error: None,
            scroll_to_bottom: false,
            scroll_seq: 0,
            commands: cmd_rx,
            inputs: inputs_rx,
            inputs_tx,
            view_tx,
        };

        if let Err(e) = session.initialize_connection() {
            error!("Failed to create transport handle: {}", e);
        }
        session.publish();

        tokio::spawn(session.run());
        SessionHandle::new(cmd_tx, view_rx)
    }

    /// Run the session event loop
    ///
    /// Ends on `Shutdown` or when every handle has been dropped.
    async fn run(mut self) {
        info!("Chat session started (epoch {})", self.epoch);

        loop {
            tokio::select! {
                cmd = self.commands.recv() => match cmd {
                    Some(SessionCommand::Shutdown) | None => break,
                    Some(cmd) => self.handle_command(cmd),
                },
                Some(input) = self.inputs.recv() => self.handle_input(input),
            }
        }

        self.connection.teardown();
        info!("Chat session shutting down");
    }

    /// Process a single user command
    fn handle_command(&mut self, cmd: SessionCommand) {
        match cmd {
            SessionCommand::CreateRoom { nickname, reply } => {
                let result = self.create_room(nickname);
                self.finish(reply, result);
            }
            SessionCommand::JoinRoom {
                nickname,
                room_id,
                reply,
            } => {
                let result = self.join_room(nickname, room_id);
                self.finish(reply, result);
            }
            SessionCommand::LeaveRoom { reply } => {
                let result = self.reset();
                self.finish(reply, result);
            }
            SessionCommand::InputChanged { text, reply } => {
                let result = self.input_changed(text);
                self.finish(reply, result);
            }
            SessionCommand::SendMessage { body, reply } => {
                let result = self.send_message(body);
                self.finish(reply, result);
            }
            // Handled by the run loop
            SessionCommand::Shutdown => {}
        }
    }

    /// Record the outcome, publish, answer the caller
    fn finish(&mut self, reply: Reply<()>, result: Result<(), SessionError>) {
        if let Err(e) = &result {
            debug!("Command rejected: {}", e);
            self.last_error = Some(e.clone());
        }
        self.publish();
        let _ = reply.send(result);
    }

    /// Process a single internal input
    fn handle_input(&mut self, input: SessionInput) {
        match input {
            SessionInput::Transport { epoch, event } => {
                if !self.connection.accepts(epoch) {
                    debug!("Dropping {:?} from stale handle (epoch {})", event, epoch);
                    return;
                }
                self.handle_transport_event(event);
            }
            SessionInput::RoomResolved { epoch, outcome } => {
                if epoch != self.epoch {
                    warn!(
                        "Discarding room result from epoch {} (now {})",
                        epoch, self.epoch
                    );
                    return;
                }
                match self.rooms.complete(epoch, outcome) {
                    RoomCompletion::Joined(room) => {
                        info!("In room {} ({}) as '{}'", room.id, room.via, self.nickname);
                        self.last_error = None;
                        self.publish();
                    }
                    RoomCompletion::Failed(e) => {
                        // Identity is only kept for an established membership
                        self.nickname.clear();
                        self.last_error = Some(e);
                        self.publish();
                    }
                    RoomCompletion::Stale => {}
                }
            }
            SessionInput::TypingQuiet { epoch, generation } => {
                if epoch != self.epoch {
                    return;
                }
                match self
                    .typing
                    .on_quiet_window_elapsed(&mut self.connection, generation)
                {
                    Ok(true) => debug!("Typing quiet window elapsed, typing=false sent"),
                    Ok(false) => {}
                    Err(e) => debug!("Quiet-window typing=false not sent: {}", e),
                }
            }
        }
    }

    /// Apply a transport event from the live handle, in delivery order
    fn handle_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Ready => {
                self.connection.on_ready();
                self.publish();
            }
            TransportEvent::Closed => {
                self.connection.on_closed();
                self.last_error = Some(SessionError::TransportClosed);
                self.publish();
            }
            TransportEvent::Message(InboundMessage::ChatMessage(message)) => {
                let change = self.feed.append_incoming(message);
                self.record_feed_change(change);
                self.publish();
            }
            TransportEvent::Message(InboundMessage::TypingPresence(update)) => {
                let change = self.typing.on_remote_typing_update(update.users_typing);
                self.record_feed_change(change);
                self.publish();
            }
        }
    }

    fn create_room(&mut self, nickname: String) -> Result<(), SessionError> {
        let handle = self.connection.connected_handle()?;
        let issued = self.rooms.create_room(handle, &nickname, self.epoch)?;
        self.nickname = nickname;
        self.spawn_room_request(issued);
        Ok(())
    }

    fn join_room(&mut self, nickname: String, room_id: String) -> Result<(), SessionError> {
        let handle = self.connection.connected_handle()?;
        let issued = self
            .rooms
            .join_room(handle, &nickname, &room_id, self.epoch)?;
        self.nickname = nickname;
        self.spawn_room_request(issued);
        Ok(())
    }

    /// Await the request off the session task; its outcome comes back as an
    /// input stamped with the epoch of issue.
    fn spawn_room_request(&self, issued: IssuedRequest) {
        let IssuedRequest {
            operation,
            epoch,
            request,
        } = issued;
        let inputs = self.inputs_tx.clone();

        tokio::spawn(async move {
            let outcome = request.await;
            if inputs
                .send(SessionInput::RoomResolved { epoch, outcome })
                .await
                .is_err()
            {
                debug!("Session gone before room {} resolved", operation);
            }
        });
    }

    fn input_changed(&mut self, text: String) -> Result<(), SessionError> {
        self.draft = text;
        if !self.rooms.is_member() {
            return Ok(());
        }
        if !self.connection.is_connected() {
            return Err(SessionError::NotConnected);
        }

        let inputs = self.inputs_tx.clone();
        let epoch = self.epoch;
        self.typing
            .on_local_input_change(&mut self.connection, &self.draft, move |generation| {
                async move {
                    let _ = inputs
                        .send(SessionInput::TypingQuiet { epoch, generation })
                        .await;
                }
            })
    }

    fn send_message(&mut self, body: String) -> Result<(), SessionError> {
        self.feed
            .send_outgoing(&mut self.connection, self.rooms.is_member(), &body)?;
        debug!(
            "Message sent, quiet timer still pending: {}",
            self.typing.has_pending_quiet_timer()
        );
        self.draft.clear();
        Ok(())
    }

    /// Tear down and recreate the whole session
    ///
    /// Room, feed, typing state, draft, error and nickname go back to their
    /// initial values, the epoch advances, and the transport handle is torn
    /// down before its replacement is created.
    fn reset(&mut self) -> Result<(), SessionError> {
        let previous = self.epoch;

        self.rooms.clear();
        self.feed = MessageFeed::new();
        // Dropping the old controller aborts its pending quiet timer
        self.typing = TypingPresenceController::new(self.config.typing_quiet_window);
        self.nickname.clear();
        self.draft.clear();
        self.last_error = None;
        self.scroll_to_bottom = false;
        self.scroll_seq = 0;
        self.epoch = previous.next();

        self.connection.teardown();
        info!("Session reset: epoch {} -> {}", previous, self.epoch);
        self.initialize_connection()
    }

    fn initialize_connection(&mut self) -> Result<(), SessionError> {
        let sink = EventSink::new(self.epoch, self.inputs_tx.clone());
        self.connection.initialize(sink).map(|_| ())
    }

    /// Remember the scroll decision for a feed/typing change
    ///
    /// It stays in every later snapshot until the next feed/typing change,
    /// so a presentation layer that only sees the latest view still gets it.
    fn record_feed_change(&mut self, change: FeedChange) {
        self.scroll_to_bottom = should_auto_scroll(change, !self.typing.is_anyone_typing());
        if self.scroll_to_bottom {
            self.scroll_seq += 1;
        }
    }

    /// Publish a fresh view
    fn publish(&self) {
        let view = ViewModel {
            epoch: self.epoch,
            connection: self.connection.state(),
            screen: Screen::derive(self.connection.state(), self.rooms.state()),
            room_id: self.rooms.room().map(|room| room.id.clone()),
            room_pending: self.rooms.is_pending(),
            nickname: self.nickname.clone(),
            draft: self.draft.clone(),
            messages: self.feed.entries(&self.nickname),
            users_typing: self.typing.users_typing().to_vec(),
            scroll_to_bottom: self.scroll_to_bottom,
            scroll_seq: self.scroll_seq,
            last_error: self.last_error.clone(),
        };
        self.view_tx.send_replace(view);
    }
}
