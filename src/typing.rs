//! Typing presence
//!
//! Outbound: every local input change immediately reports typing on/off and
//! re-arms a single quiet-window timer that later reports typing=false.
//! Inbound: the server's aggregated typing set replaces ours wholesale.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::connection::ConnectionManager;
use crate::error::SessionError;
use crate::feed::FeedChange;
use crate::message::OutboundMessage;
use crate::transport::Connector;

/// Default quiet window before typing=false is sent
pub const DEFAULT_TYPING_QUIET_WINDOW: Duration = Duration::from_millis(2000);

/// Single-slot cancellable delayed action
///
/// Arming aborts whatever is pending and bumps a generation number. The
/// generation lets the owner ignore a firing that was already on its way
/// when the slot was re-armed.
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    slot: Option<JoinHandle<()>>,
    generation: u64,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            slot: None,
            generation: 0,
        }
    }

    /// Replace any pending action with `fire`, run after the window
    ///
    /// Returns the generation passed to `fire`. Must be called from within a
    /// tokio runtime.
    pub fn arm<F, Fut>(&mut self, fire: F) -> u64
    where
        F: FnOnce(u64) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        self.generation += 1;

        let generation = self.generation;
        let window = self.window;
        self.slot = Some(tokio::spawn(async move {
            tokio::time::sleep(window).await;
            fire(generation).await;
        }));
        generation
    }

    /// Abort the pending action, if any
    pub fn cancel(&mut self) {
        if let Some(task) = self.slot.take() {
            task.abort();
        }
    }

    /// Whether an action is armed
    pub fn is_armed(&self) -> bool {
        self.slot.is_some()
    }

    /// Acknowledge a firing. Returns false if it was superseded.
    pub fn fired(&mut self, generation: u64) -> bool {
        if self.slot.is_some() && generation == self.generation {
            self.slot = None;
            true
        } else {
            false
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Local typing signal plus the remote typing set
#[derive(Debug)]
pub struct TypingPresenceController {
    debounce: Debouncer,
    users_typing: Vec<String>,
}

impl TypingPresenceController {
    pub fn new(quiet_window: Duration) -> Self {
        Self {
            debounce: Debouncer::new(quiet_window),
            users_typing: Vec::new(),
        }
    }

    /// Report typing on/off now and re-arm the quiet window
    ///
    /// `on_quiet` is what the timer runs when the window elapses; it is
    /// expected to route back into [`Self::on_quiet_window_elapsed`].
    pub fn on_local_input_change<C, F, Fut>(
        &mut self,
        connection: &mut ConnectionManager<C>,
        text: &str,
        on_quiet: F,
    ) -> Result<(), SessionError>
    where
        C: Connector,
        F: FnOnce(u64) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let typing = !text.trim().is_empty();
        connection.send(OutboundMessage::SetTypingPresence { typing })?;

        let generation = self.debounce.arm(on_quiet);
        debug!("Typing={} sent, quiet timer armed (gen {})", typing, generation);
        Ok(())
    }

    /// The quiet window of arm `generation` elapsed
    ///
    /// Returns whether typing=false was transmitted.
    pub fn on_quiet_window_elapsed<C: Connector>(
        &mut self,
        connection: &mut ConnectionManager<C>,
        generation: u64,
    ) -> Result<bool, SessionError> {
        if !self.debounce.fired(generation) {
            debug!("Ignoring superseded quiet timer (gen {})", generation);
            return Ok(false);
        }
        connection.send(OutboundMessage::SetTypingPresence { typing: false })?;
        Ok(true)
    }

    /// Replace the remote typing set wholesale
    pub fn on_remote_typing_update(&mut self, users_typing: Vec<String>) -> FeedChange {
        debug!("Typing set now {:?}", users_typing);
        self.users_typing = users_typing;
        FeedChange::TypingChanged
    }

    pub fn users_typing(&self) -> &[String] {
        &self.users_typing
    }

    pub fn is_anyone_typing(&self) -> bool {
        !self.users_typing.is_empty()
    }

    /// Whether a delayed typing=false is still pending
    pub fn has_pending_quiet_timer(&self) -> bool {
        self.debounce.is_armed()
    }
}
