//! Scripted in-memory transport for session tests
//!
//! `MockConnector` goes into the session; `MockRemote` stays with the test
//! and plays the server: it fires callbacks through the captured sinks,
//! answers create/join requests on demand, and records every transmission
//! with the (paused) tokio clock.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::FutureExt;
use tokio::sync::{oneshot, watch};
use tokio::time::Instant;

use chat_session_client::{
    ChatMessage, Connector, EventSink, HandleId, InboundMessage, OutboundMessage, RoomId,
    RoomRequest, TransportError, TransportHandle, TypingPresenceUpdate, ViewModel,
};

/// A transmission seen by the mock
#[derive(Debug, Clone)]
pub struct Sent {
    pub handle: HandleId,
    pub at: Instant,
    pub message: OutboundMessage,
}

/// A create/join request waiting for the test to answer
pub enum PendingRequest {
    Create {
        nickname: String,
        reply: oneshot::Sender<Result<RoomId, TransportError>>,
    },
    Join {
        nickname: String,
        room_id: RoomId,
        reply: oneshot::Sender<Result<(), TransportError>>,
    },
}

impl PendingRequest {
    /// Answer successfully; create gets `room_id`
    pub fn succeed(self, room_id: &str) {
        match self {
            PendingRequest::Create { reply, .. } => {
                let _ = reply.send(Ok(RoomId(room_id.to_string())));
            }
            PendingRequest::Join { reply, .. } => {
                let _ = reply.send(Ok(()));
            }
        }
    }

    pub fn fail(self, reason: &str) {
        let err = || TransportError::Rejected(reason.to_string());
        match self {
            PendingRequest::Create { reply, .. } => {
                let _ = reply.send(Err(err()));
            }
            PendingRequest::Join { reply, .. } => {
                let _ = reply.send(Err(err()));
            }
        }
    }

    pub fn nickname(&self) -> &str {
        match self {
            PendingRequest::Create { nickname, .. } | PendingRequest::Join { nickname, .. } => {
                nickname
            }
        }
    }
}

#[derive(Default)]
struct MockState {
    sinks: Vec<EventSink>,
    created: usize,
    torn_down: usize,
    sent: Vec<Sent>,
    requests: VecDeque<PendingRequest>,
}

type Shared = Arc<Mutex<MockState>>;

pub struct MockConnector {
    shared: Shared,
}

pub struct MockHandle {
    id: HandleId,
    shared: Shared,
}

#[derive(Clone)]
pub struct MockRemote {
    shared: Shared,
}

/// A connected pair
pub fn mock() -> (MockConnector, MockRemote) {
    let shared = Shared::default();
    (
        MockConnector {
            shared: shared.clone(),
        },
        MockRemote { shared },
    )
}

impl Connector for MockConnector {
    type Handle = MockHandle;

    fn connect(&mut self, sink: EventSink) -> MockHandle {
        let mut state = self.shared.lock().unwrap();
        state.sinks.push(sink);
        state.created += 1;
        MockHandle {
            id: HandleId::new(),
            shared: self.shared.clone(),
        }
    }
}

impl TransportHandle for MockHandle {
    fn id(&self) -> HandleId {
        self.id
    }

    fn create_room(&mut self, nickname: &str) -> RoomRequest<RoomId> {
        let (reply, rx) = oneshot::channel();
        self.shared
            .lock()
            .unwrap()
            .requests
            .push_back(PendingRequest::Create {
                nickname: nickname.to_string(),
                reply,
            });
        async move { rx.await.unwrap_or(Err(TransportError::Closed)) }.boxed()
    }

    fn join_room(&mut self, nickname: &str, room_id: &RoomId) -> RoomRequest<()> {
        let (reply, rx) = oneshot::channel();
        self.shared
            .lock()
            .unwrap()
            .requests
            .push_back(PendingRequest::Join {
                nickname: nickname.to_string(),
                room_id: room_id.clone(),
                reply,
            });
        async move { rx.await.unwrap_or(Err(TransportError::Closed)) }.boxed()
    }

    fn send_message(&mut self, message: OutboundMessage) -> Result<(), TransportError> {
        self.shared.lock().unwrap().sent.push(Sent {
            handle: self.id,
            at: Instant::now(),
            message,
        });
        Ok(())
    }

    fn teardown(self) {
        self.shared.lock().unwrap().torn_down += 1;
    }
}

impl MockRemote {
    /// Sink of the most recently created handle
    pub fn sink(&self) -> EventSink {
        self.sink_at(self.handles_created() - 1)
    }

    /// Sink of the n-th created handle
    pub fn sink_at(&self, index: usize) -> EventSink {
        self.shared.lock().unwrap().sinks[index].clone()
    }

    pub async fn ready(&self) {
        self.sink().on_ready().await.unwrap();
    }

    pub async fn closed(&self) {
        self.sink().on_closed().await.unwrap();
    }

    pub async fn chat(&self, nickname: &str, body: &str, timestamp: u64) {
        self.sink()
            .on_message(InboundMessage::ChatMessage(chat(nickname, body, timestamp)))
            .await
            .unwrap();
    }

    pub async fn typing(&self, users: &[&str]) {
        self.sink()
            .on_message(InboundMessage::TypingPresence(TypingPresenceUpdate {
                users_typing: users.iter().map(|u| u.to_string()).collect(),
            }))
            .await
            .unwrap();
    }

    /// Oldest unanswered request
    pub fn take_request(&self) -> Option<PendingRequest> {
        self.shared.lock().unwrap().requests.pop_front()
    }

    pub fn pending_requests(&self) -> usize {
        self.shared.lock().unwrap().requests.len()
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.shared.lock().unwrap().sent.clone()
    }

    /// Typing signals as (offset from `start`, typing)
    pub fn typing_signals_since(&self, start: Instant) -> Vec<(Duration, bool)> {
        self.sent()
            .into_iter()
            .filter(|s| s.at >= start)
            .filter_map(|s| match s.message {
                OutboundMessage::SetTypingPresence { typing } => Some((s.at - start, typing)),
                OutboundMessage::SendMessage { .. } => None,
            })
            .collect()
    }

    pub fn clear_sent(&self) {
        self.shared.lock().unwrap().sent.clear();
    }

    pub fn handles_created(&self) -> usize {
        self.shared.lock().unwrap().created
    }

    pub fn handles_torn_down(&self) -> usize {
        self.shared.lock().unwrap().torn_down
    }
}

pub fn chat(nickname: &str, body: &str, timestamp: u64) -> ChatMessage {
    ChatMessage {
        user_nickname: nickname.to_string(),
        body: body.to_string(),
        timestamp,
        is_system_message: false,
    }
}

/// Wait until the published view satisfies `pred`
pub async fn wait_view<F>(view: &mut watch::Receiver<ViewModel>, pred: F) -> ViewModel
where
    F: FnMut(&ViewModel) -> bool,
{
    let snapshot = tokio::time::timeout(Duration::from_secs(5), view.wait_for(pred))
        .await
        .expect("view condition not reached in time")
        .expect("session ended");
    let view_model = (*snapshot).clone();
    view_model
}

/// Let spawned tasks and the session drain
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}
