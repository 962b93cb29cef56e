//! WebSocket transport
//!
//! A [`Connector`] that speaks JSON frames over tokio-tungstenite. Each
//! handle owns one connection task which multiplexes outbound frames and
//! inbound server frames, pairs create/join replies with their requests,
//! and reports lifecycle through the session's [`EventSink`].

use std::collections::HashMap;

use futures_util::{FutureExt, Sink, SinkExt, StreamExt};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

use crate::error::TransportError;
use crate::message::{ClientFrame, OutboundMessage, RoomReply, Routed, ServerFrame};
use crate::transport::{Connector, EventSink, RoomRequest, TransportHandle};
use crate::types::{HandleId, RequestId, RoomId};

type ReplySender = oneshot::Sender<Result<RoomReply, TransportError>>;

/// Work queued for the connection task
enum Outgoing {
    Frame(ClientFrame),
    Request {
        request_id: RequestId,
        frame: ClientFrame,
        reply: ReplySender,
    },
}

/// Connects to a chat server at a fixed `ws://` URL
#[derive(Debug, Clone)]
pub struct WsConnector {
    url: String,
}

impl WsConnector {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl Connector for WsConnector {
    type Handle = WsHandle;

    fn connect(&mut self, sink: EventSink) -> WsHandle {
        let id = HandleId::new();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_connection(id, self.url.clone(), sink, outbound_rx));

        WsHandle {
            id,
            outbound: outbound_tx,
            task,
        }
    }
}

/// One WebSocket connection
pub struct WsHandle {
    id: HandleId,
    outbound: mpsc::UnboundedSender<Outgoing>,
    task: JoinHandle<()>,
}

impl WsHandle {
    /// Queue a request frame and return the receiver for its reply
    fn request<F>(&self, build: F) -> oneshot::Receiver<Result<RoomReply, TransportError>>
    where
        F: FnOnce(RequestId) -> ClientFrame,
    {
        let request_id = RequestId::new();
        let (reply_tx, reply_rx) = oneshot::channel();
        let queued = self.outbound.send(Outgoing::Request {
            request_id,
            frame: build(request_id),
            reply: reply_tx,
        });
        if queued.is_err() {
            // The reply sender was dropped with the rejected item, so the
            // receiver resolves to Closed.
            debug!("Handle {} connection task gone", self.id);
        }
        reply_rx
    }
}

impl TransportHandle for WsHandle {
    fn id(&self) -> HandleId {
        self.id
    }

    fn create_room(&mut self, nickname: &str) -> RoomRequest<RoomId> {
        let nickname = nickname.to_string();
        let reply = self.request(|request_id| ClientFrame::CreateRoom {
            request_id,
            nickname,
        });

        async move {
            match reply.await {
                Ok(Ok(RoomReply::Created(room_id))) => Ok(room_id),
                Ok(Ok(RoomReply::Joined)) => Err(TransportError::UnexpectedReply),
                Ok(Err(e)) => Err(e),
                Err(_) => Err(TransportError::Closed),
            }
        }
        .boxed()
    }

    fn join_room(&mut self, nickname: &str, room_id: &RoomId) -> RoomRequest<()> {
        let nickname = nickname.to_string();
        let room_id = room_id.clone();
        let reply = self.request(|request_id| ClientFrame::JoinRoom {
            request_id,
            nickname,
            room_id,
        });

        async move {
            match reply.await {
                Ok(Ok(RoomReply::Joined)) => Ok(()),
                Ok(Ok(RoomReply::Created(_))) => Err(TransportError::UnexpectedReply),
                Ok(Err(e)) => Err(e),
                Err(_) => Err(TransportError::Closed),
            }
        }
        .boxed()
    }

    fn send_message(&mut self, message: OutboundMessage) -> Result<(), TransportError> {
        self.outbound
            .send(Outgoing::Frame(message.into()))
            .map_err(|_| TransportError::Closed)
    }

    /// Closing the outbound queue makes the connection task send a close
    /// frame and exit. Its final `closed` event carries the old epoch and is
    /// ignored by the session.
    fn teardown(self) {
        let WsHandle { id, outbound, task } = self;
        drop(outbound);
        debug!("Handle {} released (task finished: {})", id, task.is_finished());
    }
}

/// Connection task: handshake, then multiplex until either side ends
async fn run_connection(
    id: HandleId,
    url: String,
    sink: EventSink,
    mut outbound: mpsc::UnboundedReceiver<Outgoing>,
) {
    let ws_stream = match tokio_tungstenite::connect_async(url.as_str()).await {
        Ok((ws_stream, _response)) => ws_stream,
        Err(e) => {
            warn!("Handle {} failed to connect to {}: {}", id, url, e);
            let _ = sink.on_closed().await;
            return;
        }
    };
    info!("Handle {} connected to {}", id, url);
    let _ = sink.on_ready().await;

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();
    let mut pending: HashMap<RequestId, ReplySender> = HashMap::new();

    loop {
        tokio::select! {
            outgoing = outbound.recv() => {
                let Some(outgoing) = outgoing else {
                    debug!("Handle {} torn down, closing socket", id);
                    let _ = ws_sender.close().await;
                    break;
                };
                let frame = match outgoing {
                    Outgoing::Frame(frame) => frame,
                    Outgoing::Request { request_id, frame, reply } => {
                        pending.insert(request_id, reply);
                        frame
                    }
                };
                if let Err(e) = send_frame(&mut ws_sender, &frame).await {
                    warn!("Handle {} send failed: {}", id, e);
                    break;
                }
            }
            incoming = ws_receiver.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    match serde_json::from_str::<ServerFrame>(&text) {
                        Ok(frame) => match frame.route() {
                            Routed::Reply(request_id, result) => match pending.remove(&request_id) {
                                Some(reply) => {
                                    let _ = reply.send(result);
                                }
                                None => warn!("Handle {} got reply for unknown request {}", id, request_id),
                            },
                            Routed::Event(message) => {
                                if sink.on_message(message).await.is_err() {
                                    break;
                                }
                            }
                        },
                        Err(e) => {
                            warn!("Invalid JSON from server on {}: {}", id, e);
                        }
                    }
                }
                Some(Ok(Message::Close(_))) | None => {
                    debug!("Server closed connection {}", id);
                    break;
                }
                Some(Ok(_)) => {
                    // Ping/pong handled by tungstenite; binary ignored
                }
                Some(Err(e)) => {
                    error!("WebSocket error on {}: {}", id, e);
                    break;
                }
            }
        }
    }

    for (_, reply) in pending.drain() {
        let _ = reply.send(Err(TransportError::Closed));
    }
    let _ = sink.on_closed().await;
    debug!("Connection task ended for {}", id);
}

async fn send_frame<S>(ws_sender: &mut S, frame: &ClientFrame) -> Result<(), TransportError>
where
    S: Sink<Message, Error = tokio_tungstenite::tungstenite::Error> + Unpin,
{
    let json = serde_json::to_string(frame)?;
    ws_sender.send(Message::Text(json.into())).await?;
    Ok(())
}
