//! WebSocket transport against a loopback chat server

mod support;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;

use chat_session_client::message::{ClientFrame, ServerFrame};
use chat_session_client::{
    ChatMessage, ChatSession, MessageKind, RoomId, Screen, SessionConfig, SessionError,
    TypingPresenceUpdate, WsConnector,
};
use support::wait_view;

/// Minimal room server: one room per connection, echoes chat and typing
async fn serve(stream: TcpStream) {
    let Ok(mut ws) = tokio_tungstenite::accept_async(stream).await else {
        return;
    };
    let mut nickname = String::new();
    let mut clock = 1_000u64;

    while let Some(Ok(msg)) = ws.next().await {
        let Message::Text(text) = msg else {
            continue;
        };
        let Ok(frame) = serde_json::from_str::<ClientFrame>(&text) else {
            continue;
        };
        clock += 1;

        let replies = match frame {
            ClientFrame::CreateRoom {
                request_id,
                nickname: nick,
            } => {
                nickname = nick;
                vec![
                    ServerFrame::RoomCreated {
                        request_id,
                        room_id: RoomId("ROOM42".to_string()),
                    },
                    ServerFrame::ChatMessage(ChatMessage {
                        user_nickname: String::new(),
                        body: format!("{nickname} joined the room"),
                        timestamp: clock,
                        is_system_message: true,
                    }),
                ]
            }
            ClientFrame::JoinRoom {
                request_id,
                room_id,
                ..
            } if room_id.as_str() == "missing" => vec![ServerFrame::RequestFailed {
                request_id,
                reason: "Room not found".to_string(),
            }],
            ClientFrame::JoinRoom {
                request_id,
                nickname: nick,
                ..
            } => {
                nickname = nick;
                vec![ServerFrame::RoomJoined { request_id }]
            }
            ClientFrame::SendMessage { body } => vec![ServerFrame::ChatMessage(ChatMessage {
                user_nickname: nickname.clone(),
                body,
                timestamp: clock,
                is_system_message: false,
            })],
            ClientFrame::SetTypingPresence { typing } => {
                let users_typing = if typing {
                    vec![nickname.clone()]
                } else {
                    Vec::new()
                };
                vec![ServerFrame::TypingPresence(TypingPresenceUpdate {
                    users_typing,
                })]
            }
        };

        for reply in replies {
            let json = serde_json::to_string(&reply).unwrap();
            if ws.send(Message::Text(json.into())).await.is_err() {
                return;
            }
        }
    }
}

/// Accepts the handshake, then closes straight away
async fn serve_and_close(stream: TcpStream) {
    if let Ok(mut ws) = tokio_tungstenite::accept_async(stream).await {
        let _ = ws.close(None).await;
    }
}

async fn spawn_server<F, Fut>(handler: F) -> String
where
    F: Fn(TcpStream) -> Fut + Send + 'static,
    Fut: std::future::Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(handler(stream));
        }
    });
    format!("ws://{addr}")
}

#[tokio::test]
async fn test_create_send_and_typing() {
    let url = spawn_server(serve).await;
    let session = ChatSession::start(WsConnector::new(url), SessionConfig::default());
    let mut view = session.view();
    wait_view(&mut view, |v| v.is_connected()).await;

    session.create_room("Alice").await.unwrap();
    let snapshot = wait_view(&mut view, |v| {
        v.screen == Screen::InRoomChat && !v.messages.is_empty()
    })
    .await;
    assert_eq!(snapshot.room_id, Some(RoomId("ROOM42".to_string())));
    assert_eq!(snapshot.messages[0].kind, MessageKind::System);

    session.input_changed("hello").await.unwrap();
    session.send_message("hello").await.unwrap();
    let snapshot = wait_view(&mut view, |v| v.messages.len() == 2).await;
    assert_eq!(snapshot.messages[1].message.body, "hello");
    assert_eq!(snapshot.messages[1].kind, MessageKind::Own);

    session.input_changed("typ").await.unwrap();
    let snapshot = wait_view(&mut view, |v| v.users_typing == ["Alice".to_string()]).await;
    assert!(snapshot.typing_indicator().is_some());

    session.shutdown().await;
}

#[tokio::test]
async fn test_join_refused_by_server() {
    let url = spawn_server(serve).await;
    let session = ChatSession::start(WsConnector::new(url), SessionConfig::default());
    let mut view = session.view();
    wait_view(&mut view, |v| v.is_connected()).await;

    session.join_room("Bob", "missing").await.unwrap();
    let snapshot = wait_view(&mut view, |v| v.last_error.is_some()).await;
    assert!(matches!(
        snapshot.last_error,
        Some(SessionError::RoomOperationFailed(ref reason)) if reason.contains("Room not found")
    ));
    assert_eq!(snapshot.screen, Screen::RoomSelection);
    assert!(!snapshot.room_pending);
}

#[tokio::test]
async fn test_join_existing_room() {
    let url = spawn_server(serve).await;
    let session = ChatSession::start(WsConnector::new(url), SessionConfig::default());
    let mut view = session.view();
    wait_view(&mut view, |v| v.is_connected()).await;

    session.join_room("Bob", "  R1 ").await.unwrap();
    let snapshot = wait_view(&mut view, |v| v.screen == Screen::InRoomChat).await;
    assert_eq!(snapshot.room_id, Some(RoomId("R1".to_string())));
    assert_eq!(snapshot.nickname, "Bob");
}

#[tokio::test]
async fn test_server_close_reports_disconnect() {
    let url = spawn_server(serve_and_close).await;
    let session = ChatSession::start(WsConnector::new(url), SessionConfig::default());
    let mut view = session.view();

    let snapshot = wait_view(&mut view, |v| {
        v.last_error == Some(SessionError::TransportClosed)
    })
    .await;
    assert!(!snapshot.is_connected());
    assert_eq!(
        session.create_room("Alice").await,
        Err(SessionError::NotConnected)
    );
}

#[tokio::test]
async fn test_unreachable_server() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());
    drop(listener);

    let session = ChatSession::start(WsConnector::new(url), SessionConfig::default());
    let mut view = session.view();
    let snapshot = wait_view(&mut view, |v| v.last_error.is_some()).await;

    assert_eq!(snapshot.last_error, Some(SessionError::TransportClosed));
    assert_eq!(snapshot.screen, Screen::AwaitingConnection);
}

#[tokio::test]
async fn test_leave_reconnects() {
    let url = spawn_server(serve).await;
    let session = ChatSession::start(WsConnector::new(url), SessionConfig::default());
    let mut view = session.view();
    wait_view(&mut view, |v| v.is_connected()).await;

    session.create_room("Alice").await.unwrap();
    wait_view(&mut view, |v| v.screen == Screen::InRoomChat).await;

    session.leave_room().await.unwrap();
    let snapshot = wait_view(&mut view, |v| v.epoch.0 == 1 && v.is_connected()).await;
    assert_eq!(snapshot.screen, Screen::RoomSelection);
    assert!(snapshot.messages.is_empty());
    assert_eq!(snapshot.last_error, None);
}
