//! Realtime Chat Client - Entry Point
//!
//! Terminal front-end: starts a ChatSession over WebSocket, prints view
//! updates and forwards typed lines as user intents.

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use chat_session_client::input::HELP;
use chat_session_client::{
    ChatSession, ClientConfig, Epoch, MessageKind, Screen, SessionError, UserIntent, ViewModel,
    WsConnector,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging with environment filter
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=chat_session_client=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("chat_session_client=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Server URL from command line, CHAT_SERVER_URL, or default
    let config = ClientConfig::from_env()?;
    info!("Chat client connecting to {}", config.server_url);

    let session = ChatSession::start(
        WsConnector::new(config.server_url.clone()),
        config.session.clone(),
    );
    tokio::spawn(render(session.view()));

    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let Some(intent) = UserIntent::parse(&line) else {
            continue;
        };

        let result = match intent {
            UserIntent::Create { nickname } => {
                if !session.snapshot().can_create(&nickname) {
                    println!("Cannot create a room right now");
                    continue;
                }
                session.create_room(nickname).await
            }
            UserIntent::Join { room_id, nickname } => {
                if !session.snapshot().can_join(&nickname, &room_id) {
                    println!("Cannot join a room right now");
                    continue;
                }
                session.join_room(nickname, room_id).await
            }
            UserIntent::Leave => session.leave_room().await,
            UserIntent::Draft(text) => session.input_changed(text).await,
            UserIntent::Say(text) => match session.input_changed(text.clone()).await {
                Ok(()) if session.snapshot().can_send() => session.send_message(text).await,
                Ok(()) => {
                    println!("Join a room before chatting");
                    Ok(())
                }
                Err(e) => Err(e),
            },
            UserIntent::Help => {
                println!("{HELP}");
                Ok(())
            }
            UserIntent::Unknown(raw) => {
                println!("Unknown command: {raw} (try /help)");
                Ok(())
            }
            UserIntent::Quit => break,
        };

        // Errors are also published in the view and printed by `render`
        if let Err(e) = result {
            debug!("Intent rejected: {}", e);
        }
    }

    session.shutdown().await;
    Ok(())
}

/// What has already been printed
#[derive(Default)]
struct Printed {
    epoch: Epoch,
    connected: Option<bool>,
    screen: Option<Screen>,
    messages: usize,
    typing: bool,
    error: Option<SessionError>,
}

/// Print view changes until the session ends
async fn render(mut view: watch::Receiver<ViewModel>) {
    let mut printed = Printed::default();

    loop {
        let snapshot = view.borrow_and_update().clone();
        print_changes(&mut printed, &snapshot);

        if view.changed().await.is_err() {
            break;
        }
    }
}

fn print_changes(printed: &mut Printed, view: &ViewModel) {
    if view.epoch != printed.epoch {
        println!("--- session reset ---");
        *printed = Printed {
            epoch: view.epoch,
            ..Printed::default()
        };
    }

    if printed.connected != Some(view.is_connected()) {
        printed.connected = Some(view.is_connected());
        if view.is_connected() {
            println!("Connected to chat server");
        } else {
            println!("Connecting to chat server...");
        }
    }

    if printed.screen != Some(view.screen) {
        printed.screen = Some(view.screen);
        match view.screen {
            Screen::AwaitingConnection => {}
            Screen::RoomSelection => println!("Join/Create Chat Room"),
            Screen::InRoomChat => {
                let room_id = view.room_id.as_ref().map(|id| id.as_str()).unwrap_or("");
                println!("Room ID: {}  Your Nickname: {}", room_id, view.nickname);
            }
        }
    }

    for entry in view.messages.iter().skip(printed.messages) {
        let message = &entry.message;
        let time = message.time_of_day();
        match entry.kind {
            MessageKind::System => println!("[{time}] * {}", message.body),
            MessageKind::Own => println!("[{time}] {} (you): {}", message.user_nickname, message.body),
            MessageKind::Other => println!("[{time}] {}: {}", message.user_nickname, message.body),
        }
    }
    printed.messages = view.messages.len();

    let typing = view.typing_indicator();
    if printed.typing != typing.is_some() {
        printed.typing = typing.is_some();
        if let Some(text) = typing {
            println!("{text}");
        }
    }

    if printed.error != view.last_error {
        printed.error = view.last_error.clone();
        if let Some(e) = &view.last_error {
            println!("! {e}");
        }
    }
}
