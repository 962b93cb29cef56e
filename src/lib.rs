//! Realtime Chat Session Client Library
//!
//! Client-side session logic for a room-based realtime chat: connection
//! lifecycle, room create/join, the ordered message feed and debounced
//! typing presence, built on tokio using the Actor pattern.
//!
//! # Features
//! - Connection tracking from transport ready/closed callbacks
//! - Room creation and joining with a single pending-request slot
//! - Append-only message feed with own/other/system classification
//! - Auto-scroll policy aware of the typing indicator
//! - Typing presence with a 2 second quiet window
//! - Full session reset on leave, with stale async results discarded
//! - WebSocket transport (JSON frames over tokio-tungstenite)
//!
//! # Architecture
//! Uses the Actor pattern with `mpsc` channels:
//! - `ChatSession` is the actor owning all state
//! - `SessionHandle` sends user intents as commands
//! - Transports, timers and pending requests post back into the actor,
//!   stamped with the session epoch
//! - The presentation layer watches a `ViewModel` snapshot
//!
//! # Example
//! ```ignore
//! use chat_session_client::{ChatSession, SessionConfig, WsConnector};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let session = ChatSession::start(
//!         WsConnector::new("ws://127.0.0.1:8080"),
//!         SessionConfig::default(),
//!     );
//!     let mut view = session.view();
//!     view.wait_for(|v| v.is_connected()).await.unwrap();
//!
//!     session.create_room("Alice").await.unwrap();
//! }
//! ```

pub mod config;
pub mod connection;
pub mod error;
pub mod feed;
pub mod handle;
pub mod input;
pub mod message;
pub mod room;
pub mod session;
pub mod transport;
pub mod types;
pub mod typing;
pub mod view;
pub mod ws;

// Re-export main types for convenience
pub use config::{ClientConfig, SessionConfig};
pub use connection::ConnectionState;
pub use error::{ConfigError, InputField, SendError, SessionError, TransportError};
pub use feed::{FeedEntry, MessageKind};
pub use handle::SessionHandle;
pub use input::UserIntent;
pub use message::{ChatMessage, InboundMessage, MessageType, OutboundMessage, TypingPresenceUpdate};
pub use session::ChatSession;
pub use transport::{Connector, EventSink, RoomRequest, TransportEvent, TransportHandle};
pub use types::{Epoch, HandleId, RequestId, RoomId};
pub use view::{Screen, ViewModel};
pub use ws::WsConnector;
