//! Client configuration
//!
//! Defaults live in constants; the server URL may come from the first
//! command-line argument or `CHAT_SERVER_URL`, tuning values from the
//! environment.

use std::time::Duration;

use crate::error::ConfigError;
use crate::typing::DEFAULT_TYPING_QUIET_WINDOW;

/// Default chat server address
pub const DEFAULT_SERVER_URL: &str = "ws://127.0.0.1:8080";

/// Channel buffer size for session commands and inputs
pub const DEFAULT_CHANNEL_BUFFER: usize = 256;

const ENV_SERVER_URL: &str = "CHAT_SERVER_URL";
const ENV_TYPING_QUIET_MS: &str = "CHAT_TYPING_QUIET_MS";
const ENV_CHANNEL_BUFFER: &str = "CHAT_CHANNEL_BUFFER";

/// Settings for one [`crate::ChatSession`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Silence after the last input change before typing=false is sent
    pub typing_quiet_window: Duration,
    /// Capacity of the session's command and input channels
    pub channel_buffer: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            typing_quiet_window: DEFAULT_TYPING_QUIET_WINDOW,
            channel_buffer: DEFAULT_CHANNEL_BUFFER,
        }
    }
}

/// Settings for the terminal client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub server_url: String,
    pub session: SessionConfig,
}

impl ClientConfig {
    /// Read from process arguments and environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_sources(std::env::args().nth(1), |name| std::env::var(name).ok())
    }

    /// Build from an optional URL argument and a variable lookup
    pub fn from_sources<F>(url_arg: Option<String>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let server_url = url_arg
            .or_else(|| lookup(ENV_SERVER_URL))
            .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());

        let mut session = SessionConfig::default();
        if let Some(ms) = parse_var::<u64, _>(&lookup, ENV_TYPING_QUIET_MS)? {
            session.typing_quiet_window = Duration::from_millis(ms);
        }
        if let Some(buffer) = parse_var::<usize, _>(&lookup, ENV_CHANNEL_BUFFER)? {
            // mpsc::channel panics on zero capacity
            session.channel_buffer = buffer.max(1);
        }

        Ok(Self {
            server_url,
            session,
        })
    }
}

fn parse_var<T, F>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(value) => match value.trim().parse() {
            Ok(parsed) => Ok(Some(parsed)),
            Err(_) => Err(ConfigError::InvalidValue { name, value }),
        },
    }
}
