//! Terminal input parsing
//!
//! Turns lines typed into the terminal client into user intents. Lines
//! starting with `/` are commands; anything else is chat text.

/// What the user asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserIntent {
    /// `/create <nickname>`
    Create { nickname: String },
    /// `/join <room-id> <nickname>`
    Join { room_id: String, nickname: String },
    /// `/leave` (also `/back`)
    Leave,
    /// `/type <text>`: update the composer without sending
    Draft(String),
    /// Plain text line
    Say(String),
    /// `/help`
    Help,
    /// `/quit`
    Quit,
    /// Unrecognised or malformed command
    Unknown(String),
}

impl UserIntent {
    /// Parse one input line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim_end_matches(&['\r', '\n'][..]);
        if line.trim().is_empty() {
            return None;
        }

        let Some(command) = line.strip_prefix('/') else {
            return Some(UserIntent::Say(line.to_string()));
        };

        let (name, rest) = match command.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (command, ""),
        };

        let intent = match name {
            "create" if !rest.is_empty() => UserIntent::Create {
                nickname: rest.to_string(),
            },
            "join" => match rest.split_once(char::is_whitespace) {
                Some((room_id, nickname)) if !nickname.trim().is_empty() => UserIntent::Join {
                    room_id: room_id.to_string(),
                    nickname: nickname.trim().to_string(),
                },
                _ => UserIntent::Unknown(line.to_string()),
            },
            "leave" | "back" => UserIntent::Leave,
            "type" => UserIntent::Draft(rest.to_string()),
            "help" => UserIntent::Help,
            "quit" | "exit" => UserIntent::Quit,
            _ => UserIntent::Unknown(line.to_string()),
        };
        Some(intent)
    }
}

/// Usage text for `/help`
pub const HELP: &str = "\
Commands:
  /create <nickname>          create a new room
  /join <room-id> <nickname>  join an existing room
  /leave                      leave the room and start over
  /type <text>                update the composer (typing indicator)
  /quit                       exit
Any other line is sent as a chat message.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_chat() {
        assert_eq!(
            UserIntent::parse("hello there\n"),
            Some(UserIntent::Say("hello there".to_string()))
        );
    }

    #[test]
    fn test_blank_line_ignored() {
        assert_eq!(UserIntent::parse("   \n"), None);
    }

    #[test]
    fn test_create_keeps_spaces_in_nickname() {
        assert_eq!(
            UserIntent::parse("/create Mary Jane"),
            Some(UserIntent::Create {
                nickname: "Mary Jane".to_string()
            })
        );
    }

    #[test]
    fn test_create_without_nickname_is_unknown() {
        assert!(matches!(
            UserIntent::parse("/create"),
            Some(UserIntent::Unknown(_))
        ));
    }

    #[test]
    fn test_join() {
        assert_eq!(
            UserIntent::parse("/join R1 Alice"),
            Some(UserIntent::Join {
                room_id: "R1".to_string(),
                nickname: "Alice".to_string()
            })
        );
        assert!(matches!(
            UserIntent::parse("/join R1"),
            Some(UserIntent::Unknown(_))
        ));
    }

    #[test]
    fn test_simple_commands() {
        assert_eq!(UserIntent::parse("/leave"), Some(UserIntent::Leave));
        assert_eq!(UserIntent::parse("/back"), Some(UserIntent::Leave));
        assert_eq!(UserIntent::parse("/quit"), Some(UserIntent::Quit));
        assert_eq!(UserIntent::parse("/help"), Some(UserIntent::Help));
        assert_eq!(
            UserIntent::parse("/type hel"),
            Some(UserIntent::Draft("hel".to_string()))
        );
        assert_eq!(UserIntent::parse("/type"), Some(UserIntent::Draft(String::new())));
    }
}
