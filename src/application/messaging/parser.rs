//! Message parser - Parses raw text into structured messages

use crate::domain::entities::{Content, Message, User};

/// Prefix that marks a bot command
pub const COMMAND_PREFIX: char = '/';

/// Parses incoming text into structured Message objects
#[derive(Debug, Clone, Default)]
pub struct MessageParser;

impl MessageParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse a text message
    pub fn parse(&self, chat_id: impl Into<String>, text: impl Into<String>, sender: Option<User>) -> Message {
        let text = text.into();
        let chat_id = chat_id.into();

        let content = match text.strip_prefix(COMMAND_PREFIX) {
            Some(rest) => Self::parse_command(rest),
            None if text.is_empty() => Content::Empty,
            None => Content::Text(text),
        };

        Message::new(chat_id, content).with_sender_opt(sender)
    }

    /// Split `name@mention arg1 arg2` (prefix already stripped)
    fn parse_command(rest: &str) -> Content {
        let mut parts = rest.split_whitespace();
        let head = parts.next().unwrap_or("");
        let args = parts.map(str::to_string).collect();

        let (name, mention) = match head.split_once('@') {
            Some((name, mention)) => (name.to_string(), Some(mention.to_string()).filter(|m| !m.is_empty())),
            None => (head.to_string(), None),
        };

        Content::Command { name, mention, args }
    }
}
