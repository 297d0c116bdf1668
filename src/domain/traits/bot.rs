use async_trait::async_trait;

use crate::application::errors::BotError;
use crate::domain::entities::Reply;

/// Bot trait - abstraction for messaging platform adapters
#[async_trait]
pub trait Bot: Send + Sync {
    /// Start the bot and begin listening for messages
    async fn start(&self) -> Result<(), BotError>;

    /// Send a message to a chat
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<String, BotError>;

    /// Send a message with inline keyboard
    async fn send_with_keyboard(&self, chat_id: &str, text: &str, buttons: Vec<Vec<KeyboardButton>>) -> Result<String, BotError>;

    /// Send a reply, attaching its keyboard when it has one
    async fn send_reply(&self, chat_id: &str, reply: &Reply) -> Result<String, BotError> {
        if reply.has_keyboard() {
            self.send_with_keyboard(chat_id, &reply.text, reply.keyboard.clone()).await
        } else {
            self.send_message(chat_id, &reply.text).await
        }
    }

    /// Get bot info
    fn bot_info(&self) -> BotInfo;
}

/// Inline keyboard button that opens a web application view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyboardButton {
    pub text: String,
    pub web_app_url: String,
}

impl KeyboardButton {
    /// No validation: an empty URL is kept as-is.
    pub fn web_app(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            web_app_url: url.into(),
        }
    }
}

/// Bot information
#[derive(Debug, Clone)]
pub struct BotInfo {
    pub id: String,
    pub name: String,
    pub username: String,
}
