//! Message dispatcher - Routes messages to command handlers and delivers replies

use crate::application::errors::BotError;
use crate::application::services::CommandService;
use crate::domain::entities::{Content, Message, Reply, User};
use crate::domain::traits::Bot;
use super::parser::MessageParser;

/// Message dispatcher - routes messages to handlers
pub struct MessageDispatcher {
    parser: MessageParser,
    commands: CommandService,
    bot_username: Option<String>,
}

impl MessageDispatcher {
    pub fn new(commands: CommandService) -> Self {
        Self {
            parser: MessageParser::new(),
            commands,
            bot_username: None,
        }
    }

    /// Own username, used to accept `/cmd@username` and drop commands meant for other bots
    pub fn with_bot_username(mut self, username: impl Into<String>) -> Self {
        self.bot_username = Some(username.into());
        self
    }

    pub fn commands(&self) -> &CommandService {
        &self.commands
    }

    /// Parse raw text from a chat
    pub fn parse(&self, chat_id: impl Into<String>, text: impl Into<String>, sender: Option<User>) -> Message {
        self.parser.parse(chat_id, text, sender)
    }

    /// Process a message, producing the reply to send if any handler matched
    pub fn process(&self, message: &Message) -> Option<Reply> {
        if let Content::Command { name, mention: Some(mention), .. } = &message.content {
            if !self.addressed_to_me(mention) {
                tracing::debug!("[{}] Ignoring /{}@{}", message.chat_id, name, mention);
                return None;
            }
        }

        self.commands.handle(message)
    }

    /// Process a message and send the reply through `bot`.
    ///
    /// Returns whether a reply was sent.
    pub async fn dispatch<B: Bot + ?Sized>(&self, bot: &B, message: &Message) -> Result<bool, BotError> {
        let Some(reply) = self.process(message) else {
            return Ok(false);
        };

        let message_id = bot.send_reply(&message.chat_id, &reply).await?;
        tracing::debug!("[{}] Sent reply {} to message {}", message.chat_id, message_id, message.id);
        Ok(true)
    }

    fn addressed_to_me(&self, mention: &str) -> bool {
        self.bot_username
            .as_deref()
            .is_some_and(|own| own.eq_ignore_ascii_case(mention))
    }
}
