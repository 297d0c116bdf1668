//! `/start` handler: replies with a button that opens the game's web app

use crate::domain::entities::{Command, Content, Message, Reply};
use crate::domain::traits::KeyboardButton;
use crate::infrastructure::config::Config;

pub const START_COMMAND: &str = "start";
pub const START_DESCRIPTION: &str = "Open the game";
pub const START_TEXT: &str = "Click the button to open the game!";
pub const OPEN_BUTTON_LABEL: &str = "Open";

/// Build the `/start` reply for a frontend URL.
pub fn start_reply(frontend_url: &str) -> Reply {
    Reply::text(START_TEXT).with_row(vec![KeyboardButton::web_app(OPEN_BUTTON_LABEL, frontend_url)])
}

/// The `/start` command bound to the configured frontend domain.
pub fn start_command(config: &Config) -> Command {
    let frontend_url = config.frontend.domain.clone();

    Command::new(START_COMMAND)
        .with_description(START_DESCRIPTION)
        .with_handler(move |msg: &Message| {
            tracing::info!(
                "[{}] /start via {} from {}",
                msg.chat_id,
                msg.platform,
                msg.sender.as_ref().map(|u| u.display_name()).unwrap_or_else(|| "unknown".to_string())
            );
            if let Content::Command { args, .. } = &msg.content {
                if !args.is_empty() {
                    tracing::debug!("[{}] Ignoring /start payload {:?}", msg.chat_id, args);
                }
            }
            start_reply(&frontend_url)
        })
}
