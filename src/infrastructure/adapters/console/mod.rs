//! Console adapter for local dry runs

use async_trait::async_trait;
use std::io::{BufRead, Write};

use crate::application::errors::BotError;
use crate::domain::traits::{Bot, BotInfo, KeyboardButton};

/// Chat id used for every console message
pub const CONSOLE_CHAT_ID: &str = "console";

/// Console bot adapter: replies go to stdout
pub struct ConsoleAdapter {
    info: BotInfo,
}

impl ConsoleAdapter {
    pub fn new() -> Self {
        Self {
            info: BotInfo {
                id: "console".to_string(),
                name: "game-launcher-bot".to_string(),
                username: "console".to_string(),
            },
        }
    }

    /// Read one line from stdin; `None` at end of input.
    pub async fn read_line(&self, prompt: &str) -> Option<String> {
        print!("{}", prompt);
        let _ = std::io::stdout().flush();

        let mut input = String::new();
        match std::io::stdin().lock().read_line(&mut input) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(input.trim().to_string()),
        }
    }

    /// Render a reply the way it would appear in a chat
    pub fn render(text: &str, buttons: &[Vec<KeyboardButton>]) -> String {
        let mut out = format!("[BOT] {}", text);
        for row in buttons {
            let row_text: Vec<String> = row
                .iter()
                .map(|b| format!("{} -> {}", b.text, b.web_app_url))
                .collect();
            out.push_str(&format!("\n  [Buttons] {}", row_text.join(" | ")));
        }
        out
    }
}

impl Default for ConsoleAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Bot for ConsoleAdapter {
    async fn start(&self) -> Result<(), BotError> {
        tracing::info!("Starting console bot (dry run)");
        Ok(())
    }

    async fn send_message(&self, _chat_id: &str, text: &str) -> Result<String, BotError> {
        println!("{}", Self::render(text, &[]));
        Ok("console_msg".to_string())
    }

    async fn send_with_keyboard(&self, _chat_id: &str, text: &str, buttons: Vec<Vec<KeyboardButton>>) -> Result<String, BotError> {
        println!("{}", Self::render(text, &buttons));
        Ok("console_msg".to_string())
    }

    fn bot_info(&self) -> BotInfo {
        self.info.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_buttons_with_targets() {
        let rendered = ConsoleAdapter::render(
            "Click the button to open the game!",
            &[vec![KeyboardButton::web_app("Open", "https://example.com")]],
        );
        assert_eq!(
            rendered,
            "[BOT] Click the button to open the game!\n  [Buttons] Open -> https://example.com"
        );
    }

    #[test]
    fn renders_plain_text() {
        assert_eq!(ConsoleAdapter::render("hi", &[]), "[BOT] hi");
    }
}
