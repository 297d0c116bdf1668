//! Telegram adapter

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::application::errors::BotError;
use crate::application::messaging::MessageDispatcher;
use crate::domain::entities;
use crate::domain::traits::{Bot, BotInfo, KeyboardButton};
use crate::infrastructure::config::{redact, Config};

/// Update kinds requested from `getUpdates`
const ALLOWED_UPDATES: &[&str] = &["message"];

/// Extra HTTP time on top of the long-poll timeout
const HTTP_TIMEOUT_MARGIN_SECS: u64 = 10;

/// Telegram update type
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<User>,
    pub chat: Chat,
    pub text: Option<String>,
    pub caption: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    pub username: Option<String>,
    pub first_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Chat {
    pub id: i64,
}

/// Envelope wrapping every Bot API response
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
    error_code: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct InlineKeyboardMarkup {
    inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

#[derive(Debug, Serialize)]
struct InlineKeyboardButton {
    text: String,
    web_app: WebAppInfo,
}

#[derive(Debug, Serialize)]
struct WebAppInfo {
    url: String,
}

impl From<&[Vec<KeyboardButton>]> for InlineKeyboardMarkup {
    fn from(rows: &[Vec<KeyboardButton>]) -> Self {
        let inline_keyboard = rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|btn| InlineKeyboardButton {
                        text: btn.text.clone(),
                        web_app: WebAppInfo {
                            url: btn.web_app_url.clone(),
                        },
                    })
                    .collect()
            })
            .collect();
        Self { inline_keyboard }
    }
}

impl Message {
    /// Text a command can be read from: the text, or a media caption
    fn command_text(&self) -> Option<&str> {
        self.text.as_deref().or(self.caption.as_deref())
    }
}

impl From<&User> for entities::User {
    fn from(user: &User) -> Self {
        let mut converted = entities::User::new(user.id.to_string());
        if let Some(username) = &user.username {
            converted = converted.with_username(username);
        }
        if let Some(first_name) = &user.first_name {
            converted = converted.with_first_name(first_name);
        }
        converted
    }
}

/// Telegram bot adapter
pub struct TelegramAdapter {
    token: String,
    base_url: String,
    client: Client,
    info: BotInfo,
    poll_timeout: u64,
}

impl TelegramAdapter {
    pub fn new(token: impl Into<String>, base_url: impl Into<String>, poll_timeout: u64) -> Result<Self, BotError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(poll_timeout + HTTP_TIMEOUT_MARGIN_SECS))
            .build()
            .map_err(|e| BotError::Network(e.to_string()))?;

        Ok(Self {
            token: token.into(),
            base_url: base_url.into(),
            client,
            info: BotInfo {
                id: "unknown".to_string(),
                name: "game-launcher-bot".to_string(),
                username: String::new(),
            },
            poll_timeout,
        })
    }

    /// Build an adapter from validated configuration
    pub fn from_config(config: &Config) -> Result<Self, BotError> {
        let token = config.require_token()?;
        Self::new(token, &config.telegram.api_url, config.telegram.poll_timeout_secs)
    }

    /// Get the API URL for a method
    fn api_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, method)
    }

    /// POST a Bot API method and unwrap the response envelope
    async fn call<P, R>(&self, method: &str, payload: &P) -> Result<R, BotError>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self.client
            .post(self.api_url(method))
            .json(payload)
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        let envelope: ApiResponse<R> = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => {
                return Err(BotError::Network(format!("Telegram API error: {}", status)));
            }
            Err(e) => return Err(BotError::Parse(format!("{}: {}", method, e))),
        };

        if !envelope.ok {
            return Err(BotError::Api {
                code: envelope.error_code.unwrap_or_else(|| i64::from(status.as_u16())),
                description: envelope.description.unwrap_or_default(),
            });
        }

        envelope
            .result
            .ok_or_else(|| BotError::Parse(format!("{}: response has no result", method)))
    }

    /// Fetch bot info from Telegram API. A rejected token fails here.
    pub async fn fetch_bot_info(&mut self) -> Result<(), BotError> {
        #[derive(Deserialize)]
        struct BotInfoResponse {
            id: i64,
            first_name: String,
            username: String,
        }

        let me: BotInfoResponse = self
            .call("getMe", &serde_json::json!({}))
            .await
            .map_err(|e| match e {
                BotError::Api { code: 401 | 404, description } => {
                    BotError::Auth(format!("Telegram rejected the bot token: {}", description))
                }
                other => other,
            })?;

        self.info = BotInfo {
            id: me.id.to_string(),
            name: me.first_name,
            username: me.username,
        };

        Ok(())
    }

    /// Get updates from Telegram using getUpdates API
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>, BotError> {
        #[derive(Serialize)]
        struct GetUpdatesRequest<'a> {
            offset: i64,
            timeout: u64,
            allowed_updates: &'a [&'a str],
        }

        let request = GetUpdatesRequest {
            offset,
            timeout: self.poll_timeout,
            allowed_updates: ALLOWED_UPDATES,
        };

        self.call("getUpdates", &request).await
    }

    /// Get the next update offset
    pub fn get_next_offset(updates: &[Update], current: i64) -> i64 {
        updates
            .iter()
            .map(|u| u.update_id + 1)
            .max()
            .unwrap_or(current)
            .max(current)
    }

    /// Publish the command menu shown by Telegram clients
    pub async fn register_commands(&self, menu: &[(String, String)]) -> Result<(), BotError> {
        #[derive(Serialize)]
        struct BotCommand<'a> {
            command: &'a str,
            description: &'a str,
        }

        #[derive(Serialize)]
        struct SetMyCommandsRequest<'a> {
            commands: Vec<BotCommand<'a>>,
        }

        let request = SetMyCommandsRequest {
            commands: menu
                .iter()
                .map(|(command, description)| BotCommand {
                    command: command.as_str(),
                    description: description.as_str(),
                })
                .collect(),
        };

        let _: bool = self.call("setMyCommands", &request).await?;

        tracing::info!("Registered {} bot command(s) with Telegram", menu.len());
        Ok(())
    }

    /// Convert an update into a domain message; `None` for anything without text
    pub fn to_message(&self, dispatcher: &MessageDispatcher, update: &Update) -> Option<entities::Message> {
        let msg = update.message.as_ref()?;
        let text = msg.command_text()?;
        let sender = msg.from.as_ref().map(entities::User::from);

        Some(
            dispatcher
                .parse(msg.chat.id.to_string(), text, sender)
                .with_id(msg.message_id.to_string())
                .with_platform("telegram"),
        )
    }

    /// Route one update through the dispatcher. Returns whether a reply was sent.
    pub async fn handle_update(&self, dispatcher: &MessageDispatcher, update: &Update) -> Result<bool, BotError> {
        match self.to_message(dispatcher, update) {
            Some(message) => dispatcher.dispatch(self, &message).await,
            None => {
                tracing::debug!("Skipping update {} without text", update.update_id);
                Ok(false)
            }
        }
    }

    /// Send a message via Telegram API
    pub async fn send_message_api(
        &self,
        chat_id: &str,
        text: &str,
        reply_markup: Option<InlineKeyboardMarkup>,
    ) -> Result<String, BotError> {
        #[derive(Serialize)]
        struct SendMessageRequest<'a> {
            chat_id: &'a str,
            text: &'a str,
            #[serde(skip_serializing_if = "Option::is_none")]
            reply_markup: Option<InlineKeyboardMarkup>,
        }

        #[derive(Deserialize)]
        struct MessageResult {
            message_id: i64,
        }

        let request = SendMessageRequest { chat_id, text, reply_markup };
        let sent: MessageResult = self.call("sendMessage", &request).await?;

        Ok(sent.message_id.to_string())
    }
}

#[async_trait]
impl Bot for TelegramAdapter {
    async fn start(&self) -> Result<(), BotError> {
        tracing::info!("Starting Telegram bot (token: {})", redact(&self.token));
        Ok(())
    }

    async fn send_message(&self, chat_id: &str, text: &str) -> Result<String, BotError> {
        tracing::debug!("Sending to {}: {}", chat_id, text);
        self.send_message_api(chat_id, text, None).await
    }

    async fn send_with_keyboard(&self, chat_id: &str, text: &str, buttons: Vec<Vec<KeyboardButton>>) -> Result<String, BotError> {
        tracing::debug!("Sending with keyboard to {}: {}", chat_id, text);
        let markup = InlineKeyboardMarkup::from(buttons.as_slice());
        self.send_message_api(chat_id, text, Some(markup)).await
    }

    fn bot_info(&self) -> BotInfo {
        self.info.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::errors::ConfigError;
    use crate::application::services::{launcher, CommandService};
    use httpmock::prelude::*;
    use serde_json::{json, Value};

    const TOKEN: &str = "123456:test-token";

    fn adapter(server: &MockServer) -> TelegramAdapter {
        TelegramAdapter::new(TOKEN, server.base_url(), 0).expect("adapter")
    }

    fn dispatcher(domain: &str) -> MessageDispatcher {
        let domain = domain.to_string();
        let config = Config::from_lookup(move |key| match key {
            "VITE_FRONTEND_DOMAIN" => Some(domain.clone()),
            _ => None,
        });
        let mut commands = CommandService::new();
        commands.register(launcher::start_command(&config));
        MessageDispatcher::new(commands).with_bot_username("GameBot")
    }

    fn method_path(method: &str) -> String {
        format!("/bot{}/{}", TOKEN, method)
    }

    fn body_json(req: &HttpMockRequest) -> Value {
        serde_json::from_slice(req.body().as_ref()).unwrap_or(Value::Null)
    }

    fn text_update(update_id: i64, chat_id: i64, text: &str) -> Update {
        serde_json::from_value(json!({
            "update_id": update_id,
            "message": {
                "message_id": 10,
                "from": { "id": chat_id, "is_bot": false, "first_name": "Ann", "username": "ann" },
                "chat": { "id": chat_id, "type": "private" },
                "date": 1700000000,
                "text": text
            }
        }))
        .expect("update")
    }

    #[test]
    fn from_config_requires_a_valid_token() {
        let missing = TelegramAdapter::from_config(&Config::from_lookup(|_| None));
        assert!(matches!(missing, Err(BotError::Config(ConfigError::MissingField(_)))));

        let malformed = TelegramAdapter::from_config(&Config::from_lookup(|_| None).with_token("not-a-token"));
        assert!(matches!(malformed, Err(BotError::Config(ConfigError::InvalidValue(_)))));
    }

    #[tokio::test]
    async fn fetch_bot_info_stores_username() {
        let server = MockServer::start_async().await;
        let me = server.mock(|when, then| {
            when.method(POST).path(method_path("getMe"));
            then.status(200).json_body(json!({
                "ok": true,
                "result": { "id": 123456, "is_bot": true, "first_name": "Game", "username": "GameBot" }
            }));
        });

        let mut bot = adapter(&server);
        bot.fetch_bot_info().await.expect("getMe");

        assert_eq!(bot.bot_info().username, "GameBot");
        assert_eq!(bot.bot_info().id, "123456");
        me.assert_calls(1);
    }

    #[tokio::test]
    async fn rejected_token_is_auth_error() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path(method_path("getMe"));
            then.status(401).json_body(json!({
                "ok": false,
                "error_code": 401,
                "description": "Unauthorized"
            }));
        });

        let mut bot = adapter(&server);
        let err = bot.fetch_bot_info().await.unwrap_err();

        assert!(matches!(err, BotError::Auth(ref msg) if msg.contains("Unauthorized")), "{:?}", err);
    }

    #[tokio::test]
    async fn non_json_error_is_network_error() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path(method_path("getUpdates"));
            then.status(502).body("Bad Gateway");
        });

        let err = adapter(&server).get_updates(0).await.unwrap_err();
        assert!(format!("{err}").contains("502"));
    }

    #[tokio::test]
    async fn get_updates_sends_offset_and_decodes() {
        let server = MockServer::start_async().await;
        let updates = server.mock(|when, then| {
            when.method(POST).path(method_path("getUpdates")).is_true(|req| {
                let body = body_json(req);
                body["offset"] == json!(7)
                    && body["timeout"] == json!(0)
                    && body["allowed_updates"] == json!(["message"])
            });
            then.status(200).json_body(json!({
                "ok": true,
                "result": [
                    { "update_id": 7, "message": {
                        "message_id": 1, "chat": { "id": 5, "type": "private" }, "date": 0, "text": "/start"
                    } },
                    { "update_id": 8, "edited_message": {
                        "message_id": 1, "chat": { "id": 5, "type": "private" }, "date": 0, "text": "hi"
                    } }
                ]
            }));
        });

        let received = adapter(&server).get_updates(7).await.expect("updates");

        assert_eq!(received.len(), 2);
        assert!(received[0].message.is_some());
        assert!(received[1].message.is_none());
        assert_eq!(TelegramAdapter::get_next_offset(&received, 7), 9);
        updates.assert_calls(1);
    }

    #[test]
    fn next_offset_keeps_current_on_empty_batch() {
        assert_eq!(TelegramAdapter::get_next_offset(&[], 42), 42);
        assert_eq!(TelegramAdapter::get_next_offset(&[text_update(3, 1, "x")], 42), 42);
    }

    #[tokio::test]
    async fn start_update_sends_web_app_button() {
        let server = MockServer::start_async().await;
        let send = server.mock(|when, then| {
            when.method(POST).path(method_path("sendMessage")).is_true(|req| {
                body_json(req)
                    == json!({
                        "chat_id": "12345",
                        "text": "Click the button to open the game!",
                        "reply_markup": {
                            "inline_keyboard": [[
                                { "text": "Open", "web_app": { "url": "https://example.com" } }
                            ]]
                        }
                    })
            });
            then.status(200).json_body(json!({ "ok": true, "result": { "message_id": 99 } }));
        });

        let bot = adapter(&server);
        let sent = bot
            .handle_update(&dispatcher("https://example.com"), &text_update(1, 12345, "/start"))
            .await
            .expect("handled");

        assert!(sent);
        send.assert_calls(1);
    }

    #[tokio::test]
    async fn caption_command_is_handled() {
        let server = MockServer::start_async().await;
        let send = server.mock(|when, then| {
            when.method(POST).path(method_path("sendMessage"));
            then.status(200).json_body(json!({ "ok": true, "result": { "message_id": 1 } }));
        });

        let update: Update = serde_json::from_value(json!({
            "update_id": 2,
            "message": {
                "message_id": 3, "chat": { "id": 8, "type": "private" }, "date": 0,
                "photo": [], "caption": "/start"
            }
        }))
        .expect("update");

        assert!(adapter(&server).handle_update(&dispatcher("https://example.com"), &update).await.unwrap());
        send.assert_calls(1);
    }

    #[tokio::test]
    async fn other_updates_send_nothing() {
        let server = MockServer::start_async().await;
        let send = server.mock(|when, then| {
            when.method(POST).path(method_path("sendMessage"));
            then.status(200).json_body(json!({ "ok": true, "result": { "message_id": 1 } }));
        });

        let bot = adapter(&server);
        let dispatcher = dispatcher("https://example.com");
        let no_message = Update { update_id: 4, message: None };

        for update in [
            text_update(1, 1, "hello"),
            text_update(2, 1, "/help"),
            text_update(3, 1, "/start@OtherBot"),
            no_message,
        ] {
            assert!(!bot.handle_update(&dispatcher, &update).await.unwrap());
        }
        send.assert_calls(0);
    }

    #[tokio::test]
    async fn send_failure_surfaces_api_error() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path(method_path("sendMessage"));
            then.status(400).json_body(json!({
                "ok": false,
                "error_code": 400,
                "description": "Bad Request: BUTTON_URL_INVALID"
            }));
        });

        let err = adapter(&server)
            .handle_update(&dispatcher(""), &text_update(1, 5, "/start"))
            .await
            .unwrap_err();

        assert!(matches!(err, BotError::Api { code: 400, ref description } if description.contains("BUTTON_URL_INVALID")));
    }

    #[tokio::test]
    async fn register_commands_posts_menu() {
        let server = MockServer::start_async().await;
        let set = server.mock(|when, then| {
            when.method(POST).path(method_path("setMyCommands")).is_true(|req| {
                body_json(req) == json!({ "commands": [{ "command": "start", "description": "Open the game" }] })
            });
            then.status(200).json_body(json!({ "ok": true, "result": true }));
        });

        let menu = dispatcher("x").commands().menu();
        adapter(&server).register_commands(&menu).await.expect("setMyCommands");
        set.assert_calls(1);
    }
}
