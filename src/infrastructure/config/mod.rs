//! Configuration management
//!
//! Everything comes from the process environment, optionally seeded from a
//! `.env` file. The resulting [`Config`] is built once and never mutated
//! after startup.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::application::errors::ConfigError;

pub const TOKEN_VAR: &str = "TELEGRAM_BOT_TOKEN";
pub const FRONTEND_VAR: &str = "VITE_FRONTEND_DOMAIN";
pub const API_URL_VAR: &str = "TELEGRAM_API_URL";

pub const DEFAULT_API_URL: &str = "https://api.telegram.org";
pub const DEFAULT_POLL_TIMEOUT_SECS: u64 = 30;

/// Bot configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub telegram: TelegramConfig,
    pub frontend: FrontendConfig,
}

#[derive(Clone)]
pub struct TelegramConfig {
    pub token: Option<String>,
    pub api_url: String,
    pub poll_timeout_secs: u64,
}

/// Web app opened by the inline button
#[derive(Debug, Clone)]
pub struct FrontendConfig {
    /// Empty when unset; sent as-is.
    pub domain: String,
}

impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token", &self.token.as_deref().map(redact))
            .field("api_url", &self.api_url)
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            telegram: TelegramConfig {
                token: None,
                api_url: DEFAULT_API_URL.to_string(),
                poll_timeout_secs: DEFAULT_POLL_TIMEOUT_SECS,
            },
            frontend: FrontendConfig {
                domain: String::new(),
            },
        }
    }
}

impl Config {
    /// Load `.env` (if present) and read the process environment.
    pub fn load_env(env_file: &Path) -> Self {
        match load_dotenv(&dotenv_candidates(env_file)) {
            Some(path) => tracing::info!("Loaded environment from {}", path.display()),
            None => tracing::debug!("No .env file found, using process environment"),
        }

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        config.telegram.token = lookup(TOKEN_VAR).filter(|t| !t.is_empty());

        if let Some(url) = lookup(API_URL_VAR).filter(|u| !u.is_empty()) {
            config.telegram.api_url = url.trim_end_matches('/').to_string();
        }

        if let Some(domain) = lookup(FRONTEND_VAR) {
            config.frontend.domain = domain;
        }

        config
    }

    /// Replace the bot token (CLI override)
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.telegram.token = Some(token.into());
        self
    }

    /// The bot token, checked for presence and shape.
    pub fn require_token(&self) -> Result<&str, ConfigError> {
        let token = self
            .telegram
            .token
            .as_deref()
            .ok_or_else(|| ConfigError::MissingField(TOKEN_VAR.to_string()))?;
        validate_token(token)?;
        Ok(token)
    }

    pub fn has_frontend(&self) -> bool {
        !self.frontend.domain.is_empty()
    }
}

/// Bot tokens look like `123456:secret`: digits, a colon, a non-empty tail, no whitespace.
pub fn validate_token(token: &str) -> Result<(), ConfigError> {
    let invalid = || ConfigError::InvalidValue(format!("{} is not a valid bot token", TOKEN_VAR));

    if token.chars().any(char::is_whitespace) {
        return Err(invalid());
    }

    let (id, secret) = token.split_once(':').ok_or_else(invalid)?;
    if id.is_empty() || !id.chars().all(|c| c.is_ascii_digit()) || secret.is_empty() {
        return Err(invalid());
    }

    Ok(())
}

/// Shorten a secret for logs
pub fn redact(secret: &str) -> String {
    let prefix: String = secret.chars().take(8).collect();
    format!("{}...", prefix)
}

/// `env_file`, then `../.env`
fn dotenv_candidates(env_file: &Path) -> Vec<PathBuf> {
    vec![env_file.to_path_buf(), Path::new("..").join(".env")]
}

/// Load the first candidate file that exists. Variables already set in the
/// process are left untouched. Returns the file that was loaded.
fn load_dotenv(candidates: &[PathBuf]) -> Option<PathBuf> {
    candidates.iter().find_map(|path| match dotenvy::from_path(path) {
        Ok(()) => Some(path.clone()),
        Err(e) if e.not_found() => None,
        Err(e) => {
            tracing::warn!("Failed to load {}: {}", path.display(), e);
            None
        }
    })
}
