//! Client configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file if present).

use chat_core::Intents;
use serde::Deserialize;
use std::env;
use std::time::Duration;

/// Main client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    pub app: AppSettings,
    pub credentials: CredentialsConfig,
    pub api: ApiConfig,
    pub gateway: GatewaySettings,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_env")]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "production" => Some(Self::Production),
            "staging" => Some(Self::Staging),
            "development" => Some(Self::Development),
            _ => None,
        }
    }
}

/// Application credentials
///
/// Every field is optional: webhook-only clients run without a bot token.
#[derive(Clone, Default, Deserialize)]
pub struct CredentialsConfig {
    pub bot_token: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

impl std::fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialsConfig")
            .field("bot_token", &self.bot_token.as_ref().map(|_| "<redacted>"))
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// REST API settings
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_base_url")]
    pub base_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Gateway settings
#[derive(Debug, Clone, Deserialize)]
pub struct GatewaySettings {
    #[serde(default = "default_gateway_url")]
    pub url: String,
    #[serde(default)]
    pub intents: Intents,
    #[serde(default = "default_receive_timeout_secs")]
    pub receive_timeout_secs: u64,
}

impl GatewaySettings {
    #[must_use]
    pub fn receive_timeout(&self) -> Duration {
        Duration::from_secs(self.receive_timeout_secs)
    }
}

// Default value functions
fn default_app_name() -> String {
    "chat-client".to_string()
}

fn default_env() -> Environment {
    Environment::Development
}

fn default_api_base_url() -> String {
    "https://discord.com/api/v9".to_string()
}

fn default_user_agent() -> String {
    format!(
        "DiscordBot (https://github.com/seung/chat-client {})",
        env!("CARGO_PKG_VERSION")
    )
}

fn default_gateway_url() -> String {
    "wss://gateway.discord.gg".to_string()
}

fn default_receive_timeout_secs() -> u64 {
    120
}

impl ClientConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if a numeric variable cannot be parsed
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let intents = match non_empty("GATEWAY_INTENTS") {
            Some(raw) => Intents::parse(&raw)
                .map_err(|_| ConfigError::InvalidValue("GATEWAY_INTENTS", raw))?,
            None => Intents::default(),
        };

        let receive_timeout_secs = match non_empty("GATEWAY_RECEIVE_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue("GATEWAY_RECEIVE_TIMEOUT_SECS", raw))?,
            None => default_receive_timeout_secs(),
        };

        Ok(Self {
            app: AppSettings {
                name: non_empty("APP_NAME").unwrap_or_else(default_app_name),
                env: non_empty("APP_ENV")
                    .and_then(|s| Environment::parse(&s))
                    .unwrap_or_default(),
            },
            credentials: CredentialsConfig {
                bot_token: non_empty("BOT_TOKEN"),
                client_id: non_empty("CLIENT_ID"),
                client_secret: non_empty("CLIENT_SECRET"),
            },
            api: ApiConfig {
                base_url: non_empty("API_BASE_URL")
                    .map(|s| s.trim_end_matches('/').to_string())
                    .unwrap_or_else(default_api_base_url),
                user_agent: non_empty("USER_AGENT").unwrap_or_else(default_user_agent),
            },
            gateway: GatewaySettings {
                url: non_empty("GATEWAY_URL").unwrap_or_else(default_gateway_url),
                intents,
                receive_timeout_secs,
            },
        })
    }

    /// Bot token, or an error naming the variable that should hold it
    pub fn require_bot_token(&self) -> Result<&str, ConfigError> {
        self.credentials
            .bot_token
            .as_deref()
            .ok_or(ConfigError::MissingVar("BOT_TOKEN"))
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
