//! Configuration types for the RAID sentinel

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable holding the Telegram bot token
pub const BOT_TOKEN_ENV: &str = "BOT_TOKEN";

/// Environment variable holding a single destination chat id
pub const CHAT_ID_ENV: &str = "CHAT_ID";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub status: StatusConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub alert: AlertConfig,
}

/// How the array status is obtained and classified
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusConfig {
    #[serde(default = "default_status_command")]
    pub command: String,
    #[serde(default = "default_status_args")]
    pub args: Vec<String>,
    #[serde(default = "default_device")]
    pub device: String,
    #[serde(default = "default_failure_marker")]
    pub failure_marker: String,
    #[serde(default = "default_true")]
    pub case_sensitive: bool,
    #[serde(default = "default_status_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            command: default_status_command(),
            args: default_status_args(),
            device: default_device(),
            failure_marker: default_failure_marker(),
            case_sensitive: true,
            timeout: default_status_timeout(),
        }
    }
}

/// Telegram Bot API settings
#[derive(Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: Option<String>,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_http_timeout", with = "humantime_serde")]
    pub timeout: Duration,
    #[serde(default)]
    pub recipients: RecipientsConfig,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            api_base_url: default_api_base_url(),
            timeout: default_http_timeout(),
            recipients: RecipientsConfig::default(),
        }
    }
}

// The bot token is part of every request URL, keep it out of logs.
impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &self.bot_token.as_ref().map(|_| "<redacted>"))
            .field("api_base_url", &self.api_base_url)
            .field("timeout", &self.timeout)
            .field("recipients", &self.recipients)
            .finish()
    }
}

/// Where the alert recipients come from
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecipientsConfig {
    #[serde(default)]
    pub mode: RecipientMode,
    #[serde(default)]
    pub chat_ids: Vec<String>,
}

/// Recipient resolution mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecipientMode {
    /// Harvest chat ids from the bot's update feed, plus any configured ids
    #[default]
    Discover,
    /// Only the configured chat ids
    Static,
}

/// Alert message content
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertConfig {
    #[serde(default = "default_alert_subject")]
    pub subject: String,
    #[serde(default = "default_alert_body")]
    pub body: String,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            subject: default_alert_subject(),
            body: default_alert_body(),
        }
    }
}

impl Config {
    /// Fill in secrets from the process environment and validate the result
    pub fn resolve_secrets(&mut self) -> crate::Result<()> {
        self.resolve_secrets_with(|key| std::env::var(key).ok())
    }

    /// Fill in secrets using `lookup` in place of the process environment.
    ///
    /// A token already present in the config file wins over `BOT_TOKEN`.
    /// `CHAT_ID` adds a static recipient and switches to static mode.
    pub fn resolve_secrets_with<F>(&mut self, lookup: F) -> crate::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let has_token = self
            .telegram
            .bot_token
            .as_deref()
            .is_some_and(|t| !t.trim().is_empty());
        if !has_token {
            self.telegram.bot_token = lookup(BOT_TOKEN_ENV)
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty());
        }

        if let Some(chat_id) = lookup(CHAT_ID_ENV)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
        {
            tracing::debug!("{} set, using static recipient mode", CHAT_ID_ENV);
            let recipients = &mut self.telegram.recipients;
            if !recipients.chat_ids.contains(&chat_id) {
                recipients.chat_ids.push(chat_id);
            }
            recipients.mode = RecipientMode::Static;
        }

        self.validate()
    }

    /// Check settings that cannot be enforced by deserialization alone
    pub fn validate(&self) -> crate::Result<()> {
        if self.status.command.trim().is_empty() {
            return Err(crate::RaidSentinelError::Config(
                "status.command must not be empty".to_string(),
            ));
        }
        if self.status.failure_marker.is_empty() {
            return Err(crate::RaidSentinelError::Config(
                "status.failure_marker must not be empty".to_string(),
            ));
        }
        let recipients = &self.telegram.recipients;
        if recipients.mode == RecipientMode::Static && recipients.chat_ids.is_empty() {
            return Err(crate::RaidSentinelError::Config(format!(
                "static recipient mode requires telegram.recipients.chat_ids or {}",
                CHAT_ID_ENV
            )));
        }
        Ok(())
    }
}

fn default_status_command() -> String {
    "mdadm".to_string()
}

fn default_status_args() -> Vec<String> {
    vec!["--detail".to_string()]
}

fn default_device() -> String {
    "/dev/md0".to_string()
}

fn default_failure_marker() -> String {
    "failed".to_string()
}

fn default_true() -> bool {
    true
}

fn default_status_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_api_base_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_http_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_alert_subject() -> String {
    "RAID Failure Alert".to_string()
}

fn default_alert_body() -> String {
    "A failure was detected in the RAID array.".to_string()
}

/// Load configuration from a JSON file
pub fn load_config(path: &Path) -> crate::Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        crate::RaidSentinelError::Config(format!("Failed to read config file {:?}: {}", path, e))
    })?;
    let config: Config = serde_json::from_str(&content)?;
    Ok(config)
}
