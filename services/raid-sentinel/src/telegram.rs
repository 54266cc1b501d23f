//! Telegram Bot API client: recipient discovery and message dispatch

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::{RecipientMode, RecipientsConfig, TelegramConfig, BOT_TOKEN_ENV};
use crate::io::HttpClient;
use crate::notifier::{DeliveryFailure, DeliveryReport, Notification, Notifier};

/// An update record that did not yield a chat id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedUpdate {
    pub index: usize,
    pub reason: String,
}

/// Chat ids harvested from the update feed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Discovery {
    /// Unique ids, sorted
    pub chat_ids: Vec<String>,
    pub skipped: Vec<SkippedUpdate>,
}

/// Render a JSON chat id in canonical decimal form
fn canonical_chat_id(id: &Value) -> Option<String> {
    let number = id.as_number()?;
    if let Some(i) = number.as_i64() {
        Some(i.to_string())
    } else if let Some(u) = number.as_u64() {
        Some(u.to_string())
    } else {
        number.as_f64().map(|f| format!("{:.0}", f))
    }
}

fn chat_id_of(update: &Value) -> std::result::Result<String, &'static str> {
    let message = update.get("message").ok_or("no message")?;
    let chat = message.get("chat").ok_or("message has no chat")?;
    let id = chat.get("id").ok_or("chat has no id")?;
    canonical_chat_id(id).ok_or("chat id is not a number")
}

/// Parse a `getUpdates` response body into unique chat ids.
///
/// The envelope must be well formed; individual records that lack
/// `message.chat.id` are skipped and listed in `Discovery::skipped`.
pub fn parse_updates(body: &str) -> crate::Result<Discovery> {
    let envelope: Value = serde_json::from_str(body).map_err(|e| {
        crate::RaidSentinelError::RemoteService(format!("undecodable getUpdates response: {}", e))
    })?;

    if envelope.get("ok").and_then(Value::as_bool) == Some(false) {
        let description = envelope
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or("no description");
        return Err(crate::RaidSentinelError::RemoteService(format!(
            "getUpdates rejected: {}",
            description
        )));
    }

    let updates = envelope
        .get("result")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            crate::RaidSentinelError::RemoteService(
                "getUpdates response has no result array".to_string(),
            )
        })?;

    let mut ids = BTreeSet::new();
    let mut skipped = Vec::new();
    for (index, update) in updates.iter().enumerate() {
        match chat_id_of(update) {
            Ok(id) => {
                ids.insert(id);
            }
            Err(reason) => {
                tracing::debug!("Skipping update #{}: {}", index, reason);
                skipped.push(SkippedUpdate {
                    index,
                    reason: reason.to_string(),
                });
            }
        }
    }

    Ok(Discovery {
        chat_ids: ids.into_iter().collect(),
        skipped,
    })
}

/// Describe a failed Bot API call from its response
fn api_failure(method: &str, status: u16, body: &str) -> crate::RaidSentinelError {
    let description = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("description").and_then(Value::as_str).map(String::from));
    match description {
        Some(d) => crate::RaidSentinelError::RemoteService(format!(
            "{} returned status {}: {}",
            method, status, d
        )),
        None => crate::RaidSentinelError::RemoteService(format!(
            "{} returned status {} with undecodable body",
            method, status
        )),
    }
}

/// Thin client over the two Bot API methods we need
pub struct TelegramClient {
    api_base_url: String,
    bot_token: Option<String>,
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramClient")
            .field("api_base_url", &self.api_base_url)
            .field("has_token", &self.bot_token.is_some())
            .finish()
    }
}

impl TelegramClient {
    pub fn new(config: &TelegramConfig, http: Arc<dyn HttpClient>) -> Self {
        Self {
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            bot_token: config.bot_token.clone(),
            http,
        }
    }

    fn token(&self) -> crate::Result<&str> {
        self.bot_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                crate::RaidSentinelError::Config(format!(
                    "{} not set in environment",
                    BOT_TOKEN_ENV
                ))
            })
    }

    fn method_url(&self, method: &str) -> crate::Result<String> {
        Ok(format!("{}/bot{}/{}", self.api_base_url, self.token()?, method))
    }

    /// Collect the unique chat ids of everyone who has messaged the bot
    pub async fn discover_chat_ids(&self) -> crate::Result<Discovery> {
        let url = self.method_url("getUpdates")?;
        let response = self.http.get(&url).await?;

        if response.status != 200 {
            return Err(api_failure("getUpdates", response.status, &response.body));
        }

        let discovery = parse_updates(&response.body)?;
        if !discovery.skipped.is_empty() {
            tracing::warn!(
                "Skipped {} update(s) without a chat id",
                discovery.skipped.len()
            );
        }
        tracing::debug!("Discovered {} chat id(s)", discovery.chat_ids.len());
        Ok(discovery)
    }

    /// Send `text` to one chat
    pub async fn send_message(&self, chat_id: &str, text: &str) -> crate::Result<()> {
        let url = self.method_url("sendMessage")?;
        let payload = json!({
            "chat_id": chat_id,
            "text": text,
        });

        let response = self.http.post_json(&url, &payload).await?;
        if response.status != 200 {
            return Err(api_failure("sendMessage", response.status, &response.body));
        }

        let parsed: Value = serde_json::from_str(&response.body).map_err(|e| {
            crate::RaidSentinelError::RemoteService(format!(
                "undecodable sendMessage response: {}",
                e
            ))
        })?;
        if parsed.get("ok").and_then(Value::as_bool) == Some(false) {
            return Err(api_failure("sendMessage", response.status, &response.body));
        }
        Ok(())
    }

    /// Send `text` to every recipient in turn, continuing past failures
    pub async fn broadcast(
        &self,
        recipients: &[String],
        text: &str,
    ) -> crate::Result<DeliveryReport> {
        self.token()?;

        let mut report = DeliveryReport::default();
        for chat_id in recipients {
            match self.send_message(chat_id, text).await {
                Ok(()) => {
                    tracing::info!("Message sent to chat {}", chat_id);
                    report.delivered.push(chat_id.clone());
                }
                Err(e) => {
                    tracing::warn!("Failed to send message to chat {}: {}", chat_id, e);
                    report.failed.push(DeliveryFailure {
                        recipient: chat_id.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }
        Ok(report)
    }
}

/// Notifier that broadcasts over Telegram
#[derive(Debug)]
pub struct TelegramNotifier {
    client: TelegramClient,
    recipients: RecipientsConfig,
}

impl TelegramNotifier {
    pub fn new(config: &TelegramConfig, http: Arc<dyn HttpClient>) -> Self {
        tracing::debug!(
            "Created TelegramNotifier in {:?} mode with {} static recipient(s)",
            config.recipients.mode,
            config.recipients.chat_ids.len()
        );
        Self {
            client: TelegramClient::new(config, http),
            recipients: config.recipients.clone(),
        }
    }

    pub fn client(&self) -> &TelegramClient {
        &self.client
    }

    /// Work out who gets the alert
    pub async fn resolve_recipients(&self) -> crate::Result<Vec<String>> {
        let mut ids: BTreeSet<String> = self.recipients.chat_ids.iter().cloned().collect();
        if self.recipients.mode == RecipientMode::Discover {
            ids.extend(self.client.discover_chat_ids().await?.chat_ids);
        }
        Ok(ids.into_iter().collect())
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    fn type_name(&self) -> &str {
        "telegram"
    }

    async fn notify(&self, notification: &Notification) -> crate::Result<DeliveryReport> {
        self.client.token()?;

        let recipients = self.resolve_recipients().await?;
        if recipients.is_empty() {
            tracing::warn!(
                "No recipients found; send the bot a message or configure chat ids"
            );
        }

        tracing::debug!(
            "Sending '{}' to {} recipient(s)",
            notification.subject,
            recipients.len()
        );
        self.client.broadcast(&recipients, &notification.text()).await
    }
}
