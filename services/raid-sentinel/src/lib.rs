//! RAID sentinel - software RAID health check with Telegram alerting
//!
//! Runs `mdadm --detail` once, and when the output reports a failure sends an
//! alert to every Telegram chat that has talked to the bot.

pub mod config;
pub mod engine;
pub mod error;
pub mod io;
pub mod mdadm;
pub mod monitor;
pub mod notifier;
pub mod telegram;

pub use config::{load_config, Config};
pub use engine::{Engine, RunOutcome};
pub use error::{RaidSentinelError, Result};

use std::sync::Arc;

use crate::io::{CommandRunner, HttpClient, ReqwestHttpClient, TokioCommandRunner};
use crate::mdadm::MdadmMonitor;
use crate::notifier::{DeliveryReport, Notification, Notifier};
use crate::telegram::{Discovery, TelegramNotifier};

/// Build an engine from `config` on top of the given I/O implementations
pub fn build_engine(
    config: &Config,
    http: Arc<dyn HttpClient>,
    runner: Arc<dyn CommandRunner>,
) -> Engine {
    let monitor = Arc::new(MdadmMonitor::new(&config.status, runner));
    let notifier: Arc<dyn Notifier> = Arc::new(TelegramNotifier::new(&config.telegram, http));
    Engine::new(monitor, vec![notifier], &config.alert)
}

/// Subject of the message sent by `test-message` when none is given
pub const DEFAULT_TEST_SUBJECT: &str = "Testing";
/// Body of the message sent by `test-message` when none is given
pub const DEFAULT_TEST_BODY: &str = "More testing";

/// The reqwest-backed client, with the configured Bot API timeout
pub fn http_client(config: &Config) -> Result<Arc<dyn HttpClient>> {
    Ok(Arc::new(ReqwestHttpClient::new(config.telegram.timeout)?))
}

/// Run one check with the production HTTP client and process runner
pub async fn run(config: &Config) -> Result<RunOutcome> {
    let engine = build_engine(
        config,
        http_client(config)?,
        Arc::new(TokioCommandRunner::new()),
    );
    engine.run_once().await
}

/// Broadcast `notification` to the configured recipients without looking at the array
pub async fn send_test_message(
    config: &Config,
    http: Arc<dyn HttpClient>,
    notification: &Notification,
) -> Result<DeliveryReport> {
    let notifier = TelegramNotifier::new(&config.telegram, http);
    notifier.notify(notification).await
}

/// Fetch the chat ids the bot can currently see
pub async fn list_chats(config: &Config, http: Arc<dyn HttpClient>) -> Result<Discovery> {
    let notifier = TelegramNotifier::new(&config.telegram, http);
    notifier.client().discover_chat_ids().await
}
