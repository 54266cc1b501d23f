//! Notifier trait for sending alerts

use async_trait::async_trait;

/// A notification to be sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub subject: String,
    pub body: String,
}

impl Notification {
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
        }
    }

    /// Message text as delivered to recipients
    pub fn text(&self) -> String {
        format!("Subject: {}\n\n{}", self.subject, self.body)
    }
}

/// A recipient that could not be reached
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryFailure {
    pub recipient: String,
    pub error: String,
}

/// Outcome of a broadcast: delivery continues past individual failures
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: Vec<String>,
    pub failed: Vec<DeliveryFailure>,
}

impl DeliveryReport {
    pub fn attempted(&self) -> usize {
        self.delivered.len() + self.failed.len()
    }

    pub fn all_delivered(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Trait for sending notifications
#[async_trait]
pub trait Notifier: Send + Sync + std::fmt::Debug {
    /// Get the notifier type name (e.g. "telegram")
    fn type_name(&self) -> &str;

    /// Send a notification to every recipient.
    ///
    /// Returns `Err` only for failures that prevent any delivery (missing
    /// credentials, recipient lookup failing); per-recipient failures are
    /// reported in the `DeliveryReport`.
    async fn notify(&self, notification: &Notification) -> crate::Result<DeliveryReport>;
}
