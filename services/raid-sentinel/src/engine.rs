//! Engine: one status check, then notify on failure

use std::sync::Arc;

use crate::config::AlertConfig;
use crate::monitor::{Monitor, RaidStatus};
use crate::notifier::{DeliveryReport, Notification, Notifier};

/// Delivery report of a single notifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifierReport {
    pub notifier_type: String,
    pub report: DeliveryReport,
}

/// What a run did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Healthy,
    Alerted(Vec<NotifierReport>),
}

/// Runs the check → branch → notify sequence
pub struct Engine {
    monitor: Arc<dyn Monitor>,
    notifiers: Vec<Arc<dyn Notifier>>,
    alert: AlertConfig,
}

impl Engine {
    pub fn new(
        monitor: Arc<dyn Monitor>,
        notifiers: Vec<Arc<dyn Notifier>>,
        alert: &AlertConfig,
    ) -> Self {
        Self {
            monitor,
            notifiers,
            alert: alert.clone(),
        }
    }

    /// Check once and alert every notifier if the array has failed.
    ///
    /// Check errors and notifier errors abort the run; per-recipient
    /// failures come back inside the reports.
    pub async fn run_once(&self) -> crate::Result<RunOutcome> {
        tracing::debug!("Checking '{}'", self.monitor.name());
        let status = self.monitor.check().await?;
        tracing::info!("'{}' is {}", self.monitor.name(), status);

        if status == RaidStatus::Healthy {
            return Ok(RunOutcome::Healthy);
        }

        let notification = Notification::new(&self.alert.subject, &self.alert.body);
        let reports = self.dispatch(&notification).await?;
        Ok(RunOutcome::Alerted(reports))
    }

    /// Send `notification` through every notifier, in order
    pub async fn dispatch(
        &self,
        notification: &Notification,
    ) -> crate::Result<Vec<NotifierReport>> {
        let mut reports = Vec::with_capacity(self.notifiers.len());
        for notifier in &self.notifiers {
            tracing::debug!(
                "Dispatching '{}' via '{}'",
                notification.subject,
                notifier.type_name()
            );
            let report = notifier.notify(notification).await?;
            if !report.all_delivered() {
                tracing::warn!(
                    "'{}' delivered to {} of {} recipient(s)",
                    notifier.type_name(),
                    report.delivered.len(),
                    report.attempted()
                );
            }
            reports.push(NotifierReport {
                notifier_type: notifier.type_name().to_string(),
                report,
            });
        }
        Ok(reports)
    }
}
