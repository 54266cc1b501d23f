//! Monitor trait and status types

use async_trait::async_trait;
use std::fmt;

/// Health of the monitored array
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaidStatus {
    Healthy,
    Failed,
}

impl RaidStatus {
    pub fn is_failed(self) -> bool {
        self == RaidStatus::Failed
    }
}

impl fmt::Display for RaidStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RaidStatus::Healthy => write!(f, "Healthy"),
            RaidStatus::Failed => write!(f, "Failed"),
        }
    }
}

/// Trait for checking the state of an array
#[async_trait]
pub trait Monitor: Send + Sync + std::fmt::Debug {
    /// Get the monitor name, used in logs
    fn name(&self) -> &str;

    /// Run one status check. Errors are fatal to the run.
    async fn check(&self) -> crate::Result<RaidStatus>;
}
