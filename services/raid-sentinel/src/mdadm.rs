//! mdadm array status check

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::StatusConfig;
use crate::io::CommandRunner;
use crate::monitor::{Monitor, RaidStatus};

/// Classify status tool output by looking for `marker`
pub fn classify(output: &str, marker: &str, case_sensitive: bool) -> RaidStatus {
    let found = if case_sensitive {
        output.contains(marker)
    } else {
        output.to_lowercase().contains(&marker.to_lowercase())
    };
    if found {
        RaidStatus::Failed
    } else {
        RaidStatus::Healthy
    }
}

/// Runs `mdadm --detail <device>` (or a configured substitute)
pub struct MdadmMonitor {
    name: String,
    command: String,
    args: Vec<String>,
    failure_marker: String,
    case_sensitive: bool,
    timeout: Duration,
    runner: Arc<dyn CommandRunner>,
}

impl std::fmt::Debug for MdadmMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MdadmMonitor")
            .field("name", &self.name)
            .field("command", &self.command)
            .field("args", &self.args)
            .finish()
    }
}

impl MdadmMonitor {
    pub fn new(config: &StatusConfig, runner: Arc<dyn CommandRunner>) -> Self {
        let mut args = config.args.clone();
        args.push(config.device.clone());

        tracing::debug!(
            "Created MdadmMonitor for {} using '{}'",
            config.device,
            config.command
        );

        Self {
            name: config.device.clone(),
            command: config.command.clone(),
            args,
            failure_marker: config.failure_marker.clone(),
            case_sensitive: config.case_sensitive,
            timeout: config.timeout,
            runner,
        }
    }
}

#[async_trait]
impl Monitor for MdadmMonitor {
    fn name(&self) -> &str {
        &self.name
    }

    async fn check(&self) -> crate::Result<RaidStatus> {
        let output = self
            .runner
            .run(&self.command, &self.args, self.timeout)
            .await?;

        if !output.success() {
            let exit = output
                .code
                .map(|c| format!("exit code {}", c))
                .unwrap_or_else(|| "a signal".to_string());
            return Err(crate::RaidSentinelError::Execution(format!(
                "{} terminated with {}: {}",
                self.command,
                exit,
                output.stderr.trim()
            )));
        }

        let status = classify(&output.stdout, &self.failure_marker, self.case_sensitive);
        if status.is_failed() {
            tracing::warn!("RAID failure detected on {}", self.name);
        } else {
            tracing::debug!("{} reports no '{}'", self.name, self.failure_marker);
        }
        Ok(status)
    }
}
