//! HTTP and process abstractions for testability
//!
//! `HttpClient` and `CommandRunner` are the two seams to the outside world.
//! Production code uses reqwest and tokio processes; tests substitute
//! mockall mocks or hand-written fakes.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;


/// HTTP response from a request
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// Abstraction over HTTP client for dependency injection
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait HttpClient: Send + Sync {
    /// Send a GET request to the given URL
    async fn get(&self, url: &str) -> crate::Result<HttpResponse>;

    /// Send a POST request with a JSON body
    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> crate::Result<HttpResponse>;
}

/// Production HTTP client using reqwest
#[derive(Default)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    /// Create a client whose requests fail after `timeout`
    pub fn new(timeout: Duration) -> crate::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                crate::RaidSentinelError::Http(format!("Building HTTP client: {}", e))
            })?;
        Ok(Self { client })
    }
}

/// Strip the bot token from a Bot API URL before it is logged.
///
/// The token segment is the last one starting with `bot`, since the base URL
/// of a proxy may carry `/bot` in its own path.
pub fn redact_url(url: &str) -> String {
    match url.rfind("/bot") {
        Some(start) => {
            let token_start = start + "/bot".len();
            let rest = &url[token_start..];
            let tail = rest.find('/').map(|i| &rest[i..]).unwrap_or("");
            format!("{}/bot<redacted>{}", &url[..start], tail)
        }
        None => url.to_string(),
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get(&self, url: &str) -> crate::Result<HttpResponse> {
        let shown = redact_url(url);
        tracing::debug!("GET {}", shown);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| {
                crate::RaidSentinelError::Http(format!(
                    "GET {} failed: {}",
                    shown,
                    e.without_url()
                ))
            })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| {
                crate::RaidSentinelError::Http(format!(
                    "Reading response body: {}",
                    e.without_url()
                ))
            })?;

        tracing::debug!("GET {} -> {} ({} bytes)", shown, status, body.len());
        Ok(HttpResponse { status, body })
    }

    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> crate::Result<HttpResponse> {
        let shown = redact_url(url);
        tracing::debug!("POST {}", shown);
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                crate::RaidSentinelError::Http(format!(
                    "POST {} failed: {}",
                    shown,
                    e.without_url()
                ))
            })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| {
                crate::RaidSentinelError::Http(format!(
                    "Reading response body: {}",
                    e.without_url()
                ))
            })?;

        tracing::debug!("POST {} -> {} ({} bytes)", shown, status, body.len());
        Ok(HttpResponse { status, body })
    }
}

/// Captured result of a finished command
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Exit code, `None` when the process was terminated by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Trait for running an external command to completion
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args`, giving up after `timeout`
    async fn run(
        &self,
        program: &str,
        args: &[String],
        timeout: Duration,
    ) -> crate::Result<CommandOutput>;
}

/// Tokio implementation of CommandRunner
#[derive(Default, Clone)]
pub struct TokioCommandRunner;

impl TokioCommandRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for TokioCommandRunner {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        timeout: Duration,
    ) -> crate::Result<CommandOutput> {
        tracing::debug!("Running {} {:?}", program, args);

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd.spawn().map_err(|e| {
            crate::RaidSentinelError::Execution(format!("Failed to start {}: {}", program, e))
        })?;

        let output = tokio::time::timeout(timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                crate::RaidSentinelError::Execution(format!(
                    "{} did not finish within {:?}",
                    program, timeout
                ))
            })?
            .map_err(|e| {
                crate::RaidSentinelError::Execution(format!("Waiting for {}: {}", program, e))
            })?;

        let result = CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        tracing::debug!(
            "{} exited with {:?} ({} bytes of output)",
            program,
            result.code,
            result.stdout.len()
        );
        Ok(result)
    }
}
