//! Hand-written stand-ins for the status command and the Bot API

use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

use raid_sentinel::io::{CommandOutput, CommandRunner, HttpClient, HttpResponse};
use raid_sentinel::RaidSentinelError;
use serde_json::{json, Value};

/// What the fake status command does when run
#[derive(Debug, Clone)]
pub enum CommandBehaviour {
    Prints(String),
    Exits(i32),
    CannotStart,
}

impl Default for CommandBehaviour {
    fn default() -> Self {
        CommandBehaviour::Prints(String::new())
    }
}

#[derive(Debug, Default)]
pub struct FakeCommandRunner {
    pub behaviour: Mutex<CommandBehaviour>,
    pub invocations: Mutex<Vec<(String, Vec<String>)>>,
}

#[async_trait::async_trait]
impl CommandRunner for FakeCommandRunner {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        _timeout: Duration,
    ) -> raid_sentinel::Result<CommandOutput> {
        self.invocations
            .lock()
            .unwrap()
            .push((program.to_string(), args.to_vec()));

        match self.behaviour.lock().unwrap().clone() {
            CommandBehaviour::Prints(stdout) => Ok(CommandOutput {
                code: Some(0),
                stdout,
                stderr: String::new(),
            }),
            CommandBehaviour::Exits(code) => Ok(CommandOutput {
                code: Some(code),
                stdout: String::new(),
                stderr: format!("{}: simulated failure", program),
            }),
            CommandBehaviour::CannotStart => Err(RaidSentinelError::Execution(format!(
                "Failed to start {}: No such file or directory",
                program
            ))),
        }
    }
}

/// The `getUpdates` feed served by the fake Bot API
#[derive(Debug)]
pub struct UpdateFeed {
    pub status: u16,
    pub records: Vec<Value>,
    pub has_result: bool,
}

impl Default for UpdateFeed {
    fn default() -> Self {
        Self {
            status: 200,
            records: Vec::new(),
            has_result: true,
        }
    }
}

impl UpdateFeed {
    fn body(&self) -> String {
        if self.has_result {
            json!({"ok": true, "result": self.records}).to_string()
        } else {
            json!({"ok": true}).to_string()
        }
    }
}

/// A request the fake Bot API received
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: &'static str,
    pub url: String,
    pub body: Option<Value>,
}

#[derive(Debug, Default)]
pub struct FakeHttpClient {
    pub feed: Mutex<UpdateFeed>,
    pub failing_chats: Mutex<HashSet<String>>,
    pub requests: Mutex<Vec<RecordedRequest>>,
}

impl FakeHttpClient {
    pub fn add_chat(&self, chat_id: i64) {
        let mut feed = self.feed.lock().unwrap();
        let update_id = feed.records.len() as i64 + 1;
        feed.records.push(json!({
            "update_id": update_id,
            "message": {"chat": {"id": chat_id}, "text": "hello"}
        }));
    }

    pub fn add_record(&self, record: Value) {
        self.feed.lock().unwrap().records.push(record);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn posted_bodies(&self) -> Vec<Value> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == "POST" && r.url.ends_with("/sendMessage"))
            .filter_map(|r| r.body)
            .collect()
    }
}

#[async_trait::async_trait]
impl HttpClient for FakeHttpClient {
    async fn get(&self, url: &str) -> raid_sentinel::Result<HttpResponse> {
        self.requests.lock().unwrap().push(RecordedRequest {
            method: "GET",
            url: url.to_string(),
            body: None,
        });

        if !url.ends_with("/getUpdates") {
            return Ok(HttpResponse {
                status: 404,
                body: r#"{"ok":false,"description":"Not Found"}"#.to_string(),
            });
        }
        let feed = self.feed.lock().unwrap();
        Ok(HttpResponse {
            status: feed.status,
            body: feed.body(),
        })
    }

    async fn post_json(&self, url: &str, body: &Value) -> raid_sentinel::Result<HttpResponse> {
        self.requests.lock().unwrap().push(RecordedRequest {
            method: "POST",
            url: url.to_string(),
            body: Some(body.clone()),
        });

        let chat_id = body["chat_id"].as_str().unwrap_or_default().to_string();
        if self.failing_chats.lock().unwrap().contains(&chat_id) {
            return Err(RaidSentinelError::Http("connection reset by peer".to_string()));
        }
        Ok(HttpResponse {
            status: 200,
            body: r#"{"ok":true,"result":{"message_id":1}}"#.to_string(),
        })
    }
}
