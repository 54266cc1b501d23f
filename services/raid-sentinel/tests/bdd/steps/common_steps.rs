//! Steps shared by several features

use cucumber::{given, then};
use raid_sentinel::config::RecipientMode;

use crate::fakes::CommandBehaviour;
use crate::world::RaidSentinelWorld;

/// Split a comma separated list from a feature file
pub fn parse_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[given("a bot token is configured")]
fn bot_token_configured(world: &mut RaidSentinelWorld) {
    world.config.telegram.bot_token = Some("123456:test-token".to_string());
}

#[given("no bot token is configured")]
fn no_bot_token(world: &mut RaidSentinelWorld) {
    world.config.telegram.bot_token = None;
}

#[given(expr = "static recipients {string}")]
fn static_recipients(world: &mut RaidSentinelWorld, ids: String) {
    world.config.telegram.recipients.mode = RecipientMode::Static;
    world.config.telegram.recipients.chat_ids = parse_list(&ids);
}

#[given(expr = "the update feed contains messages from chats {string}")]
fn feed_contains_chats(world: &mut RaidSentinelWorld, ids: String) {
    for id in parse_list(&ids) {
        let id: i64 = id.parse().expect("chat ids in features are integers");
        world.http.add_chat(id);
    }
}

#[given(expr = "the status command prints {string}")]
fn status_command_prints(world: &mut RaidSentinelWorld, output: String) {
    *world.runner.behaviour.lock().unwrap() = CommandBehaviour::Prints(output);
}

#[given(expr = "the status command exits with code {int}")]
fn status_command_exits(world: &mut RaidSentinelWorld, code: i32) {
    *world.runner.behaviour.lock().unwrap() = CommandBehaviour::Exits(code);
}

#[given("the status command cannot be started")]
fn status_command_cannot_start(world: &mut RaidSentinelWorld) {
    *world.runner.behaviour.lock().unwrap() = CommandBehaviour::CannotStart;
}

#[given("failure matching is case-insensitive")]
fn case_insensitive(world: &mut RaidSentinelWorld) {
    world.config.status.case_sensitive = false;
}

#[then("no HTTP request should have been made")]
fn no_http_request(world: &mut RaidSentinelWorld) {
    let requests = world.http.requests();
    assert!(requests.is_empty(), "unexpected requests: {:?}", requests);
}

#[then(expr = "{int} message(s) should have been posted")]
fn messages_posted(world: &mut RaidSentinelWorld, count: usize) {
    assert_eq!(world.http.posted_bodies().len(), count);
}

#[then(expr = "every posted text should start with {string}")]
fn posted_text_starts_with(world: &mut RaidSentinelWorld, prefix: String) {
    let bodies = world.http.posted_bodies();
    assert!(!bodies.is_empty(), "nothing was posted");
    for body in bodies {
        let text = body["text"].as_str().expect("text is a string");
        assert!(text.starts_with(&prefix), "text was {:?}", text);
    }
}
