//! BDD step definitions for the full check-and-alert run

use std::sync::Arc;

use cucumber::{then, when};
use raid_sentinel::io::{CommandRunner, HttpClient};
use raid_sentinel::{build_engine, RaidSentinelError, RunOutcome};

use crate::world::RaidSentinelWorld;

#[when("the sentinel runs")]
async fn sentinel_runs(world: &mut RaidSentinelWorld) {
    let http: Arc<dyn HttpClient> = world.http.clone();
    let runner: Arc<dyn CommandRunner> = world.runner.clone();
    let engine = build_engine(&world.config, http, runner);
    world.run_result = Some(engine.run_once().await);
}

#[then("the run should report a healthy array")]
fn run_healthy(world: &mut RaidSentinelWorld) {
    let result = world.run_result.as_ref().expect("no run result");
    assert_eq!(*result.as_ref().unwrap(), RunOutcome::Healthy);
}

#[then(expr = "the run should report an alert delivered to {int} recipient(s)")]
fn run_alerted(world: &mut RaidSentinelWorld, count: usize) {
    let result = world.run_result.as_ref().expect("no run result");
    match result.as_ref().unwrap() {
        RunOutcome::Alerted(reports) => {
            assert_eq!(reports.len(), 1);
            assert_eq!(reports[0].notifier_type, "telegram");
            assert_eq!(reports[0].report.delivered.len(), count);
        }
        other => panic!("expected an alert, got {:?}", other),
    }
}

#[then("the run should fail with an execution error")]
fn run_execution_error(world: &mut RaidSentinelWorld) {
    let result = world.run_result.as_ref().expect("no run result");
    assert!(
        matches!(result, Err(RaidSentinelError::Execution(_))),
        "got {:?}",
        result
    );
}

#[then("the run should fail with a configuration error")]
fn run_config_error(world: &mut RaidSentinelWorld) {
    let result = world.run_result.as_ref().expect("no run result");
    assert!(
        matches!(result, Err(RaidSentinelError::Config(_))),
        "got {:?}",
        result
    );
}
