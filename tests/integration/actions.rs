//! Catalog actions through the console actor

use assert_matches::assert_matches;
use hostwatch::api::ActionResult;
use hostwatch::{ConsoleError, TriggerOutcome, View};
use pretty_assertions::assert_eq;

use crate::helpers::*;

#[tokio::test]
async fn test_action_is_observably_running_before_it_resolves() {
    let api = FakeApi::new();
    let gate = api.hold_actions();
    api.set_action_result("restart_nginx", Ok(success("nginx restarted")));

    let console = spawn_console(test_config(), &api);
    console.switch_view(View::Actions).await.unwrap();
    console.select_host("h1").await.unwrap();

    let outcome = console.run_action("restart_nginx").await.unwrap();
    let id = assert_matches!(outcome, TriggerOutcome::Running(id) => id);

    let running = console.state().execution(id).cloned().unwrap();
    assert_eq!(running.phase, "running");
    assert_eq!(running.label, "Executing...");

    // A second trigger while running does nothing
    assert_eq!(
        console.run_action("restart_nginx").await.unwrap(),
        TriggerOutcome::Ignored
    );

    release(&gate);
    let state = wait_for(&console, |state| {
        state
            .execution(id)
            .is_some_and(|execution| execution.phase == "succeeded")
    })
    .await;

    let execution = state.execution(id).unwrap();
    assert_eq!(execution.title, "Restart Nginx");
    assert_eq!(execution.label, "Completed");
    assert_eq!(execution.detail.as_deref(), Some("nginx restarted"));
    assert_eq!(api.count("run_action h1 restart_nginx"), 1);
}

#[tokio::test]
async fn test_failed_action_shows_backend_error() {
    let api = FakeApi::new();
    api.set_action_result(
        "restart_nginx",
        Ok(ActionResult {
            success: false,
            error: Some("permission denied".to_string()),
            ..ActionResult::default()
        }),
    );

    let console = spawn_console(test_config(), &api);
    console.select_host("h1").await.unwrap();

    let id = assert_matches!(
        console.run_action("restart_nginx").await.unwrap(),
        TriggerOutcome::Running(id) => id
    );

    let state = wait_for(&console, |state| {
        state
            .execution(id)
            .is_some_and(|execution| execution.phase == "failed")
    })
    .await;

    let execution = state.execution(id).unwrap();
    assert_eq!(execution.label, "Failed");
    assert_eq!(execution.detail.as_deref(), Some("permission denied"));
}

#[tokio::test]
async fn test_transport_failure_fails_the_execution() {
    let api = FakeApi::new();
    api.set_action_result(
        "restart_nginx",
        Err(ConsoleError::Response {
            status: 500,
            message: "Internal Server Error".to_string(),
        }),
    );

    let console = spawn_console(test_config(), &api);
    console.select_host("h1").await.unwrap();
    let id = assert_matches!(
        console.run_action("restart_nginx").await.unwrap(),
        TriggerOutcome::Running(id) => id
    );

    let state = wait_for(&console, |state| {
        state
            .execution(id)
            .is_some_and(|execution| execution.phase == "failed")
    })
    .await;

    assert_eq!(
        state.execution(id).unwrap().detail.as_deref(),
        Some("HTTP 500: Internal Server Error")
    );
}

#[tokio::test]
async fn test_rerun_replaces_finished_execution() {
    let api = FakeApi::new();
    let console = spawn_console(test_config(), &api);
    console.select_host("h1").await.unwrap();

    let first = assert_matches!(
        console.run_action("restart_nginx").await.unwrap(),
        TriggerOutcome::Running(id) => id
    );
    wait_for(&console, |state| {
        state
            .execution(first)
            .is_some_and(|execution| execution.phase == "succeeded")
    })
    .await;

    let second = assert_matches!(
        console.run_action("restart_nginx").await.unwrap(),
        TriggerOutcome::Running(id) => id
    );

    let state = console.state();
    assert_ne!(first, second);
    assert!(state.execution(first).is_none());
    assert_eq!(state.executions.len(), 1);
}

#[tokio::test]
async fn test_switching_host_discards_pending_execution() {
    let api = FakeApi::new();
    let gate = api.hold_actions();
    let console = spawn_console(test_config(), &api);
    console.switch_view(View::Actions).await.unwrap();
    console.select_host("h1").await.unwrap();

    let id = assert_matches!(
        console.run_action("restart_nginx").await.unwrap(),
        TriggerOutcome::Running(id) => id
    );

    console.select_host("h2").await.unwrap();
    assert!(console.state().executions.is_empty());

    // The late result has nowhere to go
    release(&gate);
    settle().await;

    let state = console.state();
    assert!(state.execution(id).is_none());
    assert!(state.executions.is_empty());
    assert_eq!(api.count("run_action h1"), 1);
}

#[tokio::test]
async fn test_dismiss_in_actions_view_reloads_suggestions() {
    let api = FakeApi::new();
    let console = spawn_console(test_config(), &api);
    console.switch_view(View::Actions).await.unwrap();
    console.select_host("h1").await.unwrap();

    let id = assert_matches!(
        console.run_action("restart_nginx").await.unwrap(),
        TriggerOutcome::Running(id) => id
    );
    wait_for(&console, |state| {
        state
            .execution(id)
            .is_some_and(|execution| execution.phase == "succeeded")
    })
    .await;
    eventually(|| api.count("suggestions h1") == 1).await;

    assert!(console.dismiss_execution(id).await.unwrap());
    assert!(!console.dismiss_execution(id).await.unwrap());

    eventually(|| api.count("suggestions h1") == 2).await;
    assert!(console.state().executions.is_empty());
}

#[tokio::test]
async fn test_run_action_requires_host() {
    let api = FakeApi::new();
    let console = spawn_console(test_config(), &api);

    let err = console.run_action("restart_nginx").await.unwrap_err();

    assert_eq!(
        err.downcast_ref::<ConsoleError>(),
        Some(&ConsoleError::NoHostSelected)
    );
    assert_eq!(api.count("run_action"), 0);
}
