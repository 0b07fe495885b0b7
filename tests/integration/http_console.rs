//! End-to-end scenarios: console actor over the HTTP client against a mock backend

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use hostwatch::api::HostStatus;
use hostwatch::{ConsoleConfig, ConsoleHandle, HttpApiClient, TriggerOutcome, View};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::helpers::*;

fn metrics_json(hostname: &str) -> serde_json::Value {
    json!({
        "status": "online",
        "cpu": {"percent": 42.3, "cores": 8, "load_avg": null},
        "memory": {"used": 4e9, "total": 8e9, "percent": 50},
        "disk": {"used": 1.2e11, "total": 2.4e11, "percent": 50},
        "uptime": "up 3 days",
        "hostname": hostname
    })
}

fn spawn_http_console(server: &MockServer) -> ConsoleHandle {
    let config = ConsoleConfig {
        api_url: server.uri(),
        ..test_config()
    };
    let client = HttpApiClient::new(&config).unwrap();
    ConsoleHandle::spawn(config, Arc::new(client), hosts())
}

async fn mount_metrics(server: &MockServer, host: &str, delay: Duration) {
    Mock::given(method("GET"))
        .and(path(format!("/api/metrics/{host}")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(metrics_json(&format!("{host}.example")))
                .set_delay(delay),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_snapshot_is_projected_for_display() {
    let mock_server = MockServer::start().await;
    mount_metrics(&mock_server, "h1", Duration::ZERO).await;

    let console = spawn_http_console(&mock_server);
    console.switch_view(View::Chat).await.unwrap();
    console.select_host("h1").await.unwrap();

    let state = wait_for(&console, |state| state.snapshot.is_some()).await;
    let snapshot = state.snapshot.unwrap();

    assert_eq!(state.status, HostStatus::Online);
    assert_eq!(snapshot.status, "Online");
    assert_eq!(snapshot.cpu, "42.3 %");
    assert_eq!(snapshot.cores, "8 cores");
    assert_eq!(snapshot.load, "Load: --");
    assert_eq!(snapshot.memory_percent, "50 %");
    assert_eq!(snapshot.memory_used, "3.7 GB");
    assert_eq!(snapshot.memory_total, "of 7.5 GB");
    assert_eq!(snapshot.hostname, "h1.example");
}

#[tokio::test]
async fn test_slow_response_for_previous_host_is_ignored() {
    let mock_server = MockServer::start().await;
    mount_metrics(&mock_server, "h1", Duration::from_millis(500)).await;
    mount_metrics(&mock_server, "h2", Duration::ZERO).await;

    let console = spawn_http_console(&mock_server);
    console.switch_view(View::Chat).await.unwrap();

    console.select_host("h1").await.unwrap();
    console.select_host("h2").await.unwrap();
    wait_for(&console, |state| state.snapshot.is_some()).await;

    // Let the h1 response land
    tokio::time::sleep(Duration::from_millis(800)).await;

    let state = console.state();
    assert_eq!(state.host.as_deref(), Some("h2"));
    assert_eq!(state.snapshot.unwrap().hostname, "h2.example");
}

#[tokio::test]
async fn test_failed_action_reports_backend_error_once() {
    let mock_server = MockServer::start().await;
    mount_metrics(&mock_server, "h1", Duration::ZERO).await;

    Mock::given(method("POST"))
        .and(path("/api/actions/h1/restart-nginx"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "error": "permission denied"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let console = spawn_http_console(&mock_server);
    console.switch_view(View::Chat).await.unwrap();
    console.select_host("h1").await.unwrap();

    let id = assert_matches!(
        console.run_action("restart-nginx").await.unwrap(),
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
async fn test_unreachable_backend_shows_offline_placeholders() {
    let config = ConsoleConfig {
        api_url: "http://127.0.0.1:9".to_string(),
        ..test_config()
    };
    let client = HttpApiClient::new(&config).unwrap();
    let console = ConsoleHandle::spawn(config, Arc::new(client), hosts());
    console.switch_view(View::Chat).await.unwrap();

    console.select_host("h1").await.unwrap();
    let state = wait_for(&console, |state| state.snapshot.is_some()).await;

    let snapshot = state.snapshot.as_ref().unwrap();
    assert_eq!(state.status, HostStatus::Offline);
    assert_eq!(snapshot.status, "Offline");
    assert_eq!(snapshot.memory_used, "-- GB");
    assert!(state.error_message.is_some());

    console.clear_error().await.unwrap();
    wait_for(&console, |state| state.error_message.is_none()).await;
}
