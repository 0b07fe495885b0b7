//! Helper functions for integration tests

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use hostwatch::api::{
    Action, ActionResult, Advice, Analysis, ChatReply, ConsoleApi, CpuInfo, DockerOverview,
    HistorySample, Host, HostStatus, Process, Recommendation, RiskLevel, Snapshot,
    SuggestionReport, UsageInfo,
};
use hostwatch::{ConsoleConfig, ConsoleError, ConsoleHandle, ConsoleResult, ConsoleState};
use tokio::sync::Semaphore;

/// Console configuration without the recurring poll
pub fn test_config() -> ConsoleConfig {
    ConsoleConfig {
        auto_refresh: false,
        ..ConsoleConfig::default()
    }
}

pub fn polling_config() -> ConsoleConfig {
    ConsoleConfig {
        refresh_interval: 30,
        auto_refresh: true,
        ..ConsoleConfig::default()
    }
}

pub fn hosts() -> Vec<Host> {
    ["h1", "h2"]
        .into_iter()
        .map(|id| Host {
            id: id.to_string(),
            name: format!("Host {id}"),
            address: None,
        })
        .collect()
}

/// Online snapshot whose hostname names the host it belongs to
pub fn online_snapshot(host: &str) -> Snapshot {
    Snapshot {
        status: HostStatus::Online,
        cpu: Some(CpuInfo {
            percent: Some(12.5),
            cores: Some(4),
            load_avg: Some("0.10, 0.20, 0.30".to_string()),
        }),
        memory: Some(UsageInfo {
            used: Some(2.0 * 1_073_741_824.0),
            total: Some(8.0 * 1_073_741_824.0),
            percent: Some(25.0),
        }),
        disk: Some(UsageInfo {
            used: Some(85.0 * 1_073_741_824.0),
            total: Some(100.0 * 1_073_741_824.0),
            percent: Some(85.0),
        }),
        uptime: Some("3 days".to_string()),
        hostname: Some(format!("{host}-host")),
        error: None,
    }
}

pub fn catalog() -> Vec<Action> {
    vec![Action {
        id: "restart_nginx".to_string(),
        name: "Restart Nginx".to_string(),
        description: "Restart the web server".to_string(),
        dangerous: true,
    }]
}

pub fn success(output: &str) -> ActionResult {
    ActionResult {
        success: true,
        output: Some(output.to_string()),
        ..ActionResult::default()
    }
}

/// Advice with a bound, a manual and a purely advisory recommendation
pub fn advice() -> Advice {
    Advice {
        summary: "Disk is almost full".to_string(),
        recommendations: vec![
            Recommendation {
                title: Some("Restart web server".to_string()),
                risk: RiskLevel::Red,
                action_id: Some("restart_nginx".to_string()),
                ..Recommendation::default()
            },
            Recommendation {
                title: Some("Clear apt cache".to_string()),
                risk: RiskLevel::Green,
                action: Some("apt-get clean".to_string()),
                ..Recommendation::default()
            },
            Recommendation {
                title: Some("Consider log rotation".to_string()),
                description: Some("Logs grow without bound".to_string()),
                ..Recommendation::default()
            },
        ],
        upgrade_suggestion: None,
    }
}

/// Scriptable backend that records every call
///
/// Requests can be held at a gate until the test releases them.
#[derive(Default)]
pub struct FakeApi {
    calls: Mutex<Vec<String>>,
    snapshots: Mutex<HashMap<String, ConsoleResult<Snapshot>>>,
    action_results: Mutex<HashMap<String, ConsoleResult<ActionResult>>>,
    reply: Mutex<Option<ConsoleResult<ChatReply>>>,
    metric_gates: Mutex<HashMap<String, Arc<Semaphore>>>,
    action_gate: Mutex<Option<Arc<Semaphore>>>,
    advice_gate: Mutex<Option<Arc<Semaphore>>>,
}

impl FakeApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_snapshot(&self, host: &str, result: ConsoleResult<Snapshot>) {
        self.snapshots
            .lock()
            .unwrap()
            .insert(host.to_string(), result);
    }

    pub fn set_action_result(&self, action_id: &str, result: ConsoleResult<ActionResult>) {
        self.action_results
            .lock()
            .unwrap()
            .insert(action_id.to_string(), result);
    }

    pub fn set_reply(&self, reply: ConsoleResult<ChatReply>) {
        *self.reply.lock().unwrap() = Some(reply);
    }

    /// Hold metric requests for `host` until [`release`] is called on the returned gate
    pub fn hold_metrics(&self, host: &str) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        self.metric_gates
            .lock()
            .unwrap()
            .insert(host.to_string(), gate.clone());
        gate
    }

    /// Hold action runs until [`release`] is called on the returned gate
    pub fn hold_actions(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.action_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    /// Hold analysis and chat requests until [`release`] is called on the returned gate
    pub fn hold_advice(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.advice_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of recorded calls starting with `prefix`
    pub fn count(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

/// Let every held request through, now and later
pub fn release(gate: &Semaphore) {
    gate.close();
}

async fn pass(gate: Option<Arc<Semaphore>>) {
    if let Some(gate) = gate {
        // Fails once the gate is closed, which is the release signal
        let _ = gate.acquire().await;
    }
}

#[async_trait]
impl ConsoleApi for FakeApi {
    async fn hosts(&self) -> ConsoleResult<Vec<Host>> {
        self.record("hosts".to_string());
        Ok(hosts())
    }

    async fn metrics(&self, host: &str) -> ConsoleResult<Snapshot> {
        self.record(format!("metrics {host}"));

        let gate = self.metric_gates.lock().unwrap().get(host).cloned();
        pass(gate).await;

        self.snapshots
            .lock()
            .unwrap()
            .get(host)
            .cloned()
            .unwrap_or_else(|| Ok(online_snapshot(host)))
    }

    async fn processes(&self, host: &str) -> ConsoleResult<Vec<Process>> {
        self.record(format!("processes {host}"));
        Ok(vec![Process {
            user: "root".to_string(),
            pid: "1".to_string(),
            cpu: 0.5,
            mem: 0.1,
            command: format!("init@{host}"),
        }])
    }

    async fn docker(&self, host: &str) -> ConsoleResult<DockerOverview> {
        self.record(format!("docker {host}"));
        Ok(DockerOverview::default())
    }

    async fn history(&self, host: &str, hours: u32) -> ConsoleResult<Vec<HistorySample>> {
        self.record(format!("history {host} {hours}"));
        Ok(Vec::new())
    }

    async fn analyze(&self, host: &str) -> ConsoleResult<Analysis> {
        self.record(format!("analyze {host}"));

        let gate = self.advice_gate.lock().unwrap().clone();
        pass(gate).await;

        Ok(Analysis {
            large_files: Some(format!("/var/log/{host}.log 2G")),
            ..Analysis::default()
        })
    }

    async fn suggestions(&self, host: &str) -> ConsoleResult<SuggestionReport> {
        self.record(format!("suggestions {host}"));
        Ok(SuggestionReport::default())
    }

    async fn actions(&self) -> ConsoleResult<Vec<Action>> {
        self.record("actions".to_string());
        Ok(catalog())
    }

    async fn run_action(&self, host: &str, action_id: &str) -> ConsoleResult<ActionResult> {
        self.record(format!("run_action {host} {action_id}"));

        let gate = self.action_gate.lock().unwrap().clone();
        pass(gate).await;

        self.action_results
            .lock()
            .unwrap()
            .get(action_id)
            .cloned()
            .unwrap_or_else(|| Ok(success("done")))
    }

    async fn ask(&self, host: &str, question: &str) -> ConsoleResult<ChatReply> {
        self.record(format!("ask {host} {question}"));

        let gate = self.advice_gate.lock().unwrap().clone();
        pass(gate).await;

        self.reply
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Err(ConsoleError::Application("no reply scripted".to_string())))
    }
}

pub fn spawn_console(config: ConsoleConfig, api: &Arc<FakeApi>) -> ConsoleHandle {
    ConsoleHandle::spawn(config, api.clone(), hosts())
}

/// Wait for the console state to satisfy `predicate`, failing after two seconds
pub async fn wait_for(
    console: &ConsoleHandle,
    predicate: impl FnMut(&ConsoleState) -> bool,
) -> ConsoleState {
    tokio::time::timeout(Duration::from_secs(2), console.wait_until(predicate))
        .await
        .expect("timed out waiting for console state")
        .unwrap()
}

/// Poll `condition` until it holds, failing after two seconds
pub async fn eventually(mut condition: impl FnMut() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not met in time");
}

/// Give spawned fetches time to complete
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}
