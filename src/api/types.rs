//! Backend response types
//!
//! Every payload coming from the backend is treated as loosely shaped JSON: fields that may be
//! missing are `Option`s or carry a serde default, so that an incomplete response degrades to a
//! placeholder in the projection instead of failing to parse.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

/// Opaque host identifier, as used in the backend's URL paths
pub type HostId = String;

/// Opaque identifier of a backend-registered action
pub type ActionId = String;

// ============================================================================
// Hosts & snapshots
// ============================================================================

/// A monitored host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Host {
    pub id: HostId,
    pub name: String,
    pub address: Option<String>,
}

/// Entry of the `/servers` map, keyed by host id
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct HostEntry {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
}

pub(crate) fn hosts_from_map(map: BTreeMap<HostId, HostEntry>) -> Vec<Host> {
    map.into_iter()
        .map(|(id, entry)| Host {
            name: entry.name.unwrap_or_else(|| id.clone()),
            address: entry.host,
            id,
        })
        .collect()
}

/// Reachability of a host as reported by a snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostStatus {
    Online,
    #[default]
    #[serde(other)]
    Offline,
}

impl HostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HostStatus::Online => "online",
            HostStatus::Offline => "offline",
        }
    }
}

impl std::fmt::Display for HostStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time measurement of a host
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub status: HostStatus,
    #[serde(default)]
    pub cpu: Option<CpuInfo>,
    #[serde(default)]
    pub memory: Option<UsageInfo>,
    #[serde(default)]
    pub disk: Option<UsageInfo>,
    #[serde(default)]
    pub uptime: Option<String>,
    #[serde(default)]
    pub hostname: Option<String>,
    /// Reason reported by the backend for an offline host
    #[serde(default)]
    pub error: Option<String>,
}

impl Snapshot {
    /// Snapshot standing in for a poll that failed before the backend could answer
    pub fn offline(reason: impl Into<String>) -> Self {
        Self {
            status: HostStatus::Offline,
            error: Some(reason.into()),
            ..Self::default()
        }
    }

    pub fn is_online(&self) -> bool {
        self.status == HostStatus::Online
    }

    pub fn cpu_percent(&self) -> Option<f64> {
        self.cpu.as_ref().and_then(|cpu| cpu.percent)
    }

    pub fn memory_percent(&self) -> Option<f64> {
        self.memory.as_ref().and_then(|memory| memory.percent)
    }

    pub fn disk_percent(&self) -> Option<f64> {
        self.disk.as_ref().and_then(|disk| disk.percent)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CpuInfo {
    #[serde(default)]
    pub percent: Option<f64>,
    #[serde(default)]
    pub cores: Option<u32>,
    #[serde(default)]
    pub load_avg: Option<String>,
}

/// Used/total bytes of memory or disk
///
/// Byte counts are kept as `f64` because the backend may emit them in exponent notation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageInfo {
    #[serde(default)]
    pub used: Option<f64>,
    #[serde(default)]
    pub total: Option<f64>,
    #[serde(default)]
    pub percent: Option<f64>,
}

// ============================================================================
// View data
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Process {
    #[serde(default)]
    pub user: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub pid: String,
    #[serde(default)]
    pub cpu: f64,
    #[serde(default)]
    pub mem: f64,
    #[serde(default)]
    pub command: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ProcessList {
    #[serde(default)]
    pub processes: Vec<Process>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DockerOverview {
    #[serde(default)]
    pub running: Option<u32>,
    #[serde(default)]
    pub total: Option<u32>,
    #[serde(default)]
    pub containers: Vec<Container>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Container {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub status: String,
}

/// One history sample, oldest first in a series
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistorySample {
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub cpu: Option<f64>,
    #[serde(default)]
    pub memory: Option<f64>,
    #[serde(default)]
    pub disk: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct HistorySeries {
    #[serde(default)]
    pub history: Vec<HistorySample>,
}

/// Free-text deep analysis of a host
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    #[serde(default)]
    pub disk_by_directory: Option<String>,
    #[serde(default)]
    pub docker_disk: Option<String>,
    #[serde(default)]
    pub large_files: Option<String>,
    #[serde(default)]
    pub memory_processes: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SuggestionReport {
    #[serde(default)]
    pub suggestions: Vec<Suggestion>,
    #[serde(default)]
    pub metrics_summary: Option<MetricsSummary>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, deserialize_with = "skip_nulls")]
    pub action_details: Vec<Action>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    #[serde(default)]
    pub cpu: Option<f64>,
    #[serde(default)]
    pub memory: Option<f64>,
    #[serde(default)]
    pub disk: Option<f64>,
}

// ============================================================================
// Actions
// ============================================================================

/// A backend-registered remote operation
///
/// `dangerous` only changes how the action is presented; it never gates execution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub id: ActionId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub dangerous: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ActionCatalog {
    #[serde(default)]
    pub actions: Vec<Action>,
}

/// Result of `POST /actions/{host}/{action}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    /// Display name of the action, as echoed by the backend
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

// ============================================================================
// Advisory
// ============================================================================

/// Risk attached to a recommendation
///
/// Absent or unrecognized values read as `Yellow`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Green,
    #[default]
    Yellow,
    Red,
}

impl RiskLevel {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "GREEN" => RiskLevel::Green,
            "RED" => RiskLevel::Red,
            _ => RiskLevel::Yellow,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Green => "GREEN",
            RiskLevel::Yellow => "YELLOW",
            RiskLevel::Red => "RED",
        }
    }
}

impl<'de> Deserialize<'de> for RiskLevel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = serde_json::Value::deserialize(deserializer)?;
        Ok(raw.as_str().map(RiskLevel::parse).unwrap_or_default())
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Advisory suggestion, optionally bound to an executable action
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub risk: RiskLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_id: Option<ActionId>,
    /// Free-text shell suggestion with no executable backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub considerations: Option<String>,
}

impl Recommendation {
    /// Bound backend action, if any (an empty id counts as absent)
    pub fn bound_action(&self) -> Option<&str> {
        self.action_id.as_deref().filter(|id| !id.is_empty())
    }

    /// Free-text command, if any (an empty command counts as absent)
    pub fn manual_command(&self) -> Option<&str> {
        self.action.as_deref().filter(|cmd| !cmd.is_empty())
    }

    /// Whether the recommendation offers a click affordance at all
    pub fn is_actionable(&self) -> bool {
        self.bound_action().is_some() || self.manual_command().is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeSuggestion {
    #[serde(default)]
    pub needed: bool,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub current_specs: Option<String>,
    #[serde(default)]
    pub recommended: Option<String>,
}

/// Structured reply of the advisory backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Advice {
    pub summary: String,
    #[serde(default, deserialize_with = "skip_malformed")]
    pub recommendations: Vec<Recommendation>,
    #[serde(default, deserialize_with = "malformed_as_none")]
    pub upgrade_suggestion: Option<UpgradeSuggestion>,
}

/// Reply of `POST /chat/{host}`, in either of its two shapes
#[derive(Debug, Clone, PartialEq)]
pub enum ChatReply {
    Structured(Advice),
    Text(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ChatBody {
    #[serde(default)]
    pub response: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ChatReply {
    /// Interpret a chat body
    ///
    /// A `response` object is structured only when it carries a non-empty `summary`; anything
    /// else falls back to plain text.
    pub(crate) fn from_body(body: ChatBody) -> Self {
        match body.response {
            Some(serde_json::Value::String(text)) if !text.is_empty() => ChatReply::Text(text),
            Some(value @ serde_json::Value::Object(_)) => {
                let has_summary = value
                    .get("summary")
                    .and_then(|summary| summary.as_str())
                    .is_some_and(|summary| !summary.is_empty());

                match serde_json::from_value::<Advice>(value.clone()) {
                    Ok(advice) if has_summary => ChatReply::Structured(advice),
                    _ => ChatReply::Text(body.error.unwrap_or_else(|| value.to_string())),
                }
            }
            _ => ChatReply::Text(body.error.unwrap_or_else(|| "No response".to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub question: &'a str,
}

/// Error envelope used by the backend for non-success answers
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}

// ============================================================================
// Serde helpers
// ============================================================================

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = serde_json::Value::deserialize(deserializer)?;
    Ok(match raw {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

fn skip_nulls<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let entries = Option::<Vec<Option<T>>>::deserialize(deserializer)?;
    Ok(entries.unwrap_or_default().into_iter().flatten().collect())
}

/// Like [`skip_nulls`], but also drops entries that do not parse
fn skip_malformed<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let entries = Option::<Vec<serde_json::Value>>::deserialize(deserializer)?;
    Ok(entries
        .unwrap_or_default()
        .into_iter()
        .filter(|entry| !entry.is_null())
        .filter_map(|entry| match serde_json::from_value(entry) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!("skipping malformed entry: {err}");
                None
            }
        })
        .collect())
}

fn malformed_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| match serde_json::from_value(value) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!("ignoring malformed field: {err}");
            None
        }
    }))
}
