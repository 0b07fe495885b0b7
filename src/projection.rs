//! Rendering projections
//!
//! Pure functions from console data to display-ready strings. Absent values render as
//! [`PLACEHOLDER`], never as an error. Nothing here produces markup.

use serde::Serialize;

use crate::api::{Action, Analysis, Recommendation, RiskLevel, Snapshot, SuggestionReport};
use crate::codec::{self, RecommendationToken};
use crate::execution::{ActionExecution, ExecutionId, ExecutionPhase, ExecutionTarget};

/// Shown for any value the backend did not provide
pub const PLACEHOLDER: &str = "--";

const BYTES_PER_GB: f64 = 1_073_741_824.0;

fn or_placeholder(value: Option<String>) -> String {
    value.unwrap_or_else(|| PLACEHOLDER.to_string())
}

/// Percentage as sent by the backend (`50` stays `50`, `50.5` stays `50.5`)
fn plain_number(value: Option<f64>) -> String {
    or_placeholder(value.map(|v| v.to_string()))
}

/// Bytes as gibibytes with one decimal
pub fn format_gb(bytes: Option<f64>) -> String {
    or_placeholder(bytes.map(|b| format!("{:.1}", b / BYTES_PER_GB)))
}

/// Display form of one snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotView {
    pub status: String,
    pub cpu: String,
    pub cores: String,
    pub load: String,
    pub memory_percent: String,
    pub memory_used: String,
    pub memory_total: String,
    pub disk_percent: String,
    pub disk_used: String,
    pub disk_total: String,
    pub uptime: String,
    pub hostname: String,
}

impl From<&Snapshot> for SnapshotView {
    fn from(snapshot: &Snapshot) -> Self {
        let cpu = snapshot.cpu.clone().unwrap_or_default();
        let memory = snapshot.memory.clone().unwrap_or_default();
        let disk = snapshot.disk.clone().unwrap_or_default();

        Self {
            status: if snapshot.is_online() { "Online" } else { "Offline" }.to_string(),
            cpu: format!(
                "{} %",
                or_placeholder(cpu.percent.map(|p| format!("{p:.1}")))
            ),
            cores: format!("{} cores", or_placeholder(cpu.cores.map(|c| c.to_string()))),
            load: format!("Load: {}", or_placeholder(cpu.load_avg.filter(|l| !l.is_empty()))),
            memory_percent: format!("{} %", plain_number(memory.percent)),
            memory_used: format!("{} GB", format_gb(memory.used)),
            memory_total: format!("of {} GB", format_gb(memory.total)),
            disk_percent: format!("{} %", plain_number(disk.percent)),
            disk_used: format!("{} GB", format_gb(disk.used)),
            disk_total: format!("of {} GB", format_gb(disk.total)),
            uptime: or_placeholder(snapshot.uptime.clone().filter(|u| !u.is_empty())),
            hostname: or_placeholder(snapshot.hostname.clone().filter(|h| !h.is_empty())),
        }
    }
}

/// Colour family of a projected element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Neutral,
    Success,
    Warning,
    Danger,
}

impl From<RiskLevel> for Tone {
    fn from(risk: RiskLevel) -> Self {
        match risk {
            RiskLevel::Green => Tone::Success,
            RiskLevel::Yellow => Tone::Warning,
            RiskLevel::Red => Tone::Danger,
        }
    }
}

/// Display form of one execution instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionView {
    pub id: ExecutionId,
    pub title: String,
    /// Phase name (`idle`, `running`, ...)
    pub phase: String,
    /// Headline for the current phase
    pub label: String,
    pub tone: Tone,
    /// Output, error or command; output and commands are shown verbatim, preformatted
    pub detail: Option<String>,
}

impl ExecutionView {
    pub fn project(execution: &ActionExecution, catalog: &[Action]) -> Self {
        let title = match &execution.target {
            ExecutionTarget::Action(action_id) => catalog
                .iter()
                .find(|action| &action.id == action_id)
                .map(|action| action.name.clone())
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| action_id.clone()),
            ExecutionTarget::Recommendation(token) => recommendation_title(token),
        };

        let (label, tone, detail) = match &execution.phase {
            ExecutionPhase::Idle => ("Ready", Tone::Neutral, None),
            ExecutionPhase::Running => ("Executing...", Tone::Neutral, None),
            ExecutionPhase::Succeeded { output } => (
                "Completed",
                Tone::Success,
                Some(output.clone().unwrap_or_else(|| "Success!".to_string())),
            ),
            ExecutionPhase::Failed { error } => ("Failed", Tone::Danger, Some(error.clone())),
            ExecutionPhase::Manual { command } => (
                "Manual Action Required",
                Tone::Warning,
                Some(command.clone()),
            ),
        };

        Self {
            id: execution.id,
            title,
            phase: execution.phase.name().to_string(),
            label: label.to_string(),
            tone,
            detail,
        }
    }
}

fn recommendation_title(token: &RecommendationToken) -> String {
    codec::decode(token)
        .ok()
        .and_then(|recommendation| recommendation.title)
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| "Recommendation".to_string())
}

/// Display form of one recommendation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecommendationView {
    /// Execution instance behind the click affordance; `None` for purely advisory entries
    pub execution: Option<ExecutionId>,
    /// Transport form of the recommendation
    pub token: Option<RecommendationToken>,
    pub risk: RiskLevel,
    pub tone: Tone,
    pub title: String,
    pub description: String,
    pub considerations: Option<String>,
    /// Free-text command, shown only when no backend action is bound
    pub command: Option<String>,
}

impl RecommendationView {
    pub fn project(
        recommendation: &Recommendation,
        execution: Option<ExecutionId>,
        token: Option<RecommendationToken>,
    ) -> Self {
        let command = match recommendation.bound_action() {
            Some(_) => None,
            None => recommendation.manual_command().map(str::to_string),
        };

        Self {
            execution,
            token,
            risk: recommendation.risk,
            tone: recommendation.risk.into(),
            title: recommendation
                .title
                .clone()
                .filter(|title| !title.is_empty())
                .unwrap_or_else(|| "Recommendation".to_string()),
            description: recommendation.description.clone().unwrap_or_default(),
            considerations: recommendation
                .considerations
                .clone()
                .filter(|text| !text.is_empty()),
            command,
        }
    }

    pub fn is_clickable(&self) -> bool {
        self.execution.is_some()
    }
}

/// Display form of the deep analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisView {
    pub disk_by_directory: String,
    pub docker_disk: String,
    pub large_files: String,
    pub memory_processes: String,
}

impl From<&Analysis> for AnalysisView {
    fn from(analysis: &Analysis) -> Self {
        let section = |text: &Option<String>, fallback: &str| {
            text.clone()
                .filter(|text| !text.is_empty())
                .unwrap_or_else(|| fallback.to_string())
        };

        Self {
            disk_by_directory: section(&analysis.disk_by_directory, "No data"),
            docker_disk: section(&analysis.docker_disk, "No data"),
            large_files: section(&analysis.large_files, "No large files found"),
            memory_processes: section(&analysis.memory_processes, "No data"),
        }
    }
}

/// One-line summary shown when a host has no suggestions
pub fn all_good_summary(report: &SuggestionReport) -> String {
    let summary = report.metrics_summary.clone().unwrap_or_default();
    let percent = |value: Option<f64>| or_placeholder(value.map(|v| format!("{v:.1}")));

    format!(
        "CPU: {}% | Memory: {}% | Disk: {}%",
        percent(summary.cpu),
        percent(summary.memory),
        percent(summary.disk)
    )
}

/// One-line summary of a host's suggestions, falling back to the "All Good" line
pub fn suggestions_summary(report: &SuggestionReport) -> String {
    if report.suggestions.is_empty() {
        return format!("All Good: {}", all_good_summary(report));
    }

    let titles: Vec<&str> = report
        .suggestions
        .iter()
        .map(|suggestion| suggestion.title.as_str())
        .collect();
    format!("{} suggestions: {}", titles.len(), titles.join("; "))
}

/// Question asked to the advisory backend for the overview, based on the current load
pub fn overview_question(snapshot: &Snapshot) -> &'static str {
    let disk = snapshot.disk_percent().unwrap_or(0.0);
    let memory = snapshot.memory_percent().unwrap_or(0.0);
    let cpu = snapshot.cpu_percent().unwrap_or(0.0);

    if disk > 80.0 {
        "My disk is getting full. How can I free up space safely?"
    } else if memory > 80.0 {
        "My memory usage is high. What's using it and how can I optimize it?"
    } else if cpu > 80.0 {
        "My CPU usage is high. What should I do?"
    } else {
        "Analyze my server health and provide any recommendations for optimization."
    }
}
