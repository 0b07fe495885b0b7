//! Console state published to the presentation layer

use chrono::{DateTime, Utc};

use crate::api::{
    Action, DockerOverview, HistorySample, Host, HostId, HostStatus, Process, SuggestionReport,
    UpgradeSuggestion,
};
use crate::execution::ExecutionId;
use crate::projection::{AnalysisView, ExecutionView, RecommendationView, SnapshotView};
use crate::session::View;

/// Answer shown for a chat question whose reply will never be applied
pub const CANCELLED: &str = "Cancelled: host was selected again";

/// Content of a panel that loads on demand
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Panel<T> {
    #[default]
    Empty,
    Loading,
    Ready(T),
    /// Loaded, but nothing usable came back
    Unavailable(String),
    Failed(String),
}

impl<T> Panel<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            Panel::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Panel::Loading)
    }
}

/// A structured advisory reply, ready for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdviceView {
    pub summary: String,
    pub recommendations: Vec<RecommendationView>,
    /// Only present when the backend says an upgrade is needed
    pub upgrade: Option<UpgradeSuggestion>,
}

impl AdviceView {
    /// Execution instances behind this advice's click affordances
    pub fn execution_ids(&self) -> impl Iterator<Item = ExecutionId> + '_ {
        self.recommendations
            .iter()
            .filter_map(|recommendation| recommendation.execution)
    }

    fn forget_execution(&mut self, id: ExecutionId) {
        for recommendation in &mut self.recommendations {
            if recommendation.execution == Some(id) {
                recommendation.execution = None;
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatAnswer {
    Pending,
    Advice(AdviceView),
    Text(String),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEntry {
    pub question: String,
    pub answer: ChatAnswer,
}

/// Everything the presentation layer needs to draw the console
#[derive(Debug, Clone, Default)]
pub struct ConsoleState {
    /// Hosts available for selection
    pub hosts: Vec<Host>,

    /// Selected host
    pub host: Option<HostId>,

    /// Active view
    pub view: View,

    /// Whether selecting a host arms the recurring poll
    pub auto_refresh: bool,

    /// Whether the recurring poll timer is armed
    pub polling: bool,

    /// Reachability of the selected host, from the latest poll
    pub status: HostStatus,

    /// Latest snapshot of the selected host
    pub snapshot: Option<SnapshotView>,

    /// A poll for the selected host is in flight
    pub loading: bool,

    /// Time of the latest applied poll
    pub last_update: Option<DateTime<Utc>>,

    pub processes: Vec<Process>,
    pub docker: Option<DockerOverview>,
    pub history: Vec<HistorySample>,
    pub analysis: Panel<AnalysisView>,
    pub suggestions: Option<SuggestionReport>,

    /// Action catalog (host independent)
    pub catalog: Vec<Action>,

    pub overview_advice: Panel<AdviceView>,
    pub chat: Vec<ChatEntry>,

    /// Live execution instances, oldest first
    pub executions: Vec<ExecutionView>,

    /// Error message (if any)
    pub error_message: Option<String>,
}

impl ConsoleState {
    pub fn execution(&self, id: ExecutionId) -> Option<&ExecutionView> {
        self.executions.iter().find(|execution| execution.id == id)
    }

    /// Display name of the selected host
    pub fn host_name(&self) -> Option<&str> {
        let id = self.host.as_deref()?;
        Some(
            self.hosts
                .iter()
                .find(|host| host.id == id)
                .map(|host| host.name.as_str())
                .unwrap_or(id),
        )
    }

    /// Drop everything that belongs to the previously selected host
    pub(crate) fn reset_for_host(&mut self, host: &str) {
        self.host = Some(host.to_string());
        self.status = HostStatus::Offline;
        self.snapshot = None;
        self.loading = false;
        self.last_update = None;
        self.processes.clear();
        self.docker = None;
        self.history.clear();
        self.analysis = Panel::Empty;
        self.suggestions = None;
        self.overview_advice = Panel::Empty;
        self.chat.clear();
        self.error_message = None;
    }

    /// Resolve surfaces whose requests a re-selection of the same host invalidated
    pub(crate) fn settle_pending(&mut self) {
        if self.analysis.is_loading() {
            self.analysis = Panel::Empty;
        }
        if self.overview_advice.is_loading() {
            self.overview_advice = Panel::Empty;
        }

        for entry in &mut self.chat {
            if entry.answer == ChatAnswer::Pending {
                entry.answer = ChatAnswer::Failed(CANCELLED.to_string());
            }
        }
    }

    /// Remove the click affordance of a dismissed execution
    pub(crate) fn forget_execution(&mut self, id: ExecutionId) {
        if let Panel::Ready(advice) = &mut self.overview_advice {
            advice.forget_execution(id);
        }

        for entry in &mut self.chat {
            if let ChatAnswer::Advice(advice) = &mut entry.answer {
                advice.forget_execution(id);
            }
        }
    }
}
