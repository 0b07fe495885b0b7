//! Message types for the console actor
//!
//! Commands come from a [`ConsoleHandle`](super::ConsoleHandle) and always carry a reply
//! channel, answered once the command has been applied to the state. Events are posted by the
//! actor's own background fetches when they complete.

use tokio::sync::oneshot;

use crate::api::{
    Action, ActionResult, Analysis, ChatReply, DockerOverview, HistorySample, HostId, Process,
    Snapshot, SuggestionReport,
};
use crate::error::ConsoleResult;
use crate::execution::ExecutionId;
use crate::session::View;

/// Outcome of a trigger request, as seen by the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// The execution is running; its result arrives later
    Running(ExecutionId),
    /// The recommendation was not bound to an action and is now in the manual state
    Manual(ExecutionId),
    /// Nothing happened (already running, unknown instance, or not executable)
    Ignored,
}

/// Commands that can be sent to the console actor
#[derive(Debug)]
pub enum ConsoleCommand {
    /// Select a host: cancel polling, fetch once, re-arm
    SelectHost {
        host: HostId,
        respond_to: oneshot::Sender<ConsoleResult<()>>,
    },

    /// Switch the active view, loading its data on entry
    SwitchView {
        view: View,
        respond_to: oneshot::Sender<()>,
    },

    /// Enable or disable the recurring poll without fetching
    SetAutoRefresh {
        enabled: bool,
        respond_to: oneshot::Sender<()>,
    },

    /// Fetch the current host once, leaving the timer alone
    Refresh {
        respond_to: oneshot::Sender<ConsoleResult<()>>,
    },

    /// Cancel the recurring poll
    Stop { respond_to: oneshot::Sender<()> },

    /// Run a catalog action on the current host
    RunAction {
        action_id: String,
        respond_to: oneshot::Sender<ConsoleResult<TriggerOutcome>>,
    },

    /// Trigger a presented recommendation
    TriggerRecommendation {
        execution: ExecutionId,
        respond_to: oneshot::Sender<ConsoleResult<TriggerOutcome>>,
    },

    /// Remove an execution from the board (its surface was closed)
    DismissExecution {
        execution: ExecutionId,
        respond_to: oneshot::Sender<bool>,
    },

    /// Ask the advisory backend a question about the current host
    Ask {
        question: String,
        respond_to: oneshot::Sender<ConsoleResult<()>>,
    },

    /// Regenerate the overview advice
    RefreshAdvice {
        respond_to: oneshot::Sender<ConsoleResult<()>>,
    },

    /// Run the deep analysis of the current host
    Analyze {
        respond_to: oneshot::Sender<ConsoleResult<()>>,
    },

    /// Reload the current host's suggestions
    LoadSuggestions {
        respond_to: oneshot::Sender<ConsoleResult<()>>,
    },

    /// Clear the displayed error message
    ClearError,

    /// Stop polling and exit the actor
    Shutdown,
}

/// Data loaded for a view
#[derive(Debug, Clone)]
pub enum ViewData {
    Processes(Vec<Process>),
    Docker(DockerOverview),
    History(Vec<HistorySample>),
    Analysis(Analysis),
    Suggestions(SuggestionReport),
}

/// Kind of view data, known before the fetch completes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataKind {
    Processes,
    Docker,
    History,
    Analysis,
    Suggestions,
}

impl DataKind {
    pub fn label(&self) -> &'static str {
        match self {
            DataKind::Processes => "processes",
            DataKind::Docker => "Docker info",
            DataKind::History => "history",
            DataKind::Analysis => "analysis",
            DataKind::Suggestions => "suggestions",
        }
    }
}

/// Where an advisory reply is displayed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdviceTarget {
    Overview,
    /// Index of the chat entry awaiting the reply
    Chat(usize),
}

/// Completions posted by background fetches
#[derive(Debug)]
pub enum ConsoleEvent {
    Snapshot {
        host: HostId,
        generation: u64,
        result: ConsoleResult<Snapshot>,
    },

    ViewData {
        host: HostId,
        generation: u64,
        kind: DataKind,
        result: ConsoleResult<ViewData>,
    },

    /// The catalog is host independent, so it is not generation checked
    Catalog { result: ConsoleResult<Vec<Action>> },

    ActionFinished {
        execution: ExecutionId,
        result: ConsoleResult<ActionResult>,
    },

    Advice {
        host: HostId,
        generation: u64,
        target: AdviceTarget,
        result: ConsoleResult<ChatReply>,
    },
}
