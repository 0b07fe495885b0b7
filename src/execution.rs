//! Action execution lifecycle
//!
//! Every click on a catalog action or on a recommendation creates an [`ActionExecution`]:
//!
//! ```text
//! Idle ──Start──▶ Running ──Succeed──▶ Succeeded
//!   │                 └─────Fail─────▶ Failed
//!   └──RequireManual──▶ Manual
//! ```
//!
//! [`transition`] is the whole state machine. It only allows a trigger out of `Idle`, so a
//! second click on an instance that is already running is rejected. Terminal states absorb
//! every event; re-running means creating a fresh instance.

use std::collections::BTreeMap;

use tracing::{debug, trace};

use crate::api::{ActionId, ActionResult, HostId, Recommendation};
use crate::codec::{self, RecommendationToken};
use crate::error::ConsoleResult;

/// Identifier of one execution instance
pub type ExecutionId = u64;

/// What an execution runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionTarget {
    /// A catalog action
    Action(ActionId),
    /// A recommendation, kept in token form until it is triggered
    Recommendation(RecommendationToken),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionPhase {
    Idle,
    Running,
    Succeeded { output: Option<String> },
    Failed { error: String },
    /// The recommendation has no backend binding; the operator has to run `command` by hand
    Manual { command: String },
}

impl ExecutionPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ExecutionPhase::Succeeded { .. }
                | ExecutionPhase::Failed { .. }
                | ExecutionPhase::Manual { .. }
        )
    }

    pub fn is_running(&self) -> bool {
        matches!(self, ExecutionPhase::Running)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ExecutionPhase::Idle => "idle",
            ExecutionPhase::Running => "running",
            ExecutionPhase::Succeeded { .. } => "succeeded",
            ExecutionPhase::Failed { .. } => "failed",
            ExecutionPhase::Manual { .. } => "manual",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionEvent {
    Start,
    RequireManual { command: String },
    Succeed { output: Option<String> },
    Fail { error: String },
}

impl ExecutionEvent {
    /// Terminal event for the outcome of an action call
    pub fn from_outcome(outcome: ConsoleResult<ActionResult>) -> Self {
        match outcome {
            Ok(result) if result.success => ExecutionEvent::Succeed {
                output: result.output.filter(|output| !output.is_empty()),
            },
            Ok(result) => ExecutionEvent::Fail {
                error: result
                    .error
                    .filter(|error| !error.is_empty())
                    .unwrap_or_else(|| "Unknown error".to_string()),
            },
            Err(err) => ExecutionEvent::Fail {
                error: err.user_message(),
            },
        }
    }
}

/// Next phase, or `None` when `event` is not allowed in `phase`
pub fn transition(phase: &ExecutionPhase, event: ExecutionEvent) -> Option<ExecutionPhase> {
    match (phase, event) {
        (ExecutionPhase::Idle, ExecutionEvent::Start) => Some(ExecutionPhase::Running),
        (ExecutionPhase::Idle, ExecutionEvent::RequireManual { command }) => {
            Some(ExecutionPhase::Manual { command })
        }
        (ExecutionPhase::Running, ExecutionEvent::Succeed { output }) => {
            Some(ExecutionPhase::Succeeded { output })
        }
        (ExecutionPhase::Running, ExecutionEvent::Fail { error }) => {
            Some(ExecutionPhase::Failed { error })
        }
        _ => None,
    }
}

/// How a recommendation is carried out
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Call the backend action; any co-present free-text command is ignored
    Remote(ActionId),
    /// Show the free-text command, no network call
    Manual(String),
    /// Nothing to execute, no click affordance
    Informational,
}

impl Dispatch {
    pub fn for_recommendation(recommendation: &Recommendation) -> Self {
        if let Some(action_id) = recommendation.bound_action() {
            Dispatch::Remote(action_id.to_string())
        } else if let Some(command) = recommendation.manual_command() {
            Dispatch::Manual(command.to_string())
        } else {
            Dispatch::Informational
        }
    }
}

/// One attempt, from trigger to terminal result
#[derive(Debug, Clone, PartialEq)]
pub struct ActionExecution {
    pub id: ExecutionId,
    pub host: HostId,
    pub target: ExecutionTarget,
    pub phase: ExecutionPhase,
}

impl ActionExecution {
    /// Apply an event, returning whether it was accepted
    fn apply(&mut self, event: ExecutionEvent) -> bool {
        match transition(&self.phase, event) {
            Some(next) => {
                trace!(
                    execution = self.id,
                    "{} -> {}",
                    self.phase.name(),
                    next.name()
                );
                self.phase = next;
                true
            }
            None => false,
        }
    }
}

/// Result of triggering an execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// Now running; the caller issues the action call for this id
    Remote(ActionId),
    /// Landed in the manual terminal state
    Manual,
    /// Not idle, unknown, or not executable; nothing happened
    Ignored,
}

/// Live execution instances, addressable by id
///
/// Instances for different actions are independent: several may be running at once on the
/// same host.
#[derive(Debug, Default)]
pub struct ExecutionBoard {
    next_id: ExecutionId,
    executions: BTreeMap<ExecutionId, ActionExecution>,
}

impl ExecutionBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an idle instance
    pub fn prepare(&mut self, host: &str, target: ExecutionTarget) -> ExecutionId {
        self.next_id += 1;
        let id = self.next_id;

        self.executions.insert(
            id,
            ActionExecution {
                id,
                host: host.to_string(),
                target,
                phase: ExecutionPhase::Idle,
            },
        );

        id
    }

    pub fn get(&self, id: ExecutionId) -> Option<&ActionExecution> {
        self.executions.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActionExecution> {
        self.executions.values()
    }

    pub fn len(&self) -> usize {
        self.executions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.executions.is_empty()
    }

    /// Move an idle instance out of `Idle`
    ///
    /// Recommendation tokens are decoded here; a malformed token is returned as
    /// [`ConsoleError::Decode`](crate::error::ConsoleError::Decode) and leaves the instance idle.
    pub fn trigger(&mut self, id: ExecutionId) -> ConsoleResult<Trigger> {
        let Some(execution) = self.executions.get_mut(&id) else {
            debug!(execution = id, "trigger for unknown execution ignored");
            return Ok(Trigger::Ignored);
        };

        if execution.phase != ExecutionPhase::Idle {
            debug!(
                execution = id,
                "trigger ignored while {}",
                execution.phase.name()
            );
            return Ok(Trigger::Ignored);
        }

        let dispatch = match &execution.target {
            ExecutionTarget::Action(action_id) => Dispatch::Remote(action_id.clone()),
            ExecutionTarget::Recommendation(token) => {
                Dispatch::for_recommendation(&codec::decode(token)?)
            }
        };

        Ok(match dispatch {
            Dispatch::Remote(action_id) => {
                execution.apply(ExecutionEvent::Start);
                Trigger::Remote(action_id)
            }
            Dispatch::Manual(command) => {
                execution.apply(ExecutionEvent::RequireManual { command });
                Trigger::Manual
            }
            Dispatch::Informational => Trigger::Ignored,
        })
    }

    /// Apply a terminal event to a running instance
    ///
    /// Returns `false` when the instance is gone (dismissed or discarded) or not running.
    pub fn resolve(&mut self, id: ExecutionId, event: ExecutionEvent) -> bool {
        match self.executions.get_mut(&id) {
            Some(execution) => execution.apply(event),
            None => false,
        }
    }

    pub fn dismiss(&mut self, id: ExecutionId) -> Option<ActionExecution> {
        self.executions.remove(&id)
    }

    /// Drop every instance tied to `host`
    pub fn discard_host(&mut self, host: &str) -> usize {
        let before = self.executions.len();
        self.executions.retain(|_, execution| execution.host != host);
        before - self.executions.len()
    }

    /// Latest instance of a catalog action on `host`
    pub fn latest_for_action(&self, host: &str, action_id: &str) -> Option<&ActionExecution> {
        self.executions.values().rev().find(|execution| {
            execution.host == host
                && matches!(&execution.target, ExecutionTarget::Action(id) if id == action_id)
        })
    }
}
