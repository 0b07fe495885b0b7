//! Selection state
//!
//! Which host is selected and which view is active. Every host selection bumps the
//! generation counter; asynchronous results stamped with an older generation are stale.

use tracing::debug;

use crate::api::{Host, HostId};
use crate::error::{ConsoleError, ConsoleResult};

/// Console views
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum View {
    #[default]
    Overview,
    Processes,
    Docker,
    History,
    Analysis,
    Chat,
    Actions,
}

impl View {
    pub fn title(&self) -> &'static str {
        match self {
            View::Overview => "Overview",
            View::Processes => "Processes",
            View::Docker => "Docker",
            View::History => "History",
            View::Analysis => "Analysis",
            View::Chat => "AI Assistant",
            View::Actions => "Actions",
        }
    }
}

impl std::str::FromStr for View {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "overview" => Ok(View::Overview),
            "processes" => Ok(View::Processes),
            "docker" => Ok(View::Docker),
            "history" => Ok(View::History),
            "analysis" | "analyze" => Ok(View::Analysis),
            "chat" => Ok(View::Chat),
            "actions" => Ok(View::Actions),
            other => Err(format!("unknown view: {other}")),
        }
    }
}

/// Outcome of a host selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub host: HostId,
    pub generation: u64,
    pub previous: Option<HostId>,
}

#[derive(Debug)]
pub struct Session {
    /// Hosts available for selection (empty means "not listed, accept any id")
    hosts: Vec<Host>,
    current: Option<HostId>,
    view: View,
    generation: u64,
}

impl Session {
    pub fn new(hosts: Vec<Host>) -> Self {
        Self {
            hosts,
            current: None,
            view: View::Overview,
            generation: 0,
        }
    }

    pub fn hosts(&self) -> &[Host] {
        &self.hosts
    }

    pub fn host(&self, id: &str) -> Option<&Host> {
        self.hosts.iter().find(|host| host.id == id)
    }

    /// Select `host`, starting a new generation
    ///
    /// Re-selecting the current host also starts a new generation, which invalidates any
    /// in-flight response for it.
    pub fn select(&mut self, host: &str) -> ConsoleResult<Selection> {
        if !self.hosts.is_empty() && self.host(host).is_none() {
            return Err(ConsoleError::UnknownHost(host.to_string()));
        }

        self.generation += 1;
        let previous = self.current.replace(host.to_string());

        debug!(
            "selected {host} (generation {}, previous {previous:?})",
            self.generation
        );

        Ok(Selection {
            host: host.to_string(),
            generation: self.generation,
            previous,
        })
    }

    /// Change the active view, returning whether it changed
    pub fn switch_view(&mut self, view: View) -> bool {
        let changed = self.view != view;
        self.view = view;
        changed
    }

    pub fn current_host(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Selected host, or [`ConsoleError::NoHostSelected`]
    pub fn require_host(&self) -> ConsoleResult<&str> {
        self.current_host().ok_or(ConsoleError::NoHostSelected)
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether a result fetched for `host` at `generation` may still be applied
    pub fn is_current(&self, host: &str, generation: u64) -> bool {
        self.generation == generation && self.current_host() == Some(host)
    }
}
