//! ConsoleActor - Owns the selection, the poll timer and the execution board
//!
//! Every mutation of console state happens inside this actor, one message at a time. Network
//! calls never block the loop: they run as spawned tasks and post a [`ConsoleEvent`] back when
//! they complete. Results that belong to an older selection are dropped on arrival.
//!
//! ## Message Flow
//!
//! ```text
//! ConsoleHandle ──ConsoleCommand──┐
//! PollScheduler ──PollTick────────┼──▶ ConsoleActor ──watch──▶ ConsoleState
//! fetch tasks ────ConsoleEvent────┘         │
//!      ▲                                    │
//!      └──────────── spawn ─────────────────┘
//! ```

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, error, instrument, trace, warn};

use crate::api::{Advice, ChatReply, ConsoleApi, Host, HostStatus, Snapshot};
use crate::codec;
use crate::config::ConsoleConfig;
use crate::error::ConsoleResult;
use crate::execution::{ExecutionBoard, ExecutionEvent, ExecutionId, ExecutionTarget, Trigger};
use crate::projection::{
    AnalysisView, ExecutionView, RecommendationView, SnapshotView, overview_question,
};
use crate::scheduler::{PollScheduler, PollTick};
use crate::session::{Session, View};

use super::messages::{
    AdviceTarget, ConsoleCommand, ConsoleEvent, DataKind, TriggerOutcome, ViewData,
};
use super::state::{AdviceView, ChatAnswer, ChatEntry, ConsoleState, Panel};

/// Shown when the overview question gets a plain-text answer
const ADVICE_UNAVAILABLE: &str =
    "Unable to generate recommendations. Please try the AI Assistant chat for detailed analysis.";

pub struct ConsoleActor {
    config: ConsoleConfig,

    /// Backend access, shared with the fetch tasks
    api: Arc<dyn ConsoleApi>,

    session: Session,
    scheduler: PollScheduler,
    board: ExecutionBoard,

    /// Working copy of the published state
    state: ConsoleState,

    command_rx: mpsc::Receiver<ConsoleCommand>,
    tick_rx: mpsc::UnboundedReceiver<PollTick>,

    /// Completions of spawned fetches
    event_tx: mpsc::UnboundedSender<ConsoleEvent>,
    event_rx: mpsc::UnboundedReceiver<ConsoleEvent>,

    state_tx: watch::Sender<ConsoleState>,
}

impl ConsoleActor {
    pub fn new(
        config: ConsoleConfig,
        api: Arc<dyn ConsoleApi>,
        hosts: Vec<Host>,
        command_rx: mpsc::Receiver<ConsoleCommand>,
        state_tx: watch::Sender<ConsoleState>,
    ) -> Self {
        let (tick_tx, tick_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let scheduler = PollScheduler::new(config.refresh_period(), config.auto_refresh, tick_tx);

        let state = ConsoleState {
            hosts: hosts.clone(),
            auto_refresh: config.auto_refresh,
            ..Default::default()
        };

        Self {
            config,
            api,
            session: Session::new(hosts),
            scheduler,
            board: ExecutionBoard::new(),
            state,
            command_rx,
            tick_rx,
            event_tx,
            event_rx,
            state_tx,
        }
    }

    /// Run the actor's main loop
    ///
    /// Runs until a Shutdown command is received or every handle is dropped.
    #[instrument(skip(self))]
    pub async fn run(mut self) {
        debug!("starting console actor");
        self.publish();

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(ConsoleCommand::Shutdown) => {
                            debug!("received shutdown command");
                            break;
                        }
                        Some(cmd) => self.handle_command(cmd),
                        None => {
                            debug!("command channel closed, shutting down");
                            break;
                        }
                    }
                }

                Some(tick) = self.tick_rx.recv() => {
                    self.handle_tick(tick);
                    self.publish();
                }

                Some(event) = self.event_rx.recv() => {
                    self.handle_event(event);
                    self.publish();
                }
            }
        }

        self.scheduler.stop();
        self.state.polling = false;
        self.publish();

        debug!("console actor stopped");
    }

    /// Apply a command, publish, then answer
    ///
    /// Publishing first means a caller that awaited the reply always observes the new state.
    fn handle_command(&mut self, cmd: ConsoleCommand) {
        match cmd {
            ConsoleCommand::SelectHost { host, respond_to } => {
                let result = self.select_host(&host);
                self.reply(respond_to, result);
            }

            ConsoleCommand::SwitchView { view, respond_to } => {
                self.switch_view(view);
                self.reply(respond_to, ());
            }

            ConsoleCommand::SetAutoRefresh {
                enabled,
                respond_to,
            } => {
                debug!("auto-refresh set to {enabled}");
                let current = self
                    .session
                    .current_host()
                    .map(|host| (host, self.session.generation()));
                self.scheduler.set_auto_refresh(enabled, current);
                self.state.auto_refresh = enabled;
                self.reply(respond_to, ());
            }

            ConsoleCommand::Refresh { respond_to } => {
                let result = self.refresh();
                self.reply(respond_to, result);
            }

            ConsoleCommand::Stop { respond_to } => {
                self.scheduler.stop();
                self.reply(respond_to, ());
            }

            ConsoleCommand::RunAction {
                action_id,
                respond_to,
            } => {
                let result = self.run_action(action_id);
                self.reply(respond_to, result);
            }

            ConsoleCommand::TriggerRecommendation {
                execution,
                respond_to,
            } => {
                let result = self.trigger(execution);
                self.reply(respond_to, result);
            }

            ConsoleCommand::DismissExecution {
                execution,
                respond_to,
            } => {
                let dismissed = self.dismiss(execution);
                self.reply(respond_to, dismissed);
            }

            ConsoleCommand::Ask {
                question,
                respond_to,
            } => {
                let result = self.ask(&question);
                self.reply(respond_to, result);
            }

            ConsoleCommand::RefreshAdvice { respond_to } => {
                let result = self.request_overview_advice();
                self.reply(respond_to, result);
            }

            ConsoleCommand::Analyze { respond_to } => {
                let result = self.analyze();
                self.reply(respond_to, result);
            }

            ConsoleCommand::LoadSuggestions { respond_to } => {
                let result = self.load_suggestions();
                self.reply(respond_to, result);
            }

            ConsoleCommand::ClearError => {
                self.state.error_message = None;
                self.publish();
            }

            // Handled by the run loop
            ConsoleCommand::Shutdown => {}
        }
    }

    fn reply<T>(&mut self, respond_to: oneshot::Sender<T>, value: T) {
        self.publish();
        let _ = respond_to.send(value);
    }

    fn publish(&mut self) {
        self.state.polling = self.scheduler.is_armed();
        self.state.executions = self
            .board
            .iter()
            .map(|execution| ExecutionView::project(execution, &self.state.catalog))
            .collect();

        self.state_tx.send_replace(self.state.clone());
    }

    /// Cancel polling, fetch the new host once, then re-arm the timer for it
    fn select_host(&mut self, host: &str) -> ConsoleResult<()> {
        let selection = self.session.select(host)?;

        if let Some(previous) = selection.previous.as_deref()
            && previous != selection.host
        {
            let discarded = self.board.discard_host(previous);
            if discarded > 0 {
                debug!("discarded {discarded} executions of {previous}");
            }
        }

        if selection.previous.as_deref() != Some(host) {
            self.state.reset_for_host(host);
        } else {
            // In-flight results now carry a stale generation
            self.state.settle_pending();
        }

        self.scheduler.stop();
        self.spawn_snapshot_fetch(&selection.host, selection.generation);
        self.scheduler.arm(&selection.host, selection.generation);

        self.load_view(self.session.view());

        Ok(())
    }

    fn switch_view(&mut self, view: View) {
        if self.session.switch_view(view) {
            debug!("switched to {}", view.title());
        }
        self.state.view = view;
        self.load_view(view);
    }

    /// Load the data a view shows on entry
    fn load_view(&mut self, view: View) {
        let Some(host) = self.session.current_host().map(str::to_string) else {
            if view == View::Actions {
                self.spawn_catalog_fetch();
            }
            return;
        };
        let generation = self.session.generation();

        match view {
            View::Overview => {
                if let Err(err) = self.request_overview_advice() {
                    warn!("could not request advice for {host}: {err}");
                }
            }
            View::Processes => self.spawn_view_fetch(&host, generation, DataKind::Processes),
            View::Docker => self.spawn_view_fetch(&host, generation, DataKind::Docker),
            View::History => self.spawn_view_fetch(&host, generation, DataKind::History),
            View::Actions => {
                self.spawn_catalog_fetch();
                self.spawn_view_fetch(&host, generation, DataKind::Suggestions);
            }
            // Both run on explicit request only
            View::Analysis | View::Chat => {}
        }
    }

    fn refresh(&mut self) -> ConsoleResult<()> {
        let host = self.session.require_host()?.to_string();
        self.spawn_snapshot_fetch(&host, self.session.generation());
        Ok(())
    }

    fn handle_tick(&mut self, tick: PollTick) {
        if !self.scheduler.accepts(&tick) || !self.session.is_current(&tick.host, tick.generation)
        {
            trace!(
                "dropping tick for {} (generation {})",
                tick.host, tick.generation
            );
            return;
        }

        self.spawn_snapshot_fetch(&tick.host, tick.generation);
    }

    fn run_action(&mut self, action_id: String) -> ConsoleResult<TriggerOutcome> {
        let host = self.session.require_host()?.to_string();

        if let Some(existing) = self.board.latest_for_action(&host, &action_id) {
            if existing.phase.is_running() {
                debug!("{action_id} is already running on {host}");
                return Ok(TriggerOutcome::Ignored);
            }

            // A new run replaces the previous result surface
            let previous = existing.id;
            self.board.dismiss(previous);
        }

        let id = self
            .board
            .prepare(&host, ExecutionTarget::Action(action_id));
        self.trigger(id)
    }

    fn trigger(&mut self, id: ExecutionId) -> ConsoleResult<TriggerOutcome> {
        match self.board.trigger(id) {
            Ok(Trigger::Remote(action_id)) => {
                let Some(host) = self.board.get(id).map(|execution| execution.host.clone()) else {
                    return Ok(TriggerOutcome::Ignored);
                };
                self.spawn_action(id, host, action_id);
                Ok(TriggerOutcome::Running(id))
            }
            Ok(Trigger::Manual) => Ok(TriggerOutcome::Manual(id)),
            Ok(Trigger::Ignored) => {
                trace!("trigger of execution {id} ignored");
                Ok(TriggerOutcome::Ignored)
            }
            Err(err) => {
                warn!("ignoring trigger of execution {id}: {err}");
                self.state.error_message = Some(format!("Could not run recommendation: {err}"));
                Err(err)
            }
        }
    }

    fn dismiss(&mut self, id: ExecutionId) -> bool {
        let Some(execution) = self.board.dismiss(id) else {
            return false;
        };

        self.state.forget_execution(id);

        // Closing an action result in the Actions view reloads the suggestions
        if matches!(execution.target, ExecutionTarget::Action(_))
            && self.session.view() == View::Actions
            && self.session.is_current(&execution.host, self.session.generation())
        {
            if let Err(err) = self.load_suggestions() {
                warn!("could not reload suggestions: {err}");
            }
        }

        true
    }

    fn ask(&mut self, question: &str) -> ConsoleResult<()> {
        let question = question.trim();
        if question.is_empty() {
            return Ok(());
        }

        let host = self.session.require_host()?.to_string();

        self.state.chat.push(ChatEntry {
            question: question.to_string(),
            answer: ChatAnswer::Pending,
        });
        let target = AdviceTarget::Chat(self.state.chat.len() - 1);

        let api = self.api.clone();
        let tx = self.event_tx.clone();
        let generation = self.session.generation();
        let question = question.to_string();

        tokio::spawn(async move {
            let result = api.ask(&host, &question).await;
            let _ = tx.send(ConsoleEvent::Advice {
                host,
                generation,
                target,
                result,
            });
        });

        Ok(())
    }

    /// Fetch fresh metrics, then ask the question those metrics call for
    fn request_overview_advice(&mut self) -> ConsoleResult<()> {
        let host = self.session.require_host()?.to_string();

        self.replace_overview_advice(Panel::Loading);

        let api = self.api.clone();
        let tx = self.event_tx.clone();
        let generation = self.session.generation();

        tokio::spawn(async move {
            let result = match api.metrics(&host).await {
                Ok(snapshot) => api.ask(&host, overview_question(&snapshot)).await,
                Err(err) => Err(err),
            };
            let _ = tx.send(ConsoleEvent::Advice {
                host,
                generation,
                target: AdviceTarget::Overview,
                result,
            });
        });

        Ok(())
    }

    /// Replace the overview advice, discarding the executions of the previous one
    fn replace_overview_advice(&mut self, advice: Panel<AdviceView>) {
        let previous = std::mem::replace(&mut self.state.overview_advice, advice);

        if let Panel::Ready(previous) = previous {
            for id in previous.execution_ids() {
                self.board.dismiss(id);
            }
        }
    }

    fn analyze(&mut self) -> ConsoleResult<()> {
        let host = self.session.require_host()?.to_string();
        self.state.analysis = Panel::Loading;
        self.spawn_view_fetch(&host, self.session.generation(), DataKind::Analysis);
        Ok(())
    }

    fn load_suggestions(&mut self) -> ConsoleResult<()> {
        let host = self.session.require_host()?.to_string();
        self.spawn_catalog_fetch();
        self.spawn_view_fetch(&host, self.session.generation(), DataKind::Suggestions);
        Ok(())
    }

    fn spawn_snapshot_fetch(&mut self, host: &str, generation: u64) {
        self.state.loading = true;

        let api = self.api.clone();
        let tx = self.event_tx.clone();
        let host = host.to_string();

        tokio::spawn(async move {
            let result = api.metrics(&host).await;
            let _ = tx.send(ConsoleEvent::Snapshot {
                host,
                generation,
                result,
            });
        });
    }

    fn spawn_view_fetch(&self, host: &str, generation: u64, kind: DataKind) {
        let api = self.api.clone();
        let tx = self.event_tx.clone();
        let host = host.to_string();
        let hours = self.config.history_hours;

        tokio::spawn(async move {
            let result = match kind {
                DataKind::Processes => api.processes(&host).await.map(ViewData::Processes),
                DataKind::Docker => api.docker(&host).await.map(ViewData::Docker),
                DataKind::History => api.history(&host, hours).await.map(ViewData::History),
                DataKind::Analysis => api.analyze(&host).await.map(ViewData::Analysis),
                DataKind::Suggestions => api.suggestions(&host).await.map(ViewData::Suggestions),
            };
            let _ = tx.send(ConsoleEvent::ViewData {
                host,
                generation,
                kind,
                result,
            });
        });
    }

    fn spawn_catalog_fetch(&self) {
        let api = self.api.clone();
        let tx = self.event_tx.clone();

        tokio::spawn(async move {
            let result = api.actions().await;
            let _ = tx.send(ConsoleEvent::Catalog { result });
        });
    }

    fn spawn_action(&self, id: ExecutionId, host: String, action_id: String) {
        let api = self.api.clone();
        let tx = self.event_tx.clone();

        tokio::spawn(async move {
            let result = api.run_action(&host, &action_id).await;
            let _ = tx.send(ConsoleEvent::ActionFinished {
                execution: id,
                result,
            });
        });
    }

    fn handle_event(&mut self, event: ConsoleEvent) {
        match event {
            ConsoleEvent::Snapshot {
                host,
                generation,
                result,
            } => {
                if !self.session.is_current(&host, generation) {
                    warn!("discarding stale snapshot of {host} (generation {generation})");
                    return;
                }
                self.apply_snapshot(&host, result);
            }

            ConsoleEvent::ViewData {
                host,
                generation,
                kind,
                result,
            } => {
                if !self.session.is_current(&host, generation) {
                    warn!(
                        "discarding stale {} of {host} (generation {generation})",
                        kind.label()
                    );
                    return;
                }
                self.apply_view_data(kind, result);
            }

            ConsoleEvent::Catalog { result } => match result {
                Ok(actions) => self.state.catalog = actions,
                Err(err) => {
                    error!("failed to load actions: {err}");
                    self.state.error_message = Some(format!("Failed to load actions: {err}"));
                }
            },

            ConsoleEvent::ActionFinished { execution, result } => {
                let event = ExecutionEvent::from_outcome(result);
                if !self.board.resolve(execution, event) {
                    debug!("dropping result of discarded execution {execution}");
                }
            }

            ConsoleEvent::Advice {
                host,
                generation,
                target,
                result,
            } => {
                if !self.session.is_current(&host, generation) {
                    warn!("discarding stale advice for {host} (generation {generation})");
                    return;
                }
                self.apply_advice(&host, target, result);
            }
        }
    }

    fn apply_snapshot(&mut self, host: &str, result: ConsoleResult<Snapshot>) {
        self.state.loading = false;

        let snapshot = match result {
            Ok(snapshot) => {
                self.state.last_update = Some(Utc::now());
                if snapshot.is_online() {
                    self.state.error_message = None;
                }
                snapshot
            }
            Err(err) => {
                error!("failed to load metrics of {host}: {err}");
                self.state.error_message = Some(format!("Failed to load metrics: {err}"));
                Snapshot::offline(err.to_string())
            }
        };

        self.state.status = snapshot.status;
        self.state.snapshot = Some(SnapshotView::from(&snapshot));

        if snapshot.status == HostStatus::Online
            && self.config.advise_on_refresh
            && self.session.view() == View::Overview
            && !self.state.overview_advice.is_loading()
            && let Err(err) = self.request_overview_advice()
        {
            warn!("could not request advice for {host}: {err}");
        }
    }

    fn apply_view_data(&mut self, kind: DataKind, result: ConsoleResult<ViewData>) {
        match result {
            Ok(ViewData::Processes(processes)) => self.state.processes = processes,
            Ok(ViewData::Docker(docker)) => self.state.docker = Some(docker),
            Ok(ViewData::History(history)) => self.state.history = history,
            Ok(ViewData::Analysis(analysis)) => {
                self.state.analysis = match &analysis.error {
                    Some(err) if !err.is_empty() => Panel::Failed(err.clone()),
                    _ => Panel::Ready(AnalysisView::from(&analysis)),
                };
            }
            Ok(ViewData::Suggestions(report)) => self.state.suggestions = Some(report),
            Err(err) => {
                error!("failed to load {}: {err}", kind.label());
                let message = format!("Failed to load {}: {err}", kind.label());
                if kind == DataKind::Analysis {
                    self.state.analysis = Panel::Failed(message.clone());
                }
                self.state.error_message = Some(message);
            }
        }
    }

    fn apply_advice(&mut self, host: &str, target: AdviceTarget, result: ConsoleResult<ChatReply>) {
        match target {
            AdviceTarget::Overview => {
                let panel = match result {
                    Ok(ChatReply::Structured(advice)) => Panel::Ready(self.present(host, advice)),
                    Ok(ChatReply::Text(_)) => Panel::Unavailable(ADVICE_UNAVAILABLE.to_string()),
                    Err(err) => {
                        error!("failed to load recommendations for {host}: {err}");
                        Panel::Failed(format!(
                            "Error loading recommendations: {}",
                            err.user_message()
                        ))
                    }
                };
                self.replace_overview_advice(panel);
            }

            AdviceTarget::Chat(index) => {
                let answer = match result {
                    Ok(ChatReply::Structured(advice)) => {
                        ChatAnswer::Advice(self.present(host, advice))
                    }
                    Ok(ChatReply::Text(text)) => ChatAnswer::Text(text),
                    Err(err) => {
                        error!("chat request for {host} failed: {err}");
                        ChatAnswer::Failed(format!("Error: {}", err.user_message()))
                    }
                };

                match self.state.chat.get_mut(index) {
                    Some(entry) => entry.answer = answer,
                    None => debug!("chat entry {index} no longer exists"),
                }
            }
        }
    }

    /// Project advice for display, preparing an execution per actionable recommendation
    fn present(&mut self, host: &str, advice: Advice) -> AdviceView {
        let recommendations = advice
            .recommendations
            .iter()
            .map(|recommendation| {
                if !recommendation.is_actionable() {
                    return RecommendationView::project(recommendation, None, None);
                }

                match codec::encode(recommendation) {
                    Ok(token) => {
                        let id = self
                            .board
                            .prepare(host, ExecutionTarget::Recommendation(token.clone()));
                        RecommendationView::project(recommendation, Some(id), Some(token))
                    }
                    Err(err) => {
                        warn!("failed to encode recommendation: {err}");
                        RecommendationView::project(recommendation, None, None)
                    }
                }
            })
            .collect();

        AdviceView {
            summary: advice.summary,
            recommendations,
            upgrade: advice.upgrade_suggestion.filter(|upgrade| upgrade.needed),
        }
    }
}

/// Handle for controlling a ConsoleActor
///
/// Cheap to clone; the actor exits once every handle is dropped.
#[derive(Clone)]
pub struct ConsoleHandle {
    /// Command sender
    sender: mpsc::Sender<ConsoleCommand>,

    /// Latest published state
    state_rx: watch::Receiver<ConsoleState>,
}

impl ConsoleHandle {
    /// Spawn a new console actor
    pub fn spawn(config: ConsoleConfig, api: Arc<dyn ConsoleApi>, hosts: Vec<Host>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);
        let (state_tx, state_rx) = watch::channel(ConsoleState::default());

        let actor = ConsoleActor::new(config, api, hosts, cmd_rx, state_tx);

        tokio::spawn(actor.run());

        Self {
            sender: cmd_tx,
            state_rx,
        }
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> ConsoleCommand,
    ) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(command(tx))
            .await
            .context("failed to send console command")?;

        rx.await.context("failed to receive response")
    }

    /// Select a host, cancelling the previous host's polling
    pub async fn select_host(&self, host: &str) -> Result<()> {
        let host = host.to_string();
        self.request(|respond_to| ConsoleCommand::SelectHost { host, respond_to })
            .await??;
        Ok(())
    }

    pub async fn switch_view(&self, view: View) -> Result<()> {
        self.request(|respond_to| ConsoleCommand::SwitchView { view, respond_to })
            .await
    }

    pub async fn set_auto_refresh(&self, enabled: bool) -> Result<()> {
        self.request(|respond_to| ConsoleCommand::SetAutoRefresh {
            enabled,
            respond_to,
        })
        .await
    }

    /// Fetch the current host once
    pub async fn refresh(&self) -> Result<()> {
        self.request(|respond_to| ConsoleCommand::Refresh { respond_to })
            .await??;
        Ok(())
    }

    /// Cancel the recurring poll
    pub async fn stop(&self) -> Result<()> {
        self.request(|respond_to| ConsoleCommand::Stop { respond_to })
            .await
    }

    /// Run a catalog action on the current host
    pub async fn run_action(&self, action_id: &str) -> Result<TriggerOutcome> {
        let action_id = action_id.to_string();
        let outcome = self
            .request(|respond_to| ConsoleCommand::RunAction {
                action_id,
                respond_to,
            })
            .await??;
        Ok(outcome)
    }

    /// Click a presented recommendation
    ///
    /// A recommendation whose token cannot be decoded fails with
    /// [`ConsoleError::Decode`](crate::error::ConsoleError::Decode) and
    /// stays idle; the console keeps running.
    pub async fn trigger_recommendation(&self, execution: ExecutionId) -> Result<TriggerOutcome> {
        let outcome = self
            .request(|respond_to| ConsoleCommand::TriggerRecommendation {
                execution,
                respond_to,
            })
            .await??;
        Ok(outcome)
    }

    /// Close an execution's surface, returning whether it existed
    pub async fn dismiss_execution(&self, execution: ExecutionId) -> Result<bool> {
        self.request(|respond_to| ConsoleCommand::DismissExecution {
            execution,
            respond_to,
        })
        .await
    }

    pub async fn ask(&self, question: &str) -> Result<()> {
        let question = question.to_string();
        self.request(|respond_to| ConsoleCommand::Ask {
            question,
            respond_to,
        })
        .await??;
        Ok(())
    }

    pub async fn refresh_advice(&self) -> Result<()> {
        self.request(|respond_to| ConsoleCommand::RefreshAdvice { respond_to })
            .await??;
        Ok(())
    }

    pub async fn analyze(&self) -> Result<()> {
        self.request(|respond_to| ConsoleCommand::Analyze { respond_to })
            .await??;
        Ok(())
    }

    pub async fn load_suggestions(&self) -> Result<()> {
        self.request(|respond_to| ConsoleCommand::LoadSuggestions { respond_to })
            .await??;
        Ok(())
    }

    pub async fn clear_error(&self) -> Result<()> {
        self.sender
            .send(ConsoleCommand::ClearError)
            .await
            .context("failed to send ClearError command")?;
        Ok(())
    }

    /// Gracefully shutdown the actor
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(ConsoleCommand::Shutdown)
            .await
            .context("failed to send Shutdown command")?;
        Ok(())
    }

    /// Latest published state
    pub fn state(&self) -> ConsoleState {
        self.state_rx.borrow().clone()
    }

    /// Receiver notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<ConsoleState> {
        self.state_rx.clone()
    }

    /// Wait until the published state satisfies `predicate`
    pub async fn wait_until(
        &self,
        predicate: impl FnMut(&ConsoleState) -> bool,
    ) -> Result<ConsoleState> {
        let mut rx = self.state_rx.clone();
        let state = rx
            .wait_for(predicate)
            .await
            .context("console actor stopped")?;
        Ok(state.clone())
    }
}
