//! Poll scheduling
//!
//! The scheduler owns the one recurring timer of the console. The timer is a tokio task that
//! emits a [`PollTick`] into a channel every period; the console turns ticks into fetches.
//!
//! ## Invariants
//!
//! - At most one timer task exists at any time. [`PollScheduler::arm`] aborts the previous task
//!   before spawning the next one.
//! - A tick is stamped with the host and generation it was armed for. Ticks that were already
//!   queued when their timer got cancelled fail [`PollScheduler::accepts`] and are dropped, so
//!   nothing fires after cancellation.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, trace};

use crate::api::HostId;

/// One firing of the recurring timer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollTick {
    pub host: HostId,
    pub generation: u64,
}

/// The armed timer and what it targets
#[derive(Debug)]
struct PollTimer {
    target: PollTick,
    task: JoinHandle<()>,
}

/// Owner of the recurring poll timer
#[derive(Debug)]
pub struct PollScheduler {
    /// Time between two ticks
    period: Duration,

    /// Whether [`arm`](Self::arm) actually starts a timer
    auto_refresh: bool,

    /// Currently armed timer (at most one)
    timer: Option<PollTimer>,

    /// Where ticks are delivered
    tick_tx: mpsc::UnboundedSender<PollTick>,
}

impl PollScheduler {
    pub fn new(
        period: Duration,
        auto_refresh: bool,
        tick_tx: mpsc::UnboundedSender<PollTick>,
    ) -> Self {
        Self {
            period,
            auto_refresh,
            timer: None,
            tick_tx,
        }
    }

    /// Cancel any running timer, then start one for `host` if auto-refresh is on
    ///
    /// The first tick fires one full period after arming; the immediate fetch on selection is
    /// the caller's job.
    pub fn arm(&mut self, host: &str, generation: u64) {
        self.stop();

        if !self.auto_refresh {
            trace!("auto-refresh disabled, not arming for {host}");
            return;
        }

        let target = PollTick {
            host: host.to_string(),
            generation,
        };

        debug!(
            "arming poll timer for {host} (generation {generation}, every {:?})",
            self.period
        );

        let task = tokio::spawn(run_timer(
            Instant::now() + self.period,
            self.period,
            target.clone(),
            self.tick_tx.clone(),
        ));

        self.timer = Some(PollTimer { target, task });
    }

    /// Cancel the timer; a no-op when none is armed
    pub fn stop(&mut self) {
        if let Some(timer) = self.timer.take() {
            debug!(
                "stopping poll timer for {} (generation {})",
                timer.target.host, timer.target.generation
            );
            timer.task.abort();
        }
    }

    /// Toggle auto-refresh without fetching
    ///
    /// Enabling re-arms for `current` (the selected host and generation), disabling cancels.
    pub fn set_auto_refresh(&mut self, enabled: bool, current: Option<(&str, u64)>) {
        self.auto_refresh = enabled;

        match (enabled, current) {
            (true, Some((host, generation))) => {
                if !self.is_armed_for(host, generation) {
                    self.arm(host, generation);
                }
            }
            (true, None) => {}
            (false, _) => self.stop(),
        }
    }

    pub fn auto_refresh(&self) -> bool {
        self.auto_refresh
    }

    pub fn is_armed(&self) -> bool {
        self.timer.is_some()
    }

    /// Host and generation the armed timer targets
    pub fn target(&self) -> Option<&PollTick> {
        self.timer.as_ref().map(|timer| &timer.target)
    }

    fn is_armed_for(&self, host: &str, generation: u64) -> bool {
        self.target()
            .is_some_and(|target| target.host == host && target.generation == generation)
    }

    /// Whether `tick` comes from the currently armed timer
    pub fn accepts(&self, tick: &PollTick) -> bool {
        self.target() == Some(tick)
    }
}

impl Drop for PollScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_timer(
    first_tick: Instant,
    period: Duration,
    target: PollTick,
    tick_tx: mpsc::UnboundedSender<PollTick>,
) {
    let mut ticker = interval_at(first_tick, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        trace!("poll tick for {}", target.host);
        if tick_tx.send(target.clone()).is_err() {
            // Receiver dropped, exit
            break;
        }
    }
}
