use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{debug, info};

/// Lifecycle of the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
    Stopped,
}

/// Result of asking the scheduler for a cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome<T> {
    Completed(T),
    /// Another cycle was in flight, nothing was done
    AlreadyRunning,
    /// The scheduler was stopped, nothing was done
    Stopped,
}

impl<T> TickOutcome<T> {
    pub fn completed(self) -> Option<T> {
        match self {
            TickOutcome::Completed(output) => Some(output),
            _ => None,
        }
    }

    pub fn is_already_running(&self) -> bool {
        matches!(self, TickOutcome::AlreadyRunning)
    }
}

/// One unit of scheduled work
#[async_trait::async_trait]
pub trait Cycle: Send + Sync + 'static {
    type Output: Send;

    async fn run(&self) -> Self::Output;
}

#[derive(Debug, Clone, Copy)]
struct Guard {
    state: SchedulerState,
    stop_requested: bool,
}

/// Puts the guard back to `Idle` (or `Stopped`) even if the cycle panics
struct RunningGuard<'a> {
    guard: &'a watch::Sender<Guard>,
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.guard.send_modify(|guard| {
            guard.state =
                if guard.stop_requested { SchedulerState::Stopped } else { SchedulerState::Idle };
        });
    }
}

/// Periodic driver with an overlap guard.
///
/// The periodic timer and manual triggers both go through [`Scheduler::tick`],
/// so at most one cycle runs at any time. The timer is rearmed only after a
/// cycle has finished.
pub struct Scheduler<C: Cycle> {
    cycle: C,
    guard: watch::Sender<Guard>,
    interval: watch::Sender<Duration>,
}

impl<C: Cycle> Scheduler<C> {
    pub fn new(cycle: C, interval: Duration) -> Self {
        Self {
            cycle,
            guard: watch::Sender::new(Guard { state: SchedulerState::Idle, stop_requested: false }),
            interval: watch::Sender::new(interval),
        }
    }

    pub fn cycle(&self) -> &C {
        &self.cycle
    }

    pub fn state(&self) -> SchedulerState {
        self.guard.borrow().state
    }

    pub fn interval(&self) -> Duration {
        *self.interval.borrow()
    }

    /// Takes effect when the timer is next rearmed
    pub fn set_interval(&self, interval: Duration) {
        self.interval.send_replace(interval);
        debug!(?interval, "Poll interval updated");
    }

    /// Run one cycle unless one is already in flight or the scheduler stopped
    pub async fn tick(&self) -> TickOutcome<C::Output> {
        let mut refused = SchedulerState::Idle;
        let began = self.guard.send_if_modified(|guard| {
            if guard.state == SchedulerState::Idle {
                guard.state = SchedulerState::Running;
                true
            } else {
                refused = guard.state;
                false
            }
        });

        if !began {
            return match refused {
                SchedulerState::Stopped => TickOutcome::Stopped,
                _ => TickOutcome::AlreadyRunning,
            };
        }

        let _running = RunningGuard { guard: &self.guard };
        TickOutcome::Completed(self.cycle.run().await)
    }

    /// Out of band tick requested by the user
    pub async fn manual_trigger(&self) -> TickOutcome<C::Output> {
        let outcome = self.tick().await;
        match &outcome {
            TickOutcome::AlreadyRunning => info!("Ping already running"),
            TickOutcome::Stopped => info!("Monitoring is stopped, manual refresh ignored"),
            TickOutcome::Completed(_) => debug!("Manual refresh completed"),
        }
        outcome
    }

    /// Spawn the periodic driver. The first cycle starts immediately.
    pub fn spawn(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let scheduler = Arc::clone(self);
        tokio::spawn(async move { scheduler.drive().await })
    }

    async fn drive(&self) {
        let mut guard_rx = self.guard.subscribe();
        info!(interval = ?self.interval(), "Monitoring scheduler started");

        loop {
            if self.tick().await.is_already_running() {
                debug!("Previous cycle still running, skipping tick");
            }

            if self.guard.borrow().stop_requested {
                break;
            }

            let period = self.interval();
            tokio::select! {
                _ = sleep(period) => {}
                _ = stop_requested(&mut guard_rx) => break,
            }
        }

        info!("Monitoring scheduler stopped");
    }

    /// Stop the timer and wait for an in-flight cycle to finish
    pub async fn stop(&self) {
        self.guard.send_modify(|guard| {
            guard.stop_requested = true;
            if guard.state == SchedulerState::Idle {
                guard.state = SchedulerState::Stopped;
            }
        });

        let mut guard_rx = self.guard.subscribe();
        let _ = guard_rx.wait_for(|guard| guard.state == SchedulerState::Stopped).await;
    }
}

async fn stop_requested(guard_rx: &mut watch::Receiver<Guard>) {
    let _ = guard_rx.wait_for(|guard| guard.stop_requested).await;
}
