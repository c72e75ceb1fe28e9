use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::debug;

use super::probe::{DEFAULT_PROBE_TIMEOUT, Probe};
use super::types::{Endpoint, ProbeOutcome, StatusSnapshot};

/// How the probes of one cycle are executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProbeMode {
    /// All endpoints at once, cycle takes about one timeout
    #[default]
    Concurrent,
    /// One endpoint after the other
    Sequential,
}

/// Status aggregator - probes a list of endpoints into a snapshot
pub struct StatusAggregator {
    probe: Arc<dyn Probe>,
    timeout: Duration,
    mode: ProbeMode,
}

impl StatusAggregator {
    pub fn new(probe: Arc<dyn Probe>) -> Self {
        Self { probe, timeout: DEFAULT_PROBE_TIMEOUT, mode: ProbeMode::default() }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_mode(mut self, mode: ProbeMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Probe every endpoint, outcomes keep the order of `endpoints`
    pub async fn collect(&self, endpoints: &[Endpoint]) -> StatusSnapshot {
        if endpoints.is_empty() {
            return StatusSnapshot::empty();
        }

        let outcomes = match self.mode {
            ProbeMode::Concurrent => {
                // join_all yields results in input order, not completion order
                join_all(endpoints.iter().map(|endpoint| self.probe_one(endpoint))).await
            }
            ProbeMode::Sequential => {
                let mut outcomes = Vec::with_capacity(endpoints.len());
                for endpoint in endpoints {
                    outcomes.push(self.probe_one(endpoint).await);
                }
                outcomes
            }
        };

        let snapshot = StatusSnapshot::new(outcomes);
        debug!(
            online = snapshot.online_count(),
            total = snapshot.total(),
            "Cycle probes collected"
        );
        snapshot
    }

    async fn probe_one(&self, endpoint: &Endpoint) -> ProbeOutcome {
        let reachable = self.probe.check(endpoint, self.timeout).await;
        ProbeOutcome::new(endpoint.clone(), reachable)
    }
}
