use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{RwLock, broadcast};
use tracing::{debug, info, warn};

use crate::config::{ConfigStore, MonitorConfig};
use crate::monitoring::aggregator::{ProbeMode, StatusAggregator};
use crate::monitoring::probe::{DEFAULT_PROBE_TIMEOUT, Probe};
use crate::monitoring::registry::{EndpointRegistry, RegistryError};
use crate::monitoring::scheduler::{Cycle, Scheduler, SchedulerState, TickOutcome};
use crate::monitoring::sink::EventSink;
use crate::monitoring::types::{Endpoint, StatusSnapshot};
use crate::monitoring::validation::{IntervalOutOfRange, clamp_interval, validate_interval};

/// Snapshots buffered for slow subscribers
const SNAPSHOT_CHANNEL_CAPACITY: usize = 16;

/// Tuning of the monitoring engine
#[derive(Debug, Clone, Copy)]
pub struct CoreOptions {
    pub probe_timeout: Duration,
    pub probe_mode: ProbeMode,
}

impl Default for CoreOptions {
    fn default() -> Self {
        Self { probe_timeout: DEFAULT_PROBE_TIMEOUT, probe_mode: ProbeMode::default() }
    }
}

/// Everything that is persisted, guarded by one lock
#[derive(Debug)]
struct MonitorState {
    registry: EndpointRegistry,
    dark_mode: bool,
    interval: u64,
}

impl MonitorState {
    fn to_config(&self) -> MonitorConfig {
        MonitorConfig {
            servers: self.registry.to_ids(),
            dark_mode: self.dark_mode,
            interval: self.interval,
        }
    }
}

/// One monitoring pass over the registry
pub struct MonitorCycle {
    state: Arc<RwLock<MonitorState>>,
    aggregator: StatusAggregator,
    sink: EventSink,
    snapshots: broadcast::Sender<StatusSnapshot>,
}

#[async_trait::async_trait]
impl Cycle for MonitorCycle {
    type Output = StatusSnapshot;

    async fn run(&self) -> StatusSnapshot {
        // Copy the order so mutations during the cycle do not affect it
        let endpoints = self.state.read().await.registry.list().to_vec();
        debug!(endpoints = endpoints.len(), "Refreshing...");

        let snapshot = self.aggregator.collect(&endpoints).await;
        self.sink.record_snapshot(&snapshot).await;

        info!("Monitoring... {}", snapshot.summary());
        // No subscribers is fine
        let _ = self.snapshots.send(snapshot.clone());
        snapshot
    }
}

/// Owner of the registry, scheduler and config of one monitor.
///
/// Presentation layers hold a reference to it, mutate through its methods
/// and render the snapshots from [`MonitorCore::subscribe`].
pub struct MonitorCore {
    state: Arc<RwLock<MonitorState>>,
    scheduler: Arc<Scheduler<MonitorCycle>>,
    snapshots: broadcast::Sender<StatusSnapshot>,
    store: ConfigStore,
}

impl MonitorCore {
    pub fn new(
        config: MonitorConfig,
        store: ConfigStore,
        probe: Arc<dyn Probe>,
        sink: EventSink,
        options: CoreOptions,
    ) -> Self {
        let interval = clamp_interval(config.interval);
        let state = Arc::new(RwLock::new(MonitorState {
            registry: config.to_registry(),
            dark_mode: config.dark_mode,
            interval,
        }));

        let (snapshots, _) = broadcast::channel(SNAPSHOT_CHANNEL_CAPACITY);
        let aggregator = StatusAggregator::new(probe)
            .with_timeout(options.probe_timeout)
            .with_mode(options.probe_mode);

        let cycle = MonitorCycle {
            state: Arc::clone(&state),
            aggregator,
            sink,
            snapshots: snapshots.clone(),
        };

        Self {
            state,
            scheduler: Arc::new(Scheduler::new(cycle, Duration::from_secs(interval))),
            snapshots,
            store,
        }
    }

    /// Build from the config found in `store`, or the defaults if it is unusable
    pub fn load(
        store: ConfigStore,
        probe: Arc<dyn Probe>,
        sink: EventSink,
        options: CoreOptions,
    ) -> Self {
        let config = store.load_or_default();
        info!(
            path = %store.path().display(),
            servers = config.servers.len(),
            interval = config.interval,
            "Loaded monitor configuration"
        );
        Self::new(config, store, probe, sink, options)
    }

    /// Start the periodic driver, the first cycle runs right away
    pub fn start(&self) -> tokio::task::JoinHandle<()> {
        self.scheduler.spawn()
    }

    /// Stop the driver, wait for an in-flight cycle and save the config
    pub async fn shutdown(&self) {
        self.scheduler.stop().await;
        let state = self.state.read().await;
        self.persist(&state);
        info!("Monitor shut down");
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StatusSnapshot> {
        self.snapshots.subscribe()
    }

    pub fn scheduler_state(&self) -> SchedulerState {
        self.scheduler.state()
    }

    /// Run a cycle now, unless one is already in flight
    pub async fn trigger_manual_cycle(&self) -> TickOutcome<StatusSnapshot> {
        self.scheduler.manual_trigger().await
    }

    pub async fn add_endpoint(&self, id: &str) -> Result<Endpoint, RegistryError> {
        let mut state = self.state.write().await;
        let endpoint = state.registry.add(id)?;
        info!(endpoint = %endpoint, "Server added");
        self.persist(&state);
        Ok(endpoint)
    }

    /// Returns whether the endpoint was monitored
    pub async fn remove_endpoint(&self, id: &str) -> bool {
        let id = id.trim();
        let mut state = self.state.write().await;
        let removed = state.registry.remove(id);
        if removed {
            info!(endpoint = %id, "Server removed");
        }
        self.persist(&state);
        removed
    }

    pub async fn remove_all_endpoints(&self) {
        let mut state = self.state.write().await;
        state.registry.clear();
        info!("All servers removed");
        self.persist(&state);
    }

    pub async fn endpoints(&self) -> Vec<Endpoint> {
        self.state.read().await.registry.list().to_vec()
    }

    /// Change the poll interval, applied when the timer is next rearmed
    pub async fn set_interval(&self, interval_seconds: u64) -> Result<(), IntervalOutOfRange> {
        let interval = validate_interval(interval_seconds)?;
        let mut state = self.state.write().await;
        state.interval = interval_seconds;
        self.scheduler.set_interval(interval);
        info!(interval = interval_seconds, "Poll interval changed");
        self.persist(&state);
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        self.scheduler.interval()
    }

    pub async fn dark_mode(&self) -> bool {
        self.state.read().await.dark_mode
    }

    /// Flip the theme flag, returns the new value
    pub async fn toggle_dark_mode(&self) -> bool {
        let mut state = self.state.write().await;
        state.dark_mode = !state.dark_mode;
        self.persist(&state);
        state.dark_mode
    }

    /// Current persisted view
    pub async fn config(&self) -> MonitorConfig {
        self.state.read().await.to_config()
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    /// Best effort: a failed save is logged and the in-memory state kept
    fn persist(&self, state: &MonitorState) {
        match self.store.save(&state.to_config()) {
            Ok(()) => debug!(path = %self.store.path().display(), "Configuration saved"),
            Err(e) => warn!("Failed to save configuration: {}", e),
        }
    }
}
