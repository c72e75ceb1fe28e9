/// Monitoring engine module - probes endpoints on a schedule
///
/// This module is responsible for:
/// - Running reachability probes
/// - Keeping the ordered endpoint registry
/// - Scheduling cycles behind an overlap guard
/// - Aggregating outcomes into snapshots
/// - Logging history records and emitting alerts
pub mod aggregator;
pub mod probe;
pub mod registry;
pub mod scheduler;
pub mod sink;
pub mod types;
pub mod validation;

pub use aggregator::{ProbeMode, StatusAggregator};
pub use probe::{PingProbe, Probe};
pub use registry::{EndpointRegistry, RegistryError};
pub use scheduler::{Cycle, Scheduler, SchedulerState, TickOutcome};
pub use sink::{CommandNotifier, EventSink, FileHistoryLog, HistoryLog, LogNotifier, Notifier};
pub use types::{Endpoint, LogRecord, ProbeOutcome, Reachability, StatusSnapshot};
