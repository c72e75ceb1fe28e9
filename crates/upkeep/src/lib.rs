//! UpKeep - uptime monitor for a handful of hosts
//!
//! The crate holds the monitoring core: a probe abstraction, the bounded
//! endpoint registry, a scheduler that never runs two cycles at once, and
//! the aggregation of probe outcomes into status snapshots. Presentation
//! layers drive it through [`MonitorCore`].

pub mod config;
pub mod engine;
pub mod monitoring;

pub use config::{ConfigError, ConfigStore, MonitorConfig};
pub use engine::{CoreOptions, MonitorCore};
pub use monitoring::{
    Endpoint, EventSink, ProbeMode, ProbeOutcome, RegistryError, SchedulerState, StatusSnapshot,
    TickOutcome,
};
