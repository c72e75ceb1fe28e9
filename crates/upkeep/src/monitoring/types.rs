use std::fmt;

use chrono::{DateTime, Local};

/// Format used for history log timestamps
pub const LOG_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A monitored target, an IP address or hostname.
///
/// Only constructed through the registry or validation, so the wrapped
/// identifier is always trimmed and non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint(String);

impl Endpoint {
    pub(crate) fn new_unchecked(id: String) -> Self {
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Endpoint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Reachability of an endpoint, as shown to users
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reachability {
    Online,
    Offline,
    Unknown,
}

impl From<bool> for Reachability {
    fn from(reachable: bool) -> Self {
        if reachable { Self::Online } else { Self::Offline }
    }
}

impl fmt::Display for Reachability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reachability::Online => write!(f, "Online"),
            Reachability::Offline => write!(f, "Offline"),
            Reachability::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Result of probing one endpoint during one cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub endpoint: Endpoint,
    pub reachable: bool,
    pub timestamp: DateTime<Local>,
}

impl ProbeOutcome {
    pub fn new(endpoint: Endpoint, reachable: bool) -> Self {
        Self { endpoint, reachable, timestamp: Local::now() }
    }

    pub fn reachability(&self) -> Reachability {
        self.reachable.into()
    }

    /// History record for this outcome
    pub fn to_record(&self) -> LogRecord {
        LogRecord {
            timestamp: self.timestamp,
            endpoint: self.endpoint.clone(),
            reachable: self.reachable,
        }
    }
}

/// Ordered result of one cycle.
///
/// `outcomes` follows registry order at the time the cycle started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub outcomes: Vec<ProbeOutcome>,
    pub taken_at: DateTime<Local>,
}

impl StatusSnapshot {
    pub fn new(outcomes: Vec<ProbeOutcome>) -> Self {
        Self { outcomes, taken_at: Local::now() }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn online_count(&self) -> usize {
        self.outcomes.iter().filter(|outcome| outcome.reachable).count()
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Status of `endpoint` in this snapshot, `Unknown` if it was not probed
    pub fn status_of(&self, endpoint: &str) -> Reachability {
        self.outcomes
            .iter()
            .find(|outcome| outcome.endpoint.as_str() == endpoint)
            .map(ProbeOutcome::reachability)
            .unwrap_or(Reachability::Unknown)
    }

    /// Summary line, e.g. `Online: 2 / 3`
    pub fn summary(&self) -> String {
        format!("Online: {} / {}", self.online_count(), self.total())
    }
}

impl fmt::Display for StatusSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for outcome in &self.outcomes {
            writeln!(f, "{}: {}", outcome.endpoint, outcome.reachability())?;
        }
        write!(f, "{}", self.summary())
    }
}

/// One line of the append-only history log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub timestamp: DateTime<Local>,
    pub endpoint: Endpoint,
    pub reachable: bool,
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} - {}",
            self.timestamp.format(LOG_TIMESTAMP_FORMAT),
            self.endpoint,
            Reachability::from(self.reachable)
        )
    }
}
