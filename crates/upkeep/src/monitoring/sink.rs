use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::process::Command;
use tracing::{debug, warn};

use super::types::{LogRecord, ProbeOutcome, StatusSnapshot};

/// Default history log file name
pub const DEFAULT_LOG_FILE: &str = "upkeep_log.txt";

/// Alert text for an offline endpoint
pub fn alert_message(endpoint: &str) -> String {
    format!("Server Down: {endpoint}")
}

/// Append-only storage for probe history
pub trait HistoryLog: Send + Sync {
    fn append(&self, record: &LogRecord) -> Result<()>;
}

/// Delivery of alert notifications
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, message: &str) -> Result<()>;
}

/// History log writing one line per record to a text file.
///
/// The file is opened in append mode for every record, nothing is buffered.
#[derive(Debug, Clone)]
pub struct FileHistoryLog {
    path: PathBuf,
}

impl FileHistoryLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HistoryLog for FileHistoryLog {
    fn append(&self, record: &LogRecord) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open {}", self.path.display()))?;

        writeln!(file, "{record}").with_context(|| format!("Failed to write {}", self.path.display()))
    }
}

/// Desktop notifications through `notify-send`.
///
/// The child is spawned and not awaited. On Windows nothing is sent.
#[derive(Debug, Clone)]
pub struct CommandNotifier {
    program: String,
}

impl Default for CommandNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandNotifier {
    pub fn new() -> Self {
        Self { program: "notify-send".into() }
    }

    pub fn with_program(program: impl Into<String>) -> Self {
        Self { program: program.into() }
    }
}

#[async_trait::async_trait]
impl Notifier for CommandNotifier {
    async fn notify(&self, message: &str) -> Result<()> {
        if cfg!(windows) {
            return Ok(());
        }

        Command::new(&self.program)
            .arg(message)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("Failed to spawn {}", self.program))?;
        Ok(())
    }
}

/// Notifier that only writes the alert to the tracing output
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait::async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, message: &str) -> Result<()> {
        warn!("{}", message);
        Ok(())
    }
}

/// Records every outcome and alerts on offline ones.
///
/// Failures of either side are logged and swallowed, a cycle is never
/// aborted because of them.
#[derive(Clone)]
pub struct EventSink {
    history: Arc<dyn HistoryLog>,
    notifier: Arc<dyn Notifier>,
}

impl EventSink {
    pub fn new(history: Arc<dyn HistoryLog>, notifier: Arc<dyn Notifier>) -> Self {
        Self { history, notifier }
    }

    pub async fn record(&self, outcome: &ProbeOutcome) {
        if let Err(e) = self.history.append(&outcome.to_record()) {
            warn!(endpoint = %outcome.endpoint, "Failed to append history record: {:#}", e);
        }

        if outcome.reachable {
            return;
        }

        let message = alert_message(outcome.endpoint.as_str());
        match self.notifier.notify(&message).await {
            Ok(()) => debug!(endpoint = %outcome.endpoint, "Alert emitted"),
            Err(e) => warn!(endpoint = %outcome.endpoint, "Failed to deliver alert: {:#}", e),
        }
    }

    /// Record every outcome of a snapshot, in order
    pub async fn record_snapshot(&self, snapshot: &StatusSnapshot) {
        for outcome in &snapshot.outcomes {
            self.record(outcome).await;
        }
    }
}
