//! Fakes shared by the integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Result, anyhow};
use tempfile::TempDir;
use tokio::sync::watch;
use upkeep::monitoring::{Endpoint, HistoryLog, LogRecord, Notifier, Probe};
use upkeep::{ConfigStore, CoreOptions, EventSink, MonitorConfig, MonitorCore};

/// Probe answering from a table, unknown endpoints are offline.
///
/// When built with [`ScriptedProbe::gated`] every check waits until
/// [`ScriptedProbe::open`] is called.
pub struct ScriptedProbe {
    answers: Mutex<HashMap<String, bool>>,
    calls: AtomicUsize,
    gate: watch::Sender<bool>,
}

impl ScriptedProbe {
    pub fn new(answers: &[(&str, bool)]) -> Self {
        Self {
            answers: Mutex::new(answers.iter().map(|(id, up)| (id.to_string(), *up)).collect()),
            calls: AtomicUsize::new(0),
            gate: watch::Sender::new(true),
        }
    }

    pub fn gated(answers: &[(&str, bool)]) -> Self {
        let probe = Self::new(answers);
        probe.gate.send_replace(false);
        probe
    }

    pub fn open(&self) {
        self.gate.send_replace(true);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Probe for ScriptedProbe {
    async fn check(&self, endpoint: &Endpoint, _timeout: Duration) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut gate = self.gate.subscribe();
        let _ = gate.wait_for(|open| *open).await;
        self.answers.lock().unwrap().get(endpoint.as_str()).copied().unwrap_or(false)
    }
}

#[derive(Default)]
pub struct MemoryHistory {
    pub records: Mutex<Vec<LogRecord>>,
}

impl HistoryLog for MemoryHistory {
    fn append(&self, record: &LogRecord) -> Result<()> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub messages: Mutex<Vec<String>>,
    pub fail: bool,
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, message: &str) -> Result<()> {
        self.messages.lock().unwrap().push(message.to_string());
        if self.fail {
            return Err(anyhow!("notification daemon unavailable"));
        }
        Ok(())
    }
}

/// A core wired to fakes, with its config in a temporary directory
pub struct Harness {
    pub core: MonitorCore,
    pub probe: Arc<ScriptedProbe>,
    pub history: Arc<MemoryHistory>,
    pub notifier: Arc<RecordingNotifier>,
    pub dir: TempDir,
}

impl Harness {
    pub fn new(probe: ScriptedProbe, config: MonitorConfig) -> Self {
        Self::with_notifier(probe, config, RecordingNotifier::default())
    }

    pub fn with_notifier(
        probe: ScriptedProbe,
        config: MonitorConfig,
        notifier: RecordingNotifier,
    ) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("upkeep_config.json"));
        let probe = Arc::new(probe);
        let history = Arc::new(MemoryHistory::default());
        let notifier = Arc::new(notifier);
        let sink = EventSink::new(history.clone(), notifier.clone());

        let core = MonitorCore::new(config, store, probe.clone(), sink, CoreOptions::default());
        Self { core, probe, history, notifier, dir }
    }

    pub fn records(&self) -> Vec<(String, bool)> {
        self.history
            .records
            .lock()
            .unwrap()
            .iter()
            .map(|record| (record.endpoint.to_string(), record.reachable))
            .collect()
    }

    pub fn alerts(&self) -> Vec<String> {
        self.notifier.messages.lock().unwrap().clone()
    }
}

pub fn config_with(servers: &[&str]) -> MonitorConfig {
    MonitorConfig {
        servers: servers.iter().map(|id| id.to_string()).collect(),
        ..MonitorConfig::default()
    }
}
