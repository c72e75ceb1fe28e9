//! End-to-end behaviour of the monitoring core
//!
//! These tests drive `MonitorCore` with scripted probes and check:
//! - Registry bounds and ordering
//! - Snapshot contents and the history/alert side effects of a cycle
//! - The overlap guard and the stop semantics of the scheduler
//! - Config persistence

mod common;

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use common::{Harness, RecordingNotifier, ScriptedProbe, config_with};
use upkeep::monitoring::validation::InvalidEndpoint;
use upkeep::{
    ConfigStore, CoreOptions, EventSink, MonitorConfig, MonitorCore, RegistryError,
    SchedulerState, TickOutcome,
};

async fn wait_for_state(core: &MonitorCore, state: SchedulerState) {
    while core.scheduler_state() != state {
        tokio::task::yield_now().await;
    }
}

fn pairs(snapshot: &upkeep::StatusSnapshot) -> Vec<(String, bool)> {
    snapshot
        .outcomes
        .iter()
        .map(|outcome| (outcome.endpoint.to_string(), outcome.reachable))
        .collect()
}

#[tokio::test]
async fn test_sixth_distinct_add_is_at_capacity() {
    let harness = Harness::new(ScriptedProbe::new(&[]), MonitorConfig::default());

    for i in 1..=5 {
        assert!(harness.core.add_endpoint(&format!("host{i}.example")).await.is_ok());
    }

    let result = harness.core.add_endpoint("host6.example").await;
    assert_eq!(result, Err(RegistryError::AtCapacity { capacity: 5 }));
    assert_eq!(harness.core.endpoints().await.len(), 5);
}

#[tokio::test]
async fn test_duplicate_add_is_invalid() {
    let harness = Harness::new(ScriptedProbe::new(&[]), config_with(&["a.example"]));

    let result = harness.core.add_endpoint("  a.example ").await;
    assert!(matches!(
        result,
        Err(RegistryError::InvalidEndpoint(InvalidEndpoint::Duplicate(_)))
    ));
    assert_eq!(harness.core.endpoints().await.len(), 1);
}

#[tokio::test]
async fn test_snapshot_follows_registry_order() {
    let probe = ScriptedProbe::new(&[("A", true), ("B", false), ("C", true)]);
    let harness = Harness::new(probe, config_with(&["A", "B", "C"]));
    let mut snapshots = harness.core.subscribe();

    let snapshot = harness.core.trigger_manual_cycle().await.completed().unwrap();

    assert_eq!(
        pairs(&snapshot),
        vec![("A".into(), true), ("B".into(), false), ("C".into(), true)]
    );
    assert_eq!(snapshot.online_count(), 2);
    assert_eq!(snapshot.total(), 3);

    let published = snapshots.recv().await.unwrap();
    assert_eq!(published, snapshot);
}

#[tokio::test]
async fn test_cycle_logs_every_outcome_and_alerts_offline_only() {
    let probe = ScriptedProbe::new(&[("up.example", true), ("down.example", false)]);
    let harness = Harness::new(probe, config_with(&["up.example", "down.example"]));

    harness.core.trigger_manual_cycle().await;

    assert_eq!(
        harness.records(),
        vec![("up.example".into(), true), ("down.example".into(), false)]
    );
    assert_eq!(harness.alerts(), vec!["Server Down: down.example"]);

    // No de-duplication across cycles
    harness.core.trigger_manual_cycle().await;
    assert_eq!(harness.records().len(), 4);
    assert_eq!(harness.alerts().len(), 2);
}

#[tokio::test]
async fn test_alert_failure_does_not_abort_cycle() {
    let probe = ScriptedProbe::new(&[]);
    let notifier = RecordingNotifier { fail: true, ..RecordingNotifier::default() };
    let harness = Harness::with_notifier(probe, config_with(&["a", "b", "c"]), notifier);

    let snapshot = harness.core.trigger_manual_cycle().await.completed().unwrap();

    assert_eq!(snapshot.total(), 3);
    assert_eq!(harness.records().len(), 3);
    assert_eq!(harness.alerts().len(), 3);
    assert_eq!(harness.core.scheduler_state(), SchedulerState::Idle);
}

#[tokio::test]
async fn test_empty_registry_cycle() {
    let harness = Harness::new(ScriptedProbe::new(&[]), MonitorConfig::default());

    let snapshot = harness.core.trigger_manual_cycle().await.completed().unwrap();

    assert_eq!(snapshot.total(), 0);
    assert_eq!(snapshot.online_count(), 0);
    assert_eq!(harness.probe.calls(), 0);
    assert!(harness.records().is_empty());
}

#[tokio::test]
async fn test_manual_trigger_while_running_does_nothing() {
    let probe = ScriptedProbe::gated(&[("a", true)]);
    let harness = Arc::new(Harness::new(probe, config_with(&["a", "b"])));

    let first = {
        let harness = Arc::clone(&harness);
        tokio::spawn(async move { harness.core.trigger_manual_cycle().await })
    };
    wait_for_state(&harness.core, SchedulerState::Running).await;

    let outcome = harness.core.trigger_manual_cycle().await;
    assert!(outcome.is_already_running());

    harness.probe.open();
    let snapshot = first.await.unwrap().completed().unwrap();
    assert_eq!(snapshot.total(), 2);
    assert_eq!(harness.probe.calls(), 2);
}

#[tokio::test]
async fn test_mutation_during_cycle_keeps_cycle_order() {
    let probe = ScriptedProbe::gated(&[("a", true), ("b", true), ("c", true)]);
    let harness = Arc::new(Harness::new(probe, config_with(&["a", "b"])));

    let cycle = {
        let harness = Arc::clone(&harness);
        tokio::spawn(async move { harness.core.trigger_manual_cycle().await })
    };
    wait_for_state(&harness.core, SchedulerState::Running).await;

    harness.core.add_endpoint("c").await.unwrap();
    harness.probe.open();

    let snapshot = cycle.await.unwrap().completed().unwrap();
    assert_eq!(pairs(&snapshot), vec![("a".into(), true), ("b".into(), true)]);

    let next = harness.core.trigger_manual_cycle().await.completed().unwrap();
    assert_eq!(next.total(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_stops_periodic_cycles() {
    let harness = Harness::new(ScriptedProbe::new(&[("a", true)]), config_with(&["a"]));
    let driver = harness.core.start();

    // Cycles at t = 0, 10, 20
    tokio::time::sleep(Duration::from_secs(25)).await;
    assert_eq!(harness.probe.calls(), 3);

    harness.core.shutdown().await;
    tokio::time::sleep(Duration::from_secs(120)).await;

    assert_eq!(harness.probe.calls(), 3);
    assert_eq!(harness.core.scheduler_state(), SchedulerState::Stopped);
    assert!(matches!(harness.core.trigger_manual_cycle().await, TickOutcome::Stopped));
    driver.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_set_interval_changes_period() {
    let harness = Harness::new(ScriptedProbe::new(&[("a", true)]), config_with(&["a"]));
    harness.core.set_interval(30).await.unwrap();
    let _driver = harness.core.start();

    // Cycles at t = 0, 30, 60
    tokio::time::sleep(Duration::from_secs(75)).await;
    assert_eq!(harness.probe.calls(), 3);
    assert_eq!(harness.core.interval(), Duration::from_secs(30));
}

#[tokio::test]
async fn test_invalid_interval_rejected() {
    let harness = Harness::new(ScriptedProbe::new(&[]), MonitorConfig::default());

    assert!(harness.core.set_interval(0).await.is_err());
    assert!(harness.core.set_interval(3601).await.is_err());
    assert_eq!(harness.core.interval(), Duration::from_secs(10));
    assert_eq!(harness.core.config().await.interval, 10);
}

#[tokio::test]
async fn test_mutations_are_persisted() {
    let harness = Harness::new(ScriptedProbe::new(&[]), MonitorConfig::default());
    let store = harness.core.store().clone();

    harness.core.add_endpoint("zeta.example").await.unwrap();
    harness.core.add_endpoint("alpha.example").await.unwrap();
    harness.core.set_interval(120).await.unwrap();
    assert!(harness.core.toggle_dark_mode().await);

    let saved = store.load().unwrap();
    assert_eq!(saved.servers, vec!["zeta.example", "alpha.example"]);
    assert_eq!(saved.interval, 120);
    assert!(saved.dark_mode);

    assert!(harness.core.remove_endpoint("zeta.example").await);
    assert_eq!(store.load().unwrap().servers, vec!["alpha.example"]);

    harness.core.remove_all_endpoints().await;
    assert!(store.load().unwrap().servers.is_empty());
}

#[tokio::test]
async fn test_config_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let store = ConfigStore::new(dir.path().join("upkeep_config.json"));
    let sink = || {
        EventSink::new(
            Arc::new(common::MemoryHistory::default()),
            Arc::new(RecordingNotifier::default()),
        )
    };

    let first = MonitorCore::load(
        store.clone(),
        Arc::new(ScriptedProbe::new(&[])),
        sink(),
        CoreOptions::default(),
    );
    for id in ["c", "a", "b"] {
        first.add_endpoint(id).await.unwrap();
    }
    first.set_interval(5).await.unwrap();
    first.toggle_dark_mode().await;
    first.shutdown().await;

    let second =
        MonitorCore::load(store, Arc::new(ScriptedProbe::new(&[])), sink(), CoreOptions::default());
    assert_eq!(second.config().await, first.config().await);
    let ids: Vec<String> = second.endpoints().await.iter().map(ToString::to_string).collect();
    assert_eq!(ids, vec!["c", "a", "b"]);
    assert_eq!(second.interval(), Duration::from_secs(5));
    assert!(second.dark_mode().await);
}

#[tokio::test]
async fn test_persistence_failure_keeps_memory_state() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, "not a directory").unwrap();
    let store = ConfigStore::new(blocker.join("upkeep_config.json"));

    let core = MonitorCore::new(
        MonitorConfig::default(),
        store,
        Arc::new(ScriptedProbe::new(&[])),
        EventSink::new(
            Arc::new(common::MemoryHistory::default()),
            Arc::new(RecordingNotifier::default()),
        ),
        CoreOptions::default(),
    );

    core.add_endpoint("a.example").await.unwrap();
    assert_eq!(core.endpoints().await.len(), 1);
}

#[tokio::test]
async fn test_corrupt_config_starts_with_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("upkeep_config.json");
    fs::write(&path, "{ not json").unwrap();
    let store = ConfigStore::new(&path);

    let probe = Arc::new(ScriptedProbe::new(&[("a.example", true)]));
    let core = MonitorCore::load(
        store.clone(),
        probe,
        EventSink::new(
            Arc::new(common::MemoryHistory::default()),
            Arc::new(RecordingNotifier::default()),
        ),
        CoreOptions::default(),
    );

    assert_eq!(core.config().await, MonitorConfig::default());
    assert_eq!(fs::read_to_string(store.corrupt_path()).unwrap(), "{ not json");

    core.add_endpoint("a.example").await.unwrap();
    let snapshot = core.trigger_manual_cycle().await.completed().unwrap();
    assert_eq!(pairs(&snapshot), vec![("a.example".into(), true)]);
    assert_eq!(store.load().unwrap().servers, vec!["a.example"]);
    assert_eq!(fs::read_to_string(store.corrupt_path()).unwrap(), "{ not json");
}
