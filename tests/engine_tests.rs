//! End-to-end behaviour of the engine driven by scripted fetchers.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::Notify;

use netwatch::source::{FnFetcher, SyntheticFetcher};
use netwatch::{
    AlertKind, ConfigUpdate, DeliveryError, Engine, EngineConfig, FetchError, Fetcher, Metric, RawRecord,
};

fn interface(name: &str, status: &str, errors: u64) -> RawRecord {
    RawRecord::interface(json!({
        "name": name,
        "enabled": true,
        "oper-status": status,
        "ietf-ip:ipv4": {"address": [{"ip": "192.0.2.1", "netmask": "255.255.255.0"}]},
        "statistics": {"in-errors": errors, "out-errors": 0}
    }))
}

/// Returns queued results in order, then empty successes.
#[derive(Debug, Default)]
struct ScriptedFetcher {
    script: Mutex<VecDeque<Result<Vec<RawRecord>, FetchError>>>,
}

impl ScriptedFetcher {
    fn new(script: Vec<Result<Vec<RawRecord>, FetchError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
        }
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self) -> Result<Vec<RawRecord>, FetchError> {
        self.script.lock().pop_front().unwrap_or_else(|| Ok(Vec::new()))
    }

    fn description(&self) -> &str {
        "scripted"
    }
}

/// Blocks inside `fetch` until released, once gating is switched on.
#[derive(Debug, Default)]
struct GatedFetcher {
    gated: AtomicBool,
    entered: Notify,
    release: Notify,
}

#[async_trait]
impl Fetcher for GatedFetcher {
    async fn fetch(&self) -> Result<Vec<RawRecord>, FetchError> {
        if self.gated.load(Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }
        Ok(vec![interface("Gi0/0", "up", 0)])
    }

    fn description(&self) -> &str {
        "gated"
    }
}

fn counting_fetcher() -> FnFetcher<impl Fn() -> Result<Vec<RawRecord>, FetchError> + Send + Sync> {
    let errors = AtomicU64::new(0);
    FnFetcher::new("counting", move || {
        let total = errors.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(vec![interface("Gi0/0", "up", total)])
    })
}

#[tokio::test]
async fn failed_fetch_keeps_previous_entities() {
    let fetcher = ScriptedFetcher::new(vec![
        Ok(vec![interface("Gi0/0", "down", 0), interface("Gi0/1", "up", 0)]),
        Err(FetchError::Status(503)),
    ]);
    let engine = Engine::new(fetcher, EngineConfig::default()).unwrap();

    let first = engine.run_cycle_now().await;
    assert!(first.fetch.ok);
    assert_eq!(first.entities.len(), 2);

    let second = engine.run_cycle_now().await;
    assert!(!second.fetch.ok);
    assert_eq!(second.fetch.error.as_deref(), Some("API returned status 503"));
    assert_eq!(second.cycle, 2);
    assert!(second.timestamp_ms >= first.timestamp_ms);
    assert_eq!(second.entities, first.entities);
    assert_eq!(second.alerts, first.alerts);
    // No history appended for a failed cycle
    assert_eq!(engine.history("Gi0/0").len(), 1);
}

#[tokio::test]
async fn skipped_records_are_counted() {
    let fetcher = ScriptedFetcher::new(vec![Ok(vec![
        interface("Gi0/0", "up", 0),
        RawRecord::interface(json!({"description": "no name"})),
        RawRecord::device(Value::Null),
    ])]);
    let engine = Engine::new(fetcher, EngineConfig::default()).unwrap();

    let snapshot = engine.run_cycle_now().await;
    assert!(snapshot.fetch.ok);
    assert_eq!(snapshot.entities.len(), 1);
    assert_eq!(snapshot.fetch.skipped_records, 2);
}

#[tokio::test]
async fn down_interface_with_error_burst() {
    let fetcher = ScriptedFetcher::new(vec![
        Ok(vec![interface("Gi0/3", "down", 10)]),
        Ok(vec![interface("Gi0/3", "down", 16)]),
    ]);
    let engine = Engine::new(fetcher, EngineConfig::default()).unwrap();

    // First observation has no baseline for the error rate
    let first = engine.run_cycle_now().await;
    let kinds: Vec<AlertKind> = first.alerts.iter().map(|a| a.kind).collect();
    assert_eq!(kinds, vec![AlertKind::InterfaceDown]);

    let second = engine.run_cycle_now().await;
    let kinds: Vec<AlertKind> = second.alerts_for("Gi0/3").map(|a| a.kind).collect();
    assert_eq!(kinds, vec![AlertKind::InterfaceDown, AlertKind::HighErrorRate]);
    assert_eq!(
        second.entity("Gi0/3").unwrap().as_interface().unwrap().error_delta,
        Some(6)
    );
}

#[tokio::test]
async fn history_limit_change_keeps_newest() {
    let engine = Engine::new(counting_fetcher(), EngineConfig::default()).unwrap();
    engine
        .set_config(ConfigUpdate::new().history_limit(50))
        .await
        .unwrap();

    for _ in 0..60 {
        engine.run_cycle_now().await;
    }

    let history = engine.history("Gi0/0");
    assert_eq!(history.len(), 50);

    let errors: Vec<f64> = history
        .iter()
        .map(|p| p.get(Metric::ErrorCount).unwrap())
        .collect();
    let expected: Vec<f64> = (11..=60).map(|v| v as f64).collect();
    assert_eq!(errors, expected);
    assert!(history.windows(2).all(|w| w[0].timestamp_ms <= w[1].timestamp_ms));
}

#[tokio::test(start_paused = true)]
async fn scheduled_cycles_follow_interval() {
    let config = EngineConfig {
        interval_secs: 60,
        ..Default::default()
    };
    let engine = Engine::new(counting_fetcher(), config).unwrap();
    let mut updates = engine.subscribe();

    let started = tokio::time::Instant::now();
    engine.start();

    assert_eq!(updates.recv().await.unwrap().cycle, 1);
    assert_eq!(updates.recv().await.unwrap().cycle, 2);
    assert_eq!(updates.recv().await.unwrap().cycle, 3);
    assert!(started.elapsed() >= Duration::from_secs(120));

    engine.stop().await;
}

#[tokio::test(start_paused = true)]
async fn force_update_while_running() {
    let config = EngineConfig {
        interval_secs: 3600,
        ..Default::default()
    };
    let engine = Engine::new(counting_fetcher(), config).unwrap();
    let mut updates = engine.subscribe();

    engine.start();
    assert_eq!(updates.recv().await.unwrap().cycle, 1);

    engine.force_update();
    let forced = tokio::time::timeout(Duration::from_secs(10), updates.recv())
        .await
        .expect("forced cycle should not wait for the interval")
        .unwrap();
    assert_eq!(forced.cycle, 2);

    engine.stop().await;
}

#[tokio::test(start_paused = true)]
async fn forced_cycle_keeps_schedule() {
    let config = EngineConfig {
        interval_secs: 60,
        ..Default::default()
    };
    let engine = Engine::new(counting_fetcher(), config).unwrap();
    let mut updates = engine.subscribe();

    let started = tokio::time::Instant::now();
    engine.start();
    assert_eq!(updates.recv().await.unwrap().cycle, 1);

    tokio::time::sleep(Duration::from_secs(10)).await;
    engine.force_cycle();
    assert_eq!(updates.recv().await.unwrap().cycle, 2);
    assert!(started.elapsed() < Duration::from_secs(60));

    // Still due one interval after the first cycle, not after the forced one
    assert_eq!(updates.recv().await.unwrap().cycle, 3);
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(60) && elapsed < Duration::from_secs(70));

    engine.stop().await;
}

#[tokio::test(start_paused = true)]
async fn set_interval_applies_from_next_boundary() {
    let config = EngineConfig {
        interval_secs: 60,
        ..Default::default()
    };
    let engine = Engine::new(counting_fetcher(), config).unwrap();
    let mut updates = engine.subscribe();

    let started = tokio::time::Instant::now();
    engine.start();
    assert_eq!(updates.recv().await.unwrap().cycle, 1);

    tokio::time::sleep(Duration::from_secs(10)).await;
    engine.set_interval(10).unwrap();
    assert_eq!(engine.status().interval_secs, 10);

    // The pending wait was scheduled with the old interval
    assert_eq!(updates.recv().await.unwrap().cycle, 2);
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(60) && elapsed < Duration::from_secs(70));

    assert_eq!(updates.recv().await.unwrap().cycle, 3);
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(70) && elapsed < Duration::from_secs(80));

    engine.stop().await;
}

#[tokio::test(start_paused = true)]
async fn oversized_interval_rejected_and_loop_keeps_running() {
    let engine = Engine::new(counting_fetcher(), EngineConfig::default()).unwrap();

    assert!(engine
        .set_config(ConfigUpdate::new().interval_secs(u64::MAX))
        .await
        .is_err());
    assert!(engine.set_interval(u64::MAX).is_err());
    assert_eq!(engine.config().interval_secs, 60);

    let mut updates = engine.subscribe();
    engine.start();
    assert_eq!(updates.recv().await.unwrap().cycle, 1);
    assert_eq!(updates.recv().await.unwrap().cycle, 2);
    assert!(engine.status().running);

    engine.stop().await;
}

#[tokio::test(start_paused = true)]
async fn pending_force_does_not_survive_restart() {
    let config = EngineConfig {
        interval_secs: 3600,
        ..Default::default()
    };
    let engine = Engine::new(counting_fetcher(), config).unwrap();

    // The loop has not been polled yet, so the request is still pending at stop
    engine.start();
    engine.force_cycle();
    engine.stop().await;

    let mut updates = engine.subscribe();
    engine.start();
    assert_eq!(updates.recv().await.unwrap().cycle, 1);

    let extra = tokio::time::timeout(Duration::from_secs(100), updates.recv()).await;
    assert!(extra.is_err());

    engine.stop().await;
}

#[tokio::test]
async fn force_update_while_stopped() {
    let engine = Engine::new(counting_fetcher(), EngineConfig::default()).unwrap();
    let mut updates = engine.subscribe();

    engine.force_update();
    assert_eq!(updates.recv().await.unwrap().cycle, 1);
    assert!(!engine.status().running);
}

#[tokio::test]
async fn readers_see_previous_snapshot_during_slow_fetch() {
    let fetcher = Arc::new(GatedFetcher::default());
    let engine = Engine::with_fetcher(fetcher.clone(), EngineConfig::default()).unwrap();
    engine.run_cycle_now().await;

    fetcher.gated.store(true, Ordering::SeqCst);
    let background = engine.clone();
    let in_flight = tokio::spawn(async move { background.run_cycle_now().await });
    fetcher.entered.notified().await;

    // The second cycle is stuck in fetch; every read returns cycle 1
    for _ in 0..10 {
        let snapshot = engine.snapshot().unwrap();
        assert_eq!(snapshot.cycle, 1);
        assert!(engine.entity("Gi0/0").is_some());
        assert_eq!(engine.history("Gi0/0").len(), 1);
        tokio::task::yield_now().await;
    }

    fetcher.release.notify_one();
    let second = in_flight.await.unwrap();
    assert_eq!(second.cycle, 2);
    assert_eq!(engine.snapshot().unwrap().cycle, 2);
}

#[tokio::test(start_paused = true)]
async fn stop_during_in_flight_cycle() {
    let fetcher = Arc::new(GatedFetcher::default());
    fetcher.gated.store(true, Ordering::SeqCst);

    let config = EngineConfig {
        stop_timeout_secs: 1,
        ..Default::default()
    };
    let engine = Engine::with_fetcher(fetcher.clone(), config).unwrap();
    let mut updates = engine.subscribe();

    engine.start();
    fetcher.entered.notified().await;

    // Fetch still blocked: stop gives up waiting after the timeout
    assert!(engine.stop().await);
    assert!(!engine.status().running);
    assert!(engine.snapshot().is_none());

    // The in-flight cycle still completes and publishes a whole snapshot
    fetcher.release.notify_one();
    let snapshot = updates.recv().await.unwrap();
    assert_eq!(snapshot.cycle, 1);
    assert!(snapshot.fetch.ok);
    assert_eq!(snapshot.entities.len(), 1);
}

#[tokio::test]
async fn lagging_subscriber_skips_oldest() {
    let config = EngineConfig {
        subscriber_buffer: 2,
        ..Default::default()
    };
    let engine = Engine::new(counting_fetcher(), config).unwrap();
    let mut slow = engine.subscribe();

    for _ in 0..5 {
        engine.run_cycle_now().await;
    }

    assert_eq!(slow.poll(), Err(DeliveryError::Lagged(3)));
    assert_eq!(slow.poll().unwrap().unwrap().cycle, 4);
    assert_eq!(slow.poll().unwrap().unwrap().cycle, 5);
    assert_eq!(slow.poll().unwrap(), None);

    // The engine kept going regardless
    assert_eq!(engine.snapshot().unwrap().cycle, 5);
}

#[tokio::test]
async fn watch_holds_latest_only() {
    let engine = Engine::new(counting_fetcher(), EngineConfig::default()).unwrap();
    let watcher = engine.watch();
    assert!(watcher.borrow().is_none());

    engine.run_cycle_now().await;
    engine.run_cycle_now().await;

    let latest = watcher.borrow().clone().unwrap();
    assert_eq!(latest.cycle, 2);
}

#[tokio::test]
async fn synthetic_source_end_to_end() {
    let fetcher = SyntheticFetcher::builder().interfaces(3).devices(2).seed(11).build();
    let engine = Engine::new(fetcher, EngineConfig::default()).unwrap();

    engine.run_cycle_now().await;
    let snapshot = engine.run_cycle_now().await;

    assert_eq!(snapshot.entities.len(), 5);
    for id in ["GigabitEthernet0/0", "GigabitEthernet0/1", "GigabitEthernet0/2"] {
        let iface = snapshot.entity(id).unwrap().as_interface().unwrap();
        assert!(iface.bandwidth_pct.is_some());
        assert!(iface.error_delta.unwrap() <= 10);
        assert_eq!(snapshot.history(id).len(), 2);
    }
    let device_history = snapshot.history("00000000-0000-4000-8000-000000000001");
    assert_eq!(device_history.len(), 2);
    assert!(device_history[1].get(Metric::Reachability).is_some());
}
