//! The polling loop and the work done in one cycle.

use std::collections::BTreeMap;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use netwatch_types::{now_ms, Entity, FetchStatus, Snapshot};
use tokio::sync::{watch, Notify};
use tracing::{debug, info, warn};

use super::Inner;
use crate::config::MAX_INTERVAL_SECS;
use crate::data::{evaluate, normalize_all};

/// Run cycles until stopped.
///
/// The first cycle runs immediately. After a scheduled cycle the next one is
/// due `interval` after it started; forced cycles run in between without
/// moving that deadline. The loop exits when stop is signalled or the engine
/// is dropped.
pub(super) async fn run_loop(inner: Weak<Inner>, force: Arc<Notify>, mut stop_rx: watch::Receiver<bool>) {
    let mut next_due = tokio::time::Instant::now();

    loop {
        tokio::select! {
            biased;

            _ = stop_rx.changed() => break,

            _ = tokio::time::sleep_until(next_due) => {
                let Some(inner) = inner.upgrade() else { break };
                let started = tokio::time::Instant::now();
                run_cycle(&inner).await;
                let interval = inner.config.read().interval();
                next_due = started
                    .checked_add(interval)
                    .unwrap_or_else(|| started + Duration::from_secs(MAX_INTERVAL_SECS));
            }

            _ = force.notified() => {
                let Some(inner) = inner.upgrade() else { break };
                debug!("running forced cycle");
                run_cycle(&inner).await;
            }
        }

        if *stop_rx.borrow() {
            break;
        }
    }

    debug!("polling loop exited");
}

/// Fetch, normalize, derive, evaluate, record and publish.
///
/// Holds the working-state lock for the whole cycle so cycles never overlap.
pub(super) async fn run_cycle(inner: &Inner) -> Arc<Snapshot> {
    let mut state = inner.state.lock().await;
    let config = inner.config.read().clone();
    if state.history.limit() != config.history_limit {
        state.history.set_limit(config.history_limit);
    }

    let started = Instant::now();
    let result = inner.fetcher.fetch().await;
    let now = now_ms();
    state.cycle += 1;

    let fetch = match result {
        Ok(records) => {
            let (normalized, skipped) = normalize_all(&records, now);

            let mut by_id: BTreeMap<String, Entity> = BTreeMap::new();
            for entity in normalized {
                if let Some(dup) = by_id.insert(entity.id.clone(), entity) {
                    debug!(id = %dup.id, "duplicate entity id, keeping the later record");
                }
            }

            let mut entities: Vec<Entity> = by_id.into_values().collect();
            state.tracker.apply(&mut entities);
            let alerts = evaluate(&entities, &config.thresholds, now);
            for entity in &entities {
                state.history.record(entity, now);
            }

            state.entities = entities.into_iter().map(|e| (e.id.clone(), e)).collect();
            state.alerts = alerts;

            FetchStatus {
                ok: true,
                error: None,
                skipped_records: skipped,
            }
        }
        Err(e) => {
            warn!(error = %e, source = inner.fetcher.description(), "fetch failed, keeping previous data");
            FetchStatus {
                ok: false,
                error: Some(e.to_string()),
                skipped_records: 0,
            }
        }
    };

    let snapshot = Arc::new(
        Snapshot::builder()
            .timestamp_ms(now)
            .cycle(state.cycle)
            .entities(state.entities.clone())
            .alerts(state.alerts.clone())
            .history(state.history.all())
            .fetch(fetch)
            .build(),
    );
    inner.publisher.publish(Arc::clone(&snapshot));

    info!(
        cycle = snapshot.cycle,
        ok = snapshot.fetch.ok,
        entities = snapshot.entities.len(),
        alerts = snapshot.alerts.len(),
        skipped = snapshot.fetch.skipped_records,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "cycle complete"
    );

    snapshot
}
