//! The monitoring engine: scheduling, cycle state and the read/control surface.
//!
//! An [`Engine`] is a cheap, cloneable handle. One background task runs the
//! polling cycles; everything readers see comes from the last published
//! [`Snapshot`], so a slow fetch never blocks a read.
//!
//! ```no_run
//! use netwatch::{Engine, EngineConfig};
//! use netwatch::source::SyntheticFetcher;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = Engine::new(SyntheticFetcher::builder().build(), EngineConfig::default())?;
//! engine.start();
//!
//! let mut updates = engine.subscribe();
//! let snapshot = updates.recv().await?;
//! println!("{} entities, {} alerts", snapshot.entities.len(), snapshot.alerts.len());
//!
//! engine.stop().await;
//! # Ok(())
//! # }
//! ```

mod publisher;
mod scheduler;

pub use publisher::{SnapshotPublisher, Subscription};

use std::collections::BTreeMap;
use std::sync::Arc;

use netwatch_types::{Alert, Entity, HistoryPoint, Snapshot};
use parking_lot::{Mutex, RwLock};
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::{ConfigUpdate, EngineConfig, MonitorConfig};
use crate::data::{CounterTracker, HistoryStore};
use crate::error::ConfigError;
use crate::source::Fetcher;

/// Run state reported by [`Engine::status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineStatus {
    pub running: bool,
    pub interval_secs: u64,
}

/// Working state owned by whichever cycle holds the lock.
#[derive(Debug)]
struct CycleState {
    history: HistoryStore,
    tracker: CounterTracker,
    entities: BTreeMap<String, Entity>,
    alerts: Vec<Alert>,
    cycle: u64,
}

#[derive(Debug)]
struct WorkerHandle {
    stop_tx: watch::Sender<bool>,
    /// Forced-cycle requests for this loop only; dropped with it on stop.
    force: Arc<Notify>,
    join: JoinHandle<()>,
}

#[derive(Debug)]
struct Inner {
    fetcher: Arc<dyn Fetcher>,
    config: RwLock<EngineConfig>,
    publisher: SnapshotPublisher,
    state: tokio::sync::Mutex<CycleState>,
    worker: Mutex<Option<WorkerHandle>>,
}

/// Handle to a monitoring engine.
///
/// Methods that spawn work (`start`, `force_update`) must be called from
/// within a tokio runtime.
#[derive(Debug, Clone)]
pub struct Engine {
    inner: Arc<Inner>,
}

impl Engine {
    /// Create an engine around a fetcher. The polling loop is not started.
    pub fn new<F>(fetcher: F, config: EngineConfig) -> Result<Self, ConfigError>
    where
        F: Fetcher + 'static,
    {
        Self::with_fetcher(Arc::new(fetcher), config)
    }

    /// Like [`Engine::new`] for an already shared fetcher.
    pub fn with_fetcher(fetcher: Arc<dyn Fetcher>, config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let state = CycleState {
            history: HistoryStore::new(config.history_limit),
            tracker: CounterTracker::new(),
            entities: BTreeMap::new(),
            alerts: Vec::new(),
            cycle: 0,
        };

        Ok(Self {
            inner: Arc::new(Inner {
                fetcher,
                publisher: SnapshotPublisher::new(config.subscriber_buffer),
                config: RwLock::new(config),
                state: tokio::sync::Mutex::new(state),
                worker: Mutex::new(None),
            }),
        })
    }

    /// Start the polling loop. Returns false if it was already running.
    pub fn start(&self) -> bool {
        let mut worker = self.inner.worker.lock();
        if worker.as_ref().is_some_and(|w| !w.join.is_finished()) {
            return false;
        }

        let (stop_tx, stop_rx) = watch::channel(false);
        let force = Arc::new(Notify::new());
        let join = tokio::spawn(scheduler::run_loop(
            Arc::downgrade(&self.inner),
            Arc::clone(&force),
            stop_rx,
        ));
        *worker = Some(WorkerHandle { stop_tx, force, join });
        drop(worker);

        info!(
            interval_secs = self.inner.config.read().interval_secs,
            source = self.inner.fetcher.description(),
            "monitoring started"
        );
        true
    }

    /// Stop the polling loop.
    ///
    /// Waits up to `stop_timeout_secs` for an in-flight cycle to finish; a
    /// cycle still running after that completes in the background. Returns
    /// false if the loop was not running.
    pub async fn stop(&self) -> bool {
        let handle = self.inner.worker.lock().take();
        let Some(handle) = handle else {
            return false;
        };

        // Send fails only if the loop already exited
        let _ = handle.stop_tx.send(true);
        let timeout = self.inner.config.read().stop_timeout();

        match tokio::time::timeout(timeout, handle.join).await {
            Ok(Ok(())) => info!("monitoring stopped"),
            Ok(Err(e)) => warn!(error = %e, "polling task ended abnormally"),
            Err(_) => warn!(
                timeout_secs = timeout.as_secs(),
                "cycle still in flight after stop timeout, leaving it to finish"
            ),
        }
        true
    }

    pub fn status(&self) -> EngineStatus {
        EngineStatus {
            running: self.is_running(),
            interval_secs: self.inner.config.read().interval_secs,
        }
    }

    pub fn is_running(&self) -> bool {
        self.inner
            .worker
            .lock()
            .as_ref()
            .is_some_and(|w| !w.join.is_finished())
    }

    /// Change the polling interval, effective from the next cycle boundary.
    pub fn set_interval(&self, secs: u64) -> Result<(), ConfigError> {
        let mut config = self.inner.config.write();
        *config = config.merged(&ConfigUpdate::new().interval_secs(secs))?;
        Ok(())
    }

    /// Request an out-of-band cycle without waiting for it.
    ///
    /// Same as [`Engine::force_cycle`].
    pub fn force_update(&self) {
        self.force_cycle();
    }

    /// Request an out-of-band cycle.
    ///
    /// While running, the cycle happens as soon as the current one finishes
    /// and the periodic schedule is unchanged. While stopped, a single cycle
    /// is spawned.
    pub fn force_cycle(&self) {
        let worker = self.inner.worker.lock();
        if let Some(w) = worker.as_ref().filter(|w| !w.join.is_finished()) {
            w.force.notify_one();
            return;
        }
        drop(worker);

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            scheduler::run_cycle(&inner).await;
        });
    }

    /// Run one cycle now and return its snapshot.
    ///
    /// Waits for any cycle in progress to finish first.
    pub async fn run_cycle_now(&self) -> Arc<Snapshot> {
        scheduler::run_cycle(&self.inner).await
    }

    /// Latest snapshot, or `None` before the first cycle completes.
    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.inner.publisher.current()
    }

    pub fn entity(&self, id: &str) -> Option<Entity> {
        self.snapshot()?.entity(id).cloned()
    }

    /// History of an entity, oldest first. Empty if unknown.
    pub fn history(&self, id: &str) -> Vec<HistoryPoint> {
        self.snapshot()
            .map(|s| s.history(id).to_vec())
            .unwrap_or_default()
    }

    /// Alerts from the latest cycle.
    pub fn alerts(&self) -> Vec<Alert> {
        self.snapshot().map(|s| s.alerts.clone()).unwrap_or_default()
    }

    pub fn config(&self) -> MonitorConfig {
        let running = self.is_running();
        let config = self.inner.config.read();
        MonitorConfig {
            interval_secs: config.interval_secs,
            history_limit: config.history_limit,
            thresholds: config.thresholds.clone(),
            running,
        }
    }

    /// Apply a partial configuration change.
    ///
    /// Values take effect at the next cycle boundary. An invalid update is
    /// rejected as a whole and the previous configuration stays. `running`
    /// starts or stops the loop.
    pub async fn set_config(&self, update: ConfigUpdate) -> Result<MonitorConfig, ConfigError> {
        {
            let mut config = self.inner.config.write();
            *config = config.merged(&update)?;
        }
        info!(?update, "configuration updated");

        match update.running {
            Some(true) => {
                self.start();
            }
            Some(false) => {
                self.stop().await;
            }
            None => {}
        }

        Ok(self.config())
    }

    /// Subscribe to every snapshot published from now on.
    pub fn subscribe(&self) -> Subscription {
        self.inner.publisher.subscribe()
    }

    /// Receiver holding only the newest snapshot.
    pub fn watch(&self) -> watch::Receiver<Option<Arc<Snapshot>>> {
        self.inner.publisher.watch()
    }

    pub fn source_description(&self) -> &str {
        self.inner.fetcher.description()
    }
}
