//! Snapshot publication.
//!
//! The latest snapshot lives in a tokio watch channel so readers always see a
//! complete cycle. Push subscribers get every snapshot through a bounded
//! broadcast channel; a subscriber that falls behind loses the oldest ones
//! and the producer never waits.

use std::sync::Arc;

use netwatch_types::Snapshot;
use tokio::sync::{broadcast, watch};

use crate::error::DeliveryError;

/// Single-writer publisher of immutable snapshots.
#[derive(Debug)]
pub struct SnapshotPublisher {
    latest: watch::Sender<Option<Arc<Snapshot>>>,
    fanout: broadcast::Sender<Arc<Snapshot>>,
}

impl SnapshotPublisher {
    /// Create a publisher buffering up to `buffer` snapshots per subscriber.
    pub fn new(buffer: usize) -> Self {
        let (latest, _) = watch::channel(None);
        let (fanout, _) = broadcast::channel(buffer.max(1));
        Self { latest, fanout }
    }

    /// Replace the current snapshot and notify subscribers.
    pub fn publish(&self, snapshot: Arc<Snapshot>) {
        self.latest.send_replace(Some(Arc::clone(&snapshot)));
        // No subscribers is fine
        let _ = self.fanout.send(snapshot);
    }

    /// The most recent snapshot, or `None` before the first cycle.
    pub fn current(&self) -> Option<Arc<Snapshot>> {
        self.latest.borrow().clone()
    }

    /// Subscribe to every snapshot published from now on.
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            receiver: self.fanout.subscribe(),
        }
    }

    /// Receiver that only ever holds the newest snapshot.
    pub fn watch(&self) -> watch::Receiver<Option<Arc<Snapshot>>> {
        self.latest.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.fanout.receiver_count()
    }
}

/// A push subscription to published snapshots.
///
/// # Example
///
/// ```no_run
/// # async fn run(engine: netwatch::Engine) {
/// let mut sub = engine.subscribe();
/// while let Ok(snapshot) = sub.recv().await {
///     println!("cycle {}: {} alerts", snapshot.cycle, snapshot.alerts.len());
/// }
/// # }
/// ```
#[derive(Debug)]
pub struct Subscription {
    receiver: broadcast::Receiver<Arc<Snapshot>>,
}

impl Subscription {
    /// Wait for the next snapshot.
    ///
    /// After a [`DeliveryError::Lagged`] the next call continues with the
    /// oldest snapshot still buffered.
    pub async fn recv(&mut self) -> Result<Arc<Snapshot>, DeliveryError> {
        self.receiver.recv().await.map_err(|e| match e {
            broadcast::error::RecvError::Lagged(n) => DeliveryError::Lagged(n),
            broadcast::error::RecvError::Closed => DeliveryError::Closed,
        })
    }

    /// Take the next snapshot without waiting; `Ok(None)` if none is pending.
    pub fn poll(&mut self) -> Result<Option<Arc<Snapshot>>, DeliveryError> {
        match self.receiver.try_recv() {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(broadcast::error::TryRecvError::Empty) => Ok(None),
            Err(broadcast::error::TryRecvError::Lagged(n)) => Err(DeliveryError::Lagged(n)),
            Err(broadcast::error::TryRecvError::Closed) => Err(DeliveryError::Closed),
        }
    }
}
