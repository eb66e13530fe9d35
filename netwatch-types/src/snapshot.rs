//! Snapshot - a point-in-time view of the monitored network.

use std::collections::BTreeMap;

use crate::{Alert, Entity, HistoryPoint, SchemaVersion, Severity};

/// Outcome of the fetch that fed a cycle.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FetchStatus {
    /// False when the fetch failed and the entities are carried over from an
    /// earlier cycle.
    pub ok: bool,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none", default))]
    pub error: Option<String>,
    /// Records dropped because they could not be identified.
    pub skipped_records: usize,
}

/// Immutable state of the engine as of the end of one cycle.
///
/// Snapshots are built once per cycle and handed out behind an `Arc`; nothing
/// mutates them after publication.
///
/// # Example
///
/// ```rust
/// use netwatch_types::{DeviceDetails, Entity, OperStatus, Snapshot};
///
/// let snapshot = Snapshot::builder()
///     .entity(Entity::device("core-1", OperStatus::Reachable, DeviceDetails::default()))
///     .build();
///
/// assert!(snapshot.alerts.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Snapshot {
    pub version: SchemaVersion,
    /// Unix timestamp in milliseconds when the cycle finished.
    pub timestamp_ms: u64,
    /// Number of cycles run so far, including this one.
    pub cycle: u64,
    pub entities: BTreeMap<String, Entity>,
    pub alerts: Vec<Alert>,
    pub history: BTreeMap<String, Vec<HistoryPoint>>,
    pub fetch: FetchStatus,
}

impl Snapshot {
    pub fn builder() -> SnapshotBuilder {
        SnapshotBuilder::new()
    }

    pub fn entity(&self, id: &str) -> Option<&Entity> {
        self.entities.get(id)
    }

    /// History for an entity, empty when the id is unknown.
    pub fn history(&self, id: &str) -> &[HistoryPoint] {
        self.history.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Alerts raised for one entity.
    pub fn alerts_for<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Alert> + 'a {
        self.alerts.iter().filter(move |a| a.entity_id.as_deref() == Some(id))
    }

    /// Count of alerts at the given severity.
    pub fn count_severity(&self, severity: Severity) -> usize {
        self.alerts.iter().filter(|a| a.severity == severity).count()
    }

    /// Entities whose status counts as healthy for their kind.
    pub fn operational_count(&self) -> usize {
        self.entities.values().filter(|e| e.is_operational()).count()
    }
}

/// Builder for constructing `Snapshot` instances.
#[derive(Debug, Default)]
pub struct SnapshotBuilder {
    timestamp_ms: Option<u64>,
    cycle: u64,
    entities: BTreeMap<String, Entity>,
    alerts: Vec<Alert>,
    history: BTreeMap<String, Vec<HistoryPoint>>,
    fetch: Option<FetchStatus>,
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a specific timestamp (milliseconds since Unix epoch).
    pub fn timestamp_ms(mut self, ts: u64) -> Self {
        self.timestamp_ms = Some(ts);
        self
    }

    pub fn cycle(mut self, cycle: u64) -> Self {
        self.cycle = cycle;
        self
    }

    pub fn entity(mut self, entity: Entity) -> Self {
        self.entities.insert(entity.id.clone(), entity);
        self
    }

    pub fn entities(mut self, entities: BTreeMap<String, Entity>) -> Self {
        self.entities = entities;
        self
    }

    pub fn alerts(mut self, alerts: Vec<Alert>) -> Self {
        self.alerts = alerts;
        self
    }

    pub fn history(mut self, history: BTreeMap<String, Vec<HistoryPoint>>) -> Self {
        self.history = history;
        self
    }

    pub fn fetch(mut self, fetch: FetchStatus) -> Self {
        self.fetch = Some(fetch);
        self
    }

    pub fn build(self) -> Snapshot {
        Snapshot {
            version: SchemaVersion::current(),
            timestamp_ms: self.timestamp_ms.unwrap_or_else(crate::now_ms),
            cycle: self.cycle,
            entities: self.entities,
            alerts: self.alerts,
            history: self.history,
            fetch: self.fetch.unwrap_or(FetchStatus {
                ok: true,
                error: None,
                skipped_records: 0,
            }),
        }
    }
}
