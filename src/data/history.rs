//! Bounded per-entity metric history.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use netwatch_types::{Entity, EntityDetails, HistoryPoint, Metric, OperStatus, Sample};

use super::uptime::parse_uptime;

/// Tracks metric series per entity for trending.
///
/// Every metric of every entity is its own FIFO series capped at `limit`
/// samples. Samples appended together share a sequence number so they can
/// be merged back into [`HistoryPoint`]s.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    series: HashMap<String, BTreeMap<Metric, VecDeque<Sample>>>,
    limit: usize,
    next_seq: u64,
}

impl HistoryStore {
    /// Create an empty store keeping at most `limit` samples per series.
    pub fn new(limit: usize) -> Self {
        Self {
            series: HashMap::new(),
            limit: limit.max(1),
            next_seq: 0,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Change the cap; longer series are trimmed right away.
    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit.max(1);
        for metrics in self.series.values_mut() {
            for samples in metrics.values_mut() {
                while samples.len() > self.limit {
                    samples.pop_front();
                }
            }
        }
    }

    /// Record one sample per metric for an entity.
    pub fn append<I>(&mut self, entity_id: &str, timestamp_ms: u64, metrics: I)
    where
        I: IntoIterator<Item = (Metric, f64)>,
    {
        let seq = self.next_seq;
        self.next_seq += 1;

        let entry = self.series.entry(entity_id.to_string()).or_default();
        for (metric, value) in metrics {
            let samples = entry.entry(metric).or_default();
            samples.push_back(Sample {
                seq,
                timestamp_ms,
                value,
            });
            if samples.len() > self.limit {
                samples.pop_front();
            }
        }
    }

    /// Record the standard metrics of an entity.
    pub fn record(&mut self, entity: &Entity, timestamp_ms: u64) {
        let metrics = entity_metrics(entity);
        if !metrics.is_empty() {
            self.append(&entity.id, timestamp_ms, metrics);
        }
    }

    /// Merged history of an entity, oldest first and at most `limit` points.
    ///
    /// Returns an empty Vec for unknown ids.
    pub fn get(&self, entity_id: &str) -> Vec<HistoryPoint> {
        let Some(metrics) = self.series.get(entity_id) else {
            return Vec::new();
        };

        let mut merged: BTreeMap<u64, HistoryPoint> = BTreeMap::new();
        for (metric, samples) in metrics {
            for sample in samples {
                merged
                    .entry(sample.seq)
                    .or_insert_with(|| HistoryPoint::new(sample.timestamp_ms))
                    .values
                    .insert(*metric, sample.value);
            }
        }

        let skip = merged.len().saturating_sub(self.limit);
        merged.into_values().skip(skip).collect()
    }

    /// Samples of a single metric, oldest first.
    pub fn series(&self, entity_id: &str, metric: Metric) -> Vec<Sample> {
        self.series
            .get(entity_id)
            .and_then(|m| m.get(&metric))
            .map(|s| s.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Merged history of every entity.
    pub fn all(&self) -> BTreeMap<String, Vec<HistoryPoint>> {
        self.series.keys().map(|id| (id.clone(), self.get(id))).collect()
    }

    /// Drop the history of entities not in `ids`.
    pub fn retain<'a, I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let keep: HashSet<&str> = ids.into_iter().collect();
        self.series.retain(|id, _| keep.contains(id.as_str()));
    }

    /// Number of entities with history.
    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// Metrics recorded for an entity each cycle.
///
/// Devices: reachability, uptime (when it parses) and interface count.
/// Interfaces: bandwidth (when known) and the cumulative error counter.
pub fn entity_metrics(entity: &Entity) -> Vec<(Metric, f64)> {
    let mut metrics = Vec::new();
    match &entity.details {
        EntityDetails::Device(device) => {
            let reachable = if entity.status == OperStatus::Reachable { 1.0 } else { 0.0 };
            metrics.push((Metric::Reachability, reachable));
            if let Ok(uptime) = parse_uptime(&device.uptime) {
                metrics.push((Metric::UptimeSecs, uptime.as_secs_f64()));
            }
            metrics.push((Metric::InterfaceCount, device.interface_count as f64));
        }
        EntityDetails::Interface(iface) => {
            if let Some(pct) = iface.bandwidth_pct {
                metrics.push((Metric::BandwidthPct, pct));
            }
            if let Some(counters) = iface.counters {
                metrics.push((Metric::ErrorCount, counters.total_errors() as f64));
            }
        }
    }
    metrics
}

#[cfg(test)]
mod tests {
    use super::*;
    use netwatch_types::{DeviceDetails, InterfaceCounters, InterfaceDetails};

    fn append_bw(store: &mut HistoryStore, id: &str, ts: u64) {
        store.append(id, ts, [(Metric::BandwidthPct, ts as f64)]);
    }

    #[test]
    fn test_history_new() {
        let store = HistoryStore::new(10);
        assert!(store.is_empty());
        assert_eq!(store.limit(), 10);
        assert!(store.get("missing").is_empty());
        assert!(store.series("missing", Metric::ErrorCount).is_empty());
    }

    #[test]
    fn test_history_limit() {
        let mut store = HistoryStore::new(5);
        for i in 0..8 {
            append_bw(&mut store, "Gi0/0", i);
        }

        let points = store.get("Gi0/0");
        assert_eq!(points.len(), 5);
        // Oldest three evicted, order preserved
        let stamps: Vec<u64> = points.iter().map(|p| p.timestamp_ms).collect();
        assert_eq!(stamps, vec![3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_set_limit_trims_immediately() {
        let mut store = HistoryStore::new(100);
        for i in 0..60 {
            append_bw(&mut store, "Gi0/0", i);
        }

        store.set_limit(50);
        let points = store.get("Gi0/0");
        assert_eq!(points.len(), 50);
        assert_eq!(points[0].timestamp_ms, 10);
        assert_eq!(points[49].timestamp_ms, 59);
        assert_eq!(store.series("Gi0/0", Metric::BandwidthPct).len(), 50);
    }

    #[test]
    fn test_merge_by_append() {
        let mut store = HistoryStore::new(10);
        store.append("Gi0/0", 1, [(Metric::ErrorCount, 0.0)]);
        store.append("Gi0/0", 2, [(Metric::ErrorCount, 3.0), (Metric::BandwidthPct, 40.0)]);

        let points = store.get("Gi0/0");
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].get(Metric::BandwidthPct), None);
        assert_eq!(points[1].get(Metric::ErrorCount), Some(3.0));
        assert_eq!(points[1].get(Metric::BandwidthPct), Some(40.0));
    }

    #[test]
    fn test_merged_points_never_exceed_limit() {
        let mut store = HistoryStore::new(2);
        store.append("x", 1, [(Metric::ErrorCount, 1.0)]);
        store.append("x", 2, [(Metric::ErrorCount, 2.0)]);
        store.append("x", 3, [(Metric::BandwidthPct, 3.0)]);

        let points = store.get("x");
        assert_eq!(points.len(), 2);
        assert_eq!(points[1].timestamp_ms, 3);
    }

    #[test]
    fn test_entities_are_independent() {
        let mut store = HistoryStore::new(3);
        for i in 0..5 {
            append_bw(&mut store, "a", i);
        }
        append_bw(&mut store, "b", 100);

        assert_eq!(store.get("a").len(), 3);
        assert_eq!(store.get("b").len(), 1);
        assert_eq!(store.all().len(), 2);
    }

    #[test]
    fn test_retain() {
        let mut store = HistoryStore::new(3);
        append_bw(&mut store, "a", 1);
        append_bw(&mut store, "b", 1);

        store.retain(["b"]);
        assert!(store.get("a").is_empty());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_device_metrics() {
        let dev = Entity::device(
            "d1",
            OperStatus::Unreachable,
            DeviceDetails {
                uptime: "0:10:00".to_string(),
                interface_count: 24,
                ..Default::default()
            },
        );
        let metrics = entity_metrics(&dev);
        assert_eq!(
            metrics,
            vec![
                (Metric::Reachability, 0.0),
                (Metric::UptimeSecs, 600.0),
                (Metric::InterfaceCount, 24.0)
            ]
        );
    }

    #[test]
    fn test_interface_metrics() {
        let iface = Entity::interface(
            "Gi0/0",
            OperStatus::Up,
            InterfaceDetails {
                counters: Some(InterfaceCounters {
                    in_errors: 2,
                    out_errors: 3,
                    ..Default::default()
                }),
                ..Default::default()
            },
        );
        assert_eq!(entity_metrics(&iface), vec![(Metric::ErrorCount, 5.0)]);

        let mut store = HistoryStore::new(5);
        store.record(&iface, 9);
        assert_eq!(store.series("Gi0/0", Metric::ErrorCount)[0].timestamp_ms, 9);
    }
}
