//! Time-series history points.

use std::collections::BTreeMap;

/// A metric tracked in an entity's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Metric {
    /// 1.0 when the device was reachable, 0.0 otherwise.
    Reachability,
    UptimeSecs,
    InterfaceCount,
    /// Link utilisation, 0-100.
    BandwidthPct,
    /// Cumulative error counter (in + out).
    ErrorCount,
}

/// One value of one metric series.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Sample {
    /// Position of the append that produced this sample; samples appended
    /// together share a sequence number.
    pub seq: u64,
    pub timestamp_ms: u64,
    pub value: f64,
}

/// All metric values recorded for one entity at one point in time.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HistoryPoint {
    pub timestamp_ms: u64,
    pub values: BTreeMap<Metric, f64>,
}

impl HistoryPoint {
    pub fn new(timestamp_ms: u64) -> Self {
        Self {
            timestamp_ms,
            values: BTreeMap::new(),
        }
    }

    pub fn get(&self, metric: Metric) -> Option<f64> {
        self.values.get(&metric).copied()
    }

    pub fn with(mut self, metric: Metric, value: f64) -> Self {
        self.values.insert(metric, value);
        self
    }
}
