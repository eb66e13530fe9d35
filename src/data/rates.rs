//! Per-cycle rates derived from cumulative interface counters.

use std::collections::{HashMap, HashSet};

use netwatch_types::{Entity, InterfaceCounters};

/// Link speed assumed when an interface does not report one.
const DEFAULT_SPEED_MBPS: u64 = 1000;

#[derive(Debug, Clone, Copy)]
struct Baseline {
    counters: InterfaceCounters,
    at_ms: u64,
}

/// Remembers the last counters seen per interface and fills in
/// `error_delta` and `bandwidth_pct` on the next observation.
///
/// A counter that went backwards is treated as a reset: the delta is the
/// current value.
#[derive(Debug, Default)]
pub struct CounterTracker {
    previous: HashMap<String, Baseline>,
}

impl CounterTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive rates for every interface entity, then drop baselines of
    /// interfaces that were not observed.
    pub fn apply(&mut self, entities: &mut [Entity]) {
        for entity in entities.iter_mut() {
            self.observe(entity);
        }
        let seen: HashSet<&str> = entities.iter().map(|e| e.id.as_str()).collect();
        self.previous.retain(|id, _| seen.contains(id.as_str()));
    }

    /// Derive rates for one entity. Devices and interfaces without counters
    /// are left untouched.
    pub fn observe(&mut self, entity: &mut Entity) {
        let at_ms = entity.last_updated_ms;
        let id = entity.id.clone();
        let Some(iface) = entity.as_interface_mut() else {
            return;
        };
        let Some(current) = iface.counters else {
            return;
        };

        if let Some(prev) = self.previous.get(&id) {
            iface.error_delta = Some(delta(prev.counters.total_errors(), current.total_errors()));

            if iface.bandwidth_pct.is_none() && at_ms > prev.at_ms {
                let octets = delta(prev.counters.total_octets(), current.total_octets());
                let elapsed_secs = (at_ms - prev.at_ms) as f64 / 1000.0;
                let speed = iface.speed_mbps.filter(|s| *s > 0).unwrap_or(DEFAULT_SPEED_MBPS);
                let pct = octets as f64 * 8.0 / elapsed_secs / (speed as f64 * 1e6) * 100.0;
                iface.bandwidth_pct = Some(pct.min(100.0));
            }
        }

        self.previous.insert(id, Baseline { counters: current, at_ms });
    }

    /// Number of interfaces with a baseline.
    pub fn len(&self) -> usize {
        self.previous.len()
    }

    pub fn is_empty(&self) -> bool {
        self.previous.is_empty()
    }
}

fn delta(previous: u64, current: u64) -> u64 {
    if current >= previous {
        current - previous
    } else {
        current
    }
}
