//! Engine configuration.
//!
//! Configuration is layered: built-in defaults, an optional TOML file, then
//! `NETWATCH_*` environment variables (nested keys use `__`, e.g.
//! `NETWATCH_THRESHOLDS__BANDWIDTH_PCT=80`).
//!
//! ```toml
//! interval_secs = 60
//! history_limit = 1440
//!
//! [thresholds]
//! bandwidth_pct = 70.0
//! error_count = 5
//! min_uptime_secs = 300
//! ```

use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Polling interval used when none is configured.
pub const DEFAULT_INTERVAL_SECS: u64 = 60;
/// Longest accepted polling interval, one day.
pub const MAX_INTERVAL_SECS: u64 = 86_400;
/// One day of history at the default interval.
pub const DEFAULT_HISTORY_LIMIT: usize = 1440;

/// Thresholds for alert evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Link utilisation (percent) at or above which a warning is raised.
    pub bandwidth_pct: f64,
    /// Errors per cycle at or above which a warning is raised.
    pub error_count: u64,
    /// Uptime below this many seconds is reported as a recent reboot.
    pub min_uptime_secs: u64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            bandwidth_pct: 70.0,
            error_count: 5,
            min_uptime_secs: 300,
        }
    }
}

impl Thresholds {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.bandwidth_pct.is_finite() || self.bandwidth_pct <= 0.0 || self.bandwidth_pct > 100.0 {
            return Err(ConfigError::InvalidThreshold {
                name: "bandwidth_pct",
                reason: format!("must be in (0, 100], got {}", self.bandwidth_pct),
            });
        }
        if self.error_count == 0 {
            return Err(ConfigError::InvalidThreshold {
                name: "error_count",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Full engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub interval_secs: u64,
    /// Maximum points kept per history series.
    pub history_limit: usize,
    pub thresholds: Thresholds,
    /// How long `stop()` waits for an in-flight cycle.
    pub stop_timeout_secs: u64,
    /// Snapshots buffered per push subscriber before the oldest are dropped.
    pub subscriber_buffer: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_INTERVAL_SECS,
            history_limit: DEFAULT_HISTORY_LIMIT,
            thresholds: Thresholds::default(),
            stop_timeout_secs: 5,
            subscriber_buffer: 16,
        }
    }
}

impl EngineConfig {
    /// Load configuration from defaults, an optional file and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        let config = builder
            .add_source(
                Environment::with_prefix("NETWATCH")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let parsed: EngineConfig = config.try_deserialize()?;
        parsed.validate()?;
        Ok(parsed)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval_secs == 0 || self.interval_secs > MAX_INTERVAL_SECS {
            return Err(ConfigError::InvalidInterval(self.interval_secs));
        }
        if self.history_limit == 0 {
            return Err(ConfigError::InvalidHistoryLimit(self.history_limit));
        }
        if self.stop_timeout_secs == 0 {
            return Err(ConfigError::InvalidSetting {
                name: "stop_timeout_secs",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.subscriber_buffer == 0 {
            return Err(ConfigError::InvalidSetting {
                name: "subscriber_buffer",
                reason: "must be at least 1".to_string(),
            });
        }
        self.thresholds.validate()
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_secs(self.stop_timeout_secs)
    }

    /// Merge a partial update into a copy of this config and validate it.
    ///
    /// On error `self` is untouched, so the caller keeps the previous config.
    pub fn merged(&self, update: &ConfigUpdate) -> Result<Self, ConfigError> {
        let mut next = self.clone();
        if let Some(v) = update.interval_secs {
            next.interval_secs = v;
        }
        if let Some(v) = update.history_limit {
            next.history_limit = v;
        }
        if let Some(v) = update.bandwidth_pct {
            next.thresholds.bandwidth_pct = v;
        }
        if let Some(v) = update.error_count {
            next.thresholds.error_count = v;
        }
        if let Some(v) = update.min_uptime_secs {
            next.thresholds.min_uptime_secs = v;
        }
        next.validate()?;
        Ok(next)
    }
}

/// A partial configuration change.
///
/// Unset fields keep their current value. `running` starts or stops the
/// polling loop.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigUpdate {
    pub interval_secs: Option<u64>,
    pub history_limit: Option<usize>,
    pub bandwidth_pct: Option<f64>,
    pub error_count: Option<u64>,
    pub min_uptime_secs: Option<u64>,
    pub running: Option<bool>,
}

impl ConfigUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn interval_secs(mut self, secs: u64) -> Self {
        self.interval_secs = Some(secs);
        self
    }

    pub fn history_limit(mut self, limit: usize) -> Self {
        self.history_limit = Some(limit);
        self
    }

    pub fn bandwidth_pct(mut self, pct: f64) -> Self {
        self.bandwidth_pct = Some(pct);
        self
    }

    pub fn error_count(mut self, count: u64) -> Self {
        self.error_count = Some(count);
        self
    }

    pub fn min_uptime_secs(mut self, secs: u64) -> Self {
        self.min_uptime_secs = Some(secs);
        self
    }

    pub fn running(mut self, running: bool) -> Self {
        self.running = Some(running);
        self
    }
}

/// Externally visible configuration and run state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonitorConfig {
    pub interval_secs: u64,
    pub history_limit: usize,
    pub thresholds: Thresholds,
    pub running: bool,
}
