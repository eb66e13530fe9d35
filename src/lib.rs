//! # netwatch
//!
//! A polling monitor for network devices and interfaces.
//!
//! On a fixed interval the engine fetches raw records from the network (an
//! inventory API, RESTCONF, or a synthetic generator), normalizes them into
//! canonical entities, derives per-cycle rates, evaluates threshold alerts,
//! appends to a bounded history and publishes an immutable snapshot.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                           Engine                             │
//! │  ┌─────────┐    ┌────────────┐    ┌──────────┐    ┌───────┐ │
//! │  │ source  │───▶│    data    │───▶│ snapshot │───▶│readers│ │
//! │  │ (fetch) │    │(normalize, │    │ (publish)│    │ & subs│ │
//! │  └─────────┘    │ rates,     │    └──────────┘    └───────┘ │
//! │       ▲         │ alerts,    │                               │
//! │       │         │ history)   │                               │
//! │  scheduler      └────────────┘                               │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`source`]**: The [`Fetcher`] trait with DNA Center, RESTCONF,
//!   synthetic and closure-backed implementations
//! - **[`data`]**: Normalization, counter rates, alert rules and history
//! - **[`engine`]**: The [`Engine`] handle: scheduling, cycles, publication
//! - **[`config`]**: [`EngineConfig`] and [`Thresholds`], loadable from file
//!   and environment
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Synthetic data, one poll every 5 seconds
//! netwatch --source synthetic --interval 5
//!
//! # DNA Center inventory, single cycle printed as JSON
//! netwatch --source dnac --url https://10.10.20.85 --token "$TOKEN" --insecure --once
//! ```
//!
//! ### As a library
//!
//! ```
//! use netwatch::{Engine, EngineConfig};
//! use netwatch::source::SyntheticFetcher;
//!
//! # tokio_test::block_on(async {
//! let fetcher = SyntheticFetcher::builder().interfaces(2).seed(1).build();
//! let engine = Engine::new(fetcher, EngineConfig::default()).unwrap();
//!
//! let snapshot = engine.run_cycle_now().await;
//! assert_eq!(snapshot.entities.len(), 2);
//! assert!(engine.entity("GigabitEthernet0/0").is_some());
//! # });
//! ```

pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod source;

// Re-export main types for convenience
pub use config::{ConfigUpdate, EngineConfig, MonitorConfig, Thresholds};
pub use engine::{Engine, EngineStatus, SnapshotPublisher, Subscription};
pub use error::{ConfigError, DeliveryError, FetchError, ParseError};
pub use source::{Fetcher, FnFetcher, RawRecord, SyntheticFetcher};

pub use netwatch_types::{
    Alert, AlertKind, DeviceDetails, Entity, EntityDetails, EntityKind, FetchStatus, HistoryPoint,
    InterfaceCounters, InterfaceDetails, IpAssignment, Metric, OperStatus, Sample, SchemaVersion,
    Severity, Snapshot,
};
