//! # netwatch-types
//!
//! Core types for network element monitoring. This crate defines the canonical
//! shapes the netwatch engine works with once raw transport data has been
//! normalized, and the immutable snapshot it hands to consumers.
//!
//! ## Design Goals
//!
//! - **No required dependencies**: the model works without a serialization framework
//! - **Optional serialization**: enable the `serde` feature for JSON export
//! - **Transport agnostic**: devices from an inventory API and interfaces from
//!   RESTCONF share one [`Entity`] type with kind-specific [`EntityDetails`]
//! - **Versioned schema**: snapshots carry a [`SchemaVersion`]
//!
//! ## Example
//!
//! ```rust
//! use netwatch_types::{Entity, InterfaceDetails, OperStatus, Snapshot};
//!
//! let uplink = Entity::interface("Gi0/1", OperStatus::Up, InterfaceDetails::default());
//!
//! let snapshot = Snapshot::builder()
//!     .timestamp_ms(1_700_000_000_000)
//!     .entity(uplink)
//!     .build();
//!
//! assert_eq!(snapshot.entities.len(), 1);
//! assert!(snapshot.entity("Gi0/1").is_some());
//! ```

mod alert;
mod entity;
mod history;
mod snapshot;
mod version;

pub use alert::*;
pub use entity::*;
pub use history::*;
pub use snapshot::*;
pub use version::*;

/// Current schema version.
///
/// Increment this when making breaking changes to the snapshot format.
pub const SCHEMA_VERSION: u32 = 1;

/// Milliseconds since the Unix epoch, or 0 if the clock is before it.
pub fn now_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
