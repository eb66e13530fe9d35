//! Fetcher abstraction for pulling raw element records.
//!
//! The engine does not know how records are obtained. A [`Fetcher`] returns a
//! list of loosely-typed [`RawRecord`]s (JSON objects as the transport
//! delivered them) or a [`FetchError`]; the normalizer turns records into
//! canonical entities.
//!
//! Implementations:
//!
//! - [`SyntheticFetcher`]: generated interfaces and devices, for demos and tests
//! - [`FnFetcher`]: wraps any closure
//! - `DnacFetcher` (`http` feature): DNA Center network-device inventory
//! - `RestconfFetcher` (`http` feature): RESTCONF `ietf-interfaces` plus statistics

mod synthetic;

#[cfg(feature = "http")]
mod dnac;
#[cfg(feature = "http")]
mod restconf;

pub use synthetic::{SyntheticFetcher, SyntheticFetcherBuilder};

#[cfg(feature = "http")]
pub use dnac::{DnacFetcher, DnacFetcherBuilder};
#[cfg(feature = "http")]
pub use restconf::{RestconfFetcher, RestconfFetcherBuilder};

use std::fmt::{self, Debug};

use async_trait::async_trait;
use netwatch_types::EntityKind;
use serde_json::Value;

use crate::error::FetchError;

/// One element as delivered by the transport, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    /// What the fetcher asked for; decides which normalizer applies.
    pub kind: EntityKind,
    /// Expected to be a JSON object; anything else is rejected per record.
    pub fields: Value,
}

impl RawRecord {
    pub fn device(fields: Value) -> Self {
        Self {
            kind: EntityKind::Device,
            fields,
        }
    }

    pub fn interface(fields: Value) -> Self {
        Self {
            kind: EntityKind::Interface,
            fields,
        }
    }
}

/// Trait for fetching raw records from the monitored network.
///
/// `fetch` may block on network I/O; the engine calls it from its background
/// worker only, never while holding a lock readers need.
#[async_trait]
pub trait Fetcher: Send + Sync + Debug {
    /// Fetch the current records. An `Err` is a transient failure: the engine
    /// keeps the previous entities and tries again next cycle.
    async fn fetch(&self) -> Result<Vec<RawRecord>, FetchError>;

    /// Returns a human-readable description of the source.
    fn description(&self) -> &str;
}

/// A fetcher backed by a closure.
///
/// # Example
///
/// ```
/// use netwatch::source::{FnFetcher, RawRecord};
/// use serde_json::json;
///
/// let fetcher = FnFetcher::new("static", || {
///     Ok(vec![RawRecord::interface(json!({"name": "Gi0/0", "oper-status": "up"}))])
/// });
/// ```
pub struct FnFetcher<F> {
    f: F,
    description: String,
}

impl<F> FnFetcher<F>
where
    F: Fn() -> Result<Vec<RawRecord>, FetchError> + Send + Sync,
{
    pub fn new(description: &str, f: F) -> Self {
        Self {
            f,
            description: format!("fn: {}", description),
        }
    }
}

#[async_trait]
impl<F> Fetcher for FnFetcher<F>
where
    F: Fn() -> Result<Vec<RawRecord>, FetchError> + Send + Sync,
{
    async fn fetch(&self) -> Result<Vec<RawRecord>, FetchError> {
        (self.f)()
    }

    fn description(&self) -> &str {
        &self.description
    }
}

impl<F> Debug for FnFetcher<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnFetcher").field("description", &self.description).finish()
    }
}

// URL encode a path segment; interface names contain '/'
#[cfg(feature = "http")]
fn urlencoded(s: &str) -> String {
    s.replace('%', "%25").replace('/', "%2F").replace(' ', "%20")
}
