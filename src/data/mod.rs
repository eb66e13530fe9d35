//! Processing of raw records into entities, derived metrics, alerts and history.
//!
//! ## Submodules
//!
//! - [`normalize`]: Raw transport records to canonical [`Entity`](netwatch_types::Entity)
//! - [`rates`]: Error deltas and bandwidth from cumulative counters
//! - [`alerts`]: Threshold rules
//! - [`history`]: Bounded per-entity metric series
//! - [`uptime`]: Parsing of `H:M:S` uptime strings
//!
//! ## Data Flow
//!
//! ```text
//! Vec<RawRecord>
//!        │
//!        ▼
//! normalize_all()  ──▶ skipped count
//!        │
//!        ▼
//! CounterTracker::apply() (error_delta, bandwidth_pct)
//!        │
//!        ├──▶ evaluate() ──▶ Vec<Alert>
//!        │
//!        └──▶ HistoryStore::record()
//! ```

pub mod alerts;
pub mod history;
pub mod normalize;
pub mod rates;
pub mod uptime;

pub use alerts::evaluate;
pub use history::{entity_metrics, HistoryStore};
pub use normalize::{normalize, normalize_all};
pub use rates::CounterTracker;
pub use uptime::parse_uptime;
