//! Presence Registry, Flip Publisher, Watcher Index, and Batch Query
//! (spec.md §4.B–D, §4.G) — the store-facing half of the presence fabric.
//! The Session Manager (crate `gateway`) is the only caller; everything
//! here is store-shape in, domain-shape out, with no knowledge of
//! websockets or in-process session state.

pub mod error;
pub mod flip;
pub mod keys;
pub mod registry;
pub mod snapshot;
pub mod watch;

pub use error::PresenceError;
pub use flip::FlipPublisher;
pub use registry::{now_ms, ClaimResult, PresenceRegistry};
pub use snapshot::{BatchQuery, DEFAULT_MAX_SNAPSHOT_BATCH};
pub use watch::WatcherIndex;
