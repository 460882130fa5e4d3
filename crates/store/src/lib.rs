//! Store Adapter (spec.md §4.A): a typed, backend-agnostic wrapper around
//! the shared key-value + pub/sub primitives the presence fabric is built
//! on. This crate knows nothing about users, servers, or presence — it
//! only knows strings, TTLs, sets, and channels.
//!
//! The only production backend is [`redis_store::RedisStore`]; tests run
//! against [`fake::FakeStore`], an in-memory stand-in for the same trait,
//! the way the teacher's `Storage` type is swapped for fakes in its own
//! dev-dependencies.

mod error;
mod fake;
mod redis_store;
mod scripts;

pub use error::StoreError;
pub use fake::FakeStore;
pub use redis_store::RedisStore;

use async_trait::async_trait;
use tokio::sync::mpsc;

/// One operation in a pipelined batch (spec.md §4.A: "pipeline(commands)
/// → results_in_order"). Only the operations the fabric actually issues
/// are modeled — `Get` for batch snapshots, `Set` for paired
/// online-truth + last-active writes.
#[derive(Debug, Clone)]
pub enum PipelineOp {
    Get(String),
    Set(String, String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineReply {
    Value(Option<String>),
    Ok,
}

/// A live subscription to one channel. Dropping it stops the forwarding
/// task and closes the dedicated subscriber connection, per spec.md §4.A
/// ("subscriber connections cannot issue commands").
pub struct Subscription {
    receiver: mpsc::Receiver<Vec<u8>>,
    _handle: tokio::task::JoinHandle<()>,
}

impl Subscription {
    pub fn new(receiver: mpsc::Receiver<Vec<u8>>, handle: tokio::task::JoinHandle<()>) -> Self {
        Self { receiver, _handle: handle }
    }

    pub async fn recv(&mut self) -> Option<Vec<u8>> {
        self.receiver.recv().await
    }
}

/// Capability interface for the shared store. A fixed set of methods, no
/// subclassing — different backends implement it directly (spec.md §9
/// "Deep inheritance and dynamic dispatch absent in the design").
#[async_trait]
pub trait Store: Send + Sync {
    async fn set_with_ttl_and_get_previous(
        &self,
        key: &str,
        value: &str,
        ttl_secs: u64,
    ) -> Result<Option<String>, StoreError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    async fn exists(&self, key: &str) -> Result<bool, StoreError>;
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    async fn pipeline(&self, ops: Vec<PipelineOp>) -> Result<Vec<PipelineReply>, StoreError>;

    async fn publish(&self, channel: &str, payload: &[u8]) -> Result<(), StoreError>;

    /// Open a dedicated subscription to `channel`. Never multiplexed onto
    /// the connection used for regular commands.
    async fn subscribe(&self, channel: &str) -> Result<Subscription, StoreError>;

    /// `refresh_if_owner`: `if GET(key)==owner then EXPIRE(key, ttl) else 0`.
    /// Ownership mismatch and expiry both return `false`, never an error
    /// (spec.md §7: "not an error").
    async fn refresh_if_owner(&self, key: &str, owner: &str, ttl_secs: u64) -> Result<bool, StoreError>;

    /// `delete_if_owner`: `if GET(key)==owner then DEL(key) else 0`.
    async fn delete_if_owner(&self, key: &str, owner: &str) -> Result<bool, StoreError>;

    /// Add `members` to the set at `key` and (re)apply a TTL to the whole
    /// set, in one round trip (spec.md §4.D).
    async fn sadd_with_ttl(&self, key: &str, members: &[String], ttl_secs: u64) -> Result<(), StoreError>;
    async fn srem(&self, key: &str, members: &[String]) -> Result<(), StoreError>;
    async fn smembers(&self, key: &str) -> Result<Vec<String>, StoreError>;

    /// Liveness probe used at bootstrap and by the health endpoint.
    async fn healthy(&self) -> bool;
}
