use std::sync::Arc;

use presence::{BatchQuery, FlipPublisher, PresenceRegistry, WatcherIndex};
use rate::{ConnectionLimiter, FocusRateLimiter};
use registry::UserRegistry;
use store::Store;

use crate::config::Config;
use crate::sessions::SessionTable;

/// Process-wide singleton composed of the Store Adapter, the presence
/// fabric components, and in-process session state (spec.md §9 "Global
/// state"). `AppState` is a thin `Clone`-able handle onto this.
pub struct Fabric {
    pub config: Config,
    pub store: Arc<dyn Store>,
    pub registry: PresenceRegistry,
    pub watchers: Arc<WatcherIndex>,
    pub flip: FlipPublisher,
    pub snapshot: BatchQuery,
    pub sessions: SessionTable,
    pub connections: ConnectionLimiter,
    pub focus_limits: FocusRateLimiter,
    pub user_registry: UserRegistry,
}

impl Fabric {
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        let watchers = Arc::new(WatcherIndex::new(store.clone(), config.watcher_ttl_seconds));
        Self {
            registry: PresenceRegistry::new(store.clone(), config.presence_ttl_seconds),
            flip: FlipPublisher::new(store.clone(), watchers.clone()),
            snapshot: BatchQuery::new(store.clone(), config.max_snapshot_batch),
            connections: ConnectionLimiter::new(config.max_connections_per_ip),
            focus_limits: FocusRateLimiter::per_minute(config.focus_rate_limit_per_minute),
            sessions: SessionTable::new(),
            user_registry: UserRegistry::new(),
            watchers,
            store,
            config,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub fabric: Arc<Fabric>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        Self { fabric: Arc::new(Fabric::new(store, config)) }
    }
}
