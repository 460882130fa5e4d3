//! Heartbeat tick loop (spec.md §4.E, §5): one per server process. Every
//! `heartbeat_interval_ms`, every session either misses its previous pong
//! and is terminated, or is sent a fresh transport ping.

use std::sync::Arc;
use std::time::Duration;

use presence::keys::server_registry_key;
use store::Store;

use crate::state::Fabric;

pub async fn run(fabric: Arc<Fabric>) {
    let mut tick = tokio::time::interval(Duration::from_millis(fabric.config.heartbeat_interval_ms));
    loop {
        tick.tick().await;
        for session in fabric.sessions.all() {
            if session.tick_heartbeat() {
                session.send_ping();
            } else {
                tracing::debug!(session_id = %session.session_id, "missed heartbeat, terminating");
                session.terminate();
            }
        }
        fabric.focus_limits.prune_expired();

        // Refresh this server's entry in the diagnostic server registry
        // (spec.md §3 supplemental). Purely observational: nothing reads
        // this key to decide correctness.
        let key = server_registry_key(&fabric.config.server_id);
        if let Err(err) =
            fabric.store.set_with_ttl_and_get_previous(&key, &fabric.config.server_id, fabric.config.watcher_ttl_seconds).await
        {
            tracing::debug!(error = %err, "failed to refresh server registry entry");
        }
    }
}
