use std::sync::Arc;

use domain::FlipEvent;
use store::Store;

use crate::error::PresenceError;
use crate::keys::server_channel;
use crate::watch::WatcherIndex;

/// Targeted fan-out publisher (spec.md §4.C option 2): publishes a flip
/// only to the servers the Watcher Index says currently have interested
/// sessions. Publication is best-effort — a store publish failure is
/// surfaced to the caller but never rolled back, since the flip is
/// fire-and-forget by design.
pub struct FlipPublisher {
    store: Arc<dyn Store>,
    watchers: Arc<WatcherIndex>,
}

impl FlipPublisher {
    pub fn new(store: Arc<dyn Store>, watchers: Arc<WatcherIndex>) -> Self {
        Self { store, watchers }
    }

    pub async fn publish_flip(&self, user: &str, online: bool, timestamp_ms: i64) -> Result<(), PresenceError> {
        let interested = self.watchers.members(user).await?;
        if interested.is_empty() {
            return Ok(());
        }
        let event = FlipEvent { user: user.to_string(), online, timestamp_ms };
        let payload = serde_json::to_vec(&event).expect("FlipEvent always serializes");
        for server_id in interested {
            self.store.publish(&server_channel(&server_id), &payload).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use store::FakeStore;

    #[tokio::test]
    async fn publishes_only_to_watching_servers() {
        let store: Arc<dyn Store> = Arc::new(FakeStore::new());
        let watchers = Arc::new(WatcherIndex::new(store.clone(), 120));
        watchers.add_watchers(&["t@x.com".into()], "s-interested").await.unwrap();

        let mut interested_sub = store.subscribe("presence:server:s-interested").await.unwrap();
        let bystander_sub = store.subscribe("presence:server:s-bystander").await.unwrap();

        let publisher = FlipPublisher::new(store.clone(), watchers);
        publisher.publish_flip("t@x.com", true, 42).await.unwrap();

        let payload = interested_sub.recv().await.unwrap();
        let event: FlipEvent = serde_json::from_slice(&payload).unwrap();
        assert_eq!(event.user, "t@x.com");
        assert!(event.online);

        drop(bystander_sub);
    }

    #[tokio::test]
    async fn skips_publish_when_no_watchers() {
        let store: Arc<dyn Store> = Arc::new(FakeStore::new());
        let watchers = Arc::new(WatcherIndex::new(store.clone(), 120));
        let publisher = FlipPublisher::new(store, watchers);
        publisher.publish_flip("nobody@x.com", false, 1).await.unwrap();
    }
}
