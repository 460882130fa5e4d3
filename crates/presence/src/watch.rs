use std::sync::Arc;

use store::Store;

use crate::error::PresenceError;
use crate::keys::watcher_set_key;

/// Per-observed-user set of server ids with at least one local session
/// focused on that user (spec.md §4.D). Membership is a hint: a publisher
/// that finds an empty set may skip publishing.
pub struct WatcherIndex {
    store: Arc<dyn Store>,
    watcher_ttl_secs: u64,
}

impl WatcherIndex {
    pub fn new(store: Arc<dyn Store>, watcher_ttl_secs: u64) -> Self {
        Self { store, watcher_ttl_secs }
    }

    /// Add `server_id` as a watcher of every user in `users`, one pipelined
    /// round trip per user, refreshing that user's membership TTL.
    pub async fn add_watchers(&self, users: &[String], server_id: &str) -> Result<(), PresenceError> {
        for user in users {
            self.store
                .sadd_with_ttl(&watcher_set_key(user), &[server_id.to_string()], self.watcher_ttl_secs)
                .await?;
        }
        Ok(())
    }

    pub async fn remove_watchers(&self, users: &[String], server_id: &str) -> Result<(), PresenceError> {
        for user in users {
            self.store.srem(&watcher_set_key(user), &[server_id.to_string()]).await?;
        }
        Ok(())
    }

    pub async fn members(&self, user: &str) -> Result<Vec<String>, PresenceError> {
        Ok(self.store.smembers(&watcher_set_key(user)).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use store::FakeStore;

    #[tokio::test]
    async fn add_then_members_then_remove() {
        let idx = WatcherIndex::new(Arc::new(FakeStore::new()), 120);
        idx.add_watchers(&["a@x.com".into()], "s1").await.unwrap();
        idx.add_watchers(&["a@x.com".into()], "s2").await.unwrap();
        let mut members = idx.members("a@x.com").await.unwrap();
        members.sort();
        assert_eq!(members, vec!["s1".to_string(), "s2".to_string()]);

        idx.remove_watchers(&["a@x.com".into()], "s1").await.unwrap();
        assert_eq!(idx.members("a@x.com").await.unwrap(), vec!["s2".to_string()]);
    }

    #[tokio::test]
    async fn unwatched_user_has_empty_set() {
        let idx = WatcherIndex::new(Arc::new(FakeStore::new()), 120);
        assert!(idx.members("nobody@x.com").await.unwrap().is_empty());
    }
}
