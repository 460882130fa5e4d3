use std::sync::Arc;

use domain::{bucket_for, Bucket, PresenceStatus};
use store::{PipelineOp, PipelineReply, Store};

use crate::error::PresenceError;
use crate::keys::{last_active_key, presence_key};
use crate::registry::now_ms;

/// Default `max_snapshot_batch` (spec.md §4.G).
pub const DEFAULT_MAX_SNAPSHOT_BATCH: usize = 500;

/// Pipelined batch presence reads (spec.md §4.G): one store round trip
/// regardless of how many users are requested.
pub struct BatchQuery {
    store: Arc<dyn Store>,
    max_snapshot_batch: usize,
}

impl BatchQuery {
    pub fn new(store: Arc<dyn Store>, max_snapshot_batch: usize) -> Self {
        Self { store, max_snapshot_batch }
    }

    pub async fn snapshot(&self, users: &[String]) -> Result<Vec<PresenceStatus>, PresenceError> {
        if users.len() > self.max_snapshot_batch {
            return Err(PresenceError::BatchTooLarge { requested: users.len(), limit: self.max_snapshot_batch });
        }
        if users.is_empty() {
            return Ok(Vec::new());
        }

        let mut ops = Vec::with_capacity(users.len() * 2);
        for user in users {
            ops.push(PipelineOp::Get(presence_key(user)));
            ops.push(PipelineOp::Get(last_active_key(user)));
        }
        let replies = self.store.pipeline(ops).await?;
        let now = now_ms();

        let mut statuses = Vec::with_capacity(users.len());
        for (user, pair) in users.iter().zip(replies.chunks(2)) {
            let online = matches!(pair.first(), Some(PipelineReply::Value(Some(_))));
            let last_active_ms = match pair.get(1) {
                Some(PipelineReply::Value(Some(raw))) => raw.parse::<i64>().ok(),
                _ => None,
            };
            let bucket: Bucket = bucket_for(online, now, last_active_ms);
            statuses.push(PresenceStatus { user: user.clone(), online, last_active_ms, bucket });
        }
        Ok(statuses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::PresenceRegistry;
    use store::FakeStore;

    #[tokio::test]
    async fn snapshot_reports_online_and_offline_users() {
        let store: Arc<dyn Store> = Arc::new(FakeStore::new());
        let registry = PresenceRegistry::new(store.clone(), 90);
        registry.claim_online("online@x.com", "s1").await.unwrap();

        let query = BatchQuery::new(store, DEFAULT_MAX_SNAPSHOT_BATCH);
        let statuses = query.snapshot(&["online@x.com".into(), "offline@x.com".into()]).await.unwrap();

        assert_eq!(statuses.len(), 2);
        assert!(statuses[0].online);
        assert_eq!(statuses[0].bucket, Bucket::OnlineNow);
        assert!(!statuses[1].online);
        assert_eq!(statuses[1].bucket, Bucket::Inactive);
    }

    #[tokio::test]
    async fn empty_request_is_a_noop() {
        let store: Arc<dyn Store> = Arc::new(FakeStore::new());
        let query = BatchQuery::new(store, DEFAULT_MAX_SNAPSHOT_BATCH);
        assert!(query.snapshot(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn oversized_request_rejected_before_any_store_traffic() {
        let store: Arc<dyn Store> = Arc::new(FakeStore::new());
        let query = BatchQuery::new(store, 2);
        let users: Vec<String> = vec!["a@x.com".into(), "b@x.com".into(), "c@x.com".into()];
        let err = query.snapshot(&users).await.unwrap_err();
        assert!(matches!(err, PresenceError::BatchTooLarge { requested: 3, limit: 2 }));
    }
}
