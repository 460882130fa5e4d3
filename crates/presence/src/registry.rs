use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use store::{PipelineOp, PipelineReply, Store};

use crate::error::PresenceError;
use crate::keys::{last_active_key, last_seen_key, presence_key};

pub fn now_ms() -> i64 {
    SystemTime::now().duration_since(UNIX_EPOCH).expect("system clock before epoch").as_millis() as i64
}

/// Result of a `claim_online` call (spec.md §4.B).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimResult {
    pub became_online: bool,
    pub last_seen_ms: Option<i64>,
}

/// Authoritative online-truth registry: TTL-owned presence keys plus the
/// last-seen/last-active timestamps that back snapshots (spec.md §4.B).
pub struct PresenceRegistry {
    store: Arc<dyn Store>,
    presence_ttl_secs: u64,
}

impl PresenceRegistry {
    pub fn new(store: Arc<dyn Store>, presence_ttl_secs: u64) -> Self {
        Self { store, presence_ttl_secs }
    }

    /// Claim ownership of `user`'s presence key for `server_id`, bumping
    /// last-active in the same round trip as the opportunistic last-seen
    /// read. `became_online` is true exactly when no other server held the
    /// key a moment ago.
    pub async fn claim_online(&self, user: &str, server_id: &str) -> Result<ClaimResult, PresenceError> {
        let previous = self
            .store
            .set_with_ttl_and_get_previous(&presence_key(user), server_id, self.presence_ttl_secs)
            .await?;
        let became_online = previous.is_none();

        let replies = self
            .store
            .pipeline(vec![
                PipelineOp::Get(last_seen_key(user)),
                PipelineOp::Set(last_active_key(user), now_ms().to_string()),
            ])
            .await?;
        let last_seen_ms = match replies.into_iter().next() {
            Some(PipelineReply::Value(Some(raw))) => raw.parse::<i64>().ok(),
            _ => None,
        };

        Ok(ClaimResult { became_online, last_seen_ms })
    }

    /// `refresh_if_owner`; returns false (not an error) on ownership
    /// mismatch or expiry, per spec.md §7.
    pub async fn refresh(&self, user: &str, server_id: &str) -> Result<bool, PresenceError> {
        Ok(self.store.refresh_if_owner(&presence_key(user), server_id, self.presence_ttl_secs).await?)
    }

    /// Records last-seen, then `delete_if_owner`. Returns `became_offline`:
    /// true only for a clean release this server actually owned.
    pub async fn release_if_owned(&self, user: &str, server_id: &str) -> Result<bool, PresenceError> {
        self.store.set(&last_seen_key(user), &now_ms().to_string()).await?;
        Ok(self.store.delete_if_owner(&presence_key(user), server_id).await?)
    }

    pub async fn is_online(&self, user: &str) -> Result<bool, PresenceError> {
        Ok(self.store.exists(&presence_key(user)).await?)
    }

    pub async fn owner_of(&self, user: &str) -> Result<Option<String>, PresenceError> {
        Ok(self.store.get(&presence_key(user)).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use store::FakeStore;

    fn registry() -> PresenceRegistry {
        PresenceRegistry::new(Arc::new(FakeStore::new()), 90)
    }

    #[tokio::test]
    async fn claim_then_refresh_then_online() {
        let r = registry();
        let claim = r.claim_online("a@x.com", "s1").await.unwrap();
        assert!(claim.became_online);
        assert!(r.refresh("a@x.com", "s1").await.unwrap());
        assert!(r.is_online("a@x.com").await.unwrap());
    }

    #[tokio::test]
    async fn second_claim_by_other_server_wins_and_first_refresh_fails() {
        let r = registry();
        r.claim_online("b@x.com", "s1").await.unwrap();
        let second = r.claim_online("b@x.com", "s2").await.unwrap();
        assert!(!second.became_online);
        assert!(!r.refresh("b@x.com", "s1").await.unwrap());
        assert_eq!(r.owner_of("b@x.com").await.unwrap(), Some("s2".to_string()));
    }

    #[tokio::test]
    async fn release_if_owned_then_offline_and_idempotent() {
        let r = registry();
        r.claim_online("c@x.com", "s1").await.unwrap();
        assert!(r.release_if_owned("c@x.com", "s1").await.unwrap());
        assert!(!r.is_online("c@x.com").await.unwrap());
        assert!(!r.release_if_owned("c@x.com", "s1").await.unwrap());
    }

    #[tokio::test]
    async fn claim_online_bumps_last_active_and_reads_last_seen() {
        let r = registry();
        r.claim_online("d@x.com", "s1").await.unwrap();
        r.release_if_owned("d@x.com", "s1").await.unwrap();
        let claim = r.claim_online("d@x.com", "s2").await.unwrap();
        assert!(claim.last_seen_ms.is_some());
    }
}
