use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc};

use crate::error::StoreError;
use crate::{PipelineOp, PipelineReply, Store, Subscription};

struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

struct SetEntry {
    members: Vec<String>,
    expires_at: Option<Instant>,
}

/// In-memory stand-in for [`Store`] used by unit tests across the
/// workspace (`presence`, `gateway`) so they exercise the real
/// ownership/TTL/pub-sub logic without a live Redis instance.
///
/// TTLs are evaluated lazily on read — there is no background sweeper —
/// which is enough to express "has this key expired" for test purposes.
pub struct FakeStore {
    kv: Mutex<HashMap<String, Entry>>,
    sets: Mutex<HashMap<String, SetEntry>>,
    channels: Mutex<HashMap<String, broadcast::Sender<Vec<u8>>>>,
}

impl Default for FakeStore {
    fn default() -> Self {
        Self {
            kv: Mutex::new(HashMap::new()),
            sets: Mutex::new(HashMap::new()),
            channels: Mutex::new(HashMap::new()),
        }
    }
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn live_get(&self, key: &str) -> Option<String> {
        let mut kv = self.kv.lock().unwrap();
        match kv.get(key) {
            Some(entry) => {
                if entry.expires_at.map(|at| at <= Instant::now()).unwrap_or(false) {
                    kv.remove(key);
                    None
                } else {
                    Some(entry.value.clone())
                }
            }
            None => None,
        }
    }

    fn channel(&self, name: &str) -> broadcast::Sender<Vec<u8>> {
        let mut channels = self.channels.lock().unwrap();
        channels
            .entry(name.to_string())
            .or_insert_with(|| broadcast::channel(1024).0)
            .clone()
    }
}

#[async_trait]
impl Store for FakeStore {
    async fn set_with_ttl_and_get_previous(
        &self,
        key: &str,
        value: &str,
        ttl_secs: u64,
    ) -> Result<Option<String>, StoreError> {
        let previous = self.live_get(key);
        let mut kv = self.kv.lock().unwrap();
        kv.insert(
            key.to_string(),
            Entry { value: value.to_string(), expires_at: Some(Instant::now() + Duration::from_secs(ttl_secs)) },
        );
        Ok(previous)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut kv = self.kv.lock().unwrap();
        kv.insert(key.to_string(), Entry { value: value.to_string(), expires_at: None });
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.live_get(key))
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.live_get(key).is_some())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.kv.lock().unwrap().remove(key);
        Ok(())
    }

    async fn pipeline(&self, ops: Vec<PipelineOp>) -> Result<Vec<PipelineReply>, StoreError> {
        let mut out = Vec::with_capacity(ops.len());
        for op in ops {
            match op {
                PipelineOp::Get(key) => out.push(PipelineReply::Value(self.live_get(&key))),
                PipelineOp::Set(key, value) => {
                    self.set(&key, &value).await?;
                    out.push(PipelineReply::Ok);
                }
            }
        }
        Ok(out)
    }

    async fn publish(&self, channel: &str, payload: &[u8]) -> Result<(), StoreError> {
        let tx = self.channel(channel);
        let _ = tx.send(payload.to_vec());
        Ok(())
    }

    async fn subscribe(&self, channel: &str) -> Result<Subscription, StoreError> {
        let tx = self.channel(channel);
        let mut brx = tx.subscribe();
        let (out_tx, out_rx) = mpsc::channel(256);
        let handle = tokio::spawn(async move {
            loop {
                match brx.recv().await {
                    Ok(payload) => {
                        if out_tx.send(payload).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        Ok(Subscription::new(out_rx, handle))
    }

    async fn refresh_if_owner(&self, key: &str, owner: &str, ttl_secs: u64) -> Result<bool, StoreError> {
        let mut kv = self.kv.lock().unwrap();
        match kv.get_mut(key) {
            Some(entry) if entry.expires_at.map(|at| at > Instant::now()).unwrap_or(true) && entry.value == owner => {
                entry.expires_at = Some(Instant::now() + Duration::from_secs(ttl_secs));
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_if_owner(&self, key: &str, owner: &str) -> Result<bool, StoreError> {
        let mut kv = self.kv.lock().unwrap();
        let matches = kv
            .get(key)
            .map(|entry| entry.expires_at.map(|at| at > Instant::now()).unwrap_or(true) && entry.value == owner)
            .unwrap_or(false);
        if matches {
            kv.remove(key);
        }
        Ok(matches)
    }

    async fn sadd_with_ttl(&self, key: &str, members: &[String], ttl_secs: u64) -> Result<(), StoreError> {
        let mut sets = self.sets.lock().unwrap();
        let entry = sets.entry(key.to_string()).or_insert_with(|| SetEntry { members: Vec::new(), expires_at: None });
        for m in members {
            if !entry.members.contains(m) {
                entry.members.push(m.clone());
            }
        }
        entry.expires_at = Some(Instant::now() + Duration::from_secs(ttl_secs));
        Ok(())
    }

    async fn srem(&self, key: &str, members: &[String]) -> Result<(), StoreError> {
        let mut sets = self.sets.lock().unwrap();
        if let Some(entry) = sets.get_mut(key) {
            entry.members.retain(|m| !members.contains(m));
        }
        Ok(())
    }

    async fn smembers(&self, key: &str) -> Result<Vec<String>, StoreError> {
        let mut sets = self.sets.lock().unwrap();
        match sets.get(key) {
            Some(entry) if entry.expires_at.map(|at| at > Instant::now()).unwrap_or(true) => Ok(entry.members.clone()),
            Some(_) => {
                sets.remove(key);
                Ok(Vec::new())
            }
            None => Ok(Vec::new()),
        }
    }

    async fn healthy(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_with_ttl_returns_previous_value() {
        let store = FakeStore::new();
        let prev = store.set_with_ttl_and_get_previous("k", "a", 10).await.unwrap();
        assert_eq!(prev, None);
        let prev = store.set_with_ttl_and_get_previous("k", "b", 10).await.unwrap();
        assert_eq!(prev, Some("a".to_string()));
    }

    #[tokio::test]
    async fn refresh_and_delete_respect_ownership() {
        let store = FakeStore::new();
        store.set_with_ttl_and_get_previous("k", "owner-a", 10).await.unwrap();
        assert!(!store.refresh_if_owner("k", "owner-b", 10).await.unwrap());
        assert!(store.refresh_if_owner("k", "owner-a", 10).await.unwrap());
        assert!(!store.delete_if_owner("k", "owner-b").await.unwrap());
        assert!(store.delete_if_owner("k", "owner-a").await.unwrap());
        assert!(!store.exists("k").await.unwrap());
    }

    #[tokio::test]
    async fn pubsub_delivers_published_payload() {
        let store = FakeStore::new();
        let mut sub = store.subscribe("chan").await.unwrap();
        store.publish("chan", b"hello").await.unwrap();
        let payload = sub.recv().await.unwrap();
        assert_eq!(payload, b"hello");
    }

    #[tokio::test]
    async fn watcher_set_add_remove() {
        let store = FakeStore::new();
        store.sadd_with_ttl("w", &["s1".into(), "s2".into()], 60).await.unwrap();
        let mut members = store.smembers("w").await.unwrap();
        members.sort();
        assert_eq!(members, vec!["s1".to_string(), "s2".to_string()]);
        store.srem("w", &["s1".into()]).await.unwrap();
        assert_eq!(store.smembers("w").await.unwrap(), vec!["s2".to_string()]);
    }
}
