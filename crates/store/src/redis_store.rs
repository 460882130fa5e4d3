use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, Script};
use tokio::sync::mpsc;

use crate::error::StoreError;
use crate::scripts::{DELETE_IF_OWNER, REFRESH_IF_OWNER};
use crate::{PipelineOp, PipelineReply, Store, Subscription};

/// Redis-backed implementation of [`Store`]. One multiplexed
/// [`ConnectionManager`] serves every regular command; each
/// [`Store::subscribe`] call opens its own dedicated connection off the
/// [`Client`], because a connection in subscriber mode cannot issue other
/// commands. This mirrors the teacher's split between a shared command
/// connection and per-context subscription connections in `bus::pubsub`.
pub struct RedisStore {
    client: Client,
    conn: ConnectionManager,
}

impl RedisStore {
    /// Connect to `url` and fail fast if the initial handshake does not
    /// succeed, per spec.md §6's bootstrap exit-code policy.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = Client::open(url).map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let conn = ConnectionManager::new(client.clone())
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(Self { client, conn })
    }
}

#[async_trait]
impl Store for RedisStore {
    async fn set_with_ttl_and_get_previous(
        &self,
        key: &str,
        value: &str,
        ttl_secs: u64,
    ) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn.clone();
        let previous: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("EX")
            .arg(ttl_secs)
            .arg("GET")
            .query_async(&mut conn)
            .await?;
        Ok(previous)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(key, value).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let exists: bool = conn.exists(key).await?;
        Ok(exists)
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key).await?;
        Ok(())
    }

    async fn pipeline(&self, ops: Vec<PipelineOp>) -> Result<Vec<PipelineReply>, StoreError> {
        if ops.is_empty() {
            return Ok(Vec::new());
        }
        let mut pipe = redis::pipe();
        for op in &ops {
            match op {
                PipelineOp::Get(key) => {
                    pipe.get(key);
                }
                PipelineOp::Set(key, value) => {
                    pipe.set(key, value).ignore();
                }
            }
        }
        let mut conn = self.conn.clone();
        let raw: Vec<Option<String>> = pipe.query_async(&mut conn).await?;
        let mut replies = Vec::with_capacity(ops.len());
        let mut raw_iter = raw.into_iter();
        for op in ops {
            match op {
                PipelineOp::Get(_) => replies.push(PipelineReply::Value(raw_iter.next().flatten())),
                PipelineOp::Set(_, _) => replies.push(PipelineReply::Ok),
            }
        }
        Ok(replies)
    }

    async fn publish(&self, channel: &str, payload: &[u8]) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        conn.publish::<_, _, ()>(channel, payload).await?;
        Ok(())
    }

    async fn subscribe(&self, channel: &str) -> Result<Subscription, StoreError> {
        let mut pubsub = self
            .client
            .get_async_pubsub()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        pubsub
            .subscribe(channel)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let (tx, rx) = mpsc::channel(256);
        let channel_owned = channel.to_string();
        let handle = tokio::spawn(async move {
            use futures_util::StreamExt;
            let mut stream = pubsub.on_message();
            while let Some(msg) = stream.next().await {
                let payload: Vec<u8> = match msg.get_payload() {
                    Ok(p) => p,
                    Err(e) => {
                        tracing::warn!(channel = %channel_owned, error = %e, "dropping unreadable pub/sub payload");
                        continue;
                    }
                };
                if tx.send(payload).await.is_err() {
                    break;
                }
            }
        });

        Ok(Subscription::new(rx, handle))
    }

    async fn refresh_if_owner(&self, key: &str, owner: &str, ttl_secs: u64) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let result: i64 = Script::new(REFRESH_IF_OWNER)
            .key(key)
            .arg(owner)
            .arg(ttl_secs)
            .invoke_async(&mut conn)
            .await?;
        Ok(result != 0)
    }

    async fn delete_if_owner(&self, key: &str, owner: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let result: i64 = Script::new(DELETE_IF_OWNER)
            .key(key)
            .arg(owner)
            .invoke_async(&mut conn)
            .await?;
        Ok(result != 0)
    }

    async fn sadd_with_ttl(&self, key: &str, members: &[String], ttl_secs: u64) -> Result<(), StoreError> {
        if members.is_empty() {
            return Ok(());
        }
        let mut pipe = redis::pipe();
        pipe.sadd(key, members).ignore();
        pipe.expire(key, ttl_secs as i64).ignore();
        let mut conn = self.conn.clone();
        let _: () = pipe.query_async(&mut conn).await?;
        Ok(())
    }

    async fn srem(&self, key: &str, members: &[String]) -> Result<(), StoreError> {
        if members.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn.clone();
        conn.srem::<_, _, ()>(key, members).await?;
        Ok(())
    }

    async fn smembers(&self, key: &str) -> Result<Vec<String>, StoreError> {
        let mut conn = self.conn.clone();
        let members: Vec<String> = conn.smembers(key).await?;
        Ok(members)
    }

    async fn healthy(&self) -> bool {
        let mut conn = self.conn.clone();
        redis::cmd("PING").query_async::<String>(&mut conn).await.is_ok()
    }
}
