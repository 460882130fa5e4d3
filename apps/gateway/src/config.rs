//! Configuration loader (spec.md §6). One `Config` struct parsed once at
//! startup, rather than scattered `std::env::var` reads through handlers —
//! generalized from the teacher's direct-env-read style in `main.rs`.

use uuid::Uuid;

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub store_url: String,
    pub heartbeat_interval_ms: u64,
    pub presence_ttl_seconds: u64,
    pub server_id: String,
    pub max_focus_per_client: usize,
    pub focus_rate_limit_per_minute: usize,
    pub max_connections_per_ip: usize,
    pub presence_shard_count: usize,
    pub watcher_ttl_seconds: u64,
    pub max_snapshot_batch: usize,
}

impl Config {
    /// Load from environment, applying spec.md §6's documented defaults.
    /// `server_id` is generated fresh if unset, per spec.
    pub fn from_env() -> Self {
        Self {
            port: env_parse("PORT", 7000),
            store_url: env_string("STORE_URL", "redis://127.0.0.1"),
            heartbeat_interval_ms: env_parse("HEARTBEAT_INTERVAL_MS", 30_000),
            presence_ttl_seconds: env_parse("PRESENCE_TTL_SECONDS", 90),
            server_id: std::env::var("SERVER_ID").unwrap_or_else(|_| Uuid::new_v4().to_string()),
            max_focus_per_client: env_parse("MAX_FOCUS_PER_CLIENT", 100),
            focus_rate_limit_per_minute: env_parse("FOCUS_RATE_LIMIT_PER_MINUTE", 60),
            max_connections_per_ip: env_parse("MAX_CONNECTIONS_PER_IP", 10),
            presence_shard_count: env_parse("PRESENCE_SHARD_COUNT", 1),
            watcher_ttl_seconds: env_parse("WATCHER_TTL_SECONDS", 120),
            max_snapshot_batch: env_parse("MAX_SNAPSHOT_BATCH", 500),
        }
    }

    /// Owner-guarded refresh cooldown (spec.md §3 invariant 6):
    /// refresh_cooldown >= presence_ttl / 2.
    pub fn refresh_cooldown_ms(&self) -> i64 {
        (self.presence_ttl_seconds as i64 * 1000) / 2
    }
}
