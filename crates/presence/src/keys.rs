//! Store key layout (spec.md §3 / GLOSSARY). Centralized here so every
//! component agrees on the same naming scheme.

pub fn presence_key(user: &str) -> String {
    format!("presence:user:{user}")
}

pub fn last_seen_key(user: &str) -> String {
    format!("presence:seen:{user}")
}

pub fn last_active_key(user: &str) -> String {
    format!("presence:active:{user}")
}

pub fn watcher_set_key(user: &str) -> String {
    format!("presence:watchers:{user}")
}

pub fn server_channel(server_id: &str) -> String {
    format!("presence:server:{server_id}")
}

pub fn server_registry_key(server_id: &str) -> String {
    format!("presence:servers:{server_id}")
}
