use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use uuid::Uuid;

use crate::session::Session;

/// In-process shared state for one gateway worker (spec.md §3 "in-process
/// state per server" / §9 "shared mutable maps require explicit
/// synchronization"). A single coarse lock per map, as the design notes
/// say is acceptable.
#[derive(Default)]
pub struct SessionTable {
    by_id: Mutex<HashMap<Uuid, Arc<Session>>>,
    /// Local sessions map (spec.md §3): user key -> live session handles
    /// authenticated as that key (invariant 4).
    by_user: Mutex<HashMap<String, HashSet<Uuid>>>,
    /// Focus index, "observed key -> sessions" half (invariant 3); the
    /// "session -> observed keys" half lives on each `Session` itself.
    watchers_by_user: Mutex<HashMap<String, HashSet<Uuid>>>,
}

impl SessionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, session: Arc<Session>) {
        self.by_id.lock().unwrap().insert(session.session_id, session);
    }

    pub fn remove(&self, id: Uuid) -> Option<Arc<Session>> {
        self.by_id.lock().unwrap().remove(&id)
    }

    pub fn all(&self) -> Vec<Arc<Session>> {
        self.by_id.lock().unwrap().values().cloned().collect()
    }

    pub fn attach_user(&self, user: &str, id: Uuid) {
        self.by_user.lock().unwrap().entry(user.to_string()).or_default().insert(id);
    }

    /// Returns true if no local session remains authenticated as `user`
    /// after this detach.
    pub fn detach_user(&self, user: &str, id: Uuid) -> bool {
        let mut by_user = self.by_user.lock().unwrap();
        let Some(sessions) = by_user.get_mut(user) else { return true };
        sessions.remove(&id);
        let now_empty = sessions.is_empty();
        if now_empty {
            by_user.remove(user);
        }
        now_empty
    }

    pub fn local_session_count(&self, user: &str) -> usize {
        self.by_user.lock().unwrap().get(user).map(HashSet::len).unwrap_or(0)
    }

    /// Work out which of `users` would go from zero to one local watcher if
    /// `id` were registered, without mutating anything — i.e. which would
    /// newly need a cross-server watcher-set entry (spec.md §4.D). Split
    /// from the mutation so a caller can run that store-facing `SADD`
    /// first and only commit the local registration once it succeeds
    /// (spec.md §7: no partial local state on a failed store call).
    pub fn preview_add_watchers(&self, users: &[String]) -> Vec<String> {
        let watchers = self.watchers_by_user.lock().unwrap();
        users.iter().filter(|u| watchers.get(u.as_str()).map_or(true, HashSet::is_empty)).cloned().collect()
    }

    /// Register `id` as a local watcher of every user in `users`.
    pub fn commit_add_watchers(&self, users: &[String], id: Uuid) {
        let mut watchers = self.watchers_by_user.lock().unwrap();
        for user in users {
            watchers.entry(user.clone()).or_default().insert(id);
        }
    }

    /// Preview and commit in one call, for callers with no store-facing
    /// side effect to sequence against (tests).
    pub fn add_watchers(&self, users: &[String], id: Uuid) -> Vec<String> {
        let newly_watched = self.preview_add_watchers(users);
        self.commit_add_watchers(users, id);
        newly_watched
    }

    /// Unregister `id` from watching `users`. Returns the subset whose
    /// local watcher count dropped to zero, i.e. needs its cross-server
    /// watcher-set entry removed (spec.md §4.E "On disconnect").
    pub fn remove_watchers(&self, users: &[String], id: Uuid) -> Vec<String> {
        let mut watchers = self.watchers_by_user.lock().unwrap();
        let mut now_unwatched = Vec::new();
        for user in users {
            if let Some(set) = watchers.get_mut(user) {
                set.remove(&id);
                if set.is_empty() {
                    watchers.remove(user);
                    now_unwatched.push(user.clone());
                }
            }
        }
        now_unwatched
    }

    pub fn sessions_watching(&self, user: &str) -> Vec<Arc<Session>> {
        let ids: Vec<Uuid> = self.watchers_by_user.lock().unwrap().get(user).map(|s| s.iter().copied().collect()).unwrap_or_default();
        let by_id = self.by_id.lock().unwrap();
        ids.into_iter().filter_map(|id| by_id.get(&id).cloned()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Session;
    use tokio::sync::mpsc;

    fn new_session() -> Arc<Session> {
        let (tx, _rx) = mpsc::unbounded_channel();
        Arc::new(Session::new(Uuid::new_v4(), "1.2.3.4".into(), tx))
    }

    #[test]
    fn attach_and_detach_tracks_emptiness() {
        let table = SessionTable::new();
        let s1 = new_session();
        let s2 = new_session();
        table.attach_user("a@x.com", s1.session_id);
        table.attach_user("a@x.com", s2.session_id);
        assert_eq!(table.local_session_count("a@x.com"), 2);

        assert!(!table.detach_user("a@x.com", s1.session_id));
        assert!(table.detach_user("a@x.com", s2.session_id));
        assert_eq!(table.local_session_count("a@x.com"), 0);
    }

    #[test]
    fn watcher_transitions_reported_only_at_zero_one_boundary() {
        let table = SessionTable::new();
        let s1 = new_session();
        let s2 = new_session();

        let newly = table.add_watchers(&["t@x.com".into()], s1.session_id);
        assert_eq!(newly, vec!["t@x.com".to_string()]);
        let newly2 = table.add_watchers(&["t@x.com".into()], s2.session_id);
        assert!(newly2.is_empty());

        let unwatched = table.remove_watchers(&["t@x.com".into()], s1.session_id);
        assert!(unwatched.is_empty());
        let unwatched2 = table.remove_watchers(&["t@x.com".into()], s2.session_id);
        assert_eq!(unwatched2, vec!["t@x.com".to_string()]);
    }

    #[test]
    fn sessions_watching_returns_live_handles() {
        let table = SessionTable::new();
        let s1 = new_session();
        table.insert(s1.clone());
        table.add_watchers(&["t@x.com".into()], s1.session_id);
        let watching = table.sessions_watching("t@x.com");
        assert_eq!(watching.len(), 1);
        assert_eq!(watching[0].session_id, s1.session_id);
    }
}
