use std::collections::HashSet;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::ws::Message;
use domain::ServerMessage;
use tokio::sync::mpsc;
use uuid::Uuid;

fn now_ms() -> i64 {
    SystemTime::now().duration_since(UNIX_EPOCH).expect("system clock before epoch").as_millis() as i64
}

/// Per-session state machine (spec.md §4.E). `Connecting` only accepts
/// `auth`; `Authenticated` carries the claimed user key; `Closed` is
/// terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Authenticated(String),
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FocusAddResult {
    pub accepted: Vec<String>,
    pub newly_added: Vec<String>,
}

struct SessionInner {
    state: SessionState,
    focus: HashSet<String>,
    awaiting_pong: bool,
    last_refresh_ms: i64,
}

/// A single websocket connection. `session_id` exists only for log
/// correlation — it has no protocol meaning, unlike the user key.
pub struct Session {
    pub session_id: Uuid,
    pub address: String,
    outbound: mpsc::UnboundedSender<Message>,
    inner: Mutex<SessionInner>,
}

impl Session {
    pub fn new(session_id: Uuid, address: String, outbound: mpsc::UnboundedSender<Message>) -> Self {
        Self {
            session_id,
            address,
            outbound,
            inner: Mutex::new(SessionInner {
                state: SessionState::Connecting,
                focus: HashSet::new(),
                awaiting_pong: false,
                last_refresh_ms: 0,
            }),
        }
    }

    pub fn state(&self) -> SessionState {
        self.inner.lock().unwrap().state.clone()
    }

    pub fn user(&self) -> Option<String> {
        match self.inner.lock().unwrap().state.clone() {
            SessionState::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn set_authenticated(&self, user: String) {
        let mut inner = self.inner.lock().unwrap();
        inner.state = SessionState::Authenticated(user);
    }

    /// Detach from whatever identity was held (clears focus set too, since
    /// re-auth to a new user starts a fresh observation set).
    pub fn detach(&self) -> (Option<String>, Vec<String>) {
        let mut inner = self.inner.lock().unwrap();
        let previous = match std::mem::replace(&mut inner.state, SessionState::Connecting) {
            SessionState::Authenticated(user) => Some(user),
            _ => None,
        };
        let focus: Vec<String> = inner.focus.drain().collect();
        (previous, focus)
    }

    pub fn close(&self) {
        self.inner.lock().unwrap().state = SessionState::Closed;
    }

    /// Best-effort send; swallows a closed outbound channel (spec.md §5:
    /// "writers must tolerate" a transport that closed between lookup and
    /// send).
    pub fn send(&self, msg: &ServerMessage) {
        let _ = self.outbound.send(Message::Text(msg.to_json().into()));
    }

    pub fn send_ping(&self) {
        let _ = self.outbound.send(Message::Ping(Vec::new().into()));
    }

    /// Ask the transport to close. The actual teardown (removing this
    /// session from shared state, releasing online-truth ownership) happens
    /// when the read loop observes the resulting close, not here.
    pub fn terminate(&self) {
        let _ = self.outbound.send(Message::Close(None));
    }

    pub fn focus_len(&self) -> usize {
        self.inner.lock().unwrap().focus.len()
    }

    pub fn focus_contains(&self, user: &str) -> bool {
        self.inner.lock().unwrap().focus.contains(user)
    }

    /// Work out what adding `users` to the focus set would do, up to
    /// `max_focus_per_client`, without mutating anything: dedup within the
    /// request and pass already-focused users through as accepted no-ops
    /// (spec.md §4.E, §8 boundary behaviors). `accepted` is every user that
    /// would be in the focus set after the add (for the `focus_ok`
    /// snapshot); `newly_added` is the subset new to this session (for
    /// watcher-index maintenance). Split from the actual mutation so a
    /// caller can run the store-facing watcher-index call first and only
    /// commit once it succeeds (spec.md §7: no partial local state on a
    /// failed store call).
    pub fn preview_focus_add(&self, users: &[String], max_focus_per_client: usize) -> FocusAddResult {
        let inner = self.inner.lock().unwrap();
        let mut seen = HashSet::new();
        let mut accepted = Vec::new();
        let mut newly_added = Vec::new();
        let mut projected_len = inner.focus.len();
        for user in users {
            if !seen.insert(user.clone()) {
                continue;
            }
            if inner.focus.contains(user) {
                accepted.push(user.clone());
                continue;
            }
            if projected_len >= max_focus_per_client {
                continue;
            }
            projected_len += 1;
            accepted.push(user.clone());
            newly_added.push(user.clone());
        }
        FocusAddResult { accepted, newly_added }
    }

    /// Commit a previously computed `newly_added` set (from
    /// `preview_focus_add`) into the focus set.
    pub fn commit_focus_add(&self, newly_added: &[String]) {
        let mut inner = self.inner.lock().unwrap();
        for user in newly_added {
            inner.focus.insert(user.clone());
        }
    }

    /// Preview and commit in one call, for callers that don't need the
    /// store round trip in between (tests; callers with no store-facing
    /// side effect to sequence against).
    pub fn add_focus(&self, users: &[String], max_focus_per_client: usize) -> FocusAddResult {
        let result = self.preview_focus_add(users, max_focus_per_client);
        self.commit_focus_add(&result.newly_added);
        result
    }

    /// Remove `users` from the focus set. Returns the subset that was
    /// actually present (and thus removed).
    pub fn remove_focus(&self, users: &[String]) -> Vec<String> {
        let mut inner = self.inner.lock().unwrap();
        users.iter().filter(|u| inner.focus.remove(u.as_str())).cloned().collect()
    }

    /// Clear the "awaiting pong" flag on pong receipt. Returns whether the
    /// session is authenticated with a non-empty focus set and its refresh
    /// cooldown has elapsed — the gate from spec.md §4.E that keeps idle
    /// observers from paying refresh cost.
    pub fn on_pong(&self, cooldown_ms: i64) -> Option<String> {
        let mut inner = self.inner.lock().unwrap();
        inner.awaiting_pong = false;
        let user = match &inner.state {
            SessionState::Authenticated(user) => user.clone(),
            _ => return None,
        };
        if inner.focus.is_empty() {
            return None;
        }
        let now = now_ms();
        if now - inner.last_refresh_ms < cooldown_ms {
            return None;
        }
        inner.last_refresh_ms = now;
        Some(user)
    }

    /// Heartbeat tick: if already awaiting a pong, the session missed the
    /// previous one and must be terminated. Otherwise mark it awaiting and
    /// tell the caller to send a ping.
    pub fn tick_heartbeat(&self) -> bool {
        let mut inner = self.inner.lock().unwrap();
        if inner.awaiting_pong {
            false
        } else {
            inner.awaiting_pong = true;
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        let (tx, _rx) = mpsc::unbounded_channel();
        Session::new(Uuid::new_v4(), "1.2.3.4".into(), tx)
    }

    #[test]
    fn starts_connecting_then_authenticates() {
        let s = session();
        assert_eq!(s.state(), SessionState::Connecting);
        s.set_authenticated("a@x.com".into());
        assert_eq!(s.user(), Some("a@x.com".to_string()));
    }

    #[test]
    fn focus_caps_new_additions_but_accepts_up_to_cap() {
        let s = session();
        let result = s.add_focus(&["a@x.com".into(), "b@x.com".into()], 1);
        assert_eq!(result.accepted, vec!["a@x.com".to_string()]);
        assert_eq!(result.newly_added, vec!["a@x.com".to_string()]);
    }

    #[test]
    fn already_focused_users_are_accepted_as_noop() {
        let s = session();
        s.add_focus(&["a@x.com".into()], 10);
        let result = s.add_focus(&["a@x.com".into()], 10);
        assert_eq!(result.accepted, vec!["a@x.com".to_string()]);
        assert!(result.newly_added.is_empty());
    }

    #[test]
    fn duplicate_users_within_one_request_are_deduped() {
        let s = session();
        let result = s.add_focus(&["a@x.com".into(), "a@x.com".into()], 10);
        assert_eq!(result.accepted, vec!["a@x.com".to_string()]);
        assert_eq!(result.newly_added, vec!["a@x.com".to_string()]);
    }

    #[test]
    fn detach_clears_focus_and_returns_previous_identity() {
        let s = session();
        s.set_authenticated("a@x.com".into());
        s.add_focus(&["b@x.com".into()], 100);
        let (previous, focus) = s.detach();
        assert_eq!(previous, Some("a@x.com".to_string()));
        assert_eq!(focus, vec!["b@x.com".to_string()]);
        assert_eq!(s.focus_len(), 0);
    }

    #[test]
    fn heartbeat_misses_terminate_on_second_tick() {
        let s = session();
        assert!(s.tick_heartbeat());
        assert!(!s.tick_heartbeat());
    }

    #[test]
    fn pong_refreshes_only_when_authenticated_with_focus() {
        let s = session();
        assert!(s.on_pong(0).is_none());
        s.set_authenticated("a@x.com".into());
        assert!(s.on_pong(0).is_none());
        s.add_focus(&["b@x.com".into()], 10);
        assert_eq!(s.on_pong(0), Some("a@x.com".to_string()));
    }
}
