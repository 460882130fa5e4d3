use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Rolling 60-second window of focus calls per session (spec.md §4.E,
/// testable property 3). A true sliding window rather than a token bucket:
/// the fourth call inside any 60-second span is rejected, and the next
/// call exactly 60 seconds after the oldest recorded call succeeds.
pub struct FocusRateLimiter {
    windows: Mutex<HashMap<String, VecDeque<Instant>>>,
    limit: usize,
    window: Duration,
}

impl FocusRateLimiter {
    pub fn new(limit: usize, window: Duration) -> Self {
        Self { windows: Mutex::new(HashMap::new()), limit, window }
    }

    pub fn per_minute(limit: usize) -> Self {
        Self::new(limit, Duration::from_secs(60))
    }

    /// Record one focus call for `session_id`. Returns true if it is within
    /// the rolling-window budget.
    pub fn try_consume(&self, session_id: &str) -> bool {
        let now = Instant::now();
        let mut windows = self.windows.lock().unwrap();
        let calls = windows.entry(session_id.to_string()).or_insert_with(VecDeque::new);
        while let Some(&oldest) = calls.front() {
            if now.duration_since(oldest) >= self.window {
                calls.pop_front();
            } else {
                break;
            }
        }
        if calls.len() >= self.limit {
            false
        } else {
            calls.push_back(now);
            true
        }
    }

    /// Drop all rate-limit state for a closed session (spec.md §5).
    pub fn remove_session(&self, session_id: &str) {
        self.windows.lock().unwrap().remove(session_id);
    }

    /// Prune sessions whose entire window has expired; run on a periodic
    /// timer per spec.md §5.
    pub fn prune_expired(&self) {
        let now = Instant::now();
        let mut windows = self.windows.lock().unwrap();
        windows.retain(|_, calls| {
            calls.retain(|&t| now.duration_since(t) < self.window);
            !calls.is_empty()
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_limit_then_rejects() {
        let limiter = FocusRateLimiter::new(3, Duration::from_secs(60));
        assert!(limiter.try_consume("s1"));
        assert!(limiter.try_consume("s1"));
        assert!(limiter.try_consume("s1"));
        assert!(!limiter.try_consume("s1"));
    }

    #[test]
    fn window_expiry_allows_calls_again() {
        let limiter = FocusRateLimiter::new(1, Duration::from_millis(20));
        assert!(limiter.try_consume("s1"));
        assert!(!limiter.try_consume("s1"));
        std::thread::sleep(Duration::from_millis(30));
        assert!(limiter.try_consume("s1"));
    }

    #[test]
    fn sessions_are_independent_and_removable() {
        let limiter = FocusRateLimiter::new(1, Duration::from_secs(60));
        assert!(limiter.try_consume("s1"));
        assert!(limiter.try_consume("s2"));
        limiter.remove_session("s1");
        assert!(limiter.try_consume("s1"));
    }
}
