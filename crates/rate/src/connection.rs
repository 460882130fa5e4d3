use std::collections::HashMap;
use std::sync::Mutex;

/// Per-source-address connection cap (spec.md §4.E). Acquired before a
/// session is registered anywhere else; released on disconnect.
pub struct ConnectionLimiter {
    counts: Mutex<HashMap<String, usize>>,
    max_per_address: usize,
}

impl ConnectionLimiter {
    pub fn new(max_per_address: usize) -> Self {
        Self { counts: Mutex::new(HashMap::new()), max_per_address }
    }

    /// Increment the count for `address` and return whether it stayed
    /// within the cap. If it did not, the count is left unincremented.
    pub fn try_acquire(&self, address: &str) -> bool {
        let mut counts = self.counts.lock().unwrap();
        let entry = counts.entry(address.to_string()).or_insert(0);
        if *entry >= self.max_per_address {
            false
        } else {
            *entry += 1;
            true
        }
    }

    pub fn release(&self, address: &str) {
        let mut counts = self.counts.lock().unwrap();
        if let Some(entry) = counts.get_mut(address) {
            *entry = entry.saturating_sub(1);
            if *entry == 0 {
                counts.remove(address);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_past_the_cap_and_frees_on_release() {
        let limiter = ConnectionLimiter::new(2);
        assert!(limiter.try_acquire("1.2.3.4"));
        assert!(limiter.try_acquire("1.2.3.4"));
        assert!(!limiter.try_acquire("1.2.3.4"));

        limiter.release("1.2.3.4");
        assert!(limiter.try_acquire("1.2.3.4"));
    }

    #[test]
    fn addresses_are_independent() {
        let limiter = ConnectionLimiter::new(1);
        assert!(limiter.try_acquire("a"));
        assert!(limiter.try_acquire("b"));
        assert!(!limiter.try_acquire("a"));
    }
}
