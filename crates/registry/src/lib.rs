//! Demo-grade user registry (spec.md §1: out of scope, treated as an
//! external collaborator). A durable implementation would be a real user
//! database; this in-memory stand-in only tracks which user keys have ever
//! registered, which is enough for the demo login stub in crate `auth` to
//! decide whether a key is "known".

use std::collections::HashSet;
use std::sync::Mutex;

use domain::UserKey;

#[derive(Default)]
pub struct UserRegistry {
    known: Mutex<HashSet<UserKey>>,
}

impl UserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the registry from a static list, e.g. parsed from a dev-only
    /// config file. Invalid entries are skipped.
    pub fn with_seed<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let registry = Self::new();
        for entry in entries {
            let _ = registry.register(entry.as_ref());
        }
        registry
    }

    /// Register `raw` as a known user key, validating and normalizing it
    /// first. Returns the normalized key on success.
    pub fn register(&self, raw: &str) -> Result<UserKey, domain::UserKeyError> {
        let key = domain::validate_user_key(raw)?;
        self.known.lock().unwrap().insert(key.clone());
        Ok(key)
    }

    pub fn is_known(&self, key: &UserKey) -> bool {
        self.known.lock().unwrap().contains(key)
    }

    pub fn len(&self) -> usize {
        self.known.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_then_lookup_normalizes() {
        let registry = UserRegistry::new();
        let key = registry.register(" Alice@Example.com ").unwrap();
        assert_eq!(key.as_str(), "alice@example.com");
        assert!(registry.is_known(&key));
    }

    #[test]
    fn seed_skips_invalid_entries() {
        let registry = UserRegistry::with_seed(["a@x.com", "not-an-email", "b@y.com"]);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn unknown_key_reports_false() {
        let registry = UserRegistry::new();
        let key = domain::validate_user_key("nobody@x.com").unwrap();
        assert!(!registry.is_known(&key));
    }
}
