//! Normalization and syntactic validation for the opaque, email-shaped user key.
//!
//! The fabric never authenticates a user key against a real identity
//! provider — it only requires that the same human always produces the
//! same bytes, and that obviously malformed input is rejected before it
//! reaches the store.

use std::fmt;

/// A user key after trim-and-lowercase normalization.
///
/// Two keys compare equal iff their normalized forms are byte-equal, per
/// the glossary definition. Construction always goes through
/// [`validate_user_key`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct UserKey(String);

impl UserKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for UserKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for UserKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum UserKeyError {
    #[error("user key is empty")]
    Empty,
    #[error("user key must contain exactly one '@'")]
    MissingOrDuplicateAt,
    #[error("user key local part is empty")]
    EmptyLocalPart,
    #[error("user key domain part must contain a '.' separating non-empty labels")]
    InvalidDomain,
}

/// Trim surrounding whitespace and lower-case. Pure string transform, no
/// validation — callers that need a trusted [`UserKey`] should call
/// [`validate_user_key`] instead.
pub fn normalize(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Normalize and syntactically validate a user key.
///
/// Fixed predicate (spec.md §9 Open Question): exactly one `@`, a
/// non-empty local part, and a domain part containing at least one `.`
/// with non-empty labels on both sides (so `a@b.` and `a@.b` are
/// rejected but `a@b.co` is accepted). This same predicate is applied by
/// every entry point that accepts a user key — the websocket `auth`
/// handler and the demo REST login stub — so the two paths never
/// disagree about what counts as a valid key.
pub fn validate_user_key(raw: &str) -> Result<UserKey, UserKeyError> {
    let normalized = normalize(raw);
    if normalized.is_empty() {
        return Err(UserKeyError::Empty);
    }

    let mut parts = normalized.splitn(2, '@');
    let local = parts.next().unwrap_or("");
    let domain = match parts.next() {
        Some(d) => d,
        None => return Err(UserKeyError::MissingOrDuplicateAt),
    };
    if normalized.matches('@').count() != 1 {
        return Err(UserKeyError::MissingOrDuplicateAt);
    }
    if local.is_empty() {
        return Err(UserKeyError::EmptyLocalPart);
    }

    let dot = domain.find('.').ok_or(UserKeyError::InvalidDomain)?;
    let (before, after) = (&domain[..dot], &domain[dot + 1..]);
    if before.is_empty() || after.is_empty() {
        return Err(UserKeyError::InvalidDomain);
    }

    Ok(UserKey(normalized))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_and_lowercases() {
        let key = validate_user_key("  Alice@Example.COM  ").unwrap();
        assert_eq!(key.as_str(), "alice@example.com");
    }

    #[test]
    fn rejects_missing_at() {
        assert_eq!(validate_user_key("alice.example.com"), Err(UserKeyError::MissingOrDuplicateAt));
    }

    #[test]
    fn rejects_double_at() {
        assert_eq!(validate_user_key("a@b@c.com"), Err(UserKeyError::MissingOrDuplicateAt));
    }

    #[test]
    fn rejects_empty_local_part() {
        assert_eq!(validate_user_key("@example.com"), Err(UserKeyError::EmptyLocalPart));
    }

    #[test]
    fn rejects_domain_without_dot() {
        assert_eq!(validate_user_key("a@localhost"), Err(UserKeyError::InvalidDomain));
    }

    #[test]
    fn rejects_dangling_dot() {
        assert_eq!(validate_user_key("a@b."), Err(UserKeyError::InvalidDomain));
        assert_eq!(validate_user_key("a@.b"), Err(UserKeyError::InvalidDomain));
    }

    #[test]
    fn rejects_empty_input() {
        assert_eq!(validate_user_key("   "), Err(UserKeyError::Empty));
    }

    #[test]
    fn accepts_own_key_focus_is_not_special_cased_here() {
        // Focusing one's own key is a session-manager concern (allowed);
        // validation itself treats it like any other key.
        assert!(validate_user_key("me@example.com").is_ok());
    }
}
