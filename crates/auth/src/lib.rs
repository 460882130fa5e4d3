//! Demo login stub. spec.md §1 places the REST login endpoint and the user
//! registry out of scope, treating them as external collaborators; this
//! crate is the minimal implementation needed so the gateway has a login
//! path to call at all. It performs the same syntactic validation the
//! session transport's `auth` message performs and nothing more —
//! identity verification beyond that is explicitly a non-goal.

use serde::Serialize;
use thiserror::Error;

use domain::UserKeyError;
use registry::UserRegistry;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid user key: {0}")]
    InvalidUserKey(#[from] UserKeyError),
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub user: String,
}

/// Validate `raw_user_key` and register it in the demo registry if it is
/// new. A real login endpoint would verify a password or token here; this
/// one only enforces the same user-key syntax the websocket `auth` message
/// enforces, per the Open Question decision in DESIGN.md.
pub fn login(registry: &UserRegistry, raw_user_key: &str) -> Result<LoginResponse, AuthError> {
    let key = registry.register(raw_user_key)?;
    Ok(LoginResponse { user: key.into_string() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_normalizes_and_registers() {
        let registry = UserRegistry::new();
        let response = login(&registry, " Test@Example.com ").unwrap();
        assert_eq!(response.user, "test@example.com");
        let key = domain::validate_user_key("test@example.com").unwrap();
        assert!(registry.is_known(&key));
    }

    #[test]
    fn login_rejects_malformed_key() {
        let registry = UserRegistry::new();
        assert!(login(&registry, "not-an-email").is_err());
    }
}
