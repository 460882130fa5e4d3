use thiserror::Error;

/// Error taxonomy for the session boundary (spec.md §7). Every variant
/// maps to a typed `error` reply; none of them close the session by
/// themselves — only the rate-limit connection cap and transport-level
/// failures do that, and those are handled before a `SessionError` would
/// even be constructed.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("malformed message: {0}")]
    MalformedMessage(String),

    #[error("invalid user key: {0}")]
    InvalidUserKey(#[from] domain::UserKeyError),

    #[error("not authenticated")]
    NotAuthenticated,

    #[error("focus rate limit exceeded")]
    FocusRateLimited,

    #[error("store unavailable")]
    Store(#[from] presence::PresenceError),
}

impl SessionError {
    pub fn to_message(&self) -> String {
        self.to_string()
    }
}
