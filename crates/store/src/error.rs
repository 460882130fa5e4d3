use thiserror::Error;

/// Typed failure modes for the store adapter, per spec.md §7's error
/// taxonomy: transient/unavailable store errors surface as a generic
/// internal error to the session; script failures are distinguished so
/// callers can tell "the store is broken" apart from "the script ran and
/// said no" (the latter is never an error — see `presence::PresenceRegistry`).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("script execution failed: {0}")]
    Script(String),
    #[error("payload codec error: {0}")]
    Codec(String),
}

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_unrecoverable_error() || err.is_connection_dropped() || err.is_io_error() {
            StoreError::Unavailable(err.to_string())
        } else {
            StoreError::Script(err.to_string())
        }
    }
}
