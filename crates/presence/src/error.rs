use thiserror::Error;

#[derive(Debug, Error)]
pub enum PresenceError {
    #[error("store unavailable: {0}")]
    Store(#[from] store::StoreError),

    #[error("snapshot request exceeds max_snapshot_batch ({limit}): got {requested}")]
    BatchTooLarge { requested: usize, limit: usize },
}
