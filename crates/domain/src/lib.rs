//! Shared types and pure logic used by every presence-fabric crate:
//! user-key validation, the activity-bucket calculation, and the session
//! transport's wire message shapes. Nothing here talks to the store or the
//! network — it is the vocabulary the other crates share.

pub mod bucket;
pub mod protocol;
pub mod user_key;

pub use bucket::{bucket_for, Bucket};
pub use protocol::{ClientMessage, FlipEvent, PresenceStatus, ServerMessage};
pub use user_key::{normalize, validate_user_key, UserKey, UserKeyError};
