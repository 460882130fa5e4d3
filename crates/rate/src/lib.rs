//! Rate limiting for the gateway's two hot-path caps (spec.md §4.E): a
//! per-source-address connection count, and a per-session rolling-window
//! focus-call budget.

mod connection;
mod focus;

pub use connection::ConnectionLimiter;
pub use focus::FocusRateLimiter;
