//! Route module aggregator. Each submodule defines a focused set of
//! routes; `all()` merges them into one router wired up in `main.rs`.

use axum::Router;

use crate::state::AppState;

pub mod auth;
pub mod root;
pub mod snapshot;
pub mod ws;

pub fn all() -> Router<AppState> {
    Router::new().merge(root::router()).merge(ws::router()).merge(auth::router()).merge(snapshot::router())
}
