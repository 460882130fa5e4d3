//! Root and health endpoints.
//! - `/` is a smoke-test endpoint.
//! - `/healthz` reports liveness and the store connection's health, used by
//!   orchestrators to decide whether to route traffic to this process.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use store::Store;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(root)).route("/healthz", get(healthz))
}

async fn root() -> Html<&'static str> {
    Html("presence gateway up")
}

async fn healthz(State(state): State<AppState>) -> (StatusCode, &'static str) {
    if state.fabric.store.healthy().await {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "store unreachable")
    }
}
