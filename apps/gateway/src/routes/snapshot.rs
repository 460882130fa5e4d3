//! `GET /presence/snapshot?users=a@x,b@x` — operational convenience over
//! Batch Query (spec.md §4.G), for polling presence outside an open
//! session. The websocket `focus`/`focus_ok` path is the protocol-required
//! surface; this is a thin JSON wrapper grounded on the teacher's
//! `routes/admin.rs`-style handlers.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use domain::PresenceStatus;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/presence/snapshot", get(snapshot))
}

#[derive(Deserialize)]
struct SnapshotQuery {
    users: String,
}

async fn snapshot(
    State(state): State<AppState>,
    Query(q): Query<SnapshotQuery>,
) -> Result<Json<Vec<PresenceStatus>>, (StatusCode, String)> {
    let users: Vec<String> = q.users.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect();
    state.fabric.snapshot.snapshot(&users).await.map(Json).map_err(|err| (StatusCode::BAD_REQUEST, err.to_string()))
}
