//! Demo login route (spec.md §1: the login endpoint is an out-of-scope
//! collaborator; this wraps crate `auth`'s stub so the gateway has
//! something to call). Trimmed from the teacher's signup/login/session
//! cookie flow, which depended on the credential store and JWT stack this
//! repo no longer carries.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;

use auth::LoginResponse;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/auth/login", post(login))
}

#[derive(Deserialize)]
struct LoginRequest {
    user: String,
}

async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, (StatusCode, String)> {
    auth::login(&state.fabric.user_registry, &payload.user)
        .map(Json)
        .map_err(|err| (StatusCode::BAD_REQUEST, err.to_string()))
}
