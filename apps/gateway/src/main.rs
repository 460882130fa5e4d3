//! Gateway entrypoint (Axum + Tokio).
//!
//! Wires up the Store Adapter, the presence fabric (`Fabric`/`AppState`),
//! the Flip Subscriber and heartbeat tick background tasks, and the HTTP
//! router (websocket session transport + auth/snapshot REST convenience
//! routes), then serves with graceful shutdown (spec.md §5).

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::Method;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use store::{RedisStore, Store};

mod config;
mod error;
mod flip_subscriber;
mod handler;
mod heartbeat;
mod routes;
mod session;
mod sessions;
mod state;

use crate::config::Config;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let config = Config::from_env();
    tracing::info!(server_id = %config.server_id, port = config.port, "starting presence gateway");

    // Fail fast on bootstrap (spec.md §6): an unreachable store is a
    // non-zero exit, not a degraded-mode start.
    let store = RedisStore::connect(&config.store_url).await.context("connecting to store at bootstrap")?;
    if !store.healthy().await {
        anyhow::bail!("store did not respond to initial health check");
    }

    let state = AppState::new(Arc::new(store), config.clone());

    let flip_subscriber_handle = tokio::spawn(flip_subscriber::run(state.fabric.clone()));
    let heartbeat_handle = tokio::spawn(heartbeat::run(state.fabric.clone()));

    let cors = cors_layer();
    let app = routes::all().with_state(state.clone()).layer(TraceLayer::new_for_http()).layer(cors);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await.with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, "listening");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Stop accepting has already happened (serve() returned); stop the
    // background tasks before letting the store connection drop.
    heartbeat_handle.abort();
    flip_subscriber_handle.abort();
    for session in state.fabric.sessions.all() {
        session.terminate();
    }

    Ok(())
}

fn cors_layer() -> CorsLayer {
    let methods = [Method::GET, Method::POST, Method::OPTIONS];
    let origins: Vec<axum::http::HeaderValue> = std::env::var("CORS_ALLOW_ORIGINS")
        .ok()
        .map(|raw| raw.split(',').filter_map(|o| axum::http::HeaderValue::from_str(o.trim()).ok()).collect())
        .unwrap_or_default();
    let allow_origin = if origins.is_empty() { AllowOrigin::any() } else { AllowOrigin::list(origins) };
    CorsLayer::new().allow_methods(methods).allow_origin(allow_origin)
}

async fn shutdown_signal() {
    let _ = signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
