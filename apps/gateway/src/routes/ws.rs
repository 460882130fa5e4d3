//! WebSocket endpoint `/ws`: the session transport (spec.md §4.E, §6).
//!
//! Flow: upgrade -> per-address connection cap check -> spawn a writer task
//! that drains the session's outbound channel onto the socket -> read loop
//! parsing one JSON object per text frame and handing it to `handler`.
//! Grounded on the teacher's split reader/writer websocket shape in this
//! same file, generalized from a single-room relay into the auth ->
//! focus/blur -> heartbeat -> disconnect state machine.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use uuid::Uuid;

use domain::{ClientMessage, ServerMessage};

use crate::handler;
use crate::session::Session;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/ws", get(ws_handler))
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
) -> impl IntoResponse {
    let address = addr.ip().to_string();
    if !state.fabric.connections.try_acquire(&address) {
        tracing::info!(address = %address, "rejecting connection: per-address cap exceeded");
        return StatusCode::TOO_MANY_REQUESTS.into_response();
    }
    ws.on_upgrade(move |socket| handle_socket(socket, state, address))
}

async fn handle_socket(socket: WebSocket, state: AppState, address: String) {
    let fabric = state.fabric;
    let session_id = Uuid::new_v4();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();
    let session = Arc::new(Session::new(session_id, address.clone(), outbound_tx));
    fabric.sessions.insert(session.clone());

    let (mut ws_sink, mut ws_stream) = socket.split();
    let writer = tokio::spawn(async move {
        while let Some(msg) = outbound_rx.recv().await {
            if ws_sink.send(msg).await.is_err() {
                break;
            }
        }
    });

    while let Some(frame) = ws_stream.next().await {
        let Ok(frame) = frame else { break };
        match frame {
            Message::Text(text) => match ClientMessage::from_json(&text) {
                Ok(msg) => handler::handle_message(&fabric, &session, msg).await,
                Err(err) => {
                    session.send(&ServerMessage::Error { message: format!("malformed message: {err}") });
                }
            },
            Message::Pong(_) => {
                if let Some(user) = session.on_pong(fabric.config.refresh_cooldown_ms()) {
                    if let Err(err) = fabric.registry.refresh(&user, &fabric.config.server_id).await {
                        tracing::warn!(user = %user, error = %err, "refresh failed");
                    }
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    writer.abort();
    fabric.sessions.remove(session_id);
    fabric.connections.release(&address);
    fabric.focus_limits.remove_session(&session_id.to_string());

    let (user, focus) = session.detach();
    session.close();
    handler::release_identity(&fabric, session_id, user, focus).await;
}
