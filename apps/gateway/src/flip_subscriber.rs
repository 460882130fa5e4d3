//! Flip Subscriber (spec.md §4.F): subscribes to this server's own channel
//! (targeted mode) and delivers `presence_update` to every local session
//! watching the flipped user. Malformed payloads are logged once per
//! parse-failure reason and dropped; there is no retry or buffering beyond
//! the transport's own send queue.

use std::sync::Arc;

use domain::{FlipEvent, ServerMessage};
use presence::keys::server_channel;

use crate::state::Fabric;

pub async fn run(fabric: Arc<Fabric>) {
    let channel = server_channel(&fabric.config.server_id);
    let mut subscription = match fabric.store.subscribe(&channel).await {
        Ok(sub) => sub,
        Err(err) => {
            tracing::error!(channel = %channel, error = %err, "flip subscriber failed to subscribe, exiting");
            return;
        }
    };

    tracing::info!(channel = %channel, "flip subscriber listening");
    while let Some(payload) = subscription.recv().await {
        let event: FlipEvent = match serde_json::from_slice(&payload) {
            Ok(event) => event,
            Err(err) => {
                tracing::warn!(error = %err, "dropping malformed flip payload");
                continue;
            }
        };

        for session in fabric.sessions.sessions_watching(&event.user) {
            session.send(&ServerMessage::PresenceUpdate {
                user: event.user.clone(),
                online: event.online,
                timestamp_ms: event.timestamp_ms,
            });
        }
    }
    tracing::info!(channel = %channel, "flip subscriber channel closed");
}
