//! Client-message handling: the auth -> focus/blur -> ping state machine
//! described in spec.md §4.E, wired to the presence fabric components.

use std::sync::Arc;

use domain::{validate_user_key, ClientMessage, ServerMessage};
use presence::now_ms;
use uuid::Uuid;

use crate::error::SessionError;
use crate::session::Session;
use crate::state::Fabric;

pub async fn handle_message(fabric: &Fabric, session: &Arc<Session>, msg: ClientMessage) {
    let result = match msg {
        ClientMessage::Auth { user } => handle_auth(fabric, session, user).await,
        ClientMessage::Focus { users } => handle_focus(fabric, session, users).await,
        ClientMessage::Blur { users } => handle_blur(fabric, session, users).await,
        ClientMessage::Ping {} => handle_ping(session),
    };
    if let Err(err) = result {
        session.send(&ServerMessage::Error { message: err.to_message() });
    }
}

async fn handle_auth(fabric: &Fabric, session: &Arc<Session>, raw_user: String) -> Result<(), SessionError> {
    let user = validate_user_key(&raw_user)?.into_string();

    let (previous_user, previous_focus) = session.detach();
    release_identity(fabric, session.session_id, previous_user, previous_focus).await;

    // Store must acknowledge the claim before any local state reflects the
    // new identity (spec.md §7): a failed claim must leave this session
    // exactly as `detach()` left it, not half-authenticated.
    let claim = fabric.registry.claim_online(&user, &fabric.config.server_id).await?;

    session.set_authenticated(user.clone());
    fabric.sessions.attach_user(&user, session.session_id);

    if claim.became_online {
        if let Err(err) = fabric.flip.publish_flip(&user, true, now_ms()).await {
            tracing::warn!(user = %user, error = %err, "failed to publish online flip");
        }
    }

    session.send(&ServerMessage::AuthOk {
        user,
        server_id: fabric.config.server_id.clone(),
        heartbeat_ms: fabric.config.heartbeat_interval_ms,
        ttl_seconds: fabric.config.presence_ttl_seconds,
        last_seen_ms: claim.last_seen_ms,
    });
    Ok(())
}

async fn handle_focus(fabric: &Fabric, session: &Arc<Session>, users: Vec<String>) -> Result<(), SessionError> {
    if session.user().is_none() {
        return Err(SessionError::NotAuthenticated);
    }
    if !fabric.focus_limits.try_consume(&session.session_id.to_string()) {
        return Err(SessionError::FocusRateLimited);
    }

    let preview = session.preview_focus_add(&users, fabric.config.max_focus_per_client);
    let newly_on_server = fabric.sessions.preview_add_watchers(&preview.accepted);

    // The cross-server watcher-set addition must succeed before anything
    // local reflects it (spec.md §7): a failed `SADD` here must leave this
    // session's focus set and the local watcher index byte-for-byte
    // unchanged.
    if !newly_on_server.is_empty() {
        fabric.watchers.add_watchers(&newly_on_server, &fabric.config.server_id).await?;
    }

    session.commit_focus_add(&preview.newly_added);
    fabric.sessions.commit_add_watchers(&preview.accepted, session.session_id);

    let statuses = fabric.snapshot.snapshot(&preview.accepted).await?;
    session.send(&ServerMessage::FocusOk { statuses });
    Ok(())
}

async fn handle_blur(fabric: &Fabric, session: &Arc<Session>, users: Vec<String>) -> Result<(), SessionError> {
    if session.user().is_none() {
        return Err(SessionError::NotAuthenticated);
    }
    let removed = session.remove_focus(&users);
    let now_unwatched = fabric.sessions.remove_watchers(&removed, session.session_id);
    if !now_unwatched.is_empty() {
        fabric.watchers.remove_watchers(&now_unwatched, &fabric.config.server_id).await?;
    }
    session.send(&ServerMessage::BlurOk {});
    Ok(())
}

fn handle_ping(session: &Arc<Session>) -> Result<(), SessionError> {
    if session.user().is_none() {
        return Err(SessionError::NotAuthenticated);
    }
    session.send(&ServerMessage::Pong {});
    Ok(())
}

/// Shared identity teardown for re-auth and disconnect (spec.md §4.E): drop
/// this session's watcher registrations, and if it was the last local
/// session for `user`, release online-truth ownership and publish an
/// offline flip. A release that finds a different owner already in place
/// (spec.md §7 "ownership mismatch") is not an error and produces no flip.
pub async fn release_identity(fabric: &Fabric, session_id: Uuid, user: Option<String>, focus: Vec<String>) {
    let now_unwatched = fabric.sessions.remove_watchers(&focus, session_id);
    if !now_unwatched.is_empty() {
        if let Err(err) = fabric.watchers.remove_watchers(&now_unwatched, &fabric.config.server_id).await {
            tracing::warn!(error = %err, "failed to remove cross-server watcher entries");
        }
    }

    let Some(user) = user else { return };
    if !fabric.sessions.detach_user(&user, session_id) {
        return;
    }
    match fabric.registry.release_if_owned(&user, &fabric.config.server_id).await {
        Ok(true) => {
            if let Err(err) = fabric.flip.publish_flip(&user, false, now_ms()).await {
                tracing::warn!(user = %user, error = %err, "failed to publish offline flip");
            }
        }
        Ok(false) => {}
        Err(err) => tracing::warn!(user = %user, error = %err, "release_if_owned failed"),
    }
}
