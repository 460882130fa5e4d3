//! Session transport wire format.
//!
//! Encoding choice fixed in SPEC_FULL.md §6: one newline-delimited JSON
//! object per text frame, `type` as the discriminator. `serde`'s adjacently
//! tagged enum (`tag = "type"`) produces exactly that shape without any
//! hand-written (de)serialization.

use serde::{Deserialize, Serialize};

use crate::bucket::Bucket;

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Auth { user: String },
    Focus { users: Vec<String> },
    Blur { users: Vec<String> },
    Ping {},
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    AuthOk {
        user: String,
        server_id: String,
        heartbeat_ms: u64,
        ttl_seconds: u64,
        last_seen_ms: Option<i64>,
    },
    FocusOk {
        statuses: Vec<PresenceStatus>,
    },
    BlurOk {},
    Pong {},
    PresenceUpdate {
        user: String,
        online: bool,
        timestamp_ms: i64,
    },
    Error {
        message: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PresenceStatus {
    pub user: String,
    pub online: bool,
    pub last_active_ms: Option<i64>,
    pub bucket: Bucket,
}

/// Payload published on a flip channel (spec.md §4.C).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlipEvent {
    pub user: String,
    pub online: bool,
    pub timestamp_ms: i64,
}

impl ServerMessage {
    /// Serialize to the wire form: one compact JSON object, no trailing
    /// newline (the transport frames messages, not this module).
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("ServerMessage always serializes")
    }
}

impl ClientMessage {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_roundtrips_through_json() {
        let msg = ClientMessage::from_json(r#"{"type":"auth","user":"a@x.com"}"#).unwrap();
        match msg {
            ClientMessage::Auth { user } => assert_eq!(user, "a@x.com"),
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn focus_alias_rejected_by_default_but_focus_accepted() {
        assert!(ClientMessage::from_json(r#"{"type":"focus","users":["a@x.com"]}"#).is_ok());
        assert!(ClientMessage::from_json(r#"{"type":"subscribe","users":["a@x.com"]}"#).is_err());
    }

    #[test]
    fn server_message_tag_shape() {
        let msg = ServerMessage::Pong {};
        assert_eq!(msg.to_json(), r#"{"type":"pong"}"#);
    }

    #[test]
    fn presence_update_serializes_expected_fields() {
        let msg = ServerMessage::PresenceUpdate { user: "a@x.com".into(), online: true, timestamp_ms: 5 };
        let json = msg.to_json();
        assert!(json.contains(r#""type":"presence_update""#));
        assert!(json.contains(r#""user":"a@x.com""#));
    }
}
