//! Realtime channel protocol frames.
//!
//! The realtime server speaks the Phoenix channel protocol (v1 JSON
//! objects): every frame has a `topic`, an `event`, a `payload`, and an
//! optional `ref` that replies echo back.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use rt_core::error::{RtError, RtResult};

pub const PHX_JOIN: &str = "phx_join";
pub const PHX_LEAVE: &str = "phx_leave";
pub const PHX_REPLY: &str = "phx_reply";
pub const PHX_ERROR: &str = "phx_error";
pub const PHX_CLOSE: &str = "phx_close";
pub const HEARTBEAT: &str = "heartbeat";
pub const ACCESS_TOKEN: &str = "access_token";
pub const POSTGRES_CHANGES: &str = "postgres_changes";
pub const SYSTEM: &str = "system";

/// Topic heartbeats are sent on.
pub const PHOENIX_TOPIC: &str = "phoenix";

/// Prefix the server expects on channel topics.
pub const TOPIC_PREFIX: &str = "realtime:";

/// Full topic for a channel name.
pub fn topic_for(name: &str) -> String {
    if name.starts_with(TOPIC_PREFIX) {
        name.to_string()
    } else {
        format!("{TOPIC_PREFIX}{name}")
    }
}

/// A single protocol frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhoenixMessage {
    pub topic: String,
    pub event: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(rename = "ref", default)]
    pub msg_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_ref: Option<String>,
}

impl PhoenixMessage {
    /// Join `topic`, subscribing to the given `postgres_changes` bindings.
    pub fn join(topic: &str, changes: Vec<Value>, access_token: Option<&str>, msg_ref: &str) -> Self {
        let mut payload = json!({
            "config": {
                "broadcast": {"ack": false, "self": false},
                "presence": {"key": ""},
                "postgres_changes": changes,
                "private": false
            }
        });
        if let Some(token) = access_token {
            payload["access_token"] = Value::String(token.to_string());
        }
        Self {
            topic: topic.to_string(),
            event: PHX_JOIN.to_string(),
            payload,
            msg_ref: Some(msg_ref.to_string()),
            join_ref: Some(msg_ref.to_string()),
        }
    }

    pub fn leave(topic: &str, msg_ref: &str) -> Self {
        Self {
            topic: topic.to_string(),
            event: PHX_LEAVE.to_string(),
            payload: json!({}),
            msg_ref: Some(msg_ref.to_string()),
            join_ref: None,
        }
    }

    pub fn heartbeat(msg_ref: &str) -> Self {
        Self {
            topic: PHOENIX_TOPIC.to_string(),
            event: HEARTBEAT.to_string(),
            payload: json!({}),
            msg_ref: Some(msg_ref.to_string()),
            join_ref: None,
        }
    }

    /// Push a refreshed access token to a joined channel.
    pub fn access_token(topic: &str, token: &str, msg_ref: &str) -> Self {
        Self {
            topic: topic.to_string(),
            event: ACCESS_TOKEN.to_string(),
            payload: json!({ "access_token": token }),
            msg_ref: Some(msg_ref.to_string()),
            join_ref: None,
        }
    }

    /// Parse an inbound text frame.
    pub fn parse(text: &str) -> RtResult<Self> {
        serde_json::from_str(text)
            .map_err(|e| RtError::Realtime(format!("malformed frame: {e}")))
    }

    /// Encode as a text frame.
    pub fn to_text(&self) -> RtResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// `payload.status` of a reply frame.
    pub fn reply_status(&self) -> Option<&str> {
        if self.event != PHX_REPLY {
            return None;
        }
        self.payload.get("status").and_then(Value::as_str)
    }

    /// `payload.data` of a `postgres_changes` frame.
    pub fn change_data(&self) -> Option<&Value> {
        if self.event != POSTGRES_CHANGES {
            return None;
        }
        self.payload.get("data")
    }
}
