//! Change event types and the change dispatcher.
//!
//! Defines the row-change events the realtime server streams for
//! `postgres_changes` subscriptions and a broadcast-based dispatcher so any
//! number of consumers can observe them alongside the per-channel callbacks.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::debug;

use rt_core::error::{RtError, RtResult};

/// Row-change event kinds a channel can listen for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeEventType {
    Insert,
    Update,
    Delete,
    /// Every change (`*`).
    All,
    /// Unknown/unhandled event type.
    Unknown(String),
}

impl ChangeEventType {
    /// Parse an event type string from the server.
    pub fn from_str(s: &str) -> Self {
        match s {
            "INSERT" => Self::Insert,
            "UPDATE" => Self::Update,
            "DELETE" => Self::Delete,
            "*" => Self::All,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Convert to the server event string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::All => "*",
            Self::Unknown(s) => s.as_str(),
        }
    }

    /// Whether a listener for `self` should receive an event of kind `event`.
    pub fn accepts(&self, event: &ChangeEventType) -> bool {
        match self {
            Self::All => !matches!(event, Self::Unknown(_)),
            other => other == event,
        }
    }
}

impl std::fmt::Display for ChangeEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row change, as carried in a `postgres_changes` frame.
#[derive(Debug, Clone, PartialEq)]
pub struct PostgresChange {
    pub schema: String,
    pub table: String,
    pub commit_timestamp: Option<String>,
    pub event_type: ChangeEventType,
    /// The row after the change (empty for deletes).
    pub record: Value,
    /// The row before the change, when the table publishes it.
    pub old_record: Value,
}

impl PostgresChange {
    /// Parse the `data` object of a `postgres_changes` payload.
    pub fn from_data(data: &Value) -> RtResult<Self> {
        let text = |key: &str| data.get(key).and_then(Value::as_str).map(str::to_string);

        let event_type = text("type")
            .or_else(|| text("eventType"))
            .ok_or_else(|| RtError::Realtime("change without an event type".into()))?;

        Ok(Self {
            schema: text("schema").unwrap_or_default(),
            table: text("table").unwrap_or_default(),
            commit_timestamp: text("commit_timestamp"),
            event_type: ChangeEventType::from_str(&event_type),
            record: data.get("record").cloned().unwrap_or(Value::Null),
            old_record: data.get("old_record").cloned().unwrap_or(Value::Null),
        })
    }

    /// Deserialize the new row.
    pub fn record_as<T: DeserializeOwned>(&self) -> RtResult<T> {
        Ok(serde_json::from_value(self.record.clone())?)
    }
}

/// A change together with the channel topic it arrived on.
#[derive(Debug, Clone)]
pub struct ChannelEvent {
    pub topic: String,
    pub change: PostgresChange,
}

/// Broadcast-based dispatcher for row changes.
///
/// Uses tokio::broadcast channels so multiple consumers can independently
/// receive changes without blocking each other.
#[derive(Clone)]
pub struct ChangeDispatcher {
    sender: broadcast::Sender<ChannelEvent>,
}

impl ChangeDispatcher {
    /// Create a new ChangeDispatcher with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribe to receive changes from every channel.
    ///
    /// Slow consumers that fall behind receive `RecvError::Lagged`.
    pub fn subscribe(&self) -> broadcast::Receiver<ChannelEvent> {
        self.sender.subscribe()
    }

    /// Dispatch a change to all active subscribers.
    pub fn dispatch(&self, event: ChannelEvent) {
        let topic = event.topic.clone();
        match self.sender.send(event) {
            Ok(count) => debug!("dispatched change on {topic} to {count} subscriber(s)"),
            Err(_) => debug!("no subscribers for change on {topic}"),
        }
    }

    /// Get the current number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// State of the websocket as reported by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Connecting => write!(f, "connecting"),
            Self::Connected => write!(f, "connected"),
        }
    }
}

/// Join state of a single channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// Join sent, no reply yet.
    Joining,
    Joined,
    /// The server refused the join or reported a channel error.
    Errored,
    Closed,
}

impl std::fmt::Display for ChannelState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Joining => write!(f, "joining"),
            Self::Joined => write!(f, "joined"),
            Self::Errored => write!(f, "errored"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_type_roundtrip() {
        for event_type in [
            ChangeEventType::Insert,
            ChangeEventType::Update,
            ChangeEventType::Delete,
            ChangeEventType::All,
        ] {
            assert_eq!(ChangeEventType::from_str(event_type.as_str()), event_type);
        }
        assert_eq!(
            ChangeEventType::from_str("TRUNCATE"),
            ChangeEventType::Unknown("TRUNCATE".into())
        );
    }

    #[test]
    fn test_event_type_accepts() {
        assert!(ChangeEventType::Insert.accepts(&ChangeEventType::Insert));
        assert!(!ChangeEventType::Insert.accepts(&ChangeEventType::Update));
        assert!(ChangeEventType::All.accepts(&ChangeEventType::Delete));
        assert!(!ChangeEventType::All.accepts(&ChangeEventType::Unknown("x".into())));
    }

    #[test]
    fn test_change_from_data() {
        let data = json!({
            "schema": "public",
            "table": "messages",
            "commit_timestamp": "2024-03-01T12:00:00Z",
            "type": "INSERT",
            "record": {"id": "m-1", "content": "hi"},
            "old_record": null,
            "columns": []
        });
        let change = PostgresChange::from_data(&data).unwrap();
        assert_eq!(change.event_type, ChangeEventType::Insert);
        assert_eq!(change.table, "messages");
        assert_eq!(change.record["content"], "hi");
        assert!(change.old_record.is_null());

        assert!(PostgresChange::from_data(&json!({"table": "messages"})).is_err());
    }

    #[tokio::test]
    async fn test_change_dispatcher() {
        let dispatcher = ChangeDispatcher::new(16);
        let mut rx = dispatcher.subscribe();
        assert_eq!(dispatcher.subscriber_count(), 1);

        dispatcher.dispatch(ChannelEvent {
            topic: "realtime:messages:c-1".into(),
            change: PostgresChange {
                schema: "public".into(),
                table: "messages".into(),
                commit_timestamp: None,
                event_type: ChangeEventType::Insert,
                record: json!({"id": "m-1"}),
                old_record: Value::Null,
            },
        });

        let event = rx.recv().await.unwrap();
        assert_eq!(event.topic, "realtime:messages:c-1");
        assert_eq!(event.change.record["id"], "m-1");
    }

    #[test]
    fn test_state_display() {
        assert_eq!(ConnectionState::Connected.to_string(), "connected");
        assert_eq!(ChannelState::Joining.to_string(), "joining");
    }
}
