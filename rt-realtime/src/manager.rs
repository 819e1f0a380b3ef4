//! Realtime channel manager.
//!
//! Keeps the registry of `postgres_changes` channels, produces the protocol
//! frames the websocket transport must send, and routes inbound frames to
//! channel callbacks and the change dispatcher. The websocket itself is owned
//! by the embedding application: it drains `outbound` frames into the socket
//! and feeds every received text frame to `handle_frame`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::sync::{mpsc, watch, Mutex};
use tracing::{debug, info, warn};

use rt_core::config::{AppConfig, BackendConfig, RealtimeConfig};
use rt_core::constants;
use rt_core::error::{RtError, RtResult};
use rt_models::query::Filter;

use crate::events::{
    ChangeDispatcher, ChangeEventType, ChannelEvent, ChannelState, ConnectionState, PostgresChange,
};
use crate::protocol::{self, PhoenixMessage};

/// Callback invoked for each matching change on a channel.
pub type ChangeCallback = Arc<dyn Fn(PostgresChange) + Send + Sync>;

/// What a channel listens for.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelSpec {
    /// Channel name, without the `realtime:` prefix.
    pub name: String,
    pub event: ChangeEventType,
    pub schema: String,
    pub table: String,
    /// Optional row filter; realtime accepts one comparison or `in` list.
    pub filter: Option<Filter>,
}

impl ChannelSpec {
    /// Listen for `event` on `schema.table`.
    pub fn postgres_changes(name: &str, event: ChangeEventType, schema: &str, table: &str) -> Self {
        Self {
            name: name.to_string(),
            event,
            schema: schema.to_string(),
            table: table.to_string(),
            filter: None,
        }
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn topic(&self) -> String {
        protocol::topic_for(&self.name)
    }

    /// The `postgres_changes` binding sent in the join payload.
    pub fn binding(&self) -> RtResult<Value> {
        let mut binding = json!({
            "event": self.event.as_str(),
            "schema": self.schema,
            "table": self.table,
        });
        if let Some(filter) = &self.filter {
            let rendered = filter.to_realtime().ok_or_else(|| {
                RtError::Realtime(format!("filter not supported by realtime: {filter:?}"))
            })?;
            binding["filter"] = Value::String(rendered);
        }
        Ok(binding)
    }

    /// Whether `change` belongs to this channel's subscription.
    pub fn matches(&self, change: &PostgresChange) -> bool {
        self.event.accepts(&change.event_type)
            && change.schema == self.schema
            && change.table == self.table
            && self.filter.as_ref().map_or(true, |f| {
                let row = if change.record.is_null() || change.record == json!({}) {
                    &change.old_record
                } else {
                    &change.record
                };
                f.matches(row)
            })
    }
}

/// Handle for a registered channel. Release it with
/// `RealtimeClient::remove_channel(subscription.name())`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    name: String,
    topic: String,
}

impl Subscription {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}

struct Channel {
    spec: ChannelSpec,
    callback: ChangeCallback,
    state: ChannelState,
    join_ref: String,
}

/// Realtime channel manager.
///
/// Cloning is cheap; clones share the registry and the outbound queue.
#[derive(Clone)]
pub struct RealtimeClient {
    /// Websocket URL the transport should open.
    endpoint: String,
    /// Token sent with joins; the anon key when signed out.
    access_token: Arc<Mutex<Option<String>>>,
    /// Channels keyed by topic.
    channels: Arc<Mutex<HashMap<String, Channel>>>,
    outbound: mpsc::UnboundedSender<String>,
    dispatcher: ChangeDispatcher,
    next_ref: Arc<AtomicU64>,
    heartbeat_interval: Duration,
    state: Arc<Mutex<ConnectionState>>,
    state_tx: watch::Sender<ConnectionState>,
}

impl RealtimeClient {
    /// Create a manager and the receiver the transport drains frames from.
    pub fn new(
        backend: &BackendConfig,
        config: &RealtimeConfig,
    ) -> (Self, mpsc::UnboundedReceiver<String>) {
        let (outbound, rx) = mpsc::unbounded_channel();
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);

        let client = Self {
            endpoint: websocket_url(&backend.url, &backend.anon_key),
            access_token: Arc::new(Mutex::new(None)),
            channels: Arc::new(Mutex::new(HashMap::new())),
            outbound,
            dispatcher: ChangeDispatcher::new(config.channel_capacity),
            next_ref: Arc::new(AtomicU64::new(1)),
            heartbeat_interval: Duration::from_secs(config.heartbeat_interval_secs),
            state: Arc::new(Mutex::new(ConnectionState::Disconnected)),
            state_tx,
        };
        (client, rx)
    }

    pub fn websocket_url(&self) -> &str {
        &self.endpoint
    }

    /// How often the transport should call `heartbeat`.
    pub fn heartbeat_interval(&self) -> Duration {
        self.heartbeat_interval
    }

    /// Get the change dispatcher (for observing every channel).
    pub fn dispatcher(&self) -> &ChangeDispatcher {
        &self.dispatcher
    }

    /// Subscribe to connection state changes.
    pub fn state_receiver(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    pub async fn state(&self) -> ConnectionState {
        *self.state.lock().await
    }

    fn make_ref(&self) -> String {
        self.next_ref.fetch_add(1, Ordering::Relaxed).to_string()
    }

    fn push(&self, frame: PhoenixMessage) -> RtResult<()> {
        let text = frame.to_text()?;
        self.outbound
            .send(text)
            .map_err(|_| RtError::Realtime("transport closed".into()))
    }

    /// Set the token used to authorize channels, re-sending it to every
    /// joined channel.
    pub async fn set_access_token(&self, token: Option<String>) -> RtResult<()> {
        *self.access_token.lock().await = token.clone();
        let Some(token) = token else {
            return Ok(());
        };

        let topics: Vec<String> = {
            let channels = self.channels.lock().await;
            channels
                .iter()
                .filter(|(_, c)| c.state == ChannelState::Joined)
                .map(|(topic, _)| topic.clone())
                .collect()
        };
        for topic in topics {
            self.push(PhoenixMessage::access_token(&topic, &token, &self.make_ref()))?;
        }
        Ok(())
    }

    /// Register a channel and send its join. A channel already registered
    /// under the same name is left first.
    ///
    /// The channel is in the registry before its join is queued, so the
    /// reply always finds it.
    pub async fn subscribe<F>(&self, spec: ChannelSpec, callback: F) -> RtResult<Subscription>
    where
        F: Fn(PostgresChange) + Send + Sync + 'static,
    {
        let topic = spec.topic();
        let binding = spec.binding()?;

        if self.remove_channel(&spec.name).await {
            debug!("replaced existing channel {topic}");
        }

        let join_ref = self.make_ref();
        let subscription = Subscription {
            name: spec.name.clone(),
            topic: topic.clone(),
        };
        self.channels.lock().await.insert(
            topic.clone(),
            Channel {
                spec,
                callback: Arc::new(callback),
                state: ChannelState::Joining,
                join_ref: join_ref.clone(),
            },
        );

        let token = self.access_token.lock().await.clone();
        if let Err(e) = self.push(PhoenixMessage::join(&topic, vec![binding], token.as_deref(), &join_ref)) {
            self.channels.lock().await.remove(&topic);
            return Err(e);
        }
        info!("joining channel {topic}");
        Ok(subscription)
    }

    /// Leave and forget the channel `name`. Returns whether it existed;
    /// unknown names are a no-op.
    pub async fn remove_channel(&self, name: &str) -> bool {
        let topic = protocol::topic_for(name);
        let removed = self.channels.lock().await.remove(&topic);
        if removed.is_none() {
            debug!("remove_channel: no channel {topic}");
            return false;
        }

        if let Err(e) = self.push(PhoenixMessage::leave(&topic, &self.make_ref())) {
            debug!("leave for {topic} not sent: {e}");
        }
        info!("left channel {topic}");
        true
    }

    /// Names of all registered channels, sorted.
    pub async fn channel_names(&self) -> Vec<String> {
        let channels = self.channels.lock().await;
        let mut names: Vec<String> = channels.values().map(|c| c.spec.name.clone()).collect();
        names.sort();
        names
    }

    pub async fn channel_state(&self, name: &str) -> Option<ChannelState> {
        let topic = protocol::topic_for(name);
        self.channels.lock().await.get(&topic).map(|c| c.state)
    }

    /// Queue a heartbeat frame.
    pub fn heartbeat(&self) -> RtResult<()> {
        self.push(PhoenixMessage::heartbeat(&self.make_ref()))
    }

    /// Record a transport state change. On (re)connect every registered
    /// channel is joined again.
    pub async fn set_connection_state(&self, new_state: ConnectionState) -> RtResult<()> {
        {
            let mut state = self.state.lock().await;
            if *state == new_state {
                return Ok(());
            }
            info!("realtime state: {} -> {}", *state, new_state);
            *state = new_state;
        }
        let _ = self.state_tx.send(new_state);

        match new_state {
            ConnectionState::Connected => self.rejoin_all().await,
            ConnectionState::Disconnected => {
                let mut channels = self.channels.lock().await;
                for channel in channels.values_mut() {
                    channel.state = ChannelState::Closed;
                }
                Ok(())
            }
            ConnectionState::Connecting => Ok(()),
        }
    }

    async fn rejoin_all(&self) -> RtResult<()> {
        let token = self.access_token.lock().await.clone();
        let mut channels = self.channels.lock().await;
        for (topic, channel) in channels.iter_mut() {
            let join_ref = self.make_ref();
            let binding = channel.spec.binding()?;
            self.push(PhoenixMessage::join(topic, vec![binding], token.as_deref(), &join_ref))?;
            channel.join_ref = join_ref;
            channel.state = ChannelState::Joining;
        }
        Ok(())
    }

    /// Process one inbound text frame.
    ///
    /// Changes that match a channel's subscription are passed to its
    /// callback, then broadcast on the dispatcher.
    pub async fn handle_frame(&self, text: &str) -> RtResult<()> {
        let frame = PhoenixMessage::parse(text)?;

        match frame.event.as_str() {
            protocol::PHX_REPLY => self.on_reply(&frame).await,
            protocol::POSTGRES_CHANGES => self.on_change(&frame).await?,
            protocol::PHX_ERROR => {
                warn!("channel error on {}: {}", frame.topic, frame.payload);
                self.set_channel_state(&frame.topic, ChannelState::Errored).await;
            }
            protocol::PHX_CLOSE => {
                debug!("channel closed: {}", frame.topic);
                self.set_channel_state(&frame.topic, ChannelState::Closed).await;
            }
            protocol::SYSTEM => debug!("system message on {}: {}", frame.topic, frame.payload),
            other => debug!("ignoring {other} on {}", frame.topic),
        }
        Ok(())
    }

    async fn on_reply(&self, frame: &PhoenixMessage) {
        let status = frame.reply_status().unwrap_or("");
        let mut channels = self.channels.lock().await;
        let Some(channel) = channels.get_mut(&frame.topic) else {
            return;
        };
        if channel.state != ChannelState::Joining || frame.msg_ref.as_deref() != Some(channel.join_ref.as_str()) {
            return;
        }

        if status == "ok" {
            channel.state = ChannelState::Joined;
            info!("joined channel {}", frame.topic);
        } else {
            channel.state = ChannelState::Errored;
            warn!("join refused on {}: {}", frame.topic, frame.payload);
        }
    }

    async fn on_change(&self, frame: &PhoenixMessage) -> RtResult<()> {
        let data = frame
            .change_data()
            .ok_or_else(|| RtError::Realtime("postgres_changes without data".into()))?;
        let change = PostgresChange::from_data(data)?;

        // Release the registry before running user code.
        let callback = {
            let channels = self.channels.lock().await;
            channels
                .get(&frame.topic)
                .filter(|c| c.spec.matches(&change))
                .map(|c| Arc::clone(&c.callback))
        };

        match callback {
            Some(callback) => callback(change.clone()),
            None => {
                debug!("change on {} matched no subscription", frame.topic);
                return Ok(());
            }
        }

        self.dispatcher.dispatch(ChannelEvent {
            topic: frame.topic.clone(),
            change,
        });
        Ok(())
    }

    async fn set_channel_state(&self, topic: &str, state: ChannelState) {
        if let Some(channel) = self.channels.lock().await.get_mut(topic) {
            channel.state = state;
        }
    }
}

/// Websocket URL for a project: `wss://<host>/realtime/v1/websocket?apikey=..&vsn=..`.
pub fn websocket_url(project_url: &str, anon_key: &str) -> String {
    let origin = AppConfig::sanitize_project_url(project_url);
    let ws_origin = if let Some(rest) = origin.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = origin.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        origin
    };
    format!(
        "{ws_origin}{}?apikey={anon_key}&vsn={}",
        constants::REALTIME_PATH,
        constants::REALTIME_PROTOCOL_VERSION
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    fn test_client() -> (RealtimeClient, mpsc::UnboundedReceiver<String>) {
        let backend = BackendConfig {
            url: "https://abcd.supabase.co".into(),
            anon_key: "anon".into(),
            ..Default::default()
        };
        RealtimeClient::new(&backend, &RealtimeConfig::default())
    }

    fn message_spec(conversation: &str) -> ChannelSpec {
        ChannelSpec::postgres_changes(
            &format!("messages:{conversation}"),
            ChangeEventType::Insert,
            "public",
            "messages",
        )
        .with_filter(Filter::equals("conversation_id", conversation))
    }

    fn change_frame(topic: &str, event: &str, conversation: &str) -> String {
        json!({
            "topic": topic,
            "event": "postgres_changes",
            "payload": {
                "data": {
                    "schema": "public",
                    "table": "messages",
                    "commit_timestamp": "2024-03-01T12:00:00Z",
                    "type": event,
                    "record": {"id": "m-1", "conversation_id": conversation, "content": "hi"},
                    "old_record": {}
                },
                "ids": [1]
            },
            "ref": null
        })
        .to_string()
    }

    fn next_frame(rx: &mut mpsc::UnboundedReceiver<String>) -> Value {
        serde_json::from_str(&rx.try_recv().unwrap()).unwrap()
    }

    #[test]
    fn test_websocket_url() {
        assert_eq!(
            websocket_url("abcd.supabase.co", "k"),
            "wss://abcd.supabase.co/realtime/v1/websocket?apikey=k&vsn=1.0.0"
        );
        assert_eq!(
            websocket_url("http://localhost:54321/", "k"),
            "ws://localhost:54321/realtime/v1/websocket?apikey=k&vsn=1.0.0"
        );
    }

    #[test]
    fn test_spec_binding_renders_filter() {
        let binding = message_spec("c-1").binding().unwrap();
        assert_eq!(binding["event"], "INSERT");
        assert_eq!(binding["filter"], "conversation_id=eq.c-1");

        let unsupported = message_spec("c-1").with_filter(Filter::Or(vec![]));
        assert!(unsupported.binding().is_err());
    }

    #[tokio::test]
    async fn test_subscribe_sends_join_with_token() {
        let (client, mut rx) = test_client();
        client.set_access_token(Some("jwt".into())).await.unwrap();

        let sub = client.subscribe(message_spec("c-1"), |_| {}).await.unwrap();
        assert_eq!(sub.topic(), "realtime:messages:c-1");

        let join = next_frame(&mut rx);
        assert_eq!(join["event"], "phx_join");
        assert_eq!(join["topic"], "realtime:messages:c-1");
        assert_eq!(join["payload"]["access_token"], "jwt");
        assert_eq!(
            join["payload"]["config"]["postgres_changes"][0]["filter"],
            "conversation_id=eq.c-1"
        );
        assert_eq!(client.channel_state("messages:c-1").await, Some(ChannelState::Joining));
    }

    #[tokio::test]
    async fn test_join_reply_marks_channel_joined() {
        let (client, mut rx) = test_client();
        client.subscribe(message_spec("c-1"), |_| {}).await.unwrap();
        let join_ref = next_frame(&mut rx)["ref"].as_str().unwrap().to_string();

        let reply = json!({
            "topic": "realtime:messages:c-1",
            "event": "phx_reply",
            "payload": {"status": "ok", "response": {}},
            "ref": join_ref
        });
        client.handle_frame(&reply.to_string()).await.unwrap();
        assert_eq!(client.channel_state("messages:c-1").await, Some(ChannelState::Joined));
    }

    #[tokio::test]
    async fn test_matching_insert_reaches_callback_and_dispatcher() {
        let (client, _rx) = test_client();
        let seen = Arc::new(StdMutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        client
            .subscribe(message_spec("c-1"), move |change| {
                sink.lock().unwrap().push(change.record["content"].clone());
            })
            .await
            .unwrap();
        let mut events = client.dispatcher().subscribe();

        let topic = "realtime:messages:c-1";
        client.handle_frame(&change_frame(topic, "INSERT", "c-1")).await.unwrap();
        // Wrong event type and wrong conversation are both dropped.
        client.handle_frame(&change_frame(topic, "UPDATE", "c-1")).await.unwrap();
        client.handle_frame(&change_frame(topic, "INSERT", "c-2")).await.unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![json!("hi")]);
        let event = events.recv().await.unwrap();
        assert_eq!(event.topic, topic);
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_remove_channel_sends_leave_and_is_idempotent() {
        let (client, mut rx) = test_client();
        client.subscribe(message_spec("c-1"), |_| {}).await.unwrap();
        let _join = next_frame(&mut rx);

        assert!(client.remove_channel("messages:c-1").await);
        let leave = next_frame(&mut rx);
        assert_eq!(leave["event"], "phx_leave");
        assert_eq!(leave["topic"], "realtime:messages:c-1");

        assert!(!client.remove_channel("messages:c-1").await);
        assert!(!client.remove_channel("messages:never").await);
        assert!(rx.try_recv().is_err());
        assert!(client.channel_names().await.is_empty());
    }

    #[tokio::test]
    async fn test_resubscribe_replaces_channel() {
        let (client, mut rx) = test_client();
        client.subscribe(message_spec("c-1"), |_| {}).await.unwrap();
        client.subscribe(message_spec("c-1"), |_| {}).await.unwrap();

        let events: Vec<String> = (0..3)
            .map(|_| next_frame(&mut rx)["event"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(events, vec!["phx_join", "phx_leave", "phx_join"]);
        assert_eq!(client.channel_names().await, vec!["messages:c-1".to_string()]);
    }

    #[tokio::test]
    async fn test_reconnect_rejoins_channels() {
        let (client, mut rx) = test_client();
        client.subscribe(message_spec("c-1"), |_| {}).await.unwrap();
        let _join = next_frame(&mut rx);

        client.set_connection_state(ConnectionState::Connected).await.unwrap();
        assert_eq!(next_frame(&mut rx)["event"], "phx_join");

        client.set_connection_state(ConnectionState::Disconnected).await.unwrap();
        assert_eq!(client.channel_state("messages:c-1").await, Some(ChannelState::Closed));
        assert_eq!(client.state().await, ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_heartbeat_frame() {
        let (client, mut rx) = test_client();
        client.heartbeat().unwrap();
        let frame = next_frame(&mut rx);
        assert_eq!(frame["topic"], "phoenix");
        assert_eq!(frame["event"], "heartbeat");
        assert_eq!(client.heartbeat_interval(), Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_subscribe_fails_when_transport_gone() {
        let (client, rx) = test_client();
        drop(rx);
        let err = client.subscribe(message_spec("c-1"), |_| {}).await.unwrap_err();
        assert!(matches!(err, RtError::Realtime(_)));
        assert!(client.channel_names().await.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_immediate_join_reply_is_not_lost() {
        let (client, mut rx) = test_client();
        let transport = client.clone();
        let replies = tokio::spawn(async move {
            while let Some(text) = rx.recv().await {
                let frame: Value = serde_json::from_str(&text).unwrap();
                if frame["event"] != "phx_join" {
                    continue;
                }
                let reply = json!({
                    "topic": frame["topic"],
                    "event": "phx_reply",
                    "payload": {"status": "ok", "response": {}},
                    "ref": frame["ref"]
                });
                transport.handle_frame(&reply.to_string()).await.unwrap();
            }
        });

        for i in 0..20 {
            let name = format!("c-{i}");
            client.subscribe(message_spec(&name), |_| {}).await.unwrap();
            let channel = format!("messages:{name}");
            let mut joined = false;
            for _ in 0..200 {
                if client.channel_state(&channel).await == Some(ChannelState::Joined) {
                    joined = true;
                    break;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            assert!(joined, "{channel} never joined");
        }
        replies.abort();
    }
}
