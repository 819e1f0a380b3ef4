//! RoomThere Realtime - channel registry for row-change subscriptions.
//!
//! This crate provides the realtime channel manager that handles:
//! - Registering `postgres_changes` channels with per-channel callbacks
//! - Encoding join, leave, heartbeat, and token frames for the transport
//! - Routing inbound change frames to matching callbacks
//! - Change dispatching via tokio broadcast channels
//! - Rejoining channels after the transport reconnects

pub mod events;
pub mod manager;
pub mod protocol;

// Re-export key types
pub use events::{
    ChangeDispatcher, ChangeEventType, ChannelEvent, ChannelState, ConnectionState, PostgresChange,
};
pub use manager::{websocket_url, ChangeCallback, ChannelSpec, RealtimeClient, Subscription};
pub use protocol::PhoenixMessage;
