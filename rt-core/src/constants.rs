//! Application-wide constants.

/// Application name.
pub const APP_NAME: &str = "RoomThere";

/// Application version.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Rolling log file prefix.
pub const LOG_FILE_NAME: &str = "roomthere.log";

/// PostgREST path prefix.
pub const REST_PATH: &str = "/rest/v1";

/// GoTrue path prefix.
pub const AUTH_PATH: &str = "/auth/v1";

/// Realtime websocket path.
pub const REALTIME_PATH: &str = "/realtime/v1/websocket";

/// Realtime protocol version sent as the `vsn` query parameter.
pub const REALTIME_PROTOCOL_VERSION: &str = "1.0.0";

/// Default schema exposed by PostgREST.
pub const DEFAULT_SCHEMA: &str = "public";

/// Default API request timeout in milliseconds.
pub const DEFAULT_API_TIMEOUT_MS: u64 = 30_000;

/// Default capacity of the realtime change broadcast channel.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Default realtime heartbeat interval in seconds.
pub const DEFAULT_HEARTBEAT_INTERVAL_SECS: u64 = 30;

/// Backend table names.
pub mod tables {
    pub const PROFILES: &str = "profiles";
    pub const RENTER_PROFILES: &str = "renter_profiles";
    pub const HOMEOWNER_PROFILES: &str = "homeowner_profiles";
    pub const ROOM_LISTINGS: &str = "room_listings";
    pub const APPLICATIONS: &str = "applications";
    pub const CONVERSATIONS: &str = "conversations";
    pub const MESSAGES: &str = "messages";
    pub const SAVED_LISTINGS: &str = "saved_listings";
    pub const CONTACT_SUBMISSIONS: &str = "contact_submissions";
    pub const PROBLEM_REPORTS: &str = "problem_reports";
}

/// Remote procedures exposed by the backend.
pub mod rpc {
    /// Atomically bumps `room_listings.view_count`; takes `listing_uuid`.
    pub const INCREMENT_LISTING_VIEWS: &str = "increment_listing_views";
}

/// Realtime channel naming.
pub mod channels {
    /// Prefix for per-conversation message channels.
    pub const MESSAGES_PREFIX: &str = "messages";

    /// Channel name for a conversation's message feed.
    pub fn messages(conversation_id: &str) -> String {
        format!("{MESSAGES_PREFIX}:{conversation_id}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_channel_name() {
        assert_eq!(channels::messages("abc"), "messages:abc");
    }

    #[test]
    fn test_paths_are_rooted() {
        for path in [REST_PATH, AUTH_PATH, REALTIME_PATH] {
            assert!(path.starts_with('/'));
            assert!(!path.ends_with('/'));
        }
    }
}
