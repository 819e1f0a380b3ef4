//! Conversations, messages, and the per-caller conversation summary.
//!
//! The summary derivation (`summarize`, `last_message`, `unread_count`) is
//! pure: it takes a fetched thread and the caller's id and never touches the
//! backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use super::null_to_default;
use super::profile::Profile;

/// Sort two participant ids into the order used as the conversation key.
pub fn canonical_pair(a: Uuid, b: Uuid) -> (Uuid, Uuid) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// A row of `conversations`. `user1_id <= user2_id` always holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub user1_id: Uuid,
    pub user2_id: Uuid,
    #[serde(default)]
    pub last_message_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Conversation {
    /// Row for a new conversation between two users, in canonical order.
    pub fn new_row(a: Uuid, b: Uuid) -> Value {
        let (user1_id, user2_id) = canonical_pair(a, b);
        json!({ "user1_id": user1_id, "user2_id": user2_id })
    }

    /// The participant that is not `caller`.
    pub fn partner_id(&self, caller: Uuid) -> Uuid {
        if self.user1_id == caller {
            self.user2_id
        } else {
            self.user1_id
        }
    }
}

/// Public sender fields embedded in message reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SenderSummary {
    pub id: Uuid,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
}

/// A row of `messages`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub content: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<SenderSummary>,
}

impl Message {
    pub fn new_row(conversation_id: Uuid, sender_id: Uuid, recipient_id: Uuid, content: &str) -> Value {
        json!({
            "conversation_id": conversation_id,
            "sender_id": sender_id,
            "recipient_id": recipient_id,
            "content": content,
        })
    }
}

/// The message projection embedded in conversation reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessagePreview {
    pub id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "null_to_default")]
    pub is_read: bool,
    pub sender_id: Uuid,
}

/// A conversation as fetched for the inbox: both participants and its messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationThread {
    #[serde(flatten)]
    pub conversation: Conversation,
    #[serde(default)]
    pub user1: Option<Profile>,
    #[serde(default)]
    pub user2: Option<Profile>,
    #[serde(default, deserialize_with = "null_to_default")]
    pub messages: Vec<MessagePreview>,
}

/// A thread annotated for one participant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationSummary {
    #[serde(flatten)]
    pub thread: ConversationThread,
    pub partner: Option<Profile>,
    pub last_message: Option<MessagePreview>,
    pub unread_count: usize,
}

/// The message with the greatest `created_at`, if any.
pub fn last_message(messages: &[MessagePreview]) -> Option<&MessagePreview> {
    messages.iter().max_by_key(|m| m.created_at)
}

/// Messages not sent by `caller` that are still unread.
pub fn unread_count(messages: &[MessagePreview], caller: Uuid) -> usize {
    messages
        .iter()
        .filter(|m| m.sender_id != caller && !m.is_read)
        .count()
}

/// Derive partner, last message, and unread count for `caller`.
pub fn summarize(thread: ConversationThread, caller: Uuid) -> ConversationSummary {
    let partner = if thread.conversation.user1_id == caller {
        thread.user2.clone()
    } else {
        thread.user1.clone()
    };
    let last_message = last_message(&thread.messages).cloned();
    let unread_count = unread_count(&thread.messages, caller);

    ConversationSummary {
        thread,
        partner,
        last_message,
        unread_count,
    }
}
