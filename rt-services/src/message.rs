//! Conversation and message accessor.
//!
//! Conversations are keyed by the sorted participant pair, so A asking for
//! B and B asking for A land on the same row. Lookup-or-create is two
//! calls; a concurrent creator surfaces as a unique violation on insert,
//! which is resolved by reading the winner's row.

use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use rt_api::Backend;
use rt_core::constants::{channels, tables, DEFAULT_SCHEMA};
use rt_core::error::{RtError, RtResult};
use rt_models::models::message::{canonical_pair, summarize};
use rt_models::query::{Filter, Query};
use rt_models::schema;
use rt_models::{Conversation, ConversationSummary, ConversationThread, Message};
use rt_realtime::{ChangeEventType, ChannelSpec, PostgresChange, RealtimeClient, Subscription};

use crate::accessor::{decode_maybe_single, decode_rows, decode_single, require_principal, Accessor};

/// Conversations, messages, and live message feeds.
#[derive(Clone)]
pub struct MessageService {
    backend: Arc<dyn Backend>,
    realtime: RealtimeClient,
}

impl MessageService {
    pub fn new(backend: Arc<dyn Backend>, realtime: RealtimeClient) -> Self {
        Self { backend, realtime }
    }

    /// The conversation between the caller and `other_user_id`, created if
    /// it does not exist yet.
    pub async fn get_or_create_conversation(&self, other_user_id: Uuid) -> RtResult<Conversation> {
        let caller = require_principal(self.backend.as_ref()).await?;
        let (user1_id, user2_id) = canonical_pair(caller.id, other_user_id);

        if let Some(existing) = self.find_conversation(user1_id, user2_id).await? {
            return Ok(existing);
        }

        let query = Query::table(tables::CONVERSATIONS);
        match self
            .backend
            .insert(&query, Conversation::new_row(user1_id, user2_id))
            .await
        {
            Ok(rows) => {
                let conversation: Conversation = decode_single(rows)?;
                info!("created conversation {}", conversation.id);
                Ok(conversation)
            }
            Err(RtError::Backend(e)) if e.is_unique_violation() => {
                debug!("conversation {user1_id}/{user2_id} created concurrently, re-reading");
                match self.find_conversation(user1_id, user2_id).await? {
                    Some(existing) => Ok(existing),
                    None => Err(RtError::Backend(e)),
                }
            }
            Err(e) => Err(e),
        }
    }

    async fn find_conversation(&self, user1_id: Uuid, user2_id: Uuid) -> RtResult<Option<Conversation>> {
        let query = Query::table(tables::CONVERSATIONS)
            .eq("user1_id", user1_id)
            .eq("user2_id", user2_id);
        decode_maybe_single(self.backend.select(&query).await?)
    }

    /// The caller's inbox, most recently active first.
    pub async fn get_conversations(&self) -> RtResult<Vec<ConversationSummary>> {
        let caller = require_principal(self.backend.as_ref()).await?;
        let query = Query::table(tables::CONVERSATIONS)
            .select(schema::CONVERSATION_WITH_THREAD)
            .or(vec![
                Filter::equals("user1_id", caller.id),
                Filter::equals("user2_id", caller.id),
            ])
            .order("last_message_at", false);
        let threads: Vec<ConversationThread> = decode_rows(self.backend.select(&query).await?)?;

        Ok(threads
            .into_iter()
            .map(|thread| summarize(thread, caller.id))
            .collect())
    }

    /// Every message in a conversation, oldest first.
    pub async fn get_messages(&self, conversation_id: Uuid) -> RtResult<Vec<Message>> {
        let query = Query::table(tables::MESSAGES)
            .select(schema::MESSAGE_WITH_SENDER)
            .eq("conversation_id", conversation_id)
            .order("created_at", true);
        decode_rows(self.backend.select(&query).await?)
    }

    pub async fn send_message(
        &self,
        conversation_id: Uuid,
        recipient_id: Uuid,
        content: &str,
    ) -> RtResult<Message> {
        let caller = require_principal(self.backend.as_ref()).await?;
        let query = Query::table(tables::MESSAGES).select(schema::MESSAGE_WITH_SENDER);
        let row = Message::new_row(conversation_id, caller.id, recipient_id, content);
        let message: Message = decode_single(self.backend.insert(&query, row).await?)?;
        debug!("sent message {} in {conversation_id}", message.id);
        Ok(message)
    }

    /// Mark every unread message addressed to the caller in a conversation.
    pub async fn mark_messages_as_read(&self, conversation_id: Uuid) -> RtResult<()> {
        let caller = require_principal(self.backend.as_ref()).await?;
        let query = Query::table(tables::MESSAGES)
            .eq("conversation_id", conversation_id)
            .eq("recipient_id", caller.id)
            .eq("is_read", false);
        let updated = self
            .backend
            .update(&query, serde_json::json!({ "is_read": true }))
            .await?;
        debug!("marked {} messages read in {conversation_id}", updated.len());
        Ok(())
    }

    /// Unread messages addressed to the caller across all conversations.
    pub async fn get_unread_count(&self) -> RtResult<u64> {
        let caller = require_principal(self.backend.as_ref()).await?;
        let query = Query::table(tables::MESSAGES)
            .eq("recipient_id", caller.id)
            .eq("is_read", false);
        Ok(self.backend.count(&query).await?.unwrap_or(0))
    }

    /// Invoke `callback` for each message inserted into a conversation.
    ///
    /// The channel stays registered until `unsubscribe_from_messages`.
    pub async fn subscribe_to_messages<F>(
        &self,
        conversation_id: Uuid,
        callback: F,
    ) -> RtResult<Subscription>
    where
        F: Fn(PostgresChange) + Send + Sync + 'static,
    {
        let spec = ChannelSpec::postgres_changes(
            &channels::messages(&conversation_id.to_string()),
            ChangeEventType::Insert,
            DEFAULT_SCHEMA,
            tables::MESSAGES,
        )
        .with_filter(Filter::equals("conversation_id", conversation_id));
        self.realtime.subscribe(spec, callback).await
    }

    /// Drop the conversation's channel. Returns whether one was registered.
    pub async fn unsubscribe_from_messages(&self, conversation_id: Uuid) -> bool {
        self.realtime
            .remove_channel(&channels::messages(&conversation_id.to_string()))
            .await
    }
}

impl Accessor for MessageService {
    fn name(&self) -> &'static str {
        "messages"
    }
}
