//! Conversation and message commands.

use clap::Subcommand;
use console::style;
use uuid::Uuid;

use rt_core::config::ConfigHandle;
use rt_core::error::RtResult;
use crate::OutputFormat;

#[derive(Subcommand)]
pub enum MessagesAction {
    /// List your conversations, most recent first.
    Inbox,
    /// Find or start the conversation with another user.
    Open { user_id: Uuid },
    /// Show a conversation and mark it read.
    Read {
        conversation_id: Uuid,
        /// Leave messages unread.
        #[arg(long)]
        keep_unread: bool,
    },
    /// Send a message.
    Send {
        conversation_id: Uuid,
        /// User the message is for.
        #[arg(short, long)]
        to: Uuid,
        /// Message text.
        content: String,
    },
    /// Count unread messages across all conversations.
    Unread,
}

pub async fn run(config: ConfigHandle, action: MessagesAction, format: OutputFormat) -> RtResult<()> {
    let app = super::connect(&config).await?;

    match action {
        MessagesAction::Inbox => {
            let conversations = app.messages.get_conversations().await?;
            if let OutputFormat::Json = format {
                return super::print_json(&conversations);
            }
            if conversations.is_empty() {
                println!("No conversations yet.");
                return Ok(());
            }

            let mut table = super::new_table(vec!["With", "Last message", "When", "Unread", "Id"]);
            for c in &conversations {
                let partner = c
                    .partner
                    .as_ref()
                    .map(|p| p.display_name())
                    .unwrap_or_else(|| "-".into());
                let (last, when) = match &c.last_message {
                    Some(m) => (
                        super::truncate(&m.content, 40),
                        m.created_at.format("%Y-%m-%d %H:%M").to_string(),
                    ),
                    None => ("-".to_string(), "-".to_string()),
                };
                let unread = if c.unread_count > 0 {
                    style(c.unread_count).bold().cyan().to_string()
                } else {
                    "-".to_string()
                };
                table.add_row(vec![partner, last, when, unread, c.thread.conversation.id.to_string()]);
            }
            println!("{table}");
        }
        MessagesAction::Open { user_id } => {
            let conversation = app.messages.get_or_create_conversation(user_id).await?;
            match format {
                OutputFormat::Json => super::print_json(&conversation)?,
                OutputFormat::Text => println!("Conversation {}", conversation.id),
            }
        }
        MessagesAction::Read { conversation_id, keep_unread } => {
            let messages = app.messages.get_messages(conversation_id).await?;
            if !keep_unread {
                app.messages.mark_messages_as_read(conversation_id).await?;
            }
            if let OutputFormat::Json = format {
                return super::print_json(&messages);
            }
            if messages.is_empty() {
                println!("No messages.");
            }
            for m in &messages {
                let sender = m
                    .sender
                    .as_ref()
                    .map(|s| {
                        [s.first_name.as_deref(), s.last_name.as_deref()]
                            .into_iter()
                            .flatten()
                            .collect::<Vec<_>>()
                            .join(" ")
                    })
                    .filter(|name| !name.is_empty())
                    .unwrap_or_else(|| m.sender_id.to_string());
                println!(
                    "{} {}",
                    style(m.created_at.format("%Y-%m-%d %H:%M")).dim(),
                    style(sender).bold()
                );
                println!("  {}", m.content);
            }
        }
        MessagesAction::Send { conversation_id, to, content } => {
            let message = app.messages.send_message(conversation_id, to, &content).await?;
            match format {
                OutputFormat::Json => super::print_json(&message)?,
                OutputFormat::Text => println!("{} Sent.", style("OK").green().bold()),
            }
        }
        MessagesAction::Unread => {
            let count = app.messages.get_unread_count().await?;
            match format {
                OutputFormat::Json => super::print_json(&serde_json::json!({ "unread": count }))?,
                OutputFormat::Text => println!("{count} unread"),
            }
        }
    }

    Ok(())
}
