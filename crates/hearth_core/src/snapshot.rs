//! Platform-neutral views of Discord objects.
//!
//! The fireboard never sees Serenity types. Adapters build these snapshots,
//! and a [`MessageSnapshot`] is always fully materialized: every reaction
//! carries the complete list of users who reacted with it.

use crate::{ChannelId, GuildId, MessageId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Author of a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorSnapshot {
    /// Author's user ID.
    pub id: UserId,
    /// Name shown in the guild (nickname, global name or username).
    pub display_name: String,
    /// Avatar URL, if any.
    pub avatar_url: Option<String>,
    /// Whether the author is a bot account.
    pub bot: bool,
}

/// A file attached to a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentSnapshot {
    /// Original file name.
    pub filename: String,
    /// CDN URL.
    pub url: String,
    /// MIME type reported by Discord.
    pub content_type: Option<String>,
}

/// One distinct emoji on a message and everyone who reacted with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionSnapshot {
    /// Unicode emoji, or `<:name:id>` / `<a:name:id>` for custom emoji.
    pub emoji: String,
    /// Users who reacted, in the order the platform returned them.
    pub users: Vec<UserId>,
}

impl ReactionSnapshot {
    /// Create a reaction snapshot.
    pub fn new(emoji: impl Into<String>, users: Vec<UserId>) -> Self {
        Self {
            emoji: emoji.into(),
            users,
        }
    }
}

/// A fully materialized message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageSnapshot {
    /// Message ID.
    pub id: MessageId,
    /// Channel containing the message.
    pub channel_id: ChannelId,
    /// Guild containing the channel; `None` in direct messages.
    pub guild_id: Option<GuildId>,
    /// Message author.
    pub author: AuthorSnapshot,
    /// Text content (may be empty).
    pub content: String,
    /// When the message was sent.
    pub created_at: DateTime<Utc>,
    /// Attachments in upload order.
    pub attachments: Vec<AttachmentSnapshot>,
    /// Reactions in the order the platform lists them.
    pub reactions: Vec<ReactionSnapshot>,
}

/// Minimal channel description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSnapshot {
    /// Channel ID.
    pub id: ChannelId,
    /// Owning guild, if any.
    pub guild_id: Option<GuildId>,
    /// Channel name.
    pub name: String,
}

/// Whether a reaction was added or removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
pub enum ReactionAction {
    /// A user added a reaction.
    #[display("add")]
    Add,
    /// A user removed a reaction.
    #[display("remove")]
    Remove,
}

/// A reaction change delivered by the gateway.
///
/// The payload only identifies the message; handlers re-read reaction state
/// from the platform instead of trusting the event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionEvent {
    /// Add or remove.
    pub action: ReactionAction,
    /// Message that was reacted to.
    pub message_id: MessageId,
    /// Channel of that message.
    pub channel_id: ChannelId,
    /// Guild of that channel.
    pub guild_id: Option<GuildId>,
    /// User who reacted.
    pub user_id: UserId,
    /// Whether that user is a bot.
    pub user_is_bot: bool,
    /// Emoji, formatted like [`ReactionSnapshot::emoji`].
    pub emoji: String,
}
