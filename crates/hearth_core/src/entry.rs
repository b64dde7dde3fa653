//! Fireboard entries and computed reactions.

use crate::{ChannelId, MessageId, UserId};
use chrono::NaiveDateTime;
use derive_getters::Getters;
use serde::{Deserialize, Serialize};

/// A message currently mirrored on the fireboard.
///
/// `valid_reaction_count` is a cache for display and stats; every processing
/// pass recomputes it from the live message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct FireboardEntry {
    /// Stored handle (surrogate key).
    id: i64,
    /// Message being mirrored.
    source_message_id: MessageId,
    /// Channel of the source message. `None` for legacy rows.
    source_channel_id: Option<ChannelId>,
    /// Mirror message in the fireboard channel.
    mirror_message_id: MessageId,
    /// Author of the source message.
    author_id: UserId,
    /// Last computed qualifying reaction total.
    valid_reaction_count: i32,
    /// When the entry was created.
    created_at: NaiveDateTime,
    /// When the entry last changed.
    updated_at: NaiveDateTime,
}

impl FireboardEntry {
    /// Assemble an entry from stored columns.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: i64,
        source_message_id: MessageId,
        source_channel_id: Option<ChannelId>,
        mirror_message_id: MessageId,
        author_id: UserId,
        valid_reaction_count: i32,
        created_at: NaiveDateTime,
        updated_at: NaiveDateTime,
    ) -> Self {
        Self {
            id,
            source_message_id,
            source_channel_id,
            mirror_message_id,
            author_id,
            valid_reaction_count,
            created_at,
            updated_at,
        }
    }
}

/// Values for creating a fireboard entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewFireboardEntry {
    /// Message being mirrored.
    pub source_message_id: MessageId,
    /// Channel of the source message.
    pub source_channel_id: Option<ChannelId>,
    /// Mirror message just sent.
    pub mirror_message_id: MessageId,
    /// Author of the source message.
    pub author_id: UserId,
    /// Qualifying reaction total at creation.
    pub valid_reaction_count: i32,
}

/// Deduplicated count for one qualifying emoji.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
#[display("{} {}", emoji, count)]
pub struct ValidReaction {
    /// Emoji as it appears on the message.
    pub emoji: String,
    /// Number of distinct users counted under this emoji.
    pub count: u32,
}

impl ValidReaction {
    /// Create a valid reaction.
    pub fn new(emoji: impl Into<String>, count: u32) -> Self {
        Self {
            emoji: emoji.into(),
            count,
        }
    }
}
