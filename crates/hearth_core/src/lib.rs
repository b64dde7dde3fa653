//! Core data types for the Hearth community bot.
//!
//! This crate holds everything that does not talk to Discord or the database:
//! - Discord snowflake newtypes and platform-neutral message snapshots
//! - Fireboard entries and computed valid reactions
//! - The reaction filter (one vote per user, optional author exclusion)
//! - The mirror renderer that turns a source message into embed content
//! - Typed fireboard and reaction-role settings

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod entry;
mod filter;
mod ids;
mod render;
mod settings;
mod snapshot;

pub use entry::{FireboardEntry, NewFireboardEntry, ValidReaction};
pub use filter::{calculate_total_count, compute_valid_reactions, emoji_matches};
pub use ids::{ChannelId, GuildId, MessageId, RoleId, UserId};
pub use render::{EmbedField, MirrorContent, MirrorEmbed, is_image, message_link, render};
pub use settings::{
    FireboardSettings, FireboardSettingsBuilder, RoleMenuSettings, RoleMenuSettingsBuilder,
    RoleOption,
};
pub use snapshot::{
    AttachmentSnapshot, AuthorSnapshot, ChannelSnapshot, MessageSnapshot, ReactionAction,
    ReactionEvent, ReactionSnapshot,
};
