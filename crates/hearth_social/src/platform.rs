//! The chat platform seam.
//!
//! Everything the fireboard and the role mapper need from Discord goes through
//! [`ChatPlatform`]. The Serenity adapter implements it for production, and
//! tests script it in memory.

use async_trait::async_trait;
use hearth_core::{
    ChannelId, ChannelSnapshot, GuildId, MessageId, MessageSnapshot, MirrorContent, RoleId, UserId,
};
use hearth_error::PlatformError;

/// Result type for platform calls.
pub type PlatformResult<T> = Result<T, PlatformError>;

/// Remote operations on the chat platform.
///
/// Every call may fail. A missing resource is reported as a
/// [`PlatformErrorKind::NotFound`](hearth_error::PlatformErrorKind::NotFound)
/// error so callers can tell "gone" from "try again later".
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// Look up a channel.
    async fn fetch_channel(&self, channel_id: ChannelId) -> PlatformResult<ChannelSnapshot>;

    /// Fetch a message with every reaction's full user list.
    async fn fetch_message(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
    ) -> PlatformResult<MessageSnapshot>;

    /// Find a message by ID across every text channel the bot can see.
    async fn search_message(&self, message_id: MessageId) -> PlatformResult<MessageSnapshot>;

    /// Post a mirror message. Returns the new message's ID.
    async fn send_mirror(
        &self,
        channel_id: ChannelId,
        content: &MirrorContent,
    ) -> PlatformResult<MessageId>;

    /// Replace a mirror message's content in place.
    async fn edit_mirror(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        content: &MirrorContent,
    ) -> PlatformResult<()>;

    /// Post a plain text message with mentions suppressed.
    async fn send_text(&self, channel_id: ChannelId, text: &str) -> PlatformResult<MessageId>;

    /// Delete a message.
    async fn delete_message(&self, channel_id: ChannelId, message_id: MessageId)
    -> PlatformResult<()>;

    /// React to a message as the bot.
    async fn add_reaction(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        emoji: &str,
    ) -> PlatformResult<()>;

    /// Roles currently held by a guild member.
    async fn member_roles(&self, guild_id: GuildId, user_id: UserId) -> PlatformResult<Vec<RoleId>>;

    /// Grant a role.
    async fn add_member_role(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        role_id: RoleId,
    ) -> PlatformResult<()>;

    /// Revoke a role.
    async fn remove_member_role(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        role_id: RoleId,
    ) -> PlatformResult<()>;

    /// Whether a role exists in a guild.
    async fn role_exists(&self, guild_id: GuildId, role_id: RoleId) -> PlatformResult<bool>;
}
