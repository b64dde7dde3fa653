//! [`ChatPlatform`] over Serenity's HTTP client.

use super::convert::{
    emoji_key, message_snapshot, mirror_embed, reaction_type, sf_channel, sf_guild, sf_message,
    sf_role, sf_user,
};
use crate::{ChatPlatform, PlatformResult};
use async_trait::async_trait;
use hearth_core::{
    ChannelId, ChannelSnapshot, GuildId, MessageId, MessageSnapshot, MirrorContent,
    ReactionSnapshot, RoleId, UserId, emoji_matches,
};
use hearth_error::{PlatformError, PlatformErrorKind};
use parking_lot::Mutex;
use serenity::all::{
    Channel, ChannelType, CreateAllowedMentions, CreateMessage, EditMessage, Http, Message,
    ReactionType,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument, trace};

/// Discord's page size for reaction users.
const REACTION_PAGE: u8 = 100;

const ROLE_AUDIT_REASON: &str = "Reaction role menu";

/// Serenity-backed chat platform.
///
/// Messages fetched over HTTP carry no guild ID, so the guild of each channel
/// is looked up once and cached.
///
/// With tracked emoji set, only matching reactions have their users paged in;
/// the rest are left out of fetched snapshots.
pub struct SerenityPlatform {
    http: Arc<Http>,
    channel_guilds: Mutex<HashMap<ChannelId, Option<GuildId>>>,
    tracked_emojis: Vec<String>,
}

impl SerenityPlatform {
    /// Platform with its own HTTP client.
    pub fn new(token: &str) -> Self {
        Self::with_http(Arc::new(Http::new(token)))
    }

    /// Platform sharing an existing HTTP client and its rate limiter.
    pub fn with_http(http: Arc<Http>) -> Self {
        Self {
            http,
            channel_guilds: Mutex::new(HashMap::new()),
            tracked_emojis: Vec::new(),
        }
    }

    /// Restrict reaction materialization to these emoji. Empty tracks all.
    pub fn with_tracked_emojis(mut self, emojis: impl IntoIterator<Item = String>) -> Self {
        self.tracked_emojis = emojis.into_iter().collect();
        self
    }

    /// The underlying HTTP client.
    pub fn http(&self) -> &Arc<Http> {
        &self.http
    }

    async fn guild_of(&self, channel_id: ChannelId) -> PlatformResult<Option<GuildId>> {
        if let Some(guild_id) = self.channel_guilds.lock().get(&channel_id) {
            return Ok(*guild_id);
        }
        Ok(self.fetch_channel(channel_id).await?.guild_id)
    }

    // Every user for one reaction, following Discord's pagination.
    async fn reaction_users(
        &self,
        message: &Message,
        reaction: &ReactionType,
    ) -> PlatformResult<Vec<UserId>> {
        let mut users = Vec::new();
        let mut after: Option<u64> = None;
        loop {
            let page = self
                .http
                .get_reaction_users(
                    message.channel_id,
                    message.id,
                    reaction,
                    REACTION_PAGE,
                    after,
                )
                .await?;
            let full_page = page.len() == usize::from(REACTION_PAGE);
            after = page.last().map(|user| user.id.get());
            users.extend(page.iter().map(|user| UserId::new(user.id.get())));
            if !full_page {
                break;
            }
        }
        trace!(emoji = %emoji_key(reaction), users = users.len(), "Fetched reaction users");
        Ok(users)
    }

    async fn materialize(&self, message: Message) -> PlatformResult<MessageSnapshot> {
        let mut reactions = Vec::with_capacity(message.reactions.len());
        for reaction in &message.reactions {
            let key = emoji_key(&reaction.reaction_type);
            if !is_tracked(&self.tracked_emojis, &key) {
                trace!(emoji = %key, "Skipping untracked reaction");
                continue;
            }
            let users = self.reaction_users(&message, &reaction.reaction_type).await?;
            reactions.push(ReactionSnapshot::new(key, users));
        }

        let guild_id = match message.guild_id {
            Some(guild_id) => Some(GuildId::new(guild_id.get())),
            None => {
                self.guild_of(ChannelId::new(message.channel_id.get()))
                    .await?
            }
        };
        Ok(message_snapshot(&message, guild_id, reactions))
    }
}

fn is_tracked(tracked: &[String], key: &str) -> bool {
    tracked.is_empty() || tracked.iter().any(|emoji| emoji_matches(emoji, key))
}

fn mirror_message(content: &MirrorContent) -> CreateMessage {
    CreateMessage::new()
        .content(&content.content)
        .embed(mirror_embed(&content.embed))
        .allowed_mentions(CreateAllowedMentions::new())
}

#[async_trait]
impl ChatPlatform for SerenityPlatform {
    #[instrument(skip(self))]
    async fn fetch_channel(&self, channel_id: ChannelId) -> PlatformResult<ChannelSnapshot> {
        let snapshot = match self.http.get_channel(sf_channel(channel_id)).await? {
            Channel::Guild(channel) => ChannelSnapshot {
                id: channel_id,
                guild_id: Some(GuildId::new(channel.guild_id.get())),
                name: channel.name,
            },
            Channel::Private(channel) => ChannelSnapshot {
                id: channel_id,
                guild_id: None,
                name: channel.name(),
            },
            _ => ChannelSnapshot {
                id: channel_id,
                guild_id: None,
                name: String::new(),
            },
        };
        self.channel_guilds
            .lock()
            .insert(channel_id, snapshot.guild_id);
        Ok(snapshot)
    }

    #[instrument(skip(self))]
    async fn fetch_message(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
    ) -> PlatformResult<MessageSnapshot> {
        let message = self
            .http
            .get_message(sf_channel(channel_id), sf_message(message_id))
            .await?;
        self.materialize(message).await
    }

    #[instrument(skip(self))]
    async fn search_message(&self, message_id: MessageId) -> PlatformResult<MessageSnapshot> {
        let guilds = self.http.get_guilds(None, None).await?;
        for guild in guilds {
            let channels = self.http.get_channels(guild.id).await?;
            for channel in channels
                .into_iter()
                .filter(|channel| matches!(channel.kind, ChannelType::Text | ChannelType::News))
            {
                match self
                    .http
                    .get_message(channel.id, sf_message(message_id))
                    .await
                {
                    Ok(message) => {
                        debug!(channel_id = %channel.id, "Found message by search");
                        self.channel_guilds.lock().insert(
                            ChannelId::new(channel.id.get()),
                            Some(GuildId::new(guild.id.get())),
                        );
                        return self.materialize(message).await;
                    }
                    Err(e) => {
                        let error = PlatformError::from(e);
                        match error.kind {
                            PlatformErrorKind::NotFound(_) | PlatformErrorKind::Forbidden(_) => {
                                continue;
                            }
                            _ => return Err(error),
                        }
                    }
                }
            }
        }
        Err(PlatformError::not_found(format!("message {message_id}")))
    }

    #[instrument(skip(self, content))]
    async fn send_mirror(
        &self,
        channel_id: ChannelId,
        content: &MirrorContent,
    ) -> PlatformResult<MessageId> {
        let message = sf_channel(channel_id)
            .send_message(&*self.http, mirror_message(content))
            .await?;
        Ok(MessageId::new(message.id.get()))
    }

    #[instrument(skip(self, content))]
    async fn edit_mirror(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        content: &MirrorContent,
    ) -> PlatformResult<()> {
        let edit = EditMessage::new()
            .content(&content.content)
            .embed(mirror_embed(&content.embed));
        sf_channel(channel_id)
            .edit_message(&*self.http, sf_message(message_id), edit)
            .await?;
        Ok(())
    }

    #[instrument(skip(self, text))]
    async fn send_text(&self, channel_id: ChannelId, text: &str) -> PlatformResult<MessageId> {
        let builder = CreateMessage::new()
            .content(text)
            .allowed_mentions(CreateAllowedMentions::new());
        let message = sf_channel(channel_id)
            .send_message(&*self.http, builder)
            .await?;
        Ok(MessageId::new(message.id.get()))
    }

    #[instrument(skip(self))]
    async fn delete_message(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
    ) -> PlatformResult<()> {
        self.http
            .delete_message(sf_channel(channel_id), sf_message(message_id), None)
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn add_reaction(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        emoji: &str,
    ) -> PlatformResult<()> {
        let reaction = reaction_type(emoji)?;
        self.http
            .create_reaction(sf_channel(channel_id), sf_message(message_id), &reaction)
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn member_roles(&self, guild_id: GuildId, user_id: UserId) -> PlatformResult<Vec<RoleId>> {
        let member = self
            .http
            .get_member(sf_guild(guild_id), sf_user(user_id))
            .await?;
        Ok(member
            .roles
            .iter()
            .map(|role| RoleId::new(role.get()))
            .collect())
    }

    #[instrument(skip(self))]
    async fn add_member_role(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        role_id: RoleId,
    ) -> PlatformResult<()> {
        self.http
            .add_member_role(
                sf_guild(guild_id),
                sf_user(user_id),
                sf_role(role_id),
                Some(ROLE_AUDIT_REASON),
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn remove_member_role(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        role_id: RoleId,
    ) -> PlatformResult<()> {
        self.http
            .remove_member_role(
                sf_guild(guild_id),
                sf_user(user_id),
                sf_role(role_id),
                Some(ROLE_AUDIT_REASON),
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn role_exists(&self, guild_id: GuildId, role_id: RoleId) -> PlatformResult<bool> {
        let roles = self.http.get_guild_roles(sf_guild(guild_id)).await?;
        Ok(roles.iter().any(|role| role.id == sf_role(role_id)))
    }
}
