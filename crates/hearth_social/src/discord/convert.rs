//! Conversions between Serenity models and Hearth snapshots.

use crate::PlatformResult;
use hearth_core::{
    AttachmentSnapshot, AuthorSnapshot, ChannelId, GuildId, MessageId, MessageSnapshot,
    MirrorEmbed, ReactionAction, ReactionEvent, ReactionSnapshot, RoleId, UserId,
};
use hearth_error::{PlatformError, PlatformErrorKind};
use serenity::all::{
    CreateEmbed, CreateEmbedAuthor, CreateEmbedFooter, Message, Reaction, ReactionType, Timestamp,
};
use serenity::model::id as sf;

pub(crate) fn sf_channel(id: ChannelId) -> sf::ChannelId {
    sf::ChannelId::new(id.get())
}

pub(crate) fn sf_message(id: MessageId) -> sf::MessageId {
    sf::MessageId::new(id.get())
}

pub(crate) fn sf_guild(id: GuildId) -> sf::GuildId {
    sf::GuildId::new(id.get())
}

pub(crate) fn sf_user(id: UserId) -> sf::UserId {
    sf::UserId::new(id.get())
}

pub(crate) fn sf_role(id: RoleId) -> sf::RoleId {
    sf::RoleId::new(id.get())
}

/// Canonical string form of a reaction emoji.
///
/// Unicode emoji are returned as-is; custom emoji as `<:name:id>`, or
/// `<a:name:id>` when animated.
pub fn emoji_key(reaction: &ReactionType) -> String {
    match reaction {
        ReactionType::Unicode(emoji) => emoji.clone(),
        ReactionType::Custom { animated, id, name } => format!(
            "<{}:{}:{}>",
            if *animated { "a" } else { "" },
            name.as_deref().unwrap_or_default(),
            id
        ),
        other => other.to_string(),
    }
}

/// Parse a configured emoji into a Serenity reaction.
#[track_caller]
pub fn reaction_type(emoji: &str) -> PlatformResult<ReactionType> {
    ReactionType::try_from(emoji).map_err(|_| {
        PlatformError::new(PlatformErrorKind::InvalidInput(format!(
            "not a usable reaction emoji: {emoji}"
        )))
    })
}

pub(crate) fn message_snapshot(
    message: &Message,
    guild_id: Option<GuildId>,
    reactions: Vec<ReactionSnapshot>,
) -> MessageSnapshot {
    let author = &message.author;
    MessageSnapshot {
        id: MessageId::new(message.id.get()),
        channel_id: ChannelId::new(message.channel_id.get()),
        guild_id,
        author: AuthorSnapshot {
            id: UserId::new(author.id.get()),
            display_name: author
                .global_name
                .clone()
                .unwrap_or_else(|| author.name.clone()),
            avatar_url: Some(author.face()),
            bot: author.bot,
        },
        content: message.content.clone(),
        created_at: chrono::DateTime::from_timestamp(message.timestamp.unix_timestamp(), 0)
            .unwrap_or_default(),
        attachments: message
            .attachments
            .iter()
            .map(|attachment| AttachmentSnapshot {
                filename: attachment.filename.clone(),
                url: attachment.url.clone(),
                content_type: attachment.content_type.clone(),
            })
            .collect(),
        reactions,
    }
}

/// Turn a gateway reaction into a routed event.
///
/// Returns `None` for reactions without a user, which Discord sends for some
/// partial payloads.
pub(crate) fn reaction_event(
    reaction: &Reaction,
    action: ReactionAction,
    bot_user: Option<sf::UserId>,
) -> Option<ReactionEvent> {
    let user_id = reaction.user_id?;
    let member_is_bot = reaction
        .member
        .as_ref()
        .is_some_and(|member| member.user.bot);

    Some(ReactionEvent {
        action,
        message_id: MessageId::new(reaction.message_id.get()),
        channel_id: ChannelId::new(reaction.channel_id.get()),
        guild_id: reaction.guild_id.map(|id| GuildId::new(id.get())),
        user_id: UserId::new(user_id.get()),
        user_is_bot: member_is_bot || bot_user == Some(user_id),
        emoji: emoji_key(&reaction.emoji),
    })
}

/// Build the Serenity embed for a rendered mirror.
pub fn mirror_embed(embed: &MirrorEmbed) -> CreateEmbed {
    let mut author = CreateEmbedAuthor::new(&embed.author_name);
    if let Some(icon) = &embed.author_icon_url {
        author = author.icon_url(icon);
    }

    let mut builder = CreateEmbed::new()
        .author(author)
        .description(&embed.description)
        .colour(embed.color)
        .fields(
            embed
                .fields
                .iter()
                .map(|field| (field.name.clone(), field.value.clone(), field.inline)),
        )
        .footer(CreateEmbedFooter::new(&embed.footer));

    if let Ok(timestamp) = Timestamp::from_unix_timestamp(embed.timestamp.timestamp()) {
        builder = builder.timestamp(timestamp);
    }
    if let Some(image) = &embed.image_url {
        builder = builder.image(image);
    }
    builder
}
