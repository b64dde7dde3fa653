//! Mirror message rendering.
//!
//! Rendering is a pure function of the source message, its breakdown and the
//! settings, so re-rendering after a no-op reaction change produces identical
//! content and edits are idempotent.

use crate::{
    AttachmentSnapshot, FireboardSettings, MessageSnapshot, ValidReaction, calculate_total_count,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Discord's limit on embed descriptions.
const DESCRIPTION_LIMIT: usize = 4096;
/// Discord's limit on embed field values.
const FIELD_VALUE_LIMIT: usize = 1024;

const EMPTY_TEXT_PLACEHOLDER: &str = "*No text content*";
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];

/// A single embed field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedField {
    /// Field title.
    pub name: String,
    /// Field body.
    pub value: String,
    /// Render side by side with neighbouring inline fields.
    pub inline: bool,
}

impl EmbedField {
    fn new(name: &str, value: impl Into<String>, inline: bool) -> Self {
        Self {
            name: name.to_string(),
            value: truncate(value.into(), FIELD_VALUE_LIMIT),
            inline,
        }
    }
}

/// Platform-neutral embed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorEmbed {
    /// Source author's display name.
    pub author_name: String,
    /// Source author's avatar.
    pub author_icon_url: Option<String>,
    /// Source text or placeholder.
    pub description: String,
    /// Link back to the source message.
    pub url: String,
    /// Accent colour.
    pub color: u32,
    /// Breakdown, source link and attachment fields.
    pub fields: Vec<EmbedField>,
    /// Primary image.
    pub image_url: Option<String>,
    /// Footer text.
    pub footer: String,
    /// Source message creation time.
    pub timestamp: DateTime<Utc>,
}

/// Everything needed to send or edit a mirror message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorContent {
    /// Plain-text header above the embed.
    pub content: String,
    /// The embed.
    pub embed: MirrorEmbed,
}

/// Jump link to a message.
///
/// # Examples
///
/// ```
/// use hearth_core::{ChannelId, GuildId, MessageId, message_link};
///
/// let link = message_link(Some(GuildId::new(1)), ChannelId::new(2), MessageId::new(3));
/// assert_eq!(link, "https://discord.com/channels/1/2/3");
/// ```
pub fn message_link(
    guild_id: Option<crate::GuildId>,
    channel_id: crate::ChannelId,
    message_id: crate::MessageId,
) -> String {
    let guild = guild_id.map_or_else(|| "@me".to_string(), |id| id.to_string());
    format!(
        "https://discord.com/channels/{}/{}/{}",
        guild, channel_id, message_id
    )
}

/// Whether an attachment should be shown as an image.
pub fn is_image(attachment: &AttachmentSnapshot) -> bool {
    if let Some(content_type) = &attachment.content_type {
        return content_type.starts_with("image/");
    }
    attachment
        .filename
        .rsplit_once('.')
        .map(|(_, ext)| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

/// Render the mirror message for a source message.
pub fn render(
    source: &MessageSnapshot,
    reactions: &[ValidReaction],
    settings: &FireboardSettings,
) -> MirrorContent {
    let total = calculate_total_count(reactions);
    let link = message_link(source.guild_id, source.channel_id, source.id);

    let description = if source.content.trim().is_empty() {
        EMPTY_TEXT_PLACEHOLDER.to_string()
    } else {
        truncate(source.content.clone(), DESCRIPTION_LIMIT)
    };

    let mut fields = vec![
        EmbedField::new("Reactions", breakdown_line(reactions), true),
        EmbedField::new("Source", format!("[Jump to message]({})", link), true),
    ];

    let image = source.attachments.iter().find(|a| is_image(a));
    let listed: Vec<&str> = source
        .attachments
        .iter()
        .filter(|a| image.is_none_or(|img| !std::ptr::eq(*a, img)))
        .map(|a| a.filename.as_str())
        .collect();
    if !listed.is_empty() {
        let name = if image.is_some() {
            "Other attachments"
        } else {
            "Attachments"
        };
        fields.push(EmbedField::new(name, listed.join("\n"), false));
    }

    MirrorContent {
        content: format!(
            "{} **{}** | <#{}>",
            settings.header_emoji(),
            total,
            source.channel_id
        ),
        embed: MirrorEmbed {
            author_name: source.author.display_name.clone(),
            author_icon_url: source.author.avatar_url.clone(),
            description,
            url: link,
            color: *settings.embed_color(),
            fields,
            image_url: image.map(|a| a.url.clone()),
            footer: format!("Total reactions: {}", total),
            timestamp: source.created_at,
        },
    }
}

/// `emoji count • emoji count`, skipping zero counts.
fn breakdown_line(reactions: &[ValidReaction]) -> String {
    let parts: Vec<String> = reactions
        .iter()
        .filter(|reaction| reaction.count > 0)
        .map(ToString::to_string)
        .collect();
    if parts.is_empty() {
        "None".to_string()
    } else {
        parts.join(" • ")
    }
}

fn truncate(text: String, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text;
    }
    let mut cut: String = text.chars().take(limit - 1).collect();
    cut.push('…');
    cut
}
