//! Typed settings for the fireboard and reaction-role features.
//!
//! These are static inputs. Anything the bot learns at runtime (such as the
//! ID of the reaction-role menu message) lives in the state store instead.

use crate::{ChannelId, RoleId};
use derive_getters::Getters;
use hearth_error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Fireboard configuration.
///
/// # Example
///
/// ```toml
/// [fireboard]
/// enabled = true
/// channel_id = 123456789012345678
/// threshold = 3
/// emojis = ["🔥", "👍"]
/// exclude_author = true
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters, derive_builder::Builder)]
#[builder(default, setter(into))]
pub struct FireboardSettings {
    /// Master switch.
    #[serde(default = "default_enabled")]
    enabled: bool,

    /// Destination channel for mirror messages.
    #[serde(default)]
    channel_id: Option<ChannelId>,

    /// Qualifying reactions needed to be mirrored.
    #[serde(default = "default_threshold")]
    threshold: u32,

    /// Emoji that count as votes, in priority order.
    #[serde(default = "default_emojis")]
    emojis: Vec<String>,

    /// Ignore the author's own reactions.
    #[serde(default = "default_exclude_author")]
    exclude_author: bool,

    /// Embed accent colour (RGB).
    #[serde(default = "default_embed_color")]
    embed_color: u32,

    /// Emoji shown in front of the count in the mirror header.
    #[serde(default = "default_header_emoji")]
    header_emoji: String,
}

fn default_enabled() -> bool {
    true
}

fn default_threshold() -> u32 {
    3
}

fn default_emojis() -> Vec<String> {
    vec!["🔥".to_string()]
}

fn default_exclude_author() -> bool {
    true
}

fn default_embed_color() -> u32 {
    0xFF6A00
}

fn default_header_emoji() -> String {
    "🔥".to_string()
}

impl Default for FireboardSettings {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            channel_id: None,
            threshold: default_threshold(),
            emojis: default_emojis(),
            exclude_author: default_exclude_author(),
            embed_color: default_embed_color(),
            header_emoji: default_header_emoji(),
        }
    }
}

impl FireboardSettings {
    /// Check the settings for values the engine cannot work with.
    ///
    /// A disabled fireboard is always valid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.enabled {
            return Ok(());
        }
        if self.channel_id.is_none() {
            return Err(ConfigError::new(
                "fireboard.channel_id is required when the fireboard is enabled",
            ));
        }
        if self.threshold == 0 {
            return Err(ConfigError::new("fireboard.threshold must be at least 1"));
        }
        if self.emojis.iter().all(|emoji| emoji.trim().is_empty()) {
            return Err(ConfigError::new("fireboard.emojis must not be empty"));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = self.emojis.iter().find(|emoji| !seen.insert(emoji.trim())) {
            return Err(ConfigError::new(format!(
                "fireboard.emojis lists {} more than once",
                dup
            )));
        }
        if self.embed_color > 0xFF_FF_FF {
            return Err(ConfigError::new("fireboard.embed_color must be a 24-bit RGB value"));
        }
        Ok(())
    }
}

/// One emoji → role mapping on the reaction-role menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct RoleOption {
    /// Emoji users react with.
    emoji: String,
    /// Role granted for that emoji.
    role_id: RoleId,
    /// Text shown next to the emoji in the menu.
    #[serde(default)]
    label: String,
}

impl RoleOption {
    /// Create a role option.
    pub fn new(emoji: impl Into<String>, role_id: RoleId, label: impl Into<String>) -> Self {
        Self {
            emoji: emoji.into(),
            role_id,
            label: label.into(),
        }
    }
}

/// Reaction-role configuration.
///
/// # Example
///
/// ```toml
/// [reaction_roles]
/// enabled = true
/// title = "Pick your roles"
///
/// [[reaction_roles.roles]]
/// emoji = "🎮"
/// role_id = 223456789012345678
/// label = "Gamers"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, derive_builder::Builder)]
#[builder(default, setter(into))]
pub struct RoleMenuSettings {
    /// Master switch.
    #[serde(default)]
    enabled: bool,

    /// Heading of the published menu message.
    #[serde(default = "default_menu_title")]
    title: String,

    /// Emoji → role table, in menu order.
    #[serde(default)]
    roles: Vec<RoleOption>,
}

fn default_menu_title() -> String {
    "Pick your roles".to_string()
}

impl Default for RoleMenuSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            title: default_menu_title(),
            roles: Vec::new(),
        }
    }
}

impl RoleMenuSettings {
    /// The role mapped to an emoji, if any.
    pub fn role_for(&self, emoji: &str) -> Option<RoleId> {
        self.roles
            .iter()
            .find(|option| crate::emoji_matches(&option.emoji, emoji))
            .map(|option| option.role_id)
    }

    /// Check for duplicate emoji.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.enabled {
            return Ok(());
        }
        if self.roles.is_empty() {
            return Err(ConfigError::new(
                "reaction_roles.roles must not be empty when reaction roles are enabled",
            ));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = self.roles.iter().find(|option| !seen.insert(option.emoji.trim())) {
            return Err(ConfigError::new(format!(
                "reaction_roles.roles maps {} more than once",
                dup.emoji
            )));
        }
        Ok(())
    }
}
