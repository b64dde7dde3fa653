//! Reaction roles.
//!
//! A single published menu message maps emoji to roles. Reacting on it grants
//! the mapped role, removing the reaction revokes it. Where the menu lives is
//! runtime state, kept in the [`StateStore`] under [`MENU_STATE_KEY`] so a
//! restart picks it up again.

use crate::{ChatPlatform, Dispatch, ReactionHandler};
use async_trait::async_trait;
use hearth_core::{ChannelId, MessageId, ReactionAction, ReactionEvent, RoleMenuSettings, RoleOption};
use hearth_database::{DatabaseResult, StateStore};
use hearth_error::{ConfigError, HearthResult, PlatformError, PlatformErrorKind};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// State store key holding the menu location as `"<channel_id>:<message_id>"`.
pub const MENU_STATE_KEY: &str = "reaction_roles.message";

/// Where the published role menu lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
#[display("{}:{}", channel_id, message_id)]
pub struct MenuLocation {
    /// Channel holding the menu.
    pub channel_id: ChannelId,
    /// The menu message.
    pub message_id: MessageId,
}

impl MenuLocation {
    /// Create a location.
    pub fn new(channel_id: ChannelId, message_id: MessageId) -> Self {
        Self {
            channel_id,
            message_id,
        }
    }

    /// Parse the stored `"<channel_id>:<message_id>"` form.
    pub fn parse(value: &str) -> Option<Self> {
        let (channel, message) = value.split_once(':')?;
        Some(Self::new(channel.trim().parse().ok()?, message.trim().parse().ok()?))
    }
}

/// Grants and revokes roles from reactions on the menu message.
pub struct RoleMapper {
    settings: RoleMenuSettings,
    state: Arc<dyn StateStore>,
    platform: Arc<dyn ChatPlatform>,
    menu: RwLock<Option<MenuLocation>>,
}

impl RoleMapper {
    /// Create a mapper with no menu loaded.
    pub fn new(
        settings: RoleMenuSettings,
        state: Arc<dyn StateStore>,
        platform: Arc<dyn ChatPlatform>,
    ) -> Self {
        Self {
            settings,
            state,
            platform,
            menu: RwLock::new(None),
        }
    }

    /// Active settings.
    pub fn settings(&self) -> &RoleMenuSettings {
        &self.settings
    }

    /// Currently known menu location.
    pub fn menu_message(&self) -> Option<MenuLocation> {
        *self.menu.read()
    }

    /// Restore the menu location from the state store.
    ///
    /// A malformed stored value is logged and treated as no menu.
    #[instrument(skip(self))]
    pub async fn load(&self) -> DatabaseResult<Option<MenuLocation>> {
        let location = match self.state.get_state(MENU_STATE_KEY).await? {
            Some(value) => {
                let parsed = MenuLocation::parse(&value);
                if parsed.is_none() {
                    warn!(%value, "Ignoring malformed role menu location");
                }
                parsed
            }
            None => None,
        };
        *self.menu.write() = location;
        debug!(menu = ?location, "Loaded role menu location");
        Ok(location)
    }

    /// Record a new menu location.
    pub async fn set_menu_message(&self, location: MenuLocation) -> DatabaseResult<()> {
        self.state
            .set_state(MENU_STATE_KEY, &location.to_string())
            .await?;
        *self.menu.write() = Some(location);
        info!(%location, "Role menu location set");
        Ok(())
    }

    /// Forget the menu. Returns whether one was stored.
    pub async fn clear_menu_message(&self) -> DatabaseResult<bool> {
        let existed = self.state.remove_state(MENU_STATE_KEY).await?;
        *self.menu.write() = None;
        Ok(existed)
    }

    /// Text of the menu message.
    pub fn menu_text(&self) -> String {
        let mut text = format!(
            "**{}**\nReact below to pick a role. Remove your reaction to drop it.\n",
            self.settings.title()
        );
        for option in self.settings.roles() {
            text.push('\n');
            text.push_str(&menu_line(option));
        }
        text
    }

    /// Post the menu in a channel, seed its reactions, and remember it.
    ///
    /// Roles missing from the guild are logged. A reaction that cannot be
    /// added is logged and skipped; users can still add it themselves.
    #[instrument(skip(self), fields(%channel_id))]
    pub async fn publish_menu(&self, channel_id: ChannelId) -> HearthResult<MenuLocation> {
        if !*self.settings.enabled() {
            return Err(ConfigError::new("reaction_roles.enabled is false").into());
        }

        let channel = self.platform.fetch_channel(channel_id).await?;
        let guild_id = channel.guild_id.ok_or_else(|| {
            PlatformError::new(PlatformErrorKind::InvalidInput(format!(
                "channel {} is not in a guild",
                channel_id
            )))
        })?;

        for option in self.settings.roles() {
            if !self.platform.role_exists(guild_id, *option.role_id()).await? {
                warn!(role_id = %option.role_id(), emoji = %option.emoji(), "Configured role does not exist");
            }
        }

        let message_id = self.platform.send_text(channel_id, &self.menu_text()).await?;
        for option in self.settings.roles() {
            if let Err(e) = self
                .platform
                .add_reaction(channel_id, message_id, option.emoji())
                .await
            {
                warn!(emoji = %option.emoji(), error = %e, "Failed to seed menu reaction");
            }
        }

        let location = MenuLocation::new(channel_id, message_id);
        self.set_menu_message(location).await?;
        Ok(location)
    }

    async fn apply(&self, event: &ReactionEvent) {
        let Some(role_id) = self.settings.role_for(&event.emoji) else {
            debug!(emoji = %event.emoji, "Emoji is not mapped to a role");
            return;
        };
        let Some(guild_id) = event.guild_id else {
            warn!("Role menu reaction outside a guild");
            return;
        };

        let roles = match self.platform.member_roles(guild_id, event.user_id).await {
            Ok(roles) => roles,
            Err(e) => {
                warn!(user_id = %event.user_id, error = %e, "Failed to read member roles");
                return;
            }
        };
        let has_role = roles.contains(&role_id);

        let result = match (event.action, has_role) {
            (ReactionAction::Add, false) => {
                self.platform
                    .add_member_role(guild_id, event.user_id, role_id)
                    .await
            }
            (ReactionAction::Remove, true) => {
                self.platform
                    .remove_member_role(guild_id, event.user_id, role_id)
                    .await
            }
            _ => {
                debug!(%role_id, "Member already in the requested state");
                return;
            }
        };

        match result {
            Ok(()) => info!(user_id = %event.user_id, %role_id, action = ?event.action, "Updated member role"),
            Err(e) => warn!(user_id = %event.user_id, %role_id, error = %e, "Failed to update member role"),
        }
    }
}

fn menu_line(option: &RoleOption) -> String {
    if option.label().is_empty() {
        format!("{} <@&{}>", option.emoji(), option.role_id())
    } else {
        format!("{} {}", option.emoji(), option.label())
    }
}

#[async_trait]
impl ReactionHandler for RoleMapper {
    fn name(&self) -> &'static str {
        "reaction_roles"
    }

    #[instrument(skip_all, fields(message_id = %event.message_id, emoji = %event.emoji))]
    async fn on_reaction(&self, event: &ReactionEvent) -> Dispatch {
        if !*self.settings.enabled() {
            return Dispatch::NotApplicable;
        }
        match self.menu_message() {
            Some(menu) if menu.message_id == event.message_id => {}
            _ => return Dispatch::NotApplicable,
        }

        if event.user_is_bot {
            debug!("Ignoring bot reaction on role menu");
        } else {
            self.apply(event).await;
        }
        Dispatch::Claimed
    }
}
