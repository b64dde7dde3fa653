//! Serenity event handler.

use super::convert::{emoji_key, reaction_event};
use crate::EventRouter;
use async_trait::async_trait;
use hearth_core::{ChannelId, MessageId, ReactionAction};
use serenity::all::{Context, EventHandler, GatewayIntents, Reaction, Ready};
use serenity::model::id as sf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use tracing::{debug, info};

/// Feeds gateway events into the [`EventRouter`].
pub struct HearthHandler {
    router: Arc<EventRouter>,
    refresh_on_ready: bool,
    bot_user: OnceLock<sf::UserId>,
    refreshed: AtomicBool,
}

impl HearthHandler {
    /// Create a handler. With `refresh_on_ready`, the first `ready` event runs
    /// a full fireboard refresh in the background.
    pub fn new(router: Arc<EventRouter>, refresh_on_ready: bool) -> Self {
        Self {
            router,
            refresh_on_ready,
            bot_user: OnceLock::new(),
            refreshed: AtomicBool::new(false),
        }
    }

    /// Gateway intents the bot needs.
    pub fn intents() -> GatewayIntents {
        GatewayIntents::GUILDS
            | GatewayIntents::GUILD_MESSAGES
            | GatewayIntents::GUILD_MESSAGE_REACTIONS
            | GatewayIntents::MESSAGE_CONTENT
            | GatewayIntents::GUILD_MEMBERS
    }

    async fn dispatch_reaction(&self, reaction: &Reaction, action: ReactionAction) {
        let Some(event) = reaction_event(reaction, action, self.bot_user.get().copied()) else {
            debug!("Reaction without a user, ignoring");
            return;
        };
        if self.bot_user.get() == Some(&sf::UserId::new(event.user_id.get())) {
            return;
        }
        self.router.route_reaction(&event).await;
    }
}

#[async_trait]
impl EventHandler for HearthHandler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!(
            user = %ready.user.name,
            guilds = ready.guilds.len(),
            "Connected to Discord"
        );
        let _ = self.bot_user.set(ready.user.id);

        // Reconnects fire `ready` again; only the first one refreshes.
        if self.refresh_on_ready && !self.refreshed.swap(true, Ordering::SeqCst) {
            let fireboard = Arc::clone(self.router.fireboard());
            tokio::spawn(async move {
                let summary = fireboard.refresh_all_entries().await;
                info!(%summary, "Startup refresh finished");
            });
        }
    }

    async fn reaction_add(&self, _ctx: Context, reaction: Reaction) {
        self.dispatch_reaction(&reaction, ReactionAction::Add).await;
    }

    async fn reaction_remove(&self, _ctx: Context, reaction: Reaction) {
        self.dispatch_reaction(&reaction, ReactionAction::Remove).await;
    }

    async fn reaction_remove_all(
        &self,
        _ctx: Context,
        channel_id: sf::ChannelId,
        removed_from_message_id: sf::MessageId,
    ) {
        self.router
            .route_reactions_cleared(
                ChannelId::new(channel_id.get()),
                MessageId::new(removed_from_message_id.get()),
                None,
            )
            .await;
    }

    async fn reaction_remove_emoji(&self, _ctx: Context, removed_reactions: Reaction) {
        let emoji = emoji_key(&removed_reactions.emoji);
        self.router
            .route_reactions_cleared(
                ChannelId::new(removed_reactions.channel_id.get()),
                MessageId::new(removed_reactions.message_id.get()),
                Some(&emoji),
            )
            .await;
    }

    async fn message_delete(
        &self,
        _ctx: Context,
        channel_id: sf::ChannelId,
        deleted_message_id: sf::MessageId,
        _guild_id: Option<sf::GuildId>,
    ) {
        self.router
            .route_message_delete(
                ChannelId::new(channel_id.get()),
                MessageId::new(deleted_message_id.get()),
            )
            .await;
    }

    async fn message_delete_bulk(
        &self,
        _ctx: Context,
        channel_id: sf::ChannelId,
        multiple_deleted_messages_ids: Vec<sf::MessageId>,
        _guild_id: Option<sf::GuildId>,
    ) {
        let messages: Vec<MessageId> = multiple_deleted_messages_ids
            .iter()
            .map(|id| MessageId::new(id.get()))
            .collect();
        self.router
            .route_message_delete_bulk(ChannelId::new(channel_id.get()), &messages)
            .await;
    }
}
