//! Event routing between features.

use crate::{Dispatch, FireboardEngine, ReactionHandler};
use hearth_core::{ChannelId, MessageId, ReactionEvent};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Sends reaction events to handlers in priority order.
///
/// The first handler that claims an event stops the walk, so a reaction on
/// the role menu never reaches the fireboard. Deletions go straight to the
/// fireboard.
pub struct EventRouter {
    handlers: Vec<Arc<dyn ReactionHandler>>,
    fireboard: Arc<FireboardEngine>,
}

impl EventRouter {
    /// Router with only the fireboard registered.
    pub fn new(fireboard: Arc<FireboardEngine>) -> Self {
        Self {
            handlers: vec![fireboard.clone() as Arc<dyn ReactionHandler>],
            fireboard,
        }
    }

    /// Register a handler ahead of every handler already present.
    pub fn with_priority_handler(mut self, handler: Arc<dyn ReactionHandler>) -> Self {
        self.handlers.insert(0, handler);
        self
    }

    /// Handler names in the order they are tried.
    pub fn handler_names(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|handler| handler.name()).collect()
    }

    /// The fireboard engine.
    pub fn fireboard(&self) -> &Arc<FireboardEngine> {
        &self.fireboard
    }

    /// Offer a reaction event to each handler until one claims it.
    ///
    /// Returns the name of the claiming handler.
    #[instrument(skip_all, fields(message_id = %event.message_id, action = ?event.action))]
    pub async fn route_reaction(&self, event: &ReactionEvent) -> Option<&'static str> {
        for handler in &self.handlers {
            if handler.on_reaction(event).await == Dispatch::Claimed {
                debug!(handler = handler.name(), "Reaction claimed");
                return Some(handler.name());
            }
        }
        None
    }

    /// Forward a message deletion.
    pub async fn route_message_delete(&self, channel_id: ChannelId, message_id: MessageId) {
        self.fireboard
            .handle_message_delete(channel_id, message_id)
            .await;
    }

    /// Forward a reaction clear on one message.
    pub async fn route_reactions_cleared(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        emoji: Option<&str>,
    ) {
        self.fireboard
            .handle_reactions_cleared(channel_id, message_id, emoji)
            .await;
    }

    /// Forward a bulk deletion.
    pub async fn route_message_delete_bulk(&self, channel_id: ChannelId, messages: &[MessageId]) {
        self.fireboard
            .handle_message_delete_bulk(channel_id, messages)
            .await;
    }
}
