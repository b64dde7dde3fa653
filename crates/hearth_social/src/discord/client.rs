//! Discord client setup and lifecycle.

use super::HearthHandler;
use crate::PlatformResult;
use serenity::Client;
use serenity::gateway::ShardManager;
use std::sync::Arc;
use tracing::{info, instrument};

/// Gateway client running a [`HearthHandler`].
///
/// # Example
/// ```no_run
/// # use std::sync::Arc;
/// # use hearth_social::EventRouter;
/// use hearth_social::discord::{HearthBot, HearthHandler};
///
/// # async fn run(token: String, router: Arc<EventRouter>) -> Result<(), Box<dyn std::error::Error>> {
/// let mut bot = HearthBot::new(&token, HearthHandler::new(router, true)).await?;
/// bot.start().await?;
/// # Ok(())
/// # }
/// ```
pub struct HearthBot {
    client: Client,
}

impl HearthBot {
    /// Build the Serenity client.
    ///
    /// # Errors
    ///
    /// Fails if the token is malformed or the client cannot be built.
    #[instrument(skip(token, handler), fields(token_len = token.len()))]
    pub async fn new(token: &str, handler: HearthHandler) -> PlatformResult<Self> {
        let intents = HearthHandler::intents();
        info!(?intents, "Building Serenity client");

        let client = Client::builder(token, intents)
            .event_handler(handler)
            .await?;
        Ok(Self { client })
    }

    /// Handle for shutting the gateway down from another task.
    pub fn shard_manager(&self) -> Arc<ShardManager> {
        Arc::clone(&self.client.shard_manager)
    }

    /// Connect and process events until shutdown.
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> PlatformResult<()> {
        info!("Starting Discord gateway");
        self.client.start().await?;
        Ok(())
    }
}
