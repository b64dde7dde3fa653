//! Component wiring.
//!
//! Every component is built once here and shared by `Arc`; nothing is a
//! global.

use crate::{HearthConfig, Secrets};
use hearth_database::{EntryStore, PgEntryStore, StateStore, establish_pool};
use hearth_error::HearthResult;
use hearth_social::discord::SerenityPlatform;
use hearth_social::{ChatPlatform, EventRouter, FireboardEngine, RoleMapper};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// The bot's long-lived components.
pub struct Services {
    /// Fireboard engine.
    pub fireboard: Arc<FireboardEngine>,
    /// Reaction-role mapper.
    pub roles: Arc<RoleMapper>,
    /// Router feeding both, role menu first.
    pub router: Arc<EventRouter>,
}

impl Services {
    /// Wire components over the given stores and platform.
    pub fn assemble(
        config: &HearthConfig,
        entries: Arc<dyn EntryStore>,
        state: Arc<dyn StateStore>,
        platform: Arc<dyn ChatPlatform>,
    ) -> Self {
        let fireboard = Arc::new(FireboardEngine::new(
            config.fireboard().clone(),
            entries,
            Arc::clone(&platform),
        ));
        let roles = Arc::new(RoleMapper::new(
            config.reaction_roles().clone(),
            state,
            platform,
        ));
        let router = Arc::new(
            EventRouter::new(Arc::clone(&fireboard)).with_priority_handler(roles.clone()),
        );
        Self {
            fireboard,
            roles,
            router,
        }
    }

    /// Connect to PostgreSQL and Discord's HTTP API, then wire everything.
    ///
    /// The stored role-menu location is restored; failing to read it is
    /// logged and the menu stays inactive until it is published again.
    #[instrument(skip_all)]
    pub async fn connect(config: &HearthConfig, secrets: &Secrets) -> HearthResult<Self> {
        let pool = establish_pool(secrets.database_url(), *config.database().max_connections())?;
        let store = Arc::new(PgEntryStore::new(pool));
        let platform = Arc::new(
            SerenityPlatform::new(secrets.discord_token())
                .with_tracked_emojis(config.fireboard().emojis().iter().cloned()),
        );

        let services = Self::assemble(config, store.clone(), store, platform);
        match services.roles.load().await {
            Ok(Some(location)) => info!(%location, "Role menu restored"),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Failed to restore role menu location"),
        }
        Ok(services)
    }
}
