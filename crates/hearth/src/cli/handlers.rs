//! Command handlers.

use super::OutputFormat;
use hearth::{HearthConfig, Secrets, Services, database_url_from_env, spawn_refresh};
use hearth_core::{ChannelId, MessageId};
use hearth_database::{EntryQuery, EntryStore, PgEntryStore, establish_pool, run_migrations};
use hearth_error::{DatabaseError, DatabaseErrorKind, HearthResult};
use hearth_social::discord::{HearthBot, HearthHandler};
use tracing::{error, info, instrument};

/// Connect to the gateway and process events until Ctrl+C.
#[instrument(skip_all)]
pub async fn run_bot(config: &HearthConfig) -> HearthResult<()> {
    config.validate()?;
    let secrets = Secrets::from_env()?;
    let services = Services::connect(config, &secrets).await?;

    let handler = HearthHandler::new(
        services.router.clone(),
        *config.scheduler().refresh_on_startup(),
    );
    let mut bot = HearthBot::new(secrets.discord_token(), handler).await?;

    let refresher = config
        .scheduler()
        .refresh_interval()
        .filter(|_| *config.fireboard().enabled())
        .map(|period| spawn_refresh(services.fireboard.clone(), period));

    let shard_manager = bot.shard_manager();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Shutdown requested"),
            Err(e) => error!(error = %e, "Failed to listen for Ctrl+C"),
        }
        shard_manager.shutdown_all().await;
    });

    let result = bot.start().await;
    if let Some(refresher) = refresher {
        refresher.abort();
    }
    result?;
    info!("Hearth stopped");
    Ok(())
}

/// One-shot full refresh over HTTP.
#[instrument(skip_all)]
pub async fn refresh_all(config: &HearthConfig) -> HearthResult<()> {
    config.validate()?;
    let secrets = Secrets::from_env()?;
    let services = Services::connect(config, &secrets).await?;

    let summary = services.fireboard.refresh_all_entries().await;
    println!("Fireboard refresh: {}", summary);
    Ok(())
}

/// One-shot refresh of a single message.
#[instrument(skip(config))]
pub async fn refresh_message(
    config: &HearthConfig,
    channel_id: ChannelId,
    message_id: MessageId,
) -> HearthResult<()> {
    config.validate()?;
    let secrets = Secrets::from_env()?;
    let services = Services::connect(config, &secrets).await?;

    let status = services
        .fireboard
        .refresh_message(channel_id, message_id)
        .await;
    println!("Message {}: {}", message_id, status);
    Ok(())
}

/// Print entry statistics and the most recent entries.
#[instrument(skip(config))]
pub async fn show_stats(
    config: &HearthConfig,
    limit: i64,
    format: OutputFormat,
) -> HearthResult<()> {
    let database_url = database_url_from_env()?;
    let pool = establish_pool(&database_url, *config.database().max_connections())?;
    let store = PgEntryStore::new(pool);

    let stats = store.stats().await?;
    let recent = store.list(EntryQuery::recent(limit)).await?;

    match format {
        OutputFormat::Json => {
            let report = serde_json::json!({ "stats": stats, "recent": recent });
            println!("{}", report);
        }
        OutputFormat::Human => {
            println!("Total entries:   {}", stats.total_entries);
            println!("Last 7 days:     {}", stats.recent_entries);
            if !recent.is_empty() {
                println!();
                println!("{:<20}  {:<20}  {:>5}  CREATED", "SOURCE", "MIRROR", "COUNT");
                for entry in &recent {
                    println!(
                        "{:<20}  {:<20}  {:>5}  {}",
                        entry.source_message_id(),
                        entry.mirror_message_id(),
                        entry.valid_reaction_count(),
                        entry.created_at().format("%Y-%m-%d %H:%M")
                    );
                }
            }
        }
    }
    Ok(())
}

/// Publish the reaction-role menu.
#[instrument(skip(config))]
pub async fn post_role_menu(config: &HearthConfig, channel_id: ChannelId) -> HearthResult<()> {
    config.reaction_roles().validate()?;
    let secrets = Secrets::from_env()?;
    let services = Services::connect(config, &secrets).await?;

    let location = services.roles.publish_menu(channel_id).await?;
    println!("Role menu posted: {}", location);
    Ok(())
}

/// Apply pending migrations.
#[instrument(skip(config))]
pub async fn migrate(config: &HearthConfig) -> HearthResult<()> {
    let database_url = database_url_from_env()?;
    let pool = establish_pool(&database_url, *config.database().max_connections())?;
    let applied = tokio::task::spawn_blocking(move || run_migrations(&pool))
        .await
        .map_err(|e| DatabaseError::new(DatabaseErrorKind::Task(e.to_string())))??;
    println!("Applied {} migration(s)", applied);
    Ok(())
}
