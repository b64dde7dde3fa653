//! Hearth CLI binary.
//!
//! - Run the bot against the Discord gateway
//! - Refresh the fireboard on demand
//! - Inspect entries, publish the role menu, migrate the database

use clap::Parser;
use hearth::HearthConfig;

mod cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use cli::{
        Cli, Commands, migrate, post_role_menu, refresh_all, refresh_message, run_bot, show_stats,
    };

    let cli = Cli::parse();
    let config = HearthConfig::load(cli.config.as_deref())?;

    // Initialize tracing
    let level = if cli.verbose {
        "debug".to_string()
    } else {
        config.logging().level().clone()
    };
    let json = cli.json_logs || *config.logging().json();

    #[cfg(feature = "observability")]
    let _guard = hearth::init_observability(
        hearth::ObservabilityConfig::new("hearth")
            .with_log_level(level)
            .with_json_logs(json),
    )?;
    #[cfg(not(feature = "observability"))]
    hearth::init_logging(&level, json)?;

    match cli.command {
        Commands::Run => run_bot(&config).await?,
        Commands::RefreshAll => refresh_all(&config).await?,
        Commands::Refresh {
            channel_id,
            message_id,
        } => refresh_message(&config, channel_id, message_id).await?,
        Commands::Stats { limit, format } => show_stats(&config, limit, format).await?,
        Commands::PostRoleMenu { channel_id } => post_role_menu(&config, channel_id).await?,
        Commands::Migrate => migrate(&config).await?,
    }

    Ok(())
}
