//! CLI command definitions.

use clap::{Parser, Subcommand, ValueEnum};
use hearth_core::{ChannelId, MessageId};
use std::path::PathBuf;

/// Hearth - fireboard and reaction roles for Discord communities
#[derive(Parser, Debug)]
#[command(name = "hearth")]
#[command(about = "Fireboard and reaction-role bot for Discord communities", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (defaults to ./hearth.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Connect to the gateway and process events
    Run,

    /// Re-sync every fireboard entry once and exit
    RefreshAll,

    /// Re-evaluate a single message
    Refresh {
        /// Channel containing the message
        channel_id: ChannelId,
        /// Message to evaluate
        message_id: MessageId,
    },

    /// Show fireboard statistics and recent entries
    Stats {
        /// Number of recent entries to list
        #[arg(long, default_value = "10")]
        limit: i64,

        /// Output format
        #[arg(long, default_value = "human")]
        format: OutputFormat,
    },

    /// Publish the reaction-role menu in a channel
    PostRoleMenu {
        /// Channel to post the menu in
        channel_id: ChannelId,
    },

    /// Apply pending database migrations
    Migrate,
}

/// Output format options
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable format
    Human,
    /// JSON format
    Json,
}
