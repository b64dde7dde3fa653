//! Command-line interface for the hearth binary.

mod commands;
mod handlers;

pub use commands::{Cli, Commands, OutputFormat};
pub use handlers::{migrate, post_role_menu, refresh_all, refresh_message, run_bot, show_stats};
