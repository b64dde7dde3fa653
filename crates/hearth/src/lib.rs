//! Hearth: a Discord community bot.
//!
//! Hearth mirrors popular messages into a fireboard channel and hands out
//! roles from a reaction menu. This crate is the binary's library half:
//! configuration, logging, component wiring and the refresh scheduler.
//!
//! # Cargo Features
//!
//! - `observability` - export tracing spans through OpenTelemetry (stdout)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod app;
mod config;
mod logging;
#[cfg(feature = "observability")]
mod observability;
mod scheduler;

pub use app::Services;
pub use config::{
    DEFAULT_CONFIG, DatabaseSettings, ENV_PREFIX, HearthConfig, LoggingSettings, SchedulerSettings,
    SchedulerSettingsBuilder, Secrets, database_url_from_env,
};
pub use logging::init_logging;
#[cfg(feature = "observability")]
pub use observability::{ObservabilityConfig, ObservabilityGuard, init_observability};
pub use scheduler::{spawn_periodic, spawn_refresh};
