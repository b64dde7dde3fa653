//! Layered configuration for the Hearth binary.

use config::{Config, Environment, File, FileFormat};
use derive_getters::Getters;
use hearth_core::{FireboardSettings, RoleMenuSettings};
use hearth_error::{ConfigError, HearthResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, instrument};

/// Bundled defaults.
pub const DEFAULT_CONFIG: &str = include_str!("../../../hearth.toml");

/// Prefix for environment overrides, e.g. `HEARTH__FIREBOARD__THRESHOLD=5`.
pub const ENV_PREFIX: &str = "HEARTH";

/// Background refresh settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, derive_builder::Builder)]
#[builder(default)]
pub struct SchedulerSettings {
    /// Minutes between full fireboard refreshes. Zero disables them.
    #[serde(default = "default_refresh_interval")]
    refresh_interval_minutes: u64,
    /// Run one full refresh when the gateway connects.
    #[serde(default = "default_true")]
    refresh_on_startup: bool,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            refresh_interval_minutes: default_refresh_interval(),
            refresh_on_startup: true,
        }
    }
}

impl SchedulerSettings {
    /// Interval of the periodic refresh, or `None` when disabled.
    pub fn refresh_interval(&self) -> Option<Duration> {
        (self.refresh_interval_minutes > 0)
            .then(|| Duration::from_secs(self.refresh_interval_minutes * 60))
    }
}

fn default_refresh_interval() -> u64 {
    60
}

fn default_true() -> bool {
    true
}

/// Database pool settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct DatabaseSettings {
    /// Maximum pooled connections.
    #[serde(default = "default_max_connections")]
    max_connections: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
        }
    }
}

fn default_max_connections() -> u32 {
    5
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct LoggingSettings {
    /// Default filter when `RUST_LOG` is unset.
    #[serde(default = "default_level")]
    level: String,
    /// Emit JSON lines instead of human-readable text.
    #[serde(default)]
    json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

/// Complete bot configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, Getters)]
pub struct HearthConfig {
    /// Fireboard feature.
    #[serde(default)]
    fireboard: FireboardSettings,
    /// Reaction-role feature.
    #[serde(default)]
    reaction_roles: RoleMenuSettings,
    /// Background refresh.
    #[serde(default)]
    scheduler: SchedulerSettings,
    /// Connection pool.
    #[serde(default)]
    database: DatabaseSettings,
    /// Log output.
    #[serde(default)]
    logging: LoggingSettings,
}

impl HearthConfig {
    /// Load configuration with precedence, later sources overriding earlier:
    ///
    /// 1. Bundled defaults (`hearth.toml` shipped with the binary)
    /// 2. User config in the home directory (`~/.config/hearth/hearth.toml`)
    /// 3. `explicit` if given, otherwise `./hearth.toml` when present
    /// 4. `HEARTH__*` environment variables
    ///
    /// # Errors
    ///
    /// Fails if a source cannot be read or the merged result does not parse.
    #[instrument]
    pub fn load(explicit: Option<&Path>) -> HearthResult<Self> {
        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/hearth/hearth.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = match explicit {
            Some(path) => {
                debug!(path = %path.display(), "Using explicit config file");
                builder.add_source(File::from(path))
            }
            None => builder.add_source(File::with_name("hearth").required(false)),
        };

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = builder
            .build()
            .map_err(|e| ConfigError::new(format!("Failed to build configuration: {}", e)))?
            .try_deserialize()
            .map_err(|e| ConfigError::new(format!("Failed to parse configuration: {}", e)))?;
        Ok(config)
    }

    /// Parse a single TOML document on top of the bundled defaults.
    pub fn from_toml(document: &str) -> HearthResult<Self> {
        Ok(Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .add_source(File::from_str(document, FileFormat::Toml))
            .build()
            .map_err(|e| ConfigError::new(format!("Failed to build configuration: {}", e)))?
            .try_deserialize()
            .map_err(|e| ConfigError::new(format!("Failed to parse configuration: {}", e)))?)
    }

    /// Check every section.
    ///
    /// Loading does not validate, so commands that never touch a feature can
    /// run without configuring it.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.fireboard.validate()?;
        self.reaction_roles.validate()?;
        if self.database.max_connections == 0 {
            return Err(ConfigError::new("database.max_connections must be at least 1"));
        }
        Ok(())
    }
}

/// Secrets read from the environment, never from config files.
#[derive(Clone, Getters)]
pub struct Secrets {
    discord_token: String,
    database_url: String,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("discord_token", &"<redacted>")
            .field("database_url", &"<redacted>")
            .finish()
    }
}

impl Secrets {
    /// Read `DISCORD_TOKEN` and `DATABASE_URL`, loading `.env` first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        // A missing .env file is fine; the variables may be set directly.
        let _ = dotenvy::dotenv();
        Ok(Self {
            discord_token: required_var("DISCORD_TOKEN")?,
            database_url: required_var("DATABASE_URL")?,
        })
    }
}

/// Read `DATABASE_URL` only, for commands that never touch Discord.
pub fn database_url_from_env() -> Result<String, ConfigError> {
    let _ = dotenvy::dotenv();
    required_var("DATABASE_URL")
}

fn required_var(name: &str) -> Result<String, ConfigError> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| ConfigError::new(format!("{} environment variable not set", name)))
}
