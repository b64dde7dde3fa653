//! Persistence for the Hearth bot.
//!
//! This crate owns the `fireboard_entries` and `bot_state` tables and exposes
//! them through two traits:
//!
//! - [`EntryStore`] - fireboard entries keyed by source message, unique on
//!   mirror message, with atomic create-or-get
//! - [`StateStore`] - a small key-value table for runtime state
//!
//! Both are implemented by [`PgEntryStore`] (Diesel over an r2d2 pool, with
//! embedded migrations) and [`MemoryEntryStore`].
//!
//! # Example
//!
//! ```rust,ignore
//! use hearth_database::{PgEntryStore, establish_pool_from_env, run_migrations};
//!
//! let pool = establish_pool_from_env(4)?;
//! run_migrations(&pool)?;
//! let store = PgEntryStore::new(pool);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod connection;
mod memory;
mod models;
mod postgres;
mod store;

/// Diesel table definitions.
pub mod schema;

pub use connection::{PgPool, establish_pool, establish_pool_from_env, run_migrations};
pub use memory::MemoryEntryStore;
pub use postgres::PgEntryStore;
pub use store::{
    CreateOutcome, EntryChanges, EntryQuery, EntryStats, EntryStore, RECENT_WINDOW_DAYS,
    StateStore,
};

use hearth_error::DatabaseError;

/// Result type for database operations.
pub type DatabaseResult<T> = Result<T, DatabaseError>;
