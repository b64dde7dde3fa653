//! Error types for the Hearth bot.
//!
//! This crate provides the foundation error types used throughout the Hearth workspace.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All constructors use `#[track_caller]` for automatic location capture
//!
//! # Examples
//!
//! ```
//! use hearth_error::{ConfigError, HearthResult};
//!
//! fn load_threshold() -> HearthResult<u32> {
//!     Err(ConfigError::new("threshold must be at least 1"))?
//! }
//!
//! assert!(load_threshold().is_err());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod database;
mod error;
mod platform;

pub use config::ConfigError;
pub use database::{DatabaseError, DatabaseErrorKind};
pub use error::{HearthError, HearthErrorKind, HearthResult};
pub use platform::{PlatformError, PlatformErrorKind};
