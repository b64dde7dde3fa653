//! Top-level error wrapper types.

use crate::{ConfigError, DatabaseError, PlatformError};

/// Every error a Hearth component can surface.
///
/// # Examples
///
/// ```
/// use hearth_error::{ConfigError, HearthError};
///
/// let err: HearthError = ConfigError::new("missing token").into();
/// assert!(format!("{}", err).contains("Configuration Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum HearthErrorKind {
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Database error
    #[from(DatabaseError)]
    Database(DatabaseError),
    /// Chat platform error
    #[from(PlatformError)]
    Platform(PlatformError),
}

/// Hearth error with kind discrimination.
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Hearth Error: {}", _0)]
pub struct HearthError(Box<HearthErrorKind>);

impl HearthError {
    /// Create a new error from a kind.
    pub fn new(kind: HearthErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &HearthErrorKind {
        &self.0
    }
}

impl<T> From<T> for HearthError
where
    T: Into<HearthErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Hearth operations.
pub type HearthResult<T> = std::result::Result<T, HearthError>;
