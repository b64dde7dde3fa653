//! Chat platform error types.
//!
//! Every remote call the bot makes (fetch a message, edit a mirror, toggle a
//! role) can fail. The kinds here separate "the resource is gone", which the
//! fireboard recovers from by removing or recreating entries, from transient
//! failures that only abort the current operation.

/// Chat platform error conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum PlatformErrorKind {
    /// Message, channel, member or role does not exist (anymore).
    #[display("Not found: {}", _0)]
    NotFound(String),

    /// Bot lacks the permissions for an operation.
    #[display("Forbidden: {}", _0)]
    Forbidden(String),

    /// Request was rate limited by the platform.
    #[display("Rate limited: {}", _0)]
    RateLimited(String),

    /// Any other HTTP or gateway failure.
    #[display("Remote call failed: {}", _0)]
    Remote(String),

    /// Input could not be turned into a platform value (bad emoji, bad id).
    #[display("Invalid input: {}", _0)]
    InvalidInput(String),
}

/// Chat platform error with source location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Platform Error: {} at line {} in {}", kind, line, file)]
pub struct PlatformError {
    /// The kind of error that occurred
    pub kind: PlatformErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl PlatformError {
    /// Create a new PlatformError with automatic location tracking.
    ///
    /// # Examples
    ///
    /// ```
    /// use hearth_error::{PlatformError, PlatformErrorKind};
    ///
    /// let err = PlatformError::new(PlatformErrorKind::NotFound("message 42".to_string()));
    /// assert!(err.is_not_found());
    /// ```
    #[track_caller]
    pub fn new(kind: PlatformErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Shorthand for a `NotFound` error.
    #[track_caller]
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::new(PlatformErrorKind::NotFound(what.into()))
    }

    /// Whether the remote resource no longer exists.
    pub fn is_not_found(&self) -> bool {
        matches!(self.kind, PlatformErrorKind::NotFound(_))
    }
}

impl PlatformErrorKind {
    /// Classify an unsuccessful HTTP response by status code.
    pub fn from_status(status: u16, detail: String) -> Self {
        match status {
            404 => Self::NotFound(detail),
            403 => Self::Forbidden(detail),
            429 => Self::RateLimited(detail),
            _ => Self::Remote(detail),
        }
    }
}

#[cfg(feature = "discord")]
impl From<serenity::Error> for PlatformError {
    #[track_caller]
    fn from(err: serenity::Error) -> Self {
        use serenity::http::HttpError;

        let kind = match &err {
            serenity::Error::Http(HttpError::UnsuccessfulRequest(response)) => {
                let detail = format!("{} ({})", response.error.message, response.error.code);
                PlatformErrorKind::from_status(response.status_code.as_u16(), detail)
            }
            _ => PlatformErrorKind::Remote(err.to_string()),
        };
        PlatformError::new(kind)
    }
}
