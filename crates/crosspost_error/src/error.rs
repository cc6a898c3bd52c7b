//! Top-level error wrapper types.

use crate::{
    AuthorizationError, ConfigError, LedgerError, LinkCacheError, ReferenceError, StagingError,
    UpstreamError, ValidationError,
};

/// Every error condition the bridge can report.
///
/// # Examples
///
/// ```
/// use crosspost_error::{CrosspostError, ReferenceError};
///
/// let ref_err = ReferenceError::new("http://example.org/cat.png");
/// let err: CrosspostError = ref_err.into();
/// assert!(format!("{}", err).contains("Invalid reference"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum CrosspostErrorKind {
    /// Staging store error (size, count, missing media, I/O)
    #[from(StagingError)]
    Staging(StagingError),
    /// Malformed URL or content reference
    #[from(ReferenceError)]
    Reference(ReferenceError),
    /// Remote network or API failure
    #[from(UpstreamError)]
    Upstream(UpstreamError),
    /// Undo attempted by someone other than the owner
    #[from(AuthorizationError)]
    Authorization(AuthorizationError),
    /// Ledger actor unreachable
    #[from(LedgerError)]
    Ledger(LedgerError),
    /// Link upload cache error
    #[from(LinkCacheError)]
    LinkCache(LinkCacheError),
    /// Input rejected before anything was sent
    #[from(ValidationError)]
    Validation(ValidationError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
}

/// Crosspost error with kind discrimination.
///
/// # Examples
///
/// ```
/// use crosspost_error::{ConfigError, ConfigErrorKind, CrosspostErrorKind, CrosspostResult};
///
/// fn might_fail() -> CrosspostResult<()> {
///     Err(ConfigError::new(ConfigErrorKind::Invalid("queue_depth = 0".into())))?
/// }
///
/// let err = might_fail().unwrap_err();
/// assert!(matches!(err.kind(), CrosspostErrorKind::Config(_)));
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Crosspost Error: {}", _0)]
pub struct CrosspostError(Box<CrosspostErrorKind>);

impl CrosspostError {
    /// Create a new error from a kind.
    pub fn new(kind: CrosspostErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &CrosspostErrorKind {
        &self.0
    }
}

// Generic From implementation for any type that converts to CrosspostErrorKind
impl<T> From<T> for CrosspostError
where
    T: Into<CrosspostErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for crosspost operations.
pub type CrosspostResult<T> = std::result::Result<T, CrosspostError>;
