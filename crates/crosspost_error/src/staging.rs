//! Staging store error types.

/// Kinds of staging store errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum StagingErrorKind {
    /// Declared or transferred size is above a configured ceiling
    #[display("Media too large for {}. Please shrink to below {} bytes (got {})", ceiling, limit, actual)]
    SizeLimitExceeded {
        /// Name of the ceiling that was hit (a network name or "global")
        ceiling: String,
        /// The ceiling in bytes
        limit: u64,
        /// Bytes declared or counted
        actual: u64,
    },
    /// The user already has the maximum number of staged entries
    #[display("Too many files stored. {} is the limit", _0)]
    CountLimitExceeded(usize),
    /// Staged entry or its paired media file does not exist
    #[display("Not found: {}", _0)]
    NotFound(String),
    /// Failed to create a staging directory
    #[display("Failed to create staging directory: {}", _0)]
    DirectoryCreation(String),
    /// Failed to write file
    #[display("Failed to write file: {}", _0)]
    FileWrite(String),
    /// Failed to read file or directory
    #[display("Failed to read file: {}", _0)]
    FileRead(String),
    /// Path is not inside a staging type directory
    #[display("Invalid staging path: {}", _0)]
    InvalidPath(String),
}

/// Staging error with location tracking.
///
/// # Examples
///
/// ```
/// use crosspost_error::{StagingError, StagingErrorKind};
///
/// let err = StagingError::new(StagingErrorKind::CountLimitExceeded(3));
/// assert!(format!("{}", err).contains("3 is the limit"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Staging Error: {} at line {} in {}", kind, line, file)]
pub struct StagingError {
    /// The kind of error that occurred
    pub kind: StagingErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl StagingError {
    /// Create a new staging error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: StagingErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &StagingErrorKind {
        &self.kind
    }
}
