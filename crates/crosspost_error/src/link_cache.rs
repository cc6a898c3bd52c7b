//! Link upload cache error types.

/// Kinds of link cache errors.
///
/// The resolution errors carry messages rather than nested errors so that one
/// failed fetch can be cloned out to every caller waiting on the same URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum LinkCacheErrorKind {
    /// URL is malformed or uses an unsupported scheme
    #[display("Invalid link: {}", _0)]
    InvalidLink(String),
    /// Linked media is larger than the configured ceiling
    #[display("Linked media exceeds {} bytes: {}", limit, actual)]
    TooLarge {
        /// Configured ceiling
        limit: u64,
        /// Declared length
        actual: u64,
    },
    /// Fetch or re-upload failed
    #[display("Link resolution failed: {}", _0)]
    Upstream(String),
    /// The cache worker has shut down
    #[display("Link cache worker unavailable")]
    WorkerGone,
}

/// Link cache error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Link Cache Error: {} at line {} in {}", kind, line, file)]
pub struct LinkCacheError {
    /// The kind of error that occurred
    pub kind: LinkCacheErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl LinkCacheError {
    /// Create a new link cache error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: LinkCacheErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &LinkCacheErrorKind {
        &self.kind
    }
}
