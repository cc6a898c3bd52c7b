//! Invalid reference errors.

/// A URL or content reference that cannot be used.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Invalid reference: {} at line {} in {}", reference, line, file)]
pub struct ReferenceError {
    /// The offending reference
    pub reference: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl ReferenceError {
    /// Create a new ReferenceError at the current location.
    ///
    /// # Examples
    ///
    /// ```
    /// use crosspost_error::ReferenceError;
    ///
    /// let err = ReferenceError::new("ftp://example.org/x");
    /// assert_eq!(err.reference, "ftp://example.org/x");
    /// ```
    #[track_caller]
    pub fn new(reference: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            reference: reference.into(),
            line: location.line(),
            file: location.file(),
        }
    }
}
