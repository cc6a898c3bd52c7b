//! Upstream (remote network) error types.

/// A download, upload or publish call against a remote service failed.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Upstream Error ({}): {} at line {} in {}", service, message, line, file)]
pub struct UpstreamError {
    /// Which remote service failed (e.g. "mastodon", "matrix")
    pub service: String,
    /// The underlying error message
    pub message: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl UpstreamError {
    /// Create a new UpstreamError at the current location.
    ///
    /// # Examples
    ///
    /// ```
    /// use crosspost_error::UpstreamError;
    ///
    /// let err = UpstreamError::new("twitter", "rate limited");
    /// assert_eq!(err.service, "twitter");
    /// ```
    #[track_caller]
    pub fn new(service: impl Into<String>, message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            service: service.into(),
            message: message.into(),
            line: location.line(),
            file: location.file(),
        }
    }
}
