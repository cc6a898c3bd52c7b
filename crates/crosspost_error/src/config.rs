//! Bridge configuration errors.

/// Where loading the bridge configuration went wrong.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ConfigErrorKind {
    /// A source (bundled defaults, file, environment) could not be read or merged
    #[display("Cannot load configuration source: {}", _0)]
    Load(String),
    /// The merged sources do not match the expected shape
    #[display("Cannot parse configuration: {}", _0)]
    Parse(String),
    /// A value parsed but cannot be used
    #[display("Unusable configuration value: {}", _0)]
    Invalid(String),
}

/// Bridge configuration error with location tracking.
///
/// # Examples
///
/// ```
/// use crosspost_error::{ConfigError, ConfigErrorKind};
///
/// let err = ConfigError::new(ConfigErrorKind::Parse(
///     "networks.mastodon.max_chars: invalid type".into(),
/// ));
/// assert!(matches!(err.kind(), ConfigErrorKind::Parse(_)));
/// assert!(format!("{}", err).contains("max_chars"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Config Error: {} at line {} in {}", kind, line, file)]
pub struct ConfigError {
    /// What went wrong
    pub kind: ConfigErrorKind,
    /// Line number where the error was created
    pub line: u32,
    /// File where the error was created
    pub file: &'static str,
}

impl ConfigError {
    /// Create a configuration error at the caller's location.
    #[track_caller]
    pub fn new(kind: ConfigErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &ConfigErrorKind {
        &self.kind
    }
}
