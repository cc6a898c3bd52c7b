//! Authorization error types.

/// A user tried to undo or amend an action owned by someone else.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display(
    "Unauthorized: {} may not act on an action owned by {} at line {} in {}",
    user,
    owner,
    line,
    file
)]
pub struct AuthorizationError {
    /// User attempting the operation
    pub user: String,
    /// Owner recorded in the ledger
    pub owner: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl AuthorizationError {
    /// Create a new AuthorizationError at the current location.
    #[track_caller]
    pub fn new(user: impl Into<String>, owner: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            user: user.into(),
            owner: owner.into(),
            line: location.line(),
            file: location.file(),
        }
    }
}
