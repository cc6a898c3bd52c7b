//! Ownership checks for undoing recorded actions.

use crosspost_core::{PostActionRecord, UserId};
use crosspost_error::AuthorizationError;

/// Allow `user` to undo or amend `record`.
///
/// Only the recorded owner may, unless `admin_override` is set.
///
/// # Examples
///
/// ```
/// use crosspost_core::{ActionKind, PostActionRecord, UserId};
/// use crosspost_ledger::authorize;
///
/// let alice = UserId::from("@alice:example.org");
/// let bob = UserId::from("@bob:example.org");
/// let record = PostActionRecord::new(alice.clone(), ActionKind::Post);
///
/// assert!(authorize(&record, &alice, false).is_ok());
/// assert!(authorize(&record, &bob, false).is_err());
/// assert!(authorize(&record, &bob, true).is_ok());
/// ```
pub fn authorize(
    record: &PostActionRecord,
    user: &UserId,
    admin_override: bool,
) -> Result<(), AuthorizationError> {
    if record.is_owned_by(user) {
        return Ok(());
    }
    if admin_override {
        tracing::info!(
            user = %user,
            owner = %record.owner(),
            action = %record.action(),
            "Allowing action on another user's record by admin override"
        );
        return Ok(());
    }
    Err(AuthorizationError::new(user.as_str(), record.owner().as_str()))
}
