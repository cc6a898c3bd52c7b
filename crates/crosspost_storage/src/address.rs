//! Content addressing.
//!
//! Every path component below the staging root is a SHA-256 hex digest, so a
//! hostile user or event id can never escape its directory and raw identities
//! never appear on disk.

use crosspost_core::{EventId, UserId};
use sha2::{Digest, Sha256};
use std::path::Path;

/// Kind of staged entry, one subdirectory per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum EntryType {
    /// Binary media awaiting attachment
    Media,
    /// UTF-8 description of the media with the same key
    Text,
}

impl EntryType {
    /// Directory name under the user directory.
    pub fn dir_name(&self) -> &'static str {
        match self {
            EntryType::Media => "media",
            EntryType::Text => "text",
        }
    }
}

/// SHA-256 hex digest naming one staged entry.
///
/// # Examples
///
/// ```
/// use crosspost_core::EventId;
/// use crosspost_storage::ContentKey;
///
/// let a = ContentKey::for_event(&EventId::from("$abc"));
/// let b = ContentKey::for_event(&EventId::from("$abc"));
/// assert_eq!(a, b);
/// assert_eq!(a.as_str().len(), 64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
#[display("{}", _0)]
pub struct ContentKey(String);

impl ContentKey {
    /// Key of the entry created by `event_id`.
    pub fn for_event(event_id: &EventId) -> Self {
        Self(hash_hex(event_id.as_str()))
    }

    /// Recover the key from a staged path (final name only).
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        if name.len() == 64 && name.bytes().all(|b| b.is_ascii_hexdigit()) {
            Some(Self(name.to_string()))
        } else {
            None
        }
    }

    /// Hex digest.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Directory name of a user under the staging root.
pub(crate) fn user_dir_name(user: &UserId) -> String {
    hash_hex(user.as_str())
}

fn hash_hex(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    format!("{:x}", hasher.finalize())
}
