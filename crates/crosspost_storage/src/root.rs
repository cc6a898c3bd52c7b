//! Process-scoped staging root.

use crate::address::{ContentKey, EntryType, user_dir_name};
use crosspost_core::UserId;
use crosspost_error::{CrosspostResult, StagingError, StagingErrorKind};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Root directory all staged entries live under.
///
/// A root made by [`create_in`](Self::create_in) is a fresh owner-only
/// directory that is removed with everything in it when the root is dropped.
/// Staged content never outlives the process.
#[derive(Debug)]
pub struct StagingRoot {
    path: PathBuf,
    _temp: Option<TempDir>,
}

impl StagingRoot {
    /// Create a fresh, private, self-deleting root inside `parent`.
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created.
    #[tracing::instrument(skip(parent), fields(parent = %parent.as_ref().display()))]
    pub fn create_in(parent: impl AsRef<Path>) -> CrosspostResult<Self> {
        let temp = tempfile::Builder::new()
            .prefix("crosspost")
            .tempdir_in(parent.as_ref())
            .map_err(|e| {
                StagingError::new(StagingErrorKind::DirectoryCreation(format!(
                    "{}: {}",
                    parent.as_ref().display(),
                    e
                )))
            })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(temp.path(), std::fs::Permissions::from_mode(0o700))
                .map_err(|e| {
                    StagingError::new(StagingErrorKind::DirectoryCreation(format!(
                        "chmod {}: {}",
                        temp.path().display(),
                        e
                    )))
                })?;
        }

        tracing::info!(path = %temp.path().display(), "Created staging root");
        Ok(Self {
            path: temp.path().to_path_buf(),
            _temp: Some(temp),
        })
    }

    /// Use an existing directory as root. It is not removed on drop.
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created.
    pub fn at(path: impl Into<PathBuf>) -> CrosspostResult<Self> {
        let path = path.into();
        std::fs::create_dir_all(&path).map_err(|e| {
            StagingError::new(StagingErrorKind::DirectoryCreation(format!(
                "{}: {}",
                path.display(),
                e
            )))
        })?;
        Ok(Self { path, _temp: None })
    }

    /// Root directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `<root>/<hash(user)>`
    pub fn user_dir(&self, user: &UserId) -> PathBuf {
        self.path.join(user_dir_name(user))
    }

    /// `<root>/<hash(user)>/<type>`
    pub fn type_dir(&self, user: &UserId, entry_type: EntryType) -> PathBuf {
        self.user_dir(user).join(entry_type.dir_name())
    }

    /// `<root>/<hash(user)>/<type>/<key>`
    pub fn entry_path(&self, user: &UserId, entry_type: EntryType, key: &ContentKey) -> PathBuf {
        self.type_dir(user, entry_type).join(key.as_str())
    }
}
