//! Media staging store.

use crate::address::{ContentKey, EntryType};
use crate::fs::{
    commit, count_entries_bounded, create_private, ensure_dir, is_tmp, remove_quietly, tmp_path,
};
use crate::limit::{SizeCeiling, copy_limited};
use crate::{StagingConfig, StagingRoot};
use crosspost_core::{EventId, UserId};
use crosspost_error::{CrosspostResult, StagingError, StagingErrorKind};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::io::AsyncRead;

/// Per-user store of media awaiting attachment to the user's next post.
///
/// Entries are keyed by the chat event that delivered them and live under a
/// directory named after the sender's hash. File mtime is the only recency
/// signal. Cloning yields a handle onto the same root.
///
/// # Quotas
///
/// - At most `max_entries_per_user` entries per user and type. The count is
///   taken from a bounded directory read before anything is written and is not
///   linearizable: two concurrent puts of one user can both pass it.
///   Callers that need a hard bound serialize per user.
/// - Media size may not exceed [`StagingConfig::effective_ceiling`]. Declared
///   sizes are checked before the transfer, actual bytes during it.
#[derive(Debug, Clone)]
pub struct MediaStagingStore {
    root: Arc<StagingRoot>,
    config: StagingConfig,
}

impl MediaStagingStore {
    /// Create a store under `root`.
    pub fn new(root: Arc<StagingRoot>, config: StagingConfig) -> Self {
        Self { root, config }
    }

    /// Store configuration.
    pub fn config(&self) -> &StagingConfig {
        &self.config
    }

    /// Staging root.
    pub fn root(&self) -> &StagingRoot {
        &self.root
    }

    /// Stage media for `user`, keyed by the event that carried it.
    ///
    /// Returns the final path. On any failure no final file exists and the
    /// temporary file is gone.
    ///
    /// # Errors
    ///
    /// - `SizeLimitExceeded` if the declared or actual size is above the ceiling
    /// - `CountLimitExceeded` if the user already has the maximum entries
    /// - I/O errors from the filesystem
    #[tracing::instrument(skip(self, source), fields(user = %user, event_id = %event_id))]
    pub async fn put<R>(
        &self,
        user: &UserId,
        event_id: &EventId,
        source: R,
        declared_length: Option<u64>,
    ) -> CrosspostResult<PathBuf>
    where
        R: AsyncRead + Unpin + Send,
    {
        let ceiling = self.config.effective_ceiling();
        let key = ContentKey::for_event(event_id);
        self.write_entry(user, EntryType::Media, &key, source, declared_length, &ceiling)
            .await
    }

    /// Write one entry through the limiter and commit it atomically.
    pub(crate) async fn write_entry<R>(
        &self,
        user: &UserId,
        entry_type: EntryType,
        key: &ContentKey,
        mut source: R,
        declared_length: Option<u64>,
        ceiling: &SizeCeiling,
    ) -> CrosspostResult<PathBuf>
    where
        R: AsyncRead + Unpin + Send,
    {
        if let Some(declared) = declared_length {
            ceiling.check(declared)?;
        }

        let dir = self.root.type_dir(user, entry_type);
        let dest = dir.join(key.as_str());

        // Replacing an entry does not take a new slot.
        let replacing = tokio::fs::try_exists(&dest).await.unwrap_or(false);
        if !replacing {
            let limit = *self.config.max_entries_per_user();
            let count = count_entries_bounded(&dir, limit.saturating_add(1)).await?;
            if count >= limit {
                tracing::debug!(count, limit, "Refusing entry over count limit");
                return Err(StagingError::new(StagingErrorKind::CountLimitExceeded(limit)).into());
            }
        }

        ensure_dir(&dir).await?;
        let tmp = tmp_path(&dest);
        let mut file = create_private(&tmp).await?;

        let written = match copy_limited(&mut source, &mut file, ceiling).await {
            Ok(written) => written,
            Err(e) => {
                drop(file);
                remove_quietly(&tmp).await;
                return Err(e);
            }
        };

        if let Some(declared) = declared_length.filter(|d| *d != written) {
            tracing::warn!(
                declared,
                written,
                "Declared length does not match transferred bytes"
            );
        }

        if let Err(e) = commit(file, &tmp, &dest).await {
            remove_quietly(&tmp).await;
            return Err(e);
        }

        tracing::info!(
            entry_type = %entry_type,
            path = %dest.display(),
            size = written,
            "Staged entry"
        );
        Ok(dest)
    }

    /// Staged entries of `user`, newest first, at most `max_entries_per_user`.
    ///
    /// In-progress temporary files are skipped. A user with nothing staged
    /// gets an empty list.
    #[tracing::instrument(skip(self), fields(user = %user))]
    pub async fn list(&self, user: &UserId, entry_type: EntryType) -> CrosspostResult<Vec<PathBuf>> {
        let dir = self.root.type_dir(user, entry_type);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(read_error(&dir, e)),
        };

        let mut found = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| read_error(&dir, e))? {
            let path = entry.path();
            if is_tmp(&path) {
                continue;
            }
            // Entry may vanish between readdir and stat.
            let modified = match entry.metadata().await.and_then(|m| m.modified()) {
                Ok(modified) => modified,
                Err(_) => continue,
            };
            found.push((modified, path));
        }

        found.sort_by(|a, b| b.0.cmp(&a.0));
        found.truncate(*self.config.max_entries_per_user());
        tracing::debug!(count = found.len(), "Listed staged entries");
        Ok(found.into_iter().map(|(_, path)| path).collect())
    }

    /// Whether `user` has a final entry under `key`.
    pub async fn contains(&self, user: &UserId, entry_type: EntryType, key: &ContentKey) -> bool {
        let path = self.root.entry_path(user, entry_type, key);
        tokio::fs::try_exists(&path).await.unwrap_or(false)
    }

    /// Remove the media staged by `event_id`, and its description if any.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no such media is staged.
    #[tracing::instrument(skip(self), fields(user = %user, event_id = %event_id))]
    pub async fn remove(&self, user: &UserId, event_id: &EventId) -> CrosspostResult<()> {
        let key = ContentKey::for_event(event_id);
        remove_quietly(&self.root.entry_path(user, EntryType::Text, &key)).await;

        let media = self.root.entry_path(user, EntryType::Media, &key);
        tokio::fs::remove_file(&media).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StagingError::new(StagingErrorKind::NotFound(event_id.to_string()))
            } else {
                StagingError::new(StagingErrorKind::FileWrite(format!(
                    "remove {}: {}",
                    media.display(),
                    e
                )))
            }
        })?;

        tracing::info!("Removed staged media");
        Ok(())
    }

    /// Remove everything staged by `user`, media and descriptions alike.
    #[tracing::instrument(skip(self), fields(user = %user))]
    pub async fn remove_all(&self, user: &UserId) -> CrosspostResult<()> {
        let dir = self.root.user_dir(user);
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => {
                tracing::info!("Purged staged entries");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StagingError::new(StagingErrorKind::FileWrite(format!(
                "remove {}: {}",
                dir.display(),
                e
            )))
            .into()),
        }
    }
}

/// Split `paths` into those modified within `max_age` and those older.
///
/// Every input lands in exactly one side, order preserved. A modification
/// time in the future counts as age zero.
///
/// # Errors
///
/// Returns `FileRead` if a path cannot be stat'ed.
pub async fn filter_by_age(
    paths: &[PathBuf],
    max_age: Duration,
) -> CrosspostResult<(Vec<PathBuf>, Vec<PathBuf>)> {
    let now = SystemTime::now();
    let mut within = Vec::new();
    let mut over = Vec::new();

    for path in paths {
        let modified = tokio::fs::metadata(path)
            .await
            .and_then(|m| m.modified())
            .map_err(|e| read_error(path, e))?;
        let age = now.duration_since(modified).unwrap_or(Duration::ZERO);
        if age > max_age {
            over.push(path.clone());
        } else {
            within.push(path.clone());
        }
    }

    Ok((within, over))
}

fn read_error(path: &Path, e: std::io::Error) -> crosspost_error::CrosspostError {
    StagingError::new(StagingErrorKind::FileRead(format!("{}: {}", path.display(), e))).into()
}
