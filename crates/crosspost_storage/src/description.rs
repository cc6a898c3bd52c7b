//! Descriptions paired with staged media.

use crate::address::{ContentKey, EntryType};
use crate::{MediaStagingStore, StagingRoot};
use crosspost_core::{EventId, UserId};
use crosspost_error::{CrosspostResult, StagingError, StagingErrorKind};
use std::path::{Path, PathBuf};

/// Alt-text store keyed like [`MediaStagingStore`].
///
/// A description only exists next to the media with the same key; writing
/// one for missing media fails with `NotFound`.
#[derive(Debug, Clone)]
pub struct DescriptionStore {
    media: MediaStagingStore,
}

impl DescriptionStore {
    /// Create a description store over `media`.
    pub fn new(media: MediaStagingStore) -> Self {
        Self { media }
    }

    /// Describe the media staged by `event_id`.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no such media is staged
    /// - `SizeLimitExceeded` if the text is longer than the description ceiling
    /// - `CountLimitExceeded` if the user already has the maximum descriptions
    pub async fn put(
        &self,
        user: &UserId,
        event_id: &EventId,
        text: &str,
    ) -> CrosspostResult<PathBuf> {
        self.put_keyed(user, &ContentKey::for_event(event_id), text)
            .await
    }

    /// Describe the most recently staged media of `user`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the user has no staged media.
    #[tracing::instrument(skip(self, text), fields(user = %user, len = text.len()))]
    pub async fn put_for_latest(&self, user: &UserId, text: &str) -> CrosspostResult<PathBuf> {
        let latest = self.media.list(user, EntryType::Media).await?;
        let key = latest
            .first()
            .and_then(|path| ContentKey::from_path(path))
            .ok_or_else(|| {
                StagingError::new(StagingErrorKind::NotFound(format!(
                    "no staged media for {}",
                    user
                )))
            })?;
        self.put_keyed(user, &key, text).await
    }

    /// Describe the media stored under `key`.
    #[tracing::instrument(skip(self, text), fields(user = %user, key = %key, len = text.len()))]
    pub async fn put_keyed(
        &self,
        user: &UserId,
        key: &ContentKey,
        text: &str,
    ) -> CrosspostResult<PathBuf> {
        if !self.media.contains(user, EntryType::Media, key).await {
            return Err(StagingError::new(StagingErrorKind::NotFound(format!(
                "media {} to describe",
                key
            )))
            .into());
        }

        let ceiling = self.media.config().description_ceiling();
        let len = text.len() as u64;
        self.media
            .write_entry(user, EntryType::Text, key, text.as_bytes(), Some(len), &ceiling)
            .await
    }

    /// Description paired with a staged media path, if one was written.
    ///
    /// # Errors
    ///
    /// - `InvalidPath` if `media_path` is not a staged media file
    /// - `FileRead` if the description exists but cannot be read
    pub async fn read_for_media(&self, media_path: &Path) -> CrosspostResult<Option<String>> {
        let text_path = description_path(media_path)?;
        match tokio::fs::read(&text_path).await {
            Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StagingError::new(StagingErrorKind::FileRead(format!(
                "{}: {}",
                text_path.display(),
                e
            )))
            .into()),
        }
    }

    /// Descriptions of `user`, newest first.
    pub async fn list(&self, user: &UserId) -> CrosspostResult<Vec<PathBuf>> {
        self.media.list(user, EntryType::Text).await
    }

    /// Remove the description of the media staged by `event_id`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if there is no such description.
    pub async fn remove(&self, user: &UserId, event_id: &EventId) -> CrosspostResult<()> {
        let path = self
            .root()
            .entry_path(user, EntryType::Text, &ContentKey::for_event(event_id));
        tokio::fs::remove_file(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StagingError::new(StagingErrorKind::NotFound(event_id.to_string()))
            } else {
                StagingError::new(StagingErrorKind::FileWrite(format!(
                    "remove {}: {}",
                    path.display(),
                    e
                )))
            }
        })?;
        Ok(())
    }

    /// Remove every description of `user`. Media is left alone.
    pub async fn remove_all(&self, user: &UserId) -> CrosspostResult<()> {
        let dir = self.root().type_dir(user, EntryType::Text);
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StagingError::new(StagingErrorKind::FileWrite(format!(
                "remove {}: {}",
                dir.display(),
                e
            )))
            .into()),
        }
    }

    fn root(&self) -> &StagingRoot {
        self.media.root()
    }
}

/// `<user>/media/<key>` -> `<user>/text/<key>`
fn description_path(media_path: &Path) -> CrosspostResult<PathBuf> {
    let invalid = || {
        StagingError::new(StagingErrorKind::InvalidPath(
            media_path.display().to_string(),
        ))
    };

    let key = ContentKey::from_path(media_path).ok_or_else(invalid)?;
    let type_dir = media_path.parent().ok_or_else(invalid)?;
    if type_dir.file_name().and_then(|n| n.to_str()) != Some(EntryType::Media.dir_name()) {
        return Err(invalid().into());
    }
    let user_dir = type_dir.parent().ok_or_else(invalid)?;

    Ok(user_dir.join(EntryType::Text.dir_name()).join(key.as_str()))
}
