//! Filesystem helpers shared by the stores.

use crosspost_error::{CrosspostResult, StagingError, StagingErrorKind};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;

pub(crate) const TMP_SUFFIX: &str = ".tmp";

/// `<path>.tmp`
pub(crate) fn tmp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(TMP_SUFFIX);
    PathBuf::from(name)
}

pub(crate) fn is_tmp(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "tmp")
}

/// Create `dir` and its parents, owner-only where supported.
pub(crate) async fn ensure_dir(dir: &Path) -> CrosspostResult<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(0o700);

    builder.create(dir).await.map_err(|e| {
        StagingError::new(StagingErrorKind::DirectoryCreation(format!(
            "{}: {}",
            dir.display(),
            e
        )))
    })?;
    Ok(())
}

/// Create (truncating) an owner-only file for writing.
pub(crate) async fn create_private(path: &Path) -> CrosspostResult<File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);

    let file = options.open(path).await.map_err(|e| {
        StagingError::new(StagingErrorKind::FileWrite(format!(
            "{}: {}",
            path.display(),
            e
        )))
    })?;
    Ok(file)
}

/// Count entries of `dir`, reading at most `cap` of them.
///
/// A missing directory counts as empty. Temporary files count too, so an
/// upload in progress holds its slot.
pub(crate) async fn count_entries_bounded(dir: &Path, cap: usize) -> CrosspostResult<usize> {
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => {
            return Err(StagingError::new(StagingErrorKind::FileRead(format!(
                "{}: {}",
                dir.display(),
                e
            )))
            .into());
        }
    };

    let mut count = 0;
    while count < cap {
        match entries.next_entry().await {
            Ok(Some(_)) => count += 1,
            Ok(None) => break,
            Err(e) => {
                return Err(StagingError::new(StagingErrorKind::FileRead(format!(
                    "{}: {}",
                    dir.display(),
                    e
                )))
                .into());
            }
        }
    }
    Ok(count)
}

/// Flush and sync `file`, then rename `tmp` over `dest`.
pub(crate) async fn commit(mut file: File, tmp: &Path, dest: &Path) -> CrosspostResult<()> {
    let write_err = |e: std::io::Error| {
        StagingError::new(StagingErrorKind::FileWrite(format!("{}: {}", tmp.display(), e)))
    };

    file.flush().await.map_err(write_err)?;
    file.sync_all().await.map_err(write_err)?;
    drop(file);

    fs::rename(tmp, dest).await.map_err(|e| {
        StagingError::new(StagingErrorKind::FileWrite(format!(
            "rename {} -> {}: {}",
            tmp.display(),
            dest.display(),
            e
        )))
    })?;
    Ok(())
}

/// Remove a file, ignoring failures.
pub(crate) async fn remove_quietly(path: &Path) {
    match fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove staging file");
        }
    }
}
