//! Size ceilings and the streaming limiter.

use crosspost_error::{CrosspostResult, StagingError, StagingErrorKind};
use derive_getters::Getters;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

const CHUNK_SIZE: usize = 8 * 1024;

/// A named byte ceiling.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct SizeCeiling {
    /// Where the ceiling comes from ("mastodon", "global", ...)
    name: String,
    /// Maximum accepted size in bytes
    bytes: u64,
}

impl SizeCeiling {
    /// Create a ceiling.
    pub fn new(name: impl Into<String>, bytes: u64) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Fail with `SizeLimitExceeded` if `actual` is above the ceiling.
    #[track_caller]
    pub fn check(&self, actual: u64) -> Result<(), StagingError> {
        if actual > self.bytes {
            return Err(self.exceeded(actual));
        }
        Ok(())
    }

    #[track_caller]
    fn exceeded(&self, actual: u64) -> StagingError {
        StagingError::new(StagingErrorKind::SizeLimitExceeded {
            ceiling: self.name.clone(),
            limit: self.bytes,
            actual,
        })
    }
}

/// Copy `reader` into `writer`, counting bytes.
///
/// Fails before writing the chunk that would cross the ceiling, so no
/// over-limit data ever reaches the writer.
pub(crate) async fn copy_limited<R, W>(
    reader: &mut R,
    writer: &mut W,
    ceiling: &SizeCeiling,
) -> CrosspostResult<u64>
where
    R: AsyncRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut total: u64 = 0;

    loop {
        let n = reader.read(&mut buf).await.map_err(|e| {
            StagingError::new(StagingErrorKind::FileRead(format!("source stream: {}", e)))
        })?;
        if n == 0 {
            break;
        }

        total += n as u64;
        if total > ceiling.bytes {
            tracing::debug!(
                ceiling = %ceiling.name,
                limit = ceiling.bytes,
                seen = total,
                "Aborting transfer at size ceiling"
            );
            return Err(ceiling.exceeded(total).into());
        }

        writer.write_all(&buf[..n]).await.map_err(|e| {
            StagingError::new(StagingErrorKind::FileWrite(format!("staging file: {}", e)))
        })?;
    }

    Ok(total)
}
