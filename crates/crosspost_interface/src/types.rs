//! Values exchanged with collaborators.

use crosspost_core::RemoteId;
use derive_getters::Getters;
use std::path::PathBuf;
use std::pin::Pin;
use tokio::io::AsyncRead;

/// Byte source handed between the core and network clients.
pub type ByteStream = Pin<Box<dyn AsyncRead + Send>>;

/// Result of retrieving a content reference or external link.
pub struct Download {
    /// Body of the response
    pub reader: ByteStream,
    /// Length announced by the remote side (e.g. Content-Length); may lie
    pub declared_length: Option<u64>,
    /// MIME type announced by the remote side
    pub mimetype: String,
}

impl Download {
    /// Wrap an in-memory body, declaring its true length.
    ///
    /// # Examples
    ///
    /// ```
    /// use crosspost_interface::Download;
    ///
    /// let download = Download::from_bytes(b"GIF89a".to_vec(), "image/gif");
    /// assert_eq!(download.declared_length, Some(6));
    /// ```
    pub fn from_bytes(bytes: Vec<u8>, mimetype: impl Into<String>) -> Self {
        let declared_length = Some(bytes.len() as u64);
        Self {
            reader: Box::pin(std::io::Cursor::new(bytes)),
            declared_length,
            mimetype: mimetype.into(),
        }
    }

    /// Replace the declared length.
    pub fn with_declared_length(mut self, declared_length: Option<u64>) -> Self {
        self.declared_length = declared_length;
        self
    }
}

impl std::fmt::Debug for Download {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Download")
            .field("declared_length", &self.declared_length)
            .field("mimetype", &self.mimetype)
            .finish_non_exhaustive()
    }
}

/// Who can see a published status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Visibility {
    /// Visible to everyone
    #[default]
    Public,
    /// Visible only to mentioned accounts
    Direct,
}

/// A staged media file attached to a post.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct Attachment {
    /// Final path of the staged media file
    path: PathBuf,
    /// Alt text, if the user provided one
    description: Option<String>,
}

impl Attachment {
    /// Create an attachment.
    pub fn new(path: PathBuf, description: Option<String>) -> Self {
        Self { path, description }
    }
}

/// Everything a publisher needs to create a status.
#[derive(Debug, Clone, PartialEq, Eq, Getters, derive_builder::Builder)]
#[builder(setter(into))]
pub struct PostDraft {
    /// Status text
    text: String,
    /// Staged media to upload with the status
    #[builder(default)]
    attachments: Vec<Attachment>,
    /// Remote status this one replies to
    #[builder(default)]
    reply_to: Option<RemoteId>,
    /// Audience
    #[builder(default)]
    visibility: Visibility,
}
