//! Collaborator traits.

use crate::{ByteStream, Download, PostDraft};
use async_trait::async_trait;
use crosspost_core::{Network, RemoteId, UndoAction};
use crosspost_error::CrosspostResult;

/// Retrieves chat-server content references (e.g. `mxc://server/id`).
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Open the content behind `content_uri`.
    async fn download(&self, content_uri: &str) -> CrosspostResult<Download>;
}

/// Fetches external http(s) links.
#[async_trait]
pub trait LinkFetcher: Send + Sync {
    /// Open the body behind `url`.
    async fn fetch(&self, url: &str) -> CrosspostResult<Download>;
}

/// Uploads bytes to the chat server's content repository.
#[async_trait]
pub trait Uploader: Send + Sync {
    /// Upload `reader` and return the new content reference.
    async fn upload(
        &self,
        reader: ByteStream,
        mimetype: &str,
        length: Option<u64>,
    ) -> CrosspostResult<String>;
}

/// Performs actions on remote social networks.
///
/// Implementations return the identifiers the ledger needs to undo an action
/// later; errors should be `UpstreamError`s naming the network.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publish a status and return its remote identifier.
    async fn post(&self, network: Network, draft: &PostDraft) -> CrosspostResult<RemoteId>;

    /// Reblog (retweet) a status.
    async fn reblog(&self, network: Network, status: &RemoteId) -> CrosspostResult<()>;

    /// Favourite a status.
    async fn favourite(&self, network: Network, status: &RemoteId) -> CrosspostResult<()>;

    /// Delete one of our statuses.
    async fn delete(&self, network: Network, status: &RemoteId) -> CrosspostResult<()>;

    /// Remove a reblog.
    async fn unreblog(&self, network: Network, status: &RemoteId) -> CrosspostResult<()>;

    /// Remove a favourite.
    async fn unfavourite(&self, network: Network, status: &RemoteId) -> CrosspostResult<()>;

    /// Dispatch an [`UndoAction`] to the matching call.
    async fn undo(
        &self,
        network: Network,
        action: UndoAction,
        status: &RemoteId,
    ) -> CrosspostResult<()> {
        match action {
            UndoAction::Delete => self.delete(network, status).await,
            UndoAction::Unreblog => self.unreblog(network, status).await,
            UndoAction::Unfavorite => self.unfavourite(network, status).await,
        }
    }
}
