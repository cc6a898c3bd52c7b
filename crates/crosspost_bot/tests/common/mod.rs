//! Mock collaborators shared by relay tests.

#![allow(dead_code)]

use async_trait::async_trait;
use crosspost_bot::{BridgeConfig, Collaborators, Relay};
use crosspost_core::{EventPayload, InboundEvent, Network, RemoteId};
use crosspost_error::{CrosspostResult, UpstreamError};
use crosspost_interface::{ByteStream, Download, Downloader, LinkFetcher, PostDraft, Publisher, Uploader};
use crosspost_storage::StagingRoot;
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::AsyncReadExt;

/// Serves `body_len` zero bytes for any content reference.
pub struct MockDownloader {
    pub body_len: usize,
    pub calls: AtomicUsize,
}

#[async_trait]
impl Downloader for MockDownloader {
    async fn download(&self, _content_uri: &str) -> CrosspostResult<Download> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Download::from_bytes(vec![0u8; self.body_len], "image/jpeg"))
    }
}

pub struct MockFetcher;

#[async_trait]
impl LinkFetcher for MockFetcher {
    async fn fetch(&self, _url: &str) -> CrosspostResult<Download> {
        Ok(Download::from_bytes(b"png".to_vec(), "image/png"))
    }
}

pub struct MockUploader;

#[async_trait]
impl Uploader for MockUploader {
    async fn upload(
        &self,
        mut reader: ByteStream,
        _mimetype: &str,
        _length: Option<u64>,
    ) -> CrosspostResult<String> {
        let mut body = Vec::new();
        reader
            .read_to_end(&mut body)
            .await
            .map_err(|e| UpstreamError::new("content repository", e.to_string()))?;
        Ok("mxc://hs/mirrored".to_string())
    }
}

/// One call the relay made on a network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Post {
        network: Network,
        text: String,
        attachments: Vec<(u64, Option<String>)>,
        reply_to: Option<RemoteId>,
    },
    Reblog(Network, RemoteId),
    Favourite(Network, RemoteId),
    Delete(Network, RemoteId),
    Unreblog(Network, RemoteId),
    Unfavourite(Network, RemoteId),
}

/// Records every call; posts on networks in `failing` fail.
#[derive(Default)]
pub struct MockPublisher {
    pub calls: Mutex<Vec<Call>>,
    /// Every draft handed to `post`, accepted or not
    pub drafts: Mutex<Vec<PostDraft>>,
    pub failing: Mutex<BTreeSet<Network>>,
    /// Start/end markers of posts, for ordering checks
    pub timeline: Mutex<Vec<String>>,
    pub delay: Duration,
    pub next_id: AtomicUsize,
}

impl MockPublisher {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn drafts(&self) -> Vec<PostDraft> {
        self.drafts.lock().clone()
    }

    pub fn fail_on(&self, network: Network) {
        self.failing.lock().insert(network);
    }

    fn check(&self, network: Network) -> CrosspostResult<()> {
        if self.failing.lock().contains(&network) {
            return Err(UpstreamError::new(network.to_string(), "503 Service Unavailable").into());
        }
        Ok(())
    }
}

#[async_trait]
impl Publisher for MockPublisher {
    async fn post(&self, network: Network, draft: &PostDraft) -> CrosspostResult<RemoteId> {
        self.drafts.lock().push(draft.clone());
        self.timeline.lock().push(format!("start {}", draft.text()));
        tokio::time::sleep(self.delay).await;
        self.timeline.lock().push(format!("end {}", draft.text()));

        self.check(network)?;
        let attachments = draft
            .attachments()
            .iter()
            .map(|a| {
                let size = std::fs::metadata(a.path()).map(|m| m.len()).unwrap_or(0);
                (size, a.description().clone())
            })
            .collect();
        self.calls.lock().push(Call::Post {
            network,
            text: draft.text().clone(),
            attachments,
            reply_to: draft.reply_to().clone(),
        });
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        Ok(RemoteId::from(format!("{}-{}", network, n)))
    }

    async fn reblog(&self, network: Network, status: &RemoteId) -> CrosspostResult<()> {
        self.check(network)?;
        self.calls.lock().push(Call::Reblog(network, status.clone()));
        Ok(())
    }

    async fn favourite(&self, network: Network, status: &RemoteId) -> CrosspostResult<()> {
        self.check(network)?;
        self.calls.lock().push(Call::Favourite(network, status.clone()));
        Ok(())
    }

    async fn delete(&self, network: Network, status: &RemoteId) -> CrosspostResult<()> {
        self.calls.lock().push(Call::Delete(network, status.clone()));
        Ok(())
    }

    async fn unreblog(&self, network: Network, status: &RemoteId) -> CrosspostResult<()> {
        self.calls.lock().push(Call::Unreblog(network, status.clone()));
        Ok(())
    }

    async fn unfavourite(&self, network: Network, status: &RemoteId) -> CrosspostResult<()> {
        self.calls.lock().push(Call::Unfavourite(network, status.clone()));
        Ok(())
    }
}

pub struct Harness {
    pub relay: Arc<Relay>,
    pub publisher: Arc<MockPublisher>,
    pub downloader: Arc<MockDownloader>,
    pub temp_dir: TempDir,
}

pub async fn harness(config: BridgeConfig, body_len: usize) -> Harness {
    harness_with(config, body_len, MockPublisher::default()).await
}

pub async fn harness_with(
    config: BridgeConfig,
    body_len: usize,
    publisher: MockPublisher,
) -> Harness {
    let temp_dir = TempDir::new().unwrap();
    let root = Arc::new(StagingRoot::at(temp_dir.path().join("staging")).unwrap());
    let publisher = Arc::new(publisher);
    let downloader = Arc::new(MockDownloader {
        body_len,
        calls: AtomicUsize::new(0),
    });

    let collaborators = Collaborators {
        downloader: downloader.clone(),
        fetcher: Arc::new(MockFetcher),
        uploader: Arc::new(MockUploader),
        publisher: publisher.clone(),
    };
    let relay = Relay::start(config, root, collaborators).await.unwrap();

    Harness {
        relay: Arc::new(relay),
        publisher,
        downloader,
        temp_dir,
    }
}

pub fn media_event(sender: &str, event_id: &str, size: Option<u64>) -> InboundEvent {
    InboundEvent::new(
        sender,
        "!room:example.org",
        event_id,
        EventPayload::Media {
            content_uri: format!("mxc://example.org/{}", event_id.trim_start_matches('$')),
            declared_size: size,
        },
    )
}

pub fn text_event(sender: &str, event_id: &str, body: &str, reply_to: Option<&str>) -> InboundEvent {
    InboundEvent::new(
        sender,
        "!room:example.org",
        event_id,
        EventPayload::Text {
            body: body.to_string(),
            reply_to: reply_to.map(Into::into),
        },
    )
}

pub fn redaction_event(sender: &str, event_id: &str, redacts: &str) -> InboundEvent {
    InboundEvent::new(
        sender,
        "!room:example.org",
        event_id,
        EventPayload::Redaction {
            redacts: redacts.into(),
        },
    )
}

pub fn staged_files(dir: &std::path::Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                files.extend(staged_files(&path));
            } else {
                files.push(path);
            }
        }
    }
    files
}
