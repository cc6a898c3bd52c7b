//! Relay sequences run for inbound chat events.

use crate::{BridgeConfig, PublishReport, RedactReport, RelayOutcome};
use crosspost_cache::{LinkUpload, LinkUploadCache};
use crosspost_core::{
    ActionKind, EventId, EventPayload, InboundEvent, Network, PostActionRecord, RemoteId, UserId,
    UserLocks,
};
use crosspost_error::{
    ConfigError, ConfigErrorKind, CrosspostErrorKind, CrosspostResult, ReferenceError, StagingErrorKind,
    UpstreamError, ValidationError,
};
use crosspost_interface::{
    Attachment, Downloader, LinkFetcher, PostDraftBuilder, Publisher, Uploader, Visibility,
};
use crosspost_ledger::{PostActionLedger, authorize};
use crosspost_storage::{
    ContentKey, DescriptionStore, EntryType, MediaStagingStore, StagingRoot, filter_by_age,
};
use regex::Regex;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Scheme of chat-server content references.
const CONTENT_SCHEME: &str = "mxc://";

/// `@user` or `@user@instance`, standing alone.
const MENTION_PATTERN: &str = r"(?:^|\s)@\w+(?:@[a-zA-Z0-9.]+)?(?:\W|$)";

/// Network clients the relay drives.
#[derive(Clone)]
pub struct Collaborators {
    /// Retrieves chat-server content references
    pub downloader: Arc<dyn Downloader>,
    /// Fetches external links for mirroring
    pub fetcher: Arc<dyn LinkFetcher>,
    /// Uploads mirrored links to the chat server
    pub uploader: Arc<dyn Uploader>,
    /// Acts on the social networks
    pub publisher: Arc<dyn Publisher>,
}

/// Ties staged media, link mirroring and the action ledger to the publishers.
///
/// Every multi-step sequence holds the sender's lock from [`UserLocks`] for
/// its whole duration, so one user's sequences never interleave while
/// different users proceed in parallel. Sequences are not rolled back: a
/// failure half-way leaves whatever already happened remotely in place.
pub struct Relay {
    config: BridgeConfig,
    locks: UserLocks,
    media: MediaStagingStore,
    descriptions: DescriptionStore,
    links: LinkUploadCache,
    ledger: PostActionLedger,
    downloader: Arc<dyn Downloader>,
    publisher: Arc<dyn Publisher>,
    mention: Regex,
}

impl Relay {
    /// Start the ledger actor and link cache worker and build a relay.
    ///
    /// # Errors
    ///
    /// - `ConfigError` if the mention pattern does not compile
    /// - `LedgerError` if the ledger actor fails to start
    #[instrument(skip_all, fields(root = %root.path().display()))]
    pub async fn start(
        config: BridgeConfig,
        root: Arc<StagingRoot>,
        collaborators: Collaborators,
    ) -> CrosspostResult<Self> {
        let mention = Regex::new(MENTION_PATTERN)
            .map_err(|e| {
                ConfigError::new(ConfigErrorKind::Invalid(format!("mention pattern: {}", e)))
            })?;
        let (ledger, _handle) = PostActionLedger::spawn(config.ledger().clone()).await?;
        let links = LinkUploadCache::spawn(
            config.link_cache().clone(),
            collaborators.fetcher,
            collaborators.uploader,
        );
        let media = MediaStagingStore::new(root, config.staging_config());

        info!(
            networks = ?config.enabled_networks(),
            ceiling = %media.config().effective_ceiling().name(),
            "Relay started"
        );

        Ok(Self {
            descriptions: DescriptionStore::new(media.clone()),
            media,
            links,
            ledger,
            locks: UserLocks::new(),
            downloader: collaborators.downloader,
            publisher: collaborators.publisher,
            mention,
            config,
        })
    }

    /// Stop the ledger actor. Later ledger calls fail.
    pub fn shutdown(&self) {
        info!("Relay shutting down");
        self.ledger.stop();
    }

    /// Bridge configuration.
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Media staging store.
    pub fn media(&self) -> &MediaStagingStore {
        &self.media
    }

    /// Description store.
    pub fn descriptions(&self) -> &DescriptionStore {
        &self.descriptions
    }

    /// Action ledger.
    pub fn ledger(&self) -> &PostActionLedger {
        &self.ledger
    }

    /// Per-user lock registry.
    pub fn locks(&self) -> &UserLocks {
        &self.locks
    }

    /// Route one inbound event to its sequence.
    ///
    /// A text replying to media the sender still has staged becomes its
    /// description; any other text is published.
    #[instrument(skip(self, event), fields(sender = %event.sender(), event_id = %event.event_id()))]
    pub async fn handle(&self, event: &InboundEvent) -> CrosspostResult<RelayOutcome> {
        match event.payload() {
            EventPayload::Media { .. } => Ok(RelayOutcome::Staged(self.stage_media(event).await?)),
            EventPayload::Redaction { redacts } => {
                Ok(RelayOutcome::Redacted(self.redact(event, redacts).await?))
            }
            EventPayload::Text { body, reply_to } => {
                if let Some(reply_to) = reply_to
                    && self.describes_staged_media(event.sender(), reply_to).await?
                {
                    match self.describe(event, reply_to, body).await {
                        Ok(Some(path)) => return Ok(RelayOutcome::Described(path)),
                        Ok(None) => {}
                        // Purged between the check and the write.
                        Err(e) if is_not_found(e.kind()) => {
                            debug!(reply_to = %reply_to, "Described media is gone, publishing instead");
                        }
                        Err(e) => return Err(e),
                    }
                }
                Ok(RelayOutcome::Published(self.publish(event, body).await?))
            }
        }
    }

    /// Download the media of `event` into the sender's staging area.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` if the event carries no media
    /// - `InvalidReference` if the content reference is not `mxc://`
    /// - `SizeLimitExceeded` / `CountLimitExceeded` from the staging store
    /// - `UpstreamFailure` if the download fails
    #[instrument(skip(self, event), fields(sender = %event.sender(), event_id = %event.event_id()))]
    pub async fn stage_media(&self, event: &InboundEvent) -> CrosspostResult<PathBuf> {
        let EventPayload::Media {
            content_uri,
            declared_size,
        } = event.payload()
        else {
            return Err(ValidationError::new("Event carries no media").into());
        };

        if !content_uri.starts_with(CONTENT_SCHEME) || content_uri.len() == CONTENT_SCHEME.len() {
            return Err(ReferenceError::new(content_uri.as_str()).into());
        }

        let ceiling = self.media.config().effective_ceiling();
        if let Some(size) = declared_size {
            ceiling.check(*size)?;
        }

        let sender = event.sender();
        let _guard = self.locks.acquire(sender).await;

        let download = self.downloader.download(content_uri).await?;
        let declared = download.declared_length.or(*declared_size);
        let path = self
            .media
            .put(sender, event.event_id(), download.reader, declared)
            .await?;

        self.remember(
            event.event_id(),
            PostActionRecord::new(sender.clone(), ActionKind::MediaAttach),
        );
        Ok(path)
    }

    /// Publish `text` with the sender's staged media to every enabled network.
    ///
    /// Staged media is purged only when every network accepted the status.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` if no network is enabled or the text is too long
    /// - `UpstreamFailure` if every network refused the status
    #[instrument(skip(self, event, text), fields(sender = %event.sender(), event_id = %event.event_id(), len = text.len()))]
    pub async fn publish(&self, event: &InboundEvent, text: &str) -> CrosspostResult<PublishReport> {
        let networks = self.config.enabled_networks();
        if networks.is_empty() {
            return Err(ValidationError::new("No social network is enabled").into());
        }
        if let Some((network, max_chars)) = self.config.char_limit() {
            let chars = text.chars().count();
            if chars > max_chars {
                return Err(ValidationError::new(format!(
                    "Status too long for {}: {} > {} characters",
                    network, chars, max_chars
                ))
                .into());
            }
        }

        let sender = event.sender();
        let _guard = self.locks.acquire(sender).await;

        let attachments = self.collect_attachments(sender).await?;
        let replied = self.replied_post(event).await?;

        let mut report = PublishReport::new(attachments.len());
        for network in networks {
            let draft = PostDraftBuilder::default()
                .text(text)
                .attachments(attachments.clone())
                .reply_to(replied.as_ref().and_then(|r| r.remote_id(network).cloned()))
                .build()
                .map_err(|e| ValidationError::new(format!("Invalid status draft: {}", e)))?;

            match self.publisher.post(network, &draft).await {
                Ok(id) => {
                    info!(network = %network, remote_id = %id, "Published status");
                    report.record_success(network, id);
                }
                Err(e) => {
                    warn!(network = %network, error = %e, "Publishing failed");
                    report.record_failure(network, e.to_string());
                }
            }
        }

        if report.posted().is_empty() {
            let reasons = report
                .failed()
                .iter()
                .map(|(network, message)| format!("{}: {}", network, message))
                .collect::<Vec<_>>()
                .join("; ");
            return Err(UpstreamError::new("all networks", reasons).into());
        }

        let record = report
            .posted()
            .iter()
            .fold(PostActionRecord::new(sender.clone(), ActionKind::Post), |record, (network, id)| {
                record.with_remote(*network, id.clone())
            });
        self.remember(event.event_id(), record);

        if report.failed().is_empty() {
            self.media.remove_all(sender).await?;
            report.mark_purged();
        }
        Ok(report)
    }

    /// Send a Mastodon-only status with explicit audience and thread target.
    ///
    /// A `Direct` status must mention at least one `@account`. Staged media
    /// is attached and purged once the status is out.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` if Mastodon is disabled, the text is too long, or
    ///   a direct status mentions nobody
    /// - `UpstreamFailure` if Mastodon refused the status
    #[instrument(skip(self, event, text), fields(sender = %event.sender(), event_id = %event.event_id(), visibility = ?visibility))]
    pub async fn toot(
        &self,
        event: &InboundEvent,
        text: &str,
        visibility: Visibility,
        in_reply_to: Option<RemoteId>,
    ) -> CrosspostResult<RemoteId> {
        let network = Network::Mastodon;
        self.ensure_enabled(network)?;
        if let Some(limits) = self.config.networks().get(&network) {
            let chars = text.chars().count();
            if chars > *limits.max_chars() {
                return Err(ValidationError::new(format!(
                    "Status too long for {}: {} > {} characters",
                    network,
                    chars,
                    limits.max_chars()
                ))
                .into());
            }
        }
        if visibility == Visibility::Direct && !self.mention.is_match(text) {
            return Err(ValidationError::new("A direct status needs an @account to go to").into());
        }

        let sender = event.sender();
        let _guard = self.locks.acquire(sender).await;

        let draft = PostDraftBuilder::default()
            .text(text)
            .attachments(self.collect_attachments(sender).await?)
            .reply_to(in_reply_to)
            .visibility(visibility)
            .build()
            .map_err(|e| ValidationError::new(format!("Invalid status draft: {}", e)))?;

        let id = self.publisher.post(network, &draft).await?;
        info!(network = %network, remote_id = %id, "Published status");

        self.remember(
            event.event_id(),
            PostActionRecord::new(sender.clone(), ActionKind::Post).with_remote(network, id.clone()),
        );
        self.media.remove_all(sender).await?;
        Ok(id)
    }

    /// Attach `text` as description to the staged media `reply_to` delivered.
    ///
    /// Returns `None` when `reply_to` is not tracked staged media.
    ///
    /// # Errors
    ///
    /// - `Unauthorized` if the media belongs to another user
    /// - `NotFound` if the media is no longer staged
    #[instrument(skip(self, event, text), fields(sender = %event.sender(), reply_to = %reply_to))]
    pub async fn describe(
        &self,
        event: &InboundEvent,
        reply_to: &EventId,
        text: &str,
    ) -> CrosspostResult<Option<PathBuf>> {
        let Some(record) = self.ledger.retrieve(reply_to).await? else {
            return Ok(None);
        };
        if *record.action() != ActionKind::MediaAttach {
            return Ok(None);
        }

        let sender = event.sender();
        authorize(&record, sender, false)?;

        let _guard = self.locks.acquire(sender).await;
        let path = self.descriptions.put(sender, reply_to, text).await?;
        self.remember(
            event.event_id(),
            PostActionRecord::new(sender.clone(), ActionKind::MediaDescription),
        );
        Ok(Some(path))
    }

    /// Reblog a remote status and record it for later undo.
    #[instrument(skip(self, event), fields(sender = %event.sender()))]
    pub async fn reblog(
        &self,
        event: &InboundEvent,
        network: Network,
        status: &RemoteId,
    ) -> CrosspostResult<()> {
        self.ensure_enabled(network)?;
        let sender = event.sender();
        let _guard = self.locks.acquire(sender).await;

        self.publisher.reblog(network, status).await?;
        self.remember(
            event.event_id(),
            PostActionRecord::new(sender.clone(), ActionKind::Reblog)
                .with_remote(network, status.clone()),
        );
        Ok(())
    }

    /// Favourite a remote status and record it for later undo.
    #[instrument(skip(self, event), fields(sender = %event.sender()))]
    pub async fn favourite(
        &self,
        event: &InboundEvent,
        network: Network,
        status: &RemoteId,
    ) -> CrosspostResult<()> {
        self.ensure_enabled(network)?;
        let sender = event.sender();
        let _guard = self.locks.acquire(sender).await;

        self.publisher.favourite(network, status).await?;
        self.remember(
            event.event_id(),
            PostActionRecord::new(sender.clone(), ActionKind::Favorite)
                .with_remote(network, status.clone()),
        );
        Ok(())
    }

    /// Undo whatever the redacted message caused.
    ///
    /// Staged media of the redacted message is dropped first. Tracked remote
    /// actions are undone on every network they reached; per-network failures
    /// are reported, not raised.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` if the sender does not own the recorded action
    /// and admins may not redact; nothing is undone remotely then.
    #[instrument(skip(self, event), fields(sender = %event.sender(), redacts = %redacts))]
    pub async fn redact(&self, event: &InboundEvent, redacts: &EventId) -> CrosspostResult<RedactReport> {
        let sender = event.sender();
        let _guard = self.locks.acquire(sender).await;

        let mut media_removed = self.drop_staged(sender, redacts).await?;

        let Some(record) = self.ledger.retrieve(redacts).await? else {
            debug!("Redacted message was not tracked");
            return Ok(RedactReport::untracked(media_removed));
        };

        authorize(&record, sender, *self.config.admins_can_redact())?;

        if *record.action() == ActionKind::MediaAttach && !record.is_owned_by(sender) {
            media_removed |= self.drop_staged(record.owner(), redacts).await?;
        }

        let mut report = RedactReport::tracked(*record.action(), media_removed);
        if let Some(undo) = record.action().undo() {
            for (network, remote_id) in record.remote_ids() {
                match self.publisher.undo(*network, undo, remote_id).await {
                    Ok(()) => {
                        info!(network = %network, remote_id = %remote_id, undo = %undo, "Undid action");
                        report.record_undone(*network);
                    }
                    Err(e) => {
                        warn!(network = %network, remote_id = %remote_id, error = %e, "Undo failed");
                        report.record_failure(*network, e.to_string());
                    }
                }
            }
        }
        Ok(report)
    }

    /// Whether `user` has staged media older than the configured maximum age.
    ///
    /// Used to warn users about forgotten uploads before they post.
    pub async fn has_stale_media(&self, user: &UserId) -> CrosspostResult<bool> {
        let staged = self.media.list(user, EntryType::Media).await?;
        if staged.is_empty() {
            return Ok(false);
        }
        let (_, over) = filter_by_age(&staged, self.media.config().media_max_age()).await?;
        Ok(!over.is_empty())
    }

    /// Mirror an external image link onto the chat server.
    pub async fn mirror_link(&self, url: &str) -> CrosspostResult<LinkUpload> {
        self.links.resolve(url).await
    }

    /// Drop per-user locks nobody holds. Returns how many were dropped.
    pub fn reclaim_idle_locks(&self) -> usize {
        self.locks.reclaim_idle()
    }

    /// Staged media of `user`, oldest first, with descriptions.
    async fn collect_attachments(&self, user: &UserId) -> CrosspostResult<Vec<Attachment>> {
        let mut staged = self.media.list(user, EntryType::Media).await?;
        staged.reverse();

        let mut attachments = Vec::with_capacity(staged.len());
        for path in staged {
            let description = self.descriptions.read_for_media(&path).await?;
            attachments.push(Attachment::new(path, description));
        }
        Ok(attachments)
    }

    /// Tracked post the event's text replies to, if any.
    async fn replied_post(&self, event: &InboundEvent) -> CrosspostResult<Option<PostActionRecord>> {
        let EventPayload::Text {
            reply_to: Some(reply_to),
            ..
        } = event.payload()
        else {
            return Ok(None);
        };
        Ok(self
            .ledger
            .retrieve(reply_to)
            .await?
            .filter(|record| *record.action() == ActionKind::Post))
    }

    /// Whether `reply_to` staged media of `user` that is still waiting for a post.
    async fn describes_staged_media(&self, user: &UserId, reply_to: &EventId) -> CrosspostResult<bool> {
        let Some(record) = self.ledger.retrieve(reply_to).await? else {
            return Ok(false);
        };
        if *record.action() != ActionKind::MediaAttach {
            return Ok(false);
        }
        if !record.is_owned_by(user) {
            info!(owner = %record.owner(), "Reply to someone else's media is not a description");
            return Ok(false);
        }
        let staged = self
            .media
            .contains(user, EntryType::Media, &ContentKey::for_event(reply_to))
            .await;
        if !staged {
            debug!("Replied-to media was already posted");
        }
        Ok(staged)
    }

    /// Remove staged media, reporting whether there was any.
    async fn drop_staged(&self, user: &UserId, event_id: &EventId) -> CrosspostResult<bool> {
        match self.media.remove(user, event_id).await {
            Ok(()) => Ok(true),
            Err(e) if is_not_found(e.kind()) => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn ensure_enabled(&self, network: Network) -> CrosspostResult<()> {
        if self.config.enabled_networks().contains(&network) {
            Ok(())
        } else {
            Err(ValidationError::new(format!("{} is not enabled", network)).into())
        }
    }

    /// Store a ledger record; the ledger is best effort.
    fn remember(&self, event_id: &EventId, record: PostActionRecord) {
        if let Err(e) = self.ledger.store(event_id.clone(), record) {
            warn!(event_id = %event_id, error = %e, "Failed to record action");
        }
    }
}

fn is_not_found(kind: &CrosspostErrorKind) -> bool {
    matches!(
        kind,
        CrosspostErrorKind::Staging(e) if matches!(e.kind(), StagingErrorKind::NotFound(_))
    )
}
