//! Outcomes of relay sequences.

use crosspost_core::{ActionKind, Network, RemoteId};
use derive_getters::Getters;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// What a publish reached.
#[derive(Debug, Clone, PartialEq, Eq, Default, Getters)]
pub struct PublishReport {
    /// Remote status per network that accepted it
    posted: BTreeMap<Network, RemoteId>,
    /// Error message per network that refused it
    failed: BTreeMap<Network, String>,
    /// Staged media files attached
    attachments: usize,
    /// Whether the sender's staged media was purged
    purged: bool,
}

impl PublishReport {
    pub(crate) fn new(attachments: usize) -> Self {
        Self {
            attachments,
            ..Self::default()
        }
    }

    pub(crate) fn record_success(&mut self, network: Network, id: RemoteId) {
        self.posted.insert(network, id);
    }

    pub(crate) fn record_failure(&mut self, network: Network, message: String) {
        self.failed.insert(network, message);
    }

    pub(crate) fn mark_purged(&mut self) {
        self.purged = true;
    }

    /// Whether every network accepted the status.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && !self.posted.is_empty()
    }
}

/// What a redaction undid.
#[derive(Debug, Clone, PartialEq, Eq, Default, Getters)]
pub struct RedactReport {
    /// Recorded action of the redacted message, if it was tracked
    action: Option<ActionKind>,
    /// Whether staged media of the redacted message was removed
    media_removed: bool,
    /// Networks where the action was undone
    undone: Vec<Network>,
    /// Error message per network where undoing failed
    failed: BTreeMap<Network, String>,
}

impl RedactReport {
    pub(crate) fn untracked(media_removed: bool) -> Self {
        Self {
            media_removed,
            ..Self::default()
        }
    }

    pub(crate) fn tracked(action: ActionKind, media_removed: bool) -> Self {
        Self {
            action: Some(action),
            media_removed,
            ..Self::default()
        }
    }

    pub(crate) fn record_undone(&mut self, network: Network) {
        self.undone.push(network);
    }

    pub(crate) fn record_failure(&mut self, network: Network, message: String) {
        self.failed.insert(network, message);
    }
}

/// Result of routing one inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    /// Media was staged at this path
    Staged(PathBuf),
    /// A description was attached to staged media
    Described(PathBuf),
    /// Text was published
    Published(PublishReport),
    /// A redaction was processed
    Redacted(RedactReport),
}
