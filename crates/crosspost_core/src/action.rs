//! Ledger records describing what a chat message caused remotely.

use crate::{Network, RemoteId, UserId};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What a chat message did on the remote side.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
)]
pub enum ActionKind {
    /// Published a status
    Post,
    /// Reblogged / retweeted a status
    Reblog,
    /// Favourited a status
    Favorite,
    /// Staged a media file for the next post
    MediaAttach,
    /// Attached a description to staged media
    MediaDescription,
}

impl ActionKind {
    /// The remote call that reverses this action, if there is one.
    ///
    /// Media actions are local only; they are undone by removing staged files.
    pub fn undo(&self) -> Option<UndoAction> {
        match self {
            ActionKind::Post => Some(UndoAction::Delete),
            ActionKind::Reblog => Some(UndoAction::Unreblog),
            ActionKind::Favorite => Some(UndoAction::Unfavorite),
            ActionKind::MediaAttach | ActionKind::MediaDescription => None,
        }
    }
}

/// Remote call issued to retract an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum UndoAction {
    /// Delete a published status
    Delete,
    /// Remove a reblog
    Unreblog,
    /// Remove a favourite
    Unfavorite,
}

/// Ledger value: who did what, and where.
///
/// # Examples
///
/// ```
/// use crosspost_core::{ActionKind, Network, PostActionRecord, RemoteId, UserId};
///
/// let record = PostActionRecord::new(UserId::from("@alice:example.org"), ActionKind::Post)
///     .with_remote(Network::Mastodon, RemoteId::from("109"));
/// assert!(record.is_owned_by(&UserId::from("@alice:example.org")));
/// assert_eq!(record.remote_id(Network::Mastodon).map(|r| r.as_str()), Some("109"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct PostActionRecord {
    /// Chat user who caused the action
    owner: UserId,
    /// Remote identifier per network the action reached
    remote_ids: BTreeMap<Network, RemoteId>,
    /// Kind of action
    action: ActionKind,
}

impl PostActionRecord {
    /// Create a record with no remote identifiers yet.
    pub fn new(owner: UserId, action: ActionKind) -> Self {
        Self {
            owner,
            remote_ids: BTreeMap::new(),
            action,
        }
    }

    /// Add the remote identifier produced on `network`.
    pub fn with_remote(mut self, network: Network, id: RemoteId) -> Self {
        self.remote_ids.insert(network, id);
        self
    }

    /// Remote identifier on `network`, if the action reached it.
    pub fn remote_id(&self, network: Network) -> Option<&RemoteId> {
        self.remote_ids.get(&network)
    }

    /// Whether `user` is the recorded owner.
    pub fn is_owned_by(&self, user: &UserId) -> bool {
        &self.owner == user
    }
}
