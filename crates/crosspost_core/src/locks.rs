//! Per-user lock registry.
//!
//! Any multi-step publish sequence (validate, read staged media, post, record
//! in the ledger, purge staged media) must hold the sender's lock for its whole
//! duration so two sequences of the same user never interleave. Sequences of
//! different users never contend.

use crate::UserId;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, instrument};

type LockMap = HashMap<UserId, Arc<AsyncMutex<()>>>;

/// Keyed registry of exclusive per-user locks.
///
/// Locks are created lazily on first use and kept until
/// [`reclaim_idle`](Self::reclaim_idle) drops the ones nobody holds or awaits.
/// Cloning yields a handle to the same registry.
///
/// # Example
///
/// ```
/// use crosspost_core::{UserId, UserLocks};
///
/// # async fn example() {
/// let locks = UserLocks::new();
/// let alice = UserId::from("@alice:example.org");
///
/// let guard = locks.acquire(&alice).await;
/// assert!(locks.try_acquire(&alice).is_none());
/// drop(guard);
/// assert!(locks.try_acquire(&alice).is_some());
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct UserLocks {
    inner: Arc<Mutex<LockMap>>,
}

/// Held lock for one user; released on drop.
#[derive(Debug)]
pub struct UserGuard {
    user: UserId,
    _guard: OwnedMutexGuard<()>,
}

impl UserGuard {
    /// User this guard serializes.
    pub fn user(&self) -> &UserId {
        &self.user
    }
}

impl UserLocks {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock for `user`, created on first use.
    fn lock_for(&self, user: &UserId) -> Arc<AsyncMutex<()>> {
        let mut map = self.inner.lock();
        map.entry(user.clone())
            .or_insert_with(|| {
                debug!(user = %user, "Creating per-user lock");
                Arc::new(AsyncMutex::new(()))
            })
            .clone()
    }

    /// Wait until `user`'s lock is free and take it.
    #[instrument(skip(self), fields(user = %user))]
    pub async fn acquire(&self, user: &UserId) -> UserGuard {
        let lock = self.lock_for(user);
        let guard = lock.lock_owned().await;
        debug!("Acquired per-user lock");
        UserGuard {
            user: user.clone(),
            _guard: guard,
        }
    }

    /// Take `user`'s lock only if nobody holds it.
    pub fn try_acquire(&self, user: &UserId) -> Option<UserGuard> {
        let lock = self.lock_for(user);
        lock.try_lock_owned().ok().map(|guard| UserGuard {
            user: user.clone(),
            _guard: guard,
        })
    }

    /// Drop every lock that is neither held nor awaited.
    ///
    /// Returns the number of locks removed. A lock is idle when the registry
    /// holds the only reference to it; holders and waiters each keep a clone.
    pub fn reclaim_idle(&self) -> usize {
        let mut map = self.inner.lock();
        let before = map.len();
        map.retain(|_, lock| Arc::strong_count(lock) > 1);
        let removed = before - map.len();
        if removed > 0 {
            debug!(removed, remaining = map.len(), "Reclaimed idle per-user locks");
        }
        removed
    }

    /// Number of users with a registered lock.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Whether no lock has been registered.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}
