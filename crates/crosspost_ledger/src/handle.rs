//! Client handle for the ledger actor.

use crate::{LedgerActor, LedgerConfig, LedgerMessage};
use crosspost_core::{EventId, PostActionRecord};
use crosspost_error::{CrosspostResult, LedgerError};
use ractor::rpc::CallResult;
use ractor::{Actor, ActorRef, MessagingErr};
use tokio::task::JoinHandle;

/// Map ractor's call outcome onto a ledger error.
fn unwrap_call_result<T>(
    result: Result<CallResult<T>, MessagingErr<LedgerMessage>>,
) -> CrosspostResult<T> {
    match result {
        Ok(CallResult::Success(value)) => Ok(value),
        Ok(CallResult::Timeout) => Err(LedgerError::new("Ledger actor call timed out").into()),
        Ok(CallResult::SenderError) => {
            Err(LedgerError::new("Ledger actor dropped the reply").into())
        }
        Err(e) => Err(LedgerError::new(format!(
            "Failed to send message to ledger actor: {}",
            e
        ))
        .into()),
    }
}

/// Handle to a running ledger actor. Cheap to clone.
#[derive(Debug, Clone)]
pub struct PostActionLedger {
    actor: ActorRef<LedgerMessage>,
}

impl PostActionLedger {
    /// Spawn the ledger actor.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError` if the actor fails to start.
    pub async fn spawn(config: LedgerConfig) -> CrosspostResult<(Self, JoinHandle<()>)> {
        let (actor, handle) = Actor::spawn(None, LedgerActor, config)
            .await
            .map_err(|e| LedgerError::new(format!("Failed to spawn ledger actor: {}", e)))?;
        Ok((Self { actor }, handle))
    }

    /// Wrap an already running actor.
    pub fn from_actor(actor: ActorRef<LedgerMessage>) -> Self {
        Self { actor }
    }

    /// Record what `event_id` caused. Does not wait for the actor.
    ///
    /// A second store under the same id replaces the first.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError` if the actor has stopped.
    #[tracing::instrument(skip(self, record), fields(event_id = %event_id, action = %record.action()))]
    pub fn store(&self, event_id: EventId, record: PostActionRecord) -> CrosspostResult<()> {
        self.actor
            .cast(LedgerMessage::Store { event_id, record })
            .map_err(|e| LedgerError::new(format!("Failed to send message to ledger actor: {}", e)))?;
        Ok(())
    }

    /// What `event_id` caused, if it is still on record.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError` if the actor has stopped.
    #[tracing::instrument(skip(self), fields(event_id = %event_id))]
    pub async fn retrieve(&self, event_id: &EventId) -> CrosspostResult<Option<PostActionRecord>> {
        let event_id = event_id.clone();
        unwrap_call_result(
            self.actor
                .call(|reply| LedgerMessage::Retrieve { event_id, reply }, None)
                .await,
        )
    }

    /// Number of records currently held.
    pub async fn len(&self) -> CrosspostResult<usize> {
        unwrap_call_result(self.actor.call(|reply| LedgerMessage::Len { reply }, None).await)
    }

    /// Whether the ledger holds no records.
    pub async fn is_empty(&self) -> CrosspostResult<bool> {
        Ok(self.len().await? == 0)
    }

    /// Stop the actor. Pending messages are dropped.
    pub fn stop(&self) {
        self.actor.stop(None);
    }
}
