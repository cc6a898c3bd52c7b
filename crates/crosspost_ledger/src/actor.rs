//! Ledger actor owning the record table.

use crate::LedgerConfig;
use async_trait::async_trait;
use crosspost_core::{EventId, PostActionRecord};
use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};
use std::collections::{HashMap, VecDeque};
use std::time::Instant;

/// Messages the ledger actor handles.
#[derive(Debug)]
pub enum LedgerMessage {
    /// Remember what `event_id` caused, replacing any earlier record.
    Store {
        /// Originating chat message
        event_id: EventId,
        /// What it caused remotely
        record: PostActionRecord,
    },
    /// Look up what `event_id` caused.
    Retrieve {
        /// Originating chat message
        event_id: EventId,
        /// Reply port for RPC response
        reply: RpcReplyPort<Option<PostActionRecord>>,
    },
    /// Number of records held.
    Len {
        /// Reply port for RPC response
        reply: RpcReplyPort<usize>,
    },
}

/// Ledger actor.
pub struct LedgerActor;

/// Record table with its insertion order.
pub struct LedgerState {
    config: LedgerConfig,
    records: HashMap<EventId, (Instant, PostActionRecord)>,
    order: VecDeque<EventId>,
}

impl LedgerState {
    fn new(config: LedgerConfig) -> Self {
        Self {
            config,
            records: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    fn store(&mut self, event_id: EventId, record: PostActionRecord) {
        if let Some((_, previous)) = self.records.get(&event_id) {
            tracing::warn!(
                event_id = %event_id,
                previous_owner = %previous.owner(),
                previous_action = %previous.action(),
                owner = %record.owner(),
                action = %record.action(),
                "Overwriting ledger record"
            );
            self.order.retain(|id| id != &event_id);
        }

        tracing::debug!(event_id = %event_id, action = %record.action(), "Recorded action");
        self.order.push_back(event_id.clone());
        self.records.insert(event_id, (Instant::now(), record));
        self.evict();
    }

    fn retrieve(&mut self, event_id: &EventId) -> Option<PostActionRecord> {
        self.expire();
        self.records.get(event_id).map(|(_, record)| record.clone())
    }

    /// Drop records past retention, then the oldest past capacity.
    fn evict(&mut self) {
        self.expire();
        while self.records.len() > *self.config.max_entries() {
            match self.order.pop_front() {
                Some(oldest) => {
                    tracing::debug!(event_id = %oldest, "Evicting oldest ledger record");
                    self.records.remove(&oldest);
                }
                None => break,
            }
        }
    }

    fn expire(&mut self) {
        let retention = self.config.retention();
        while let Some(oldest) = self.order.front() {
            let expired = self
                .records
                .get(oldest)
                .is_none_or(|(stored_at, _)| stored_at.elapsed() > retention);
            if !expired {
                break;
            }
            if let Some(oldest) = self.order.pop_front() {
                tracing::debug!(event_id = %oldest, "Ledger record expired");
                self.records.remove(&oldest);
            }
        }
    }
}

#[async_trait]
impl Actor for LedgerActor {
    type Msg = LedgerMessage;
    type State = LedgerState;
    type Arguments = LedgerConfig;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        config: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        tracing::info!(
            retention_secs = config.retention_secs(),
            max_entries = config.max_entries(),
            "LedgerActor started"
        );
        Ok(LedgerState::new(config))
    }

    async fn post_stop(
        &self,
        _myself: ActorRef<Self::Msg>,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        tracing::info!(records = state.records.len(), "LedgerActor stopped");
        Ok(())
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            LedgerMessage::Store { event_id, record } => state.store(event_id, record),
            LedgerMessage::Retrieve { event_id, reply } => {
                let _ = reply.send(state.retrieve(&event_id));
            }
            LedgerMessage::Len { reply } => {
                state.expire();
                let _ = reply.send(state.records.len());
            }
        }
        Ok(())
    }
}
