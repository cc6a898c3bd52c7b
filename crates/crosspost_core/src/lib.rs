//! Core data types for the crosspost bridge.
//!
//! This crate provides the identities, action records and inbound event shapes
//! shared by every other crosspost crate, plus the per-user lock registry that
//! keeps publish sequences of one user from interleaving.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod action;
mod event;
mod ids;
mod locks;
mod network;
mod telemetry;

pub use action::{ActionKind, PostActionRecord, UndoAction};
pub use event::{EventPayload, InboundEvent};
pub use ids::{EventId, RemoteId, RoomId, UserId};
pub use locks::{UserGuard, UserLocks};
pub use network::Network;
pub use telemetry::init_tracing;
