//! Post action ledger for crosspost.
//!
//! Remembers what each chat message caused on the social networks so that a
//! later redaction can be turned into the matching delete, unreblog or
//! unfavourite, and so replies can be checked against the original author.
//!
//! The ledger state is owned by a single [`ractor`] actor. Writes are
//! fire-and-forget casts; reads are RPC calls answered in mailbox order, so a
//! read issued after a write from the same task observes it.
//!
//! # Example
//!
//! ```rust
//! use crosspost_core::{ActionKind, EventId, Network, PostActionRecord, RemoteId, UserId};
//! use crosspost_ledger::{LedgerConfig, PostActionLedger};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let (ledger, _handle) = PostActionLedger::spawn(LedgerConfig::default()).await?;
//!
//! let alice = UserId::from("@alice:example.org");
//! let record = PostActionRecord::new(alice, ActionKind::Post)
//!     .with_remote(Network::Mastodon, RemoteId::from("109"));
//! ledger.store(EventId::from("$post"), record.clone())?;
//!
//! assert_eq!(ledger.retrieve(&EventId::from("$post")).await?, Some(record));
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod actor;
mod authorize;
mod config;
mod handle;

pub use actor::{LedgerActor, LedgerMessage, LedgerState};
pub use authorize::authorize;
pub use config::{LedgerConfig, LedgerConfigBuilder};
pub use handle::PostActionLedger;
