//! Relay for the crosspost bridge.
//!
//! Turns inbound chat events into staged media, published statuses and undo
//! calls, using the staging store, the link cache and the action ledger. The
//! chat and social network clients plug in through the traits of
//! `crosspost_interface`.
//!
//! # Configuration
//!
//! [`BridgeConfig::load`] layers `./crosspost.toml` and `CROSSPOST__*`
//! environment variables over the bundled defaults:
//!
//! ```toml
//! admins_can_redact = false
//!
//! [staging]
//! max_entries_per_user = 4
//!
//! [networks.mastodon]
//! enabled = true
//! max_media_bytes = 4194304
//! max_chars = 500
//! ```
//!
//! # Example
//!
//! ```no_run
//! use crosspost_bot::{BridgeConfig, Collaborators, Relay};
//! use crosspost_core::{EventPayload, InboundEvent};
//! use crosspost_storage::StagingRoot;
//! use std::sync::Arc;
//!
//! # async fn example(collaborators: Collaborators) -> Result<(), Box<dyn std::error::Error>> {
//! crosspost_core::init_tracing().ok();
//!
//! let config = BridgeConfig::load()?;
//! let root = Arc::new(StagingRoot::create_in(std::env::temp_dir())?);
//! let relay = Relay::start(config, root, collaborators).await?;
//!
//! let event = InboundEvent::new(
//!     "@alice:example.org",
//!     "!room:example.org",
//!     "$event",
//!     EventPayload::Text { body: "Hello fediverse".into(), reply_to: None },
//! );
//! let outcome = relay.handle(&event).await?;
//! println!("{:?}", outcome);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod relay;
mod report;

pub use config::{BridgeConfig, NetworkLimits, NetworkLimitsBuilder};
pub use relay::{Collaborators, Relay};
pub use report::{PublishReport, RedactReport, RelayOutcome};
