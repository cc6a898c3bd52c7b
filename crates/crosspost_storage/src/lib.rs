//! Content-addressed staging store for crosspost.
//!
//! Media a chat user uploads is parked here until their next post picks it up.
//! Alt-text descriptions live in a parallel tree keyed the same way.
//!
//! # Layout
//!
//! ```text
//! <root>/<sha256(user)>/media/<sha256(event_id)>        final media
//! <root>/<sha256(user)>/media/<sha256(event_id)>.tmp    in-progress media
//! <root>/<sha256(user)>/text/<sha256(event_id)>         final description
//! <root>/<sha256(user)>/text/<sha256(event_id)>.tmp     in-progress description
//! ```
//!
//! # Features
//!
//! - **Content addressing**: user and event identities never reach the filesystem
//! - **Atomic writes**: readers only ever see files renamed from a finished `.tmp`
//! - **Quotas**: per-user entry count and per-network byte ceilings
//! - **Streaming limiter**: transfers abort the moment they cross the ceiling
//!
//! # Example
//!
//! ```rust
//! use crosspost_core::{EventId, UserId};
//! use crosspost_storage::{EntryType, MediaStagingStore, StagingConfig, StagingRoot};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let root = Arc::new(StagingRoot::create_in(std::env::temp_dir())?);
//! let store = MediaStagingStore::new(root, StagingConfig::default());
//!
//! let alice = UserId::from("@alice:example.org");
//! let path = store
//!     .put(&alice, &EventId::from("$img1"), &b"GIF89a"[..], Some(6))
//!     .await?;
//!
//! assert_eq!(store.list(&alice, EntryType::Media).await?, vec![path]);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod address;
mod config;
mod description;
mod fs;
mod limit;
mod media;
mod root;

pub use address::{ContentKey, EntryType};
pub use config::{StagingConfig, StagingConfigBuilder};
pub use description::DescriptionStore;
pub use limit::SizeCeiling;
pub use media::{MediaStagingStore, filter_by_age};
pub use root::StagingRoot;
