//! Link upload cache for crosspost.
//!
//! Posts mirrored from social networks carry links to external images. Each
//! link is fetched once, re-uploaded to the chat server's content repository
//! and the resulting content reference is remembered, so the same image is
//! never uploaded twice while it stays cached.
//!
//! # Features
//!
//! - **Single flight**: concurrent requests for one URL share a single fetch
//! - **Successes only**: failed resolutions are retried on the next request
//! - **Bounded**: LRU capacity, per-entry TTL and a bounded request queue
//!
//! # Example
//!
//! ```no_run
//! use crosspost_cache::{LinkCacheConfig, LinkUploadCache};
//! use crosspost_interface::{LinkFetcher, Uploader};
//! use std::sync::Arc;
//!
//! # async fn example(
//! #     fetcher: Arc<dyn LinkFetcher>,
//! #     uploader: Arc<dyn Uploader>,
//! # ) -> Result<(), Box<dyn std::error::Error>> {
//! let cache = LinkUploadCache::spawn(LinkCacheConfig::default(), fetcher, uploader);
//!
//! let upload = cache.resolve("https://files.example.org/cat.png").await?;
//! println!("Mirrored as {}", upload.content_uri());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod limited;
mod table;
mod worker;

pub use config::{LinkCacheConfig, LinkCacheConfigBuilder};
pub use table::{LinkTable, LinkUpload};
pub use worker::LinkUploadCache;
