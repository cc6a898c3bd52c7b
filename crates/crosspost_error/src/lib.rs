//! Error types for the crosspost bridge.
//!
//! This crate provides the foundation error types used throughout the crosspost workspace.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All constructors use `#[track_caller]` for automatic location capture
//!
//! Every error is meant to be surfaced to the chat user as a short notice;
//! none of them is fatal to the process.
//!
//! # Examples
//!
//! ```
//! use crosspost_error::{CrosspostResult, UpstreamError};
//!
//! fn post_status() -> CrosspostResult<String> {
//!     Err(UpstreamError::new("mastodon", "503 Service Unavailable"))?
//! }
//!
//! match post_status() {
//!     Ok(id) => println!("Posted: {}", id),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod authorization;
mod config;
mod error;
mod ledger;
mod link_cache;
mod reference;
mod staging;
mod upstream;
mod validation;

pub use authorization::AuthorizationError;
pub use config::{ConfigError, ConfigErrorKind};
pub use error::{CrosspostError, CrosspostErrorKind, CrosspostResult};
pub use ledger::LedgerError;
pub use link_cache::{LinkCacheError, LinkCacheErrorKind};
pub use reference::ReferenceError;
pub use staging::{StagingError, StagingErrorKind};
pub use upstream::UpstreamError;
pub use validation::ValidationError;
