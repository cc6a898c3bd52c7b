//! Trait definitions for the crosspost bridge.
//!
//! The bridge core never speaks a wire protocol itself. Chat and social
//! network clients plug in through the traits defined here.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod traits;
mod types;

pub use traits::{Downloader, LinkFetcher, Publisher, Uploader};
pub use types::{
    Attachment, ByteStream, Download, PostDraft, PostDraftBuilder, Visibility,
};
