//! Link cache configuration.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for [`LinkUploadCache`](crate::LinkUploadCache).
#[derive(
    Debug,
    Clone,
    PartialEq,
    Serialize,
    Deserialize,
    Getters,
    derive_setters::Setters,
    derive_builder::Builder,
)]
#[setters(prefix = "with_")]
#[builder(default)]
pub struct LinkCacheConfig {
    /// Maximum cached links
    #[serde(default = "default_capacity")]
    capacity: usize,

    /// Lifetime of a cached link (seconds)
    #[serde(default = "default_ttl_secs")]
    ttl_secs: u64,

    /// Pending requests the worker queue holds before callers wait
    #[serde(default = "default_queue_depth")]
    queue_depth: usize,

    /// Largest linked body that will be re-uploaded (bytes)
    #[serde(default = "default_max_bytes")]
    max_bytes: u64,
}

fn default_capacity() -> usize {
    70
}

fn default_ttl_secs() -> u64 {
    3600 // 1 hour
}

fn default_queue_depth() -> usize {
    42
}

fn default_max_bytes() -> u64 {
    10 * 1024 * 1024
}

impl Default for LinkCacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            ttl_secs: default_ttl_secs(),
            queue_depth: default_queue_depth(),
            max_bytes: default_max_bytes(),
        }
    }
}

impl LinkCacheConfig {
    /// Lifetime of a cached link.
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}
