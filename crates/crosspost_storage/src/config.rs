//! Staging store configuration.

use crate::SizeCeiling;
use crosspost_core::Network;
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Quotas for the staging store.
///
/// # Example
///
/// ```
/// use crosspost_core::Network;
/// use crosspost_storage::StagingConfig;
///
/// let config = StagingConfig::default()
///     .with_max_entries_per_user(2)
///     .with_network_limit(Network::Mastodon, 4 * 1024 * 1024);
///
/// let ceiling = config.effective_ceiling();
/// assert_eq!(*ceiling.bytes(), 4 * 1024 * 1024);
/// assert_eq!(ceiling.name(), "mastodon");
/// ```
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
pub struct StagingConfig {
    /// Maximum staged entries per user and entry type
    #[serde(default = "default_max_entries_per_user")]
    max_entries_per_user: usize,

    /// Global media size ceiling in bytes, applied regardless of networks
    #[serde(default = "default_max_media_bytes")]
    max_media_bytes: u64,

    /// Size ceiling of each enabled network, in bytes
    #[serde(default)]
    #[setters(skip)]
    network_limits: BTreeMap<Network, u64>,

    /// Maximum description length in bytes
    #[serde(default = "default_max_description_bytes")]
    max_description_bytes: u64,

    /// Age after which staged media counts as stale (seconds)
    #[serde(default = "default_media_max_age_secs")]
    media_max_age_secs: u64,
}

fn default_max_entries_per_user() -> usize {
    4
}

fn default_max_media_bytes() -> u64 {
    10 * 1024 * 1024
}

fn default_max_description_bytes() -> u64 {
    1500
}

fn default_media_max_age_secs() -> u64 {
    20 * 60
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            max_entries_per_user: default_max_entries_per_user(),
            max_media_bytes: default_max_media_bytes(),
            network_limits: BTreeMap::new(),
            max_description_bytes: default_max_description_bytes(),
            media_max_age_secs: default_media_max_age_secs(),
        }
    }
}

impl StagingConfig {
    /// Add (or replace) the ceiling of an enabled network.
    pub fn with_network_limit(mut self, network: Network, bytes: u64) -> Self {
        self.network_limits.insert(network, bytes);
        self
    }

    /// Age after which staged media counts as stale.
    pub fn media_max_age(&self) -> Duration {
        Duration::from_secs(self.media_max_age_secs)
    }

    /// The tightest media ceiling: the global one or the smallest network one.
    pub fn effective_ceiling(&self) -> SizeCeiling {
        self.network_limits
            .iter()
            .filter(|(_, bytes)| **bytes < self.max_media_bytes)
            .min_by_key(|(_, bytes)| **bytes)
            .map(|(network, bytes)| SizeCeiling::new(network.to_string(), *bytes))
            .unwrap_or_else(|| SizeCeiling::new("global", self.max_media_bytes))
    }

    /// Ceiling applied to descriptions.
    pub fn description_ceiling(&self) -> SizeCeiling {
        SizeCeiling::new("description", self.max_description_bytes)
    }
}
