//! Ledger configuration.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Bounds on how much history the ledger keeps.
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
pub struct LedgerConfig {
    /// How long a record stays redactable (seconds)
    #[serde(default = "default_retention_secs")]
    retention_secs: u64,

    /// Maximum records kept; the oldest go first
    #[serde(default = "default_max_entries")]
    max_entries: usize,
}

fn default_retention_secs() -> u64 {
    7 * 24 * 3600 // 1 week
}

fn default_max_entries() -> usize {
    50_000
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            retention_secs: default_retention_secs(),
            max_entries: default_max_entries(),
        }
    }
}

impl LedgerConfig {
    /// How long a record stays redactable.
    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }
}
