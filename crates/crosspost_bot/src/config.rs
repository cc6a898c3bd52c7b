//! Bridge configuration loading.

use config::{Config, Environment, File, FileFormat};
use crosspost_cache::LinkCacheConfig;
use crosspost_core::Network;
use crosspost_error::{ConfigError, ConfigErrorKind, CrosspostError, CrosspostResult};
use crosspost_ledger::LedgerConfig;
use crosspost_storage::StagingConfig;
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, instrument};

/// Bundled default configuration.
const DEFAULT_CONFIG: &str = include_str!("../crosspost.toml");

/// Prefix of environment overrides (`CROSSPOST__SECTION__KEY`).
const ENV_PREFIX: &str = "CROSSPOST";

/// Limits of one social network.
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
pub struct NetworkLimits {
    /// Whether statuses are sent to this network
    #[serde(default)]
    #[builder(default)]
    enabled: bool,

    /// Largest media file the network accepts (bytes)
    max_media_bytes: u64,

    /// Longest status the network accepts (characters)
    max_chars: usize,
}

/// Complete bridge configuration.
///
/// # Example
///
/// ```
/// use crosspost_bot::BridgeConfig;
/// use crosspost_core::Network;
///
/// let config = BridgeConfig::from_toml_str("admins_can_redact = true").unwrap();
/// assert!(*config.admins_can_redact());
/// assert_eq!(config.enabled_networks(), vec![Network::Mastodon]);
/// ```
#[derive(
    Debug, Clone, PartialEq, Serialize, Deserialize, Getters, derive_setters::Setters,
)]
#[setters(prefix = "with_")]
pub struct BridgeConfig {
    /// Staging store quotas; network ceilings are filled in from `networks`
    #[serde(default)]
    staging: StagingConfig,

    /// Per-network limits, keyed by network name
    #[serde(default)]
    networks: BTreeMap<Network, NetworkLimits>,

    /// Link mirroring cache
    #[serde(default)]
    link_cache: LinkCacheConfig,

    /// Action ledger bounds
    #[serde(default)]
    ledger: LedgerConfig,

    /// Let anyone undo actions recorded for someone else
    #[serde(default)]
    admins_can_redact: bool,
}

impl BridgeConfig {
    /// Load configuration with precedence: environment > user file > bundled default.
    ///
    /// Sources in order (later sources override earlier):
    /// 1. Bundled defaults shipped with the crate
    /// 2. `./crosspost.toml` (optional)
    /// 3. `CROSSPOST__*` environment variables
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a source cannot be parsed.
    #[instrument]
    pub fn load() -> CrosspostResult<Self> {
        debug!("Loading configuration with precedence: env > ./crosspost.toml > bundled defaults");
        Self::build(
            Config::builder()
                .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
                .add_source(File::with_name("crosspost").required(false))
                .add_source(Self::environment()),
        )
    }

    /// Load the bundled defaults overlaid with a specific file and the environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file is missing or a source cannot be parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> CrosspostResult<Self> {
        debug!("Loading configuration from file");
        Self::build(
            Config::builder()
                .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
                .add_source(File::from(path.as_ref()))
                .add_source(Self::environment()),
        )
    }

    /// Bundled defaults overlaid with a TOML document. Ignores the environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the document cannot be parsed.
    pub fn from_toml_str(toml: &str) -> CrosspostResult<Self> {
        Self::build(
            Config::builder()
                .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
                .add_source(File::from_str(toml, FileFormat::Toml)),
        )
    }

    fn environment() -> Environment {
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true)
    }

    fn build(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> CrosspostResult<Self> {
        builder
            .build()
            .map_err(|e| {
                CrosspostError::from(ConfigError::new(ConfigErrorKind::Load(e.to_string())))
            })?
            .try_deserialize()
            .map_err(|e| {
                CrosspostError::from(ConfigError::new(ConfigErrorKind::Parse(e.to_string())))
            })
    }

    /// Networks statuses are sent to, in a stable order.
    pub fn enabled_networks(&self) -> Vec<Network> {
        self.networks
            .iter()
            .filter(|(_, limits)| limits.enabled)
            .map(|(network, _)| *network)
            .collect()
    }

    /// Staging quotas with the media ceiling of every enabled network applied.
    pub fn staging_config(&self) -> StagingConfig {
        self.networks
            .iter()
            .filter(|(_, limits)| limits.enabled)
            .fold(self.staging.clone(), |staging, (network, limits)| {
                staging.with_network_limit(*network, limits.max_media_bytes)
            })
    }

    /// Tightest character limit among enabled networks, with its network.
    pub fn char_limit(&self) -> Option<(Network, usize)> {
        self.networks
            .iter()
            .filter(|(_, limits)| limits.enabled)
            .map(|(network, limits)| (*network, limits.max_chars))
            .min_by_key(|(_, max_chars)| *max_chars)
    }

    /// Set (or replace) the limits of a network.
    pub fn with_network(mut self, network: Network, limits: NetworkLimits) -> Self {
        self.networks.insert(network, limits);
        self
    }
}
