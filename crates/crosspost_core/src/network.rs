//! Remote social networks.

use serde::{Deserialize, Serialize};

/// A social network the bridge can publish to.
///
/// # Examples
///
/// ```
/// use crosspost_core::Network;
/// use std::str::FromStr;
///
/// assert_eq!(Network::Mastodon.to_string(), "mastodon");
/// assert_eq!(Network::from_str("twitter").unwrap(), Network::Twitter);
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Network {
    /// Mastodon (or any Mastodon-API compatible server)
    Mastodon,
    /// Twitter
    Twitter,
}
