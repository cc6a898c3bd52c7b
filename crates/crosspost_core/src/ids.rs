//! Identifier newtypes.
//!
//! Chat identities and remote identifiers are opaque strings. Wrapping them
//! keeps a user id from being passed where an event id is expected.

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            Serialize,
            Deserialize,
            derive_more::Display,
        )]
        #[display("{}", _0)]
        pub struct $name(String);

        impl $name {
            /// Borrow the raw identifier.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

string_id!(
    /// Chat user identity (e.g. `@alice:example.org`).
    UserId
);

string_id!(
    /// Chat event (message) identifier.
    EventId
);

string_id!(
    /// Chat room identifier.
    RoomId
);

string_id!(
    /// Identifier of a status, reblog or favourite on a remote network.
    RemoteId
);
