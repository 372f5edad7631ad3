//! Identity types for roomsync.
//!
//! All identities are opaque strings assigned by the remote service. An empty
//! string is never a valid identity.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create an identity, rejecting the empty string.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let value = value.into();
                if value.is_empty() {
                    None
                } else {
                    Some(Self(value))
                }
            }

            /// Borrow the identity as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the identity, returning the inner string.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Identity of a room (classroom).
    RoomUuid
);

string_id!(
    /// Identity of a user within a room.
    UserUuid
);

string_id!(
    /// Identity of a published media stream.
    StreamUuid
);
