//! Strongly-typed numeric identifiers.
//!
//! The race server hands out plain integers for cars, connections and car
//! models. Wrapping each in its own newtype keeps a connection id from ever
//! being used as a car id by accident.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Generates a newtype wrapper around a `u32` identifier with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub u32);

        impl $name {
            /// Wrap a raw identifier reported by the server.
            pub const fn new(raw: u32) -> Self {
                Self(raw)
            }

            /// Return the raw identifier.
            pub const fn into_inner(self) -> u32 {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u32> for $name {
            fn from(raw: u32) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for u32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Identifier of a car, unique for the lifetime of one server session.
    CarId
}

define_id! {
    /// Identifier of a live network connection to the server.
    ConnectionId
}

define_id! {
    /// Identifier of a car model in the reference catalog.
    CarModelId
}
