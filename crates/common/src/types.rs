use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Declares a string-backed identifier newtype.
///
/// Identifiers cross service boundaries as plain JSON strings, so they are
/// serialized transparently.
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates an identifier from any string-like value.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consumes the identifier, returning the inner string.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
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
    /// Unique identifier for an order, assigned when the order is created.
    OrderId
);

string_id!(
    /// Identifier of the customer who placed an order.
    CustomerId
);

string_id!(
    /// Stock keeping identifier of an inventory item (e.g. `ITEM-001`).
    ItemId
);

impl OrderId {
    /// Generates a fresh, globally unique order ID.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}
