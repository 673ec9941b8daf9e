//! Newtype IDs for type-safe identifiers.
//!
//! Using newtypes prevents accidentally mixing up different ID types,
//! e.g., passing a ZoneId where a ProductId is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Macro to generate newtype ID structs.
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from a string.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Parse a user-supplied value, trimming whitespace.
            ///
            /// Blank input means "absent" and yields `None`.
            pub fn parse(raw: &str) -> Option<Self> {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(Self(trimmed.to_string()))
                }
            }

            /// Get the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Whether the ID is empty or whitespace only.
            pub fn is_blank(&self) -> bool {
                self.0.trim().is_empty()
            }

            /// Consume and return the inner string.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
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

define_id!(
    /// Opaque catalog identifier of a jam.
    ProductId
);
define_id!(
    /// Delivery zone identifier.
    ZoneId
);
define_id!(
    /// Discount code as typed by the shopper.
    DiscountCode
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_creation() {
        let id = ProductId::new("jam-fresa-250");
        assert_eq!(id.as_str(), "jam-fresa-250");
    }

    #[test]
    fn test_id_from_string() {
        let id: ProductId = "42".into();
        assert_eq!(id.as_str(), "42");
        assert_eq!(format!("{}", id), "42");
    }

    #[test]
    fn test_parse_blank_is_none() {
        assert_eq!(ZoneId::parse(""), None);
        assert_eq!(ZoneId::parse("   "), None);
        assert_eq!(DiscountCode::parse(" JAM10 "), Some(DiscountCode::new("JAM10")));
    }

    #[test]
    fn test_is_blank() {
        assert!(ProductId::new(" ").is_blank());
        assert!(!ProductId::new("p1").is_blank());
    }

    #[test]
    fn test_serde_transparent() {
        let id = ProductId::new("p1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"p1\"");
        let back: ProductId = serde_json::from_str("\"p1\"").unwrap();
        assert_eq!(back, id);
    }
}
