//! Opaque string identifiers issued by outside systems.
//!
//! Dishes are keyed by whatever the content backend calls them, and checkout
//! sessions by the id Stripe hands back. Neither is parsed or generated here,
//! so each id is a distinct newtype over `String` and nothing more.

/// Declare a string-backed identifier type.
///
/// The generated type is `serde(transparent)`, orders and hashes like its
/// string, and converts from `String` and `&str`. Doc attributes written
/// before the name are carried onto the type.
///
/// ```rust
/// # use kebab_core::string_id;
/// string_id!(
///     /// A table in the dining room.
///     TableId
/// );
///
/// let table = TableId::new("terrace-4");
/// assert_eq!(table.as_str(), "terrace-4");
/// assert_eq!(table, *"terrace-4");
/// ```
#[macro_export]
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }
    };
}

string_id!(
    /// A dish as the content backend identifies it.
    ProductId
);

string_id!(
    /// A Stripe Checkout Session (`cs_...`).
    CheckoutSessionId
);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_id_serializes_transparently() {
        let id = ProductId::new("burger-1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"burger-1\"");

        let parsed: ProductId = serde_json::from_str("\"burger-1\"").unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_product_id_compares_with_str() {
        let id = ProductId::from("kebab-xl");
        assert!(id == *"kebab-xl");
        assert_eq!(id.to_string(), "kebab-xl");
    }

    #[test]
    fn test_session_id_from_owned_string() {
        let id = CheckoutSessionId::from(String::from("cs_test_123"));
        assert_eq!(id.as_str(), "cs_test_123");
    }
}
