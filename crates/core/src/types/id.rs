//! Newtype IDs for type-safe document references.
//!
//! Every document is keyed by an opaque string. Generated IDs look like
//! `store_1718000000000_k3j9x0a1b`: an entity prefix, the creation time in
//! unix milliseconds and nine random base36 characters. IDs coming from
//! outside (URLs, imported data) are accepted as-is.
//!
//! Use the `define_id!` macro to create wrappers that prevent accidentally
//! mixing IDs from different entity types.

use rand::Rng;

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const RANDOM_SUFFIX_LEN: usize = 9;

/// Generate a fresh `<prefix>_<millis>_<random>` identifier.
#[must_use]
pub fn generate_id(prefix: &str) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let mut rng = rand::rng();
    let suffix: String = (0..RANDOM_SUFFIX_LEN)
        .map(|_| {
            let idx = rng.random_range(0..BASE36.len());
            char::from(BASE36.get(idx).copied().unwrap_or(b'0'))
        })
        .collect();
    format!("{prefix}_{millis}_{suffix}")
}

/// Macro to define a type-safe string ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - `generate()` using the given prefix, `new()`, `as_str()`
/// - `Display`, `From<String>`, `From<&str>` and `AsRef<str>`
///
/// # Example
///
/// ```rust
/// # use bazaar_core::define_id;
/// define_id!(WidgetId, "widget");
///
/// let id = WidgetId::generate();
/// assert!(id.as_str().starts_with("widget_"));
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident, $prefix:literal) => {
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
            /// Prefix used for generated IDs of this type.
            pub const PREFIX: &'static str = $prefix;

            /// Generate a new unique ID.
            #[must_use]
            pub fn generate() -> Self {
                Self($crate::types::id::generate_id($prefix))
            }

            /// Wrap an existing ID value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID and return the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
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

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(StoreId, "store");
define_id!(ProductId, "product");
define_id!(VariantId, "variant");
define_id!(CategoryId, "category");
define_id!(CustomerId, "customer");
define_id!(OrderId, "order");
define_id!(ApplicationId, "app");
define_id!(UserId, "user");
define_id!(ZoneId, "zone");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_id_shape() {
        let id = StoreId::generate();
        let parts: Vec<&str> = id.as_str().split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts.first().copied(), Some("store"));
        assert!(parts.get(1).is_some_and(|p| p.parse::<i64>().is_ok()));
        assert!(parts.get(2).is_some_and(|p| p.len() == RANDOM_SUFFIX_LEN
            && p.bytes().all(|b| BASE36.contains(&b))));
    }

    #[test]
    fn test_generated_ids_differ() {
        assert_ne!(ProductId::generate(), ProductId::generate());
    }

    #[test]
    fn test_prefixes() {
        assert!(ApplicationId::generate().as_str().starts_with("app_"));
        assert!(OrderId::generate().as_str().starts_with("order_"));
        assert_eq!(CategoryId::PREFIX, "category");
    }

    #[test]
    fn test_serde_transparent() {
        let id = UserId::new("user_1_abc");
        let json = serde_json::to_string(&id).unwrap_or_default();
        assert_eq!(json, "\"user_1_abc\"");
    }
}
