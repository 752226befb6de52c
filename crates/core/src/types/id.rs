//! Newtype IDs for type-safe entity references.
//!
//! Use the `define_id!` macro to create string-backed ID wrappers that prevent
//! accidentally mixing IDs from different entity types.

use chrono::{DateTime, Utc};
use rand::Rng;
use rand::distr::Alphanumeric;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Macro to define a type-safe, string-backed ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `Ord`
/// - Conversion methods: `new()`, `as_str()`, `is_empty()`
/// - `Display`, `AsRef<str>`, `From<&str>` and `From<String>` implementations
///
/// # Example
///
/// ```rust
/// # use bazaar_core::define_id;
/// define_id!(SkuId);
/// define_id!(BatchId);
///
/// let sku = SkuId::new("SKU-1");
/// let batch = BatchId::new("SKU-1");
///
/// // These are different types, so this won't compile:
/// // let _: SkuId = batch;
/// assert_eq!(sku.as_str(), batch.as_str());
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
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
            /// Create a new ID from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Whether the ID is the empty string.
            #[must_use]
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl ::core::convert::AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

// Catalog product identifier (the SKU, or a positional fallback).
define_id!(ProductId);
define_id!(OrderNumber);

impl OrderNumber {
    /// Prefix carried by every generated order number.
    pub const PREFIX: &'static str = "ORD";

    /// Number of random characters after the timestamp.
    pub const SUFFIX_LEN: usize = 9;

    /// Generate an order number from a creation time and a random suffix.
    ///
    /// Format: `ORD-<unix millis>-<9 chars of [0-9A-Z]>`. Uniqueness within a
    /// local order collection is the caller's responsibility (regenerate on
    /// collision).
    #[must_use]
    pub fn generate<R: Rng + ?Sized>(created_at: DateTime<Utc>, rng: &mut R) -> Self {
        let suffix: String = (0..Self::SUFFIX_LEN)
            .map(|_| char::from(rng.sample(Alphanumeric)).to_ascii_uppercase())
            .collect();
        Self(format!(
            "{}-{}-{suffix}",
            Self::PREFIX,
            created_at.timestamp_millis()
        ))
    }
}

/// Identifier of a saved delivery address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AddressId(Uuid);

impl AddressId {
    /// Generate a fresh random address ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Get the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl core::fmt::Display for AddressId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for AddressId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}
