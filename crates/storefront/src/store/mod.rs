//! Device-local key-value storage.
//!
//! Every collection the storefront keeps on the device (cart, wishlist, orders,
//! addresses, signed-in user, pending code) lives under one [`StoreKey`] as a
//! JSON document. Each [`LocalStore`] call is atomic on its own; services do
//! read-modify-write on whole collections.
//!
//! # Backends
//!
//! | Backend | Use |
//! |---------|-----|
//! | [`RedbStore`] | Durable single-file store under the data directory |
//! | [`MemoryStore`] | Tests and throwaway sessions |

mod memory;
mod redb_store;

use core::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

pub use self::memory::MemoryStore;
pub use self::redb_store::{RedbStore, STORE_FILE};

/// The collections persisted on the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKey {
    Cart,
    Wishlist,
    Orders,
    Addresses,
    AuthUser,
    PendingOtp,
}

impl StoreKey {
    /// Every key, in a stable order.
    pub const ALL: [Self; 6] = [
        Self::Cart,
        Self::Wishlist,
        Self::Orders,
        Self::Addresses,
        Self::AuthUser,
        Self::PendingOtp,
    ];

    /// Versioned storage name. Changing the shape of a collection means a new
    /// version suffix, never reusing a name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cart => "bazaar_cart_v1",
            Self::Wishlist => "bazaar_wishlist_v1",
            Self::Orders => "bazaar_orders_v1",
            Self::Addresses => "bazaar_addresses_v1",
            Self::AuthUser => "bazaar_auth_v1",
            Self::PendingOtp => "bazaar_otp_v1",
        }
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from the local store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored value no longer matches its schema.
    #[error("stored value under {key} is corrupt: {source}")]
    Corrupt {
        key: StoreKey,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode value for {key}: {source}")]
    Encode {
        key: StoreKey,
        #[source]
        source: serde_json::Error,
    },

    /// A thread panicked while holding the store lock.
    #[error("local store lock poisoned")]
    Poisoned,
}

/// Raw byte storage keyed by [`StoreKey`].
pub trait LocalStore: Send + Sync {
    /// Read the value under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` if the backend fails.
    fn read(&self, key: StoreKey) -> Result<Option<Vec<u8>>, StoreError>;

    /// Replace the value under `key`.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` if the backend fails.
    fn write(&self, key: StoreKey, value: &[u8]) -> Result<(), StoreError>;

    /// Delete the value under `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` if the backend fails.
    fn remove(&self, key: StoreKey) -> Result<(), StoreError>;
}

/// Typed JSON access on top of [`LocalStore`].
pub trait LocalStoreExt: LocalStore {
    /// Load and decode the value under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Corrupt` if the stored bytes do not decode as `T`.
    fn load<T: DeserializeOwned>(&self, key: StoreKey) -> Result<Option<T>, StoreError> {
        self.read(key)?
            .map(|bytes| {
                serde_json::from_slice(&bytes).map_err(|source| StoreError::Corrupt { key, source })
            })
            .transpose()
    }

    /// Like [`load`](Self::load), with a missing value read as `T::default()`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Corrupt` if the stored bytes do not decode as `T`.
    fn load_or_default<T: DeserializeOwned + Default>(&self, key: StoreKey) -> Result<T, StoreError> {
        Ok(self.load(key)?.unwrap_or_default())
    }

    /// Encode `value` as JSON and store it under `key`.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` if encoding or the backend fails.
    fn save<T: Serialize + ?Sized>(&self, key: StoreKey, value: &T) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(value).map_err(|source| StoreError::Encode { key, source })?;
        self.write(key, &bytes)
    }
}

impl<S: LocalStore + ?Sized> LocalStoreExt for S {}
