//! Saved delivery addresses.
//!
//! At most one address is the default. Adding an address that asks to be the
//! default clears the flag everywhere else; the first address is not promoted
//! automatically.

use std::sync::Arc;

use thiserror::Error;
use tracing::instrument;

use bazaar_core::{Address, AddressFields, AddressId, AddressKind};

use crate::store::{LocalStore, LocalStoreExt, StoreError, StoreKey};

/// Errors from the address book.
#[derive(Debug, Error)]
pub enum AddressError {
    #[error("missing address fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("address not found: {0}")]
    NotFound(AddressId),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// An address about to be saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAddress {
    pub kind: AddressKind,
    pub fields: AddressFields,
    pub make_default: bool,
}

impl NewAddress {
    /// Check required fields are present.
    ///
    /// # Errors
    ///
    /// Returns `AddressError::MissingFields` naming every blank field.
    pub fn validate(&self) -> Result<(), AddressError> {
        let missing = self.fields.missing_fields();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(AddressError::MissingFields(missing))
        }
    }
}

/// Address book backed by the local store.
#[derive(Clone)]
pub struct AddressBook {
    store: Arc<dyn LocalStore>,
}

impl AddressBook {
    #[must_use]
    pub fn new(store: Arc<dyn LocalStore>) -> Self {
        Self { store }
    }

    /// Validate and save `address`, returning the stored record.
    ///
    /// # Errors
    ///
    /// Returns `AddressError::MissingFields` if required fields are blank.
    #[instrument(skip(self, address), fields(kind = ?address.kind))]
    pub fn add(&self, address: NewAddress) -> Result<Address, AddressError> {
        address.validate()?;

        let mut addresses = self.list()?;
        if address.make_default {
            for existing in &mut addresses {
                existing.is_default = false;
            }
        }

        let saved = Address {
            id: AddressId::generate(),
            kind: address.kind,
            fields: address.fields,
            is_default: address.make_default,
        };
        addresses.push(saved.clone());
        self.store.save(StoreKey::Addresses, &addresses)?;

        tracing::debug!(address_id = %saved.id, "Address saved");
        Ok(saved)
    }

    /// Every saved address, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `AddressError::Store` if the stored list cannot be read.
    pub fn list(&self) -> Result<Vec<Address>, AddressError> {
        Ok(self.store.load_or_default(StoreKey::Addresses)?)
    }

    /// # Errors
    ///
    /// Returns `AddressError::NotFound` if no address has `id`.
    pub fn get(&self, id: AddressId) -> Result<Address, AddressError> {
        self.list()?
            .into_iter()
            .find(|address| address.id == id)
            .ok_or(AddressError::NotFound(id))
    }

    /// # Errors
    ///
    /// Returns `AddressError::Store` if the stored list cannot be read.
    pub fn default_address(&self) -> Result<Option<Address>, AddressError> {
        Ok(self.list()?.into_iter().find(|address| address.is_default))
    }
}
