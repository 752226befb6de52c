//! In-process store.

use std::collections::HashMap;
use std::sync::Mutex;

use super::{LocalStore, StoreError, StoreKey};

/// A [`LocalStore`] backed by a map. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<StoreKey, Vec<u8>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStore for MemoryStore {
    fn read(&self, key: StoreKey) -> Result<Option<Vec<u8>>, StoreError> {
        let entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(&key).cloned())
    }

    fn write(&self, key: StoreKey, value: &[u8]) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        entries.insert(key, value.to_vec());
        Ok(())
    }

    fn remove(&self, key: StoreKey) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        entries.remove(&key);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_write_read_remove() {
        let store = MemoryStore::new();
        store.write(StoreKey::Wishlist, b"[]").unwrap();
        assert_eq!(store.read(StoreKey::Wishlist).unwrap(), Some(b"[]".to_vec()));

        store.remove(StoreKey::Wishlist).unwrap();
        store.remove(StoreKey::Wishlist).unwrap();
        assert_eq!(store.read(StoreKey::Wishlist).unwrap(), None);
    }
}
