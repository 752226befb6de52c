//! redb-backed durable store.
//!
//! One table maps the key name to the JSON bytes of the collection. redb
//! commits are durable once `commit()` returns, and a crash mid-write leaves
//! the previous value in place.

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, TableDefinition};

use super::{LocalStore, StoreError, StoreKey};

/// File name of the store inside the data directory.
pub const STORE_FILE: &str = "bazaar.redb";

/// Collections table: key = [`StoreKey`] name, value = JSON bytes
const COLLECTIONS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("collections");

/// A [`LocalStore`] persisted to a single redb file.
#[derive(Clone)]
pub struct RedbStore {
    db: Arc<Database>,
}

impl RedbStore {
    /// Open or create the store at `path`.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` if the file cannot be opened or initialized.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db = Database::create(path)?;
        Self::init(db)
    }

    /// Open the store inside `dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` if the directory or file cannot be created.
    pub fn open_in_dir(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        Self::open(dir.join(STORE_FILE))
    }

    /// Open a store that lives only in memory.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` if the table cannot be created.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> Result<Self, StoreError> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(COLLECTIONS_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }
}

impl LocalStore for RedbStore {
    fn read(&self, key: StoreKey) -> Result<Option<Vec<u8>>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(COLLECTIONS_TABLE)?;
        Ok(table.get(key.as_str())?.map(|guard| guard.value().to_vec()))
    }

    fn write(&self, key: StoreKey, value: &[u8]) -> Result<(), StoreError> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(COLLECTIONS_TABLE)?;
            table.insert(key.as_str(), value)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn remove(&self, key: StoreKey) -> Result<(), StoreError> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(COLLECTIONS_TABLE)?;
            table.remove(key.as_str())?;
        }
        write_txn.commit()?;
        Ok(())
    }
}
