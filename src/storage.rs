use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;

use redb::{Database, TableDefinition};
use thiserror::Error;

const TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("kv");

#[derive(Debug, Error)]
pub enum KvError {
    #[error("storage error: {0}")]
    Storage(String),
}

fn storage_err<E: std::fmt::Display>(e: E) -> KvError {
    KvError::Storage(e.to_string())
}

/// Durable key-value backend holding one serialized snapshot per key.
pub trait KvStore: Send + Sync {
    /// Returns `None` when the key was never written.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KvError>;
    /// Replaces the whole value stored under `key`.
    fn set(&self, key: &str, value: &[u8]) -> Result<(), KvError>;
}

/// redb-backed store; survives process restarts.
pub struct RedbStore {
    db: Database,
}

impl RedbStore {
    pub fn open(path: &Path) -> Result<Self, KvError> {
        let db = Database::create(path).map_err(storage_err)?;

        // make sure the table exists before the first read
        let write_txn = db.begin_write().map_err(storage_err)?;
        {
            let _table = write_txn.open_table(TABLE).map_err(storage_err)?;
        }
        write_txn.commit().map_err(storage_err)?;

        Ok(Self { db })
    }
}

impl KvStore for RedbStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KvError> {
        let read_txn = self.db.begin_read().map_err(storage_err)?;
        let table = read_txn.open_table(TABLE).map_err(storage_err)?;
        let value = table.get(key).map_err(storage_err)?;
        Ok(value.map(|v| v.value().to_vec()))
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), KvError> {
        let write_txn = self.db.begin_write().map_err(storage_err)?;
        {
            let mut table = write_txn.open_table(TABLE).map_err(storage_err)?;
            table.insert(key, value).map_err(storage_err)?;
        }
        write_txn.commit().map_err(storage_err)?;
        Ok(())
    }
}

/// Process-local store. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KvError> {
        let entries = self.entries.read().map_err(storage_err)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), KvError> {
        let mut entries = self.entries.write().map_err(storage_err)?;
        entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }
}
