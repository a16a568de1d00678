use std::path::Path;

use redb::{Database, ReadableTable, TableDefinition};
use tracing::debug;

use crate::error::KVError;
use crate::traits::KVStore;

const TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("kv");

fn storage(e: impl std::fmt::Display) -> KVError {
    KVError::Storage(e.to_string())
}

/// RedbStore is a KVStore implementation backed by redb, a pure-Rust
/// embedded key-value database.
pub struct RedbStore {
    db: Database,
}

impl RedbStore {
    /// Open or create a redb database at the given path.
    pub fn open(path: &Path) -> Result<Self, KVError> {
        let db = Database::create(path).map_err(storage)?;

        // Ensure the table exists so read transactions never see it missing.
        let write_txn = db.begin_write().map_err(storage)?;
        {
            let _table = write_txn.open_table(TABLE).map_err(storage)?;
        }
        write_txn.commit().map_err(storage)?;

        debug!("opened redb store at {}", path.display());
        Ok(Self { db })
    }
}

impl KVStore for RedbStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KVError> {
        let read_txn = self.db.begin_read().map_err(storage)?;
        let table = read_txn.open_table(TABLE).map_err(storage)?;
        let value = table.get(key).map_err(storage)?;
        Ok(value.map(|v| v.value().to_vec()))
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), KVError> {
        let write_txn = self.db.begin_write().map_err(storage)?;
        {
            let mut table = write_txn.open_table(TABLE).map_err(storage)?;
            table.insert(key, value).map_err(storage)?;
        }
        write_txn.commit().map_err(storage)
    }

    fn delete(&self, key: &str) -> Result<(), KVError> {
        let write_txn = self.db.begin_write().map_err(storage)?;
        {
            let mut table = write_txn.open_table(TABLE).map_err(storage)?;
            table.remove(key).map_err(storage)?;
        }
        write_txn.commit().map_err(storage)
    }

    fn scan(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, KVError> {
        let read_txn = self.db.begin_read().map_err(storage)?;
        let table = read_txn.open_table(TABLE).map_err(storage)?;

        let mut results = Vec::new();
        for entry in table.range(prefix..).map_err(storage)? {
            let (key, value) = entry.map_err(storage)?;
            let key = key.value();
            if !key.starts_with(prefix) {
                break;
            }
            results.push((key.to_string(), value.value().to_vec()));
        }
        Ok(results)
    }

    fn increment(&self, key: &str, by: u64) -> Result<u64, KVError> {
        // redb serializes write transactions, so read-modify-write inside one
        // transaction is atomic with respect to other writers.
        let write_txn = self.db.begin_write().map_err(storage)?;
        let next = {
            let mut table = write_txn.open_table(TABLE).map_err(storage)?;
            let current = match table.get(key).map_err(storage)? {
                Some(v) => {
                    let bytes: [u8; 8] = v
                        .value()
                        .try_into()
                        .map_err(|_| KVError::CorruptCounter(key.to_string()))?;
                    u64::from_be_bytes(bytes)
                }
                None => 0,
            };
            let next = current + by;
            table
                .insert(key, next.to_be_bytes().as_slice())
                .map_err(storage)?;
            next
        };
        write_txn.commit().map_err(storage)?;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn open() -> (tempfile::TempDir, RedbStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = RedbStore::open(&dir.path().join("kv.redb")).unwrap();
        (dir, store)
    }

    #[test]
    fn set_get_delete() {
        let (_dir, store) = open();
        assert!(store.get("a").unwrap().is_none());
        store.set("a", b"1").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some(&b"1"[..]));
        store.delete("a").unwrap();
        assert!(store.get("a").unwrap().is_none());
        // Deleting again is fine.
        store.delete("a").unwrap();
    }

    #[test]
    fn scan_by_prefix() {
        let (_dir, store) = open();
        store.set("claims/seq/20241210", b"x").unwrap();
        store.set("claims/seq/20241211", b"y").unwrap();
        store.set("claimz", b"z").unwrap();

        let entries = store.scan("claims/seq/").unwrap();
        let keys: Vec<_> = entries.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["claims/seq/20241210", "claims/seq/20241211"]);
    }

    #[test]
    fn increment_starts_at_one() {
        let (_dir, store) = open();
        assert_eq!(store.increment("seq", 1).unwrap(), 1);
        assert_eq!(store.increment("seq", 1).unwrap(), 2);
        assert_eq!(store.increment("seq", 5).unwrap(), 7);
        assert_eq!(store.increment("other", 1).unwrap(), 1);
    }

    #[test]
    fn increment_rejects_non_counter() {
        let (_dir, store) = open();
        store.set("seq", b"abc").unwrap();
        assert!(matches!(
            store.increment("seq", 1),
            Err(KVError::CorruptCounter(_))
        ));
    }

    #[test]
    fn concurrent_increments_are_unique() {
        let (_dir, store) = open();
        let store = Arc::new(store);
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    (0..25)
                        .map(|_| store.increment("seq", 1).unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut all: Vec<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        all.sort_unstable();
        assert_eq!(all, (1..=200).collect::<Vec<_>>());
    }
}
