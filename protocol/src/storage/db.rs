//! # LedgerDB: Persistent Storage Engine
//!
//! Persists [`Table`]s to sled's embedded key-value store. The ledger
//! itself runs entirely in memory; this module loads tables at startup and
//! writes them back after each committed action.
//!
//! ## Tree Layout
//!
//! | Tree       | Key                                         | Value            |
//! |------------|---------------------------------------------|------------------|
//! | `rows`     | `table` `0x00` `scope` (8B BE) `key` (8B BE) | `bincode(Row<T>)` |
//! | `metadata` | key (UTF-8)                                 | value (bytes)    |
//!
//! Scope and primary key are big-endian so sled's lexicographic order
//! matches the in-memory [`RowKey`] order.
//!
//! ## Atomicity
//!
//! Writes are staged into a [`StagedWrite`] and applied with a single
//! multi-tree transaction. Either every table and metadata entry of an
//! action lands on disk or none does.

use serde::de::DeserializeOwned;
use serde::Serialize;
use sled::transaction::{ConflictableTransactionError, TransactionError};
use sled::{Batch, Db, Transactional, Tree};
use std::path::Path;

use super::table::{RamLedger, Row, RowKey, Table, TableError};
use crate::name::Name;

// ---------------------------------------------------------------------------
// Error Type
// ---------------------------------------------------------------------------

/// Errors that can occur during database operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("corrupt key in table {table}: {reason}")]
    CorruptKey { table: String, reason: String },

    #[error(transparent)]
    Table(#[from] TableError),

    #[error("transaction aborted")]
    Aborted,

    #[error("database belongs to contract {stored}, not {requested}")]
    ContractMismatch { stored: Name, requested: Name },
}

pub type DbResult<T> = Result<T, DbError>;

// ---------------------------------------------------------------------------
// Key encoding
// ---------------------------------------------------------------------------

fn table_prefix(table: &str) -> Vec<u8> {
    let mut prefix = Vec::with_capacity(table.len() + 1);
    prefix.extend_from_slice(table.as_bytes());
    prefix.push(0x00);
    prefix
}

fn encode_key(table: &str, key: RowKey) -> Vec<u8> {
    let mut out = table_prefix(table);
    out.extend_from_slice(&key.scope.to_be_bytes());
    out.extend_from_slice(&key.primary.to_be_bytes());
    out
}

fn decode_key(table: &str, raw: &[u8]) -> DbResult<RowKey> {
    let corrupt = |reason: &str| DbError::CorruptKey {
        table: table.to_string(),
        reason: reason.to_string(),
    };
    let body = raw
        .strip_prefix(table_prefix(table).as_slice())
        .ok_or_else(|| corrupt("missing table prefix"))?;
    if body.len() != 16 {
        return Err(corrupt("expected 16 key bytes"));
    }
    let (scope, primary) = body.split_at(8);
    let scope = u64::from_be_bytes(scope.try_into().map_err(|_| corrupt("bad scope"))?);
    let primary = u64::from_be_bytes(primary.try_into().map_err(|_| corrupt("bad primary key"))?);
    Ok(RowKey::new(scope, primary))
}

// ---------------------------------------------------------------------------
// StagedWrite
// ---------------------------------------------------------------------------

/// Pending writes for one commit.
#[derive(Default)]
pub struct StagedWrite {
    rows: Batch,
    metadata: Vec<(String, Vec<u8>)>,
    tables: usize,
}

impl StagedWrite {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a metadata entry to be written with the same commit.
    pub fn set_metadata(&mut self, key: &str, value: impl Into<Vec<u8>>) {
        self.metadata.push((key.to_string(), value.into()));
    }
}

// ---------------------------------------------------------------------------
// LedgerDB
// ---------------------------------------------------------------------------

/// Persistent storage engine for ledger tables.
///
/// Cheap to clone: sled handles are reference counted.
#[derive(Debug, Clone)]
pub struct LedgerDB {
    db: Db,
    rows: Tree,
    metadata: Tree,
}

impl LedgerDB {
    /// Open or create a database at the given filesystem path.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    /// Create a temporary database that is removed when dropped.
    pub fn open_temporary() -> DbResult<Self> {
        let config = sled::Config::new().temporary(true);
        let db = config.open()?;
        Self::from_db(db)
    }

    fn from_db(db: Db) -> DbResult<Self> {
        let rows = db.open_tree("rows")?;
        let metadata = db.open_tree("metadata")?;
        Ok(Self { db, rows, metadata })
    }

    /// Loads every stored row of `table`, charging payers in `ram`.
    pub fn load_table<T>(&self, table: &mut Table<T>, ram: &mut RamLedger) -> DbResult<()>
    where
        T: Serialize + DeserializeOwned,
    {
        let name = table.name();
        for entry in self.rows.scan_prefix(table_prefix(name)) {
            let (raw_key, raw_value) = entry?;
            let key = decode_key(name, &raw_key)?;
            let row: Row<T> = bincode::deserialize(&raw_value)
                .map_err(|e| DbError::Serialization(e.to_string()))?;
            table.insert_row(ram, key, row)?;
        }
        tracing::debug!(table = name, rows = table.len(), "table loaded");
        Ok(())
    }

    /// Stages a full replacement of `table`'s stored rows.
    ///
    /// Rows present on disk but missing from `table` are removed.
    pub fn stage_table<T>(&self, staged: &mut StagedWrite, table: &Table<T>) -> DbResult<()>
    where
        T: Serialize,
    {
        let name = table.name();
        for entry in self.rows.scan_prefix(table_prefix(name)) {
            let (raw_key, _) = entry?;
            staged.rows.remove(raw_key);
        }
        // Batch keeps the last operation per key, so re-inserting after the
        // removal above leaves surviving rows in place.
        for (key, row) in table.iter() {
            let bytes =
                bincode::serialize(row).map_err(|e| DbError::Serialization(e.to_string()))?;
            staged.rows.insert(encode_key(name, key), bytes);
        }
        staged.tables += 1;
        Ok(())
    }

    /// Applies all staged writes atomically and flushes to disk.
    pub fn commit(&self, staged: StagedWrite) -> DbResult<()> {
        let StagedWrite {
            rows: batch,
            metadata,
            tables,
        } = staged;

        let result: Result<(), TransactionError<()>> = (&self.rows, &self.metadata).transaction(
            |(rows, meta)| {
                rows.apply_batch(&batch)?;
                for (key, value) in &metadata {
                    meta.insert(key.as_bytes(), value.as_slice())?;
                }
                Ok::<(), ConflictableTransactionError<()>>(())
            },
        );
        result.map_err(|e| match e {
            TransactionError::Storage(e) => DbError::Sled(e),
            TransactionError::Abort(()) => DbError::Aborted,
        })?;

        self.db.flush()?;
        tracing::debug!(tables, metadata = metadata.len(), "commit flushed");
        Ok(())
    }

    /// Reads a metadata value.
    pub fn get_metadata(&self, key: &str) -> DbResult<Option<Vec<u8>>> {
        Ok(self.metadata.get(key.as_bytes())?.map(|v| v.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payer() -> Name {
        "alice".parse().unwrap()
    }

    #[test]
    fn key_encoding_round_trips() {
        let key = RowKey::new(0xDEAD, 0xBEEF);
        let raw = encode_key("accounts", key);
        assert_eq!(decode_key("accounts", &raw).unwrap(), key);
        assert!(decode_key("stat", &raw).is_err());
    }

    #[test]
    fn stage_commit_and_reload() {
        let db = LedgerDB::open_temporary().unwrap();
        let mut ram = RamLedger::new();
        let mut table: Table<String> = Table::new("notes");
        table.insert(&mut ram, 1, 2, payer(), "hello".into()).unwrap();
        table.insert(&mut ram, 1, 3, payer(), "world".into()).unwrap();

        let mut staged = StagedWrite::new();
        db.stage_table(&mut staged, &table).unwrap();
        staged.set_metadata("version", b"1".to_vec());
        db.commit(staged).unwrap();

        let mut reloaded_ram = RamLedger::new();
        let mut reloaded: Table<String> = Table::new("notes");
        db.load_table(&mut reloaded, &mut reloaded_ram).unwrap();
        assert_eq!(reloaded.find(1, 2).map(String::as_str), Some("hello"));
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded_ram, ram);
        assert_eq!(db.get_metadata("version").unwrap(), Some(b"1".to_vec()));
    }

    #[test]
    fn restaging_removes_erased_rows() {
        let db = LedgerDB::open_temporary().unwrap();
        let mut ram = RamLedger::new();
        let mut table: Table<u8> = Table::new("bytes");
        table.insert(&mut ram, 0, 1, payer(), 1).unwrap();
        table.insert(&mut ram, 0, 2, payer(), 2).unwrap();
        let mut staged = StagedWrite::new();
        db.stage_table(&mut staged, &table).unwrap();
        db.commit(staged).unwrap();

        table.erase(&mut ram, 0, 1).unwrap();
        let mut staged = StagedWrite::new();
        db.stage_table(&mut staged, &table).unwrap();
        db.commit(staged).unwrap();

        let mut reloaded: Table<u8> = Table::new("bytes");
        db.load_table(&mut reloaded, &mut RamLedger::new()).unwrap();
        assert_eq!(reloaded.len(), 1);
        assert!(reloaded.find(0, 2).is_some());
    }

    #[test]
    fn tables_do_not_bleed_into_each_other() {
        let db = LedgerDB::open_temporary().unwrap();
        let mut ram = RamLedger::new();
        let mut a: Table<u8> = Table::new("a");
        let mut ab: Table<u8> = Table::new("ab");
        a.insert(&mut ram, 0, 0, payer(), 1).unwrap();
        ab.insert(&mut ram, 0, 0, payer(), 2).unwrap();
        let mut staged = StagedWrite::new();
        db.stage_table(&mut staged, &a).unwrap();
        db.stage_table(&mut staged, &ab).unwrap();
        db.commit(staged).unwrap();

        let mut reloaded: Table<u8> = Table::new("a");
        db.load_table(&mut reloaded, &mut RamLedger::new()).unwrap();
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.find(0, 0), Some(&1));
    }
}
