//! # State Digest
//!
//! A BLAKE3 fingerprint over the full contents of a set of tables. Two
//! ledgers with the same rows (including ram payers) produce the same
//! digest regardless of the order in which the rows were written, because
//! tables iterate in key order.
//!
//! Each row is framed as:
//!
//! ```text
//! table_name || 0x00 || scope (8B BE) || primary (8B BE) || payer (8B BE)
//!   || len(value) (8B BE) || bincode(value)
//! ```

use serde::Serialize;

use super::table::{Table, TableError};

/// Incremental hasher over tables.
pub struct StateHasher {
    inner: blake3::Hasher,
}

impl StateHasher {
    pub fn new() -> Self {
        Self {
            inner: blake3::Hasher::new(),
        }
    }

    /// Feeds every row of `table` into the digest.
    pub fn absorb<T: Serialize>(&mut self, table: &Table<T>) -> Result<(), TableError> {
        for (key, row) in table.iter() {
            let value = bincode::serialize(&row.value).map_err(|e| TableError::Encoding {
                table: table.name(),
                reason: e.to_string(),
            })?;
            self.inner.update(table.name().as_bytes());
            self.inner.update(&[0x00]);
            self.inner.update(&key.scope.to_be_bytes());
            self.inner.update(&key.primary.to_be_bytes());
            self.inner.update(&row.payer.raw().to_be_bytes());
            self.inner.update(&(value.len() as u64).to_be_bytes());
            self.inner.update(&value);
        }
        Ok(())
    }

    /// Hex-encoded 32-byte digest.
    pub fn finalize(&self) -> String {
        hex::encode(self.inner.finalize().as_bytes())
    }
}

impl Default for StateHasher {
    fn default() -> Self {
        Self::new()
    }
}
