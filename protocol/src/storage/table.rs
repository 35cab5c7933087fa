//! # Keyed Tables
//!
//! A [`Table`] is an ordered map from `(scope, primary key)` to a row.
//! Scopes partition a table: balances are scoped by owner, supply records
//! by symbol code. Iteration is always in key order, so anything derived
//! from a table (sweeps, digests, audits) is deterministic.
//!
//! Every row remembers the account that pays for its storage. Inserting,
//! growing, shrinking, re-assigning, or erasing a row updates that payer's
//! charge in the [`RamLedger`] passed to the call.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use crate::config::ROW_OVERHEAD_BYTES;
use crate::name::Name;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum TableError {
    #[error("{table}: no row at {key}")]
    NotFound { table: &'static str, key: RowKey },

    #[error("{table}: row already exists at {key}")]
    AlreadyExists { table: &'static str, key: RowKey },

    #[error("{table}: failed to measure row: {reason}")]
    Encoding { table: &'static str, reason: String },
}

// ---------------------------------------------------------------------------
// Keys and rows
// ---------------------------------------------------------------------------

/// Location of a row inside a table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowKey {
    pub scope: u64,
    pub primary: u64,
}

impl RowKey {
    pub fn new(scope: u64, primary: u64) -> Self {
        Self { scope, primary }
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}/{:#018x}", self.scope, self.primary)
    }
}

/// A stored value together with its ram payer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row<T> {
    pub payer: Name,
    pub value: T,
}

// ---------------------------------------------------------------------------
// RamLedger
// ---------------------------------------------------------------------------

/// Bytes of storage currently charged to each payer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RamLedger {
    usage: BTreeMap<Name, u64>,
}

impl RamLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes currently charged to `payer`.
    pub fn usage(&self, payer: Name) -> u64 {
        self.usage.get(&payer).copied().unwrap_or(0)
    }

    pub fn charge(&mut self, payer: Name, bytes: u64) {
        let entry = self.usage.entry(payer).or_insert(0);
        *entry = entry.saturating_add(bytes);
    }

    pub fn refund(&mut self, payer: Name, bytes: u64) {
        if let Some(entry) = self.usage.get_mut(&payer) {
            *entry = entry.saturating_sub(bytes);
            if *entry == 0 {
                self.usage.remove(&payer);
            }
        }
    }

    /// All payers with a non-zero charge, in name order.
    pub fn iter(&self) -> impl Iterator<Item = (Name, u64)> + '_ {
        self.usage.iter().map(|(name, bytes)| (*name, *bytes))
    }
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

/// Ordered, scoped, payer-tracked storage for one row type.
#[derive(Clone, Debug)]
pub struct Table<T> {
    name: &'static str,
    rows: BTreeMap<RowKey, Row<T>>,
}

impl<T: Serialize> Table<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            rows: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn contains(&self, scope: u64, primary: u64) -> bool {
        self.rows.contains_key(&RowKey::new(scope, primary))
    }

    /// Looks up a row, returning `None` when absent.
    pub fn find(&self, scope: u64, primary: u64) -> Option<&T> {
        self.rows.get(&RowKey::new(scope, primary)).map(|r| &r.value)
    }

    /// Looks up a row, failing with [`TableError::NotFound`] when absent.
    pub fn get(&self, scope: u64, primary: u64) -> Result<&T, TableError> {
        self.find(scope, primary).ok_or(TableError::NotFound {
            table: self.name,
            key: RowKey::new(scope, primary),
        })
    }

    pub fn payer(&self, scope: u64, primary: u64) -> Option<Name> {
        self.rows.get(&RowKey::new(scope, primary)).map(|r| r.payer)
    }

    /// Storage charged for a row: encoded size plus fixed overhead.
    fn billable(&self, value: &T) -> Result<u64, TableError> {
        let size = bincode::serialized_size(value).map_err(|e| TableError::Encoding {
            table: self.name,
            reason: e.to_string(),
        })?;
        Ok(size + ROW_OVERHEAD_BYTES)
    }

    /// Inserts a new row, charging `payer`. Fails if the key is taken.
    pub fn insert(
        &mut self,
        ram: &mut RamLedger,
        scope: u64,
        primary: u64,
        payer: Name,
        value: T,
    ) -> Result<(), TableError> {
        let key = RowKey::new(scope, primary);
        if self.rows.contains_key(&key) {
            return Err(TableError::AlreadyExists {
                table: self.name,
                key,
            });
        }
        self.insert_row(ram, key, Row { payer, value })
    }

    /// Inserts a fully formed row. Used when restoring from persistence.
    pub fn insert_row(
        &mut self,
        ram: &mut RamLedger,
        key: RowKey,
        row: Row<T>,
    ) -> Result<(), TableError> {
        let bytes = self.billable(&row.value)?;
        ram.charge(row.payer, bytes);
        if let Some(previous) = self.rows.insert(key, row) {
            let old = self.billable(&previous.value)?;
            ram.refund(previous.payer, old);
        }
        Ok(())
    }

    /// Mutates a row in place, keeping its current payer.
    pub fn modify<R>(
        &mut self,
        ram: &mut RamLedger,
        scope: u64,
        primary: u64,
        f: impl FnOnce(&mut T) -> R,
    ) -> Result<R, TableError> {
        self.modify_inner(ram, RowKey::new(scope, primary), None, f)
    }

    /// Mutates a row in place and moves its storage charge to `payer`.
    pub fn modify_with_payer<R>(
        &mut self,
        ram: &mut RamLedger,
        scope: u64,
        primary: u64,
        payer: Name,
        f: impl FnOnce(&mut T) -> R,
    ) -> Result<R, TableError> {
        self.modify_inner(ram, RowKey::new(scope, primary), Some(payer), f)
    }

    fn modify_inner<R>(
        &mut self,
        ram: &mut RamLedger,
        key: RowKey,
        payer: Option<Name>,
        f: impl FnOnce(&mut T) -> R,
    ) -> Result<R, TableError> {
        let name = self.name;
        let row = self
            .rows
            .get_mut(&key)
            .ok_or(TableError::NotFound { table: name, key })?;

        let measure = |value: &T| -> Result<u64, TableError> {
            bincode::serialized_size(value)
                .map(|size| size + ROW_OVERHEAD_BYTES)
                .map_err(|e| TableError::Encoding {
                    table: name,
                    reason: e.to_string(),
                })
        };

        let before = measure(&row.value)?;
        let out = f(&mut row.value);
        let after = measure(&row.value)?;

        ram.refund(row.payer, before);
        if let Some(payer) = payer {
            row.payer = payer;
        }
        ram.charge(row.payer, after);
        Ok(out)
    }

    /// Removes a row, refunding its payer. Returns the removed value.
    pub fn erase(
        &mut self,
        ram: &mut RamLedger,
        scope: u64,
        primary: u64,
    ) -> Result<T, TableError> {
        let key = RowKey::new(scope, primary);
        let row = self.rows.remove(&key).ok_or(TableError::NotFound {
            table: self.name,
            key,
        })?;
        let bytes = self.billable(&row.value)?;
        ram.refund(row.payer, bytes);
        Ok(row.value)
    }

    /// Every row in key order.
    pub fn iter(&self) -> impl Iterator<Item = (RowKey, &Row<T>)> + '_ {
        self.rows.iter().map(|(k, r)| (*k, r))
    }

    /// Rows of one scope in primary-key order.
    pub fn scope(&self, scope: u64) -> impl Iterator<Item = (u64, &T)> + '_ {
        self.rows
            .range(RowKey::new(scope, 0)..=RowKey::new(scope, u64::MAX))
            .map(|(k, r)| (k.primary, &r.value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Name {
        "alice".parse().unwrap()
    }

    fn bob() -> Name {
        "bob".parse().unwrap()
    }

    #[test]
    fn insert_get_and_duplicate() {
        let mut ram = RamLedger::new();
        let mut t: Table<u64> = Table::new("numbers");
        t.insert(&mut ram, 1, 7, alice(), 42).unwrap();
        assert_eq!(*t.get(1, 7).unwrap(), 42);
        assert!(matches!(
            t.insert(&mut ram, 1, 7, alice(), 43),
            Err(TableError::AlreadyExists { .. })
        ));
        assert!(matches!(t.get(2, 7), Err(TableError::NotFound { .. })));
    }

    #[test]
    fn insert_charges_and_erase_refunds() {
        let mut ram = RamLedger::new();
        let mut t: Table<u64> = Table::new("numbers");
        t.insert(&mut ram, 1, 1, alice(), 5).unwrap();
        assert_eq!(ram.usage(alice()), 8 + ROW_OVERHEAD_BYTES);
        assert_eq!(t.erase(&mut ram, 1, 1).unwrap(), 5);
        assert_eq!(ram.usage(alice()), 0);
        assert!(t.is_empty());
    }

    #[test]
    fn modify_remeasures_growing_rows() {
        let mut ram = RamLedger::new();
        let mut t: Table<Vec<u32>> = Table::new("lists");
        t.insert(&mut ram, 0, 0, alice(), vec![]).unwrap();
        let before = ram.usage(alice());
        t.modify(&mut ram, 0, 0, |v| v.push(9)).unwrap();
        assert_eq!(ram.usage(alice()), before + 4);
    }

    #[test]
    fn modify_with_payer_moves_the_charge() {
        let mut ram = RamLedger::new();
        let mut t: Table<u64> = Table::new("numbers");
        t.insert(&mut ram, 0, 0, alice(), 1).unwrap();
        t.modify_with_payer(&mut ram, 0, 0, bob(), |v| *v += 1).unwrap();
        assert_eq!(ram.usage(alice()), 0);
        assert_eq!(ram.usage(bob()), 8 + ROW_OVERHEAD_BYTES);
        assert_eq!(t.payer(0, 0), Some(bob()));
    }

    #[test]
    fn scope_iteration_is_ordered_and_bounded() {
        let mut ram = RamLedger::new();
        let mut t: Table<u64> = Table::new("numbers");
        t.insert(&mut ram, 2, 9, alice(), 3).unwrap();
        t.insert(&mut ram, 1, 5, alice(), 2).unwrap();
        t.insert(&mut ram, 1, 1, alice(), 1).unwrap();
        let in_scope: Vec<_> = t.scope(1).map(|(k, v)| (k, *v)).collect();
        assert_eq!(in_scope, vec![(1, 1), (5, 2)]);
        let keys: Vec<_> = t.iter().map(|(k, _)| (k.scope, k.primary)).collect();
        assert_eq!(keys, vec![(1, 1), (1, 5), (2, 9)]);
    }
}
