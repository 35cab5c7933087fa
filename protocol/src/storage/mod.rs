//! # Storage Module
//!
//! Keyed tables, their persistence, and their fingerprint.
//!
//! ## Architecture
//!
//! ```text
//! table.rs  : Table<T>: scoped ordered rows with ram payers, RamLedger
//! digest.rs : BLAKE3 digest over table contents
//! db.rs     : sled persistence with atomic multi-table commits
//! ```
//!
//! ## Data Flow
//!
//! ```text
//! action → Table (in memory) → StagedWrite → LedgerDB (sled)
//!                ↓
//!           StateHasher → state root
//! ```
//!
//! Bincode is the on-disk and size-accounting encoding. JSON is for the
//! CLI and debugging only.

pub mod db;
pub mod digest;
pub mod table;

pub use db::{DbError, LedgerDB, StagedWrite};
pub use digest::StateHasher;
pub use table::{RamLedger, Row, RowKey, Table, TableError};
