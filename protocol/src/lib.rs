// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # LockToken Protocol Primitives
//!
//! The vocabulary every ledger operation is written in: packed account
//! names, symbol-qualified fixed-point assets, second-granularity time,
//! and scoped keyed tables that track who pays for their storage.
//!
//! ## Architecture
//!
//! - **name**: 64-bit packed account names.
//! - **asset**: `SymbolCode`, `Symbol`, `Asset` with checked arithmetic.
//! - **time**: `TimePointSec` and the `Clock` seam.
//! - **storage**: `Table<T>`, ram accounting, sled persistence, digests.
//! - **config**: protocol constants.
//!
//! The token contract itself lives in `locktoken-contracts`; nothing in
//! this crate knows about supply, balances or locks.

pub mod asset;
pub mod config;
pub mod name;
pub mod storage;
pub mod time;

pub use asset::{Asset, AssetError, Symbol, SymbolCode, SymbolError};
pub use name::{Name, NameError};
pub use time::{Clock, ManualClock, SystemClock, TimePointSec};
