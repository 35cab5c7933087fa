//! # Table Rows
//!
//! The four record types the token contract stores. Keys are not part of
//! the rows; see [`crate::state::TokenState`] for how each table is scoped.

use locktoken_protocol::{Asset, Name, TimePointSec};
use serde::{Deserialize, Serialize};

/// Supply record for one symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyStats {
    pub supply: Asset,
    pub max_supply: Asset,
    pub issuer: Name,
}

/// Liquid balance of one owner in one symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub balance: Asset,
}

/// One tranche of locked funds.
///
/// Lifecycle: *pending* (no request yet) → *scheduled* (`unlock` stamped
/// request and execute times) → *released* (removed by `dounlock` once
/// the execute time has passed).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockEntry {
    pub balance: Asset,
    pub unlock_delay_sec: u32,
    pub unlock_request_time: Option<TimePointSec>,
    pub unlock_execute_time: Option<TimePointSec>,
}

impl LockEntry {
    pub fn pending(balance: Asset, unlock_delay_sec: u32) -> Self {
        Self {
            balance,
            unlock_delay_sec,
            unlock_request_time: None,
            unlock_execute_time: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.unlock_execute_time.is_none()
    }

    /// Scheduled and due at or before `now`.
    pub fn is_matured(&self, now: TimePointSec) -> bool {
        matches!(self.unlock_execute_time, Some(at) if at <= now)
    }
}

/// All locked tranches of one owner in one symbol.
///
/// `total_balance` always equals the sum of the entry balances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedAccount {
    pub total_balance: Asset,
    pub entries: Vec<LockEntry>,
}

impl LockedAccount {
    pub fn pending_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_pending()).count()
    }
}

/// Minimum-balance floor for a flagged account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlacklistRow {
    pub account: Name,
    pub tokens_blocked: Asset,
}
