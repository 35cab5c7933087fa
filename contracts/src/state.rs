//! # Token State
//!
//! The complete set of tables the contract owns, plus the ram ledger that
//! tracks who pays for them.
//!
//! ## Scoping
//!
//! | Table       | Scope         | Primary key   | Row              |
//! |-------------|---------------|---------------|------------------|
//! | `stat`      | symbol code   | symbol code   | `CurrencyStats`  |
//! | `accounts`  | owner         | symbol code   | `Account`        |
//! | `locked`    | owner         | symbol code   | `LockedAccount`  |
//! | `blacklist` | contract      | account       | `BlacklistRow`   |
//!
//! Everything keyed by symbol code is partitioned per token, so two
//! symbols never touch the same row.

use serde::Serialize;
use thiserror::Error;

use locktoken_protocol::config::{ACCOUNTS_TABLE, BLACKLIST_TABLE, LOCKED_TABLE, STAT_TABLE};
use locktoken_protocol::storage::{DbError, LedgerDB, RamLedger, StagedWrite, StateHasher, Table};
use locktoken_protocol::{Asset, Name, SymbolCode};

use crate::error::{TokenError, TokenResult};
use crate::tables::{Account, BlacklistRow, CurrencyStats, LockedAccount};

/// Metadata key under which the committed state root is stored.
pub const META_STATE_ROOT: &str = "state_root";

/// Metadata key under which the hosting contract account is stored.
pub const META_CONTRACT: &str = "contract";

/// All contract tables.
#[derive(Debug, Clone)]
pub struct TokenState {
    contract: Name,
    pub(crate) stats: Table<CurrencyStats>,
    pub(crate) accounts: Table<Account>,
    pub(crate) locked: Table<LockedAccount>,
    pub(crate) blacklist: Table<BlacklistRow>,
    pub(crate) ram: RamLedger,
}

impl TokenState {
    /// Empty state hosted by `contract`.
    pub fn new(contract: Name) -> Self {
        Self {
            contract,
            stats: Table::new(STAT_TABLE),
            accounts: Table::new(ACCOUNTS_TABLE),
            locked: Table::new(LOCKED_TABLE),
            blacklist: Table::new(BLACKLIST_TABLE),
            ram: RamLedger::new(),
        }
    }

    pub fn contract(&self) -> Name {
        self.contract
    }

    // -- Static reads -------------------------------------------------------

    pub fn get_stats(&self, code: SymbolCode) -> TokenResult<&CurrencyStats> {
        self.stats
            .find(code.raw(), code.raw())
            .ok_or_else(|| TokenError::NotFound(format!("token with symbol {code} does not exist")))
    }

    /// Current supply of a symbol.
    pub fn get_supply(&self, code: SymbolCode) -> TokenResult<Asset> {
        Ok(self.get_stats(code)?.supply)
    }

    /// Liquid balance of `owner` in a symbol.
    pub fn get_balance(&self, owner: Name, code: SymbolCode) -> TokenResult<Asset> {
        self.accounts
            .find(owner.raw(), code.raw())
            .map(|a| a.balance)
            .ok_or_else(|| TokenError::NotFound(format!("no balance object found for {owner} in {code}")))
    }

    pub fn get_locked(&self, owner: Name, code: SymbolCode) -> TokenResult<&LockedAccount> {
        self.locked
            .find(owner.raw(), code.raw())
            .ok_or_else(|| TokenError::NotFound(format!("no locked balance found for {owner} in {code}")))
    }

    pub fn get_blacklist(&self, account: Name) -> Option<&BlacklistRow> {
        self.blacklist.find(self.contract.raw(), account.raw())
    }

    /// Every blacklist row, in account order.
    pub fn blacklisted(&self) -> Vec<&BlacklistRow> {
        self.blacklist
            .scope(self.contract.raw())
            .map(|(_, row)| row)
            .collect()
    }

    /// Storage bytes currently charged to `payer`.
    pub fn ram_usage(&self, payer: Name) -> u64 {
        self.ram.usage(payer)
    }

    /// Storage charged to every payer, in name order.
    pub fn ram_by_payer(&self) -> Vec<(Name, u64)> {
        self.ram.iter().collect()
    }

    /// Every registered symbol code, in key order.
    pub fn symbols(&self) -> Vec<SymbolCode> {
        self.stats
            .iter()
            .filter_map(|(key, _)| SymbolCode::from_raw(key.primary).ok())
            .collect()
    }

    /// Every liquid balance of a symbol, in owner order.
    pub fn holders(&self, code: SymbolCode) -> Vec<(Name, Asset)> {
        self.accounts
            .iter()
            .filter(|(key, _)| key.primary == code.raw())
            .map(|(key, row)| (Name::from_raw(key.scope), row.value.balance))
            .collect()
    }

    /// Every locked record of a symbol, in owner order.
    pub fn lockers(&self, code: SymbolCode) -> Vec<(Name, &LockedAccount)> {
        self.locked
            .iter()
            .filter(|(key, _)| key.primary == code.raw())
            .map(|(key, row)| (Name::from_raw(key.scope), &row.value))
            .collect()
    }

    // -- Digest & audit -----------------------------------------------------

    /// BLAKE3 digest over every table, hex encoded.
    pub fn state_root(&self) -> TokenResult<String> {
        let mut hasher = StateHasher::new();
        hasher.absorb(&self.stats)?;
        hasher.absorb(&self.accounts)?;
        hasher.absorb(&self.locked)?;
        hasher.absorb(&self.blacklist)?;
        Ok(hasher.finalize())
    }

    /// Checks the accounting invariants of one symbol.
    ///
    /// Blacklisted accounts whose balance already sat below their floor
    /// when they were flagged are reported, not rejected: the floor only
    /// constrains future debits.
    pub fn audit(&self, code: SymbolCode) -> Result<AuditReport, InvariantViolation> {
        let stats = self
            .stats
            .find(code.raw(), code.raw())
            .ok_or(InvariantViolation::Unregistered(code))?;
        let symbol = stats.supply.symbol;

        if stats.supply.amount < 0 || stats.supply.amount > stats.max_supply.amount {
            return Err(InvariantViolation::SupplyOutOfBounds {
                supply: stats.supply,
                max_supply: stats.max_supply,
            });
        }

        let mut liquid: i128 = 0;
        let mut accounts_below_floor = Vec::new();
        let holders = self.holders(code);
        for (owner, balance) in &holders {
            if balance.symbol != symbol {
                return Err(InvariantViolation::ForeignSymbol { owner: *owner });
            }
            if balance.amount < 0 {
                return Err(InvariantViolation::NegativeBalance {
                    owner: *owner,
                    balance: *balance,
                });
            }
            if let Some(row) = self.get_blacklist(*owner) {
                if row.tokens_blocked.symbol.code() == code
                    && balance.amount < row.tokens_blocked.amount
                {
                    accounts_below_floor.push(*owner);
                }
            }
            liquid += i128::from(balance.amount);
        }

        let mut locked: i128 = 0;
        let mut lock_entries = 0;
        for (owner, record) in self.lockers(code) {
            let sum: i128 = record.entries.iter().map(|e| i128::from(e.balance.amount)).sum();
            if sum != i128::from(record.total_balance.amount)
                || record.entries.iter().any(|e| e.balance.amount <= 0)
            {
                return Err(InvariantViolation::LockTotalMismatch {
                    owner,
                    total: record.total_balance,
                });
            }
            lock_entries += record.entries.len();
            locked += sum;
        }

        if liquid + locked != i128::from(stats.supply.amount) {
            return Err(InvariantViolation::SupplyMismatch {
                supply: stats.supply,
                liquid,
                locked,
            });
        }

        Ok(AuditReport {
            supply: stats.supply,
            max_supply: stats.max_supply,
            issuer: stats.issuer,
            liquid: Asset::new(liquid as i64, symbol),
            locked: Asset::new(locked as i64, symbol),
            holders: holders.len(),
            lock_entries,
            accounts_below_floor,
        })
    }

    // -- Persistence --------------------------------------------------------

    /// Loads every table from `db`.
    ///
    /// Fails with [`DbError::ContractMismatch`] if `db` was saved by a
    /// different contract account, since blacklist rows are scoped by it.
    pub fn load(contract: Name, db: &LedgerDB) -> Result<Self, DbError> {
        if let Some(stored) = stored_contract(db)? {
            if stored != contract {
                return Err(DbError::ContractMismatch {
                    stored,
                    requested: contract,
                });
            }
        }
        let mut state = Self::new(contract);
        db.load_table(&mut state.stats, &mut state.ram)?;
        db.load_table(&mut state.accounts, &mut state.ram)?;
        db.load_table(&mut state.locked, &mut state.ram)?;
        db.load_table(&mut state.blacklist, &mut state.ram)?;
        Ok(state)
    }

    /// Writes every table and the state root to `db` in one commit.
    pub fn save(&self, db: &LedgerDB) -> Result<String, DbError> {
        let root = self.state_root().map_err(|e| DbError::Serialization(e.to_string()))?;
        let mut staged = StagedWrite::new();
        db.stage_table(&mut staged, &self.stats)?;
        db.stage_table(&mut staged, &self.accounts)?;
        db.stage_table(&mut staged, &self.locked)?;
        db.stage_table(&mut staged, &self.blacklist)?;
        staged.set_metadata(META_STATE_ROOT, root.as_bytes().to_vec());
        staged.set_metadata(META_CONTRACT, self.contract.to_string());
        db.commit(staged)?;
        Ok(root)
    }
}

/// The contract account recorded by the last save, if any.
pub fn stored_contract(db: &LedgerDB) -> Result<Option<Name>, DbError> {
    let Some(raw) = db.get_metadata(META_CONTRACT)? else {
        return Ok(None);
    };
    let text = String::from_utf8(raw).map_err(|e| DbError::Serialization(e.to_string()))?;
    let name = text
        .parse::<Name>()
        .map_err(|e| DbError::Serialization(format!("stored contract account: {e}")))?;
    Ok(Some(name))
}

/// Result of a successful [`TokenState::audit`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditReport {
    pub supply: Asset,
    pub max_supply: Asset,
    pub issuer: Name,
    pub liquid: Asset,
    pub locked: Asset,
    pub holders: usize,
    pub lock_entries: usize,
    pub accounts_below_floor: Vec<Name>,
}

/// An accounting invariant that does not hold.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("symbol {0} is not registered")]
    Unregistered(SymbolCode),

    #[error("supply {supply} outside [0, {max_supply}]")]
    SupplyOutOfBounds { supply: Asset, max_supply: Asset },

    #[error("balance of {owner} carries a different precision than the supply")]
    ForeignSymbol { owner: Name },

    #[error("balance of {owner} is negative: {balance}")]
    NegativeBalance { owner: Name, balance: Asset },

    #[error("lock record of {owner} totals {total} but its entries disagree")]
    LockTotalMismatch { owner: Name, total: Asset },

    #[error("supply {supply} != liquid {liquid} + locked {locked} (smallest units)")]
    SupplyMismatch {
        supply: Asset,
        liquid: i128,
        locked: i128,
    },
}
