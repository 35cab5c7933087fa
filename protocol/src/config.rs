//! # Protocol Configuration & Constants
//!
//! Every magic number in locktoken lives here. If you're hardcoding a
//! constant somewhere else, move it here.
//!
//! Asset limits and table names are part of the persisted format: changing
//! them after data has been written means a migration, not a config tweak.

use crate::name::Name;

// ---------------------------------------------------------------------------
// Protocol Version
// ---------------------------------------------------------------------------

/// The full version string of the ledger format.
pub const PROTOCOL_VERSION: &str = "0.1.0";

/// Account that hosts the token tables and holds `create` authority
/// unless overridden.
pub const DEFAULT_CONTRACT_ACCOUNT: Name = Name::constant("locktoken");

// ---------------------------------------------------------------------------
// Names, Symbols, Assets
// ---------------------------------------------------------------------------

/// 12 characters of 5 bits plus one of 4 bits.
pub const MAX_NAME_LEN: usize = 13;

/// A packed symbol is `code << 8 | precision`, so the code gets seven of
/// the eight bytes.
pub const MAX_SYMBOL_CODE_LEN: usize = 7;

/// `10^18` is the largest power of ten that fits in an `i64`.
pub const MAX_PRECISION: u8 = 18;

/// Largest magnitude an asset amount may take: `2^62 - 1`.
///
/// Leaving two bits of headroom means the sum of any two valid amounts
/// never overflows `i64`, so range checks happen after the add.
pub const MAX_ASSET_AMOUNT: i64 = (1 << 62) - 1;

/// Maximum memo length in bytes on issue, retire and transfer.
pub const MAX_MEMO_BYTES: usize = 256;

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

/// Fixed cost charged to the ram payer for every stored row, on top of the
/// row's encoded size. Covers primary index bookkeeping.
pub const ROW_OVERHEAD_BYTES: u64 = 112;

/// Per-symbol supply records.
pub const STAT_TABLE: &str = "stat";

/// Per-owner liquid balances.
pub const ACCOUNTS_TABLE: &str = "accounts";

/// Per-owner time-locked balances.
pub const LOCKED_TABLE: &str = "locked";

/// Contract-wide blacklist floors.
pub const BLACKLIST_TABLE: &str = "blacklist";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_range_leaves_headroom_for_addition() {
        assert!(MAX_ASSET_AMOUNT.checked_add(MAX_ASSET_AMOUNT).is_some());
        assert!((-MAX_ASSET_AMOUNT).checked_sub(MAX_ASSET_AMOUNT).is_some());
    }

    #[test]
    fn max_precision_fits_i64() {
        assert!(10i64.checked_pow(u32::from(MAX_PRECISION)).is_some());
        assert!(10i64.checked_pow(u32::from(MAX_PRECISION) + 1).is_none());
    }

    #[test]
    fn table_names_are_distinct() {
        let names = [STAT_TABLE, ACCOUNTS_TABLE, LOCKED_TABLE, BLACKLIST_TABLE];
        for (i, a) in names.iter().enumerate() {
            for b in &names[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn default_contract_account_round_trips() {
        assert_eq!(DEFAULT_CONTRACT_ACCOUNT.to_string(), "locktoken");
    }
}
