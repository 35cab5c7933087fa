//! Errors raised by token actions.
//!
//! Every variant is a precondition failure: the action aborts and none of
//! its writes are committed.

use locktoken_protocol::storage::TableError;
use locktoken_protocol::{Asset, AssetError, Name, SymbolCode};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TokenError {
    /// Non-positive, out-of-range, or otherwise unusable quantity.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// A referenced stat, balance, lock, or blacklist row does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("supply exceeded: issuing {quantity} on top of {supply} breaks max supply {max_supply}")]
    SupplyExceeded {
        quantity: Asset,
        supply: Asset,
        max_supply: Asset,
    },

    /// The debit would leave the balance below zero or below the
    /// account's blacklist floor.
    #[error("insufficient balance: {owner} holds {balance}, cannot release {requested} without dropping below {floor}")]
    InsufficientBalance {
        owner: Name,
        balance: Asset,
        requested: Asset,
        floor: Asset,
    },

    #[error("cannot close {owner}: balance is {balance}")]
    NonZeroBalance { owner: Name, balance: Asset },

    #[error("cannot transfer to self: {0}")]
    SameAccount(Name),

    #[error("symbol mismatch: {0}")]
    SymbolMismatch(String),

    #[error("nothing to unlock for {owner} in {symbol}")]
    NothingToUnlock { owner: Name, symbol: SymbolCode },

    #[error("missing authority of {0}")]
    MissingAuthority(Name),

    #[error("memo has {len} bytes, limit is {max}")]
    MemoTooLong { len: usize, max: usize },

    /// Arithmetic left the representable range.
    #[error("overflow: {0}")]
    Overflow(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl From<AssetError> for TokenError {
    fn from(err: AssetError) -> Self {
        match err {
            AssetError::SymbolMismatch { .. } => TokenError::SymbolMismatch(err.to_string()),
            AssetError::OutOfRange(_) => TokenError::Overflow(err.to_string()),
            AssetError::Symbol(_) | AssetError::Malformed(_) => {
                TokenError::InvalidAmount(err.to_string())
            }
        }
    }
}

impl From<TableError> for TokenError {
    fn from(err: TableError) -> Self {
        match err {
            TableError::NotFound { .. } => TokenError::NotFound(err.to_string()),
            TableError::AlreadyExists { .. } => TokenError::AlreadyExists(err.to_string()),
            TableError::Encoding { .. } => TokenError::Storage(err.to_string()),
        }
    }
}

pub type TokenResult<T> = Result<T, TokenError>;
