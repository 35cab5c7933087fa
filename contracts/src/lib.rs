//! # LockToken Contracts
//!
//! A fungible-token ledger with time-locked balances and an
//! issuer-controlled blacklist:
//!
//! - **Issuance**: symbols are created with a cap, minted by their issuer
//!   (optionally straight into a lock) and retired from the issuer's own
//!   balance.
//! - **Balance Ledger**: liquid balances per owner and symbol, with
//!   transfer, open and close.
//! - **Time Locks**: owners freeze part of their balance behind a delay,
//!   schedule the release with `unlock` and collect it with `dounlock`.
//! - **Blacklist**: a per-account minimum balance that every debit honors.
//!
//! ## Design Principles
//!
//! 1. Amounts are checked on every operation: `checked_add`/`checked_sub`
//!    against the asset range, never wrapping arithmetic.
//! 2. An action either commits all of its writes or none of them; see
//!    [`TokenContract::execute`].
//! 3. `supply == Σ liquid + Σ locked` holds after every committed action
//!    and can be verified with [`TokenState::audit`].
//! 4. Actions, events and rows are serde types, so the same values travel
//!    over JSON and into storage.

pub mod action;
mod blacklist;
pub mod context;
pub mod error;
mod issuance;
mod ledger;
pub mod state;
pub mod tables;
mod timelock;
pub mod token;

pub use action::{ActionReceipt, TokenAction, TokenEvent};
pub use context::{Authority, ContractConfig, LogNotifier, Notifier, RecordingNotifier, Signers};
pub use error::{TokenError, TokenResult};
pub use state::{
    stored_contract, AuditReport, InvariantViolation, TokenState, META_CONTRACT, META_STATE_ROOT,
};
pub use tables::{Account, BlacklistRow, CurrencyStats, LockEntry, LockedAccount};
pub use token::TokenContract;
