//! # Actions and Events
//!
//! [`TokenAction`] is the wire form of an invocation: one variant per
//! operation, tagged by its action name so a JSON payload reads like
//! `{"action":"transfer","from":"alice",...}`.
//!
//! [`TokenEvent`] is what a committed action reports. Each event knows
//! which accounts must be notified.

use serde::{Deserialize, Serialize};

use locktoken_protocol::{Asset, Name, Symbol, SymbolCode, TimePointSec};

/// One invocation of the token contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum TokenAction {
    Create {
        issuer: Name,
        maximum_supply: Asset,
    },
    Issue {
        to: Name,
        quantity: Asset,
        #[serde(default)]
        memo: String,
    },
    IssueLock {
        to: Name,
        quantity: Asset,
        #[serde(default)]
        memo: String,
        lockquantity: Asset,
        unlock_delay_sec: u32,
    },
    Retire {
        quantity: Asset,
        #[serde(default)]
        memo: String,
    },
    Transfer {
        from: Name,
        to: Name,
        quantity: Asset,
        #[serde(default)]
        memo: String,
    },
    Open {
        owner: Name,
        symbol: Symbol,
        ram_payer: Name,
    },
    Close {
        owner: Name,
        symbol: Symbol,
    },
    Lock {
        owner: Name,
        quantity: Asset,
        unlock_delay_sec: u32,
    },
    Unlock {
        owner: Name,
        sym_code: SymbolCode,
    },
    DoUnlock {
        owner: Name,
        sym_code: SymbolCode,
    },
    BlacklistAdd {
        account: Name,
        token_min: Asset,
    },
    BlacklistRm {
        account: Name,
    },
}

impl TokenAction {
    /// The action name as it appears on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::Issue { .. } => "issue",
            Self::IssueLock { .. } => "issuelock",
            Self::Retire { .. } => "retire",
            Self::Transfer { .. } => "transfer",
            Self::Open { .. } => "open",
            Self::Close { .. } => "close",
            Self::Lock { .. } => "lock",
            Self::Unlock { .. } => "unlock",
            Self::DoUnlock { .. } => "dounlock",
            Self::BlacklistAdd { .. } => "blacklistadd",
            Self::BlacklistRm { .. } => "blacklistrm",
        }
    }
}

/// Something a committed action did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TokenEvent {
    Created {
        issuer: Name,
        maximum_supply: Asset,
    },
    Issued {
        issuer: Name,
        to: Name,
        quantity: Asset,
        memo: String,
    },
    Retired {
        issuer: Name,
        quantity: Asset,
        memo: String,
    },
    Transferred {
        from: Name,
        to: Name,
        quantity: Asset,
        memo: String,
    },
    Opened {
        owner: Name,
        symbol: Symbol,
        ram_payer: Name,
    },
    Closed {
        owner: Name,
        symbol: Symbol,
    },
    Locked {
        owner: Name,
        quantity: Asset,
        unlock_delay_sec: u32,
    },
    UnlockScheduled {
        owner: Name,
        quantity: Asset,
        entries: usize,
        requested_at: TimePointSec,
    },
    Unlocked {
        owner: Name,
        quantity: Asset,
        entries: usize,
    },
    Blacklisted {
        account: Name,
        token_min: Asset,
    },
    Unblacklisted {
        account: Name,
        tokens_blocked: Asset,
    },
}

impl TokenEvent {
    /// Accounts to notify, without duplicates, acting account first.
    pub fn recipients(&self) -> Vec<Name> {
        let mut out = match self {
            Self::Created { issuer, .. } => vec![*issuer],
            Self::Issued { issuer, to, .. } => vec![*issuer, *to],
            Self::Retired { issuer, .. } => vec![*issuer],
            Self::Transferred { from, to, .. } => vec![*from, *to],
            Self::Opened {
                owner, ram_payer, ..
            } => vec![*ram_payer, *owner],
            Self::Closed { owner, .. } => vec![*owner],
            Self::Locked { owner, .. }
            | Self::UnlockScheduled { owner, .. }
            | Self::Unlocked { owner, .. } => vec![*owner],
            Self::Blacklisted { account, .. } | Self::Unblacklisted { account, .. } => {
                vec![*account]
            }
        };
        out.dedup();
        out
    }
}

/// Outcome of a committed action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionReceipt {
    pub action: &'static str,
    pub executed_at: TimePointSec,
    pub events: Vec<TokenEvent>,
}
