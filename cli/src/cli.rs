//! # CLI Interface
//!
//! Defines the command-line argument structure for `locktoken` using
//! `clap` derive. Every contract action has a subcommand of the same name;
//! `push` takes an action as JSON instead. The remaining subcommands are
//! read-only queries.

use chrono::{DateTime, Utc};
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

use locktoken_contracts::TokenAction;
use locktoken_protocol::{Asset, Name, Symbol, SymbolCode, TimePointSec};

use crate::logging::LogFormat;

/// Token ledger with time-locked balances.
///
/// Each invocation loads the ledger from the data directory, runs one
/// action or query, and writes the result back atomically. Output is JSON
/// on stdout; logs go to stderr.
#[derive(Parser, Debug)]
#[command(
    name = "locktoken",
    about = "Token ledger with time-locked balances",
    version,
    propagate_version = true
)]
pub struct LocktokenCli {
    /// Directory holding the ledger database. Created on first use.
    #[arg(
        long,
        short = 'd',
        global = true,
        env = "LOCKTOKEN_DATA_DIR",
        default_value = ".locktoken"
    )]
    pub data_dir: PathBuf,

    /// Account hosting the token tables. Defaults to the account recorded
    /// in the database, or "locktoken" for a new one.
    #[arg(long, global = true, env = "LOCKTOKEN_CONTRACT")]
    pub contract: Option<Name>,

    /// Log output format.
    #[arg(
        long,
        global = true,
        env = "LOCKTOKEN_LOG_FORMAT",
        value_enum,
        default_value_t = LogFormat::Pretty,
        ignore_case = true
    )]
    pub log_format: LogFormat,

    /// Raise log verbosity. Repeat for more. `RUST_LOG` takes precedence.
    #[arg(short = 'v', long = "verbose", global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Pin the action time, as Unix seconds or RFC 3339. Defaults to now.
    #[arg(long, global = true, value_parser = parse_time)]
    pub now: Option<TimePointSec>,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Accounts that authorize an action.
#[derive(Args, Debug, Clone, Default)]
pub struct AuthArgs {
    /// Signing account. Repeat for several signers.
    #[arg(long = "auth", value_name = "ACCOUNT")]
    pub auth: Vec<Name>,
}

/// Top-level subcommands for the `locktoken` binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Register a new token symbol.
    Create {
        issuer: Name,
        /// Cap, e.g. "1000000.0000 TOK". Fixes the precision.
        maximum_supply: Asset,
        #[command(flatten)]
        auth: AuthArgs,
    },
    /// Mint new supply into an account.
    Issue {
        to: Name,
        quantity: Asset,
        #[arg(long, default_value = "")]
        memo: String,
        #[command(flatten)]
        auth: AuthArgs,
    },
    /// Mint new supply with part of it locked.
    #[command(name = "issuelock")]
    IssueLock {
        to: Name,
        quantity: Asset,
        lockquantity: Asset,
        unlock_delay_sec: u32,
        #[arg(long, default_value = "")]
        memo: String,
        #[command(flatten)]
        auth: AuthArgs,
    },
    /// Burn supply from the issuer's balance.
    Retire {
        quantity: Asset,
        #[arg(long, default_value = "")]
        memo: String,
        #[command(flatten)]
        auth: AuthArgs,
    },
    /// Move liquid balance between accounts.
    Transfer {
        from: Name,
        to: Name,
        quantity: Asset,
        #[arg(long, default_value = "")]
        memo: String,
        #[command(flatten)]
        auth: AuthArgs,
    },
    /// Open a zero balance row.
    Open {
        owner: Name,
        /// Symbol as "precision,CODE", e.g. "4,TOK".
        symbol: Symbol,
        ram_payer: Name,
        #[command(flatten)]
        auth: AuthArgs,
    },
    /// Close a zero balance row.
    Close {
        owner: Name,
        symbol: Symbol,
        #[command(flatten)]
        auth: AuthArgs,
    },
    /// Lock part of a liquid balance behind a delay.
    Lock {
        owner: Name,
        quantity: Asset,
        unlock_delay_sec: u32,
        #[command(flatten)]
        auth: AuthArgs,
    },
    /// Schedule every pending lock entry for release.
    Unlock {
        owner: Name,
        sym_code: SymbolCode,
        #[command(flatten)]
        auth: AuthArgs,
    },
    /// Release matured lock entries. Needs no signer.
    #[command(name = "dounlock")]
    DoUnlock {
        owner: Name,
        sym_code: SymbolCode,
        #[command(flatten)]
        auth: AuthArgs,
    },
    /// Set a minimum balance for an account.
    #[command(name = "blacklistadd")]
    BlacklistAdd {
        account: Name,
        /// Floor, e.g. "10.0000 TOK".
        #[arg(allow_hyphen_values = true)]
        token_min: Asset,
        #[command(flatten)]
        auth: AuthArgs,
    },
    /// Remove an account's minimum balance.
    #[command(name = "blacklistrm")]
    BlacklistRm {
        account: Name,
        #[command(flatten)]
        auth: AuthArgs,
    },
    /// Execute an action given as JSON, e.g. '{"action":"open",...}'.
    Push {
        json: String,
        #[command(flatten)]
        auth: AuthArgs,
    },
    /// Print the supply record of a symbol.
    Supply { sym_code: SymbolCode },
    /// Print an account's liquid balance.
    Balance { owner: Name, sym_code: SymbolCode },
    /// Print an account's locked record.
    Locked { owner: Name, sym_code: SymbolCode },
    /// Print an account's blacklist row, or every row without an account.
    Blacklist { account: Option<Name> },
    /// Check the accounting invariants of a symbol.
    Audit { sym_code: SymbolCode },
    /// Summarize the ledger: symbols, state root and storage usage.
    Status,
    /// Print version information and exit.
    Version,
}

impl Commands {
    /// The contract action and signers this command stands for, or `None`
    /// for queries and `push`.
    pub fn to_action(&self) -> Option<(TokenAction, Vec<Name>)> {
        let (action, auth) = match self {
            Self::Create {
                issuer,
                maximum_supply,
                auth,
            } => (
                TokenAction::Create {
                    issuer: *issuer,
                    maximum_supply: *maximum_supply,
                },
                auth,
            ),
            Self::Issue {
                to,
                quantity,
                memo,
                auth,
            } => (
                TokenAction::Issue {
                    to: *to,
                    quantity: *quantity,
                    memo: memo.clone(),
                },
                auth,
            ),
            Self::IssueLock {
                to,
                quantity,
                lockquantity,
                unlock_delay_sec,
                memo,
                auth,
            } => (
                TokenAction::IssueLock {
                    to: *to,
                    quantity: *quantity,
                    memo: memo.clone(),
                    lockquantity: *lockquantity,
                    unlock_delay_sec: *unlock_delay_sec,
                },
                auth,
            ),
            Self::Retire {
                quantity,
                memo,
                auth,
            } => (
                TokenAction::Retire {
                    quantity: *quantity,
                    memo: memo.clone(),
                },
                auth,
            ),
            Self::Transfer {
                from,
                to,
                quantity,
                memo,
                auth,
            } => (
                TokenAction::Transfer {
                    from: *from,
                    to: *to,
                    quantity: *quantity,
                    memo: memo.clone(),
                },
                auth,
            ),
            Self::Open {
                owner,
                symbol,
                ram_payer,
                auth,
            } => (
                TokenAction::Open {
                    owner: *owner,
                    symbol: *symbol,
                    ram_payer: *ram_payer,
                },
                auth,
            ),
            Self::Close {
                owner,
                symbol,
                auth,
            } => (
                TokenAction::Close {
                    owner: *owner,
                    symbol: *symbol,
                },
                auth,
            ),
            Self::Lock {
                owner,
                quantity,
                unlock_delay_sec,
                auth,
            } => (
                TokenAction::Lock {
                    owner: *owner,
                    quantity: *quantity,
                    unlock_delay_sec: *unlock_delay_sec,
                },
                auth,
            ),
            Self::Unlock {
                owner,
                sym_code,
                auth,
            } => (
                TokenAction::Unlock {
                    owner: *owner,
                    sym_code: *sym_code,
                },
                auth,
            ),
            Self::DoUnlock {
                owner,
                sym_code,
                auth,
            } => (
                TokenAction::DoUnlock {
                    owner: *owner,
                    sym_code: *sym_code,
                },
                auth,
            ),
            Self::BlacklistAdd {
                account,
                token_min,
                auth,
            } => (
                TokenAction::BlacklistAdd {
                    account: *account,
                    token_min: *token_min,
                },
                auth,
            ),
            Self::BlacklistRm { account, auth } => {
                (TokenAction::BlacklistRm { account: *account }, auth)
            }
            _ => return None,
        };
        Some((action, auth.auth.clone()))
    }
}

/// Parses `--now` as Unix seconds or an RFC 3339 timestamp.
pub fn parse_time(s: &str) -> Result<TimePointSec, String> {
    if let Ok(secs) = s.parse::<u32>() {
        return Ok(TimePointSec::from_secs(secs));
    }
    DateTime::parse_from_rfc3339(s)
        .map(|dt| TimePointSec::from_datetime(dt.with_timezone(&Utc)))
        .map_err(|e| format!("expected Unix seconds or RFC 3339 time: {e}"))
}
