// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # LockToken CLI
//!
//! Entry point for the `locktoken` binary. Parses CLI arguments,
//! initializes logging, loads the ledger from its sled database, runs one
//! action or query, and prints the result as JSON.
//!
//! Mutating commands are all-or-nothing: a rejected action leaves the
//! database untouched, a committed one is written back in a single sled
//! transaction together with the new state root.

mod cli;
mod logging;

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde_json::{json, Map, Value};

use locktoken_contracts::{
    stored_contract, ContractConfig, LogNotifier, Signers, TokenAction, TokenContract, TokenState,
    META_STATE_ROOT,
};
use locktoken_protocol::config::DEFAULT_CONTRACT_ACCOUNT;
use locktoken_protocol::storage::LedgerDB;
use locktoken_protocol::{Clock, ManualClock, Name, SystemClock, TimePointSec};

use cli::{Commands, LocktokenCli};

fn main() -> Result<()> {
    let cli = LocktokenCli::parse();

    if let Commands::Version = cli.command {
        print_version();
        return Ok(());
    }

    logging::init_logging(&logging::default_filter(cli.verbose), cli.log_format)?;

    let output = run(cli)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Executes one parsed command against the ledger in `cli.data_dir`.
fn run(cli: LocktokenCli) -> Result<Value> {
    let db_path = cli.data_dir.join("db");
    std::fs::create_dir_all(&db_path)
        .with_context(|| format!("failed to create database directory: {}", db_path.display()))?;
    let db = LedgerDB::open(&db_path)
        .with_context(|| format!("failed to open database at {}", db_path.display()))?;

    let contract = match cli.contract {
        Some(contract) => contract,
        None => stored_contract(&db)
            .context("failed to read contract account")?
            .unwrap_or(DEFAULT_CONTRACT_ACCOUNT),
    };
    let state = TokenState::load(contract, &db).context("failed to load ledger state")?;
    let now = cli.now.unwrap_or_else(|| SystemClock.now());
    tracing::debug!(
        path = %db_path.display(),
        %contract,
        %now,
        "ledger loaded"
    );

    match cli.command {
        Commands::Push { json, auth } => {
            let action: TokenAction =
                serde_json::from_str(&json).context("invalid action JSON")?;
            execute(&db, state, contract, now, action, auth.auth)
        }
        Commands::Supply { sym_code } => Ok(json!(state.get_stats(sym_code)?)),
        Commands::Balance { owner, sym_code } => Ok(json!({
            "owner": owner,
            "balance": state.get_balance(owner, sym_code)?,
        })),
        Commands::Locked { owner, sym_code } => Ok(json!(state.get_locked(owner, sym_code)?)),
        Commands::Blacklist { account: Some(account) } => Ok(json!(state.get_blacklist(account))),
        Commands::Blacklist { account: None } => Ok(json!(state.blacklisted())),
        Commands::Audit { sym_code } => {
            let report = state
                .audit(sym_code)
                .with_context(|| format!("audit of {sym_code} failed"))?;
            Ok(json!(report))
        }
        Commands::Status => status(&db, &state),
        Commands::Version => Ok(json!({ "version": env!("CARGO_PKG_VERSION") })),
        other => match other.to_action() {
            Some((action, signers)) => execute(&db, state, contract, now, action, signers),
            None => bail!("unsupported command"),
        },
    }
}

/// Runs `action` at `now` and persists the result.
fn execute(
    db: &LedgerDB,
    state: TokenState,
    contract: Name,
    now: TimePointSec,
    action: TokenAction,
    signers: Vec<Name>,
) -> Result<Value> {
    let name = action.name();
    let signers: Signers = signers.into_iter().collect();
    let mut token = TokenContract::with_state(
        ContractConfig::with_contract(contract),
        state,
        ManualClock::new(now),
        LogNotifier,
    );

    let receipt = token
        .execute(&signers, action)
        .with_context(|| format!("{name} rejected"))?;
    let state_root = token
        .state()
        .save(db)
        .context("failed to persist ledger state")?;

    Ok(json!({
        "receipt": receipt,
        "state_root": state_root,
    }))
}

/// Registered symbols, state root and storage usage.
fn status(db: &LedgerDB, state: &TokenState) -> Result<Value> {
    let mut symbols = Vec::new();
    for code in state.symbols() {
        let stats = state.get_stats(code)?;
        symbols.push(json!({
            "symbol": stats.supply.symbol,
            "supply": stats.supply,
            "max_supply": stats.max_supply,
            "issuer": stats.issuer,
        }));
    }

    let ram: Map<String, Value> = state
        .ram_by_payer()
        .into_iter()
        .map(|(payer, bytes)| (payer.to_string(), json!(bytes)))
        .collect();

    let stored_root = db
        .get_metadata(META_STATE_ROOT)?
        .map(|raw| String::from_utf8_lossy(&raw).into_owned());

    Ok(json!({
        "contract": state.contract(),
        "protocol_version": locktoken_protocol::config::PROTOCOL_VERSION,
        "symbols": symbols,
        "state_root": state.state_root()?,
        "stored_state_root": stored_root,
        "ram": ram,
    }))
}

/// Prints version information to stdout.
fn print_version() {
    println!("locktoken {}", env!("CARGO_PKG_VERSION"));
    println!("protocol  {}", locktoken_protocol::config::PROTOCOL_VERSION);
}
