//! # Issuance Registry
//!
//! Per-symbol supply records and the actions that move supply:
//!
//! - `create` registers a symbol with its cap and issuer.
//! - `issue` mints into any account.
//! - `issuelock` mints with part of the amount going straight into a
//!   pending lock entry.
//! - `retire` burns from the issuer's own balance.
//!
//! Supply always equals the sum of liquid and locked balances of the
//! symbol, and never exceeds `max_supply`.

use locktoken_protocol::{Asset, Name};

use crate::action::TokenEvent;
use crate::context::Invocation;
use crate::error::{TokenError, TokenResult};
use crate::ledger::{add_balance, ensure_positive, ensure_precision, sub_balance};
use crate::tables::CurrencyStats;
use crate::timelock::lock_into;

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

/// Registers a new symbol. Requires the contract account's authority.
///
/// # Errors
///
/// - [`TokenError::InvalidAmount`] if the cap is out of range or not positive.
/// - [`TokenError::AlreadyExists`] if the symbol code is taken, whatever
///   its precision.
pub(crate) fn create(
    cx: &mut Invocation<'_>,
    issuer: Name,
    maximum_supply: Asset,
) -> TokenResult<()> {
    let contract = cx.config.contract;
    cx.require_auth(contract)?;
    ensure_positive(&maximum_supply, "maximum supply")?;

    let code = maximum_supply.symbol.code();
    if cx.state.stats.contains(code.raw(), code.raw()) {
        return Err(TokenError::AlreadyExists(format!(
            "token with symbol {code} already exists"
        )));
    }

    cx.state.stats.insert(
        &mut cx.state.ram,
        code.raw(),
        code.raw(),
        contract,
        CurrencyStats {
            supply: Asset::zero(maximum_supply.symbol),
            max_supply: maximum_supply,
            issuer,
        },
    )?;
    cx.emit(TokenEvent::Created {
        issuer,
        maximum_supply,
    });
    Ok(())
}

// ---------------------------------------------------------------------------
// Issue
// ---------------------------------------------------------------------------

/// Validates an issuance of `quantity` and raises the supply. Returns the
/// issuer.
fn mint(cx: &mut Invocation<'_>, quantity: Asset, memo: &str) -> TokenResult<Name> {
    let code = quantity.symbol.code();
    let stats = cx.state.get_stats(code)?;
    let issuer = stats.issuer;
    let supply = stats.supply;
    let max_supply = stats.max_supply;
    cx.require_auth(issuer)?;

    ensure_positive(&quantity, "quantity")?;
    ensure_precision(supply.symbol, quantity.symbol)?;
    cx.check_memo(memo)?;

    let updated = supply.checked_add(&quantity)?;
    if updated.amount > max_supply.amount {
        return Err(TokenError::SupplyExceeded {
            quantity,
            supply,
            max_supply,
        });
    }

    cx.state
        .stats
        .modify(&mut cx.state.ram, code.raw(), code.raw(), |s| s.supply = updated)?;
    Ok(issuer)
}

/// Mints `quantity` into `to`. The issuer pays for a newly opened row.
pub(crate) fn issue(
    cx: &mut Invocation<'_>,
    to: Name,
    quantity: Asset,
    memo: String,
) -> TokenResult<()> {
    let issuer = mint(cx, quantity, &memo)?;
    add_balance(cx.state, to, quantity, issuer)?;
    cx.emit(TokenEvent::Issued {
        issuer,
        to,
        quantity,
        memo,
    });
    Ok(())
}

/// Mints `quantity` into `to`, of which `lockquantity` lands in a new
/// pending lock entry and the rest in the liquid balance.
pub(crate) fn issuelock(
    cx: &mut Invocation<'_>,
    to: Name,
    quantity: Asset,
    memo: String,
    lockquantity: Asset,
    unlock_delay_sec: u32,
) -> TokenResult<()> {
    if lockquantity.symbol != quantity.symbol {
        return Err(TokenError::InvalidAmount(format!(
            "lock quantity {lockquantity} does not match issue quantity {quantity}"
        )));
    }
    ensure_positive(&lockquantity, "lock quantity")?;
    if lockquantity.amount > quantity.amount {
        return Err(TokenError::InvalidAmount(format!(
            "lock quantity {lockquantity} exceeds issue quantity {quantity}"
        )));
    }

    let issuer = mint(cx, quantity, &memo)?;
    let liquid = quantity.checked_sub(&lockquantity)?;
    if liquid.is_positive() {
        add_balance(cx.state, to, liquid, issuer)?;
    }
    lock_into(cx.state, to, lockquantity, unlock_delay_sec, issuer)?;

    cx.emit(TokenEvent::Issued {
        issuer,
        to,
        quantity,
        memo,
    });
    cx.emit(TokenEvent::Locked {
        owner: to,
        quantity: lockquantity,
        unlock_delay_sec,
    });
    Ok(())
}

// ---------------------------------------------------------------------------
// Retire
// ---------------------------------------------------------------------------

/// Burns `quantity` from the issuer's liquid balance.
///
/// # Errors
///
/// Same validation as [`issue`], plus [`TokenError::InsufficientBalance`]
/// when the issuer holds too little (a blacklist floor on the issuer
/// applies like on any other account).
pub(crate) fn retire(cx: &mut Invocation<'_>, quantity: Asset, memo: String) -> TokenResult<()> {
    let code = quantity.symbol.code();
    let stats = cx.state.get_stats(code)?;
    let issuer = stats.issuer;
    let supply = stats.supply;
    cx.require_auth(issuer)?;

    ensure_positive(&quantity, "quantity")?;
    ensure_precision(supply.symbol, quantity.symbol)?;
    cx.check_memo(&memo)?;

    sub_balance(cx.state, issuer, quantity)?;
    let updated = supply.checked_sub(&quantity)?;
    if updated.amount < 0 {
        return Err(TokenError::Overflow(format!(
            "retiring {quantity} exceeds supply {supply}"
        )));
    }
    cx.state
        .stats
        .modify(&mut cx.state.ram, code.raw(), code.raw(), |s| s.supply = updated)?;

    cx.emit(TokenEvent::Retired {
        issuer,
        quantity,
        memo,
    });
    Ok(())
}
