//! # Balance Ledger
//!
//! Liquid balances per owner and symbol, and the two primitives every
//! other module moves money through:
//!
//! - [`sub_balance`] debits, refusing to cross the owner's floor (zero, or
//!   the blacklist floor from [`crate::blacklist::floor_for`]).
//! - [`add_balance`] credits, creating the row on first use and charging
//!   its storage to the given ram payer.
//!
//! Both are keyed by the asset's symbol code and reject a precision that
//! disagrees with the stored balance.

use locktoken_protocol::{Asset, Name, Symbol};

use crate::action::TokenEvent;
use crate::blacklist::floor_for;
use crate::context::Invocation;
use crate::error::{TokenError, TokenResult};
use crate::state::TokenState;
use crate::tables::Account;

/// Debits `value` from `owner`'s liquid balance.
pub(crate) fn sub_balance(state: &mut TokenState, owner: Name, value: Asset) -> TokenResult<()> {
    let code = value.symbol.code();
    let balance = state
        .accounts
        .find(owner.raw(), code.raw())
        .map(|a| a.balance)
        .ok_or_else(|| TokenError::NotFound(format!("no balance object found for {owner} in {code}")))?;

    if balance.symbol != value.symbol {
        return Err(TokenError::SymbolMismatch(format!(
            "balance of {owner} is {}, debit is {}",
            balance.symbol, value.symbol
        )));
    }

    let floor = floor_for(state, owner, value.symbol);
    let remaining = balance.checked_sub(&value)?;
    if remaining.amount < floor.amount {
        return Err(TokenError::InsufficientBalance {
            owner,
            balance,
            requested: value,
            floor,
        });
    }

    state
        .accounts
        .modify_with_payer(&mut state.ram, owner.raw(), code.raw(), owner, |a| {
            a.balance = remaining;
        })?;
    tracing::debug!(%owner, debit = %value, balance = %remaining, "sub_balance");
    Ok(())
}

/// Credits `value` to `owner`, opening the row at `ram_payer`'s expense
/// if it does not exist yet.
pub(crate) fn add_balance(
    state: &mut TokenState,
    owner: Name,
    value: Asset,
    ram_payer: Name,
) -> TokenResult<()> {
    let code = value.symbol.code();
    let existing = state.accounts.find(owner.raw(), code.raw()).map(|a| a.balance);
    let balance = match existing {
        None => {
            state.accounts.insert(
                &mut state.ram,
                owner.raw(),
                code.raw(),
                ram_payer,
                Account { balance: value },
            )?;
            value
        }
        Some(current) => {
            let updated = current.checked_add(&value)?;
            state
                .accounts
                .modify(&mut state.ram, owner.raw(), code.raw(), |a| a.balance = updated)?;
            updated
        }
    };
    tracing::debug!(%owner, credit = %value, %balance, "add_balance");
    Ok(())
}

/// Rejects quantities that are out of range or not strictly positive.
pub(crate) fn ensure_positive(quantity: &Asset, what: &str) -> TokenResult<()> {
    if !quantity.is_valid() {
        return Err(TokenError::InvalidAmount(format!("invalid {what}: {quantity}")));
    }
    if !quantity.is_positive() {
        return Err(TokenError::InvalidAmount(format!("{what} must be positive, got {quantity}")));
    }
    Ok(())
}

/// Rejects a symbol whose precision disagrees with the registered one.
pub(crate) fn ensure_precision(registered: Symbol, given: Symbol) -> TokenResult<()> {
    if registered != given {
        return Err(TokenError::SymbolMismatch(format!(
            "symbol precision mismatch: token is {registered}, got {given}"
        )));
    }
    Ok(())
}

pub(crate) fn transfer(
    cx: &mut Invocation<'_>,
    from: Name,
    to: Name,
    quantity: Asset,
    memo: String,
) -> TokenResult<()> {
    cx.require_auth(from)?;
    if from == to {
        return Err(TokenError::SameAccount(from));
    }

    let code = quantity.symbol.code();
    let registered = cx
        .state
        .get_stats(code)
        .map_err(|_| TokenError::SymbolMismatch(format!("no token registered for symbol {code}")))?
        .supply
        .symbol;

    ensure_positive(&quantity, "quantity")?;
    ensure_precision(registered, quantity.symbol)?;
    cx.check_memo(&memo)?;

    sub_balance(cx.state, from, quantity)?;
    add_balance(cx.state, to, quantity, from)?;

    cx.emit(TokenEvent::Transferred {
        from,
        to,
        quantity,
        memo,
    });
    Ok(())
}

/// Opens a zero balance row. Opening an existing row is a no-op.
pub(crate) fn open(
    cx: &mut Invocation<'_>,
    owner: Name,
    symbol: Symbol,
    ram_payer: Name,
) -> TokenResult<()> {
    cx.require_auth(ram_payer)?;

    let code = symbol.code();
    let registered = cx.state.get_stats(code)?.supply.symbol;
    ensure_precision(registered, symbol)?;

    if cx.state.accounts.contains(owner.raw(), code.raw()) {
        tracing::debug!(%owner, %symbol, "open: balance row already present");
        return Ok(());
    }

    cx.state.accounts.insert(
        &mut cx.state.ram,
        owner.raw(),
        code.raw(),
        ram_payer,
        Account {
            balance: Asset::zero(symbol),
        },
    )?;
    cx.emit(TokenEvent::Opened {
        owner,
        symbol,
        ram_payer,
    });
    Ok(())
}

/// Deletes a zero balance row and refunds its storage.
pub(crate) fn close(cx: &mut Invocation<'_>, owner: Name, symbol: Symbol) -> TokenResult<()> {
    cx.require_auth(owner)?;

    let code = symbol.code();
    let balance = cx.state.get_balance(owner, code).map_err(|_| {
        TokenError::NotFound(format!(
            "balance row of {owner} in {code} already deleted or never existed"
        ))
    })?;
    if !balance.is_zero() {
        return Err(TokenError::NonZeroBalance { owner, balance });
    }

    cx.state
        .accounts
        .erase(&mut cx.state.ram, owner.raw(), code.raw())?;
    cx.emit(TokenEvent::Closed { owner, symbol });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use locktoken_protocol::config::ROW_OVERHEAD_BYTES;

    fn name(s: &str) -> Name {
        s.parse().unwrap()
    }

    fn tok(s: &str) -> Asset {
        s.parse().unwrap()
    }

    fn state() -> TokenState {
        TokenState::new(name("locktoken"))
    }

    #[test]
    fn add_balance_opens_row_at_payer_expense() {
        let mut st = state();
        add_balance(&mut st, name("alice"), tok("5.0000 TOK"), name("issuer")).unwrap();
        assert_eq!(
            st.get_balance(name("alice"), tok("1.0000 TOK").symbol.code()).unwrap(),
            tok("5.0000 TOK")
        );
        assert!(st.ram_usage(name("issuer")) > ROW_OVERHEAD_BYTES);
        assert_eq!(st.ram_usage(name("alice")), 0);
    }

    #[test]
    fn add_balance_accumulates() {
        let mut st = state();
        add_balance(&mut st, name("alice"), tok("5.0000 TOK"), name("alice")).unwrap();
        add_balance(&mut st, name("alice"), tok("2.5000 TOK"), name("bob")).unwrap();
        let code = tok("0.0000 TOK").symbol.code();
        assert_eq!(st.get_balance(name("alice"), code).unwrap(), tok("7.5000 TOK"));
    }

    #[test]
    fn sub_balance_requires_row_and_funds() {
        let mut st = state();
        assert!(matches!(
            sub_balance(&mut st, name("alice"), tok("1.0000 TOK")),
            Err(TokenError::NotFound(_))
        ));
        add_balance(&mut st, name("alice"), tok("1.0000 TOK"), name("alice")).unwrap();
        assert!(matches!(
            sub_balance(&mut st, name("alice"), tok("1.0001 TOK")),
            Err(TokenError::InsufficientBalance { .. })
        ));
        sub_balance(&mut st, name("alice"), tok("1.0000 TOK")).unwrap();
        let code = tok("0.0000 TOK").symbol.code();
        assert!(st.get_balance(name("alice"), code).unwrap().is_zero());
    }

    #[test]
    fn sub_balance_rejects_precision_mismatch() {
        let mut st = state();
        add_balance(&mut st, name("alice"), tok("1.0000 TOK"), name("alice")).unwrap();
        assert!(matches!(
            sub_balance(&mut st, name("alice"), tok("1.00 TOK")),
            Err(TokenError::SymbolMismatch(_))
        ));
    }

    #[test]
    fn ensure_positive_rejects_zero_and_negative() {
        assert!(ensure_positive(&tok("0.0000 TOK"), "quantity").is_err());
        assert!(ensure_positive(&tok("-1.0000 TOK"), "quantity").is_err());
        assert!(ensure_positive(&tok("0.0001 TOK"), "quantity").is_ok());
    }
}
