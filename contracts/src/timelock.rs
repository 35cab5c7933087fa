//! # Time-Lock Ledger
//!
//! Moves part of a liquid balance into lock entries that can only come
//! back after a delay:
//!
//! ```text
//!   lock ──▶ pending ──unlock──▶ scheduled ──dounlock (execute <= now)──▶ released
//! ```
//!
//! `unlock` stamps every pending entry with `request = now` and
//! `execute = now + delay`. `dounlock` is a permissionless sweep that
//! releases whatever has matured and credits it back to the owner. A sweep
//! that finds nothing matured succeeds without touching state.

use locktoken_protocol::{Asset, Name, SymbolCode};

use crate::action::TokenEvent;
use crate::context::Invocation;
use crate::error::{TokenError, TokenResult};
use crate::ledger::{add_balance, ensure_positive, ensure_precision, sub_balance};
use crate::state::TokenState;
use crate::tables::{LockEntry, LockedAccount};

/// Appends a pending entry of `quantity` to `owner`'s locked record,
/// creating the record at `payer`'s expense on first use.
pub(crate) fn lock_into(
    state: &mut TokenState,
    owner: Name,
    quantity: Asset,
    unlock_delay_sec: u32,
    payer: Name,
) -> TokenResult<()> {
    let code = quantity.symbol.code();
    let entry = LockEntry::pending(quantity, unlock_delay_sec);

    let existing = state.locked.find(owner.raw(), code.raw()).map(|r| r.total_balance);
    match existing {
        None => {
            state.locked.insert(
                &mut state.ram,
                owner.raw(),
                code.raw(),
                payer,
                LockedAccount {
                    total_balance: quantity,
                    entries: vec![entry],
                },
            )?;
        }
        Some(total) => {
            let total = total.checked_add(&quantity)?;
            state
                .locked
                .modify(&mut state.ram, owner.raw(), code.raw(), |r| {
                    r.total_balance = total;
                    r.entries.push(entry);
                })?;
        }
    }
    tracing::debug!(%owner, %quantity, unlock_delay_sec, "lock entry appended");
    Ok(())
}

pub(crate) fn lock(
    cx: &mut Invocation<'_>,
    owner: Name,
    quantity: Asset,
    unlock_delay_sec: u32,
) -> TokenResult<()> {
    cx.require_auth(owner)?;
    ensure_positive(&quantity, "quantity")?;

    let code = quantity.symbol.code();
    let registered = cx
        .state
        .get_stats(code)
        .map_err(|_| TokenError::SymbolMismatch(format!("no token registered for symbol {code}")))?
        .supply
        .symbol;
    ensure_precision(registered, quantity.symbol)?;

    sub_balance(cx.state, owner, quantity)?;
    lock_into(cx.state, owner, quantity, unlock_delay_sec, owner)?;

    cx.emit(TokenEvent::Locked {
        owner,
        quantity,
        unlock_delay_sec,
    });
    Ok(())
}

/// Schedules every pending entry of `owner` in `sym_code`.
///
/// # Errors
///
/// - [`TokenError::NotFound`] if the owner never locked this symbol.
/// - [`TokenError::NothingToUnlock`] if every entry is already scheduled.
/// - [`TokenError::Overflow`] if `now + delay` does not fit a timestamp.
pub(crate) fn unlock(cx: &mut Invocation<'_>, owner: Name, sym_code: SymbolCode) -> TokenResult<()> {
    cx.require_auth(owner)?;

    let now = cx.now;
    let record = cx.state.get_locked(owner, sym_code)?;
    if record.pending_count() == 0 {
        return Err(TokenError::NothingToUnlock {
            owner,
            symbol: sym_code,
        });
    }

    let mut scheduled = Vec::with_capacity(record.entries.len());
    let mut quantity = Asset::zero(record.total_balance.symbol);
    let mut count = 0;
    for entry in &record.entries {
        if !entry.is_pending() {
            scheduled.push(entry.clone());
            continue;
        }
        let execute = now.checked_add_secs(entry.unlock_delay_sec).ok_or_else(|| {
            TokenError::Overflow(format!(
                "unlock time {now} + {}s is out of range",
                entry.unlock_delay_sec
            ))
        })?;
        quantity = quantity.checked_add(&entry.balance)?;
        count += 1;
        scheduled.push(LockEntry {
            unlock_request_time: Some(now),
            unlock_execute_time: Some(execute),
            ..entry.clone()
        });
    }

    cx.state
        .locked
        .modify(&mut cx.state.ram, owner.raw(), sym_code.raw(), |r| {
            r.entries = scheduled;
        })?;

    cx.emit(TokenEvent::UnlockScheduled {
        owner,
        quantity,
        entries: count,
        requested_at: now,
    });
    Ok(())
}

/// Releases every scheduled entry whose execute time has passed.
///
/// Anyone may call this. Entries are kept ordered by execute time, pending
/// ones first, with ties left in insertion order.
pub(crate) fn dounlock(
    cx: &mut Invocation<'_>,
    owner: Name,
    sym_code: SymbolCode,
) -> TokenResult<()> {
    let now = cx.now;
    let record = cx.state.get_locked(owner, sym_code)?;

    let mut entries = record.entries.clone();
    entries.sort_by_key(|e| e.unlock_execute_time);
    let (matured, remaining): (Vec<LockEntry>, Vec<LockEntry>) =
        entries.into_iter().partition(|e| e.is_matured(now));

    if matured.is_empty() {
        tracing::debug!(%owner, symbol = %sym_code, %now, "dounlock: nothing matured");
        return Ok(());
    }

    let mut released = Asset::zero(record.total_balance.symbol);
    for entry in &matured {
        released = released.checked_add(&entry.balance)?;
    }
    let total = record.total_balance.checked_sub(&released)?;

    cx.state
        .locked
        .modify(&mut cx.state.ram, owner.raw(), sym_code.raw(), |r| {
            r.total_balance = total;
            r.entries = remaining;
        })?;
    add_balance(cx.state, owner, released, owner)?;

    cx.emit(TokenEvent::Unlocked {
        owner,
        quantity: released,
        entries: matured.len(),
    });
    Ok(())
}
