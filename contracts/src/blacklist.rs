//! # Blacklist
//!
//! A flagged account keeps a minimum liquid balance in one symbol. The
//! floor is enforced by [`crate::ledger::sub_balance`] through
//! [`floor_for`], so transfers, retirements and locks all see the same
//! rule.
//!
//! Rows live in the contract's own scope, one per account. The floor asset
//! carries the symbol it applies to; other symbols are unaffected.

use locktoken_protocol::{Asset, Name, Symbol};

use crate::action::TokenEvent;
use crate::context::Invocation;
use crate::error::{TokenError, TokenResult};
use crate::ledger::ensure_precision;
use crate::state::TokenState;
use crate::tables::BlacklistRow;

/// The lowest balance `owner` may hold in `symbol`. Zero unless the
/// account is blacklisted for that symbol.
pub(crate) fn floor_for(state: &TokenState, owner: Name, symbol: Symbol) -> Asset {
    match state.get_blacklist(owner) {
        Some(row) if row.tokens_blocked.symbol.code() == symbol.code() => {
            Asset::new(row.tokens_blocked.amount.max(0), symbol)
        }
        _ => Asset::zero(symbol),
    }
}

pub(crate) fn blacklistadd(
    cx: &mut Invocation<'_>,
    account: Name,
    token_min: Asset,
) -> TokenResult<()> {
    let code = token_min.symbol.code();
    let stats = cx.state.get_stats(code).map_err(|_| {
        TokenError::SymbolMismatch(format!("no token registered for symbol {code}"))
    })?;
    let issuer = stats.issuer;
    let registered = stats.supply.symbol;
    cx.require_auth(issuer)?;

    // Replacing a floor set for another token also needs that token's issuer.
    let contract = cx.state.contract();
    if let Some(previous) = cx.state.get_blacklist(account) {
        let previous_code = previous.tokens_blocked.symbol.code();
        if previous_code != code {
            let previous_issuer = cx.state.get_stats(previous_code)?.issuer;
            cx.require_auth(previous_issuer)?;
        }
    }

    ensure_precision(registered, token_min.symbol)?;
    if !token_min.is_valid() || token_min.amount < 0 {
        return Err(TokenError::InvalidAmount(format!(
            "blacklist floor must be a non-negative amount, got {token_min}"
        )));
    }

    let row = BlacklistRow {
        account,
        tokens_blocked: token_min,
    };
    if cx.state.blacklist.contains(contract.raw(), account.raw()) {
        cx.state.blacklist.modify_with_payer(
            &mut cx.state.ram,
            contract.raw(),
            account.raw(),
            issuer,
            |r| *r = row,
        )?;
    } else {
        cx.state
            .blacklist
            .insert(&mut cx.state.ram, contract.raw(), account.raw(), issuer, row)?;
    }

    cx.emit(TokenEvent::Blacklisted { account, token_min });
    Ok(())
}

pub(crate) fn blacklistrm(cx: &mut Invocation<'_>, account: Name) -> TokenResult<()> {
    let contract = cx.state.contract();
    let tokens_blocked = cx
        .state
        .get_blacklist(account)
        .map(|r| r.tokens_blocked)
        .ok_or_else(|| TokenError::NotFound(format!("{account} is not blacklisted")))?;

    let issuer = cx.state.get_stats(tokens_blocked.symbol.code())?.issuer;
    cx.require_auth(issuer)?;

    cx.state
        .blacklist
        .erase(&mut cx.state.ram, contract.raw(), account.raw())?;
    cx.emit(TokenEvent::Unblacklisted {
        account,
        tokens_blocked,
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{ContractConfig, Signers};
    use crate::issuance::create;
    use locktoken_protocol::TimePointSec;

    fn name(s: &str) -> Name {
        s.parse().unwrap()
    }

    fn tok(s: &str) -> Asset {
        s.parse().unwrap()
    }

    fn setup() -> (TokenState, ContractConfig) {
        let config = ContractConfig::default();
        let mut state = TokenState::new(config.contract);
        let auth = Signers::of(config.contract);
        let mut cx = Invocation::new(&mut state, &auth, TimePointSec::default(), &config);
        create(&mut cx, name("issuer"), tok("1000.0000 TOK")).unwrap();
        create(&mut cx, name("other"), tok("1000.00 OTH")).unwrap();
        (state, config)
    }

    #[test]
    fn floor_only_applies_to_matching_symbol() {
        let (mut state, config) = setup();
        let auth = Signers::of(name("issuer"));
        let mut cx = Invocation::new(&mut state, &auth, TimePointSec::default(), &config);
        blacklistadd(&mut cx, name("mallory"), tok("10.0000 TOK")).unwrap();

        let tok_sym = tok("0.0000 TOK").symbol;
        let oth_sym = tok("0.00 OTH").symbol;
        assert_eq!(floor_for(&state, name("mallory"), tok_sym), tok("10.0000 TOK"));
        assert!(floor_for(&state, name("mallory"), oth_sym).is_zero());
        assert!(floor_for(&state, name("alice"), tok_sym).is_zero());
    }

    #[test]
    fn add_requires_issuer_and_registered_symbol() {
        let (mut state, config) = setup();
        let auth = Signers::of(name("mallory"));
        let mut cx = Invocation::new(&mut state, &auth, TimePointSec::default(), &config);
        assert!(matches!(
            blacklistadd(&mut cx, name("mallory"), tok("1.0000 TOK")),
            Err(TokenError::MissingAuthority(_))
        ));
        assert!(matches!(
            blacklistadd(&mut cx, name("mallory"), tok("1.0000 XYZ")),
            Err(TokenError::SymbolMismatch(_))
        ));
    }

    #[test]
    fn add_rejects_negative_floor() {
        let (mut state, config) = setup();
        let auth = Signers::of(name("issuer"));
        let mut cx = Invocation::new(&mut state, &auth, TimePointSec::default(), &config);
        assert!(matches!(
            blacklistadd(&mut cx, name("mallory"), tok("-1.0000 TOK")),
            Err(TokenError::InvalidAmount(_))
        ));
    }

    #[test]
    fn add_replaces_existing_row() {
        let (mut state, config) = setup();
        let auth = Signers::of(name("issuer"));
        let mut cx = Invocation::new(&mut state, &auth, TimePointSec::default(), &config);
        blacklistadd(&mut cx, name("mallory"), tok("10.0000 TOK")).unwrap();
        blacklistadd(&mut cx, name("mallory"), tok("3.0000 TOK")).unwrap();
        assert_eq!(state.blacklist.len(), 1);
        assert_eq!(
            state.get_blacklist(name("mallory")).unwrap().tokens_blocked,
            tok("3.0000 TOK")
        );
    }

    #[test]
    fn replacing_foreign_floor_needs_both_issuers() {
        let (mut state, config) = setup();
        let issuer = Signers::of(name("issuer"));
        let mut cx = Invocation::new(&mut state, &issuer, TimePointSec::default(), &config);
        blacklistadd(&mut cx, name("mallory"), tok("10.0000 TOK")).unwrap();

        let other = Signers::of(name("other"));
        let mut cx = Invocation::new(&mut state, &other, TimePointSec::default(), &config);
        assert!(matches!(
            blacklistadd(&mut cx, name("mallory"), tok("5.00 OTH")),
            Err(TokenError::MissingAuthority(n)) if n == name("issuer")
        ));

        let both: Signers = [name("issuer"), name("other")].into_iter().collect();
        let mut cx = Invocation::new(&mut state, &both, TimePointSec::default(), &config);
        blacklistadd(&mut cx, name("mallory"), tok("5.00 OTH")).unwrap();
    }

    #[test]
    fn remove_requires_row_and_refunds_issuer() {
        let (mut state, config) = setup();
        let auth = Signers::of(name("issuer"));
        let before = state.ram_usage(name("issuer"));
        let mut cx = Invocation::new(&mut state, &auth, TimePointSec::default(), &config);
        assert!(matches!(
            blacklistrm(&mut cx, name("mallory")),
            Err(TokenError::NotFound(_))
        ));
        blacklistadd(&mut cx, name("mallory"), tok("10.0000 TOK")).unwrap();
        blacklistrm(&mut cx, name("mallory")).unwrap();
        let events = cx.into_events();
        assert_eq!(events.len(), 2);
        assert!(state.get_blacklist(name("mallory")).is_none());
        assert_eq!(state.ram_usage(name("issuer")), before);
    }
}
