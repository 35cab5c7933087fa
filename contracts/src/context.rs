//! # Invocation Context
//!
//! The seams between the token logic and its host:
//!
//! - [`Authority`] answers "did this account authorize the invocation?".
//! - [`Notifier`] receives every event of a committed action, once per
//!   recipient. Delivery is fire-and-forget.
//! - [`ContractConfig`] names the hosting account and the memo limit.
//!
//! [`Invocation`] bundles these with the staged state for the duration of
//! a single action.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

use locktoken_protocol::config::{DEFAULT_CONTRACT_ACCOUNT, MAX_MEMO_BYTES};
use locktoken_protocol::{Name, TimePointSec};

use crate::action::TokenEvent;
use crate::error::{TokenError, TokenResult};
use crate::state::TokenState;

// ---------------------------------------------------------------------------
// Authority
// ---------------------------------------------------------------------------

/// Authorization check supplied by the host.
pub trait Authority {
    fn has_auth(&self, account: Name) -> bool;

    fn require_auth(&self, account: Name) -> TokenResult<()> {
        if self.has_auth(account) {
            Ok(())
        } else {
            Err(TokenError::MissingAuthority(account))
        }
    }
}

/// The set of accounts that signed an invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signers(BTreeSet<Name>);

impl Signers {
    /// No signatures. Enough for permissionless actions such as `dounlock`.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn of(account: Name) -> Self {
        Self(BTreeSet::from([account]))
    }
}

impl FromIterator<Name> for Signers {
    fn from_iter<I: IntoIterator<Item = Name>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Authority for Signers {
    fn has_auth(&self, account: Name) -> bool {
        self.0.contains(&account)
    }
}

// ---------------------------------------------------------------------------
// Notifier
// ---------------------------------------------------------------------------

/// Receives events after an action has committed.
pub trait Notifier {
    fn notify(&self, recipient: Name, event: &TokenEvent);
}

/// Writes every notification to the tracing log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, recipient: Name, event: &TokenEvent) {
        tracing::debug!(%recipient, ?event, "notify");
    }
}

/// Keeps every notification in memory. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    log: Arc<Mutex<Vec<(Name, TokenEvent)>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything received so far.
    pub fn received(&self) -> Vec<(Name, TokenEvent)> {
        self.log.lock().clone()
    }

    /// Drains the log.
    pub fn take(&self) -> Vec<(Name, TokenEvent)> {
        std::mem::take(&mut *self.log.lock())
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, recipient: Name, event: &TokenEvent) {
        self.log.lock().push((recipient, event.clone()));
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Host-level settings for a token contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractConfig {
    /// Account hosting the tables. Its authority is required by `create`.
    pub contract: Name,
    /// Memo limit in bytes for issue, retire and transfer.
    pub max_memo_bytes: usize,
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            contract: DEFAULT_CONTRACT_ACCOUNT,
            max_memo_bytes: MAX_MEMO_BYTES,
        }
    }
}

impl ContractConfig {
    pub fn with_contract(contract: Name) -> Self {
        Self {
            contract,
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Invocation
// ---------------------------------------------------------------------------

/// Everything one action may read or write.
pub(crate) struct Invocation<'a> {
    pub state: &'a mut TokenState,
    pub now: TimePointSec,
    pub config: &'a ContractConfig,
    auth: &'a dyn Authority,
    events: Vec<TokenEvent>,
}

impl<'a> Invocation<'a> {
    pub fn new(
        state: &'a mut TokenState,
        auth: &'a dyn Authority,
        now: TimePointSec,
        config: &'a ContractConfig,
    ) -> Self {
        Self {
            state,
            now,
            config,
            auth,
            events: Vec::new(),
        }
    }

    pub fn require_auth(&self, account: Name) -> TokenResult<()> {
        self.auth.require_auth(account)
    }

    pub fn check_memo(&self, memo: &str) -> TokenResult<()> {
        if memo.len() > self.config.max_memo_bytes {
            return Err(TokenError::MemoTooLong {
                len: memo.len(),
                max: self.config.max_memo_bytes,
            });
        }
        Ok(())
    }

    pub fn emit(&mut self, event: TokenEvent) {
        self.events.push(event);
    }

    pub fn into_events(self) -> Vec<TokenEvent> {
        self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signers_grant_only_listed_accounts() {
        let alice: Name = "alice".parse().unwrap();
        let bob: Name = "bob".parse().unwrap();
        let signers: Signers = [alice].into_iter().collect();
        assert!(signers.require_auth(alice).is_ok());
        assert!(matches!(
            signers.require_auth(bob),
            Err(TokenError::MissingAuthority(n)) if n == bob
        ));
        assert!(!Signers::none().has_auth(alice));
    }

    #[test]
    fn default_config_uses_protocol_constants() {
        let config = ContractConfig::default();
        assert_eq!(config.contract.to_string(), "locktoken");
        assert_eq!(config.max_memo_bytes, 256);
    }
}
