//! Account list with an active selection.

use parking_lot::RwLock;
use std::collections::HashMap;

use crate::model::Account;
use crate::token::Secret;

/// Known accounts, one [`Secret`] per account, and the active selection.
///
/// The secret is whatever the owning provider needs to mint a token: an
/// access token for [`MemoryTokenProvider`](super::MemoryTokenProvider), a
/// refresh token for the OAuth-backed provider.
#[derive(Default)]
pub struct AccountCache {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    accounts: Vec<Account>,
    secrets: HashMap<String, Secret>,
    active: Option<String>,
}

impl AccountCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an account, or replace the one with the same `home_account_id`.
    pub fn insert(&self, account: Account, secret: Option<Secret>) {
        let mut inner = self.inner.write();
        let id = account.home_account_id.clone();
        let position = inner.accounts.iter().position(|a| a.home_account_id == id);
        match position {
            Some(index) => inner.accounts[index] = account,
            None => inner.accounts.push(account),
        }
        match secret {
            Some(secret) => {
                inner.secrets.insert(id, secret);
            }
            None => {
                inner.secrets.remove(&id);
            }
        }
    }

    /// Replace the secret of a known account. Returns `false` if unknown.
    pub fn set_secret(&self, home_account_id: &str, secret: Secret) -> bool {
        let mut inner = self.inner.write();
        if !inner.accounts.iter().any(|a| a.home_account_id == home_account_id) {
            return false;
        }
        inner.secrets.insert(home_account_id.to_string(), secret);
        true
    }

    /// Remove an account. Clears the active selection if it pointed there.
    pub fn remove(&self, home_account_id: &str) -> Option<Account> {
        let mut inner = self.inner.write();
        let index = inner
            .accounts
            .iter()
            .position(|a| a.home_account_id == home_account_id)?;
        inner.secrets.remove(home_account_id);
        if inner.active.as_deref() == Some(home_account_id) {
            inner.active = None;
        }
        Some(inner.accounts.remove(index))
    }

    /// Select the active account. Returns `false` if the account is unknown.
    pub fn set_active(&self, home_account_id: &str) -> bool {
        let mut inner = self.inner.write();
        if inner.accounts.iter().any(|a| a.home_account_id == home_account_id) {
            inner.active = Some(home_account_id.to_string());
            true
        } else {
            false
        }
    }

    pub fn clear_active(&self) {
        self.inner.write().active = None;
    }

    pub fn active(&self) -> Option<Account> {
        let inner = self.inner.read();
        let id = inner.active.as_deref()?;
        inner
            .accounts
            .iter()
            .find(|a| a.home_account_id == id)
            .cloned()
    }

    pub fn secret(&self, home_account_id: &str) -> Option<Secret> {
        self.inner.read().secrets.get(home_account_id).cloned()
    }

    pub fn accounts(&self) -> Vec<Account> {
        self.inner.read().accounts.clone()
    }
}

impl std::fmt::Debug for AccountCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("AccountCache")
            .field("accounts_count", &inner.accounts.len())
            .field("active", &inner.active)
            .finish()
    }
}
