//! In-memory token provider.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::AccountCache;
use crate::model::Account;
use crate::token::{Secret, TokenError, TokenProvider, TokenRequest, TokenResult};

/// Token provider backed by access tokens held in memory.
///
/// Suitable for tests and for hosts that already obtained tokens elsewhere.
/// Tokens are handed out as-is; nothing is refreshed.
///
/// # Thread Safety
///
/// Uses interior mutability and is safe to share across threads.
#[derive(Debug, Default)]
pub struct MemoryTokenProvider {
    accounts: AccountCache,
    acquisitions: AtomicUsize,
}

impl MemoryTokenProvider {
    /// Create a provider with no accounts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a provider with one account that is already active.
    pub fn signed_in(account: Account, access_token: impl Into<String>) -> Self {
        let provider = Self::new();
        let id = account.home_account_id.clone();
        provider.add_account(account, Some(access_token.into()));
        provider.accounts.set_active(&id);
        provider
    }

    /// Register an account, optionally with its access token.
    pub fn add_account(&self, account: Account, access_token: Option<String>) {
        self.accounts.insert(account, access_token.map(Secret::new));
    }

    /// Returns `false` if the account is unknown.
    pub fn set_active_account(&self, home_account_id: &str) -> bool {
        self.accounts.set_active(home_account_id)
    }

    pub fn sign_out(&self) {
        self.accounts.clear_active();
    }

    /// How many silent acquisitions were attempted.
    pub fn acquisition_count(&self) -> usize {
        self.acquisitions.load(Ordering::SeqCst)
    }

    pub fn accounts(&self) -> &AccountCache {
        &self.accounts
    }
}

#[async_trait]
impl TokenProvider for MemoryTokenProvider {
    fn active_account(&self) -> Option<Account> {
        self.accounts.active()
    }

    async fn acquire_token_silent(
        &self,
        request: &TokenRequest,
    ) -> Result<TokenResult, TokenError> {
        self.acquisitions.fetch_add(1, Ordering::SeqCst);

        let secret = self
            .accounts
            .secret(&request.account.home_account_id)
            .ok_or_else(|| TokenError::NotFound {
                account: request.account.username.clone(),
            })?;

        Ok(TokenResult::new(secret.expose()).with_scopes(request.scopes.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_signed_in_provider_returns_token() {
        let account = Account::new("a", "a@example.com");
        let provider = MemoryTokenProvider::signed_in(account.clone(), "abc");

        assert_eq!(provider.active_account(), Some(account.clone()));

        let request = TokenRequest::new(vec!["User.Read".to_string()], account);
        let token = provider.acquire_token_silent(&request).await.unwrap();
        assert_eq!(token.access_token.expose(), "abc");
        assert_eq!(token.scopes, vec!["User.Read"]);
        assert_eq!(provider.acquisition_count(), 1);
    }

    #[tokio::test]
    async fn test_account_without_token_fails() {
        let provider = MemoryTokenProvider::new();
        let account = Account::new("a", "a@example.com");
        provider.add_account(account.clone(), None);
        provider.set_active_account("a");

        let request = TokenRequest::new(vec![], account);
        let result = provider.acquire_token_silent(&request).await;
        assert!(matches!(result, Err(TokenError::NotFound { .. })));
    }

    #[test]
    fn test_sign_out_clears_active() {
        let provider = MemoryTokenProvider::signed_in(Account::new("a", "a@example.com"), "t");
        provider.sign_out();
        assert!(provider.active_account().is_none());
    }
}
