//! Token provider reading from environment variables.
//!
//! Variables follow the pattern `{PREFIX}_{NAME}`:
//! - `AUTHFETCH_ACCOUNT` - username of the active account; unset means signed out
//! - `AUTHFETCH_HOME_ACCOUNT_ID` - account identifier (defaults to the username)
//! - `AUTHFETCH_TENANT_ID` - optional tenant
//! - `AUTHFETCH_ACCESS_TOKEN` - the access token handed out on every acquisition

use async_trait::async_trait;
use tracing::trace;

use crate::model::Account;
use crate::token::{TokenError, TokenProvider, TokenRequest, TokenResult};

/// Default variable prefix.
pub const DEFAULT_ENV_PREFIX: &str = "AUTHFETCH";

/// Reads the active account and its access token from the environment.
///
/// Variables are read on every call, so a host can swap them between
/// requests.
#[derive(Debug, Clone)]
pub struct EnvTokenProvider {
    prefix: String,
}

impl EnvTokenProvider {
    /// Create a provider with the default `AUTHFETCH` prefix.
    pub fn new() -> Self {
        Self::with_prefix(DEFAULT_ENV_PREFIX)
    }

    /// Create a provider with a custom prefix.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into().to_uppercase(),
        }
    }

    fn var(&self, name: &str) -> Option<String> {
        let key = format!("{}_{}", self.prefix, name);
        trace!("checking env var: {}", key);
        std::env::var(&key).ok().filter(|v| !v.is_empty())
    }
}

impl Default for EnvTokenProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenProvider for EnvTokenProvider {
    fn active_account(&self) -> Option<Account> {
        let username = self.var("ACCOUNT")?;
        let home_account_id = self.var("HOME_ACCOUNT_ID").unwrap_or_else(|| username.clone());
        let mut account = Account::new(home_account_id, username);
        if let Some(tenant) = self.var("TENANT_ID") {
            account = account.with_tenant(tenant);
        }
        Some(account)
    }

    async fn acquire_token_silent(
        &self,
        request: &TokenRequest,
    ) -> Result<TokenResult, TokenError> {
        let token = self.var("ACCESS_TOKEN").ok_or_else(|| TokenError::NotFound {
            account: request.account.username.clone(),
        })?;
        Ok(TokenResult::new(token).with_scopes(request.scopes.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_env_provider_signed_in() {
        // SAFETY: Test-only env var manipulation, unique prefix per test
        unsafe {
            std::env::set_var("AFTEST_SIGNED_ACCOUNT", "ada@example.com");
            std::env::set_var("AFTEST_SIGNED_TENANT_ID", "contoso");
            std::env::set_var("AFTEST_SIGNED_ACCESS_TOKEN", "env-token");
        }

        let provider = EnvTokenProvider::with_prefix("aftest_signed");
        let account = provider.active_account().unwrap();
        assert_eq!(account.username, "ada@example.com");
        assert_eq!(account.home_account_id, "ada@example.com");
        assert_eq!(account.tenant_id.as_deref(), Some("contoso"));

        let token = provider
            .acquire_token_silent(&TokenRequest::new(vec![], account))
            .await
            .unwrap();
        assert_eq!(token.access_token.expose(), "env-token");

        // SAFETY: Test-only env var manipulation
        unsafe {
            std::env::remove_var("AFTEST_SIGNED_ACCOUNT");
            std::env::remove_var("AFTEST_SIGNED_TENANT_ID");
            std::env::remove_var("AFTEST_SIGNED_ACCESS_TOKEN");
        }
    }

    #[test]
    fn test_env_provider_signed_out() {
        let provider = EnvTokenProvider::with_prefix("AFTEST_NOBODY");
        assert!(provider.active_account().is_none());
    }

    #[tokio::test]
    async fn test_env_provider_missing_token() {
        // SAFETY: Test-only env var manipulation, unique prefix per test
        unsafe { std::env::set_var("AFTEST_NOTOKEN_ACCOUNT", "bob@example.com") };

        let provider = EnvTokenProvider::with_prefix("AFTEST_NOTOKEN");
        let account = provider.active_account().unwrap();
        let result = provider
            .acquire_token_silent(&TokenRequest::new(vec![], account))
            .await;
        assert!(matches!(result, Err(TokenError::NotFound { .. })));

        // SAFETY: Test-only env var manipulation
        unsafe { std::env::remove_var("AFTEST_NOTOKEN_ACCOUNT") };
    }
}
