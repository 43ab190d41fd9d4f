//! Silent acquisition through the OAuth 2.0 refresh-token grant.
//!
//! Every acquisition performs a fresh exchange at the authority's token
//! endpoint. A rotated refresh token returned by the authority replaces the
//! stored one; access tokens are never kept.

use async_trait::async_trait;
use chrono::Utc;
use oauth2::{
    basic::BasicClient, reqwest::async_http_client, AuthType, AuthUrl, ClientId, ClientSecret,
    RefreshToken, Scope, TokenResponse, TokenUrl,
};

use super::AccountCache;
use crate::config::AuthConfig;
use crate::model::Account;
use crate::token::{Secret, TokenError, TokenProvider, TokenRequest, TokenResult};

/// Token provider exchanging per-account refresh tokens.
pub struct RefreshTokenProvider {
    client: BasicClient,
    accounts: AccountCache,
}

impl RefreshTokenProvider {
    /// Create a public-client provider for the configured app registration.
    pub fn new(config: &AuthConfig) -> Result<Self, TokenError> {
        Self::with_endpoints(
            &config.auth.client_id,
            None,
            &config.authorize_endpoint(),
            &config.token_endpoint(),
        )
    }

    /// Create a provider with explicit endpoints and an optional client secret.
    pub fn with_endpoints(
        client_id: &str,
        client_secret: Option<&str>,
        auth_url: &str,
        token_url: &str,
    ) -> Result<Self, TokenError> {
        let auth_url =
            AuthUrl::new(auth_url.to_string()).map_err(|e| TokenError::ProviderNotConfigured {
                message: format!("invalid auth URL: {}", e),
            })?;

        let token_url =
            TokenUrl::new(token_url.to_string()).map_err(|e| TokenError::ProviderNotConfigured {
                message: format!("invalid token URL: {}", e),
            })?;

        let client = BasicClient::new(
            ClientId::new(client_id.to_string()),
            client_secret.map(|s| ClientSecret::new(s.to_string())),
            auth_url,
            Some(token_url),
        )
        .set_auth_type(AuthType::RequestBody);

        Ok(Self {
            client,
            accounts: AccountCache::new(),
        })
    }

    /// Register an account with its refresh token and make it active.
    pub fn sign_in(&self, account: Account, refresh_token: impl Into<String>) {
        let id = account.home_account_id.clone();
        self.accounts
            .insert(account, Some(Secret::new(refresh_token)));
        self.accounts.set_active(&id);
    }

    pub fn accounts(&self) -> &AccountCache {
        &self.accounts
    }
}

impl std::fmt::Debug for RefreshTokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshTokenProvider")
            .field("accounts", &self.accounts)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl TokenProvider for RefreshTokenProvider {
    fn active_account(&self) -> Option<Account> {
        self.accounts.active()
    }

    async fn acquire_token_silent(
        &self,
        request: &TokenRequest,
    ) -> Result<TokenResult, TokenError> {
        let account = &request.account;
        let refresh_token = self
            .accounts
            .secret(&account.home_account_id)
            .ok_or_else(|| TokenError::NotFound {
                account: account.username.clone(),
            })?;

        tracing::debug!("Exchanging refresh token for {}", account);

        let refresh_token = RefreshToken::new(refresh_token.expose().to_string());
        let token_response = self
            .client
            .exchange_refresh_token(&refresh_token)
            .add_scopes(request.scopes.iter().cloned().map(Scope::new))
            .request_async(async_http_client)
            .await
            .map_err(|e| {
                tracing::warn!("Silent token acquisition failed for {}: {}", account, e);
                TokenError::AcquisitionFailed {
                    message: e.to_string(),
                }
            })?;

        if let Some(rotated) = token_response.refresh_token() {
            self.accounts
                .set_secret(&account.home_account_id, Secret::new(rotated.secret()));
        }

        let scopes = token_response
            .scopes()
            .map(|s| s.iter().map(|scope| scope.to_string()).collect())
            .unwrap_or_else(|| request.scopes.clone());

        let mut token =
            TokenResult::new(token_response.access_token().secret()).with_scopes(scopes);

        if let Some(duration) = token_response.expires_in() {
            let expires_at = Utc::now()
                + chrono::Duration::from_std(duration).map_err(|e| {
                    TokenError::AcquisitionFailed {
                        message: format!("invalid expiration duration: {}", e),
                    }
                })?;
            token = token.with_expiry(expires_at);
        }

        Ok(token)
    }
}
