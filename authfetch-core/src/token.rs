//! Silent token acquisition.
//!
//! This module provides:
//! - [`Secret`] - A wrapper for sensitive values that prevents accidental logging
//! - [`TokenRequest`] - Scopes and account for a silent acquisition
//! - [`TokenResult`] - An access token with metadata
//! - [`TokenProvider`] - Trait for identity-platform clients that hand out tokens

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeroize::Zeroize;

use crate::model::Account;

/// Error type for token operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TokenError {
    /// No account is currently selected.
    #[error("no active account")]
    NoActiveAccount,

    /// The provider holds nothing for the requested account.
    #[error("no token available for account {account}")]
    NotFound { account: String },

    /// The silent request was rejected by the provider or the authority.
    #[error("silent token acquisition failed: {message}")]
    AcquisitionFailed { message: String },

    /// The provider configuration is missing or invalid.
    #[error("provider not configured: {message}")]
    ProviderNotConfigured { message: String },
}

/// A secret value that prevents accidental exposure in logs.
///
/// The inner value is only accessible via [`expose()`](Secret::expose).
/// Debug and Display implementations show `[REDACTED]` instead of the value.
/// The buffer is zeroed when the secret is dropped.
#[derive(Clone, Serialize, Deserialize)]
pub struct Secret(String);

impl Secret {
    /// Create a new secret from a string value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Expose the secret value.
    ///
    /// Use sparingly and never log the result.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl Drop for Secret {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Secret([REDACTED])")
    }
}

impl std::fmt::Display for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl PartialEq for Secret {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Secret {}

/// Parameters for a silent token request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRequest {
    /// Scopes the token must carry.
    pub scopes: Vec<String>,

    /// The account the token is requested for.
    pub account: Account,
}

impl TokenRequest {
    pub fn new(scopes: Vec<String>, account: Account) -> Self {
        Self { scopes, account }
    }
}

/// Result of a successful silent acquisition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResult {
    /// The access token value.
    pub access_token: Secret,

    /// When this token expires (None if unknown).
    pub expires_at: Option<DateTime<Utc>>,

    /// Scopes granted to this token.
    pub scopes: Vec<String>,
}

impl TokenResult {
    /// Create a new token result.
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: Secret::new(access_token),
            expires_at: None,
            scopes: Vec::new(),
        }
    }

    /// Set the expiration time.
    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Set the granted scopes.
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    /// Check if this token has expired.
    ///
    /// Returns `false` if no expiration is set.
    pub fn is_expired(&self) -> bool {
        self.expires_at.map(|exp| exp < Utc::now()).unwrap_or(false)
    }

    /// Get the Authorization header value.
    pub fn authorization_header(&self) -> String {
        format!("Bearer {}", self.access_token.expose())
    }
}

/// An identity-platform client able to hand out tokens without prompting.
///
/// Implementations own whatever caching or refresh they need; callers treat
/// every acquisition as fresh.
///
/// # Example
///
/// ```rust,ignore
/// use authfetch_core::{TokenProvider, TokenRequest};
///
/// async fn bearer(provider: &dyn TokenProvider) -> Option<String> {
///     let account = provider.active_account()?;
///     let request = TokenRequest::new(vec!["User.Read".into()], account);
///     let token = provider.acquire_token_silent(&request).await.ok()?;
///     Some(token.authorization_header())
/// }
/// ```
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// The currently selected signed-in account, if any.
    fn active_account(&self) -> Option<Account>;

    /// Obtain an access token for `request.account` without user interaction.
    async fn acquire_token_silent(&self, request: &TokenRequest)
        -> Result<TokenResult, TokenError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_redacted() {
        let secret = Secret::new("hunter2");
        assert_eq!(format!("{:?}", secret), "Secret([REDACTED])");
        assert_eq!(secret.to_string(), "[REDACTED]");
        assert_eq!(secret.expose(), "hunter2");
    }

    #[test]
    fn test_authorization_header() {
        let token = TokenResult::new("abc");
        assert_eq!(token.authorization_header(), "Bearer abc");
    }

    #[test]
    fn test_token_is_expired() {
        let expired = TokenResult::new("t").with_expiry(Utc::now() - chrono::Duration::hours(1));
        assert!(expired.is_expired());

        let valid = TokenResult::new("t").with_expiry(Utc::now() + chrono::Duration::hours(1));
        assert!(!valid.is_expired());

        assert!(!TokenResult::new("t").is_expired());
    }
}
