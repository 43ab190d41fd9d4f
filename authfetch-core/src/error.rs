//! Top-level error types for authfetch.

use thiserror::Error;

use crate::config::ConfigError;
use crate::fetch::FetchError;
use crate::token::TokenError;

/// Top-level error type encompassing all authfetch errors.
#[derive(Debug, Clone, Error)]
pub enum AuthfetchError {
    /// Error from request execution.
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Error from token acquisition outside a request.
    #[error("token error: {0}")]
    Token(#[from] TokenError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions_keep_source_message() {
        let err: AuthfetchError = FetchError::RequestFailed { status: 404 }.into();
        assert_eq!(err.to_string(), "fetch error: Invalid response: 404");

        let err: AuthfetchError = TokenError::NoActiveAccount.into();
        assert_eq!(err.to_string(), "token error: no active account");

        let err: AuthfetchError = ConfigError::Invalid {
            message: "empty scopes".to_string(),
        }
        .into();
        assert!(matches!(err, AuthfetchError::Config(_)));
    }
}
