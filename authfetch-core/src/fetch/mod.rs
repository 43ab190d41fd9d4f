//! Bearer-decorated HTTP requests.
//!
//! This module provides:
//! - [`FetchClient`] - Executes request intents, attaching a bearer token when asked
//! - [`FetchClientBuilder`] - Configures base URL, scopes, and transport
//! - [`FetchState`] - The loading/error/data flags mirrored to callers
//! - [`FetchError`] - Failure taxonomy for a single execution

use serde_json::Value;
use thiserror::Error;

use crate::token::TokenError;

mod client;

pub use client::{FetchClient, FetchClientBuilder};

/// Error type for request execution.
///
/// Every variant is cloneable so the last failure can be kept in
/// [`FetchState`] while the same error is returned to the caller.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// The silent token request was rejected. No network I/O happened.
    #[error("token acquisition failed: {0}")]
    TokenAcquisitionFailed(#[from] TokenError),

    /// The server answered with a non-success status.
    #[error("Invalid response: {status}")]
    RequestFailed { status: u16 },

    /// The transport failed without a response.
    #[error("network error: {message}")]
    NetworkError { message: String },

    /// The response body is not valid JSON.
    #[error("response is not valid JSON: {message}")]
    ParseError { message: String },

    /// The endpoint could not be turned into an absolute HTTP URL.
    #[error("invalid endpoint {endpoint:?}: {message}")]
    InvalidEndpoint { endpoint: String, message: String },

    /// The JSON body could not be serialized.
    #[error("failed to serialize request body: {message}")]
    Serialization { message: String },
}

impl FetchError {
    /// HTTP status for [`FetchError::RequestFailed`].
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RequestFailed { status } => Some(*status),
            _ => None,
        }
    }
}

/// Observable flags of a [`FetchClient`].
///
/// The flags are shared by every call on the same client and overwritten by
/// whichever call settles last.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchState {
    /// True while a network call is in flight. Token acquisition is not included.
    pub is_loading: bool,

    /// The most recent failure.
    pub error: Option<FetchError>,

    /// The most recent successful payload.
    pub data: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_failed_message_carries_status() {
        let err = FetchError::RequestFailed { status: 500 };
        assert_eq!(err.to_string(), "Invalid response: 500");
        assert_eq!(err.status(), Some(500));
    }

    #[test]
    fn test_token_error_converts() {
        let err: FetchError = TokenError::NoActiveAccount.into();
        assert!(matches!(err, FetchError::TokenAcquisitionFailed(_)));
        assert_eq!(err.status(), None);
    }
}
