//! # authfetch Core
//!
//! Calls a web API on behalf of a signed-in identity-platform user.
//!
//! This crate provides:
//! - Static client configuration ([`AuthConfig`])
//! - A [`TokenProvider`] seam for silent token acquisition, with in-memory,
//!   environment and (optionally) refresh-token backed implementations
//! - [`FetchClient`], which sends JSON or multipart requests and attaches a
//!   bearer token when the call is authed and an account is active
//! - [`SessionProbe`], which asks the server who the current user is and
//!   publishes the answer into an [`AuthContext`]
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use authfetch_core::{AuthConfig, AuthContext, FetchClient, MemoryTokenProvider, SessionProbe};
//!
//! async fn whoami(config: &AuthConfig) -> Result<(), authfetch_core::FetchError> {
//!     let provider = Arc::new(MemoryTokenProvider::new());
//!     let client = Arc::new(FetchClient::builder(provider).config(config).build()?);
//!     let probe = SessionProbe::from_config(client, Arc::new(AuthContext::new()), config);
//!     let user = probe.probe().await?;
//!     println!("{} (authenticated: {})", user.name, user.is_authenticated);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod fetch;
pub mod model;
pub mod provider;
pub mod session;
pub mod token;

// Re-export commonly used types at crate root
pub use config::{
    AuthConfig,
    ConfigError,
    load_config,
};

pub use model::{
    Account,
    HttpMethod,
    RequestBody,
    RequestDescriptor,
};

pub use token::{
    Secret,
    TokenError,
    TokenProvider,
    TokenRequest,
    TokenResult,
};

pub use provider::{
    AccountCache,
    EnvTokenProvider,
    MemoryTokenProvider,
};

#[cfg(feature = "oauth")]
pub use provider::RefreshTokenProvider;

pub use fetch::{
    FetchClient,
    FetchClientBuilder,
    FetchError,
    FetchState,
};

pub use session::{
    AuthContext,
    SessionAction,
    SessionProbe,
    SessionState,
    SessionStatus,
    UserInfo,
};

pub use error::AuthfetchError;

/// Re-exported so callers can build multipart bodies without naming reqwest.
pub use reqwest::multipart;
