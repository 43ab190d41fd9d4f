//! Token provider implementations.
//!
//! This module provides:
//! - [`AccountCache`] - Account list with an active selection
//! - [`MemoryTokenProvider`] - In-memory access tokens for testing and embedding
//! - [`EnvTokenProvider`] - Account and token from environment variables
//! - [`RefreshTokenProvider`] - Refresh-token grant (with `oauth` feature)

mod accounts;
mod env;
mod memory;
#[cfg(feature = "oauth")]
mod refresh;

pub use accounts::AccountCache;
pub use env::{EnvTokenProvider, DEFAULT_ENV_PREFIX};
pub use memory::MemoryTokenProvider;
#[cfg(feature = "oauth")]
pub use refresh::RefreshTokenProvider;
