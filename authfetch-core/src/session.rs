//! Session probing and published authentication state.
//!
//! This module provides:
//! - [`UserInfo`] - Payload of the "current user" endpoint
//! - [`AuthContext`] - Explicit, shareable authentication state with `dispatch`
//! - [`SessionProbe`] - Fetches the current user and publishes it
//! - [`SessionStatus`] - What the probe exposes to its caller
//!
//! A local account only means someone may be signed in. The probe asks the
//! server and trusts its `isAuthenticated` answer alone.

use parking_lot::RwLock;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::watch;

use crate::config::AuthConfig;
use crate::fetch::{FetchClient, FetchError};
use crate::token::TokenProvider;

/// Response of the "current user" endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    /// True only when the server sent the boolean `true`.
    #[serde(
        rename = "isAuthenticated",
        default,
        deserialize_with = "deserialize_strict_true"
    )]
    pub is_authenticated: bool,

    #[serde(default, deserialize_with = "deserialize_string_or_empty")]
    pub name: String,

    /// Any further fields the server sends.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn deserialize_strict_true<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(Value::deserialize(deserializer)? == Value::Bool(true))
}

fn deserialize_string_or_empty<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        _ => Ok(String::new()),
    }
}

/// Authentication state published to the rest of the application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionState {
    pub is_authenticated: bool,
    pub username: String,
}

/// Updates accepted by [`AuthContext::dispatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    SetIsAuthenticated(bool),
    SetUsername(String),
    Reset,
}

impl SessionState {
    fn apply(&mut self, action: SessionAction) {
        match action {
            SessionAction::SetIsAuthenticated(value) => self.is_authenticated = value,
            SessionAction::SetUsername(name) => self.username = name,
            SessionAction::Reset => *self = Self::default(),
        }
    }
}

/// Shared authentication state.
///
/// Pass an `Arc<AuthContext>` to whatever needs to read or write it.
#[derive(Debug)]
pub struct AuthContext {
    state: watch::Sender<SessionState>,
}

impl AuthContext {
    pub fn new() -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self { state }
    }

    pub fn dispatch(&self, action: SessionAction) {
        tracing::trace!("dispatch {:?}", action);
        self.state.send_modify(|state| state.apply(action));
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Receive every published change.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }
}

impl Default for AuthContext {
    fn default() -> Self {
        Self::new()
    }
}

/// What a [`SessionProbe`] exposes to its caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionStatus {
    pub is_authenticated: bool,
    /// Becomes true after the first successful probe and stays true.
    pub is_loaded: bool,
    pub user_info: Option<UserInfo>,
    #[serde(serialize_with = "serialize_error")]
    pub error: Option<FetchError>,
}

fn serialize_error<S: Serializer>(error: &Option<FetchError>, serializer: S) -> Result<S::Ok, S::Error> {
    match error {
        Some(e) => serializer.serialize_some(&e.to_string()),
        None => serializer.serialize_none(),
    }
}

#[derive(Debug, Default)]
struct ProbeState {
    user_info: Option<UserInfo>,
    is_loaded: bool,
    error: Option<FetchError>,
}

/// Asks the server who the current user is and publishes the answer.
pub struct SessionProbe<P: TokenProvider + ?Sized> {
    client: Arc<FetchClient<P>>,
    context: Arc<AuthContext>,
    endpoint: String,
    state: RwLock<ProbeState>,
}

impl<P: TokenProvider + ?Sized> SessionProbe<P> {
    /// Create a probe for an explicit "current user" endpoint.
    pub fn new(
        client: Arc<FetchClient<P>>,
        context: Arc<AuthContext>,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            client,
            context,
            endpoint: endpoint.into(),
            state: RwLock::new(ProbeState::default()),
        }
    }

    /// Create a probe for `{api.base_url}/user-info`.
    pub fn from_config(
        client: Arc<FetchClient<P>>,
        context: Arc<AuthContext>,
        config: &AuthConfig,
    ) -> Self {
        Self::new(client, context, config.user_info_endpoint())
    }

    /// Fetch the current user once and publish it.
    ///
    /// On failure the error is logged and kept; anything published by an
    /// earlier probe stays in place.
    pub async fn probe(&self) -> Result<UserInfo, FetchError> {
        let result = self
            .client
            .json_auth_fetch(&self.endpoint, None, None)
            .await
            .and_then(|data| {
                serde_json::from_value::<UserInfo>(data).map_err(|e| FetchError::ParseError {
                    message: e.to_string(),
                })
            });

        match result {
            Ok(info) => {
                {
                    let mut state = self.state.write();
                    state.user_info = Some(info.clone());
                    state.is_loaded = true;
                }
                self.context
                    .dispatch(SessionAction::SetIsAuthenticated(info.is_authenticated));
                self.context
                    .dispatch(SessionAction::SetUsername(info.name.clone()));
                Ok(info)
            }
            Err(e) => {
                tracing::error!("Failed to fetch user info from {}: {}", self.endpoint, e);
                self.state.write().error = Some(e.clone());
                Err(e)
            }
        }
    }

    pub fn status(&self) -> SessionStatus {
        let state = self.state.read();
        SessionStatus {
            is_authenticated: state
                .user_info
                .as_ref()
                .is_some_and(|info| info.is_authenticated),
            is_loaded: state.is_loaded,
            user_info: state.user_info.clone(),
            error: state.error.clone(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn context(&self) -> &Arc<AuthContext> {
        &self.context
    }
}
