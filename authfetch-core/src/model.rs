//! Domain model types for authfetch.
//!
//! This module defines the core types used throughout authfetch:
//! - [`Account`] - A locally signed-in identity
//! - [`HttpMethod`] - The request methods the executor issues
//! - [`RequestBody`] - Which body, if any, goes on the wire
//! - [`RequestDescriptor`] - A single request intent

use reqwest::multipart::Form;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// A signed-in identity known to the token provider.
///
/// Holding an account only means a user may be signed in locally; the server
/// still decides whether the session is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Account {
    /// Stable identifier of the account across tenants.
    pub home_account_id: String,

    /// Sign-in name (usually an email address).
    pub username: String,

    /// Directory the account signed into.
    pub tenant_id: Option<String>,

    /// Display name.
    pub name: Option<String>,
}

impl Account {
    /// Create a new account.
    pub fn new(home_account_id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            home_account_id: home_account_id.into(),
            username: username.into(),
            tenant_id: None,
            name: None,
        }
    }

    /// Set the tenant.
    pub fn with_tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    /// Set the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.username)
    }
}

/// HTTP methods issued by the executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    /// Pick the method for a JSON call.
    ///
    /// An explicit method always wins. Otherwise POST when a body is present,
    /// GET when it is not.
    pub fn resolve(explicit: Option<HttpMethod>, has_body: bool) -> Self {
        explicit.unwrap_or(if has_body { Self::Post } else { Self::Get })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }

    pub(crate) fn to_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Delete => reqwest::Method::DELETE,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = ParseMethodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "DELETE" => Ok(Self::Delete),
            _ => Err(ParseMethodError {
                method: s.to_string(),
            }),
        }
    }
}

/// Error parsing an [`HttpMethod`].
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("unsupported HTTP method: {method}")]
pub struct ParseMethodError {
    pub method: String,
}

/// The body actually sent with a request.
#[derive(Debug)]
pub enum RequestBody {
    /// No body.
    None,
    /// A JSON document, sent with `Content-Type: application/json`.
    Json(Value),
    /// A multipart form; the transport writes the content type and boundary.
    Form(Form),
}

impl RequestBody {
    /// Select the body from the optional JSON and form payloads.
    ///
    /// A form always supersedes JSON. A JSON `null` counts as absent.
    pub fn from_parts(json: Option<Value>, form: Option<Form>) -> Self {
        match (form, json) {
            (Some(form), _) => Self::Form(form),
            (None, Some(Value::Null)) | (None, None) => Self::None,
            (None, Some(json)) => Self::Json(json),
        }
    }

    /// Content-Type header to add, if the executor sets one.
    pub fn content_type(&self) -> Option<&'static str> {
        match self {
            Self::Json(_) => Some("application/json"),
            Self::None | Self::Form(_) => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

/// A logical request intent, built fresh for every call.
#[derive(Debug)]
pub struct RequestDescriptor {
    pub method: HttpMethod,
    pub endpoint: String,
    /// Whether a bearer token should be attached when an account is active.
    pub authed: bool,
    pub body: RequestBody,
}

impl RequestDescriptor {
    pub fn new(method: HttpMethod, endpoint: impl Into<String>) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            authed: false,
            body: RequestBody::None,
        }
    }

    pub fn authed(mut self, authed: bool) -> Self {
        self.authed = authed;
        self
    }

    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }
}
