//! Identity-platform client configuration.
//!
//! All values are static literals: the defaults below ship with the crate and
//! a `config.toml` in the platform config directory can override any of them.
//!
//! ```toml
//! [auth]
//! client_id = "CLIENT_ID_HERE"
//! authority = "https://login.microsoftonline.com/DIRECTORY_ID_HERE"
//!
//! [login_request]
//! scopes = ["User.Read"]
//!
//! [api]
//! base_url = "http://localhost:5000/api"
//! ```

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

/// Environment variable that overrides `api.base_url`.
pub const API_BASE_URL_ENV: &str = "AUTHFETCH_API_BASE_URL";

const CONFIG_FILE_NAME: &str = "config.toml";

/// Error type for configuration loading.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("failed to read config from {path}: {message}")]
    Io { path: String, message: String },

    #[error("failed to parse config from {path}: {message}")]
    Parse { path: String, message: String },

    #[error("invalid configuration: {message}")]
    Invalid { message: String },
}

/// Complete client configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub auth: ClientAuthConfig,
    pub system: SystemConfig,
    pub login_request: LoginRequestConfig,
    pub graph: GraphConfig,
    pub api: ApiConfig,
}

/// App registration details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientAuthConfig {
    /// Application (client) ID of the app registration. A GUID.
    pub client_id: String,

    /// Authority URL, `https://login.microsoftonline.com/{tenant}`.
    pub authority: String,

    pub redirect_uri: String,

    pub post_logout_redirect_uri: String,
}

impl Default for ClientAuthConfig {
    fn default() -> Self {
        Self {
            client_id: "CLIENT_ID_HERE".to_string(),
            authority: "https://login.microsoftonline.com/DIRECTORY_ID_HERE".to_string(),
            redirect_uri: "/".to_string(),
            post_logout_redirect_uri: "/".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    /// Whether the platform's native auth broker may be used.
    pub allow_native_broker: bool,
}

/// Scopes requested for every silent token acquisition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginRequestConfig {
    pub scopes: Vec<String>,
}

impl Default for LoginRequestConfig {
    fn default() -> Self {
        Self {
            scopes: vec!["User.Read".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub graph_me_endpoint: String,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            graph_me_endpoint: "https://graph.microsoft.com/v1.0/me".to_string(),
        }
    }
}

/// The application's own web API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000/api".to_string(),
        }
    }
}

impl AuthConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse {
            path: "<inline>".to_string(),
            message: e.to_string(),
        })
    }

    /// Load a configuration from an explicit file.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        toml::from_str(&contents).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Apply environment overrides.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(base_url) = std::env::var(API_BASE_URL_ENV) {
            if !base_url.is_empty() {
                self.api.base_url = base_url;
            }
        }
        self
    }

    /// Check that the URLs parse and at least one scope is configured.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Url::parse(&self.auth.authority).map_err(|e| ConfigError::Invalid {
            message: format!("authority {:?}: {}", self.auth.authority, e),
        })?;
        Url::parse(&self.api.base_url).map_err(|e| ConfigError::Invalid {
            message: format!("api.base_url {:?}: {}", self.api.base_url, e),
        })?;
        if self.login_request.scopes.is_empty() {
            return Err(ConfigError::Invalid {
                message: "login_request.scopes must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// OAuth 2.0 token endpoint of the authority.
    pub fn token_endpoint(&self) -> String {
        format!(
            "{}/oauth2/v2.0/token",
            self.auth.authority.trim_end_matches('/')
        )
    }

    /// OAuth 2.0 authorization endpoint of the authority.
    pub fn authorize_endpoint(&self) -> String {
        format!(
            "{}/oauth2/v2.0/authorize",
            self.auth.authority.trim_end_matches('/')
        )
    }

    /// The "current user" endpoint of the application API.
    pub fn user_info_endpoint(&self) -> String {
        format!("{}/user-info", self.api.base_url.trim_end_matches('/'))
    }
}

/// Default location of the configuration file.
pub fn default_config_path() -> PathBuf {
    project_dirs()
        .map(|d| d.config_dir().join(CONFIG_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from("authfetch.toml"))
}

/// Load configuration from the default location or fall back to defaults.
///
/// Environment overrides are applied in both cases.
pub fn load_config() -> Result<AuthConfig, ConfigError> {
    let config_path = default_config_path();

    let config = if config_path.exists() {
        tracing::debug!("Loading configuration from {:?}", config_path);
        AuthConfig::load_from_path(&config_path)?
    } else {
        tracing::debug!("No configuration at {:?}, using defaults", config_path);
        AuthConfig::default()
    };

    Ok(config.with_env_overrides())
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "raibid-labs", "authfetch")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_registration_placeholders() {
        let config = AuthConfig::default();
        assert_eq!(config.auth.client_id, "CLIENT_ID_HERE");
        assert_eq!(
            config.auth.authority,
            "https://login.microsoftonline.com/DIRECTORY_ID_HERE"
        );
        assert_eq!(config.auth.redirect_uri, "/");
        assert_eq!(config.auth.post_logout_redirect_uri, "/");
        assert!(!config.system.allow_native_broker);
        assert_eq!(config.login_request.scopes, vec!["User.Read"]);
        assert_eq!(
            config.graph.graph_me_endpoint,
            "https://graph.microsoft.com/v1.0/me"
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AuthConfig::from_toml(
            r#"
            [auth]
            client_id = "11111111-2222-3333-4444-555555555555"

            [api]
            base_url = "https://api.example.com/"
            "#,
        )
        .unwrap();

        assert_eq!(config.auth.client_id, "11111111-2222-3333-4444-555555555555");
        assert_eq!(config.auth.redirect_uri, "/");
        assert_eq!(config.login_request.scopes, vec!["User.Read"]);
        assert_eq!(config.user_info_endpoint(), "https://api.example.com/user-info");
    }

    #[test]
    fn test_token_endpoint() {
        let mut config = AuthConfig::default();
        config.auth.authority = "https://login.microsoftonline.com/contoso/".to_string();
        assert_eq!(
            config.token_endpoint(),
            "https://login.microsoftonline.com/contoso/oauth2/v2.0/token"
        );
        assert_eq!(
            config.authorize_endpoint(),
            "https://login.microsoftonline.com/contoso/oauth2/v2.0/authorize"
        );
    }

    #[test]
    fn test_validate_rejects_empty_scopes() {
        let mut config = AuthConfig::default();
        config.login_request.scopes.clear();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_relative_base_url() {
        let mut config = AuthConfig::default();
        config.api.base_url = "/api".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[login_request]\nscopes = [\"api://app/.default\"]").unwrap();

        let config = AuthConfig::load_from_path(&path).unwrap();
        assert_eq!(config.login_request.scopes, vec!["api://app/.default"]);
    }

    #[test]
    fn test_load_from_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let result = AuthConfig::load_from_path(dir.path().join("absent.toml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_load_from_malformed_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[auth\nclient_id = 3").unwrap();
        assert!(matches!(
            AuthConfig::load_from_path(&path),
            Err(ConfigError::Parse { .. })
        ));
    }
}
