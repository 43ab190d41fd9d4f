use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::Form;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;
use url::Url;

use super::{FetchError, FetchState};
use crate::config::AuthConfig;
use crate::model::{HttpMethod, RequestBody, RequestDescriptor};
use crate::token::{TokenProvider, TokenRequest, TokenResult};

/// Executes request intents against the web API.
///
/// Every call builds a fresh [`RequestDescriptor`], optionally asks the
/// [`TokenProvider`] for a token, sends the request, and parses the response
/// as JSON. Cookies set by the server are always sent back, whether or not a
/// bearer token is attached.
///
/// # Example
///
/// ```rust,no_run
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// use std::sync::Arc;
/// use authfetch_core::{AuthConfig, FetchClient, MemoryTokenProvider};
///
/// let provider = Arc::new(MemoryTokenProvider::new());
/// let client = FetchClient::builder(provider)
///     .config(&AuthConfig::default())
///     .build()?;
///
/// let pong = client.json_fetch("/ping", None, None).await?;
/// println!("{}", pong);
/// # Ok(())
/// # }
/// ```
pub struct FetchClient<P: TokenProvider + ?Sized> {
    provider: Arc<P>,
    http: reqwest::Client,
    base_url: Option<String>,
    scopes: Vec<String>,
    state: watch::Sender<FetchState>,
}

impl<P: TokenProvider + ?Sized> FetchClient<P> {
    /// Start building a client around a token provider.
    pub fn builder(provider: Arc<P>) -> FetchClientBuilder<P> {
        FetchClientBuilder::new(provider)
    }

    /// Unauthenticated JSON call.
    ///
    /// Without an explicit method, POST is used when `data` is present and GET
    /// otherwise.
    pub async fn json_fetch(
        &self,
        endpoint: &str,
        data: Option<Value>,
        method: Option<HttpMethod>,
    ) -> Result<Value, FetchError> {
        let method = HttpMethod::resolve(method, has_json_body(&data));
        self.execute(method, endpoint, false, data, None).await
    }

    /// Authenticated JSON call. Same method rule as [`json_fetch`](Self::json_fetch).
    pub async fn json_auth_fetch(
        &self,
        endpoint: &str,
        data: Option<Value>,
        method: Option<HttpMethod>,
    ) -> Result<Value, FetchError> {
        let method = HttpMethod::resolve(method, has_json_body(&data));
        self.execute(method, endpoint, true, data, None).await
    }

    /// Authenticated multipart POST.
    pub async fn form_auth_fetch(&self, endpoint: &str, form: Form) -> Result<Value, FetchError> {
        self.execute(HttpMethod::Post, endpoint, true, Some(json!({})), Some(form))
            .await
    }

    /// Execute a request.
    ///
    /// * `authed` - attach a bearer token if an account is active. With no
    ///   active account the request goes out without one.
    /// * `json` - serialized as the body with `Content-Type: application/json`.
    /// * `form` - sent as multipart; overrides `json` when both are given.
    pub async fn execute(
        &self,
        method: HttpMethod,
        endpoint: &str,
        authed: bool,
        json: Option<Value>,
        form: Option<Form>,
    ) -> Result<Value, FetchError> {
        let request = RequestDescriptor::new(method, endpoint)
            .authed(authed)
            .with_body(RequestBody::from_parts(json, form));
        self.send(request).await
    }

    /// Execute a prepared request descriptor.
    ///
    /// Failures are recorded in [`FetchState::error`] before being returned.
    pub async fn send(&self, request: RequestDescriptor) -> Result<Value, FetchError> {
        match self.run(request).await {
            Ok(data) => {
                self.state.send_modify(|state| {
                    state.data = Some(data.clone());
                    state.is_loading = false;
                });
                Ok(data)
            }
            Err(e) => {
                self.state.send_modify(|state| {
                    state.error = Some(e.clone());
                    state.is_loading = false;
                });
                Err(e)
            }
        }
    }

    /// Snapshot of the loading/error/data flags.
    pub fn state(&self) -> FetchState {
        self.state.borrow().clone()
    }

    /// Receive every change of the flags.
    pub fn subscribe(&self) -> watch::Receiver<FetchState> {
        self.state.subscribe()
    }

    pub fn provider(&self) -> &Arc<P> {
        &self.provider
    }

    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    async fn run(&self, request: RequestDescriptor) -> Result<Value, FetchError> {
        let url = self.resolve_endpoint(&request.endpoint)?;
        debug!("{} {}", request.method, url);

        let mut builder = self.http.request(request.method.to_reqwest(), url);

        if let Some(content_type) = request.body.content_type() {
            builder = builder.header(CONTENT_TYPE, content_type);
        }

        builder = match request.body {
            RequestBody::None => builder,
            RequestBody::Json(value) => {
                let body = serde_json::to_string(&value).map_err(|e| FetchError::Serialization {
                    message: e.to_string(),
                })?;
                builder.body(body)
            }
            RequestBody::Form(form) => builder.multipart(form),
        };

        if let Some(token) = self.bearer_token(request.authed).await? {
            builder = builder.bearer_auth(token.access_token.expose());
        }

        self.state.send_modify(|state| state.is_loading = true);

        let response = builder
            .send()
            .await
            .map_err(|e| FetchError::NetworkError {
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::RequestFailed {
                status: status.as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::NetworkError {
                message: e.to_string(),
            })?;

        serde_json::from_slice(&bytes).map_err(|e| FetchError::ParseError {
            message: e.to_string(),
        })
    }

    /// Acquire a token when the call is authed and an account is active.
    ///
    /// Returns `Ok(None)` without contacting the provider otherwise.
    async fn bearer_token(&self, authed: bool) -> Result<Option<TokenResult>, FetchError> {
        if !authed {
            debug!("Not adding auth header");
            return Ok(None);
        }

        let Some(account) = self.provider.active_account() else {
            debug!("Not adding auth header: no active account");
            return Ok(None);
        };

        let request = TokenRequest::new(self.scopes.clone(), account);
        let token = self.provider.acquire_token_silent(&request).await?;

        debug!("Adding auth header.");
        Ok(Some(token))
    }

    fn resolve_endpoint(&self, endpoint: &str) -> Result<Url, FetchError> {
        let invalid = |message: String| FetchError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            message,
        };

        match Url::parse(endpoint) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => return Ok(url),
            Ok(url) => return Err(invalid(format!("unsupported scheme {:?}", url.scheme()))),
            Err(url::ParseError::RelativeUrlWithoutBase) => {}
            Err(e) => return Err(invalid(e.to_string())),
        }

        let base = self
            .base_url
            .as_deref()
            .ok_or_else(|| invalid("relative endpoint and no base URL configured".to_string()))?;

        let joined = format!(
            "{}/{}",
            base.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        );
        Url::parse(&joined).map_err(|e| invalid(e.to_string()))
    }
}

impl<P: TokenProvider + ?Sized> std::fmt::Debug for FetchClient<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchClient")
            .field("base_url", &self.base_url)
            .field("scopes", &self.scopes)
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

fn has_json_body(data: &Option<Value>) -> bool {
    data.as_ref().is_some_and(|v| !v.is_null())
}

/// Builder for [`FetchClient`].
pub struct FetchClientBuilder<P: TokenProvider + ?Sized> {
    provider: Arc<P>,
    http: Option<reqwest::Client>,
    base_url: Option<String>,
    scopes: Vec<String>,
}

impl<P: TokenProvider + ?Sized> FetchClientBuilder<P> {
    pub fn new(provider: Arc<P>) -> Self {
        Self {
            provider,
            http: None,
            base_url: None,
            scopes: Vec::new(),
        }
    }

    /// Take the base URL and login scopes from a configuration.
    pub fn config(mut self, config: &AuthConfig) -> Self {
        self.base_url = Some(config.api.base_url.clone());
        self.scopes = config.login_request.scopes.clone();
        self
    }

    /// Base URL that relative endpoints are appended to.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Scopes requested on every silent acquisition.
    pub fn scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    /// Use a preconfigured transport.
    ///
    /// The client should carry a cookie store if server cookies matter.
    pub fn http_client(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }

    pub fn build(self) -> Result<FetchClient<P>, FetchError> {
        if let Some(base) = &self.base_url {
            Url::parse(base).map_err(|e| FetchError::InvalidEndpoint {
                endpoint: base.clone(),
                message: format!("invalid base URL: {}", e),
            })?;
        }

        let http = match self.http {
            Some(http) => http,
            None => reqwest::Client::builder()
                .cookie_store(true)
                .build()
                .map_err(|e| FetchError::NetworkError {
                    message: format!("failed to build HTTP client: {}", e),
                })?,
        };

        let (state, _) = watch::channel(FetchState::default());

        Ok(FetchClient {
            provider: self.provider,
            http,
            base_url: self.base_url,
            scopes: self.scopes,
            state,
        })
    }
}
