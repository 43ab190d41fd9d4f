//! authfetch CLI
//!
//! Command-line front end for calling the application API with the signed-in
//! user's bearer token.
//!
//! # Usage
//!
//! ```bash
//! # Ask the API who the current user is
//! AUTHFETCH_ACCOUNT=ada@example.com AUTHFETCH_ACCESS_TOKEN=... authfetch whoami
//!
//! # Authenticated POST with a JSON body
//! authfetch fetch /things --auth --json '{"x": 1}'
//!
//! # Multipart upload
//! authfetch fetch /upload --form title=report --file attachment=./report.pdf
//!
//! # Show the effective configuration
//! authfetch config
//! ```

use anyhow::{Context, Result, anyhow};
use authfetch_core::{
    Account, AuthConfig, AuthContext, EnvTokenProvider, FetchClient, HttpMethod,
    RefreshTokenProvider, SessionProbe, TokenProvider,
    multipart::{Form, Part},
};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt};

/// When set, tokens are obtained by exchanging this refresh token.
const REFRESH_TOKEN_ENV: &str = "AUTHFETCH_REFRESH_TOKEN";

#[derive(Parser)]
#[command(name = "authfetch")]
#[command(about = "Call a web API with the signed-in user's bearer token")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to the platform config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the API base URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask the API who the current user is
    Whoami,

    /// Send a request and print the JSON response
    Fetch {
        /// Absolute URL or path relative to the API base URL
        endpoint: String,

        /// HTTP method (GET, POST, PUT, DELETE)
        #[arg(short, long)]
        method: Option<HttpMethod>,

        /// JSON body
        #[arg(short, long, conflicts_with_all = ["form", "file"])]
        json: Option<String>,

        /// Multipart text field (key=value), repeatable
        #[arg(long)]
        form: Vec<String>,

        /// Multipart file field (key=path), repeatable
        #[arg(long)]
        file: Vec<String>,

        /// Attach a bearer token when an account is signed in
        #[arg(short, long)]
        auth: bool,
    },

    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let config = load_effective_config(cli.config.as_deref(), cli.base_url.as_deref())?;

    match cli.command {
        Commands::Whoami => whoami(&config).await,
        Commands::Fetch {
            endpoint,
            method,
            json,
            form,
            file,
            auth,
        } => fetch(&config, &endpoint, method, json.as_deref(), &form, &file, auth).await,
        Commands::Config => show_config(&config),
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_effective_config(path: Option<&Path>, base_url: Option<&str>) -> Result<AuthConfig> {
    let mut config = match path {
        Some(path) => AuthConfig::load_from_path(path)?.with_env_overrides(),
        None => authfetch_core::load_config()?,
    };

    if let Some(base_url) = base_url {
        config.api.base_url = base_url.to_string();
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn token_provider(config: &AuthConfig) -> Result<Arc<dyn TokenProvider>> {
    let env = EnvTokenProvider::new();

    match std::env::var(REFRESH_TOKEN_ENV) {
        Ok(refresh_token) if !refresh_token.is_empty() => {
            let account = env
                .active_account()
                .ok_or_else(|| anyhow!("{} requires AUTHFETCH_ACCOUNT", REFRESH_TOKEN_ENV))?;
            info!("Using refresh-token grant for {}", account);
            let provider = RefreshTokenProvider::new(config)?;
            provider.sign_in(account, refresh_token);
            Ok(Arc::new(provider))
        }
        _ => {
            debug!("Using environment token provider");
            Ok(Arc::new(env))
        }
    }
}

fn build_client(config: &AuthConfig) -> Result<FetchClient<dyn TokenProvider>> {
    let provider = token_provider(config)?;
    Ok(FetchClient::builder(provider).config(config).build()?)
}

async fn whoami(config: &AuthConfig) -> Result<()> {
    let client = Arc::new(build_client(config)?);
    let context = Arc::new(AuthContext::new());
    let probe = SessionProbe::from_config(client, context, config);

    let outcome = probe.probe().await;
    println!("{}", serde_json::to_string_pretty(&probe.status())?);

    outcome
        .map(|_| ())
        .with_context(|| format!("Failed to query {}", probe.endpoint()))
}

async fn fetch(
    config: &AuthConfig,
    endpoint: &str,
    method: Option<HttpMethod>,
    json: Option<&str>,
    form_fields: &[String],
    file_fields: &[String],
    auth: bool,
) -> Result<()> {
    let client = build_client(config)?;

    let data = if !form_fields.is_empty() || !file_fields.is_empty() {
        let form = build_form(form_fields, file_fields).await?;
        if auth {
            client.form_auth_fetch(endpoint, form).await?
        } else {
            let method = method.unwrap_or(HttpMethod::Post);
            client.execute(method, endpoint, false, None, Some(form)).await?
        }
    } else {
        let body = json
            .map(serde_json::from_str::<Value>)
            .transpose()
            .context("--json is not valid JSON")?;
        if auth {
            client.json_auth_fetch(endpoint, body, method).await?
        } else {
            client.json_fetch(endpoint, body, method).await?
        }
    };

    println!("{}", serde_json::to_string_pretty(&data)?);
    Ok(())
}

fn show_config(config: &AuthConfig) -> Result<()> {
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

/// Split a `key=value` argument.
fn parse_field(field: &str) -> Result<(String, String)> {
    let (key, value) = field
        .split_once('=')
        .ok_or_else(|| anyhow!("expected key=value, got {:?}", field))?;
    if key.is_empty() {
        return Err(anyhow!("empty field name in {:?}", field));
    }
    Ok((key.to_string(), value.to_string()))
}

async fn build_form(form_fields: &[String], file_fields: &[String]) -> Result<Form> {
    let mut form = Form::new();

    for field in form_fields {
        let (name, value) = parse_field(field)?;
        form = form.text(name, value);
    }

    for field in file_fields {
        let (name, path) = parse_field(field)?;
        let path = PathBuf::from(path);
        let content = tokio::fs::read(&path)
            .await
            .with_context(|| format!("Failed to read {:?}", path))?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("file")
            .to_string();
        form = form.part(name, Part::bytes(content).file_name(file_name));
    }

    Ok(form)
}
