use crate::services::token_service::DEFAULT_TOKEN_KEYS;
use anyhow::{Context, Result};
use clap::Parser;
use std::env;

const ENV_PREFIX: &str = "BUCKET_BROWSER_";

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub storage_dir: String,
    pub database_url: String,
    pub assets_dir: Option<String>,
    pub list_limit: usize,
    pub token_keys: Vec<String>,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Read-only directory browser for an object store")]
pub struct Args {
    /// Host to bind to (overrides BUCKET_BROWSER_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides BUCKET_BROWSER_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Directory whose files are served as objects (overrides BUCKET_BROWSER_STORAGE_DIR)
    #[arg(long)]
    pub storage_dir: Option<String>,

    /// SQLite database holding the download secrets (overrides BUCKET_BROWSER_DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Built UI to serve for non-API paths (overrides BUCKET_BROWSER_ASSETS_DIR)
    #[arg(long)]
    pub assets_dir: Option<String>,

    /// Maximum entries per listing page, 1-1000 (overrides BUCKET_BROWSER_LIST_LIMIT)
    #[arg(long)]
    pub list_limit: Option<usize>,

    /// Comma-separated secret names probed in order (overrides BUCKET_BROWSER_TOKEN_KEYS)
    #[arg(long)]
    pub token_keys: Option<String>,

    /// Run migrations and exit
    #[arg(long)]
    pub migrate: bool,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and migrate flag.
    pub fn from_env_and_args() -> Result<(Self, bool)> {
        let args = Args::parse();
        let migrate = args.migrate;
        let cfg = Self::from_sources(args, |name| env::var(name).ok())?;
        Ok((cfg, migrate))
    }

    /// Merge CLI args over environment values over defaults.
    pub fn from_sources(args: Args, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |name: &str| env(&format!("{}{}", ENV_PREFIX, name));

        // --- Environment fallback ---
        let env_host = var("HOST").unwrap_or_else(|| "0.0.0.0".into());
        let env_port = match var("PORT") {
            Some(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing {}PORT value `{}`", ENV_PREFIX, value))?,
            None => 8787,
        };
        let env_storage = var("STORAGE_DIR").unwrap_or_else(|| "./data/objects".into());
        let env_db =
            var("DATABASE_URL").unwrap_or_else(|| "sqlite://./data/meta/secrets.db".into());
        let env_assets = var("ASSETS_DIR").filter(|dir| !dir.is_empty());
        let env_limit = match var("LIST_LIMIT") {
            Some(value) => value
                .parse::<usize>()
                .with_context(|| format!("parsing {}LIST_LIMIT value `{}`", ENV_PREFIX, value))?,
            None => 1000,
        };
        let env_keys = var("TOKEN_KEYS");

        // --- Merge ---
        let token_keys = args
            .token_keys
            .or(env_keys)
            .map(|raw| parse_token_keys(&raw))
            .filter(|keys| !keys.is_empty())
            .unwrap_or_else(|| DEFAULT_TOKEN_KEYS.iter().map(|k| k.to_string()).collect());

        Ok(Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            storage_dir: args.storage_dir.unwrap_or(env_storage),
            database_url: args.database_url.unwrap_or(env_db),
            assets_dir: args.assets_dir.or(env_assets),
            list_limit: args.list_limit.unwrap_or(env_limit).clamp(1, 1000),
            token_keys,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_token_keys(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(str::to_string)
        .collect()
}
