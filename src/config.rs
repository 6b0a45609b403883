//! TOML configuration.
//!
//! Only `[db]` and `[server]` are required; every other section falls
//! back to defaults. See `config/markflow.example.toml`.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use markflow_core::auth::{AuthProvider, Credential};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    pub server: ServerConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub seed: SeedConfig,
    #[serde(default)]
    pub visits: VisitsConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FetchConfig {
    #[serde(default = "default_fetch_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_fetch_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_fetch_timeout() -> u64 {
    10
}
fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/120.0.0.0 Safari/537.36"
        .to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct SeedConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_seed_url")]
    pub url: String,
    #[serde(default = "default_seed_count")]
    pub count: usize,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: default_seed_url(),
            count: default_seed_count(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_seed_url() -> String {
    "https://dummyjson.com/products".to_string()
}
fn default_seed_count() -> usize {
    20
}

#[derive(Debug, Deserialize, Clone)]
pub struct VisitsConfig {
    #[serde(default = "default_visits_path")]
    pub path: PathBuf,
}

impl Default for VisitsConfig {
    fn default() -> Self {
        Self {
            path: default_visits_path(),
        }
    }
}

fn default_visits_path() -> PathBuf {
    PathBuf::from("./data/visits.json")
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: i64,
    #[serde(default = "AuthProvider::demo_users")]
    pub users: Vec<Credential>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_ttl_secs: default_session_ttl(),
            users: AuthProvider::demo_users(),
        }
    }
}

fn default_session_ttl() -> i64 {
    60 * 60 * 24 * 7
}

impl Config {
    /// Config for commands that only need a database path.
    pub fn with_db(path: impl Into<PathBuf>) -> Self {
        Self {
            db: DbConfig { path: path.into() },
            server: ServerConfig {
                bind: "127.0.0.1:3000".to_string(),
            },
            fetch: FetchConfig::default(),
            seed: SeedConfig::default(),
            visits: VisitsConfig::default(),
            auth: AuthConfig::default(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.fetch.timeout_secs == 0 {
        anyhow::bail!("fetch.timeout_secs must be > 0");
    }

    if config.seed.count == 0 || config.seed.count > 100 {
        anyhow::bail!("seed.count must be in 1..=100");
    }

    if config.auth.session_ttl_secs <= 0 {
        anyhow::bail!("auth.session_ttl_secs must be > 0");
    }

    if let Some(user) = config.auth.users.iter().find(|u| u.email.trim().is_empty()) {
        anyhow::bail!("auth.users entry '{}' has an empty email", user.name);
    }

    Ok(())
}
