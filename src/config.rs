use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;

use crate::token::TokenKind;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    /// `hourly`, `daily` or `never`
    pub rotation: String,
    pub server: ServerConfig,
    /// PostgreSQL connection URL; `DATABASE_URL` takes precedence
    #[serde(default)]
    pub postgres_url: Option<String>,
    #[serde(default)]
    pub database: DatabaseConfig,
    pub token: TokenConfig,
    #[serde(default)]
    pub transfer: TransferConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub acquire_timeout_ms: u64,
    pub run_migrations: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            max_connections: 20,
            acquire_timeout_ms: 5_000,
            run_migrations: true,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TokenConfig {
    /// `paseto` (default) or `jwt`
    #[serde(default)]
    pub token_type: TokenKind,
    /// Exactly 32 characters for PASETO, at least 32 for JWT
    pub symmetric_key: String,
    pub access_token_duration_secs: u64,
}

impl TokenConfig {
    pub fn access_token_duration(&self) -> Duration {
        Duration::from_secs(self.access_token_duration_secs)
    }
}

/// Transfer engine settings
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct TransferConfig {
    /// Per-transfer deadline; `None` waits indefinitely
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl TransferConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

impl AppConfig {
    /// Load `config/<env>.yaml` and apply environment overrides
    pub fn load(env: &str) -> Result<Self> {
        let config_path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path))?;
        let mut config = Self::from_yaml_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path))?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: AppConfig = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// `DATABASE_URL`, `TOKEN_SYMMETRIC_KEY` and `SERVER_ADDRESS` (`host:port`)
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(url) = lookup("DATABASE_URL") {
            self.postgres_url = Some(url);
        }
        if let Some(key) = lookup("TOKEN_SYMMETRIC_KEY") {
            self.token.symmetric_key = key;
        }
        if let Some(address) = lookup("SERVER_ADDRESS") {
            let (host, port) = address
                .rsplit_once(':')
                .with_context(|| format!("SERVER_ADDRESS must be host:port, got '{}'", address))?;
            self.server.host = host.to_string();
            self.server.port = port
                .parse()
                .with_context(|| format!("Invalid port in SERVER_ADDRESS: '{}'", port))?;
        }
        Ok(())
    }

    pub fn database_url(&self) -> Result<&str> {
        match self.postgres_url.as_deref() {
            Some(url) if !url.is_empty() => Ok(url),
            _ => bail!("postgres_url is not configured (set it in the config file or DATABASE_URL)"),
        }
    }
}
