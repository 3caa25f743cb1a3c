//! Process configuration read from environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use bazaar_auth::{Role, UserAccount};
use bazaar_core::UserId;

use crate::assets::AssetConfig;

const DEV_JWT_SECRET: &str = "dev-secret";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} has invalid value '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0} must be set")]
    Missing(&'static str),
}

/// Settings for the HTTP binary and the services it wires.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub upload_dir: PathBuf,
    /// Request body limit for multipart uploads.
    pub max_upload_bytes: usize,
    pub io_timeout: Duration,
    pub use_persistent_stores: bool,
    pub database_url: Option<String>,
    /// Seller accounts registered at startup, from `SEED_SELLERS`.
    pub seed_sellers: Vec<UserAccount>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            jwt_secret: DEV_JWT_SECRET.to_string(),
            upload_dir: PathBuf::from("./uploads"),
            max_upload_bytes: 10 * 1024 * 1024,
            io_timeout: Duration::from_millis(5000),
            use_persistent_stores: false,
            database_url: None,
            seed_sellers: Vec::new(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unset keys fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let bind_addr = parse_or("BIND_ADDR", lookup("BIND_ADDR"), defaults.bind_addr)?;
        let jwt_secret = lookup("JWT_SECRET").unwrap_or_else(|| {
            tracing::warn!("JWT_SECRET not set; using insecure dev default");
            defaults.jwt_secret
        });
        let upload_dir = lookup("UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.upload_dir);
        let max_upload_bytes = parse_or(
            "MAX_UPLOAD_BYTES",
            lookup("MAX_UPLOAD_BYTES"),
            defaults.max_upload_bytes,
        )?;
        let io_timeout_ms: u64 = parse_or("IO_TIMEOUT_MS", lookup("IO_TIMEOUT_MS"), 5000)?;
        if io_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                var: "IO_TIMEOUT_MS",
                value: "0".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        let use_persistent_stores = parse_or(
            "USE_PERSISTENT_STORES",
            lookup("USE_PERSISTENT_STORES"),
            false,
        )?;
        let database_url = lookup("DATABASE_URL");
        if use_persistent_stores && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }
        let seed_sellers = match lookup("SEED_SELLERS") {
            Some(raw) => parse_seed_sellers(&raw)?,
            None => defaults.seed_sellers,
        };

        Ok(Self {
            bind_addr,
            jwt_secret,
            upload_dir,
            max_upload_bytes,
            io_timeout: Duration::from_millis(io_timeout_ms),
            use_persistent_stores,
            database_url,
            seed_sellers,
        })
    }

    pub fn asset_config(&self) -> AssetConfig {
        AssetConfig::new(self.upload_dir.clone()).with_io_timeout(self.io_timeout)
    }
}

/// `SEED_SELLERS` is a comma-separated list of `<uuid>` or `<uuid>=<display name>`.
fn parse_seed_sellers(raw: &str) -> Result<Vec<UserAccount>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (id, name) = match entry.split_once('=') {
                Some((id, name)) => (id.trim(), Some(name.trim())),
                None => (entry, None),
            };
            let id: UserId = id.parse().map_err(|e| ConfigError::Invalid {
                var: "SEED_SELLERS",
                value: entry.to_string(),
                reason: format!("{e}"),
            })?;
            let display_name = match name {
                Some(name) if !name.is_empty() => name.to_string(),
                _ => format!("seller-{id}"),
            };
            Ok(UserAccount {
                id,
                display_name,
                role: Role::SELLER,
            })
        })
        .collect()
}

fn parse_or<T>(var: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: e.to_string(),
            value,
        }),
    }
}
