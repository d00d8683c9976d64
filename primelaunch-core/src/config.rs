//! Launchpad configuration.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use zeroize::Zeroizing;

use crate::types::Address;
use crate::{
    DECRYPT_DURATION_DAYS, DEFAULT_REFRESH_INTERVAL_SECS, MINT_NOTICE_SECS,
};

/// Default JSON-RPC endpoint (a local hardhat node).
pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";

/// Sepolia.
pub const DEFAULT_CHAIN_ID: u64 = 11155111;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },

    #[error("failed to read deployment file {path}: {reason}")]
    Deployment { path: PathBuf, reason: String },
}

/// Deployment record as written by hardhat-deploy.
#[derive(Clone, Debug, Deserialize)]
pub struct Deployment {
    pub address: Address,
}

impl Deployment {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let err = |reason: String| ConfigError::Deployment {
            path: path.to_path_buf(),
            reason,
        };
        let raw = fs::read_to_string(path).map_err(|e| err(e.to_string()))?;
        serde_json::from_str(&raw).map_err(|e| err(e.to_string()))
    }
}

/// Launchpad configuration.
#[derive(Clone)]
pub struct LaunchpadConfig {
    /// JSON-RPC endpoint.
    pub rpc_url: String,
    pub chain_id: u64,
    /// `PrimeLaunchFactory` address.
    pub factory_address: Address,
    /// Wallet key; read-only when absent.
    pub private_key: Option<Zeroizing<String>>,
    /// Registry and balance polling interval.
    pub refresh_interval: Duration,
    pub decrypt_duration_days: u64,
    /// Confirmations awaited per write.
    pub confirmations: usize,
    /// Lifetime of the mint notice.
    pub notice_ttl: Duration,
}

impl std::fmt::Debug for LaunchpadConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LaunchpadConfig")
            .field("rpc_url", &self.rpc_url)
            .field("chain_id", &self.chain_id)
            .field("factory_address", &self.factory_address)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("refresh_interval", &self.refresh_interval)
            .field("decrypt_duration_days", &self.decrypt_duration_days)
            .field("confirmations", &self.confirmations)
            .field("notice_ttl", &self.notice_ttl)
            .finish()
    }
}

impl LaunchpadConfig {
    /// Configuration with defaults for everything but the factory.
    pub fn new(factory_address: Address) -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            chain_id: DEFAULT_CHAIN_ID,
            factory_address,
            private_key: None,
            refresh_interval: Duration::from_secs(DEFAULT_REFRESH_INTERVAL_SECS),
            decrypt_duration_days: DECRYPT_DURATION_DAYS,
            confirmations: 1,
            notice_ttl: Duration::from_secs(MINT_NOTICE_SECS),
        }
    }

    /// Load configuration from `PRIMELAUNCH_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let factory_address = match lookup("PRIMELAUNCH_FACTORY_ADDRESS") {
            Some(raw) => parse("PRIMELAUNCH_FACTORY_ADDRESS", &raw)?,
            None => {
                let path = lookup("PRIMELAUNCH_DEPLOYMENT_FILE")
                    .ok_or(ConfigError::Missing("PRIMELAUNCH_FACTORY_ADDRESS"))?;
                Deployment::load(path)?.address
            }
        };

        let mut config = Self::new(factory_address);
        if let Some(url) = lookup("PRIMELAUNCH_RPC_URL") {
            config.rpc_url = url;
        }
        config.private_key = lookup("PRIMELAUNCH_PRIVATE_KEY")
            .filter(|k| !k.trim().is_empty())
            .map(Zeroizing::new);

        config.chain_id = parse_or(&lookup, "PRIMELAUNCH_CHAIN_ID", config.chain_id)?;
        config.decrypt_duration_days = parse_or(
            &lookup,
            "PRIMELAUNCH_DECRYPT_DURATION_DAYS",
            config.decrypt_duration_days,
        )?;
        config.confirmations = parse_or(&lookup, "PRIMELAUNCH_CONFIRMATIONS", config.confirmations)?;

        let refresh_secs = parse_or(
            &lookup,
            "PRIMELAUNCH_REFRESH_INTERVAL_SECS",
            DEFAULT_REFRESH_INTERVAL_SECS,
        )?;
        if refresh_secs == 0 {
            return Err(ConfigError::Invalid {
                name: "PRIMELAUNCH_REFRESH_INTERVAL_SECS",
                value: "0".into(),
            });
        }
        config.refresh_interval = Duration::from_secs(refresh_secs);

        let notice_secs = parse_or(&lookup, "PRIMELAUNCH_NOTICE_SECS", MINT_NOTICE_SECS)?;
        config.notice_ttl = Duration::from_secs(notice_secs);

        Ok(config)
    }
}

fn parse<T: std::str::FromStr>(name: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::Invalid {
        name,
        value: raw.to_string(),
    })
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        Some(raw) => parse(name, &raw),
        None => Ok(default),
    }
}
