//! Node configuration for a Divvy ledger instance.
//!
//! [`NodeConfig`] carries defaults for the data directory, log level and
//! genesis parameters. [`NodeConfig::from_env`] overlays `DIVVY_*`
//! environment variables on top of the defaults.

use std::path::PathBuf;

use divvy_core::constants::DEFAULT_TOTAL_SUPPLY;
use divvy_core::{AccountId, Amount, DivvyError, TokenInfo};
use divvy_ledger::Genesis;

pub const ENV_DATA_DIR: &str = "DIVVY_DATA_DIR";
pub const ENV_LOG_LEVEL: &str = "DIVVY_LOG_LEVEL";
pub const ENV_DEPLOYER: &str = "DIVVY_DEPLOYER";
pub const ENV_INITIAL_SUPPLY: &str = "DIVVY_INITIAL_SUPPLY";

/// Configuration for a ledger node.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Root directory for all persistent data.
    pub data_dir: PathBuf,
    /// Log level filter string (e.g. "info", "debug", "divvy_ledger=trace").
    pub log_level: String,
    /// Account credited with the whole supply at genesis.
    pub deployer: AccountId,
    /// Share supply minted at genesis, in base units.
    pub initial_supply: Amount,
    pub token: TokenInfo,
}

impl Default for NodeConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("divvy");

        Self {
            data_dir,
            log_level: "info".to_string(),
            deployer: AccountId::ZERO,
            initial_supply: Amount::new(DEFAULT_TOTAL_SUPPLY),
            token: TokenInfo::default(),
        }
    }
}

impl NodeConfig {
    /// Defaults overlaid with the process environment.
    pub fn from_env() -> Result<Self, DivvyError> {
        Self::default().overlay(|key| std::env::var(key).ok())
    }

    /// Apply `DIVVY_*` values from `lookup`; unset keys keep their value.
    pub fn overlay(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, DivvyError> {
        if let Some(dir) = lookup(ENV_DATA_DIR) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.log_level = level;
        }
        if let Some(deployer) = lookup(ENV_DEPLOYER) {
            self.deployer = deployer
                .parse()
                .map_err(|e| DivvyError::Config(format!("{ENV_DEPLOYER}: {e}")))?;
        }
        if let Some(supply) = lookup(ENV_INITIAL_SUPPLY) {
            self.initial_supply = supply
                .parse()
                .map_err(|e| DivvyError::Config(format!("{ENV_INITIAL_SUPPLY}: {e}")))?;
        }
        Ok(self)
    }

    /// Path to the RocksDB ledger data directory.
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("ledgerdata")
    }

    /// Genesis parameters used when the store is empty.
    pub fn genesis(&self) -> Genesis {
        Genesis {
            token: self.token.clone(),
            total_supply: self.initial_supply,
            deployer: self.deployer,
        }
    }
}
