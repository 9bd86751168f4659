//! Node composition.
//!
//! [`Node`] opens the RocksDB store under the configured data directory
//! and runs a [`Ledger`] on top of it.

use std::sync::Arc;

use tracing::info;

use divvy_core::traits::PayoutSink;
use divvy_core::DivvyError;
use divvy_ledger::Ledger;

use crate::config::NodeConfig;
use crate::storage::RocksStore;

/// A ledger bound to its durable store.
pub struct Node {
    ledger: Arc<Ledger>,
    storage: Arc<RocksStore>,
    config: NodeConfig,
}

impl Node {
    /// Open the store at `config.db_path()` and load or initialize the ledger.
    pub fn open(config: NodeConfig, payout: Arc<dyn PayoutSink>) -> Result<Self, DivvyError> {
        std::fs::create_dir_all(&config.data_dir).map_err(|e| {
            DivvyError::Storage(format!("create {}: {e}", config.data_dir.display()))
        })?;
        let storage = Arc::new(RocksStore::open(config.db_path())?);
        let ledger = Ledger::open(config.genesis(), storage.clone(), payout)?;
        info!(
            data_dir = %config.data_dir.display(),
            total_earnings = %ledger.total_earnings(),
            "node ready"
        );
        Ok(Self {
            ledger: Arc::new(ledger),
            storage,
            config,
        })
    }

    pub fn ledger(&self) -> &Arc<Ledger> {
        &self.ledger
    }

    pub fn storage(&self) -> &RocksStore {
        &self.storage
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Flush the store to disk.
    pub fn shutdown(&self) -> Result<(), DivvyError> {
        self.storage.flush()?;
        info!("node shut down");
        Ok(())
    }
}
