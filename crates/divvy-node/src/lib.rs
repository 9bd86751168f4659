//! # divvy-node: RocksDB storage and node composition.
//!
//! - [`storage::RocksStore`]: durable ledger state backed by RocksDB
//! - [`node::Node`]: opens the store and the ledger on top of it
//! - [`config::NodeConfig`]: node configuration

pub mod config;
pub mod node;
pub mod storage;

pub use config::NodeConfig;
pub use node::Node;
pub use storage::RocksStore;
