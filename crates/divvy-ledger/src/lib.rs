//! # divvy-ledger: Proportional-dividend settlement engine.
//!
//! All calculations use integer arithmetic only for determinism.
//!
//! Deposits bump a single global accumulator in O(1). Each account keeps a
//! checkpoint of the accumulator from its last settlement, and its
//! entitlement is computed lazily from the delta:
//! - **Registry**: share balances against a fixed total supply.
//! - **Accumulator**: cumulative deposited value, never decreasing.
//! - **Settlement**: `pending += (total − snapshot) × balance / supply`,
//!   floor division, then `snapshot = total`. Sub-unit dust is forfeited.
//! - **Withdrawal / transfer**: always settle first, then validate and mutate.
//!
//! [`Ledger`] wraps the state in a read-write lock, persists every mutation
//! through a [`LedgerStore`](divvy_core::traits::LedgerStore) and publishes
//! events on a broadcast channel.

pub mod accumulator;
pub mod ledger;
pub mod payout;
pub mod registry;
pub mod settlement;
pub mod state;
pub mod transfer;
pub mod withdrawal;

pub use accumulator::EarningsAccumulator;
pub use ledger::{Genesis, Ledger};
pub use payout::PayoutLog;
pub use registry::AccountRegistry;
pub use settlement::Settlement;
pub use state::LedgerState;
pub use transfer::ShareTransfer;
pub use withdrawal::Withdrawal;
