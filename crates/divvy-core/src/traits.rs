//! Trait interfaces for the Divvy ledger.
//!
//! These traits define the seams between the ledger and its collaborators:
//! - [`LedgerStore`]: durable ledger state (divvy-node implements with RocksDB)
//! - [`PayoutSink`]: moves withdrawn value out to an account

use crate::amount::Amount;
use crate::error::{DivvyError, PayoutError};
use crate::types::{AccountId, Changeset, LedgerSnapshot};

/// Durable storage for ledger state.
///
/// The global state and every account touched by a mutation must be
/// written in a single atomic step: a reader of the store never sees the
/// accumulator advanced without the matching account checkpoints.
pub trait LedgerStore: Send + Sync {
    /// Load the full ledger image. `None` if the store has never been initialized.
    fn load(&self) -> Result<Option<LedgerSnapshot>, DivvyError>;

    /// Write the genesis image into an empty store.
    fn initialize(&self, snapshot: &LedgerSnapshot) -> Result<(), DivvyError>;

    /// Atomically apply the state produced by one mutation.
    fn commit(&self, changes: &Changeset) -> Result<(), DivvyError>;
}

/// Destination for withdrawn value.
///
/// Called with the ledger's write lock held, after the account's pending
/// entitlement has been reduced. Returning an error undoes the reduction.
pub trait PayoutSink: Send + Sync {
    fn pay(&self, to: &AccountId, amount: Amount) -> Result<(), PayoutError>;
}
