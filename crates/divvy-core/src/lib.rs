//! # divvy-core
//! Foundation types and traits for the Divvy dividend ledger.

pub mod amount;
pub mod constants;
pub mod error;
pub mod traits;
pub mod types;

pub use amount::Amount;
pub use error::{DivvyError, LedgerError};
pub use types::{AccountId, AccountState, GlobalState, LedgerEvent, TokenInfo};
