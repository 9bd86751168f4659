//! Lazy settlement of an account's entitlement.
//!
//! An account's share of the pool since its last checkpoint is
//!
//! ```text
//! accrued = (total_earnings - earnings_snapshot) * balance / total_supply
//! ```
//!
//! computed multiply-first through a 256-bit intermediate and floored.
//! Settling adds `accrued` to `pending_withdrawable` and moves the snapshot
//! all the way to `total_earnings`, so the floored-off remainder is never
//! credited to the account later.

use divvy_core::error::LedgerError;
use divvy_core::{AccountId, AccountState, Amount};
use tracing::debug;

use crate::accumulator::EarningsAccumulator;
use crate::registry::AccountRegistry;

/// Outcome of settling one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settlement {
    /// Entitlement realized by this settlement.
    pub accrued: Amount,
    /// Pending entitlement after settlement.
    pub available: Amount,
}

/// Entitlement accrued by `account` since its snapshot, floored.
pub fn accrued(
    account: &AccountState,
    total_earnings: Amount,
    total_supply: Amount,
) -> Result<Amount, LedgerError> {
    let delta = total_earnings
        .checked_sub(account.earnings_snapshot)
        .ok_or(LedgerError::ArithmeticOverflow {
            context: "snapshot ahead of total earnings",
        })?;
    if delta.is_zero() || account.balance.is_zero() {
        return Ok(Amount::ZERO);
    }
    delta
        .mul_div_floor(account.balance, total_supply)
        .ok_or(LedgerError::ArithmeticOverflow {
            context: "settlement",
        })
}

/// Available entitlement of `account` without touching its checkpoint.
pub fn peek_available(
    registry: &AccountRegistry,
    accumulator: &EarningsAccumulator,
    id: &AccountId,
) -> Result<Amount, LedgerError> {
    let account = registry.get(id);
    let accrued = accrued(&account, accumulator.total(), registry.total_supply())?;
    account
        .pending_withdrawable
        .checked_add(accrued)
        .ok_or(LedgerError::ArithmeticOverflow {
            context: "pending withdrawable",
        })
}

/// Realize `id`'s accrual into its pending entitlement and advance its
/// snapshot to the current total.
///
/// Nothing is written if the arithmetic fails.
pub fn settle(
    registry: &mut AccountRegistry,
    accumulator: &EarningsAccumulator,
    id: &AccountId,
) -> Result<Settlement, LedgerError> {
    let total_earnings = accumulator.total();
    let account = registry.get(id);
    let accrued = accrued(&account, total_earnings, registry.total_supply())?;
    let available = account
        .pending_withdrawable
        .checked_add(accrued)
        .ok_or(LedgerError::ArithmeticOverflow {
            context: "pending withdrawable",
        })?;

    let entry = registry.entry_mut(id);
    entry.pending_withdrawable = available;
    entry.earnings_snapshot = total_earnings;

    if !accrued.is_zero() {
        debug!(account = %id, %accrued, %available, "settled");
    }
    Ok(Settlement { accrued, available })
}
