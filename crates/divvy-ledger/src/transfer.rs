//! Share transfers.
//!
//! Both parties are settled at the old balances before any shares move, so
//! a receiver never accrues deposits made before it held the shares.

use divvy_core::error::LedgerError;
use divvy_core::{AccountId, Amount};

use crate::settlement::Settlement;
use crate::state::LedgerState;

/// A completed share transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShareTransfer {
    pub from: AccountId,
    pub to: AccountId,
    pub amount: Amount,
    pub from_settlement: Settlement,
    pub to_settlement: Settlement,
}

/// Settle `from` and `to`, then move `amount` shares between them.
///
/// Zero amounts and self-transfers are accepted and only settle. The
/// settlements survive an `InsufficientBalance` failure.
pub fn transfer(
    state: &mut LedgerState,
    from: &AccountId,
    to: &AccountId,
    amount: Amount,
) -> Result<ShareTransfer, LedgerError> {
    let from_settlement = state.settle(from)?;
    let to_settlement = if from == to {
        from_settlement
    } else {
        state.settle(to)?
    };

    state.registry.move_balance(from, to, amount)?;

    Ok(ShareTransfer {
        from: *from,
        to: *to,
        amount,
        from_settlement,
        to_settlement,
    })
}
