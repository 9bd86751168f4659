//! Withdrawal of settled entitlement.

use divvy_core::error::LedgerError;
use divvy_core::{AccountId, Amount};

use crate::settlement::Settlement;
use crate::state::LedgerState;

/// A completed withdrawal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Withdrawal {
    pub account: AccountId,
    pub amount: Amount,
    /// The settlement performed before the amount was checked.
    pub settlement: Settlement,
}

impl Withdrawal {
    /// Entitlement left to the account afterwards.
    pub fn remaining(&self) -> Amount {
        self.settlement.available.saturating_sub(self.amount)
    }
}

/// Settle `id`, then take `amount` out of its pending entitlement.
///
/// The settlement is kept even when the amount exceeds what is available;
/// only the debit is refused. A zero amount settles and debits nothing.
pub fn withdraw(
    state: &mut LedgerState,
    id: &AccountId,
    amount: Amount,
) -> Result<Withdrawal, LedgerError> {
    let settlement = state.settle(id)?;

    let remaining = settlement.available.checked_sub(amount).ok_or(
        LedgerError::InsufficientEntitlement {
            requested: amount,
            available: settlement.available,
        },
    )?;
    let withdrawn = state
        .total_withdrawn
        .checked_add(amount)
        .ok_or(LedgerError::ArithmeticOverflow {
            context: "total withdrawn",
        })?;

    state.registry.entry_mut(id).pending_withdrawable = remaining;
    state.total_withdrawn = withdrawn;

    Ok(Withdrawal {
        account: *id,
        amount,
        settlement,
    })
}

/// Give a withdrawn amount back after the payout failed.
///
/// The settlement that preceded the withdrawal stays in place.
pub(crate) fn refund(state: &mut LedgerState, withdrawal: &Withdrawal) {
    let entry = state.registry.entry_mut(&withdrawal.account);
    entry.pending_withdrawable = entry
        .pending_withdrawable
        .checked_add(withdrawal.amount)
        .unwrap_or(withdrawal.settlement.available);
    state.total_withdrawn = state.total_withdrawn.saturating_sub(withdrawal.amount);
}

#[cfg(test)]
mod tests {
    use super::*;
    use divvy_core::constants::UNIT;
    use divvy_core::TokenInfo;

    fn id(seed: u8) -> AccountId {
        AccountId([seed; 20])
    }

    fn units(n: u128) -> Amount {
        Amount::from_units(n).unwrap()
    }

    fn milli(n: u128) -> Amount {
        Amount::new(n * UNIT / 1000)
    }

    fn state() -> LedgerState {
        LedgerState::genesis(TokenInfo::default(), units(100), id(0)).unwrap()
    }

    #[test]
    fn withdraw_debits_pending() {
        let mut s = state();
        s.deposit(units(2)).unwrap();
        let w = s.withdraw(&id(0), units(1)).unwrap();
        assert_eq!(w.amount, units(1));
        assert_eq!(w.settlement.accrued, units(2));
        assert_eq!(w.remaining(), units(1));
        assert_eq!(s.left_for_withdrawal(&id(0)), units(1));
        assert_eq!(s.total_withdrawn(), units(1));
    }

    #[test]
    fn withdraw_everything() {
        let mut s = state();
        s.deposit(units(1)).unwrap();
        s.withdraw(&id(0), units(1)).unwrap();
        assert_eq!(s.available_for_withdrawal(&id(0)).unwrap(), Amount::ZERO);
        assert_eq!(s.pool_balance(), Amount::ZERO);
    }

    #[test]
    fn overdraw_keeps_settlement() {
        let mut s = state();
        s.transfer(&id(0), &id(1), units(10)).unwrap();
        s.deposit(units(1)).unwrap();

        let err = s.withdraw(&id(1), milli(200)).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientEntitlement {
                requested: milli(200),
                available: milli(100),
            }
        );
        // The settlement happened even though the debit was refused.
        assert_eq!(s.left_for_withdrawal(&id(1)), milli(100));
        assert_eq!(s.snapshot_total_earnings(&id(1)), units(1));
        assert_eq!(s.total_withdrawn(), Amount::ZERO);
    }

    #[test]
    fn zero_withdrawal_only_settles() {
        let mut s = state();
        s.deposit(units(1)).unwrap();
        let w = s.withdraw(&id(0), Amount::ZERO).unwrap();
        assert_eq!(w.amount, Amount::ZERO);
        assert_eq!(s.left_for_withdrawal(&id(0)), units(1));
        assert_eq!(s.total_withdrawn(), Amount::ZERO);
    }

    #[test]
    fn stranger_cannot_withdraw() {
        let mut s = state();
        s.deposit(units(1)).unwrap();
        assert!(matches!(
            s.withdraw(&id(9), Amount::new(1)),
            Err(LedgerError::InsufficientEntitlement { .. })
        ));
    }

    #[test]
    fn refund_reverses_debit_only() {
        let mut s = state();
        s.deposit(units(3)).unwrap();
        let w = s.withdraw(&id(0), units(2)).unwrap();
        refund(&mut s, &w);
        assert_eq!(s.left_for_withdrawal(&id(0)), units(3));
        assert_eq!(s.snapshot_total_earnings(&id(0)), units(3));
        assert_eq!(s.total_withdrawn(), Amount::ZERO);
    }
}
