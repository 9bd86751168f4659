//! In-memory payout sink.

use std::collections::HashMap;

use divvy_core::error::PayoutError;
use divvy_core::traits::PayoutSink;
use divvy_core::{AccountId, Amount};
use parking_lot::Mutex;

/// Records every payout instead of moving value anywhere.
///
/// The default sink for embedded and CLI use.
#[derive(Debug, Default)]
pub struct PayoutLog {
    inner: Mutex<PayoutTotals>,
}

#[derive(Debug, Default)]
struct PayoutTotals {
    per_account: HashMap<AccountId, Amount>,
    total: Amount,
}

impl PayoutLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything paid to `account` so far.
    pub fn paid_to(&self, account: &AccountId) -> Amount {
        self.inner
            .lock()
            .per_account
            .get(account)
            .copied()
            .unwrap_or(Amount::ZERO)
    }

    pub fn total_paid(&self) -> Amount {
        self.inner.lock().total
    }
}

impl PayoutSink for PayoutLog {
    fn pay(&self, to: &AccountId, amount: Amount) -> Result<(), PayoutError> {
        let mut inner = self.inner.lock();
        let rejected = |reason: &str| PayoutError::Rejected {
            account: to.to_string(),
            reason: reason.to_string(),
        };
        let total = inner
            .total
            .checked_add(amount)
            .ok_or_else(|| rejected("payout total overflows"))?;
        let current = inner.per_account.get(to).copied().unwrap_or(Amount::ZERO);
        let paid = current
            .checked_add(amount)
            .ok_or_else(|| rejected("account payout overflows"))?;
        inner.per_account.insert(*to, paid);
        inner.total = total;
        Ok(())
    }
}
