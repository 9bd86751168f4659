//! The earnings accumulator: total value ever deposited into the pool.

use divvy_core::error::LedgerError;
use divvy_core::Amount;

/// Monotonically non-decreasing deposit counter.
///
/// A deposit touches nothing but this counter, so its cost does not depend
/// on the number of share holders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EarningsAccumulator {
    total_earnings: Amount,
}

impl EarningsAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume from a persisted total.
    pub fn with_total(total_earnings: Amount) -> Self {
        Self { total_earnings }
    }

    pub fn total(&self) -> Amount {
        self.total_earnings
    }

    /// Add `amount` to the pool and return the new total.
    ///
    /// Zero deposits and overflow are rejected; the counter is unchanged on error.
    pub fn deposit(&mut self, amount: Amount) -> Result<Amount, LedgerError> {
        if amount.is_zero() {
            return Err(LedgerError::InvalidAmount {
                reason: "deposit must be positive".into(),
            });
        }
        self.total_earnings = self
            .total_earnings
            .checked_add(amount)
            .ok_or(LedgerError::ArithmeticOverflow { context: "deposit" })?;
        Ok(self.total_earnings)
    }
}
