//! Shared test helpers for scenario, property and concurrency tests.

use std::sync::Arc;

use divvy_core::{AccountId, Amount};
use divvy_ledger::{Genesis, Ledger, PayoutLog};

/// The genesis holder used by every helper ledger.
pub const DEPLOYER: AccountId = AccountId([0xD0; 20]);

/// Simple account id from a seed byte.
pub fn acct(seed: u8) -> AccountId {
    AccountId([seed; 20])
}

/// `n` whole units.
pub fn units(n: u128) -> Amount {
    Amount::from_units(n).unwrap()
}

/// Parse a decimal amount such as `"1.8"`.
pub fn amt(s: &str) -> Amount {
    s.parse().unwrap()
}

/// In-memory ledger with the default 100-unit supply held by [`DEPLOYER`].
pub fn test_ledger() -> (Arc<Ledger>, Arc<PayoutLog>) {
    test_ledger_with_supply(units(100))
}

/// In-memory ledger with a custom supply held by [`DEPLOYER`].
pub fn test_ledger_with_supply(supply: Amount) -> (Arc<Ledger>, Arc<PayoutLog>) {
    let payouts = Arc::new(PayoutLog::new());
    let ledger = Ledger::new(Genesis::new(DEPLOYER).with_supply(supply), payouts.clone()).unwrap();
    (Arc::new(ledger), payouts)
}
