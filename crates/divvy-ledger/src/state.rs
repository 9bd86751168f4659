//! The complete single-threaded ledger state.
//!
//! [`LedgerState`] composes the registry and accumulator and exposes every
//! command and query of the ledger without any locking. [`Ledger`](crate::Ledger)
//! wraps it for concurrent use.

use divvy_core::error::LedgerError;
use divvy_core::types::{Changeset, LedgerSnapshot};
use divvy_core::{AccountId, AccountState, Amount, DivvyError, GlobalState, TokenInfo};

use crate::accumulator::EarningsAccumulator;
use crate::registry::AccountRegistry;
use crate::settlement::{self, Settlement};
use crate::transfer::{self, ShareTransfer};
use crate::withdrawal::{self, Withdrawal};

/// Registry, accumulator and payout total for one pool.
#[derive(Debug, Clone)]
pub struct LedgerState {
    pub(crate) token: TokenInfo,
    pub(crate) registry: AccountRegistry,
    pub(crate) accumulator: EarningsAccumulator,
    pub(crate) total_withdrawn: Amount,
}

/// Values captured before a mutation so it can be reverted.
#[derive(Debug, Clone)]
pub(crate) struct Undo {
    accumulator: EarningsAccumulator,
    total_withdrawn: Amount,
    accounts: Vec<(AccountId, Option<AccountState>)>,
}

impl LedgerState {
    /// Fresh ledger with the whole supply held by `deployer`.
    pub fn genesis(
        token: TokenInfo,
        total_supply: Amount,
        deployer: AccountId,
    ) -> Result<Self, LedgerError> {
        Ok(Self {
            token,
            registry: AccountRegistry::genesis(total_supply, deployer)?,
            accumulator: EarningsAccumulator::new(),
            total_withdrawn: Amount::ZERO,
        })
    }

    /// Rebuild from a persisted image, refusing images that break an invariant.
    pub fn from_snapshot(snapshot: LedgerSnapshot) -> Result<Self, DivvyError> {
        let registry =
            AccountRegistry::from_accounts(snapshot.global.total_supply, snapshot.accounts)
                .map_err(|e| DivvyError::Corrupt(e.to_string()))?;
        let state = Self {
            token: snapshot.token,
            registry,
            accumulator: EarningsAccumulator::with_total(snapshot.global.total_earnings),
            total_withdrawn: snapshot.global.total_withdrawn,
        };
        state.check_invariants().map_err(DivvyError::Corrupt)?;
        Ok(state)
    }

    /// Full image of the current state, accounts sorted by id.
    pub fn snapshot(&self) -> LedgerSnapshot {
        let mut accounts: Vec<_> = self.registry.iter().map(|(k, v)| (*k, *v)).collect();
        accounts.sort_by_key(|(k, _)| *k);
        LedgerSnapshot {
            token: self.token.clone(),
            global: self.global(),
            accounts,
        }
    }

    pub fn global(&self) -> GlobalState {
        GlobalState {
            total_supply: self.registry.total_supply(),
            total_earnings: self.accumulator.total(),
            total_withdrawn: self.total_withdrawn,
        }
    }

    /// Global state plus the current entries of `touched`.
    pub fn changeset(&self, touched: &[AccountId]) -> Changeset {
        let mut accounts: Vec<(AccountId, AccountState)> = Vec::with_capacity(touched.len());
        for id in touched {
            if accounts.iter().any(|(k, _)| k == id) {
                continue;
            }
            accounts.push((*id, self.registry.get(id)));
        }
        Changeset {
            global: self.global(),
            accounts,
        }
    }

    pub(crate) fn capture(&self, touched: &[AccountId]) -> Undo {
        Undo {
            accumulator: self.accumulator,
            total_withdrawn: self.total_withdrawn,
            accounts: touched
                .iter()
                .map(|id| (*id, self.registry.lookup(id)))
                .collect(),
        }
    }

    pub(crate) fn rollback(&mut self, undo: Undo) {
        self.accumulator = undo.accumulator;
        self.total_withdrawn = undo.total_withdrawn;
        // Reverse order so a duplicated id ends at its earliest capture.
        for (id, prior) in undo.accounts.into_iter().rev() {
            self.registry.restore(&id, prior);
        }
    }

    // --- commands ---

    /// Add `amount` to the pool. Returns the new total earnings.
    pub fn deposit(&mut self, amount: Amount) -> Result<Amount, LedgerError> {
        self.accumulator.deposit(amount)
    }

    /// Realize `id`'s accrual and advance its checkpoint.
    pub fn settle(&mut self, id: &AccountId) -> Result<Settlement, LedgerError> {
        settlement::settle(&mut self.registry, &self.accumulator, id)
    }

    /// See [`withdrawal::withdraw`].
    pub fn withdraw(&mut self, id: &AccountId, amount: Amount) -> Result<Withdrawal, LedgerError> {
        withdrawal::withdraw(self, id, amount)
    }

    /// See [`transfer::transfer`].
    pub fn transfer(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<ShareTransfer, LedgerError> {
        transfer::transfer(self, from, to, amount)
    }

    // --- queries ---

    pub fn token(&self) -> &TokenInfo {
        &self.token
    }

    pub fn registry(&self) -> &AccountRegistry {
        &self.registry
    }

    pub fn account(&self, id: &AccountId) -> AccountState {
        self.registry.get(id)
    }

    pub fn total_supply(&self) -> Amount {
        self.registry.total_supply()
    }

    pub fn total_earnings(&self) -> Amount {
        self.accumulator.total()
    }

    pub fn total_withdrawn(&self) -> Amount {
        self.total_withdrawn
    }

    /// Deposited value not yet paid out.
    pub fn pool_balance(&self) -> Amount {
        self.global().pool_balance()
    }

    pub fn balance_of(&self, id: &AccountId) -> Amount {
        self.registry.balance_of(id)
    }

    /// Fresh entitlement, including accrual not yet settled.
    pub fn available_for_withdrawal(&self, id: &AccountId) -> Result<Amount, LedgerError> {
        settlement::peek_available(&self.registry, &self.accumulator, id)
    }

    /// Entitlement as of the last settlement only.
    pub fn left_for_withdrawal(&self, id: &AccountId) -> Amount {
        self.registry.get(id).pending_withdrawable
    }

    pub fn snapshot_total_earnings(&self, id: &AccountId) -> Amount {
        self.registry.get(id).earnings_snapshot
    }

    /// Verify conservation, snapshot bounds and solvency. O(accounts).
    pub fn check_invariants(&self) -> Result<(), String> {
        let supply = self.registry.total_supply();
        let earnings = self.accumulator.total();

        if supply.is_zero() {
            return Err("total supply is zero".into());
        }
        match self.registry.sum_balances() {
            Some(sum) if sum == supply => {}
            Some(sum) => return Err(format!("balances sum to {sum}, supply is {supply}")),
            None => return Err("balance sum overflows".into()),
        }
        if self.total_withdrawn > earnings {
            return Err(format!(
                "withdrawn {} exceeds earnings {earnings}",
                self.total_withdrawn
            ));
        }

        let mut owed = self.total_withdrawn;
        for (id, state) in self.registry.iter() {
            if state.earnings_snapshot > earnings {
                return Err(format!(
                    "{id}: snapshot {} ahead of earnings {earnings}",
                    state.earnings_snapshot
                ));
            }
            let available = self
                .available_for_withdrawal(id)
                .map_err(|e| format!("{id}: {e}"))?;
            owed = owed
                .checked_add(available)
                .ok_or_else(|| "entitlement sum overflows".to_string())?;
        }
        if owed > earnings {
            return Err(format!("entitlements {owed} exceed earnings {earnings}"));
        }
        Ok(())
    }
}
