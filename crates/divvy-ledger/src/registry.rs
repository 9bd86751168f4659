//! Share balances against a fixed total supply.
//!
//! Accounts live in a sparse map. A missing entry reads as the zero state
//! and is materialized on first settlement or balance change.

use std::collections::HashMap;

use divvy_core::error::LedgerError;
use divvy_core::{AccountId, AccountState, Amount};

/// Per-account state plus the immutable total supply.
#[derive(Debug, Clone)]
pub struct AccountRegistry {
    total_supply: Amount,
    accounts: HashMap<AccountId, AccountState>,
}

impl AccountRegistry {
    /// Credit the entire supply to `holder`.
    pub fn genesis(total_supply: Amount, holder: AccountId) -> Result<Self, LedgerError> {
        if total_supply.is_zero() {
            return Err(LedgerError::InvalidAmount {
                reason: "total supply must be positive".into(),
            });
        }
        let mut accounts = HashMap::new();
        accounts.insert(
            holder,
            AccountState {
                balance: total_supply,
                ..AccountState::default()
            },
        );
        Ok(Self {
            total_supply,
            accounts,
        })
    }

    /// Rebuild from persisted entries. Balances must sum to `total_supply`.
    pub fn from_accounts(
        total_supply: Amount,
        entries: impl IntoIterator<Item = (AccountId, AccountState)>,
    ) -> Result<Self, LedgerError> {
        if total_supply.is_zero() {
            return Err(LedgerError::InvalidAmount {
                reason: "total supply must be positive".into(),
            });
        }
        let registry = Self {
            total_supply,
            accounts: entries.into_iter().collect(),
        };
        match registry.sum_balances() {
            Some(sum) if sum == total_supply => Ok(registry),
            Some(sum) => Err(LedgerError::InvalidAmount {
                reason: format!("balances sum to {sum}, total supply is {total_supply}"),
            }),
            None => Err(LedgerError::ArithmeticOverflow {
                context: "balance sum",
            }),
        }
    }

    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    /// Current state of `id`, zero if never seen.
    pub fn get(&self, id: &AccountId) -> AccountState {
        self.accounts.get(id).copied().unwrap_or_default()
    }

    pub fn balance_of(&self, id: &AccountId) -> Amount {
        self.get(id).balance
    }

    pub fn contains(&self, id: &AccountId) -> bool {
        self.accounts.contains_key(id)
    }

    /// Mutable entry for `id`, created on first touch.
    pub(crate) fn entry_mut(&mut self, id: &AccountId) -> &mut AccountState {
        self.accounts.entry(*id).or_default()
    }

    /// Put back a previously captured entry. `None` removes it.
    pub(crate) fn restore(&mut self, id: &AccountId, prior: Option<AccountState>) {
        match prior {
            Some(state) => {
                self.accounts.insert(*id, state);
            }
            None => {
                self.accounts.remove(id);
            }
        }
    }

    /// Raw entry lookup, distinguishing absent from zero.
    pub(crate) fn lookup(&self, id: &AccountId) -> Option<AccountState> {
        self.accounts.get(id).copied()
    }

    /// Move `amount` shares from `from` to `to`.
    ///
    /// Both entries are validated before either is written, so a failed
    /// move leaves balances untouched.
    pub fn move_balance(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let from_balance = self.balance_of(from);
        let remaining = from_balance
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientBalance {
                requested: amount,
                balance: from_balance,
            })?;

        if from == to {
            return Ok(());
        }

        let credited = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(LedgerError::ArithmeticOverflow { context: "balance" })?;

        self.entry_mut(from).balance = remaining;
        self.entry_mut(to).balance = credited;
        Ok(())
    }

    /// Number of materialized accounts.
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AccountId, &AccountState)> {
        self.accounts.iter()
    }

    /// Sum of all balances, `None` on overflow. O(accounts).
    pub fn sum_balances(&self) -> Option<Amount> {
        self.accounts
            .values()
            .try_fold(Amount::ZERO, |acc, s| acc.checked_add(s.balance))
    }
}
