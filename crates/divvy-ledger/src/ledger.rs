//! Thread-safe ledger facade.
//!
//! [`Ledger`] owns a [`LedgerState`] behind a single read-write lock.
//! Mutations take the write lock for their whole duration, including the
//! store commit and the payout, so they are serialized against each other
//! and against queries. Queries take the read lock and run concurrently.
//!
//! Every mutation captures the state it is about to touch. If the store
//! refuses the resulting changeset, the capture is restored and the store
//! error returned, so memory never runs ahead of disk.
//!
//! Withdrawals commit the debit before paying out. A failed payout is
//! undone with a second commit; if that commit is refused too, memory
//! stays at the committed debit and the store error is returned.

use std::sync::Arc;

use divvy_core::constants::{DEFAULT_TOTAL_SUPPLY, EVENT_CHANNEL_CAPACITY};
use divvy_core::traits::{LedgerStore, PayoutSink};
use divvy_core::types::LedgerSnapshot;
use divvy_core::{AccountId, Amount, DivvyError, LedgerEvent, TokenInfo};
use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::state::{LedgerState, Undo};
use crate::transfer::ShareTransfer;
use crate::withdrawal::{self, Withdrawal};

/// Parameters of a fresh ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Genesis {
    pub token: TokenInfo,
    /// Whole supply, credited to `deployer`.
    pub total_supply: Amount,
    pub deployer: AccountId,
}

impl Genesis {
    /// Default token and supply, minted to `deployer`.
    pub fn new(deployer: AccountId) -> Self {
        Self {
            token: TokenInfo::default(),
            total_supply: Amount::new(DEFAULT_TOTAL_SUPPLY),
            deployer,
        }
    }

    pub fn with_supply(mut self, total_supply: Amount) -> Self {
        self.total_supply = total_supply;
        self
    }

    fn into_state(self) -> Result<LedgerState, DivvyError> {
        Ok(LedgerState::genesis(
            self.token,
            self.total_supply,
            self.deployer,
        )?)
    }
}

/// The proportional-dividend ledger.
pub struct Ledger {
    state: RwLock<LedgerState>,
    /// Durable backing store. `None` keeps the ledger in memory only.
    store: Option<Arc<dyn LedgerStore>>,
    payout: Arc<dyn PayoutSink>,
    events: broadcast::Sender<LedgerEvent>,
}

impl Ledger {
    /// In-memory ledger starting from `genesis`.
    pub fn new(genesis: Genesis, payout: Arc<dyn PayoutSink>) -> Result<Self, DivvyError> {
        let deployer = genesis.deployer;
        let state = genesis.into_state()?;
        info!(supply = %state.total_supply(), %deployer, "in-memory ledger created");
        Ok(Self::assemble(state, None, payout))
    }

    /// Ledger backed by `store`.
    ///
    /// Resumes from the stored image if there is one, refusing an image
    /// that violates a ledger invariant. Otherwise writes `genesis`.
    pub fn open(
        genesis: Genesis,
        store: Arc<dyn LedgerStore>,
        payout: Arc<dyn PayoutSink>,
    ) -> Result<Self, DivvyError> {
        let state = match store.load()? {
            Some(snapshot) => {
                let state = LedgerState::from_snapshot(snapshot)?;
                info!(
                    accounts = state.registry().len(),
                    total_earnings = %state.total_earnings(),
                    "ledger resumed from store"
                );
                state
            }
            None => {
                let deployer = genesis.deployer;
                let state = genesis.into_state()?;
                store.initialize(&state.snapshot())?;
                info!(supply = %state.total_supply(), %deployer, "ledger initialized");
                state
            }
        };
        Ok(Self::assemble(state, Some(store), payout))
    }

    fn assemble(
        state: LedgerState,
        store: Option<Arc<dyn LedgerStore>>,
        payout: Arc<dyn PayoutSink>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            state: RwLock::new(state),
            store,
            payout,
            events,
        }
    }

    /// Commit the touched accounts, or restore `undo` if the store fails.
    fn persist(
        &self,
        state: &mut LedgerState,
        undo: Undo,
        touched: &[AccountId],
    ) -> Result<(), DivvyError> {
        let Some(store) = &self.store else {
            return Ok(());
        };
        if let Err(e) = store.commit(&state.changeset(touched)) {
            warn!("commit failed, rolling back: {e}");
            state.rollback(undo);
            return Err(e);
        }
        Ok(())
    }

    fn publish(&self, event: LedgerEvent) {
        // No subscribers is not an error.
        if self.events.send(event).is_err() {
            debug!("no event subscribers");
        }
    }

    // --- commands ---

    /// Add `amount` to the pool. O(1) regardless of holder count.
    pub fn deposit(&self, depositor: &AccountId, amount: Amount) -> Result<LedgerEvent, DivvyError> {
        let mut state = self.state.write();
        let undo = state.capture(&[]);
        let total = state.deposit(amount).inspect_err(|e| {
            warn!(%depositor, %amount, "deposit rejected: {e}");
        })?;
        self.persist(&mut state, undo, &[])?;

        info!(%depositor, %amount, total_earnings = %total, "deposit");
        let event = LedgerEvent::Deposited {
            depositor: *depositor,
            amount,
        };
        self.publish(event.clone());
        Ok(event)
    }

    /// Settle `account`, then pay `amount` out of its entitlement.
    ///
    /// The settlement is persisted even when the withdrawal is refused.
    /// A zero amount settles without paying or emitting anything. If the
    /// payout sink fails the debit is undone and the settlement kept, and
    /// the sink's error returned. If the undo cannot be committed the
    /// debit stands and [`DivvyError::Storage`] is returned instead.
    pub fn withdraw(&self, account: &AccountId, amount: Amount) -> Result<Withdrawal, DivvyError> {
        let mut state = self.state.write();
        let touched = [*account];
        let undo = state.capture(&touched);

        let withdrawal = match state.withdraw(account, amount) {
            Ok(w) => w,
            Err(e) => {
                warn!(%account, %amount, "withdrawal rejected: {e}");
                self.persist(&mut state, undo, &touched)?;
                return Err(e.into());
            }
        };
        self.persist(&mut state, undo, &touched)?;

        if amount.is_zero() {
            return Ok(withdrawal);
        }

        if let Err(e) = self.payout.pay(account, amount) {
            warn!(%account, %amount, "payout failed, restoring entitlement: {e}");
            let debited = state.capture(&touched);
            withdrawal::refund(&mut state, &withdrawal);
            self.persist(&mut state, debited, &touched)
                .inspect_err(|se| {
                    error!(%account, %amount, "unpaid withdrawal left debited: {se}");
                })?;
            return Err(e.into());
        }

        info!(%account, %amount, remaining = %withdrawal.remaining(), "withdrawal");
        self.publish(LedgerEvent::Withdrawn {
            account: *account,
            amount,
        });
        Ok(withdrawal)
    }

    /// Settle both parties, then move `amount` shares from `from` to `to`.
    ///
    /// Both settlements are persisted even when the move is refused.
    pub fn transfer(
        &self,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<ShareTransfer, DivvyError> {
        let mut state = self.state.write();
        let touched = [*from, *to];
        let undo = state.capture(&touched);

        let transfer = match state.transfer(from, to, amount) {
            Ok(t) => t,
            Err(e) => {
                warn!(%from, %to, %amount, "transfer rejected: {e}");
                self.persist(&mut state, undo, &touched)?;
                return Err(e.into());
            }
        };
        self.persist(&mut state, undo, &touched)?;

        info!(%from, %to, %amount, "transfer");
        self.publish(LedgerEvent::Transfer {
            from: *from,
            to: *to,
            amount,
        });
        Ok(transfer)
    }

    // --- queries ---

    /// Fresh entitlement including accrual not yet settled.
    pub fn available_for_withdrawal(&self, account: &AccountId) -> Result<Amount, DivvyError> {
        Ok(self.state.read().available_for_withdrawal(account)?)
    }

    /// Pending entitlement as of the account's last settlement.
    pub fn left_for_withdrawal(&self, account: &AccountId) -> Amount {
        self.state.read().left_for_withdrawal(account)
    }

    pub fn total_earnings(&self) -> Amount {
        self.state.read().total_earnings()
    }

    pub fn snapshot_total_earnings(&self, account: &AccountId) -> Amount {
        self.state.read().snapshot_total_earnings(account)
    }

    pub fn balance_of(&self, account: &AccountId) -> Amount {
        self.state.read().balance_of(account)
    }

    pub fn total_supply(&self) -> Amount {
        self.state.read().total_supply()
    }

    pub fn pool_balance(&self) -> Amount {
        self.state.read().pool_balance()
    }

    pub fn token_info(&self) -> TokenInfo {
        self.state.read().token().clone()
    }

    /// Receive every event published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.events.subscribe()
    }

    /// Consistent image of the whole ledger.
    pub fn snapshot(&self) -> LedgerSnapshot {
        self.state.read().snapshot()
    }

    /// Run `f` against a consistent view of the state.
    pub fn with_state<R>(&self, f: impl FnOnce(&LedgerState) -> R) -> R {
        f(&self.state.read())
    }

    /// Full invariant audit. O(accounts).
    pub fn check_invariants(&self) -> Result<(), DivvyError> {
        self.state.read().check_invariants().map_err(DivvyError::Corrupt)
    }

    pub fn is_persistent(&self) -> bool {
        self.store.is_some()
    }
}

impl std::fmt::Debug for Ledger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger")
            .field("state", &*self.state.read())
            .field("persistent", &self.store.is_some())
            .finish_non_exhaustive()
    }
}
