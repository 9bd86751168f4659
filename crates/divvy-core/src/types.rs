//! Ledger records: account identifiers, per-account and global state, events.
//!
//! All monetary fields are [`Amount`]s in base units.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::amount::Amount;
use crate::constants::{ACCOUNT_ID_LEN, DECIMALS, TOKEN_NAME, TOKEN_SYMBOL};
use crate::error::AccountIdError;

/// A 20-byte account identifier, displayed as `0x`-prefixed lowercase hex.
///
/// # Examples
///
/// ```
/// use divvy_core::AccountId;
/// let id: AccountId = "0x00000000000000000000000000000000000000aa".parse().unwrap();
/// assert_eq!(id.as_bytes()[19], 0xaa);
/// assert_eq!(id.to_string(), "0x00000000000000000000000000000000000000aa");
/// ```
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
    bincode::Encode, bincode::Decode,
)]
#[serde(into = "String", try_from = "String")]
pub struct AccountId(pub [u8; ACCOUNT_ID_LEN]);

impl AccountId {
    pub const ZERO: Self = Self([0u8; ACCOUNT_ID_LEN]);

    pub fn from_bytes(bytes: [u8; ACCOUNT_ID_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ACCOUNT_ID_LEN] {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for AccountId {
    type Err = AccountIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .ok_or(AccountIdError::MissingPrefix)?;
        if digits.len() != ACCOUNT_ID_LEN * 2 {
            return Err(AccountIdError::InvalidLength {
                expected: ACCOUNT_ID_LEN * 2,
                got: digits.len(),
            });
        }
        let mut bytes = [0u8; ACCOUNT_ID_LEN];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|e| AccountIdError::InvalidHex(e.to_string()))?;
        Ok(Self(bytes))
    }
}

impl From<AccountId> for String {
    fn from(id: AccountId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for AccountId {
    type Error = AccountIdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<[u8; ACCOUNT_ID_LEN]> for AccountId {
    fn from(bytes: [u8; ACCOUNT_ID_LEN]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for AccountId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Per-account ledger state. The zero value is the state of a never-seen account.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq,
    bincode::Encode, bincode::Decode,
)]
pub struct AccountState {
    /// Shares owned, out of the total supply.
    pub balance: Amount,
    /// Total earnings as of this account's last settlement.
    pub earnings_snapshot: Amount,
    /// Settled entitlement not yet withdrawn.
    pub pending_withdrawable: Amount,
}

impl AccountState {
    /// True if the account holds nothing and has never been checkpointed.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Ledger-wide state.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq,
    bincode::Encode, bincode::Decode,
)]
pub struct GlobalState {
    /// Fixed share supply. Never changes after genesis.
    pub total_supply: Amount,
    /// Cumulative value ever deposited. Never decreases.
    pub total_earnings: Amount,
    /// Cumulative value ever paid out by withdrawals.
    pub total_withdrawn: Amount,
}

impl GlobalState {
    /// Fresh state with zero earnings.
    pub fn genesis(total_supply: Amount) -> Self {
        Self {
            total_supply,
            total_earnings: Amount::ZERO,
            total_withdrawn: Amount::ZERO,
        }
    }

    /// Value deposited but not yet paid out.
    pub fn pool_balance(&self) -> Amount {
        self.total_earnings.saturating_sub(self.total_withdrawn)
    }
}

/// Share token metadata.
#[derive(
    Serialize, Deserialize, Clone, Debug, PartialEq, Eq,
    bincode::Encode, bincode::Decode,
)]
pub struct TokenInfo {
    pub name: String,
    pub symbol: String,
    pub decimals: u32,
}

impl Default for TokenInfo {
    fn default() -> Self {
        Self {
            name: TOKEN_NAME.to_string(),
            symbol: TOKEN_SYMBOL.to_string(),
            decimals: DECIMALS,
        }
    }
}

/// Observable effects of ledger mutations.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LedgerEvent {
    /// Value entered the pool.
    Deposited { depositor: AccountId, amount: Amount },
    /// Settled entitlement left the pool.
    Withdrawn { account: AccountId, amount: Amount },
    /// Shares changed hands.
    Transfer {
        from: AccountId,
        to: AccountId,
        amount: Amount,
    },
}

impl fmt::Display for LedgerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deposited { depositor, amount } => write!(f, "Deposited({depositor}, {amount})"),
            Self::Withdrawn { account, amount } => write!(f, "Withdrawn({account}, {amount})"),
            Self::Transfer { from, to, amount } => write!(f, "Transfer({from}, {to}, {amount})"),
        }
    }
}

/// Complete persisted ledger image, as loaded at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerSnapshot {
    pub token: TokenInfo,
    pub global: GlobalState,
    pub accounts: Vec<(AccountId, AccountState)>,
}

/// State touched by one mutation: the new global state plus every account
/// the mutation settled or rebalanced. Written atomically.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Changeset {
    pub global: GlobalState,
    pub accounts: Vec<(AccountId, AccountState)>,
}
