//! Error types for the Divvy ledger.
use thiserror::Error;

use crate::amount::Amount;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("insufficient entitlement: requested {requested}, available {available}")] InsufficientEntitlement { requested: Amount, available: Amount },
    #[error("insufficient balance: requested {requested}, balance {balance}")] InsufficientBalance { requested: Amount, balance: Amount },
    #[error("arithmetic overflow in {context}")] ArithmeticOverflow { context: &'static str },
    #[error("invalid amount: {reason}")] InvalidAmount { reason: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("empty amount")] Empty,
    #[error("negative amount: {0}")] Negative(String),
    #[error("malformed amount: {0}")] Malformed(String),
    #[error("too many fractional digits: {digits} > {max}")] TooPrecise { digits: usize, max: u32 },
    #[error("amount out of range: {0}")] OutOfRange(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccountIdError {
    #[error("missing 0x prefix")] MissingPrefix,
    #[error("invalid length: expected {expected} hex characters, got {got}")] InvalidLength { expected: usize, got: usize },
    #[error("invalid hex: {0}")] InvalidHex(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PayoutError {
    #[error("payout to {account} rejected: {reason}")] Rejected { account: String, reason: String },
}

#[derive(Error, Debug)]
pub enum DivvyError {
    #[error(transparent)] Ledger(#[from] LedgerError),
    #[error(transparent)] Amount(#[from] AmountError),
    #[error(transparent)] AccountId(#[from] AccountIdError),
    #[error(transparent)] Payout(#[from] PayoutError),
    #[error("storage: {0}")] Storage(String),
    #[error("corrupt ledger state: {0}")] Corrupt(String),
    #[error("invalid configuration: {0}")] Config(String),
}

impl From<AmountError> for LedgerError {
    fn from(err: AmountError) -> Self {
        LedgerError::InvalidAmount {
            reason: err.to_string(),
        }
    }
}

impl DivvyError {
    /// The ledger-level failure, if this error is one.
    pub fn as_ledger(&self) -> Option<&LedgerError> {
        match self {
            DivvyError::Ledger(e) => Some(e),
            _ => None,
        }
    }
}
