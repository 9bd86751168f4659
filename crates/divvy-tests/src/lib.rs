//! Cross-crate test suite for the Divvy ledger.
//!
//! Integration tests live under `tests/`: literal accounting scenarios,
//! property tests over random operation sequences, and multi-threaded
//! runs against a shared ledger.

pub mod helpers;
