//! Ledger constants. All values in base units (1 whole unit = 10^18 base units).

/// Number of fractional decimal digits carried by every [`Amount`](crate::Amount).
pub const DECIMALS: u32 = 18;

/// Base units per whole unit of shares or deposited value.
///
/// # Examples
///
/// ```
/// use divvy_core::constants::{DECIMALS, UNIT};
/// assert_eq!(UNIT, 10u128.pow(DECIMALS));
/// ```
pub const UNIT: u128 = 1_000_000_000_000_000_000;

/// Whole shares minted to the deployer at genesis.
pub const DEFAULT_INITIAL_SUPPLY_UNITS: u128 = 100;

/// Default total supply in base units.
pub const DEFAULT_TOTAL_SUPPLY: u128 = DEFAULT_INITIAL_SUPPLY_UNITS * UNIT;

/// Share token display name.
pub const TOKEN_NAME: &str = "AP48 BL01 SCA";

/// Share token ticker symbol.
pub const TOKEN_SYMBOL: &str = "AP48";

/// Buffered events per subscriber before slow receivers start lagging.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Length in bytes of an [`AccountId`](crate::AccountId).
pub const ACCOUNT_ID_LEN: usize = 20;
