//! Fixed-point amounts.
//!
//! An [`Amount`] counts base units in a `u128`; one whole unit of shares or
//! deposited value is [`UNIT`] (10^18) base units. All arithmetic is integer
//! only and checked. Proportional splits go through [`Amount::mul_div_floor`],
//! which multiplies into a 256-bit intermediate before dividing so that
//! `a × b / d` never overflows for results that fit in 128 bits.

use std::fmt;
use std::str::FromStr;

use primitive_types::U256;
use serde::{Deserialize, Serialize};

use crate::constants::{DECIMALS, UNIT};
use crate::error::AmountError;

/// A non-negative fixed-point quantity with 18 decimals.
///
/// # Examples
///
/// ```
/// use divvy_core::Amount;
/// let a: Amount = "1.8".parse().unwrap();
/// assert_eq!(a.get(), 1_800_000_000_000_000_000);
/// assert_eq!(a.to_string(), "1.8");
/// ```
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
    bincode::Encode, bincode::Decode,
)]
#[serde(into = "String", try_from = "String")]
pub struct Amount(u128);

impl Amount {
    pub const ZERO: Self = Self(0);
    pub const MAX: Self = Self(u128::MAX);

    /// Wrap a raw base-unit count.
    pub const fn new(base_units: u128) -> Self {
        Self(base_units)
    }

    /// Whole units, scaled by [`UNIT`]. `None` on overflow.
    ///
    /// # Examples
    ///
    /// ```
    /// use divvy_core::{constants::UNIT, Amount};
    /// assert_eq!(Amount::from_units(100).unwrap().get(), 100 * UNIT);
    /// assert!(Amount::from_units(u128::MAX).is_none());
    /// ```
    pub fn from_units(units: u128) -> Option<Self> {
        units.checked_mul(UNIT).map(Self)
    }

    /// Raw base-unit count.
    pub const fn get(self) -> u128 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self)
    }

    pub fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }

    /// `floor(self × numerator / denominator)`.
    ///
    /// Returns `None` if `denominator` is zero or the quotient does not fit
    /// in 128 bits. The product itself never overflows.
    ///
    /// # Examples
    ///
    /// ```
    /// use divvy_core::Amount;
    /// let third = Amount::new(10).mul_div_floor(Amount::new(1), Amount::new(3));
    /// assert_eq!(third, Some(Amount::new(3)));
    /// ```
    pub fn mul_div_floor(self, numerator: Self, denominator: Self) -> Option<Self> {
        mul_div_floor_u128(self.0, numerator.0, denominator.0).map(Self)
    }
}

fn mul_div_floor_u128(a: u128, b: u128, d: u128) -> Option<u128> {
    if d == 0 {
        return None;
    }
    // Two u128 factors always fit in 256 bits.
    let quot = U256::from(a).checked_mul(U256::from(b))? / U256::from(d);
    if quot.bits() > 128 {
        return None;
    }
    Some(quot.low_u128())
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / UNIT;
        let frac = self.0 % UNIT;
        if frac == 0 {
            return write!(f, "{whole}");
        }
        let digits = format!("{frac:0width$}", width = DECIMALS as usize);
        write!(f, "{whole}.{}", digits.trim_end_matches('0'))
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    /// Parse a decimal string of whole units, e.g. `"0.2"` or `"100"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(AmountError::Empty);
        }
        if s.starts_with('-') {
            return Err(AmountError::Negative(s.to_string()));
        }

        let (whole, frac) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err(AmountError::Malformed(s.to_string()));
        }
        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(whole) || !all_digits(frac) {
            return Err(AmountError::Malformed(s.to_string()));
        }
        if frac.len() > DECIMALS as usize {
            return Err(AmountError::TooPrecise {
                digits: frac.len(),
                max: DECIMALS,
            });
        }

        let out_of_range = || AmountError::OutOfRange(s.to_string());

        let whole_units: u128 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| out_of_range())?
        };
        let frac_units: u128 = if frac.is_empty() {
            0
        } else {
            let scale = 10u128.pow(DECIMALS - frac.len() as u32);
            frac.parse::<u128>().map_err(|_| out_of_range())? * scale
        };

        whole_units
            .checked_mul(UNIT)
            .and_then(|w| w.checked_add(frac_units))
            .map(Self)
            .ok_or_else(out_of_range)
    }
}

impl From<Amount> for String {
    fn from(amount: Amount) -> Self {
        amount.to_string()
    }
}

impl TryFrom<String> for Amount {
    type Error = AmountError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}
