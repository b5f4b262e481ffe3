//! Satoshi amounts for balances, fees and transfers
//!
//! Balances must never go negative as a side effect of unchecked
//! arithmetic, so this type only exposes checked and saturating
//! operations. The backing integer is 128 bits wide: individual wire
//! fields are u64, but block totals and wallet balances sum across
//! transactions.

use std::fmt;
use std::iter::Sum;

use serde::{Deserialize, Serialize};

use crate::error::{ChainError, Result};

/// Non-negative satoshi amount
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Amount(u128);

pub const SATOSHIS_PER_COIN: u64 = 100_000_000;

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub fn new(satoshis: u64) -> Amount {
        Amount(satoshis as u128)
    }

    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    pub fn checked_sub(self, other: Amount) -> Option<Amount> {
        self.0.checked_sub(other.0).map(Amount)
    }

    pub fn saturating_sub(self, other: Amount) -> Amount {
        Amount(self.0.saturating_sub(other.0))
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// The amount as a u64 wire field
    ///
    /// Fails when a summed amount no longer fits the 8-byte encoding.
    pub fn to_u64(self) -> Result<u64> {
        u64::try_from(self.0).map_err(|_| {
            ChainError::FieldOverflow(format!("Amount {} does not fit a u64 field", self.0))
        })
    }

    pub fn as_u128(self) -> u128 {
        self.0
    }
}

impl From<u64> for Amount {
    fn from(satoshis: u64) -> Amount {
        Amount::new(satoshis)
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Amount {
        iter.fold(Amount::ZERO, |acc, a| {
            acc.checked_add(a).unwrap_or(Amount(u128::MAX))
        })
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
