//! Native value amounts.
//!
//! Amounts are whole base units. There is no fractional representation and
//! no signed form: a balance can never go below zero.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;

use crate::error::{Result, ValidationError};

/// An amount of native value, in base units.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Amount(u64);

impl Amount {
    /// Zero units.
    pub const ZERO: Self = Self(0);

    /// Largest representable amount.
    pub const MAX: Self = Self(u64::MAX);

    /// Create an amount from base units.
    #[must_use]
    pub const fn new(units: u64) -> Self {
        Self(units)
    }

    /// Get the amount in base units.
    #[must_use]
    pub const fn units(&self) -> u64 {
        self.0
    }

    /// Check if the amount is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checked addition.
    #[must_use]
    pub const fn checked_add(&self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(units) => Some(Self(units)),
            None => None,
        }
    }

    /// Checked subtraction.
    #[must_use]
    pub const fn checked_sub(&self, other: Self) -> Option<Self> {
        match self.0.checked_sub(other.0) {
            Some(units) => Some(Self(units)),
            None => None,
        }
    }

    /// Saturating addition.
    #[must_use]
    pub const fn saturating_add(&self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Saturating subtraction.
    #[must_use]
    pub const fn saturating_sub(&self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    /// Addition that reports overflow as a validation error.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Overflow`] if the sum exceeds [`Amount::MAX`].
    pub fn try_add(&self, other: Self) -> Result<Self> {
        self.checked_add(other)
            .ok_or_else(|| ValidationError::Overflow.into())
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Amount {
    fn from(units: u64) -> Self {
        Self(units)
    }
}

impl From<Amount> for u64 {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, a| acc.saturating_add(a))
    }
}

impl<'a> Sum<&'a Amount> for Amount {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.copied().sum()
    }
}
