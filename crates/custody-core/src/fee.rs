//! Withdrawal fee computation.
//!
//! # Precision Guarantees
//!
//! Fees use integer arithmetic only, with a `u128` intermediate so that
//! `amount × rate` cannot overflow for any `u64` amount. Results round toward
//! zero, so the fee never exceeds the exact fractional value and the fee is
//! monotonic non-decreasing in `amount` for a fixed rate.
//!
//! The formula is: `fee = floor(amount × rate_bps / 10_000)`
//!
//! Examples:
//! - 1000 at 100 bps (1%) = 10
//! - 99 at 100 bps = 0 (rounded down from 0.99)

use serde::{Deserialize, Serialize};

use crate::amount::Amount;
use crate::error::{Result, ValidationError};

/// Basis points in one whole (100%).
pub const BPS_SCALE: u64 = 10_000;

/// Computes `floor(amount × rate_bps / 10_000)`.
///
/// Rates above [`BPS_SCALE`] are not rejected here; [`FeePolicy::new`] is the
/// validating constructor. The result is capped at `amount`.
///
/// # Examples
/// ```
/// use custody_core::fee::compute_fee;
/// use custody_core::Amount;
///
/// assert_eq!(compute_fee(Amount::new(1000), 100), Amount::new(10));
/// assert_eq!(compute_fee(Amount::new(99), 100), Amount::ZERO);
/// ```
#[must_use]
pub fn compute_fee(amount: Amount, rate_bps: u64) -> Amount {
    let fee = u128::from(amount.units()) * u128::from(rate_bps) / u128::from(BPS_SCALE);
    // fee <= amount whenever rate_bps <= BPS_SCALE
    Amount::new(u64::try_from(fee).unwrap_or(u64::MAX).min(amount.units()))
}

/// Fee rate applied to ledger withdrawals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FeePolicy {
    rate_bps: u64,
}

impl FeePolicy {
    /// A policy that charges nothing.
    pub const FREE: Self = Self { rate_bps: 0 };

    /// Create a policy with a rate in basis points.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidRate`] if `rate_bps` exceeds 10 000.
    pub fn new(rate_bps: u64) -> Result<Self> {
        if rate_bps > BPS_SCALE {
            return Err(ValidationError::InvalidRate {
                rate: rate_bps,
                max: BPS_SCALE,
            }
            .into());
        }
        Ok(Self { rate_bps })
    }

    /// The rate in basis points.
    #[must_use]
    pub const fn rate_bps(&self) -> u64 {
        self.rate_bps
    }

    /// Fee due on `amount`.
    #[must_use]
    pub fn fee(&self, amount: Amount) -> Amount {
        compute_fee(amount, self.rate_bps)
    }

    /// Split `amount` into `(net, fee)`.
    #[must_use]
    pub fn split(&self, amount: Amount) -> (Amount, Amount) {
        let fee = self.fee(amount);
        (amount.saturating_sub(fee), fee)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use test_case::test_case;

    #[test_case(1000, 100, 10 ; "one percent")]
    #[test_case(99, 100, 0 ; "rounds toward zero")]
    #[test_case(1000, 0, 0 ; "free")]
    #[test_case(1000, 10_000, 1000 ; "whole amount")]
    #[test_case(0, 250, 0 ; "zero amount")]
    #[test_case(u64::MAX, 10_000, u64::MAX ; "no overflow at max")]
    fn fee_values(amount: u64, rate: u64, expected: u64) {
        assert_eq!(compute_fee(Amount::new(amount), rate), Amount::new(expected));
    }

    #[test]
    fn policy_rejects_rate_above_scale() {
        assert!(FeePolicy::new(10_001).is_err());
        assert!(FeePolicy::new(10_000).is_ok());
    }

    #[test]
    fn split_sums_to_amount() {
        let policy = FeePolicy::new(250).expect("valid rate");
        let (net, fee) = policy.split(Amount::new(1000));
        assert_eq!(fee, Amount::new(25));
        assert_eq!(net, Amount::new(975));
    }

    proptest! {
        #[test]
        fn fee_is_monotonic(a in any::<u64>(), b in any::<u64>(), rate in 0u64..=BPS_SCALE) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(compute_fee(Amount::new(lo), rate) <= compute_fee(Amount::new(hi), rate));
        }

        #[test]
        fn fee_never_exceeds_amount(amount in any::<u64>(), rate in 0u64..=BPS_SCALE) {
            let policy = FeePolicy::new(rate).unwrap();
            let (net, fee) = policy.split(Amount::new(amount));
            prop_assert!(fee.units() <= amount);
            prop_assert_eq!(net.units() + fee.units(), amount);
        }
    }
}
