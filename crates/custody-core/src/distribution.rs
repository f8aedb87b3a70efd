//! Splitting a pooled amount evenly across recipients.
//!
//! `share = floor(pool / n)` goes to each recipient in input order and
//! `pool mod n` goes back to the initiator. The batch is all-or-nothing: a
//! single refused payment fails the call and the enclosing transaction
//! reverts every payment already made.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::amount::Amount;
use crate::error::{Result, ValidationError};
use crate::principal::Principal;
use crate::transaction::Transaction;

/// Outcome of a committed distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionReceipt {
    /// Amount each recipient received.
    pub share: Amount,
    /// Amount returned to the initiator.
    pub remainder: Amount,
    /// Number of recipients paid.
    pub recipients: usize,
}

/// Compute `(share, remainder)` for `pool` over `recipients` payees.
///
/// # Errors
///
/// Returns [`ValidationError::ZeroAmount`] for an empty pool,
/// [`ValidationError::EmptyRecipients`] for no payees, or
/// [`ValidationError::ZeroShare`] if `pool < recipients`.
pub fn split(pool: Amount, recipients: usize) -> Result<(Amount, Amount)> {
    if recipients == 0 {
        return Err(ValidationError::EmptyRecipients.into());
    }
    if pool.is_zero() {
        return Err(ValidationError::ZeroAmount.into());
    }
    let n = u64::try_from(recipients).map_err(|_| ValidationError::Overflow)?;
    let share = pool.units() / n;
    if share == 0 {
        return Err(ValidationError::ZeroShare { pool, recipients }.into());
    }
    Ok((Amount::new(share), Amount::new(pool.units() % n)))
}

/// Accept `pool` from `initiator` and pay it out across `recipients`.
///
/// # Errors
///
/// Returns a validation error as described on [`split`] or for a null
/// recipient, and a transfer error if any payment fails.
pub fn distribute(
    tx: &mut Transaction<'_>,
    initiator: &Principal,
    pool: Amount,
    recipients: &[Principal],
) -> Result<DistributionReceipt> {
    let (share, remainder) = split(pool, recipients.len())?;
    for recipient in recipients {
        recipient.require()?;
    }
    tx.receive(pool)?;
    for recipient in recipients {
        tx.send(recipient, share)?;
    }
    tx.send(initiator, remainder)?;
    debug!(
        initiator = %initiator,
        pool = %pool,
        share = %share,
        remainder = %remainder,
        "distribution paid"
    );
    Ok(DistributionReceipt {
        share,
        remainder,
        recipients: recipients.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CustodyError, ErrorKind};
    use crate::transfer::SimulatedTransfer;
    use proptest::prelude::*;

    fn names(ids: &[&str]) -> Vec<Principal> {
        ids.iter().map(|id| Principal::new(*id)).collect()
    }

    #[test]
    fn hundred_over_three() {
        let mut pool = Amount::ZERO;
        let mut sim = SimulatedTransfer::new();
        let recipients = names(&["a", "b", "c"]);
        {
            let mut tx = Transaction::begin(&mut pool, &mut sim);
            let receipt = distribute(&mut tx, &Principal::new("owner"), Amount::new(100), &recipients)
                .expect("distribute");
            assert_eq!(receipt.share, Amount::new(33));
            assert_eq!(receipt.remainder, Amount::new(1));
            tx.commit();
        }
        for r in &recipients {
            assert_eq!(sim.received(r), Amount::new(33));
        }
        assert_eq!(sim.received(&Principal::new("owner")), Amount::new(1));
        assert_eq!(pool, Amount::ZERO);
    }

    #[test]
    fn ten_over_eleven_is_zero_share() {
        let err = split(Amount::new(10), 11).unwrap_err();
        assert!(matches!(
            err,
            CustodyError::Validation(ValidationError::ZeroShare { recipients: 11, .. })
        ));
    }

    #[test]
    fn empty_recipients_rejected() {
        assert!(matches!(
            split(Amount::new(10), 0),
            Err(CustodyError::Validation(ValidationError::EmptyRecipients))
        ));
    }

    #[test]
    fn zero_pool_rejected() {
        assert!(matches!(
            split(Amount::ZERO, 2),
            Err(CustodyError::Validation(ValidationError::ZeroAmount))
        ));
    }

    #[test]
    fn null_recipient_rejected_before_any_payment() {
        let mut pool = Amount::ZERO;
        let mut sim = SimulatedTransfer::new();
        let recipients = vec![Principal::new("a"), Principal::null()];
        let mut tx = Transaction::begin(&mut pool, &mut sim);
        let err = distribute(&mut tx, &Principal::new("owner"), Amount::new(10), &recipients)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(tx.sent().is_empty());
    }

    #[test]
    fn failed_payment_rolls_back_batch() {
        let mut pool = Amount::ZERO;
        let mut sim = SimulatedTransfer::new();
        sim.reject("c");
        let recipients = names(&["a", "b", "c"]);
        {
            let mut tx = Transaction::begin(&mut pool, &mut sim);
            let err = distribute(&mut tx, &Principal::new("owner"), Amount::new(90), &recipients)
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Transfer);
            assert_eq!(tx.sent().len(), 2);
            let _ = tx.rollback();
        }
        assert_eq!(sim.total_sent(), Amount::ZERO);
        assert_eq!(pool, Amount::ZERO);
    }

    proptest! {
        #[test]
        fn split_conserves_pool(pool in 1u64..1_000_000, n in 1usize..64) {
            match split(Amount::new(pool), n) {
                Ok((share, remainder)) => {
                    prop_assert!(remainder.units() < n as u64);
                    prop_assert_eq!(share.units() * n as u64 + remainder.units(), pool);
                }
                Err(_) => prop_assert!(pool < n as u64),
            }
        }
    }
}
