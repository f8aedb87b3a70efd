//! The commit-or-rollback boundary around every public operation.
//!
//! A [`Transaction`] is opened at the start of an external call. Stores record
//! an [`Undo`] entry before each mutation, inbound value is credited to the
//! custody pool through [`Transaction::receive`], and outward value leaves
//! only through [`Transaction::send`]. If the operation returns an error the
//! caller discards the transaction with [`Transaction::rollback`], which
//! reverts every send in reverse order, restores the pool, and hands back the
//! undo journal for the stores to replay.

use tracing::{debug, warn};

use crate::amount::Amount;
use crate::error::{CustodyError, Result, StateError};
use crate::exchange::ListingId;
use crate::principal::Principal;
use crate::transfer::ValueTransfer;
use crate::vault::Lock;

/// One reversible store mutation, holding the value it overwrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Undo {
    /// A ledger balance changed.
    Balance {
        /// Owner of the balance.
        principal: Principal,
        /// Balance before the change, `None` if it did not exist.
        previous: Option<Amount>,
    },
    /// A lock record changed.
    Lock {
        /// Lock holder.
        principal: Principal,
        /// Record before the change, `None` if it did not exist.
        previous: Option<Lock>,
    },
    /// The interest reserve changed.
    Reserve {
        /// Reserve before the change.
        previous: Amount,
    },
    /// A listing was appended.
    ListingAppended {
        /// Id of the new listing.
        id: ListingId,
    },
    /// A listing's sold flag changed.
    ListingSold {
        /// Listing id.
        id: ListingId,
        /// Flag before the change.
        previous: bool,
    },
}

/// An open call-boundary transaction.
pub struct Transaction<'a> {
    pool: &'a mut Amount,
    pool_at_start: Amount,
    transfer: &'a mut dyn ValueTransfer,
    journal: Vec<Undo>,
    sent: Vec<(Principal, Amount)>,
}

impl<'a> Transaction<'a> {
    /// Open a transaction over the custody pool and transfer collaborator.
    pub fn begin(pool: &'a mut Amount, transfer: &'a mut dyn ValueTransfer) -> Self {
        let pool_at_start = *pool;
        Self {
            pool,
            pool_at_start,
            transfer,
            journal: Vec::new(),
            sent: Vec::new(),
        }
    }

    /// Record a mutation so it can be undone.
    pub fn record(&mut self, undo: Undo) {
        self.journal.push(undo);
    }

    /// Value currently held by the custody pool.
    #[must_use]
    pub fn pool(&self) -> Amount {
        *self.pool
    }

    /// Accept inbound value that accompanies this call.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Overflow`](crate::ValidationError::Overflow)
    /// if the pool would overflow.
    pub fn receive(&mut self, amount: Amount) -> Result<()> {
        *self.pool = self.pool.try_add(amount)?;
        Ok(())
    }

    /// Send value out of the pool. Zero amounts are skipped.
    ///
    /// This must be the last step that can fail for any state it depends on:
    /// callers update their stores first.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::InsufficientPool`] if the pool cannot cover the
    /// amount, or [`CustodyError::Transfer`] if the collaborator refuses.
    pub fn send(&mut self, to: &Principal, amount: Amount) -> Result<()> {
        if amount.is_zero() {
            return Ok(());
        }
        let remaining = self
            .pool
            .checked_sub(amount)
            .ok_or(StateError::InsufficientPool {
                held: *self.pool,
                need: amount,
            })?;
        if !self.transfer.send(to, amount) {
            warn!(to = %to, amount = %amount, "outward transfer failed");
            return Err(CustodyError::transfer(to, amount));
        }
        *self.pool = remaining;
        self.sent.push((to.clone(), amount));
        Ok(())
    }

    /// Transfers made so far in this call, in order.
    #[must_use]
    pub fn sent(&self) -> &[(Principal, Amount)] {
        &self.sent
    }

    /// Keep every change.
    pub fn commit(self) {
        debug!(
            mutations = self.journal.len(),
            transfers = self.sent.len(),
            "transaction committed"
        );
    }

    /// Revert sends and the pool, and return the store journal newest-first.
    #[must_use]
    pub fn rollback(self) -> Vec<Undo> {
        let Self {
            pool,
            pool_at_start,
            transfer,
            mut journal,
            sent,
        } = self;
        for (to, amount) in sent.iter().rev() {
            transfer.revert(to, *amount);
        }
        *pool = pool_at_start;
        debug!(
            mutations = journal.len(),
            transfers = sent.len(),
            "transaction rolled back"
        );
        journal.reverse();
        journal
    }
}
