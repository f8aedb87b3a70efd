//! Per-principal balances with fee-deducted withdrawals.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::amount::Amount;
use crate::error::{Result, StateError, ValidationError};
use crate::fee::FeePolicy;
use crate::principal::Principal;
use crate::transaction::{Transaction, Undo};

/// Outcome of a committed withdrawal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawReceipt {
    /// Amount debited from the balance.
    pub amount: Amount,
    /// Amount sent to the withdrawer.
    pub net: Amount,
    /// Amount sent to the fee recipient.
    pub fee: Amount,
}

/// Balance store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountLedger {
    balances: BTreeMap<Principal, Amount>,
}

impl AccountLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a ledger from persisted balances.
    #[must_use]
    pub const fn from_balances(balances: BTreeMap<Principal, Amount>) -> Self {
        Self { balances }
    }

    /// Current committed balance of `principal`.
    #[must_use]
    pub fn balance_of(&self, principal: &Principal) -> Amount {
        self.balances.get(principal).copied().unwrap_or_default()
    }

    /// Sum of every balance.
    #[must_use]
    pub fn total(&self) -> Amount {
        self.balances.values().sum()
    }

    /// All balance records, including zeroed ones.
    #[must_use]
    pub const fn balances(&self) -> &BTreeMap<Principal, Amount> {
        &self.balances
    }

    /// Credit `amount` to `principal`, accepting the value into the pool.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a null principal, a zero amount, an
    /// amount below `minimum`, or an overflowing balance.
    pub fn deposit(
        &mut self,
        tx: &mut Transaction<'_>,
        principal: &Principal,
        amount: Amount,
        minimum: Amount,
    ) -> Result<Amount> {
        principal.require()?;
        if amount.is_zero() {
            return Err(ValidationError::ZeroAmount.into());
        }
        if amount < minimum {
            return Err(ValidationError::BelowMinimum { amount, minimum }.into());
        }
        let balance = self.balance_of(principal).try_add(amount)?;
        tx.receive(amount)?;
        self.set(tx, principal, balance);
        debug!(principal = %principal, amount = %amount, balance = %balance, "deposit applied");
        Ok(balance)
    }

    /// Debit `amount`, then pay `amount - fee` to the principal and `fee` to
    /// `fee_recipient`.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::InsufficientBalance`] if the balance is short, or
    /// a transfer error if either payment fails. In both cases the caller
    /// must roll back `tx`.
    pub fn withdraw(
        &mut self,
        tx: &mut Transaction<'_>,
        principal: &Principal,
        amount: Amount,
        fees: &FeePolicy,
        fee_recipient: &Principal,
    ) -> Result<WithdrawReceipt> {
        principal.require()?;
        if amount.is_zero() {
            return Err(ValidationError::ZeroAmount.into());
        }
        let have = self.balance_of(principal);
        let remaining = have
            .checked_sub(amount)
            .ok_or(StateError::InsufficientBalance { have, need: amount })?;

        // Debit before any value leaves.
        self.set(tx, principal, remaining);

        let (net, fee) = fees.split(amount);
        tx.send(principal, net)?;
        tx.send(fee_recipient, fee)?;
        Ok(WithdrawReceipt { amount, net, fee })
    }

    /// Apply a journal entry produced by this ledger.
    pub(crate) fn undo(&mut self, principal: Principal, previous: Option<Amount>) {
        match previous {
            Some(balance) => {
                self.balances.insert(principal, balance);
            }
            None => {
                self.balances.remove(&principal);
            }
        }
    }

    fn set(&mut self, tx: &mut Transaction<'_>, principal: &Principal, balance: Amount) {
        let previous = self.balances.insert(principal.clone(), balance);
        tx.record(Undo::Balance {
            principal: principal.clone(),
            previous,
        });
    }
}
