//! Time-locked, interest-bearing deposits.
//!
//! Each principal holds at most one unclaimed lock. A lock moves through
//! `Unlocked -> Locked -> Claimable -> Claimed`, where `Claimable` is not
//! stored: it is any `Locked` record whose maturity has passed.
//!
//! Interest is paid from an owner-funded reserve so that lock payouts can
//! never draw on value the ledger owes to other principals.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

use crate::amount::Amount;
use crate::clock::Timestamp;
use crate::error::{Result, StateError, ValidationError};
use crate::principal::Principal;
use crate::transaction::{Transaction, Undo};

/// Interest is expressed in whole percent.
pub const PERCENT_SCALE: u64 = 100;

/// Terms applied to a new lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockTerms {
    /// Seconds from lock until maturity.
    pub duration_secs: u64,
    /// Interest paid at maturity, in percent of the locked amount.
    pub rate_percent: u64,
}

impl LockTerms {
    /// Default lock duration (30 days).
    pub const DEFAULT_DURATION_SECS: u64 = 30 * 24 * 60 * 60;

    /// Default interest (5%).
    pub const DEFAULT_RATE_PERCENT: u64 = 5;
}

impl Default for LockTerms {
    fn default() -> Self {
        Self {
            duration_secs: Self::DEFAULT_DURATION_SECS,
            rate_percent: Self::DEFAULT_RATE_PERCENT,
        }
    }
}

/// A time-locked deposit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lock {
    /// Locked amount.
    pub amount: Amount,
    /// Timestamp at or after which the lock can be claimed.
    pub maturity: Timestamp,
    /// Interest in percent.
    pub rate_percent: u64,
    /// Whether the payout has been made.
    pub claimed: bool,
}

impl Lock {
    /// Interest due at maturity: `floor(amount × rate / 100)`.
    #[must_use]
    pub fn interest(&self) -> Amount {
        let interest =
            u128::from(self.amount.units()) * u128::from(self.rate_percent) / u128::from(PERCENT_SCALE);
        Amount::new(u64::try_from(interest).unwrap_or(u64::MAX))
    }

    /// Locked amount plus interest.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Overflow`] if the payout does not fit.
    pub fn payout(&self) -> Result<Amount> {
        self.amount.try_add(self.interest())
    }

    /// Lifecycle state at `now`.
    #[must_use]
    pub const fn state(&self, now: Timestamp) -> LockState {
        if self.claimed {
            LockState::Claimed
        } else if now >= self.maturity {
            LockState::Claimable
        } else {
            LockState::Locked
        }
    }
}

/// Lifecycle of a principal's lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockState {
    /// No lock has ever been taken.
    Unlocked,
    /// Locked and not yet mature.
    Locked,
    /// Locked and mature, awaiting claim.
    Claimable,
    /// Paid out.
    Claimed,
}

impl LockState {
    /// Check if a new lock may be opened from this state.
    #[must_use]
    pub const fn can_lock(&self) -> bool {
        matches!(self, Self::Unlocked | Self::Claimed)
    }
}

impl fmt::Display for LockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unlocked => write!(f, "unlocked"),
            Self::Locked => write!(f, "locked"),
            Self::Claimable => write!(f, "claimable"),
            Self::Claimed => write!(f, "claimed"),
        }
    }
}

/// Lock store plus the interest reserve.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeLockVault {
    locks: BTreeMap<Principal, Lock>,
    reserve: Amount,
}

impl TimeLockVault {
    /// Create an empty vault.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a vault from persisted records.
    #[must_use]
    pub const fn from_parts(locks: BTreeMap<Principal, Lock>, reserve: Amount) -> Self {
        Self { locks, reserve }
    }

    /// The lock record of `principal`, claimed or not.
    #[must_use]
    pub fn lock_of(&self, principal: &Principal) -> Option<&Lock> {
        self.locks.get(principal)
    }

    /// Lifecycle state of `principal` at `now`.
    #[must_use]
    pub fn state_of(&self, principal: &Principal, now: Timestamp) -> LockState {
        self.locks
            .get(principal)
            .map_or(LockState::Unlocked, |lock| lock.state(now))
    }

    /// All lock records.
    #[must_use]
    pub const fn locks(&self) -> &BTreeMap<Principal, Lock> {
        &self.locks
    }

    /// Sum of unclaimed locked amounts.
    #[must_use]
    pub fn total_locked(&self) -> Amount {
        self.locks
            .values()
            .filter(|lock| !lock.claimed)
            .map(|lock| lock.amount)
            .sum()
    }

    /// Value available for interest payouts.
    #[must_use]
    pub const fn reserve(&self) -> Amount {
        self.reserve
    }

    /// Add owner-supplied value to the interest reserve.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a zero or overflowing amount.
    pub fn fund_reserve(&mut self, tx: &mut Transaction<'_>, amount: Amount) -> Result<Amount> {
        if amount.is_zero() {
            return Err(ValidationError::ZeroAmount.into());
        }
        let reserve = self.reserve.try_add(amount)?;
        tx.receive(amount)?;
        self.set_reserve(tx, reserve);
        Ok(reserve)
    }

    /// Open a lock of `amount` for `principal`, maturing `terms.duration_secs`
    /// after `now`.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::AlreadyLocked`] if an unclaimed lock exists, or a
    /// validation error for a null principal or zero amount.
    pub fn lock(
        &mut self,
        tx: &mut Transaction<'_>,
        principal: &Principal,
        amount: Amount,
        terms: LockTerms,
        now: Timestamp,
    ) -> Result<Lock> {
        principal.require()?;
        if !self.state_of(principal, now).can_lock() {
            return Err(StateError::AlreadyLocked(principal.clone()).into());
        }
        if amount.is_zero() {
            return Err(ValidationError::ZeroAmount.into());
        }
        let maturity = now
            .checked_add(terms.duration_secs)
            .ok_or(ValidationError::Overflow)?;
        let lock = Lock {
            amount,
            maturity,
            rate_percent: terms.rate_percent,
            claimed: false,
        };
        // Reject terms whose payout could never be represented.
        lock.payout()?;
        tx.receive(amount)?;
        self.set_lock(tx, principal, lock);
        debug!(principal = %principal, amount = %amount, maturity, "lock opened");
        Ok(lock)
    }

    /// Pay out a matured lock.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::NothingLocked`], [`StateError::AlreadyClaimed`],
    /// [`StateError::NotMatured`], [`StateError::InsufficientReserve`], or a
    /// transfer error.
    pub fn unlock(
        &mut self,
        tx: &mut Transaction<'_>,
        principal: &Principal,
        now: Timestamp,
    ) -> Result<Amount> {
        let lock = match self.locks.get(principal) {
            Some(lock) if !lock.amount.is_zero() => *lock,
            _ => return Err(StateError::NothingLocked(principal.clone()).into()),
        };
        if lock.claimed {
            return Err(StateError::AlreadyClaimed(principal.clone()).into());
        }
        if now < lock.maturity {
            return Err(StateError::NotMatured {
                maturity: lock.maturity,
                now,
            }
            .into());
        }
        let interest = lock.interest();
        let reserve = self
            .reserve
            .checked_sub(interest)
            .ok_or(StateError::InsufficientReserve {
                available: self.reserve,
                need: interest,
            })?;
        let payout = lock.payout()?;

        // Tombstone before any value leaves.
        self.set_lock(
            tx,
            principal,
            Lock {
                claimed: true,
                ..lock
            },
        );
        self.set_reserve(tx, reserve);
        tx.send(principal, payout)?;
        Ok(payout)
    }

    /// Apply a lock journal entry.
    pub(crate) fn undo_lock(&mut self, principal: Principal, previous: Option<Lock>) {
        match previous {
            Some(lock) => {
                self.locks.insert(principal, lock);
            }
            None => {
                self.locks.remove(&principal);
            }
        }
    }

    /// Apply a reserve journal entry.
    pub(crate) fn undo_reserve(&mut self, previous: Amount) {
        self.reserve = previous;
    }

    fn set_lock(&mut self, tx: &mut Transaction<'_>, principal: &Principal, lock: Lock) {
        let previous = self.locks.insert(principal.clone(), lock);
        tx.record(Undo::Lock {
            principal: principal.clone(),
            previous,
        });
    }

    fn set_reserve(&mut self, tx: &mut Transaction<'_>, reserve: Amount) {
        tx.record(Undo::Reserve {
            previous: self.reserve,
        });
        self.reserve = reserve;
    }
}
