//! Outward value transfers.
//!
//! The engine never moves value itself; it asks a [`ValueTransfer`]
//! collaborator to send it. A `false` result from [`ValueTransfer::send`] is
//! always treated as a transfer failure that aborts the whole operation.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::amount::Amount;
use crate::principal::Principal;

/// The value-transfer collaborator.
pub trait ValueTransfer {
    /// Send `amount` to `to`. Returns `false` if the transfer did not happen.
    fn send(&mut self, to: &Principal, amount: Amount) -> bool;

    /// Reverse an earlier successful [`send`](Self::send) that belongs to an
    /// operation which is now aborting.
    fn revert(&mut self, to: &Principal, amount: Amount);
}

impl<T: ValueTransfer + ?Sized> ValueTransfer for Box<T> {
    fn send(&mut self, to: &Principal, amount: Amount) -> bool {
        (**self).send(to, amount)
    }

    fn revert(&mut self, to: &Principal, amount: Amount) {
        (**self).revert(to, amount);
    }
}

/// In-memory external wallets.
///
/// Tracks what each principal has received from the engine. Principals in
/// the reject set refuse every transfer, which lets callers exercise the
/// rollback paths.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimulatedTransfer {
    #[serde(default)]
    wallets: BTreeMap<Principal, Amount>,
    #[serde(default)]
    rejecting: BTreeSet<Principal>,
    #[serde(default)]
    sent_count: u64,
}

impl SimulatedTransfer {
    /// Create an empty simulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every future transfer to `principal` fail.
    pub fn reject(&mut self, principal: impl Into<Principal>) {
        self.rejecting.insert(principal.into());
    }

    /// Accept transfers to `principal` again.
    pub fn accept(&mut self, principal: &Principal) {
        self.rejecting.remove(principal);
    }

    /// Check whether transfers to `principal` are rejected.
    #[must_use]
    pub fn is_rejecting(&self, principal: &Principal) -> bool {
        self.rejecting.contains(principal)
    }

    /// Total value received by `principal`.
    #[must_use]
    pub fn received(&self, principal: &Principal) -> Amount {
        self.wallets.get(principal).copied().unwrap_or_default()
    }

    /// Total value sent out across all principals.
    #[must_use]
    pub fn total_sent(&self) -> Amount {
        self.wallets.values().sum()
    }

    /// Number of transfers that currently stand (reverted ones excluded).
    #[must_use]
    pub const fn transfer_count(&self) -> u64 {
        self.sent_count
    }

    /// All wallets with a non-zero amount received.
    pub fn wallets(&self) -> impl Iterator<Item = (&Principal, &Amount)> {
        self.wallets.iter().filter(|(_, a)| !a.is_zero())
    }
}

impl ValueTransfer for SimulatedTransfer {
    fn send(&mut self, to: &Principal, amount: Amount) -> bool {
        if to.is_null() || self.rejecting.contains(to) {
            debug!(to = %to, amount = %amount, "simulated transfer rejected");
            return false;
        }
        let wallet = self.wallets.entry(to.clone()).or_default();
        match wallet.checked_add(amount) {
            Some(total) => {
                *wallet = total;
                self.sent_count += 1;
                true
            }
            None => false,
        }
    }

    fn revert(&mut self, to: &Principal, amount: Amount) {
        if let Some(wallet) = self.wallets.get_mut(to) {
            *wallet = wallet.saturating_sub(amount);
            self.sent_count = self.sent_count.saturating_sub(1);
        }
    }
}
