//! Persisted engine state.
//!
//! A snapshot holds the configuration, the three stores, the interest reserve
//! and the pool. It is written as pretty JSON and checked on load: the pool
//! must equal what the engine owes (balances, unclaimed locks and reserve).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

use crate::amount::Amount;
use crate::clock::Clock;
use crate::config::CustodyConfig;
use crate::custody::{Custody, Stores};
use crate::error::{Result, StateError};
use crate::events::EventSink;
use crate::exchange::{EscrowExchange, Listing};
use crate::ledger::AccountLedger;
use crate::principal::Principal;
use crate::transfer::ValueTransfer;
use crate::vault::{Lock, TimeLockVault};

/// Serializable engine state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustodySnapshot {
    /// Engine configuration.
    pub config: CustodyConfig,
    /// Ledger balances.
    #[serde(default)]
    pub balances: BTreeMap<Principal, Amount>,
    /// Lock records.
    #[serde(default)]
    pub locks: BTreeMap<Principal, Lock>,
    /// Listings in id order.
    #[serde(default)]
    pub listings: Vec<Listing>,
    /// Interest reserve.
    #[serde(default)]
    pub reserve: Amount,
    /// Total value held.
    #[serde(default)]
    pub pool: Amount,
}

impl CustodySnapshot {
    /// An empty snapshot for a fresh engine.
    #[must_use]
    pub fn empty(config: CustodyConfig) -> Self {
        Self {
            config,
            balances: BTreeMap::new(),
            locks: BTreeMap::new(),
            listings: Vec::new(),
            reserve: Amount::ZERO,
            pool: Amount::ZERO,
        }
    }

    /// Write the snapshot to `path` as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns error if serialization or writing fails.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        debug!(path = %path.display(), "snapshot saved");
        Ok(())
    }

    /// Read a snapshot from `path`.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed.
    pub fn load_json(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let snapshot = serde_json::from_str(&contents)?;
        debug!(path = %path.display(), "snapshot loaded");
        Ok(snapshot)
    }
}

impl<T: ValueTransfer, C: Clock, S: EventSink> Custody<T, C, S> {
    /// Capture the committed state.
    #[must_use]
    pub fn snapshot(&self) -> CustodySnapshot {
        CustodySnapshot {
            config: self.config.clone(),
            balances: self.stores.ledger.balances().clone(),
            locks: self.stores.vault.locks().clone(),
            listings: self.stores.exchange.listings().to_vec(),
            reserve: self.stores.vault.reserve(),
            pool: self.pool,
        }
    }

    /// Rebuild an engine from a snapshot.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an invalid config, or
    /// [`StateError::CorruptSnapshot`] if listing ids are out of sequence or
    /// the pool does not match the engine's liabilities.
    pub fn restore(snapshot: CustodySnapshot, transfer: T, clock: C, events: S) -> Result<Self> {
        let CustodySnapshot {
            config,
            balances,
            locks,
            listings,
            reserve,
            pool,
        } = snapshot;
        let mut custody = Self::with_parts(config, transfer, clock, events)?;
        custody.stores = Stores {
            ledger: AccountLedger::from_balances(balances),
            vault: TimeLockVault::from_parts(locks, reserve),
            exchange: EscrowExchange::from_listings(listings)?,
        };
        custody.pool = pool;

        let owed = custody.checked_liabilities().map_err(|_| {
            StateError::CorruptSnapshot(format!("liabilities exceed {}", Amount::MAX))
        })?;
        if owed != pool {
            return Err(StateError::CorruptSnapshot(format!(
                "pool holds {pool} but liabilities are {owed}"
            ))
            .into());
        }
        info!(
            balances = custody.stores.ledger.balances().len(),
            locks = custody.stores.vault.locks().len(),
            listings = custody.stores.exchange.listings().len(),
            pool = %pool,
            "custody engine restored"
        );
        Ok(custody)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::CustodyError;
    use crate::events::MemorySink;
    use crate::transfer::SimulatedTransfer;

    type TestCustody = Custody<SimulatedTransfer, ManualClock, MemorySink>;

    fn populated() -> TestCustody {
        let config = CustodyConfig::builder("owner").build().expect("config");
        let mut custody = Custody::with_parts(
            config,
            SimulatedTransfer::new(),
            ManualClock::at(0),
            MemorySink::new(),
        )
        .expect("engine");
        let owner = Principal::new("owner");
        let alice = Principal::new("alice");
        custody.deposit(&alice, Amount::new(70)).expect("deposit");
        custody.fund_reserve(&owner, Amount::new(30)).expect("fund");
        custody.lock(&Principal::new("bob"), Amount::new(20)).expect("lock");
        let id = custody.list(&Principal::new("seller"), Amount::new(9)).expect("list");
        custody.purchase(&alice, id, Amount::new(9)).expect("purchase");
        custody
    }

    #[test]
    fn snapshot_roundtrips_through_file() {
        let custody = populated();
        let snapshot = custody.snapshot();
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("state.json");
        snapshot.save_json(&path).expect("save");

        let loaded = CustodySnapshot::load_json(&path).expect("load");
        assert_eq!(loaded, snapshot);

        let restored: TestCustody =
            Custody::restore(loaded, SimulatedTransfer::new(), ManualClock::at(0), MemorySink::new())
                .expect("restore");
        assert_eq!(restored.balance_of(&Principal::new("alice")), Amount::new(70));
        assert_eq!(restored.pool(), Amount::new(120));
        assert!(restored.listings()[0].sold);
    }

    #[test]
    fn restore_rejects_pool_mismatch() {
        let mut snapshot = populated().snapshot();
        snapshot.pool = Amount::new(1);
        let result: Result<TestCustody> = Custody::restore(
            snapshot,
            SimulatedTransfer::new(),
            ManualClock::at(0),
            MemorySink::new(),
        );
        assert!(matches!(
            result,
            Err(CustodyError::State(StateError::CorruptSnapshot(_)))
        ));
    }

    #[test]
    fn restore_rejects_overflowing_balances() {
        let config = CustodyConfig::builder("owner").build().expect("config");
        let mut snapshot = CustodySnapshot::empty(config);
        snapshot.balances.insert(Principal::new("alice"), Amount::MAX);
        snapshot.balances.insert(Principal::new("bob"), Amount::new(1));
        snapshot.pool = Amount::MAX;

        let result: Result<TestCustody> = Custody::restore(
            snapshot,
            SimulatedTransfer::new(),
            ManualClock::at(0),
            MemorySink::new(),
        );
        assert!(matches!(
            result,
            Err(CustodyError::State(StateError::CorruptSnapshot(_)))
        ));
    }

    #[test]
    fn empty_snapshot_restores() {
        let config = CustodyConfig::builder("owner").build().expect("config");
        let restored: TestCustody = Custody::restore(
            CustodySnapshot::empty(config),
            SimulatedTransfer::new(),
            ManualClock::at(0),
            MemorySink::new(),
        )
        .expect("restore");
        assert_eq!(restored.pool(), Amount::ZERO);
    }
}
