//! The external-call boundary.
//!
//! [`Custody`] owns the balance, lock and listing stores together with the
//! custody pool and the collaborators. Each public mutating method is one
//! external call: it runs inside a [`Transaction`], and if anything fails the
//! journal is replayed so the call leaves no trace. One event is emitted per
//! committed call.

use tracing::{info, warn};

use crate::access::authorize;
use crate::amount::Amount;
use crate::clock::{Clock, SystemClock, Timestamp};
use crate::config::CustodyConfig;
use crate::distribution::{self, DistributionReceipt};
use crate::error::Result;
use crate::events::{CustodyEvent, EventKind, EventSink, TracingSink};
use crate::exchange::{EscrowExchange, Listing, ListingId};
use crate::fee::FeePolicy;
use crate::ledger::{AccountLedger, WithdrawReceipt};
use crate::principal::Principal;
use crate::transaction::{Transaction, Undo};
use crate::transfer::ValueTransfer;
use crate::vault::{Lock, LockState, LockTerms, TimeLockVault};

/// The three independently keyed stores.
#[derive(Debug, Clone, Default)]
pub(crate) struct Stores {
    pub(crate) ledger: AccountLedger,
    pub(crate) vault: TimeLockVault,
    pub(crate) exchange: EscrowExchange,
}

impl Stores {
    fn undo(&mut self, journal: Vec<Undo>) {
        for entry in journal {
            match entry {
                Undo::Balance {
                    principal,
                    previous,
                } => self.ledger.undo(principal, previous),
                Undo::Lock {
                    principal,
                    previous,
                } => self.vault.undo_lock(principal, previous),
                Undo::Reserve { previous } => self.vault.undo_reserve(previous),
                Undo::ListingAppended { id } => self.exchange.undo_append(id),
                Undo::ListingSold { id, previous } => self.exchange.undo_sold(id, previous),
            }
        }
    }
}

/// Value custody engine.
pub struct Custody<T, C = SystemClock, S = TracingSink> {
    pub(crate) config: CustodyConfig,
    pub(crate) fees: FeePolicy,
    pub(crate) stores: Stores,
    pub(crate) pool: Amount,
    pub(crate) transfer: T,
    pub(crate) clock: C,
    pub(crate) events: S,
}

impl<T: ValueTransfer> Custody<T> {
    /// Create an engine on the system clock that logs events via `tracing`.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `config` is invalid.
    pub fn new(config: CustodyConfig, transfer: T) -> Result<Self> {
        Self::with_parts(config, transfer, SystemClock, TracingSink)
    }
}

impl<T: ValueTransfer, C: Clock, S: EventSink> Custody<T, C, S> {
    /// Create an engine from explicit collaborators.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `config` is invalid.
    pub fn with_parts(config: CustodyConfig, transfer: T, clock: C, events: S) -> Result<Self> {
        config.validate()?;
        let fees = config.fee_policy()?;
        info!(owner = %config.owner, fee_bps = fees.rate_bps(), "custody engine created");
        Ok(Self {
            config,
            fees,
            stores: Stores::default(),
            pool: Amount::ZERO,
            transfer,
            clock,
            events,
        })
    }

    // --- reads ---

    /// Current configuration.
    #[must_use]
    pub const fn config(&self) -> &CustodyConfig {
        &self.config
    }

    /// Committed ledger balance of `principal`.
    #[must_use]
    pub fn balance_of(&self, principal: &Principal) -> Amount {
        self.stores.ledger.balance_of(principal)
    }

    /// Sum of all ledger balances.
    #[must_use]
    pub fn total_balances(&self) -> Amount {
        self.stores.ledger.total()
    }

    /// The balance store.
    #[must_use]
    pub const fn ledger(&self) -> &AccountLedger {
        &self.stores.ledger
    }

    /// Lock record of `principal`.
    #[must_use]
    pub fn lock_of(&self, principal: &Principal) -> Option<&Lock> {
        self.stores.vault.lock_of(principal)
    }

    /// Lock lifecycle state of `principal` according to the clock.
    #[must_use]
    pub fn lock_state(&self, principal: &Principal) -> LockState {
        self.stores.vault.state_of(principal, self.clock.now())
    }

    /// The lock store.
    #[must_use]
    pub const fn vault(&self) -> &TimeLockVault {
        &self.stores.vault
    }

    /// Listing `id`.
    #[must_use]
    pub fn listing(&self, id: ListingId) -> Option<&Listing> {
        self.stores.exchange.listing(id)
    }

    /// All listings in id order.
    #[must_use]
    pub fn listings(&self) -> &[Listing] {
        self.stores.exchange.listings()
    }

    /// Total value held by the engine.
    #[must_use]
    pub const fn pool(&self) -> Amount {
        self.pool
    }

    /// Value owed to principals or reserved for interest.
    ///
    /// Always equal to [`pool`](Self::pool) after a committed call.
    #[must_use]
    pub fn liabilities(&self) -> Amount {
        self.stores
            .ledger
            .total()
            .saturating_add(self.stores.vault.total_locked())
            .saturating_add(self.stores.vault.reserve())
    }

    /// [`liabilities`](Self::liabilities) without saturation.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Overflow`](crate::ValidationError::Overflow)
    /// if the stores owe more than fits in an [`Amount`].
    pub(crate) fn checked_liabilities(&self) -> Result<Amount> {
        let balances = self.stores.ledger.balances().values().copied();
        let locked = self
            .stores
            .vault
            .locks()
            .values()
            .filter(|lock| !lock.claimed)
            .map(|lock| lock.amount);
        balances
            .chain(locked)
            .try_fold(self.stores.vault.reserve(), |acc, amount| acc.try_add(amount))
    }

    /// Current time according to the clock.
    #[must_use]
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// The transfer collaborator.
    #[must_use]
    pub const fn transfer(&self) -> &T {
        &self.transfer
    }

    /// Mutable access to the transfer collaborator.
    pub fn transfer_mut(&mut self) -> &mut T {
        &mut self.transfer
    }

    /// The event sink.
    #[must_use]
    pub const fn events(&self) -> &S {
        &self.events
    }

    /// Tear down the engine, returning the transfer collaborator and sink.
    pub fn into_parts(self) -> (T, S) {
        (self.transfer, self.events)
    }

    // --- AccountLedger ---

    /// Deposit `amount` to `principal`'s balance. The value accompanies the call.
    ///
    /// # Errors
    ///
    /// See [`AccountLedger::deposit`].
    pub fn deposit(&mut self, principal: &Principal, amount: Amount) -> Result<Amount> {
        let minimum = self.config.min_deposit;
        self.atomically(principal, |stores, tx| {
            let balance = stores.ledger.deposit(tx, principal, amount, minimum)?;
            Ok((
                balance,
                EventKind::Deposited {
                    principal: principal.clone(),
                    amount,
                },
            ))
        })
    }

    /// Withdraw `amount` from `principal`'s balance, net of the fee.
    ///
    /// # Errors
    ///
    /// See [`AccountLedger::withdraw`].
    pub fn withdraw(&mut self, principal: &Principal, amount: Amount) -> Result<WithdrawReceipt> {
        let fees = self.fees;
        let fee_recipient = self.config.fee_recipient.clone();
        self.atomically(principal, |stores, tx| {
            let receipt = stores
                .ledger
                .withdraw(tx, principal, amount, &fees, &fee_recipient)?;
            Ok((
                receipt,
                EventKind::Withdrawn {
                    principal: principal.clone(),
                    amount,
                    fee: receipt.fee,
                },
            ))
        })
    }

    // --- DistributionEngine ---

    /// Split `pool`, supplied by the owner with this call, across `recipients`.
    ///
    /// # Errors
    ///
    /// Returns an authorization error if `caller` is not the owner; otherwise
    /// see [`distribution::distribute`].
    pub fn distribute(
        &mut self,
        caller: &Principal,
        pool: Amount,
        recipients: &[Principal],
    ) -> Result<DistributionReceipt> {
        authorize(caller, &self.config.owner)?;
        self.atomically(caller, |_, tx| {
            let receipt = distribution::distribute(tx, caller, pool, recipients)?;
            Ok((
                receipt,
                EventKind::Distributed {
                    initiator: caller.clone(),
                    pool,
                    share: receipt.share,
                    remainder: receipt.remainder,
                    recipients: recipients.to_vec(),
                },
            ))
        })
    }

    // --- TimeLockVault ---

    /// Lock `amount` for `principal` under the configured terms.
    ///
    /// # Errors
    ///
    /// See [`TimeLockVault::lock`].
    pub fn lock(&mut self, principal: &Principal, amount: Amount) -> Result<Lock> {
        let terms = self.config.lock_terms;
        let now = self.clock.now();
        self.atomically(principal, |stores, tx| {
            let lock = stores.vault.lock(tx, principal, amount, terms, now)?;
            Ok((
                lock,
                EventKind::Locked {
                    principal: principal.clone(),
                    amount,
                    maturity: lock.maturity,
                },
            ))
        })
    }

    /// Claim `principal`'s matured lock with interest.
    ///
    /// # Errors
    ///
    /// See [`TimeLockVault::unlock`].
    pub fn unlock(&mut self, principal: &Principal) -> Result<Amount> {
        let now = self.clock.now();
        self.atomically(principal, |stores, tx| {
            let payout = stores.vault.unlock(tx, principal, now)?;
            Ok((
                payout,
                EventKind::Unlocked {
                    principal: principal.clone(),
                    payout,
                },
            ))
        })
    }

    /// Top up the interest reserve with value supplied by the owner.
    ///
    /// # Errors
    ///
    /// Returns an authorization error if `caller` is not the owner; otherwise
    /// see [`TimeLockVault::fund_reserve`].
    pub fn fund_reserve(&mut self, caller: &Principal, amount: Amount) -> Result<Amount> {
        authorize(caller, &self.config.owner)?;
        self.atomically(caller, |stores, tx| {
            let reserve = stores.vault.fund_reserve(tx, amount)?;
            Ok((reserve, EventKind::ReserveFunded { amount }))
        })
    }

    // --- EscrowExchange ---

    /// List an item for `price`.
    ///
    /// # Errors
    ///
    /// See [`EscrowExchange::list`].
    pub fn list(&mut self, seller: &Principal, price: Amount) -> Result<ListingId> {
        self.atomically(seller, |stores, tx| {
            let id = stores.exchange.list(tx, seller, price)?;
            Ok((
                id,
                EventKind::Listed {
                    listing_id: id,
                    seller: seller.clone(),
                    price,
                },
            ))
        })
    }

    /// Purchase listing `id`; `value_sent` accompanies the call.
    ///
    /// # Errors
    ///
    /// See [`EscrowExchange::purchase`].
    pub fn purchase(
        &mut self,
        buyer: &Principal,
        id: ListingId,
        value_sent: Amount,
    ) -> Result<Listing> {
        self.atomically(buyer, |stores, tx| {
            let listing = stores.exchange.purchase(tx, buyer, id, value_sent)?;
            let kind = EventKind::Purchased {
                listing_id: id,
                buyer: buyer.clone(),
                seller: listing.seller.clone(),
                price: listing.price,
            };
            Ok((listing, kind))
        })
    }

    // --- privileged configuration ---

    /// Change the withdrawal fee and its recipient.
    ///
    /// # Errors
    ///
    /// Returns an authorization error for a non-owner caller, or a validation
    /// error for a rate above 10 000 bps or a missing recipient.
    pub fn set_fee(&mut self, caller: &Principal, rate_bps: u64, recipient: Principal) -> Result<()> {
        authorize(caller, &self.config.owner)?;
        let fees = FeePolicy::new(rate_bps)?;
        if rate_bps > 0 {
            recipient.require()?;
        }
        self.fees = fees;
        self.config.fee_rate_bps = rate_bps;
        self.config.fee_recipient = recipient.clone();
        self.emit(caller, EventKind::FeeChanged { rate_bps, recipient });
        Ok(())
    }

    /// Change the deposit minimum.
    ///
    /// # Errors
    ///
    /// Returns an authorization error for a non-owner caller.
    pub fn set_min_deposit(&mut self, caller: &Principal, minimum: Amount) -> Result<()> {
        authorize(caller, &self.config.owner)?;
        self.config.min_deposit = minimum;
        self.emit(caller, EventKind::MinimumChanged { minimum });
        Ok(())
    }

    /// Change the terms applied to new locks. Existing locks keep their terms.
    ///
    /// # Errors
    ///
    /// Returns an authorization error for a non-owner caller.
    pub fn set_lock_terms(&mut self, caller: &Principal, terms: LockTerms) -> Result<()> {
        authorize(caller, &self.config.owner)?;
        self.config.lock_terms = terms;
        self.emit(
            caller,
            EventKind::LockTermsChanged {
                duration_secs: terms.duration_secs,
                rate_percent: terms.rate_percent,
            },
        );
        Ok(())
    }

    // --- boundary ---

    fn atomically<R>(
        &mut self,
        caller: &Principal,
        op: impl FnOnce(&mut Stores, &mut Transaction<'_>) -> Result<(R, EventKind)>,
    ) -> Result<R> {
        let mut tx = Transaction::begin(&mut self.pool, &mut self.transfer);
        match op(&mut self.stores, &mut tx) {
            Ok((value, kind)) => {
                tx.commit();
                self.emit(caller, kind);
                Ok(value)
            }
            Err(e) => {
                let journal = tx.rollback();
                self.stores.undo(journal);
                warn!(caller = %caller, error = %e, "operation aborted; state rolled back");
                Err(e)
            }
        }
    }

    fn emit(&mut self, caller: &Principal, kind: EventKind) {
        info!(caller = %caller, operation = kind.operation(), "operation committed");
        self.events.emit(&CustodyEvent::new(caller.clone(), kind));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::{CustodyError, ErrorKind, StateError, ValidationError};
    use crate::events::MemorySink;
    use crate::transfer::SimulatedTransfer;

    type TestCustody = Custody<SimulatedTransfer, ManualClock, MemorySink>;

    fn p(id: &str) -> Principal {
        Principal::new(id)
    }

    fn engine() -> (TestCustody, ManualClock) {
        let config = CustodyConfig::builder("owner")
            .fee(100, "treasury")
            .min_deposit(Amount::new(10))
            .lock_terms(LockTerms {
                duration_secs: 60,
                rate_percent: 10,
            })
            .build()
            .expect("config");
        let clock = ManualClock::at(1_000);
        let custody = Custody::with_parts(config, SimulatedTransfer::new(), clock.clone(), MemorySink::new())
            .expect("engine");
        (custody, clock)
    }

    #[test]
    fn deposit_and_withdraw_with_fee() {
        let (mut custody, _) = engine();
        custody.deposit(&p("alice"), Amount::new(1000)).expect("deposit");
        let receipt = custody.withdraw(&p("alice"), Amount::new(1000)).expect("withdraw");
        assert_eq!(receipt.fee, Amount::new(10));
        assert_eq!(custody.transfer().received(&p("alice")), Amount::new(990));
        assert_eq!(custody.transfer().received(&p("treasury")), Amount::new(10));
        assert_eq!(custody.pool(), Amount::ZERO);
        assert_eq!(custody.events().operations(), vec!["deposit", "withdraw"]);
    }

    #[test]
    fn failed_withdraw_leaves_balance_untouched() {
        let (mut custody, _) = engine();
        custody.deposit(&p("alice"), Amount::new(500)).expect("deposit");
        custody.transfer_mut().reject("alice");

        let before = custody.balance_of(&p("alice"));
        let err = custody.withdraw(&p("alice"), Amount::new(200)).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Transfer);
        assert_eq!(custody.balance_of(&p("alice")), before);
        assert_eq!(custody.pool(), Amount::new(500));
        assert_eq!(custody.transfer().total_sent(), Amount::ZERO);
        assert_eq!(custody.events().operations(), vec!["deposit"]);
    }

    #[test]
    fn failed_fee_leg_reverts_net_payment() {
        let (mut custody, _) = engine();
        custody.deposit(&p("alice"), Amount::new(1000)).expect("deposit");
        custody.transfer_mut().reject("treasury");

        let err = custody.withdraw(&p("alice"), Amount::new(1000)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transfer);
        assert_eq!(custody.transfer().received(&p("alice")), Amount::ZERO);
        assert_eq!(custody.balance_of(&p("alice")), Amount::new(1000));
    }

    #[test]
    fn failed_deposit_does_not_create_record() {
        let (mut custody, _) = engine();
        let err = custody.deposit(&p("alice"), Amount::new(5)).unwrap_err();
        assert!(matches!(
            err,
            CustodyError::Validation(ValidationError::BelowMinimum { .. })
        ));
        assert!(custody.ledger().balances().is_empty());
        assert_eq!(custody.pool(), Amount::ZERO);
    }

    #[test]
    fn distribute_requires_owner() {
        let (mut custody, _) = engine();
        let err = custody
            .distribute(&p("mallory"), Amount::new(100), &[p("a")])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);
    }

    #[test]
    fn distribute_failure_rolls_back_all_payments() {
        let (mut custody, _) = engine();
        custody.transfer_mut().reject("c");
        let err = custody
            .distribute(&p("owner"), Amount::new(100), &[p("a"), p("b"), p("c")])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transfer);
        assert_eq!(custody.transfer().total_sent(), Amount::ZERO);
        assert_eq!(custody.pool(), Amount::ZERO);
        assert!(custody.events().events().is_empty());
    }

    #[test]
    fn lock_lifecycle_follows_clock() {
        let (mut custody, clock) = engine();
        custody.fund_reserve(&p("owner"), Amount::new(100)).expect("fund");
        custody.lock(&p("alice"), Amount::new(200)).expect("lock");
        assert_eq!(custody.lock_state(&p("alice")), LockState::Locked);

        let err = custody.unlock(&p("alice")).unwrap_err();
        assert!(matches!(err, CustodyError::State(StateError::NotMatured { .. })));

        clock.advance(60);
        assert_eq!(custody.lock_state(&p("alice")), LockState::Claimable);
        let payout = custody.unlock(&p("alice")).expect("unlock");
        assert_eq!(payout, Amount::new(220));

        let err = custody.unlock(&p("alice")).unwrap_err();
        assert!(matches!(err, CustodyError::State(StateError::AlreadyClaimed(_))));

        custody.lock(&p("alice"), Amount::new(50)).expect("relock after claim");
        assert_eq!(custody.pool(), custody.liabilities());
    }

    #[test]
    fn failed_unlock_restores_claim_flag_and_reserve() {
        let (mut custody, clock) = engine();
        custody.fund_reserve(&p("owner"), Amount::new(100)).expect("fund");
        custody.lock(&p("alice"), Amount::new(200)).expect("lock");
        clock.advance(60);
        custody.transfer_mut().reject("alice");

        let err = custody.unlock(&p("alice")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transfer);
        let lock = custody.lock_of(&p("alice")).expect("lock record");
        assert!(!lock.claimed);
        assert_eq!(custody.vault().reserve(), Amount::new(100));
        assert_eq!(custody.pool(), Amount::new(300));
    }

    #[test]
    fn fund_reserve_requires_owner() {
        let (mut custody, _) = engine();
        let err = custody.fund_reserve(&p("alice"), Amount::new(1)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);
    }

    #[test]
    fn failed_purchase_restores_listing() {
        let (mut custody, _) = engine();
        let id = custody.list(&p("seller"), Amount::new(40)).expect("list");
        custody.transfer_mut().reject("seller");

        let err = custody.purchase(&p("buyer"), id, Amount::new(40)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transfer);
        assert!(!custody.listing(id).expect("listing").sold);
        assert_eq!(custody.pool(), Amount::ZERO);

        custody.transfer_mut().accept(&p("seller"));
        custody.purchase(&p("buyer"), id, Amount::new(40)).expect("retry");
        assert!(custody.listing(id).expect("listing").sold);
    }

    #[test]
    fn config_changes_are_owner_only() {
        let (mut custody, _) = engine();
        assert!(custody.set_fee(&p("alice"), 0, Principal::null()).is_err());
        assert!(custody.set_min_deposit(&p("alice"), Amount::ZERO).is_err());
        assert!(custody
            .set_lock_terms(&p("alice"), LockTerms::default())
            .is_err());

        custody.set_fee(&p("owner"), 0, Principal::null()).expect("owner sets fee");
        custody.set_min_deposit(&p("owner"), Amount::new(1)).expect("owner sets minimum");
        custody.deposit(&p("alice"), Amount::new(1)).expect("deposit");
        let receipt = custody.withdraw(&p("alice"), Amount::new(1)).expect("withdraw");
        assert_eq!(receipt.fee, Amount::ZERO);
    }

    #[test]
    fn set_fee_rejects_bad_rate() {
        let (mut custody, _) = engine();
        let err = custody.set_fee(&p("owner"), 20_000, p("treasury")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(custody.config().fee_rate_bps, 100);
    }

    #[test]
    fn new_uses_system_clock() {
        let config = CustodyConfig::builder("owner").build().expect("config");
        let custody = Custody::new(config, SimulatedTransfer::new()).expect("engine");
        assert!(custody.now() > 0);
    }
}
