//! Single-listing, single-purchase escrowed settlement.
//!
//! A seller lists an item at a fixed price. Exactly one buyer can purchase
//! it, and only by sending exactly the price; the value is forwarded to the
//! seller in the same call. Sold listings are kept as tombstones.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::amount::Amount;
use crate::error::{Result, StateError, ValidationError};
use crate::principal::Principal;
use crate::transaction::{Transaction, Undo};

/// Sequential listing identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListingId(u64);

impl ListingId {
    /// Create from a raw id.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// The raw id.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A priced offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    /// Listing id.
    pub id: ListingId,
    /// Seller who receives the price.
    pub seller: Principal,
    /// Exact price.
    pub price: Amount,
    /// Whether the listing has been purchased.
    pub sold: bool,
}

/// Listing store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowExchange {
    listings: Vec<Listing>,
}

impl EscrowExchange {
    /// Create an empty exchange.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild an exchange from persisted listings.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::CorruptSnapshot`] unless ids run 0, 1, 2, … in order.
    pub fn from_listings(listings: Vec<Listing>) -> Result<Self> {
        for (index, listing) in listings.iter().enumerate() {
            if listing.id.get() != index as u64 {
                return Err(StateError::CorruptSnapshot(format!(
                    "listing at position {index} has id {}",
                    listing.id
                ))
                .into());
            }
        }
        Ok(Self { listings })
    }

    /// Look up a listing.
    #[must_use]
    pub fn listing(&self, id: ListingId) -> Option<&Listing> {
        usize::try_from(id.get())
            .ok()
            .and_then(|index| self.listings.get(index))
    }

    /// All listings in id order.
    #[must_use]
    pub fn listings(&self) -> &[Listing] {
        &self.listings
    }

    /// The id the next listing will receive.
    #[must_use]
    pub fn next_id(&self) -> ListingId {
        ListingId(self.listings.len() as u64)
    }

    /// Append a listing.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ZeroPrice`] for a zero price or a
    /// validation error for a null seller.
    pub fn list(
        &mut self,
        tx: &mut Transaction<'_>,
        seller: &Principal,
        price: Amount,
    ) -> Result<ListingId> {
        seller.require()?;
        if price.is_zero() {
            return Err(ValidationError::ZeroPrice.into());
        }
        let id = self.next_id();
        self.listings.push(Listing {
            id,
            seller: seller.clone(),
            price,
            sold: false,
        });
        tx.record(Undo::ListingAppended { id });
        debug!(id = %id, seller = %seller, price = %price, "listing created");
        Ok(id)
    }

    /// Buy listing `id` with exactly `value_sent`, forwarding it to the seller.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NotFound`], [`StateError::AlreadySold`],
    /// [`ValidationError::WrongAmount`], or a transfer error.
    pub fn purchase(
        &mut self,
        tx: &mut Transaction<'_>,
        buyer: &Principal,
        id: ListingId,
        value_sent: Amount,
    ) -> Result<Listing> {
        buyer.require()?;
        let index = usize::try_from(id.get()).map_err(|_| ValidationError::NotFound(id))?;
        let listing = self
            .listings
            .get_mut(index)
            .ok_or(ValidationError::NotFound(id))?;
        if listing.sold {
            return Err(StateError::AlreadySold(id).into());
        }
        if value_sent != listing.price {
            return Err(ValidationError::WrongAmount {
                expected: listing.price,
                sent: value_sent,
            }
            .into());
        }

        tx.receive(value_sent)?;
        // Tombstone before any value leaves.
        listing.sold = true;
        tx.record(Undo::ListingSold {
            id,
            previous: false,
        });
        let settled = listing.clone();
        tx.send(&settled.seller, value_sent)?;
        Ok(settled)
    }

    /// Undo an append.
    pub(crate) fn undo_append(&mut self, id: ListingId) {
        if let Ok(len) = usize::try_from(id.get()) {
            self.listings.truncate(len);
        }
    }

    /// Undo a sold-flag change.
    pub(crate) fn undo_sold(&mut self, id: ListingId, previous: bool) {
        if let Some(listing) = usize::try_from(id.get())
            .ok()
            .and_then(|index| self.listings.get_mut(index))
        {
            listing.sold = previous;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CustodyError, ErrorKind};
    use crate::transfer::SimulatedTransfer;
    use test_case::test_case;

    fn seller() -> Principal {
        Principal::new("seller")
    }

    fn buyer() -> Principal {
        Principal::new("buyer")
    }

    #[test]
    fn ids_are_sequential() {
        let mut exchange = EscrowExchange::new();
        let mut pool = Amount::ZERO;
        let mut sim = SimulatedTransfer::new();
        let mut tx = Transaction::begin(&mut pool, &mut sim);
        let a = exchange.list(&mut tx, &seller(), Amount::new(5)).expect("list");
        let b = exchange.list(&mut tx, &seller(), Amount::new(6)).expect("list");
        assert_eq!(a, ListingId::new(0));
        assert_eq!(b, ListingId::new(1));
    }

    #[test]
    fn zero_price_rejected() {
        let mut exchange = EscrowExchange::new();
        let mut pool = Amount::ZERO;
        let mut sim = SimulatedTransfer::new();
        let mut tx = Transaction::begin(&mut pool, &mut sim);
        let err = exchange.list(&mut tx, &seller(), Amount::ZERO).unwrap_err();
        assert!(matches!(err, CustodyError::Validation(ValidationError::ZeroPrice)));
    }

    #[test]
    fn purchase_forwards_to_seller() {
        let mut exchange = EscrowExchange::new();
        let mut pool = Amount::ZERO;
        let mut sim = SimulatedTransfer::new();
        {
            let mut tx = Transaction::begin(&mut pool, &mut sim);
            let id = exchange.list(&mut tx, &seller(), Amount::new(50)).expect("list");
            let settled = exchange
                .purchase(&mut tx, &buyer(), id, Amount::new(50))
                .expect("purchase");
            assert!(settled.sold);
            tx.commit();
        }
        assert_eq!(sim.received(&seller()), Amount::new(50));
        assert_eq!(pool, Amount::ZERO);
        let listing = exchange.listing(ListingId::new(0)).expect("listing");
        assert!(listing.sold);
        assert_eq!(listing.seller, seller());
        assert_eq!(listing.price, Amount::new(50));
    }

    #[test_case(49 ; "underpayment")]
    #[test_case(51 ; "overpayment")]
    fn wrong_amount_rejected(sent: u64) {
        let mut exchange = EscrowExchange::new();
        let mut pool = Amount::ZERO;
        let mut sim = SimulatedTransfer::new();
        let mut tx = Transaction::begin(&mut pool, &mut sim);
        let id = exchange.list(&mut tx, &seller(), Amount::new(50)).expect("list");
        let err = exchange
            .purchase(&mut tx, &buyer(), id, Amount::new(sent))
            .unwrap_err();
        assert!(matches!(
            err,
            CustodyError::Validation(ValidationError::WrongAmount { .. })
        ));
        assert!(!exchange.listings()[0].sold);
    }

    #[test]
    fn unknown_id_rejected() {
        let mut exchange = EscrowExchange::new();
        let mut pool = Amount::ZERO;
        let mut sim = SimulatedTransfer::new();
        let mut tx = Transaction::begin(&mut pool, &mut sim);
        let err = exchange
            .purchase(&mut tx, &buyer(), ListingId::new(3), Amount::new(1))
            .unwrap_err();
        assert!(matches!(err, CustodyError::Validation(ValidationError::NotFound(_))));
    }

    #[test]
    fn second_purchase_rejected() {
        let mut exchange = EscrowExchange::new();
        let mut pool = Amount::ZERO;
        let mut sim = SimulatedTransfer::new();
        let mut tx = Transaction::begin(&mut pool, &mut sim);
        let id = exchange.list(&mut tx, &seller(), Amount::new(5)).expect("list");
        exchange
            .purchase(&mut tx, &buyer(), id, Amount::new(5))
            .expect("first purchase");
        let err = exchange
            .purchase(&mut tx, &Principal::new("late"), id, Amount::new(5))
            .unwrap_err();
        assert!(matches!(err, CustodyError::State(StateError::AlreadySold(_))));
        assert_eq!(err.kind(), ErrorKind::State);
    }

    #[test]
    fn undo_helpers_restore_listing() {
        let mut exchange = EscrowExchange::new();
        let mut pool = Amount::ZERO;
        let mut sim = SimulatedTransfer::new();
        let mut tx = Transaction::begin(&mut pool, &mut sim);
        let id = exchange.list(&mut tx, &seller(), Amount::new(5)).expect("list");
        exchange
            .purchase(&mut tx, &buyer(), id, Amount::new(5))
            .expect("purchase");
        exchange.undo_sold(id, false);
        assert!(!exchange.listings()[0].sold);
        exchange.undo_append(id);
        assert!(exchange.listings().is_empty());
    }

    #[test]
    fn from_listings_checks_ids() {
        let listing = Listing {
            id: ListingId::new(1),
            seller: seller(),
            price: Amount::new(1),
            sold: false,
        };
        assert!(EscrowExchange::from_listings(vec![listing]).is_err());
    }
}
