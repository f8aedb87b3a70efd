//! Listing and purchase commands.

use std::io::Write;

use custody_core::{Amount, CustodyError, ListingId, Principal, ValidationError};

use crate::error::CliError;
use crate::output::OutputFormat;
use crate::state::Session;

/// Escrow exchange command executor.
pub struct MarketCommand<'a> {
    session: &'a Session,
}

impl<'a> MarketCommand<'a> {
    /// Create a new market command.
    #[must_use]
    pub const fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// List an item for `price` and print the new listing.
    ///
    /// # Errors
    ///
    /// Returns an error if the price is zero or state cannot be saved.
    pub fn list<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        seller: &str,
        price: u64,
    ) -> Result<(), CliError> {
        let mut custody = self.session.open()?;
        let id = custody.list(&Principal::new(seller), Amount::new(price))?;
        let listing = custody.listing(id).cloned().ok_or_else(|| not_found(id))?;
        self.session.save(custody)?;
        format.write(writer, &listing)
    }

    /// Buy listing `id` sending `value`.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing is missing or sold, the value does not
    /// match the price, or the seller's wallet refuses the payment.
    pub fn purchase<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        buyer: &str,
        id: u64,
        value: u64,
    ) -> Result<(), CliError> {
        let mut custody = self.session.open()?;
        let listing =
            custody.purchase(&Principal::new(buyer), ListingId::new(id), Amount::new(value))?;
        self.session.save(custody)?;
        format.write(writer, &listing)
    }

    /// Print listing `id`, or every listing when `id` is `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing does not exist.
    pub fn show<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        id: Option<u64>,
    ) -> Result<(), CliError> {
        let custody = self.session.open()?;
        match id.map(ListingId::new) {
            Some(id) => {
                let listing = custody.listing(id).ok_or_else(|| not_found(id))?;
                format.write(writer, listing)
            }
            None => format.write(writer, &custody.listings().to_vec()),
        }
    }
}

fn not_found(id: ListingId) -> CliError {
    CliError::Custody(CustodyError::from(ValidationError::NotFound(id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{session, table, text};
    use crate::commands::WalletCommand;
    use custody_core::{CustodyConfig, StateError};

    fn config() -> CustodyConfig {
        CustodyConfig::builder("owner").build().expect("config")
    }

    #[test]
    fn list_then_purchase_pays_seller() {
        let (_dir, session) = session(config());
        let (mut buf, format) = table();
        let cmd = MarketCommand::new(&session);
        cmd.list(&mut buf, &format, "seller", 75).expect("list");
        cmd.purchase(&mut buf, &format, "buyer", 0, 75).expect("purchase");

        let state = session.read().expect("read");
        assert_eq!(state.wallets.received(&Principal::new("seller")), Amount::new(75));
        assert!(state.custody.listings[0].sold);
        assert_eq!(state.custody.pool, Amount::ZERO);
    }

    #[test]
    fn purchase_with_wrong_value_rejected() {
        let (_dir, session) = session(config());
        let (mut buf, format) = table();
        let cmd = MarketCommand::new(&session);
        cmd.list(&mut buf, &format, "seller", 75).expect("list");
        let err = cmd.purchase(&mut buf, &format, "buyer", 0, 74).unwrap_err();
        assert!(matches!(
            err,
            CliError::Custody(CustodyError::Validation(ValidationError::WrongAmount { .. }))
        ));
    }

    #[test]
    fn second_purchase_rejected() {
        let (_dir, session) = session(config());
        let (mut buf, format) = table();
        let cmd = MarketCommand::new(&session);
        cmd.list(&mut buf, &format, "seller", 5).expect("list");
        cmd.purchase(&mut buf, &format, "a", 0, 5).expect("purchase");
        let err = cmd.purchase(&mut buf, &format, "b", 0, 5).unwrap_err();
        assert!(matches!(
            err,
            CliError::Custody(CustodyError::State(StateError::AlreadySold(_)))
        ));
    }

    #[test]
    fn refused_payment_leaves_listing_open() {
        let (_dir, session) = session(config());
        let (mut buf, format) = table();
        let cmd = MarketCommand::new(&session);
        cmd.list(&mut buf, &format, "seller", 5).expect("list");
        WalletCommand::new(&session)
            .reject(&mut buf, &format, "seller", false)
            .expect("reject");

        let err = cmd.purchase(&mut buf, &format, "buyer", 0, 5).unwrap_err();
        assert!(matches!(err, CliError::Custody(CustodyError::Transfer { .. })));
        assert!(!session.read().expect("read").custody.listings[0].sold);
    }

    #[test]
    fn show_missing_listing() {
        let (_dir, session) = session(config());
        let (mut buf, format) = table();
        let err = MarketCommand::new(&session)
            .show(&mut buf, &format, Some(3))
            .unwrap_err();
        assert_eq!(err.to_string(), "validation error: listing #3 not found");
    }

    #[test]
    fn show_all_when_empty() {
        let (_dir, session) = session(config());
        let (mut buf, format) = table();
        MarketCommand::new(&session)
            .show(&mut buf, &format, None)
            .expect("show");
        assert_eq!(text(buf), "(none)\n");
    }
}
