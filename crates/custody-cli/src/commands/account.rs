//! Deposit, withdraw and balance commands.

use std::io::Write;

use custody_core::{Amount, Principal};

use crate::error::CliError;
use crate::output::{BalanceView, OutputFormat};
use crate::state::Session;

/// Ledger command executor.
pub struct AccountCommand<'a> {
    session: &'a Session,
}

impl<'a> AccountCommand<'a> {
    /// Create a new account command.
    #[must_use]
    pub const fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Credit `amount` to `principal` and print the new balance.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine rejects the deposit or state cannot be saved.
    pub fn deposit<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        principal: &str,
        amount: u64,
    ) -> Result<(), CliError> {
        let principal = Principal::new(principal);
        let mut custody = self.session.open()?;
        let balance = custody.deposit(&principal, Amount::new(amount))?;
        self.session.save(custody)?;
        format.write(writer, &BalanceView { principal, balance })
    }

    /// Withdraw `amount` from `principal` and print the receipt.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine rejects the withdrawal or state cannot be saved.
    pub fn withdraw<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        principal: &str,
        amount: u64,
    ) -> Result<(), CliError> {
        let principal = Principal::new(principal);
        let mut custody = self.session.open()?;
        let receipt = custody.withdraw(&principal, Amount::new(amount))?;
        self.session.save(custody)?;
        format.write(writer, &receipt)
    }

    /// Print `principal`'s balance.
    ///
    /// # Errors
    ///
    /// Returns an error if state cannot be read.
    pub fn balance<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        principal: &str,
    ) -> Result<(), CliError> {
        let principal = Principal::new(principal);
        let custody = self.session.open()?;
        let balance = custody.balance_of(&principal);
        format.write(writer, &BalanceView { principal, balance })
    }
}
