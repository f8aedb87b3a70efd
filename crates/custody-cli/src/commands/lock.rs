//! Time-lock and interest reserve commands.

use std::io::Write;

use custody_core::{Amount, Principal};

use crate::error::CliError;
use crate::output::{LockView, Message, OutputFormat, PayoutView};
use crate::state::{CliCustody, Session};

/// Time-lock command executor.
pub struct LockCommand<'a> {
    session: &'a Session,
}

impl<'a> LockCommand<'a> {
    /// Create a new lock command.
    #[must_use]
    pub const fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Lock `amount` for `principal` under the configured terms.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine rejects the lock or state cannot be saved.
    pub fn lock<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        principal: &str,
        amount: u64,
    ) -> Result<(), CliError> {
        let principal = Principal::new(principal);
        let mut custody = self.session.open()?;
        custody.lock(&principal, Amount::new(amount))?;
        let view = lock_view(&custody, principal);
        self.session.save(custody)?;
        format.write(writer, &view)
    }

    /// Claim `principal`'s matured lock.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is missing, immature or already claimed,
    /// or if the payout transfer fails.
    pub fn unlock<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        principal: &str,
    ) -> Result<(), CliError> {
        let principal = Principal::new(principal);
        let mut custody = self.session.open()?;
        let payout = custody.unlock(&principal)?;
        self.session.save(custody)?;
        format.write(writer, &PayoutView { principal, payout })
    }

    /// Print `principal`'s lock.
    ///
    /// # Errors
    ///
    /// Returns an error if state cannot be read.
    pub fn status<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        principal: &str,
    ) -> Result<(), CliError> {
        let custody = self.session.open()?;
        let view = lock_view(&custody, Principal::new(principal));
        format.write(writer, &view)
    }

    /// Add `amount` from the owner to the interest reserve.
    ///
    /// # Errors
    ///
    /// Returns an error if `caller` is not the owner or state cannot be saved.
    pub fn fund<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        caller: &str,
        amount: u64,
    ) -> Result<(), CliError> {
        let caller = Principal::new(caller);
        let mut custody = self.session.open()?;
        let reserve = custody.fund_reserve(&caller, Amount::new(amount))?;
        self.session.save(custody)?;
        format.write(writer, &Message::success(format!("reserve is now {reserve}")))
    }
}

fn lock_view(custody: &CliCustody, principal: Principal) -> LockView {
    LockView {
        state: custody.lock_state(&principal),
        lock: custody.lock_of(&principal).copied(),
        principal,
    }
}
