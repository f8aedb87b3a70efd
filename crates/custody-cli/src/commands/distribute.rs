//! Owner distribution command.

use std::io::Write;

use custody_core::{Amount, Principal};

use crate::error::CliError;
use crate::output::OutputFormat;
use crate::state::Session;

/// Distribution command executor.
pub struct DistributeCommand<'a> {
    session: &'a Session,
}

impl<'a> DistributeCommand<'a> {
    /// Create a new distribute command.
    #[must_use]
    pub const fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Split `pool` from `caller` evenly across `recipients`.
    ///
    /// # Errors
    ///
    /// Returns an error if `caller` is not the owner, the split is invalid,
    /// or any recipient's wallet refuses its share.
    pub fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        caller: &str,
        pool: u64,
        recipients: &[String],
    ) -> Result<(), CliError> {
        let caller = Principal::new(caller);
        let recipients: Vec<Principal> = recipients.iter().map(Principal::new).collect();
        let mut custody = self.session.open()?;
        let receipt = custody.distribute(&caller, Amount::new(pool), &recipients)?;
        self.session.save(custody)?;
        format.write(writer, &receipt)
    }
}
