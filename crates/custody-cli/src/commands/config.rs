//! Owner configuration commands.

use std::io::Write;

use custody_core::{Amount, LockTerms, Principal};

use crate::cli::ConfigCommands;
use crate::error::CliError;
use crate::output::{Message, OutputFormat};
use crate::state::Session;

/// Configuration command executor.
pub struct ConfigCommand<'a> {
    session: &'a Session,
}

impl<'a> ConfigCommand<'a> {
    /// Create a new config command.
    #[must_use]
    pub const fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Execute a configuration subcommand.
    ///
    /// # Errors
    ///
    /// Returns an error if the caller is not the owner, the new value is
    /// invalid, or state cannot be saved.
    pub fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        command: &ConfigCommands,
    ) -> Result<(), CliError> {
        let mut custody = self.session.open()?;
        let message = match command {
            ConfigCommands::SetFee {
                caller,
                rate_bps,
                recipient,
            } => {
                let recipient = recipient.as_deref().map_or_else(Principal::null, Principal::new);
                custody.set_fee(&Principal::new(caller.as_str()), *rate_bps, recipient.clone())?;
                format!("fee set to {rate_bps} bps, paid to {recipient}")
            }
            ConfigCommands::SetMinDeposit { caller, minimum } => {
                custody.set_min_deposit(&Principal::new(caller.as_str()), Amount::new(*minimum))?;
                format!("minimum deposit set to {minimum}")
            }
            ConfigCommands::SetLockTerms { caller, secs, rate } => {
                let terms = LockTerms {
                    duration_secs: *secs,
                    rate_percent: *rate,
                };
                custody.set_lock_terms(&Principal::new(caller.as_str()), terms)?;
                format!("new locks mature after {secs}s at {rate}%")
            }
        };
        self.session.save(custody)?;
        format.write(writer, &Message::success(message))
    }
}
