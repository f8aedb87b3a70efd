//! Simulated wallet commands.

use std::io::Write;

use tracing::info;

use custody_core::Principal;

use crate::error::CliError;
use crate::output::{Message, OutputFormat};
use crate::state::Session;

/// Simulated wallet command executor.
pub struct WalletCommand<'a> {
    session: &'a Session,
}

impl<'a> WalletCommand<'a> {
    /// Create a new wallet command.
    #[must_use]
    pub const fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Make `principal`'s wallet refuse transfers, or accept them again when `undo` is set.
    ///
    /// # Errors
    ///
    /// Returns an error if the principal is null or state cannot be saved.
    pub fn reject<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        principal: &str,
        undo: bool,
    ) -> Result<(), CliError> {
        let principal = Principal::new(principal);
        principal.require()?;
        let mut state = self.session.read()?;
        let message = if undo {
            state.wallets.accept(&principal);
            format!("{principal} accepts transfers")
        } else {
            state.wallets.reject(principal.clone());
            format!("{principal} rejects transfers")
        };
        self.session.write(&state)?;
        info!(principal = %principal, rejecting = !undo, "wallet behaviour changed");
        format.write(writer, &Message::success(message))
    }
}
