//! Engine status command.

use std::io::Write;

use crate::error::CliError;
use crate::output::{OutputFormat, StatusView};
use crate::state::{CliCustody, Session};

/// Status command executor.
pub struct StatusCommand<'a> {
    session: &'a Session,
}

impl<'a> StatusCommand<'a> {
    /// Create a new status command.
    #[must_use]
    pub const fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Print engine totals and configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if state cannot be read or output fails.
    pub fn execute<W: Write>(&self, writer: &mut W, format: &OutputFormat) -> Result<(), CliError> {
        let custody = self.session.open()?;
        format.write(writer, &status_view(&custody))
    }
}

fn status_view(custody: &CliCustody) -> StatusView {
    let config = custody.config();
    StatusView {
        owner: config.owner.clone(),
        fee_rate_bps: config.fee_rate_bps,
        fee_recipient: config.fee_recipient.clone(),
        min_deposit: config.min_deposit,
        lock_terms: config.lock_terms,
        pool: custody.pool(),
        total_balances: custody.total_balances(),
        total_locked: custody.vault().total_locked(),
        reserve: custody.vault().reserve(),
        listings: custody.listings().len(),
        open_listings: custody.listings().iter().filter(|l| !l.sold).count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Format;
    use crate::commands::testing::session;
    use crate::commands::{AccountCommand, MarketCommand};
    use custody_core::CustodyConfig;

    #[test]
    fn status_reports_totals() {
        let (_dir, session) = session(CustodyConfig::builder("owner").build().expect("config"));
        let format = OutputFormat::default();
        let mut sink = Vec::new();
        AccountCommand::new(&session)
            .deposit(&mut sink, &format, "alice", 40)
            .expect("deposit");
        MarketCommand::new(&session)
            .list(&mut sink, &format, "seller", 9)
            .expect("list");

        let mut out = Vec::new();
        StatusCommand::new(&session)
            .execute(&mut out, &OutputFormat::new(Format::Json))
            .expect("status");
        let value: serde_json::Value = serde_json::from_slice(&out).expect("json");
        assert_eq!(value["pool"], 40);
        assert_eq!(value["total_balances"], 40);
        assert_eq!(value["listings"], 1);
        assert_eq!(value["open_listings"], 1);
        assert_eq!(value["owner"], "owner");
    }
}
