//! Output formatting for CLI commands.
//!
//! Supports table (human-readable) and JSON output formats.

use std::io::Write;

use serde::Serialize;

use custody_core::{
    Amount, DistributionReceipt, Listing, Lock, LockState, LockTerms, Principal, WithdrawReceipt,
};

use crate::cli::Format;
use crate::error::CliError;

/// Output formatter that handles both table and JSON output.
#[derive(Debug, Clone)]
pub struct OutputFormat {
    format: Format,
}

impl OutputFormat {
    /// Create a new output formatter.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self { format }
    }

    /// Check if JSON format is selected.
    #[must_use]
    pub const fn is_json(&self) -> bool {
        matches!(self.format, Format::Json)
    }

    /// Write a serializable value to the output.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write<W, T>(&self, writer: &mut W, value: &T) -> Result<(), CliError>
    where
        W: Write,
        T: Serialize + TableDisplay,
    {
        match self.format {
            Format::Json => {
                serde_json::to_writer_pretty(&mut *writer, value)
                    .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
                writeln!(writer)?;
            }
            Format::Table => {
                value.write_table(writer)?;
            }
        }
        Ok(())
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::new(Format::Table)
    }
}

/// Trait for types that can be displayed as a table.
pub trait TableDisplay {
    /// Write the value as a human-readable table.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError>;
}

/// A one-line result message.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    /// Whether the operation succeeded.
    pub success: bool,
    /// Message text.
    pub message: String,
}

impl Message {
    /// A success message.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

impl TableDisplay for Message {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        let mark = if self.success { "✓" } else { "✗" };
        writeln!(writer, "{mark} {}", self.message)?;
        Ok(())
    }
}

/// A principal's balance.
#[derive(Debug, Clone, Serialize)]
pub struct BalanceView {
    /// Principal.
    pub principal: Principal,
    /// Committed balance.
    pub balance: Amount,
}

impl TableDisplay for BalanceView {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "{}: {}", self.principal, self.balance)?;
        Ok(())
    }
}

impl TableDisplay for WithdrawReceipt {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Withdrawn:  {}", self.amount)?;
        writeln!(writer, "  Paid out: {}", self.net)?;
        writeln!(writer, "  Fee:      {}", self.fee)?;
        Ok(())
    }
}

impl TableDisplay for DistributionReceipt {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Recipients: {}", self.recipients)?;
        writeln!(writer, "Share:      {}", self.share)?;
        writeln!(writer, "Remainder:  {}", self.remainder)?;
        Ok(())
    }
}

/// A principal's lock and its state.
#[derive(Debug, Clone, Serialize)]
pub struct LockView {
    /// Lock holder.
    pub principal: Principal,
    /// Lifecycle state now.
    pub state: LockState,
    /// Stored record, if any.
    pub lock: Option<Lock>,
}

impl TableDisplay for LockView {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "{}: {}", self.principal, self.state)?;
        if let Some(lock) = &self.lock {
            writeln!(writer, "  Amount:   {}", lock.amount)?;
            writeln!(writer, "  Maturity: {}", lock.maturity)?;
            writeln!(writer, "  Rate:     {}%", lock.rate_percent)?;
        }
        Ok(())
    }
}

/// Value paid out by an unlock.
#[derive(Debug, Clone, Serialize)]
pub struct PayoutView {
    /// Lock holder.
    pub principal: Principal,
    /// Principal plus interest.
    pub payout: Amount,
}

impl TableDisplay for PayoutView {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "{} received {}", self.principal, self.payout)?;
        Ok(())
    }
}

impl TableDisplay for Listing {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        let state = if self.sold { "sold" } else { "open" };
        writeln!(
            writer,
            "{:<6} {:<20} {:>12} {state}",
            self.id.to_string(),
            self.seller.to_string(),
            self.price.to_string()
        )?;
        Ok(())
    }
}

impl<T: TableDisplay> TableDisplay for Vec<T> {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.is_empty() {
            writeln!(writer, "(none)")?;
        }
        for item in self {
            item.write_table(writer)?;
        }
        Ok(())
    }
}

/// Engine totals and configuration.
#[derive(Debug, Clone, Serialize)]
pub struct StatusView {
    /// Owner principal.
    pub owner: Principal,
    /// Withdrawal fee in basis points.
    pub fee_rate_bps: u64,
    /// Receiver of withdrawal fees.
    pub fee_recipient: Principal,
    /// Smallest accepted deposit.
    pub min_deposit: Amount,
    /// Terms for new locks.
    pub lock_terms: LockTerms,
    /// Total value held.
    pub pool: Amount,
    /// Sum of ledger balances.
    pub total_balances: Amount,
    /// Sum of unclaimed locks.
    pub total_locked: Amount,
    /// Interest reserve.
    pub reserve: Amount,
    /// Number of listings.
    pub listings: usize,
    /// Number of unsold listings.
    pub open_listings: usize,
}

impl TableDisplay for StatusView {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Custody Status")?;
        writeln!(writer, "══════════════════════════════════")?;
        writeln!(writer, "Owner:            {}", self.owner)?;
        writeln!(writer, "Fee:              {} bps -> {}", self.fee_rate_bps, self.fee_recipient)?;
        writeln!(writer, "Min deposit:      {}", self.min_deposit)?;
        writeln!(
            writer,
            "Lock terms:       {}s at {}%",
            self.lock_terms.duration_secs, self.lock_terms.rate_percent
        )?;
        writeln!(writer)?;
        writeln!(writer, "Pool:             {}", self.pool)?;
        writeln!(writer, "  Balances:       {}", self.total_balances)?;
        writeln!(writer, "  Locked:         {}", self.total_locked)?;
        writeln!(writer, "  Reserve:        {}", self.reserve)?;
        writeln!(writer)?;
        writeln!(writer, "Listings:         {} ({} open)", self.listings, self.open_listings)?;
        Ok(())
    }
}
