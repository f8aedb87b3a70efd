//! Command-line argument parsing with clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Custody engine CLI - one engine call per invocation.
#[derive(Parser, Debug, Clone)]
#[command(name = "custody")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// State file holding the engine snapshot and simulated wallets.
    #[arg(short, long, env = "CUSTODY_STATE", default_value = "custody-state.json")]
    pub state: PathBuf,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = Format::Table)]
    pub format: Format,

    /// Override the current time (Unix seconds).
    #[arg(long)]
    pub now: Option<u64>,

    /// Append committed-operation events to this file as JSON lines.
    #[arg(long, env = "CUSTODY_EVENTS")]
    pub events: Option<PathBuf>,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Format {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON output for scripting.
    Json,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Create a fresh state file.
    Init(InitArgs),

    /// Show engine totals and configuration.
    Status,

    /// Deposit value into a principal's balance.
    Deposit {
        /// Depositing principal.
        principal: String,
        /// Amount sent with the deposit.
        amount: u64,
    },

    /// Withdraw value from a principal's balance, net of the fee.
    Withdraw {
        /// Withdrawing principal.
        principal: String,
        /// Amount to debit.
        amount: u64,
    },

    /// Show a principal's balance.
    Balance {
        /// Principal to inspect.
        principal: String,
    },

    /// Lock value under the configured terms.
    Lock {
        /// Locking principal.
        principal: String,
        /// Amount to lock.
        amount: u64,
    },

    /// Claim a matured lock with interest.
    Unlock {
        /// Lock holder.
        principal: String,
    },

    /// Show a principal's lock.
    LockStatus {
        /// Lock holder.
        principal: String,
    },

    /// Top up the interest reserve (owner only).
    Fund {
        /// Calling principal.
        #[arg(long)]
        caller: String,
        /// Amount to add.
        amount: u64,
    },

    /// Split a pool evenly across recipients (owner only).
    Distribute {
        /// Calling principal.
        #[arg(long)]
        caller: String,
        /// Amount to split.
        #[arg(long)]
        pool: u64,
        /// Recipients, in payout order.
        #[arg(required = true, value_delimiter = ',')]
        recipients: Vec<String>,
    },

    /// List an item at a fixed price.
    List {
        /// Selling principal.
        seller: String,
        /// Exact price.
        price: u64,
    },

    /// Purchase a listing by sending exactly its price.
    Purchase {
        /// Buying principal.
        buyer: String,
        /// Listing id.
        id: u64,
        /// Value sent with the purchase.
        value: u64,
    },

    /// Show one listing, or all of them.
    Listing {
        /// Listing id; omit to show every listing.
        id: Option<u64>,
    },

    /// Owner-only configuration changes.
    Config {
        /// Configuration subcommand.
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Make the simulated wallet of a principal refuse transfers.
    Reject {
        /// Principal whose wallet refuses transfers.
        principal: String,
        /// Accept transfers again instead.
        #[arg(long)]
        undo: bool,
    },
}

/// Configuration subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommands {
    /// Change the withdrawal fee.
    SetFee {
        /// Calling principal.
        #[arg(long)]
        caller: String,
        /// Fee in basis points.
        rate_bps: u64,
        /// Receiver of withdrawal fees; required for a non-zero rate.
        recipient: Option<String>,
    },

    /// Change the deposit minimum.
    SetMinDeposit {
        /// Calling principal.
        #[arg(long)]
        caller: String,
        /// Smallest accepted deposit.
        minimum: u64,
    },

    /// Change the terms for new locks.
    SetLockTerms {
        /// Calling principal.
        #[arg(long)]
        caller: String,
        /// Lock duration in seconds.
        #[arg(long)]
        secs: u64,
        /// Interest in percent.
        #[arg(long)]
        rate: u64,
    },
}

/// Arguments for the init command.
#[derive(Parser, Debug, Clone)]
pub struct InitArgs {
    /// Load the configuration from a JSON file instead of flags.
    #[arg(long, conflicts_with_all = ["owner", "fee_bps", "fee_recipient", "min_deposit", "lock_secs", "lock_rate"])]
    pub config: Option<PathBuf>,

    /// Owner principal.
    #[arg(long, required_unless_present = "config")]
    pub owner: Option<String>,

    /// Withdrawal fee in basis points.
    #[arg(long, default_value_t = 0)]
    pub fee_bps: u64,

    /// Receiver of withdrawal fees.
    #[arg(long)]
    pub fee_recipient: Option<String>,

    /// Smallest accepted deposit.
    #[arg(long, default_value_t = 0)]
    pub min_deposit: u64,

    /// Lock duration in seconds.
    #[arg(long)]
    pub lock_secs: Option<u64>,

    /// Lock interest in percent.
    #[arg(long)]
    pub lock_rate: Option<u64>,

    /// Overwrite an existing state file.
    #[arg(long)]
    pub force: bool,
}
