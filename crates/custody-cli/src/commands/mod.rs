//! CLI command implementations.
//!
//! Each submodule implements one group of commands:
//! - [`init`] - State file creation
//! - [`status`] - Engine totals
//! - [`account`] - Deposits, withdrawals and balances
//! - [`lock`] - Time locks and the interest reserve
//! - [`market`] - Listings and purchases
//! - [`distribute`] - Owner distributions
//! - [`config`] - Owner configuration changes
//! - [`wallet`] - Simulated wallet behaviour

pub mod account;
pub mod config;
pub mod distribute;
pub mod init;
pub mod lock;
pub mod market;
pub mod status;
pub mod wallet;

pub use account::AccountCommand;
pub use config::ConfigCommand;
pub use distribute::DistributeCommand;
pub use init::InitCommand;
pub use lock::LockCommand;
pub use market::MarketCommand;
pub use status::StatusCommand;
pub use wallet::WalletCommand;
