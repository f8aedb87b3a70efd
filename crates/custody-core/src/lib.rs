//! # custody-core
//!
//! Value custody engine for principals that deposit, lock, split and trade
//! native value under a strictly sequential, all-or-nothing call model.
//!
//! This crate provides:
//! - Per-principal balances with fee-deducted withdrawals
//! - Batch payouts split evenly across recipients, remainder to the initiator
//! - Time-locked deposits that pay interest at maturity
//! - Fixed-price listings settled by exactly one exact-value purchase
//!
//! Every mutating call on [`Custody`] runs inside a [`Transaction`]: stores
//! journal their changes before making them, outward transfers happen last,
//! and any failure replays the journal so the call leaves no trace.
//!
//! ## Example
//!
//! ```rust
//! use custody_core::{Amount, Custody, CustodyConfig, Principal, SimulatedTransfer};
//!
//! # fn example() -> custody_core::Result<()> {
//! let config = CustodyConfig::builder("owner").fee(100, "treasury").build()?;
//! let mut custody = Custody::new(config, SimulatedTransfer::new())?;
//!
//! let alice = Principal::new("alice");
//! custody.deposit(&alice, Amount::new(1_000))?;
//! let receipt = custody.withdraw(&alice, Amount::new(1_000))?;
//! assert_eq!(receipt.fee, Amount::new(10));
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod access;
pub mod amount;
pub mod clock;
pub mod config;
pub mod custody;
pub mod distribution;
pub mod error;
pub mod events;
pub mod exchange;
pub mod fee;
pub mod ledger;
pub mod principal;
pub mod shared;
pub mod snapshot;
pub mod transaction;
pub mod transfer;
pub mod vault;

pub use access::authorize;
pub use amount::Amount;
pub use clock::{Clock, ManualClock, SystemClock, Timestamp};
pub use config::{CustodyConfig, CustodyConfigBuilder};
pub use custody::Custody;
pub use distribution::DistributionReceipt;
pub use error::{CustodyError, ErrorKind, Result, StateError, ValidationError};
pub use events::{CustodyEvent, EventId, EventKind, EventSink, JsonLinesSink, MemorySink, TracingSink};
pub use exchange::{EscrowExchange, Listing, ListingId};
pub use fee::{compute_fee, FeePolicy};
pub use ledger::{AccountLedger, WithdrawReceipt};
pub use principal::Principal;
pub use shared::SharedCustody;
pub use snapshot::CustodySnapshot;
pub use transaction::{Transaction, Undo};
pub use transfer::{SimulatedTransfer, ValueTransfer};
pub use vault::{Lock, LockState, LockTerms, TimeLockVault};
