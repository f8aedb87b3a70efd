//! # custody-cli
//!
//! Command-line driver for the custody engine.
//!
//! Every invocation loads the state file, performs exactly one engine
//! operation, and writes the state back only if that operation committed.
//! External wallets are simulated and live in the same state file, so a
//! wallet can be told to refuse transfers to exercise the rollback paths.
//!
//! ```text
//! ┌──────────────┐  load   ┌──────────────┐  one call  ┌──────────────┐
//! │  state file  │────────►│   Session    │───────────►│   Custody    │
//! │    (JSON)    │◄────────│              │◄───────────│   engine     │
//! └──────────────┘  save   └──────────────┘  Result    └──────────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;
pub mod state;

pub use cli::{Cli, Commands, ConfigCommands, Format, InitArgs};
pub use error::CliError;
pub use output::OutputFormat;
pub use state::{Session, StateFile};
