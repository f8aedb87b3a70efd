//! The on-disk state file.
//!
//! One JSON document holds the engine snapshot and the simulated external
//! wallets. It is rewritten only after an operation commits.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use custody_core::{
    Custody, CustodyConfig, CustodySnapshot, EventSink, JsonLinesSink, ManualClock, MemorySink,
    SimulatedTransfer, TracingSink,
};

use crate::error::CliError;

/// Event sinks used by the CLI: `tracing`, plus a buffer that is appended to
/// the events file once the state file has been saved.
pub type CliSink = (TracingSink, MemorySink);

/// Engine type driven by the CLI.
pub type CliCustody = Custody<SimulatedTransfer, ManualClock, CliSink>;

/// Persisted CLI state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateFile {
    /// Engine snapshot.
    pub custody: CustodySnapshot,
    /// Simulated external wallets.
    #[serde(default)]
    pub wallets: SimulatedTransfer,
}

/// Where state lives and how engines are opened from it.
#[derive(Debug, Clone)]
pub struct Session {
    path: PathBuf,
    now: u64,
    events: Option<PathBuf>,
}

impl Session {
    /// Create a session over the state file at `path`.
    #[must_use]
    pub const fn new(path: PathBuf, now: u64, events: Option<PathBuf>) -> Self {
        Self { path, now, events }
    }

    /// Path of the state file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write a fresh state file for `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists and `force` is false, or writing fails.
    pub fn create(&self, config: CustodyConfig, force: bool) -> Result<(), CliError> {
        if self.path.exists() && !force {
            return Err(CliError::State(format!(
                "{} already exists (use --force to overwrite)",
                self.path.display()
            )));
        }
        config.validate()?;
        let state = StateFile {
            custody: CustodySnapshot::empty(config),
            wallets: SimulatedTransfer::new(),
        };
        self.write(&state)
    }

    /// Read the state file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or malformed.
    pub fn read(&self) -> Result<StateFile, CliError> {
        if !self.path.exists() {
            return Err(CliError::State(format!(
                "{} not found (run `custody init` first)",
                self.path.display()
            )));
        }
        let contents = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Write the state file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write(&self, state: &StateFile) -> Result<(), CliError> {
        let json = serde_json::to_string_pretty(state)?;
        std::fs::write(&self.path, json)?;
        debug!(path = %self.path.display(), "state saved");
        Ok(())
    }

    /// Open an engine from the state file.
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be read or fails its checks.
    pub fn open(&self) -> Result<CliCustody, CliError> {
        let state = self.read()?;
        let custody = Custody::restore(
            state.custody,
            state.wallets,
            ManualClock::at(self.now),
            (TracingSink, MemorySink::new()),
        )?;
        Ok(custody)
    }

    /// Persist an engine's committed state, then append its events.
    ///
    /// Events reach the events file only after the state file is written.
    ///
    /// # Errors
    ///
    /// Returns an error if writing the state file or opening the events file fails.
    pub fn save(&self, custody: CliCustody) -> Result<(), CliError> {
        let snapshot = custody.snapshot();
        let (wallets, (_, buffered)) = custody.into_parts();
        self.write(&StateFile {
            custody: snapshot,
            wallets,
        })?;
        if let Some(path) = &self.events {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let mut sink = JsonLinesSink::new(file);
            for event in buffered.events() {
                sink.emit(event);
            }
        }
        Ok(())
    }
}
