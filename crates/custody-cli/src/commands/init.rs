//! State file creation.

use std::io::Write;

use tracing::info;

use custody_core::{Amount, CustodyConfig, LockTerms};

use crate::cli::InitArgs;
use crate::error::CliError;
use crate::output::{Message, OutputFormat};
use crate::state::Session;

/// Init command executor.
pub struct InitCommand<'a> {
    session: &'a Session,
}

impl<'a> InitCommand<'a> {
    /// Create a new init command.
    #[must_use]
    pub const fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Write a fresh state file.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the state file
    /// already exists without `--force`.
    pub fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        args: &InitArgs,
    ) -> Result<(), CliError> {
        let config = build_config(args)?;
        let owner = config.owner.clone();
        self.session.create(config, args.force)?;
        info!(path = %self.session.path().display(), owner = %owner, "state initialized");
        format.write(
            writer,
            &Message::success(format!(
                "initialized {} (owner {owner})",
                self.session.path().display()
            )),
        )
    }
}

/// Assemble the engine configuration from a file or from flags.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the flags are incomplete.
pub fn build_config(args: &InitArgs) -> Result<CustodyConfig, CliError> {
    if let Some(path) = &args.config {
        return Ok(CustodyConfig::from_json_file(path)?);
    }
    let owner = args
        .owner
        .as_deref()
        .ok_or_else(|| CliError::InvalidArgument("--owner is required".into()))?;
    let defaults = LockTerms::default();
    let terms = LockTerms {
        duration_secs: args.lock_secs.unwrap_or(defaults.duration_secs),
        rate_percent: args.lock_rate.unwrap_or(defaults.rate_percent),
    };
    let config = CustodyConfig::builder(owner)
        .fee(args.fee_bps, args.fee_recipient.as_deref().unwrap_or_default())
        .min_deposit(Amount::new(args.min_deposit))
        .lock_terms(terms)
        .build()?;
    Ok(config)
}
