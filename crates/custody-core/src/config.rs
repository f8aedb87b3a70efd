//! Engine configuration.
//!
//! A [`CustodyConfig`] names the owner principal (the only caller allowed on
//! privileged entry points), the withdrawal fee, the deposit minimum, and the
//! terms applied to new time locks.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::amount::Amount;
use crate::error::{Result, ValidationError};
use crate::fee::{FeePolicy, BPS_SCALE};
use crate::principal::Principal;
use crate::vault::LockTerms;

/// Configuration for a [`Custody`](crate::Custody) engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustodyConfig {
    /// Owner principal.
    pub owner: Principal,
    /// Withdrawal fee in basis points.
    #[serde(default)]
    pub fee_rate_bps: u64,
    /// Receiver of withdrawal fees.
    #[serde(default)]
    pub fee_recipient: Principal,
    /// Smallest accepted deposit.
    #[serde(default)]
    pub min_deposit: Amount,
    /// Terms applied to new locks.
    #[serde(default)]
    pub lock_terms: LockTerms,
}

impl CustodyConfig {
    /// Creates a new config builder for `owner`.
    #[must_use]
    pub fn builder(owner: impl Into<Principal>) -> CustodyConfigBuilder {
        CustodyConfigBuilder::new(owner.into())
    }

    /// Load a config from a JSON file and validate it.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, parsed, or fails validation.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        debug!(path = %path.display(), owner = %config.owner, "loaded custody config");
        Ok(config)
    }

    /// Check the config for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the owner is null, the fee rate exceeds
    /// 10 000 bps, or a non-zero fee has no recipient.
    pub fn validate(&self) -> Result<()> {
        self.owner.require()?;
        if self.fee_rate_bps > BPS_SCALE {
            return Err(ValidationError::InvalidRate {
                rate: self.fee_rate_bps,
                max: BPS_SCALE,
            }
            .into());
        }
        if self.fee_rate_bps > 0 {
            self.fee_recipient.require()?;
        }
        Ok(())
    }

    /// The fee policy described by this config.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidRate`] if the rate is out of range.
    pub fn fee_policy(&self) -> Result<FeePolicy> {
        FeePolicy::new(self.fee_rate_bps)
    }
}

/// Builder for constructing [`CustodyConfig`] instances.
#[derive(Debug, Clone)]
pub struct CustodyConfigBuilder {
    config: CustodyConfig,
}

impl CustodyConfigBuilder {
    fn new(owner: Principal) -> Self {
        Self {
            config: CustodyConfig {
                owner,
                fee_rate_bps: 0,
                fee_recipient: Principal::null(),
                min_deposit: Amount::ZERO,
                lock_terms: LockTerms::default(),
            },
        }
    }

    /// Sets the withdrawal fee and its recipient.
    #[must_use]
    pub fn fee(mut self, rate_bps: u64, recipient: impl Into<Principal>) -> Self {
        self.config.fee_rate_bps = rate_bps;
        self.config.fee_recipient = recipient.into();
        self
    }

    /// Sets the minimum deposit.
    #[must_use]
    pub const fn min_deposit(mut self, minimum: Amount) -> Self {
        self.config.min_deposit = minimum;
        self
    }

    /// Sets the terms for new locks.
    #[must_use]
    pub const fn lock_terms(mut self, terms: LockTerms) -> Self {
        self.config.lock_terms = terms;
        self
    }

    /// Builds and validates the config.
    ///
    /// # Errors
    ///
    /// Returns a validation error as described on [`CustodyConfig::validate`].
    pub fn build(self) -> Result<CustodyConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
