//! Error types for custody operations.
//!
//! Every failure carries one of four kinds (validation, state, authorization,
//! transfer) plus the specific condition that was violated. Any error aborts
//! the enclosing operation and reverts everything it changed.

use thiserror::Error;

use crate::amount::Amount;
use crate::exchange::ListingId;
use crate::principal::Principal;

/// Result type alias for custody operations.
pub type Result<T> = std::result::Result<T, CustodyError>;

/// Malformed input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Amount was zero where a positive value is required.
    #[error("amount must be greater than zero")]
    ZeroAmount,

    /// Deposit below the configured minimum.
    #[error("amount {amount} is below the minimum of {minimum}")]
    BelowMinimum {
        /// Offered amount.
        amount: Amount,
        /// Configured minimum.
        minimum: Amount,
    },

    /// Distribution requested with no recipients.
    #[error("recipient list is empty")]
    EmptyRecipients,

    /// Pool too small to give every recipient at least one unit.
    #[error("pool {pool} split across {recipients} recipients gives a zero share")]
    ZeroShare {
        /// Pool being split.
        pool: Amount,
        /// Number of recipients.
        recipients: usize,
    },

    /// Listing id was never assigned.
    #[error("listing {0} not found")]
    NotFound(ListingId),

    /// Sent value does not exactly match the listing price.
    #[error("sent {sent}, price is {expected}")]
    WrongAmount {
        /// Listing price.
        expected: Amount,
        /// Value sent with the purchase.
        sent: Amount,
    },

    /// Listing price was zero.
    #[error("price must be greater than zero")]
    ZeroPrice,

    /// The null principal was supplied where a real one is required.
    #[error("null principal")]
    NullPrincipal,

    /// Rate outside its permitted range.
    #[error("rate {rate} exceeds maximum {max}")]
    InvalidRate {
        /// Offered rate.
        rate: u64,
        /// Maximum permitted rate.
        max: u64,
    },

    /// Arithmetic would exceed the representable range.
    #[error("arithmetic overflow")]
    Overflow,
}

/// A precondition on stored state was not met.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    /// Balance too small for the withdrawal.
    #[error("insufficient balance: have {have}, need {need}")]
    InsufficientBalance {
        /// Current balance.
        have: Amount,
        /// Requested amount.
        need: Amount,
    },

    /// Principal already holds an unclaimed lock.
    #[error("{0} already has an active lock")]
    AlreadyLocked(Principal),

    /// No lock exists for the principal.
    #[error("{0} has nothing locked")]
    NothingLocked(Principal),

    /// The lock was already paid out.
    #[error("lock for {0} was already claimed")]
    AlreadyClaimed(Principal),

    /// The lock has not reached maturity yet.
    #[error("lock matures at {maturity}, now is {now}")]
    NotMatured {
        /// Maturity timestamp.
        maturity: u64,
        /// Time of the attempt.
        now: u64,
    },

    /// The listing was already purchased.
    #[error("listing {0} is already sold")]
    AlreadySold(ListingId),

    /// The pool does not hold enough value for an outward transfer.
    #[error("custody pool holds {held}, transfer needs {need}")]
    InsufficientPool {
        /// Value held.
        held: Amount,
        /// Value required.
        need: Amount,
    },

    /// The interest reserve cannot cover a lock payout.
    #[error("interest reserve holds {available}, payout needs {need}")]
    InsufficientReserve {
        /// Reserve available.
        available: Amount,
        /// Interest required.
        need: Amount,
    },

    /// A persisted snapshot violates a store invariant.
    #[error("corrupt snapshot: {0}")]
    CorruptSnapshot(String),
}

/// Coarse classification of a [`CustodyError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input.
    Validation,
    /// Precondition on stored state violated.
    State,
    /// Caller lacks the required privilege.
    Authorization,
    /// An outward value movement reported failure.
    Transfer,
    /// Reading or writing persisted state failed.
    Persistence,
}

/// Errors that can occur during custody operations.
#[derive(Debug, Error)]
pub enum CustodyError {
    /// Malformed input.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Precondition on stored state violated.
    #[error("state error: {0}")]
    State(#[from] StateError),

    /// Caller is not the owner.
    #[error("unauthorized: {caller} is not the owner")]
    Unauthorized {
        /// The caller.
        caller: Principal,
        /// The configured owner.
        owner: Principal,
    },

    /// The value-transfer collaborator reported failure.
    #[error("transfer of {amount} to {to} failed")]
    Transfer {
        /// Intended recipient.
        to: Principal,
        /// Amount that could not be sent.
        amount: Amount,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CustodyError {
    /// Create a transfer error.
    #[must_use]
    pub fn transfer(to: &Principal, amount: Amount) -> Self {
        Self::Transfer {
            to: to.clone(),
            amount,
        }
    }

    /// Classify this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::State(_) => ErrorKind::State,
            Self::Unauthorized { .. } => ErrorKind::Authorization,
            Self::Transfer { .. } => ErrorKind::Transfer,
            Self::Io(_) | Self::Json(_) => ErrorKind::Persistence,
        }
    }
}
