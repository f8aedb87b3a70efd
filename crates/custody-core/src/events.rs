//! Structured records of committed operations.
//!
//! Each successful mutating operation emits exactly one [`CustodyEvent`]
//! after it commits. Emission is best-effort: a sink that fails must not
//! change the outcome of the operation, so [`EventSink::emit`] returns
//! nothing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;
use tracing::{info, warn};
use uuid::Uuid;

use crate::amount::Amount;
use crate::clock::Timestamp;
use crate::exchange::ListingId;
use crate::principal::Principal;

/// Unique event identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(String);

impl EventId {
    /// Create a new random event ID.
    #[must_use]
    pub fn new() -> Self {
        Self(format!("evt-{}", Uuid::new_v4()))
    }

    /// Get the ID as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Operation name and operands of a committed operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "operation")]
pub enum EventKind {
    /// Value credited to a ledger balance.
    #[serde(rename = "deposit")]
    Deposited {
        /// Depositor.
        principal: Principal,
        /// Amount credited.
        amount: Amount,
    },
    /// Value withdrawn from a ledger balance.
    #[serde(rename = "withdraw")]
    Withdrawn {
        /// Withdrawer.
        principal: Principal,
        /// Amount debited.
        amount: Amount,
        /// Fee taken.
        fee: Amount,
    },
    /// Pooled value split across recipients.
    #[serde(rename = "distribute")]
    Distributed {
        /// Caller who supplied the pool.
        initiator: Principal,
        /// Total value split.
        pool: Amount,
        /// Per-recipient share.
        share: Amount,
        /// Value returned to the initiator.
        remainder: Amount,
        /// Recipients in payout order.
        recipients: Vec<Principal>,
    },
    /// A time lock was opened.
    #[serde(rename = "lock")]
    Locked {
        /// Lock holder.
        principal: Principal,
        /// Locked amount.
        amount: Amount,
        /// Maturity timestamp.
        maturity: Timestamp,
    },
    /// A matured lock was paid out.
    #[serde(rename = "unlock")]
    Unlocked {
        /// Lock holder.
        principal: Principal,
        /// Principal plus interest paid.
        payout: Amount,
    },
    /// A listing was created.
    #[serde(rename = "list")]
    Listed {
        /// New listing id.
        listing_id: ListingId,
        /// Seller.
        seller: Principal,
        /// Price.
        price: Amount,
    },
    /// A listing was purchased.
    #[serde(rename = "purchase")]
    Purchased {
        /// Listing id.
        listing_id: ListingId,
        /// Buyer.
        buyer: Principal,
        /// Seller paid.
        seller: Principal,
        /// Price paid.
        price: Amount,
    },
    /// The interest reserve was topped up.
    #[serde(rename = "fund_reserve")]
    ReserveFunded {
        /// Amount added.
        amount: Amount,
    },
    /// The withdrawal fee changed.
    #[serde(rename = "set_fee")]
    FeeChanged {
        /// New rate in basis points.
        rate_bps: u64,
        /// New fee recipient.
        recipient: Principal,
    },
    /// The deposit minimum changed.
    #[serde(rename = "set_min_deposit")]
    MinimumChanged {
        /// New minimum.
        minimum: Amount,
    },
    /// Terms for new locks changed.
    #[serde(rename = "set_lock_terms")]
    LockTermsChanged {
        /// Lock duration in seconds.
        duration_secs: u64,
        /// Interest in percent.
        rate_percent: u64,
    },
}

impl EventKind {
    /// Short operation name.
    #[must_use]
    pub const fn operation(&self) -> &'static str {
        match self {
            Self::Deposited { .. } => "deposit",
            Self::Withdrawn { .. } => "withdraw",
            Self::Distributed { .. } => "distribute",
            Self::Locked { .. } => "lock",
            Self::Unlocked { .. } => "unlock",
            Self::Listed { .. } => "list",
            Self::Purchased { .. } => "purchase",
            Self::ReserveFunded { .. } => "fund_reserve",
            Self::FeeChanged { .. } => "set_fee",
            Self::MinimumChanged { .. } => "set_min_deposit",
            Self::LockTermsChanged { .. } => "set_lock_terms",
        }
    }
}

/// A record of one committed operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustodyEvent {
    /// Unique event ID.
    pub id: EventId,
    /// Wall-clock time the record was created.
    pub recorded_at: DateTime<Utc>,
    /// Caller of the operation.
    pub caller: Principal,
    /// What happened.
    #[serde(flatten)]
    pub kind: EventKind,
}

impl CustodyEvent {
    /// Create a new event.
    #[must_use]
    pub fn new(caller: Principal, kind: EventKind) -> Self {
        Self {
            id: EventId::new(),
            recorded_at: Utc::now(),
            caller,
            kind,
        }
    }
}

/// The observability collaborator.
pub trait EventSink {
    /// Record a committed operation.
    fn emit(&mut self, event: &CustodyEvent);
}

/// Emits each event as a structured `tracing` record.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&mut self, event: &CustodyEvent) {
        match serde_json::to_string(&event.kind) {
            Ok(operands) => info!(
                event_id = %event.id,
                operation = event.kind.operation(),
                caller = %event.caller,
                operands = %operands,
                "custody event"
            ),
            Err(e) => warn!(event_id = %event.id, error = %e, "failed to encode custody event"),
        }
    }
}

/// Keeps events in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    events: Vec<CustodyEvent>,
}

impl MemorySink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Events recorded so far, oldest first.
    #[must_use]
    pub fn events(&self) -> &[CustodyEvent] {
        &self.events
    }

    /// Operation names recorded so far, oldest first.
    #[must_use]
    pub fn operations(&self) -> Vec<&'static str> {
        self.events.iter().map(|e| e.kind.operation()).collect()
    }
}

impl EventSink for MemorySink {
    fn emit(&mut self, event: &CustodyEvent) {
        self.events.push(event.clone());
    }
}

/// Appends events to a writer as JSON lines.
#[derive(Debug)]
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    /// Wrap a writer.
    pub const fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Unwrap the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> EventSink for JsonLinesSink<W> {
    fn emit(&mut self, event: &CustodyEvent) {
        let result = serde_json::to_writer(&mut self.writer, event)
            .map_err(std::io::Error::from)
            .and_then(|()| writeln!(self.writer))
            .and_then(|()| self.writer.flush());
        if let Err(e) = result {
            warn!(event_id = %event.id, error = %e, "failed to write custody event");
        }
    }
}

/// An absent sink drops events.
impl<S: EventSink> EventSink for Option<S> {
    fn emit(&mut self, event: &CustodyEvent) {
        if let Some(sink) = self {
            sink.emit(event);
        }
    }
}

/// Fans an event out to two sinks.
impl<A: EventSink, B: EventSink> EventSink for (A, B) {
    fn emit(&mut self, event: &CustodyEvent) {
        self.0.emit(event);
        self.1.emit(event);
    }
}
