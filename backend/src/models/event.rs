//! Event logging for ledger auditing and replay.
//!
//! This module defines the Event enum which captures every significant
//! state change of the ledger. Events enable:
//! - Auditing (verify every unit of principal, yield and proceeds)
//! - Debugging (understand what happened and when)
//! - Analysis (settlement cadence, fee income, deferred payouts)
//!
//! # Event Types
//!
//! - **Lifecycle**: open, top-up, withdrawal, yield extraction, close
//! - **Terms**: recipient, payout threshold and interval changes
//! - **Upkeep**: per-deposit credits, payouts, treasury fee, cycle outcome
//! - **Admin**: configuration changes
//!
//! # Example
//!
//! ```rust
//! use yield_splitter_core_rs::models::{Event, EventLog};
//!
//! let mut log = EventLog::new();
//! log.log(Event::DepositOpened {
//!     timestamp: 1_700_000_000,
//!     deposit_id: 1,
//!     depositor: "alice".to_string(),
//!     recipient: "bob".to_string(),
//!     amount: 1_000,
//!     agnostic_amount: 1_000,
//! });
//!
//! assert_eq!(log.events_for_deposit(1).len(), 1);
//! assert_eq!(log.events()[0].event_type(), "DepositOpened");
//! ```

use crate::core::{Amount, Timestamp};
use crate::models::deposit::DepositId;

/// Ledger event capturing a state change.
///
/// All events carry the timestamp supplied to the operation that emitted
/// them. Events are logged in the order they occur.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// New deposit registered
    DepositOpened {
        timestamp: Timestamp,
        deposit_id: DepositId,
        depositor: String,
        recipient: String,
        amount: Amount,
        agnostic_amount: Amount,
    },

    /// Depositor added principal
    DepositToppedUp {
        timestamp: Timestamp,
        deposit_id: DepositId,
        depositor: String,
        amount: Amount,
        new_principal: Amount,
    },

    /// Depositor withdrew part of the principal
    PrincipalWithdrawn {
        timestamp: Timestamp,
        deposit_id: DepositId,
        depositor: String,
        amount: Amount,
        remaining_principal: Amount,
    },

    /// Outstanding yield paid to the recipient and the record re-baselined
    YieldExtracted {
        timestamp: Timestamp,
        deposit_id: DepositId,
        recipient: String,
        amount: Amount,
    },

    /// Deposit closed and removed from every index
    DepositClosed {
        timestamp: Timestamp,
        deposit_id: DepositId,
        depositor: String,
        recipient: String,
        principal: Amount,
        total_value: Amount,
        settlement_paid: Amount,
    },

    /// Yield redirected to a new recipient
    RecipientChanged {
        timestamp: Timestamp,
        deposit_id: DepositId,
        old_recipient: String,
        new_recipient: String,
    },

    /// Auto-payout threshold changed
    PayoutThresholdChanged {
        timestamp: Timestamp,
        deposit_id: DepositId,
        threshold: Amount,
    },

    /// Settlement interval changed
    SettlementIntervalChanged {
        timestamp: Timestamp,
        deposit_id: DepositId,
        interval: u64,
    },

    /// Recipient pulled the claimable settlement asset
    SettlementClaimed {
        timestamp: Timestamp,
        deposit_id: DepositId,
        recipient: String,
        amount: Amount,
    },

    /// Upkeep credited a pro-rated share of the proceeds
    SettlementCredited {
        timestamp: Timestamp,
        deposit_id: DepositId,
        yield_amount: Amount,
        share: Amount,
    },

    /// Claimable crossed the threshold and was pushed to the recipient
    SettlementPaidOut {
        timestamp: Timestamp,
        deposit_id: DepositId,
        recipient: String,
        amount: Amount,
    },

    /// Auto-payout failed; the amount stays claimable
    PayoutDeferred {
        timestamp: Timestamp,
        deposit_id: DepositId,
        recipient: String,
        amount: Amount,
        reason: String,
    },

    /// Protocol fee transferred to the treasury
    TreasuryFeePaid {
        timestamp: Timestamp,
        treasury: String,
        amount: Amount,
    },

    /// Protocol fee transfer failed; retried next cycle
    TreasuryFeeDeferred {
        timestamp: Timestamp,
        treasury: String,
        amount: Amount,
        reason: String,
    },

    /// Upkeep cycle completed
    UpkeepCompleted {
        timestamp: Timestamp,
        settled_count: usize,
        total_yield: Amount,
        fee: Amount,
        amount_in: Amount,
        proceeds: Amount,
        dust_carried: Amount,
    },

    /// Upkeep cycle aborted and rolled back
    UpkeepAborted {
        timestamp: Timestamp,
        eligible_count: usize,
        total_yield: Amount,
        reason: String,
    },

    /// Administrative configuration change
    ConfigUpdated {
        timestamp: Timestamp,
        parameter: String,
        value: String,
    },
}

impl Event {
    /// Get the timestamp of the operation that emitted this event
    pub fn timestamp(&self) -> Timestamp {
        match self {
            Event::DepositOpened { timestamp, .. } => *timestamp,
            Event::DepositToppedUp { timestamp, .. } => *timestamp,
            Event::PrincipalWithdrawn { timestamp, .. } => *timestamp,
            Event::YieldExtracted { timestamp, .. } => *timestamp,
            Event::DepositClosed { timestamp, .. } => *timestamp,
            Event::RecipientChanged { timestamp, .. } => *timestamp,
            Event::PayoutThresholdChanged { timestamp, .. } => *timestamp,
            Event::SettlementIntervalChanged { timestamp, .. } => *timestamp,
            Event::SettlementClaimed { timestamp, .. } => *timestamp,
            Event::SettlementCredited { timestamp, .. } => *timestamp,
            Event::SettlementPaidOut { timestamp, .. } => *timestamp,
            Event::PayoutDeferred { timestamp, .. } => *timestamp,
            Event::TreasuryFeePaid { timestamp, .. } => *timestamp,
            Event::TreasuryFeeDeferred { timestamp, .. } => *timestamp,
            Event::UpkeepCompleted { timestamp, .. } => *timestamp,
            Event::UpkeepAborted { timestamp, .. } => *timestamp,
            Event::ConfigUpdated { timestamp, .. } => *timestamp,
        }
    }

    /// Get a short description of the event type
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::DepositOpened { .. } => "DepositOpened",
            Event::DepositToppedUp { .. } => "DepositToppedUp",
            Event::PrincipalWithdrawn { .. } => "PrincipalWithdrawn",
            Event::YieldExtracted { .. } => "YieldExtracted",
            Event::DepositClosed { .. } => "DepositClosed",
            Event::RecipientChanged { .. } => "RecipientChanged",
            Event::PayoutThresholdChanged { .. } => "PayoutThresholdChanged",
            Event::SettlementIntervalChanged { .. } => "SettlementIntervalChanged",
            Event::SettlementClaimed { .. } => "SettlementClaimed",
            Event::SettlementCredited { .. } => "SettlementCredited",
            Event::SettlementPaidOut { .. } => "SettlementPaidOut",
            Event::PayoutDeferred { .. } => "PayoutDeferred",
            Event::TreasuryFeePaid { .. } => "TreasuryFeePaid",
            Event::TreasuryFeeDeferred { .. } => "TreasuryFeeDeferred",
            Event::UpkeepCompleted { .. } => "UpkeepCompleted",
            Event::UpkeepAborted { .. } => "UpkeepAborted",
            Event::ConfigUpdated { .. } => "ConfigUpdated",
        }
    }

    /// Get deposit ID if event relates to a specific deposit
    pub fn deposit_id(&self) -> Option<DepositId> {
        match self {
            Event::DepositOpened { deposit_id, .. } => Some(*deposit_id),
            Event::DepositToppedUp { deposit_id, .. } => Some(*deposit_id),
            Event::PrincipalWithdrawn { deposit_id, .. } => Some(*deposit_id),
            Event::YieldExtracted { deposit_id, .. } => Some(*deposit_id),
            Event::DepositClosed { deposit_id, .. } => Some(*deposit_id),
            Event::RecipientChanged { deposit_id, .. } => Some(*deposit_id),
            Event::PayoutThresholdChanged { deposit_id, .. } => Some(*deposit_id),
            Event::SettlementIntervalChanged { deposit_id, .. } => Some(*deposit_id),
            Event::SettlementClaimed { deposit_id, .. } => Some(*deposit_id),
            Event::SettlementCredited { deposit_id, .. } => Some(*deposit_id),
            Event::SettlementPaidOut { deposit_id, .. } => Some(*deposit_id),
            Event::PayoutDeferred { deposit_id, .. } => Some(*deposit_id),
            _ => None,
        }
    }

    /// Get the account an event pays or primarily concerns
    pub fn account_id(&self) -> Option<&str> {
        match self {
            Event::DepositOpened { depositor, .. } => Some(depositor),
            Event::DepositToppedUp { depositor, .. } => Some(depositor),
            Event::PrincipalWithdrawn { depositor, .. } => Some(depositor),
            Event::YieldExtracted { recipient, .. } => Some(recipient),
            Event::DepositClosed { depositor, .. } => Some(depositor),
            Event::RecipientChanged { new_recipient, .. } => Some(new_recipient),
            Event::SettlementClaimed { recipient, .. } => Some(recipient),
            Event::SettlementPaidOut { recipient, .. } => Some(recipient),
            Event::PayoutDeferred { recipient, .. } => Some(recipient),
            Event::TreasuryFeePaid { treasury, .. } => Some(treasury),
            Event::TreasuryFeeDeferred { treasury, .. } => Some(treasury),
            _ => None,
        }
    }
}

/// Event log for storing and querying ledger events.
///
/// This is a simple wrapper around Vec<Event> with convenience methods.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    /// Create a new empty event log
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Add an event to the log
    pub fn log(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Get the number of events logged
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Check if the log is empty
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Get all events
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Get events emitted at a specific timestamp
    pub fn events_at(&self, timestamp: Timestamp) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.timestamp() == timestamp)
            .collect()
    }

    /// Get events of a specific type
    pub fn events_of_type(&self, event_type: &str) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    /// Get events for a specific deposit
    pub fn events_for_deposit(&self, deposit_id: DepositId) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.deposit_id() == Some(deposit_id))
            .collect()
    }

    /// Get events for a specific account
    pub fn events_for_account(&self, account_id: &str) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.account_id() == Some(account_id))
            .collect()
    }

    /// Clear all events
    pub fn clear(&mut self) {
        self.events.clear();
    }
}
