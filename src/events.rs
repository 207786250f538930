use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::types::{ApplicationId, ApprovalScore, LoanId, LoanStatus};

/// all events that can be emitted while processing loan applications
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DecisionEvent {
    ApplicationReceived {
        loan_id: LoanId,
        application_id: ApplicationId,
        requested_amount: Money,
        interest_rate: Rate,
        tenure_months: u32,
        timestamp: DateTime<Utc>,
    },
    ApplicationApproved {
        loan_id: LoanId,
        application_id: ApplicationId,
        score: ApprovalScore,
        sanctioned_amount: Money,
        monthly_emi: Money,
        timestamp: DateTime<Utc>,
    },
    ApplicationRejected {
        loan_id: LoanId,
        application_id: ApplicationId,
        score: ApprovalScore,
        timestamp: DateTime<Utc>,
    },
    StatusChanged {
        loan_id: LoanId,
        old_status: LoanStatus,
        new_status: LoanStatus,
        timestamp: DateTime<Utc>,
    },
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<DecisionEvent>,
}

impl EventStore {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, event: DecisionEvent) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<DecisionEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[DecisionEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
