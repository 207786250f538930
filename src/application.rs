use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::engine::{ApprovedTerms, LoanDecision, LoanRequest};
use crate::errors::{DecisionError, Result};
use crate::events::{DecisionEvent, EventStore};
use crate::payments::AmortizationSchedule;
use crate::types::{ApplicationId, ApprovalScore, BankId, LoanId, LoanStatus, UserId};

/// a submitted loan application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanApplication {
    pub user_id: UserId,
    pub bank_id: BankId,
    pub request: LoanRequest,
}

impl LoanApplication {
    pub fn new(user_id: UserId, bank_id: BankId, request: LoanRequest) -> Self {
        Self {
            user_id,
            bank_id,
            request,
        }
    }
}

/// persisted view of a decided application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanRecord {
    // identification
    pub id: LoanId,
    pub application_id: ApplicationId,
    pub user_id: UserId,
    pub bank_id: BankId,

    // request
    pub requested_amount: Money,
    pub interest_rate: Rate,
    pub tenure_months: u32,

    // decision; the money fields are all set or all unset
    pub status: LoanStatus,
    pub approval_score: ApprovalScore,
    pub sanctioned_amount: Option<Money>,
    pub monthly_emi: Option<Money>,
    pub total_interest: Option<Money>,
    pub processing_fee: Option<Money>,

    // dates
    pub applied_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub last_status_change: DateTime<Utc>,
}

impl LoanRecord {
    pub fn from_decision(
        id: LoanId,
        application_id: ApplicationId,
        application: &LoanApplication,
        decision: LoanDecision,
        now: DateTime<Utc>,
    ) -> Self {
        let terms = decision.terms();
        Self {
            id,
            application_id,
            user_id: application.user_id,
            bank_id: application.bank_id,
            requested_amount: application.request.requested_amount,
            interest_rate: application.request.interest_rate,
            tenure_months: application.request.tenure_months,
            status: decision.status(),
            approval_score: decision.approval_score(),
            sanctioned_amount: terms.map(|t| t.sanctioned_amount),
            monthly_emi: terms.map(|t| t.monthly_emi),
            total_interest: terms.map(|t| t.total_interest),
            processing_fee: terms.map(|t| t.processing_fee),
            applied_at: now,
            approved_at: decision.is_approved().then_some(now),
            last_status_change: now,
        }
    }

    /// the approved terms, if the record carries them
    pub fn terms(&self) -> Option<ApprovedTerms> {
        Some(ApprovedTerms {
            approval_score: self.approval_score,
            sanctioned_amount: self.sanctioned_amount?,
            interest_rate: self.interest_rate,
            tenure_months: self.tenure_months,
            monthly_emi: self.monthly_emi?,
            total_interest: self.total_interest?,
            processing_fee: self.processing_fee?,
        })
    }

    /// repayment schedule starting from the approval date
    pub fn schedule(&self) -> Option<Result<AmortizationSchedule>> {
        let approved_at = self.approved_at?;
        self.terms().map(|terms| terms.schedule(approved_at))
    }

    /// move to `new_status`, e.g. approved -> disbursed by a downstream system
    pub fn transition(
        &mut self,
        new_status: LoanStatus,
        now: DateTime<Utc>,
        events: &mut EventStore,
    ) -> Result<()> {
        if !self.status.can_transition_to(new_status) {
            return Err(DecisionError::InvalidStatusTransition {
                from: self.status,
                to: new_status,
            });
        }

        let old_status = self.status;
        self.status = new_status;
        self.last_status_change = now;

        events.emit(DecisionEvent::StatusChanged {
            loan_id: self.id,
            old_status,
            new_status,
            timestamp: now,
        });
        Ok(())
    }

    pub fn mark_disbursed(&mut self, now: DateTime<Utc>, events: &mut EventStore) -> Result<()> {
        self.transition(LoanStatus::Disbursed, now, events)
    }
}
