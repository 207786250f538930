/// aggregate view over a user's loan records
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::application::LoanRecord;
use crate::decimal::{Money, Rate};
use crate::types::LoanStatus;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StatusCounts {
    pub pending: u32,
    pub approved: u32,
    pub rejected: u32,
    pub disbursed: u32,
}

impl StatusCounts {
    pub fn total(&self) -> u32 {
        self.pending + self.approved + self.rejected + self.disbursed
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub counts: StatusCounts,
    pub total_requested: Money,
    /// approved and disbursed loans
    pub total_sanctioned: Money,
    /// monthly outgo across approved and disbursed loans
    pub total_monthly_emi: Money,
    pub total_processing_fees: Money,
    /// approved ever / decided; zero when nothing has been decided
    pub approval_rate: Rate,
    /// mean approval score over every record; zero for an empty portfolio
    pub average_approval_score: Decimal,
}

impl PortfolioSummary {
    pub fn from_records(records: &[LoanRecord]) -> Self {
        let mut counts = StatusCounts::default();
        let mut total_requested = Money::ZERO;
        let mut total_sanctioned = Money::ZERO;
        let mut total_monthly_emi = Money::ZERO;
        let mut total_processing_fees = Money::ZERO;
        let mut score_sum = 0u64;

        for record in records {
            match record.status {
                LoanStatus::Pending => counts.pending += 1,
                LoanStatus::Approved => counts.approved += 1,
                LoanStatus::Rejected => counts.rejected += 1,
                LoanStatus::Disbursed => counts.disbursed += 1,
            }

            total_requested += record.requested_amount;
            score_sum += u64::from(record.approval_score.value());

            if record.status.is_active() {
                total_sanctioned += record.sanctioned_amount.unwrap_or(Money::ZERO);
                total_monthly_emi += record.monthly_emi.unwrap_or(Money::ZERO);
                total_processing_fees += record.processing_fee.unwrap_or(Money::ZERO);
            }
        }

        let approved_ever = counts.approved + counts.disbursed;
        let decided = approved_ever + counts.rejected;
        let approval_rate = if decided == 0 {
            Rate::ZERO
        } else {
            Rate::from_decimal(Decimal::from(approved_ever) / Decimal::from(decided))
        };

        let average_approval_score = if records.is_empty() {
            Decimal::ZERO
        } else {
            Decimal::from(score_sum) / Decimal::from(records.len() as u64)
        };

        Self {
            counts,
            total_requested,
            total_sanctioned,
            total_monthly_emi,
            total_processing_fees,
            approval_rate,
            average_approval_score,
        }
    }
}
