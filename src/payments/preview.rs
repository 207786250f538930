use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::errors::{DecisionError, Result};
use crate::payments::amortization::calculate_emi;

/// installment estimate shown to an applicant before submission
///
/// The estimate runs on the requested amount, not the sanctioned one, and is
/// rounded to whole currency units the way the application form displays it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmiPreview {
    pub principal: Money,
    pub interest_rate: Rate,
    pub tenure_months: u32,
    pub monthly_emi: Money,
    pub total_payable: Money,
}

impl EmiPreview {
    pub fn estimate(requested_amount: Money, interest_rate: Rate, tenure_months: u32) -> Result<Self> {
        if !requested_amount.is_positive() {
            return Err(DecisionError::invalid_input("requested_amount", "must be positive"));
        }
        if !interest_rate.is_positive() {
            return Err(DecisionError::invalid_input("interest_rate", "must be positive"));
        }

        let monthly_emi = calculate_emi(requested_amount, interest_rate, tenure_months)?.round_dp(0);

        Ok(Self {
            principal: requested_amount,
            interest_rate,
            tenure_months,
            monthly_emi,
            total_payable: monthly_emi.times(tenure_months),
        })
    }
}
