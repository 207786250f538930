use chrono::{DateTime, Months, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::errors::{DecisionError, Result};

/// scheduled installment in an amortization schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledPayment {
    pub payment_number: u32,
    pub payment_date: DateTime<Utc>,
    pub beginning_balance: Money,
    pub payment_amount: Money,
    pub principal_portion: Money,
    pub interest_portion: Money,
    pub ending_balance: Money,
    pub cumulative_interest: Money,
    pub cumulative_principal: Money,
}

/// equal-installment repayment schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    pub principal: Money,
    pub interest_rate: Rate,
    pub term_months: u32,
    pub start_date: DateTime<Utc>,
    pub monthly_emi: Money,
    pub payments: Vec<ScheduledPayment>,
    pub total_interest: Money,
    pub total_payment: Money,
}

impl AmortizationSchedule {
    /// generate the month-by-month schedule; installments fall on the same
    /// day of month as `start_date`, starting one month after it
    pub fn generate(
        principal: Money,
        interest_rate: Rate,
        term_months: u32,
        start_date: DateTime<Utc>,
    ) -> Result<Self> {
        let emi = calculate_emi(principal, interest_rate, term_months)?;
        let monthly_rate = interest_rate.monthly_rate().as_decimal();

        let mut payments = Vec::with_capacity(term_months as usize);
        let mut balance = principal;
        let mut cumulative_interest = Money::ZERO;
        let mut cumulative_principal = Money::ZERO;

        for i in 1..=term_months {
            let payment_date = add_months(start_date, i)?;
            let interest_portion = Money::from_decimal(balance.as_decimal() * monthly_rate);

            // last installment absorbs the rounding residue
            let (payment_amount, principal_portion) = if i == term_months {
                (balance + interest_portion, balance)
            } else {
                (emi, (emi - interest_portion).min(balance))
            };

            let ending_balance = balance - principal_portion;
            cumulative_interest += interest_portion;
            cumulative_principal += principal_portion;

            payments.push(ScheduledPayment {
                payment_number: i,
                payment_date,
                beginning_balance: balance,
                payment_amount,
                principal_portion,
                interest_portion,
                ending_balance,
                cumulative_interest,
                cumulative_principal,
            });

            balance = ending_balance;
        }

        let total_payment = payments.iter().map(|p| p.payment_amount).sum();

        Ok(Self {
            principal,
            interest_rate,
            term_months,
            start_date,
            monthly_emi: emi,
            payments,
            total_interest: cumulative_interest,
            total_payment,
        })
    }

    /// get payment for specific period (1-based)
    pub fn get_payment(&self, payment_number: u32) -> Option<&ScheduledPayment> {
        payment_number
            .checked_sub(1)
            .and_then(|idx| self.payments.get(idx as usize))
    }

    /// remaining balance after the given installment
    pub fn balance_after_payment(&self, payment_number: u32) -> Money {
        self.get_payment(payment_number)
            .map(|p| p.ending_balance)
            .unwrap_or(self.principal)
    }
}

/// equated monthly installment, rounded half-up to the cent
///
/// `EMI = P * r * (1 + r)^n / ((1 + r)^n - 1)` with `r` the monthly rate,
/// evaluated as `P * r / (1 - (1 + r)^-n)` so long tenures shrink the power
/// towards zero instead of overflowing it.
/// A zero rate makes the closed form 0/0, so the principal is spread evenly
/// over the tenure instead.
pub fn calculate_emi(principal: Money, annual_rate: Rate, months: u32) -> Result<Money> {
    if months == 0 {
        return Err(DecisionError::invalid_input("tenure_months", "must be positive"));
    }
    if annual_rate.is_zero() {
        return Ok(principal / Decimal::from(months));
    }

    let r = annual_rate.monthly_rate().as_decimal();
    let discount = Decimal::ONE
        .checked_div(Decimal::ONE + r)
        .ok_or_else(|| overflow("discount factor"))?;
    let denominator = Decimal::ONE - checked_pow(discount, months)?;
    if denominator.is_zero() {
        // rate too small to register at decimal precision
        return Ok(principal / Decimal::from(months));
    }

    let emi = principal
        .as_decimal()
        .checked_mul(r)
        .and_then(|v| v.checked_div(denominator))
        .ok_or_else(|| overflow("emi"))?;

    Ok(Money::from_decimal(emi))
}

/// base^exp by square-and-multiply
fn checked_pow(base: Decimal, exp: u32) -> Result<Decimal> {
    let mut result = Decimal::ONE;
    let mut square = base;
    let mut remaining = exp;
    while remaining > 0 {
        if remaining & 1 == 1 {
            result = result
                .checked_mul(square)
                .ok_or_else(|| overflow("compound factor"))?;
        }
        remaining >>= 1;
        if remaining > 0 {
            square = square
                .checked_mul(square)
                .ok_or_else(|| overflow("compound factor"))?;
        }
    }
    Ok(result)
}

fn overflow(stage: &str) -> DecisionError {
    DecisionError::Calculation {
        message: format!("decimal overflow computing {stage}"),
    }
}

fn add_months(date: DateTime<Utc>, months: u32) -> Result<DateTime<Utc>> {
    date.checked_add_months(Months::new(months))
        .ok_or_else(|| DecisionError::Calculation {
            message: format!("payment date out of range: {date} + {months} months"),
        })
}
