use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::errors::{DecisionError, Result};
use crate::types::ApprovalScore;

/// how application inputs are checked against the advertised bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BoundsEnforcement {
    /// only positivity is checked
    #[default]
    Lenient,
    /// amount range, tenure options and rate options are enforced
    Strict,
}

/// bounds offered to applicants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationBounds {
    pub min_amount: Money,
    pub max_amount: Money,
    pub allowed_tenures: Vec<u32>,
    /// annual percentages, e.g. 9.5
    pub allowed_rates: Vec<Decimal>,
    pub enforcement: BoundsEnforcement,
}

impl Default for ApplicationBounds {
    fn default() -> Self {
        Self {
            min_amount: Money::from_major(10_000),
            max_amount: Money::from_major(10_000_000),
            allowed_tenures: vec![12, 24, 36, 48, 60, 84, 120],
            allowed_rates: vec![
                dec!(8.5),
                dec!(9.0),
                dec!(9.5),
                dec!(10.0),
                dec!(10.5),
                dec!(11.0),
            ],
            enforcement: BoundsEnforcement::Lenient,
        }
    }
}

impl ApplicationBounds {
    pub fn is_strict(&self) -> bool {
        self.enforcement == BoundsEnforcement::Strict
    }

    pub fn allows_tenure(&self, months: u32) -> bool {
        self.allowed_tenures.contains(&months)
    }

    pub fn allows_rate(&self, rate: Rate) -> bool {
        let pct = rate.as_percentage();
        self.allowed_rates.iter().any(|r| *r == pct)
    }

    pub fn allows_amount(&self, amount: Money) -> bool {
        amount >= self.min_amount && amount <= self.max_amount
    }
}

/// decision policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionPolicy {
    /// minimum score that approves, inclusive
    pub approval_threshold: u8,
    /// lowest score a risk signal can map to
    pub score_floor: u8,
    /// width of the score band above the floor
    pub score_span: u8,
    /// share of the requested amount that is sanctioned
    pub sanction_ratio: Decimal,
    pub processing_fee_rate: Rate,
    pub minimum_processing_fee: Option<Money>,
    pub bounds: ApplicationBounds,
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        Self::reference()
    }
}

impl DecisionPolicy {
    /// policy matching the behavior the application has always had
    pub fn reference() -> Self {
        Self {
            approval_threshold: 70,
            score_floor: 60,
            score_span: 40,
            sanction_ratio: dec!(0.75),
            processing_fee_rate: Rate::from_percentage(1),
            minimum_processing_fee: None,
            bounds: ApplicationBounds::default(),
        }
    }

    /// reference policy that also enforces the advertised amount, tenure and rate options
    pub fn strict() -> Self {
        let mut policy = Self::reference();
        policy.bounds.enforcement = BoundsEnforcement::Strict;
        policy
    }

    /// apply the ₹500 processing fee floor shown on the application form
    pub fn with_advertised_fee_floor(mut self) -> Self {
        self.minimum_processing_fee = Some(Money::from_major(500));
        self
    }

    pub fn with_bounds(mut self, bounds: ApplicationBounds) -> Self {
        self.bounds = bounds;
        self
    }

    /// true iff the score clears the threshold
    pub fn approves(&self, score: ApprovalScore) -> bool {
        score.value() >= self.approval_threshold
    }

    /// highest score this policy can produce
    pub fn score_ceiling(&self) -> u8 {
        let top = (u16::from(self.score_floor) + u16::from(self.score_span)).saturating_sub(1);
        top.min(u16::from(ApprovalScore::MAX)) as u8
    }

    /// reject policies the engine cannot apply consistently
    pub fn validate(&self) -> Result<()> {
        if self.score_span == 0 {
            return Err(invalid_config("score span must be positive"));
        }
        if u16::from(self.score_floor) + u16::from(self.score_span) > 100 {
            return Err(invalid_config(format!(
                "score band {}..{} exceeds 100",
                self.score_floor,
                u16::from(self.score_floor) + u16::from(self.score_span)
            )));
        }
        if self.approval_threshold > ApprovalScore::MAX {
            return Err(invalid_config(format!(
                "approval threshold {} outside score range",
                self.approval_threshold
            )));
        }
        if self.sanction_ratio <= Decimal::ZERO || self.sanction_ratio > Decimal::ONE {
            return Err(invalid_config(format!(
                "sanction ratio {} must be in (0, 1]",
                self.sanction_ratio
            )));
        }
        if self.processing_fee_rate.as_decimal() < Decimal::ZERO {
            return Err(invalid_config("processing fee rate is negative"));
        }
        if self.minimum_processing_fee.is_some_and(|fee| fee.is_negative()) {
            return Err(invalid_config("minimum processing fee is negative"));
        }
        if self.bounds.min_amount > self.bounds.max_amount {
            return Err(invalid_config(format!(
                "min amount {} above max amount {}",
                self.bounds.min_amount, self.bounds.max_amount
            )));
        }
        if self.bounds.is_strict() {
            if self.bounds.allowed_tenures.is_empty() {
                return Err(invalid_config("strict bounds need at least one tenure"));
            }
            if self.bounds.allowed_rates.is_empty() {
                return Err(invalid_config("strict bounds need at least one rate"));
            }
        }
        Ok(())
    }

    /// load and validate a policy from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let policy: DecisionPolicy = serde_json::from_str(json)?;
        policy.validate()?;
        Ok(policy)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn invalid_config(message: impl Into<String>) -> DecisionError {
    DecisionError::InvalidConfiguration {
        message: message.into(),
    }
}
