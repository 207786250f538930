use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::errors::DecisionError;

/// unique identifier for a persisted loan record
pub type LoanId = Uuid;

/// reference to the applicant; owned by the user store
pub type UserId = i64;

/// reference to the selected bank; has no effect on the decision
pub type BankId = i64;

/// human-facing application reference, `LN{epoch millis}{0..=999}`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationId(String);

impl ApplicationId {
    pub const PREFIX: &'static str = "LN";

    /// generate a reference for an application submitted at `now`
    pub fn generate(now: DateTime<Utc>) -> Self {
        let suffix: u16 = rand::rng().random_range(0..1000);
        ApplicationId(format!("{}{}{}", Self::PREFIX, now.timestamp_millis(), suffix))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// loan record status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    /// default before decisioning; the engine never produces it
    Pending,
    Approved,
    Rejected,
    /// funds released by a downstream system
    Disbursed,
}

impl LoanStatus {
    /// lifecycle: pending -> approved | rejected, approved -> disbursed
    pub fn can_transition_to(self, next: LoanStatus) -> bool {
        matches!(
            (self, next),
            (LoanStatus::Pending, LoanStatus::Approved)
                | (LoanStatus::Pending, LoanStatus::Rejected)
                | (LoanStatus::Approved, LoanStatus::Disbursed)
        )
    }

    /// approved or disbursed, i.e. the applicant owes installments
    pub fn is_active(self) -> bool {
        matches!(self, LoanStatus::Approved | LoanStatus::Disbursed)
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LoanStatus::Pending => "pending",
            LoanStatus::Approved => "approved",
            LoanStatus::Rejected => "rejected",
            LoanStatus::Disbursed => "disbursed",
        };
        f.write_str(s)
    }
}

/// approval score, a proxy for creditworthiness in [0, 100)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct ApprovalScore(u8);

impl ApprovalScore {
    pub const MAX: u8 = 99;

    /// None when the value is outside [0, 100)
    pub fn new(value: u8) -> Option<Self> {
        (value <= Self::MAX).then_some(ApprovalScore(value))
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for ApprovalScore {
    type Error = DecisionError;

    fn try_from(value: u8) -> Result<Self, DecisionError> {
        ApprovalScore::new(value).ok_or_else(|| {
            DecisionError::invalid_input("approval_score", format!("{value} is outside [0, 100)"))
        })
    }
}

impl From<ApprovalScore> for u8 {
    fn from(score: ApprovalScore) -> u8 {
        score.0
    }
}

impl fmt::Display for ApprovalScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_application_id_format() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let id = ApplicationId::generate(now);
        let millis = now.timestamp_millis().to_string();

        assert!(id.as_str().starts_with("LN"));
        let rest = &id.as_str()[2..];
        assert!(rest.starts_with(&millis));

        let suffix: u32 = rest[millis.len()..].parse().unwrap();
        assert!(suffix < 1000);
    }

    #[test]
    fn test_status_lifecycle() {
        assert!(LoanStatus::Pending.can_transition_to(LoanStatus::Approved));
        assert!(LoanStatus::Pending.can_transition_to(LoanStatus::Rejected));
        assert!(LoanStatus::Approved.can_transition_to(LoanStatus::Disbursed));

        assert!(!LoanStatus::Rejected.can_transition_to(LoanStatus::Disbursed));
        assert!(!LoanStatus::Disbursed.can_transition_to(LoanStatus::Approved));
        assert!(!LoanStatus::Approved.can_transition_to(LoanStatus::Pending));
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&LoanStatus::Disbursed).unwrap();
        assert_eq!(json, "\"disbursed\"");
    }

    #[test]
    fn test_score_range() {
        assert!(ApprovalScore::new(99).is_some());
        assert!(ApprovalScore::new(100).is_none());
        assert_eq!(ApprovalScore::new(70).unwrap().value(), 70);
    }

    #[test]
    fn test_score_deserialization_is_checked() {
        let score: ApprovalScore = serde_json::from_str("85").unwrap();
        assert_eq!(score.value(), 85);
        assert_eq!(serde_json::to_string(&score).unwrap(), "85");
        assert!(serde_json::from_str::<ApprovalScore>("150").is_err());
    }
}
