/// loan decision engine: request + risk signal -> approve/reject with derived terms
use chrono::{DateTime, Utc};
use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::application::{LoanApplication, LoanRecord};
use crate::config::DecisionPolicy;
use crate::decimal::{Money, Rate};
use crate::errors::{DecisionError, Result};
use crate::events::{DecisionEvent, EventStore};
use crate::payments::{calculate_emi, AmortizationSchedule};
use crate::scoring::{RandomRiskScorer, RiskScorer, RiskSignal};
use crate::types::{ApplicationId, ApprovalScore, LoanStatus};

/// the numeric part of a loan application
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoanRequest {
    pub requested_amount: Money,
    /// annual rate
    pub interest_rate: Rate,
    pub tenure_months: u32,
}

impl LoanRequest {
    pub fn new(requested_amount: Money, interest_rate: Rate, tenure_months: u32) -> Self {
        Self {
            requested_amount,
            interest_rate,
            tenure_months,
        }
    }
}

/// figures derived for an approved application
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ApprovedTerms {
    pub approval_score: ApprovalScore,
    pub sanctioned_amount: Money,
    pub interest_rate: Rate,
    pub tenure_months: u32,
    pub monthly_emi: Money,
    pub total_interest: Money,
    pub processing_fee: Money,
}

impl ApprovedTerms {
    /// sum of all installments
    pub fn total_payable(&self) -> Money {
        self.monthly_emi.times(self.tenure_months)
    }

    /// repayment schedule with the first installment one month after `start_date`
    pub fn schedule(&self, start_date: DateTime<Utc>) -> Result<AmortizationSchedule> {
        AmortizationSchedule::generate(
            self.sanctioned_amount,
            self.interest_rate,
            self.tenure_months,
            start_date,
        )
    }
}

/// outcome of a loan application
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum LoanDecision {
    Approved(ApprovedTerms),
    Rejected { approval_score: ApprovalScore },
}

impl LoanDecision {
    pub fn status(&self) -> LoanStatus {
        match self {
            LoanDecision::Approved(_) => LoanStatus::Approved,
            LoanDecision::Rejected { .. } => LoanStatus::Rejected,
        }
    }

    pub fn is_approved(&self) -> bool {
        matches!(self, LoanDecision::Approved(_))
    }

    pub fn approval_score(&self) -> ApprovalScore {
        match self {
            LoanDecision::Approved(terms) => terms.approval_score,
            LoanDecision::Rejected { approval_score } => *approval_score,
        }
    }

    pub fn terms(&self) -> Option<&ApprovedTerms> {
        match self {
            LoanDecision::Approved(terms) => Some(terms),
            LoanDecision::Rejected { .. } => None,
        }
    }

    pub fn sanctioned_amount(&self) -> Option<Money> {
        self.terms().map(|t| t.sanctioned_amount)
    }

    pub fn monthly_emi(&self) -> Option<Money> {
        self.terms().map(|t| t.monthly_emi)
    }

    pub fn total_interest(&self) -> Option<Money> {
        self.terms().map(|t| t.total_interest)
    }

    pub fn processing_fee(&self) -> Option<Money> {
        self.terms().map(|t| t.processing_fee)
    }
}

/// loan decision engine
#[derive(Debug, Clone)]
pub struct DecisionEngine<S = RandomRiskScorer> {
    policy: DecisionPolicy,
    scorer: S,
}

impl DecisionEngine<RandomRiskScorer> {
    /// reference policy with random scoring
    pub fn reference() -> Self {
        Self {
            policy: DecisionPolicy::reference(),
            scorer: RandomRiskScorer,
        }
    }
}

impl<S: RiskScorer> DecisionEngine<S> {
    pub fn new(policy: DecisionPolicy, scorer: S) -> Result<Self> {
        policy.validate()?;
        Ok(Self { policy, scorer })
    }

    pub fn policy(&self) -> &DecisionPolicy {
        &self.policy
    }

    pub fn scorer(&self) -> &S {
        &self.scorer
    }

    /// decide using a fresh draw from the engine's scorer
    pub fn decide(&self, request: &LoanRequest) -> Result<LoanDecision> {
        // validate before drawing so invalid input never consumes a draw
        self.validate_request(request)?;
        let signal = self.scorer.draw();
        self.decide_validated(request, signal)
    }

    /// decide with an explicit risk signal; identical inputs give identical output
    pub fn decide_with_signal(&self, request: &LoanRequest, signal: RiskSignal) -> Result<LoanDecision> {
        self.validate_request(request)?;
        self.decide_validated(request, signal)
    }

    fn decide_validated(&self, request: &LoanRequest, signal: RiskSignal) -> Result<LoanDecision> {
        let score = signal.to_score(&self.policy)?;
        if !self.policy.approves(score) {
            debug!(score = score.value(), threshold = self.policy.approval_threshold, "below approval threshold");
            return Ok(LoanDecision::Rejected { approval_score: score });
        }

        let terms = self.derive_terms(request, score)?;
        debug!(
            score = score.value(),
            sanctioned = %terms.sanctioned_amount,
            emi = %terms.monthly_emi,
            total_interest = %terms.total_interest,
            fee = %terms.processing_fee,
            "approved terms derived"
        );
        Ok(LoanDecision::Approved(terms))
    }

    /// decide an application and build the record the caller persists
    pub fn process(
        &self,
        application: LoanApplication,
        time: &SafeTimeProvider,
        events: &mut EventStore,
    ) -> Result<LoanRecord> {
        let now = time.now();
        let decision = self.decide(&application.request)?;

        let loan_id = Uuid::new_v4();
        let application_id = ApplicationId::generate(now);

        events.emit(DecisionEvent::ApplicationReceived {
            loan_id,
            application_id: application_id.clone(),
            requested_amount: application.request.requested_amount,
            interest_rate: application.request.interest_rate,
            tenure_months: application.request.tenure_months,
            timestamp: now,
        });

        match &decision {
            LoanDecision::Approved(terms) => {
                info!(
                    application_id = %application_id,
                    user_id = application.user_id,
                    score = terms.approval_score.value(),
                    sanctioned = %terms.sanctioned_amount,
                    emi = %terms.monthly_emi,
                    "loan application approved"
                );
                events.emit(DecisionEvent::ApplicationApproved {
                    loan_id,
                    application_id: application_id.clone(),
                    score: terms.approval_score,
                    sanctioned_amount: terms.sanctioned_amount,
                    monthly_emi: terms.monthly_emi,
                    timestamp: now,
                });
            }
            LoanDecision::Rejected { approval_score } => {
                info!(
                    application_id = %application_id,
                    user_id = application.user_id,
                    score = approval_score.value(),
                    "loan application rejected"
                );
                events.emit(DecisionEvent::ApplicationRejected {
                    loan_id,
                    application_id: application_id.clone(),
                    score: *approval_score,
                    timestamp: now,
                });
            }
        }

        Ok(LoanRecord::from_decision(loan_id, application_id, &application, decision, now))
    }

    /// input checks; the strict ones apply only under strict bounds
    pub fn validate_request(&self, request: &LoanRequest) -> Result<()> {
        if !request.requested_amount.is_positive() {
            return Err(DecisionError::invalid_input(
                "requested_amount",
                format!("{} must be positive", request.requested_amount),
            ));
        }
        if !request.interest_rate.is_positive() {
            return Err(DecisionError::invalid_input(
                "interest_rate",
                format!("{} must be positive", request.interest_rate),
            ));
        }
        if request.tenure_months == 0 {
            return Err(DecisionError::invalid_input("tenure_months", "must be positive"));
        }
        if self.sanction(request.requested_amount).is_zero() {
            return Err(DecisionError::invalid_input(
                "requested_amount",
                format!("{} is too small to sanction", request.requested_amount),
            ));
        }

        let bounds = &self.policy.bounds;
        if bounds.is_strict() {
            if !bounds.allows_amount(request.requested_amount) {
                warn!(amount = %request.requested_amount, "requested amount outside bounds");
                return Err(DecisionError::invalid_input(
                    "requested_amount",
                    format!(
                        "{} outside {}..={}",
                        request.requested_amount, bounds.min_amount, bounds.max_amount
                    ),
                ));
            }
            if !bounds.allows_tenure(request.tenure_months) {
                warn!(tenure = request.tenure_months, "tenure not offered");
                return Err(DecisionError::invalid_input(
                    "tenure_months",
                    format!("{} months is not an offered tenure", request.tenure_months),
                ));
            }
            if !bounds.allows_rate(request.interest_rate) {
                warn!(rate = %request.interest_rate, "rate not offered");
                return Err(DecisionError::invalid_input(
                    "interest_rate",
                    format!("{} is not an offered rate", request.interest_rate),
                ));
            }
        }

        Ok(())
    }

    fn sanction(&self, requested: Money) -> Money {
        // floor before any cent rounding, 10002.66 * 0.75 = 7501.995 must give 7501
        Money::from_decimal((requested.as_decimal() * self.policy.sanction_ratio).floor())
    }

    fn derive_terms(&self, request: &LoanRequest, score: ApprovalScore) -> Result<ApprovedTerms> {
        let sanctioned_amount = self.sanction(request.requested_amount);
        let monthly_emi = calculate_emi(sanctioned_amount, request.interest_rate, request.tenure_months)?;

        // emi rounding can leave a sub-cent shortfall on zero-rate loans
        let total_interest = (monthly_emi.times(request.tenure_months) - sanctioned_amount).max(Money::ZERO);

        let mut processing_fee = sanctioned_amount.apply(self.policy.processing_fee_rate);
        if let Some(minimum) = self.policy.minimum_processing_fee {
            processing_fee = processing_fee.max(minimum);
        }

        Ok(ApprovedTerms {
            approval_score: score,
            sanctioned_amount,
            interest_rate: request.interest_rate,
            tenure_months: request.tenure_months,
            monthly_emi,
            total_interest,
            processing_fee,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::{FixedRiskScorer, SeededRiskScorer};
    use chrono::TimeZone;
    use hourglass_rs::TimeSource;
    use rust_decimal_macros::dec;

    fn engine_with_score(score: u8) -> DecisionEngine<FixedRiskScorer> {
        DecisionEngine::new(DecisionPolicy::reference(), FixedRiskScorer::for_score(score).unwrap()).unwrap()
    }

    fn reference_request() -> LoanRequest {
        LoanRequest::new(Money::from_major(100_000), Rate::from_percent(dec!(9.5)), 60)
    }

    #[test]
    fn test_reference_approval() {
        let decision = engine_with_score(85).decide(&reference_request()).unwrap();
        let terms = decision.terms().unwrap();

        assert_eq!(decision.status(), LoanStatus::Approved);
        assert_eq!(terms.approval_score.value(), 85);
        assert_eq!(terms.sanctioned_amount, Money::from_major(75_000));
        assert_eq!(terms.monthly_emi, Money::from_str_exact("1575.14").unwrap());
        assert_eq!(terms.total_interest, Money::from_str_exact("19508.40").unwrap());
        assert_eq!(terms.processing_fee, Money::from_str_exact("750.00").unwrap());
        assert_eq!(terms.total_payable(), Money::from_str_exact("94508.40").unwrap());
    }

    #[test]
    fn test_score_65_rejected() {
        let decision = engine_with_score(65).decide(&reference_request()).unwrap();
        assert_eq!(decision.status(), LoanStatus::Rejected);
        assert_eq!(decision.approval_score().value(), 65);
        assert!(decision.sanctioned_amount().is_none());
        assert!(decision.monthly_emi().is_none());
        assert!(decision.total_interest().is_none());
        assert!(decision.processing_fee().is_none());
    }

    #[test]
    fn test_threshold_is_inclusive() {
        assert!(engine_with_score(70).decide(&reference_request()).unwrap().is_approved());
        assert!(!engine_with_score(69).decide(&reference_request()).unwrap().is_approved());
    }

    #[test]
    fn test_sanction_floors_fraction() {
        let request = LoanRequest::new(
            Money::from_str_exact("10001.55").unwrap(),
            Rate::from_percentage(10),
            12,
        );
        let decision = engine_with_score(90).decide(&request).unwrap();
        // 10001.55 * 0.75 = 7501.1625
        assert_eq!(decision.sanctioned_amount(), Some(Money::from_major(7_501)));

        let near_whole = LoanRequest::new(
            Money::from_str_exact("10002.66").unwrap(),
            Rate::from_percentage(10),
            12,
        );
        let decision = engine_with_score(90).decide(&near_whole).unwrap();
        assert_eq!(decision.sanctioned_amount(), Some(Money::from_major(7_501)));
    }

    #[test]
    fn test_invalid_inputs() {
        let engine = engine_with_score(90);
        let rate = Rate::from_percent(dec!(9.5));

        let err = engine.decide(&LoanRequest::new(Money::ZERO, rate, 60)).unwrap_err();
        assert!(matches!(err, DecisionError::InvalidInput { field: "requested_amount", .. }));

        let err = engine
            .decide(&LoanRequest::new(Money::from_major(-5), rate, 60))
            .unwrap_err();
        assert!(err.is_validation());

        let err = engine
            .decide(&LoanRequest::new(Money::from_major(50_000), Rate::ZERO, 60))
            .unwrap_err();
        assert!(matches!(err, DecisionError::InvalidInput { field: "interest_rate", .. }));

        let err = engine
            .decide(&LoanRequest::new(Money::from_major(50_000), rate, 0))
            .unwrap_err();
        assert!(matches!(err, DecisionError::InvalidInput { field: "tenure_months", .. }));

        let err = engine
            .decide(&LoanRequest::new(Money::from_str_exact("1.20").unwrap(), rate, 12))
            .unwrap_err();
        assert!(matches!(err, DecisionError::InvalidInput { field: "requested_amount", .. }));
    }

    #[test]
    fn test_invalid_input_fails_even_when_score_would_reject() {
        let engine = engine_with_score(60);
        let request = LoanRequest::new(Money::from_major(50_000), Rate::ZERO, 60);
        assert!(engine.decide(&request).is_err());
    }

    #[test]
    fn test_zero_rate_substitution() {
        let engine = engine_with_score(90);
        let request = LoanRequest::new(Money::from_major(160_000), Rate::ZERO, 12);
        let terms = engine
            .derive_terms(&request, ApprovalScore::new(90).unwrap())
            .unwrap();
        assert_eq!(terms.sanctioned_amount, Money::from_major(120_000));
        assert_eq!(terms.monthly_emi, Money::from_major(10_000));
        assert_eq!(terms.total_interest, Money::ZERO);
    }

    #[test]
    fn test_rate_below_decimal_precision_approves_without_interest() {
        let request = LoanRequest::new(
            Money::from_major(100_000),
            Rate::from_decimal(dec!(0.0000000000000000000000000001)),
            60,
        );
        let decision = engine_with_score(90).decide(&request).unwrap();
        let terms = decision.terms().unwrap();

        assert_eq!(terms.sanctioned_amount, Money::from_major(75_000));
        assert_eq!(terms.monthly_emi, Money::from_major(1_250));
        assert_eq!(terms.total_interest, Money::ZERO);
    }

    #[test]
    fn test_very_long_tenure_approves() {
        let request = LoanRequest::new(Money::from_major(100_000), Rate::from_percent(dec!(9.5)), 9_000);
        let decision = engine_with_score(90).decide(&request).unwrap();
        let terms = decision.terms().unwrap();

        // the emi converges on the monthly interest of the sanctioned amount
        assert!(terms.monthly_emi >= Money::from_str_exact("593.75").unwrap());
        assert!(terms.monthly_emi < Money::from_str_exact("593.76").unwrap());
        assert!(!terms.total_interest.is_negative());
    }

    #[test]
    fn test_invalid_input_does_not_consume_a_draw() {
        let policy = DecisionPolicy::reference();
        let a = DecisionEngine::new(policy.clone(), SeededRiskScorer::new(99)).unwrap();
        let b = DecisionEngine::new(policy, SeededRiskScorer::new(99)).unwrap();

        let invalid = LoanRequest::new(Money::ZERO, Rate::from_percentage(10), 12);
        assert!(a.decide(&invalid).is_err());
        assert!(a.decide(&invalid).is_err());

        for _ in 0..10 {
            let first = a.decide(&reference_request()).unwrap();
            let second = b.decide(&reference_request()).unwrap();
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_idempotent_for_fixed_signal() {
        let engine = DecisionEngine::reference();
        let signal = RiskSignal::new(0.61).unwrap();
        let a = engine.decide_with_signal(&reference_request(), signal).unwrap();
        let b = engine.decide_with_signal(&reference_request(), signal).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_fee_floor() {
        let policy = DecisionPolicy::reference().with_advertised_fee_floor();
        let engine = DecisionEngine::new(policy, FixedRiskScorer::for_score(80).unwrap()).unwrap();

        let small = LoanRequest::new(Money::from_major(20_000), Rate::from_percentage(10), 12);
        assert_eq!(
            engine.decide(&small).unwrap().processing_fee(),
            Some(Money::from_major(500))
        );

        let large = LoanRequest::new(Money::from_major(200_000), Rate::from_percentage(10), 12);
        assert_eq!(
            engine.decide(&large).unwrap().processing_fee(),
            Some(Money::from_major(1_500))
        );
    }

    #[test]
    fn test_strict_bounds() {
        let engine = DecisionEngine::new(DecisionPolicy::strict(), FixedRiskScorer::for_score(80).unwrap()).unwrap();
        let rate = Rate::from_percent(dec!(9.5));

        assert!(engine.decide(&reference_request()).is_ok());

        let err = engine
            .decide(&LoanRequest::new(Money::from_major(100_000), rate, 18))
            .unwrap_err();
        assert!(matches!(err, DecisionError::InvalidInput { field: "tenure_months", .. }));

        let err = engine
            .decide(&LoanRequest::new(Money::from_major(5_000), rate, 60))
            .unwrap_err();
        assert!(matches!(err, DecisionError::InvalidInput { field: "requested_amount", .. }));

        let err = engine
            .decide(&LoanRequest::new(Money::from_major(100_000), Rate::from_percent(dec!(7.25)), 60))
            .unwrap_err();
        assert!(matches!(err, DecisionError::InvalidInput { field: "interest_rate", .. }));
    }

    #[test]
    fn test_lenient_accepts_off_menu_values() {
        let engine = engine_with_score(80);
        let request = LoanRequest::new(Money::from_major(5_000), Rate::from_percent(dec!(7.25)), 18);
        assert!(engine.decide(&request).unwrap().is_approved());
    }

    #[test]
    fn test_new_rejects_invalid_policy() {
        let mut policy = DecisionPolicy::reference();
        policy.sanction_ratio = dec!(0);
        assert!(DecisionEngine::new(policy, FixedRiskScorer::for_score(80).unwrap()).is_err());
    }

    #[test]
    fn test_decision_json_shape() {
        let approved = engine_with_score(85).decide(&reference_request()).unwrap();
        let json = serde_json::to_value(approved).unwrap();
        assert_eq!(json["status"], "approved");
        assert_eq!(json["approval_score"], 85);
        assert_eq!(json["monthly_emi"], "1575.14");

        let rejected = engine_with_score(65).decide(&reference_request()).unwrap();
        let json = serde_json::to_value(rejected).unwrap();
        assert_eq!(json["status"], "rejected");
        assert!(json.get("sanctioned_amount").is_none());

        let back: LoanDecision = serde_json::from_value(json).unwrap();
        assert_eq!(back, rejected);
    }

    #[test]
    fn test_process_builds_record_and_events() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap();
        let time = SafeTimeProvider::new(TimeSource::Test(now));
        let mut events = EventStore::new();
        let application = LoanApplication::new(7, 2, reference_request());

        let record = engine_with_score(85).process(application, &time, &mut events).unwrap();

        assert_eq!(record.status, LoanStatus::Approved);
        assert_eq!(record.user_id, 7);
        assert_eq!(record.bank_id, 2);
        assert_eq!(record.applied_at, now);
        assert_eq!(record.approved_at, Some(now));
        assert!(record.application_id.as_str().starts_with("LN"));

        let emitted = events.take_events();
        assert_eq!(emitted.len(), 2);
        assert!(matches!(emitted[0], DecisionEvent::ApplicationReceived { .. }));
        assert!(matches!(
            emitted[1],
            DecisionEvent::ApplicationApproved { loan_id, .. } if loan_id == record.id
        ));
    }

    #[test]
    fn test_process_rejection_event() {
        let time = SafeTimeProvider::new(TimeSource::Test(Utc::now()));
        let mut events = EventStore::new();
        let application = LoanApplication::new(7, 2, reference_request());

        let record = engine_with_score(61).process(application, &time, &mut events).unwrap();

        assert_eq!(record.status, LoanStatus::Rejected);
        assert!(record.approved_at.is_none());
        assert!(matches!(events.events()[1], DecisionEvent::ApplicationRejected { .. }));
    }

    #[test]
    fn test_process_invalid_emits_nothing() {
        let time = SafeTimeProvider::new(TimeSource::Test(Utc::now()));
        let mut events = EventStore::new();
        let request = LoanRequest::new(Money::ZERO, Rate::from_percentage(9), 12);

        let result = engine_with_score(90).process(LoanApplication::new(1, 1, request), &time, &mut events);
        assert!(result.is_err());
        assert!(events.is_empty());
    }
}
