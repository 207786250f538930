pub mod application;
pub mod config;
pub mod decimal;
pub mod engine;
pub mod errors;
pub mod events;
pub mod payments;
pub mod portfolio;
pub mod scoring;
pub mod types;

// re-export key types
pub use application::{LoanApplication, LoanRecord};
pub use config::{ApplicationBounds, BoundsEnforcement, DecisionPolicy};
pub use decimal::{Money, Rate};
pub use engine::{ApprovedTerms, DecisionEngine, LoanDecision, LoanRequest};
pub use errors::{DecisionError, Result};
pub use events::{DecisionEvent, EventStore};
pub use payments::{calculate_emi, AmortizationSchedule, EmiPreview, ScheduledPayment};
pub use portfolio::{PortfolioSummary, StatusCounts};
pub use scoring::{FixedRiskScorer, RandomRiskScorer, RiskScorer, RiskSignal, SeededRiskScorer};
pub use types::{ApplicationId, ApprovalScore, BankId, LoanId, LoanStatus, UserId};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
