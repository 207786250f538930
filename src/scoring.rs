/// risk signals and the scorers that draw them; a real credit model plugs in as a `RiskScorer`
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::debug;

use crate::config::DecisionPolicy;
use crate::errors::{DecisionError, Result};
use crate::types::ApprovalScore;

/// a risk draw in [0, 1)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct RiskSignal(f64);

impl RiskSignal {
    pub fn new(value: f64) -> Result<Self> {
        if !value.is_finite() || !(0.0..1.0).contains(&value) {
            return Err(DecisionError::invalid_input(
                "risk_signal",
                format!("{value} is outside [0, 1)"),
            ));
        }
        Ok(RiskSignal(value))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// map onto the policy's score band: floor(signal * span) + floor
    pub fn to_score(self, policy: &DecisionPolicy) -> Result<ApprovalScore> {
        let span = policy.score_span;
        let offset = ((self.0 * f64::from(span)).floor() as u8).min(span.saturating_sub(1));
        let raw = policy.score_floor.saturating_add(offset);
        let score = ApprovalScore::new(raw).ok_or_else(|| DecisionError::Calculation {
            message: format!("score {raw} outside [0, 100)"),
        })?;
        debug!(signal = self.0, score = raw, "risk signal scored");
        Ok(score)
    }
}

impl TryFrom<f64> for RiskSignal {
    type Error = DecisionError;

    fn try_from(value: f64) -> Result<Self> {
        RiskSignal::new(value)
    }
}

impl From<RiskSignal> for f64 {
    fn from(signal: RiskSignal) -> f64 {
        signal.0
    }
}

/// source of risk signals for the decision engine
pub trait RiskScorer: Send + Sync {
    fn draw(&self) -> RiskSignal;
}

impl<T: RiskScorer + ?Sized> RiskScorer for Arc<T> {
    fn draw(&self) -> RiskSignal {
        (**self).draw()
    }
}

impl<T: RiskScorer + ?Sized> RiskScorer for Box<T> {
    fn draw(&self) -> RiskSignal {
        (**self).draw()
    }
}

/// uniform draw from the thread-local generator
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomRiskScorer;

impl RiskScorer for RandomRiskScorer {
    fn draw(&self) -> RiskSignal {
        // random::<f64>() is uniform on [0, 1)
        RiskSignal(rand::rng().random::<f64>())
    }
}

/// reproducible uniform draws from a seeded generator
#[derive(Debug)]
pub struct SeededRiskScorer {
    rng: Mutex<StdRng>,
}

impl SeededRiskScorer {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RiskScorer for SeededRiskScorer {
    fn draw(&self) -> RiskSignal {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        RiskSignal(rng.random::<f64>())
    }
}

/// always returns the same signal
#[derive(Debug, Clone, Copy)]
pub struct FixedRiskScorer {
    signal: RiskSignal,
}

impl FixedRiskScorer {
    pub fn new(signal: RiskSignal) -> Self {
        Self { signal }
    }

    /// signal that scores exactly `score` under the reference policy
    pub fn for_score(score: u8) -> Result<Self> {
        Self::for_score_in(&DecisionPolicy::reference(), score)
    }

    /// signal that scores exactly `score` under `policy`
    pub fn for_score_in(policy: &DecisionPolicy, score: u8) -> Result<Self> {
        if score < policy.score_floor || score > policy.score_ceiling() {
            return Err(DecisionError::invalid_input(
                "score",
                format!(
                    "{score} outside policy band {}..={}",
                    policy.score_floor,
                    policy.score_ceiling()
                ),
            ));
        }
        // midpoint of the bucket so floor() lands on the intended offset
        let offset = f64::from(score - policy.score_floor) + 0.5;
        let signal = RiskSignal::new(offset / f64::from(policy.score_span))?;
        Ok(Self { signal })
    }

    pub fn signal(&self) -> RiskSignal {
        self.signal
    }
}

impl RiskScorer for FixedRiskScorer {
    fn draw(&self) -> RiskSignal {
        self.signal
    }
}
