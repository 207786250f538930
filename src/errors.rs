use thiserror::Error;

use crate::types::LoanStatus;

#[derive(Error, Debug)]
pub enum DecisionError {
    /// malformed or out-of-range application input; never a business rejection
    #[error("invalid input for {field}: {reason}")]
    InvalidInput {
        field: &'static str,
        reason: String,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },

    #[error("invalid status transition: {from:?} -> {to:?}")]
    InvalidStatusTransition {
        from: LoanStatus,
        to: LoanStatus,
    },

    #[error("calculation error: {message}")]
    Calculation {
        message: String,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DecisionError {
    pub(crate) fn invalid_input(field: &'static str, reason: impl Into<String>) -> Self {
        DecisionError::InvalidInput {
            field,
            reason: reason.into(),
        }
    }

    /// true for errors caused by the caller's input rather than the engine
    pub fn is_validation(&self) -> bool {
        matches!(self, DecisionError::InvalidInput { .. })
    }
}

pub type Result<T> = std::result::Result<T, DecisionError>;
