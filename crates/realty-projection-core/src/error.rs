use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Financial impossibility: {0}")]
    FinancialImpossibility(String),

    #[error("Convergence failure: {function} did not converge after {iterations} iterations (delta: {last_delta})")]
    ConvergenceFailure {
        function: String,
        iterations: u32,
        last_delta: Decimal,
    },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl ProjectionError {
    /// Shorthand for the most common rejection raised during validation.
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ProjectionError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// A projected amount left the range `Decimal` can represent.
    pub fn overflow(context: impl std::fmt::Display) -> Self {
        ProjectionError::FinancialImpossibility(format!(
            "{context} exceeds the representable range"
        ))
    }
}

impl From<serde_json::Error> for ProjectionError {
    fn from(e: serde_json::Error) -> Self {
        ProjectionError::SerializationError(e.to_string())
    }
}
