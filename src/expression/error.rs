//! Error types for expression evaluation.

use crate::expression::ResultType;
use thiserror::Error;

/// Per-record evaluation failures.
///
/// Absence is never an error; these are the cases where a value was present
/// but could not be used as the tree requires.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaluationError {
    /// A present value could not be converted to the required type
    #[error("Cannot convert '{value}' to {target}")]
    CoercionFailed { value: String, target: ResultType },

    /// Whole-number division or modulo by zero
    #[error("Division by zero")]
    DivisionByZero,

    /// Whole-number arithmetic left the 64-bit range
    #[error("Arithmetic overflow in {operator}")]
    Overflow { operator: String },

    /// A regular expression failed to compile
    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// A date format string was rejected
    #[error("Invalid date format '{format}': {reason}")]
    InvalidDateFormat { format: String, reason: String },

    /// The tree was evaluated without passing validation
    #[error("Invalid operand types for {operator}: expected {expected}, got {actual}")]
    IllTyped {
        operator: String,
        expected: String,
        actual: String,
    },

    /// Input to a pattern operator exceeded the configured limit
    #[error("Input of {length} bytes exceeds the limit of {limit} bytes")]
    InputTooLarge { length: usize, limit: usize },
}

impl EvaluationError {
    pub(crate) fn coercion(value: impl Into<String>, target: ResultType) -> Self {
        EvaluationError::CoercionFailed {
            value: value.into(),
            target,
        }
    }

    pub(crate) fn overflow(operator: &str) -> Self {
        EvaluationError::Overflow {
            operator: operator.to_string(),
        }
    }
}

/// Result type for expression evaluation
pub type EvaluationResult<T> = Result<T, EvaluationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EvaluationError::coercion("abc", ResultType::Decimal);
        assert_eq!(err.to_string(), "Cannot convert 'abc' to Decimal");

        let err = EvaluationError::DivisionByZero;
        assert_eq!(err.to_string(), "Division by zero");

        let err = EvaluationError::overflow("plus");
        assert_eq!(err.to_string(), "Arithmetic overflow in plus");

        let err = EvaluationError::IllTyped {
            operator: "lessThan".to_string(),
            expected: "Decimal".to_string(),
            actual: "String".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid operand types for lessThan: expected Decimal, got String"
        );

        let err = EvaluationError::InputTooLarge {
            length: 10,
            limit: 4,
        };
        assert_eq!(
            err.to_string(),
            "Input of 10 bytes exceeds the limit of 4 bytes"
        );
    }
}
