//! Validation issues and formatting.

use crate::expression::ResultType;
use serde::Serialize;
use std::fmt;

/// Severity level for validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    /// The tree must not be accepted.
    Error,
    /// Advisory; the tree may still be used.
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// Categorizes validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IssueCode {
    /// An operand's type is not accepted by its operator.
    OperandTypeMismatch,
    /// Two operands are individually fine but cannot be combined.
    IncompatibleOperands,
    /// A constant regular expression does not compile.
    InvalidPattern,
    /// A date format string is not understood.
    InvalidDateFormat,
    /// The root type differs from what the consumer requires.
    UnexpectedResultType,
    /// Whole-number division or modulo by a literal zero.
    ZeroDivisor,
}

impl IssueCode {
    /// Returns a short code string for the issue.
    pub fn code(&self) -> &'static str {
        match self {
            IssueCode::OperandTypeMismatch => "E001",
            IssueCode::IncompatibleOperands => "E002",
            IssueCode::InvalidPattern => "E003",
            IssueCode::InvalidDateFormat => "E004",
            IssueCode::UnexpectedResultType => "E005",
            IssueCode::ZeroDivisor => "W001",
        }
    }

    /// Default severity for this issue code.
    pub fn default_severity(&self) -> Severity {
        match self {
            // An absent dividend still evaluates to absent
            IssueCode::ZeroDivisor => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A problem found in an expression tree before evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub code: IssueCode,
    /// Operator of the offending node
    pub operator: &'static str,
    /// Dotted role path from the root, e.g. `root.subject.operand`
    pub path: String,
    pub expected: Vec<ResultType>,
    pub actual: Option<ResultType>,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(
        code: IssueCode,
        operator: &'static str,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity: code.default_severity(),
            code,
            operator,
            path: path.into(),
            expected: Vec::new(),
            actual: None,
            message: message.into(),
        }
    }

    /// Attach the expected and actual types.
    pub fn with_types(mut self, expected: &[ResultType], actual: ResultType) -> Self {
        self.expected = expected.to_vec();
        self.actual = Some(actual);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: [{}] {} at {}: {}",
            self.severity, self.code, self.operator, self.path, self.message
        )
    }
}

/// Whether any issue in the list blocks the tree
pub fn has_errors(issues: &[ValidationIssue]) -> bool {
    issues.iter().any(ValidationIssue::is_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_display() {
        let issue = ValidationIssue::new(
            IssueCode::OperandTypeMismatch,
            "lessThan",
            "root.subject",
            "expected Decimal, got String",
        )
        .with_types(&[ResultType::Decimal], ResultType::String);

        assert_eq!(
            issue.to_string(),
            "error: [E001] lessThan at root.subject: expected Decimal, got String"
        );
        assert_eq!(issue.actual, Some(ResultType::String));
        assert!(issue.is_error());
    }

    #[test]
    fn test_severity_follows_code() {
        let warning = ValidationIssue::new(IssueCode::ZeroDivisor, "divide", "root", "x");
        assert_eq!(warning.severity, Severity::Warning);
        assert!(!has_errors(&[warning.clone()]));

        let error = ValidationIssue::new(IssueCode::InvalidPattern, "matches", "root", "x");
        assert!(has_errors(&[warning, error]));
    }
}
