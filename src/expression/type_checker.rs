//! Type checking for expressions.
//!
//! Runs once per configuration change, never per record. Every mismatch in
//! the tree is collected; nothing here fails.

use crate::expression::coerce::check_date_format;
use crate::expression::issue::{IssueCode, ValidationIssue};
use crate::expression::{
    ArithmeticDomain, ArithmeticOperator, EvaluationError, Expression, ResultType, Search,
    Signature,
};

/// Type checker for expressions
#[derive(Debug, Default)]
pub struct TypeChecker {
    issues: Vec<ValidationIssue>,
}

impl TypeChecker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Type check a tree, adding any issues found
    pub fn check(&mut self, expr: &Expression) {
        self.visit(expr, "root");
    }

    /// Check that a tree produces the type its consumer requires
    pub fn check_as(&mut self, expr: &Expression, required: ResultType) {
        self.check(expr);

        let actual = expr.result_type();
        if actual != required {
            self.issues.push(
                ValidationIssue::new(
                    IssueCode::UnexpectedResultType,
                    expr.operator_name(),
                    "root",
                    format!("must evaluate to {}, but evaluates to {}", required, actual),
                )
                .with_types(&[required], actual),
            );
        }
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    pub fn into_issues(self) -> Vec<ValidationIssue> {
        self.issues
    }

    fn visit(&mut self, expr: &Expression, path: &str) {
        let signature = expr.signature();
        let operands = expr.operands();
        let paths = operand_paths(path, &signature);

        // Children first, so issues are reported bottom-up
        for (child, child_path) in operands.iter().zip(&paths) {
            self.visit(child, child_path);
        }

        for (index, ((slot, child), child_path)) in signature
            .operands
            .iter()
            .zip(&operands)
            .zip(&paths)
            .enumerate()
        {
            let actual = child.result_type();
            if slot.accepts(actual) {
                continue;
            }
            let code = if is_partner_slot(expr, index) {
                IssueCode::IncompatibleOperands
            } else {
                IssueCode::OperandTypeMismatch
            };
            self.issues.push(
                ValidationIssue::new(
                    code,
                    signature.operator,
                    child_path.as_str(),
                    format!(
                        "{} expects {} for {}, got {}",
                        signature.operator,
                        describe(&slot.accepted),
                        slot.role,
                        actual
                    ),
                )
                .with_types(&slot.accepted, actual),
            );
        }

        self.check_node(expr, path, &signature);
    }

    /// Checks that depend on constant operands rather than types
    fn check_node(&mut self, expr: &Expression, path: &str, signature: &Signature) {
        match expr {
            Expression::Conversion {
                format: Some(format),
                ..
            } => {
                if let Err(err) = check_date_format(format) {
                    self.issues.push(ValidationIssue::new(
                        IssueCode::InvalidDateFormat,
                        signature.operator,
                        path,
                        err.to_string(),
                    ));
                }
            }

            Expression::StringPredicate {
                argument: Search::Pattern(pattern),
                ..
            }
            | Expression::Replace {
                search: Search::Pattern(pattern),
                ..
            } => {
                if let Some(Err(err)) = pattern.compiled() {
                    // Date format errors are reported at the conversion itself
                    if !matches!(err, EvaluationError::InvalidDateFormat { .. }) {
                        self.issues.push(ValidationIssue::new(
                            IssueCode::InvalidPattern,
                            signature.operator,
                            format!("{}.pattern", path),
                            err.to_string(),
                        ));
                    }
                }
            }

            Expression::Arithmetic(arith)
                if arith.domain() == Some(ArithmeticDomain::WholeNumber)
                    && matches!(
                        arith.op(),
                        ArithmeticOperator::Divide | ArithmeticOperator::Modulo
                    ) =>
            {
                if let Expression::Literal(divisor) = arith.operand() {
                    if divisor.as_whole_number() == Some(0) {
                        self.issues.push(ValidationIssue::new(
                            IssueCode::ZeroDivisor,
                            signature.operator,
                            format!("{}.operand", path),
                            "divisor is always zero",
                        ));
                    }
                }
            }

            _ => {}
        }
    }
}

/// Path of each operand slot; repeated roles are indexed
fn operand_paths(path: &str, signature: &Signature) -> Vec<String> {
    let roles: Vec<&str> = signature.operands.iter().map(|slot| slot.role).collect();
    let mut seen = std::collections::HashMap::new();
    roles
        .iter()
        .map(|role| {
            if roles.iter().filter(|r| *r == role).count() > 1 {
                let index = seen.entry(*role).or_insert(0usize);
                let segment = format!("{}.{}[{}]", path, role, index);
                *index += 1;
                segment
            } else {
                format!("{}.{}", path, role)
            }
        })
        .collect()
}

/// Slots whose accepted types are derived from another operand
fn is_partner_slot(expr: &Expression, index: usize) -> bool {
    match expr {
        Expression::Comparison(_) | Expression::Arithmetic(_) | Expression::ReplaceNull { .. } => {
            index == 1
        }
        Expression::IfElse { .. } => index == 2,
        _ => false,
    }
}

fn describe(types: &[ResultType]) -> String {
    types
        .iter()
        .map(|ty| ty.as_str())
        .collect::<Vec<_>>()
        .join(" or ")
}

/// Collect every issue in a tree
pub fn validate(expr: &Expression) -> Vec<ValidationIssue> {
    let mut checker = TypeChecker::new();
    checker.check(expr);
    log::debug!(
        "Validated {} expression: {} issue(s)",
        expr.operator_name(),
        checker.issues().len()
    );
    checker.into_issues()
}

/// Collect every issue in a tree that must evaluate to `required`
pub fn validate_as(expr: &Expression, required: ResultType) -> Vec<ValidationIssue> {
    let mut checker = TypeChecker::new();
    checker.check_as(expr, required);
    log::debug!(
        "Validated {} expression as {}: {} issue(s)",
        expr.operator_name(),
        required,
        checker.issues().len()
    );
    checker.into_issues()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::issue::Severity;

    #[test]
    fn test_well_typed_tree() {
        // toDecimal(count) < 10.0
        let expr = Expression::lt(
            Expression::to_decimal(Expression::attribute("count")),
            Expression::decimal(10.0),
        );
        assert!(validate(&expr).is_empty());
        assert!(validate_as(&expr, ResultType::Boolean).is_empty());
    }

    #[test]
    fn test_string_against_decimal_is_rejected() {
        let expr = Expression::lt(Expression::attribute("count"), Expression::decimal(10.0));
        let issues = validate(&expr);

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, IssueCode::IncompatibleOperands);
        assert_eq!(issues[0].operator, "lessThan");
        assert_eq!(issues[0].path, "root.comparison");
        assert_eq!(issues[0].actual, Some(ResultType::Decimal));
        assert_eq!(
            issues[0].expected,
            vec![ResultType::String]
        );
    }

    #[test]
    fn test_unacceptable_subject() {
        let expr = Expression::gt(Expression::boolean(true), Expression::boolean(false));
        let issues = validate(&expr);

        // Booleans have no ordering; the partner is not judged on its own
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, IssueCode::OperandTypeMismatch);
        assert_eq!(issues[0].path, "root.subject");
    }

    #[test]
    fn test_nested_paths() {
        let expr = Expression::lt(
            Expression::add(Expression::decimal(1.0), Expression::string("x")),
            Expression::decimal(2.0),
        );
        let issues = validate(&expr);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].operator, "plus");
        assert_eq!(issues[0].path, "root.subject.operand");

        let expr = Expression::and(vec![
            Expression::boolean(true),
            Expression::string("yes"),
        ]);
        let issues = validate(&expr);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].path, "root.operand[1]");
    }

    #[test]
    fn test_issues_are_bottom_up() {
        let expr = Expression::not(Expression::lt(
            Expression::attribute("a"),
            Expression::whole_number(1),
        ));
        let issues = validate(&expr);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].path, "root.operand.comparison");

        let expr = Expression::to_upper(Expression::length(Expression::whole_number(1)));
        let issues = validate(&expr);
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].path, "root.operand.operand");
        assert_eq!(issues[1].path, "root.operand");
    }

    #[test]
    fn test_invalid_constant_pattern() {
        let expr = Expression::matches(Expression::attribute("a"), Expression::string("(x"));
        let issues = validate(&expr);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, IssueCode::InvalidPattern);
        assert_eq!(issues[0].path, "root.pattern");

        // Dynamic patterns can only fail at evaluation
        let expr = Expression::matches(Expression::attribute("a"), Expression::attribute("p"));
        assert!(validate(&expr).is_empty());
    }

    #[test]
    fn test_bad_format_in_pattern_reported_once() {
        let pattern = Expression::format_date(
            Expression::date(chrono::DateTime::<chrono::Utc>::UNIX_EPOCH),
            "%Q",
        );
        let expr = Expression::matches(Expression::attribute("a"), pattern);
        let issues = validate(&expr);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, IssueCode::InvalidDateFormat);
        assert_eq!(issues[0].path, "root.pattern");
    }

    #[test]
    fn test_invalid_date_format() {
        let expr = Expression::to_date(Expression::attribute("when"), Some("%Q".to_string()));
        let issues = validate(&expr);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, IssueCode::InvalidDateFormat);
        assert_eq!(issues[0].operator, "toDate");
    }

    #[test]
    fn test_zero_divisor_is_a_warning() {
        let expr = Expression::div(
            Expression::to_number(Expression::attribute("a")),
            Expression::whole_number(0),
        );
        let issues = validate(&expr);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, IssueCode::ZeroDivisor);
        assert_eq!(issues[0].severity, Severity::Warning);
    }

    #[test]
    fn test_validate_as() {
        let expr = Expression::concat(vec![Expression::string("a"), Expression::string("b")]);
        let issues = validate_as(&expr, ResultType::Boolean);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, IssueCode::UnexpectedResultType);
        assert_eq!(issues[0].actual, Some(ResultType::String));
        assert_eq!(issues[0].expected, vec![ResultType::Boolean]);
    }

    #[test]
    fn test_branch_types_must_agree() {
        let expr = Expression::if_else(
            Expression::boolean(true),
            Expression::whole_number(1),
            Expression::string("one"),
        );
        let issues = validate(&expr);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, IssueCode::IncompatibleOperands);
        assert_eq!(issues[0].path, "root.otherwise");
    }
}
