//! Regular-expression operands.

use crate::expression::eval::evaluate_constant;
use crate::expression::{EvaluationError, EvaluationResult, Expression};
use regex::Regex;

/// A pattern operand.
///
/// When the source expression is constant and does not read the configured
/// date format, the regex is compiled once here and shared by every
/// evaluation. Otherwise it is compiled per evaluation.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: Box<Expression>,
    anchored: bool,
    compiled: Option<Result<Regex, EvaluationError>>,
}

impl Pattern {
    /// `anchored` patterns must match the whole input
    pub fn new(source: Expression, anchored: bool) -> Self {
        let compiled = if source.is_constant() && !source.uses_date_format() {
            match evaluate_constant(&source) {
                Ok(result) => result
                    .as_str()
                    .map(|text| Self::compile(text, anchored)),
                Err(err) => Some(Err(err)),
            }
        } else {
            None
        };

        Self {
            source: Box::new(source),
            anchored,
            compiled,
        }
    }

    pub fn compile(pattern: &str, anchored: bool) -> EvaluationResult<Regex> {
        let effective = if anchored {
            format!("^(?:{})$", pattern)
        } else {
            pattern.to_string()
        };
        Regex::new(&effective).map_err(|e| EvaluationError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })
    }

    pub fn source(&self) -> &Expression {
        &self.source
    }

    pub fn is_anchored(&self) -> bool {
        self.anchored
    }

    /// The regex resolved at construction, if the source was constant
    pub fn compiled(&self) -> Option<&Result<Regex, EvaluationError>> {
        self.compiled.as_ref()
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.anchored == other.anchored && self.source == other.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_pattern_compiles_once() {
        let pattern = Pattern::new(Expression::string("a+b"), true);
        let Some(Ok(re)) = pattern.compiled() else {
            panic!("constant pattern should be compiled");
        };
        assert!(re.is_match("aab"));
        assert!(!re.is_match("aabc"));

        let unanchored = Pattern::new(Expression::string("a+b"), false);
        let Some(Ok(re)) = unanchored.compiled() else {
            panic!("constant pattern should be compiled");
        };
        assert!(re.is_match("xxaabyy"));
    }

    #[test]
    fn test_invalid_constant_pattern() {
        let pattern = Pattern::new(Expression::string("(unclosed"), false);
        assert!(matches!(
            pattern.compiled(),
            Some(Err(EvaluationError::InvalidPattern { .. }))
        ));
    }

    #[test]
    fn test_date_rendering_pattern_is_deferred() {
        let epoch = || Expression::date(chrono::DateTime::<chrono::Utc>::UNIX_EPOCH);

        let pattern = Pattern::new(Expression::stringify(epoch()), true);
        assert!(pattern.compiled().is_none());

        let pattern = Pattern::new(Expression::format_date(epoch(), "%Y"), true);
        let Some(Ok(re)) = pattern.compiled() else {
            panic!("explicitly formatted date should be compiled");
        };
        assert!(re.is_match("1970"));
    }

    #[test]
    fn test_dynamic_pattern_is_deferred() {
        let pattern = Pattern::new(Expression::attribute("regex"), true);
        assert!(pattern.compiled().is_none());
        assert_eq!(pattern.source(), &Expression::attribute("regex"));
    }
}
