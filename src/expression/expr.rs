//! Expression tree definitions.

use crate::expression::operator::{conversion_name, conversion_sources};
use crate::expression::{
    ArithmeticDomain, ArithmeticOperator, ComparisonDomain, ComparisonOperator, LogicalOperator,
    NullPolicy, OperandSpec, Pattern, ResultType, Signature, StringPredicate, TypedResult,
    UnaryOperator,
};
use chrono::{DateTime, Utc};

/// Comparison node: one operator over a domain resolved from the operand
/// types at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    op: ComparisonOperator,
    domain: Option<ComparisonDomain>,
    subject: Box<Expression>,
    comparison: Box<Expression>,
}

impl Comparison {
    pub fn new(op: ComparisonOperator, subject: Expression, comparison: Expression) -> Self {
        let domain = ComparisonDomain::resolve(op, subject.result_type(), comparison.result_type());
        Self {
            op,
            domain,
            subject: Box::new(subject),
            comparison: Box::new(comparison),
        }
    }

    pub fn op(&self) -> ComparisonOperator {
        self.op
    }

    /// `None` when the operand types cannot be compared
    pub fn domain(&self) -> Option<ComparisonDomain> {
        self.domain
    }

    pub fn subject(&self) -> &Expression {
        &self.subject
    }

    pub fn comparison(&self) -> &Expression {
        &self.comparison
    }
}

/// Arithmetic node, same shape as [`Comparison`]
#[derive(Debug, Clone, PartialEq)]
pub struct Arithmetic {
    op: ArithmeticOperator,
    domain: Option<ArithmeticDomain>,
    subject: Box<Expression>,
    operand: Box<Expression>,
}

impl Arithmetic {
    pub fn new(op: ArithmeticOperator, subject: Expression, operand: Expression) -> Self {
        let domain = ArithmeticDomain::resolve(op, subject.result_type(), operand.result_type());
        Self {
            op,
            domain,
            subject: Box::new(subject),
            operand: Box::new(operand),
        }
    }

    pub fn op(&self) -> ArithmeticOperator {
        self.op
    }

    pub fn domain(&self) -> Option<ArithmeticDomain> {
        self.domain
    }

    pub fn subject(&self) -> &Expression {
        &self.subject
    }

    pub fn operand(&self) -> &Expression {
        &self.operand
    }

    /// Ill-typed nodes still declare a type so the tree shape alone decides it
    pub fn result_type(&self) -> ResultType {
        self.domain
            .map(|d| d.result_type())
            .unwrap_or(ResultType::Decimal)
    }
}

/// Second operand of string predicates and replacement
#[derive(Debug, Clone, PartialEq)]
pub enum Search {
    /// Plain text
    Text(Box<Expression>),
    /// Regular expression
    Pattern(Pattern),
}

impl Search {
    pub fn source(&self) -> &Expression {
        match self {
            Search::Text(expr) => expr.as_ref(),
            Search::Pattern(pattern) => pattern.source(),
        }
    }

    fn role(&self) -> &'static str {
        match self {
            Search::Text(_) => "argument",
            Search::Pattern(_) => "pattern",
        }
    }
}

/// One evaluator node. Trees are immutable once built and may be shared
/// across threads.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Typed constant, possibly absent
    Literal(TypedResult),

    /// Attribute lookup by name
    Attribute(String),

    /// The instant supplied with the evaluation context
    Now,

    /// Explicit type conversion
    Conversion {
        target: ResultType,
        operand: Box<Expression>,
        /// Date format for string/date conversions
        format: Option<String>,
    },

    /// Unary operation
    Unary {
        op: UnaryOperator,
        operand: Box<Expression>,
    },

    Comparison(Comparison),

    Arithmetic(Arithmetic),

    /// N-ary AND / OR
    Logical {
        op: LogicalOperator,
        operands: Vec<Expression>,
    },

    IfElse {
        condition: Box<Expression>,
        then: Box<Expression>,
        otherwise: Box<Expression>,
    },

    /// Subject, or the replacement when the subject is absent
    ReplaceNull {
        subject: Box<Expression>,
        replacement: Box<Expression>,
    },

    /// String concatenation of every operand
    Concat { operands: Vec<Expression> },

    /// Character range of a string
    Substring {
        subject: Box<Expression>,
        start: Box<Expression>,
        end: Option<Box<Expression>>,
    },

    StringPredicate {
        op: StringPredicate,
        subject: Box<Expression>,
        argument: Search,
    },

    /// Replace every occurrence of the search text or pattern
    Replace {
        subject: Box<Expression>,
        search: Search,
        replacement: Box<Expression>,
    },
}

impl Expression {
    /// Create a literal expression
    pub fn literal(value: TypedResult) -> Self {
        Expression::Literal(value)
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::literal(TypedResult::string(value))
    }

    pub fn boolean(value: bool) -> Self {
        Self::literal(TypedResult::boolean(value))
    }

    pub fn whole_number(value: i64) -> Self {
        Self::literal(TypedResult::whole_number(value))
    }

    pub fn decimal(value: f64) -> Self {
        Self::literal(TypedResult::decimal(value))
    }

    pub fn date(value: DateTime<Utc>) -> Self {
        Self::literal(TypedResult::date(value))
    }

    /// An absent literal of the given type
    pub fn absent(result_type: ResultType) -> Self {
        Self::literal(TypedResult::absent(result_type))
    }

    pub fn attribute(name: impl Into<String>) -> Self {
        Expression::Attribute(name.into())
    }

    pub fn now() -> Self {
        Expression::Now
    }

    pub fn convert(target: ResultType, operand: Expression, format: Option<String>) -> Self {
        Expression::Conversion {
            target,
            operand: Box::new(operand),
            format,
        }
    }

    pub fn stringify(operand: Expression) -> Self {
        Self::convert(ResultType::String, operand, None)
    }

    /// Render a date with a chrono format string
    pub fn format_date(operand: Expression, format: impl Into<String>) -> Self {
        Self::convert(ResultType::String, operand, Some(format.into()))
    }

    pub fn to_number(operand: Expression) -> Self {
        Self::convert(ResultType::WholeNumber, operand, None)
    }

    pub fn to_decimal(operand: Expression) -> Self {
        Self::convert(ResultType::Decimal, operand, None)
    }

    pub fn to_date(operand: Expression, format: Option<String>) -> Self {
        Self::convert(ResultType::Date, operand, format)
    }

    pub fn to_boolean(operand: Expression) -> Self {
        Self::convert(ResultType::Boolean, operand, None)
    }

    pub fn unary(op: UnaryOperator, operand: Expression) -> Self {
        Expression::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn not(operand: Expression) -> Self {
        Self::unary(UnaryOperator::Not, operand)
    }

    pub fn is_null(operand: Expression) -> Self {
        Self::unary(UnaryOperator::IsNull, operand)
    }

    pub fn not_null(operand: Expression) -> Self {
        Self::unary(UnaryOperator::NotNull, operand)
    }

    pub fn is_empty(operand: Expression) -> Self {
        Self::unary(UnaryOperator::IsEmpty, operand)
    }

    pub fn negate(operand: Expression) -> Self {
        Self::unary(UnaryOperator::Negate, operand)
    }

    pub fn to_upper(operand: Expression) -> Self {
        Self::unary(UnaryOperator::ToUpper, operand)
    }

    pub fn to_lower(operand: Expression) -> Self {
        Self::unary(UnaryOperator::ToLower, operand)
    }

    pub fn trim(operand: Expression) -> Self {
        Self::unary(UnaryOperator::Trim, operand)
    }

    pub fn length(operand: Expression) -> Self {
        Self::unary(UnaryOperator::Length, operand)
    }

    pub fn compare(op: ComparisonOperator, subject: Expression, comparison: Expression) -> Self {
        Expression::Comparison(Comparison::new(op, subject, comparison))
    }

    pub fn eq(subject: Expression, comparison: Expression) -> Self {
        Self::compare(ComparisonOperator::Eq, subject, comparison)
    }

    pub fn ne(subject: Expression, comparison: Expression) -> Self {
        Self::compare(ComparisonOperator::Ne, subject, comparison)
    }

    pub fn lt(subject: Expression, comparison: Expression) -> Self {
        Self::compare(ComparisonOperator::Lt, subject, comparison)
    }

    pub fn le(subject: Expression, comparison: Expression) -> Self {
        Self::compare(ComparisonOperator::Le, subject, comparison)
    }

    pub fn gt(subject: Expression, comparison: Expression) -> Self {
        Self::compare(ComparisonOperator::Gt, subject, comparison)
    }

    pub fn ge(subject: Expression, comparison: Expression) -> Self {
        Self::compare(ComparisonOperator::Ge, subject, comparison)
    }

    pub fn arithmetic(op: ArithmeticOperator, subject: Expression, operand: Expression) -> Self {
        Expression::Arithmetic(Arithmetic::new(op, subject, operand))
    }

    pub fn add(subject: Expression, operand: Expression) -> Self {
        Self::arithmetic(ArithmeticOperator::Add, subject, operand)
    }

    pub fn sub(subject: Expression, operand: Expression) -> Self {
        Self::arithmetic(ArithmeticOperator::Subtract, subject, operand)
    }

    pub fn mul(subject: Expression, operand: Expression) -> Self {
        Self::arithmetic(ArithmeticOperator::Multiply, subject, operand)
    }

    pub fn div(subject: Expression, operand: Expression) -> Self {
        Self::arithmetic(ArithmeticOperator::Divide, subject, operand)
    }

    pub fn modulo(subject: Expression, operand: Expression) -> Self {
        Self::arithmetic(ArithmeticOperator::Modulo, subject, operand)
    }

    pub fn and(operands: Vec<Expression>) -> Self {
        Expression::Logical {
            op: LogicalOperator::And,
            operands,
        }
    }

    pub fn or(operands: Vec<Expression>) -> Self {
        Expression::Logical {
            op: LogicalOperator::Or,
            operands,
        }
    }

    pub fn if_else(condition: Expression, then: Expression, otherwise: Expression) -> Self {
        Expression::IfElse {
            condition: Box::new(condition),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        }
    }

    pub fn replace_null(subject: Expression, replacement: Expression) -> Self {
        Expression::ReplaceNull {
            subject: Box::new(subject),
            replacement: Box::new(replacement),
        }
    }

    pub fn concat(operands: Vec<Expression>) -> Self {
        Expression::Concat { operands }
    }

    pub fn substring(subject: Expression, start: Expression, end: Option<Expression>) -> Self {
        Expression::Substring {
            subject: Box::new(subject),
            start: Box::new(start),
            end: end.map(Box::new),
        }
    }

    fn string_predicate(op: StringPredicate, subject: Expression, argument: Expression) -> Self {
        let argument = match op {
            StringPredicate::Matches => Search::Pattern(Pattern::new(argument, true)),
            StringPredicate::Find => Search::Pattern(Pattern::new(argument, false)),
            _ => Search::Text(Box::new(argument)),
        };
        Expression::StringPredicate {
            op,
            subject: Box::new(subject),
            argument,
        }
    }

    pub fn starts_with(subject: Expression, prefix: Expression) -> Self {
        Self::string_predicate(StringPredicate::StartsWith, subject, prefix)
    }

    pub fn ends_with(subject: Expression, suffix: Expression) -> Self {
        Self::string_predicate(StringPredicate::EndsWith, subject, suffix)
    }

    pub fn contains(subject: Expression, needle: Expression) -> Self {
        Self::string_predicate(StringPredicate::Contains, subject, needle)
    }

    pub fn equals_ignore_case(subject: Expression, other: Expression) -> Self {
        Self::string_predicate(StringPredicate::EqualsIgnoreCase, subject, other)
    }

    pub fn matches(subject: Expression, pattern: Expression) -> Self {
        Self::string_predicate(StringPredicate::Matches, subject, pattern)
    }

    pub fn find(subject: Expression, pattern: Expression) -> Self {
        Self::string_predicate(StringPredicate::Find, subject, pattern)
    }

    /// Replace every literal occurrence of `search`
    pub fn replace(subject: Expression, search: Expression, replacement: Expression) -> Self {
        Expression::Replace {
            subject: Box::new(subject),
            search: Search::Text(Box::new(search)),
            replacement: Box::new(replacement),
        }
    }

    /// Replace every match of `pattern`; `$1`-style group references expand
    pub fn replace_all(subject: Expression, pattern: Expression, replacement: Expression) -> Self {
        Expression::Replace {
            subject: Box::new(subject),
            search: Search::Pattern(Pattern::new(pattern, false)),
            replacement: Box::new(replacement),
        }
    }

    /// Check if this expression is a constant (no attribute or clock access)
    pub fn is_constant(&self) -> bool {
        match self {
            Expression::Literal(_) => true,
            Expression::Attribute(_) | Expression::Now => false,
            _ => self.operands().iter().all(|e| e.is_constant()),
        }
    }

    /// Whether evaluating this tree reads the configured date format, which
    /// happens when a date is rendered or parsed without an explicit format
    pub fn uses_date_format(&self) -> bool {
        let reads_format = match self {
            Expression::Conversion {
                target,
                operand,
                format: None,
            } => matches!(
                (*target, operand.result_type()),
                (ResultType::String, ResultType::Date) | (ResultType::Date, ResultType::String)
            ),
            Expression::Concat { operands } => operands
                .iter()
                .any(|e| e.result_type() == ResultType::Date),
            _ => false,
        };
        reads_format || self.operands().iter().any(|e| e.uses_date_format())
    }

    /// Statically declared result type, decided by tree shape alone
    pub fn result_type(&self) -> ResultType {
        match self {
            Expression::Literal(lit) => lit.result_type(),
            Expression::Attribute(_) => ResultType::String,
            Expression::Now => ResultType::Date,
            Expression::Conversion { target, .. } => *target,
            Expression::Unary { op, operand } => op.result_type(operand.result_type()),
            Expression::Comparison(_)
            | Expression::Logical { .. }
            | Expression::StringPredicate { .. } => ResultType::Boolean,
            Expression::Arithmetic(arith) => arith.result_type(),
            Expression::IfElse { then, .. } => then.result_type(),
            Expression::ReplaceNull { subject, .. } => subject.result_type(),
            Expression::Concat { .. } | Expression::Substring { .. } | Expression::Replace { .. } => {
                ResultType::String
            }
        }
    }

    /// The operand treated as primary for diagnostics. Has no effect on
    /// evaluation.
    pub fn subject(&self) -> Option<&Expression> {
        match self {
            Expression::Literal(_) | Expression::Attribute(_) | Expression::Now => None,
            Expression::Conversion { operand, .. } | Expression::Unary { operand, .. } => {
                Some(operand.as_ref())
            }
            Expression::Comparison(cmp) => Some(cmp.subject()),
            Expression::Arithmetic(arith) => Some(arith.subject()),
            Expression::Logical { operands, .. } | Expression::Concat { operands } => {
                operands.first()
            }
            Expression::IfElse { condition, .. } => Some(condition.as_ref()),
            Expression::ReplaceNull { subject, .. }
            | Expression::Substring { subject, .. }
            | Expression::StringPredicate { subject, .. }
            | Expression::Replace { subject, .. } => Some(subject.as_ref()),
        }
    }

    /// Direct children, in the order of [`Expression::signature`] operands
    pub fn operands(&self) -> Vec<&Expression> {
        match self {
            Expression::Literal(_) | Expression::Attribute(_) | Expression::Now => vec![],
            Expression::Conversion { operand, .. } | Expression::Unary { operand, .. } => {
                vec![operand.as_ref()]
            }
            Expression::Comparison(cmp) => vec![cmp.subject(), cmp.comparison()],
            Expression::Arithmetic(arith) => vec![arith.subject(), arith.operand()],
            Expression::Logical { operands, .. } | Expression::Concat { operands } => {
                operands.iter().collect()
            }
            Expression::IfElse {
                condition,
                then,
                otherwise,
            } => vec![condition.as_ref(), then.as_ref(), otherwise.as_ref()],
            Expression::ReplaceNull {
                subject,
                replacement,
            } => vec![subject.as_ref(), replacement.as_ref()],
            Expression::Substring {
                subject,
                start,
                end,
            } => {
                let mut children = vec![subject.as_ref(), start.as_ref()];
                if let Some(end) = end {
                    children.push(end.as_ref());
                }
                children
            }
            Expression::StringPredicate {
                subject, argument, ..
            } => vec![subject.as_ref(), argument.source()],
            Expression::Replace {
                subject,
                search,
                replacement,
            } => vec![subject.as_ref(), search.source(), replacement.as_ref()],
        }
    }

    /// Operator name as used in diagnostics
    pub fn operator_name(&self) -> &'static str {
        self.signature().operator
    }

    /// Declared contract of this node
    pub fn signature(&self) -> Signature {
        use crate::expression::ResultType as T;

        let (operator, operands, null_policy) = match self {
            Expression::Literal(_) => ("literal", vec![], NullPolicy::Propagate),
            Expression::Attribute(_) => ("attribute", vec![], NullPolicy::Propagate),
            Expression::Now => ("now", vec![], NullPolicy::Propagate),
            Expression::Conversion { target, .. } => (
                conversion_name(*target),
                vec![OperandSpec::new("operand", &conversion_sources(*target))],
                NullPolicy::Propagate,
            ),
            Expression::Unary { op, .. } => (
                op.as_str(),
                vec![OperandSpec::new("operand", &op.operand_types())],
                op.null_policy(),
            ),
            Expression::Comparison(cmp) => {
                let subject_types = ComparisonDomain::subject_types(cmp.op());
                let subject_type = cmp.subject().result_type();
                // Only judge the partner once the subject itself is usable
                let partner_types = if subject_types.contains(&subject_type) {
                    ComparisonDomain::partner_types(cmp.op(), subject_type)
                } else {
                    T::ALL.to_vec()
                };
                (
                    cmp.op().as_str(),
                    vec![
                        OperandSpec::new("subject", &subject_types),
                        OperandSpec::new("comparison", &partner_types),
                    ],
                    NullPolicy::AbsentIsFalse,
                )
            }
            Expression::Arithmetic(arith) => {
                let subject_types = ArithmeticDomain::subject_types(arith.op());
                let subject_type = arith.subject().result_type();
                let partner_types = if subject_types.contains(&subject_type) {
                    ArithmeticDomain::partner_types(arith.op(), subject_type)
                } else {
                    T::ALL.to_vec()
                };
                (
                    arith.op().as_str(),
                    vec![
                        OperandSpec::new("subject", &subject_types),
                        OperandSpec::new("operand", &partner_types),
                    ],
                    NullPolicy::Propagate,
                )
            }
            Expression::Logical { op, operands } => (
                op.as_str(),
                operands
                    .iter()
                    .map(|_| OperandSpec::new("operand", &[T::Boolean]))
                    .collect(),
                NullPolicy::AbsentIsFalse,
            ),
            Expression::IfElse { then, .. } => (
                "ifElse",
                vec![
                    OperandSpec::new("condition", &[T::Boolean]),
                    OperandSpec::any("then"),
                    OperandSpec::new("otherwise", &[then.result_type()]),
                ],
                NullPolicy::AbsentIsFalse,
            ),
            Expression::ReplaceNull { subject, .. } => (
                "replaceNull",
                vec![
                    OperandSpec::any("subject"),
                    OperandSpec::new("replacement", &[subject.result_type()]),
                ],
                NullPolicy::Replace,
            ),
            Expression::Concat { operands } => (
                "concat",
                operands.iter().map(|_| OperandSpec::any("operand")).collect(),
                NullPolicy::Propagate,
            ),
            Expression::Substring { end, .. } => {
                let mut specs = vec![
                    OperandSpec::new("subject", &[T::String]),
                    OperandSpec::new("start", &[T::WholeNumber]),
                ];
                if end.is_some() {
                    specs.push(OperandSpec::new("end", &[T::WholeNumber]));
                }
                ("substring", specs, NullPolicy::Propagate)
            }
            Expression::StringPredicate { op, argument, .. } => (
                op.as_str(),
                vec![
                    OperandSpec::new("subject", &[T::String]),
                    OperandSpec::new(argument.role(), &[T::String]),
                ],
                NullPolicy::AbsentIsFalse,
            ),
            Expression::Replace { search, .. } => (
                match search {
                    Search::Text(_) => "replace",
                    Search::Pattern(_) => "replaceAll",
                },
                vec![
                    OperandSpec::new("subject", &[T::String]),
                    OperandSpec::new(search.role(), &[T::String]),
                    OperandSpec::new("replacement", &[T::String]),
                ],
                NullPolicy::Propagate,
            ),
        };

        Signature {
            operator,
            operands,
            result_type: self.result_type(),
            null_policy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_result_types() {
        assert_eq!(Expression::attribute("a").result_type(), ResultType::String);
        assert_eq!(Expression::now().result_type(), ResultType::Date);
        assert_eq!(
            Expression::to_decimal(Expression::attribute("a")).result_type(),
            ResultType::Decimal
        );
        assert_eq!(
            Expression::lt(Expression::decimal(1.0), Expression::decimal(2.0)).result_type(),
            ResultType::Boolean
        );
        assert_eq!(
            Expression::add(Expression::whole_number(1), Expression::whole_number(2)).result_type(),
            ResultType::WholeNumber
        );
        assert_eq!(
            Expression::add(Expression::whole_number(1), Expression::decimal(2.0)).result_type(),
            ResultType::Decimal
        );
        assert_eq!(
            Expression::sub(Expression::now(), Expression::now()).result_type(),
            ResultType::WholeNumber
        );
        assert_eq!(
            Expression::length(Expression::attribute("a")).result_type(),
            ResultType::WholeNumber
        );
        assert_eq!(
            Expression::if_else(
                Expression::boolean(true),
                Expression::whole_number(1),
                Expression::whole_number(2)
            )
            .result_type(),
            ResultType::WholeNumber
        );
    }

    #[test]
    fn test_subject_is_primary_operand() {
        let expr = Expression::lt(Expression::attribute("count"), Expression::attribute("limit"));
        assert_eq!(expr.subject(), Some(&Expression::attribute("count")));

        let expr = Expression::concat(vec![Expression::string("a"), Expression::string("b")]);
        assert_eq!(expr.subject(), Some(&Expression::string("a")));

        assert_eq!(Expression::attribute("x").subject(), None);
    }

    #[test]
    fn test_domain_resolved_at_construction() {
        let Expression::Comparison(cmp) = Expression::eq(
            Expression::whole_number(1),
            Expression::decimal(1.0),
        ) else {
            panic!("expected comparison");
        };
        assert_eq!(cmp.domain(), Some(ComparisonDomain::Decimal));

        let Expression::Comparison(cmp) =
            Expression::lt(Expression::attribute("a"), Expression::decimal(1.0))
        else {
            panic!("expected comparison");
        };
        assert_eq!(cmp.domain(), None);
    }

    #[test]
    fn test_is_constant() {
        assert!(Expression::whole_number(42).is_constant());
        assert!(!Expression::attribute("a").is_constant());
        assert!(!Expression::now().is_constant());
        assert!(
            Expression::concat(vec![Expression::string("a"), Expression::string("b")])
                .is_constant()
        );
        assert!(!Expression::is_null(Expression::attribute("a")).is_constant());
    }

    #[test]
    fn test_uses_date_format() {
        let epoch = || Expression::date(DateTime::<Utc>::UNIX_EPOCH);
        assert!(Expression::stringify(epoch()).uses_date_format());
        assert!(Expression::to_date(Expression::string("2024"), None).uses_date_format());
        assert!(Expression::concat(vec![Expression::string("at "), epoch()]).uses_date_format());
        assert!(
            Expression::to_upper(Expression::stringify(Expression::now())).uses_date_format()
        );

        assert!(!Expression::format_date(epoch(), "%Y").uses_date_format());
        assert!(!Expression::stringify(Expression::whole_number(1)).uses_date_format());
        assert!(!Expression::to_number(epoch()).uses_date_format());
    }

    #[test]
    fn test_signature_lines_up_with_operands() {
        let exprs = vec![
            Expression::substring(
                Expression::attribute("s"),
                Expression::whole_number(0),
                Some(Expression::whole_number(2)),
            ),
            Expression::replace_all(
                Expression::attribute("s"),
                Expression::string("a+"),
                Expression::string("b"),
            ),
            Expression::and(vec![Expression::boolean(true), Expression::boolean(false)]),
            Expression::replace_null(Expression::attribute("s"), Expression::string("x")),
        ];
        for expr in exprs {
            assert_eq!(expr.signature().operands.len(), expr.operands().len());
        }

        let sig = Expression::matches(Expression::attribute("s"), Expression::string("x")).signature();
        assert_eq!(sig.operator, "matches");
        assert_eq!(sig.operands[1].role, "pattern");
        assert_eq!(sig.null_policy, NullPolicy::AbsentIsFalse);
    }
}
