//! Operator definitions for expressions.
//!
//! Each operator family is one generic node parameterized by a domain: the
//! operand-type descriptor that supplies comparison, coercion and result
//! type. Domains are resolved once when a node is built.

use crate::expression::ResultType;
use serde::Serialize;
use std::cmp::Ordering;

/// How a node treats an absent operand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NullPolicy {
    /// Any absent operand makes the result `false`
    AbsentIsFalse,
    /// Any absent operand makes the result absent
    Propagate,
    /// Absence is what the node inspects
    Inspect,
    /// An absent subject takes the value of another operand
    Replace,
}

/// One operand position in an operator signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperandSpec {
    pub role: &'static str,
    pub accepted: Vec<ResultType>,
}

impl OperandSpec {
    pub fn new(role: &'static str, accepted: &[ResultType]) -> Self {
        Self {
            role,
            accepted: accepted.to_vec(),
        }
    }

    pub fn any(role: &'static str) -> Self {
        Self::new(role, &ResultType::ALL)
    }

    pub fn accepts(&self, ty: ResultType) -> bool {
        self.accepted.contains(&ty)
    }
}

/// Declared contract of a node: operand slots, result type and null policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Signature {
    pub operator: &'static str,
    pub operands: Vec<OperandSpec>,
    pub result_type: ResultType,
    pub null_policy: NullPolicy,
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOperator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl ComparisonOperator {
    /// Whether this operator needs an ordering rather than just equality
    pub fn is_ordering(&self) -> bool {
        !matches!(self, ComparisonOperator::Eq | ComparisonOperator::Ne)
    }

    /// Apply the operator to an ordering; `None` (incomparable) is never a match
    pub fn holds(&self, ordering: Option<Ordering>) -> bool {
        let Some(ordering) = ordering else {
            return false;
        };
        match self {
            ComparisonOperator::Eq => ordering == Ordering::Equal,
            ComparisonOperator::Ne => ordering != Ordering::Equal,
            ComparisonOperator::Lt => ordering == Ordering::Less,
            ComparisonOperator::Le => ordering != Ordering::Greater,
            ComparisonOperator::Gt => ordering == Ordering::Greater,
            ComparisonOperator::Ge => ordering != Ordering::Less,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonOperator::Eq => "equals",
            ComparisonOperator::Ne => "notEquals",
            ComparisonOperator::Lt => "lessThan",
            ComparisonOperator::Le => "lessThanOrEqual",
            ComparisonOperator::Gt => "greaterThan",
            ComparisonOperator::Ge => "greaterThanOrEqual",
        }
    }
}

/// Operand domain of a comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonDomain {
    String,
    Boolean,
    WholeNumber,
    /// Both decimal, or whole mixed with decimal (widened to decimal)
    Decimal,
    Date,
}

impl ComparisonDomain {
    /// Resolve the domain for a pair of operand types, if they are comparable
    /// under `op`. Strings never mix with numbers.
    pub fn resolve(op: ComparisonOperator, left: ResultType, right: ResultType) -> Option<Self> {
        let domain = match (left, right) {
            (ResultType::String, ResultType::String) => ComparisonDomain::String,
            (ResultType::Boolean, ResultType::Boolean) => ComparisonDomain::Boolean,
            (ResultType::WholeNumber, ResultType::WholeNumber) => ComparisonDomain::WholeNumber,
            (l, r) if l.is_numeric() && r.is_numeric() => ComparisonDomain::Decimal,
            (ResultType::Date, ResultType::Date) => ComparisonDomain::Date,
            _ => return None,
        };
        if op.is_ordering() && domain == ComparisonDomain::Boolean {
            return None;
        }
        Some(domain)
    }

    /// Types the subject of `op` may have
    pub fn subject_types(op: ComparisonOperator) -> Vec<ResultType> {
        ResultType::ALL
            .into_iter()
            .filter(|ty| !(op.is_ordering() && *ty == ResultType::Boolean))
            .collect()
    }

    /// Types a comparison operand may have against a subject of type `subject`
    pub fn partner_types(op: ComparisonOperator, subject: ResultType) -> Vec<ResultType> {
        ResultType::ALL
            .into_iter()
            .filter(|ty| Self::resolve(op, subject, *ty).is_some())
            .collect()
    }
}

/// Arithmetic operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithmeticOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
}

impl ArithmeticOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArithmeticOperator::Add => "plus",
            ArithmeticOperator::Subtract => "minus",
            ArithmeticOperator::Multiply => "multiply",
            ArithmeticOperator::Divide => "divide",
            ArithmeticOperator::Modulo => "mod",
        }
    }
}

/// Operand domain of an arithmetic node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithmeticDomain {
    /// whole op whole, checked 64-bit
    WholeNumber,
    /// decimal or mixed operands, IEEE 754
    Decimal,
    /// date +/- whole milliseconds
    DateOffset,
    /// date - date, in milliseconds
    DateDifference,
}

impl ArithmeticDomain {
    pub fn resolve(op: ArithmeticOperator, left: ResultType, right: ResultType) -> Option<Self> {
        use ArithmeticOperator::{Add, Subtract};
        match (left, right) {
            (ResultType::WholeNumber, ResultType::WholeNumber) => Some(ArithmeticDomain::WholeNumber),
            (l, r) if l.is_numeric() && r.is_numeric() => Some(ArithmeticDomain::Decimal),
            (ResultType::Date, ResultType::WholeNumber) if matches!(op, Add | Subtract) => {
                Some(ArithmeticDomain::DateOffset)
            }
            (ResultType::Date, ResultType::Date) if op == Subtract => {
                Some(ArithmeticDomain::DateDifference)
            }
            _ => None,
        }
    }

    pub fn result_type(&self) -> ResultType {
        match self {
            ArithmeticDomain::WholeNumber | ArithmeticDomain::DateDifference => {
                ResultType::WholeNumber
            }
            ArithmeticDomain::Decimal => ResultType::Decimal,
            ArithmeticDomain::DateOffset => ResultType::Date,
        }
    }

    pub fn subject_types(op: ArithmeticOperator) -> Vec<ResultType> {
        match op {
            ArithmeticOperator::Add | ArithmeticOperator::Subtract => vec![
                ResultType::WholeNumber,
                ResultType::Decimal,
                ResultType::Date,
            ],
            _ => vec![ResultType::WholeNumber, ResultType::Decimal],
        }
    }

    pub fn partner_types(op: ArithmeticOperator, subject: ResultType) -> Vec<ResultType> {
        ResultType::ALL
            .into_iter()
            .filter(|ty| Self::resolve(op, subject, *ty).is_some())
            .collect()
    }
}

/// N-ary boolean connectives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOperator {
    And,
    Or,
}

impl LogicalOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalOperator::And => "and",
            LogicalOperator::Or => "or",
        }
    }
}

/// Single-operand operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    // Logical
    Not,

    // Absence checks
    IsNull,
    NotNull,
    IsEmpty,

    // Arithmetic
    Negate,

    // String transforms
    ToUpper,
    ToLower,
    Trim,
    Length,
}

impl UnaryOperator {
    /// Accepted operand types
    pub fn operand_types(&self) -> Vec<ResultType> {
        match self {
            UnaryOperator::Not => vec![ResultType::Boolean],
            UnaryOperator::IsNull | UnaryOperator::NotNull => ResultType::ALL.to_vec(),
            UnaryOperator::Negate => vec![ResultType::WholeNumber, ResultType::Decimal],
            UnaryOperator::IsEmpty
            | UnaryOperator::ToUpper
            | UnaryOperator::ToLower
            | UnaryOperator::Trim
            | UnaryOperator::Length => vec![ResultType::String],
        }
    }

    /// Result type given the operand's type
    pub fn result_type(&self, operand: ResultType) -> ResultType {
        match self {
            UnaryOperator::Not
            | UnaryOperator::IsNull
            | UnaryOperator::NotNull
            | UnaryOperator::IsEmpty => ResultType::Boolean,
            UnaryOperator::Negate => {
                if operand == ResultType::WholeNumber {
                    ResultType::WholeNumber
                } else {
                    ResultType::Decimal
                }
            }
            UnaryOperator::ToUpper | UnaryOperator::ToLower | UnaryOperator::Trim => {
                ResultType::String
            }
            UnaryOperator::Length => ResultType::WholeNumber,
        }
    }

    pub fn null_policy(&self) -> NullPolicy {
        match self {
            UnaryOperator::Not => NullPolicy::AbsentIsFalse,
            UnaryOperator::IsNull | UnaryOperator::NotNull | UnaryOperator::IsEmpty => {
                NullPolicy::Inspect
            }
            _ => NullPolicy::Propagate,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOperator::Not => "not",
            UnaryOperator::IsNull => "isNull",
            UnaryOperator::NotNull => "notNull",
            UnaryOperator::IsEmpty => "isEmpty",
            UnaryOperator::Negate => "negate",
            UnaryOperator::ToUpper => "toUpper",
            UnaryOperator::ToLower => "toLower",
            UnaryOperator::Trim => "trim",
            UnaryOperator::Length => "length",
        }
    }
}

/// Boolean-valued string tests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringPredicate {
    StartsWith,
    EndsWith,
    Contains,
    EqualsIgnoreCase,
    /// The whole input matches a regular expression
    Matches,
    /// Some part of the input matches a regular expression
    Find,
}

impl StringPredicate {
    pub fn uses_pattern(&self) -> bool {
        matches!(self, StringPredicate::Matches | StringPredicate::Find)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StringPredicate::StartsWith => "startsWith",
            StringPredicate::EndsWith => "endsWith",
            StringPredicate::Contains => "contains",
            StringPredicate::EqualsIgnoreCase => "equalsIgnoreCase",
            StringPredicate::Matches => "matches",
            StringPredicate::Find => "find",
        }
    }
}

/// Name of the conversion operator producing `target`
pub fn conversion_name(target: ResultType) -> &'static str {
    match target {
        ResultType::String => "toString",
        ResultType::Boolean => "toBoolean",
        ResultType::WholeNumber => "toNumber",
        ResultType::Decimal => "toDecimal",
        ResultType::Date => "toDate",
    }
}

/// Types a conversion to `target` accepts
pub fn conversion_sources(target: ResultType) -> Vec<ResultType> {
    match target {
        ResultType::String => ResultType::ALL.to_vec(),
        ResultType::Boolean => vec![ResultType::String, ResultType::Boolean],
        ResultType::WholeNumber | ResultType::Decimal => vec![
            ResultType::String,
            ResultType::WholeNumber,
            ResultType::Decimal,
            ResultType::Date,
        ],
        ResultType::Date => vec![ResultType::String, ResultType::WholeNumber, ResultType::Date],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comparison_domains() {
        use ResultType::*;
        let lt = ComparisonOperator::Lt;
        let eq = ComparisonOperator::Eq;

        assert_eq!(
            ComparisonDomain::resolve(lt, Decimal, Decimal),
            Some(ComparisonDomain::Decimal)
        );
        assert_eq!(
            ComparisonDomain::resolve(eq, WholeNumber, Decimal),
            Some(ComparisonDomain::Decimal)
        );
        assert_eq!(
            ComparisonDomain::resolve(lt, WholeNumber, WholeNumber),
            Some(ComparisonDomain::WholeNumber)
        );
        assert_eq!(
            ComparisonDomain::resolve(eq, Boolean, Boolean),
            Some(ComparisonDomain::Boolean)
        );

        // Never implicit between strings and numbers
        assert_eq!(ComparisonDomain::resolve(lt, String, Decimal), None);
        assert_eq!(ComparisonDomain::resolve(eq, WholeNumber, String), None);
        // Booleans have no ordering
        assert_eq!(ComparisonDomain::resolve(lt, Boolean, Boolean), None);
        assert_eq!(ComparisonDomain::resolve(lt, Date, WholeNumber), None);

        assert_eq!(
            ComparisonDomain::partner_types(lt, Decimal),
            vec![WholeNumber, Decimal]
        );
        assert!(!ComparisonDomain::subject_types(lt).contains(&Boolean));
    }

    #[test]
    fn test_comparison_holds() {
        use std::cmp::Ordering::*;
        assert!(ComparisonOperator::Lt.holds(Some(Less)));
        assert!(!ComparisonOperator::Lt.holds(Some(Equal)));
        assert!(ComparisonOperator::Le.holds(Some(Equal)));
        assert!(ComparisonOperator::Ge.holds(Some(Greater)));
        assert!(ComparisonOperator::Ne.holds(Some(Less)));
        // Incomparable (NaN) never matches, not even !=
        assert!(!ComparisonOperator::Ne.holds(None));
        assert!(!ComparisonOperator::Eq.holds(None));
    }

    #[test]
    fn test_arithmetic_domains() {
        use ArithmeticOperator::*;
        use ResultType::*;

        assert_eq!(
            ArithmeticDomain::resolve(Add, WholeNumber, WholeNumber),
            Some(ArithmeticDomain::WholeNumber)
        );
        assert_eq!(
            ArithmeticDomain::resolve(Multiply, WholeNumber, Decimal),
            Some(ArithmeticDomain::Decimal)
        );
        assert_eq!(
            ArithmeticDomain::resolve(Add, Date, WholeNumber),
            Some(ArithmeticDomain::DateOffset)
        );
        assert_eq!(
            ArithmeticDomain::resolve(Subtract, Date, Date),
            Some(ArithmeticDomain::DateDifference)
        );
        assert_eq!(ArithmeticDomain::resolve(Add, Date, Date), None);
        assert_eq!(ArithmeticDomain::resolve(Multiply, Date, WholeNumber), None);
        assert_eq!(ArithmeticDomain::resolve(Add, String, WholeNumber), None);

        assert_eq!(ArithmeticDomain::DateDifference.result_type(), WholeNumber);
        assert_eq!(ArithmeticDomain::DateOffset.result_type(), Date);
    }

    #[test]
    fn test_unary_operator_types() {
        use ResultType::*;
        assert_eq!(UnaryOperator::Not.operand_types(), vec![Boolean]);
        assert_eq!(UnaryOperator::IsNull.operand_types().len(), 5);
        assert_eq!(UnaryOperator::Negate.result_type(WholeNumber), WholeNumber);
        assert_eq!(UnaryOperator::Negate.result_type(Decimal), Decimal);
        assert_eq!(UnaryOperator::Length.result_type(String), WholeNumber);
        assert_eq!(UnaryOperator::Trim.null_policy(), NullPolicy::Propagate);
        assert_eq!(UnaryOperator::IsEmpty.null_policy(), NullPolicy::Inspect);
    }

    #[test]
    fn test_operator_display() {
        assert_eq!(ComparisonOperator::Lt.as_str(), "lessThan");
        assert_eq!(ArithmeticOperator::Add.as_str(), "plus");
        assert_eq!(LogicalOperator::Or.as_str(), "or");
        assert_eq!(StringPredicate::Find.as_str(), "find");
        assert_eq!(conversion_name(ResultType::Decimal), "toDecimal");
    }
}
