//! Typed attribute-expression evaluation.
//!
//! This module provides:
//! - The typed result model every node produces
//! - Read-only attribute contexts supplied per record
//! - The expression tree and its operator families
//! - Evaluation with uniform null-propagation and coercion rules
//! - Static validation of operand types ahead of any record

pub mod coerce;
pub mod context;
pub mod error;
pub mod eval;
pub mod expr;
pub mod issue;
pub mod operator;
pub mod pattern;
pub mod result;
pub mod type_checker;

pub use context::{AttributeLookup, EvaluationContext, Layered};
pub use error::{EvaluationError, EvaluationResult};
pub use eval::{evaluate, evaluate_at, ExpressionEvaluator};
pub use expr::{Arithmetic, Comparison, Expression, Search};
pub use issue::{has_errors, IssueCode, Severity, ValidationIssue};
pub use operator::{
    ArithmeticDomain, ArithmeticOperator, ComparisonDomain, ComparisonOperator,
    LogicalOperator, NullPolicy, OperandSpec, Signature, StringPredicate, UnaryOperator,
};
pub use pattern::Pattern;
pub use result::{ResultType, TypedResult, Value};
pub use type_checker::{validate, validate_as, TypeChecker};
