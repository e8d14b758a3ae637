//! Expression evaluation implementation.

use crate::config::EngineConfig;
use crate::expression::coerce::{
    date_from_millis, parse_boolean, parse_date, parse_decimal, parse_whole_number, render,
};
use crate::expression::{
    Arithmetic, ArithmeticDomain, ArithmeticOperator, AttributeLookup, Comparison,
    ComparisonDomain, EvaluationContext, EvaluationError, EvaluationResult, Expression,
    LogicalOperator, Pattern, ResultType, Search, StringPredicate, TypedResult, UnaryOperator,
    Value,
};
use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use std::borrow::Cow;
use std::collections::HashMap;

/// Evaluator for expressions.
///
/// Holds nothing but borrowed, read-only state, so any number of evaluators
/// may walk the same tree concurrently.
pub struct ExpressionEvaluator<'a> {
    /// The attributes and instant to evaluate against
    context: EvaluationContext<'a>,
    config: &'a EngineConfig,
}

impl<'a> ExpressionEvaluator<'a> {
    /// Create a new evaluator over one context
    pub fn new(context: EvaluationContext<'a>, config: &'a EngineConfig) -> Self {
        Self { context, config }
    }

    /// Evaluate an expression and return the result.
    ///
    /// The result is always tagged with `expr.result_type()`.
    pub fn evaluate(&self, expr: &Expression) -> EvaluationResult<TypedResult> {
        let result = self.evaluate_node(expr)?;
        debug_assert_eq!(result.result_type(), expr.result_type());
        Ok(result)
    }

    fn evaluate_node(&self, expr: &Expression) -> EvaluationResult<TypedResult> {
        match expr {
            Expression::Literal(lit) => Ok(lit.clone()),

            Expression::Attribute(name) => Ok(TypedResult::optional_string(
                self.context.lookup(name).map(str::to_string),
            )),

            Expression::Now => Ok(TypedResult::date(self.context.now())),

            Expression::Conversion {
                target,
                operand,
                format,
            } => match self.evaluate(operand)?.into_value() {
                None => Ok(TypedResult::absent(*target)),
                Some(value) => self
                    .convert(expr, value, *target, format.as_deref())
                    .map(TypedResult::from_value),
            },

            Expression::Unary { op, operand } => self.evaluate_unary(expr, *op, operand),

            Expression::Comparison(cmp) => self.evaluate_comparison(expr, cmp),

            Expression::Arithmetic(arith) => self.evaluate_arithmetic(expr, arith),

            Expression::Logical { op, operands } => self.evaluate_logical(expr, *op, operands),

            Expression::IfElse {
                condition,
                then,
                otherwise,
            } => {
                let branch = if self.evaluate_condition(expr, condition)? {
                    then
                } else {
                    otherwise
                };
                self.expect_type(expr, self.evaluate(branch)?)
            }

            Expression::ReplaceNull {
                subject,
                replacement,
            } => {
                let value = self.evaluate(subject)?;
                if value.is_absent() {
                    self.expect_type(expr, self.evaluate(replacement)?)
                } else {
                    Ok(value)
                }
            }

            Expression::Concat { operands } => {
                let mut out = String::new();
                for operand in operands {
                    match self.evaluate(operand)?.value() {
                        None => return Ok(TypedResult::absent(ResultType::String)),
                        Some(value) => out.push_str(&render(value, self.date_format(None))?),
                    }
                }
                Ok(TypedResult::string(out))
            }

            Expression::Substring {
                subject,
                start,
                end,
            } => self.evaluate_substring(expr, subject, start, end.as_deref()),

            Expression::StringPredicate {
                op,
                subject,
                argument,
            } => self.evaluate_string_predicate(expr, *op, subject, argument),

            Expression::Replace {
                subject,
                search,
                replacement,
            } => self.evaluate_replace(expr, subject, search, replacement),
        }
    }

    /// Convert a present value to the target type
    fn convert(
        &self,
        expr: &Expression,
        value: Value,
        target: ResultType,
        format: Option<&str>,
    ) -> EvaluationResult<Value> {
        let converted = match (target, value) {
            (ResultType::String, value) => Value::String(render(&value, self.date_format(format))?),

            (ResultType::Boolean, Value::String(s)) => Value::Boolean(parse_boolean(&s)?),
            (ResultType::Boolean, Value::Boolean(b)) => Value::Boolean(b),

            (ResultType::WholeNumber, Value::String(s)) => {
                Value::WholeNumber(parse_whole_number(&s)?)
            }
            (ResultType::WholeNumber, Value::WholeNumber(n)) => Value::WholeNumber(n),
            (ResultType::WholeNumber, Value::Decimal(d)) => {
                let truncated = d.trunc();
                if !truncated.is_finite()
                    || truncated < i64::MIN as f64
                    || truncated >= i64::MAX as f64
                {
                    return Err(EvaluationError::coercion(
                        d.to_string(),
                        ResultType::WholeNumber,
                    ));
                }
                Value::WholeNumber(truncated as i64)
            }
            (ResultType::WholeNumber, Value::Date(d)) => Value::WholeNumber(d.timestamp_millis()),

            (ResultType::Decimal, Value::String(s)) => Value::Decimal(parse_decimal(&s)?),
            (ResultType::Decimal, Value::WholeNumber(n)) => Value::Decimal(n as f64),
            (ResultType::Decimal, Value::Decimal(d)) => Value::Decimal(d),
            (ResultType::Decimal, Value::Date(d)) => Value::Decimal(d.timestamp_millis() as f64),

            (ResultType::Date, Value::String(s)) => {
                Value::Date(parse_date(&s, self.date_format(format))?)
            }
            (ResultType::Date, Value::WholeNumber(n)) => Value::Date(date_from_millis(n)?),
            (ResultType::Date, Value::Date(d)) => Value::Date(d),

            _ => return Err(ill_typed(expr)),
        };
        Ok(converted)
    }

    /// Evaluate a unary operation
    fn evaluate_unary(
        &self,
        expr: &Expression,
        op: UnaryOperator,
        operand: &Expression,
    ) -> EvaluationResult<TypedResult> {
        let value = self.evaluate(operand)?;

        let result = match op {
            UnaryOperator::IsNull => TypedResult::boolean(value.is_absent()),
            UnaryOperator::NotNull => TypedResult::boolean(!value.is_absent()),
            UnaryOperator::IsEmpty => match value.value() {
                None => TypedResult::boolean(true),
                Some(Value::String(s)) => TypedResult::boolean(s.trim().is_empty()),
                Some(_) => return Err(ill_typed(expr)),
            },

            // Absent reads as false, so the negation is true
            UnaryOperator::Not => match value.value() {
                None => TypedResult::boolean(true),
                Some(Value::Boolean(b)) => TypedResult::boolean(!b),
                Some(_) => return Err(ill_typed(expr)),
            },

            _ => match value.into_value() {
                None => TypedResult::absent(expr.result_type()),
                Some(Value::WholeNumber(n)) if op == UnaryOperator::Negate => n
                    .checked_neg()
                    .map(TypedResult::whole_number)
                    .ok_or_else(|| EvaluationError::overflow(op.as_str()))?,
                Some(Value::Decimal(d)) if op == UnaryOperator::Negate => TypedResult::decimal(-d),
                Some(Value::String(s)) => match op {
                    UnaryOperator::ToUpper => TypedResult::string(s.to_uppercase()),
                    UnaryOperator::ToLower => TypedResult::string(s.to_lowercase()),
                    UnaryOperator::Trim => TypedResult::string(s.trim()),
                    UnaryOperator::Length => {
                        let length = i64::try_from(s.chars().count())
                            .map_err(|_| EvaluationError::overflow(op.as_str()))?;
                        TypedResult::whole_number(length)
                    }
                    _ => return Err(ill_typed(expr)),
                },
                Some(_) => return Err(ill_typed(expr)),
            },
        };
        Ok(result)
    }

    /// Evaluate a comparison. An absent operand on either side is `false`.
    fn evaluate_comparison(
        &self,
        expr: &Expression,
        cmp: &Comparison,
    ) -> EvaluationResult<TypedResult> {
        let subject = self.evaluate(cmp.subject())?;
        let Some(left) = subject.value() else {
            return Ok(TypedResult::boolean(false));
        };
        let comparison = self.evaluate(cmp.comparison())?;
        let Some(right) = comparison.value() else {
            return Ok(TypedResult::boolean(false));
        };
        let Some(domain) = cmp.domain() else {
            return Err(ill_typed(expr));
        };

        let ordering = match (domain, left, right) {
            (ComparisonDomain::String, Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (ComparisonDomain::Boolean, Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
            (ComparisonDomain::WholeNumber, Value::WholeNumber(a), Value::WholeNumber(b)) => {
                Some(a.cmp(b))
            }
            (ComparisonDomain::Date, Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
            (ComparisonDomain::Decimal, a, b) => match (widen(a), widen(b)) {
                (Some(a), Some(b)) => a.partial_cmp(&b),
                _ => return Err(ill_typed(expr)),
            },
            _ => return Err(ill_typed(expr)),
        };

        Ok(TypedResult::boolean(cmp.op().holds(ordering)))
    }

    /// Evaluate arithmetic. Absent operands propagate.
    fn evaluate_arithmetic(
        &self,
        expr: &Expression,
        arith: &Arithmetic,
    ) -> EvaluationResult<TypedResult> {
        let subject = self.evaluate(arith.subject())?;
        let operand = self.evaluate(arith.operand())?;
        let (Some(left), Some(right)) = (subject.value(), operand.value()) else {
            return Ok(TypedResult::absent(arith.result_type()));
        };
        let Some(domain) = arith.domain() else {
            return Err(ill_typed(expr));
        };
        let op = arith.op();

        let result = match (domain, left, right) {
            (ArithmeticDomain::WholeNumber, Value::WholeNumber(a), Value::WholeNumber(b)) => {
                TypedResult::whole_number(whole_arithmetic(op, *a, *b)?)
            }
            (ArithmeticDomain::Decimal, a, b) => match (widen(a), widen(b)) {
                (Some(a), Some(b)) => TypedResult::decimal(match op {
                    ArithmeticOperator::Add => a + b,
                    ArithmeticOperator::Subtract => a - b,
                    ArithmeticOperator::Multiply => a * b,
                    ArithmeticOperator::Divide => a / b,
                    ArithmeticOperator::Modulo => a % b,
                }),
                _ => return Err(ill_typed(expr)),
            },
            (ArithmeticDomain::DateOffset, Value::Date(date), Value::WholeNumber(millis)) => {
                let offset = Duration::try_milliseconds(*millis)
                    .ok_or_else(|| EvaluationError::overflow(op.as_str()))?;
                let shifted = match op {
                    ArithmeticOperator::Add => date.checked_add_signed(offset),
                    ArithmeticOperator::Subtract => date.checked_sub_signed(offset),
                    _ => return Err(ill_typed(expr)),
                };
                TypedResult::date(shifted.ok_or_else(|| EvaluationError::overflow(op.as_str()))?)
            }
            (ArithmeticDomain::DateDifference, Value::Date(a), Value::Date(b)) => {
                TypedResult::whole_number(a.signed_duration_since(*b).num_milliseconds())
            }
            _ => return Err(ill_typed(expr)),
        };
        Ok(result)
    }

    /// Evaluate AND / OR, short-circuiting. Absent operands read as `false`.
    fn evaluate_logical(
        &self,
        expr: &Expression,
        op: LogicalOperator,
        operands: &[Expression],
    ) -> EvaluationResult<TypedResult> {
        for operand in operands {
            let value = self.evaluate_condition(expr, operand)?;
            match (op, value) {
                (LogicalOperator::And, false) => return Ok(TypedResult::boolean(false)),
                (LogicalOperator::Or, true) => return Ok(TypedResult::boolean(true)),
                _ => {}
            }
        }
        Ok(TypedResult::boolean(op == LogicalOperator::And))
    }

    fn evaluate_condition(&self, expr: &Expression, condition: &Expression) -> EvaluationResult<bool> {
        match self.evaluate(condition)?.value() {
            None => Ok(false),
            Some(Value::Boolean(b)) => Ok(*b),
            Some(_) => Err(ill_typed(expr)),
        }
    }

    /// Character range `[start, end)`, clamped to the subject
    fn evaluate_substring(
        &self,
        expr: &Expression,
        subject: &Expression,
        start: &Expression,
        end: Option<&Expression>,
    ) -> EvaluationResult<TypedResult> {
        let absent = TypedResult::absent(ResultType::String);

        let subject = self.evaluate(subject)?;
        let Some(text) = subject.value() else {
            return Ok(absent);
        };
        let Value::String(text) = text else {
            return Err(ill_typed(expr));
        };
        let Some(start) = self.evaluate_index(expr, start)? else {
            return Ok(absent);
        };
        let length = text.chars().count();
        let end = match end {
            Some(end) => match self.evaluate_index(expr, end)? {
                Some(end) => end,
                None => return Ok(absent),
            },
            None => length,
        };

        let start = start.min(length);
        let end = end.clamp(start, length);
        Ok(TypedResult::string(
            text.chars().skip(start).take(end - start).collect::<String>(),
        ))
    }

    /// Whole-number index, negative values clamped to zero
    fn evaluate_index(&self, expr: &Expression, index: &Expression) -> EvaluationResult<Option<usize>> {
        match self.evaluate(index)?.value() {
            None => Ok(None),
            Some(Value::WholeNumber(n)) => Ok(Some(usize::try_from(*n).unwrap_or(0))),
            Some(_) => Err(ill_typed(expr)),
        }
    }

    /// Evaluate a string predicate. An absent operand is `false`.
    fn evaluate_string_predicate(
        &self,
        expr: &Expression,
        op: StringPredicate,
        subject: &Expression,
        argument: &Search,
    ) -> EvaluationResult<TypedResult> {
        let subject = self.evaluate(subject)?;
        let Some(text) = subject.value() else {
            return Ok(TypedResult::boolean(false));
        };
        let Value::String(text) = text else {
            return Err(ill_typed(expr));
        };

        let matched = match argument {
            Search::Pattern(_) if !op.uses_pattern() => return Err(ill_typed(expr)),
            Search::Pattern(pattern) => {
                let Some(re) = self.resolve_pattern(expr, pattern)? else {
                    return Ok(TypedResult::boolean(false));
                };
                self.check_pattern_input(text)?;
                re.is_match(text)
            }
            Search::Text(arg) => {
                let Some(arg) = self.evaluate_string(expr, arg)? else {
                    return Ok(TypedResult::boolean(false));
                };
                match op {
                    StringPredicate::StartsWith => text.starts_with(arg.as_str()),
                    StringPredicate::EndsWith => text.ends_with(arg.as_str()),
                    StringPredicate::Contains => text.contains(arg.as_str()),
                    StringPredicate::EqualsIgnoreCase => text.to_lowercase() == arg.to_lowercase(),
                    StringPredicate::Matches | StringPredicate::Find => {
                        return Err(ill_typed(expr))
                    }
                }
            }
        };
        Ok(TypedResult::boolean(matched))
    }

    fn evaluate_replace(
        &self,
        expr: &Expression,
        subject: &Expression,
        search: &Search,
        replacement: &Expression,
    ) -> EvaluationResult<TypedResult> {
        let absent = TypedResult::absent(ResultType::String);

        let Some(text) = self.evaluate_string(expr, subject)? else {
            return Ok(absent);
        };
        let Some(replacement) = self.evaluate_string(expr, replacement)? else {
            return Ok(absent);
        };

        let replaced = match search {
            Search::Text(search) => match self.evaluate_string(expr, search)? {
                Some(search) => text.replace(search.as_str(), &replacement),
                None => return Ok(absent),
            },
            Search::Pattern(pattern) => match self.resolve_pattern(expr, pattern)? {
                Some(re) => {
                    self.check_pattern_input(&text)?;
                    re.replace_all(&text, replacement.as_str()).into_owned()
                }
                None => return Ok(absent),
            },
        };
        Ok(TypedResult::string(replaced))
    }

    /// Evaluate a string-typed operand
    fn evaluate_string(
        &self,
        expr: &Expression,
        operand: &Expression,
    ) -> EvaluationResult<Option<String>> {
        match self.evaluate(operand)?.into_value() {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(_) => Err(ill_typed(expr)),
        }
    }

    /// The regex for a pattern operand: the one compiled at construction, or
    /// a fresh one for a dynamic source. `None` when the source is absent.
    fn resolve_pattern<'p>(
        &self,
        expr: &Expression,
        pattern: &'p Pattern,
    ) -> EvaluationResult<Option<Cow<'p, Regex>>> {
        match pattern.compiled() {
            Some(Ok(re)) => Ok(Some(Cow::Borrowed(re))),
            Some(Err(err)) => Err(err.clone()),
            None => match self.evaluate_string(expr, pattern.source())? {
                Some(source) => {
                    Pattern::compile(&source, pattern.is_anchored()).map(|re| Some(Cow::Owned(re)))
                }
                None => Ok(None),
            },
        }
    }

    fn check_pattern_input(&self, input: &str) -> EvaluationResult<()> {
        match self.config.max_pattern_input {
            Some(limit) if input.len() > limit => Err(EvaluationError::InputTooLarge {
                length: input.len(),
                limit,
            }),
            _ => Ok(()),
        }
    }

    /// Reject a branch whose tag differs from the node's declared type
    fn expect_type(&self, expr: &Expression, result: TypedResult) -> EvaluationResult<TypedResult> {
        if result.result_type() == expr.result_type() {
            Ok(result)
        } else {
            Err(ill_typed(expr))
        }
    }

    fn date_format<'f>(&'f self, explicit: Option<&'f str>) -> Option<&'f str> {
        explicit.or(self.config.date_format.as_deref())
    }
}

/// Checked whole-number arithmetic
fn whole_arithmetic(op: ArithmeticOperator, a: i64, b: i64) -> EvaluationResult<i64> {
    let result = match op {
        ArithmeticOperator::Add => a.checked_add(b),
        ArithmeticOperator::Subtract => a.checked_sub(b),
        ArithmeticOperator::Multiply => a.checked_mul(b),
        ArithmeticOperator::Divide | ArithmeticOperator::Modulo if b == 0 => {
            return Err(EvaluationError::DivisionByZero)
        }
        ArithmeticOperator::Divide => a.checked_div(b),
        ArithmeticOperator::Modulo => a.checked_rem(b),
    };
    result.ok_or_else(|| EvaluationError::overflow(op.as_str()))
}

/// Numeric value as a decimal
fn widen(value: &Value) -> Option<f64> {
    match value {
        Value::WholeNumber(n) => Some(*n as f64),
        Value::Decimal(d) => Some(*d),
        _ => None,
    }
}

/// Error for a node whose operands do not fit its signature
fn ill_typed(expr: &Expression) -> EvaluationError {
    let signature = expr.signature();
    let expected = signature
        .operands
        .iter()
        .map(|slot| {
            slot.accepted
                .iter()
                .map(|ty| ty.as_str())
                .collect::<Vec<_>>()
                .join("|")
        })
        .collect::<Vec<_>>()
        .join(", ");
    let actual = expr
        .operands()
        .iter()
        .map(|operand| operand.result_type().as_str())
        .collect::<Vec<_>>()
        .join(", ");

    EvaluationError::IllTyped {
        operator: signature.operator.to_string(),
        expected,
        actual,
    }
}

/// Evaluate an expression against attributes at the current instant
pub fn evaluate(expr: &Expression, attributes: &dyn AttributeLookup) -> EvaluationResult<TypedResult> {
    evaluate_at(expr, attributes, Utc::now())
}

/// Evaluate an expression against attributes at a given instant
pub fn evaluate_at(
    expr: &Expression,
    attributes: &dyn AttributeLookup,
    now: DateTime<Utc>,
) -> EvaluationResult<TypedResult> {
    log::trace!("Evaluating {} expression", expr.operator_name());
    let config = EngineConfig::default();
    ExpressionEvaluator::new(EvaluationContext::new(attributes, now), &config).evaluate(expr)
}

/// Evaluate a tree that reads neither attributes nor the clock
pub(crate) fn evaluate_constant(expr: &Expression) -> EvaluationResult<TypedResult> {
    let empty = HashMap::<String, String>::new();
    let config = EngineConfig::default();
    ExpressionEvaluator::new(
        EvaluationContext::new(&empty, DateTime::<Utc>::UNIX_EPOCH),
        &config,
    )
    .evaluate(expr)
}
