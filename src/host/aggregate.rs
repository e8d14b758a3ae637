//! Folding stored values through an aggregate expression.
//!
//! The expression sees three pseudo-attributes per step: the value being
//! folded in, the running aggregate, and the number of values in the window.

use crate::config::EngineConfig;
use crate::expression::coerce::format_decimal;
use crate::expression::{
    validate, EvaluationContext, Expression, ExpressionEvaluator, ResultType, Value,
};
use crate::host::ensure_valid;
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Value currently being folded in
pub const ROLLING_VALUE: &str = "rolling_value_state";
/// Aggregate so far, starting at `0.0`
pub const AGGREGATE_VALUE: &str = "aggregate_value_state";
/// Number of values in the window
pub const COUNT: &str = "count_state";

pub struct AggregateFold {
    expression: Expression,
    config: EngineConfig,
}

impl AggregateFold {
    /// The expression must produce a number
    pub fn new(expression: Expression) -> Result<Self> {
        ensure_valid("aggregate", &validate(&expression))?;
        if !expression.result_type().is_numeric() {
            bail!(
                "Aggregate expression must evaluate to a number, but evaluates to {}",
                expression.result_type()
            );
        }

        Ok(Self {
            expression,
            config: EngineConfig::default(),
        })
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Fold every value in order, starting from `0.0`
    pub fn fold<'v, I>(&self, values: I, count: usize, now: DateTime<Utc>) -> Result<f64>
    where
        I: IntoIterator<Item = &'v str>,
    {
        let mut aggregate = 0.0;
        for value in values {
            aggregate = self.step(aggregate, value, count, now)?;
        }
        Ok(aggregate)
    }

    /// Fold one value into the aggregate
    pub fn step(&self, aggregate: f64, value: &str, count: usize, now: DateTime<Utc>) -> Result<f64> {
        let state = HashMap::from([
            (ROLLING_VALUE.to_string(), value.to_string()),
            (AGGREGATE_VALUE.to_string(), format_decimal(aggregate)),
            (COUNT.to_string(), count.to_string()),
        ]);

        let evaluator = ExpressionEvaluator::new(EvaluationContext::new(&state, now), &self.config);
        let result = evaluator
            .evaluate(&self.expression)
            .with_context(|| format!("Failed to aggregate value '{}'", value))?;

        match result.value() {
            Some(Value::Decimal(d)) => Ok(*d),
            Some(Value::WholeNumber(n)) => Ok(*n as f64),
            _ => bail!(
                "Aggregate expression produced no {} for value '{}'",
                ResultType::Decimal,
                value
            ),
        }
    }
}
