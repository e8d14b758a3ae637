//! Chained attribute updates over stored variables.
//!
//! Variables are evaluated in name order, each seeing the values written by
//! the ones before it. The stored state wins over the record's own attributes
//! when both define a name.

use crate::config::EngineConfig;
use crate::expression::coerce::render_result;
use crate::expression::{
    validate, AttributeLookup, EvaluationContext, Expression, ExpressionEvaluator, Layered,
};
use crate::host::ensure_valid;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Attribute written to a record after one update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeUpdate {
    pub attribute: String,
    /// `None` when the value expression was absent
    pub value: Option<String>,
}

pub struct AttributeUpdater {
    /// Sorted by name
    variables: Vec<(String, Expression)>,
    output_attribute: String,
    value_to_set: Expression,
    config: EngineConfig,
}

impl AttributeUpdater {
    pub fn new(output_attribute: impl Into<String>, value_to_set: Expression) -> Result<Self> {
        let output_attribute = output_attribute.into();
        ensure_valid(
            &format!("attribute '{}'", output_attribute),
            &validate(&value_to_set),
        )?;

        Ok(Self {
            variables: Vec::new(),
            output_attribute,
            value_to_set,
            config: EngineConfig::default(),
        })
    }

    /// Add or replace a stateful variable
    pub fn with_variable(mut self, name: impl Into<String>, expression: Expression) -> Result<Self> {
        let name = name.into();
        ensure_valid(&format!("variable '{}'", name), &validate(&expression))?;

        match self.variables.binary_search_by(|(existing, _)| existing.cmp(&name)) {
            Ok(index) => self.variables[index].1 = expression,
            Err(index) => self.variables.insert(index, (name, expression)),
        }
        Ok(self)
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Variable names in evaluation order
    pub fn variable_names(&self) -> impl Iterator<Item = &str> {
        self.variables.iter().map(|(name, _)| name.as_str())
    }

    /// State every variable starts from
    pub fn initial_state(&self) -> HashMap<String, String> {
        self.variables
            .iter()
            .map(|(name, _)| (name.clone(), "0".to_string()))
            .collect()
    }

    /// Evaluate every variable, then the output value.
    ///
    /// `state` is only replaced when every expression succeeds.
    pub fn apply(
        &self,
        state: &mut HashMap<String, String>,
        record: &dyn AttributeLookup,
        now: DateTime<Utc>,
    ) -> Result<AttributeUpdate> {
        let mut variables = state.clone();

        for (name, expression) in &self.variables {
            let value = self
                .render(expression, &variables, record, now)
                .with_context(|| format!("Failed to evaluate variable '{}'", name))?;
            match value {
                Some(value) => {
                    variables.insert(name.clone(), value);
                }
                None => {
                    variables.remove(name);
                }
            }
        }

        let value = self
            .render(&self.value_to_set, &variables, record, now)
            .with_context(|| format!("Failed to evaluate attribute '{}'", self.output_attribute))?;

        log::debug!(
            "Updated {} variable(s), '{}' = {:?}",
            self.variables.len(),
            self.output_attribute,
            value
        );
        *state = variables;
        Ok(AttributeUpdate {
            attribute: self.output_attribute.clone(),
            value,
        })
    }

    fn render(
        &self,
        expression: &Expression,
        variables: &HashMap<String, String>,
        record: &dyn AttributeLookup,
        now: DateTime<Utc>,
    ) -> Result<Option<String>> {
        let lookup = Layered::new(variables, record);
        let evaluator = ExpressionEvaluator::new(EvaluationContext::new(&lookup, now), &self.config);
        let result = evaluator.evaluate(expression)?;
        Ok(render_result(&result, self.config.date_format.as_deref())?)
    }
}
