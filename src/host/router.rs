//! Routing records by boolean expressions.
//!
//! Each named rule is a boolean expression. Depending on the strategy a
//! record goes to the relationship named after every matching rule, or to a
//! single `matched` relationship when all (or any) rules match. A rule that
//! fails to evaluate sends the record to the failure path instead.

use crate::config::EngineConfig;
use crate::expression::{
    validate_as, AttributeLookup, EvaluationContext, EvaluationError, Expression,
    ExpressionEvaluator, ResultType,
};
use crate::host::ensure_valid;
use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Relationship for records matched under `AllMatch` / `AnyMatch`
pub const MATCHED: &str = "matched";

/// Relationship for records no rule matched
pub const UNMATCHED: &str = "unmatched";

/// Relationship for records a rule failed to evaluate
pub const FAILURE: &str = "failure";

/// How rule outcomes become a routing decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingStrategy {
    /// Route to every rule that matches, by rule name
    ToPropertyName,
    /// Route to `matched` when every rule matches. Rules after the first
    /// one that does not match are not evaluated, so their failures are
    /// never reported.
    AllMatch,
    /// Route to `matched` when at least one rule matches
    AnyMatch,
}

/// Routing decision for one record
#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    /// Relationships the record goes to
    Matched(Vec<String>),
    Unmatched,
    /// A rule could not be evaluated for this record
    Failed { rule: String, error: EvaluationError },
}

impl Route {
    /// Relationship names this decision sends the record to
    pub fn relationships(&self) -> Vec<&str> {
        match self {
            Route::Matched(names) => names.iter().map(String::as_str).collect(),
            Route::Unmatched => vec![UNMATCHED],
            Route::Failed { .. } => vec![FAILURE],
        }
    }
}

struct RoutingRule {
    name: String,
    expression: Arc<Expression>,
}

/// Evaluates routing rules against records
pub struct Router {
    strategy: RoutingStrategy,
    rules: Vec<RoutingRule>,
    config: EngineConfig,
}

impl Router {
    pub fn new(strategy: RoutingStrategy) -> Self {
        Self {
            strategy,
            rules: Vec::new(),
            config: EngineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Add a rule. The expression must validate as a boolean.
    pub fn add_rule(&mut self, name: impl Into<String>, expression: Arc<Expression>) -> Result<()> {
        let name = name.into();
        if name == UNMATCHED || name == MATCHED || name == FAILURE {
            bail!("Rule name '{}' is reserved", name);
        }
        if self.rules.iter().any(|rule| rule.name == name) {
            bail!("Rule '{}' already exists", name);
        }

        ensure_valid(
            &format!("rule '{}'", name),
            &validate_as(&expression, ResultType::Boolean),
        )?;

        self.rules.push(RoutingRule { name, expression });
        Ok(())
    }

    pub fn strategy(&self) -> RoutingStrategy {
        self.strategy
    }

    /// Rule names in the order they are evaluated
    pub fn rule_names(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|rule| rule.name.as_str())
    }

    /// Decide where a record goes
    pub fn route(&self, attributes: &dyn AttributeLookup, now: DateTime<Utc>) -> Route {
        let evaluator = ExpressionEvaluator::new(EvaluationContext::new(attributes, now), &self.config);

        let mut matched = Vec::new();
        for rule in &self.rules {
            let result = match evaluator.evaluate(&rule.expression) {
                Ok(result) => result,
                Err(error) => {
                    log::warn!("Routing rule '{}' failed: {}", rule.name, error);
                    return Route::Failed {
                        rule: rule.name.clone(),
                        error,
                    };
                }
            };

            // Absent reads as no match
            let is_match = result.as_bool().unwrap_or(false);
            log::trace!("Routing rule '{}' matched: {}", rule.name, is_match);

            match self.strategy {
                RoutingStrategy::AnyMatch if is_match => return Route::Matched(vec![MATCHED.to_string()]),
                RoutingStrategy::AllMatch if !is_match => return Route::Unmatched,
                _ => {}
            }
            if is_match {
                matched.push(rule.name.clone());
            }
        }

        match self.strategy {
            RoutingStrategy::ToPropertyName if !matched.is_empty() => Route::Matched(matched),
            RoutingStrategy::AllMatch if !self.rules.is_empty() => {
                Route::Matched(vec![MATCHED.to_string()])
            }
            _ => Route::Unmatched,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn attrs(entries: &[(&str, &str)]) -> HashMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn starts_with(prefix: &str) -> Arc<Expression> {
        Arc::new(Expression::starts_with(
            Expression::attribute("text"),
            Expression::string(prefix),
        ))
    }

    fn router(strategy: RoutingStrategy) -> Router {
        let mut router = Router::new(strategy);
        router.add_rule("simple", starts_with("start")).unwrap();
        router.add_rule("notSimple", starts_with("end")).unwrap();
        router
    }

    #[test]
    fn test_route_to_property_name() {
        let router = router(RoutingStrategy::ToPropertyName);

        let route = router.route(&attrs(&[("text", "start middle end")]), Utc::now());
        assert_eq!(route, Route::Matched(vec!["simple".to_string()]));
        assert_eq!(route.relationships(), vec!["simple"]);

        let route = router.route(&attrs(&[("text", "other")]), Utc::now());
        assert_eq!(route, Route::Unmatched);
        assert_eq!(route.relationships(), vec![UNMATCHED]);
    }

    #[test]
    fn test_route_all_and_any() {
        let record = attrs(&[("text", "start middle end")]);

        let route = router(RoutingStrategy::AllMatch).route(&record, Utc::now());
        assert_eq!(route, Route::Unmatched);

        let route = router(RoutingStrategy::AnyMatch).route(&record, Utc::now());
        assert_eq!(route, Route::Matched(vec![MATCHED.to_string()]));

        // No rules can never all match
        let route = Router::new(RoutingStrategy::AllMatch).route(&record, Utc::now());
        assert_eq!(route, Route::Unmatched);
    }

    #[test]
    fn test_absent_attribute_is_unmatched() {
        let route = router(RoutingStrategy::AnyMatch).route(&attrs(&[]), Utc::now());
        assert_eq!(route, Route::Unmatched);
    }

    #[test]
    fn test_failed_rule() {
        let mut router = Router::new(RoutingStrategy::ToPropertyName);
        router
            .add_rule(
                "large",
                Arc::new(Expression::gt(
                    Expression::to_decimal(Expression::attribute("size")),
                    Expression::decimal(10.0),
                )),
            )
            .unwrap();

        let route = router.route(&attrs(&[("size", "huge")]), Utc::now());
        assert!(matches!(
            route,
            Route::Failed {
                ref rule,
                error: EvaluationError::CoercionFailed { .. }
            } if rule == "large"
        ));
        assert_eq!(route.relationships(), vec![FAILURE]);
    }

    #[test]
    fn test_all_match_stops_at_first_miss() {
        let mut router = Router::new(RoutingStrategy::AllMatch);
        router.add_rule("simple", starts_with("start")).unwrap();
        router
            .add_rule(
                "large",
                Arc::new(Expression::gt(
                    Expression::to_decimal(Expression::attribute("size")),
                    Expression::decimal(10.0),
                )),
            )
            .unwrap();

        // "simple" misses first, so the unparseable size is never read
        let route = router.route(&attrs(&[("text", "end"), ("size", "huge")]), Utc::now());
        assert_eq!(route, Route::Unmatched);

        let route = router.route(&attrs(&[("text", "start"), ("size", "huge")]), Utc::now());
        assert!(matches!(route, Route::Failed { ref rule, .. } if rule == "large"));
    }

    #[test]
    fn test_rules_must_be_boolean() {
        let mut router = Router::new(RoutingStrategy::AnyMatch);
        assert!(router
            .add_rule("name", Arc::new(Expression::attribute("filename")))
            .is_err());
        assert!(router.add_rule(UNMATCHED, starts_with("x")).is_err());
        assert!(router.add_rule(FAILURE, starts_with("x")).is_err());

        router.add_rule("a", starts_with("x")).unwrap();
        assert!(router.add_rule("a", starts_with("y")).is_err());
        assert_eq!(router.rule_names().collect::<Vec<_>>(), vec!["a"]);
    }
}
