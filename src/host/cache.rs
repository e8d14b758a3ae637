//! Validated expression trees shared across workers.
//!
//! A tree is rebuilt only when the fingerprint of its source changes, so
//! configuration reloads that leave a property alone keep the same tree.

use crate::expression::{validate, validate_as, Expression, ResultType};
use crate::host::ensure_valid;
use anyhow::Result;
use dashmap::DashMap;
use std::sync::Arc;

struct CachedExpression {
    fingerprint: String,
    expression: Arc<Expression>,
}

/// Concurrent cache of validated trees, keyed by property name
#[derive(Default)]
pub struct ExpressionCache {
    entries: DashMap<String, CachedExpression>,
}

impl ExpressionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached tree for `name`, built and validated again when `fingerprint`
    /// differs from the cached one
    pub fn get_or_build<F>(&self, name: &str, fingerprint: &str, build: F) -> Result<Arc<Expression>>
    where
        F: FnOnce() -> Result<Expression>,
    {
        self.get_or_insert(name, fingerprint, build, None)
    }

    /// Like [`ExpressionCache::get_or_build`], also requiring the root type
    pub fn get_or_build_as<F>(
        &self,
        name: &str,
        fingerprint: &str,
        required: ResultType,
        build: F,
    ) -> Result<Arc<Expression>>
    where
        F: FnOnce() -> Result<Expression>,
    {
        self.get_or_insert(name, fingerprint, build, Some(required))
    }

    fn get_or_insert<F>(
        &self,
        name: &str,
        fingerprint: &str,
        build: F,
        required: Option<ResultType>,
    ) -> Result<Arc<Expression>>
    where
        F: FnOnce() -> Result<Expression>,
    {
        if let Some(entry) = self.entries.get(name) {
            if entry.fingerprint == fingerprint {
                return Ok(Arc::clone(&entry.expression));
            }
        }

        let expression = build()?;
        let issues = match required {
            Some(required) => validate_as(&expression, required),
            None => validate(&expression),
        };
        ensure_valid(&format!("property '{}'", name), &issues)?;

        log::debug!("Built expression for property '{}'", name);
        let expression = Arc::new(expression);
        self.entries.insert(
            name.to_string(),
            CachedExpression {
                fingerprint: fingerprint.to_string(),
                expression: Arc::clone(&expression),
            },
        );
        Ok(expression)
    }

    /// Drop a cached tree; returns whether one was present
    pub fn invalidate(&self, name: &str) -> bool {
        self.entries.remove(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
