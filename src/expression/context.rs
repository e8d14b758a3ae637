//! Read-only attribute lookups presented to one evaluation.

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};

/// String-keyed attribute source.
///
/// Implementations must be referentially transparent for the duration of an
/// evaluation: the same name always yields the same value.
pub trait AttributeLookup {
    fn lookup(&self, name: &str) -> Option<&str>;
}

impl AttributeLookup for HashMap<String, String> {
    fn lookup(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

impl AttributeLookup for BTreeMap<String, String> {
    fn lookup(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

impl<T: AttributeLookup + ?Sized> AttributeLookup for &T {
    fn lookup(&self, name: &str) -> Option<&str> {
        (**self).lookup(name)
    }
}

/// Two lookups consulted in order.
///
/// Lets a host present synthesized entries (aggregation state, pseudo
/// attributes) on top of a record's own attributes.
pub struct Layered<'a> {
    primary: &'a dyn AttributeLookup,
    fallback: &'a dyn AttributeLookup,
}

impl<'a> Layered<'a> {
    pub fn new(primary: &'a dyn AttributeLookup, fallback: &'a dyn AttributeLookup) -> Self {
        Self { primary, fallback }
    }
}

impl AttributeLookup for Layered<'_> {
    fn lookup(&self, name: &str) -> Option<&str> {
        self.primary
            .lookup(name)
            .or_else(|| self.fallback.lookup(name))
    }
}

/// Everything one evaluation may observe: the attributes and the instant
/// the host evaluates at.
#[derive(Clone, Copy)]
pub struct EvaluationContext<'a> {
    attributes: &'a dyn AttributeLookup,
    now: DateTime<Utc>,
}

impl<'a> EvaluationContext<'a> {
    pub fn new(attributes: &'a dyn AttributeLookup, now: DateTime<Utc>) -> Self {
        Self { attributes, now }
    }

    pub fn lookup(&self, name: &str) -> Option<&'a str> {
        self.attributes.lookup(name)
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }
}
