//! Adapters a host framework uses to consume the engine.
//!
//! None of these schedule, persist or transfer records. They decide what a
//! record's expressions mean: where it routes, which attributes change, what
//! an aggregate folds to.

pub mod aggregate;
pub mod cache;
pub mod router;
pub mod updater;

pub use aggregate::AggregateFold;
pub use cache::ExpressionCache;
pub use router::{Route, Router, RoutingStrategy, FAILURE, MATCHED, UNMATCHED};
pub use updater::{AttributeUpdate, AttributeUpdater};

use crate::expression::{has_errors, ValidationIssue};
use anyhow::{bail, Result};

/// Reject a tree whose issues include errors; warnings are only logged
pub(crate) fn ensure_valid(what: &str, issues: &[ValidationIssue]) -> Result<()> {
    for issue in issues.iter().filter(|issue| !issue.is_error()) {
        log::warn!("{}: {}", what, issue);
    }
    if has_errors(issues) {
        let details = issues
            .iter()
            .filter(|issue| issue.is_error())
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        bail!("Invalid expression for {}: {}", what, details);
    }
    Ok(())
}
