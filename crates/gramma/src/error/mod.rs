//! # Error Types
//!
//! Parse failures are *values*, never panics: combinators compose them
//! through result-list merging, and the top-level entry points surface the
//! furthest one per non-terminal as a [`ParseFailure`].
//!
//! When the `diagnostics` feature is enabled, [`ParseFailure`] integrates
//! with [`miette`] for rich terminal reporting.

use thiserror::Error;

#[cfg(feature = "diagnostics")]
use miette::Diagnostic;

/// The deepest point a failed parse reached, and what was expected there.
///
/// `position` is 1-based and counts prime elements from the start of the
/// input: position 1 means "just before the first element". `expected` is
/// deduplicated, in first-contribution order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
#[cfg_attr(feature = "diagnostics", diagnostic(code(gramma::parse_failure)))]
#[error("parse failed at input position {position}, expected {}", .expected.join(" or "))]
pub struct ParseFailure {
    pub position: usize,
    pub expected: Vec<String>,
}

impl ParseFailure {
    #[must_use]
    pub fn new(position: usize, expected: Vec<String>) -> Self {
        Self { position, expected }
    }
}
