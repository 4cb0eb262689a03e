//! Token-level primitives.
//!
//! Each primitive inspects the suffix at the current table position,
//! consumes a measured prefix (counted in prime elements) by advancing
//! the table index, or fails with a labeled failure right there. Rename
//! a primitive's expectation with [`Parser::expected`] when the default
//! label is too generic for a grammar's diagnostics.

use std::fmt::Debug;

use crate::bundle::Grammar;
use crate::input::Source;
use crate::parser::Parser;
use crate::result::{Failure, ResultList};

/// Consume one prime element satisfying `pred`.
#[must_use]
pub fn satisfy<'a, G, S>(pred: impl Fn(&S::Item) -> bool + 'a) -> Parser<'a, G, S, S::Item>
where
    G: Grammar<'a, S>,
    S: Source + 'a,
    S::Item: Clone + 'a,
{
    Parser::from_fn(move |table: &crate::table::TailTable<'a, G, S>, position| match table.suffix(position).split_first() {
        Some((item, _)) if pred(&item) => ResultList::from_success(1, position + 1, item),
        _ => ResultList::from_failure(Failure::labeled(table.remaining(position), "satisfy")),
    })
}

/// Consume any one prime element.
#[must_use]
pub fn any_token<'a, G, S>() -> Parser<'a, G, S, S::Item>
where
    G: Grammar<'a, S>,
    S: Source + 'a,
    S::Item: Clone + 'a,
{
    Parser::from_fn(|table: &crate::table::TailTable<'a, G, S>, position| match table.suffix(position).split_first() {
        Some((item, _)) => ResultList::from_success(1, position + 1, item),
        None => ResultList::from_failure(Failure::labeled(table.remaining(position), "any token")),
    })
}

/// Succeed without consuming anything when the next prime element does
/// not satisfy `pred` (or the input is empty).
#[must_use]
pub fn not_satisfy<'a, G, S>(pred: impl Fn(&S::Item) -> bool + 'a) -> Parser<'a, G, S, ()>
where
    G: Grammar<'a, S>,
    S: Source + 'a,
    S::Item: Clone + 'a,
{
    Parser::from_fn(move |table: &crate::table::TailTable<'a, G, S>, position| match table.suffix(position).split_first() {
        Some((item, _)) if pred(&item) => ResultList::from_failure(Failure::labeled(
            table.remaining(position),
            "not satisfy",
        )),
        _ => ResultList::pure(position, ()),
    })
}

/// Consume exactly the given sequence, producing it.
///
/// The expectation label is the sequence's `Debug` rendering, so a failed
/// `literal("+")` reports `expected "+"`.
#[must_use]
pub fn literal<'a, G, S>(expected: S) -> Parser<'a, G, S, S>
where
    G: Grammar<'a, S>,
    S: Source + Debug + 'a,
{
    let label = compact_str::format_compact!("{expected:?}");
    Parser::from_fn(move |table: &crate::table::TailTable<'a, G, S>, position| {
        match table.suffix(position).strip_prefix_of(expected) {
            Some((_, consumed)) => ResultList::from_success(consumed, position + consumed, expected),
            None => ResultList::from_failure(Failure::labeled(
                table.remaining(position),
                label.clone(),
            )),
        }
    })
}

/// Consume the longest (possibly empty) prefix satisfying `pred`,
/// producing it. Never fails.
#[must_use]
pub fn take_while<'a, G, S>(pred: impl Fn(&S::Item) -> bool + 'a) -> Parser<'a, G, S, S>
where
    G: Grammar<'a, S>,
    S: Source + 'a,
{
    Parser::from_fn(move |table: &crate::table::TailTable<'a, G, S>, position| {
        let (prefix, _, consumed) = table.suffix(position).take_while_prefix(&pred);
        ResultList::from_success(consumed, position + consumed, prefix)
    })
}

/// Consume the longest non-empty prefix satisfying `pred`, producing it.
#[must_use]
pub fn take_while1<'a, G, S>(pred: impl Fn(&S::Item) -> bool + 'a) -> Parser<'a, G, S, S>
where
    G: Grammar<'a, S>,
    S: Source + 'a,
{
    Parser::from_fn(move |table: &crate::table::TailTable<'a, G, S>, position| {
        let (prefix, _, consumed) = table.suffix(position).take_while_prefix(&pred);
        if consumed == 0 {
            ResultList::from_failure(Failure::labeled(table.remaining(position), "take while"))
        } else {
            ResultList::from_success(consumed, position + consumed, prefix)
        }
    })
}

/// Consume the longest prefix a state machine accepts: `step` folds the
/// running state over each element and `None` stops the scan. Produces
/// the scanned prefix; never fails.
#[must_use]
pub fn scan<'a, G, S, St>(
    init: St,
    step: impl Fn(&St, &S::Item) -> Option<St> + 'a,
) -> Parser<'a, G, S, S>
where
    G: Grammar<'a, S>,
    S: Source + 'a,
    St: Clone + 'a,
{
    Parser::from_fn(move |table: &crate::table::TailTable<'a, G, S>, position| {
        let suffix = table.suffix(position);
        let mut state = init.clone();
        let mut consumed = 0;
        let mut rest = suffix;
        while let Some((item, next)) = rest.split_first() {
            match step(&state, &item) {
                Some(updated) => {
                    state = updated;
                    consumed += 1;
                    rest = next;
                }
                None => break,
            }
        }
        let (prefix, _) = suffix.split_at(consumed);
        ResultList::from_success(consumed, position + consumed, prefix)
    })
}
