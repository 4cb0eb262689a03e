//! # PEG Adapters
//!
//! A measured PEG parser is the prioritized, backtracking counterpart of
//! a context-free [`Parser`]: it returns at most one parse, measured in
//! prime elements, or a failure. Sub-grammars that want greedy semantics
//! (longest match, ordered choice, no ambiguity) can round-trip through
//! the adapters here:
//!
//! - [`longest`] turns a context-free parser into a PEG parser over
//!   tail-table positions by keeping only its longest success.
//! - [`peg`] embeds such a PEG parser back into the context-free world as
//!   a single-result parser.
//! - [`terminal_peg`] embeds a PEG parser that reads the raw input
//!   sequence instead of the tail table, the shape token-level PEG
//!   parsers naturally have.

use std::marker::PhantomData;

use crate::bundle::Grammar;
use crate::input::Source;
use crate::parser::Parser;
use crate::result::{Failure, ResultList};
use crate::table::TailTable;

/// The outcome of a measured PEG parser: one parse or none.
#[derive(Debug, Clone)]
pub enum PegResult<I, R> {
    Parsed {
        consumed: usize,
        value: R,
        remaining: I,
    },
    NoParse(Failure),
}

/// A prioritized backtracking parser over input `I`, measuring what it
/// consumes in prime elements.
pub trait PegParser<I, R> {
    fn run_peg(&self, input: I) -> PegResult<I, R>;
}

/// A tail-table position: the input type of PEG parsers bridged from the
/// context-free world.
pub struct TableView<'t, 'a, G, S>
where
    G: Grammar<'a, S>,
    S: Source + 'a,
{
    table: &'t TailTable<'a, G, S>,
    position: usize,
}

impl<'t, 'a, G, S> Clone for TableView<'t, 'a, G, S>
where
    G: Grammar<'a, S>,
    S: Source + 'a,
{
    fn clone(&self) -> Self {
        *self
    }
}

impl<'t, 'a, G, S> Copy for TableView<'t, 'a, G, S>
where
    G: Grammar<'a, S>,
    S: Source + 'a,
{
}

impl<'t, 'a, G, S> TableView<'t, 'a, G, S>
where
    G: Grammar<'a, S>,
    S: Source + 'a,
{
    #[must_use]
    pub fn new(table: &'t TailTable<'a, G, S>, position: usize) -> Self {
        Self { table, position }
    }

    /// The suffix at this position.
    #[must_use]
    pub fn suffix(&self) -> S {
        self.table.suffix(self.position)
    }

    /// Remaining input length in prime elements.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.table.remaining(self.position)
    }

    /// The view `count` prime elements further along.
    #[must_use]
    pub fn advance(self, count: usize) -> Self {
        Self {
            table: self.table,
            position: self.position + count,
        }
    }
}

/// A context-free parser committed to its longest success.
///
/// Created by [`longest`]; ties between equal-length successes go to the
/// first in engine order.
pub struct Longest<'a, G, S, R>
where
    G: Grammar<'a, S>,
    S: Source + 'a,
    R: 'a,
{
    parser: Parser<'a, G, S, R>,
}

/// Commit a context-free parser to its longest success, yielding a PEG
/// parser over tail-table positions.
#[must_use]
pub fn longest<'a, G, S, R>(parser: Parser<'a, G, S, R>) -> Longest<'a, G, S, R>
where
    G: Grammar<'a, S>,
    S: Source + 'a,
    R: 'a,
{
    Longest { parser }
}

impl<'t, 'a, G, S, R> PegParser<TableView<'t, 'a, G, S>, R> for Longest<'a, G, S, R>
where
    G: Grammar<'a, S>,
    S: Source + 'a,
    R: 'a,
{
    fn run_peg(&self, input: TableView<'t, 'a, G, S>) -> PegResult<TableView<'t, 'a, G, S>, R> {
        let (successes, failure) = self
            .parser
            .evaluate(input.table, input.position)
            .into_parts();
        let mut best = None;
        for info in successes {
            if best.as_ref().is_none_or(|b: &crate::result::ResultInfo<R>| info.consumed > b.consumed) {
                best = Some(info);
            }
        }
        match best {
            Some(info) => PegResult::Parsed {
                consumed: info.consumed,
                value: info.value,
                remaining: input.advance(info.consumed),
            },
            None => PegResult::NoParse(failure.unwrap_or_else(|| Failure::empty(input.remaining()))),
        }
    }
}

/// Embed a PEG parser over tail-table positions into the context-free
/// world: its single parse becomes a single-success result list, its
/// failure passes through.
#[must_use]
pub fn peg<'a, G, S, R, Q>(parser: Q) -> Parser<'a, G, S, R>
where
    G: Grammar<'a, S>,
    S: Source + 'a,
    R: 'a,
    Q: for<'t> PegParser<TableView<'t, 'a, G, S>, R> + 'a,
{
    Parser::from_fn(move |table, position| {
        match parser.run_peg(TableView::new(table, position)) {
            PegResult::Parsed {
                consumed,
                value,
                remaining,
            } => ResultList::from_success(consumed, remaining.position, value),
            PegResult::NoParse(failure) => ResultList::from_failure(failure),
        }
    })
}

/// Embed a PEG parser over the raw input sequence: it reads the suffix at
/// the current position and its measured consumption advances the table
/// index.
#[must_use]
pub fn terminal_peg<'a, G, S, R, Q>(parser: Q) -> Parser<'a, G, S, R>
where
    G: Grammar<'a, S>,
    S: Source + 'a,
    R: 'a,
    Q: PegParser<S, R> + 'a,
{
    Parser::from_fn(move |table, position| match parser.run_peg(table.suffix(position)) {
        PegResult::Parsed {
            consumed, value, ..
        } => {
            debug_assert!(position + consumed < table.len());
            ResultList::from_success(consumed, position + consumed, value)
        }
        PegResult::NoParse(failure) => ResultList::from_failure(failure),
    })
}

/// Build a terminal PEG parser from a function on the raw input.
pub struct PegFn<F, I>(F, PhantomData<I>);

impl<I, R, F> PegParser<I, R> for PegFn<F, I>
where
    F: Fn(I) -> PegResult<I, R>,
{
    fn run_peg(&self, input: I) -> PegResult<I, R> {
        (self.0)(input)
    }
}

/// Wrap a plain function as a [`PegParser`].
#[must_use]
pub fn peg_fn<I, R, F>(f: F) -> PegFn<F, I>
where
    F: Fn(I) -> PegResult<I, R>,
{
    PegFn(f, PhantomData)
}
