//! # The Tail Table
//!
//! A parse materializes one [`TailTable`]: an arena holding, for every
//! position of the input, the suffix starting there and a memo bundle with
//! one [`MemoCell`] per non-terminal. An input of `n` prime elements
//! yields `n + 1` entries; entry `n` holds the empty suffix. A "tail
//! list" in combinator terms is the pair of a table reference and an entry
//! index, and dropping `l` elements of input is adding `l` to the index.
//!
//! Cells start out inert. The first lookup of a non-terminal at a
//! position runs that non-terminal's parser there and stores the result;
//! every later lookup, from any other non-terminal at any stage of the
//! parse, returns the stored result. This is what makes the engine
//! packrat: each (non-terminal, position) pair is parsed at most once.
//!
//! A lookup that reenters a cell still being computed has found left
//! recursion (the grammar asks for a non-terminal at the position where
//! that same non-terminal is already being expanded). The cell reports a
//! labeled failure instead of recursing forever; left-recursive grammars
//! need a seeding fixed-point engine, which this crate does not provide.
//!
//! The table owns every memoized result. Results refer to continuation
//! positions by index, so nothing borrows into the table and the whole
//! parse is freed in one step when the table is dropped.

use std::cell::RefCell;

use crate::bundle::{CellShape, Field, Fold, Grammar, ParserShape, ResultsShape, Transform};
use crate::parser::Parser;
use crate::result::{Failure, ResultList};
use crate::input::Source;

/// Label reported when a non-terminal lookup reenters its own cell.
pub const LEFT_RECURSION: &str = "recursive non-terminal";

/// Label reported when a non-terminal is looked up past the table end.
pub const NON_TERMINAL_AT_END: &str = "non-terminal at end of input";

enum CellState<R> {
    Fresh,
    Running,
    Done(ResultList<R>),
}

/// A write-once memo slot for one non-terminal at one input position.
pub struct MemoCell<'a, G, S, R>
where
    G: Grammar<'a, S>,
    S: Source + 'a,
    R: Clone + 'a,
{
    parser: Parser<'a, G, S, R>,
    state: RefCell<CellState<R>>,
}

impl<'a, G, S, R> MemoCell<'a, G, S, R>
where
    G: Grammar<'a, S>,
    S: Source + 'a,
    R: Clone + 'a,
{
    fn new(parser: Parser<'a, G, S, R>) -> Self {
        Self {
            parser,
            state: RefCell::new(CellState::Fresh),
        }
    }

    /// Whether this cell has been evaluated.
    #[must_use]
    pub fn is_forced(&self) -> bool {
        matches!(&*self.state.borrow(), CellState::Done(_))
    }

    /// The memoized result, evaluating the parser on first demand.
    pub fn force(&self, table: &TailTable<'a, G, S>, position: usize) -> ResultList<R> {
        match &*self.state.borrow() {
            CellState::Done(result) => return result.clone(),
            CellState::Running => {
                return ResultList::from_failure(Failure::labeled(
                    table.remaining(position),
                    LEFT_RECURSION,
                ));
            }
            CellState::Fresh => {}
        }
        *self.state.borrow_mut() = CellState::Running;
        let result = self.parser.evaluate(table, position);
        *self.state.borrow_mut() = CellState::Done(result.clone());
        result
    }
}

struct TailEntry<'a, G, S>
where
    G: Grammar<'a, S>,
    S: Source + 'a,
{
    suffix: S,
    memo: G::Fields<CellShape<G, S>>,
}

/// The per-parse arena of suffixes and memo bundles.
pub struct TailTable<'a, G, S>
where
    G: Grammar<'a, S>,
    S: Source + 'a,
{
    entries: Vec<TailEntry<'a, G, S>>,
}

struct ToCells;

impl<'a, G, S> Transform<'a, ParserShape<G, S>, CellShape<G, S>> for ToCells
where
    G: Grammar<'a, S>,
    S: Source + 'a,
{
    fn transform<R: Clone + 'a>(&mut self, parser: &Parser<'a, G, S, R>) -> MemoCell<'a, G, S, R> {
        MemoCell::new(parser.clone())
    }
}

struct ToResults<'t, 'a, G, S>
where
    G: Grammar<'a, S>,
    S: Source + 'a,
{
    table: &'t TailTable<'a, G, S>,
    position: usize,
}

impl<'t, 'a, G, S> Transform<'a, CellShape<G, S>, ResultsShape> for ToResults<'t, 'a, G, S>
where
    G: Grammar<'a, S>,
    S: Source + 'a,
{
    fn transform<R: Clone + 'a>(&mut self, cell: &MemoCell<'a, G, S, R>) -> ResultList<R> {
        cell.force(self.table, self.position)
    }
}

struct CountForced;

impl<'a, G, S> Fold<'a, CellShape<G, S>, usize> for CountForced
where
    G: Grammar<'a, S>,
    S: Source + 'a,
{
    fn fold<R: Clone + 'a>(&mut self, acc: usize, cell: &MemoCell<'a, G, S, R>) -> usize {
        acc + usize::from(cell.is_forced())
    }
}

impl<'a, G, S> TailTable<'a, G, S>
where
    G: Grammar<'a, S>,
    S: Source + 'a,
{
    /// Build the table for `input`: one entry per suffix, every cell
    /// inert. Cells hold their own clone of the grammar's parser, so the
    /// table stands alone once built.
    pub fn build(grammar: &G::Fields<ParserShape<G, S>>, input: S) -> Self {
        let entries = input
            .tails()
            .into_iter()
            .map(|suffix| TailEntry {
                suffix,
                memo: G::map_fields(grammar, &mut ToCells),
            })
            .collect();
        Self { entries }
    }

    /// Number of entries: input length in prime elements plus one.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// A built table is never empty: even empty input has its one entry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The input suffix starting at `position`.
    ///
    /// # Panics
    ///
    /// Panics if `position` is out of range; parser continuations never
    /// point past the final (empty) entry.
    #[must_use]
    pub fn suffix(&self, position: usize) -> S {
        self.entries[position].suffix
    }

    /// Remaining input length at `position`, in prime elements. This is
    /// the failure-position measure: smaller is further along.
    #[must_use]
    pub fn remaining(&self, position: usize) -> usize {
        self.entries.len() - 1 - position
    }

    /// The memoized result list of non-terminal `N` at `position`,
    /// computing it on first demand.
    pub fn lookup<N>(&self, position: usize) -> ResultList<N::Output>
    where
        N: Field<'a, S, Grammar = G>,
    {
        let Some(entry) = self.entries.get(position) else {
            return ResultList::from_failure(Failure::labeled(0, NON_TERMINAL_AT_END));
        };
        N::select::<CellShape<G, S>>(&entry.memo).force(self, position)
    }

    /// The memo bundle at `position`.
    #[must_use]
    pub fn memo(&self, position: usize) -> &G::Fields<CellShape<G, S>> {
        &self.entries[position].memo
    }

    /// The fully-computed result-list bundle at `position`: every
    /// non-terminal's results starting at that suffix, forcing any cell
    /// not yet evaluated.
    ///
    /// # Panics
    ///
    /// Panics if `position` is out of range.
    #[must_use]
    pub fn results(&self, position: usize) -> G::Fields<ResultsShape> {
        let mut extract = ToResults {
            table: self,
            position,
        };
        G::map_fields(self.memo(position), &mut extract)
    }

    /// How many (non-terminal, position) cells have been evaluated so
    /// far. Diagnostic; also what the memoization tests assert against.
    #[must_use]
    pub fn forced_cells(&self) -> usize {
        self.entries
            .iter()
            .fold(0, |acc, entry| G::fold_fields(&entry.memo, acc, &mut CountForced))
    }
}
