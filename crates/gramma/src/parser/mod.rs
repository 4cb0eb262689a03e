//! # Parser Values and Combinators
//!
//! A [`Parser`] denotes a pure function from a tail-table position to a
//! [`ResultList`]: every way the parser can succeed from that position,
//! plus the furthest failure encountered while finding them. Combinators
//! compose these functions; none of them consult mutable state, and all
//! sharing happens through the table's memo cells.
//!
//! ## Choice
//!
//! [`or`](Parser::or) is *unbiased*: both alternatives run and both
//! result sets are kept, which is what lets ambiguous grammars report
//! every parse. [`or_biased`](Parser::or_biased) is the committed
//! variant: the right alternative is not evaluated when the left yields
//! any success.
//!
//! ## Failure bookkeeping
//!
//! Failures travel *inside* result lists and merge toward the furthest
//! position. [`attempt`](Parser::attempt) hides an alternative's internal
//! failure depth; [`expected`](Parser::expected) renames what a
//! non-consuming failure was looking for. See [`crate::result`] for the
//! merge rules.
//!
//! ## Usage
//!
//! ```rust
//! use gramma::bundle::{Field, Fold, Grammar, Shape, Transform, TryTransform};
//! use gramma::parser::{literal, non_terminal, Parser};
//! use gramma::engine::parse_complete;
//!
//! // A single-non-terminal grammar: nested = '(' nested ')' | ""
//! struct Nested;
//!
//! struct NestedFields<'a, F: Shape<'a>> {
//!     depth: F::Of<usize>,
//! }
//!
//! impl<'a> Grammar<'a, &'a str> for Nested {
//!     type Fields<F: Shape<'a>> = NestedFields<'a, F>;
//!
//!     fn map_fields<A: Shape<'a>, B: Shape<'a>>(
//!         fields: &NestedFields<'a, A>,
//!         op: &mut impl Transform<'a, A, B>,
//!     ) -> NestedFields<'a, B> {
//!         NestedFields { depth: op.transform(&fields.depth) }
//!     }
//!
//!     fn fold_fields<F: Shape<'a>, M>(
//!         fields: &NestedFields<'a, F>,
//!         init: M,
//!         op: &mut impl Fold<'a, F, M>,
//!     ) -> M {
//!         op.fold(init, &fields.depth)
//!     }
//!
//!     fn try_map_fields<A: Shape<'a>, B: Shape<'a>, T: TryTransform<'a, A, B>>(
//!         fields: &NestedFields<'a, A>,
//!         op: &mut T,
//!     ) -> Result<NestedFields<'a, B>, T::Error> {
//!         Ok(NestedFields { depth: op.try_transform(&fields.depth)? })
//!     }
//! }
//!
//! struct Depth;
//!
//! impl<'a> Field<'a, &'a str> for Depth {
//!     type Grammar = Nested;
//!     type Output = usize;
//!
//!     fn select<F: Shape<'a>>(fields: &NestedFields<'a, F>) -> &F::Of<usize> {
//!         &fields.depth
//!     }
//! }
//!
//! let grammar = NestedFields {
//!     depth: literal("(")
//!         .skip_then(non_terminal::<Depth, _>())
//!         .then_skip(literal(")"))
//!         .map(|d| d + 1)
//!         .or(Parser::pure(0)),
//! };
//!
//! let outcome = parse_complete::<Nested, _>(&grammar, "((()))");
//! assert_eq!(outcome.depth.unwrap(), vec![("", 3)]);
//! ```

mod token;

pub use token::{any_token, literal, not_satisfy, satisfy, scan, take_while, take_while1};

use std::collections::VecDeque;
use std::rc::Rc;

use compact_str::CompactString;

use crate::bundle::{Field, Grammar};
use crate::input::Source;
use crate::result::{Ambiguous, Failure, ResultInfo, ResultList};
use crate::table::TailTable;

/// A context-free parser for grammar `G` over input `S`, producing `R`.
///
/// Internally a reference-counted closure over the tail table; cloning is
/// cheap and shares the closure.
pub struct Parser<'a, G, S, R>
where
    G: Grammar<'a, S>,
    S: Source + 'a,
    R: 'a,
{
    run: Rc<dyn Fn(&TailTable<'a, G, S>, usize) -> ResultList<R> + 'a>,
}

impl<'a, G, S, R> Clone for Parser<'a, G, S, R>
where
    G: Grammar<'a, S>,
    S: Source + 'a,
    R: 'a,
{
    fn clone(&self) -> Self {
        Self {
            run: Rc::clone(&self.run),
        }
    }
}

impl<'a, G, S, R> Parser<'a, G, S, R>
where
    G: Grammar<'a, S>,
    S: Source + 'a,
    R: 'a,
{
    /// Wrap a raw table-position function as a parser.
    pub fn from_fn(f: impl Fn(&TailTable<'a, G, S>, usize) -> ResultList<R> + 'a) -> Self {
        Self { run: Rc::new(f) }
    }

    /// Run this parser at a table position.
    ///
    /// Intended for adapters and tests; grammar authors go through
    /// [`parse_prefix`](crate::engine::parse_prefix) and
    /// [`parse_complete`](crate::engine::parse_complete).
    pub fn evaluate(&self, table: &TailTable<'a, G, S>, position: usize) -> ResultList<R> {
        (self.run)(table, position)
    }

    /// Succeed without consuming input, producing `value`.
    #[must_use]
    pub fn pure(value: R) -> Self
    where
        R: Clone,
    {
        Self::from_fn(move |_, position| ResultList::pure(position, value.clone()))
    }

    /// Fail without an expectation description.
    #[must_use]
    pub fn empty() -> Self {
        Self::from_fn(|table, position| {
            ResultList::from_failure(Failure::empty(table.remaining(position)))
        })
    }

    /// Fail, expecting the described item.
    #[must_use]
    pub fn fail(expected: impl Into<CompactString>) -> Self {
        let expected = expected.into();
        Self::from_fn(move |table, position| {
            ResultList::from_failure(Failure::labeled(
                table.remaining(position),
                expected.clone(),
            ))
        })
    }

    /// Fail because the described item was encountered.
    #[must_use]
    pub fn unexpected(description: impl Into<CompactString>) -> Self {
        Self::fail(description)
    }

    /// Apply `f` to every success value.
    #[must_use]
    pub fn map<U: 'a>(self, f: impl Fn(R) -> U + 'a) -> Parser<'a, G, S, U> {
        Parser::from_fn(move |table, position| self.evaluate(table, position).map(&f))
    }

    /// Run `self`, then `next` from each of its continuations, pairing the
    /// values. Consumed lengths add; failures from both sides merge.
    #[must_use]
    pub fn then<U: Clone + 'a>(self, next: Parser<'a, G, S, U>) -> Parser<'a, G, S, (R, U)>
    where
        R: Clone,
    {
        self.and_then_impl(move |value, table, position| {
            next.evaluate(table, position)
                .map(&|u| (value.clone(), u))
        })
    }

    /// Sequence, keeping only the left value.
    #[must_use]
    pub fn then_skip<U: Clone + 'a>(self, next: Parser<'a, G, S, U>) -> Self
    where
        R: Clone,
    {
        self.then(next).map(|(r, _)| r)
    }

    /// Sequence, keeping only the right value.
    #[must_use]
    pub fn skip_then<U: Clone + 'a>(self, next: Parser<'a, G, S, U>) -> Parser<'a, G, S, U>
    where
        R: Clone,
    {
        self.then(next).map(|(_, u)| u)
    }

    /// Monadic sequencing: the continuation parser is chosen from each
    /// success value.
    #[must_use]
    pub fn and_then<U: Clone + 'a>(
        self,
        k: impl Fn(R) -> Parser<'a, G, S, U> + 'a,
    ) -> Parser<'a, G, S, U>
    where
        R: Clone,
    {
        self.and_then_impl(move |value, table, position| k(value).evaluate(table, position))
    }

    fn and_then_impl<U: Clone + 'a>(
        self,
        k: impl Fn(R, &TailTable<'a, G, S>, usize) -> ResultList<U> + 'a,
    ) -> Parser<'a, G, S, U>
    where
        R: Clone,
    {
        Parser::from_fn(move |table, position| {
            let (successes, failure) = self.evaluate(table, position).into_parts();
            let mut acc = ResultList::with_failure(failure);
            for info in successes {
                let continued = k(info.value, table, info.rest).map_results(&mut |second| {
                    ResultInfo {
                        consumed: info.consumed + second.consumed,
                        rest: second.rest,
                        value: second.value,
                    }
                });
                acc = acc.merge(continued);
            }
            acc
        })
    }

    /// Unbiased choice: both alternatives run, both result sets are kept,
    /// in left-then-right order. Ambiguity is preserved.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        Self::from_fn(move |table, position| {
            self.evaluate(table, position)
                .merge(other.evaluate(table, position))
        })
    }

    /// Biased choice: the right alternative is consulted only when the
    /// left yields no success at all. When it is consulted, the left's
    /// failure record still contributes to diagnostics.
    #[must_use]
    pub fn or_biased(self, other: Self) -> Self {
        Self::from_fn(move |table, position| {
            let first = self.evaluate(table, position);
            if first.has_successes() {
                first
            } else {
                first.merge(other.evaluate(table, position))
            }
        })
    }

    /// Treat this parser as a single atom for diagnostics: on failure,
    /// the failure is reported at the entry position with no labels,
    /// hiding how deep the attempt got. Successes are untouched.
    #[must_use]
    pub fn attempt(self) -> Self {
        Self::from_fn(move |table, position| {
            self.evaluate(table, position)
                .rewind_failure(table.remaining(position))
        })
    }

    /// Name what this parser was looking for. Replaces the expectation
    /// labels when the parser failed without consuming input; failures
    /// that made progress keep their own, more precise labels.
    #[must_use]
    pub fn expected(self, label: impl Into<CompactString>) -> Self {
        let label = label.into();
        Self::from_fn(move |table, position| {
            self.evaluate(table, position)
                .relabel(table.remaining(position), label.clone())
        })
    }
}

/// Succeed only at end of input, consuming nothing.
#[must_use]
pub fn eof<'a, G, S>() -> Parser<'a, G, S, ()>
where
    G: Grammar<'a, S>,
    S: Source + 'a,
{
    Parser::from_fn(|table: &TailTable<'a, G, S>, position| {
        if table.suffix(position).is_empty() {
            ResultList::pure(position, ())
        } else {
            ResultList::from_failure(Failure::labeled(table.remaining(position), "end of input"))
        }
    })
}

/// Reference a non-terminal of the grammar bundle.
///
/// The result list comes straight from the memo cell of `N` at the
/// current position: the non-terminal's body runs at most once there, no
/// matter how many references resolve through it.
#[must_use]
pub fn non_terminal<'a, N, S>() -> Parser<'a, N::Grammar, S, N::Output>
where
    S: Source + 'a,
    N: Field<'a, S> + 'a,
{
    Parser::from_fn(|table, position| table.lookup::<N>(position))
}

/// Succeed (with `()`, consuming nothing) exactly when `parser` has no
/// success at the current position.
#[must_use]
pub fn not_followed_by<'a, G, S, R>(parser: Parser<'a, G, S, R>) -> Parser<'a, G, S, ()>
where
    G: Grammar<'a, S>,
    S: Source + 'a,
    R: 'a,
{
    Parser::from_fn(move |table, position| {
        if parser.evaluate(table, position).has_successes() {
            ResultList::from_failure(Failure::labeled(
                table.remaining(position),
                "not followed by",
            ))
        } else {
            ResultList::pure(position, ())
        }
    })
}

/// Run `parser` without consuming input: every success is collapsed to
/// zero length at the current position (ambiguous results stay distinct);
/// failures propagate unchanged.
#[must_use]
pub fn look_ahead<'a, G, S, R>(parser: Parser<'a, G, S, R>) -> Parser<'a, G, S, R>
where
    G: Grammar<'a, S>,
    S: Source + 'a,
    R: 'a,
{
    Parser::from_fn(move |table, position| {
        let result = parser.evaluate(table, position);
        if !result.has_successes() {
            return result;
        }
        result.map_results(&mut |info| ResultInfo {
            consumed: 0,
            rest: position,
            value: info.value,
        })
    })
}

/// Zero or more repetitions of `parser`, discarding values.
///
/// Unbiased: there is one success per reachable repetition count, so
/// `skip_many(p)` composed with a suffix parser considers every split.
/// Each continuation position is reported once; an inner parser that
/// succeeds without consuming input contributes no further repetitions
/// from the same position.
#[must_use]
pub fn skip_many<'a, G, S, R>(parser: Parser<'a, G, S, R>) -> Parser<'a, G, S, ()>
where
    G: Grammar<'a, S>,
    S: Source + 'a,
    R: 'a,
{
    Parser::from_fn(move |table, position| {
        let mut seen = hashbrown::HashSet::with_hasher(ahash::RandomState::new());
        seen.insert(position);
        let mut frontier = VecDeque::from([position]);
        let mut acc = ResultList::pure(position, ());
        while let Some(at) = frontier.pop_front() {
            let (successes, failure) = parser.evaluate(table, at).into_parts();
            acc.absorb_failure(failure);
            for info in successes {
                if seen.insert(info.rest) {
                    acc = acc.merge(ResultList::from_success(info.rest - position, info.rest, ()));
                    frontier.push_back(info.rest);
                }
            }
        }
        acc
    })
}

/// Zero or more repetitions of `parser`, collecting values in order.
///
/// An inner success that consumes nothing would repeat forever and is not
/// iterated: it contributes through the zero-repetition result only.
#[must_use]
pub fn many<'a, G, S, R>(parser: Parser<'a, G, S, R>) -> Parser<'a, G, S, Vec<R>>
where
    G: Grammar<'a, S>,
    S: Source + 'a,
    R: Clone + 'a,
{
    Parser::from_fn(move |table, position| {
        let mut memo = hashbrown::HashMap::with_hasher(ahash::RandomState::new());
        repetitions(&parser, table, position, position, &mut memo)
    })
}

/// One or more repetitions of `parser`, collecting values in order.
#[must_use]
pub fn some<'a, G, S, R>(parser: Parser<'a, G, S, R>) -> Parser<'a, G, S, Vec<R>>
where
    G: Grammar<'a, S>,
    S: Source + 'a,
    R: Clone + 'a,
{
    parser.clone().then(many(parser)).map(|(first, mut rest)| {
        rest.insert(0, first);
        rest
    })
}

/// All repetition results from `at`, memoized per position: the result at
/// a position does not depend on how the engine got there.
fn repetitions<'a, G, S, R>(
    parser: &Parser<'a, G, S, R>,
    table: &TailTable<'a, G, S>,
    start: usize,
    at: usize,
    memo: &mut hashbrown::HashMap<usize, ResultList<Vec<R>>, ahash::RandomState>,
) -> ResultList<Vec<R>>
where
    G: Grammar<'a, S>,
    S: Source + 'a,
    R: Clone + 'a,
{
    if let Some(cached) = memo.get(&at) {
        return cached.clone();
    }
    let mut acc = ResultList::from_success(at - start, at, Vec::new());
    let (successes, failure) = parser.evaluate(table, at).into_parts();
    acc.absorb_failure(failure);
    for info in successes {
        if info.consumed == 0 {
            continue;
        }
        let tail = repetitions(parser, table, start, info.rest, memo);
        let extended = tail.map_results(&mut |mut rest_info: ResultInfo<Vec<R>>| {
            rest_info.value.insert(0, info.value.clone());
            rest_info
        });
        acc = acc.merge(extended);
    }
    memo.insert(at, acc.clone());
    acc
}

/// Surface ambiguity as data: all values parsed at one consumed length
/// collapse into a single [`Ambiguous`] success at that length.
#[must_use]
pub fn ambiguous<'a, G, S, R>(parser: Parser<'a, G, S, R>) -> Parser<'a, G, S, Ambiguous<R>>
where
    G: Grammar<'a, S>,
    S: Source + 'a,
    R: 'a,
{
    Parser::from_fn(move |table, position| {
        let (groups, failure) = parser.evaluate(table, position).into_groups();
        let mut acc = ResultList::with_failure(failure);
        for group in groups {
            acc = acc.merge(ResultList::from_success(
                group.consumed,
                group.rest,
                Ambiguous(group.values),
            ));
        }
        acc
    })
}
