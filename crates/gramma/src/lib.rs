//! # Gramma
//!
//! A packrat parser-combinator engine for context-free grammars written
//! as bundles of mutually recursive non-terminals.
//!
//! ## Overview
//!
//! A grammar is an ordinary struct with one field per non-terminal; each
//! field is a combinator expression that may reference any field of the
//! bundle, including itself. Parsing an input materializes a *tail
//! table* (one memoized result bundle per input position), so every
//! non-terminal is parsed at most once per position, giving O(n²)
//! worst-case work for unambiguous grammars with bounded ambiguity.
//!
//! - **All parses, not one**: choice is unbiased and ambiguous grammars
//!   report every derivation, each paired with its unconsumed suffix
//! - **Furthest-failure diagnostics**: failed parses name the deepest
//!   point reached and everything expected there
//! - **PEG interop**: greedy, single-result sub-grammars embed via the
//!   [`peg`] adapters
//!
//! Left-recursive grammars are out of scope: a reference that reenters
//! its own memo cell is reported as a labeled parse failure rather than
//! looped on.
//!
//! ## Quick Start
//!
//! ```rust
//! use gramma::bundle::{Field, Fold, Grammar, Shape, Transform, TryTransform};
//! use gramma::engine::parse_complete;
//! use gramma::parser::{literal, non_terminal, satisfy, some};
//!
//! // expr = term ('+' term)* ; term = digit+
//! struct Arith;
//!
//! struct ArithFields<'a, F: Shape<'a>> {
//!     expr: F::Of<i64>,
//!     term: F::Of<i64>,
//! }
//!
//! impl<'a> Grammar<'a, &'a str> for Arith {
//!     type Fields<F: Shape<'a>> = ArithFields<'a, F>;
//!
//!     fn map_fields<A: Shape<'a>, B: Shape<'a>>(
//!         fields: &ArithFields<'a, A>,
//!         op: &mut impl Transform<'a, A, B>,
//!     ) -> ArithFields<'a, B> {
//!         ArithFields {
//!             expr: op.transform(&fields.expr),
//!             term: op.transform(&fields.term),
//!         }
//!     }
//!
//!     fn fold_fields<F: Shape<'a>, M>(
//!         fields: &ArithFields<'a, F>,
//!         init: M,
//!         op: &mut impl Fold<'a, F, M>,
//!     ) -> M {
//!         let acc = op.fold(init, &fields.expr);
//!         op.fold(acc, &fields.term)
//!     }
//!
//!     fn try_map_fields<A: Shape<'a>, B: Shape<'a>, T: TryTransform<'a, A, B>>(
//!         fields: &ArithFields<'a, A>,
//!         op: &mut T,
//!     ) -> Result<ArithFields<'a, B>, T::Error> {
//!         Ok(ArithFields {
//!             expr: op.try_transform(&fields.expr)?,
//!             term: op.try_transform(&fields.term)?,
//!         })
//!     }
//! }
//!
//! struct ExprNt;
//! struct TermNt;
//!
//! impl<'a> Field<'a, &'a str> for ExprNt {
//!     type Grammar = Arith;
//!     type Output = i64;
//!     fn select<F: Shape<'a>>(fields: &ArithFields<'a, F>) -> &F::Of<i64> {
//!         &fields.expr
//!     }
//! }
//!
//! impl<'a> Field<'a, &'a str> for TermNt {
//!     type Grammar = Arith;
//!     type Output = i64;
//!     fn select<F: Shape<'a>>(fields: &ArithFields<'a, F>) -> &F::Of<i64> {
//!         &fields.term
//!     }
//! }
//!
//! fn arith<'a>() -> ArithFields<'a, gramma::bundle::ParserShape<Arith, &'a str>> {
//!     let digit = satisfy(|c: &char| c.is_ascii_digit());
//!     ArithFields {
//!         expr: non_terminal::<TermNt, _>()
//!             .then(gramma::parser::many(
//!                 literal("+").skip_then(non_terminal::<TermNt, _>()),
//!             ))
//!             .map(|(head, rest)| head + rest.into_iter().sum::<i64>()),
//!         term: some(digit).map(|digits| {
//!             digits.into_iter().collect::<String>().parse::<i64>().unwrap()
//!         }),
//!     }
//! }
//!
//! let grammar = arith();
//! let outcome = parse_complete::<Arith, _>(&grammar, "1+2+3");
//! assert_eq!(outcome.expr.unwrap(), vec![("", 6)]);
//!
//! let failed = parse_complete::<Arith, _>(&grammar, "1+");
//! assert!(failed.expr.is_err());
//! ```
//!
//! ## Modules
//!
//! - [`bundle`] - Grammar bundles: shapes, field operations, selectors
//! - [`parser`] - Parser values, combinators, token primitives
//! - [`result`] - Result lists and failure records
//! - [`table`] - The per-parse tail table and memo cells
//! - [`engine`] - Top-level entry points and outcome extraction
//! - [`peg`] - Adapters to and from measured PEG parsers
//! - [`input`] - Input sequence abstraction
//! - [`error`] - Public failure type

pub mod bundle;
pub mod engine;
pub mod error;
pub mod input;
pub mod parser;
pub mod peg;
pub mod result;
pub mod table;

// Re-export commonly used types
pub use bundle::{Field, Grammar, Shape};
pub use engine::{parse_complete, parse_prefix, try_parse_complete, ParseOutcome};
pub use error::ParseFailure;
pub use input::Source;
pub use parser::Parser;
pub use result::{Ambiguous, Failure, ResultInfo, ResultList};
pub use table::TailTable;
