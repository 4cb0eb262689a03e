//! # Grammar Bundles
//!
//! A grammar is a heterogeneous bundle of named non-terminals: a
//! user-defined struct with one field per non-terminal, where each field's
//! type is determined by the field's own result type under a shared
//! wrapper. The same struct shape is used with fields holding parsers
//! (the grammar as written), memo cells (the grammar mid-parse), or parse
//! outcomes (the grammar's answers).
//!
//! ## Encoding
//!
//! Rust has no higher-kinded types, so the wrapper is abstracted as a
//! [`Shape`]: a type-level function from a result type `R` to the field
//! type `Of<R>`. The bundle itself implements [`Grammar`], whose
//! `Fields<F>` associated type is the field struct generic over the
//! shape, and whose three operations ([`map_fields`], [`fold_fields`],
//! [`try_map_fields`]) apply a caller-supplied polymorphic operation
//! ([`Transform`], [`Fold`], [`TryTransform`]) to every field uniformly.
//!
//! Implementations are hand-written per bundle and entirely mechanical:
//!
//! ```rust
//! use gramma::bundle::{Field, Fold, Grammar, Shape, Transform, TryTransform};
//!
//! struct Pair;
//!
//! struct PairFields<'a, F: Shape<'a>> {
//!     left: F::Of<char>,
//!     right: F::Of<u32>,
//! }
//!
//! impl<'a> Grammar<'a, &'a str> for Pair {
//!     type Fields<F: Shape<'a>> = PairFields<'a, F>;
//!
//!     fn map_fields<A: Shape<'a>, B: Shape<'a>>(
//!         fields: &PairFields<'a, A>,
//!         op: &mut impl Transform<'a, A, B>,
//!     ) -> PairFields<'a, B> {
//!         PairFields {
//!             left: op.transform(&fields.left),
//!             right: op.transform(&fields.right),
//!         }
//!     }
//!
//!     fn fold_fields<F: Shape<'a>, M>(
//!         fields: &PairFields<'a, F>,
//!         init: M,
//!         op: &mut impl Fold<'a, F, M>,
//!     ) -> M {
//!         let acc = op.fold(init, &fields.left);
//!         op.fold(acc, &fields.right)
//!     }
//!
//!     fn try_map_fields<A: Shape<'a>, B: Shape<'a>, T: TryTransform<'a, A, B>>(
//!         fields: &PairFields<'a, A>,
//!         op: &mut T,
//!     ) -> Result<PairFields<'a, B>, T::Error> {
//!         Ok(PairFields {
//!             left: op.try_transform(&fields.left)?,
//!             right: op.try_transform(&fields.right)?,
//!         })
//!     }
//! }
//!
//! struct LeftNt;
//!
//! impl<'a> Field<'a, &'a str> for LeftNt {
//!     type Grammar = Pair;
//!     type Output = char;
//!
//!     fn select<F: Shape<'a>>(fields: &PairFields<'a, F>) -> &F::Of<char> {
//!         &fields.left
//!     }
//! }
//! ```
//!
//! [`map_fields`]: Grammar::map_fields
//! [`fold_fields`]: Grammar::fold_fields
//! [`try_map_fields`]: Grammar::try_map_fields

use std::marker::PhantomData;

use crate::engine::ParseOutcome;
use crate::input::Source;
use crate::parser::Parser;
use crate::result::ResultList;
use crate::table::MemoCell;

/// A type constructor over result types: the field wrapper of a bundle.
pub trait Shape<'a> {
    type Of<R: Clone + 'a>: 'a;
}

/// A polymorphic field operation: `∀R. A::Of<R> → B::Of<R>`.
pub trait Transform<'a, A: Shape<'a>, B: Shape<'a>> {
    fn transform<R: Clone + 'a>(&mut self, field: &A::Of<R>) -> B::Of<R>;
}

/// A polymorphic field accumulation: `∀R. (M, F::Of<R>) → M`.
pub trait Fold<'a, F: Shape<'a>, M> {
    fn fold<R: Clone + 'a>(&mut self, acc: M, field: &F::Of<R>) -> M;
}

/// A polymorphic fallible field operation: `∀R. A::Of<R> → Result<B::Of<R>, E>`.
pub trait TryTransform<'a, A: Shape<'a>, B: Shape<'a>> {
    type Error;

    fn try_transform<R: Clone + 'a>(&mut self, field: &A::Of<R>) -> Result<B::Of<R>, Self::Error>;
}

/// A bundle of mutually recursive non-terminals.
///
/// The implementing type is a marker; the data lives in `Fields<F>`,
/// instantiated at whatever shape the engine needs. Field result types
/// must be `Clone`: memoized results are shared by value across every
/// reference to a non-terminal.
pub trait Grammar<'a, S: Source + 'a>: Sized + 'a {
    /// The field struct, generic over the field wrapper.
    type Fields<F: Shape<'a>>: 'a;

    /// Rebuild the bundle with every field passed through `op`.
    fn map_fields<A: Shape<'a>, B: Shape<'a>>(
        fields: &Self::Fields<A>,
        op: &mut impl Transform<'a, A, B>,
    ) -> Self::Fields<B>;

    /// Fold every field into an accumulator, in field-declaration order.
    fn fold_fields<F: Shape<'a>, M>(
        fields: &Self::Fields<F>,
        init: M,
        op: &mut impl Fold<'a, F, M>,
    ) -> M;

    /// Rebuild the bundle through a fallible operation, stopping at the
    /// first error.
    fn try_map_fields<A: Shape<'a>, B: Shape<'a>, T: TryTransform<'a, A, B>>(
        fields: &Self::Fields<A>,
        op: &mut T,
    ) -> Result<Self::Fields<B>, T::Error>;
}

/// A named non-terminal of a bundle: a zero-sized selector that knows the
/// field's result type and can extract the field at any shape.
pub trait Field<'a, S: Source + 'a> {
    type Grammar: Grammar<'a, S>;
    type Output: Clone + 'a;

    fn select<'b, F: Shape<'a>>(
        fields: &'b <Self::Grammar as Grammar<'a, S>>::Fields<F>,
    ) -> &'b F::Of<Self::Output>;
}

/// Fields are parsers: the shape of a grammar as the user writes it.
pub struct ParserShape<G, S>(PhantomData<(G, S)>);

impl<'a, G, S> Shape<'a> for ParserShape<G, S>
where
    G: Grammar<'a, S>,
    S: Source + 'a,
{
    type Of<R: Clone + 'a> = Parser<'a, G, S, R>;
}

/// Fields are memo cells: the shape of a grammar at one input position.
pub struct CellShape<G, S>(PhantomData<(G, S)>);

impl<'a, G, S> Shape<'a> for CellShape<G, S>
where
    G: Grammar<'a, S>,
    S: Source + 'a,
{
    type Of<R: Clone + 'a> = MemoCell<'a, G, S, R>;
}

/// Fields are raw result lists, as materialized for one tail-table entry
/// by [`TailTable::results`](crate::table::TailTable::results).
pub struct ResultsShape;

impl<'a> Shape<'a> for ResultsShape {
    type Of<R: Clone + 'a> = ResultList<R>;
}

/// Fields are per-non-terminal parse outcomes, as returned by the
/// top-level entry points.
pub struct OutcomeShape<S>(PhantomData<S>);

impl<'a, S: Source + 'a> Shape<'a> for OutcomeShape<S> {
    type Of<R: Clone + 'a> = ParseOutcome<S, R>;
}
