//! # Entry Points
//!
//! Driving a parse means building the tail table for the input and
//! reading non-terminal results out of its first entry:
//!
//! - [`parse_prefix`] reports, for every non-terminal, each way it
//!   matches a prefix of the input, paired with the unconsumed suffix.
//! - [`parse_complete`] requires non-terminals to consume the entire
//!   input: each grammar field is closed with an end-of-input check and
//!   re-evaluated against the same table, so only the leading bundle is
//!   recomputed and every memo below position zero is reused as-is.
//! - [`try_parse_complete`] is [`parse_complete`] for callers that treat
//!   any failing non-terminal as failure of the whole parse: it
//!   short-circuits on the first field that cannot consume the input.
//!
//! Failures surface as [`ParseFailure`] values with a 1-based position
//! from the start of the input and a deduplicated list of expectations,
//! gathered from everything that failed at the furthest point reached.

use hashbrown::HashSet;

use crate::bundle::{CellShape, Grammar, OutcomeShape, ParserShape, Transform, TryTransform};
use crate::error::ParseFailure;
use crate::input::Source;
use crate::parser::{eof, Parser};
use crate::result::{Failure, ResultList};
use crate::table::{MemoCell, TailTable};

/// One non-terminal's answer: every `(unconsumed suffix, value)` pair in
/// engine order, or the furthest failure.
pub type ParseOutcome<S, R> = Result<Vec<(S, R)>, ParseFailure>;

/// Parse every non-terminal against a prefix of `input`.
pub fn parse_prefix<'a, G, S>(
    grammar: &G::Fields<ParserShape<G, S>>,
    input: S,
) -> G::Fields<OutcomeShape<S>>
where
    G: Grammar<'a, S>,
    S: Source + 'a,
{
    let table = TailTable::<G, S>::build(grammar, input);
    let mut extract = ExtractPrefix {
        table: &table,
        input,
    };
    G::map_fields(table.memo(0), &mut extract)
}

/// Parse every non-terminal against the whole of `input`.
pub fn parse_complete<'a, G, S>(
    grammar: &G::Fields<ParserShape<G, S>>,
    input: S,
) -> G::Fields<OutcomeShape<S>>
where
    G: Grammar<'a, S>,
    S: Source + 'a,
{
    let table = TailTable::<G, S>::build(grammar, input);
    let mut extract = ExtractComplete {
        table: &table,
        input,
    };
    G::map_fields(grammar, &mut extract)
}

/// [`parse_complete`], failing on the first non-terminal that cannot
/// consume the entire input.
///
/// # Errors
///
/// The first field's [`ParseFailure`], in field-declaration order.
pub fn try_parse_complete<'a, G, S>(
    grammar: &G::Fields<ParserShape<G, S>>,
    input: S,
) -> Result<G::Fields<ParsesShape<S>>, ParseFailure>
where
    G: Grammar<'a, S>,
    S: Source + 'a,
{
    let table = TailTable::<G, S>::build(grammar, input);
    let mut extract = ExtractComplete {
        table: &table,
        input,
    };
    G::try_map_fields(grammar, &mut extract)
}

/// Fields are bare success lists, used by [`try_parse_complete`] where
/// the failure case has already been taken out through `Result`.
pub struct ParsesShape<S>(std::marker::PhantomData<S>);

impl<'a, S: Source + 'a> crate::bundle::Shape<'a> for ParsesShape<S> {
    type Of<R: Clone + 'a> = Vec<(S, R)>;
}

struct ExtractPrefix<'t, 'a, G, S>
where
    G: Grammar<'a, S>,
    S: Source + 'a,
{
    table: &'t TailTable<'a, G, S>,
    input: S,
}

impl<'t, 'a, G, S> Transform<'a, CellShape<G, S>, OutcomeShape<S>> for ExtractPrefix<'t, 'a, G, S>
where
    G: Grammar<'a, S>,
    S: Source + 'a,
{
    fn transform<R: Clone + 'a>(&mut self, cell: &MemoCell<'a, G, S, R>) -> ParseOutcome<S, R> {
        from_result_list(self.input, self.table, cell.force(self.table, 0))
    }
}

struct ExtractComplete<'t, 'a, G, S>
where
    G: Grammar<'a, S>,
    S: Source + 'a,
{
    table: &'t TailTable<'a, G, S>,
    input: S,
}

impl<'t, 'a, G, S> ExtractComplete<'t, 'a, G, S>
where
    G: Grammar<'a, S>,
    S: Source + 'a,
{
    fn closed_results<R: Clone + 'a>(&self, parser: &Parser<'a, G, S, R>) -> ResultList<R> {
        // Close the field over end of input and evaluate in place. Inner
        // non-terminal references resolve through the ordinary memos, so
        // everything below position zero is shared with parse_prefix.
        parser
            .clone()
            .then_skip(eof())
            .evaluate(self.table, 0)
    }
}

impl<'t, 'a, G, S> Transform<'a, ParserShape<G, S>, OutcomeShape<S>> for ExtractComplete<'t, 'a, G, S>
where
    G: Grammar<'a, S>,
    S: Source + 'a,
{
    fn transform<R: Clone + 'a>(&mut self, parser: &Parser<'a, G, S, R>) -> ParseOutcome<S, R> {
        from_result_list(self.input, self.table, self.closed_results(parser))
    }
}

impl<'t, 'a, G, S> TryTransform<'a, ParserShape<G, S>, ParsesShape<S>> for ExtractComplete<'t, 'a, G, S>
where
    G: Grammar<'a, S>,
    S: Source + 'a,
{
    type Error = ParseFailure;

    fn try_transform<R: Clone + 'a>(
        &mut self,
        parser: &Parser<'a, G, S, R>,
    ) -> Result<Vec<(S, R)>, ParseFailure> {
        from_result_list(self.input, self.table, self.closed_results(parser))
    }
}

/// Convert an engine-level result list into a user-facing outcome.
fn from_result_list<'a, G, S, R>(
    input: S,
    table: &TailTable<'a, G, S>,
    results: ResultList<R>,
) -> ParseOutcome<S, R>
where
    G: Grammar<'a, S>,
    S: Source + 'a,
    R: Clone + 'a,
{
    let input_len = input.len();
    let (successes, failure) = results.into_parts();
    let mut parses = Vec::new();
    for info in successes {
        parses.push((table.suffix(info.rest), info.value));
    }
    if parses.is_empty() {
        let failure = failure.unwrap_or_else(|| Failure::empty(input_len));
        return Err(report(input_len, &failure));
    }
    Ok(parses)
}

/// A 1-based position from the start of the input (position 1 is just
/// before the first element) and the deduplicated expectations, in
/// first-contribution order.
fn report(input_len: usize, failure: &Failure) -> ParseFailure {
    let mut seen = HashSet::with_hasher(ahash::RandomState::new());
    let expected = failure
        .expected
        .iter()
        .filter(|label| seen.insert(label.as_str()))
        .map(ToString::to_string)
        .collect();
    ParseFailure::new(input_len - failure.position + 1, expected)
}
