//! End-to-end grammars: ambiguity, recursion, diagnostics, and the
//! algebraic guarantees the combinators advertise.

use std::cell::Cell;
use std::rc::Rc;

use proptest::prelude::*;

use gramma::bundle::{Field, Fold, Grammar, ParserShape, Shape, Transform, TryTransform};
use gramma::engine::{parse_complete, parse_prefix, try_parse_complete};
use gramma::input::Source;
use gramma::parser::{
    eof, literal, look_ahead, many, non_terminal, satisfy, some, take_while, Parser,
};
use gramma::peg::{longest, peg};
use gramma::result::{Failure, ResultList};
use gramma::table::TailTable;

/// Hand-rolls the bundle boilerplate for the test grammars. The input
/// lifetime is passed in so the field types can mention it.
macro_rules! impl_bundle {
    ($lt:lifetime, $grammar:ident, $fields:ident, { $($field:ident: $output:ty => $nt:ident),+ $(,)? }) => {
        struct $grammar;

        struct $fields<$lt, F: Shape<$lt>>
        where
            $(F::Of<$output>: $lt,)+
        {
            $($field: F::Of<$output>,)+
        }

        impl<$lt> Grammar<$lt, &$lt str> for $grammar {
            type Fields<F: Shape<$lt>> = $fields<$lt, F>;

            fn map_fields<A: Shape<$lt>, B: Shape<$lt>>(
                fields: &$fields<$lt, A>,
                op: &mut impl Transform<$lt, A, B>,
            ) -> $fields<$lt, B> {
                $fields {
                    $($field: op.transform(&fields.$field),)+
                }
            }

            fn fold_fields<F: Shape<$lt>, M>(
                fields: &$fields<$lt, F>,
                init: M,
                op: &mut impl Fold<$lt, F, M>,
            ) -> M {
                let acc = init;
                $(let acc = op.fold(acc, &fields.$field);)+
                acc
            }

            fn try_map_fields<A: Shape<$lt>, B: Shape<$lt>, T: TryTransform<$lt, A, B>>(
                fields: &$fields<$lt, A>,
                op: &mut T,
            ) -> Result<$fields<$lt, B>, T::Error> {
                Ok($fields {
                    $($field: op.try_transform(&fields.$field)?,)+
                })
            }
        }

        $(
            #[allow(dead_code)]
            struct $nt;

            impl<$lt> Field<$lt, &$lt str> for $nt {
                type Grammar = $grammar;
                type Output = $output;

                fn select<'b, F: Shape<$lt>>(fields: &'b $fields<$lt, F>) -> &'b F::Of<$output> {
                    &fields.$field
                }
            }
        )+
    };
}

// ---------------------------------------------------------------------------
// Scenario 1: arithmetic. expr = term ('+' term)* ; term = digit+

impl_bundle!('a, Arith, ArithFields, { expr: i64 => ExprNt, term: i64 => TermNt });

fn arith<'a>() -> ArithFields<'a, ParserShape<Arith, &'a str>> {
    let digit = satisfy(|c: &char| c.is_ascii_digit());
    ArithFields {
        expr: non_terminal::<TermNt, _>()
            .then(many(literal("+").skip_then(non_terminal::<TermNt, _>())))
            .map(|(head, rest)| head + rest.into_iter().sum::<i64>()),
        term: some(digit)
            .map(|digits| digits.into_iter().collect::<String>().parse::<i64>().unwrap()),
    }
}

#[test]
fn test_arithmetic_sums_completely() {
    let grammar = arith();
    let outcome = parse_complete::<Arith, _>(&grammar, "1+2+3");
    assert_eq!(outcome.expr.unwrap(), vec![("", 6)]);
}

#[test]
fn test_arithmetic_prefixes() {
    let grammar = arith();
    let outcome = parse_prefix::<Arith, _>(&grammar, "1+2+3");
    assert_eq!(
        outcome.expr.unwrap(),
        vec![("+2+3", 1), ("+3", 3), ("", 6)]
    );
}

#[test]
fn test_prefix_contains_every_complete_parse() {
    let grammar = arith();
    let complete = parse_complete::<Arith, _>(&grammar, "12+34").expr.unwrap();
    let prefix = parse_prefix::<Arith, _>(&grammar, "12+34").expr.unwrap();
    for (rest, value) in complete {
        assert_eq!(rest, "");
        assert!(prefix.contains(&("", value)));
    }
}

#[test]
fn test_try_parse_complete_short_circuits() {
    let grammar = arith();
    // Both non-terminals consume all of "12".
    let fields = try_parse_complete::<Arith, _>(&grammar, "12").unwrap();
    assert_eq!(fields.expr, vec![("", 12)]);
    assert_eq!(fields.term, vec![("", 12)]);

    // `term` cannot consume the '+', so the bundle as a whole fails.
    assert!(try_parse_complete::<Arith, _>(&grammar, "1+2").is_err());
}

// ---------------------------------------------------------------------------
// Scenario 2: ambiguity. s = 'a' s 'a' | 'a'

impl_bundle!('a, Palin, PalinFields, { s: usize => SNt });

fn palindromes<'a>() -> PalinFields<'a, ParserShape<Palin, &'a str>> {
    PalinFields {
        s: literal("a")
            .skip_then(non_terminal::<SNt, _>())
            .then_skip(literal("a"))
            .map(|n| n + 2)
            .or(literal("a").map(|_| 1)),
    }
}

#[test]
fn test_ambiguous_prefix_parses() {
    let grammar = palindromes();
    let outcome = parse_prefix::<Palin, _>(&grammar, "aaaaa");
    let mut lengths: Vec<usize> = outcome.s.unwrap().into_iter().map(|(_, n)| n).collect();
    lengths.sort_unstable();
    assert_eq!(lengths, vec![1, 3, 5]);
}

#[test]
fn test_ambiguous_complete_parse_is_unique() {
    let grammar = palindromes();
    let outcome = parse_complete::<Palin, _>(&grammar, "aaaaa");
    assert_eq!(outcome.s.unwrap(), vec![("", 5)]);
}

// ---------------------------------------------------------------------------
// Scenario 3: biased choice. s = attempt("if") <<|> "i"

impl_bundle!('a, Keyword, KeywordFields, { s: &'a str => KwNt });

fn keyword<'a>() -> KeywordFields<'a, ParserShape<Keyword, &'a str>> {
    KeywordFields {
        s: literal("if").attempt().or_biased(literal("i")),
    }
}

#[test]
fn test_biased_choice_commits_to_left() {
    let grammar = keyword();
    let outcome = parse_prefix::<Keyword, _>(&grammar, "if");
    assert_eq!(outcome.s.unwrap(), vec![("", "if")]);
}

#[test]
fn test_biased_choice_falls_back() {
    let grammar = keyword();
    let outcome = parse_prefix::<Keyword, _>(&grammar, "ix");
    assert_eq!(outcome.s.unwrap(), vec![("x", "i")]);
}

// ---------------------------------------------------------------------------
// Scenario 4: failure reporting. s = "foo" <?> "greeting"

impl_bundle!('a, Greeting, GreetingFields, { s: &'a str => GreetNt });

#[test]
fn test_failure_positions_are_one_based() {
    let grammar = GreetingFields {
        s: literal("foo").expected("greeting"),
    };
    let outcome = parse_complete::<Greeting, _>(&grammar, "bar");
    let failure = outcome.s.unwrap_err();
    assert_eq!(failure.position, 1);
    assert_eq!(failure.expected, vec!["greeting".to_string()]);
}

// ---------------------------------------------------------------------------
// Scenario 5: lookahead. s = lookAhead("a") *> takeWhile(alpha)

impl_bundle!('a, Peek, PeekFields, { s: &'a str => PeekNt });

fn peeking<'a>() -> PeekFields<'a, ParserShape<Peek, &'a str>> {
    PeekFields {
        s: look_ahead(literal("a")).skip_then(take_while(|c: &char| c.is_alphabetic())),
    }
}

#[test]
fn test_look_ahead_then_consume() {
    let grammar = peeking();
    let outcome = parse_complete::<Peek, _>(&grammar, "abc");
    assert_eq!(outcome.s.unwrap(), vec![("", "abc")]);
}

#[test]
fn test_look_ahead_failure_location() {
    let grammar = peeking();
    let outcome = parse_complete::<Peek, _>(&grammar, "1bc");
    let failure = outcome.s.unwrap_err();
    assert_eq!(failure.position, 1);
    assert_eq!(failure.expected, vec!["\"a\"".to_string()]);
}

// ---------------------------------------------------------------------------
// Scenario 6: mutual recursion. a = 'x' b | eof ; b = 'y' a

impl_bundle!('a, Pairs, PairsFields, { a: usize => ANt, b: usize => BNt });

fn pairs<'a>() -> PairsFields<'a, ParserShape<Pairs, &'a str>> {
    PairsFields {
        a: literal("x")
            .skip_then(non_terminal::<BNt, _>())
            .map(|n| n + 1)
            .or(eof().map(|()| 0)),
        b: literal("y").skip_then(non_terminal::<ANt, _>()),
    }
}

#[test]
fn test_mutual_recursion_accepts_pairs() {
    let grammar = pairs();
    assert_eq!(
        parse_complete::<Pairs, _>(&grammar, "xyxy").a.unwrap(),
        vec![("", 2)]
    );
    assert_eq!(
        parse_complete::<Pairs, _>(&grammar, "xy").a.unwrap(),
        vec![("", 1)]
    );
    assert_eq!(
        parse_complete::<Pairs, _>(&grammar, "").a.unwrap(),
        vec![("", 0)]
    );
}

#[test]
fn test_mutual_recursion_rejects_odd_input() {
    let grammar = pairs();
    let outcome = parse_complete::<Pairs, _>(&grammar, "xyx");
    let failure = outcome.a.unwrap_err();
    // Deepest progress: after "xyx", `b` wanted its 'y'.
    assert_eq!(failure.position, 4);
    assert_eq!(failure.expected, vec!["\"y\"".to_string()]);
}

// ---------------------------------------------------------------------------
// Memoization: every non-terminal runs at most once per position

impl_bundle!('a, Counted, CountedFields, { c: char => CNt });

#[test]
fn test_non_terminal_body_runs_once_per_position() {
    let runs = Rc::new(Cell::new(0));
    let probe = runs.clone();
    let inner = satisfy(|c: &char| c.is_alphabetic());
    let grammar = CountedFields {
        c: Parser::from_fn(move |table, position| {
            probe.set(probe.get() + 1);
            inner.evaluate(table, position)
        }),
    };

    // Reference the same non-terminal twice at the same position.
    let twice = look_ahead(non_terminal::<CNt, _>()).skip_then(non_terminal::<CNt, _>());
    let table = TailTable::<Counted, _>::build(&grammar, "q");
    let results = twice.evaluate(&table, 0);
    assert!(results.has_successes());
    assert_eq!(runs.get(), 1);
    assert_eq!(table.forced_cells(), 1);

    // A second lookup reuses the memo and yields the same results.
    let again = non_terminal::<CNt, _>().evaluate(&table, 0);
    assert_eq!(runs.get(), 1);
    let observed: Vec<(usize, char)> = again.iter().map(|i| (i.consumed, i.value)).collect();
    assert_eq!(observed, vec![(1, 'q')]);
}

#[test]
fn test_left_recursion_is_reported_not_looped() {
    let grammar = CountedFields {
        c: non_terminal::<CNt, _>().then_skip(literal("c")),
    };
    let outcome = parse_complete::<Counted, _>(&grammar, "ccc");
    let failure = outcome.c.unwrap_err();
    assert_eq!(failure.expected, vec!["recursive non-terminal".to_string()]);
}

#[test]
fn test_raw_result_bundle_at_position() {
    let grammar = arith();
    let table = TailTable::<Arith, _>::build(&grammar, "1+2");
    // At the suffix "2", both non-terminals parse the lone digit.
    let results = table.results(2);
    let term: Vec<(usize, i64)> = results.term.iter().map(|i| (i.consumed, i.value)).collect();
    assert_eq!(term, vec![(1, 2)]);
    let expr: Vec<(usize, i64)> = results.expr.iter().map(|i| (i.consumed, i.value)).collect();
    assert_eq!(expr, vec![(1, 2)]);
    // Extraction forced both cells at that position.
    assert!(table.forced_cells() >= 2);
}

// ---------------------------------------------------------------------------
// Tail-length accounting: consumed length always matches the continuation

#[test]
fn test_consumed_length_matches_continuation_suffix() {
    let grammar = arith();
    let input = "12+3+45";
    let table = TailTable::<Arith, _>::build(&grammar, input);
    let results = non_terminal::<ExprNt, _>().evaluate(&table, 0);
    assert!(results.has_successes());
    for info in results.iter() {
        assert_eq!(
            Source::len(input) - Source::len(table.suffix(info.rest)),
            info.consumed
        );
    }
}

// ---------------------------------------------------------------------------
// PEG round-trip inside a grammar

impl_bundle!('a, Greedy, GreedyFields, { s: &'a str => GreedyNt });

#[test]
fn test_peg_round_trip_drops_shorter_parses() {
    let ambiguous = literal("a").or(literal("ab")).or(literal("abc"));
    let grammar = GreedyFields {
        s: peg(longest(ambiguous)),
    };
    let outcome = parse_prefix::<Greedy, _>(&grammar, "abcd");
    assert_eq!(outcome.s.unwrap(), vec![("d", "abc")]);
}

// ---------------------------------------------------------------------------
// Failure monotonicity: only the deepest failures contribute labels

impl_bundle!('a, Deep, DeepFields, { s: &'a str => DeepNt });

#[test]
fn test_furthest_failure_wins_labels() {
    let grammar = DeepFields {
        // One alternative gets past 'a' before failing; the other fails
        // at the start. Only the deeper one may name expectations.
        s: literal("a").skip_then(literal("x")).or(literal("b")),
    };
    let outcome = parse_complete::<Deep, _>(&grammar, "ay");
    let failure = outcome.s.unwrap_err();
    assert_eq!(failure.position, 2);
    assert_eq!(failure.expected, vec!["\"x\"".to_string()]);
}

// ---------------------------------------------------------------------------
// Algebraic laws, property-checked over small inputs

impl_bundle!('a, Lone, LoneFields, { word: String => WordNt });

fn lone_grammar<'a>() -> LoneFields<'a, ParserShape<Lone, &'a str>> {
    LoneFields {
        word: take_while(|c: &char| c.is_alphabetic()).map(str::to_string),
    }
}

type LoneParser<'a> = Parser<'a, Lone, &'a str, String>;

fn sample_parser<'a>(index: u8) -> LoneParser<'a> {
    match index % 5 {
        0 => literal("a").map(str::to_string),
        1 => literal("ab").map(str::to_string),
        2 => satisfy(|c: &char| *c == 'b').map(|c: char| c.to_string()),
        3 => Parser::pure("pure".to_string()),
        _ => literal("a")
            .then(literal("b"))
            .map(|(x, y)| format!("{x}{y}")),
    }
}

fn observe(list: &ResultList<String>) -> (Vec<(usize, usize, String)>, Option<Failure>) {
    (
        list.iter()
            .map(|info| (info.consumed, info.rest, info.value.clone()))
            .collect(),
        list.failure().cloned(),
    )
}

fn run_lone<'a>(parser: &LoneParser<'a>, input: &'a str) -> ResultList<String> {
    let grammar = lone_grammar();
    let table = TailTable::<Lone, _>::build(&grammar, input);
    parser.evaluate(&table, 0)
}

proptest! {
    // Functor identity: mapping the identity changes nothing.
    #[test]
    fn prop_map_identity(index in 0..5u8, input in "[ab]{0,5}") {
        let p = sample_parser(index);
        let mapped = sample_parser(index).map(|v| v);
        prop_assert_eq!(observe(&run_lone(&p, &input)), observe(&run_lone(&mapped, &input)));
    }

    // Functor composition: map f . map g = map (f . g).
    #[test]
    fn prop_map_composition(index in 0..5u8, input in "[ab]{0,5}") {
        let twice = sample_parser(index).map(|v| v.len()).map(|n| n * 2);
        let fused = sample_parser(index).map(|v| v.len() * 2);
        let a = run_lone_usize(&twice, &input);
        let b = run_lone_usize(&fused, &input);
        let left: Vec<(usize, usize, usize)> =
            a.iter().map(|i| (i.consumed, i.rest, i.value)).collect();
        let right: Vec<(usize, usize, usize)> =
            b.iter().map(|i| (i.consumed, i.rest, i.value)).collect();
        prop_assert_eq!(left, right);
        prop_assert_eq!(a.failure(), b.failure());
    }

    // Choice is associative.
    #[test]
    fn prop_or_associative(i in 0..5u8, j in 0..5u8, k in 0..5u8, input in "[ab]{0,5}") {
        let left = sample_parser(i).or(sample_parser(j)).or(sample_parser(k));
        let right = sample_parser(i).or(sample_parser(j).or(sample_parser(k)));
        prop_assert_eq!(observe(&run_lone(&left, &input)), observe(&run_lone(&right, &input)));
    }

    // `empty` is the identity of choice, up to failure-record merging.
    #[test]
    fn prop_empty_is_choice_identity(index in 0..5u8, input in "[ab]{0,5}") {
        let p = sample_parser(index);
        let padded = Parser::empty().or(sample_parser(index));
        let (successes, _) = observe(&run_lone(&p, &input));
        let (padded_successes, _) = observe(&run_lone(&padded, &input));
        prop_assert_eq!(successes, padded_successes);
    }

    // Pure left identity of sequencing: a consumed-nothing pure prefix
    // dropped by `skip_then` changes nothing.
    #[test]
    fn prop_pure_skip_then_left_identity(index in 0..5u8, input in "[ab]{0,5}") {
        let p = sample_parser(index);
        let padded = Parser::<Lone, &str, ()>::pure(()).skip_then(sample_parser(index));
        prop_assert_eq!(observe(&run_lone(&p, &input)), observe(&run_lone(&padded, &input)));
    }

    // Applicative identity: applying a pure identity function through
    // sequencing changes nothing.
    #[test]
    fn prop_applicative_identity(index in 0..5u8, input in "[ab]{0,5}") {
        let p = sample_parser(index);
        let applied = Parser::<Lone, &str, fn(String) -> String>::pure(|v| v)
            .then(sample_parser(index))
            .map(|(f, v)| f(v));
        prop_assert_eq!(observe(&run_lone(&p, &input)), observe(&run_lone(&applied, &input)));
    }

    // Applicative homomorphism: a pure function applied to a pure value
    // is the pure result.
    #[test]
    fn prop_applicative_homomorphism(input in "[ab]{0,5}") {
        let f: fn(String) -> String = |v| format!("<{v}>");
        let value = "x".to_string();
        let applied = Parser::<Lone, &str, fn(String) -> String>::pure(f)
            .then(Parser::pure(value.clone()))
            .map(|(f, v)| f(v));
        let direct = Parser::<Lone, &str, String>::pure(f(value));
        prop_assert_eq!(observe(&run_lone(&applied, &input)), observe(&run_lone(&direct, &input)));
    }

    // Biased-choice absorption: a successful left operand is the answer.
    #[test]
    fn prop_biased_absorption(i in 0..5u8, j in 0..5u8, input in "[ab]{0,5}") {
        let plain = run_lone(&sample_parser(i), &input);
        let biased = run_lone(&sample_parser(i).or_biased(sample_parser(j)), &input);
        if plain.has_successes() {
            prop_assert_eq!(observe(&plain), observe(&biased));
        }
    }

    // Sequencing pairs every success of the left with every success of
    // the right at the left's continuation.
    #[test]
    fn prop_then_pairs_all_successes(i in 0..5u8, j in 0..5u8, input in "[ab]{0,6}") {
        let grammar = lone_grammar();
        let table = TailTable::<Lone, _>::build(&grammar, &input);
        let paired = sample_parser(i).then(sample_parser(j)).evaluate(&table, 0);
        let firsts = sample_parser(i).evaluate(&table, 0);
        let mut expected = 0;
        for info in firsts.iter() {
            expected += sample_parser(j).evaluate(&table, info.rest).iter().count();
        }
        prop_assert_eq!(paired.iter().count(), expected);
    }

    // The longest-match adapter keeps exactly the deepest success.
    #[test]
    fn prop_peg_round_trip_is_longest(i in 0..5u8, j in 0..5u8, input in "[ab]{0,5}") {
        let plain = run_lone(&sample_parser(i).or(sample_parser(j)), &input);
        let round = run_lone(&peg(longest(sample_parser(i).or(sample_parser(j)))), &input);
        if let Some(deepest) = plain.iter().map(|info| info.consumed).max() {
            let singles: Vec<usize> = round.iter().map(|info| info.consumed).collect();
            prop_assert_eq!(singles, vec![deepest]);
        } else {
            prop_assert!(!round.has_successes());
        }
    }
}

fn run_lone_usize<'a>(
    parser: &Parser<'a, Lone, &'a str, usize>,
    input: &'a str,
) -> ResultList<usize> {
    let grammar = lone_grammar();
    let table = TailTable::<Lone, _>::build(&grammar, input);
    parser.evaluate(&table, 0)
}
