//! # Result Lists
//!
//! Every parser invocation returns a [`ResultList`]: the ordered
//! collection of successful parses found at the current position, paired
//! with the furthest failure seen while producing them. Both components
//! are always carried: a list may hold successes *and* a failure record
//! (from an alternative that lost), or neither successes nor a failure
//! (the result of [`ResultList::pure`]).
//!
//! ## Representation
//!
//! Successes are stored as a binary concatenation tree whose leaves are
//! [`ResultInfo`] records. Merging two lists is the hottest operation in
//! the engine (every choice point performs one), so it must be O(1): a
//! merge allocates a single branch node and never copies leaves. Iteration
//! flattens the tree in order, left list first.
//!
//! A grouped-by-length view is available through
//! [`ResultList::into_groups`]; it is what [`ambiguous`] consumes and what
//! sequencing-by-length optimizations would operate on. Both views expose
//! the same results in the same order.
//!
//! [`ambiguous`]: crate::parser::ambiguous

use compact_str::CompactString;
use smallvec::SmallVec;

/// One successful parse.
///
/// `consumed` counts prime elements; `rest` is the tail-table index at
/// which parsing may continue. For a parse started at table index `p`,
/// `rest == p + consumed` always holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultInfo<R> {
    pub consumed: usize,
    pub rest: usize,
    pub value: R,
}

/// The furthest-failure record.
///
/// `position` is the remaining-input length (in prime elements) at the
/// point of failure: a *smaller* position is *further* into the input.
/// `expected` collects human-readable descriptions of what was expected
/// there; duplicates are tolerated here and removed at extraction time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub position: usize,
    pub expected: SmallVec<[CompactString; 2]>,
}

impl Failure {
    /// A failure with no expectation description.
    #[must_use]
    pub fn empty(position: usize) -> Self {
        Self {
            position,
            expected: SmallVec::new(),
        }
    }

    /// A failure expecting the given item.
    #[must_use]
    pub fn labeled(position: usize, expected: impl Into<CompactString>) -> Self {
        Self {
            position,
            expected: smallvec::smallvec![expected.into()],
        }
    }

    /// Keep the furthest of two failures; union the labels on a tie.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        match self.position.cmp(&other.position) {
            std::cmp::Ordering::Less => self,
            std::cmp::Ordering::Greater => other,
            std::cmp::Ordering::Equal => {
                let mut expected = self.expected;
                expected.extend(other.expected);
                Self {
                    position: self.position,
                    expected,
                }
            }
        }
    }

    fn merge_opt(a: Option<Self>, b: Option<Self>) -> Option<Self> {
        match (a, b) {
            (Some(a), Some(b)) => Some(a.merge(b)),
            (a, None) => a,
            (None, b) => b,
        }
    }
}

/// Binary concatenation tree of successes.
#[derive(Debug, Clone)]
enum Node<R> {
    Leaf(ResultInfo<R>),
    Branch(Box<Node<R>>, Box<Node<R>>),
}

/// Successful parses and the furthest failure, together.
#[derive(Debug, Clone)]
pub struct ResultList<R> {
    successes: Option<Node<R>>,
    failure: Option<Failure>,
}

impl<R> Default for ResultList<R> {
    fn default() -> Self {
        Self {
            successes: None,
            failure: None,
        }
    }
}

impl<R> ResultList<R> {
    /// One zero-length success at table index `rest`, no failure record.
    #[must_use]
    pub fn pure(rest: usize, value: R) -> Self {
        Self::from_success(0, rest, value)
    }

    /// One success, no failure record.
    #[must_use]
    pub fn from_success(consumed: usize, rest: usize, value: R) -> Self {
        Self {
            successes: Some(Node::Leaf(ResultInfo {
                consumed,
                rest,
                value,
            })),
            failure: None,
        }
    }

    /// No successes, the given failure.
    #[must_use]
    pub fn from_failure(failure: Failure) -> Self {
        Self {
            successes: None,
            failure: Some(failure),
        }
    }

    /// No successes, an optional failure.
    #[must_use]
    pub fn with_failure(failure: Option<Failure>) -> Self {
        Self {
            successes: None,
            failure,
        }
    }

    #[must_use]
    pub fn has_successes(&self) -> bool {
        self.successes.is_some()
    }

    #[must_use]
    pub fn failure(&self) -> Option<&Failure> {
        self.failure.as_ref()
    }

    /// Multiset union of successes (`self` first), furthest failure kept.
    ///
    /// O(1): one branch node, no leaf is touched.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        let successes = match (self.successes, other.successes) {
            (Some(a), Some(b)) => Some(Node::Branch(Box::new(a), Box::new(b))),
            (a, None) => a,
            (None, b) => b,
        };
        Self {
            successes,
            failure: Failure::merge_opt(self.failure, other.failure),
        }
    }

    /// Fold another failure record into this list.
    pub fn absorb_failure(&mut self, failure: Option<Failure>) {
        self.failure = Failure::merge_opt(self.failure.take(), failure);
    }

    /// Apply `f` to every success value; lengths, continuations and the
    /// failure record pass through unchanged.
    #[must_use]
    pub fn map<U>(self, f: &impl Fn(R) -> U) -> ResultList<U> {
        self.map_results(&mut |info: ResultInfo<R>| ResultInfo {
            consumed: info.consumed,
            rest: info.rest,
            value: f(info.value),
        })
    }

    /// Rewrite every success record wholesale; the failure record passes
    /// through. Used by sequencing (length addition) and lookahead
    /// (length collapse).
    #[must_use]
    pub fn map_results<U>(self, f: &mut impl FnMut(ResultInfo<R>) -> ResultInfo<U>) -> ResultList<U> {
        fn walk<R, U>(node: Node<R>, f: &mut impl FnMut(ResultInfo<R>) -> ResultInfo<U>) -> Node<U> {
            match node {
                Node::Leaf(info) => Node::Leaf(f(info)),
                Node::Branch(a, b) => Node::Branch(Box::new(walk(*a, f)), Box::new(walk(*b, f))),
            }
        }
        ResultList {
            successes: self.successes.map(|node| walk(node, f)),
            failure: self.failure,
        }
    }

    /// Replace the failure record's position with `position` and drop its
    /// labels. Backtracking combinators use this to hide how deep an
    /// abandoned attempt got.
    #[must_use]
    pub fn rewind_failure(mut self, position: usize) -> Self {
        if self.failure.is_some() {
            self.failure = Some(Failure::empty(position));
        }
        self
    }

    /// If there are no successes and the failure sits exactly at
    /// `position` (nothing was consumed), replace its labels with `label`.
    /// Failures that made progress past `position` keep their own story.
    #[must_use]
    pub fn relabel(mut self, position: usize, label: impl Into<CompactString>) -> Self {
        if self.successes.is_none() {
            if let Some(failure) = &mut self.failure {
                if failure.position == position {
                    failure.expected = smallvec::smallvec![label.into()];
                }
            }
        }
        self
    }

    /// Split into successes (in engine order) and the failure record.
    #[must_use]
    pub fn into_parts(self) -> (Successes<R>, Option<Failure>) {
        (
            Successes {
                stack: self.successes.map(|n| vec![n]).unwrap_or_default(),
            },
            self.failure,
        )
    }

    /// Iterate successes in engine order without consuming the list.
    pub fn iter(&self) -> SuccessesIter<'_, R> {
        SuccessesIter {
            stack: self.successes.as_ref().map(|n| vec![n]).unwrap_or_default(),
        }
    }

    /// The grouped-by-length view: one [`LengthGroup`] per distinct
    /// consumed length, in order of first appearance, each carrying every
    /// value parsed at that length.
    #[must_use]
    pub fn into_groups(self) -> (Vec<LengthGroup<R>>, Option<Failure>) {
        let (successes, failure) = self.into_parts();
        let mut groups: Vec<LengthGroup<R>> = Vec::new();
        for info in successes {
            match groups.iter_mut().find(|g| g.consumed == info.consumed) {
                Some(group) => group.values.push(info.value),
                None => groups.push(LengthGroup {
                    consumed: info.consumed,
                    rest: info.rest,
                    values: vec![info.value],
                }),
            }
        }
        (groups, failure)
    }
}

/// All successes of one consumed length. Every member shares the same
/// continuation index, so it is stored once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LengthGroup<R> {
    pub consumed: usize,
    pub rest: usize,
    pub values: Vec<R>,
}

/// Explicitly surfaced ambiguity: every value parsed at one position and
/// length, as produced by [`ambiguous`](crate::parser::ambiguous).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ambiguous<R>(pub Vec<R>);

/// Owning in-order iterator over a result list's successes.
pub struct Successes<R> {
    stack: Vec<Node<R>>,
}

impl<R> Iterator for Successes<R> {
    type Item = ResultInfo<R>;

    fn next(&mut self) -> Option<ResultInfo<R>> {
        loop {
            match self.stack.pop()? {
                Node::Leaf(info) => return Some(info),
                Node::Branch(a, b) => {
                    self.stack.push(*b);
                    self.stack.push(*a);
                }
            }
        }
    }
}

/// Borrowing in-order iterator over a result list's successes.
pub struct SuccessesIter<'r, R> {
    stack: Vec<&'r Node<R>>,
}

impl<'r, R> Iterator for SuccessesIter<'r, R> {
    type Item = &'r ResultInfo<R>;

    fn next(&mut self) -> Option<&'r ResultInfo<R>> {
        loop {
            match self.stack.pop()? {
                Node::Leaf(info) => return Some(info),
                Node::Branch(a, b) => {
                    self.stack.push(b);
                    self.stack.push(a);
                }
            }
        }
    }
}
