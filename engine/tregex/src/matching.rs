//! Matching and capturing.
//!
//! The pattern-level walkers handle `Empty`, `Any`, `Choice`, `Capture` and
//! the hole variants; `Inject` hands the top constructor layer to the sort's
//! shape, which recurses back here for every child.
//!
//! Both walkers are pure: no state outside the returned value, and each
//! step either consumes one constructor layer of the term or resolves a
//! hole, so a finite term bounds the work even for an infinite pattern.

use crate::capture::{Aggregator, CaptureGroup, CollectAll};
use crate::dispatch::{CaptureLayer, MatchLayer};
use crate::env::Env;
use crate::pattern::{Name, Node, Pattern};
use crate::shape::Sort;
use crate::stack::ensure_sufficient_stack;

/// Whether `term` matches `pattern`.
pub fn matches<S: Sort, N: Name>(pattern: &Pattern<S, N>, term: &S) -> bool {
    matches_in(pattern, term, &Env::default())
}

/// Match `term`, aggregating captures with `A`.
///
/// `None` iff `term` does not match. On alternatives the first one that
/// matches decides the captures; later alternatives are not consulted.
pub fn try_match<'t, A: Aggregator, S: Sort, N: Name>(
    pattern: &Pattern<S, N>,
    term: &'t S,
) -> Option<CaptureGroup<'t, N, A>> {
    capture_in(pattern, term, &Env::default())
}

/// Match `term`, keeping every capture.
pub fn captures<'t, S: Sort, N: Name>(
    pattern: &Pattern<S, N>,
    term: &'t S,
) -> Option<CaptureGroup<'t, N, CollectAll>> {
    try_match::<CollectAll, S, N>(pattern, term)
}

impl<S: Sort, N: Name> Pattern<S, N> {
    /// See [`matches`].
    pub fn matches(&self, term: &S) -> bool {
        matches(self, term)
    }

    /// See [`try_match`].
    pub fn try_match<'t, A: Aggregator>(&self, term: &'t S) -> Option<CaptureGroup<'t, N, A>> {
        try_match::<A, S, N>(self, term)
    }

    /// See [`captures`].
    pub fn captures<'t>(&self, term: &'t S) -> Option<CaptureGroup<'t, N, CollectAll>> {
        captures(self, term)
    }
}

pub(crate) fn matches_in<'p, S: Sort, N: Name>(
    pattern: &'p Pattern<S, N>,
    term: &S,
    env: &Env<'p>,
) -> bool {
    ensure_sufficient_stack(|| match pattern.node() {
        Node::Empty => false,
        Node::Any => true,
        Node::Inject(layer) => {
            <S::Shape as MatchLayer>::matches_layer::<N>(layer, term.view(), &env.guarded())
        }
        Node::Choice(first, second) => matches_in(first, term, env) || matches_in(second, term, env),
        Node::Capture(_, inner) => matches_in(inner, term, env),
        Node::Hole(hole) => {
            let (filled, outer) = env.resolve::<S, N>(*hole);
            matches_in(filled, term, &outer)
        }
        Node::Concat { hole, body, fill } => matches_in(body, term, &env.bind(*hole, &**fill)),
        Node::Iter { hole, body } => matches_in(body, term, &env.bind(*hole, pattern)),
    })
}

pub(crate) fn capture_in<'p, 't, S: Sort, N: Name, A: Aggregator>(
    pattern: &'p Pattern<S, N>,
    term: &'t S,
    env: &Env<'p>,
) -> Option<CaptureGroup<'t, N, A>> {
    ensure_sufficient_stack(|| match pattern.node() {
        Node::Empty => None,
        Node::Any => Some(CaptureGroup::new()),
        Node::Inject(layer) => {
            <S::Shape as CaptureLayer>::capture_layer::<N, A>(layer, term.view(), &env.guarded())
        }
        Node::Choice(first, second) => {
            capture_in(first, term, env).or_else(|| capture_in(second, term, env))
        }
        Node::Capture(name, inner) => {
            let inner = capture_in(inner, term, env)?;
            Some(CaptureGroup::singleton(name.clone(), term).merge(inner))
        }
        Node::Hole(hole) => {
            let (filled, outer) = env.resolve::<S, N>(*hole);
            capture_in(filled, term, &outer)
        }
        Node::Concat { hole, body, fill } => capture_in(body, term, &env.bind(*hole, &**fill)),
        Node::Iter { hole, body } => capture_in(body, term, &env.bind(*hole, pattern)),
    })
}
