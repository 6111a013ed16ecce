//! Tree regular expressions.
//!
//! `Pattern<S, N>` targets sort `S` and captures under names of type `N`.
//! Patterns are immutable and share structure through `Arc`, so cloning is
//! O(1) and a pattern can be matched from many threads at once.
//!
//! # Holes
//!
//! `concat` and `iter` take a closure that receives a fresh placeholder
//! pattern. The placeholder is a numbered hole; nothing is substituted at
//! construction time. While matching or generating, `Concat` binds the hole
//! to its fill and `Iter` binds the hole to the `Iter` node itself, so
//! `iter(f)` behaves as `concat(f, iter(f))` one level at a time.

use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use smallvec::SmallVec;

use crate::dispatch::GenerateLayer;
use crate::shape::{Layer, Sort};

/// Capture names: any cloneable, comparable value.
pub trait Name: Clone + PartialEq + Send + Sync + 'static {}

impl<T: Clone + PartialEq + Send + Sync + 'static> Name for T {}

/// Counter for process-unique hole numbers.
static NEXT_HOLE: AtomicU64 = AtomicU64::new(0);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct HoleId(u64);

impl HoleId {
    pub(crate) fn fresh() -> Self {
        HoleId(NEXT_HOLE.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for HoleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "?{}", self.0)
    }
}

pub(crate) enum Node<S: Sort, N: Name> {
    Empty,
    Any,
    Inject(<S::Shape as Layer>::Pat<N>),
    Choice(Pattern<S, N>, Pattern<S, N>),
    Capture(N, Pattern<S, N>),
    Hole(HoleId),
    /// `fill` is a `Pattern<T, N>` for the hole's sort `T`.
    Concat {
        hole: HoleId,
        body: Pattern<S, N>,
        fill: Arc<dyn Any + Send + Sync>,
    },
    Iter {
        hole: HoleId,
        body: Pattern<S, N>,
    },
}

/// A tree regular expression over sort `S`.
pub struct Pattern<S: Sort, N: Name = &'static str> {
    node: Arc<Node<S, N>>,
}

impl<S: Sort, N: Name> Clone for Pattern<S, N> {
    fn clone(&self) -> Self {
        Pattern {
            node: Arc::clone(&self.node),
        }
    }
}

impl<S: Sort, N: Name> Pattern<S, N> {
    fn new(node: Node<S, N>) -> Self {
        Pattern {
            node: Arc::new(node),
        }
    }

    pub(crate) fn node(&self) -> &Node<S, N> {
        &self.node
    }

    /// Matches nothing.
    pub fn empty() -> Self {
        Self::new(Node::Empty)
    }

    /// Matches every term of the sort.
    pub fn any() -> Self {
        Self::new(Node::Any)
    }

    /// Matches terms whose top constructor matches `layer`.
    pub fn inject(layer: <S::Shape as Layer>::Pat<N>) -> Self {
        Self::new(Node::Inject(layer))
    }

    /// Matches if `first` or `second` matches; `first` wins for captures.
    pub fn choice(first: Self, second: Self) -> Self {
        Self::new(Node::Choice(first, second))
    }

    /// Right-nested choice over `alternatives`, earliest first.
    ///
    /// An empty list yields [`Pattern::empty`].
    pub fn choice_all(alternatives: impl IntoIterator<Item = Self>) -> Self {
        let alternatives: Vec<Self> = alternatives.into_iter().collect();
        alternatives
            .into_iter()
            .rev()
            .reduce(|rest, alternative| Self::choice(alternative, rest))
            .unwrap_or_else(Self::empty)
    }

    /// Matches like `inner`, recording the matched term under `name`.
    pub fn capture(name: N, inner: Self) -> Self {
        Self::new(Node::Capture(name, inner))
    }

    /// Plug `fill` into the hole handed to `body`.
    ///
    /// The hole may target a different sort than the resulting pattern.
    pub fn concat<T: Sort>(body: impl FnOnce(Pattern<T, N>) -> Self, fill: Pattern<T, N>) -> Self {
        let hole = HoleId::fresh();
        let body = body(Pattern::new(Node::Hole(hole)));
        Self::new(Node::Concat {
            hole,
            body,
            fill: Arc::new(fill),
        })
    }

    /// Fixpoint of `body`: the hole stands for the whole iteration again.
    pub fn iter(body: impl FnOnce(Self) -> Self) -> Self {
        let hole = HoleId::fresh();
        let body = body(Self::new(Node::Hole(hole)));
        Self::new(Node::Iter { hole, body })
    }

    /// Syntactically `Empty`.
    pub fn is_empty(&self) -> bool {
        matches!(self.node(), Node::Empty)
    }

    /// Denotes exactly one term: no `Any`, choice, wildcard, collection or
    /// hole anywhere inside.
    pub fn is_concrete(&self) -> bool {
        match self.node() {
            Node::Inject(layer) => <S::Shape as GenerateLayer>::is_concrete::<N>(layer),
            Node::Capture(_, inner) => inner.is_concrete(),
            Node::Empty
            | Node::Any
            | Node::Choice(..)
            | Node::Hole(_)
            | Node::Concat { .. }
            | Node::Iter { .. } => false,
        }
    }

    /// Flatten nested choices into their non-empty leaves, in order.
    pub(crate) fn alternatives<'p>(&'p self, into: &mut SmallVec<[&'p Self; 4]>) {
        match self.node() {
            Node::Choice(first, second) => {
                first.alternatives(into);
                second.alternatives(into);
            }
            Node::Empty => {}
            _ => into.push(self),
        }
    }
}
