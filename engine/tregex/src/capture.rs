//! Capture aggregation.
//!
//! An [`Aggregator`] decides how several captures under one name are kept:
//! [`FirstWins`] keeps the earliest, [`CollectAll`] keeps all of them in
//! encounter order. The policy is picked per match call, not per pattern.

use std::any::{Any, TypeId};
use std::fmt;

use crate::pattern::Name;
use crate::shape::Sort;

/// Result-combination policy for captures under the same name.
///
/// Laws: `combine(empty(), x) == x` and `combine(x, empty()) == x`;
/// `combine` keeps `first` ahead of `second`.
pub trait Aggregator: 'static {
    /// Container of aggregated values.
    type Bag<T>;

    fn empty<T>() -> Self::Bag<T>;

    fn single<T>(item: T) -> Self::Bag<T>;

    fn combine<T>(first: Self::Bag<T>, second: Self::Bag<T>) -> Self::Bag<T>;

    /// Map every element through `f`, dropping those it rejects.
    fn project<T, U>(bag: &Self::Bag<T>, f: impl FnMut(&T) -> Option<U>) -> Self::Bag<U>;
}

/// Keep only the earliest capture.
pub struct FirstWins;

impl Aggregator for FirstWins {
    type Bag<T> = Option<T>;

    fn empty<T>() -> Option<T> {
        None
    }

    fn single<T>(item: T) -> Option<T> {
        Some(item)
    }

    fn combine<T>(first: Option<T>, second: Option<T>) -> Option<T> {
        first.or(second)
    }

    fn project<T, U>(bag: &Option<T>, f: impl FnMut(&T) -> Option<U>) -> Option<U> {
        bag.as_ref().and_then(f)
    }
}

/// Keep every capture, left to right, depth first.
pub struct CollectAll;

impl Aggregator for CollectAll {
    type Bag<T> = Vec<T>;

    fn empty<T>() -> Vec<T> {
        Vec::new()
    }

    fn single<T>(item: T) -> Vec<T> {
        vec![item]
    }

    fn combine<T>(mut first: Vec<T>, second: Vec<T>) -> Vec<T> {
        first.extend(second);
        first
    }

    fn project<T, U>(bag: &Vec<T>, f: impl FnMut(&T) -> Option<U>) -> Vec<U> {
        bag.iter().filter_map(f).collect()
    }
}

/// A captured sub-term with its sort erased.
type Erased<'t> = &'t (dyn Any + 'static);

struct Entry<'t, N, A: Aggregator> {
    name: N,
    sort: TypeId,
    terms: A::Bag<Erased<'t>>,
}

/// Captures produced by one successful match.
///
/// Terms are borrowed from the matched term. Entries are keyed by name and
/// sort: the same name captured at two sorts yields two independent entries.
pub struct CaptureGroup<'t, N, A: Aggregator = CollectAll> {
    entries: Vec<Entry<'t, N, A>>,
}

impl<'t, N: Name, A: Aggregator> CaptureGroup<'t, N, A> {
    pub(crate) fn new() -> Self {
        CaptureGroup {
            entries: Vec::new(),
        }
    }

    pub(crate) fn singleton<S: Sort>(name: N, term: &'t S) -> Self {
        CaptureGroup {
            entries: vec![Entry {
                name,
                sort: TypeId::of::<S>(),
                terms: A::single::<Erased<'t>>(term),
            }],
        }
    }

    /// Append `later`'s captures after this group's, combining shared names.
    #[must_use]
    pub(crate) fn merge(mut self, later: Self) -> Self {
        for entry in later.entries {
            match self
                .entries
                .iter_mut()
                .find(|existing| existing.sort == entry.sort && existing.name == entry.name)
            {
                Some(existing) => {
                    let earlier =
                        std::mem::replace(&mut existing.terms, A::empty::<Erased<'t>>());
                    existing.terms = A::combine::<Erased<'t>>(earlier, entry.terms);
                }
                None => self.entries.push(entry),
            }
        }
        self
    }

    /// Aggregated captures of sort `S` under `name`.
    ///
    /// `None` if `name` was never captured at that sort on the matching path.
    pub fn lookup<S: Sort>(&self, name: &N) -> Option<A::Bag<&'t S>> {
        let sort = TypeId::of::<S>();
        let entry = self
            .entries
            .iter()
            .find(|entry| entry.sort == sort && entry.name == *name)?;
        Some(A::project::<Erased<'t>, &'t S>(&entry.terms, |&term| {
            term.downcast_ref::<S>()
        }))
    }

    /// Whether `name` was captured at any sort.
    pub fn contains(&self, name: &N) -> bool {
        self.entries.iter().any(|entry| entry.name == *name)
    }

    /// Captured names in first-capture order; a name captured at two sorts
    /// appears twice.
    pub fn names(&self) -> impl Iterator<Item = &N> + use<'_, 't, N, A> {
        self.entries.iter().map(|entry| &entry.name)
    }

    /// Number of `(name, sort)` entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<N: fmt::Debug, A: Aggregator> fmt::Debug for CaptureGroup<'_, N, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(self.entries.iter().map(|entry| &entry.name))
            .finish()
    }
}
