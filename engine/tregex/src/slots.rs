//! Fixed-arity capture projection.
//!
//! `with_captures` hands a pattern builder one to five typed keys, matches,
//! and returns one aggregated container per key:
//!
//! ```text
//! let (leaves,) = with_captures::<CollectAll, _, _>(&tree, |(leaves,): (Key<Tree>,)| {
//!     Pattern::iter(|rest| Pattern::choice(leaves.capture(leaf()), branch(2.into(), rest.clone(), rest)))
//! })?;
//! ```
//!
//! A key that was never captured on the matching path projects to the
//! aggregator's empty container.

use std::marker::PhantomData;

use crate::capture::{Aggregator, CaptureGroup};
use crate::matching::try_match;
use crate::pattern::Pattern;
use crate::shape::Sort;

/// Capture name used by keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Slot(u8);

impl Slot {
    pub fn index(self) -> u8 {
        self.0
    }
}

/// A capture placeholder for sort `S`.
pub struct Key<S> {
    slot: Slot,
    sort: PhantomData<fn() -> S>,
}

impl<S> Clone for Key<S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for Key<S> {}

impl<S: Sort> Key<S> {
    fn new(index: u8) -> Self {
        Key {
            slot: Slot(index),
            sort: PhantomData,
        }
    }

    pub fn slot(self) -> Slot {
        self.slot
    }

    /// Capture whatever `inner` matches under this key.
    pub fn capture(self, inner: Pattern<S, Slot>) -> Pattern<S, Slot> {
        Pattern::capture(self.slot, inner)
    }
}

/// A tuple of keys.
pub trait Slots: Copy {
    /// One aggregated container per key.
    type Bags<'t, A: Aggregator>;

    fn fresh() -> Self;

    fn project<'t, A: Aggregator>(self, group: &CaptureGroup<'t, Slot, A>) -> Self::Bags<'t, A>;
}

macro_rules! impl_slots {
    ($($sort:ident: $index:tt),+) => {
        impl<$($sort: Sort),+> Slots for ($(Key<$sort>,)+) {
            type Bags<'t, A: Aggregator> = ($(A::Bag<&'t $sort>,)+);

            fn fresh() -> Self {
                ($(Key::new($index),)+)
            }

            fn project<'t, A: Aggregator>(
                self,
                group: &CaptureGroup<'t, Slot, A>,
            ) -> Self::Bags<'t, A> {
                ($(
                    group
                        .lookup::<$sort>(&self.$index.slot)
                        .unwrap_or_else(A::empty::<&'t $sort>),
                )+)
            }
        }
    };
}

impl_slots!(S0: 0);
impl_slots!(S0: 0, S1: 1);
impl_slots!(S0: 0, S1: 1, S2: 2);
impl_slots!(S0: 0, S1: 1, S2: 2, S3: 3);
impl_slots!(S0: 0, S1: 1, S2: 2, S3: 3, S4: 4);

/// Build a pattern over fresh keys, match `term`, and project the captures.
///
/// `None` iff `term` does not match.
pub fn with_captures<'t, A, K, S>(
    term: &'t S,
    build: impl FnOnce(K) -> Pattern<S, Slot>,
) -> Option<K::Bags<'t, A>>
where
    A: Aggregator,
    K: Slots,
    S: Sort,
{
    let keys = K::fresh();
    let pattern = build(keys);
    let group = try_match::<A, S, Slot>(&pattern, term)?;
    Some(keys.project(&group))
}
