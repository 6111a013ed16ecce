//! Shape descriptors - the closed algebra every tree family reduces to.
//!
//! A shape describes exactly one constructor layer. The six cases are
//! zero-sized marker types; the data flowing through a layer is carried by
//! the associated types of [`Layer`]:
//!
//! | Case            | `View<'t>` (matching)   | `Owned` (generation) | `Pat<N>` (pattern)      |
//! |-----------------|-------------------------|----------------------|-------------------------|
//! | `Unit`          | `()`                    | `()`                 | `()`                    |
//! | `Rec<S>`        | `&'t S`                 | `S`                  | `Pattern<S, N>`         |
//! | `RecMany<S>`    | `&'t [S]`               | `Vec<S>`             | `Vec<Pattern<S, N>>`    |
//! | `Opaque<T>`     | `&'t T`                 | `T`                  | `Lit<T>`                |
//! | `Choice<A, B>`  | `Either<A::View, ..>`   | `Either<..>`         | `Either<..>`            |
//! | `Product<A, B>` | `(A::View, B::View)`    | `(A::Owned, ..)`     | `(A::Pat, B::Pat)`      |
//!
//! Because a pattern layer is a different instantiation of the same shape
//! as the term layer, a pattern can never disagree with its term about the
//! shape of a constructor.

use std::marker::PhantomData;

use crate::dispatch::{CaptureLayer, GenerateLayer, MatchLayer};
use crate::pattern::{Name, Pattern};

mod sealed {
    pub trait Sealed {}
}

/// One constructor layer of a tree family.
///
/// Sealed: the algebra is closed, families compose the six cases instead of
/// adding new ones.
pub trait Layer: sealed::Sealed + 'static {
    /// Borrowed projection of a term layer.
    type View<'t>;
    /// Owned layer, rebuilt into a term after generation.
    type Owned;
    /// Pattern layer over capture names `N`.
    type Pat<N: Name>: Send + Sync + 'static;
}

/// A layer that supports every engine capability.
///
/// Blanket-implemented; any nesting of the six cases qualifies.
pub trait Shape: MatchLayer + CaptureLayer + GenerateLayer {}

impl<L: MatchLayer + CaptureLayer + GenerateLayer> Shape for L {}

/// A tree type (one sort of a possibly mutually-recursive family).
///
/// `view` and `build` must be inverse to each other: every value has exactly
/// one shape layer and every shape layer denotes exactly one value.
pub trait Sort: Sized + Send + Sync + 'static {
    type Shape: Shape;

    /// Project the top constructor layer.
    fn view(&self) -> <Self::Shape as Layer>::View<'_>;

    /// Rebuild a value from its top constructor layer.
    fn build(layer: <Self::Shape as Layer>::Owned) -> Self;
}

/// Values allowed at opaque (non-recursive) positions.
pub trait Payload: PartialEq + Clone + Send + Sync + 'static {}

impl<T: PartialEq + Clone + Send + Sync + 'static> Payload for T {}

/// Constructor without fields.
pub struct Unit;

/// Exactly one recursive child of sort `S`.
pub struct Rec<S>(PhantomData<fn() -> S>);

/// An ordered collection of recursive children of sort `S`.
pub struct RecMany<S>(PhantomData<fn() -> S>);

/// A non-recursive payload compared by equality.
pub struct Opaque<T>(PhantomData<fn() -> T>);

/// A sum of two shapes; encodes the constructors of a sort.
pub struct Choice<A, B>(PhantomData<fn() -> (A, B)>);

/// Two independent parts; encodes a constructor's field list.
pub struct Product<A, B>(PhantomData<fn() -> (A, B)>);

/// Which side of a [`Choice`] a layer uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Either<L, R> {
    Left(L),
    Right(R),
}

/// Pattern at an opaque position.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Lit<T> {
    /// Matches every payload.
    Wildcard,
    /// Matches payloads equal to the given one.
    Exact(T),
}

impl<T> Lit<T> {
    pub fn is_wildcard(&self) -> bool {
        matches!(self, Lit::Wildcard)
    }
}

impl<T> From<T> for Lit<T> {
    fn from(value: T) -> Self {
        Lit::Exact(value)
    }
}

impl sealed::Sealed for Unit {}
impl<S> sealed::Sealed for Rec<S> {}
impl<S> sealed::Sealed for RecMany<S> {}
impl<T> sealed::Sealed for Opaque<T> {}
impl<A, B> sealed::Sealed for Choice<A, B> {}
impl<A, B> sealed::Sealed for Product<A, B> {}

impl Layer for Unit {
    type View<'t> = ();
    type Owned = ();
    type Pat<N: Name> = ();
}

impl<S: Sort> Layer for Rec<S> {
    type View<'t> = &'t S;
    type Owned = S;
    type Pat<N: Name> = Pattern<S, N>;
}

impl<S: Sort> Layer for RecMany<S> {
    type View<'t> = &'t [S];
    type Owned = Vec<S>;
    /// Candidate patterns; one of them has to match every child.
    type Pat<N: Name> = Vec<Pattern<S, N>>;
}

impl<T: Payload> Layer for Opaque<T> {
    type View<'t> = &'t T;
    type Owned = T;
    type Pat<N: Name> = Lit<T>;
}

impl<A: Layer, B: Layer> Layer for Choice<A, B> {
    type View<'t> = Either<A::View<'t>, B::View<'t>>;
    type Owned = Either<A::Owned, B::Owned>;
    type Pat<N: Name> = Either<A::Pat<N>, B::Pat<N>>;
}

impl<A: Layer, B: Layer> Layer for Product<A, B> {
    type View<'t> = (A::View<'t>, B::View<'t>);
    type Owned = (A::Owned, B::Owned);
    type Pat<N: Name> = (A::Pat<N>, B::Pat<N>);
}
