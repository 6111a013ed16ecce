//! Generic dispatch over the six shape cases.
//!
//! One trait per capability, each implemented once per case. A tree family
//! gets all three for free by composing the cases in its [`Sort::Shape`];
//! the recursive cases hand control back to the pattern-level walkers in
//! `matching` and `generate`.
//!
//! | Case           | match                          | capture                                   |
//! |----------------|--------------------------------|-------------------------------------------|
//! | `Unit`         | true                           | no captures                               |
//! | `Rec`          | match the child                | the child's captures                      |
//! | `RecMany`      | some candidate matches all     | first candidate matching all, merged      |
//! | `Opaque`       | wildcard, or payload equality  | no captures                               |
//! | `Choice`       | same side only                 | same side only                            |
//! | `Product`      | both parts                     | both parts, left captures first           |

use rand::seq::SliceRandom;
use rand::RngCore;
use smallvec::SmallVec;

use crate::capture::{Aggregator, CaptureGroup};
use crate::env::Env;
use crate::generate::{GenerateError, Generator, SampleKind};
use crate::matching::{capture_in, matches_in};
use crate::pattern::{Name, Pattern};
use crate::shape::{Choice, Either, Layer, Lit, Opaque, Payload, Product, Rec, RecMany, Sort, Unit};

/// Plain matching of one layer.
pub trait MatchLayer: Layer {
    fn matches_layer<'p, 'v, N: Name>(
        pattern: &'p Self::Pat<N>,
        view: Self::View<'v>,
        env: &Env<'p>,
    ) -> bool;
}

/// Capturing matching of one layer.
pub trait CaptureLayer: Layer {
    fn capture_layer<'p, 't, N: Name, A: Aggregator>(
        pattern: &'p Self::Pat<N>,
        view: Self::View<'t>,
        env: &Env<'p>,
    ) -> Option<CaptureGroup<'t, N, A>>;
}

/// Generation of one layer.
pub trait GenerateLayer: Layer {
    fn generate_layer<'p, N: Name, R: RngCore>(
        pattern: &'p Self::Pat<N>,
        env: &Env<'p>,
        generator: &mut Generator<R>,
    ) -> Result<Self::Owned, GenerateError>;

    /// Whether `pattern` pins exactly one layer value.
    fn is_concrete<N: Name>(pattern: &Self::Pat<N>) -> bool;
}

// Unit

impl MatchLayer for Unit {
    fn matches_layer<'p, 'v, N: Name>(_: &'p (), _: Self::View<'v>, _: &Env<'p>) -> bool {
        true
    }
}

impl CaptureLayer for Unit {
    fn capture_layer<'p, 't, N: Name, A: Aggregator>(
        _: &'p (),
        _: Self::View<'t>,
        _: &Env<'p>,
    ) -> Option<CaptureGroup<'t, N, A>> {
        Some(CaptureGroup::new())
    }
}

impl GenerateLayer for Unit {
    fn generate_layer<'p, N: Name, R: RngCore>(
        _: &'p (),
        _: &Env<'p>,
        _: &mut Generator<R>,
    ) -> Result<(), GenerateError> {
        Ok(())
    }

    fn is_concrete<N: Name>((): &()) -> bool {
        true
    }
}

// Rec

impl<S: Sort> MatchLayer for Rec<S> {
    fn matches_layer<'p, 'v, N: Name>(
        pattern: &'p Pattern<S, N>,
        child: Self::View<'v>,
        env: &Env<'p>,
    ) -> bool {
        matches_in(pattern, child, env)
    }
}

impl<S: Sort> CaptureLayer for Rec<S> {
    fn capture_layer<'p, 't, N: Name, A: Aggregator>(
        pattern: &'p Pattern<S, N>,
        child: Self::View<'t>,
        env: &Env<'p>,
    ) -> Option<CaptureGroup<'t, N, A>> {
        capture_in(pattern, child, env)
    }
}

impl<S: Sort> GenerateLayer for Rec<S> {
    fn generate_layer<'p, N: Name, R: RngCore>(
        pattern: &'p Pattern<S, N>,
        env: &Env<'p>,
        generator: &mut Generator<R>,
    ) -> Result<S, GenerateError> {
        generator.generate_in(pattern, env)
    }

    fn is_concrete<N: Name>(pattern: &Pattern<S, N>) -> bool {
        pattern.is_concrete()
    }
}

// RecMany

impl<S: Sort> MatchLayer for RecMany<S> {
    fn matches_layer<'p, 'v, N: Name>(
        candidates: &'p Vec<Pattern<S, N>>,
        children: Self::View<'v>,
        env: &Env<'p>,
    ) -> bool {
        candidates.iter().any(|candidate| {
            children
                .iter()
                .all(|child| matches_in(candidate, child, env))
        })
    }
}

impl<S: Sort> CaptureLayer for RecMany<S> {
    /// Only the first candidate that matches every child contributes;
    /// children are never split across different candidates.
    fn capture_layer<'p, 't, N: Name, A: Aggregator>(
        candidates: &'p Vec<Pattern<S, N>>,
        children: Self::View<'t>,
        env: &Env<'p>,
    ) -> Option<CaptureGroup<'t, N, A>> {
        candidates
            .iter()
            .enumerate()
            .find_map(|(index, candidate)| {
                let group = children.iter().try_fold(CaptureGroup::new(), |group, child| {
                    Some(group.merge(capture_in(candidate, child, env)?))
                })?;
                tracing::trace!(
                    candidate = index,
                    children = children.len(),
                    "collection matched by candidate"
                );
                Some(group)
            })
    }
}

impl<S: Sort> GenerateLayer for RecMany<S> {
    /// Every element comes from one candidate, so the result is accepted by
    /// the match rule above. A concrete candidate is tried first; if no
    /// candidate yields a full collection the empty collection is used,
    /// which any non-empty candidate list accepts. Running out of attempts
    /// is passed up instead.
    fn generate_layer<'p, N: Name, R: RngCore>(
        candidates: &'p Vec<Pattern<S, N>>,
        env: &Env<'p>,
        generator: &mut Generator<R>,
    ) -> Result<Vec<S>, GenerateError> {
        if candidates.is_empty() {
            return Err(GenerateError::Empty);
        }
        let length = generator.sample_length();
        if length == 0 {
            return Ok(Vec::new());
        }

        let mut order: SmallVec<[&'p Pattern<S, N>; 4]> = candidates.iter().collect();
        order.shuffle(generator.rng());
        if let Some(position) = order.iter().position(|candidate| candidate.is_concrete()) {
            order.swap(0, position);
        }

        for candidate in order {
            let children: Result<Vec<S>, GenerateError> = (0..length)
                .map(|_| generator.generate_in(candidate, env))
                .collect();
            match children {
                Ok(children) => return Ok(children),
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => tracing::trace!(%err, length, "collection candidate failed"),
            }
        }
        tracing::trace!("no candidate filled the collection, generating it empty");
        Ok(Vec::new())
    }

    fn is_concrete<N: Name>(_: &Vec<Pattern<S, N>>) -> bool {
        false
    }
}

// Opaque

impl<T: Payload> MatchLayer for Opaque<T> {
    fn matches_layer<'p, 'v, N: Name>(
        pattern: &'p Lit<T>,
        value: Self::View<'v>,
        _: &Env<'p>,
    ) -> bool {
        literal_matches(pattern, value)
    }
}

impl<T: Payload> CaptureLayer for Opaque<T> {
    fn capture_layer<'p, 't, N: Name, A: Aggregator>(
        pattern: &'p Lit<T>,
        value: Self::View<'t>,
        _: &Env<'p>,
    ) -> Option<CaptureGroup<'t, N, A>> {
        literal_matches(pattern, value).then(CaptureGroup::new)
    }
}

impl<T: Payload> GenerateLayer for Opaque<T> {
    fn generate_layer<'p, N: Name, R: RngCore>(
        pattern: &'p Lit<T>,
        _: &Env<'p>,
        generator: &mut Generator<R>,
    ) -> Result<T, GenerateError> {
        match pattern {
            Lit::Exact(value) => Ok(value.clone()),
            Lit::Wildcard => generator.sample::<T>(SampleKind::Opaque),
        }
    }

    fn is_concrete<N: Name>(pattern: &Lit<T>) -> bool {
        !pattern.is_wildcard()
    }
}

fn literal_matches<T: PartialEq>(pattern: &Lit<T>, value: &T) -> bool {
    match pattern {
        Lit::Wildcard => true,
        Lit::Exact(expected) => expected == value,
    }
}

// Choice

impl<A: MatchLayer, B: MatchLayer> MatchLayer for Choice<A, B> {
    fn matches_layer<'p, 'v, N: Name>(
        pattern: &'p Self::Pat<N>,
        view: Self::View<'v>,
        env: &Env<'p>,
    ) -> bool {
        match (pattern, view) {
            (Either::Left(pattern), Either::Left(view)) => {
                A::matches_layer::<N>(pattern, view, env)
            }
            (Either::Right(pattern), Either::Right(view)) => {
                B::matches_layer::<N>(pattern, view, env)
            }
            _ => false,
        }
    }
}

impl<A: CaptureLayer, B: CaptureLayer> CaptureLayer for Choice<A, B> {
    fn capture_layer<'p, 't, N: Name, G: Aggregator>(
        pattern: &'p Self::Pat<N>,
        view: Self::View<'t>,
        env: &Env<'p>,
    ) -> Option<CaptureGroup<'t, N, G>> {
        match (pattern, view) {
            (Either::Left(pattern), Either::Left(view)) => {
                A::capture_layer::<N, G>(pattern, view, env)
            }
            (Either::Right(pattern), Either::Right(view)) => {
                B::capture_layer::<N, G>(pattern, view, env)
            }
            _ => None,
        }
    }
}

impl<A: GenerateLayer, B: GenerateLayer> GenerateLayer for Choice<A, B> {
    fn generate_layer<'p, N: Name, R: RngCore>(
        pattern: &'p Self::Pat<N>,
        env: &Env<'p>,
        generator: &mut Generator<R>,
    ) -> Result<Self::Owned, GenerateError> {
        match pattern {
            Either::Left(pattern) => {
                A::generate_layer::<N, R>(pattern, env, generator).map(Either::Left)
            }
            Either::Right(pattern) => {
                B::generate_layer::<N, R>(pattern, env, generator).map(Either::Right)
            }
        }
    }

    fn is_concrete<N: Name>(pattern: &Self::Pat<N>) -> bool {
        match pattern {
            Either::Left(pattern) => A::is_concrete::<N>(pattern),
            Either::Right(pattern) => B::is_concrete::<N>(pattern),
        }
    }
}

// Product

impl<A: MatchLayer, B: MatchLayer> MatchLayer for Product<A, B> {
    fn matches_layer<'p, 'v, N: Name>(
        (first, second): &'p Self::Pat<N>,
        (left, right): Self::View<'v>,
        env: &Env<'p>,
    ) -> bool {
        A::matches_layer::<N>(first, left, env) && B::matches_layer::<N>(second, right, env)
    }
}

impl<A: CaptureLayer, B: CaptureLayer> CaptureLayer for Product<A, B> {
    fn capture_layer<'p, 't, N: Name, G: Aggregator>(
        (first, second): &'p Self::Pat<N>,
        (left, right): Self::View<'t>,
        env: &Env<'p>,
    ) -> Option<CaptureGroup<'t, N, G>> {
        let left = A::capture_layer::<N, G>(first, left, env)?;
        let right = B::capture_layer::<N, G>(second, right, env)?;
        Some(left.merge(right))
    }
}

impl<A: GenerateLayer, B: GenerateLayer> GenerateLayer for Product<A, B> {
    fn generate_layer<'p, N: Name, R: RngCore>(
        (first, second): &'p Self::Pat<N>,
        env: &Env<'p>,
        generator: &mut Generator<R>,
    ) -> Result<Self::Owned, GenerateError> {
        let left = A::generate_layer::<N, R>(first, env, generator)?;
        let right = B::generate_layer::<N, R>(second, env, generator)?;
        Ok((left, right))
    }

    fn is_concrete<N: Name>((first, second): &Self::Pat<N>) -> bool {
        A::is_concrete::<N>(first) && B::is_concrete::<N>(second)
    }
}
