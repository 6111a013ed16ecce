//! Random generation of terms that satisfy a pattern.
//!
//! The walk mirrors matching: the pattern-level cases live here, constructor
//! layers go through [`GenerateLayer`]. Randomness comes from three places,
//! all caller-controlled: the random source itself, registered samplers for
//! `Any` and opaque wildcards, and the collection length range in
//! [`GenerateConfig`].
//!
//! # Termination
//!
//! Generation never returns a term the pattern rejects. When a branch fails
//! (an `Empty` leaf, a missing sampler, the depth limit) the nearest choice
//! retries its other alternatives, and the nearest collection retries its
//! other candidates or falls back to no elements. Only when every option is
//! exhausted does the error reach the caller.
//!
//! Retrying is bounded by [`GenerateConfig::max_attempts`]: every constructor
//! layer entered counts as one attempt, and running out aborts the whole
//! search instead of being retried. A pattern whose every branch recurses
//! would otherwise cost time exponential in `max_depth` before failing.

use std::any::{type_name, Any, TypeId};
use std::ops::RangeInclusive;

use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::dispatch::GenerateLayer;
use crate::env::Env;
use crate::pattern::{Name, Node, Pattern};
use crate::shape::{Payload, Sort};
use crate::stack::ensure_sufficient_stack;

/// Why no term could be generated.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum GenerateError {
    /// Reached a pattern that admits no terms.
    #[error("pattern admits no terms")]
    Empty,
    /// `Any` or a wildcard needs a sampler that was never registered.
    #[error("no sampler registered for `{type_name}`")]
    NoSampler { type_name: &'static str },
    /// The term grew deeper than [`GenerateConfig::max_depth`].
    #[error("generation exceeded the maximum depth of {max_depth}")]
    DepthExceeded { max_depth: usize },
    /// Every alternative of a choice failed.
    #[error("all {tried} alternatives failed to generate")]
    Exhausted { tried: usize },
    /// The run entered [`GenerateConfig::max_attempts`] constructor layers
    /// without producing a term.
    #[error("gave up after {max_attempts} constructor attempts")]
    OutOfAttempts { max_attempts: usize },
}

impl GenerateError {
    /// Whether the failure ends the run rather than just the current branch.
    pub(crate) fn is_fatal(&self) -> bool {
        matches!(self, GenerateError::OutOfAttempts { .. })
    }
}

/// Generation limits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerateConfig {
    /// Maximum number of nested constructor layers.
    pub max_depth: usize,
    /// Lengths sampled for `RecMany` collections.
    pub lengths: RangeInclusive<usize>,
    /// Constructor layers one run may enter, counting abandoned branches.
    pub max_attempts: usize,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        GenerateConfig {
            max_depth: 32,
            lengths: 0..=2,
            max_attempts: 100_000,
        }
    }
}

impl GenerateConfig {
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    #[must_use]
    pub fn with_lengths(mut self, lengths: RangeInclusive<usize>) -> Self {
        self.lengths = lengths;
        self
    }

    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }
}

type SampleFn = Box<dyn Fn(&mut dyn RngCore) -> Box<dyn Any> + Send + Sync>;

/// Where a sampled value is used; a type can be both a sort and a payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum SampleKind {
    /// Whole terms, for `Any`.
    Sort,
    /// Payloads, for wildcards at opaque positions.
    Opaque,
}

/// Samplers keyed by the type they produce and the position they fill.
#[derive(Default)]
struct Samplers {
    by_type: FxHashMap<(TypeId, SampleKind), SampleFn>,
}

impl Samplers {
    fn register<T: 'static>(
        &mut self,
        kind: SampleKind,
        sampler: impl Fn(&mut dyn RngCore) -> T + Send + Sync + 'static,
    ) {
        let erased: SampleFn =
            Box::new(move |rng: &mut dyn RngCore| -> Box<dyn Any> { Box::new(sampler(rng)) });
        self.by_type.insert((TypeId::of::<T>(), kind), erased);
    }

    fn sample<T: 'static>(&self, kind: SampleKind, rng: &mut dyn RngCore) -> Result<T, GenerateError> {
        let missing = || GenerateError::NoSampler {
            type_name: type_name::<T>(),
        };
        let sampler = self
            .by_type
            .get(&(TypeId::of::<T>(), kind))
            .ok_or_else(missing)?;
        sampler(rng)
            .downcast::<T>()
            .map(|value| *value)
            .map_err(|_| missing())
    }
}

/// Produces random terms satisfying patterns.
///
/// Owns the random source; concurrent generation needs one generator per
/// thread.
pub struct Generator<R> {
    rng: R,
    samplers: Samplers,
    config: GenerateConfig,
    depth: usize,
    attempts: usize,
}

impl<R: RngCore> Generator<R> {
    pub fn new(rng: R) -> Self {
        Generator {
            rng,
            samplers: Samplers::default(),
            config: GenerateConfig::default(),
            depth: 0,
            attempts: 0,
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: GenerateConfig) -> Self {
        self.config = config;
        self
    }

    /// Sampler used when `Any` is reached at sort `S`.
    #[must_use]
    pub fn with_sort_sampler<S: Sort>(
        mut self,
        sampler: impl Fn(&mut dyn RngCore) -> S + Send + Sync + 'static,
    ) -> Self {
        self.samplers.register(SampleKind::Sort, sampler);
        self
    }

    /// Sampler used for wildcards at `Opaque<T>` positions.
    #[must_use]
    pub fn with_opaque_sampler<T: Payload>(
        mut self,
        sampler: impl Fn(&mut dyn RngCore) -> T + Send + Sync + 'static,
    ) -> Self {
        self.samplers.register(SampleKind::Opaque, sampler);
        self
    }

    pub fn config(&self) -> &GenerateConfig {
        &self.config
    }

    /// Generate a term matched by `pattern`.
    pub fn generate<S: Sort, N: Name>(&mut self, pattern: &Pattern<S, N>) -> Result<S, GenerateError> {
        tracing::debug!(sort = type_name::<S>(), "generating term");
        self.depth = 0;
        self.attempts = 0;
        let generated = self.generate_in(pattern, &Env::default());
        match &generated {
            Ok(_) => tracing::debug!(sort = type_name::<S>(), "generated term"),
            Err(err) => tracing::debug!(sort = type_name::<S>(), %err, "generation failed"),
        }
        generated
    }

    pub(crate) fn generate_in<'p, S: Sort, N: Name>(
        &mut self,
        pattern: &'p Pattern<S, N>,
        env: &Env<'p>,
    ) -> Result<S, GenerateError> {
        ensure_sufficient_stack(|| match pattern.node() {
            Node::Empty => Err(GenerateError::Empty),
            Node::Any => self.sample::<S>(SampleKind::Sort),
            Node::Inject(layer) => self.descend(|generator| {
                <S::Shape as GenerateLayer>::generate_layer::<N, R>(layer, &env.guarded(), generator)
                    .map(S::build)
            }),
            Node::Choice(..) => self.generate_choice(pattern, env),
            Node::Capture(_, inner) => self.generate_in(inner, env),
            Node::Hole(hole) => {
                let (filled, outer) = env.resolve::<S, N>(*hole);
                self.generate_in(filled, &outer)
            }
            Node::Concat { hole, body, fill } => self.generate_in(body, &env.bind(*hole, &**fill)),
            Node::Iter { hole, body } => self.generate_in(body, &env.bind(*hole, pattern)),
        })
    }

    /// Try the non-empty alternatives in random order until one succeeds.
    fn generate_choice<'p, S: Sort, N: Name>(
        &mut self,
        pattern: &'p Pattern<S, N>,
        env: &Env<'p>,
    ) -> Result<S, GenerateError> {
        let mut alternatives: SmallVec<[&'p Pattern<S, N>; 4]> = SmallVec::new();
        pattern.alternatives(&mut alternatives);
        if alternatives.is_empty() {
            return Err(GenerateError::Empty);
        }
        alternatives.shuffle(&mut self.rng);

        let tried = alternatives.len();
        for (attempt, alternative) in alternatives.into_iter().enumerate() {
            match self.generate_in(alternative, env) {
                Ok(term) => return Ok(term),
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => tracing::trace!(attempt, %err, "alternative failed, trying the next"),
            }
        }
        Err(GenerateError::Exhausted { tried })
    }

    /// Run `f` one constructor layer deeper.
    fn descend<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, GenerateError>,
    ) -> Result<T, GenerateError> {
        if self.attempts >= self.config.max_attempts {
            return Err(GenerateError::OutOfAttempts {
                max_attempts: self.config.max_attempts,
            });
        }
        self.attempts += 1;
        if self.depth >= self.config.max_depth {
            return Err(GenerateError::DepthExceeded {
                max_depth: self.config.max_depth,
            });
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    pub(crate) fn sample<T: 'static>(&mut self, kind: SampleKind) -> Result<T, GenerateError> {
        self.samplers.sample::<T>(kind, &mut self.rng)
    }

    pub(crate) fn sample_length(&mut self) -> usize {
        let lengths = self.config.lengths.clone();
        if lengths.is_empty() {
            return 0;
        }
        self.rng.gen_range(lengths)
    }

    pub(crate) fn rng(&mut self) -> &mut R {
        &mut self.rng
    }
}
