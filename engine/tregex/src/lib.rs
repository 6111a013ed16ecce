//! Tregex - tree regular expressions over generic tree families.
//!
//! This crate provides:
//! - A closed shape algebra (`Unit`, `Rec`, `RecMany`, `Opaque`, `Choice`,
//!   `Product`) that describes one constructor layer of any tree family
//! - `Pattern`, the tree regular expression AST (empty, any, injection,
//!   choice, capture, and holes for concatenation and iteration)
//! - Plain matching, capturing matching with pluggable aggregation, and
//!   random generation of terms that satisfy a pattern
//!
//! # Architecture
//!
//! A tree type opts in by implementing [`Sort`]: it names its shape and
//! converts one layer to and from that shape. Everything below the top
//! pattern layer is handled by the per-capability dispatch traits
//! (`MatchLayer`, `CaptureLayer`, `GenerateLayer`), each implemented once
//! per shape case, so a new family needs no engine code.
//!
//! Holes are numbered placeholders resolved through a substitution
//! environment while walking the term. `Pattern::iter` binds its own hole
//! to itself, so an unbounded pattern is only ever unfolded as deep as the
//! term (or the generator) demands.
//!
//! # Captures
//!
//! Captured sub-terms are borrowed from the matched term and stored behind
//! `dyn Any`, keyed by name and sort. [`CaptureGroup::lookup`] recovers the
//! typed container; the sort key makes the downcast infallible.

mod capture;
mod dispatch;
mod env;
mod generate;
mod matching;
mod pattern;
mod shape;
mod slots;
mod stack;

#[cfg(test)]
mod test_helpers;

pub use capture::{Aggregator, CaptureGroup, CollectAll, FirstWins};
pub use dispatch::{CaptureLayer, GenerateLayer, MatchLayer};
pub use env::Env;
pub use generate::{GenerateConfig, GenerateError, Generator};
pub use matching::{captures, matches, try_match};
pub use pattern::{Name, Pattern};
pub use shape::{
    Choice, Either, Layer, Lit, Opaque, Payload, Product, Rec, RecMany, Shape, Sort, Unit,
};
pub use slots::{with_captures, Key, Slot, Slots};
