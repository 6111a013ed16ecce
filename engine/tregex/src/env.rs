//! Substitution environment for holes.
//!
//! A persistent chain of `(hole, fill)` frames. Each frame keeps the
//! environment it was created in, and a resolved hole continues in that
//! environment, so fills are scoped lexically: a fill never sees bindings
//! introduced inside the body it was plugged into.
//!
//! Fills are borrowed from the pattern being walked (`'p`) and stored
//! type-erased, since a hole's sort may differ from the sort of the pattern
//! that contains it.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use crate::pattern::{HoleId, Name, Pattern};
use crate::shape::Sort;

/// Hole resolutions allowed in a row without entering a constructor layer.
///
/// Legitimate chains are bounded by the nesting of `concat`s in the
/// pattern; anything longer is an iteration whose hole is reachable without
/// consuming structure (e.g. `iter(|h| choice(h, p))`).
const MAX_UNGUARDED_UNFOLDS: u32 = 4096;

struct Frame<'p> {
    hole: HoleId,
    fill: &'p (dyn Any + 'static),
    outer: Env<'p>,
}

/// Hole bindings in scope during a match or a generation run.
///
/// Opaque outside the crate; the dispatch traits only pass it along.
#[derive(Clone, Default)]
pub struct Env<'p> {
    frames: Option<Rc<Frame<'p>>>,
    unfolds: u32,
}

impl<'p> Env<'p> {
    /// Bind `hole` to `fill` on top of this environment.
    #[must_use]
    pub(crate) fn bind(&self, hole: HoleId, fill: &'p (dyn Any + 'static)) -> Self {
        Env {
            frames: Some(Rc::new(Frame {
                hole,
                fill,
                outer: self.clone(),
            })),
            unfolds: self.unfolds,
        }
    }

    /// The same bindings, after entering a constructor layer.
    #[must_use]
    pub(crate) fn guarded(&self) -> Self {
        Env {
            frames: self.frames.clone(),
            unfolds: 0,
        }
    }

    /// Look up `hole`, returning its fill and the environment the fill
    /// was bound in.
    pub(crate) fn resolve<S: Sort, N: Name>(&self, hole: HoleId) -> (&'p Pattern<S, N>, Self) {
        if self.unfolds >= MAX_UNGUARDED_UNFOLDS {
            malformed(format_args!(
                "hole {hole} unfolded {MAX_UNGUARDED_UNFOLDS} times without entering a constructor"
            ));
        }
        let mut cursor = self.frames.as_deref();
        while let Some(frame) = cursor {
            if frame.hole == hole {
                let fill: &'p (dyn Any + 'static) = frame.fill;
                let Some(pattern) = fill.downcast_ref::<Pattern<S, N>>() else {
                    malformed(format_args!(
                        "hole {hole} bound to a pattern of a different sort or name type"
                    ));
                };
                let outer = Env {
                    frames: frame.outer.frames.clone(),
                    unfolds: self.unfolds + 1,
                };
                return (pattern, outer);
            }
            cursor = frame.outer.frames.as_deref();
        }
        malformed(format_args!(
            "hole {hole} used outside the concat or iter that introduced it"
        ))
    }
}

/// Report a pattern defect the type system could not rule out.
#[cold]
#[track_caller]
fn malformed(detail: fmt::Arguments<'_>) -> ! {
    panic!("malformed pattern: {detail}")
}
