//! Property-based tests for matching, capturing and generation.
//!
//! Random binary trees are matched against random patterns built from a
//! small recipe language, checking:
//! 1. Agreement: capturing succeeds exactly when plain matching does
//! 2. Soundness: every captured term is a node of the matched term
//! 3. Choice priority: the first matching alternative decides the captures
//! 4. Unfolding: `iter(f)` matches exactly what `f(iter(f))` matches
//! 5. Aggregation: `FirstWins` keeps the head of what `CollectAll` keeps
//! 6. Generation: every generated term matches its pattern

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]

use std::collections::HashSet;

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tregex::{
    captures, matches, try_match, CaptureGroup, Choice, CollectAll, Either, FirstWins, GenerateConfig,
    Generator, Layer, Lit, Opaque, Pattern, Product, Rec, Sort, Unit,
};

// -- Tree Family --

#[derive(Clone, Debug, PartialEq, Eq)]
enum Tree {
    Leaf,
    Branch(i64, Box<Tree>, Box<Tree>),
}

impl Sort for Tree {
    type Shape = Choice<Unit, Product<Opaque<i64>, Product<Rec<Tree>, Rec<Tree>>>>;

    fn view(&self) -> <Self::Shape as Layer>::View<'_> {
        match self {
            Tree::Leaf => Either::Left(()),
            Tree::Branch(value, left, right) => Either::Right((value, (&**left, &**right))),
        }
    }

    fn build(layer: <Self::Shape as Layer>::Owned) -> Self {
        match layer {
            Either::Left(()) => Tree::Leaf,
            Either::Right((value, (left, right))) => {
                Tree::Branch(value, Box::new(left), Box::new(right))
            }
        }
    }
}

type TreePattern = Pattern<Tree>;

const NAMES: [&str; 3] = ["a", "b", "leaf"];

fn leaf() -> TreePattern {
    Pattern::inject(Either::Left(()))
}

fn branch(value: Lit<i64>, left: TreePattern, right: TreePattern) -> TreePattern {
    Pattern::inject(Either::Right((value, (left, right))))
}

fn literal(value: Option<i64>) -> Lit<i64> {
    value.map_or(Lit::Wildcard, Lit::Exact)
}

/// Addresses of every node of `tree`.
fn nodes(tree: &Tree) -> HashSet<*const Tree> {
    let mut seen = HashSet::new();
    let mut pending = vec![tree];
    while let Some(node) = pending.pop() {
        seen.insert(std::ptr::from_ref(node));
        if let Tree::Branch(_, left, right) = node {
            pending.push(&**left);
            pending.push(&**right);
        }
    }
    seen
}

// -- Pattern Recipes --

/// A printable description of a pattern.
#[derive(Clone, Debug)]
enum Recipe {
    Empty,
    Any,
    Leaf,
    Branch(Option<i64>, Box<Recipe>, Box<Recipe>),
    Choice(Box<Recipe>, Box<Recipe>),
    Capture(&'static str, Box<Recipe>),
    /// Branches carrying the value, leaves captured as `leaf`.
    Iter(Option<i64>),
}

impl Recipe {
    fn build(&self) -> TreePattern {
        match self {
            Recipe::Empty => Pattern::empty(),
            Recipe::Any => Pattern::any(),
            Recipe::Leaf => leaf(),
            Recipe::Branch(value, left, right) => {
                branch(literal(*value), left.build(), right.build())
            }
            Recipe::Choice(first, second) => Pattern::choice(first.build(), second.build()),
            Recipe::Capture(name, inner) => Pattern::capture(*name, inner.build()),
            Recipe::Iter(value) => {
                let value = *value;
                Pattern::iter(|rest| {
                    Pattern::choice(
                        Pattern::capture("leaf", leaf()),
                        branch(literal(value), rest.clone(), rest),
                    )
                })
            }
        }
    }
}

// -- Iteration Bodies --
//
// Each one consumes a constructor before reaching its hole.

fn any_branches(rest: TreePattern) -> TreePattern {
    Pattern::choice(leaf(), branch(Lit::Wildcard, rest.clone(), rest))
}

fn left_ones(rest: TreePattern) -> TreePattern {
    Pattern::choice(leaf(), branch(Lit::Exact(1), rest, leaf()))
}

fn right_spine(rest: TreePattern) -> TreePattern {
    Pattern::choice(
        branch(Lit::Exact(0), leaf(), leaf()),
        branch(Lit::Wildcard, leaf(), rest),
    )
}

fn captured_twos(rest: TreePattern) -> TreePattern {
    Pattern::capture(
        "a",
        Pattern::choice(leaf(), branch(Lit::Exact(2), rest, Pattern::any())),
    )
}

const BODIES: [fn(TreePattern) -> TreePattern; 4] =
    [any_branches, left_ones, right_spine, captured_twos];

fn names(group: Option<CaptureGroup<'_, &'static str, CollectAll>>) -> Option<Vec<&'static str>> {
    group.map(|group| group.names().copied().collect())
}

// -- Strategies --

fn value_strategy() -> impl Strategy<Value = i64> {
    0..3_i64
}

fn tree_strategy() -> impl Strategy<Value = Tree> {
    Just(Tree::Leaf).prop_recursive(6, 48, 2, |inner| {
        (value_strategy(), inner.clone(), inner)
            .prop_map(|(value, left, right)| Tree::Branch(value, Box::new(left), Box::new(right)))
    })
}

fn recipe_strategy() -> impl Strategy<Value = Recipe> {
    let base = prop_oneof![
        Just(Recipe::Empty),
        Just(Recipe::Any),
        Just(Recipe::Leaf),
        proptest::option::of(value_strategy()).prop_map(Recipe::Iter),
    ];
    base.prop_recursive(4, 24, 2, |inner| {
        prop_oneof![
            (proptest::option::of(value_strategy()), inner.clone(), inner.clone()).prop_map(
                |(value, left, right)| Recipe::Branch(value, Box::new(left), Box::new(right))
            ),
            (inner.clone(), inner.clone())
                .prop_map(|(first, second)| Recipe::Choice(Box::new(first), Box::new(second))),
            (prop::sample::select(vec!["a", "b"]), inner)
                .prop_map(|(name, inner)| Recipe::Capture(name, Box::new(inner))),
        ]
    })
}

fn generator(seed: u64) -> Generator<StdRng> {
    Generator::new(StdRng::seed_from_u64(seed))
        .with_config(GenerateConfig::default().with_max_depth(8))
        .with_opaque_sampler(|rng| rng.gen_range(0..3_i64))
        .with_sort_sampler(|_| Tree::Leaf)
}

// -- Property Tests --

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 1000,
        ..ProptestConfig::default()
    })]

    /// Capturing succeeds exactly when matching does.
    #[test]
    fn prop_capture_agrees_with_match(recipe in recipe_strategy(), tree in tree_strategy()) {
        let pattern = recipe.build();
        prop_assert_eq!(captures(&pattern, &tree).is_some(), matches(&pattern, &tree));
        prop_assert_eq!(
            try_match::<FirstWins, _, _>(&pattern, &tree).is_some(),
            matches(&pattern, &tree)
        );
    }

    /// Captured terms are borrowed nodes of the matched term.
    #[test]
    fn prop_captures_are_subterms(recipe in recipe_strategy(), tree in tree_strategy()) {
        let pattern = recipe.build();
        if let Some(group) = captures(&pattern, &tree) {
            let nodes = nodes(&tree);
            for name in NAMES {
                for captured in group.lookup::<Tree>(&name).unwrap_or_default() {
                    prop_assert!(nodes.contains(&std::ptr::from_ref(captured)), "{name}");
                }
            }
        }
    }

    /// `FirstWins` keeps exactly the first term `CollectAll` collects.
    #[test]
    fn prop_first_wins_is_head_of_collect_all(recipe in recipe_strategy(), tree in tree_strategy()) {
        let pattern = recipe.build();
        let all = captures(&pattern, &tree);
        let first = try_match::<FirstWins, _, _>(&pattern, &tree);
        if let (Some(all), Some(first)) = (all, first) {
            for name in NAMES {
                let head = all.lookup::<Tree>(&name).and_then(|terms| terms.first().copied());
                let kept = first.lookup::<Tree>(&name).flatten();
                prop_assert_eq!(head.map(std::ptr::from_ref), kept.map(std::ptr::from_ref));
            }
        }
    }

    /// A choice takes its captures from the first matching alternative.
    #[test]
    fn prop_choice_priority(
        first in recipe_strategy(),
        second in recipe_strategy(),
        tree in tree_strategy(),
    ) {
        let (first, second) = (first.build(), second.build());
        let combined = captures(&Pattern::choice(first.clone(), second.clone()), &tree);
        let expected = if matches(&first, &tree) {
            captures(&first, &tree)
        } else {
            captures(&second, &tree)
        };
        prop_assert_eq!(names(combined), names(expected));
    }

    /// Iteration is its own one-level unfolding.
    #[test]
    fn prop_iteration_unfolds(body in 0..BODIES.len(), tree in tree_strategy()) {
        let body = BODIES[body];
        let iterated = Pattern::iter(body);
        let unfolded = body(iterated.clone());
        prop_assert_eq!(matches(&iterated, &tree), matches(&unfolded, &tree));
        prop_assert_eq!(
            captures(&iterated, &tree).map(|group| group.lookup::<Tree>(&"a").unwrap_or_default().len()),
            captures(&unfolded, &tree).map(|group| group.lookup::<Tree>(&"a").unwrap_or_default().len())
        );
    }

    /// Generated terms are matched by the pattern they came from.
    #[test]
    fn prop_generated_terms_match(recipe in recipe_strategy(), seed in any::<u64>()) {
        let pattern = recipe.build();
        if let Ok(term) = generator(seed).generate(&pattern) {
            prop_assert!(matches(&pattern, &term), "{term:?}");
        }
    }
}

/// Generation fails only for patterns that admit no terms at all.
#[test]
fn generation_succeeds_on_satisfiable_patterns() {
    let patterns = [
        Recipe::Iter(None),
        Recipe::Iter(Some(2)),
        Recipe::Choice(Box::new(Recipe::Empty), Box::new(Recipe::Leaf)),
        Recipe::Branch(None, Box::new(Recipe::Any), Box::new(Recipe::Capture("a", Box::new(Recipe::Leaf)))),
    ];
    for (index, recipe) in patterns.iter().enumerate() {
        let pattern = recipe.build();
        for seed in 0..16 {
            let term = generator(seed).generate(&pattern).unwrap();
            assert!(matches(&pattern, &term), "pattern {index}, seed {seed}");
        }
    }
}
