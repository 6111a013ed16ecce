//! Shared test fixtures: tree families and pattern builders.
//!
//! - `Tree`: `Leaf | Branch(i64, Tree, Tree)`, a single-sort family.
//! - `Expr` / `Stmt`: a mutually-recursive pair where lambdas and blocks
//!   hold statement collections (`RecMany`).

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

use crate::generate::Generator;
use crate::pattern::Pattern;
use crate::shape::{Choice, Either, Layer, Lit, Opaque, Product, Rec, RecMany, Sort, Unit};

// Tree

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Tree {
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

pub(crate) type TreePattern = Pattern<Tree, &'static str>;

pub(crate) fn leaf_term() -> Tree {
    Tree::Leaf
}

pub(crate) fn branch_term(value: i64, left: Tree, right: Tree) -> Tree {
    Tree::Branch(value, Box::new(left), Box::new(right))
}

pub(crate) fn leaf() -> TreePattern {
    Pattern::inject(Either::Left(()))
}

pub(crate) fn branch(value: Lit<i64>, left: TreePattern, right: TreePattern) -> TreePattern {
    Pattern::inject(Either::Right((value, (left, right))))
}

/// Every branch carries 2; every leaf is captured under `name`.
pub(crate) fn twos_capturing_leaves(name: &'static str) -> TreePattern {
    Pattern::iter(|rest| {
        Pattern::choice(
            Pattern::capture(name, leaf()),
            branch(Lit::Exact(2), rest.clone(), rest),
        )
    })
}

/// Left spine of `depth` branches ending in a leaf, built without recursion.
pub(crate) fn left_spine(depth: usize, value: i64) -> Tree {
    let mut tree = Tree::Leaf;
    for _ in 0..depth {
        tree = branch_term(value, tree, Tree::Leaf);
    }
    tree
}

/// Drop a left spine one level at a time.
pub(crate) fn dismantle(mut tree: Tree) {
    while let Tree::Branch(_, left, _) = tree {
        tree = *left;
    }
}

// Expr / Stmt

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Expr {
    Num(i64),
    Var(String),
    Add(Box<Expr>, Box<Expr>),
    Lambda(Vec<Stmt>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Stmt {
    Assign(String, Expr),
    Block(Vec<Stmt>),
    Return(Expr),
}

impl Sort for Expr {
    type Shape = Choice<
        Opaque<i64>,
        Choice<Opaque<String>, Choice<Product<Rec<Expr>, Rec<Expr>>, RecMany<Stmt>>>,
    >;

    fn view(&self) -> <Self::Shape as Layer>::View<'_> {
        match self {
            Expr::Num(n) => Either::Left(n),
            Expr::Var(name) => Either::Right(Either::Left(name)),
            Expr::Add(left, right) => {
                Either::Right(Either::Right(Either::Left((&**left, &**right))))
            }
            Expr::Lambda(body) => Either::Right(Either::Right(Either::Right(body.as_slice()))),
        }
    }

    fn build(layer: <Self::Shape as Layer>::Owned) -> Self {
        match layer {
            Either::Left(n) => Expr::Num(n),
            Either::Right(Either::Left(name)) => Expr::Var(name),
            Either::Right(Either::Right(Either::Left((left, right)))) => {
                Expr::Add(Box::new(left), Box::new(right))
            }
            Either::Right(Either::Right(Either::Right(body))) => Expr::Lambda(body),
        }
    }
}

impl Sort for Stmt {
    type Shape = Choice<Product<Opaque<String>, Rec<Expr>>, Choice<RecMany<Stmt>, Rec<Expr>>>;

    fn view(&self) -> <Self::Shape as Layer>::View<'_> {
        match self {
            Stmt::Assign(name, value) => Either::Left((name, value)),
            Stmt::Block(body) => Either::Right(Either::Left(body.as_slice())),
            Stmt::Return(value) => Either::Right(Either::Right(value)),
        }
    }

    fn build(layer: <Self::Shape as Layer>::Owned) -> Self {
        match layer {
            Either::Left((name, value)) => Stmt::Assign(name, value),
            Either::Right(Either::Left(body)) => Stmt::Block(body),
            Either::Right(Either::Right(value)) => Stmt::Return(value),
        }
    }
}

pub(crate) type ExprPattern = Pattern<Expr, &'static str>;
pub(crate) type StmtPattern = Pattern<Stmt, &'static str>;

pub(crate) fn num(value: Lit<i64>) -> ExprPattern {
    Pattern::inject(Either::Left(value))
}

pub(crate) fn var(name: Lit<String>) -> ExprPattern {
    Pattern::inject(Either::Right(Either::Left(name)))
}

pub(crate) fn add(left: ExprPattern, right: ExprPattern) -> ExprPattern {
    Pattern::inject(Either::Right(Either::Right(Either::Left((left, right)))))
}

pub(crate) fn lambda(candidates: Vec<StmtPattern>) -> ExprPattern {
    Pattern::inject(Either::Right(Either::Right(Either::Right(candidates))))
}

pub(crate) fn assign(name: Lit<String>, value: ExprPattern) -> StmtPattern {
    Pattern::inject(Either::Left((name, value)))
}

pub(crate) fn block(candidates: Vec<StmtPattern>) -> StmtPattern {
    Pattern::inject(Either::Right(Either::Left(candidates)))
}

pub(crate) fn ret(value: ExprPattern) -> StmtPattern {
    Pattern::inject(Either::Right(Either::Right(value)))
}

pub(crate) fn var_term(name: &str) -> Expr {
    Expr::Var(name.to_owned())
}

// Generators

/// Seeded generator with samplers for every opaque type used above.
pub(crate) fn seeded(seed: u64) -> Generator<StdRng> {
    Generator::new(StdRng::seed_from_u64(seed))
        .with_opaque_sampler(|rng: &mut dyn RngCore| rng.gen_range(-3..=3_i64))
        .with_opaque_sampler(|rng: &mut dyn RngCore| {
            ["x", "y", "z"][rng.gen_range(0..3)].to_owned()
        })
}
