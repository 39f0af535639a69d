pub mod config;
pub mod nelder_mead;
pub mod simplex;

use num_traits::Float;
use std::fmt::Debug;

pub use config::{Coefficients, SolverConfig};
pub use nelder_mead::{NelderMead, Transform};
pub use simplex::Simplex;

/// A trait for objective functions that can be minimized.
///
/// The objective is treated as a pure mapping from a point to a real number:
/// the solver only ever evaluates it and compares the results. It is never
/// assumed to be differentiable, convex or even continuous.
///
/// Any `Fn(&[T]) -> T` closure or function item implements this trait, so
/// named structs and closures can be passed interchangeably. With the
/// `parallel` feature the objective must also be `Sync`.
pub trait ObjectiveFunction<T>: MaybeSync
where
    T: Float + Debug,
{
    /// Evaluates the objective function at the given point.
    fn evaluate(&self, point: &[T]) -> T;
}

impl<T, F> ObjectiveFunction<T> for F
where
    T: Float + Debug,
    F: Fn(&[T]) -> T + MaybeSync,
{
    fn evaluate(&self, point: &[T]) -> T {
        self(point)
    }
}

/// `Sync` when vertices are evaluated in parallel, no bound otherwise.
#[cfg(feature = "parallel")]
pub trait MaybeSync: Sync {}
#[cfg(feature = "parallel")]
impl<T: Sync + ?Sized> MaybeSync for T {}

#[cfg(not(feature = "parallel"))]
pub trait MaybeSync {}
#[cfg(not(feature = "parallel"))]
impl<T: ?Sized> MaybeSync for T {}

/// A simplex vertex together with its objective value.
#[derive(Debug, Clone, PartialEq)]
pub struct Vertex<T> {
    pub point: Vec<T>,
    pub value: T,
}

impl<T> Vertex<T> {
    pub fn new(point: Vec<T>, value: T) -> Self {
        Self { point, value }
    }
}

/// The vertices an iteration decides on, as produced by [`Simplex::order`].
#[derive(Debug, Clone, PartialEq)]
pub struct RankedVertices<T> {
    /// Rank 0.
    pub best: Vertex<T>,
    /// Rank N-1.
    pub second_worst: Vertex<T>,
    /// Rank N.
    pub worst: Vertex<T>,
}

impl<T> RankedVertices<T>
where
    T: Float + Debug,
{
    /// Absolute gap between the worst and best objective values.
    pub fn gap(&self) -> T {
        (self.worst.value - self.best.value).abs()
    }
}

/// Result of a successful minimization.
#[derive(Debug, Clone)]
pub struct OptimizationResult<T>
where
    T: Float + Debug,
{
    /// The optimal point found
    pub optimal_point: Vec<T>,
    /// The value of the objective function at the optimal point
    pub optimal_value: T,
    /// Number of iterations performed
    pub iterations: usize,
    /// Number of objective evaluations performed
    pub evaluations: usize,
}
