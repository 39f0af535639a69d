//! Unconstrained multivariate minimization with the Nelder-Mead simplex method.
//!
//! [`NelderMead`] drives the iteration; [`Simplex`] holds the N+1 vertices and
//! implements ordering, the centroid and the reflect/expand/contract/shrink
//! transforms. Objectives are anything implementing [`ObjectiveFunction`],
//! including plain `Fn(&[T]) -> T` closures.
//!
//! Diagnostics go through the `log` facade: per-transform detail at `trace`,
//! per-iteration state at `debug`, progress and convergence at `info`.

pub mod error;
pub mod optimization;

pub use error::{Error, Result};
pub use optimization::{
    Coefficients, MaybeSync, NelderMead, ObjectiveFunction, OptimizationResult, RankedVertices,
    Simplex, SolverConfig, Transform, Vertex,
};
