use num_traits::Float;
use std::fmt::Debug;

use crate::error::{Error, Result};

/// The four Nelder-Mead transform coefficients.
///
/// Fixed for the lifetime of a solve. Only positivity is checked; values
/// outside the conventional ranges are accepted but void the usual
/// convergence behaviour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coefficients<T>
where
    T: Float + Debug,
{
    /// Reflection coefficient (alpha), typically 1
    pub reflection: T,
    /// Expansion coefficient (gamma), typically > 1
    pub expansion: T,
    /// Contraction coefficient (rho), typically in (0, 1)
    pub contraction: T,
    /// Shrink coefficient (sigma), typically in (0, 1)
    pub shrink: T,
}

impl<T> Coefficients<T>
where
    T: Float + Debug,
{
    pub fn new(reflection: T, expansion: T, contraction: T, shrink: T) -> Self {
        Self {
            reflection,
            expansion,
            contraction,
            shrink,
        }
    }

    /// Rejects coefficients that are not finite positive reals.
    pub fn validate(&self) -> Result<()> {
        let named = [
            ("reflection", self.reflection),
            ("expansion", self.expansion),
            ("contraction", self.contraction),
            ("shrink", self.shrink),
        ];
        for (name, value) in named {
            if !value.is_finite() || value <= T::zero() {
                return Err(Error::invalid_input(format!(
                    "{name} coefficient must be a finite positive number, got {value:?}"
                )));
            }
        }
        Ok(())
    }
}

impl<T> Default for Coefficients<T>
where
    T: Float + Debug,
{
    fn default() -> Self {
        let half = T::one() / (T::one() + T::one());
        Self {
            reflection: T::one(),
            expansion: T::one() + T::one(),
            contraction: half,
            shrink: half,
        }
    }
}

/// Iteration control for [`NelderMead`](super::NelderMead).
#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig<T>
where
    T: Float + Debug,
{
    /// Maximum number of iterations
    pub max_iterations: usize,
    /// Absolute tolerance on the best/worst objective gap
    pub convergence_delta: T,
    /// Iterations between progress notices; 0 disables them
    pub progress_interval: usize,
    /// Edge length of the initial simplex
    pub simplex_size: T,
}

impl<T> SolverConfig<T>
where
    T: Float + Debug,
{
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_convergence_delta(mut self, convergence_delta: T) -> Self {
        self.convergence_delta = convergence_delta;
        self
    }

    pub fn with_progress_interval(mut self, progress_interval: usize) -> Self {
        self.progress_interval = progress_interval;
        self
    }

    pub fn with_simplex_size(mut self, simplex_size: T) -> Self {
        self.simplex_size = simplex_size;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(Error::invalid_input("max_iterations must be positive"));
        }
        if !self.convergence_delta.is_finite() || self.convergence_delta < T::zero() {
            return Err(Error::invalid_input(format!(
                "convergence_delta must be a finite non-negative number, got {:?}",
                self.convergence_delta
            )));
        }
        if !self.simplex_size.is_finite() || self.simplex_size <= T::zero() {
            return Err(Error::invalid_input(format!(
                "simplex_size must be a finite positive number, got {:?}",
                self.simplex_size
            )));
        }
        Ok(())
    }
}

impl<T> Default for SolverConfig<T>
where
    T: Float + Debug,
{
    fn default() -> Self {
        Self {
            max_iterations: 20_000,
            convergence_delta: T::from(5e-9).unwrap_or_else(T::epsilon),
            progress_interval: 1000,
            simplex_size: T::from(10.0).unwrap_or_else(T::one),
        }
    }
}
