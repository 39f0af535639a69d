use log::{debug, info, warn};
use num_traits::Float;
use std::fmt::Debug;

use super::{
    Coefficients, ObjectiveFunction, OptimizationResult, RankedVertices, Simplex, SolverConfig,
};
use crate::error::{Error, Result};

/// The transform accepted by one Nelder-Mead iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    /// The expanded point replaced the worst vertex.
    Expansion,
    /// The reflected point replaced the worst vertex.
    Reflection,
    /// The contracted point replaced the worst vertex.
    Contraction,
    /// Every vertex but the best moved towards the best.
    Shrink,
}

/// Nelder-Mead simplex minimizer.
///
/// The solver owns the coefficients and iteration control and can be reused
/// for any number of solves of its declared dimension. Each call to
/// [`NelderMead::solve`] builds a fresh [`Simplex`] anchored at the start point.
///
/// # Examples
///
/// ```
/// use simplex_min::{NelderMead, ObjectiveFunction};
///
/// // Define a simple quadratic function
/// struct Quadratic;
///
/// impl ObjectiveFunction<f64> for Quadratic {
///     fn evaluate(&self, point: &[f64]) -> f64 {
///         point.iter().map(|x| x * x).sum()
///     }
/// }
///
/// let solver = NelderMead::with_dimension(2);
/// let result = solver.solve(&Quadratic, &[1.0, 1.0]).unwrap();
/// assert!(result.optimal_value < 1e-6);
///
/// // Closures work as well.
/// let shifted = |p: &[f64]| (p[0] - 3.0).powi(2) + (p[1] + 1.0).powi(2);
/// let result = solver.solve(&shifted, &[0.0, 0.0]).unwrap();
/// assert!((result.optimal_point[0] - 3.0).abs() < 1e-3);
/// ```
#[derive(Debug, Clone)]
pub struct NelderMead<T>
where
    T: Float + Debug,
{
    dimension: usize,
    coefficients: Coefficients<T>,
    config: SolverConfig<T>,
}

impl<T> NelderMead<T>
where
    T: Float + Debug + Send + Sync,
{
    pub fn new(dimension: usize, coefficients: Coefficients<T>, config: SolverConfig<T>) -> Self {
        Self {
            dimension,
            coefficients,
            config,
        }
    }

    /// A solver with default coefficients and configuration.
    pub fn with_dimension(dimension: usize) -> Self {
        Self::new(dimension, Coefficients::default(), SolverConfig::default())
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn set_dimension(&mut self, dimension: usize) {
        self.dimension = dimension;
    }

    pub fn coefficients(&self) -> &Coefficients<T> {
        &self.coefficients
    }

    pub fn set_coefficients(&mut self, coefficients: Coefficients<T>) {
        self.coefficients = coefficients;
    }

    pub fn config(&self) -> &SolverConfig<T> {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut SolverConfig<T> {
        &mut self.config
    }

    /// Minimizes `objective` starting from `start`.
    ///
    /// Returns the best vertex of the simplex as soon as the gap between its
    /// best and worst values is within the convergence delta. Running out of
    /// iterations is an [`Error::NotConverged`], never a result.
    pub fn solve<F>(&self, objective: &F, start: &[T]) -> Result<OptimizationResult<T>>
    where
        F: ObjectiveFunction<T> + ?Sized,
    {
        self.coefficients.validate()?;
        self.config.validate()?;

        let mut simplex = Simplex::new(
            self.dimension,
            objective,
            self.coefficients,
            self.config.simplex_size,
        );
        simplex.anchor(start)?;
        let mut ranked = simplex.order()?;

        let mut iterations = 0;
        while iterations < self.config.max_iterations {
            let (transform, next) = self.step(&mut simplex)?;
            ranked = next;
            iterations += 1;

            debug!(
                "End of iteration {}: {:?}, best f({:?}) = {:?}, worst f({:?}) = {:?}",
                iterations,
                transform,
                ranked.best.point,
                ranked.best.value,
                ranked.worst.point,
                ranked.worst.value
            );

            let interval = self.config.progress_interval;
            if interval > 0 && iterations % interval == 0 {
                info!(
                    "Progress status: iteration {}, best value {:?}",
                    iterations, ranked.best.value
                );
            }

            if ranked.gap() <= self.config.convergence_delta {
                info!("Algorithm converged ({} iterations)", iterations);
                return Ok(OptimizationResult {
                    optimal_point: ranked.best.point,
                    optimal_value: ranked.best.value,
                    iterations,
                    evaluations: simplex.evaluations(),
                });
            }
        }

        let err = Error::NotConverged {
            iterations,
            best_value: ranked.best.value.to_f64().unwrap_or(f64::NAN),
            gap: ranked.gap().to_f64().unwrap_or(f64::NAN),
        };
        warn!("{}", err);
        Err(err)
    }

    /// Runs one iteration on an ordered simplex and re-orders it.
    ///
    /// The decision reads the simplex's current ranking, so the simplex must
    /// have been ordered since its last mutation; otherwise this fails with
    /// [`Error::StaleRanking`]. The checks run in a fixed precedence: a
    /// reflection beating the best vertex tries expansion, one beating only
    /// the second-worst is accepted as is, anything else tries contraction
    /// and finally shrinks.
    pub fn step<F>(&self, simplex: &mut Simplex<'_, T, F>) -> Result<(Transform, RankedVertices<T>)>
    where
        F: ObjectiveFunction<T> + ?Sized,
    {
        let ranked = simplex.ranked().ok_or(Error::StaleRanking)?;
        let reflected = simplex.reflect()?;

        let transform = if reflected.value < ranked.best.value {
            let expanded = simplex.expand(&reflected.point)?;
            if expanded.value < reflected.value {
                simplex.replace_worst(expanded.point)?;
                Transform::Expansion
            } else {
                simplex.replace_worst(reflected.point)?;
                Transform::Reflection
            }
        } else if reflected.value < ranked.second_worst.value {
            simplex.replace_worst(reflected.point)?;
            Transform::Reflection
        } else {
            let contracted = simplex.contract()?;
            if contracted.value < ranked.worst.value {
                simplex.replace_worst(contracted.point)?;
                Transform::Contraction
            } else {
                simplex.shrink()?;
                Transform::Shrink
            }
        };

        let ranked = simplex.order()?;
        Ok((transform, ranked))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // Test function: f(x, y) = x^2 + y^2
    struct Quadratic;

    impl ObjectiveFunction<f64> for Quadratic {
        fn evaluate(&self, point: &[f64]) -> f64 {
            point.iter().map(|x| x * x).sum()
        }
    }

    // Test function: f(x) = (x - 2)^2
    struct QuadraticWithMinimum;

    impl ObjectiveFunction<f64> for QuadraticWithMinimum {
        fn evaluate(&self, point: &[f64]) -> f64 {
            let x = point[0];
            (x - 2.0).powi(2)
        }
    }

    // Test function: f(x, y) = 100(y - x^2)^2 + (1 - x)^2 (Rosenbrock function)
    struct Rosenbrock;

    impl ObjectiveFunction<f64> for Rosenbrock {
        fn evaluate(&self, point: &[f64]) -> f64 {
            let x = point[0];
            let y = point[1];
            100.0 * (y - x.powi(2)).powi(2) + (1.0 - x).powi(2)
        }
    }

    // Test function: f(x, y, z) = x(x - 1) + (y - 2)(y + 2) + z(z + 3)
    struct Cubic;

    impl ObjectiveFunction<f64> for Cubic {
        fn evaluate(&self, point: &[f64]) -> f64 {
            let (x, y, z) = (point[0], point[1], point[2]);
            x * (x - 1.0) + (y - 2.0) * (y + 2.0) + z * (z + 3.0)
        }
    }

    #[test]
    fn test_nelder_mead_quadratic() {
        let solver = NelderMead::with_dimension(2);
        let result = solver.solve(&Quadratic, &[1.0, 1.0]).unwrap();

        assert!(result.optimal_value < 1e-6);
        for x in result.optimal_point {
            assert!(x.abs() < 1e-3);
        }
        assert!(result.iterations > 0);
        assert!(result.evaluations > result.iterations);
    }

    #[test]
    fn test_nelder_mead_quadratic_with_minimum() {
        let solver = NelderMead::with_dimension(1);
        let result = solver.solve(&QuadraticWithMinimum, &[0.0]).unwrap();

        assert!((result.optimal_point[0] - 2.0).abs() < 1e-3);
        assert!(result.optimal_value < 1e-6);
    }

    #[test]
    fn test_nelder_mead_rosenbrock() {
        let config = SolverConfig::default()
            .with_max_iterations(1000)
            .with_convergence_delta(1e-8);
        let solver = NelderMead::new(2, Coefficients::default(), config);

        let result = solver.solve(&Rosenbrock, &[2000.0, -3000.0]).unwrap();

        assert_abs_diff_eq!(result.optimal_value, 0.0, epsilon = 1e-6);
        assert!(result.iterations <= 1000);
    }

    #[test]
    fn test_nelder_mead_cubic() {
        let config = SolverConfig::default().with_max_iterations(1000);
        let solver = NelderMead::new(3, Coefficients::default(), config);

        let result = solver.solve(&Cubic, &[2000.0, -3000.0, 2.0]).unwrap();

        assert_abs_diff_eq!(result.optimal_value, -6.5, epsilon = 1e-6);
        assert_abs_diff_eq!(result.optimal_point[0], 0.5, epsilon = 1e-2);
        assert_abs_diff_eq!(result.optimal_point[1], 0.0, epsilon = 1e-2);
        assert_abs_diff_eq!(result.optimal_point[2], -1.5, epsilon = 1e-2);
    }

    #[test]
    fn test_dimension_mismatch_fails_before_evaluating() {
        let calls = AtomicUsize::new(0);
        let counted = |p: &[f64]| {
            calls.fetch_add(1, Ordering::SeqCst);
            p.iter().sum::<f64>()
        };

        let solver = NelderMead::with_dimension(2);
        let result = solver.solve(&counted, &[1.0, 2.0, 3.0]);

        assert!(matches!(result, Err(Error::InvalidInput(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_single_iteration_budget_does_not_converge() {
        let config = SolverConfig::default().with_max_iterations(1);
        let solver = NelderMead::new(2, Coefficients::default(), config);

        match solver.solve(&Rosenbrock, &[2000.0, -3000.0]) {
            Err(Error::NotConverged {
                iterations, gap, ..
            }) => {
                assert_eq!(iterations, 1);
                assert!(gap > 1e-8);
            }
            other => panic!("expected NotConverged, got {:?}", other.map(|r| r.optimal_value)),
        }
    }

    #[test]
    fn test_non_finite_objective_propagates() {
        let solver = NelderMead::with_dimension(2);
        let log_barrier = |p: &[f64]| -(p[0].ln()) + p[1] * p[1];

        let result = solver.solve(&log_barrier, &[-1.0, 0.0]);
        assert!(matches!(result, Err(Error::NonFiniteObjective { .. })));
    }

    #[test]
    fn test_invalid_configuration_is_rejected() {
        let config = SolverConfig::default().with_max_iterations(0);
        let solver = NelderMead::new(2, Coefficients::default(), config);
        assert!(matches!(
            solver.solve(&Quadratic, &[1.0, 1.0]),
            Err(Error::InvalidInput(_))
        ));

        let coefficients = Coefficients::new(1.0, 2.0, -0.5, 0.5);
        let solver = NelderMead::new(2, coefficients, SolverConfig::default());
        assert!(matches!(
            solver.solve(&Quadratic, &[1.0, 1.0]),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_step_shrinks_when_reflection_and_contraction_fail() {
        let spike = |p: &[f64]| {
            if p == [0.0, 0.0] {
                0.0
            } else if p == [10.0, 0.0] {
                1.0
            } else if p == [0.0, 10.0] {
                2.0
            } else {
                100.0
            }
        };
        let solver = NelderMead::with_dimension(2);
        let mut simplex = Simplex::new(2, &spike, Coefficients::default(), 10.0);
        simplex.anchor(&[0.0, 0.0]).unwrap();
        simplex.order().unwrap();

        let (transform, ranked) = solver.step(&mut simplex).unwrap();

        assert_eq!(transform, Transform::Shrink);
        assert_eq!(ranked.best.point, vec![0.0, 0.0]);
        assert_eq!(simplex.points()[1], vec![5.0, 0.0]);
        assert_eq!(simplex.points()[2], vec![0.0, 5.0]);
    }

    #[test]
    fn test_step_expands_downhill() {
        // Unbounded below along (1, 1): the reflection beats the best vertex
        // and the expansion beats the reflection.
        let slope = |p: &[f64]| -p[0] - p[1];
        let solver = NelderMead::with_dimension(2);
        let mut simplex = Simplex::new(2, &slope, Coefficients::default(), 1.0);
        simplex.anchor(&[0.0, 0.0]).unwrap();
        let ranked = simplex.order().unwrap();

        let (transform, next) = solver.step(&mut simplex).unwrap();

        assert_eq!(transform, Transform::Expansion);
        assert!(next.worst.value <= ranked.worst.value);
    }

    #[test]
    fn test_step_requires_fresh_ranking() {
        let solver = NelderMead::with_dimension(2);
        let mut simplex = Simplex::new(2, &Quadratic, Coefficients::default(), 1.0);
        simplex.anchor(&[1.0, 1.0]).unwrap();
        assert_eq!(solver.step(&mut simplex).unwrap_err(), Error::StaleRanking);

        simplex.order().unwrap();
        simplex.replace_worst(vec![0.0, 0.0]).unwrap();
        assert_eq!(solver.step(&mut simplex).unwrap_err(), Error::StaleRanking);

        // The decision uses the re-ordered values, where (0, 0) is now best.
        simplex.order().unwrap();
        let (_, ranked) = solver.step(&mut simplex).unwrap();
        assert_eq!(ranked.best.point, vec![0.0, 0.0]);
    }

    #[cfg(not(feature = "parallel"))]
    #[test]
    fn test_objective_with_cell_counter() {
        use std::cell::Cell;

        let calls = Cell::new(0usize);
        let counted = |p: &[f64]| {
            calls.set(calls.get() + 1);
            p.iter().map(|x| x * x).sum::<f64>()
        };

        let solver = NelderMead::with_dimension(2);
        let result = solver.solve(&counted, &[1.0, 1.0]).unwrap();

        assert!(result.optimal_value < 1e-6);
        assert_eq!(calls.get(), result.evaluations);
    }

    #[test]
    fn test_solver_is_reusable() {
        let solver = NelderMead::with_dimension(2);

        let first = solver.solve(&Quadratic, &[5.0, -5.0]).unwrap();
        let shifted = |p: &[f64]| (p[0] - 1.0).powi(2) + (p[1] - 2.0).powi(2);
        let second = solver.solve(&shifted, &[0.0, 0.0]).unwrap();

        assert!(first.optimal_value < 1e-6);
        assert!((second.optimal_point[0] - 1.0).abs() < 1e-3);
        assert!((second.optimal_point[1] - 2.0).abs() < 1e-3);
    }

    #[test]
    fn test_f32_scalar() {
        let config = SolverConfig::<f32>::default().with_convergence_delta(1e-6);
        let solver = NelderMead::new(2, Coefficients::default(), config);
        let sphere = |p: &[f32]| p.iter().map(|x| x * x).sum::<f32>();

        let result = solver.solve(&sphere, &[3.0, -4.0]).unwrap();
        assert!(result.optimal_value < 1e-4);
    }
}
