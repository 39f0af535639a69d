use log::trace;
use num_traits::Float;
use std::cell::Cell;
use std::cmp::Ordering;
use std::fmt::{self, Debug, Display};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::{Coefficients, ObjectiveFunction, RankedVertices, Vertex};
use crate::error::{Error, Result};

/// The N+1 vertices of a Nelder-Mead search in N dimensions.
///
/// A simplex borrows its objective for the duration of one solve. Transform
/// operations (`reflect`, `expand`, `contract`) compute and evaluate new
/// points without touching the stored vertices; only [`Simplex::replace_worst`]
/// and [`Simplex::shrink`] mutate them, and both leave the ranking stale until
/// the next [`Simplex::order`].
pub struct Simplex<'a, T, F>
where
    T: Float + Debug,
    F: ObjectiveFunction<T> + ?Sized,
{
    dimension: usize,
    objective: &'a F,
    coefficients: Coefficients<T>,
    size: T,
    points: Vec<Vec<T>>,
    values: Vec<T>,
    ranking: Option<Vec<usize>>,
    centroid: Vec<T>,
    evaluations: Cell<usize>,
}

impl<'a, T, F> Simplex<'a, T, F>
where
    T: Float + Debug + Send + Sync,
    F: ObjectiveFunction<T> + ?Sized,
{
    /// Creates an empty simplex; [`Simplex::anchor`] must run before anything else.
    pub fn new(dimension: usize, objective: &'a F, coefficients: Coefficients<T>, size: T) -> Self {
        Self {
            dimension,
            objective,
            coefficients,
            size,
            points: Vec::new(),
            values: Vec::new(),
            ranking: None,
            centroid: Vec::new(),
            evaluations: Cell::new(0),
        }
    }

    /// Places vertex 0 at `start` and vertex `i` at `start` offset by the
    /// simplex size along axis `i - 1`.
    pub fn anchor(&mut self, start: &[T]) -> Result<()> {
        if self.dimension == 0 {
            return Err(Error::invalid_input("simplex dimension must be at least 1"));
        }
        if start.len() != self.dimension {
            return Err(Error::invalid_input(format!(
                "start point has length {} but the simplex has dimension {}",
                start.len(),
                self.dimension
            )));
        }

        self.points = (0..=self.dimension)
            .map(|i| {
                let mut vertex = start.to_vec();
                if i > 0 {
                    vertex[i - 1] = vertex[i - 1] + self.size;
                }
                vertex
            })
            .collect();
        self.values.clear();
        self.centroid.clear();
        self.ranking = None;
        Ok(())
    }

    /// Evaluates every vertex, ranks them by ascending value (ties keep the
    /// lower vertex index first) and recomputes the centroid.
    pub fn order(&mut self) -> Result<RankedVertices<T>> {
        if self.points.is_empty() {
            return Err(Error::NotAnchored);
        }

        let values = self.evaluate_vertices()?;
        let mut ranking: Vec<usize> = (0..values.len()).collect();
        ranking.sort_by(|&a, &b| {
            values[a]
                .partial_cmp(&values[b])
                .unwrap_or(Ordering::Equal)
                .then(a.cmp(&b))
        });

        self.centroid = self.compute_centroid(ranking[self.dimension])?;
        trace!("Centroid: {:?}", self.centroid);

        self.values = values;
        self.ranking = Some(ranking);
        self.ranked().ok_or(Error::StaleRanking)
    }

    /// Best, second-worst and worst vertices of the current ranking, or `None`
    /// while the ranking is stale.
    pub fn ranked(&self) -> Option<RankedVertices<T>> {
        let ranking = self.ranking.as_deref()?;
        let vertex = |rank: usize| {
            let index = ranking[rank];
            Vertex::new(self.points[index].clone(), self.values[index])
        };
        Some(RankedVertices {
            best: vertex(0),
            second_worst: vertex(self.dimension - 1),
            worst: vertex(self.dimension),
        })
    }

    /// `x_r = x0 + alpha * (x0 - x_worst)`
    pub fn reflect(&self) -> Result<Vertex<T>> {
        let worst = self.worst_point()?;
        let alpha = self.coefficients.reflection;
        let point: Vec<T> = self
            .centroid
            .iter()
            .zip(worst)
            .map(|(&c, &w)| c + alpha * (c - w))
            .collect();
        trace!("Reflected point: {:?}", point);
        self.evaluate(point)
    }

    /// `x_e = x0 + gamma * (x_r - x0)`
    pub fn expand(&self, reflected: &[T]) -> Result<Vertex<T>> {
        self.require_ranking()?;
        self.check_length(reflected)?;
        let gamma = self.coefficients.expansion;
        let point: Vec<T> = self
            .centroid
            .iter()
            .zip(reflected)
            .map(|(&c, &r)| c + gamma * (r - c))
            .collect();
        trace!("Expanded point: {:?}", point);
        self.evaluate(point)
    }

    /// `x_c = x0 + rho * (x_worst - x0)`
    pub fn contract(&self) -> Result<Vertex<T>> {
        let worst = self.worst_point()?;
        let rho = self.coefficients.contraction;
        let point: Vec<T> = self
            .centroid
            .iter()
            .zip(worst)
            .map(|(&c, &w)| c + rho * (w - c))
            .collect();
        trace!("Contracted point: {:?}", point);
        self.evaluate(point)
    }

    /// Moves every vertex except the best towards it:
    /// `x_i = x_best + sigma * (x_i - x_best)`. Values are not re-evaluated here.
    pub fn shrink(&mut self) -> Result<()> {
        let ranking = self.ranking.take().ok_or(Error::StaleRanking)?;
        self.values.clear();
        let sigma = self.coefficients.shrink;
        let best = self.points[ranking[0]].clone();
        trace!("Shrinking towards {:?}", best);

        for &index in &ranking[1..] {
            for (x, &b) in self.points[index].iter_mut().zip(&best) {
                *x = b + sigma * (*x - b);
            }
        }
        Ok(())
    }

    /// Overwrites the vertex currently ranked worst.
    pub fn replace_worst(&mut self, point: Vec<T>) -> Result<()> {
        self.check_length(&point)?;
        let ranking = self.ranking.take().ok_or(Error::StaleRanking)?;
        self.values.clear();
        self.points[ranking[self.dimension]] = point;
        Ok(())
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn size(&self) -> T {
        self.size
    }

    pub fn coefficients(&self) -> &Coefficients<T> {
        &self.coefficients
    }

    /// Vertices in storage order.
    pub fn points(&self) -> &[Vec<T>] {
        &self.points
    }

    /// Objective values recorded by the last `order()`, in storage order, or
    /// `None` while the ranking is stale.
    pub fn values(&self) -> Option<&[T]> {
        self.ranking.as_ref().map(|_| self.values.as_slice())
    }

    /// Vertex indices by ascending value, or `None` while the ranking is stale.
    pub fn ranking(&self) -> Option<&[usize]> {
        self.ranking.as_deref()
    }

    /// Mean of all vertices except the worst, or `None` while the ranking is stale.
    pub fn centroid(&self) -> Option<&[T]> {
        self.ranking.as_ref().map(|_| self.centroid.as_slice())
    }

    /// Objective evaluations performed so far.
    pub fn evaluations(&self) -> usize {
        self.evaluations.get()
    }

    fn evaluate_vertices(&self) -> Result<Vec<T>> {
        let objective = self.objective;

        #[cfg(feature = "parallel")]
        let values: Vec<T> = self
            .points
            .par_iter()
            .map(|point| objective.evaluate(point))
            .collect();
        #[cfg(not(feature = "parallel"))]
        let values: Vec<T> = self
            .points
            .iter()
            .map(|point| objective.evaluate(point))
            .collect();

        self.evaluations.set(self.evaluations.get() + values.len());
        for (point, &value) in self.points.iter().zip(&values) {
            ensure_finite(point, value)?;
        }
        Ok(values)
    }

    fn evaluate(&self, point: Vec<T>) -> Result<Vertex<T>> {
        self.evaluations.set(self.evaluations.get() + 1);
        let value = self.objective.evaluate(&point);
        ensure_finite(&point, value)?;
        Ok(Vertex::new(point, value))
    }

    // (sum of all vertices - worst) / N
    fn compute_centroid(&self, worst: usize) -> Result<Vec<T>> {
        let n = T::from(self.dimension).ok_or_else(|| {
            Error::invalid_input(format!(
                "dimension {} is not representable in the scalar type",
                self.dimension
            ))
        })?;

        let mut centroid = vec![T::zero(); self.dimension];
        for point in &self.points {
            for (c, &x) in centroid.iter_mut().zip(point) {
                *c = *c + x;
            }
        }
        for (c, &x) in centroid.iter_mut().zip(&self.points[worst]) {
            *c = (*c - x) / n;
        }
        Ok(centroid)
    }

    fn require_ranking(&self) -> Result<&[usize]> {
        self.ranking.as_deref().ok_or(Error::StaleRanking)
    }

    fn worst_point(&self) -> Result<&[T]> {
        let ranking = self.require_ranking()?;
        Ok(&self.points[ranking[self.dimension]])
    }

    fn check_length(&self, point: &[T]) -> Result<()> {
        if point.len() != self.dimension {
            return Err(Error::invalid_input(format!(
                "point has length {} but the simplex has dimension {}",
                point.len(),
                self.dimension
            )));
        }
        Ok(())
    }
}

fn ensure_finite<T>(point: &[T], value: T) -> Result<()>
where
    T: Float + Debug,
{
    if value.is_finite() {
        return Ok(());
    }
    Err(Error::NonFiniteObjective {
        point: point
            .iter()
            .map(|x| x.to_f64().unwrap_or(f64::NAN))
            .collect(),
        value: value.to_f64().unwrap_or(f64::NAN),
    })
}

impl<T, F> Display for Simplex<'_, T, F>
where
    T: Float + Debug,
    F: ObjectiveFunction<T> + ?Sized,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Simplex details:")?;
        match self.points.first() {
            Some(anchor) => writeln!(f, "  Anchor: {:?}", anchor)?,
            None => writeln!(f, "  Anchor: <none>")?,
        }
        writeln!(f, "  Size: {:?}", self.size)?;
        writeln!(f, "  Points: [")?;
        match &self.ranking {
            Some(ranking) => {
                for &index in ranking {
                    writeln!(f, "    {:?}, {:?}", self.points[index], self.values[index])?;
                }
            }
            None => {
                for point in &self.points {
                    writeln!(f, "    {:?}", point)?;
                }
            }
        }
        write!(f, "  ]")
    }
}
