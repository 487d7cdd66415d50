//! Tour problem contract.
//!
//! A problem supplies the weight function and the anchor/constraint data a
//! search needs; it is immutable for the lifetime of a search and shared
//! read-only between the candidates derived from it. Model construction and
//! validation (geocoding, matrix building, JSON mapping) happen upstream.

use serde::{Deserialize, Serialize};

use crate::tour::Tour;
use crate::weight::WeightMatrix;

/// Defines a tour optimization problem instance.
///
/// # Examples
///
/// ```
/// use tour_opt::problem::{MatrixProblem, TourProblem};
/// use tour_opt::weight::WeightMatrix;
///
/// let problem = MatrixProblem::new(WeightMatrix::uniform(4, 10.0)).closed();
/// assert_eq!(problem.dimension(), 4);
/// assert_eq!(problem.last(), Some(0));
/// assert_eq!(problem.weight(1, 2), 10.0);
/// ```
pub trait TourProblem: Send + Sync {
    /// Number of visits (visit ids are `0..dimension`).
    fn dimension(&self) -> usize;

    /// Travel weight from visit `from` to visit `to`.
    fn weight(&self, from: usize, to: usize) -> f64;

    /// The fixed start visit.
    fn first(&self) -> usize {
        0
    }

    /// The fixed end visit: `Some(first())` for a closed tour, another visit
    /// for a fixed-end open path, `None` for an open path.
    fn last(&self) -> Option<usize> {
        None
    }

    /// Maximum allowed total tour weight, if the problem is bounded.
    fn budget(&self) -> Option<f64> {
        None
    }

    /// Whether every visit must be placed for a solution to be feasible.
    ///
    /// Budget-bounded variants typically return `false` and score unplaced
    /// visits through the objective instead.
    fn require_complete(&self) -> bool {
        true
    }
}

/// Total travel weight of a tour under a problem's weight function.
///
/// Includes the closing edge for closed tours (via [`Tour::pairs`]).
pub fn tour_weight<P: TourProblem + ?Sized>(problem: &P, tour: &Tour) -> f64 {
    tour.pairs().map(|(f, t)| problem.weight(f, t)).sum()
}

/// A matrix-backed problem instance.
///
/// # Examples
///
/// ```
/// use tour_opt::problem::{MatrixProblem, TourProblem};
/// use tour_opt::weight::WeightMatrix;
///
/// let problem = MatrixProblem::new(WeightMatrix::uniform(5, 10.0))
///     .closed()
///     .with_budget(40.0)
///     .with_optional_visits();
/// assert_eq!(problem.budget(), Some(40.0));
/// assert!(!problem.require_complete());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatrixProblem {
    weights: WeightMatrix,
    first: usize,
    last: Option<usize>,
    budget: Option<f64>,
    require_complete: bool,
}

impl MatrixProblem {
    /// Creates an open-path problem starting at visit 0.
    pub fn new(weights: WeightMatrix) -> Self {
        Self {
            weights,
            first: 0,
            last: None,
            budget: None,
            require_complete: true,
        }
    }

    /// Sets the fixed start visit.
    pub fn with_first(mut self, first: usize) -> Self {
        self.first = first;
        self
    }

    /// Sets a fixed end visit.
    pub fn with_last(mut self, last: usize) -> Self {
        self.last = Some(last);
        self
    }

    /// Makes the tour a cycle (last == first).
    pub fn closed(mut self) -> Self {
        self.last = Some(self.first);
        self
    }

    /// Bounds the total tour weight.
    pub fn with_budget(mut self, budget: f64) -> Self {
        self.budget = Some(budget);
        self
    }

    /// Allows solutions that leave visits unplaced.
    pub fn with_optional_visits(mut self) -> Self {
        self.require_complete = false;
        self
    }

    /// The underlying weight matrix.
    pub fn weights(&self) -> &WeightMatrix {
        &self.weights
    }
}

impl TourProblem for MatrixProblem {
    fn dimension(&self) -> usize {
        self.weights.size()
    }

    fn weight(&self, from: usize, to: usize) -> f64 {
        self.weights.get(from, to)
    }

    fn first(&self) -> usize {
        self.first
    }

    fn last(&self) -> Option<usize> {
        self.last
    }

    fn budget(&self) -> Option<f64> {
        self.budget
    }

    fn require_complete(&self) -> bool {
        self.require_complete
    }
}
