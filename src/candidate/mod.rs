//! Candidates and objectives.
//!
//! A [`Candidate`] pairs a shared, read-only problem with an owned solution
//! and the fitness that solution scored. An [`Objective`] defines the
//! fitness algebra: how to calculate it, compare it (lower is better), and
//! whether deltas may be accumulated incrementally or the fitness must be
//! recomputed from scratch after each mutation.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::problem::{tour_weight, TourProblem};
use crate::tour::Tour;

/// A (problem, solution, fitness) triple under active search.
///
/// Cloning deep-clones the solution and shares the problem, which is what
/// metaheuristics need to keep a "current best" and a "working" copy alive
/// at the same time.
pub struct Candidate<P, S, F> {
    /// The immutable problem this candidate solves. Never mutated by search.
    pub problem: Arc<P>,
    /// The owned solution, mutated in place by operators.
    pub solution: S,
    /// Fitness of `solution`, kept current by the owning strategy.
    pub fitness: F,
}

impl<P, S, F> Candidate<P, S, F> {
    /// Creates a candidate.
    pub fn new(problem: Arc<P>, solution: S, fitness: F) -> Self {
        Self {
            problem,
            solution,
            fitness,
        }
    }
}

impl<P, S: Clone, F: Clone> Clone for Candidate<P, S, F> {
    fn clone(&self) -> Self {
        Self {
            problem: Arc::clone(&self.problem),
            solution: self.solution.clone(),
            fitness: self.fitness.clone(),
        }
    }
}

impl<P, S: fmt::Debug, F: fmt::Debug> fmt::Debug for Candidate<P, S, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Candidate")
            .field("solution", &self.solution)
            .field("fitness", &self.fitness)
            .finish()
    }
}

/// Fitness algebra for a problem/solution pairing. Lower is better.
pub trait Objective<P, S>: Send + Sync {
    /// The fitness value type.
    type Fitness: Clone + PartialOrd + fmt::Debug + Send;

    /// The neutral fitness.
    fn zero(&self) -> Self::Fitness;

    /// The infeasible sentinel; worse than any feasible fitness.
    fn infinite(&self) -> Self::Fitness;

    /// Computes the fitness of `solution` from scratch.
    fn calculate(&self, problem: &P, solution: &S) -> Self::Fitness;

    /// Fitness addition (used to fold operator deltas into a running total).
    fn add(&self, a: &Self::Fitness, b: &Self::Fitness) -> Self::Fitness;

    /// Fitness subtraction.
    fn subtract(&self, a: &Self::Fitness, b: &Self::Fitness) -> Self::Fitness;

    /// Total order over fitness values; `Less` means `a` is better.
    fn compare(&self, a: &Self::Fitness, b: &Self::Fitness) -> Ordering;

    /// Whether `a` equals the neutral fitness.
    fn is_zero(&self, a: &Self::Fitness) -> bool {
        self.compare(a, &self.zero()) == Ordering::Equal
    }

    /// Lifts a raw weight delta into a fitness delta.
    fn from_weight(&self, weight: f64) -> Self::Fitness;

    /// `true` when fitness cannot be accumulated from deltas and must be
    /// recomputed from scratch after each mutation (discontinuous
    /// components, e.g. a count of unplaced visits).
    fn is_non_continuous(&self) -> bool {
        false
    }
}

const FEASIBILITY_TOLERANCE: f64 = 1e-9;

/// Plain total-weight objective over a [`Tour`].
///
/// Budget-bounded or incomplete-but-required tours evaluate to
/// [`f64::INFINITY`].
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightObjective;

impl<P: TourProblem> Objective<P, Tour> for WeightObjective {
    type Fitness = f64;

    fn zero(&self) -> f64 {
        0.0
    }

    fn infinite(&self) -> f64 {
        f64::INFINITY
    }

    fn calculate(&self, problem: &P, tour: &Tour) -> f64 {
        let weight = tour_weight(problem, tour);
        if let Some(budget) = problem.budget() {
            if weight > budget + FEASIBILITY_TOLERANCE {
                return f64::INFINITY;
            }
        }
        if problem.require_complete() && tour.len() < problem.dimension() {
            return f64::INFINITY;
        }
        weight
    }

    fn add(&self, a: &f64, b: &f64) -> f64 {
        a + b
    }

    fn subtract(&self, a: &f64, b: &f64) -> f64 {
        a - b
    }

    fn compare(&self, a: &f64, b: &f64) -> Ordering {
        a.partial_cmp(b).expect("fitness should not be NaN")
    }

    fn from_weight(&self, weight: f64) -> f64 {
        weight
    }
}

/// Fitness combining the number of unplaced visits with tour weight.
///
/// Ordered lexicographically: placing one more visit always beats any weight
/// saving. The derived `PartialOrd` provides exactly that order.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct PlacementFitness {
    /// Visits not part of the tour.
    pub unplaced: usize,
    /// Total travel weight of the tour.
    pub weight: f64,
}

/// Objective for budget-bounded problems where visits may stay unplaced.
///
/// Non-continuous: the unplaced count jumps discretely, so strategies must
/// recompute fitness from scratch after each mutation instead of folding
/// operator deltas.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlacementObjective;

impl<P: TourProblem> Objective<P, Tour> for PlacementObjective {
    type Fitness = PlacementFitness;

    fn zero(&self) -> PlacementFitness {
        PlacementFitness {
            unplaced: 0,
            weight: 0.0,
        }
    }

    fn infinite(&self) -> PlacementFitness {
        PlacementFitness {
            unplaced: usize::MAX,
            weight: f64::INFINITY,
        }
    }

    fn calculate(&self, problem: &P, tour: &Tour) -> PlacementFitness {
        let weight = tour_weight(problem, tour);
        if let Some(budget) = problem.budget() {
            if weight > budget + FEASIBILITY_TOLERANCE {
                return PlacementFitness {
                    unplaced: usize::MAX,
                    weight: f64::INFINITY,
                };
            }
        }
        PlacementFitness {
            unplaced: problem.dimension() - tour.len(),
            weight,
        }
    }

    fn add(&self, a: &PlacementFitness, b: &PlacementFitness) -> PlacementFitness {
        PlacementFitness {
            unplaced: a.unplaced.saturating_add(b.unplaced),
            weight: a.weight + b.weight,
        }
    }

    fn subtract(&self, a: &PlacementFitness, b: &PlacementFitness) -> PlacementFitness {
        PlacementFitness {
            unplaced: a.unplaced.saturating_sub(b.unplaced),
            weight: a.weight - b.weight,
        }
    }

    fn compare(&self, a: &PlacementFitness, b: &PlacementFitness) -> Ordering {
        a.partial_cmp(b).expect("fitness should not be NaN")
    }

    fn from_weight(&self, weight: f64) -> PlacementFitness {
        PlacementFitness {
            unplaced: 0,
            weight,
        }
    }

    fn is_non_continuous(&self) -> bool {
        true
    }
}
