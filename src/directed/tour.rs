//! Directed tours and their weight objective.

use std::cmp::Ordering;

use crate::candidate::Objective;
use crate::directed::{DirectedTourProblem, DirectedVisit, Turn};
use crate::tour::Tour;

/// A [`Tour`] paired with a per-visit turn assignment.
///
/// The turn arena is keyed by visit id like the tour's successor arrays;
/// unplaced visits keep their last assigned turn, which becomes relevant
/// again only if they are reinserted.
#[derive(Debug, Clone)]
pub struct DirectedTour {
    pub tour: Tour,
    turns: Vec<Turn>,
}

impl DirectedTour {
    /// Wraps a tour, assigning every visit the forward-forward turn.
    pub fn new(tour: Tour) -> Self {
        let turns = vec![Turn::ForwardForward; tour.capacity()];
        Self { tour, turns }
    }

    /// The turn currently assigned at `visit`.
    pub fn turn(&self, visit: usize) -> Turn {
        self.turns[visit]
    }

    /// Reassigns the turn at `visit`.
    pub fn set_turn(&mut self, visit: usize, turn: Turn) {
        self.turns[visit] = turn;
    }

    /// The directed form of `visit` under its current turn.
    pub fn directed(&self, visit: usize) -> DirectedVisit {
        DirectedVisit::new(visit, self.turns[visit])
    }
}

/// Total directed weight: directional edge weights plus one turn penalty per
/// placed visit.
pub fn directed_tour_weight<P: DirectedTourProblem + ?Sized>(
    problem: &P,
    dt: &DirectedTour,
) -> f64 {
    let edges: f64 = dt
        .tour
        .pairs()
        .map(|(f, t)| problem.directed_weight(dt.directed(f), dt.directed(t)))
        .sum();
    let penalties: f64 = dt
        .tour
        .iter()
        .map(|v| problem.turn_penalty(v, dt.turn(v)))
        .sum();
    edges + penalties
}

const FEASIBILITY_TOLERANCE: f64 = 1e-9;

/// Total directed weight objective over a [`DirectedTour`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectedWeightObjective;

impl<P: DirectedTourProblem> Objective<P, DirectedTour> for DirectedWeightObjective {
    type Fitness = f64;

    fn zero(&self) -> f64 {
        0.0
    }

    fn infinite(&self) -> f64 {
        f64::INFINITY
    }

    fn calculate(&self, problem: &P, dt: &DirectedTour) -> f64 {
        let weight = directed_tour_weight(problem, dt);
        if let Some(budget) = problem.budget() {
            if weight > budget + FEASIBILITY_TOLERANCE {
                return f64::INFINITY;
            }
        }
        if problem.require_complete() && dt.tour.len() < problem.dimension() {
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
