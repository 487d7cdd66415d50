//! Single-visit relocation.
//!
//! ## Algorithm
//!
//! Relocation detaches one visit and splices it back after another. Exactly
//! four edges change, so the delta is computed from the three neighbours
//! reported by [`Tour::shift_after`] without rescanning the tour:
//!
//! ```text
//! removed: old_prev→v, v→old_next, after→new_next
//! added:   old_prev→old_next, after→v, v→new_next
//! ```
//!
//! [`ShiftAfter`] scans visit/target pairs first-improvement; [`Random1Shift`]
//! applies `level + 1` random relocations as a perturbation and reports their
//! summed (usually positive) delta.

use rand::Rng;

use crate::candidate::Objective;
use crate::problem::TourProblem;
use crate::search::{Operator, Perturber};
use crate::tour::Tour;

const DEFAULT_EPSILON: f64 = 1e-3;

fn edge<P: TourProblem>(problem: &P, from: usize, to: Option<usize>) -> f64 {
    to.map_or(0.0, |t| problem.weight(from, t))
}

/// Exact weight delta of relocating `visit` after `after`, computed from the
/// tour as it stands (before the move).
fn shift_delta<P: TourProblem>(problem: &P, tour: &Tour, visit: usize, after: usize) -> f64 {
    let old_prev = tour.prev_of(visit).expect("movable visits have a predecessor");
    let old_next = tour.next_of(visit);
    let new_next = tour.next_of(after);

    let removed = problem.weight(old_prev, visit)
        + edge(problem, visit, old_next)
        + edge(problem, after, new_next);
    let added = edge(problem, old_prev, old_next)
        + problem.weight(after, visit)
        + edge(problem, visit, new_next);
    added - removed
}

/// Whether `visit` may be detached and `after` accept an insertion.
fn shift_allowed(tour: &Tour, visit: usize, after: usize) -> bool {
    if visit == after || visit == tour.first() {
        return false;
    }
    // The designated tail of a fixed-end path stays put, and nothing may be
    // placed behind it.
    if let Some(last) = tour.last() {
        if last != tour.first() && (visit == last || after == last) {
            return false;
        }
    }
    // Shifting behind the current predecessor is a no-move.
    tour.prev_of(visit) != Some(after)
}

/// First-improvement single-visit relocation over a [`Tour`].
#[derive(Debug, Clone)]
pub struct ShiftAfter {
    epsilon: f64,
}

impl ShiftAfter {
    /// Creates the operator with the default improvement epsilon.
    pub fn new() -> Self {
        Self {
            epsilon: DEFAULT_EPSILON,
        }
    }

    /// Overrides the minimum improvement worth accepting.
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }
}

impl Default for ShiftAfter {
    fn default() -> Self {
        Self::new()
    }
}

impl<P, O> Operator<P, Tour, O> for ShiftAfter
where
    P: TourProblem,
    O: Objective<P, Tour>,
{
    fn name(&self) -> &str {
        "shift_after"
    }

    fn apply<R: Rng>(
        &self,
        problem: &P,
        objective: &O,
        tour: &mut Tour,
        _rng: &mut R,
    ) -> Option<O::Fitness> {
        let visits = tour.to_vec();
        for &v in &visits {
            if v == tour.first() {
                continue;
            }
            for &a in &visits {
                if !shift_allowed(tour, v, a) {
                    continue;
                }
                let delta = shift_delta(problem, tour, v, a);
                if delta < -self.epsilon {
                    tour.shift_after(v, a).expect("pair was validated");
                    return Some(objective.from_weight(delta));
                }
            }
        }
        None
    }
}

/// Perturbation that relocates `level + 1` random visits.
#[derive(Debug, Clone, Default)]
pub struct Random1Shift;

impl Random1Shift {
    /// Creates the perturber.
    pub fn new() -> Self {
        Self
    }
}

impl<P, O> Perturber<P, Tour, O> for Random1Shift
where
    P: TourProblem,
    O: Objective<P, Tour>,
{
    fn name(&self) -> &str {
        "random_1shift"
    }

    fn perturb<R: Rng>(
        &self,
        problem: &P,
        objective: &O,
        tour: &mut Tour,
        level: usize,
        rng: &mut R,
    ) -> O::Fitness {
        let mut total = 0.0;
        for _ in 0..=level {
            let visits = tour.to_vec();
            let candidates: Vec<(usize, usize)> = visits
                .iter()
                .flat_map(|&v| visits.iter().map(move |&a| (v, a)))
                .filter(|&(v, a)| v != tour.first() && shift_allowed(tour, v, a))
                .collect();
            if candidates.is_empty() {
                break;
            }
            let (v, a) = candidates[rng.random_range(0..candidates.len())];
            total += shift_delta(problem, tour, v, a);
            tour.shift_after(v, a).expect("pair was validated");
        }
        objective.from_weight(total)
    }
}
