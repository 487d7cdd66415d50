//! Initial-candidate generators.

use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::candidate::{Candidate, Objective};
use crate::error::SearchError;
use crate::problem::{tour_weight, TourProblem};
use crate::search::cheapest_position;
use crate::strategy::Strategy;
use crate::tour::Tour;

/// Places every visit in uniformly random order.
///
/// Ignores the budget: the candidate it returns may be infeasible, which the
/// objective reports through its fitness. Use [`CheapestInsertionStrategy`]
/// when the starting candidate itself must respect the budget.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomStrategy;

impl<P, O> Strategy<P, Tour, O> for RandomStrategy
where
    P: TourProblem,
    O: Objective<P, Tour>,
{
    fn search<R: Rng>(
        &self,
        problem: &Arc<P>,
        objective: &O,
        rng: &mut R,
    ) -> Result<Candidate<P, Tour, O::Fitness>, SearchError> {
        let dim = problem.dimension();
        let mut tour = Tour::new(dim, problem.first(), problem.last())
            .map_err(|e| SearchError::Unsolvable(e.to_string()))?;

        let mut rest: Vec<usize> = (0..dim).filter(|&v| !tour.contains(v)).collect();
        rest.shuffle(rng);

        let mut cursor = problem.first();
        for v in rest {
            tour.insert_after(cursor, v)
                .map_err(|e| SearchError::Unsolvable(e.to_string()))?;
            cursor = v;
        }

        let fitness = objective.calculate(problem, &tour);
        Ok(Candidate::new(Arc::clone(problem), tour, fitness))
    }
}

/// Greedy cheapest insertion from the bare anchors.
///
/// Repeatedly inserts the unplaced visit with the globally cheapest position
/// while the budget allows. Fails with [`SearchError::Unsolvable`] when the
/// problem requires a complete tour and one cannot be built within budget.
#[derive(Debug, Clone, Copy, Default)]
pub struct CheapestInsertionStrategy;

impl<P, O> Strategy<P, Tour, O> for CheapestInsertionStrategy
where
    P: TourProblem,
    O: Objective<P, Tour>,
{
    fn search<R: Rng>(
        &self,
        problem: &Arc<P>,
        objective: &O,
        _rng: &mut R,
    ) -> Result<Candidate<P, Tour, O::Fitness>, SearchError> {
        let dim = problem.dimension();
        let mut tour = Tour::new(dim, problem.first(), problem.last())
            .map_err(|e| SearchError::Unsolvable(e.to_string()))?;

        let mut weight = tour_weight(problem.as_ref(), &tour);
        let mut candidates: Vec<usize> = (0..dim).filter(|&v| !tour.contains(v)).collect();
        while !candidates.is_empty() {
            let mut best: Option<(usize, usize, f64)> = None;
            for (idx, &v) in candidates.iter().enumerate() {
                if let Some((after, delta)) = cheapest_position(problem.as_ref(), &tour, v) {
                    if best.map_or(true, |(_, _, d)| delta < d) {
                        best = Some((idx, after, delta));
                    }
                }
            }
            let Some((idx, after, delta)) = best else {
                break;
            };
            if let Some(budget) = problem.budget() {
                if weight + delta > budget {
                    break;
                }
            }
            let v = candidates.swap_remove(idx);
            tour.insert_after(after, v)
                .map_err(|e| SearchError::Unsolvable(e.to_string()))?;
            weight += delta;
        }

        if problem.require_complete() && tour.len() < dim {
            return Err(SearchError::Unsolvable(format!(
                "only {} of {} visits fit within the budget",
                tour.len(),
                dim
            )));
        }

        let fitness = objective.calculate(problem, &tour);
        Ok(Candidate::new(Arc::clone(problem), tour, fitness))
    }
}
