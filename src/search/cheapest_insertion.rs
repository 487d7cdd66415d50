//! Ruin-and-recreate via cheapest insertion.
//!
//! ## Algorithm
//!
//! Removes a random fraction of the movable visits (partial Fisher-Yates
//! over the pool), then greedily reinserts: at each step the unplaced visit
//! with the globally cheapest feasible insertion position is spliced in.
//! Under a weight budget, recreation stops once even the cheapest insertion
//! would overrun it, leaving the remaining visits unplaced.
//!
//! The whole move is transactional: the objective is evaluated before and
//! after, and the pre-move tour is restored unless the result improves by
//! more than the operator epsilon. This makes the operator usable with
//! discontinuous objectives (placement counts) where edge deltas alone
//! cannot rank the outcome.
//!
//! ## Complexity
//!
//! O(u² · n) per call for u removed/unplaced visits.

use rand::Rng;

use crate::candidate::Objective;
use crate::problem::{tour_weight, TourProblem};
use crate::search::Operator;
use crate::tour::Tour;

const DEFAULT_EPSILON: f64 = 1e-3;
const DEFAULT_FRACTION: f64 = 0.3;

/// The cheapest feasible insertion position for `visit`.
///
/// Returns the visit to insert after and the exact weight delta, or `None`
/// when `visit` is already placed. Open tours also offer the append-after-
/// tail position; a singleton closed tour offers its first (and only) edge.
pub fn cheapest_position<P: TourProblem + ?Sized>(
    problem: &P,
    tour: &Tour,
    visit: usize,
) -> Option<(usize, f64)> {
    if tour.contains(visit) {
        return None;
    }

    let mut best: Option<(usize, f64)> = None;
    for (f, t) in tour.pairs() {
        let delta = problem.weight(f, visit) + problem.weight(visit, t) - problem.weight(f, t);
        if best.map_or(true, |(_, d)| delta < d) {
            best = Some((f, delta));
        }
    }
    if tour.last().is_none() {
        let tail = tour.iter().last().expect("tours hold at least their first visit");
        let delta = problem.weight(tail, visit);
        if best.map_or(true, |(_, d)| delta < d) {
            best = Some((tail, delta));
        }
    } else if tour.len() == 1 && tour.is_closed() {
        // Singleton cycle has no real edge yet.
        let f = tour.first();
        best = Some((f, problem.weight(f, visit) + problem.weight(visit, f)));
    }
    best
}

/// Transactional ruin-and-recreate operator over a [`Tour`].
#[derive(Debug, Clone)]
pub struct CheapestInsertion {
    fraction: f64,
    epsilon: f64,
}

impl CheapestInsertion {
    /// Creates the operator with the default removal fraction and epsilon.
    pub fn new() -> Self {
        Self {
            fraction: DEFAULT_FRACTION,
            epsilon: DEFAULT_EPSILON,
        }
    }

    /// Sets the fraction of movable visits removed per call.
    pub fn with_fraction(mut self, fraction: f64) -> Self {
        self.fraction = fraction.clamp(0.0, 1.0);
        self
    }

    /// Overrides the minimum improvement worth accepting.
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Greedily inserts from `candidates` until nothing feasible remains.
    fn recreate<P: TourProblem>(problem: &P, tour: &mut Tour, mut candidates: Vec<usize>) {
        let mut weight = tour_weight(problem, tour);
        while !candidates.is_empty() {
            let mut best: Option<(usize, usize, f64)> = None;
            for (idx, &v) in candidates.iter().enumerate() {
                if let Some((after, delta)) = cheapest_position(problem, tour, v) {
                    if best.map_or(true, |(_, _, d)| delta < d) {
                        best = Some((idx, after, delta));
                    }
                }
            }
            let Some((idx, after, delta)) = best else {
                break;
            };
            if let Some(budget) = problem.budget() {
                // The cheapest insertion already overruns; so does every other.
                if weight + delta > budget {
                    break;
                }
            }
            let v = candidates.swap_remove(idx);
            tour.insert_after(after, v)
                .expect("cheapest position is a valid insertion point");
            weight += delta;
        }
    }
}

impl Default for CheapestInsertion {
    fn default() -> Self {
        Self::new()
    }
}

impl<P, O> Operator<P, Tour, O> for CheapestInsertion
where
    P: TourProblem,
    O: Objective<P, Tour>,
{
    fn name(&self) -> &str {
        "cheapest_insertion"
    }

    fn apply<R: Rng>(
        &self,
        problem: &P,
        objective: &O,
        tour: &mut Tour,
        rng: &mut R,
    ) -> Option<O::Fitness> {
        let before = objective.calculate(problem, tour);
        let snapshot = tour.clone();

        let mut pool: Vec<usize> = tour
            .iter()
            .filter(|&v| v != tour.first() && tour.last() != Some(v))
            .collect();
        let k = if pool.is_empty() {
            0
        } else {
            (((pool.len() as f64) * self.fraction).round() as usize)
                .max(1)
                .min(pool.len())
        };
        for i in 0..k {
            let j = rng.random_range(i..pool.len());
            pool.swap(i, j);
        }
        pool.truncate(k);
        for &v in &pool {
            tour.remove(v).expect("pool visits are placed and movable");
        }

        // Recreate from the removed visits plus anything never placed.
        let mut candidates = pool;
        for v in 0..problem.dimension() {
            if !tour.contains(v) && !candidates.contains(&v) {
                candidates.push(v);
            }
        }
        Self::recreate(problem, tour, candidates);

        let after = objective.calculate(problem, tour);
        let margin = objective.add(&after, &objective.from_weight(self.epsilon));
        if objective.compare(&margin, &before) == std::cmp::Ordering::Less {
            Some(objective.subtract(&after, &before))
        } else {
            *tour = snapshot;
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::{PlacementObjective, WeightObjective};
    use crate::problem::MatrixProblem;
    use crate::weight::WeightMatrix;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn line_problem() -> MatrixProblem {
        let wm =
            WeightMatrix::from_coords(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (3.0, 0.0)]);
        MatrixProblem::new(wm)
    }

    #[test]
    fn test_cheapest_position_open_tour() {
        let p = line_problem();
        let tour = Tour::from_sequence(4, &[0, 1, 3], None).unwrap();
        // Between 1 and 3: 1 + 1 - 2 = 0; appending after 3 costs 1.
        let (after, delta) = cheapest_position(&p, &tour, 2).unwrap();
        assert_eq!(after, 1);
        assert!(delta.abs() < 1e-10);
    }

    #[test]
    fn test_cheapest_position_appends_to_tail() {
        let p = line_problem();
        let tour = Tour::from_sequence(4, &[0, 1, 2], None).unwrap();
        let (after, delta) = cheapest_position(&p, &tour, 3).unwrap();
        assert_eq!(after, 2);
        assert!((delta - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_cheapest_position_singleton_cycle() {
        let p = MatrixProblem::new(WeightMatrix::uniform(3, 10.0)).closed();
        let tour = Tour::new(3, 0, Some(0)).unwrap();
        let (after, delta) = cheapest_position(&p, &tour, 2).unwrap();
        assert_eq!(after, 0);
        assert!((delta - 20.0).abs() < 1e-10);
    }

    #[test]
    fn test_cheapest_position_placed_visit() {
        let p = line_problem();
        let tour = Tour::from_sequence(4, &[0, 1], None).unwrap();
        assert_eq!(cheapest_position(&p, &tour, 1), None);
    }

    #[test]
    fn test_budget_caps_placements() {
        // Uniform weight 10, closed, budget 40: at most 4 of 5 visits fit.
        let p = MatrixProblem::new(WeightMatrix::uniform(5, 10.0))
            .closed()
            .with_budget(40.0)
            .with_optional_visits();
        let mut tour = Tour::new(5, 0, Some(0)).unwrap();
        let mut rng = StdRng::seed_from_u64(5);

        let delta = CheapestInsertion::new()
            .apply(&p, &PlacementObjective, &mut tour, &mut rng)
            .expect("placing visits improves the placement objective");

        assert_eq!(tour.len(), 4);
        assert!((tour_weight(&p, &tour) - 40.0).abs() < 1e-10);
        assert!(tour.verify());
        // Net three more placements than the singleton start... minus the
        // weight taken on; the exact components are checked instead.
        let _ = delta;
    }

    #[test]
    fn test_rolls_back_when_not_improving() {
        let mut wm = WeightMatrix::uniform(5, 100.0);
        for i in 0..5 {
            let j = (i + 1) % 5;
            wm.set(i, j, 10.0);
            wm.set(j, i, 10.0);
        }
        let p = MatrixProblem::new(wm).closed();
        let mut tour = Tour::from_sequence(5, &[0, 1, 2, 3, 4], Some(0)).unwrap();
        let mut rng = StdRng::seed_from_u64(5);

        let delta =
            CheapestInsertion::new()
                .with_fraction(0.5)
                .apply(&p, &WeightObjective, &mut tour, &mut rng);

        // The ring is optimal: the rebuild cannot beat it, so the original
        // tour comes back byte for byte.
        assert_eq!(delta, None);
        assert_eq!(tour.to_vec(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_improves_bad_tour() {
        let wm = WeightMatrix::from_coords(&[
            (0.0, 0.0),
            (1.0, 0.0),
            (2.0, 0.0),
            (3.0, 0.0),
            (4.0, 0.0),
            (5.0, 0.0),
        ]);
        let p = MatrixProblem::new(wm);
        let mut tour = Tour::from_sequence(6, &[0, 5, 1, 4, 2, 3], None).unwrap();
        let before = tour_weight(&p, &tour);
        let mut rng = StdRng::seed_from_u64(9);

        let mut improved = false;
        for _ in 0..20 {
            if CheapestInsertion::new()
                .with_fraction(0.5)
                .apply(&p, &WeightObjective, &mut tour, &mut rng)
                .is_some()
            {
                improved = true;
            }
        }

        assert!(improved);
        assert!(tour_weight(&p, &tour) < before);
        assert_eq!(tour.len(), 6);
        assert!(tour.verify());
    }
}
