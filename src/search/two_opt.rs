//! 2-opt edge exchange.
//!
//! ## Algorithm
//!
//! Enumerates ordered pairs of tour edges `(a→b, c→d)` with `c` downstream
//! of `b`, and tests the reconnection `a→c, b→d` with the intervening
//! segment reversed. The scan is first-improvement: the first pair whose
//! reconnection beats the operator epsilon is applied and the call returns
//! immediately with the exact weight delta.
//!
//! ## Complexity
//!
//! O(n²) edge pairs per call; an accepted move costs O(segment) to rewrite
//! the reversed links.

use rand::Rng;

use crate::candidate::Objective;
use crate::problem::TourProblem;
use crate::search::Operator;
use crate::tour::Tour;

const DEFAULT_EPSILON: f64 = 1e-3;

/// First-improvement 2-opt over a [`Tour`].
///
/// Works on closed and open tours alike; open tours simply have no closing
/// edge in the scan.
#[derive(Debug, Clone)]
pub struct TwoOpt {
    epsilon: f64,
}

impl TwoOpt {
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

    /// Reverses the chain `b ..= c` and reconnects `a→c` and `b→d`.
    fn reverse_segment(tour: &mut Tour, a: usize, b: usize, c: usize, d: Option<usize>) {
        let mut segment = vec![b];
        segment.extend(tour.between(b, c));
        segment.push(c);

        tour.replace_edge_from(a, Some(c));
        for w in segment.windows(2) {
            tour.replace_edge_from(w[1], Some(w[0]));
        }
        tour.replace_edge_from(b, d);
    }
}

impl Default for TwoOpt {
    fn default() -> Self {
        Self::new()
    }
}

impl<P, O> Operator<P, Tour, O> for TwoOpt
where
    P: TourProblem,
    O: Objective<P, Tour>,
{
    fn name(&self) -> &str {
        "two_opt"
    }

    fn apply<R: Rng>(
        &self,
        problem: &P,
        objective: &O,
        tour: &mut Tour,
        _rng: &mut R,
    ) -> Option<O::Fitness> {
        let edges: Vec<(usize, usize)> = tour.pairs().collect();
        for i in 0..edges.len() {
            let (a, b) = edges[i];
            for j in (i + 1)..edges.len() {
                let (c, d) = edges[j];
                if b == c {
                    // Adjacent edges; reversing a single visit is a no-move.
                    continue;
                }
                let removed = problem.weight(a, b) + problem.weight(c, d);
                let added = problem.weight(a, c) + problem.weight(b, d);
                let delta = added - removed;
                if delta < -self.epsilon {
                    Self::reverse_segment(tour, a, b, c, Some(d));
                    return Some(objective.from_weight(delta));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::WeightObjective;
    use crate::problem::{tour_weight, MatrixProblem};
    use crate::weight::WeightMatrix;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;

    /// Ring of 5 visits: cycle-adjacent hops cost 10, every other hop 100.
    fn ring_problem() -> MatrixProblem {
        let mut wm = WeightMatrix::uniform(5, 100.0);
        for i in 0..5 {
            let j = (i + 1) % 5;
            wm.set(i, j, 10.0);
            wm.set(j, i, 10.0);
        }
        MatrixProblem::new(wm).closed()
    }

    #[test]
    fn test_uncrosses_tour() {
        let p = ring_problem();
        let mut tour = Tour::from_sequence(5, &[0, 3, 2, 1, 4], Some(0)).unwrap();
        assert!((tour_weight(&p, &tour) - 230.0).abs() < 1e-10);

        let mut rng = StdRng::seed_from_u64(7);
        let delta = TwoOpt::new().apply(&p, &WeightObjective, &mut tour, &mut rng);

        assert_eq!(delta, Some(-180.0));
        assert_eq!(tour.to_vec(), vec![0, 1, 2, 3, 4]);
        assert!((tour_weight(&p, &tour) - 50.0).abs() < 1e-10);
        assert!(tour.verify());
    }

    #[test]
    fn test_local_optimum_returns_none() {
        let p = ring_problem();
        let mut tour = Tour::from_sequence(5, &[0, 1, 2, 3, 4], Some(0)).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let delta = TwoOpt::new().apply(&p, &WeightObjective, &mut tour, &mut rng);
        assert_eq!(delta, None);
        assert_eq!(tour.to_vec(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_open_tour_improvement() {
        // Path 0-2-1-3 on a line; swapping the middle pair shortens it.
        let wm = WeightMatrix::from_coords(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (3.0, 0.0)]);
        let p = MatrixProblem::new(wm);
        let mut tour = Tour::from_sequence(4, &[0, 2, 1, 3], None).unwrap();
        let before = tour_weight(&p, &tour);

        let mut rng = StdRng::seed_from_u64(7);
        let delta = TwoOpt::new()
            .apply(&p, &WeightObjective, &mut tour, &mut rng)
            .expect("crossed path should improve");

        assert_eq!(tour.to_vec(), vec![0, 1, 2, 3]);
        assert!((tour_weight(&p, &tour) - (before + delta)).abs() < 1e-10);
    }

    proptest! {
        /// The reported delta always matches a from-scratch recomputation.
        #[test]
        fn prop_delta_is_exact(
            coords in proptest::collection::vec((0.0f64..100.0, 0.0f64..100.0), 5..10),
            seed in 0u64..1000,
        ) {
            let n = coords.len();
            let p = MatrixProblem::new(WeightMatrix::from_coords(&coords)).closed();
            let mut rng = StdRng::seed_from_u64(seed);
            let mut order: Vec<usize> = (1..n).collect();
            order.shuffle(&mut rng);
            let mut sequence = vec![0];
            sequence.extend(order);
            let mut tour = Tour::from_sequence(n, &sequence, Some(0)).unwrap();

            let before = tour_weight(&p, &tour);
            if let Some(delta) = TwoOpt::new().apply(&p, &WeightObjective, &mut tour, &mut rng) {
                let after = tour_weight(&p, &tour);
                prop_assert!((after - (before + delta)).abs() < 1e-6);
                prop_assert!(delta < 0.0);
            }
            prop_assert!(tour.verify());
        }
    }
}
