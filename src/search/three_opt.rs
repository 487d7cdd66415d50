//! 3-opt reconnection.
//!
//! ## Algorithm
//!
//! Cuts three edges of a closed tour, splitting it into segments
//! `A B C D`, and evaluates the 7 non-identity reconnection patterns
//! (reversals and the B/C swap; 2-opt moves appear as the two
//! single-reversal patterns). The scan is first-improvement with a restart
//! after every accepted move. Don't-look bits skip cut positions whose
//! leading visit yielded no improvement since it was last touched; they live
//! in an explicit [`DontLookBits`] structure that callers may keep alive
//! between invocations.
//!
//! Only closed tours are eligible; an open tour is left untouched.
//!
//! ## Complexity
//!
//! O(n³) per pass before pruning; an optional nearest-neighbour shortlist
//! prunes triples whose reconnection endpoints are all far from the leading
//! cut visit.
//!
//! ## Reference
//!
//! Lin, S. (1965). "Computer Solutions of the Traveling Salesman Problem",
//! *Bell System Technical Journal* 44(10), 2245-2269.

use std::sync::Arc;

use rand::Rng;
use tracing::warn;

use crate::candidate::Objective;
use crate::problem::TourProblem;
use crate::search::Operator;
use crate::tour::Tour;
use crate::weight::NearestNeighbourArray;

const DEFAULT_EPSILON: f64 = 0.1;

/// Per-visit flags suppressing re-examination of cut positions whose
/// neighbourhood has not changed since they last yielded no improvement.
///
/// [`Operator::apply`] allocates a fresh set per call; pass one to
/// [`ThreeOpt::apply_with_bits`] instead to carry the suppressed set across
/// invocations on the same tour. After mutating the tour outside the
/// operator, [`clear`](DontLookBits::clear) the visits whose incident edges
/// changed.
#[derive(Debug, Clone)]
pub struct DontLookBits {
    bits: Vec<bool>,
}

impl DontLookBits {
    /// All-clear flags for a tour of the given capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            bits: vec![false; capacity],
        }
    }

    /// Marks `visit` as worth examining again.
    pub fn clear(&mut self, visit: usize) {
        self.bits[visit] = false;
    }

    /// Marks every visit as worth examining again.
    pub fn clear_all(&mut self) {
        self.bits.iter_mut().for_each(|b| *b = false);
    }

    /// Whether `visit` is currently suppressed.
    pub fn is_set(&self, visit: usize) -> bool {
        self.bits[visit]
    }

    fn set(&mut self, visit: usize) {
        self.bits[visit] = true;
    }
}

/// First-improvement 3-opt with don't-look bits over a closed [`Tour`].
#[derive(Debug, Clone)]
pub struct ThreeOpt {
    epsilon: f64,
    neighbours: Option<Arc<NearestNeighbourArray>>,
}

impl ThreeOpt {
    /// Creates the operator with the default improvement epsilon.
    pub fn new() -> Self {
        Self {
            epsilon: DEFAULT_EPSILON,
            neighbours: None,
        }
    }

    /// Overrides the minimum improvement worth accepting.
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Prunes cut triples using a nearest-neighbour shortlist: a triple is
    /// only evaluated when at least one of its reconnection endpoints is in
    /// the shortlist of the leading cut visit.
    pub fn with_neighbours(mut self, neighbours: Arc<NearestNeighbourArray>) -> Self {
        self.neighbours = Some(neighbours);
        self
    }

    /// Evaluates the 7 patterns for cuts after `order[i]`, `order[j]` and
    /// `order[k]`, returning the best pattern and its weight delta.
    fn best_pattern<P: TourProblem>(
        &self,
        problem: &P,
        order: &[usize],
        i: usize,
        j: usize,
        k: usize,
    ) -> Option<(u8, f64)> {
        let n = order.len();
        let a_end = order[i];
        let b_start = order[i + 1];
        let b_end = order[j];
        let c_start = order[j + 1];
        let c_end = order[k];
        let d_start = order[(k + 1) % n];

        let old = problem.weight(a_end, b_start)
            + problem.weight(b_end, c_start)
            + problem.weight(c_end, d_start);

        let costs = [
            // A B C' D
            problem.weight(a_end, b_start)
                + problem.weight(b_end, c_end)
                + problem.weight(c_start, d_start),
            // A B' C D
            problem.weight(a_end, b_end)
                + problem.weight(b_start, c_start)
                + problem.weight(c_end, d_start),
            // A B' C' D
            problem.weight(a_end, b_end)
                + problem.weight(b_start, c_end)
                + problem.weight(c_start, d_start),
            // A C B D
            problem.weight(a_end, c_start)
                + problem.weight(c_end, b_start)
                + problem.weight(b_end, d_start),
            // A C B' D
            problem.weight(a_end, c_start)
                + problem.weight(c_end, b_end)
                + problem.weight(b_start, d_start),
            // A C' B D
            problem.weight(a_end, c_end)
                + problem.weight(c_start, b_start)
                + problem.weight(b_end, d_start),
            // A C' B' D
            problem.weight(a_end, c_end)
                + problem.weight(c_start, b_end)
                + problem.weight(b_start, d_start),
        ];

        let mut best: Option<(u8, f64)> = None;
        for (p, cost) in costs.iter().enumerate() {
            let delta = cost - old;
            if delta < -self.epsilon && best.map_or(true, |(_, bd)| delta < bd) {
                best = Some((p as u8 + 1, delta));
            }
        }
        best
    }

    /// Rebuilds the visit order after applying `pattern` at cuts (i, j, k).
    fn reconnect(order: &[usize], i: usize, j: usize, k: usize, pattern: u8) -> Vec<usize> {
        let seg_a = &order[..=i];
        let seg_b = &order[i + 1..=j];
        let seg_c = &order[j + 1..=k];
        let seg_d = &order[k + 1..];

        let mut out = Vec::with_capacity(order.len());
        out.extend_from_slice(seg_a);
        match pattern {
            1 => {
                out.extend_from_slice(seg_b);
                out.extend(seg_c.iter().rev());
            }
            2 => {
                out.extend(seg_b.iter().rev());
                out.extend_from_slice(seg_c);
            }
            3 => {
                out.extend(seg_b.iter().rev());
                out.extend(seg_c.iter().rev());
            }
            4 => {
                out.extend_from_slice(seg_c);
                out.extend_from_slice(seg_b);
            }
            5 => {
                out.extend_from_slice(seg_c);
                out.extend(seg_b.iter().rev());
            }
            6 => {
                out.extend(seg_c.iter().rev());
                out.extend_from_slice(seg_b);
            }
            7 => {
                out.extend(seg_c.iter().rev());
                out.extend(seg_b.iter().rev());
            }
            _ => unreachable!("patterns are 1..=7"),
        }
        out.extend_from_slice(seg_d);
        out
    }

    fn pruned(&self, a_end: usize, b_end: usize, c_start: usize, c_end: usize) -> bool {
        match &self.neighbours {
            None => false,
            Some(nn) => {
                let list = nn.neighbours(a_end);
                !(list.contains(&b_end) || list.contains(&c_start) || list.contains(&c_end))
            }
        }
    }

    /// Rewrites the tour links to match `order` (closed).
    fn rebuild(tour: &mut Tour, order: &[usize]) {
        for w in order.windows(2) {
            tour.replace_edge_from(w[0], Some(w[1]));
        }
        let tail = *order.last().expect("closed tours are non-empty");
        tour.replace_edge_from(tail, Some(order[0]));
    }

    /// Same scan as [`Operator::apply`], but reads and updates the caller's
    /// don't-look bits, so the suppressed set survives across invocations.
    ///
    /// `bits` must have been created for this tour's capacity.
    pub fn apply_with_bits<P, O>(
        &self,
        problem: &P,
        objective: &O,
        tour: &mut Tour,
        bits: &mut DontLookBits,
    ) -> Option<O::Fitness>
    where
        P: TourProblem,
        O: Objective<P, Tour>,
    {
        if !tour.is_closed() {
            warn!("three_opt requires a closed tour; leaving solution untouched");
            return None;
        }

        let mut order = tour.to_vec();
        let n = order.len();
        if n < 4 {
            return None;
        }

        let mut total = 0.0;
        let mut improved = true;

        while improved {
            improved = false;
            'scan: for i in 0..n - 2 {
                let a_end = order[i];
                if bits.is_set(a_end) {
                    continue;
                }
                for j in (i + 1)..n - 1 {
                    for k in (j + 1)..n {
                        if self.pruned(a_end, order[j], order[j + 1], order[k]) {
                            continue;
                        }
                        if let Some((pattern, delta)) = self.best_pattern(problem, &order, i, j, k)
                        {
                            let touched = [
                                order[i],
                                order[i + 1],
                                order[j],
                                order[j + 1],
                                order[k],
                                order[(k + 1) % n],
                            ];
                            order = Self::reconnect(&order, i, j, k, pattern);
                            total += delta;
                            for v in touched {
                                bits.clear(v);
                            }
                            improved = true;
                            break 'scan;
                        }
                    }
                }
                bits.set(a_end);
            }
        }

        if total < 0.0 {
            Self::rebuild(tour, &order);
            Some(objective.from_weight(total))
        } else {
            None
        }
    }
}

impl Default for ThreeOpt {
    fn default() -> Self {
        Self::new()
    }
}

impl<P, O> Operator<P, Tour, O> for ThreeOpt
where
    P: TourProblem,
    O: Objective<P, Tour>,
{
    fn name(&self) -> &str {
        "three_opt"
    }

    fn apply<R: Rng>(
        &self,
        problem: &P,
        objective: &O,
        tour: &mut Tour,
        _rng: &mut R,
    ) -> Option<O::Fitness> {
        let mut bits = DontLookBits::new(tour.capacity());
        self.apply_with_bits(problem, objective, tour, &mut bits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::WeightObjective;
    use crate::problem::{tour_weight, MatrixProblem};
    use crate::weight::NeighbourDirection;
    use crate::weight::WeightMatrix;
    use rand::rngs::StdRng;
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
    fn test_untangles_ring() {
        let p = ring_problem();
        let mut tour = Tour::from_sequence(5, &[0, 3, 2, 1, 4], Some(0)).unwrap();
        let mut rng = StdRng::seed_from_u64(3);

        let delta = ThreeOpt::new()
            .apply(&p, &WeightObjective, &mut tour, &mut rng)
            .expect("tangled ring should improve");

        assert!((delta - (-180.0)).abs() < 1e-10);
        assert_eq!(tour.to_vec(), vec![0, 1, 2, 3, 4]);
        assert!((tour_weight(&p, &tour) - 50.0).abs() < 1e-10);
        assert!(tour.verify());
    }

    #[test]
    fn test_neighbour_pruning_keeps_result() {
        let p = ring_problem();
        let nn = Arc::new(NearestNeighbourArray::build(
            &p,
            NeighbourDirection::Forward,
            2,
        ));
        let mut tour = Tour::from_sequence(5, &[0, 3, 2, 1, 4], Some(0)).unwrap();
        let mut rng = StdRng::seed_from_u64(3);

        ThreeOpt::new()
            .with_neighbours(nn)
            .apply(&p, &WeightObjective, &mut tour, &mut rng)
            .expect("pruned scan still finds the move");

        assert!((tour_weight(&p, &tour) - 50.0).abs() < 1e-10);
    }

    #[test]
    fn test_open_tour_is_untouched() {
        let p = MatrixProblem::new(WeightMatrix::uniform(5, 10.0));
        let mut tour = Tour::from_sequence(5, &[0, 3, 2, 1, 4], None).unwrap();
        let before = tour.to_vec();
        let mut rng = StdRng::seed_from_u64(3);

        let delta = ThreeOpt::new().apply(&p, &WeightObjective, &mut tour, &mut rng);

        assert_eq!(delta, None);
        assert_eq!(tour.to_vec(), before);
    }

    #[test]
    fn test_short_tour_passthrough() {
        let p = ring_problem();
        let mut tour = Tour::from_sequence(5, &[0, 2, 1], Some(0)).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let delta = ThreeOpt::new().apply(&p, &WeightObjective, &mut tour, &mut rng);
        assert_eq!(delta, None);
        assert_eq!(tour.to_vec(), vec![0, 2, 1]);
    }

    #[test]
    fn test_dont_look_bits_persist_across_calls() {
        let p = ring_problem();
        let mut tour = Tour::from_sequence(5, &[0, 3, 2, 1, 4], Some(0)).unwrap();
        let mut bits = DontLookBits::new(tour.capacity());
        let op = ThreeOpt::new();

        op.apply_with_bits(&p, &WeightObjective, &mut tour, &mut bits)
            .expect("tangled ring should improve");
        assert_eq!(tour.to_vec(), vec![0, 1, 2, 3, 4]);
        // The scan terminated with the leading cut visit suppressed.
        assert!(bits.is_set(0));

        // The suppressed set carries into the next call, which finds nothing.
        let again: Option<f64> = op.apply_with_bits(&p, &WeightObjective, &mut tour, &mut bits);
        assert_eq!(again, None);

        bits.clear_all();
        assert!(!bits.is_set(0));
        let cleared: Option<f64> = op.apply_with_bits(&p, &WeightObjective, &mut tour, &mut bits);
        assert_eq!(cleared, None);
    }

    #[test]
    fn test_already_optimal() {
        let p = ring_problem();
        let mut tour = Tour::from_sequence(5, &[0, 1, 2, 3, 4], Some(0)).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let delta = ThreeOpt::new().apply(&p, &WeightObjective, &mut tour, &mut rng);
        assert_eq!(delta, None);
    }

    #[test]
    fn test_preserves_visit_set() {
        let wm = WeightMatrix::from_coords(&[
            (0.0, 0.0),
            (5.0, 1.0),
            (2.0, 7.0),
            (8.0, 3.0),
            (1.0, 4.0),
            (6.0, 6.0),
            (3.0, 2.0),
        ]);
        let p = MatrixProblem::new(wm).closed();
        let mut tour = Tour::from_sequence(7, &[0, 4, 2, 6, 1, 5, 3], Some(0)).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let before = tour_weight(&p, &tour);

        let delta = ThreeOpt::new().apply(&p, &WeightObjective, &mut tour, &mut rng);

        let mut placed = tour.to_vec();
        placed.sort_unstable();
        assert_eq!(placed, vec![0, 1, 2, 3, 4, 5, 6]);
        assert!(tour.verify());
        if let Some(d) = delta {
            assert!((tour_weight(&p, &tour) - (before + d)).abs() < 1e-6);
        }
    }
}
