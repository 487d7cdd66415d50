//! Directed local search.
//!
//! ## Algorithm
//!
//! [`DirectionFlip`] sweeps the tour and, at each stop, re-decides the turn
//! taken there with both neighbours held fixed: a ≤4-way comparison of the
//! two incident directed edges plus the turn penalty. Sweeps repeat until a
//! full pass changes nothing.
//!
//! [`DirectedCheapestInsertion`] is the directed form of ruin-and-recreate:
//! every candidate reinsertion position is priced for all four turns of the
//! inserted visit, and the move is rolled back unless the objective improves.

use rand::Rng;

use crate::candidate::Objective;
use crate::directed::{
    directed_tour_weight, DirectedTour, DirectedTourProblem, DirectedVisit, Turn,
};
use crate::search::Operator;

const DEFAULT_EPSILON: f64 = 1e-3;
const DEFAULT_FRACTION: f64 = 0.3;

/// Cost of the stop at `visit` if it took `turn`: both incident directed
/// edges (where present) plus the turn penalty.
fn stop_cost<P: DirectedTourProblem + ?Sized>(
    problem: &P,
    dt: &DirectedTour,
    visit: usize,
    turn: Turn,
) -> f64 {
    let dv = DirectedVisit::new(visit, turn);
    let mut cost = problem.turn_penalty(visit, turn);
    if let Some(p) = dt.tour.prev_of(visit) {
        cost += problem.directed_weight(dt.directed(p), dv);
    }
    if let Some(n) = dt.tour.next_of(visit) {
        cost += problem.directed_weight(dv, dt.directed(n));
    }
    cost
}

/// Per-stop cheapest-turn local search over a [`DirectedTour`].
#[derive(Debug, Clone)]
pub struct DirectionFlip {
    epsilon: f64,
}

impl DirectionFlip {
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

impl Default for DirectionFlip {
    fn default() -> Self {
        Self::new()
    }
}

impl<P, O> Operator<P, DirectedTour, O> for DirectionFlip
where
    P: DirectedTourProblem,
    O: Objective<P, DirectedTour>,
{
    fn name(&self) -> &str {
        "direction_flip"
    }

    fn apply<R: Rng>(
        &self,
        problem: &P,
        objective: &O,
        dt: &mut DirectedTour,
        _rng: &mut R,
    ) -> Option<O::Fitness> {
        let mut total = 0.0;
        let mut changed = true;
        while changed {
            changed = false;
            for v in dt.tour.to_vec() {
                let current = dt.turn(v);
                let current_cost = stop_cost(problem, dt, v, current);
                let mut best: Option<(Turn, f64)> = None;
                for turn in Turn::ALL {
                    if turn == current {
                        continue;
                    }
                    let cost = stop_cost(problem, dt, v, turn);
                    if best.map_or(true, |(_, bc)| cost < bc) {
                        best = Some((turn, cost));
                    }
                }
                if let Some((turn, cost)) = best {
                    if cost < current_cost - self.epsilon {
                        dt.set_turn(v, turn);
                        total += cost - current_cost;
                        changed = true;
                    }
                }
            }
        }
        if total < 0.0 {
            Some(objective.from_weight(total))
        } else {
            None
        }
    }
}

/// Transactional directed ruin-and-recreate over a [`DirectedTour`].
#[derive(Debug, Clone)]
pub struct DirectedCheapestInsertion {
    fraction: f64,
    epsilon: f64,
}

impl DirectedCheapestInsertion {
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

    /// The cheapest insertion of `visit` over every position and turn.
    fn cheapest<P: DirectedTourProblem>(
        problem: &P,
        dt: &DirectedTour,
        visit: usize,
    ) -> Option<(usize, Turn, f64)> {
        if dt.tour.contains(visit) {
            return None;
        }
        let mut best: Option<(usize, Turn, f64)> = None;
        let mut consider = |after: usize, turn: Turn, delta: f64| {
            if best.map_or(true, |(_, _, d)| delta < d) {
                best = Some((after, turn, delta));
            }
        };
        for turn in Turn::ALL {
            let dv = DirectedVisit::new(visit, turn);
            let penalty = problem.turn_penalty(visit, turn);
            for (f, t) in dt.tour.pairs() {
                let df = dt.directed(f);
                let dtv = dt.directed(t);
                let delta = problem.directed_weight(df, dv) + problem.directed_weight(dv, dtv)
                    - problem.directed_weight(df, dtv)
                    + penalty;
                consider(f, turn, delta);
            }
            if dt.tour.last().is_none() {
                let tail = dt
                    .tour
                    .iter()
                    .last()
                    .expect("tours hold at least their first visit");
                let delta = problem.directed_weight(dt.directed(tail), dv) + penalty;
                consider(tail, turn, delta);
            } else if dt.tour.len() == 1 && dt.tour.is_closed() {
                let f = dt.tour.first();
                let df = dt.directed(f);
                let delta =
                    problem.directed_weight(df, dv) + problem.directed_weight(dv, df) + penalty;
                consider(f, turn, delta);
            }
        }
        best
    }
}

impl Default for DirectedCheapestInsertion {
    fn default() -> Self {
        Self::new()
    }
}

impl<P, O> Operator<P, DirectedTour, O> for DirectedCheapestInsertion
where
    P: DirectedTourProblem,
    O: Objective<P, DirectedTour>,
{
    fn name(&self) -> &str {
        "directed_cheapest_insertion"
    }

    fn apply<R: Rng>(
        &self,
        problem: &P,
        objective: &O,
        dt: &mut DirectedTour,
        rng: &mut R,
    ) -> Option<O::Fitness> {
        let before = objective.calculate(problem, dt);
        let snapshot = dt.clone();

        let mut pool: Vec<usize> = dt
            .tour
            .iter()
            .filter(|&v| v != dt.tour.first() && dt.tour.last() != Some(v))
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
            dt.tour.remove(v).expect("pool visits are placed and movable");
        }

        let mut candidates = pool;
        for v in 0..problem.dimension() {
            if !dt.tour.contains(v) && !candidates.contains(&v) {
                candidates.push(v);
            }
        }

        let mut weight = directed_tour_weight(problem, dt);
        while !candidates.is_empty() {
            let mut best: Option<(usize, usize, Turn, f64)> = None;
            for (idx, &v) in candidates.iter().enumerate() {
                if let Some((after, turn, delta)) = Self::cheapest(problem, dt, v) {
                    if best.map_or(true, |(_, _, _, d)| delta < d) {
                        best = Some((idx, after, turn, delta));
                    }
                }
            }
            let Some((idx, after, turn, delta)) = best else {
                break;
            };
            if let Some(budget) = problem.budget() {
                if weight + delta > budget {
                    break;
                }
            }
            let v = candidates.swap_remove(idx);
            dt.tour
                .insert_after(after, v)
                .expect("cheapest position is a valid insertion point");
            dt.set_turn(v, turn);
            weight += delta;
        }

        let after = objective.calculate(problem, dt);
        let margin = objective.add(&after, &objective.from_weight(self.epsilon));
        if objective.compare(&margin, &before) == std::cmp::Ordering::Less {
            Some(objective.subtract(&after, &before))
        } else {
            *dt = snapshot;
            None
        }
    }
}
