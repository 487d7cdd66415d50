//! Window exchange.
//!
//! ## Algorithm
//!
//! Swaps two disjoint windows of 2..=k consecutive visits, trying all four
//! orientation combinations of the relocated windows. Window internal costs
//! come from precomputed [`Seq`] views, so each candidate placement is
//! priced from its connection edges alone. The scan is first-improvement.
//!
//! Windows never span the anchor visit or a designated fixed tail. When the
//! problem carries a weight budget the move is only accepted if the
//! resulting total stays within it, improving or not.

use rand::Rng;

use crate::candidate::Objective;
use crate::problem::{tour_weight, TourProblem};
use crate::search::Operator;
use crate::tour::{Seq, Tour};

const DEFAULT_EPSILON: f64 = 1e-3;
const DEFAULT_MAX_LEN: usize = 3;

/// First-improvement exchange of visit windows over a [`Tour`].
#[derive(Debug, Clone)]
pub struct SeqExchange {
    max_len: usize,
    epsilon: f64,
}

impl SeqExchange {
    /// Creates the operator with the default window bound and epsilon.
    pub fn new() -> Self {
        Self {
            max_len: DEFAULT_MAX_LEN,
            epsilon: DEFAULT_EPSILON,
        }
    }

    /// Sets the largest window length considered (at least 2).
    pub fn with_max_len(mut self, max_len: usize) -> Self {
        self.max_len = max_len.max(2);
        self
    }

    /// Overrides the minimum improvement worth accepting.
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Cost of a span: `prev` into each non-empty part in turn, then the
    /// trailing edge if the span has a successor.
    fn span_cost<P: TourProblem>(
        problem: &P,
        prev: usize,
        parts: &[(&Seq, bool)],
        next: Option<usize>,
    ) -> f64 {
        let mut cost = 0.0;
        let mut cur = prev;
        for &(seq, rev) in parts.iter().filter(|(s, _)| !s.is_empty()) {
            cost += problem.weight(cur, seq.entry(rev));
            cost += seq.cost(rev);
            cur = seq.exit(rev);
        }
        if let Some(n) = next {
            cost += problem.weight(cur, n);
        }
        cost
    }

    fn rebuild(tour: &mut Tour, order: &[usize]) {
        for w in order.windows(2) {
            tour.replace_edge_from(w[0], Some(w[1]));
        }
        let tail = *order.last().expect("tours are non-empty");
        if tour.is_closed() {
            tour.replace_edge_from(tail, Some(order[0]));
        } else {
            tour.replace_edge_from(tail, None);
        }
    }
}

impl Default for SeqExchange {
    fn default() -> Self {
        Self::new()
    }
}

impl<P, O> Operator<P, Tour, O> for SeqExchange
where
    P: TourProblem,
    O: Objective<P, Tour>,
{
    fn name(&self) -> &str {
        "seq_exchange"
    }

    fn apply<R: Rng>(
        &self,
        problem: &P,
        objective: &O,
        tour: &mut Tour,
        _rng: &mut R,
    ) -> Option<O::Fitness> {
        let order = tour.to_vec();
        let n = order.len();
        // Index range windows may occupy: never the anchor, never a fixed tail.
        let fixed_tail = tour.last().filter(|&l| l != tour.first()).is_some();
        let limit = if fixed_tail { n - 1 } else { n };
        if limit < 5 {
            // Two disjoint windows of 2 need at least 4 movable visits.
            return None;
        }

        let old_total = tour_weight(problem, tour);
        let weigh = |f: usize, t: usize| problem.weight(f, t);

        for la in 2..=self.max_len {
            for i in 1..=(limit.saturating_sub(la)) {
                let seq_a = Seq::new(order[i..i + la].to_vec(), weigh);
                for lb in 2..=self.max_len {
                    for j in (i + la)..=(limit.saturating_sub(lb)) {
                        let seq_b = Seq::new(order[j..j + lb].to_vec(), weigh);
                        let seq_m = Seq::new(order[i + la..j].to_vec(), weigh);
                        let p_a = order[i - 1];
                        let end = j + lb;
                        let s_b = if end < limit {
                            Some(order[end])
                        } else if fixed_tail {
                            Some(order[n - 1])
                        } else if tour.is_closed() {
                            Some(order[0])
                        } else {
                            None
                        };

                        let old = Self::span_cost(
                            problem,
                            p_a,
                            &[(&seq_a, false), (&seq_m, false), (&seq_b, false)],
                            s_b,
                        );
                        for ra in [false, true] {
                            for rb in [false, true] {
                                let new = Self::span_cost(
                                    problem,
                                    p_a,
                                    &[(&seq_b, rb), (&seq_m, false), (&seq_a, ra)],
                                    s_b,
                                );
                                let delta = new - old;
                                if delta >= -self.epsilon {
                                    continue;
                                }
                                if let Some(budget) = problem.budget() {
                                    if old_total + delta > budget {
                                        continue;
                                    }
                                }
                                let mut rebuilt = Vec::with_capacity(n);
                                rebuilt.extend_from_slice(&order[..i]);
                                if rb {
                                    rebuilt.extend(seq_b.visits().iter().rev());
                                } else {
                                    rebuilt.extend_from_slice(seq_b.visits());
                                }
                                rebuilt.extend_from_slice(&order[i + la..j]);
                                if ra {
                                    rebuilt.extend(seq_a.visits().iter().rev());
                                } else {
                                    rebuilt.extend_from_slice(seq_a.visits());
                                }
                                rebuilt.extend_from_slice(&order[j + lb..]);
                                Self::rebuild(tour, &rebuilt);
                                return Some(objective.from_weight(delta));
                            }
                        }
                    }
                }
            }
        }
        None
    }
}
