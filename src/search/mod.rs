//! Operator and perturber contracts, local search, and composition.
//!
//! - [`Operator`] — In-place improving transformation with an exact delta
//! - [`Perturber`] — Deliberate diversification at a neighbourhood level
//! - [`Iterate`] / [`Concat`] — Composition wrappers over operators
//! - [`TwoOpt`](two_opt::TwoOpt) — First-improvement 2-opt edge exchange
//! - [`ThreeOpt`](three_opt::ThreeOpt) — 3-opt with don't-look bits (closed tours)
//! - [`CheapestInsertion`](cheapest_insertion::CheapestInsertion) — Ruin and cheapest reinsertion
//! - [`ShiftAfter`](shift_after::ShiftAfter) / [`Random1Shift`](shift_after::Random1Shift) — Relocation operator and perturber
//! - [`SeqExchange`](exchange::SeqExchange) — Window exchange over [`Seq`](crate::tour::Seq) views

mod cheapest_insertion;
mod exchange;
mod shift_after;
mod three_opt;
mod two_opt;

pub use cheapest_insertion::{cheapest_position, CheapestInsertion};
pub use exchange::SeqExchange;
pub use shift_after::{Random1Shift, ShiftAfter};
pub use three_opt::{DontLookBits, ThreeOpt};
pub use two_opt::TwoOpt;

use rand::Rng;

use crate::candidate::Objective;

/// An in-place solution-improving transformation.
///
/// `apply` returns `Some(delta)` — the exact signed fitness change, negative
/// for lower-is-better objectives — when it improved the solution, `None`
/// when no improving move was found (which is not an error). Operators never
/// report an improvement within their epsilon of zero.
pub trait Operator<P, S, O: Objective<P, S>> {
    /// Diagnostic name.
    fn name(&self) -> &str;

    /// Tries to improve `solution` in place.
    fn apply<R: Rng>(
        &self,
        problem: &P,
        objective: &O,
        solution: &mut S,
        rng: &mut R,
    ) -> Option<O::Fitness>;
}

/// A diversification move parameterized by a neighbourhood level.
///
/// Unlike an [`Operator`], a perturber is expected to worsen the solution;
/// it returns the exact delta so the caller can keep fitness current.
pub trait Perturber<P, S, O: Objective<P, S>> {
    /// Diagnostic name.
    fn name(&self) -> &str;

    /// Perturbs `solution` in place at the given neighbourhood level
    /// (level 0 is the narrowest), returning the exact fitness delta.
    fn perturb<R: Rng>(
        &self,
        problem: &P,
        objective: &O,
        solution: &mut S,
        level: usize,
        rng: &mut R,
    ) -> O::Fitness;
}

/// Re-applies an operator until it finds no further improvement.
///
/// The accumulated delta is the sum of all accepted deltas. `max_rounds`
/// bounds the loop against oscillation.
pub struct Iterate<T> {
    inner: T,
    max_rounds: usize,
}

impl<T> Iterate<T> {
    /// Wraps `inner`, applying it at most `max_rounds` times per call.
    pub fn new(inner: T, max_rounds: usize) -> Self {
        Self { inner, max_rounds }
    }
}

impl<P, S, O, T> Operator<P, S, O> for Iterate<T>
where
    O: Objective<P, S>,
    T: Operator<P, S, O>,
{
    fn name(&self) -> &str {
        "iterate"
    }

    fn apply<R: Rng>(
        &self,
        problem: &P,
        objective: &O,
        solution: &mut S,
        rng: &mut R,
    ) -> Option<O::Fitness> {
        let mut total: Option<O::Fitness> = None;
        for _ in 0..self.max_rounds {
            match self.inner.apply(problem, objective, solution, rng) {
                Some(delta) => {
                    total = Some(match total {
                        None => delta,
                        Some(t) => objective.add(&t, &delta),
                    });
                }
                None => break,
            }
        }
        total
    }
}

/// Applies two operators in sequence, reporting the combined delta.
pub struct Concat<A, B> {
    a: A,
    b: B,
}

impl<A, B> Concat<A, B> {
    /// Composes `a` then `b`.
    pub fn new(a: A, b: B) -> Self {
        Self { a, b }
    }
}

impl<P, S, O, A, B> Operator<P, S, O> for Concat<A, B>
where
    O: Objective<P, S>,
    A: Operator<P, S, O>,
    B: Operator<P, S, O>,
{
    fn name(&self) -> &str {
        "concat"
    }

    fn apply<R: Rng>(
        &self,
        problem: &P,
        objective: &O,
        solution: &mut S,
        rng: &mut R,
    ) -> Option<O::Fitness> {
        let first = self.a.apply(problem, objective, solution, rng);
        let second = self.b.apply(problem, objective, solution, rng);
        match (first, second) {
            (None, None) => None,
            (Some(d), None) | (None, Some(d)) => Some(d),
            (Some(a), Some(b)) => Some(objective.add(&a, &b)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::cmp::Ordering;

    struct CountdownObjective;

    impl Objective<(), i32> for CountdownObjective {
        type Fitness = f64;
        fn zero(&self) -> f64 {
            0.0
        }
        fn infinite(&self) -> f64 {
            f64::INFINITY
        }
        fn calculate(&self, _problem: &(), s: &i32) -> f64 {
            *s as f64
        }
        fn add(&self, a: &f64, b: &f64) -> f64 {
            a + b
        }
        fn subtract(&self, a: &f64, b: &f64) -> f64 {
            a - b
        }
        fn compare(&self, a: &f64, b: &f64) -> Ordering {
            a.partial_cmp(b).expect("no NaN")
        }
        fn from_weight(&self, w: f64) -> f64 {
            w
        }
    }

    /// Decrements once per application while positive.
    struct StepDown;

    impl Operator<(), i32, CountdownObjective> for StepDown {
        fn name(&self) -> &str {
            "step_down"
        }
        fn apply<R: Rng>(
            &self,
            _problem: &(),
            _objective: &CountdownObjective,
            s: &mut i32,
            _rng: &mut R,
        ) -> Option<f64> {
            if *s > 0 {
                *s -= 1;
                Some(-1.0)
            } else {
                None
            }
        }
    }

    #[test]
    fn test_iterate_runs_to_fixed_point() {
        let op = Iterate::new(StepDown, 100);
        let mut rng = StdRng::seed_from_u64(1);
        let mut s = 5;
        let delta = op.apply(&(), &CountdownObjective, &mut s, &mut rng);
        assert_eq!(s, 0);
        assert_eq!(delta, Some(-5.0));
    }

    #[test]
    fn test_iterate_respects_max_rounds() {
        let op = Iterate::new(StepDown, 3);
        let mut rng = StdRng::seed_from_u64(1);
        let mut s = 10;
        let delta = op.apply(&(), &CountdownObjective, &mut s, &mut rng);
        assert_eq!(s, 7);
        assert_eq!(delta, Some(-3.0));
    }

    #[test]
    fn test_iterate_no_improvement_is_none() {
        let op = Iterate::new(StepDown, 10);
        let mut rng = StdRng::seed_from_u64(1);
        let mut s = 0;
        assert_eq!(op.apply(&(), &CountdownObjective, &mut s, &mut rng), None);
    }

    #[test]
    fn test_concat_combines_deltas() {
        let op = Concat::new(StepDown, StepDown);
        let mut rng = StdRng::seed_from_u64(1);
        let mut s = 2;
        let delta = op.apply(&(), &CountdownObjective, &mut s, &mut rng);
        assert_eq!(s, 0);
        assert_eq!(delta, Some(-2.0));
    }

    #[test]
    fn test_concat_partial_improvement() {
        let op = Concat::new(StepDown, StepDown);
        let mut rng = StdRng::seed_from_u64(1);
        let mut s = 1;
        let delta = op.apply(&(), &CountdownObjective, &mut s, &mut rng);
        assert_eq!(s, 0);
        assert_eq!(delta, Some(-1.0));
    }
}
