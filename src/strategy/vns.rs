//! Basic variable neighbourhood search.
//!
//! ## Algorithm
//!
//! Generate an initial candidate, improve it once, then loop: clone the
//! best, perturb the clone at the current neighbourhood level, run local
//! search to a fixed point, and accept only strict improvements. Acceptance
//! resets the level to 1; rejection widens it, wrapping at the configured
//! maximum. There is no probabilistic acceptance of worse candidates, so the
//! best fitness is monotone over the run.
//!
//! Fitness is accumulated from operator deltas, except under a
//! non-continuous objective, or while the running fitness is the infeasible
//! sentinel, where it is recomputed after every mutation. Folding a delta
//! onto the sentinel would leave it stuck there even after local search
//! restores feasibility.
//!
//! ## Reference
//!
//! Mladenović, N. & Hansen, P. (1997). "Variable neighborhood search",
//! *Computers & Operations Research* 24(11), 1097-1100.

use std::cmp::Ordering;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::Rng;
use tracing::debug;

use crate::candidate::{Candidate, Objective};
use crate::error::SearchError;
use crate::search::{Operator, Perturber};
use crate::strategy::{Flow, ProgressHook, Strategy};

/// Folds an operator delta into a running fitness, falling back to a full
/// recomputation when deltas cannot be trusted: under a non-continuous
/// objective, or when the running fitness is the infeasible sentinel.
fn fold_fitness<P, S, O: Objective<P, S>>(
    objective: &O,
    problem: &P,
    solution: &S,
    fitness: &O::Fitness,
    delta: &O::Fitness,
) -> O::Fitness {
    if objective.is_non_continuous()
        || objective.compare(fitness, &objective.infinite()) == Ordering::Equal
    {
        objective.calculate(problem, solution)
    } else {
        objective.add(fitness, delta)
    }
}

/// Stop conditions and neighbourhood bounds for [`VnsStrategy`].
#[derive(Debug, Clone)]
pub struct VnsConfig {
    max_iterations: usize,
    max_levels: usize,
    time_limit: Option<Duration>,
    stop_flag: Option<Arc<AtomicBool>>,
}

impl VnsConfig {
    /// Default configuration: 1000 iterations, 5 levels, no time limit.
    pub fn new() -> Self {
        Self {
            max_iterations: 1000,
            max_levels: 5,
            time_limit: None,
            stop_flag: None,
        }
    }

    /// Caps the number of perturbation iterations.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Sets the widest neighbourhood level (at least 1).
    pub fn with_max_levels(mut self, max_levels: usize) -> Self {
        self.max_levels = max_levels.max(1);
        self
    }

    /// Stops the search once this much wall time has elapsed.
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    /// Installs a cooperative cancellation flag, polled between iterations.
    pub fn with_stop_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.stop_flag = Some(flag);
        self
    }
}

impl Default for VnsConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Basic VNS over a generator, a local-search operator and a perturber.
pub struct VnsStrategy<P, S, O: Objective<P, S>, G, Op, Pe> {
    generator: G,
    local_search: Op,
    perturber: Pe,
    config: VnsConfig,
    hook: Option<ProgressHook<P, S, O::Fitness>>,
}

impl<P, S, O: Objective<P, S>, G, Op, Pe> VnsStrategy<P, S, O, G, Op, Pe> {
    /// Composes the three collaborators with the default configuration.
    pub fn new(generator: G, local_search: Op, perturber: Pe) -> Self {
        Self {
            generator,
            local_search,
            perturber,
            config: VnsConfig::new(),
            hook: None,
        }
    }

    /// Replaces the configuration.
    pub fn with_config(mut self, config: VnsConfig) -> Self {
        self.config = config;
        self
    }

    /// Installs a progress hook, invoked on every new best candidate.
    /// Returning [`Flow::Stop`] aborts the search with the best so far.
    pub fn with_hook<H>(mut self, hook: H) -> Self
    where
        H: Fn(&Candidate<P, S, O::Fitness>) -> Flow + Send + Sync + 'static,
    {
        self.hook = Some(Box::new(hook));
        self
    }

    fn report(&self, candidate: &Candidate<P, S, O::Fitness>) -> Flow {
        match &self.hook {
            Some(hook) => hook(candidate),
            None => Flow::Continue,
        }
    }

    fn stopped(&self, started: Instant) -> bool {
        if let Some(flag) = &self.config.stop_flag {
            if flag.load(AtomicOrdering::Relaxed) {
                return true;
            }
        }
        if let Some(limit) = self.config.time_limit {
            if started.elapsed() >= limit {
                return true;
            }
        }
        false
    }
}

impl<P, S, O, G, Op, Pe> Strategy<P, S, O> for VnsStrategy<P, S, O, G, Op, Pe>
where
    S: Clone,
    O: Objective<P, S>,
    G: Strategy<P, S, O>,
    Op: Operator<P, S, O>,
    Pe: Perturber<P, S, O>,
{
    fn search<R: Rng>(
        &self,
        problem: &Arc<P>,
        objective: &O,
        rng: &mut R,
    ) -> Result<Candidate<P, S, O::Fitness>, SearchError> {
        let started = Instant::now();
        let mut best = self.generator.search(problem, objective, rng)?;

        if let Some(delta) =
            self.local_search
                .apply(problem.as_ref(), objective, &mut best.solution, rng)
        {
            best.fitness = fold_fitness(
                objective,
                problem.as_ref(),
                &best.solution,
                &best.fitness,
                &delta,
            );
        }
        if self.report(&best) == Flow::Stop {
            return Ok(best);
        }

        let mut level = 1usize;
        for iteration in 0..self.config.max_iterations {
            if self.stopped(started) {
                break;
            }

            let mut working = best.clone();
            let delta = self.perturber.perturb(
                problem.as_ref(),
                objective,
                &mut working.solution,
                level - 1,
                rng,
            );
            working.fitness = fold_fitness(
                objective,
                problem.as_ref(),
                &working.solution,
                &working.fitness,
                &delta,
            );

            while let Some(delta) =
                self.local_search
                    .apply(problem.as_ref(), objective, &mut working.solution, rng)
            {
                working.fitness = fold_fitness(
                    objective,
                    problem.as_ref(),
                    &working.solution,
                    &working.fitness,
                    &delta,
                );
            }

            if objective.compare(&working.fitness, &best.fitness) == Ordering::Less {
                best = working;
                level = 1;
                debug!(iteration, fitness = ?best.fitness, "vns adopted a new best");
                if self.report(&best) == Flow::Stop {
                    return Ok(best);
                }
            } else {
                level += 1;
                if level > self.config.max_levels {
                    level = 1;
                }
            }
        }
        Ok(best)
    }
}
