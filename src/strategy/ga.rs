//! Steady-state genetic algorithm.
//!
//! ## Algorithm
//!
//! A fixed-size population of candidates evolves by tournament selection,
//! order crossover and optional mutation. Each generation produces a batch
//! of offspring; every offspring that beats the current weakest member
//! replaces it (steady-state, no generational swap). The run stops at the
//! generation cap, after a configured number of stagnant generations, or on
//! cooperative cancellation.
//!
//! Offspring fitness is always recomputed from scratch, which keeps the
//! strategy correct under non-continuous objectives without special-casing.

use std::cmp::Ordering;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;

use rand::Rng;
use tracing::trace;

use crate::candidate::{Candidate, Objective};
use crate::error::SearchError;
use crate::search::Operator;
use crate::strategy::{Flow, ProgressHook, Strategy};
use crate::tour::Tour;

/// Parent selection over a population.
pub trait Selection<P, S, O: Objective<P, S>> {
    /// Picks the index of one parent.
    fn select<R: Rng>(
        &self,
        population: &[Candidate<P, S, O::Fitness>],
        objective: &O,
        rng: &mut R,
    ) -> usize;
}

/// Tournament selection: draw `size` members at random, keep the fittest.
#[derive(Debug, Clone, Copy)]
pub struct Tournament {
    size: usize,
}

impl Tournament {
    /// Creates a tournament of the given size (at least 1).
    pub fn new(size: usize) -> Self {
        Self { size: size.max(1) }
    }
}

impl Default for Tournament {
    fn default() -> Self {
        Self::new(3)
    }
}

impl<P, S, O: Objective<P, S>> Selection<P, S, O> for Tournament {
    fn select<R: Rng>(
        &self,
        population: &[Candidate<P, S, O::Fitness>],
        objective: &O,
        rng: &mut R,
    ) -> usize {
        let mut winner = rng.random_range(0..population.len());
        for _ in 1..self.size {
            let rival = rng.random_range(0..population.len());
            if objective.compare(&population[rival].fitness, &population[winner].fitness)
                == Ordering::Less
            {
                winner = rival;
            }
        }
        winner
    }
}

/// Recombination of two parent solutions.
pub trait Crossover<P, S> {
    /// Produces one child from two parents.
    fn crossover<R: Rng>(&self, problem: &P, a: &S, b: &S, rng: &mut R) -> S;
}

/// Order crossover (OX) over the movable segment of a tour.
///
/// Copies a random window of the first parent's visit order into the child,
/// then fills the remaining slots with the missing visits in the order the
/// second parent uses them. The anchor visit and a designated fixed tail
/// never move; the child keeps the parents' topology (open/closed/fixed-end).
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderCrossover;

impl<P> Crossover<P, Tour> for OrderCrossover {
    fn crossover<R: Rng>(&self, _problem: &P, a: &Tour, b: &Tour, rng: &mut R) -> Tour {
        let first = a.first();
        let fixed_tail = a.last().filter(|&l| l != first);
        let movable = |t: &Tour| -> Vec<usize> {
            t.iter()
                .skip(1)
                .filter(|&v| Some(v) != fixed_tail)
                .collect()
        };
        let pa = movable(a);
        let pb = movable(b);
        let len = pa.len();
        if len < 2 || pb.len() != len {
            return a.clone();
        }

        let (mut i, mut j) = (rng.random_range(0..len), rng.random_range(0..len));
        if i > j {
            std::mem::swap(&mut i, &mut j);
        }

        let mut child: Vec<Option<usize>> = vec![None; len];
        let mut used = vec![false; a.capacity()];
        for k in i..=j {
            child[k] = Some(pa[k]);
            used[pa[k]] = true;
        }
        let mut fill = pb.iter().filter(|&&v| !used[v]);
        for slot in child.iter_mut() {
            if slot.is_none() {
                *slot = fill.next().copied();
            }
        }

        let mut seq = Vec::with_capacity(len + 2);
        seq.push(first);
        seq.extend(
            child
                .into_iter()
                .map(|v| v.expect("order crossover fills every slot")),
        );
        if let Some(l) = fixed_tail {
            seq.push(l);
        }
        Tour::from_sequence(a.capacity(), &seq, a.last())
            .expect("order crossover preserves the visit set")
    }
}

/// Population and stop-condition parameters for [`GaStrategy`].
#[derive(Debug, Clone)]
pub struct GaConfig {
    population_size: usize,
    max_generations: usize,
    max_stagnation: usize,
    mutation_rate: f64,
    offspring_per_generation: usize,
    stop_flag: Option<Arc<AtomicBool>>,
}

impl GaConfig {
    /// Default configuration: population 20, 200 generations, stagnation 50,
    /// mutation rate 0.2, 10 offspring per generation.
    pub fn new() -> Self {
        Self {
            population_size: 20,
            max_generations: 200,
            max_stagnation: 50,
            mutation_rate: 0.2,
            offspring_per_generation: 10,
            stop_flag: None,
        }
    }

    /// Sets the population size (at least 2).
    pub fn with_population_size(mut self, size: usize) -> Self {
        self.population_size = size.max(2);
        self
    }

    /// Caps the number of generations.
    pub fn with_max_generations(mut self, generations: usize) -> Self {
        self.max_generations = generations;
        self
    }

    /// Stops after this many generations without a best-fitness improvement.
    pub fn with_max_stagnation(mut self, stagnation: usize) -> Self {
        self.max_stagnation = stagnation.max(1);
        self
    }

    /// Probability of mutating each offspring.
    pub fn with_mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Number of offspring produced per generation.
    pub fn with_offspring_per_generation(mut self, offspring: usize) -> Self {
        self.offspring_per_generation = offspring.max(1);
        self
    }

    /// Installs a cooperative cancellation flag, polled between generations.
    pub fn with_stop_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.stop_flag = Some(flag);
        self
    }
}

impl Default for GaConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Steady-state GA over a generator, selection, crossover and mutation.
pub struct GaStrategy<P, S, O: Objective<P, S>, G, Sel, X, M> {
    generator: G,
    selection: Sel,
    crossover: X,
    mutation: M,
    config: GaConfig,
    hook: Option<ProgressHook<P, S, O::Fitness>>,
}

impl<P, S, O: Objective<P, S>, G, Sel, X, M> GaStrategy<P, S, O, G, Sel, X, M> {
    /// Composes the four collaborators with the default configuration.
    pub fn new(generator: G, selection: Sel, crossover: X, mutation: M) -> Self {
        Self {
            generator,
            selection,
            crossover,
            mutation,
            config: GaConfig::new(),
            hook: None,
        }
    }

    /// Replaces the configuration.
    pub fn with_config(mut self, config: GaConfig) -> Self {
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

    fn stopped(&self) -> bool {
        self.config
            .stop_flag
            .as_ref()
            .is_some_and(|flag| flag.load(AtomicOrdering::Relaxed))
    }

    fn fittest(
        population: &[Candidate<P, S, O::Fitness>],
        objective: &O,
    ) -> usize {
        let mut best = 0;
        for i in 1..population.len() {
            if objective.compare(&population[i].fitness, &population[best].fitness)
                == Ordering::Less
            {
                best = i;
            }
        }
        best
    }

    fn weakest(
        population: &[Candidate<P, S, O::Fitness>],
        objective: &O,
    ) -> usize {
        let mut worst = 0;
        for i in 1..population.len() {
            if objective.compare(&population[i].fitness, &population[worst].fitness)
                == Ordering::Greater
            {
                worst = i;
            }
        }
        worst
    }
}

impl<P, S, O, G, Sel, X, M> Strategy<P, S, O> for GaStrategy<P, S, O, G, Sel, X, M>
where
    S: Clone,
    O: Objective<P, S>,
    G: Strategy<P, S, O>,
    Sel: Selection<P, S, O>,
    X: Crossover<P, S>,
    M: Operator<P, S, O>,
{
    fn search<R: Rng>(
        &self,
        problem: &Arc<P>,
        objective: &O,
        rng: &mut R,
    ) -> Result<Candidate<P, S, O::Fitness>, SearchError> {
        let mut population = Vec::with_capacity(self.config.population_size);
        for _ in 0..self.config.population_size {
            population.push(self.generator.search(problem, objective, rng)?);
        }

        let mut best = population[Self::fittest(&population, objective)].clone();
        if self.report(&best) == Flow::Stop {
            return Ok(best);
        }

        let mut stagnation = 0usize;
        for generation in 0..self.config.max_generations {
            if self.stopped() {
                break;
            }

            for _ in 0..self.config.offspring_per_generation {
                let pa = self.selection.select(&population, objective, rng);
                let pb = self.selection.select(&population, objective, rng);
                let mut solution = self.crossover.crossover(
                    problem.as_ref(),
                    &population[pa].solution,
                    &population[pb].solution,
                    rng,
                );
                if rng.random::<f64>() < self.config.mutation_rate {
                    let _ = self
                        .mutation
                        .apply(problem.as_ref(), objective, &mut solution, rng);
                }
                let fitness = objective.calculate(problem, &solution);

                let worst = Self::weakest(&population, objective);
                if objective.compare(&fitness, &population[worst].fitness) == Ordering::Less {
                    population[worst] = Candidate::new(Arc::clone(problem), solution, fitness);
                }
            }

            let fittest = Self::fittest(&population, objective);
            if objective.compare(&population[fittest].fitness, &best.fitness) == Ordering::Less {
                best = population[fittest].clone();
                stagnation = 0;
                trace!(generation, fitness = ?best.fitness, "ga adopted a new best");
                if self.report(&best) == Flow::Stop {
                    return Ok(best);
                }
            } else {
                stagnation += 1;
                if stagnation >= self.config.max_stagnation {
                    break;
                }
            }
        }
        Ok(best)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::WeightObjective;
    use crate::problem::MatrixProblem;
    use crate::search::TwoOpt;
    use crate::strategy::RandomStrategy;
    use crate::weight::WeightMatrix;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Mutex;

    type TourGa<G, Sel, X, M> = GaStrategy<MatrixProblem, Tour, WeightObjective, G, Sel, X, M>;

    fn ring_problem(n: usize) -> Arc<MatrixProblem> {
        let mut wm = WeightMatrix::uniform(n, 100.0);
        for i in 0..n {
            let j = (i + 1) % n;
            wm.set(i, j, 10.0);
            wm.set(j, i, 10.0);
        }
        Arc::new(MatrixProblem::new(wm).closed())
    }

    #[test]
    fn test_order_crossover_preserves_visit_set() {
        let a = Tour::from_sequence(6, &[0, 1, 2, 3, 4, 5], Some(0)).unwrap();
        let b = Tour::from_sequence(6, &[0, 5, 4, 3, 2, 1], Some(0)).unwrap();
        let mut rng = StdRng::seed_from_u64(31);
        for _ in 0..20 {
            let child = OrderCrossover.crossover(&(), &a, &b, &mut rng);
            assert_eq!(child.first(), 0);
            assert!(child.is_closed());
            assert!(child.verify());
            let mut placed = child.to_vec();
            placed.sort_unstable();
            assert_eq!(placed, vec![0, 1, 2, 3, 4, 5]);
        }
    }

    #[test]
    fn test_order_crossover_keeps_fixed_tail() {
        let a = Tour::from_sequence(5, &[0, 1, 2, 3, 4], Some(4)).unwrap();
        let b = Tour::from_sequence(5, &[0, 3, 2, 1, 4], Some(4)).unwrap();
        let mut rng = StdRng::seed_from_u64(31);
        for _ in 0..10 {
            let child = OrderCrossover.crossover(&(), &a, &b, &mut rng);
            assert_eq!(child.to_vec().last(), Some(&4));
            assert_eq!(child.last(), Some(4));
        }
    }

    #[test]
    fn test_ga_best_is_monotone() {
        let p = ring_problem(8);
        let seen: Arc<Mutex<Vec<f64>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        let strategy: TourGa<_, _, _, _> = GaStrategy::new(
            RandomStrategy,
            Tournament::new(3),
            OrderCrossover,
            TwoOpt::new(),
        )
        .with_config(
            GaConfig::new()
                .with_population_size(10)
                .with_max_generations(50)
                .with_offspring_per_generation(5),
        )
        .with_hook(move |c: &Candidate<MatrixProblem, Tour, f64>| {
            sink.lock().unwrap().push(c.fitness);
            Flow::Continue
        });

        let mut rng = StdRng::seed_from_u64(8);
        let best = strategy.search(&p, &WeightObjective, &mut rng).unwrap();

        assert!(best.solution.verify());
        assert_eq!(best.solution.len(), 8);
        let reported = seen.lock().unwrap();
        assert!(!reported.is_empty());
        for pair in reported.windows(2) {
            assert!(pair[1] <= pair[0] + 1e-9);
        }
    }

    #[test]
    fn test_ga_stagnation_stops() {
        // Uniform weights: every tour scores the same, so the best can never
        // improve and the stagnation cap ends the run.
        let p = Arc::new(MatrixProblem::new(WeightMatrix::uniform(6, 10.0)).closed());
        let strategy: TourGa<_, _, _, _> = GaStrategy::new(
            RandomStrategy,
            Tournament::new(2),
            OrderCrossover,
            TwoOpt::new(),
        )
        .with_config(
            GaConfig::new()
                .with_population_size(6)
                .with_max_generations(10_000)
                .with_max_stagnation(5),
        );

        let mut rng = StdRng::seed_from_u64(8);
        let best = strategy.search(&p, &WeightObjective, &mut rng).unwrap();
        assert!((best.fitness - 60.0).abs() < 1e-10);
    }

    #[test]
    fn test_ga_preset_stop_flag() {
        let p = ring_problem(6);
        let flag = Arc::new(AtomicBool::new(true));
        let strategy: TourGa<_, _, _, _> = GaStrategy::new(
            RandomStrategy,
            Tournament::new(3),
            OrderCrossover,
            TwoOpt::new(),
        )
        .with_config(GaConfig::new().with_stop_flag(Arc::clone(&flag)));

        let mut rng = StdRng::seed_from_u64(8);
        let best = strategy.search(&p, &WeightObjective, &mut rng).unwrap();
        assert_eq!(best.solution.len(), 6);
    }
}
