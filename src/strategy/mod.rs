//! Search strategies.
//!
//! A [`Strategy`] is a complete search procedure: given a problem and an
//! objective it produces the best [`Candidate`] it can find. Composition is
//! the only extension mechanism — the metaheuristics take a generator
//! strategy, improvement operators and (for VNS) a perturber as construction
//! parameters.
//!
//! - [`RandomStrategy`] / [`CheapestInsertionStrategy`] — Generators
//! - [`VnsStrategy`] — Basic variable neighbourhood search
//! - [`GaStrategy`] — Steady-state genetic algorithm

mod ga;
mod generate;
mod vns;

pub use ga::{Crossover, GaConfig, GaStrategy, OrderCrossover, Selection, Tournament};
pub use generate::{CheapestInsertionStrategy, RandomStrategy};
pub use vns::{VnsConfig, VnsStrategy};

use std::sync::Arc;

use rand::Rng;

use crate::candidate::{Candidate, Objective};
use crate::error::SearchError;

/// What a progress hook wants the strategy to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep searching.
    Continue,
    /// Abort and return the best candidate so far. Not an error.
    Stop,
}

/// Callback invoked whenever a strategy adopts a new best candidate.
pub type ProgressHook<P, S, F> = Box<dyn Fn(&Candidate<P, S, F>) -> Flow + Send + Sync>;

/// A complete search procedure.
pub trait Strategy<P, S, O: Objective<P, S>> {
    /// Runs the search to completion, returning the best candidate found.
    ///
    /// Fails only when no feasible candidate can be produced at all;
    /// finding no improvement over the generator's candidate is a normal
    /// outcome.
    fn search<R: Rng>(
        &self,
        problem: &Arc<P>,
        objective: &O,
        rng: &mut R,
    ) -> Result<Candidate<P, S, O::Fitness>, SearchError>;
}
