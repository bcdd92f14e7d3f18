//! Iterative deepening over the makespan.

use std::time::{Duration, Instant};

use itertools::Itertools;
use tracing::{info, instrument, warn};

use crate::cancel::CancellationToken;
use crate::encoder::{build_context, Encoding, Pruning};
use crate::error::SolveError;
use crate::mdd::ReachabilityWindow;
use crate::oracle::{SatAnswer, SatOracle};
use crate::problem::{AgentId, Problem};
use crate::schedule::Schedule;

/// Bounds and switches for a [`SearchDriver`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SearchConfig {
    /// First makespan tried.
    pub min_makespan: usize,
    /// Last makespan tried, inclusive.
    pub max_makespan: usize,
    /// Whether encodings are pruned to reachable variables.
    pub pruning: Pruning,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            min_makespan: 0,
            max_makespan: usize::MAX,
            pruning: Pruning::default(),
        }
    }
}

impl SearchConfig {
    /// Start the search at `min_makespan`.
    #[inline]
    pub fn with_min_makespan(mut self, min_makespan: usize) -> Self {
        self.min_makespan = min_makespan;
        self
    }

    /// Stop the search after `max_makespan`.
    #[inline]
    pub fn with_max_makespan(mut self, max_makespan: usize) -> Self {
        self.max_makespan = max_makespan;
        self
    }

    /// Choose how encodings are pruned.
    #[inline]
    pub fn with_pruning(mut self, pruning: Pruning) -> Self {
        self.pruning = pruning;
        self
    }
}

/// What happened to one candidate makespan.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// An agent had no reachable variable; the oracle was not consulted.
    Unreachable {
        /// The first agent found without a variable.
        agent: AgentId,
    },
    /// The oracle refuted the encoding.
    Unsatisfiable,
    /// The oracle found a model, and it decoded.
    Satisfiable,
    /// Cancellation was observed during this attempt.
    Cancelled,
}

/// Statistics for one candidate makespan.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Attempt {
    /// The makespan tried.
    pub makespan: usize,
    /// Variables in the encoding, 0 if none was built.
    pub variables: usize,
    /// Clauses in the encoding, 0 if none was built.
    pub clauses: usize,
    /// What happened.
    pub verdict: Verdict,
    /// Time spent on this makespan.
    pub elapsed: Duration,
}

/// Terminal state of a search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The smallest makespan in range whose encoding is satisfiable, with the decoded schedule.
    Solved {
        /// The makespan found.
        makespan: usize,
        /// One collision-free path per agent.
        schedule: Schedule,
    },
    /// Cancelled while `makespan` was being attempted.
    Aborted {
        /// The makespan in progress.
        makespan: usize,
    },
    /// Every makespan in range was infeasible.
    Exhausted,
}

/// Outcome of [`SearchDriver::run`] together with one [`Attempt`] per makespan tried, in order.
#[derive(Clone, Debug)]
pub struct SearchReport {
    /// How the search ended.
    pub outcome: Outcome,
    /// One entry per makespan tried, in order.
    pub attempts: Vec<Attempt>,
    /// Wall time of the whole run.
    pub elapsed: Duration,
}

/// Iterative deepening over the makespan.
///
/// Makespans are tried once each, in increasing order, from `min_makespan` through `max_makespan`. Each attempt builds a
/// fresh encoding; the reachability windows are only ever extended, so they are shared across attempts.
#[derive(Copy, Clone, Debug, Default)]
pub struct SearchDriver {
    config: SearchConfig,
}

impl SearchDriver {
    /// A driver bounded by `config`.
    pub fn new(config: SearchConfig) -> Self {
        Self { config }
    }

    /// Search for the smallest feasible makespan, consulting `oracle` for each encoding that is not rejected outright.
    ///
    /// `cancel` is checked before each attempt, after the windows are extended, and on both sides of the oracle call.
    #[instrument(skip_all, fields(agents = problem.agents().len(), nodes = problem.graph().size()))]
    pub fn run<O: SatOracle>(&self, problem: &Problem, oracle: &mut O, cancel: &CancellationToken) -> Result<SearchReport, SolveError> {
        let started = Instant::now();
        let mut attempts = Vec::new();

        let mut windows = match self.config.pruning {
            Pruning::Reachability => Some(problem.agents().iter()
                .map(|agent| ReachabilityWindow::new(problem.graph(), *agent))
                .collect_vec()),
            Pruning::Disabled => None,
        };

        let abort = |attempts: Vec<Attempt>, makespan: usize| {
            warn!(makespan, "no solution found in time");
            SearchReport { outcome: Outcome::Aborted { makespan }, attempts, elapsed: started.elapsed() }
        };

        for makespan in self.config.min_makespan..=self.config.max_makespan {
            let attempt_started = Instant::now();
            let mut attempt = Attempt { makespan, variables: 0, clauses: 0, verdict: Verdict::Cancelled, elapsed: Duration::ZERO };

            if cancel.is_cancelled() {
                attempts.push(attempt);
                return Ok(abort(attempts, makespan));
            }

            info!(makespan, "generating SAT problem");
            if let Some(windows) = windows.as_mut() {
                windows.iter_mut().for_each(|window| window.step_until(makespan));
            }
            if cancel.is_cancelled() {
                attempt.elapsed = attempt_started.elapsed();
                attempts.push(attempt);
                return Ok(abort(attempts, makespan));
            }

            let context = match build_context(problem, makespan, windows.as_deref()) {
                Encoding::Built(context) => context,
                Encoding::Unreachable { agent } => {
                    attempt.verdict = Verdict::Unreachable { agent };
                    attempt.elapsed = attempt_started.elapsed();
                    info!(makespan, elapsed_ms = attempt.elapsed.as_millis() as u64, "skipping makespan");
                    attempts.push(attempt);
                    continue;
                }
            };

            attempt.variables = context.variable_count();
            attempt.clauses = context.clause_count();
            info!(makespan, variables = attempt.variables, clauses = attempt.clauses, "solving");

            if cancel.is_cancelled() {
                attempt.elapsed = attempt_started.elapsed();
                attempts.push(attempt);
                return Ok(abort(attempts, makespan));
            }

            let answer = oracle.solve(context.variable_count(), context.clauses(), cancel)?;
            attempt.elapsed = attempt_started.elapsed();

            if cancel.is_cancelled() {
                attempts.push(attempt);
                return Ok(abort(attempts, makespan));
            }

            match answer {
                SatAnswer::Unsatisfiable => {
                    attempt.verdict = Verdict::Unsatisfiable;
                    info!(makespan, elapsed_ms = attempt.elapsed.as_millis() as u64, "failed to solve");
                    attempts.push(attempt);
                }
                SatAnswer::Satisfiable(assignment) => {
                    let schedule = Schedule::decode(&context, problem.agents().len(), problem.graph().size(), &assignment)?;
                    attempt.verdict = Verdict::Satisfiable;
                    attempts.push(attempt);
                    info!(makespan, elapsed_ms = started.elapsed().as_millis() as u64, "successfully solved");

                    return Ok(SearchReport {
                        outcome: Outcome::Solved { makespan, schedule },
                        attempts,
                        elapsed: started.elapsed(),
                    });
                }
            }
        }

        info!(
            min_makespan = self.config.min_makespan,
            max_makespan = self.config.max_makespan,
            "no solution found within the bounds"
        );
        Ok(SearchReport { outcome: Outcome::Exhausted, attempts, elapsed: started.elapsed() })
    }
}
