//! The seam between the encoder and a SAT solver.

use itertools::Itertools;
use tracing::{debug, warn};
use varisat::{ExtendFormula, Lit, Solver};

use crate::cancel::CancellationToken;
use crate::error::OracleError;
use crate::logic::Clause;

/// Answer of a [`SatOracle`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SatAnswer {
    /// One truth value per variable id in `0..variable_count`.
    Satisfiable(Vec<bool>),
    /// No assignment satisfies the clauses, or the call was cancelled.
    Unsatisfiable,
}

/// A black-box satisfiability procedure.
///
/// A call interrupted through `cancel` must answer [`SatAnswer::Unsatisfiable`]; the caller tells a real refutation from
/// an interruption by checking the token afterwards.
pub trait SatOracle {
    /// Decide whether `clauses` over the variables `0..variable_count` are satisfiable.
    fn solve(&mut self, variable_count: usize, clauses: &[Clause], cancel: &CancellationToken) -> Result<SatAnswer, OracleError>;
}

/// [`SatOracle`] backed by [`varisat`].
///
/// varisat offers no way to interrupt a running search, so the token is only honoured while clauses are loaded and
/// right after the search returns.
#[derive(Clone, Debug)]
pub struct VarisatOracle {
    // how many clauses to load between two looks at the token
    poll_interval: usize,
}

impl VarisatOracle {
    /// An adapter which checks the token every 4096 clauses.
    pub fn new() -> Self {
        Self { poll_interval: 4096 }
    }
}

impl Default for VarisatOracle {
    fn default() -> Self {
        Self::new()
    }
}

impl SatOracle for VarisatOracle {
    fn solve(&mut self, variable_count: usize, clauses: &[Clause], cancel: &CancellationToken) -> Result<SatAnswer, OracleError> {
        let mut solver = Solver::new();

        for chunk in clauses.chunks(self.poll_interval) {
            if cancel.is_cancelled() {
                return Ok(SatAnswer::Unsatisfiable);
            }
            for clause in chunk {
                let lits = clause.literals().iter().map(|lit| Lit::from(*lit)).collect_vec();
                solver.add_clause(&lits);
            }
        }

        if cancel.is_cancelled() {
            return Ok(SatAnswer::Unsatisfiable);
        }

        debug!(variable_count, clauses = clauses.len(), "handing instance to varisat");
        let satisfiable = solver.solve().map_err(|err| OracleError::Solver(err.to_string()))?;

        if cancel.is_cancelled() {
            warn!("solver returned after cancellation; discarding its answer");
            return Ok(SatAnswer::Unsatisfiable);
        }
        if !satisfiable {
            return Ok(SatAnswer::Unsatisfiable);
        }

        let model = solver.model().ok_or(OracleError::MissingModel)?;
        // variables varisat never saw stay false
        let mut assignment = vec![false; variable_count];
        for lit in model {
            if let Some(value) = assignment.get_mut(lit.index()) {
                *value = lit.is_positive();
            }
        }

        Ok(SatAnswer::Satisfiable(assignment))
    }
}
