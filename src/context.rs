//! Variable allocation and clause storage for one makespan.

use ndarray::Array3;

use crate::graph::NodeId;
use crate::logic::{Clause, Literal, VarId};
use crate::problem::AgentId;

/// Variable allocator and clause store for one encoding attempt.
///
/// Variable `X(t, a, v)` means "agent `a` occupies node `v` at time `t`".
/// Ids are handed out densely from 0 in the order keys are first requested; the order only matters to solver
/// performance. A context is sized for one `(agents, graph, makespan)` combination and is thrown away when the makespan
/// changes.
#[derive(Clone, Debug)]
pub struct Context {
    // indexed [time, agent, node]
    variables: Array3<Option<VarId>>,
    next_variable: VarId,
    clauses: Vec<Clause>,
}

impl Context {
    /// An empty context for keys `t <= makespan`, `a < agent_count` and `v < node_count`.
    pub fn new(makespan: usize, agent_count: usize, node_count: usize) -> Self {
        Self {
            variables: Array3::from_elem((makespan + 1, agent_count, node_count), None),
            next_variable: 0,
            clauses: Vec::new(),
        }
    }

    /// The makespan this context was sized for.
    #[inline]
    pub fn makespan(&self) -> usize {
        self.variables.dim().0 - 1
    }

    #[inline]
    fn slot(&self, time: usize, agent: AgentId, node: NodeId) -> [usize; 3] {
        let (times, agents, nodes) = self.variables.dim();
        assert!(
            time < times && agent < agents && node < nodes,
            "variable key (t={time}, a={agent}, v={node}) outside a context of {times} steps, {agents} agents and {nodes} nodes",
        );
        [time, agent, node]
    }

    /// The variable for `(time, agent, node)`, allocating the next id on first request.
    pub fn create_or_get(&mut self, time: usize, agent: AgentId, node: NodeId) -> Literal {
        let slot = self.slot(time, agent, node);
        let var = match self.variables[slot] {
            Some(var) => var,
            None => {
                let var = self.next_variable;
                self.next_variable += 1;
                self.variables[slot] = Some(var);
                var
            }
        };

        Literal::positive(var)
    }

    /// The variable for `(time, agent, node)`.
    ///
    /// # Panics
    /// If the variable was never created. Clause authors must not invent variables mid-encoding.
    pub fn get(&self, time: usize, agent: AgentId, node: NodeId) -> Literal {
        match self.variables[self.slot(time, agent, node)] {
            Some(var) => Literal::positive(var),
            None => panic!("no variable was created for (t={time}, a={agent}, v={node})"),
        }
    }

    /// Like [`Self::get`], but [`None`] for keys which were never created.
    #[inline]
    pub fn try_get(&self, time: usize, agent: AgentId, node: NodeId) -> Option<Literal> {
        self.variables[self.slot(time, agent, node)].map(Literal::positive)
    }

    /// Whether a variable exists for `(time, agent, node)`.
    #[inline]
    pub fn contains(&self, time: usize, agent: AgentId, node: NodeId) -> bool {
        self.variables[self.slot(time, agent, node)].is_some()
    }

    /// Append a finished clause.
    pub fn push(&mut self, clause: impl Into<Clause>) -> &mut Self {
        self.clauses.push(clause.into());
        self
    }

    /// Number of variables allocated so far; ids run from 0 below this.
    #[inline]
    pub fn variable_count(&self) -> usize {
        self.next_variable
    }

    /// Number of clauses pushed so far.
    #[inline]
    pub fn clause_count(&self) -> usize {
        self.clauses.len()
    }

    /// The clauses, in insertion order.
    #[inline]
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Iterate over the clauses, in insertion order.
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Clause> {
        self.clauses.iter()
    }

    /// Whether every clause holds under `assignment`.
    pub fn satisfied_by(&self, assignment: &[bool]) -> bool {
        self.clauses.iter().all(|clause| clause.satisfied_by(assignment))
    }
}

impl<'a> IntoIterator for &'a Context {
    type Item = &'a Clause;
    type IntoIter = std::slice::Iter<'a, Clause>;

    fn into_iter(self) -> Self::IntoIter {
        self.clauses.iter()
    }
}
