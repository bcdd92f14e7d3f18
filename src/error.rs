//! Error types. Infeasible makespans and cancellation are search outcomes, not errors.

use std::io;

use thiserror::Error;

use crate::graph::NodeId;
use crate::problem::AgentId;

/// Structural problems with an instance. These are detected when the instance is assembled and abort a run before any
/// search state exists.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProblemError {
    /// The graph's edge matrix for this many nodes cannot be addressed or allocated.
    #[error("a graph of {node_count} nodes is too large")]
    TooManyNodes {
        /// Requested number of nodes.
        node_count: usize,
    },
    /// A node id referenced by an edge or an agent does not exist in the graph.
    #[error("node {node} is out of range for a graph of {node_count} nodes")]
    NodeOutOfRange {
        /// The offending id.
        node: NodeId,
        /// Number of nodes in the graph.
        node_count: usize,
    },
    /// Two agents start on the same node.
    #[error("agents {first} and {second} both start at node {node}")]
    DuplicateInitial {
        /// The shared node.
        node: NodeId,
        /// The earlier agent.
        first: AgentId,
        /// The later agent.
        second: AgentId,
    },
    /// Two agents finish on the same node.
    #[error("agents {first} and {second} both finish at node {node}")]
    DuplicateGoal {
        /// The shared node.
        node: NodeId,
        /// The earlier agent.
        first: AgentId,
        /// The later agent.
        second: AgentId,
    },
}

/// Reasons a problem or result file could not be read. Line numbers start at 1.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The reader failed.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// Input ended while more data was expected.
    #[error("couldn't parse file at line {line}; hint: {hint}")]
    UnexpectedEnd {
        /// Line the end of input was met on.
        line: usize,
        /// What was expected there.
        hint: String,
    },
    /// A line was present but did not hold what was expected.
    #[error("couldn't parse line {line} ({content:?}); hint: {hint}")]
    Malformed {
        /// The offending line.
        line: usize,
        /// What was expected there.
        hint: String,
        /// The line as read, trimmed.
        content: String,
    },
    /// The file parsed but describes an invalid instance.
    #[error("invalid instance at line {line}: {source}")]
    Problem {
        /// Line of the edge or agent at fault.
        line: usize,
        /// What is wrong with it.
        #[source]
        source: ProblemError,
    },
}

/// The SAT back end failed for a reason other than satisfiability.
#[derive(Debug, Error)]
pub enum OracleError {
    /// The solver itself reported an error.
    #[error("SAT solver failed: {0}")]
    Solver(String),
    /// The solver claimed satisfiability without producing a model.
    #[error("SAT solver reported satisfiable but returned no model")]
    MissingModel,
}

/// Failures of a search run.
#[derive(Debug, Error)]
pub enum SolveError {
    /// The oracle failed.
    #[error(transparent)]
    Oracle(#[from] OracleError),
    /// A satisfying assignment did not place an agent on exactly one node at some time step.
    #[error("model places agent {agent} on {} nodes at time {time}", occupied.len())]
    InconsistentModel {
        /// The misplaced agent.
        agent: AgentId,
        /// The time step.
        time: usize,
        /// Every node the model puts the agent on at `time`.
        occupied: Vec<NodeId>,
    },
}
