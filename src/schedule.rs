//! Decoded schedules, the result file format and the verifier.

use std::fmt::{Display, Formatter};
use std::io::BufRead;

use itertools::Itertools;

use crate::context::Context;
use crate::error::{ParseError, SolveError};
use crate::graph::NodeId;
use crate::problem::{AgentId, Problem};

/// One node per agent per time step, `t = 0..=makespan`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Schedule {
    paths: Vec<Vec<NodeId>>,
}

/// Ways a [`Schedule`] can fail to solve a [`Problem`]. `agent` and `agents` name the agents at fault.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Violation {
    /// The schedule does not hold exactly one path per agent.
    PathCount {
        /// Number of agents.
        expected: usize,
        /// Number of paths.
        found: usize,
    },
    /// Not every path spans the same number of time steps.
    UnequalLength {
        /// The agent at fault.
        agent: AgentId,
        /// Length of the first path.
        expected: usize,
        /// Length of this agent's path.
        found: usize,
    },
    /// The path does not begin on the agent's initial node.
    WrongStart {
        /// The agent at fault.
        agent: AgentId,
        /// The initial node.
        expected: NodeId,
        /// The first node of the path.
        found: NodeId,
    },
    /// The path does not end on the agent's goal.
    WrongGoal {
        /// The agent at fault.
        agent: AgentId,
        /// The goal.
        expected: NodeId,
        /// The last node of the path.
        found: NodeId,
    },
    /// The agent moved between two nodes which are not adjacent, between `time` and `time + 1`.
    MissingEdge {
        /// The agent at fault.
        agent: AgentId,
        /// The earlier time step.
        time: usize,
        /// Node at `time`.
        from: NodeId,
        /// Node at `time + 1`.
        to: NodeId,
    },
    /// Two agents occupy `node` at `time`.
    VertexConflict {
        /// The two agents, lower id first.
        agents: (AgentId, AgentId),
        /// The time step.
        time: usize,
        /// The shared node.
        node: NodeId,
    },
    /// Two agents swap places across the edge `nodes` between `time` and `time + 1`.
    SwapConflict {
        /// The two agents, lower id first.
        agents: (AgentId, AgentId),
        /// The earlier time step.
        time: usize,
        /// The edge, as walked by the first agent.
        nodes: (NodeId, NodeId),
    },
}

impl Display for Violation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Violation::PathCount { expected, found } => write!(f, "expected a path for each of {expected} agents, found {found}"),
            Violation::UnequalLength { agent, expected, found } => write!(f, "agent #{agent} has {found} positions instead of {expected}"),
            Violation::WrongStart { agent, expected, found } => write!(f, "agent #{agent} doesn't start from the initial node #{expected}, was on #{found}"),
            Violation::WrongGoal { agent, expected, found } => write!(f, "agent #{agent} doesn't end on the goal node #{expected}, but on #{found}"),
            Violation::MissingEdge { agent, time, from, to } => {
                write!(f, "agent #{agent} crosses an edge that doesn't exist at timestamp #{time}, between node #{from} and #{to}")
            }
            Violation::VertexConflict { agents: (a, b), time, node } => write!(f, "agents #{a} and #{b} use the same node #{node} at timestamp #{time}"),
            Violation::SwapConflict { agents: (a, b), time, nodes: (u, v) } => {
                write!(f, "agents #{a} and #{b} use the same edge between nodes #{u} and #{v} at timestamp #{time}")
            }
        }
    }
}

impl Schedule {
    /// A schedule from one node sequence per agent.
    pub fn new(paths: Vec<Vec<NodeId>>) -> Self {
        Self { paths }
    }

    /// Read back the agents' positions from a satisfying `assignment` of the instance in `context`.
    ///
    /// Fails if the assignment puts an agent on zero or several nodes at some time step.
    pub fn decode(context: &Context, agent_count: usize, node_count: usize, assignment: &[bool]) -> Result<Self, SolveError> {
        let mut paths = Vec::with_capacity(agent_count);

        for agent in 0..agent_count {
            let mut path = Vec::with_capacity(context.makespan() + 1);
            for time in 0..=context.makespan() {
                let occupied = (0..node_count)
                    .filter(|node| context.try_get(time, agent, *node).is_some_and(|lit| lit.holds(assignment)))
                    .collect_vec();

                match occupied.as_slice() {
                    [node] => path.push(*node),
                    _ => return Err(SolveError::InconsistentModel { agent, time, occupied }),
                }
            }
            paths.push(path);
        }

        Ok(Self { paths })
    }

    /// One node sequence per agent.
    #[inline]
    pub fn paths(&self) -> &[Vec<NodeId>] {
        &self.paths
    }

    /// Number of moves in the schedule, `None` if it holds no path.
    pub fn makespan(&self) -> Option<usize> {
        self.paths.first().map(|path| path.len().saturating_sub(1))
    }

    /// Where `agent` stands at `time`.
    pub fn position(&self, agent: AgentId, time: usize) -> Option<NodeId> {
        self.paths.get(agent).and_then(|path| path.get(time)).copied()
    }

    /// Parse the result format: one agent per line, node ids separated by whitespace.
    pub fn read<R: BufRead>(reader: R) -> Result<Self, ParseError> {
        let mut paths = Vec::new();

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let path = line.split_whitespace()
                .map(|token| token.parse::<NodeId>().map_err(|_| ParseError::Malformed {
                    line: index + 1,
                    hint: format!("Expecting path of agent #{index}"),
                    content: line.clone(),
                }))
                .collect::<Result<Vec<_>, _>>()?;
            paths.push(path);
        }

        // trailing blank lines are not agents
        while paths.last().is_some_and(Vec::is_empty) {
            paths.pop();
        }

        Ok(Self { paths })
    }

    /// Every way this schedule breaks the rules of `problem`. Empty iff the schedule is a solution.
    pub fn violations(&self, problem: &Problem) -> Vec<Violation> {
        let graph = problem.graph();
        let agents = problem.agents();
        let mut found = Vec::new();

        if self.paths.len() != agents.len() {
            found.push(Violation::PathCount { expected: agents.len(), found: self.paths.len() });
            return found;
        }

        let Some(length) = self.paths.first().map(Vec::len) else { return found };
        for (agent, path) in self.paths.iter().enumerate() {
            if path.len() != length {
                found.push(Violation::UnequalLength { agent, expected: length, found: path.len() });
            }
        }
        if !found.is_empty() || length == 0 {
            return found;
        }

        for (agent, (path, expected)) in self.paths.iter().zip(agents).enumerate() {
            if path[0] != expected.initial {
                found.push(Violation::WrongStart { agent, expected: expected.initial, found: path[0] });
            }
            if path[length - 1] != expected.goal {
                found.push(Violation::WrongGoal { agent, expected: expected.goal, found: path[length - 1] });
            }

            for (time, (&from, &to)) in path.iter().tuple_windows().enumerate() {
                if from != to && (from >= graph.size() || to >= graph.size() || !graph.edge_exists(from, to)) {
                    found.push(Violation::MissingEdge { agent, time, from, to });
                }
            }
        }

        for (a, b) in (0..self.paths.len()).tuple_combinations() {
            let (path_a, path_b) = (&self.paths[a], &self.paths[b]);
            for time in 0..length {
                if path_a[time] == path_b[time] {
                    found.push(Violation::VertexConflict { agents: (a, b), time, node: path_a[time] });
                }
                if time + 1 < length
                    && path_a[time] != path_a[time + 1]
                    && path_a[time] == path_b[time + 1]
                    && path_a[time + 1] == path_b[time] {
                    found.push(Violation::SwapConflict { agents: (a, b), time, nodes: (path_a[time], path_a[time + 1]) });
                }
            }
        }

        found
    }
}

impl Display for Schedule {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for path in &self.paths {
            writeln!(f, "{}", path.iter().join(" "))?;
        }

        Ok(())
    }
}
