//! Agents and validated instances.

use std::collections::HashMap;

use crate::error::ProblemError;
use crate::graph::{Graph, NodeId};

/// Index of an agent in its [`Problem`].
pub type AgentId = usize;

/// An agent which must travel from `initial` to `goal`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Agent {
    /// Where the agent stands at time 0.
    pub initial: NodeId,
    /// Where the agent must stand at the makespan.
    pub goal: NodeId,
}

impl Agent {
    /// An agent travelling from `initial` to `goal`.
    pub fn new(initial: NodeId, goal: NodeId) -> Self {
        Self { initial, goal }
    }
}

/// A validated cooperative pathfinding instance: a graph and an ordered list of agents.
///
/// Every agent endpoint is a node of the graph, no two agents share an initial node and no two agents share a goal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Problem {
    graph: Graph,
    agents: Vec<Agent>,
}

impl Problem {
    /// Validate and assemble an instance.
    pub fn new(graph: Graph, agents: Vec<Agent>) -> Result<Self, ProblemError> {
        let mut initial_owners: HashMap<NodeId, AgentId> = HashMap::with_capacity(agents.len());
        let mut goal_owners: HashMap<NodeId, AgentId> = HashMap::with_capacity(agents.len());

        for (id, agent) in agents.iter().enumerate() {
            for node in [agent.initial, agent.goal] {
                if node >= graph.size() {
                    return Err(ProblemError::NodeOutOfRange { node, node_count: graph.size() });
                }
            }

            if let Some(first) = initial_owners.insert(agent.initial, id) {
                return Err(ProblemError::DuplicateInitial { node: agent.initial, first, second: id });
            }
            if let Some(first) = goal_owners.insert(agent.goal, id) {
                return Err(ProblemError::DuplicateGoal { node: agent.goal, first, second: id });
            }
        }

        Ok(Self { graph, agents })
    }

    /// The shared graph.
    #[inline]
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// The agents, indexed by [`AgentId`].
    #[inline]
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }
}
