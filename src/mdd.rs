//! Reachability pruning.

use itertools::Itertools;
use tracing::trace;

use crate::graph::{Graph, NodeId};
use crate::problem::Agent;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
struct Distance {
    // None until the frontier reaches the node
    from_initial: Option<usize>,
    from_goal: Option<usize>,
}

/// Per-agent reachability window, a cheap stand-in for a multi-valued decision diagram.
///
/// Two breadth-first searches, one from the agent's initial node and one from its goal, advance in lockstep ticks.
/// Once both have run to a horizon `makespan`, node `v` is [`accessible`](Self::accessible) at time `t` iff
/// `dist(initial, v) <= t` and `dist(v, goal) <= makespan - t`: some walk (waiting allowed) passes through `v` at `t`
/// and still arrives on time. Everything else can be left out of the encoding.
///
/// The window borrows the graph it was built on and can only be extended, so it may be reused while the makespan grows.
#[derive(Clone, Debug)]
pub struct ReachabilityWindow<'g> {
    graph: &'g Graph,
    agent: Agent,
    distances: Vec<Distance>,
    frontier_initial: Vec<NodeId>,
    frontier_goal: Vec<NodeId>,
    next_distance: usize,
}

impl<'g> ReachabilityWindow<'g> {
    /// A window over `graph` for `agent`, not yet advanced.
    pub fn new(graph: &'g Graph, agent: Agent) -> Self {
        Self {
            graph,
            agent,
            distances: vec![Distance::default(); graph.size()],
            frontier_initial: vec![agent.initial],
            frontier_goal: vec![agent.goal],
            next_distance: 0,
        }
    }

    /// Advance both searches by one tick.
    pub fn step(&mut self) {
        let tick = self.next_distance;
        let graph = self.graph;

        self.frontier_initial = Self::advance(graph, &mut self.distances, &self.frontier_initial, tick, |d| &mut d.from_initial);
        self.frontier_goal = Self::advance(graph, &mut self.distances, &self.frontier_goal, tick, |d| &mut d.from_goal);

        self.next_distance += 1;
    }

    // stamp `frontier` with `tick` and return the next frontier
    fn advance(
        graph: &Graph,
        distances: &mut [Distance],
        frontier: &[NodeId],
        tick: usize,
        field: impl Fn(&mut Distance) -> &mut Option<usize>,
    ) -> Vec<NodeId> {
        // a node may have been queued by two parents; only the first stamp counts
        let stamped = frontier.iter()
            .copied()
            .filter(|node| {
                let slot = field(&mut distances[*node]);
                if slot.is_none() {
                    *slot = Some(tick);
                    true
                } else {
                    false
                }
            })
            .collect_vec();

        stamped.into_iter()
            .flat_map(|node| graph.neighbours(node))
            .filter(|neighbour| field(&mut distances[*neighbour]).is_none())
            .unique()
            .collect_vec()
    }

    /// Tick until every distance up to `makespan` is known.
    pub fn step_until(&mut self, makespan: usize) {
        while self.next_distance <= makespan {
            self.step();
        }
        trace!(initial = self.agent.initial, goal = self.agent.goal, horizon = self.next_distance, "window advanced");
    }

    /// Whether the agent may be at `node` at `time` and still reach its goal by `makespan`.
    ///
    /// # Panics
    /// If `time > makespan`, or the window has not been advanced to `makespan`.
    pub fn accessible(&self, node: NodeId, time: usize, makespan: usize) -> bool {
        assert!(time <= makespan, "time {time} is beyond makespan {makespan}");
        assert!(makespan < self.next_distance, "window advanced to {} but queried at makespan {makespan}", self.next_distance);

        let dist = self.distances[node];
        match (dist.from_initial, dist.from_goal) {
            (Some(from_initial), Some(from_goal)) => time >= from_initial && makespan - time >= from_goal,
            // unreached by one of the searches, so not on any path from initial to goal
            _ => false,
        }
    }

    /// Shortest hop distance from the initial node to `node`, if reached yet.
    #[inline]
    pub fn distance_from_initial(&self, node: NodeId) -> Option<usize> {
        self.distances[node].from_initial
    }

    /// Shortest hop distance from `node` to the goal, if reached yet.
    #[inline]
    pub fn distance_to_goal(&self, node: NodeId) -> Option<usize> {
        self.distances[node].from_goal
    }
}
