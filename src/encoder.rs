//! Translation of a fixed-makespan instance into CNF.

use itertools::Itertools;
use tracing::{debug, info};

use crate::context::Context;
use crate::logic::{at_most_one, Clause};
use crate::mdd::ReachabilityWindow;
use crate::problem::{AgentId, Problem};

/// Whether variables are pruned with per-agent [`ReachabilityWindow`]s.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Pruning {
    /// Only allocate `X(t, a, v)` when `v` is accessible to `a` at `t`.
    #[default]
    Reachability,
    /// Allocate every `(t, a, v)` combination. Correct, but larger.
    Disabled,
}

/// Result of [`build_context`].
#[derive(Debug)]
pub enum Encoding {
    /// Every agent has at least one variable; the context holds the full CNF instance.
    Built(Context),
    /// The agent cannot get from its initial node to its goal within the makespan, so no clauses were built.
    Unreachable {
        /// The first agent found without a variable.
        agent: AgentId,
    },
}

/// Encode "a collision-free schedule of length `makespan` exists" for `problem` as CNF.
///
/// With `windows` present (one per agent, in agent order, each advanced to at least `makespan`) variables are pruned to
/// the reachable `(time, node)` pairs. With `windows` absent every combination gets a variable.
///
/// Every clause referencing a pruned variable is either dropped (if the missing variable would appear negated, the
/// clause already holds) or built without it (if it would appear positively, it can never be true).
///
/// # Logical setup
/// Let `X(t, a, v)` mean agent `a` is on node `v` at time `t`.
///
/// 1. Transition: `!X(t, a, v) + X(t+1, a, v) + OR(u adjacent to v) X(t+1, a, u)`.
///    An agent stays put or moves along an edge; waiting needs no self loop.
/// 2. Vertex collision: for agents `a < b`, `!X(t, a, v) + !X(t, b, v)`.
/// 3. Single occupancy: for nodes `u < v`, `!X(t, a, u) + !X(t, a, v)`.
///    Nothing asserts that an agent is somewhere; the boundary and transition clauses chain that forward from `t = 0`.
/// 4. Edge swap: for agents `a < b` and an edge traversed `v -> u` by `a`,
///    `!X(t, a, v) + !X(t+1, a, u) + !X(t, b, u) + !X(t+1, b, v)`.
/// 5. Boundary: at `t = 0` only the agent's initial node holds, at `t = makespan` only its goal.
///
/// # Panics
/// If `windows` is present but does not hold one window per agent, or a window was not advanced far enough.
pub fn build_context(problem: &Problem, makespan: usize, windows: Option<&[ReachabilityWindow<'_>]>) -> Encoding {
    let graph = problem.graph();
    let agents = problem.agents();
    let nodes = 0..graph.size();

    if let Some(windows) = windows {
        assert_eq!(windows.len(), agents.len(), "one reachability window per agent is required");
    }

    let mut context = Context::new(makespan, agents.len(), graph.size());

    for a in 0..agents.len() {
        let mut has_variable = false;
        for t in 0..=makespan {
            for v in nodes.clone() {
                if windows.map_or(true, |windows| windows[a].accessible(v, t, makespan)) {
                    context.create_or_get(t, a, v);
                    has_variable = true;
                }
            }
        }

        // if an agent has no path, no solution could exist
        if !has_variable {
            info!(agent = a, makespan, "no path for agent within the makespan");
            return Encoding::Unreachable { agent: a };
        }
    }
    debug!(makespan, variables = context.variable_count(), "variables allocated");

    let adjacency = nodes.clone()
        .map(|v| graph.neighbours(v).into_iter().filter(|u| *u != v).collect_vec())
        .collect_vec();

    // transition
    for a in 0..agents.len() {
        for t in 0..makespan {
            for v in nodes.clone() {
                let Some(here) = context.try_get(t, a, v) else { continue };

                let mut clause = Clause::from(!here);
                for u in std::iter::once(v).chain(adjacency[v].iter().copied()) {
                    if let Some(next) = context.try_get(t + 1, a, u) {
                        clause |= next;
                    }
                }
                context.push(clause);
            }
        }
    }

    // vertex collision
    for t in 0..=makespan {
        for v in nodes.clone() {
            let here = (0..agents.len())
                .filter_map(|a| context.try_get(t, a, v))
                .collect_vec();
            for clause in at_most_one(&here) {
                context.push(clause);
            }
        }
    }

    // single occupancy
    for a in 0..agents.len() {
        for t in 0..=makespan {
            let here = nodes.clone()
                .filter_map(|v| context.try_get(t, a, v))
                .collect_vec();
            for clause in at_most_one(&here) {
                context.push(clause);
            }
        }
    }

    // edge swap; both directions of every edge, so unordered agent pairs suffice
    for (a, b) in (0..agents.len()).tuple_combinations() {
        for t in 0..makespan {
            for v in nodes.clone() {
                for &u in &adjacency[v] {
                    let lits = [
                        context.try_get(t, a, v),
                        context.try_get(t + 1, a, u),
                        context.try_get(t, b, u),
                        context.try_get(t + 1, b, v),
                    ];
                    if let [Some(x0), Some(x1), Some(x2), Some(x3)] = lits {
                        context.push(!x0 | !x1 | !x2 | !x3);
                    }
                }
            }
        }
    }

    // initial and goal positions
    for (boundary, time) in [(true, 0), (false, makespan)] {
        for (a, agent) in agents.iter().enumerate() {
            let target = if boundary { agent.initial } else { agent.goal };
            for v in nodes.clone() {
                if let Some(x) = context.try_get(time, a, v) {
                    context.push(if v == target { x } else { !x });
                }
            }
        }
    }

    debug!(makespan, clauses = context.clause_count(), "clauses generated");
    Encoding::Built(context)
}
