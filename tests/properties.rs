//! Property tests over small random instances.

use std::collections::{HashMap, HashSet};

use cpfsat::format::{read_problem, write_problem};
use cpfsat::{
    build_context, Agent, CancellationToken, Clause, Context, Encoding, Graph, OracleError, Outcome, Problem, Pruning,
    ReachabilityWindow, SatAnswer, SatOracle, Schedule, SearchConfig, SearchDriver, VarisatOracle, Verdict,
};
use petgraph::algo::dijkstra;
use proptest::prelude::*;

// ============================================================================
// Helpers
// ============================================================================

/// Up to five nodes, any edges (self loops included), one or two agents.
fn instance() -> impl Strategy<Value = Problem> {
    (1usize..=5)
        .prop_flat_map(|n| {
            (
                Just(n),
                prop::collection::vec((0..n, 0..n), 0..=n * 2),
                Just((0..n).collect::<Vec<_>>()).prop_shuffle(),
                Just((0..n).collect::<Vec<_>>()).prop_shuffle(),
                1..=n.min(2),
            )
        })
        .prop_map(|(n, edges, initials, goals, count)| {
            let mut graph = Graph::with_nodes(n);
            for (u, v) in edges {
                graph.add_edge(u, v).unwrap();
            }
            let agents = initials.into_iter().zip(goals).take(count).map(|(i, g)| Agent::new(i, g)).collect();
            Problem::new(graph, agents).unwrap()
        })
}

fn encode(problem: &Problem, makespan: usize, pruning: Pruning) -> Option<Context> {
    let windows = problem.agents().iter()
        .map(|agent| {
            let mut window = ReachabilityWindow::new(problem.graph(), *agent);
            window.step_until(makespan);
            window
        })
        .collect::<Vec<_>>();
    let windows = (pruning == Pruning::Reachability).then_some(windows.as_slice());

    match build_context(problem, makespan, windows) {
        Encoding::Built(context) => Some(context),
        Encoding::Unreachable { .. } => None,
    }
}

fn solve(problem: &Problem, makespan: usize, pruning: Pruning) -> Option<Schedule> {
    let context = encode(problem, makespan, pruning)?;
    match VarisatOracle::new().solve(context.variable_count(), context.clauses(), &CancellationToken::new()).unwrap() {
        SatAnswer::Satisfiable(assignment) => {
            Some(Schedule::decode(&context, problem.agents().len(), problem.graph().size(), &assignment).unwrap())
        }
        SatAnswer::Unsatisfiable => None,
    }
}

struct Refusing {
    calls: usize,
}

impl SatOracle for Refusing {
    fn solve(&mut self, _variable_count: usize, _clauses: &[Clause], _cancel: &CancellationToken) -> Result<SatAnswer, OracleError> {
        self.calls += 1;
        Ok(SatAnswer::Unsatisfiable)
    }
}

// ============================================================================
// Variable allocation
// ============================================================================

proptest! {
    #[test]
    fn prop_allocation_is_idempotent_and_dense(keys in prop::collection::vec((0usize..=3, 0usize..3, 0usize..4), 0..40)) {
        let mut context = Context::new(3, 3, 4);
        let mut seen = HashMap::new();

        for key in &keys {
            let lit = context.create_or_get(key.0, key.1, key.2);
            prop_assert!(!lit.negated);
            if let Some(previous) = seen.insert(*key, lit.var) {
                prop_assert_eq!(previous, lit.var);
            }
        }

        prop_assert_eq!(context.variable_count(), seen.len());
        let ids = seen.values().copied().collect::<HashSet<_>>();
        prop_assert_eq!(ids, (0..seen.len()).collect::<HashSet<_>>());
        for (key, var) in &seen {
            prop_assert_eq!(context.get(key.0, key.1, key.2).var, *var);
        }
    }
}

// ============================================================================
// Reachability windows
// ============================================================================

proptest! {
    #[test]
    fn prop_windows_match_shortest_paths(problem in instance()) {
        let graph = problem.graph();
        let map = graph.to_graphmap();
        let horizon = graph.size() + 2;

        for agent in problem.agents() {
            let mut window = ReachabilityWindow::new(graph, *agent);
            window.step_until(horizon);

            let from_initial = dijkstra(&map, agent.initial, None, |_| 1usize);
            let to_goal = dijkstra(&map, agent.goal, None, |_| 1usize);

            for v in 0..graph.size() {
                prop_assert_eq!(window.distance_from_initial(v), from_initial.get(&v).copied());
                prop_assert_eq!(window.distance_to_goal(v), to_goal.get(&v).copied());

                for makespan in 0..=horizon {
                    for t in 0..=makespan {
                        let expected = match (from_initial.get(&v), to_goal.get(&v)) {
                            (Some(di), Some(dg)) => *di <= t && *dg <= makespan - t,
                            _ => false,
                        };
                        prop_assert_eq!(window.accessible(v, t, makespan), expected);
                    }
                }
            }
        }
    }
}

// ============================================================================
// Encoding
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_every_model_is_a_solution(problem in instance(), makespan in 0usize..=3) {
        let Some(context) = encode(&problem, makespan, Pruning::Reachability) else { return Ok(()) };
        let n = context.variable_count();
        if n > 14 {
            return Ok(());
        }

        for mask in 0u32..(1 << n) {
            let assignment = (0..n).map(|i| (mask >> i) & 1 == 1).collect::<Vec<_>>();
            if !context.satisfied_by(&assignment) {
                continue;
            }

            let schedule = Schedule::decode(&context, problem.agents().len(), problem.graph().size(), &assignment).unwrap();
            prop_assert_eq!(schedule.makespan(), Some(makespan));
            prop_assert!(schedule.violations(&problem).is_empty());
        }
    }

    #[test]
    fn prop_pruning_preserves_satisfiability(problem in instance(), makespan in 0usize..=4) {
        let pruned = solve(&problem, makespan, Pruning::Reachability);
        let full = solve(&problem, makespan, Pruning::Disabled);

        prop_assert_eq!(pruned.is_some(), full.is_some());
        for schedule in pruned.iter().chain(full.iter()) {
            prop_assert!(schedule.violations(&problem).is_empty());
        }
    }
}

// ============================================================================
// Search
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_attempts_are_consecutive(problem in instance(), min in 0usize..4, span in 0usize..4) {
        let config = SearchConfig::default().with_min_makespan(min).with_max_makespan(min + span);
        let mut oracle = Refusing { calls: 0 };
        let report = SearchDriver::new(config).run(&problem, &mut oracle, &CancellationToken::new()).unwrap();

        prop_assert_eq!(report.outcome, Outcome::Exhausted);
        prop_assert_eq!(
            report.attempts.iter().map(|attempt| attempt.makespan).collect::<Vec<_>>(),
            (min..=min + span).collect::<Vec<_>>()
        );
        let consulted = report.attempts.iter().filter(|attempt| attempt.verdict == Verdict::Unsatisfiable).count();
        prop_assert_eq!(consulted, oracle.calls);
    }

    #[test]
    fn prop_solved_makespan_is_minimal(problem in instance()) {
        let config = SearchConfig::default().with_max_makespan(problem.graph().size() + 3);
        let report = SearchDriver::new(config).run(&problem, &mut VarisatOracle::new(), &CancellationToken::new()).unwrap();

        if let Outcome::Solved { makespan, schedule } = report.outcome {
            prop_assert!(schedule.violations(&problem).is_empty());
            for smaller in 0..makespan {
                prop_assert!(solve(&problem, smaller, Pruning::Disabled).is_none());
            }
            // agents may wait at their goals, so a longer horizon stays feasible
            prop_assert!(solve(&problem, makespan + 1, Pruning::Reachability).is_some());
        }
    }
}

// ============================================================================
// Problem files
// ============================================================================

proptest! {
    #[test]
    fn prop_problem_files_round_trip(problem in instance()) {
        let mut written = Vec::new();
        write_problem(&mut written, &problem).unwrap();
        let read = read_problem(written.as_slice()).unwrap();

        prop_assert_eq!(&read, &problem);
    }
}
