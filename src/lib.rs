#![warn(missing_docs)]

//! # `cpfsat`
//!
//! A solver for cooperative pathfinding, also known as multi-agent path finding: agents share an undirected graph, each
//! moves from its initial node to its goal one step at a time, and no two agents may stand on the same node or swap
//! places across an edge at the same time.
//!
//! Build a [`Problem`] from a [`Graph`] and a list of [`Agent`]s (or read one with [`format::read_problem`], or build a
//! grid with [`grid::GridBuilder`]), then hand it to a [`SearchDriver`] together with a [`SatOracle`] such as
//! [`VarisatOracle`].
//!
//! # Internals
//! For a fixed makespan `M`, the question "can every agent reach its goal in `M` steps without collisions" is expressed
//! as a Boolean satisfiability problem (a "SAT") over variables `X(t, a, v)`, true iff agent `a` stands on node `v` at
//! time `t`. See [`encoder::build_context`] for the clauses.
//!
//! A high level overview is as follows:
//!
//! 1. For each agent, two breadth-first searches (from its initial node and from its goal) give a
//!    [`ReachabilityWindow`]. Only `(t, v)` pairs lying on some walk that arrives on time receive a variable; if an
//!    agent gets none at all, `M` is rejected without asking the solver.
//! 2. A [`Context`] hands out dense variable ids and collects the clauses.
//! 3. The [`SearchDriver`] tries `M = min, min + 1, ...` until the oracle finds a model, the range runs out, or the
//!    [`CancellationToken`] fires. A model is decoded back into a [`Schedule`].

pub use cancel::CancellationToken;
pub use context::Context;
pub use encoder::{build_context, Encoding, Pruning};
pub use error::{OracleError, ParseError, ProblemError, SolveError};
pub use graph::{Graph, NodeId};
pub use logic::{Clause, Literal, VarId};
pub use mdd::ReachabilityWindow;
pub use oracle::{SatAnswer, SatOracle, VarisatOracle};
pub use problem::{Agent, AgentId, Problem};
pub use schedule::{Schedule, Violation};
pub use search::{Attempt, Outcome, SearchConfig, SearchDriver, SearchReport, Verdict};

pub mod cancel;
pub mod context;
pub mod encoder;
pub mod error;
pub mod format;
pub mod graph;
pub mod grid;
pub mod logic;
pub mod mdd;
pub mod oracle;
pub mod problem;
pub mod schedule;
pub mod search;
