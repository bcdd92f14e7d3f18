//! The line-oriented problem file format.
//!
//! Blank lines and lines starting with `#` are skipped. In order, the file holds the node count, the edge count, one
//! `first second` line per edge, the agent count and one `initial goal` line per agent.

use std::io::{self, BufRead, Write};
use std::str::FromStr;

use itertools::Itertools;
use unordered_pair::UnorderedPair;

use crate::error::{ParseError, ProblemError};
use crate::graph::{Graph, NodeId};
use crate::problem::{Agent, Problem};

struct Lines<R: BufRead> {
    reader: R,
    line: usize,
    buf: String,
}

impl<R: BufRead> Lines<R> {
    fn new(reader: R) -> Self {
        Self { reader, line: 0, buf: String::new() }
    }

    // the next line holding data, or UnexpectedEnd carrying `hint`
    fn next_or(&mut self, hint: impl Into<String>) -> Result<(usize, &str), ParseError> {
        loop {
            self.buf.clear();
            self.line += 1;
            if self.reader.read_line(&mut self.buf)? == 0 {
                return Err(ParseError::UnexpectedEnd { line: self.line, hint: hint.into() });
            }

            let trimmed = self.buf.trim();
            if !trimmed.is_empty() && !trimmed.starts_with('#') {
                break;
            }
        }

        Ok((self.line, self.buf.trim()))
    }

    fn values<T: FromStr, const N: usize>(&mut self, hint: impl Into<String>) -> Result<[T; N], ParseError> {
        let hint = hint.into();
        let (line, content) = self.next_or(hint.clone())?;
        let malformed = || ParseError::Malformed { line, hint: hint.clone(), content: content.to_owned() };

        let parsed = content.split_whitespace()
            .map(|token| token.parse::<T>().map_err(|_| malformed()))
            .collect::<Result<Vec<_>, _>>()?;

        <[T; N]>::try_from(parsed).map_err(|_| malformed())
    }
}

/// Read and validate a problem. Errors carry the line of the count, edge or agent at fault.
pub fn read_problem<R: BufRead>(reader: R) -> Result<Problem, ParseError> {
    let mut lines = Lines::new(reader);

    let [node_count] = lines.values::<usize, 1>("Expecting number of nodes in graph")?;
    let mut graph = Graph::try_with_nodes(node_count)
        .map_err(|source| ParseError::Problem { line: lines.line, source })?;

    let [edge_count] = lines.values::<usize, 1>("Expecting number of edges in graph")?;
    for e in 0..edge_count {
        let [first, second] = lines.values::<NodeId, 2>(format!("Expecting edge #{e}"))?;
        graph.add_edge(first, second)
            .map_err(|source| ParseError::Problem { line: lines.line, source })?;
    }

    let [agent_count] = lines.values::<usize, 1>("Expecting number of agents")?;
    let mut agents = Vec::new();
    let mut agent_lines = Vec::new();
    for a in 0..agent_count {
        let [initial, goal] = lines.values::<NodeId, 2>(format!("Expecting agent #{a}"))?;
        if let Some(node) = [initial, goal].into_iter().find(|node| *node >= node_count) {
            return Err(ParseError::Problem { line: lines.line, source: ProblemError::NodeOutOfRange { node, node_count } });
        }
        agents.push(Agent::new(initial, goal));
        agent_lines.push(lines.line);
    }

    Problem::new(graph, agents).map_err(|source| {
        let line = match source {
            ProblemError::DuplicateInitial { second, .. } | ProblemError::DuplicateGoal { second, .. } => agent_lines[second],
            _ => lines.line,
        };
        ParseError::Problem { line, source }
    })
}

/// Write `problem` in the same format [`read_problem`] accepts, with commented sections.
///
/// Edges are listed once each, in increasing `(first, second)` order with `first <= second`; agents keep their order.
pub fn write_problem<W: Write>(mut writer: W, problem: &Problem) -> io::Result<()> {
    let graph = problem.graph();

    writeln!(writer, "# Number of nodes")?;
    writeln!(writer, "{}", graph.size())?;

    writeln!(writer, "\n# Number of edges")?;
    writeln!(writer, "{}", graph.edge_count())?;

    writeln!(writer, "\n# Graph's edges")?;
    for UnorderedPair(first, second) in graph.edges() {
        writeln!(writer, "{first} {second}")?;
    }

    writeln!(writer, "\n# Number of agents")?;
    writeln!(writer, "{}", problem.agents().len())?;

    writeln!(writer, "\n# Agents initial and goal nodes")?;
    writeln!(writer, "{}", problem.agents().iter().map(|agent| format!("{} {}", agent.initial, agent.goal)).join("\n"))?;

    Ok(())
}
