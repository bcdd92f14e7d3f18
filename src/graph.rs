//! The shared undirected graph.

use itertools::Itertools;
use petgraph::graphmap::UnGraphMap;
use unordered_pair::UnorderedPair;

use crate::error::ProblemError;

/// Index of a node, in `0..node_count`.
pub type NodeId = usize;

/// An undirected, unweighted graph over the nodes `0..node_count`.
///
/// Edges live in an upper triangular boolean matrix, so `edge_exists(u, v) == edge_exists(v, u)` by construction.
/// Self loops may be stored but carry no meaning for the encoding, which always allows an agent to wait.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Graph {
    node_count: usize,
    edges: Vec<bool>,
}

#[inline]
fn triangle_index(u: NodeId, v: NodeId) -> usize {
    let (f, s) = if u <= v { (u, v) } else { (v, u) };
    f + s * (s + 1) / 2
}

impl Graph {
    /// A graph of `node_count` nodes and no edges.
    ///
    /// # Panics
    /// If the edge matrix for `node_count` nodes cannot be allocated; see [`Self::try_with_nodes`].
    pub fn with_nodes(node_count: usize) -> Self {
        match Self::try_with_nodes(node_count) {
            Ok(graph) => graph,
            Err(err) => panic!("{err}"),
        }
    }

    /// A graph of `node_count` nodes and no edges, or [`ProblemError::TooManyNodes`] if its edge matrix is too large to
    /// address or allocate.
    pub fn try_with_nodes(node_count: usize) -> Result<Self, ProblemError> {
        let too_many = ProblemError::TooManyNodes { node_count };
        let cells = node_count.checked_add(1)
            .and_then(|next| node_count.checked_mul(next))
            .map(|product| product / 2)
            .ok_or(too_many.clone())?;

        let mut edges = Vec::new();
        edges.try_reserve_exact(cells).map_err(|_| too_many)?;
        edges.resize(cells, false);

        Ok(Self { node_count, edges })
    }

    /// Number of nodes.
    #[inline]
    pub fn size(&self) -> usize {
        self.node_count
    }

    #[inline]
    fn check(&self, node: NodeId) -> Result<(), ProblemError> {
        if node < self.node_count {
            Ok(())
        } else {
            Err(ProblemError::NodeOutOfRange { node, node_count: self.node_count })
        }
    }

    /// Connect `u` and `v`. Adding an edge twice is harmless.
    pub fn add_edge(&mut self, u: NodeId, v: NodeId) -> Result<&mut Self, ProblemError> {
        self.check(u)?;
        self.check(v)?;
        self.edges[triangle_index(u, v)] = true;
        Ok(self)
    }

    /// Whether an edge joins `u` and `v`, in either direction.
    ///
    /// # Panics
    /// If either node is out of range.
    #[inline]
    pub fn edge_exists(&self, u: NodeId, v: NodeId) -> bool {
        assert!(u < self.node_count && v < self.node_count, "edge ({u}, {v}) queried on a graph of {} nodes", self.node_count);
        self.edges[triangle_index(u, v)]
    }

    /// All nodes sharing an edge with `node`, in increasing order. Includes `node` itself if it has a self loop.
    ///
    /// This scans every node, which is fine for the grid-sized graphs this crate targets.
    pub fn neighbours(&self, node: NodeId) -> Vec<NodeId> {
        (0..self.node_count)
            .filter(|other| self.edge_exists(node, *other))
            .collect_vec()
    }

    /// Number of distinct edges, self loops included.
    pub fn edge_count(&self) -> usize {
        self.edges.iter().filter(|present| **present).count()
    }

    /// Every edge once, as a pair whose first element is not greater than its second, ordered by `(first, second)`.
    pub fn edges(&self) -> impl Iterator<Item = UnorderedPair<NodeId>> + '_ {
        (0..self.node_count)
            .flat_map(move |f| (f..self.node_count).map(move |s| (f, s)))
            .filter(|(f, s)| self.edges[triangle_index(*f, *s)])
            .map(UnorderedPair::from)
    }

    /// The same graph as a [`petgraph`] graph map, every node present even when isolated.
    pub fn to_graphmap(&self) -> UnGraphMap<NodeId, ()> {
        let mut graph = UnGraphMap::with_capacity(self.node_count, self.edge_count());
        for node in 0..self.node_count {
            graph.add_node(node);
        }
        for UnorderedPair(f, s) in self.edges() {
            graph.add_edge(f, s, ());
        }

        graph
    }

    /// Build a graph of `node_count` nodes from a [`petgraph`] graph map whose nodes are node ids.
    pub fn from_graphmap<E>(node_count: usize, graph: &UnGraphMap<NodeId, E>) -> Result<Self, ProblemError> {
        let mut ret = Self::with_nodes(node_count);
        for node in graph.nodes() {
            ret.check(node)?;
        }
        for (u, v, _) in graph.all_edges() {
            ret.add_edge(u, v)?;
        }

        Ok(ret)
    }
}
