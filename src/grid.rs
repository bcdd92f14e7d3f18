//! Rectangular grid instances: building them by hand or at random, and drawing them.

use std::collections::HashSet;
use std::num::NonZero;

use itertools::Itertools;
use ndarray::Array2;
use petgraph::graphmap::UnGraphMap;
use rand::seq::SliceRandom;
use rand::Rng;
use strum::VariantArray;
use unordered_pair::UnorderedPair;

use crate::error::ProblemError;
use crate::graph::{Graph, NodeId};
use crate::problem::{Agent, Problem};
use crate::schedule::Schedule;

/// One coordinate of a [`Location`].
pub type Coord = usize;
/// A grid width or height.
pub type Dimension = NonZero<Coord>;

/// A location `(x, y)` on a grid. The top left corner is `Location(0, 0)`.
#[derive(Clone, Eq, Hash, Copy, PartialEq, Ord, PartialOrd, Debug)]
pub struct Location(pub Coord, pub Coord);

impl Location {
    // (row, column), for indexing arrays
    #[inline]
    pub(crate) fn as_index(&self) -> (Coord, Coord) {
        (self.1, self.0)
    }

    pub(crate) fn offset_by(self, rhs: (isize, isize)) -> Self {
        Self(self.0.wrapping_add_signed(rhs.0), self.1.wrapping_add_signed(rhs.1))
    }
}

/// One move between orthogonally adjacent cells.
#[derive(Copy, Clone, VariantArray, Eq, PartialEq, Hash, Debug, Ord, PartialOrd)]
pub enum Step {
    /// Towards `y = 0`.
    Up,
    /// Away from `y = 0`.
    Down,
    /// Towards `x = 0`.
    Left,
    /// Away from `x = 0`.
    Right,
}

impl Step {
    /// Directions which lead to a higher node id; building along these visits every grid edge once.
    pub const FORWARD_VARIANTS: &'static [Self] = &[Self::Right, Self::Down];

    /// The location one step from `location` in this direction. May be off the grid.
    pub fn attempt_from(&self, location: Location) -> Location {
        match self {
            Self::Up => location.offset_by((0, -1)),
            Self::Down => location.offset_by((0, 1)),
            Self::Left => location.offset_by((-1, 0)),
            Self::Right => location.offset_by((1, 0)),
        }
    }

    /// The direction from `a` to `b`, if they are adjacent.
    pub fn direction_to(a: Location, b: Location) -> Option<Self> {
        Self::VARIANTS.iter().find(|dir| dir.attempt_from(a) == b).copied()
    }
}

/// Reasons a [`GridBuilder`] may become invalid while building.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BuilderInvalidReason {
    /// A feature was placed outside the grid.
    FeatureOutOfBounds,
    /// An agent starts or finishes on a wall.
    AgentOnWall,
    /// Walls and agents together need more cells than the grid has.
    TooCrowded,
    /// The agents do not form a valid instance.
    Problem(ProblemError),
}

/// A builder for grid instances. Mutates itself while building; [`Clone`] it to keep a snapshot.
#[derive(Clone, Debug)]
pub struct GridBuilder {
    // width, height
    dims: (Dimension, Dimension),
    agents: Vec<(Location, Location)>,
    walls: HashSet<Location>,
    edge_blacklist: HashSet<UnorderedPair<Location>>,
    invalid_reasons: Vec<BuilderInvalidReason>,
}

impl Default for GridBuilder {
    fn default() -> Self {
        Self::square(NonZero::new(4).unwrap())
    }
}

impl GridBuilder {
    /// Construct an empty grid with the specified dimensions, in `(x, y)` order.
    pub fn with_dims(dims: (Dimension, Dimension)) -> Self {
        Self {
            dims,
            agents: Default::default(),
            walls: Default::default(),
            edge_blacklist: Default::default(),
            invalid_reasons: Default::default(),
        }
    }

    /// Construct an empty `size` by `size` grid.
    pub fn square(size: Dimension) -> Self {
        Self::with_dims((size, size))
    }

    #[inline]
    fn in_bounds(&self, location: Location) -> bool {
        location.0 < self.dims.0.get() && location.1 < self.dims.1.get()
    }

    #[inline]
    fn node_of(&self, location: Location) -> NodeId {
        location.0 + location.1 * self.dims.0.get()
    }

    /// Add an agent travelling from `initial` to `goal`. Agents are numbered in the order they are added.
    ///
    /// If the builder is already in an invalid state, this function does nothing.
    pub fn add_agent(&mut self, initial: Location, goal: Location) -> &mut Self {
        if !self.invalid_reasons.is_empty() {
            return self;
        }

        if !self.in_bounds(initial) || !self.in_bounds(goal) {
            self.invalid_reasons.push(BuilderInvalidReason::FeatureOutOfBounds);
            return self;
        }

        self.agents.push((initial, goal));
        self
    }

    /// Turn `location` into a wall, cutting every edge to it.
    ///
    /// If the builder is already in an invalid state, this function does nothing.
    pub fn add_wall(&mut self, location: Location) -> &mut Self {
        if !self.invalid_reasons.is_empty() {
            return self;
        }

        if !self.in_bounds(location) {
            self.invalid_reasons.push(BuilderInvalidReason::FeatureOutOfBounds);
            return self;
        }

        self.walls.insert(location);
        self
    }

    /// Cut the edge between two adjacent locations. Does nothing if they are not adjacent.
    pub fn disconnect(&mut self, locations: UnorderedPair<Location>) -> &mut Self {
        if !self.invalid_reasons.is_empty() {
            return self;
        }

        if !self.in_bounds(locations.0) || !self.in_bounds(locations.1) {
            self.invalid_reasons.push(BuilderInvalidReason::FeatureOutOfBounds);
            return self;
        }

        if Step::direction_to(locations.0, locations.1).is_some() {
            self.edge_blacklist.insert(locations);
        }
        self
    }

    /// `None` if the builder is valid, otherwise every reason it is not.
    pub fn is_valid(&self) -> Option<&Vec<BuilderInvalidReason>> {
        if self.invalid_reasons.is_empty() {
            None
        } else {
            Some(&self.invalid_reasons)
        }
    }

    /// A `size` by `size` grid where `wall_percent`% of the cells are walls and `agent_percent`% of the cells hold an
    /// agent. Initial nodes and goals are drawn from the free cells, distinct among themselves.
    pub fn random<R: Rng + ?Sized>(size: Dimension, wall_percent: usize, agent_percent: usize, rng: &mut R) -> Self {
        let mut builder = Self::square(size);
        let Some(cells) = size.get().checked_mul(size.get()).filter(|_| wall_percent <= 100 && agent_percent <= 100) else {
            builder.invalid_reasons.push(BuilderInvalidReason::TooCrowded);
            return builder;
        };
        let wall_count = cells / 100 * wall_percent + cells % 100 * wall_percent / 100;
        let agent_count = cells / 100 * agent_percent + cells % 100 * agent_percent / 100;

        if wall_count.saturating_add(agent_count) >= cells {
            builder.invalid_reasons.push(BuilderInvalidReason::TooCrowded);
            return builder;
        }

        let location_of = |node: NodeId| Location(node % size.get(), node / size.get());

        let mut nodes = (0..cells).collect_vec();
        nodes.shuffle(rng);
        let (walls, free) = nodes.split_at_mut(wall_count);
        for node in walls.iter() {
            builder.add_wall(location_of(*node));
        }

        let initials = free[..agent_count].to_vec();
        free.shuffle(rng);
        for (initial, goal) in initials.into_iter().zip(free[..agent_count].iter().copied()) {
            builder.add_agent(location_of(initial), location_of(goal));
        }

        builder
    }

    /// Convert the state of this builder into a [`Grid`].
    /// If the builder is invalid for any reason, a [`Vec`] of [`BuilderInvalidReason`] will indicate why.
    pub fn build(&self) -> Result<Grid, Vec<BuilderInvalidReason>> {
        if !self.invalid_reasons.is_empty() {
            return Err(self.invalid_reasons.clone());
        }

        let (width, height) = (self.dims.0.get(), self.dims.1.get());
        let mut graph: UnGraphMap<NodeId, Step> = UnGraphMap::with_capacity(
            width * height,
            // "horizontal" edges plus "vertical" edges
            (width - 1) * height + (height - 1) * width,
        );

        for (x, y) in (0..width).cartesian_product(0..height) {
            let location = Location(x, y);
            graph.add_node(self.node_of(location));
            if self.walls.contains(&location) {
                continue;
            }

            // add edges down and to the right, if possible
            for direction in Step::FORWARD_VARIANTS {
                let other = direction.attempt_from(location);
                if self.in_bounds(other)
                    && !self.walls.contains(&other)
                    && !self.edge_blacklist.contains(&UnorderedPair::from((location, other))) {
                    graph.add_edge(self.node_of(location), self.node_of(other), *direction);
                }
            }
        }

        if self.agents.iter().any(|(initial, goal)| self.walls.contains(initial) || self.walls.contains(goal)) {
            return Err(vec![BuilderInvalidReason::AgentOnWall]);
        }

        let agents = self.agents.iter()
            .map(|(initial, goal)| Agent::new(self.node_of(*initial), self.node_of(*goal)))
            .collect_vec();

        let problem = Graph::from_graphmap(width * height, &graph)
            .and_then(|graph| Problem::new(graph, agents))
            .map_err(|err| vec![BuilderInvalidReason::Problem(err)])?;

        let mut walls = Array2::from_elem((height, width), false);
        for wall in &self.walls {
            walls[wall.as_index()] = true;
        }

        Ok(Grid { dims: self.dims, walls, problem })
    }
}

/// A grid instance: the [`Problem`] plus the geometry needed to draw it. Node `x + y * width` is cell `(x, y)`.
#[derive(Clone, Debug)]
pub struct Grid {
    dims: (Dimension, Dimension),
    walls: Array2<bool>,
    problem: Problem,
}

#[inline]
fn agent_char(agent: usize, base: u8) -> char {
    char::from(base + (agent % 26) as u8)
}

// lay out one string per cell, row by row, cells separated by spaces
fn print(board: Array2<String>) -> String {
    let mut out = String::with_capacity(board.len() * 3);

    for row in board.rows() {
        out.push_str(&row.iter().join(" "));
        out.push('\n');
    }

    out
}

impl Grid {
    /// Recover the geometry of a square grid instance, such as those written by [`GridBuilder::random`]. Isolated nodes
    /// are drawn as walls.
    ///
    /// Returns `None` if the node count is not a non-zero perfect square, or some edge joins two cells which are not
    /// adjacent.
    pub fn from_problem(problem: Problem) -> Option<Self> {
        let graph = problem.graph();
        let side = graph.size().isqrt();
        if side * side != graph.size() {
            return None;
        }
        let dims = (NonZero::new(side)?, NonZero::new(side)?);

        let location_of = |node: NodeId| Location(node % side, node / side);
        let adjacent = graph.edges()
            .all(|UnorderedPair(f, s)| f == s || Step::direction_to(location_of(f), location_of(s)).is_some());
        if !adjacent {
            return None;
        }

        let mut walls = Array2::from_elem((side, side), false);
        for node in 0..graph.size() {
            if graph.neighbours(node).is_empty() {
                walls[location_of(node).as_index()] = true;
            }
        }

        Some(Self { dims, walls, problem })
    }

    /// The instance drawn on this grid.
    #[inline]
    pub fn problem(&self) -> &Problem {
        &self.problem
    }

    /// Give up the geometry and keep the instance.
    #[inline]
    pub fn into_problem(self) -> Problem {
        self.problem
    }

    /// The cell of `node`.
    pub fn location_of(&self, node: NodeId) -> Location {
        Location(node % self.dims.0.get(), node / self.dims.0.get())
    }

    fn blank(&self, wall: &str, free: &str) -> Array2<String> {
        self.walls.map(|is_wall| if *is_wall { wall.to_owned() } else { free.to_owned() })
    }

    /// Draw every agent's initial (upper case) and goal (lower case) cell, two characters per cell; `##` is a wall.
    pub fn render_layout(&self) -> String {
        let mut board = self.blank("##", "..");

        for (a, agent) in self.problem.agents().iter().enumerate() {
            let initial = self.location_of(agent.initial).as_index();
            let goal = self.location_of(agent.goal).as_index();
            board[initial].replace_range(0..1, &agent_char(a, b'A').to_string());
            board[goal].replace_range(1..2, &agent_char(a, b'a').to_string());
        }

        print(board)
    }

    /// Draw where every agent of `schedule` stands at `time`; `#` is a wall, `.` a free cell. Agents on nodes outside
    /// the grid are left out.
    pub fn render(&self, schedule: &Schedule, time: usize) -> String {
        let mut board = self.blank("#", ".");

        for (a, path) in schedule.paths().iter().enumerate() {
            let Some(node) = path.get(time) else { continue };
            if let Some(cell) = board.get_mut(self.location_of(*node).as_index()) {
                *cell = agent_char(a, b'A').to_string();
            }
        }

        print(board)
    }
}
