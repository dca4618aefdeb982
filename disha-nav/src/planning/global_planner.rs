//! Global grid planner over the vector map.
//!
//! Searches a uniform 2D lattice rooted at the start location with A*.
//! Edges are validated against the map with a corridor of clearance: the
//! center segment between node locations plus two "cushion" segments offset
//! sideways by the clearance distance must all be free of wall crossings.
//! Nodes are materialized lazily as the search expands, keyed by their
//! lattice index, and parents are stored by key so path reconstruction is a
//! plain map walk with no ownership cycles.
//!
//! The lattice is bounded by the map extent (grown to contain start and
//! goal), which keeps every search finite: a sealed-off goal exhausts the
//! frontier and yields the empty path instead of wandering an unbounded
//! plane.

use std::collections::HashMap;
use std::sync::Arc;

use rekha_map::{LineSegment2D, Point2D, VectorMap};

use super::frontier::Frontier;

/// Configuration for the global planner.
#[derive(Debug, Clone, Copy)]
pub struct GlobalPlannerConfig {
    /// Lattice resolution: distance between adjacent nodes (meters).
    pub resolution: f32,

    /// Sideways clearance for edge validation (meters).
    ///
    /// Car half-width plus a safety margin; each candidate edge is tested
    /// together with two parallel cushions at ±this offset.
    pub clearance_offset: f32,
}

impl Default for GlobalPlannerConfig {
    fn default() -> Self {
        Self {
            resolution: 0.25,
            clearance_offset: 0.25,
        }
    }
}

/// Descriptor of one lattice edge out of a node.
#[derive(Debug, Clone)]
pub struct Neighbor {
    /// Lattice index of the adjacent node.
    pub index: (i32, i32),
    /// Key of the adjacent node.
    pub key: String,
    /// Edge length: resolution for cardinal moves, resolution·√2 for
    /// diagonals.
    pub edge_length: f32,
    /// King-move offset that produced this neighbor.
    pub offset: (i32, i32),
}

/// One lattice node, materialized on first expansion.
#[derive(Debug, Clone)]
pub struct GridNode {
    /// Lattice index relative to the start node.
    pub index: (i32, i32),
    /// Location in map frame.
    pub loc: Point2D,
    /// Accumulated path cost from the start.
    pub cost: f32,
    /// Parent key on the best known path.
    pub parent: Option<String>,
    /// Valid neighbors, computed lazily on first expansion.
    pub neighbors: Option<Vec<Neighbor>>,
}

/// The eight king-move offsets.
const KING_MOVES: [(i32, i32); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];

/// Slack for the lattice bounds check, well below any sane resolution.
const BOUNDS_EPS: f32 = 1e-4;

/// A* planner on a lazily built lattice.
pub struct GlobalPlanner {
    config: GlobalPlannerConfig,
    map: Arc<VectorMap>,
    origin: Point2D,
    nav_map: HashMap<String, GridNode>,
}

impl GlobalPlanner {
    /// Create a planner over a shared map.
    pub fn new(config: GlobalPlannerConfig, map: Arc<VectorMap>) -> Self {
        Self {
            config,
            map,
            origin: Point2D::zero(),
            nav_map: HashMap::new(),
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &GlobalPlannerConfig {
        &self.config
    }

    /// The shared map the planner validates edges against.
    pub fn map(&self) -> &VectorMap {
        &self.map
    }

    /// Root the lattice at a new start location.
    ///
    /// Clears the node map; cached nodes are only valid within one start
    /// frame.
    pub fn initialize(&mut self, start: Point2D) {
        self.origin = start;
        self.nav_map.clear();
        self.nav_map.insert(
            Self::key_of(0, 0),
            GridNode {
                index: (0, 0),
                loc: start,
                cost: 0.0,
                parent: None,
                neighbors: None,
            },
        );
    }

    /// Location of a materialized node.
    pub fn node_location(&self, key: &str) -> Option<Point2D> {
        self.nav_map.get(key).map(|node| node.loc)
    }

    /// Resolve a key path into map-frame locations.
    pub fn path_locations(&self, keys: &[String]) -> Vec<Point2D> {
        keys.iter()
            .filter_map(|key| self.node_location(key))
            .collect()
    }

    /// Search for the shortest collision-free path to `goal`.
    ///
    /// Returns the node keys from the start to a node within one resolution
    /// of the goal, or an empty vector when no path exists.
    pub fn plan(&mut self, goal: Point2D) -> Vec<String> {
        if self.nav_map.is_empty() {
            log::warn!("plan requested before initialize");
            return Vec::new();
        }

        // Search state from a previous query is stale within this start
        // frame; neighbor validity additionally depends on the goal via
        // the lattice bounds, so it is recomputed per query too.
        for node in self.nav_map.values_mut() {
            node.cost = f32::INFINITY;
            node.parent = None;
            node.neighbors = None;
        }

        let start_key = Self::key_of(0, 0);
        let start_loc = match self.nav_map.get_mut(&start_key) {
            Some(node) => {
                node.cost = 0.0;
                node.loc
            }
            None => return Vec::new(),
        };
        let bounds = self.lattice_bounds(goal);

        let mut frontier = Frontier::new();
        frontier.push_or_update(&start_key, start_loc.distance(&goal));

        let mut expansions = 0usize;
        while let Some((current_key, _)) = frontier.pop() {
            expansions += 1;

            let (current_loc, current_cost) = {
                let node = &self.nav_map[&current_key];
                (node.loc, node.cost)
            };

            if current_loc.distance(&goal) <= self.config.resolution {
                let path = self.reconstruct(&current_key, &start_key);
                log::debug!(
                    "path found: {} waypoints after {} expansions",
                    path.len(),
                    expansions
                );
                return path;
            }

            let origin = self.origin;
            let resolution = self.config.resolution;
            for neighbor in self.visit_node(&current_key, bounds) {
                let tentative = current_cost + neighbor.edge_length;
                let node = self
                    .nav_map
                    .entry(neighbor.key.clone())
                    .or_insert_with(|| GridNode {
                        index: neighbor.index,
                        loc: origin
                            + Point2D::new(
                                neighbor.index.0 as f32 * resolution,
                                neighbor.index.1 as f32 * resolution,
                            ),
                        cost: f32::INFINITY,
                        parent: None,
                        neighbors: None,
                    });

                if tentative < node.cost {
                    node.cost = tentative;
                    node.parent = Some(current_key.clone());
                    let f_score = tentative + node.loc.distance(&goal);
                    frontier.push_or_update(&neighbor.key, f_score);
                }
            }
        }

        log::debug!("no path to goal after {} expansions", expansions);
        Vec::new()
    }

    /// Lattice bounds for one query: the map extent grown to contain the
    /// start and the goal.
    fn lattice_bounds(&self, goal: Point2D) -> (Point2D, Point2D) {
        let mut min = self.origin;
        let mut max = self.origin;
        let mut grow = |p: Point2D| {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        };
        grow(goal);
        for line in self.map.lines() {
            grow(line.start);
            grow(line.end);
        }
        (min, max)
    }

    /// Ensure a node's valid neighbors are computed, returning a copy.
    fn visit_node(&mut self, key: &str, bounds: (Point2D, Point2D)) -> Vec<Neighbor> {
        if let Some(neighbors) = self
            .nav_map
            .get(key)
            .and_then(|node| node.neighbors.clone())
        {
            return neighbors;
        }

        let (index, loc) = {
            let node = &self.nav_map[key];
            (node.index, node.loc)
        };
        let (min, max) = bounds;

        let mut neighbors = Vec::with_capacity(KING_MOVES.len());
        for offset in KING_MOVES {
            let n_index = (index.0 + offset.0, index.1 + offset.1);
            let n_loc = self.origin
                + Point2D::new(
                    n_index.0 as f32 * self.config.resolution,
                    n_index.1 as f32 * self.config.resolution,
                );

            let in_bounds = n_loc.x >= min.x - BOUNDS_EPS
                && n_loc.x <= max.x + BOUNDS_EPS
                && n_loc.y >= min.y - BOUNDS_EPS
                && n_loc.y <= max.y + BOUNDS_EPS;
            if !in_bounds || !self.is_edge_clear(loc, n_loc) {
                continue;
            }

            let edge_length = if offset.0 != 0 && offset.1 != 0 {
                self.config.resolution * std::f32::consts::SQRT_2
            } else {
                self.config.resolution
            };
            neighbors.push(Neighbor {
                index: n_index,
                key: Self::key_of(n_index.0, n_index.1),
                edge_length,
                offset,
            });
        }

        if let Some(node) = self.nav_map.get_mut(key) {
            node.neighbors = Some(neighbors.clone());
        }
        neighbors
    }

    /// Edge validity: the center segment and both cushion segments must be
    /// free of wall crossings.
    fn is_edge_clear(&self, from: Point2D, to: Point2D) -> bool {
        let edge = LineSegment2D::new(from, to);
        let (left, right) = match (
            edge.offset(self.config.clearance_offset),
            edge.offset(-self.config.clearance_offset),
        ) {
            (Some(left), Some(right)) => (left, right),
            // Degenerate edge: no defined corridor.
            _ => return false,
        };

        self.map.intersect(&edge).is_none()
            && self.map.intersect(&left).is_none()
            && self.map.intersect(&right).is_none()
    }

    /// Walk parent keys from `end` back to `start` and reverse.
    fn reconstruct(&self, end: &str, start: &str) -> Vec<String> {
        let mut path = vec![end.to_owned()];
        let mut current = end.to_owned();

        while current != start {
            match self.nav_map.get(&current).and_then(|n| n.parent.clone()) {
                Some(parent) => {
                    path.push(parent.clone());
                    current = parent;
                }
                None => break,
            }
        }

        path.reverse();
        path
    }

    fn key_of(i: i32, j: i32) -> String {
        format!("{}_{}", i, j)
    }
}
