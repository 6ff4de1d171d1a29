/// Cone walker.
///
/// Breadth-first worklist traversal over the two-parent DAG, in either
/// direction. Order contract:
///   - every node is visited at most once per walk
///   - nodes are visited in non-decreasing distance from the start
///   - past direction expands trunk before branch
///   - future direction expands approvers in the order they were indexed
///
/// The walker is pull-based so callers can mutate the graph between
/// visits (confirmation propagation marks vertices while walking).

use std::collections::{HashSet, VecDeque};

use crate::keys::VertexKey;

/// Walk direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Toward approvers: vertices whose trunk or branch is the current one.
    Future,
    /// Toward approvees: the current vertex's own trunk and branch.
    Past,
}

/// Visit decision for a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    Continue,
    /// Do not expand this node's neighbors.
    Prune,
}

/// A parent reference, pointing from approver to approvee.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Edge {
    pub from: VertexKey,
    pub to: VertexKey,
}

impl Edge {
    pub fn new(from: VertexKey, to: VertexKey) -> Self {
        Self { from, to }
    }
}

/// Adjacency the walker needs.
pub trait ConeGraph {
    fn contains_vertex(&self, key: &VertexKey) -> bool;

    /// Neighbor keys in `direction`. Past neighbors may be unknown keys.
    fn neighbors(&self, key: &VertexKey, direction: Direction) -> Vec<VertexKey>;
}

/// Totals of a finished walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkStats {
    pub visited: usize,
    pub edges: usize,
    /// The step budget ran out with nodes left in the queue.
    pub truncated: bool,
}

#[derive(Debug)]
pub struct ConeWalker {
    direction: Direction,
    seen: HashSet<VertexKey>,
    queue: VecDeque<VertexKey>,
    budget: Option<usize>,
    stats: WalkStats,
}

impl ConeWalker {
    /// Start a walk at `start`. A start that is not in the graph yields an
    /// empty walk.
    pub fn new<G: ConeGraph + ?Sized>(graph: &G, start: &VertexKey, direction: Direction) -> Self {
        let mut walker = Self {
            direction,
            seen: HashSet::new(),
            queue: VecDeque::new(),
            budget: None,
            stats: WalkStats::default(),
        };
        if graph.contains_vertex(start) {
            walker.seen.insert(start.clone());
            walker.queue.push_back(start.clone());
        }
        walker
    }

    /// Stop after `steps` visited nodes.
    pub fn with_budget(mut self, steps: usize) -> Self {
        self.budget = Some(steps);
        self
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Next node to visit, or `None` when the walk is done.
    pub fn next_node(&mut self) -> Option<VertexKey> {
        if let Some(budget) = self.budget {
            if self.stats.visited >= budget {
                self.stats.truncated = !self.queue.is_empty();
                return None;
            }
        }
        let key = self.queue.pop_front()?;
        self.stats.visited += 1;
        Some(key)
    }

    /// Enqueue the unseen neighbors of `key`, reporting every crossed edge
    /// to `on_edge`. Edges to keys outside the graph are reported but their
    /// targets are not visited.
    pub fn expand<G: ConeGraph + ?Sized>(
        &mut self,
        graph: &G,
        key: &VertexKey,
        mut on_edge: impl FnMut(&Edge),
    ) {
        for next in graph.neighbors(key, self.direction) {
            let edge = match self.direction {
                Direction::Past => Edge::new(key.clone(), next.clone()),
                Direction::Future => Edge::new(next.clone(), key.clone()),
            };
            on_edge(&edge);
            self.stats.edges += 1;
            if graph.contains_vertex(&next) && self.seen.insert(next.clone()) {
                self.queue.push_back(next);
            }
        }
    }

    pub fn stats(&self) -> WalkStats {
        self.stats
    }
}

/// Read-only walk driven by callbacks.
pub fn walk<G: ConeGraph + ?Sized>(
    graph: &G,
    start: &VertexKey,
    direction: Direction,
    mut visit: impl FnMut(&VertexKey) -> Visit,
    mut on_edge: impl FnMut(&Edge),
) -> WalkStats {
    drive(ConeWalker::new(graph, start, direction), graph, &mut visit, &mut on_edge)
}

/// [`walk`] that stops after `budget` visited nodes.
pub fn walk_bounded<G: ConeGraph + ?Sized>(
    graph: &G,
    start: &VertexKey,
    direction: Direction,
    budget: usize,
    mut visit: impl FnMut(&VertexKey) -> Visit,
    mut on_edge: impl FnMut(&Edge),
) -> WalkStats {
    let walker = ConeWalker::new(graph, start, direction).with_budget(budget);
    drive(walker, graph, &mut visit, &mut on_edge)
}

fn drive<G: ConeGraph + ?Sized>(
    mut walker: ConeWalker,
    graph: &G,
    visit: &mut impl FnMut(&VertexKey) -> Visit,
    on_edge: &mut impl FnMut(&Edge),
) -> WalkStats {
    while let Some(key) = walker.next_node() {
        if visit(&key) == Visit::Continue {
            walker.expand(graph, &key, &mut *on_edge);
        }
    }
    walker.stats()
}

/// Keys of the cone of `start` in visit order, start included.
pub fn cone<G: ConeGraph + ?Sized>(graph: &G, start: &VertexKey, direction: Direction) -> Vec<VertexKey> {
    let mut keys = Vec::new();
    walk(
        graph,
        start,
        direction,
        |key| {
            keys.push(key.clone());
            Visit::Continue
        },
        |_| {},
    );
    keys
}
