//! Planning one walk that sews every edge.
//!
//! Two steps:
//!
//! 1. Find the shortest path from the start node to the end node and take
//!    its edges out of a working copy of the graph.
//! 2. Walk that path node by node. At each node, explore whatever is still
//!    hanging off it depth-first. Every newly reached edge is sewn on the way
//!    out and travelled again on the way back, which is what lets a branch be
//!    both reached and escaped ("underpathing").
//!
//! Loops (a closed satin, a region that is a single point) hang off one node
//! and are sewn in place the first time the walk reaches that node.
//!
//! ## Rust Lesson #28: Owned working copies
//!
//! Removing edges from a graph while iterating over it is asking for trouble.
//! Instead, the DFS for each node runs to completion on an immutable view and
//! records its events; only then are the events replayed, flipping entries
//! in a `removed: Vec<bool>` owned by the working copy.

use petgraph::algo::astar;
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::{debug, warn};

use super::graph::{EdgeId, NodeId, RoutingGraph};
use crate::geometry::Point;

/// One edge travelled in one direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Traversal {
    pub from: NodeId,
    pub to: NodeId,
    pub edge: EdgeId,
}

/// Which end to pick when no point is given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Extreme {
    Leftmost,
    Rightmost,
}

/// Choose the start and end nodes.
///
/// With an explicit point, the nearest node wins. Without one, the start is
/// the leftmost node and the end the rightmost. When order is preserved, the
/// start is restricted to the first region's nodes and the end to the last
/// region's.
pub fn select_endpoints(
    graph: &RoutingGraph,
    region_count: usize,
    preserve_order: bool,
    start: Option<Point>,
    end: Option<Point>,
) -> Option<(NodeId, NodeId)> {
    let all: Vec<NodeId> = (0..graph.node_count()).collect();
    let candidates = |region: usize| {
        if preserve_order {
            let nodes = graph.nodes_on_region(region);
            if !nodes.is_empty() {
                return nodes;
            }
        }
        all.clone()
    };

    let first = candidates(0);
    let last = candidates(region_count.saturating_sub(1));
    let start = find_node(graph, &first, start, Extreme::Leftmost)?;
    let end = find_node(graph, &last, end, Extreme::Rightmost)?;
    Some((start, end))
}

fn find_node(graph: &RoutingGraph, nodes: &[NodeId], point: Option<Point>, extreme: Extreme) -> Option<NodeId> {
    let x = |n: &NodeId| graph.point(*n).x;
    // min_by keeps the first of equal elements, so ties go to the lower id.
    match (point, extreme) {
        (Some(target), _) => nodes.iter().copied().min_by(|a, b| {
            graph.point(*a).distance(target).total_cmp(&graph.point(*b).distance(target))
        }),
        (None, Extreme::Leftmost) => nodes.iter().copied().min_by(|a, b| x(a).total_cmp(&x(b))),
        (None, Extreme::Rightmost) => nodes.iter().copied().min_by(|a, b| x(b).total_cmp(&x(a))),
    }
}

/// Shortest node path from `start` to `end`, by Euclidean edge length.
///
/// Weighting by length rather than hop count keeps the main path off long
/// jumps when a chain of short sewn edges reaches the same node. Everything
/// not on the main path is still sewn by the branch search, so only the
/// amount of underpathing changes, never coverage.
///
/// Sewn edges can be travelled either way. Jumps too, unless the graph is
/// directed, in which case they only go `a` to `b`.
fn shortest_path(graph: &RoutingGraph, start: NodeId, end: NodeId) -> Option<Vec<NodeId>> {
    let mut search: DiGraph<(), f64> = DiGraph::with_capacity(graph.node_count(), graph.edges().len() * 2);
    for _ in 0..graph.node_count() {
        search.add_node(());
    }
    for edge in graph.edges() {
        let (a, b) = (NodeIndex::new(edge.a), NodeIndex::new(edge.b));
        search.add_edge(a, b, edge.length);
        if !(graph.directed && edge.is_jump()) {
            search.add_edge(b, a, edge.length);
        }
    }

    let goal = NodeIndex::new(end);
    let goal_point = graph.point(end);
    let (_, path) = astar(
        &search,
        NodeIndex::new(start),
        |n| n == goal,
        |e| *e.weight(),
        // Straight-line distance never overestimates.
        |n| graph.point(n.index()).distance(goal_point),
    )?;
    Some(path.into_iter().map(|n| n.index()).collect())
}

/// The shortest edge that can carry us from `from` to `to`.
fn edge_between(graph: &RoutingGraph, from: NodeId, to: NodeId) -> Option<EdgeId> {
    graph
        .edges()
        .iter()
        .enumerate()
        .filter(|(_, e)| {
            (e.a == from && e.b == to) || (e.a == to && e.b == from && !(graph.directed && e.is_jump()))
        })
        .min_by(|(_, x), (_, y)| x.length.total_cmp(&y.length))
        .map(|(id, _)| id)
}

/// The graph with some edges already used up.
///
/// Direction is dropped here: once the main path is fixed, branches are
/// explored both ways.
struct WorkingGraph<'a> {
    graph: &'a RoutingGraph,
    adjacency: Vec<Vec<EdgeId>>,
    /// Sewn loops per node. They lead nowhere, so the search never sees them.
    loops: Vec<Vec<EdgeId>>,
    removed: Vec<bool>,
}

impl<'a> WorkingGraph<'a> {
    fn new(graph: &'a RoutingGraph) -> Self {
        let mut adjacency = vec![Vec::new(); graph.node_count()];
        let mut loops = vec![Vec::new(); graph.node_count()];
        for (id, edge) in graph.edges().iter().enumerate() {
            if edge.a != edge.b {
                adjacency[edge.a].push(id);
                adjacency[edge.b].push(id);
            } else if !edge.is_jump() {
                loops[edge.a].push(id);
            }
        }
        Self { graph, adjacency, loops, removed: vec![false; graph.edges().len()] }
    }

    /// Sew whatever loops are still waiting at `node`.
    fn take_loops(&mut self, node: NodeId, result: &mut Vec<Traversal>) {
        for i in 0..self.loops[node].len() {
            let edge = self.loops[node][i];
            if !self.removed[edge] {
                self.removed[edge] = true;
                result.push(Traversal { from: node, to: node, edge });
            }
        }
    }

    fn remove(&mut self, edge: EdgeId) {
        self.removed[edge] = true;
    }

    fn contains(&self, edge: EdgeId) -> bool {
        !self.removed[edge]
    }

    fn incident(&self, node: NodeId) -> Vec<EdgeId> {
        self.adjacency[node].iter().copied().filter(|&e| self.contains(e)).collect()
    }

    fn remaining(&self) -> usize {
        self.removed.iter().filter(|r| !**r).count()
    }

    /// Depth-first search from `source`, reported as labelled edges.
    fn dfs_events(&self, source: NodeId) -> Vec<DfsEvent> {
        struct Frame {
            node: NodeId,
            edges: Vec<EdgeId>,
            cursor: usize,
            edge_in: Option<EdgeId>,
        }

        let mut events = Vec::new();
        let mut visited = vec![false; self.graph.node_count()];
        visited[source] = true;
        let mut stack = vec![Frame { node: source, edges: self.incident(source), cursor: 0, edge_in: None }];

        while let Some(frame) = stack.last_mut() {
            if let Some(&edge) = frame.edges.get(frame.cursor) {
                frame.cursor += 1;
                if Some(edge) == frame.edge_in {
                    continue;
                }
                let node = frame.node;
                let child = self.graph.edge(edge).other(node);
                if visited[child] {
                    events.push(DfsEvent::NonTree { from: node, to: child, edge });
                } else {
                    visited[child] = true;
                    events.push(DfsEvent::Forward { from: node, to: child, edge });
                    stack.push(Frame { node: child, edges: self.incident(child), cursor: 0, edge_in: Some(edge) });
                }
            } else {
                let Some(done) = stack.pop() else { break };
                if let (Some(edge), Some(parent)) = (done.edge_in, stack.last()) {
                    events.push(DfsEvent::Reverse { from: parent.node, to: done.node, edge });
                }
            }
        }

        events
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DfsEvent {
    /// First time `to` is reached.
    Forward { from: NodeId, to: NodeId, edge: EdgeId },
    /// Backing out of `to` once it's exhausted.
    Reverse { from: NodeId, to: NodeId, edge: EdgeId },
    /// An edge into a node we've already seen.
    NonTree { from: NodeId, to: NodeId, edge: EdgeId },
}

/// A walk from `start` to `end` that travels every edge at least once.
///
/// If the end can't be reached (only possible on a graph that wasn't
/// augmented) the walk still covers everything reachable from the start.
pub fn find_path(graph: &RoutingGraph, start: NodeId, end: NodeId) -> Vec<Traversal> {
    let path = shortest_path(graph, start, end).unwrap_or_else(|| {
        warn!("no path from node {} to node {}, routing from the start only", start, end);
        vec![start]
    });
    debug!("main path has {} node(s)", path.len());

    let mut work = WorkingGraph::new(graph);
    let mut path_edges = Vec::with_capacity(path.len().saturating_sub(1));
    for pair in path.windows(2) {
        if let Some(edge) = edge_between(graph, pair[0], pair[1]) {
            work.remove(edge);
            path_edges.push(Traversal { from: pair[0], to: pair[1], edge });
        }
    }

    let mut result = Vec::with_capacity(graph.edges().len() * 2);
    for (i, &node) in path.iter().enumerate() {
        if i > 0 {
            if let Some(&step) = path_edges.get(i - 1) {
                result.push(step);
            }
        }
        work.take_loops(node, &mut result);

        for event in work.dfs_events(node) {
            match event {
                DfsEvent::Forward { from, to, edge } => {
                    result.push(Traversal { from, to, edge });
                    work.remove(edge);
                    work.take_loops(to, &mut result);
                }
                DfsEvent::Reverse { from, to, edge } => {
                    result.push(Traversal { from: to, to: from, edge });
                }
                DfsEvent::NonTree { from, to, edge } => {
                    // The same edge shows up from both of its ends.
                    if work.contains(edge) {
                        result.push(Traversal { from, to, edge });
                        result.push(Traversal { from: to, to: from, edge });
                        work.remove(edge);
                    }
                }
            }
        }
    }

    let left = (0..graph.edges().len())
        .filter(|&e| work.contains(e) && !(graph.edge(e).is_jump() && graph.edge(e).a == graph.edge(e).b))
        .count();
    if left > 0 {
        warn!("{} edge(s) could not be reached from node {}", left, start);
    }
    debug!("{} traversal(s), {} edge(s) left in working graph", result.len(), work.remaining());

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::graph::{EdgeKind, Region};

    fn line(points: &[(f64, f64)]) -> Region {
        let points: Vec<Point> = points.iter().map(|&(x, y)| Point::new(x, y)).collect();
        Region::from_polyline(&points)
    }

    fn assert_covers_sewn_edges(graph: &RoutingGraph, walk: &[Traversal]) {
        for (id, edge) in graph.edges().iter().enumerate() {
            if let EdgeKind::Sewn { .. } = edge.kind {
                assert!(walk.iter().any(|t| t.edge == id), "edge {} never travelled", id);
            }
        }
    }

    fn assert_continuous(walk: &[Traversal]) {
        for pair in walk.windows(2) {
            assert_eq!(pair[0].to, pair[1].from);
        }
    }

    #[test]
    fn y_shape_underpaths_the_side_branch() {
        let regions = vec![
            line(&[(0.0, 0.0), (5.0, 0.0)]),
            line(&[(5.0, 0.0), (10.0, 5.0)]),
            line(&[(5.0, 0.0), (10.0, -5.0)]),
        ];
        let graph = RoutingGraph::from_regions(&regions, false);
        let (start, end) = select_endpoints(&graph, regions.len(), false, None, None).unwrap();
        assert_eq!(graph.point(start), Point::new(0.0, 0.0));
        assert_eq!(graph.point(end), Point::new(10.0, 5.0));

        let walk = find_path(&graph, start, end);
        let edges: Vec<EdgeId> = walk.iter().map(|t| t.edge).collect();
        assert_eq!(edges, vec![0, 2, 2, 1]);
        assert_continuous(&walk);
        assert_eq!(walk.last().unwrap().to, end);
    }

    #[test]
    fn loop_off_the_main_path_is_sewn_there_and_back() {
        let regions = vec![
            line(&[(0.0, 0.0), (5.0, 0.0), (10.0, 0.0)]),
            line(&[(5.0, 0.0), (5.0, 5.0), (8.0, 5.0), (5.0, 0.0)]),
        ];
        let graph = RoutingGraph::from_regions(&regions, false);
        let start = graph.find_node(Point::new(0.0, 0.0)).unwrap();
        let end = graph.find_node(Point::new(10.0, 0.0)).unwrap();

        let walk = find_path(&graph, start, end);
        assert_covers_sewn_edges(&graph, &walk);
        assert_continuous(&walk);
        assert_eq!(walk[0].from, start);
        assert_eq!(walk.last().unwrap().to, end);

        // The closing edge of the loop is met from a visited node: down and back.
        let closing = graph.edges().len() - 1;
        assert_eq!(walk.iter().filter(|t| t.edge == closing).count(), 2);
    }

    #[test]
    fn explicit_points_pick_nearest_nodes() {
        let regions = vec![line(&[(0.0, 0.0), (10.0, 0.0), (20.0, 0.0)])];
        let graph = RoutingGraph::from_regions(&regions, false);
        let (start, end) =
            select_endpoints(&graph, 1, false, Some(Point::new(11.0, 1.0)), Some(Point::new(-3.0, 0.0))).unwrap();
        assert_eq!(graph.point(start), Point::new(10.0, 0.0));
        assert_eq!(graph.point(end), Point::new(0.0, 0.0));

        let walk = find_path(&graph, start, end);
        assert_covers_sewn_edges(&graph, &walk);
        assert_continuous(&walk);
    }

    #[test]
    fn directed_jumps_are_not_taken_backwards() {
        let regions = vec![line(&[(10.0, 0.0), (20.0, 0.0)]), line(&[(0.0, 0.0), (5.0, 0.0)])];
        let mut graph = RoutingGraph::from_regions(&regions, true);
        let (a, b) = (graph.find_node(Point::new(10.0, 0.0)).unwrap(), graph.find_node(Point::new(5.0, 0.0)).unwrap());
        graph.add_edge(a, b, EdgeKind::Jump);

        assert!(shortest_path(&graph, a, b).is_some());
        assert!(shortest_path(&graph, b, a).is_none());
    }

    #[test]
    fn unreachable_end_still_covers_start_component() {
        let regions = vec![line(&[(0.0, 0.0), (5.0, 0.0)]), line(&[(10.0, 0.0), (15.0, 0.0)])];
        let graph = RoutingGraph::from_regions(&regions, false);
        let walk = find_path(&graph, 0, 3);
        assert_eq!(walk.iter().map(|t| t.edge).collect::<Vec<_>>(), vec![0, 0]);
    }

    #[test]
    fn loops_are_sewn_where_they_hang() {
        let regions = vec![
            line(&[(0.0, 0.0), (5.0, 0.0)]),
            line(&[(5.0, 0.0), (5.0, 0.0)]),
            line(&[(5.0, 0.0), (10.0, 0.0)]),
        ];
        let graph = RoutingGraph::from_regions(&regions, false);
        let (start, end) = select_endpoints(&graph, regions.len(), false, None, None).unwrap();

        let walk = find_path(&graph, start, end);
        assert_eq!(walk.iter().map(|t| t.edge).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(walk[1].from, walk[1].to);
        assert_continuous(&walk);
        assert_covers_sewn_edges(&graph, &walk);
    }

    #[test]
    fn loop_off_the_main_path_is_reached_by_the_branch_search() {
        let regions = vec![
            line(&[(0.0, 0.0), (10.0, 0.0)]),
            line(&[(5.0, 0.0), (5.0, 5.0)]),
            line(&[(5.0, 5.0)]),
        ];
        let mut graph = RoutingGraph::from_regions(&regions, false);
        // The branch starts mid-segment, so join it the way jumps would.
        let (a, b) = (graph.find_node(Point::new(0.0, 0.0)).unwrap(), graph.find_node(Point::new(5.0, 0.0)).unwrap());
        graph.add_edge(a, b, EdgeKind::Jump);

        let walk = find_path(&graph, a, graph.find_node(Point::new(10.0, 0.0)).unwrap());
        assert_covers_sewn_edges(&graph, &walk);
        assert_continuous(&walk);
    }

    #[test]
    fn empty_graph_has_no_endpoints() {
        assert!(select_endpoints(&RoutingGraph::new(false), 0, false, None, None).is_none());
    }
}
