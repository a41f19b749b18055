//! The routing graph: an arena of nodes and edges.
//!
//! Nodes are entry/exit points of sewn regions, deduplicated by a rounded
//! integer key so that the end of one region and the start of the next
//! become the same node even if their coordinates differ in the last bits.
//! Edges either belong to a region (sewn) or are jumps added later.
//!
//! Multiple edges between the same pair of nodes are allowed: two satins
//! that share both endpoints are two edges, and both must be sewn.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Polyline};
use crate::satin::SatinColumn;

pub type NodeId = usize;
pub type EdgeId = usize;

/// Node identity: coordinates rounded to micro-units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey {
    x: i64,
    y: i64,
}

impl NodeKey {
    const SCALE: f64 = 1e6;

    pub fn from_point(p: Point) -> Self {
        Self {
            x: (p.x * Self::SCALE).round() as i64,
            y: (p.y * Self::SCALE).round() as i64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteNode {
    pub key: NodeKey,
    pub point: Point,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum EdgeKind {
    /// Part of region `region` (index into the input list).
    Sewn { region: usize },
    Jump,
}

/// An edge from `a` to `b`. Sewn edges point the way their region was
/// drawn; jumps point the way they must be travelled when order matters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteEdge {
    pub a: NodeId,
    pub b: NodeId,
    pub kind: EdgeKind,
    pub length: f64,
}

impl RouteEdge {
    pub fn is_jump(&self) -> bool {
        self.kind == EdgeKind::Jump
    }

    pub fn region(&self) -> Option<usize> {
        match self.kind {
            EdgeKind::Sewn { region } => Some(region),
            EdgeKind::Jump => None,
        }
    }

    /// The end that isn't `node`.
    pub fn other(&self, node: NodeId) -> NodeId {
        if self.a == node { self.b } else { self.a }
    }
}

/// A sewable region as the router sees it: a set of segments to cover.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub segments: Vec<(Point, Point)>,
}

impl Region {
    /// One edge per segment of a running-stitch path.
    ///
    /// A path that never moves (a single point, or every point the same)
    /// still needs sewing there, so it becomes one zero-length segment.
    pub fn from_polyline(points: &[Point]) -> Self {
        let segments: Vec<(Point, Point)> = points
            .windows(2)
            .filter(|w| w[0].distance(w[1]) > 0.0)
            .map(|w| (w[0], w[1]))
            .collect();
        match points.first() {
            Some(&p) if segments.is_empty() => Self { segments: vec![(p, p)] },
            _ => Self { segments },
        }
    }

    /// A satin is sewn start to finish in one go: one edge from the middle
    /// of its rail starts to the middle of its rail ends.
    ///
    /// A closed column (a ring) starts where it ends, so its edge is a loop.
    pub fn from_satin(column: &SatinColumn) -> Option<Self> {
        let rails = column.flattened_rails();
        let [rail0, rail1] = rails.as_slice() else {
            return None;
        };
        let start = rail0.first()?.midpoint(*rail1.first()?);
        let end = rail0.last()?.midpoint(*rail1.last()?);
        Some(Self { segments: vec![(start, end)] })
    }

    pub fn start(&self) -> Option<Point> {
        self.segments.first().map(|s| s.0)
    }

    pub fn end(&self) -> Option<Point> {
        self.segments.last().map(|s| s.1)
    }

    pub fn length(&self) -> f64 {
        self.segments.iter().map(|(a, b)| a.distance(*b)).sum()
    }
}

impl From<&Polyline> for Region {
    fn from(points: &Polyline) -> Self {
        Region::from_polyline(points)
    }
}

/// Nodes, edges and a key index.
#[derive(Debug, Clone, Default)]
pub struct RoutingGraph {
    nodes: Vec<RouteNode>,
    edges: Vec<RouteEdge>,
    index: HashMap<NodeKey, NodeId>,
    /// Order-preserving mode: jumps may only be taken `a` to `b`.
    pub directed: bool,
}

impl RoutingGraph {
    pub fn new(directed: bool) -> Self {
        Self { directed, ..Default::default() }
    }

    /// One sewn edge per region segment.
    ///
    /// A segment whose ends snap to the same node is kept as a loop on that
    /// node; the walk sews it when it gets there.
    pub fn from_regions(regions: &[Region], directed: bool) -> Self {
        let mut graph = Self::new(directed);
        for (i, region) in regions.iter().enumerate() {
            for &(start, end) in &region.segments {
                let a = graph.add_node(start);
                let b = graph.add_node(end);
                graph.add_edge(a, b, EdgeKind::Sewn { region: i });
            }
        }
        graph
    }

    /// The node at `point`, creating it if no node has the same key.
    pub fn add_node(&mut self, point: Point) -> NodeId {
        let key = NodeKey::from_point(point);
        if let Some(&id) = self.index.get(&key) {
            return id;
        }
        let id = self.nodes.len();
        self.nodes.push(RouteNode { key, point });
        self.index.insert(key, id);
        id
    }

    pub fn add_edge(&mut self, a: NodeId, b: NodeId, kind: EdgeKind) -> EdgeId {
        let length = self.nodes[a].point.distance(self.nodes[b].point);
        self.edges.push(RouteEdge { a, b, kind, length });
        self.edges.len() - 1
    }

    pub fn find_node(&self, point: Point) -> Option<NodeId> {
        self.index.get(&NodeKey::from_point(point)).copied()
    }

    pub fn node(&self, id: NodeId) -> &RouteNode {
        &self.nodes[id]
    }

    pub fn point(&self, id: NodeId) -> Point {
        self.nodes[id].point
    }

    pub fn edge(&self, id: EdgeId) -> &RouteEdge {
        &self.edges[id]
    }

    pub fn nodes(&self) -> &[RouteNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[RouteEdge] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn jump_edges(&self) -> impl Iterator<Item = &RouteEdge> {
        self.edges.iter().filter(|e| e.is_jump())
    }

    /// Is there any edge (either direction) between `a` and `b`?
    pub fn has_edge_between(&self, a: NodeId, b: NodeId) -> bool {
        self.edges
            .iter()
            .any(|e| (e.a == a && e.b == b) || (e.a == b && e.b == a))
    }

    /// Every node touched by a sewn edge of `region`, ascending.
    pub fn nodes_on_region(&self, region: usize) -> Vec<NodeId> {
        let mut nodes: Vec<NodeId> = self
            .edges
            .iter()
            .filter(|e| e.region() == Some(region))
            .flat_map(|e| [e.a, e.b])
            .collect();
        nodes.sort_unstable();
        nodes.dedup();
        nodes
    }

    /// Total length of sewn edges.
    pub fn sewn_length(&self) -> f64 {
        self.edges.iter().filter(|e| !e.is_jump()).map(|e| e.length).sum()
    }
}
