//! Auto-routing: one continuous sewing order for many regions.
//!
//! Each region (a satin column or a running-stitch path) becomes one or more
//! sewn edges in a [`RoutingGraph`]. Jumps are added until everything is
//! reachable, then a single walk is planned that sews every edge, retracing
//! already-sewn edges ("underpathing") instead of jumping where it can.
//!
//! ```text
//!   regions ──> graph ──> + jumps ──> walk ──> steps
//! ```

mod graph;
mod jumps;
mod traverse;

pub use graph::{EdgeId, EdgeKind, NodeId, NodeKey, Region, RouteEdge, RouteNode, RoutingGraph};
pub use jumps::{add_jumps, is_connected};
pub use traverse::{Traversal, find_path, select_endpoints};

use serde::Serialize;
use tracing::info;

use crate::geometry::Point;

/// One edge of the route, travelled in one direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EdgeTraversal {
    pub from: Point,
    pub to: Point,
    pub edge: EdgeId,
    pub kind: EdgeKind,
    /// Travelled from the edge's end back to its start.
    pub reversed: bool,
}

/// Plan a route through `regions`.
///
/// With `preserve_order`, regions are visited in the order given; otherwise
/// the order is whatever keeps jumps shortest. `start` and `end` pin the
/// route's ends to the nearest nodes; when absent, the route runs from the
/// leftmost node to the rightmost.
pub fn build_route(
    regions: &[Region],
    preserve_order: bool,
    start: Option<Point>,
    end: Option<Point>,
) -> Vec<EdgeTraversal> {
    let mut graph = RoutingGraph::from_regions(regions, preserve_order);
    let jumps = add_jumps(&mut graph, regions.len(), preserve_order);

    let Some((start, end)) = select_endpoints(&graph, regions.len(), preserve_order, start, end) else {
        return Vec::new();
    };

    let route: Vec<EdgeTraversal> = find_path(&graph, start, end)
        .into_iter()
        .map(|t| {
            let edge = graph.edge(t.edge);
            EdgeTraversal {
                from: graph.point(t.from),
                to: graph.point(t.to),
                edge: t.edge,
                kind: edge.kind,
                reversed: t.from != edge.a,
            }
        })
        .collect();

    let jump_length: f64 = route.iter().filter(|t| t.kind == EdgeKind::Jump).map(|t| t.from.distance(t.to)).sum();
    info!(
        "routed {} region(s): {} node(s), {} jump edge(s) added, {} traversal(s), jump length {:.2}",
        regions.len(),
        graph.node_count(),
        jumps,
        route.len(),
        jump_length
    );

    route
}

/// What to do at each step of a route.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "step")]
pub enum RouteStep {
    /// Sew this edge of `region` for the first time.
    Sew { region: usize, edge: EdgeId, reversed: bool },
    /// Travel over an already-sewn edge of `region`.
    Underpath { region: usize, edge: EdgeId, from: Point, to: Point },
    Jump { from: Point, to: Point },
}

/// Turn edge traversals into sewing instructions.
///
/// The first traversal of a sewn edge sews it; later ones run underneath.
/// Zero-length jumps are dropped.
pub fn route_steps(route: &[EdgeTraversal]) -> Vec<RouteStep> {
    let mut sewn: Vec<EdgeId> = Vec::new();
    let mut steps = Vec::with_capacity(route.len());

    for t in route {
        match t.kind {
            EdgeKind::Jump => {
                if t.from.distance(t.to) > 0.0 {
                    steps.push(RouteStep::Jump { from: t.from, to: t.to });
                }
            }
            EdgeKind::Sewn { region } => {
                if sewn.contains(&t.edge) {
                    steps.push(RouteStep::Underpath { region, edge: t.edge, from: t.from, to: t.to });
                } else {
                    sewn.push(t.edge);
                    steps.push(RouteStep::Sew { region, edge: t.edge, reversed: t.reversed });
                }
            }
        }
    }

    steps
}

// ============================================================================
// TESTS
// ============================================================================
