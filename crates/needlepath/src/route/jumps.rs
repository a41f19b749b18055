//! Jump augmentation: make the routing graph connected.
//!
//! ## Rust Lesson #27: Union-Find
//!
//! Kruskal's algorithm builds a minimum spanning tree by taking candidate
//! edges shortest-first and keeping an edge only if it joins two different
//! components. `petgraph::unionfind::UnionFind` answers "same component?"
//! in near-constant time, which is all Kruskal needs.

use petgraph::unionfind::UnionFind;
use tracing::debug;

use super::graph::{EdgeKind, NodeId, RoutingGraph};

/// Add the jumps needed to reach every region.
///
/// - `preserve_order`: one directed jump from each region to the next, between
///   their closest pair of nodes. With no empty regions that is exactly
///   `region_count - 1` jumps; a pair of regions sharing a node gets a
///   zero-length jump.
/// - Otherwise: the cheapest set of jumps (by total length) that connects
///   every node, chosen among all node pairs not already joined.
///
/// Returns the number of jumps added.
pub fn add_jumps(graph: &mut RoutingGraph, region_count: usize, preserve_order: bool) -> usize {
    let added = if preserve_order {
        add_ordered_jumps(graph, region_count)
    } else {
        add_minimal_jumps(graph)
    };
    debug!("added {} jump(s), preserve_order={}", added, preserve_order);
    added
}

fn add_ordered_jumps(graph: &mut RoutingGraph, region_count: usize) -> usize {
    let mut added = 0;
    let mut previous: Option<Vec<NodeId>> = None;

    for region in 0..region_count {
        let to = graph.nodes_on_region(region);
        // A region with nothing in it is passed over; the jump goes on to the next.
        if to.is_empty() {
            continue;
        }

        if let Some(from) = previous.as_deref() {
            let mut best: Option<(f64, NodeId, NodeId)> = None;
            for &a in from {
                for &b in &to {
                    let d = graph.point(a).distance(graph.point(b));
                    if best.is_none_or(|(best_d, _, _)| d < best_d) {
                        best = Some((d, a, b));
                    }
                }
            }
            if let Some((_, a, b)) = best {
                graph.add_edge(a, b, EdgeKind::Jump);
                added += 1;
            }
        }
        previous = Some(to);
    }

    added
}

/// Minimum-weight connectivity augmentation (Kruskal over components).
fn add_minimal_jumps(graph: &mut RoutingGraph) -> usize {
    let n = graph.node_count();
    if n < 2 {
        return 0;
    }

    let mut uf = UnionFind::<usize>::new(n);
    for edge in graph.edges() {
        uf.union(edge.a, edge.b);
    }

    // Every pair not already joined by an edge is a candidate jump.
    let mut candidates: Vec<(f64, NodeId, NodeId)> = Vec::new();
    for a in 0..n {
        for b in (a + 1)..n {
            if !uf.equiv(a, b) {
                candidates.push((graph.point(a).distance(graph.point(b)), a, b));
            }
        }
    }
    candidates.sort_by(|x, y| x.0.total_cmp(&y.0));

    let mut added = 0;
    for (_, a, b) in candidates {
        let ra = uf.find_mut(a);
        let rb = uf.find_mut(b);
        if ra != rb {
            uf.union(ra, rb);
            graph.add_edge(a, b, EdgeKind::Jump);
            added += 1;
        }
    }

    added
}

/// Can every node reach every other, ignoring direction?
pub fn is_connected(graph: &RoutingGraph) -> bool {
    let n = graph.node_count();
    if n == 0 {
        return true;
    }
    let mut uf = UnionFind::<usize>::new(n);
    for edge in graph.edges() {
        uf.union(edge.a, edge.b);
    }
    (1..n).all(|i| uf.equiv(0, i))
}
