//! Telling rails from rungs.
//!
//! A rung crosses exactly two other paths (the two rails). Anything else is
//! a rail candidate.

use crate::geometry::{Point, Polyline, polyline_length, polylines_intersect};

/// Split subpath indices into `(rails, rungs)`.
///
/// - Two or fewer paths: all of them are rails.
/// - A path that touches or crosses exactly two others is a rung.
/// - If exactly two paths are not rungs, those are the rails. Otherwise
///   the two longest paths are taken as rails.
///
/// Both index lists are ascending, so rails keep their document order.
pub fn classify_rails_rungs(paths: &[Polyline]) -> (Vec<usize>, Vec<usize>) {
    if paths.len() <= 2 {
        return ((0..paths.len()).collect(), Vec::new());
    }

    let mut crossings = vec![0usize; paths.len()];
    for i in 0..paths.len() {
        for j in (i + 1)..paths.len() {
            if polylines_intersect(&paths[i], &paths[j]) {
                crossings[i] += 1;
                crossings[j] += 1;
            }
        }
    }

    let candidates: Vec<usize> = (0..paths.len()).filter(|&i| crossings[i] != 2).collect();

    let mut rails = if candidates.len() == 2 {
        candidates
    } else {
        // Ambiguous: two rungs crossing each other, or a rail touching only
        // one rung. Fall back to length.
        let mut by_length: Vec<usize> = (0..paths.len()).collect();
        by_length.sort_by(|&a, &b| polyline_length(&paths[b]).total_cmp(&polyline_length(&paths[a])));
        by_length.truncate(2);
        by_length
    };
    rails.sort_unstable();

    let rungs = (0..paths.len()).filter(|i| !rails.contains(i)).collect();
    (rails, rungs)
}

/// Rungs for a column without any: one straight rung per shared node index.
///
/// With more than two nodes the endpoints are skipped (the rails' ends
/// already bound the column); with exactly two, the start pair is used.
pub fn synthesize_rungs(rail0: &[Point], rail1: &[Point]) -> Vec<Polyline> {
    fn interior(nodes: &[Point]) -> &[Point] {
        match nodes.len() {
            0 | 1 => &[],
            2 => &nodes[..1],
            n => &nodes[1..n - 1],
        }
    }

    interior(rail0)
        .iter()
        .zip(interior(rail1))
        .map(|(&a, &b)| vec![a, b])
        .collect()
}
