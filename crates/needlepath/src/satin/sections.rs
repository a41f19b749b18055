//! Slicing the rails at each rung.

use crate::geometry::{Point, Polyline, cut_multiple, nearest_points, project};

/// One stretch of the column between consecutive rungs: the matching
/// pieces of rail 0 and rail 1.
#[derive(Debug, Clone, PartialEq)]
pub struct Section(pub Polyline, pub Polyline);

/// Cut both rails where each rung meets them.
///
/// A rung "meets" a rail at the rung point nearest to it, so a rung that
/// stops short of a rail still cuts it. Pieces where either rail came out
/// empty (two rungs at the same spot, a rung at a rail end) are dropped.
pub fn flattened_sections(rail0: &[Point], rail1: &[Point], rungs: &[Polyline]) -> Vec<Section> {
    let cut_rail = |rail: &[Point]| {
        let distances: Vec<f64> = rungs
            .iter()
            .map(|rung| {
                let (_, on_rail) = nearest_points(rung, rail);
                project(rail, on_rail)
            })
            .collect();
        cut_multiple(rail, &distances)
    };

    cut_rail(rail0)
        .into_iter()
        .zip(cut_rail(rail1))
        .filter_map(|pieces| match pieces {
            (Some(a), Some(b)) => Some(Section(a, b)),
            _ => None,
        })
        .collect()
}
