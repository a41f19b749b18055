//! Satin columns - two rails, optional rungs, zig-zag stitching between them.
//!
//! Imagine a satin column as a curvy ladder: the two long paths are the
//! rails and the cross-bars are the rungs. Rungs cut the rails into
//! [`Section`]s; stitches are plotted on both rails in lock-step through
//! each section and then arranged by one of the pattern generators.
//!
//! ```text
//!   rail 0  ──┬──────┬──────┬──
//!             │ rung │      │
//!   rail 1  ──┴──────┴──────┴──
//! ```

mod classify;
mod patterns;
mod plot;
mod sections;
mod split;
mod validate;

pub use classify::{classify_rails_rungs, synthesize_rungs};
pub use patterns::{
    do_center_walk, do_contour_underlay, do_e_stitch, do_satin, do_zigzag_underlay, split_points,
};
pub use plot::{offset_points, walk};
pub use sections::{Section, flattened_sections};
pub use split::SplitAt;
pub use validate::{ValidationError, ValidationWarning};

use crate::geometry::{Point, Polyline};
use crate::params::SatinParams;
use crate::stitch::StitchGroup;

/// One subpath of the host's curve data.
///
/// `nodes` are the curve's own vertices (Bézier endpoints); `points` is the
/// flattened polyline. For plain polylines the two are the same.
#[derive(Debug, Clone, PartialEq)]
pub struct Subpath {
    pub nodes: Vec<Point>,
    pub points: Polyline,
}

impl Subpath {
    pub fn new(nodes: Vec<Point>, points: Polyline) -> Self {
        Self { nodes, points }
    }

    /// A subpath that is already flat: its nodes are its points.
    pub fn from_points(points: Polyline) -> Self {
        Self { nodes: points.clone(), points }
    }

    pub fn reversed(&self) -> Subpath {
        let mut points = self.points.clone();
        points.reverse();
        Subpath::from_points(points)
    }
}

/// A satin column: two rails and zero or more rungs.
///
/// The subpaths may come in any order; which are rails and which are rungs
/// is decided by [`classify_rails_rungs`] when the column is built.
#[derive(Debug, Clone, PartialEq)]
pub struct SatinColumn {
    paths: Vec<Subpath>,
    rail_indices: Vec<usize>,
    rung_indices: Vec<usize>,
    swap_rails: bool,
}

impl SatinColumn {
    pub fn new(paths: Vec<Subpath>) -> Self {
        let flattened: Vec<Polyline> = paths.iter().map(|p| p.points.clone()).collect();
        let (rail_indices, rung_indices) = classify_rails_rungs(&flattened);
        Self { paths, rail_indices, rung_indices, swap_rails: false }
    }

    /// Build a column from flat polylines (rails and rungs in any order).
    pub fn from_polylines(polylines: Vec<Polyline>) -> Self {
        Self::new(polylines.into_iter().map(Subpath::from_points).collect())
    }

    /// Swap which rail is sewn first. Affects every sided parameter.
    pub fn with_swap_rails(mut self, swap: bool) -> Self {
        self.swap_rails = swap;
        self
    }

    pub fn paths(&self) -> &[Subpath] {
        &self.paths
    }

    pub fn rail_indices(&self) -> &[usize] {
        &self.rail_indices
    }

    /// True for an old-style column: exactly two paths and no rungs.
    pub fn is_legacy(&self) -> bool {
        self.paths.len() == 2
    }

    /// The rail subpaths, in sewing order.
    pub fn rail_paths(&self) -> Vec<&Subpath> {
        let mut rails: Vec<&Subpath> = self.rail_indices.iter().map(|&i| &self.paths[i]).collect();
        if rails.len() == 2 && self.swap_rails {
            rails.swap(0, 1);
        }
        rails
    }

    /// The flattened rails, in sewing order.
    pub fn flattened_rails(&self) -> Vec<Polyline> {
        self.rail_paths().into_iter().map(|p| p.points.clone()).collect()
    }

    /// The flattened rungs.
    ///
    /// A legacy column has no real rungs; its rails' shared node indices act
    /// as rungs, so those are synthesized here.
    pub fn flattened_rungs(&self) -> Vec<Polyline> {
        if self.is_legacy() {
            let rails = self.rail_paths();
            return synthesize_rungs(&rails[0].nodes, &rails[1].nodes);
        }
        self.rung_indices.iter().map(|&i| self.paths[i].points.clone()).collect()
    }

    /// The rail pair sliced at every rung.
    pub fn flattened_sections(&self) -> Vec<Section> {
        let rails = self.flattened_rails();
        if rails.len() < 2 {
            return Vec::new();
        }
        flattened_sections(&rails[0], &rails[1], &self.flattened_rungs())
    }

    /// A representative interior point, used to locate column-wide errors.
    pub fn centroid(&self) -> Point {
        let points: Vec<Point> = self.paths.iter().flat_map(|p| p.points.iter().copied()).collect();
        if points.is_empty() {
            return Point::default();
        }
        let (min, max) = points.iter().fold(
            (Point::new(f64::INFINITY, f64::INFINITY), Point::new(f64::NEG_INFINITY, f64::NEG_INFINITY)),
            |(min, max), p| {
                (Point::new(min.x.min(p.x), min.y.min(p.y)), Point::new(max.x.max(p.x), max.y.max(p.y)))
            },
        );
        min.midpoint(max)
    }

    /// Stitch this column: underlays first, then the top stitching, all in one group.
    ///
    /// Returns an empty vector if nothing could be plotted.
    pub fn to_stitch_groups(&self, params: &SatinParams) -> Vec<StitchGroup> {
        let mut group = StitchGroup::new(None);

        if params.center_walk_underlay {
            group.extend(do_center_walk(self, params));
        }
        if params.contour_underlay {
            group.extend(do_contour_underlay(self, params));
        }
        if params.zigzag_underlay {
            group.extend(do_zigzag_underlay(self, params));
        }
        if params.e_stitch {
            group.extend(do_e_stitch(self, params));
        } else {
            group.extend(do_satin(self, params));
        }

        if group.is_empty() {
            return Vec::new();
        }
        vec![group]
    }
}

/// Validate and stitch a satin column.
///
/// Only the first validation error is reported; warnings are not returned
/// here (see [`SatinColumn::validate`]).
pub fn synthesize(column: &SatinColumn, params: &SatinParams) -> Result<Vec<StitchGroup>, ValidationError> {
    column.validate()?;

    let groups = column.to_stitch_groups(params);
    if groups.is_empty() {
        return Err(ValidationError::NotStitchable { location: column.centroid() });
    }
    Ok(groups)
}


#[cfg(test)]
mod tests {
    use super::test_support::{ladder, plain_params};
    use super::*;
    use crate::params::PIXELS_PER_MM;

    #[test]
    fn ladder_satin_has_eleven_even_pairs() {
        let column = ladder(10.0, 2.0 * PIXELS_PER_MM);
        let groups = synthesize(&column, &plain_params(1.0)).unwrap();
        assert_eq!(groups.len(), 1);

        let points = groups[0].points();
        assert_eq!(points.len(), 22);

        for (i, pair) in points.chunks(2).enumerate() {
            assert!((pair[0].x - i as f64).abs() < 1e-6, "pair {} at {:?}", i, pair);
            assert!((pair[1].x - i as f64).abs() < 1e-6);
            assert!(pair[0].y.abs() < 1e-9);
            assert!((pair[1].y - 2.0 * PIXELS_PER_MM).abs() < 1e-9);
        }
    }

    #[test]
    fn swap_rails_starts_on_second_rail() {
        let column = ladder(10.0, 5.0).with_swap_rails(true);
        let groups = synthesize(&column, &plain_params(1.0)).unwrap();
        let first = groups[0].first_point().unwrap();
        assert!((first.y - 5.0).abs() < 1e-9);
    }

    #[test]
    fn underlays_come_before_satin() {
        let column = ladder(20.0, 6.0);
        let params = SatinParams {
            center_walk_underlay: true,
            contour_underlay: true,
            zigzag_underlay: true,
            ..plain_params(1.0)
        };
        let groups = synthesize(&column, &params).unwrap();
        let group = &groups[0];

        assert!(group.has_tag("satin_center_walk"));
        assert!(group.has_tag("satin_contour_underlay"));
        assert!(group.has_tag("satin_zigzag_underlay"));
        assert!(group.has_tag("satin_column_edge"));

        // Center walk starts in the middle of the column.
        let first = group.first_point().unwrap();
        assert!((first.y - 3.0).abs() < 1e-6);
    }

    #[test]
    fn too_few_paths_is_an_error() {
        let column = SatinColumn::from_polylines(vec![vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)]]);
        let err = synthesize(&column, &plain_params(1.0)).unwrap_err();
        assert!(matches!(err, ValidationError::TooFewPaths { .. }));
    }

    #[test]
    fn zero_length_column_is_not_stitchable() {
        let p = Point::new(3.0, 3.0);
        let column = SatinColumn::from_polylines(vec![vec![p, p], vec![p, p]]);
        let err = synthesize(&column, &plain_params(1.0)).unwrap_err();
        assert!(matches!(err, ValidationError::NotStitchable { .. }));
    }

    #[test]
    fn legacy_column_uses_node_rungs() {
        let column = SatinColumn::from_polylines(vec![
            vec![Point::new(0.0, 0.0), Point::new(5.0, 0.0), Point::new(10.0, 0.0)],
            vec![Point::new(0.0, 4.0), Point::new(5.0, 4.0), Point::new(10.0, 4.0)],
        ]);
        assert!(column.is_legacy());
        assert_eq!(column.flattened_rungs().len(), 1);
        assert_eq!(column.flattened_sections().len(), 2);
        assert!(synthesize(&column, &plain_params(1.0)).is_ok());
    }
}
