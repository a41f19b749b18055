//! Derived columns: reversed, split in two, transformed, center line.

use super::{SatinColumn, Subpath, ValidationError};
use crate::geometry::{Affine, Point, Polyline, cut, polylines_intersect, project};

/// Where to split a column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SplitAt {
    /// Fraction (0..1) of the way down the column.
    Fraction(f64),
    /// A point on or near either rail.
    Point(Point),
}

impl SatinColumn {
    /// The same column sewn in the opposite direction.
    ///
    /// Each rail's points are reversed and the rails swap places (so the
    /// first rail is still on the same side of the sewing direction). Rungs
    /// are kept as they are. The result is always flattened, and a legacy
    /// column gets its node rungs written out as real rungs.
    pub fn reverse(&self) -> SatinColumn {
        let mut paths: Vec<Subpath> = self.rail_paths().into_iter().rev().map(Subpath::reversed).collect();
        paths.extend(self.flattened_rungs().into_iter().map(Subpath::from_points));
        SatinColumn::new(paths)
    }

    /// Map every node and point through `transform`.
    pub fn apply_transform(&self, transform: &Affine) -> SatinColumn {
        let map = |points: &[Point]| points.iter().map(|&p| transform.apply(p)).collect::<Vec<_>>();
        let paths = self
            .paths
            .iter()
            .map(|p| Subpath::new(map(&p.nodes), map(&p.points)))
            .collect();
        SatinColumn::new(paths).with_swap_rails(self.swap_rails)
    }

    /// The column's center line, sampled every `spacing`.
    pub fn center_line(&self, spacing: f64) -> Polyline {
        self.plot_points_on_rails(spacing, (0.0, 0.0), (-0.5, -0.5)).0
    }

    /// Split into the part before and the part after `at`.
    ///
    /// The cut lands on a pair of matching satin stitch points (plotted at
    /// `spacing`), so the two halves meet along a line that follows the
    /// column's stitch direction. Rungs go with whichever half they still
    /// cross; a half that would be ambiguous or rung-less gets a new rung at
    /// its start.
    pub fn split(&self, at: SplitAt, spacing: f64) -> Result<(SatinColumn, SatinColumn), ValidationError> {
        let rails = self.flattened_rails();
        if rails.len() < 2 {
            return Err(ValidationError::TooFewPaths { location: self.centroid() });
        }

        let (side0, side1) = self.plot_points_on_rails(spacing, (0.0, 0.0), (0.0, 0.0));
        let points: Vec<Point> = side0.iter().zip(&side1).flat_map(|(&a, &b)| [a, b]).collect();
        if points.is_empty() {
            return Err(ValidationError::NotStitchable { location: self.centroid() });
        }

        let index = match at {
            SplitAt::Fraction(fraction) => {
                let index = (points.len() as f64 * fraction).round().max(0.0) as usize;
                index.min(points.len() - 1)
            }
            SplitAt::Point(target) => points
                .iter()
                .enumerate()
                .min_by(|(_, a), (_, b)| a.distance(target).total_cmp(&b.distance(target)))
                .map(|(i, _)| i)
                .unwrap_or(0),
        };

        // Even indices are on rail 0, odd ones on rail 1.
        let cut_points = if index % 2 == 0 {
            [points[index], points[index + 1]]
        } else {
            [points[index - 1], points[index]]
        };

        let mut before: Vec<Polyline> = Vec::new();
        let mut after: Vec<Polyline> = Vec::new();
        for (rail, cut_point) in rails.iter().zip(cut_points) {
            let (head, tail) = cut(rail, project(rail, cut_point));
            before.push(head.unwrap_or_else(|| vec![cut_point, cut_point]));
            after.push(tail.unwrap_or_else(|| vec![cut_point, cut_point]));
        }

        let rungs = self.flattened_rungs();
        for half in [&mut before, &mut after] {
            let kept: Vec<Polyline> = rungs
                .iter()
                .filter(|rung| polylines_intersect(&half[0], rung) && polylines_intersect(&half[1], rung))
                .cloned()
                .collect();
            half.extend(kept);

            // No rungs: legacy rules would demand equal node counts. Two
            // rungs: four paths that all cross two others, so rails would be
            // picked by length. A rung at the start settles both.
            if matches!(half.len(), 2 | 4) {
                let rung = vec![half[0][0], half[1][0]];
                half.push(rung);
            }
        }

        Ok((SatinColumn::from_polylines(before), SatinColumn::from_polylines(after)))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::polyline_length;
    use crate::satin::test_support::{ladder, plain_params};
    use crate::satin::synthesize;

    #[test]
    fn reverse_swaps_and_flips_rails() {
        let column = ladder(10.0, 4.0);
        let reversed = column.reverse();
        let rails = reversed.flattened_rails();
        assert_eq!(rails[0], vec![Point::new(10.0, 4.0), Point::new(0.0, 4.0)]);
        assert_eq!(rails[1], vec![Point::new(10.0, 0.0), Point::new(0.0, 0.0)]);
        assert_eq!(reversed.flattened_rungs().len(), 2);
    }

    #[test]
    fn reverse_twice_sews_the_same_stitches() {
        let column = ladder(10.0, 4.0);
        let params = plain_params(1.0);
        let once = synthesize(&column, &params).unwrap();
        let twice = synthesize(&column.reverse().reverse(), &params).unwrap();
        assert_eq!(once[0].points(), twice[0].points());
    }

    #[test]
    fn reversed_satin_starts_at_far_end() {
        let column = ladder(10.0, 4.0);
        let groups = synthesize(&column.reverse(), &plain_params(1.0)).unwrap();
        let first = groups[0].first_point().unwrap();
        assert!((first.x - 10.0).abs() < 1e-9);
    }

    #[test]
    fn legacy_reverse_keeps_node_rungs() {
        let column = SatinColumn::from_polylines(vec![
            vec![Point::new(0.0, 0.0), Point::new(5.0, 0.0), Point::new(10.0, 0.0)],
            vec![Point::new(0.0, 4.0), Point::new(5.0, 4.0), Point::new(10.0, 4.0)],
        ]);
        let reversed = column.reverse();
        assert_eq!(reversed.paths().len(), 3);
        assert_eq!(reversed.flattened_sections().len(), 2);
    }

    #[test]
    fn split_in_half_preserves_rail_length() {
        let column = ladder(20.0, 4.0);
        let (before, after) = column.split(SplitAt::Fraction(0.5), 1.0).unwrap();

        for i in 0..2 {
            let total = polyline_length(&before.flattened_rails()[i]) + polyline_length(&after.flattened_rails()[i]);
            assert!((total - 20.0).abs() < 1e-6);
        }
        assert!((polyline_length(&before.flattened_rails()[0]) - 10.0).abs() < 1.0);

        let params = plain_params(1.0);
        assert!(synthesize(&before, &params).is_ok());
        assert!(synthesize(&after, &params).is_ok());
    }

    #[test]
    fn split_at_point_uses_nearest_stitch() {
        let column = ladder(20.0, 4.0);
        let (before, after) = column.split(SplitAt::Point(Point::new(7.2, 4.5)), 1.0).unwrap();
        let rail = &before.flattened_rails()[0];
        assert!((rail[rail.len() - 1].x - 7.0).abs() < 1e-6);
        assert!((after.flattened_rails()[1][0].x - 7.0).abs() < 1e-6);
    }

    #[test]
    fn rungless_half_gets_a_start_rung() {
        // Legacy column: its only node rung sits at the start.
        let column = SatinColumn::from_polylines(vec![
            vec![Point::new(0.0, 0.0), Point::new(20.0, 0.0)],
            vec![Point::new(0.0, 4.0), Point::new(20.0, 4.0)],
        ]);
        let (before, after) = column.split(SplitAt::Fraction(0.5), 1.0).unwrap();
        assert_eq!(before.paths().len(), 3);
        assert_eq!(after.paths().len(), 3);
        assert_eq!(after.rail_indices(), &[0, 1]);
        assert_eq!(after.flattened_rungs()[0][0].x, after.flattened_rails()[0][0].x);
        assert!(synthesize(&after, &plain_params(1.0)).is_ok());
    }

    #[test]
    fn transform_moves_everything() {
        let column = ladder(10.0, 4.0).apply_transform(&Affine::translate(5.0, 1.0));
        let rails = column.flattened_rails();
        assert_eq!(rails[0][0], Point::new(5.0, 1.0));
        assert_eq!(column.flattened_rungs()[0][0], Point::new(5.0, 0.0));
    }

    #[test]
    fn center_line_runs_down_the_middle() {
        let line = ladder(10.0, 4.0).center_line(2.0);
        assert_eq!(line.len(), 6);
        assert!(line.iter().all(|p| (p.y - 2.0).abs() < 1e-9));
    }
}
