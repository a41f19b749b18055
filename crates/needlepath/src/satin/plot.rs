//! Plotting matched point pairs along both rails.
//!
//! ## Rust Lesson #12: Walking in small steps
//!
//! Stitches should be evenly spaced along the column's *centre line*, not
//! along either rail. Imagine the letter V: the rails are much longer than
//! the distance between consecutive horizontal stitches. Instead of solving
//! for that exactly, we inch along both rails in tiny proportional steps and
//! measure how far the midpoint moved.

use super::{SatinColumn, Section};
use crate::geometry::{EPSILON, Point, polyline_length};

/// Step size along rail 0, in pixels (about 0.01 mm).
const STEP: f64 = 0.05;

/// Expand (positive) or contract (negative) a pair of points about their
/// midpoint.
///
/// `offset_px` is a fixed amount per side; `offset_proportional` is a
/// fraction of the pair's distance per side. A pair is never contracted
/// past its midpoint: if the total contraction would exceed the distance,
/// both offsets are scaled down so the points meet.
pub fn offset_points(
    pos1: Point,
    pos2: Point,
    offset_px: (f64, f64),
    offset_proportional: (f64, f64),
) -> (Point, Point) {
    let distance = pos1.distance(pos2);

    // Same point: no direction to offset in.
    if distance < 1e-4 {
        return (pos1, pos2);
    }

    let mut offset_a = offset_px.0 + distance * offset_proportional.0;
    let mut offset_b = offset_px.1 + distance * offset_proportional.1;
    let offset_total = offset_a + offset_b;

    if offset_total < -distance {
        let scale = -distance / offset_total;
        offset_a *= scale;
        offset_b *= scale;
    }

    let out1 = pos1 + (pos1 - pos2).unit() * offset_a;
    let out2 = pos2 + (pos2 - pos1).unit() * offset_b;
    (out1, out2)
}

/// Move `distance` along `path`, starting at `start` on segment `index`.
///
/// Returns the new position and segment index. Walking off the end leaves
/// the position at the last point.
pub fn walk(path: &[Point], start: Point, index: usize, distance: f64) -> (Point, usize) {
    let mut pos = start;
    let mut index = index;
    let mut remaining = distance;
    let last_index = path.len().saturating_sub(1);

    while index < last_index {
        let segment_end = path[index + 1];
        let segment = segment_end - pos;
        let segment_length = segment.length();

        if segment_length > remaining + EPSILON {
            return (pos + segment.unit() * remaining, index);
        }

        index += 1;
        remaining -= segment_length;
        pos = segment_end;
    }

    (pos, index)
}

/// Plot an equal number of points on each rail, `spacing` apart along the
/// centre line, offset by [`offset_points`].
///
/// The first pair sits at the start of the first section and the last
/// pair at the end of the column.
pub fn plot_points_on_rails(
    sections: &[Section],
    spacing: f64,
    offset_px: (f64, f64),
    offset_proportional: (f64, f64),
) -> (Vec<Point>, Vec<Point>) {
    let mut side0 = Vec::new();
    let mut side1 = Vec::new();
    let mut last_raw: Option<(Point, Point)> = None;

    let mut add_pair = |pos0: Point, pos1: Point, last_raw: &mut Option<(Point, Point)>| {
        let (a, b) = offset_points(pos0, pos1, offset_px, offset_proportional);
        side0.push(a);
        side1.push(b);
        *last_raw = Some((pos0, pos1));
    };

    let mut to_travel = 0.0;
    let mut current: Option<(Point, Point)> = None;

    for Section(section0, section1) in sections {
        let (Some(&start0), Some(&start1)) = (section0.first(), section1.first()) else {
            continue;
        };
        let mut pos0 = start0;
        let mut pos1 = start1;
        current = Some((pos0, pos1));

        let len0 = polyline_length(section0);
        let len1 = polyline_length(section1);
        if len0 == 0.0 {
            continue;
        }

        // Travel further on the longer rail (think of the letter O).
        let ratio = len1 / len0;

        let last_index0 = section0.len() - 1;
        let last_index1 = section1.len() - 1;
        let mut index0 = 0;
        let mut index1 = 0;

        while index0 < last_index0 && index1 < last_index1 {
            let mut old_center = pos0.midpoint(pos1);

            while to_travel > EPSILON && index0 < last_index0 && index1 < last_index1 {
                (pos0, index0) = walk(section0, pos0, index0, STEP);
                (pos1, index1) = walk(section1, pos1, index1, STEP * ratio);

                let new_center = pos0.midpoint(pos1);
                to_travel -= new_center.distance(old_center);
                old_center = new_center;
            }

            if to_travel <= EPSILON {
                add_pair(pos0, pos1, &mut last_raw);
                to_travel = spacing;
            }
        }

        current = Some((pos0, pos1));
    }

    // Finish at the end of the column unless we already landed there.
    if let Some((pos0, pos1)) = current {
        let already_there = last_raw
            .is_some_and(|(a, b)| a.distance(pos0) < 1e-6 && b.distance(pos1) < 1e-6);
        if to_travel > 0.0 && !already_there {
            add_pair(pos0, pos1, &mut last_raw);
        }
    }

    (side0, side1)
}

impl SatinColumn {
    /// Plot paired points on this column's rails. See [`plot_points_on_rails`].
    pub fn plot_points_on_rails(
        &self,
        spacing: f64,
        offset_px: (f64, f64),
        offset_proportional: (f64, f64),
    ) -> (Vec<Point>, Vec<Point>) {
        plot_points_on_rails(&self.flattened_sections(), spacing, offset_px, offset_proportional)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn straight_section(length: f64, width: f64) -> Section {
        Section(
            vec![Point::new(0.0, 0.0), Point::new(length, 0.0)],
            vec![Point::new(0.0, width), Point::new(length, width)],
        )
    }

    #[test]
    fn offset_expands_about_midpoint() {
        let (a, b) = offset_points(Point::new(0.0, 0.0), Point::new(0.0, 10.0), (1.0, 2.0), (0.0, 0.0));
        assert_eq!(a, Point::new(0.0, -1.0));
        assert_eq!(b, Point::new(0.0, 12.0));

        let (a, b) = offset_points(Point::new(0.0, 0.0), Point::new(0.0, 10.0), (0.0, 0.0), (-0.5, -0.5));
        assert!(a.distance(Point::new(0.0, 5.0)) < 1e-9);
        assert!(b.distance(Point::new(0.0, 5.0)) < 1e-9);
    }

    #[test]
    fn offset_never_flips_a_pair() {
        let p1 = Point::new(1.0, 1.0);
        let p2 = Point::new(4.0, 5.0);
        let original = p2 - p1;

        for px in [-20.0, -3.0, -1.0, 0.0, 2.0] {
            for prop in [-2.0, -0.5, -0.1, 0.0, 0.3] {
                for (sa, sb) in [(1.0, 1.0), (1.0, 0.0), (0.2, 3.0)] {
                    let (a, b) = offset_points(p1, p2, (px * sa, px * sb), (prop * sa, prop * sb));
                    let after = b - a;
                    assert!(after.dot(original) >= -1e-9, "px {} prop {} flipped", px, prop);
                }
            }
        }
    }

    #[test]
    fn coincident_points_are_left_alone() {
        let p = Point::new(2.0, 2.0);
        assert_eq!(offset_points(p, p, (5.0, 5.0), (1.0, 1.0)), (p, p));
    }

    #[test]
    fn walk_crosses_segments() {
        let path = vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0), Point::new(1.0, 1.0)];
        let (pos, index) = walk(&path, path[0], 0, 1.5);
        assert_eq!(index, 1);
        assert!(pos.distance(Point::new(1.0, 0.5)) < 1e-9);

        let (pos, index) = walk(&path, path[0], 0, 10.0);
        assert_eq!(index, 2);
        assert_eq!(pos, Point::new(1.0, 1.0));
    }

    #[test]
    fn pairs_are_evenly_spaced() {
        let (side0, side1) = plot_points_on_rails(&[straight_section(10.0, 4.0)], 2.5, (0.0, 0.0), (0.0, 0.0));
        assert_eq!(side0.len(), 5);
        assert_eq!(side1.len(), 5);
        for (i, p) in side0.iter().enumerate() {
            assert!((p.x - 2.5 * i as f64).abs() < 1e-6);
        }
    }

    #[test]
    fn uneven_spacing_still_ends_at_column_end() {
        let (side0, _) = plot_points_on_rails(&[straight_section(10.0, 4.0)], 3.0, (0.0, 0.0), (0.0, 0.0));
        // 0, 3, 6, 9 and the closing pair at 10.
        assert_eq!(side0.len(), 5);
        assert!((side0[4].x - 10.0).abs() < 1e-9);
    }

    #[test]
    fn sides_have_equal_length() {
        let sections = vec![
            straight_section(7.3, 2.0),
            Section(
                vec![Point::new(7.3, 0.0), Point::new(12.0, 3.0)],
                vec![Point::new(7.3, 2.0), Point::new(9.0, 4.0)],
            ),
        ];
        for spacing in [0.3, 1.0, 4.0, 50.0] {
            let (a, b) = plot_points_on_rails(&sections, spacing, (0.5, 0.5), (0.1, 0.0));
            assert_eq!(a.len(), b.len());
            assert!(!a.is_empty());
        }
    }

    #[test]
    fn longer_rail_travels_further() {
        let section = Section(
            vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)],
            vec![Point::new(0.0, 5.0), Point::new(20.0, 5.0)],
        );
        let (side0, side1) = plot_points_on_rails(&[section], 2.0, (0.0, 0.0), (0.0, 0.0));
        let last = side0.len() - 1;
        assert!((side0[last].x - 10.0).abs() < 1e-6);
        assert!((side1[last].x - 20.0).abs() < 1e-6);
        assert!((side1[1].x - 2.0 * side0[1].x).abs() < 1e-6);
    }
}
