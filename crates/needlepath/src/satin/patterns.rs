//! Stitch pattern generators.
//!
//! Each generator plots points on the rails with its own spacing and
//! offsets, then orders them into a [`StitchGroup`]:
//!
//! ```text
//!   center walk    ─────────────>        (and back)
//!   contour        up one rail, down the other
//!   zig-zag        \/\/\/\/\/\/\/\/|
//!                  /\/\/\/\/\/\/\/\|
//!   satin          |/|/|/|/|/|/|/|/|
//!   E stitch       _|_|_|_|_|_|_|_|_
//! ```
//!
//! An odd number of center-walk repeats ends the walk at the far end of the
//! column, so every later pattern is reversed to start from there.

use super::SatinColumn;
use crate::geometry::Point;
use crate::params::SatinParams;
use crate::stitch::StitchGroup;

const UNDERLAY_TAGS: [&str; 2] = ["satin_column", "satin_column_underlay"];

fn pair(a: (f64, f64), scale: f64) -> (f64, f64) {
    (a.0 * scale, a.1 * scale)
}

/// Running stitch along the column's center line (or anywhere between the
/// rails, per `center_walk_underlay_position`), repeated back and forth.
pub fn do_center_walk(column: &SatinColumn, params: &SatinParams) -> StitchGroup {
    let position = params.center_walk_underlay_position;
    let inset = (-position / 100.0, -(100.0 - position) / 100.0);

    // Inset all the way in, like contour underlay with nothing left between.
    let (forward, back) = column.plot_points_on_rails(params.center_walk_underlay_stitch_length, (0.0, 0.0), inset);

    let mut stitches = Vec::new();
    for i in 0..params.center_walk_underlay_repeats {
        if i % 2 == 0 {
            stitches.extend(forward.iter().copied());
        } else {
            stitches.extend(back.iter().rev().copied());
        }
    }

    let mut group = StitchGroup::from_points(None, &stitches, &UNDERLAY_TAGS);
    group.add_tags(&["satin_center_walk"]);
    group
}

/// Walk up one rail and back down the other, inset from the edges.
pub fn do_contour_underlay(column: &SatinColumn, params: &SatinParams) -> StitchGroup {
    let (forward, back) = column.plot_points_on_rails(
        params.contour_underlay_stitch_length,
        pair(params.contour_underlay_inset_px, -1.0),
        pair(params.contour_underlay_inset_percent, -0.01),
    );

    let back_reversed = back.iter().rev().copied();
    let stitches: Vec<Point> = if params.center_walk_is_odd() {
        back_reversed.chain(forward.iter().copied()).collect()
    } else {
        forward.iter().copied().chain(back_reversed).collect()
    };

    let mut group = StitchGroup::from_points(None, &stitches, &UNDERLAY_TAGS);
    group.add_tags(&["satin_contour_underlay"]);
    group
}

/// Low-density zig-zag there and back, so it ends where it started.
pub fn do_zigzag_underlay(column: &SatinColumn, params: &SatinParams) -> StitchGroup {
    let (mut side0, mut side1) = column.plot_points_on_rails(
        params.zigzag_underlay_spacing / 2.0,
        pair(params.zigzag_underlay_inset_px, -1.0),
        pair(params.zigzag_underlay_inset_percent, -0.01),
    );

    if params.center_walk_is_odd() {
        side0.reverse();
        side1.reverse();
    }

    // Visit order: going out, even points on rail 0 meet odd points on rail
    // 1; coming back, the leftovers.
    fn evens(side: &[Point]) -> Vec<Point> {
        side.iter().step_by(2).copied().collect()
    }
    fn odds(side: &[Point]) -> Vec<Point> {
        side.iter().skip(1).step_by(2).copied().collect()
    }

    let mut order0 = evens(&side0);
    order0.extend(odds(&side0).into_iter().rev());
    let mut order1 = odds(&side1);
    order1.extend(evens(&side1).into_iter().rev());

    let mut group = StitchGroup::new(None);
    let mut last: Option<Point> = None;
    for (a, b) in order0.into_iter().zip(order1) {
        for point in [a, b] {
            if let (Some(prev), Some(max)) = (last, params.zigzag_underlay_max_stitch_length) {
                if prev.distance(point) > max {
                    for split in split_points(prev, point, max, None).0 {
                        group.add_stitch(split);
                    }
                }
            }
            group.add_stitch(point);
            last = Some(point);
        }
    }

    group.add_tags(&UNDERLAY_TAGS);
    group.add_tags(&["satin_zigzag_underlay"]);
    group
}

/// The top satin: alternate between the rails at `zigzag_spacing`.
pub fn do_satin(column: &SatinColumn, params: &SatinParams) -> StitchGroup {
    let (mut side0, mut side1) = column.plot_points_on_rails(
        params.zigzag_spacing,
        params.pull_compensation_px,
        pair(params.pull_compensation_percent, 0.01),
    );

    if let Some(max) = params.max_stitch_length {
        return do_split_stitch(&side0, &side1, max, params.center_walk_is_odd());
    }

    // Short stitches would move split stitch points around, so only here.
    if params.short_stitch_inset > 0.0 {
        do_short_stitches(&mut side0, &mut side1, params.short_stitch_inset, params.short_stitch_distance);
    }

    let stitches: Vec<Point> = side0.iter().zip(&side1).flat_map(|(&a, &b)| [a, b]).collect();
    let mut group = StitchGroup::from_points(None, &stitches, &["satin_column", "satin_column_edge"]);
    if params.center_walk_is_odd() {
        group.reverse();
    }
    group
}

/// E stitch: a short hop out to the second rail and back for each pair.
pub fn do_e_stitch(column: &SatinColumn, params: &SatinParams) -> StitchGroup {
    let (side0, side1) = column.plot_points_on_rails(
        params.zigzag_spacing,
        params.pull_compensation_px,
        pair(params.pull_compensation_percent, 0.01),
    );

    // "left" is rail 0, "right" rail 1.
    let stitches: Vec<Point> = side0
        .iter()
        .zip(&side1)
        .flat_map(|(&left, &right)| [left, right, left])
        .collect();

    let mut group = StitchGroup::from_points(None, &stitches, &["satin_column", "e_stitch"]);
    if params.center_walk_is_odd() {
        group.reverse();
    }
    group
}

/// Satin where every leg longer than `max_stitch_length` is broken into
/// equal pieces.
///
/// The diagonal return leg uses as many pieces as the leg before it, so the
/// split points line up across the column.
fn do_split_stitch(side0: &[Point], side1: &[Point], max_stitch_length: f64, reverse: bool) -> StitchGroup {
    const EDGE: [&str; 2] = ["satin_column", "satin_column_edge"];
    const SPLIT: [&str; 2] = ["satin_column", "satin_split_stitch"];

    let mut group = StitchGroup::new(None);

    for (i, (&left, &right)) in side0.iter().zip(side1).enumerate() {
        group.add_stitch(left).add_tags(&EDGE);

        let (points, count) = split_points(left, right, max_stitch_length, None);
        for point in points {
            group.add_stitch(point).add_tags(&SPLIT);
        }

        group.add_stitch(right).add_tags(&EDGE);

        if let Some(&next_left) = side0.get(i + 1) {
            let (points, _) = split_points(right, next_left, max_stitch_length, Some(count));
            for point in points {
                group.add_stitch(point).add_tags(&SPLIT);
            }
        }
    }

    if reverse {
        group.reverse();
    }
    group.add_tags(&EDGE);
    group
}

/// Evenly spaced points strictly between `a` and `b`, so that no piece is
/// longer than `max_stitch_length`.
///
/// `count` forces the number of pieces (zero is ignored). Returns the points
/// and the piece count used.
pub fn split_points(a: Point, b: Point, max_stitch_length: f64, count: Option<usize>) -> (Vec<Point>, usize) {
    let count = count
        .filter(|&c| c > 0)
        .unwrap_or_else(|| (a.distance(b) / max_stitch_length).ceil() as usize);

    let points = (1..count).map(|i| a.lerp(b, i as f64 / count as f64)).collect();
    (points, count)
}

/// Pull every other stitch end inward when it crowds its neighbour.
///
/// On tight curves the inner rail's points bunch up; moving alternate
/// points toward the other rail by `inset` (a fraction) spreads the
/// needle holes out.
fn do_short_stitches(side0: &mut [Point], side1: &mut [Point], inset: f64, distance: f64) {
    let pairs = side0.len().min(side1.len());
    for i in (1..pairs).step_by(2) {
        let (left, right) = (side0[i], side1[i]);
        if left.distance(side0[i - 1]) < distance {
            side0[i] = left.lerp(right, inset);
        }
        if right.distance(side1[i - 1]) < distance {
            side1[i] = right.lerp(left, inset);
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::satin::test_support::{ladder, plain_params};

    #[test]
    fn center_walk_repeats_alternate() {
        let column = ladder(10.0, 4.0);
        let params = SatinParams {
            center_walk_underlay_stitch_length: 5.0,
            center_walk_underlay_repeats: 3,
            ..plain_params(1.0)
        };
        let points = do_center_walk(&column, &params).points();
        // 0, 5, 10 / 10, 5, 0 / 0, 5, 10
        assert_eq!(points.len(), 9);
        assert!((points[3].x - 10.0).abs() < 1e-6);
        assert!((points[8].x - 10.0).abs() < 1e-6);
        assert!(points.iter().all(|p| (p.y - 2.0).abs() < 1e-9));
    }

    #[test]
    fn center_walk_position_moves_toward_a_rail() {
        let column = ladder(10.0, 4.0);
        let params = SatinParams {
            center_walk_underlay_position: 25.0,
            ..plain_params(1.0)
        };
        let first = do_center_walk(&column, &params).first_point().unwrap();
        assert!((first.y - 1.0).abs() < 1e-9);
    }

    #[test]
    fn contour_goes_up_and_back() {
        let column = ladder(10.0, 4.0);
        let params = SatinParams {
            contour_underlay_stitch_length: 5.0,
            contour_underlay_inset_px: (1.0, 1.0),
            ..plain_params(1.0)
        };
        let group = do_contour_underlay(&column, &params);
        let points = group.points();
        assert_eq!(points.len(), 6);
        assert!((points[0].y - 1.0).abs() < 1e-9);
        assert!((points[5].y - 3.0).abs() < 1e-9);
        assert!((points[5].x).abs() < 1e-6);
        assert!(group.has_tag("satin_contour_underlay"));
    }

    #[test]
    fn zigzag_underlay_returns_to_start() {
        let column = ladder(12.0, 4.0);
        let params = SatinParams {
            zigzag_underlay_spacing: 4.0,
            zigzag_underlay_inset_px: (0.0, 0.0),
            ..plain_params(1.0)
        };
        let points = do_zigzag_underlay(&column, &params).points();
        // Seven pairs at 2px; every point visited once.
        assert_eq!(points.len(), 14);
        let first = points[0];
        let last = points[points.len() - 1];
        assert!(first.x.abs() < 1e-6);
        assert!(last.x.abs() < 1e-6);
    }

    #[test]
    fn zigzag_underlay_is_split() {
        let column = ladder(12.0, 30.0);
        let params = SatinParams {
            zigzag_underlay_spacing: 4.0,
            zigzag_underlay_inset_px: (0.0, 0.0),
            zigzag_underlay_max_stitch_length: Some(10.0),
            ..plain_params(1.0)
        };
        let points = do_zigzag_underlay(&column, &params).points();
        for w in points.windows(2) {
            assert!(w[0].distance(w[1]) <= 10.0 + 1e-9);
        }
    }

    #[test]
    fn e_stitch_hops_out_and_back() {
        let column = ladder(10.0, 4.0);
        let group = do_e_stitch(&column, &plain_params(5.0));
        let points = group.points();
        assert_eq!(points.len(), 9);
        assert_eq!(points[0], points[2]);
        assert!((points[1].y - 4.0).abs() < 1e-9);
        assert!(group.has_tag("e_stitch"));
    }

    #[test]
    fn odd_center_walk_reverses_satin() {
        let column = ladder(10.0, 4.0);
        let params = SatinParams {
            center_walk_underlay_repeats: 1,
            ..plain_params(1.0)
        };
        let first = do_satin(&column, &params).first_point().unwrap();
        assert!((first.x - 10.0).abs() < 1e-6);
    }

    #[test]
    fn split_stitch_limits_leg_length() {
        let column = ladder(10.0, 25.0);
        let params = SatinParams {
            max_stitch_length: Some(10.0),
            ..plain_params(2.0)
        };
        let group = do_satin(&column, &params);
        for w in group.stitches.windows(2) {
            assert!(w[0].point().distance(w[1].point()) <= 10.0 + 1e-9);
        }
        assert!(group.stitches.iter().any(|s| s.has_tag("satin_split_stitch")));
        assert!(group.stitches[0].has_tag("satin_column_edge"));
    }

    #[test]
    fn split_points_are_interior() {
        let (points, count) = split_points(Point::new(0.0, 0.0), Point::new(10.0, 0.0), 4.0, None);
        assert_eq!(count, 3);
        assert_eq!(points.len(), 2);
        assert!((points[0].x - 10.0 / 3.0).abs() < 1e-9);

        let (points, count) = split_points(Point::new(0.0, 0.0), Point::new(1.0, 0.0), 4.0, Some(3));
        assert_eq!(count, 3);
        assert_eq!(points.len(), 2);
    }

    #[test]
    fn crowded_points_are_shortened() {
        let mut side0 = vec![Point::new(0.0, 0.0), Point::new(0.1, 0.0), Point::new(5.0, 0.0)];
        let mut side1 = vec![Point::new(0.0, 10.0), Point::new(3.0, 10.0), Point::new(6.0, 10.0)];
        do_short_stitches(&mut side0, &mut side1, 0.5, 1.0);

        assert!(side0[1].distance(Point::new(0.1, 0.0).lerp(Point::new(3.0, 10.0), 0.5)) < 1e-9);
        assert_eq!(side1[1], Point::new(3.0, 10.0));
        assert_eq!(side0[2], Point::new(5.0, 0.0));
    }
}
