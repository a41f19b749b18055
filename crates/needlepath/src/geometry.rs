//! Core geometry types for needlepath.
//!
//! Everything here works on already-flattened data: a curve is a
//! [`Polyline`], an ordered list of [`Point`]s. Distances along a polyline
//! ("arc-length parameters") are in the same units as the coordinates.
//!
//! ## Rust Lesson #3: Structs & Derives
//!
//! The `#[derive(...)]` macro auto-generates common functionality:
//! - `Debug` = lets you print with `{:?}`
//! - `Clone` / `Copy` = can duplicate the value (`Copy` implicitly)
//! - `PartialEq` = can compare with `==`

use std::ops::{Add, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

/// Distance below which two points are considered the same.
pub const EPSILON: f64 = 1e-9;

/// A 2D point (or vector) with x,y coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// An ordered sequence of points forming an open polyline.
pub type Polyline = Vec<Point>;

/// A line segment defined by two endpoints.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl Point {
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Distance to another point.
    #[inline]
    pub fn distance(&self, other: Point) -> f64 {
        (*self - other).length()
    }

    /// Length of this point treated as a vector.
    #[inline]
    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Unit vector in the same direction, or the zero vector if degenerate.
    #[inline]
    pub fn unit(&self) -> Point {
        let len = self.length();
        if len < EPSILON {
            Point::default()
        } else {
            Point::new(self.x / len, self.y / len)
        }
    }

    #[inline]
    pub fn dot(&self, other: Point) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Midpoint between this point and another.
    #[inline]
    pub fn midpoint(&self, other: Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    /// Linear interpolation: `t = 0` is `self`, `t = 1` is `other`.
    #[inline]
    pub fn lerp(&self, other: Point, t: f64) -> Point {
        *self * (1.0 - t) + other * t
    }
}

// ## Rust Lesson #24: Operator Overloading
//
// Implementing `Add`, `Sub`, `Mul` from `std::ops` lets us write `a + b`
// and `v * 2.0` for our own types. Because `Point` is `Copy`, the
// by-value signatures cost nothing.

impl Add for Point {
    type Output = Point;

    #[inline]
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    #[inline]
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point {
    type Output = Point;

    #[inline]
    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Point {
    type Output = Point;

    #[inline]
    fn neg(self) -> Point {
        Point::new(-self.x, -self.y)
    }
}

impl Line {
    #[inline]
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    #[inline]
    pub fn from_points(a: Point, b: Point) -> Self {
        Self::new(a.x, a.y, b.x, b.y)
    }

    #[inline]
    pub fn start(&self) -> Point {
        Point::new(self.x1, self.y1)
    }

    #[inline]
    pub fn end(&self) -> Point {
        Point::new(self.x2, self.y2)
    }

    #[inline]
    pub fn length(&self) -> f64 {
        self.start().distance(self.end())
    }

    /// Closest point on this segment to `p`, with its parameter in `0..=1`.
    pub fn closest_point(&self, p: Point) -> (Point, f64) {
        let a = self.start();
        let ab = self.end() - a;
        let len_sq = ab.dot(ab);
        if len_sq < EPSILON * EPSILON {
            return (a, 0.0);
        }
        let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
        (a + ab * t, t)
    }
}

// ============================================================================
// SEGMENT INTERSECTION
// ============================================================================

/// Result of a segment-segment intersection test.
#[derive(Debug, Clone, Copy)]
pub enum Intersection {
    None,
    Point { x: f64, y: f64, t: f64 },
    /// Collinear segments sharing a stretch, from `start` to `end` along the
    /// first segment.
    Overlap { start: Point, end: Point },
}

/// Find the intersection point between two line segments.
///
/// Touching counts: an intersection exactly at an endpoint is reported.
/// Returns the point and `t` along the first segment.
#[inline]
pub fn segment_intersection(a: &Line, b: &Line) -> Intersection {
    let (x1, y1, x2, y2) = (a.x1, a.y1, a.x2, a.y2);
    let (x3, y3, x4, y4) = (b.x1, b.y1, b.x2, b.y2);
    let denom = (y4 - y3) * (x2 - x1) - (x4 - x3) * (y2 - y1);

    // Parallel or coincident lines
    if denom.abs() < 1e-12 {
        return collinear_overlap(a, b);
    }

    let ua = ((x4 - x3) * (y1 - y3) - (y4 - y3) * (x1 - x3)) / denom;
    let ub = ((x2 - x1) * (y1 - y3) - (y2 - y1) * (x1 - x3)) / denom;

    let range = -EPSILON..=1.0 + EPSILON;
    if range.contains(&ua) && range.contains(&ub) {
        Intersection::Point {
            x: x1 + ua * (x2 - x1),
            y: y1 + ua * (y2 - y1),
            t: ua.clamp(0.0, 1.0),
        }
    } else {
        Intersection::None
    }
}

/// The shared stretch of two parallel segments, if they lie on one line.
fn collinear_overlap(a: &Line, b: &Line) -> Intersection {
    let (p, q) = (Point::new(a.x1, a.y1), Point::new(a.x2, a.y2));
    let d = q - p;
    let len_sq = d.x * d.x + d.y * d.y;
    if len_sq < 1e-12 {
        return Intersection::None;
    }

    let b1 = Point::new(b.x1, b.y1);
    let b2 = Point::new(b.x2, b.y2);
    // Distance of b's start from a's line.
    let r = b1 - p;
    let off = (r.x * d.y - r.y * d.x) / len_sq.sqrt();
    if off.abs() > EPSILON {
        return Intersection::None;
    }

    let t = |r: Point| (r - p).dot(d) / len_sq;
    let (t1, t2) = (t(b1), t(b2));
    let lo = t1.min(t2).max(0.0);
    let hi = t1.max(t2).min(1.0);
    if lo > hi + EPSILON {
        return Intersection::None;
    }
    if hi - lo <= EPSILON {
        let at = p.lerp(q, lo);
        return Intersection::Point { x: at.x, y: at.y, t: lo };
    }
    Intersection::Overlap { start: p.lerp(q, lo), end: p.lerp(q, hi) }
}

/// Iterate over the segments of a polyline.
pub fn segments(points: &[Point]) -> impl Iterator<Item = Line> + '_ {
    points.windows(2).map(|w| Line::from_points(w[0], w[1]))
}

/// All distinct points where two polylines touch or cross.
///
/// A crossing exactly at a shared vertex shows up on two adjacent segments;
/// those duplicates are merged.
pub fn polyline_intersections(a: &[Point], b: &[Point]) -> Vec<Point> {
    let mut hits: Vec<Point> = Vec::new();

    // Single-point "polylines" can still touch the other one.
    if a.len() == 1 || b.len() == 1 {
        let (single, other) = if a.len() == 1 { (a[0], b) } else { (b[0], a) };
        if distance_to_polyline(other, single) < 1e-6 {
            hits.push(single);
        }
        return hits;
    }

    for sa in segments(a) {
        for sb in segments(b) {
            let found = match segment_intersection(&sa, &sb) {
                Intersection::None => continue,
                Intersection::Point { x, y, .. } => vec![Point::new(x, y)],
                // A shared stretch touches at both of its ends.
                Intersection::Overlap { start, end } => vec![start, end],
            };
            for p in found {
                if !hits.iter().any(|h| h.distance(p) < 1e-6) {
                    hits.push(p);
                }
            }
        }
    }

    hits
}

/// Do two polylines touch or cross anywhere?
pub fn polylines_intersect(a: &[Point], b: &[Point]) -> bool {
    !polyline_intersections(a, b).is_empty()
}

// ============================================================================
// LENGTH, PROJECTION, INTERPOLATION
// ============================================================================

/// Total arc length of a polyline.
pub fn polyline_length(points: &[Point]) -> f64 {
    points.windows(2).map(|w| w[0].distance(w[1])).sum()
}

/// Arc-length parameter of the point on the polyline nearest to `p`.
pub fn project(points: &[Point], p: Point) -> f64 {
    let mut best_dist = f64::INFINITY;
    let mut best_param = 0.0;
    let mut traveled = 0.0;

    for seg in segments(points) {
        let (closest, t) = seg.closest_point(p);
        let d = closest.distance(p);
        if d < best_dist {
            best_dist = d;
            best_param = traveled + t * seg.length();
        }
        traveled += seg.length();
    }

    best_param
}

/// Point at arc-length `distance` along the polyline (clamped to the ends).
pub fn interpolate(points: &[Point], distance: f64) -> Point {
    let Some(&first) = points.first() else {
        return Point::default();
    };
    if distance <= 0.0 {
        return first;
    }

    let mut traveled = 0.0;
    for seg in segments(points) {
        let len = seg.length();
        if traveled + len >= distance {
            if len < EPSILON {
                return seg.end();
            }
            return seg.start().lerp(seg.end(), (distance - traveled) / len);
        }
        traveled += len;
    }

    *points.last().unwrap_or(&first)
}

/// Point at a normalized position (0..1) along the polyline.
pub fn interpolate_normalized(points: &[Point], fraction: f64) -> Point {
    interpolate(points, fraction * polyline_length(points))
}

/// Shortest distance from `p` to the polyline.
pub fn distance_to_polyline(points: &[Point], p: Point) -> f64 {
    if points.len() == 1 {
        return points[0].distance(p);
    }
    segments(points)
        .map(|seg| seg.closest_point(p).0.distance(p))
        .fold(f64::INFINITY, f64::min)
}

/// Nearest point on the polyline to `p`.
pub fn nearest_point(points: &[Point], p: Point) -> Point {
    interpolate(points, project(points, p))
}

/// The closest pair of points between two polylines, `(on_a, on_b)`.
///
/// If they touch, the pair is the (first) contact point twice.
pub fn nearest_points(a: &[Point], b: &[Point]) -> (Point, Point) {
    if let Some(&hit) = polyline_intersections(a, b).first() {
        return (hit, hit);
    }

    // Otherwise the closest pair always involves a vertex of one of them.
    let mut best = (f64::INFINITY, Point::default(), Point::default());
    for &pa in a {
        let pb = nearest_point(b, pa);
        let d = pa.distance(pb);
        if d < best.0 {
            best = (d, pa, pb);
        }
    }
    for &pb in b {
        let pa = nearest_point(a, pb);
        let d = pa.distance(pb);
        if d < best.0 {
            best = (d, pa, pb);
        }
    }

    (best.1, best.2)
}

// ============================================================================
// CUTTING
// ============================================================================

/// Cut a polyline in two at arc-length `distance`.
///
/// Cutting at or before the start yields `(None, Some(line))`; at or past the
/// end yields `(Some(line), None)`.
pub fn cut(points: &[Point], distance: f64) -> (Option<Polyline>, Option<Polyline>) {
    let length = polyline_length(points);
    if distance <= 0.0 {
        return (None, Some(points.to_vec()));
    }
    if distance >= length {
        return (Some(points.to_vec()), None);
    }

    let mut traveled = 0.0;
    for i in 1..points.len() {
        let seg_len = points[i - 1].distance(points[i]);
        let next = traveled + seg_len;

        if (next - distance).abs() < EPSILON {
            return (Some(points[..=i].to_vec()), Some(points[i..].to_vec()));
        }
        if next > distance {
            let cut_point = points[i - 1].lerp(points[i], (distance - traveled) / seg_len);

            let mut before = points[..i].to_vec();
            before.push(cut_point);
            let mut after = vec![cut_point];
            after.extend_from_slice(&points[i..]);
            return (Some(before), Some(after));
        }
        traveled = next;
    }

    (Some(points.to_vec()), None)
}

/// Cut a polyline at several arc-length parameters.
///
/// Always returns `distances.len() + 1` pieces. Pieces that would be empty
/// (two cuts at the same place, a cut at an end) are `None`.
pub fn cut_multiple(points: &[Point], distances: &[f64]) -> Vec<Option<Polyline>> {
    let mut sorted = distances.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mut pieces = Vec::with_capacity(sorted.len() + 1);
    let mut rest: Option<Polyline> = Some(points.to_vec());
    let mut consumed = 0.0;

    for distance in sorted {
        match rest.take() {
            Some(line) => {
                let (before, after) = cut(&line, distance - consumed);
                consumed = consumed.max(distance);
                pieces.push(before);
                rest = after;
            }
            None => pieces.push(None),
        }
    }
    pieces.push(rest);

    pieces
}

// ============================================================================
// TRANSFORMS
// ============================================================================

/// A 2D affine transform in SVG matrix order `(a b c d e f)`.
///
/// `x' = a*x + c*y + e`, `y' = b*x + d*y + f`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Default for Affine {
    fn default() -> Self {
        Self::identity()
    }
}

impl Affine {
    pub const fn identity() -> Self {
        Self { a: 1.0, b: 0.0, c: 0.0, d: 1.0, e: 0.0, f: 0.0 }
    }

    pub const fn translate(dx: f64, dy: f64) -> Self {
        Self { a: 1.0, b: 0.0, c: 0.0, d: 1.0, e: dx, f: dy }
    }

    pub const fn scale(sx: f64, sy: f64) -> Self {
        Self { a: sx, b: 0.0, c: 0.0, d: sy, e: 0.0, f: 0.0 }
    }

    /// `self` applied after `inner`.
    pub fn then_after(&self, inner: &Affine) -> Affine {
        Affine {
            a: self.a * inner.a + self.c * inner.b,
            b: self.b * inner.a + self.d * inner.b,
            c: self.a * inner.c + self.c * inner.d,
            d: self.b * inner.c + self.d * inner.d,
            e: self.a * inner.e + self.c * inner.f + self.e,
            f: self.b * inner.e + self.d * inner.f + self.f,
        }
    }

    #[inline]
    pub fn apply(&self, p: Point) -> Point {
        Point::new(
            self.a * p.x + self.c * p.y + self.e,
            self.b * p.x + self.d * p.y + self.f,
        )
    }

    pub fn is_identity(&self) -> bool {
        *self == Affine::identity()
    }
}

impl From<svgtypes::Transform> for Affine {
    fn from(t: svgtypes::Transform) -> Self {
        Affine { a: t.a, b: t.b, c: t.c, d: t.d, e: t.e, f: t.f }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn point_distance() {
        let p1 = Point::new(0.0, 0.0);
        let p2 = Point::new(3.0, 4.0);
        assert_eq!(p1.distance(p2), 5.0); // 3-4-5 triangle
    }

    #[test]
    fn point_arithmetic() {
        let a = Point::new(1.0, 2.0);
        let b = Point::new(3.0, 5.0);
        assert_eq!(a + b, Point::new(4.0, 7.0));
        assert_eq!(b - a, Point::new(2.0, 3.0));
        assert_eq!(a * 2.0, Point::new(2.0, 4.0));
        assert_eq!(Point::new(0.0, 5.0).unit(), Point::new(0.0, 1.0));
        assert_eq!(Point::default().unit(), Point::default());
    }

    #[test]
    fn crossing_segments_intersect() {
        let a = Line::new(0.0, 0.0, 10.0, 10.0);
        let b = Line::new(0.0, 10.0, 10.0, 0.0);
        match segment_intersection(&a, &b) {
            Intersection::Point { x, y, t } => {
                assert!(approx(x, 5.0) && approx(y, 5.0));
                assert!(approx(t, 0.5));
            }
            other => panic!("segments should cross, got {:?}", other),
        }
    }

    #[test]
    fn collinear_overlap_touches_twice() {
        let a = Line::new(0.0, 0.0, 10.0, 0.0);
        let b = Line::new(4.0, 0.0, 20.0, 0.0);
        match segment_intersection(&a, &b) {
            Intersection::Overlap { start, end } => {
                assert_eq!(start, Point::new(4.0, 0.0));
                assert_eq!(end, Point::new(10.0, 0.0));
            }
            other => panic!("expected an overlap, got {:?}", other),
        }

        let rail = vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)];
        let rung = vec![Point::new(2.0, 0.0), Point::new(6.0, 0.0)];
        assert_eq!(polyline_intersections(&rung, &rail).len(), 2);

        let parallel = Line::new(0.0, 1.0, 10.0, 1.0);
        assert!(matches!(segment_intersection(&a, &parallel), Intersection::None));
    }

    #[test]
    fn touching_at_endpoint_counts() {
        let rail = vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)];
        let rung = vec![Point::new(5.0, 0.0), Point::new(5.0, 10.0)];
        assert!(polylines_intersect(&rail, &rung));
    }

    #[test]
    fn vertex_crossing_is_deduplicated() {
        let a = vec![Point::new(0.0, 0.0), Point::new(5.0, 0.0), Point::new(10.0, 0.0)];
        let b = vec![Point::new(5.0, -5.0), Point::new(5.0, 5.0)];
        assert_eq!(polyline_intersections(&a, &b).len(), 1);
    }

    #[test]
    fn project_and_interpolate() {
        let line = vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(10.0, 10.0)];
        assert!(approx(polyline_length(&line), 20.0));
        assert!(approx(project(&line, Point::new(4.0, 3.0)), 4.0));
        assert!(approx(project(&line, Point::new(12.0, 5.0)), 15.0));
        assert_eq!(interpolate(&line, 15.0), Point::new(10.0, 5.0));
        assert_eq!(interpolate(&line, 100.0), Point::new(10.0, 10.0));
        assert_eq!(interpolate_normalized(&line, 0.5), Point::new(10.0, 0.0));
    }

    #[test]
    fn cut_in_middle_of_segment() {
        let line = vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)];
        let (before, after) = cut(&line, 4.0);
        assert_eq!(before.unwrap(), vec![Point::new(0.0, 0.0), Point::new(4.0, 0.0)]);
        assert_eq!(after.unwrap(), vec![Point::new(4.0, 0.0), Point::new(10.0, 0.0)]);
    }

    #[test]
    fn cut_at_ends_is_degenerate() {
        let line = vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)];
        assert!(cut(&line, 0.0).0.is_none());
        assert!(cut(&line, 10.0).1.is_none());
    }

    #[test]
    fn cut_multiple_keeps_piece_count() {
        let line = vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)];
        let pieces = cut_multiple(&line, &[7.0, 0.0, 3.0, 10.0]);
        assert_eq!(pieces.len(), 5);
        assert!(pieces[0].is_none());
        assert!(approx(polyline_length(pieces[1].as_ref().unwrap()), 3.0));
        assert!(approx(polyline_length(pieces[2].as_ref().unwrap()), 4.0));
        assert!(approx(polyline_length(pieces[3].as_ref().unwrap()), 3.0));
        assert!(pieces[4].is_none());
    }

    #[test]
    fn nearest_points_between_disjoint_lines() {
        let a = vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)];
        let b = vec![Point::new(5.0, 2.0), Point::new(5.0, 8.0)];
        let (pa, pb) = nearest_points(&a, &b);
        assert_eq!(pa, Point::new(5.0, 0.0));
        assert_eq!(pb, Point::new(5.0, 2.0));
    }

    #[test]
    fn affine_composition() {
        let t = Affine::translate(10.0, 0.0).then_after(&Affine::scale(2.0, 2.0));
        assert_eq!(t.apply(Point::new(1.0, 1.0)), Point::new(12.0, 2.0));
        assert!(Affine::identity().is_identity());
    }
}
